//! Rule reference resolution.
//!
//! A [`RuleResolver`] maps a `ruleRef` to the stored rule it points at. The
//! validator uses it to confirm a reference's declared type; the SQL
//! generator uses it to obtain the tree to inline. Both track the chain of
//! `(uuid, version)` pairs visited during one top-level call with a
//! [`ReferenceChain`] so that reference loops terminate.

use crate::tree::{ReturnType, Rule, RuleReference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a stored rule version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleKey {
    pub id: String,
    pub uuid: String,
    pub version: u32,
}

impl From<&RuleReference> for RuleKey {
    fn from(r: &RuleReference) -> Self {
        RuleKey {
            id: r.id.clone(),
            uuid: r.uuid.clone(),
            version: r.version,
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}@{})", self.id, self.uuid, self.version)
    }
}

/// A resolved reference: the stored tree and its declared return type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRule {
    pub rule: Rule,
    pub return_type: ReturnType,
}

impl From<Rule> for ResolvedRule {
    fn from(rule: Rule) -> Self {
        ResolvedRule {
            return_type: rule.return_type,
            rule,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("rule {key} not found")]
    NotFound { key: RuleKey },
    #[error("rule '{id}' has no uuid and cannot be stored for reference")]
    MissingUuid { id: String },
    #[error("resolver backend error: {0}")]
    Backend(String),
}

/// Looks up referenced rules. Implementations may perform I/O.
pub trait RuleResolver {
    fn resolve(&self, key: &RuleKey) -> Result<ResolvedRule, ResolveError>;
}

impl<R: RuleResolver + ?Sized> RuleResolver for &R {
    fn resolve(&self, key: &RuleKey) -> Result<ResolvedRule, ResolveError> {
        (**self).resolve(key)
    }
}

impl<R: RuleResolver + ?Sized> RuleResolver for Box<R> {
    fn resolve(&self, key: &RuleKey) -> Result<ResolvedRule, ResolveError> {
        (**self).resolve(key)
    }
}

/// A resolver that knows no rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl RuleResolver for NoResolver {
    fn resolve(&self, key: &RuleKey) -> Result<ResolvedRule, ResolveError> {
        Err(ResolveError::NotFound { key: key.clone() })
    }
}

/// In-memory rule store keyed by `(uuid, version)`.
///
/// A lookup succeeds only when the stored rule's `id` also matches.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    rules: BTreeMap<(String, u32), Rule>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `rule`, replacing any rule with the same `(uuid, version)`.
    pub fn insert(&mut self, rule: Rule) -> Result<Option<Rule>, ResolveError> {
        let uuid = rule
            .uuid
            .clone()
            .ok_or_else(|| ResolveError::MissingUuid {
                id: rule.id.clone(),
            })?;
        Ok(self.rules.insert((uuid, rule.version), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleResolver for MemoryResolver {
    fn resolve(&self, key: &RuleKey) -> Result<ResolvedRule, ResolveError> {
        match self.rules.get(&(key.uuid.clone(), key.version)) {
            Some(rule) if rule.id == key.id => Ok(ResolvedRule::from(rule.clone())),
            _ => Err(ResolveError::NotFound { key: key.clone() }),
        }
    }
}

/// The `(uuid, version)` pairs currently being expanded, outermost first.
#[derive(Debug, Clone, Default)]
pub struct ReferenceChain {
    stack: Vec<(String, u32)>,
}

impl ReferenceChain {
    /// A chain seeded with the top-level rule, when it has an identity.
    pub fn rooted(rule: &Rule) -> Self {
        let mut chain = ReferenceChain::default();
        if let Some((uuid, version)) = rule.identity() {
            chain.stack.push((uuid.to_owned(), version));
        }
        chain
    }

    pub fn contains(&self, key: &RuleKey) -> bool {
        self.stack
            .iter()
            .any(|(u, v)| *u == key.uuid && *v == key.version)
    }

    /// Push `key`, or return the chain that would close the loop.
    pub fn enter(&mut self, key: &RuleKey) -> Result<(), Vec<String>> {
        if self.contains(key) {
            let mut cycle = self.describe();
            cycle.push(format!("{}@{}", key.uuid, key.version));
            return Err(cycle);
        }
        self.stack.push((key.uuid.clone(), key.version));
        Ok(())
    }

    pub fn leave(&mut self) {
        self.stack.pop();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn describe(&self) -> Vec<String> {
        self.stack
            .iter()
            .map(|(u, v)| format!("{}@{}", u, v))
            .collect()
    }
}

//! Semantic validation of rule trees.
//!
//! Walks a structurally well-formed rule and collects every semantic
//! defect: operator/type compatibility, operand cardinality, function
//! signatures, value sources, reference constraints and mutual exclusivity
//! of alternative shapes. Validation never stops at the first error and
//! never mutates the tree.

mod condition;
mod expression;
mod reference;

use crate::catalog::Catalogs;
use crate::error::{path, SemanticCategory, SemanticError};
use crate::resolve::{RuleKey, RuleResolver};
use crate::tree::{Definition, Rule};

/// Validate `rule` against `catalogs` without consulting a resolver.
pub fn validate(rule: &Rule, catalogs: &Catalogs) -> Vec<SemanticError> {
    Validator::new(catalogs).validate(rule)
}

/// Reusable validator. Attach a resolver to also confirm that references
/// exist and declare the type of the rule they point at.
pub struct Validator<'a> {
    catalogs: &'a Catalogs,
    resolver: Option<&'a dyn RuleResolver>,
}

impl<'a> Validator<'a> {
    pub fn new(catalogs: &'a Catalogs) -> Self {
        Validator {
            catalogs,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn RuleResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn validate(&self, rule: &Rule) -> Vec<SemanticError> {
        let mut ctx = Ctx {
            catalogs: self.catalogs,
            resolver: self.resolver,
            root: rule.identity().map(|(u, v)| (u.to_owned(), v)),
            errors: Vec::new(),
        };

        match &rule.definition {
            Definition::Expression(expr) => expression::validate_expression(&mut ctx, expr, path::ROOT),
            Definition::Condition(node) => condition::validate_node(&mut ctx, node, path::ROOT),
            Definition::Case(case) => {
                if case.when_clauses.is_empty() {
                    ctx.push(SemanticError::new(
                        SemanticCategory::EmptyCase,
                        &path::key(path::ROOT, "whenClauses"),
                        "case requires at least one when clause",
                    ));
                }
                for (i, clause) in case.when_clauses.iter().enumerate() {
                    let base = path::index(path::ROOT, "whenClauses", i);
                    condition::validate_node(&mut ctx, &clause.when, &path::key(&base, "when"));
                    expression::validate_expression(&mut ctx, &clause.then, &path::key(&base, "then"));
                }
                if let Some(else_clause) = &case.else_clause {
                    expression::validate_expression(
                        &mut ctx,
                        else_clause,
                        &path::key(path::ROOT, "elseClause"),
                    );
                }
            }
        }

        tracing::debug!(
            rule = %rule.id,
            structure = %rule.structure(),
            errors = ctx.errors.len(),
            "validated rule"
        );
        ctx.errors
    }
}

/// Shared state of one validation walk.
pub(crate) struct Ctx<'a> {
    pub catalogs: &'a Catalogs,
    pub resolver: Option<&'a dyn RuleResolver>,
    /// `(uuid, version)` of the rule being validated.
    pub root: Option<(String, u32)>,
    pub errors: Vec<SemanticError>,
}

impl Ctx<'_> {
    pub fn push(&mut self, err: SemanticError) {
        self.errors.push(err);
    }

    pub fn is_root(&self, key: &RuleKey) -> bool {
        matches!(&self.root, Some((u, v)) if *u == key.uuid && *v == key.version)
    }
}

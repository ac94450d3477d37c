use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classification of a fatal generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationCategory {
    /// No function catalog entry or no SQL template for a function.
    UnmappedFunction,
    /// Operator or symbol absent from the catalog or the dialect.
    UnmappedOperator,
    UnresolvedReference,
    CycleDetected,
    /// More references expanded than the generator allows per call.
    ReferenceLimit,
    /// The resolver backend failed.
    Resolver,
    InvalidLiteral,
    InvalidFieldPath,
    /// A right operand whose shape does not fit the operator.
    Cardinality,
    GroupArity,
    EmptyGroup,
    EmptyCase,
    /// A template names a slot that cannot be filled.
    Template,
    /// The dialect table could not be loaded.
    Dialect,
}

impl GenerationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationCategory::UnmappedFunction => "unmapped_function",
            GenerationCategory::UnmappedOperator => "unmapped_operator",
            GenerationCategory::UnresolvedReference => "unresolved_reference",
            GenerationCategory::CycleDetected => "cycle_detected",
            GenerationCategory::ReferenceLimit => "reference_limit",
            GenerationCategory::Resolver => "resolver",
            GenerationCategory::InvalidLiteral => "invalid_literal",
            GenerationCategory::InvalidFieldPath => "invalid_field_path",
            GenerationCategory::Cardinality => "cardinality",
            GenerationCategory::GroupArity => "group_arity",
            GenerationCategory::EmptyGroup => "empty_group",
            GenerationCategory::EmptyCase => "empty_case",
            GenerationCategory::Template => "template",
            GenerationCategory::Dialect => "dialect",
        }
    }
}

impl fmt::Display for GenerationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first fatal problem met while compiling a rule to SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{path}: {message} [{category}]")]
pub struct GenerationError {
    pub category: GenerationCategory,
    pub path: String,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl GenerationError {
    pub fn new(category: GenerationCategory, path: &str, message: impl Into<String>) -> Self {
        GenerationError {
            category,
            path: path.to_owned(),
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_owned(), value.into());
        self
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classification of a semantic defect. Serialized as a snake_case string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticCategory {
    InvalidConditionOperator,
    InvalidExpressionOperator,
    UnknownOperator,
    UnknownReturnType,
    Cardinality,
    UnknownFunction,
    ReturnTypeMismatch,
    ArgumentCount,
    ArgumentName,
    ValueSource,
    MissingReturnType,
    ReferenceType,
    ReferenceTypeMismatch,
    UnresolvedReference,
    CycleDetected,
    MutualExclusivity,
    GroupArity,
    EmptyGroup,
    EmptyCase,
}

impl SemanticCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticCategory::InvalidConditionOperator => "invalid_condition_operator",
            SemanticCategory::InvalidExpressionOperator => "invalid_expression_operator",
            SemanticCategory::UnknownOperator => "unknown_operator",
            SemanticCategory::UnknownReturnType => "unknown_return_type",
            SemanticCategory::Cardinality => "cardinality",
            SemanticCategory::UnknownFunction => "unknown_function",
            SemanticCategory::ReturnTypeMismatch => "return_type_mismatch",
            SemanticCategory::ArgumentCount => "argument_count",
            SemanticCategory::ArgumentName => "argument_name",
            SemanticCategory::ValueSource => "value_source",
            SemanticCategory::MissingReturnType => "missing_return_type",
            SemanticCategory::ReferenceType => "reference_type",
            SemanticCategory::ReferenceTypeMismatch => "reference_type_mismatch",
            SemanticCategory::UnresolvedReference => "unresolved_reference",
            SemanticCategory::CycleDetected => "cycle_detected",
            SemanticCategory::MutualExclusivity => "mutual_exclusivity",
            SemanticCategory::GroupArity => "group_arity",
            SemanticCategory::EmptyGroup => "empty_group",
            SemanticCategory::EmptyCase => "empty_case",
        }
    }
}

impl fmt::Display for SemanticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A semantic defect found by the validator.
///
/// `path` is a structural pointer into the submitted rule, for example
/// `$.definition.conditions[0].right`. `details` carries machine-readable
/// context (operator names, expected and actual types, bounds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{path}: {message} [{category}]")]
pub struct SemanticError {
    pub category: SemanticCategory,
    pub path: String,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl SemanticError {
    pub fn new(category: SemanticCategory, path: &str, message: impl Into<String>) -> Self {
        SemanticError {
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

/// Structural pointer helpers shared by the validator and generator.
pub mod path {
    pub const ROOT: &str = "$.definition";

    pub fn key(base: &str, key: &str) -> String {
        format!("{}.{}", base, key)
    }

    pub fn index(base: &str, key: &str, i: usize) -> String {
        format!("{}.{}[{}]", base, key, i)
    }
}

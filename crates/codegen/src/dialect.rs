//! SQL dialect table: literal spellings, identifier quoting and the
//! templates used for condition operators and functions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

static BUILTIN_DIALECT: &str = include_str!("../../../catalog/dialect.json");

#[derive(Debug, thiserror::Error)]
pub enum DialectError {
    #[error("error reading dialect '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error parsing dialect: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conjunctions {
    #[serde(rename = "AND")]
    pub and: String,
    #[serde(rename = "OR")]
    pub or: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlDialect {
    pub name: String,
    pub identifier_quote: String,
    pub true_literal: String,
    pub false_literal: String,
    pub null_literal: String,
    pub conjunctions: Conjunctions,
    /// Expression operator name to SQL token (`concat` to `||`).
    pub expression_operators: BTreeMap<String, String>,
    /// Condition operator name to template over `{left}`, `{right}`,
    /// `{low}`, `{high}` and `{values}`.
    pub condition_templates: BTreeMap<String, String>,
    /// Function name to template over `{0}`, `{1}`, ... and `{*}`.
    pub function_templates: BTreeMap<String, String>,
}

impl SqlDialect {
    /// The PostgreSQL-flavoured dialect shipped under `catalog/`.
    pub fn builtin() -> Result<SqlDialect, DialectError> {
        SqlDialect::from_json_str(BUILTIN_DIALECT)
    }

    pub fn from_json_str(s: &str) -> Result<SqlDialect, DialectError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<SqlDialect, DialectError> {
        let s = std::fs::read_to_string(path).map_err(|source| DialectError::Io {
            path: path.display().to_string(),
            source,
        })?;
        SqlDialect::from_json_str(&s)
    }

    /// Quote one identifier segment, doubling embedded quote characters.
    pub fn quote_identifier(&self, segment: &str) -> String {
        let q = &self.identifier_quote;
        let escaped = segment.replace(q.as_str(), &format!("{}{}", q, q));
        format!("{}{}{}", q, escaped, q)
    }

    /// Single-quote a string literal, doubling embedded quotes.
    pub fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }
}

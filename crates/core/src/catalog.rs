//! Type, operator and function catalogs.
//!
//! Catalogs are loaded once (from JSON on disk or the embedded defaults)
//! and are immutable afterwards. Lookups never fall back to a default: a
//! missing key is reported by the caller as a semantic or generation error.

use crate::tree::ReturnType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

static BUILTIN_TYPES: &str = include_str!("../../../catalog/types.json");
static BUILTIN_FUNCTIONS: &str = include_str!("../../../catalog/functions.json");

/// Errors raised while loading or checking a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("error reading catalog '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error parsing {what} catalog: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("inconsistent catalog: {0}")]
    Inconsistent(String),
}

// ──────────────────────────────────────────────
// Operators
// ──────────────────────────────────────────────

/// Number of right-hand operands an operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// No right operand (`right` must be null).
    None,
    /// A single expression.
    One,
    /// An array of exactly two expressions.
    Two,
    /// An array whose length lies in `[min, max]`.
    Range { min: usize, max: usize },
}

impl Cardinality {
    /// Machine-readable form used in error details.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cardinality::None => serde_json::json!(0),
            Cardinality::One => serde_json::json!(1),
            Cardinality::Two => serde_json::json!(2),
            Cardinality::Range { min, max } => serde_json::json!({"min": min, "max": max}),
        }
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum RawCardinality {
    Fixed(u64),
    Range { min: usize, max: usize },
}

impl TryFrom<RawCardinality> for Cardinality {
    type Error = String;

    fn try_from(raw: RawCardinality) -> Result<Self, Self::Error> {
        match raw {
            RawCardinality::Fixed(0) => Ok(Cardinality::None),
            RawCardinality::Fixed(1) => Ok(Cardinality::One),
            RawCardinality::Fixed(2) => Ok(Cardinality::Two),
            RawCardinality::Fixed(n) => Err(format!(
                "fixed cardinality must be 0, 1 or 2, got {}; use {{min, max}} for lists",
                n
            )),
            RawCardinality::Range { min, max } if min > max => Err(format!(
                "cardinality range min {} exceeds max {}",
                min, max
            )),
            RawCardinality::Range { min, max } => Ok(Cardinality::Range { min, max }),
        }
    }
}

impl From<Cardinality> for RawCardinality {
    fn from(c: Cardinality) -> Self {
        match c {
            Cardinality::None => RawCardinality::Fixed(0),
            Cardinality::One => RawCardinality::Fixed(1),
            Cardinality::Two => RawCardinality::Fixed(2),
            Cardinality::Range { min, max } => RawCardinality::Range { min, max },
        }
    }
}

impl<'de> Deserialize<'de> for Cardinality {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = RawCardinality::deserialize(d)?;
        Cardinality::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Cardinality {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        RawCardinality::from(*self).serialize(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDef {
    pub cardinality: Cardinality,
}

/// Legal operators for one return type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeEntry {
    #[serde(default)]
    pub condition_operators: BTreeSet<String>,
    #[serde(default)]
    pub expression_operators: BTreeSet<String>,
}

/// Per-type operator legality, condition operator cardinalities and the
/// expression symbol table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCatalog {
    /// Condition operators keyed by name.
    pub operators: BTreeMap<String, OperatorDef>,
    /// Expression operator symbol to operator name (`+` to `add`).
    pub symbols: BTreeMap<String, String>,
    /// Keyed by the return type's wire name.
    pub types: BTreeMap<String, TypeEntry>,
}

static EMPTY: BTreeSet<String> = BTreeSet::new();

impl TypeCatalog {
    pub fn operator(&self, name: &str) -> Option<&OperatorDef> {
        self.operators.get(name)
    }

    pub fn symbol(&self, symbol: &str) -> Option<&str> {
        self.symbols.get(symbol).map(String::as_str)
    }

    pub fn entry(&self, t: ReturnType) -> Option<&TypeEntry> {
        self.types.get(t.as_str())
    }

    pub fn condition_operators(&self, t: ReturnType) -> Option<&BTreeSet<String>> {
        self.entry(t).map(|e| &e.condition_operators)
    }

    /// Expression operators legal for `t`. A type without an entry permits none.
    pub fn expression_operators(&self, t: ReturnType) -> &BTreeSet<String> {
        self.entry(t).map_or(&EMPTY, |e| &e.expression_operators)
    }

    fn check(&self) -> Result<(), CatalogError> {
        for key in self.types.keys() {
            key.parse::<ReturnType>()
                .map_err(|e| CatalogError::Inconsistent(format!("types: {}", e)))?;
        }
        let symbol_targets: BTreeSet<&str> = self.symbols.values().map(String::as_str).collect();
        for (t, entry) in &self.types {
            for op in &entry.condition_operators {
                if !self.operators.contains_key(op) {
                    return Err(CatalogError::Inconsistent(format!(
                        "type '{}' lists condition operator '{}' with no operator definition",
                        t, op
                    )));
                }
            }
            for op in &entry.expression_operators {
                if !symbol_targets.contains(op.as_str()) {
                    return Err(CatalogError::Inconsistent(format!(
                        "type '{}' lists expression operator '{}' that no symbol maps to",
                        t, op
                    )));
                }
            }
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Functions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDef {
    pub name: String,
    /// Informational; argument values are not type-checked against it.
    #[serde(rename = "type")]
    pub arg_type: ReturnType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicArgs {
    /// Informational, like [`ArgDef::arg_type`].
    #[serde(rename = "type")]
    pub arg_type: ReturnType,
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arity {
    /// Ordered, named arguments; count and names must match exactly.
    Fixed(Vec<ArgDef>),
    /// Uniformly typed arguments, count bounded by `[min, max]`.
    Dynamic(DynamicArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFunctionDef", into = "RawFunctionDef")]
pub struct FunctionDef {
    pub return_type: ReturnType,
    pub arity: Arity,
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawFunctionDef {
    return_type: ReturnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<Vec<ArgDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dynamic_args: Option<DynamicArgs>,
}

impl TryFrom<RawFunctionDef> for FunctionDef {
    type Error = String;

    fn try_from(raw: RawFunctionDef) -> Result<Self, Self::Error> {
        let arity = match (raw.args, raw.dynamic_args) {
            (Some(_), Some(_)) => {
                return Err("function declares both `args` and `dynamicArgs`".to_string())
            }
            (None, Some(d)) if d.min > d.max => {
                return Err(format!(
                    "dynamicArgs min {} exceeds max {}",
                    d.min, d.max
                ))
            }
            (None, Some(d)) => Arity::Dynamic(d),
            (args, None) => Arity::Fixed(args.unwrap_or_default()),
        };
        Ok(FunctionDef {
            return_type: raw.return_type,
            arity,
        })
    }
}

impl From<FunctionDef> for RawFunctionDef {
    fn from(f: FunctionDef) -> Self {
        let (args, dynamic_args) = match f.arity {
            Arity::Fixed(a) => (Some(a), None),
            Arity::Dynamic(d) => (None, Some(d)),
        };
        RawFunctionDef {
            return_type: f.return_type,
            args,
            dynamic_args,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionCatalog {
    pub functions: BTreeMap<String, FunctionDef>,
}

impl FunctionCatalog {
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }
}

// ──────────────────────────────────────────────
// Catalogs
// ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypesFile {
    #[serde(flatten)]
    catalog: TypeCatalog,
    #[serde(default)]
    value_sources: BTreeSet<String>,
}

/// Everything the validator and generator consult, passed explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalogs {
    pub types: TypeCatalog,
    pub functions: FunctionCatalog,
    /// Allowed `valueSource` tags on literal values.
    pub value_sources: BTreeSet<String>,
}

impl Catalogs {
    /// The catalogs shipped with the workspace under `catalog/`.
    pub fn builtin() -> Result<Catalogs, CatalogError> {
        Catalogs::from_json_strs(BUILTIN_TYPES, BUILTIN_FUNCTIONS)
    }

    /// Parse and check a `types.json` / `functions.json` pair.
    pub fn from_json_strs(types: &str, functions: &str) -> Result<Catalogs, CatalogError> {
        let types: TypesFile = serde_json::from_str(types).map_err(|source| CatalogError::Parse {
            what: "type",
            source,
        })?;
        let functions: FunctionCatalog =
            serde_json::from_str(functions).map_err(|source| CatalogError::Parse {
                what: "function",
                source,
            })?;
        types.catalog.check()?;
        Ok(Catalogs {
            types: types.catalog,
            functions,
            value_sources: types.value_sources,
        })
    }

    /// Load `types.json` and `functions.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Catalogs, CatalogError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })
        };
        let types = read("types.json")?;
        let functions = read("functions.json")?;
        let catalogs = Catalogs::from_json_strs(&types, &functions)?;
        tracing::debug!(
            dir = %dir.display(),
            operators = catalogs.types.operators.len(),
            functions = catalogs.functions.functions.len(),
            "loaded catalogs"
        );
        Ok(catalogs)
    }
}

//! rulebook-codegen: compile validated rule trees to SQL fragments.
//!
//! The generator consumes the tree model from `rulebook-core` together with
//! the same catalogs the validator uses and a [`SqlDialect`] table that maps
//! catalog operators and functions to SQL. Compilation is fail-fast: the
//! first problem is returned as a [`GenerationError`].

pub mod dialect;
pub mod error;
pub mod sql;
mod template;

pub use dialect::{DialectError, SqlDialect};
pub use error::{GenerationCategory, GenerationError};
pub use sql::{SqlGenerator, DEFAULT_MAX_REFERENCES};

use rulebook_core::error::path;
use rulebook_core::{Catalogs, Rule, RuleResolver};

/// Compile `rule` with the built-in dialect and the default reference bound.
pub fn compile(
    rule: &Rule,
    catalogs: &Catalogs,
    resolver: &dyn RuleResolver,
) -> Result<String, GenerationError> {
    let dialect = SqlDialect::builtin().map_err(|e| {
        GenerationError::new(GenerationCategory::Dialect, path::ROOT, e.to_string())
    })?;
    SqlGenerator::new(catalogs, &dialect, resolver).compile(rule)
}

//! rulebook-core: rule tree model, catalogs and semantic validation.
//!
//! A rule is a tree of expressions, conditions and case clauses that has
//! already passed structural (shape) checking. This crate verifies the
//! domain semantics of such a tree against immutable, explicitly passed
//! catalogs and defines the reference resolver contract shared with the
//! SQL generator in `rulebook-codegen`.
//!
//! # Public API
//!
//! - [`validate()`] / [`Validator`] -- collect every [`SemanticError`]
//! - [`Catalogs`] -- type/operator catalog, function catalog, value sources
//! - [`RuleResolver`] -- lookup of referenced rules, with [`MemoryResolver`]
//!   and [`ReferenceChain`] for cycle tracking
//! - Tree types: [`Rule`], [`Definition`], [`Expression`], [`Condition`],
//!   [`ConditionGroup`], [`ConditionNode`], [`CaseContent`]

pub mod catalog;
pub mod error;
pub mod resolve;
pub mod tree;
pub mod validate;

// ── Convenience re-exports: key types ────────────────────────────────

pub use catalog::{Arity, Cardinality, CatalogError, Catalogs, FunctionCatalog, FunctionDef, OperatorDef, TypeCatalog};
pub use error::{SemanticCategory, SemanticError};
pub use resolve::{
    MemoryResolver, NoResolver, ReferenceChain, ResolveError, ResolvedRule, RuleKey, RuleResolver,
};
pub use tree::{
    CaseContent, Comparison, Condition, ConditionGroup, ConditionNode, Conjunction, Definition,
    Expression, FunctionArg, GroupBody, Operand, RefNode, ReturnType, Rule, RuleReference,
    Structure, WhenClause,
};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use validate::{validate, Validator};

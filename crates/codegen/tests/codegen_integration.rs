//! Integration tests for rule tree to SQL compilation.
//!
//! These tests drive the generator with the workspace fixtures and with
//! hand-built trees exercising references, cycles and dialect gaps.

use rulebook_codegen::{compile, GenerationCategory, SqlDialect, SqlGenerator};
use rulebook_core::{
    Catalogs, MemoryResolver, ResolveError, ResolvedRule, Rule, RuleKey, RuleResolver,
};
use serde_json::json;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> &'static Path {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/codegen -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
}

fn read_rule(path: &Path) -> Rule {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read fixture '{}': {}", path.display(), e));
    Rule::from_json_str(&content)
        .unwrap_or_else(|e| panic!("failed to parse fixture '{}': {}", path.display(), e))
}

fn rule_files(dir: &str) -> Vec<PathBuf> {
    let mut paths: Vec<_> = fs::read_dir(workspace_root().join("fixtures").join(dir))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.to_string_lossy().ends_with(".rule.json"))
        .collect();
    paths.sort();
    paths
}

fn stored_rules() -> MemoryResolver {
    let mut store = MemoryResolver::new();
    for entry in fs::read_dir(workspace_root().join("fixtures/rules")).unwrap() {
        store.insert(read_rule(&entry.unwrap().path())).unwrap();
    }
    store
}

fn rule(v: serde_json::Value) -> Rule {
    serde_json::from_value(v).unwrap()
}

fn stored_condition(id: &str, uuid: &str, definition: serde_json::Value) -> Rule {
    rule(json!({
        "structure": "condition",
        "returnType": "boolean",
        "id": id,
        "uuid": uuid,
        "version": 1,
        "definition": definition
    }))
}

fn bool_ref(id: &str, uuid: &str) -> serde_json::Value {
    json!({"ruleRef": {"returnType": "boolean", "id": id, "uuid": uuid, "version": 1}})
}

#[test]
fn positive_fixtures_compile_to_expected_sql() {
    let catalogs = Catalogs::builtin().unwrap();
    let store = stored_rules();
    let files = rule_files("positive");
    assert!(!files.is_empty());
    for path in files {
        let expected_path = PathBuf::from(
            path.to_string_lossy()
                .replace(".rule.json", ".expected.sql"),
        );
        let expected = fs::read_to_string(&expected_path).unwrap();
        let sql = compile(&read_rule(&path), &catalogs, &store)
            .unwrap_or_else(|e| panic!("{} failed to compile: {}", path.display(), e));
        assert_eq!(sql, expected.trim_end(), "{}", path.display());
    }
}

#[test]
fn compile_stage_negative_fixtures_fail_as_expected() {
    let catalogs = Catalogs::builtin().unwrap();
    let store = stored_rules();
    let mut checked = 0;
    for path in rule_files("negative") {
        let expected_path = PathBuf::from(
            path.to_string_lossy()
                .replace(".rule.json", ".expected-error.json"),
        );
        let expected: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&expected_path).unwrap()).unwrap();
        if expected["stage"] != "compile" {
            continue;
        }
        let err = compile(&read_rule(&path), &catalogs, &store)
            .expect_err(&format!("{} should not compile", path.display()));
        assert_eq!(err.category.as_str(), expected["errors"][0]["category"], "{}", path.display());
        assert_eq!(err.path, expected["errors"][0]["path"], "{}", path.display());
        checked += 1;
    }
    assert!(checked > 0, "no compile-stage negative fixtures found");
}

#[test]
fn and_group_joins_children_in_parentheses() {
    let catalogs = Catalogs::builtin().unwrap();
    let r = rule(json!({
        "structure": "condition",
        "returnType": "boolean",
        "id": "both",
        "version": 1,
        "definition": {
            "conjunction": "AND",
            "conditions": [
                {"left": {"kind": "field", "returnType": "number", "path": "a"}, "operator": "equal", "right": {"kind": "value", "returnType": "number", "literal": 1}},
                {"left": {"kind": "field", "returnType": "text", "path": "b"}, "operator": "is_not_empty", "right": null}
            ]
        }
    }));
    let store = MemoryResolver::new();
    let sql = compile(&r, &catalogs, &store).unwrap();
    assert_eq!(sql, "(\"a\" = 1 AND \"b\" IS NOT NULL)");
}

#[test]
fn two_rule_cycle_is_detected() {
    let catalogs = Catalogs::builtin().unwrap();
    let a = stored_condition("a", "A", bool_ref("b", "B"));
    let b = stored_condition("b", "B", bool_ref("a", "A"));
    let mut store = MemoryResolver::new();
    store.insert(a.clone()).unwrap();
    store.insert(b).unwrap();

    let err = compile(&a, &catalogs, &store).unwrap_err();
    assert_eq!(err.category, GenerationCategory::CycleDetected);
    assert_eq!(err.details["chain"], json!(["A@1", "B@1", "A@1"]));
    assert_eq!(err.path, "$.definition.ruleRef@B:1.definition.ruleRef");
}

#[test]
fn long_cycle_is_detected_regardless_of_length() {
    let catalogs = Catalogs::builtin().unwrap();
    let mut store = MemoryResolver::new();
    let n = 12;
    for i in 0..n {
        let next = (i + 1) % n;
        store
            .insert(stored_condition(
                &format!("r{}", i),
                &format!("R{}", i),
                bool_ref(&format!("r{}", next), &format!("R{}", next)),
            ))
            .unwrap();
    }
    let entry = rule(json!({
        "structure": "condition",
        "returnType": "boolean",
        "id": "entry",
        "version": 1,
        "definition": bool_ref("r0", "R0")
    }));
    let err = compile(&entry, &catalogs, &store).unwrap_err();
    assert_eq!(err.category, GenerationCategory::CycleDetected);
}

#[test]
fn shared_reference_is_not_a_cycle() {
    // The same rule reached twice along different branches is fine.
    let catalogs = Catalogs::builtin().unwrap();
    let store = stored_rules();
    let r = rule(json!({
        "structure": "condition",
        "returnType": "boolean",
        "id": "twice",
        "version": 1,
        "definition": {
            "conjunction": "OR",
            "conditions": [bool_ref("adult", "rule-adult"), bool_ref("adult", "rule-adult")]
        }
    }));
    let sql = compile(&r, &catalogs, &store).unwrap();
    assert_eq!(
        sql,
        "((\"customer\".\"age\" >= 18) OR (\"customer\".\"age\" >= 18))"
    );
}

#[test]
fn reference_limit_bounds_expansion() {
    let catalogs = Catalogs::builtin().unwrap();
    let dialect = SqlDialect::builtin().unwrap();
    let store = stored_rules();
    let r = rule(json!({
        "structure": "condition",
        "returnType": "boolean",
        "id": "many",
        "version": 1,
        "definition": {
            "conjunction": "AND",
            "conditions": [
                bool_ref("adult", "rule-adult"),
                bool_ref("adult", "rule-adult"),
                bool_ref("adult", "rule-adult")
            ]
        }
    }));
    let generator = SqlGenerator::new(&catalogs, &dialect, &store).with_max_references(2);
    let err = generator.compile(&r).unwrap_err();
    assert_eq!(err.category, GenerationCategory::ReferenceLimit);
    assert_eq!(err.path, "$.definition.conditions[2].ruleRef");
    assert_eq!(err.details["limit"], 2);

    let generous = SqlGenerator::new(&catalogs, &dialect, &store).with_max_references(3);
    assert!(generous.compile(&r).is_ok());
}

/// Resolver that fails like an unavailable backend and counts its calls.
struct FlakyResolver {
    calls: Cell<usize>,
}

impl RuleResolver for FlakyResolver {
    fn resolve(&self, _key: &RuleKey) -> Result<ResolvedRule, ResolveError> {
        self.calls.set(self.calls.get() + 1);
        Err(ResolveError::Backend("connection refused".to_string()))
    }
}

#[test]
fn backend_failure_is_a_resolver_error() {
    let catalogs = Catalogs::builtin().unwrap();
    let resolver = FlakyResolver { calls: Cell::new(0) };
    let r = rule(json!({
        "structure": "expression",
        "returnType": "number",
        "id": "e",
        "version": 1,
        "definition": {"kind": "ruleRef", "returnType": "number", "id": "t", "uuid": "T", "version": 3}
    }));
    let err = compile(&r, &catalogs, &resolver).unwrap_err();
    assert_eq!(err.category, GenerationCategory::Resolver);
    assert!(err.message.contains("connection refused"));
    assert_eq!(resolver.calls.get(), 1);
}

#[test]
fn errors_inside_references_carry_the_reference_path() {
    let catalogs = Catalogs::builtin().unwrap();
    let mut store = MemoryResolver::new();
    store
        .insert(rule(json!({
            "structure": "expression",
            "returnType": "number",
            "id": "broken",
            "uuid": "BR",
            "version": 2,
            "definition": {"kind": "field", "returnType": "number", "path": ".age"}
        })))
        .unwrap();
    let r = rule(json!({
        "structure": "expression",
        "returnType": "number",
        "id": "outer",
        "version": 1,
        "definition": {
            "kind": "group",
            "returnType": "number",
            "expressions": [
                {"kind": "value", "returnType": "number", "literal": 1},
                {"kind": "ruleRef", "returnType": "number", "id": "broken", "uuid": "BR", "version": 2}
            ],
            "operators": ["+"]
        }
    }));
    let err = compile(&r, &catalogs, &store).unwrap_err();
    assert_eq!(err.category, GenerationCategory::InvalidFieldPath);
    assert_eq!(err.path, "$.definition.expressions[1]@BR:2.definition.path");
}

#[test]
fn dialect_without_template_never_emits_sql() {
    let catalogs = Catalogs::builtin().unwrap();
    let mut dialect = SqlDialect::builtin().unwrap();
    dialect.condition_templates.remove("starts_with");
    dialect.function_templates.remove("trim");
    dialect.expression_operators.remove("concat");
    let store = MemoryResolver::new();
    let generator = SqlGenerator::new(&catalogs, &dialect, &store);

    let cond = rule(json!({
        "structure": "condition",
        "returnType": "boolean",
        "id": "c",
        "version": 1,
        "definition": {"left": {"kind": "field", "returnType": "text", "path": "n"}, "operator": "starts_with", "right": {"kind": "value", "returnType": "text", "literal": "A"}}
    }));
    let err = generator.compile(&cond).unwrap_err();
    assert_eq!(err.category, GenerationCategory::UnmappedOperator);
    assert_eq!(err.path, "$.definition.operator");

    let func = rule(json!({
        "structure": "expression",
        "returnType": "text",
        "id": "f",
        "version": 1,
        "definition": {"kind": "function", "returnType": "text", "name": "trim", "args": [
            {"name": "value", "value": {"kind": "field", "returnType": "text", "path": "n"}}
        ]}
    }));
    assert_eq!(
        generator.compile(&func).unwrap_err().category,
        GenerationCategory::UnmappedFunction
    );

    let group = rule(json!({
        "structure": "expression",
        "returnType": "text",
        "id": "g",
        "version": 1,
        "definition": {"kind": "group", "returnType": "text", "expressions": [
            {"kind": "field", "returnType": "text", "path": "a"},
            {"kind": "field", "returnType": "text", "path": "b"}
        ], "operators": ["&"]}
    }));
    assert_eq!(
        generator.compile(&group).unwrap_err().category,
        GenerationCategory::UnmappedOperator
    );
}

#[test]
fn generation_error_serializes_with_stable_shape() {
    let catalogs = Catalogs::builtin().unwrap();
    let store = MemoryResolver::new();
    let r = rule(json!({
        "structure": "condition",
        "returnType": "boolean",
        "id": "c",
        "version": 1,
        "definition": bool_ref("missing", "M")
    }));
    let err = compile(&r, &catalogs, &store).unwrap_err();
    let v = serde_json::to_value(&err).unwrap();
    assert_eq!(v["category"], "unresolved_reference");
    assert_eq!(v["path"], "$.definition.ruleRef");
    assert_eq!(v["details"]["uuid"], "M");
    assert!(err.to_string().ends_with("[unresolved_reference]"));
}

use super::Ctx;
use crate::error::{path, SemanticCategory, SemanticError};
use crate::resolve::{ResolveError, RuleKey};
use crate::tree::{RefNode, ReturnType, RuleReference};

/// Where a reference appears. Condition contexts require a boolean rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RefContext {
    Expression,
    Condition,
    ConditionGroup,
}

impl RefContext {
    fn is_boolean(self) -> bool {
        !matches!(self, RefContext::Expression)
    }

    fn describe(self) -> &'static str {
        match self {
            RefContext::Expression => "expression",
            RefContext::Condition => "condition",
            RefContext::ConditionGroup => "condition group",
        }
    }
}

/// Validate a reference standing in for a condition or group, including
/// the mutual exclusivity of `ruleRef` with the inline shape.
pub(super) fn validate_exclusive_reference(ctx: &mut Ctx<'_>, node: &RefNode, at: &str, context: RefContext) {
    if !node.conflicts.is_empty() {
        ctx.push(
            SemanticError::new(
                SemanticCategory::MutualExclusivity,
                at,
                format!(
                    "{} supplies both `ruleRef` and {}",
                    context.describe(),
                    node.conflicts
                        .iter()
                        .map(|k| format!("`{}`", k))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
            .with_detail("conflicts", node.conflicts.clone()),
        );
    }
    validate_reference(ctx, &node.rule_ref, &path::key(at, "ruleRef"), context);
}

/// `at` points at the reference object itself.
pub(super) fn validate_reference(ctx: &mut Ctx<'_>, reference: &RuleReference, at: &str, context: RefContext) {
    match reference.return_type {
        None => ctx.push(
            SemanticError::new(
                SemanticCategory::MissingReturnType,
                &path::key(at, "returnType"),
                format!("reference to '{}' must declare a returnType", reference.id),
            )
            .with_detail("id", reference.id.as_str()),
        ),
        Some(actual) if context.is_boolean() && actual != ReturnType::Boolean => ctx.push(
            SemanticError::new(
                SemanticCategory::ReferenceType,
                &path::key(at, "returnType"),
                format!(
                    "reference used as a {} must have returnType 'boolean', got '{}'",
                    context.describe(),
                    actual
                ),
            )
            .with_detail("expected", ReturnType::Boolean.as_str())
            .with_detail("actual", actual.as_str()),
        ),
        Some(_) => {}
    }

    let Some(resolver) = ctx.resolver else {
        return;
    };
    let key = RuleKey::from(reference);
    if ctx.is_root(&key) {
        tracing::warn!(reference = %key, "rule references itself");
        ctx.push(
            SemanticError::new(
                SemanticCategory::CycleDetected,
                at,
                format!("rule {} references itself", key),
            )
            .with_detail("uuid", key.uuid.as_str())
            .with_detail("version", key.version),
        );
        return;
    }

    tracing::trace!(reference = %key, "resolving reference for validation");
    match resolver.resolve(&key) {
        Ok(resolved) => {
            if let Some(declared) = reference.return_type {
                if resolved.return_type != declared {
                    ctx.push(
                        SemanticError::new(
                            SemanticCategory::ReferenceTypeMismatch,
                            &path::key(at, "returnType"),
                            format!(
                                "reference declares '{}' but rule {} returns '{}'",
                                declared, key, resolved.return_type
                            ),
                        )
                        .with_detail("expected", resolved.return_type.as_str())
                        .with_detail("actual", declared.as_str()),
                    );
                }
            }
        }
        Err(ResolveError::NotFound { .. }) => ctx.push(
            SemanticError::new(
                SemanticCategory::UnresolvedReference,
                at,
                format!("referenced rule {} does not exist", key),
            )
            .with_detail("id", key.id.as_str())
            .with_detail("uuid", key.uuid.as_str())
            .with_detail("version", key.version),
        ),
        Err(other) => ctx.push(
            SemanticError::new(
                SemanticCategory::UnresolvedReference,
                at,
                format!("could not resolve rule {}: {}", key, other),
            )
            .with_detail("id", key.id.as_str())
            .with_detail("uuid", key.uuid.as_str())
            .with_detail("version", key.version),
        ),
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::Catalogs;
    use crate::resolve::MemoryResolver;
    use crate::tree::Rule;
    use crate::validate::Validator;
    use serde_json::json;

    fn stored(id: &str, uuid: &str, return_type: &str) -> Rule {
        serde_json::from_value(json!({
            "structure": "expression",
            "returnType": return_type,
            "id": id,
            "uuid": uuid,
            "version": 1,
            "definition": {"kind": "value", "returnType": return_type, "literal": 1}
        }))
        .unwrap()
    }

    #[test]
    fn expression_reference_requires_return_type() {
        let rule: Rule = serde_json::from_value(json!({
            "structure": "expression",
            "returnType": "number",
            "id": "e",
            "version": 1,
            "definition": {"kind": "ruleRef", "id": "x", "uuid": "x", "version": 1}
        }))
        .unwrap();
        let c = Catalogs::builtin().unwrap();
        let errors = Validator::new(&c).validate(&rule);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category.as_str(), "missing_return_type");
        assert_eq!(errors[0].path, "$.definition.returnType");
    }

    #[test]
    fn resolved_type_must_match_declaration() {
        let mut store = MemoryResolver::new();
        store.insert(stored("total", "t", "number")).unwrap();
        let rule: Rule = serde_json::from_value(json!({
            "structure": "expression",
            "returnType": "text",
            "id": "e",
            "version": 1,
            "definition": {"kind": "ruleRef", "returnType": "text", "id": "total", "uuid": "t", "version": 1}
        }))
        .unwrap();
        let c = Catalogs::builtin().unwrap();
        let errors = Validator::new(&c).with_resolver(&store).validate(&rule);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category.as_str(), "reference_type_mismatch");
        assert_eq!(errors[0].details["expected"], "number");
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let rule: Rule = serde_json::from_value(json!({
            "structure": "condition",
            "returnType": "boolean",
            "id": "me",
            "uuid": "me-uuid",
            "version": 4,
            "definition": {"ruleRef": {"returnType": "boolean", "id": "me", "uuid": "me-uuid", "version": 4}}
        }))
        .unwrap();
        let c = Catalogs::builtin().unwrap();
        let store = MemoryResolver::new();
        let errors = Validator::new(&c).with_resolver(&store).validate(&rule);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category.as_str(), "cycle_detected");
    }

    #[test]
    fn null_operand_beside_reference_is_exclusive_violation() {
        let rule: Rule = serde_json::from_value(json!({
            "structure": "condition",
            "returnType": "boolean",
            "id": "c",
            "version": 1,
            "definition": {
                "ruleRef": {"returnType": "boolean", "id": "adult", "uuid": "a", "version": 1},
                "right": null
            }
        }))
        .unwrap();
        let c = Catalogs::builtin().unwrap();
        let errors = Validator::new(&c).validate(&rule);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category.as_str(), "mutual_exclusivity");
        assert_eq!(errors[0].path, "$.definition");
    }
}

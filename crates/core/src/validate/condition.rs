use super::expression::validate_expression;
use super::reference::{validate_exclusive_reference, RefContext};
use super::Ctx;
use crate::catalog::{Cardinality, Catalogs};
use crate::error::{path, SemanticCategory, SemanticError};
use crate::tree::{Comparison, Condition, ConditionGroup, ConditionNode, Expression, Operand, ReturnType};

pub(super) fn validate_node(ctx: &mut Ctx<'_>, node: &ConditionNode, at: &str) {
    match node {
        ConditionNode::Condition(c) => validate_condition(ctx, c, at),
        ConditionNode::Group(g) => validate_condition_group(ctx, g, at),
    }
}

fn validate_condition(ctx: &mut Ctx<'_>, condition: &Condition, at: &str) {
    match condition {
        Condition::Reference(r) => validate_exclusive_reference(ctx, r, at, RefContext::Condition),
        Condition::Compare(cmp) => validate_comparison(ctx, cmp, at),
    }
}

fn validate_condition_group(ctx: &mut Ctx<'_>, group: &ConditionGroup, at: &str) {
    match group {
        ConditionGroup::Reference(r) => validate_exclusive_reference(ctx, r, at, RefContext::ConditionGroup),
        ConditionGroup::Group(body) => {
            if body.conditions.is_empty() {
                ctx.push(SemanticError::new(
                    SemanticCategory::EmptyGroup,
                    &path::key(at, "conditions"),
                    "condition group must contain at least one condition",
                ));
            }
            for (i, child) in body.conditions.iter().enumerate() {
                validate_node(ctx, child, &path::index(at, "conditions", i));
            }
        }
    }
}

/// The type a comparison's left operand evaluates to. Known functions are
/// typed by the catalog rather than by their declaration.
fn operand_type(left: &Expression, catalogs: &Catalogs) -> Option<ReturnType> {
    match left {
        Expression::Function {
            name, return_type, ..
        } => Some(
            catalogs
                .functions
                .get(name)
                .map_or(*return_type, |f| f.return_type),
        ),
        other => other.return_type(),
    }
}

fn validate_comparison(ctx: &mut Ctx<'_>, cmp: &Comparison, at: &str) {
    let catalogs = ctx.catalogs;
    let at_op = path::key(at, "operator");
    let op = cmp.operator.as_str();

    if let Some(left_type) = operand_type(&cmp.left, catalogs) {
        match catalogs.types.condition_operators(left_type) {
            None => ctx.push(
                SemanticError::new(
                    SemanticCategory::UnknownReturnType,
                    &path::key(at, "left"),
                    format!("return type '{}' has no catalog entry", left_type),
                )
                .with_detail("returnType", left_type.as_str()),
            ),
            Some(allowed) if !allowed.contains(op) => ctx.push(
                SemanticError::new(
                    SemanticCategory::InvalidConditionOperator,
                    &at_op,
                    format!(
                        "operator '{}' is not valid for return type '{}'",
                        op, left_type
                    ),
                )
                .with_detail("operator", op)
                .with_detail("returnType", left_type.as_str())
                .with_detail("allowed", allowed.iter().cloned().collect::<Vec<_>>()),
            ),
            Some(_) => {}
        }
    }

    match catalogs.types.operator(op) {
        None => ctx.push(
            SemanticError::new(
                SemanticCategory::UnknownOperator,
                &at_op,
                format!("unknown condition operator '{}'", op),
            )
            .with_detail("operator", op),
        ),
        Some(def) => {
            if let Some(err) = check_cardinality(op, def.cardinality, cmp.right.as_ref(), at) {
                ctx.push(err);
            }
        }
    }

    validate_expression(ctx, &cmp.left, &path::key(at, "left"));
    match &cmp.right {
        None => {}
        Some(Operand::Single(e)) => validate_expression(ctx, e, &path::key(at, "right")),
        Some(Operand::List(items)) => {
            for (i, e) in items.iter().enumerate() {
                validate_expression(ctx, e, &path::index(at, "right", i));
            }
        }
    }
}

/// Describe the supplied right operand for error messages.
fn shape(right: Option<&Operand>) -> (&'static str, usize) {
    match right {
        None => ("no right operand", 0),
        Some(Operand::Single(_)) => ("a single expression", 1),
        Some(Operand::List(items)) => ("an array", items.len()),
    }
}

fn check_cardinality(
    op: &str,
    cardinality: Cardinality,
    right: Option<&Operand>,
    at: &str,
) -> Option<SemanticError> {
    let at_right = path::key(at, "right");
    let (described, actual) = shape(right);
    let message = match (cardinality, right) {
        (Cardinality::None, None) => return None,
        (Cardinality::None, Some(_)) => format!(
            "operator '{}' takes no right operand, got {}",
            op, described
        ),
        (Cardinality::One, Some(Operand::Single(_))) => return None,
        (Cardinality::One, _) => format!(
            "operator '{}' expects a single expression, got {}",
            op, described
        ),
        (Cardinality::Two, Some(Operand::List(items))) if items.len() == 2 => return None,
        (Cardinality::Two, Some(Operand::List(items))) => format!(
            "operator '{}' expects exactly 2 values, got {}",
            op,
            items.len()
        ),
        (Cardinality::Two, _) => format!(
            "operator '{}' expects an array of exactly 2 values, got {}",
            op, described
        ),
        (Cardinality::Range { min, max }, Some(Operand::List(items)))
            if (min..=max).contains(&items.len()) =>
        {
            return None
        }
        (Cardinality::Range { min, max }, Some(Operand::List(items))) => format!(
            "operator '{}' expects between {} and {} values, got {}",
            op,
            min,
            max,
            items.len()
        ),
        (Cardinality::Range { min, max }, _) => format!(
            "operator '{}' expects an array of {} to {} values, got {}",
            op, min, max, described
        ),
    };
    Some(
        SemanticError::new(SemanticCategory::Cardinality, &at_right, message)
            .with_detail("operator", op)
            .with_detail("cardinality", cardinality.to_json())
            .with_detail("actual", actual),
    )
}

use super::reference::{validate_reference, RefContext};
use super::Ctx;
use crate::catalog::Arity;
use crate::error::{path, SemanticCategory, SemanticError};
use crate::tree::{Expression, FunctionArg, ReturnType};

pub(super) fn validate_expression(ctx: &mut Ctx<'_>, expr: &Expression, at: &str) {
    match expr {
        Expression::Value { value_source, .. } => {
            let catalogs = ctx.catalogs;
            if let Some(source) = value_source {
                if !catalogs.value_sources.contains(source) {
                    ctx.push(
                        SemanticError::new(
                            SemanticCategory::ValueSource,
                            &path::key(at, "valueSource"),
                            format!("value source '{}' is not allowed", source),
                        )
                        .with_detail("valueSource", source.as_str())
                        .with_detail(
                            "allowed",
                            catalogs
                                .value_sources
                                .iter()
                                .cloned()
                                .collect::<Vec<_>>(),
                        ),
                    );
                }
            }
        }
        Expression::Field { .. } => {}
        Expression::Function {
            return_type,
            name,
            args,
        } => validate_function(ctx, *return_type, name, args, at),
        Expression::RuleRef(r) => validate_reference(ctx, r, at, RefContext::Expression),
        Expression::Group {
            return_type,
            expressions,
            operators,
        } => validate_group(ctx, *return_type, expressions, operators, at),
    }
}

fn validate_function(
    ctx: &mut Ctx<'_>,
    declared: ReturnType,
    name: &str,
    args: &[FunctionArg],
    at: &str,
) {
    let catalogs = ctx.catalogs;
    match catalogs.functions.get(name) {
        None => {
            ctx.push(
                SemanticError::new(
                    SemanticCategory::UnknownFunction,
                    at,
                    format!("unknown function '{}'", name),
                )
                .with_detail("function", name),
            );
        }
        Some(def) => {
            if def.return_type != declared {
                ctx.push(
                    SemanticError::new(
                        SemanticCategory::ReturnTypeMismatch,
                        &path::key(at, "returnType"),
                        format!(
                            "function '{}' returns '{}' but is declared as '{}'",
                            name, def.return_type, declared
                        ),
                    )
                    .with_detail("function", name)
                    .with_detail("expected", def.return_type.as_str())
                    .with_detail("actual", declared.as_str()),
                );
            }
            match &def.arity {
                Arity::Fixed(expected) => {
                    if args.len() != expected.len() {
                        ctx.push(
                            SemanticError::new(
                                SemanticCategory::ArgumentCount,
                                &path::key(at, "args"),
                                format!(
                                    "function '{}' expects {} argument(s), got {}",
                                    name,
                                    expected.len(),
                                    args.len()
                                ),
                            )
                            .with_detail("function", name)
                            .with_detail("expected", expected.len())
                            .with_detail("actual", args.len()),
                        );
                    }
                    for (i, (arg, want)) in args.iter().zip(expected.iter()).enumerate() {
                        if arg.name != want.name {
                            ctx.push(
                                SemanticError::new(
                                    SemanticCategory::ArgumentName,
                                    &path::key(&path::index(at, "args", i), "name"),
                                    format!(
                                        "argument {} of '{}' must be '{}', got '{}'",
                                        i, name, want.name, arg.name
                                    ),
                                )
                                .with_detail("function", name)
                                .with_detail("position", i)
                                .with_detail("expected", want.name.as_str())
                                .with_detail("actual", arg.name.as_str()),
                            );
                        }
                    }
                }
                Arity::Dynamic(d) => {
                    if args.len() < d.min || args.len() > d.max {
                        ctx.push(
                            SemanticError::new(
                                SemanticCategory::ArgumentCount,
                                &path::key(at, "args"),
                                format!(
                                    "function '{}' expects between {} and {} arguments, got {}",
                                    name,
                                    d.min,
                                    d.max,
                                    args.len()
                                ),
                            )
                            .with_detail("function", name)
                            .with_detail("min", d.min)
                            .with_detail("max", d.max)
                            .with_detail("actual", args.len()),
                        );
                    }
                }
            }
        }
    }

    for (i, arg) in args.iter().enumerate() {
        validate_expression(ctx, &arg.value, &path::key(&path::index(at, "args", i), "value"));
    }
}

fn validate_group(
    ctx: &mut Ctx<'_>,
    return_type: ReturnType,
    expressions: &[Expression],
    operators: &[String],
    at: &str,
) {
    if expressions.is_empty() || operators.len() + 1 != expressions.len() {
        ctx.push(
            SemanticError::new(
                SemanticCategory::GroupArity,
                at,
                format!(
                    "group with {} expression(s) needs {} operator(s), got {}",
                    expressions.len(),
                    expressions.len().saturating_sub(1),
                    operators.len()
                ),
            )
            .with_detail("expressions", expressions.len())
            .with_detail("operators", operators.len()),
        );
    }

    let catalogs = ctx.catalogs;
    let allowed = catalogs.types.expression_operators(return_type);
    for (i, symbol) in operators.iter().enumerate() {
        let at_op = path::index(at, "operators", i);
        match catalogs.types.symbol(symbol) {
            None => ctx.push(
                SemanticError::new(
                    SemanticCategory::UnknownOperator,
                    &at_op,
                    format!("unknown expression operator symbol '{}'", symbol),
                )
                .with_detail("symbol", symbol.as_str()),
            ),
            Some(name) if !allowed.contains(name) => {
                let message = if allowed.is_empty() {
                    format!(
                        "operator '{}' ({}) is not valid: return type '{}' permits no expression operators",
                        symbol, name, return_type
                    )
                } else {
                    format!(
                        "operator '{}' ({}) is not valid for return type '{}'",
                        symbol, name, return_type
                    )
                };
                let err = SemanticError::new(SemanticCategory::InvalidExpressionOperator, &at_op, message)
                    .with_detail("symbol", symbol.as_str())
                    .with_detail("operator", name)
                    .with_detail("returnType", return_type.as_str())
                    .with_detail("allowed", allowed.iter().cloned().collect::<Vec<_>>());
                ctx.push(err);
            }
            Some(_) => {}
        }
    }

    for (i, child) in expressions.iter().enumerate() {
        validate_expression(ctx, child, &path::index(at, "expressions", i));
    }
}

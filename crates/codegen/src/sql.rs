//! Rule tree to SQL fragment compilation.
//!
//! The generator walks a rule's definition depth first and stops at the
//! first problem. Referenced rules are resolved, compiled in place and
//! spliced in parentheses; errors raised inside a referenced rule carry a
//! path of the form `{ref path}@{uuid}:{version}.definition...`.

use crate::dialect::SqlDialect;
use crate::error::{GenerationCategory, GenerationError};
use crate::template;
use rulebook_core::error::path;
use rulebook_core::{
    CaseContent, Cardinality, Catalogs, Comparison, Condition, ConditionGroup, ConditionNode,
    Conjunction, Definition, Expression, FunctionArg, Operand, ReferenceChain, ResolveError,
    ReturnType, Rule, RuleKey, RuleReference, RuleResolver,
};
use serde_json::Value;

/// Resolutions allowed per top-level compile unless configured otherwise.
pub const DEFAULT_MAX_REFERENCES: usize = 64;

/// Compiles rules against fixed catalogs, dialect and resolver.
pub struct SqlGenerator<'a> {
    catalogs: &'a Catalogs,
    dialect: &'a SqlDialect,
    resolver: &'a dyn RuleResolver,
    max_references: usize,
}

impl<'a> SqlGenerator<'a> {
    pub fn new(
        catalogs: &'a Catalogs,
        dialect: &'a SqlDialect,
        resolver: &'a dyn RuleResolver,
    ) -> Self {
        SqlGenerator {
            catalogs,
            dialect,
            resolver,
            max_references: DEFAULT_MAX_REFERENCES,
        }
    }

    /// Bound the number of references expanded by one `compile` call.
    pub fn with_max_references(mut self, max: usize) -> Self {
        self.max_references = max;
        self
    }

    pub fn compile(&self, rule: &Rule) -> Result<String, GenerationError> {
        tracing::debug!(rule = %rule.id, structure = %rule.structure(), "compiling rule");
        let mut emitter = Emitter {
            gen: self,
            chain: ReferenceChain::rooted(rule),
            resolutions: 0,
        };
        let result = emitter.definition(&rule.definition, path::ROOT);
        match &result {
            Ok(sql) => tracing::debug!(
                rule = %rule.id,
                references = emitter.resolutions,
                bytes = sql.len(),
                "compiled rule"
            ),
            Err(e) => tracing::debug!(rule = %rule.id, error = %e, "compilation failed"),
        }
        result
    }
}

/// Per-call state: the reference chain and the resolution count.
struct Emitter<'g, 'a> {
    gen: &'g SqlGenerator<'a>,
    chain: ReferenceChain,
    resolutions: usize,
}

impl Emitter<'_, '_> {
    fn definition(&mut self, definition: &Definition, at: &str) -> Result<String, GenerationError> {
        match definition {
            Definition::Expression(e) => self.expression(e, at),
            Definition::Condition(n) => self.node(n, at),
            Definition::Case(c) => self.case(c, at),
        }
    }

    // ── Expressions ──────────────────────────────────────────────

    fn expression(&mut self, expr: &Expression, at: &str) -> Result<String, GenerationError> {
        match expr {
            Expression::Value {
                return_type,
                literal,
                ..
            } => self.literal(*return_type, literal, at),
            Expression::Field { path: field, .. } => self.field(field, at),
            Expression::Function { name, args, .. } => self.function(name, args, at),
            Expression::RuleRef(reference) => self.reference(reference, at),
            Expression::Group {
                expressions,
                operators,
                ..
            } => self.group(expressions, operators, at),
        }
    }

    fn literal(&self, return_type: ReturnType, literal: &Value, at: &str) -> Result<String, GenerationError> {
        let dialect = self.gen.dialect;
        let sql = match (return_type, literal) {
            (_, Value::Null) => Some(dialect.null_literal.clone()),
            (ReturnType::Text | ReturnType::Date, Value::String(s)) => Some(dialect.quote_string(s)),
            (ReturnType::Number, Value::Number(n)) => Some(n.to_string()),
            (ReturnType::Number, Value::String(s)) => {
                let trimmed = s.trim();
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Some(trimmed.to_string()),
                    _ => None,
                }
            }
            (ReturnType::Boolean, Value::Bool(b)) => Some(self.boolean(*b)),
            (ReturnType::Boolean, Value::String(s)) if s == "true" => Some(self.boolean(true)),
            (ReturnType::Boolean, Value::String(s)) if s == "false" => Some(self.boolean(false)),
            _ => None,
        };
        sql.ok_or_else(|| {
            GenerationError::new(
                GenerationCategory::InvalidLiteral,
                &path::key(at, "literal"),
                format!("literal {} is not a valid {} value", literal, return_type),
            )
            .with_detail("returnType", return_type.as_str())
            .with_detail("literal", literal.clone())
        })
    }

    fn boolean(&self, b: bool) -> String {
        if b {
            self.gen.dialect.true_literal.clone()
        } else {
            self.gen.dialect.false_literal.clone()
        }
    }

    fn field(&self, field: &str, at: &str) -> Result<String, GenerationError> {
        let mut quoted = Vec::new();
        for segment in field.split('.') {
            if segment.is_empty() {
                return Err(GenerationError::new(
                    GenerationCategory::InvalidFieldPath,
                    &path::key(at, "path"),
                    format!("field path '{}' has an empty segment", field),
                )
                .with_detail("path", field));
            }
            quoted.push(self.gen.dialect.quote_identifier(segment));
        }
        Ok(quoted.join("."))
    }

    fn function(&mut self, name: &str, args: &[FunctionArg], at: &str) -> Result<String, GenerationError> {
        let gen = self.gen;
        if gen.catalogs.functions.get(name).is_none() {
            return Err(GenerationError::new(
                GenerationCategory::UnmappedFunction,
                &path::key(at, "name"),
                format!("function '{}' is not in the function catalog", name),
            )
            .with_detail("function", name));
        }
        let Some(template) = gen.dialect.function_templates.get(name) else {
            return Err(GenerationError::new(
                GenerationCategory::UnmappedFunction,
                &path::key(at, "name"),
                format!(
                    "dialect '{}' has no template for function '{}'",
                    gen.dialect.name, name
                ),
            )
            .with_detail("function", name)
            .with_detail("dialect", gen.dialect.name.as_str()));
        };

        let compiled = args
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                self.expression(&arg.value, &path::key(&path::index(at, "args", i), "value"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        template::render(template, |slot| match slot {
            "*" => Some(compiled.join(", ")),
            n => n.parse::<usize>().ok().and_then(|i| compiled.get(i)).cloned(),
        })
        .map_err(|slot| {
            GenerationError::new(
                GenerationCategory::Template,
                at,
                format!(
                    "template for function '{}' cannot fill slot '{}' from {} argument(s)",
                    name,
                    slot,
                    compiled.len()
                ),
            )
            .with_detail("function", name)
            .with_detail("slot", slot)
        })
    }

    fn group(&mut self, expressions: &[Expression], operators: &[String], at: &str) -> Result<String, GenerationError> {
        let arity_error = || {
            GenerationError::new(
                GenerationCategory::GroupArity,
                at,
                format!(
                    "group of {} expression(s) needs {} operator(s), got {}",
                    expressions.len(),
                    expressions.len().saturating_sub(1),
                    operators.len()
                ),
            )
            .with_detail("expressions", expressions.len())
            .with_detail("operators", operators.len())
        };
        let Some((first, rest)) = expressions.split_first() else {
            return Err(arity_error());
        };
        if rest.len() != operators.len() {
            return Err(arity_error());
        }

        let mut sql = self.expression(first, &path::index(at, "expressions", 0))?;
        for (i, (symbol, operand)) in operators.iter().zip(rest).enumerate() {
            let token = self.operator_token(symbol, &path::index(at, "operators", i))?;
            let rhs = self.expression(operand, &path::index(at, "expressions", i + 1))?;
            sql.push(' ');
            sql.push_str(&token);
            sql.push(' ');
            sql.push_str(&rhs);
        }
        Ok(format!("({})", sql))
    }

    fn operator_token(&self, symbol: &str, at: &str) -> Result<String, GenerationError> {
        let gen = self.gen;
        let Some(name) = gen.catalogs.types.symbol(symbol) else {
            return Err(GenerationError::new(
                GenerationCategory::UnmappedOperator,
                at,
                format!("symbol '{}' is not a known expression operator", symbol),
            )
            .with_detail("symbol", symbol));
        };
        match gen.dialect.expression_operators.get(name) {
            Some(token) => Ok(token.clone()),
            None => Err(GenerationError::new(
                GenerationCategory::UnmappedOperator,
                at,
                format!(
                    "dialect '{}' has no token for operator '{}' ('{}')",
                    gen.dialect.name, name, symbol
                ),
            )
            .with_detail("symbol", symbol)
            .with_detail("operator", name)),
        }
    }

    // ── Conditions ───────────────────────────────────────────────

    fn node(&mut self, node: &ConditionNode, at: &str) -> Result<String, GenerationError> {
        match node {
            ConditionNode::Condition(c) => self.condition(c, at),
            ConditionNode::Group(g) => self.condition_group(g, at),
        }
    }

    fn condition(&mut self, condition: &Condition, at: &str) -> Result<String, GenerationError> {
        match condition {
            Condition::Compare(cmp) => self.comparison(cmp, at),
            Condition::Reference(r) => self.reference(&r.rule_ref, &path::key(at, "ruleRef")),
        }
    }

    fn condition_group(&mut self, group: &ConditionGroup, at: &str) -> Result<String, GenerationError> {
        let body = match group {
            ConditionGroup::Group(body) => body,
            ConditionGroup::Reference(r) => {
                return self.reference(&r.rule_ref, &path::key(at, "ruleRef"))
            }
        };
        if body.conditions.is_empty() {
            return Err(GenerationError::new(
                GenerationCategory::EmptyGroup,
                &path::key(at, "conditions"),
                "condition group has no conditions",
            ));
        }
        let conjunction = match body.conjunction {
            Conjunction::And => &self.gen.dialect.conjunctions.and,
            Conjunction::Or => &self.gen.dialect.conjunctions.or,
        };
        let separator = format!(" {} ", conjunction);
        let parts = body
            .conditions
            .iter()
            .enumerate()
            .map(|(i, child)| self.node(child, &path::index(at, "conditions", i)))
            .collect::<Result<Vec<_>, _>>()?;
        let joined = format!("({})", parts.join(&separator));
        Ok(if body.negate {
            format!("NOT {}", joined)
        } else {
            joined
        })
    }

    fn comparison(&mut self, cmp: &Comparison, at: &str) -> Result<String, GenerationError> {
        let gen = self.gen;
        let op = cmp.operator.as_str();
        let op_path = path::key(at, "operator");
        let Some(def) = gen.catalogs.types.operator(op) else {
            return Err(GenerationError::new(
                GenerationCategory::UnmappedOperator,
                &op_path,
                format!("condition operator '{}' is not in the type catalog", op),
            )
            .with_detail("operator", op));
        };
        let Some(template) = gen.dialect.condition_templates.get(op) else {
            return Err(GenerationError::new(
                GenerationCategory::UnmappedOperator,
                &op_path,
                format!(
                    "dialect '{}' has no template for condition operator '{}'",
                    gen.dialect.name, op
                ),
            )
            .with_detail("operator", op)
            .with_detail("dialect", gen.dialect.name.as_str()));
        };

        let mut slots = ConditionSlots {
            left: self.expression(&cmp.left, &path::key(at, "left"))?,
            ..ConditionSlots::default()
        };
        let right_at = path::key(at, "right");
        match (def.cardinality, &cmp.right) {
            (Cardinality::None, None) => {}
            (Cardinality::One, Some(Operand::Single(e))) => {
                slots.right = Some(self.expression(e, &right_at)?);
            }
            (Cardinality::Two, Some(Operand::List(items))) if items.len() == 2 => {
                slots.low = Some(self.expression(&items[0], &path::index(at, "right", 0))?);
                slots.high = Some(self.expression(&items[1], &path::index(at, "right", 1))?);
            }
            (Cardinality::Range { min, max }, Some(Operand::List(items)))
                if (min..=max).contains(&items.len()) =>
            {
                let values = items
                    .iter()
                    .enumerate()
                    .map(|(i, e)| self.expression(e, &path::index(at, "right", i)))
                    .collect::<Result<Vec<_>, _>>()?;
                slots.values = Some(values.join(", "));
            }
            (cardinality, right) => {
                return Err(GenerationError::new(
                    GenerationCategory::Cardinality,
                    &right_at,
                    format!(
                        "right operand of '{}' does not fit cardinality {}",
                        op,
                        cardinality.to_json()
                    ),
                )
                .with_detail("operator", op)
                .with_detail("cardinality", cardinality.to_json())
                .with_detail("actual", operand_shape(right.as_ref())));
            }
        }

        template::render(template, |slot| slots.get(slot)).map_err(|slot| {
            GenerationError::new(
                GenerationCategory::Template,
                &op_path,
                format!(
                    "template for condition operator '{}' cannot fill slot '{}'",
                    op, slot
                ),
            )
            .with_detail("operator", op)
            .with_detail("slot", slot)
        })
    }

    // ── Case ─────────────────────────────────────────────────────

    fn case(&mut self, content: &CaseContent, at: &str) -> Result<String, GenerationError> {
        if content.when_clauses.is_empty() {
            return Err(GenerationError::new(
                GenerationCategory::EmptyCase,
                &path::key(at, "whenClauses"),
                "case has no when clauses",
            ));
        }
        let mut sql = String::from("CASE");
        for (i, clause) in content.when_clauses.iter().enumerate() {
            let clause_at = path::index(at, "whenClauses", i);
            let when = self.node(&clause.when, &path::key(&clause_at, "when"))?;
            let then = self.expression(&clause.then, &path::key(&clause_at, "then"))?;
            sql.push_str(&format!(" WHEN {} THEN {}", when, then));
        }
        if let Some(else_clause) = &content.else_clause {
            let e = self.expression(else_clause, &path::key(at, "elseClause"))?;
            sql.push_str(&format!(" ELSE {}", e));
        }
        sql.push_str(" END");
        Ok(sql)
    }

    // ── References ───────────────────────────────────────────────

    /// `at` points at the reference object itself.
    fn reference(&mut self, reference: &RuleReference, at: &str) -> Result<String, GenerationError> {
        let key = RuleKey::from(reference);
        if let Err(cycle) = self.chain.enter(&key) {
            tracing::warn!(reference = %key, chain = ?cycle, "reference cycle while compiling");
            return Err(GenerationError::new(
                GenerationCategory::CycleDetected,
                at,
                format!("reference to {} closes a cycle: {}", key, cycle.join(" -> ")),
            )
            .with_detail("uuid", key.uuid.as_str())
            .with_detail("version", key.version)
            .with_detail("chain", cycle));
        }
        let result = self.expand(&key, at);
        self.chain.leave();
        result
    }

    fn expand(&mut self, key: &RuleKey, at: &str) -> Result<String, GenerationError> {
        let gen = self.gen;
        if self.resolutions >= gen.max_references {
            tracing::warn!(reference = %key, limit = gen.max_references, "reference limit reached");
            return Err(GenerationError::new(
                GenerationCategory::ReferenceLimit,
                at,
                format!(
                    "more than {} references expanded while compiling",
                    gen.max_references
                ),
            )
            .with_detail("limit", gen.max_references));
        }
        self.resolutions += 1;

        tracing::trace!(reference = %key, depth = self.chain.depth(), "resolving reference for compilation");
        let resolved = gen.resolver.resolve(key).map_err(|e| match e {
            ResolveError::NotFound { .. } => GenerationError::new(
                GenerationCategory::UnresolvedReference,
                at,
                format!("referenced rule {} does not exist", key),
            )
            .with_detail("id", key.id.as_str())
            .with_detail("uuid", key.uuid.as_str())
            .with_detail("version", key.version),
            other => GenerationError::new(
                GenerationCategory::Resolver,
                at,
                format!("could not resolve rule {}: {}", key, other),
            )
            .with_detail("id", key.id.as_str()),
        })?;

        let inner = format!("{}@{}:{}.definition", at, key.uuid, key.version);
        let sql = self.definition(&resolved.rule.definition, &inner)?;
        Ok(format!("({})", sql))
    }
}

#[derive(Default)]
struct ConditionSlots {
    left: String,
    right: Option<String>,
    low: Option<String>,
    high: Option<String>,
    values: Option<String>,
}

impl ConditionSlots {
    fn get(&self, slot: &str) -> Option<String> {
        match slot {
            "left" => Some(self.left.clone()),
            "right" => self.right.clone(),
            "low" => self.low.clone(),
            "high" => self.high.clone(),
            "values" => self.values.clone(),
            _ => None,
        }
    }
}

fn operand_shape(right: Option<&Operand>) -> Value {
    match right {
        None => Value::from("null"),
        Some(Operand::Single(_)) => Value::from("expression"),
        Some(Operand::List(items)) => Value::from(items.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulebook_core::NoResolver;
    use serde_json::json;

    fn compile_definition(structure: &str, return_type: &str, definition: Value) -> Result<String, GenerationError> {
        let rule: Rule = serde_json::from_value(json!({
            "structure": structure,
            "returnType": return_type,
            "id": "t",
            "version": 1,
            "definition": definition
        }))
        .unwrap();
        let catalogs = Catalogs::builtin().unwrap();
        let dialect = SqlDialect::builtin().unwrap();
        SqlGenerator::new(&catalogs, &dialect, &NoResolver).compile(&rule)
    }

    fn expr(definition: Value, return_type: &str) -> Result<String, GenerationError> {
        compile_definition("expression", return_type, definition)
    }

    #[test]
    fn literals_follow_their_declared_type() {
        assert_eq!(
            expr(json!({"kind": "value", "returnType": "text", "literal": "O'Brien"}), "text").unwrap(),
            "'O''Brien'"
        );
        assert_eq!(
            expr(json!({"kind": "value", "returnType": "number", "literal": 12.5}), "number").unwrap(),
            "12.5"
        );
        assert_eq!(
            expr(json!({"kind": "value", "returnType": "number", "literal": "42"}), "number").unwrap(),
            "42"
        );
        assert_eq!(
            expr(json!({"kind": "value", "returnType": "boolean", "literal": true}), "boolean").unwrap(),
            "TRUE"
        );
        assert_eq!(
            expr(json!({"kind": "value", "returnType": "date", "literal": null}), "date").unwrap(),
            "NULL"
        );
    }

    #[test]
    fn non_numeric_string_is_not_a_number_literal() {
        let err = expr(
            json!({"kind": "value", "returnType": "number", "literal": "1; DROP TABLE t"}),
            "number",
        )
        .unwrap_err();
        assert_eq!(err.category, GenerationCategory::InvalidLiteral);
        assert_eq!(err.path, "$.definition.literal");
    }

    #[test]
    fn field_segments_are_quoted() {
        assert_eq!(
            expr(json!({"kind": "field", "returnType": "number", "path": "customer.age"}), "number").unwrap(),
            "\"customer\".\"age\""
        );
        let err = expr(json!({"kind": "field", "returnType": "number", "path": "customer..age"}), "number")
            .unwrap_err();
        assert_eq!(err.category, GenerationCategory::InvalidFieldPath);
    }

    #[test]
    fn function_arguments_fill_template_slots() {
        let sql = expr(
            json!({
                "kind": "function", "returnType": "number", "name": "round",
                "args": [
                    {"name": "value", "value": {"kind": "field", "returnType": "number", "path": "o.total"}},
                    {"name": "digits", "value": {"kind": "value", "returnType": "number", "literal": 2}}
                ]
            }),
            "number",
        )
        .unwrap();
        assert_eq!(sql, "ROUND(\"o\".\"total\", 2)");
    }

    #[test]
    fn variadic_function_joins_all_arguments() {
        let sql = expr(
            json!({
                "kind": "function", "returnType": "number", "name": "greatest",
                "args": [
                    {"name": "a", "value": {"kind": "value", "returnType": "number", "literal": 1}},
                    {"name": "b", "value": {"kind": "value", "returnType": "number", "literal": 2}},
                    {"name": "c", "value": {"kind": "value", "returnType": "number", "literal": 3}}
                ]
            }),
            "number",
        )
        .unwrap();
        assert_eq!(sql, "GREATEST(1, 2, 3)");
    }

    #[test]
    fn unknown_function_is_unmapped() {
        let err = expr(
            json!({"kind": "function", "returnType": "number", "name": "sqrt", "args": []}),
            "number",
        )
        .unwrap_err();
        assert_eq!(err.category, GenerationCategory::UnmappedFunction);
        assert_eq!(err.path, "$.definition.name");
    }

    #[test]
    fn missing_argument_is_a_template_error() {
        let err = expr(
            json!({"kind": "function", "returnType": "number", "name": "round", "args": [
                {"name": "value", "value": {"kind": "value", "returnType": "number", "literal": 1}}
            ]}),
            "number",
        )
        .unwrap_err();
        assert_eq!(err.category, GenerationCategory::Template);
        assert_eq!(err.details["slot"], "1");
    }

    #[test]
    fn group_folds_left_to_right_in_parentheses() {
        let sql = expr(
            json!({
                "kind": "group", "returnType": "number",
                "expressions": [
                    {"kind": "field", "returnType": "number", "path": "a"},
                    {"kind": "value", "returnType": "number", "literal": 1},
                    {"kind": "value", "returnType": "number", "literal": 2}
                ],
                "operators": ["+", "*"]
            }),
            "number",
        )
        .unwrap();
        assert_eq!(sql, "(\"a\" + 1 * 2)");
    }

    #[test]
    fn group_with_unknown_symbol_is_unmapped() {
        let err = expr(
            json!({
                "kind": "group", "returnType": "number",
                "expressions": [
                    {"kind": "value", "returnType": "number", "literal": 1},
                    {"kind": "value", "returnType": "number", "literal": 2}
                ],
                "operators": ["^"]
            }),
            "number",
        )
        .unwrap_err();
        assert_eq!(err.category, GenerationCategory::UnmappedOperator);
        assert_eq!(err.path, "$.definition.operators[0]");
    }

    #[test]
    fn group_operator_count_must_match() {
        let err = expr(
            json!({
                "kind": "group", "returnType": "number",
                "expressions": [{"kind": "value", "returnType": "number", "literal": 1}],
                "operators": ["+"]
            }),
            "number",
        )
        .unwrap_err();
        assert_eq!(err.category, GenerationCategory::GroupArity);
    }

    #[test]
    fn condition_templates_by_cardinality() {
        let field = json!({"kind": "field", "returnType": "number", "path": "age"});
        let n = |v: i64| json!({"kind": "value", "returnType": "number", "literal": v});
        let cond = |op: &str, right: Value| {
            compile_definition(
                "condition",
                "boolean",
                json!({"left": field.clone(), "operator": op, "right": right}),
            )
        };
        assert_eq!(cond("is_empty", Value::Null).unwrap(), "\"age\" IS NULL");
        assert_eq!(cond("greater_than", n(18)).unwrap(), "\"age\" > 18");
        assert_eq!(
            cond("between", json!([n(18), n(65)])).unwrap(),
            "\"age\" BETWEEN 18 AND 65"
        );
        assert_eq!(
            cond("in", json!([n(1), n(2), n(3)])).unwrap(),
            "\"age\" IN (1, 2, 3)"
        );
        let err = cond("between", json!([n(18)])).unwrap_err();
        assert_eq!(err.category, GenerationCategory::Cardinality);
        assert_eq!(err.path, "$.definition.right");
    }

    #[test]
    fn negated_group_gets_not_prefix() {
        let sql = compile_definition(
            "condition",
            "boolean",
            json!({
                "conjunction": "OR",
                "negate": true,
                "conditions": [
                    {"left": {"kind": "field", "returnType": "boolean", "path": "a"}, "operator": "is_true", "right": null},
                    {"left": {"kind": "field", "returnType": "boolean", "path": "b"}, "operator": "is_false", "right": null}
                ]
            }),
        )
        .unwrap();
        assert_eq!(sql, "NOT (\"a\" IS TRUE OR \"b\" IS FALSE)");
    }

    #[test]
    fn case_without_else_omits_keyword() {
        let sql = compile_definition(
            "case",
            "text",
            json!({
                "whenClauses": [{
                    "when": {"left": {"kind": "field", "returnType": "number", "path": "score"}, "operator": "greater_than_or_equal", "right": {"kind": "value", "returnType": "number", "literal": 90}},
                    "then": {"kind": "value", "returnType": "text", "literal": "A"}
                }]
            }),
        )
        .unwrap();
        assert_eq!(sql, "CASE WHEN \"score\" >= 90 THEN 'A' END");
    }

    #[test]
    fn empty_case_is_rejected() {
        let err = compile_definition("case", "text", json!({"whenClauses": []})).unwrap_err();
        assert_eq!(err.category, GenerationCategory::EmptyCase);
    }

    #[test]
    fn empty_condition_group_is_rejected() {
        let err = compile_definition(
            "condition",
            "boolean",
            json!({"conjunction": "AND", "conditions": []}),
        )
        .unwrap_err();
        assert_eq!(err.category, GenerationCategory::EmptyGroup);
        assert_eq!(err.path, "$.definition.conditions");
    }

    #[test]
    fn missing_reference_is_unresolved() {
        let err = expr(
            json!({"kind": "ruleRef", "returnType": "number", "id": "x", "uuid": "x-1", "version": 1}),
            "number",
        )
        .unwrap_err();
        assert_eq!(err.category, GenerationCategory::UnresolvedReference);
        assert_eq!(err.path, "$.definition");
    }
}

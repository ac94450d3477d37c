//! Rule tree model: rules, expressions, conditions and case content.
//!
//! Trees arrive as caller-supplied JSON that has already passed the
//! upstream structural checker. Each syntactic category is a closed enum
//! so the validator and the SQL generator must handle every variant.
//!
//! Conditions and condition groups have two mutually exclusive shapes
//! (inline or `ruleRef`). Both are deserialized through [`RawNode`], an
//! all-optional view of every key either shape can carry, so that a node
//! supplying both shapes keeps a record of the conflicting keys instead of
//! silently dropping them.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ──────────────────────────────────────────────
// Return types and structures
// ──────────────────────────────────────────────

/// Declared semantic type of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Boolean,
    Number,
    Text,
    Date,
}

impl ReturnType {
    pub const ALL: [ReturnType; 4] = [
        ReturnType::Boolean,
        ReturnType::Number,
        ReturnType::Text,
        ReturnType::Date,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnType::Boolean => "boolean",
            ReturnType::Number => "number",
            ReturnType::Text => "text",
            ReturnType::Date => "date",
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(ReturnType::Boolean),
            "number" => Ok(ReturnType::Number),
            "text" => Ok(ReturnType::Text),
            "date" => Ok(ReturnType::Date),
            other => Err(format!("unknown return type '{}'", other)),
        }
    }
}

/// Selects how a rule's `definition` is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Case,
    Condition,
    Expression,
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Structure::Case => "case",
            Structure::Condition => "condition",
            Structure::Expression => "expression",
        })
    }
}

// ──────────────────────────────────────────────
// Rule
// ──────────────────────────────────────────────

/// A complete rule as submitted for validation or compilation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    pub id: String,
    /// Stable identity shared by every version of the rule. Rules that are
    /// never referenced may omit it.
    pub uuid: Option<String>,
    pub version: u32,
    pub return_type: ReturnType,
    pub rule_type: Option<String>,
    /// Caller-owned metadata, carried through untouched.
    pub metadata: serde_json::Value,
    pub definition: Definition,
}

/// The body of a rule, selected by its `structure`.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Case(CaseContent),
    Condition(ConditionNode),
    Expression(Expression),
}

impl Rule {
    pub fn structure(&self) -> Structure {
        match self.definition {
            Definition::Case(_) => Structure::Case,
            Definition::Condition(_) => Structure::Condition,
            Definition::Expression(_) => Structure::Expression,
        }
    }

    /// The `(uuid, version)` pair used for reference cycle tracking.
    pub fn identity(&self) -> Option<(&str, u32)> {
        self.uuid.as_deref().map(|u| (u, self.version))
    }

    pub fn from_json_str(s: &str) -> Result<Rule, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    structure: Structure,
    return_type: ReturnType,
    #[serde(default)]
    rule_type: Option<String>,
    id: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    version: u32,
    #[serde(default)]
    metadata: serde_json::Value,
    definition: serde_json::Value,
}

impl TryFrom<RawRule> for Rule {
    type Error = serde_json::Error;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let definition = match raw.structure {
            Structure::Case => Definition::Case(serde_json::from_value(raw.definition)?),
            Structure::Condition => Definition::Condition(serde_json::from_value(raw.definition)?),
            Structure::Expression => {
                Definition::Expression(serde_json::from_value(raw.definition)?)
            }
        };
        Ok(Rule {
            id: raw.id,
            uuid: raw.uuid,
            version: raw.version,
            return_type: raw.return_type,
            rule_type: raw.rule_type,
            metadata: raw.metadata,
            definition,
        })
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Rule", 8)?;
        st.serialize_field("structure", &self.structure())?;
        st.serialize_field("returnType", &self.return_type)?;
        st.serialize_field("ruleType", &self.rule_type)?;
        st.serialize_field("id", &self.id)?;
        st.serialize_field("uuid", &self.uuid)?;
        st.serialize_field("version", &self.version)?;
        st.serialize_field("metadata", &self.metadata)?;
        match &self.definition {
            Definition::Case(c) => st.serialize_field("definition", c)?,
            Definition::Condition(c) => st.serialize_field("definition", c)?,
            Definition::Expression(e) => st.serialize_field("definition", e)?,
        }
        st.end()
    }
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

/// Pointer to another stored rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ReturnType>,
    pub id: String,
    pub uuid: String,
    pub version: u32,
}

/// A named positional argument of a function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionArg {
    pub name: String,
    pub value: Expression,
}

/// An expression node, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expression {
    #[serde(rename_all = "camelCase")]
    Value {
        return_type: ReturnType,
        #[serde(default)]
        literal: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_source: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Field { return_type: ReturnType, path: String },
    #[serde(rename_all = "camelCase")]
    Function {
        return_type: ReturnType,
        name: String,
        #[serde(default)]
        args: Vec<FunctionArg>,
    },
    RuleRef(RuleReference),
    #[serde(rename_all = "camelCase")]
    Group {
        return_type: ReturnType,
        expressions: Vec<Expression>,
        #[serde(default)]
        operators: Vec<String>,
    },
}

impl Expression {
    /// The declared return type. Only references may leave it out.
    pub fn return_type(&self) -> Option<ReturnType> {
        match self {
            Expression::Value { return_type, .. }
            | Expression::Field { return_type, .. }
            | Expression::Function { return_type, .. }
            | Expression::Group { return_type, .. } => Some(*return_type),
            Expression::RuleRef(r) => r.return_type,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Value { .. } => "value",
            Expression::Field { .. } => "field",
            Expression::Function { .. } => "function",
            Expression::RuleRef(_) => "ruleRef",
            Expression::Group { .. } => "group",
        }
    }
}

// ──────────────────────────────────────────────
// Conditions
// ──────────────────────────────────────────────

/// Right-hand side of a comparison: a single operand or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    List(Vec<Expression>),
    Single(Box<Expression>),
}

/// An inline comparison `left operator right`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Expression,
    pub operator: String,
    pub right: Option<Operand>,
}

/// A `ruleRef` standing in for a condition or group.
///
/// `conflicts` names the keys of the inline shape that were supplied
/// alongside the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct RefNode {
    pub rule_ref: RuleReference,
    pub conflicts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conjunction {
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        })
    }
}

/// The inline shape of a condition group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBody {
    pub conjunction: Conjunction,
    pub negate: bool,
    pub conditions: Vec<ConditionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum Condition {
    Compare(Comparison),
    Reference(RefNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum ConditionGroup {
    Group(GroupBody),
    Reference(RefNode),
}

/// An element of a condition list, or a `when` clause: either a single
/// condition or a nested group. A node carrying `conjunction`, `negate` or
/// `conditions` is a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum ConditionNode {
    Condition(Condition),
    Group(ConditionGroup),
}

const INLINE_CONDITION_KEYS: [&str; 3] = ["left", "operator", "right"];
const INLINE_GROUP_KEYS: [&str; 3] = ["conjunction", "negate", "conditions"];

/// Keys other than `ruleRef` keep an explicit `null` as `Some(None)`, so a
/// reference node sent with `"right": null` still reports the key.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rule_ref: Option<RuleReference>,
    #[serde(default, deserialize_with = "key_present", skip_serializing_if = "Option::is_none")]
    left: Option<Option<Expression>>,
    #[serde(default, deserialize_with = "key_present", skip_serializing_if = "Option::is_none")]
    operator: Option<Option<String>>,
    #[serde(default, deserialize_with = "key_present", skip_serializing_if = "Option::is_none")]
    right: Option<Option<Operand>>,
    #[serde(default, deserialize_with = "key_present", skip_serializing_if = "Option::is_none")]
    conjunction: Option<Option<Conjunction>>,
    #[serde(default, deserialize_with = "key_present", skip_serializing_if = "Option::is_none")]
    negate: Option<Option<bool>>,
    #[serde(default, deserialize_with = "key_present", skip_serializing_if = "Option::is_none")]
    conditions: Option<Option<Vec<ConditionNode>>>,
}

fn key_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl RawNode {
    fn is_group_shape(&self) -> bool {
        self.conjunction.is_some() || self.negate.is_some() || self.conditions.is_some()
    }

    fn present(&self, key: &str) -> bool {
        match key {
            "left" => self.left.is_some(),
            "operator" => self.operator.is_some(),
            "right" => self.right.is_some(),
            "conjunction" => self.conjunction.is_some(),
            "negate" => self.negate.is_some(),
            "conditions" => self.conditions.is_some(),
            _ => false,
        }
    }

    fn conflicts(&self) -> Vec<String> {
        INLINE_CONDITION_KEYS
            .iter()
            .chain(INLINE_GROUP_KEYS.iter())
            .filter(|k| self.present(k))
            .map(|k| k.to_string())
            .collect()
    }
}

impl TryFrom<RawNode> for Condition {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        if let Some(rule_ref) = raw.rule_ref.clone() {
            let conflicts = raw.conflicts();
            return Ok(Condition::Reference(RefNode {
                rule_ref,
                conflicts,
            }));
        }
        match (raw.left.flatten(), raw.operator.flatten()) {
            (Some(left), Some(operator)) => Ok(Condition::Compare(Comparison {
                left,
                operator,
                right: raw.right.flatten(),
            })),
            _ => Err("condition requires either `ruleRef` or `left` and `operator`".to_string()),
        }
    }
}

impl TryFrom<RawNode> for ConditionGroup {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        if let Some(rule_ref) = raw.rule_ref.clone() {
            let conflicts = raw.conflicts();
            return Ok(ConditionGroup::Reference(RefNode {
                rule_ref,
                conflicts,
            }));
        }
        let conjunction = raw
            .conjunction
            .flatten()
            .ok_or_else(|| "condition group requires `conjunction`".to_string())?;
        let conditions = raw
            .conditions
            .flatten()
            .ok_or_else(|| "condition group requires `conditions`".to_string())?;
        Ok(ConditionGroup::Group(GroupBody {
            conjunction,
            negate: raw.negate.flatten().unwrap_or(false),
            conditions,
        }))
    }
}

impl TryFrom<RawNode> for ConditionNode {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        if raw.is_group_shape() {
            ConditionGroup::try_from(raw).map(ConditionNode::Group)
        } else {
            Condition::try_from(raw).map(ConditionNode::Condition)
        }
    }
}

impl From<RefNode> for RawNode {
    fn from(r: RefNode) -> Self {
        RawNode {
            rule_ref: Some(r.rule_ref),
            ..RawNode::default()
        }
    }
}

impl From<Condition> for RawNode {
    fn from(c: Condition) -> Self {
        match c {
            Condition::Compare(cmp) => RawNode {
                left: Some(Some(cmp.left)),
                operator: Some(Some(cmp.operator)),
                right: cmp.right.map(Some),
                ..RawNode::default()
            },
            Condition::Reference(r) => r.into(),
        }
    }
}

impl From<ConditionGroup> for RawNode {
    fn from(g: ConditionGroup) -> Self {
        match g {
            ConditionGroup::Group(body) => RawNode {
                conjunction: Some(Some(body.conjunction)),
                negate: Some(Some(body.negate)),
                conditions: Some(Some(body.conditions)),
                ..RawNode::default()
            },
            ConditionGroup::Reference(r) => r.into(),
        }
    }
}

impl From<ConditionNode> for RawNode {
    fn from(n: ConditionNode) -> Self {
        match n {
            ConditionNode::Condition(c) => c.into(),
            ConditionNode::Group(g) => g.into(),
        }
    }
}

// ──────────────────────────────────────────────
// Case
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhenClause {
    pub when: ConditionNode,
    pub then: Expression,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseContent {
    pub when_clauses: Vec<WhenClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_clause: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_result_name: Option<String>,
}

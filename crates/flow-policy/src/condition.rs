//! # Condition Evaluator
//!
//! Conditions gate a rule on attributes of the request. Each [`Condition`]
//! names a dotted field path, an [`Operator`] and an operand; a
//! [`ConditionGroup`] combines them as a conjunction (`all`) or disjunction
//! (`any`).
//!
//! ## Fail-closed semantics
//!
//! Evaluation never errors. A path that does not resolve, an operand of the
//! wrong kind, or an operator this version does not know all make the
//! individual predicate `false`; the surrounding group and decision carry on.
//!
//! ## Document shape
//!
//! ```text
//! when:
//!   all:
//!     - { field: context.amount, operator: lte, value: 5000 }
//!     - { field: user.roles,     operator: in,  value: [manager] }
//! ```

use crate::context::EvaluationContext;
use crate::value::Value;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Comparison operator
///
/// Serialized in lowercase. `<` and `>` are accepted as spellings of `lt`
/// and `gt`. Any other name loads as [`Operator::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Structural equality
    Eq,
    /// Less than
    #[serde(alias = "<")]
    Lt,
    /// Greater than
    #[serde(alias = ">")]
    Gt,
    /// Less than or equal
    #[serde(alias = "<=")]
    Lte,
    /// Greater than or equal
    #[serde(alias = ">=")]
    Gte,
    /// Membership in a sequence operand
    In,
    /// Unrecognized operator; always evaluates to `false`
    #[serde(other)]
    Unknown,
}

impl Operator {
    /// Apply the operator to a resolved value and the condition operand
    ///
    /// Ordering operators only hold between two numbers or two strings.
    /// `In` requires the operand to be a sequence.
    #[must_use]
    pub fn apply(self, actual: &Value, operand: &Value) -> bool {
        match self {
            Self::Eq => actual == operand,
            Self::Lt => actual.compare(operand) == Some(Ordering::Less),
            Self::Gt => actual.compare(operand) == Some(Ordering::Greater),
            Self::Lte => matches!(
                actual.compare(operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Gte => matches!(
                actual.compare(operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::In => operand
                .as_list()
                .is_some_and(|items| items.contains(actual)),
            Self::Unknown => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "eq"),
            Self::Lt => write!(f, "lt"),
            Self::Gt => write!(f, "gt"),
            Self::Lte => write!(f, "lte"),
            Self::Gte => write!(f, "gte"),
            Self::In => write!(f, "in"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single field comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    /// Dotted path into the evaluation context (`context.amount`, `user.roles`)
    pub field: String,
    /// Comparison operator
    pub operator: Operator,
    /// Operand compared against the resolved field
    pub value: Value,
}

impl Condition {
    /// Create a new condition
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// `field eq value`
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// `field lt value`
    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Lt, value)
    }

    /// `field gt value`
    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Gt, value)
    }

    /// `field lte value`
    #[must_use]
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Lte, value)
    }

    /// `field gte value`
    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Gte, value)
    }

    /// `field in [values]`
    #[must_use]
    pub fn one_of<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(
            field,
            Operator::In,
            Value::List(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Number of dot-separated segments in the field path
    #[must_use]
    pub fn path_segments(&self) -> usize {
        self.field.split('.').count()
    }

    /// Evaluate against a context; an unresolved field is always `false`
    #[must_use]
    pub fn evaluate(&self, ctx: &EvaluationContext) -> bool {
        match ctx.resolve(&self.field) {
            Some(actual) => self.operator.apply(&actual, &self.value),
            None => false,
        }
    }
}

/// Conjunction or disjunction of conditions
///
/// Loaded from `{ all: [...] }` or `{ any: [...] }`. When both keys are
/// present `all` takes precedence; when neither is, the group is
/// [`ConditionGroup::Unconditional`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConditionGroupRaw", into = "ConditionGroupRaw")]
pub enum ConditionGroup {
    /// Every condition must hold (empty is `true`)
    All(Vec<Condition>),
    /// At least one condition must hold (empty is `false`)
    Any(Vec<Condition>),
    /// No conditions declared
    Unconditional,
}

impl ConditionGroup {
    /// Conjunction of `conditions`
    #[must_use]
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    /// Disjunction of `conditions`
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Conditions in declaration order
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        match self {
            Self::All(c) | Self::Any(c) => c,
            Self::Unconditional => &[],
        }
    }

    /// Evaluate the group against a context
    #[must_use]
    pub fn evaluate(&self, ctx: &EvaluationContext) -> bool {
        match self {
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(ctx)),
            Self::Any(conditions) => conditions.iter().any(|c| c.evaluate(ctx)),
            Self::Unconditional => true,
        }
    }
}

/// Evaluate a condition group against a context
///
/// Shorthand for [`ConditionGroup::evaluate`].
#[must_use]
pub fn evaluate(group: &ConditionGroup, ctx: &EvaluationContext) -> bool {
    group.evaluate(ctx)
}

/// Wire form of a condition group
///
/// Unknown keys are rejected: a misspelled `all` must not load as an
/// unconditional group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConditionGroupRaw {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    all: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    any: Option<Vec<Condition>>,
}

impl From<ConditionGroupRaw> for ConditionGroup {
    fn from(raw: ConditionGroupRaw) -> Self {
        match (raw.all, raw.any) {
            (Some(all), _) => Self::All(all),
            (None, Some(any)) => Self::Any(any),
            (None, None) => Self::Unconditional,
        }
    }
}

impl From<ConditionGroup> for ConditionGroupRaw {
    fn from(group: ConditionGroup) -> Self {
        match group {
            ConditionGroup::All(all) => Self {
                all: Some(all),
                any: None,
            },
            ConditionGroup::Any(any) => Self {
                all: None,
                any: Some(any),
            },
            ConditionGroup::Unconditional => Self::default(),
        }
    }
}

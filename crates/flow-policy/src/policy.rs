//! Policy definitions and validation logic
//!
//! This module provides the data model evaluated by the decision engine:
//! - `Effect`: what a matching rule contributes
//! - `Rule`: action + target pattern + optional condition group
//! - `Policy`: ordered rules (`flow`)
//! - `PolicySet`: a principal's ordered policies
//!
//! ## Document shapes
//!
//! A policy set is a sequence. Each entry is either a nested policy
//! `{ "flow": [rule, ...] }` or a bare rule, which loads as a policy holding
//! just that rule. Both shapes may be mixed in one document. Unknown keys
//! are rejected at every level.
//!
//! ## Load-time limits
//!
//! - `MAX_POLICIES_PER_SET` (256): policies per set
//! - `MAX_RULES_PER_POLICY` (1024): rules per policy
//! - `MAX_TARGET_PATTERN_LENGTH` (256): target pattern length
//! - `MAX_FIELD_PATH_SEGMENTS` (16): segments in a condition field path

use crate::condition::ConditionGroup;
use crate::context::EvaluationContext;
use crate::error::{PolicyError, Result};
use crate::target::TargetPattern;
use crate::{
    MAX_FIELD_PATH_SEGMENTS, MAX_POLICIES_PER_SET, MAX_RULES_PER_POLICY,
    MAX_TARGET_PATTERN_LENGTH,
};
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Outcome a matching rule contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Grants access unless a deny also matches
    Allow,
    /// Vetoes access immediately
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

/// A single allow/deny clause
///
/// Unknown keys are a load error, so a misspelled `when` cannot widen an
/// allow rule into an unconditional one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Effect when the rule matches
    pub effect: Effect,
    /// Action name, compared exactly (`invoice.read`)
    pub action: String,
    /// Target pattern (`invoice:*`, `users:101`)
    pub target: TargetPattern,
    /// Optional condition group; absent means unconditional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<ConditionGroup>,
}

impl Rule {
    /// Create a new unconditional rule
    #[must_use]
    pub fn new(effect: Effect, action: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            effect,
            action: action.into(),
            target: TargetPattern::new_unchecked(target),
            when: None,
        }
    }

    /// Create an allow rule
    #[must_use]
    pub fn allow(action: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(Effect::Allow, action, target)
    }

    /// Create a deny rule
    #[must_use]
    pub fn deny(action: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(Effect::Deny, action, target)
    }

    /// Gate this rule on a condition group
    #[must_use]
    pub fn when(mut self, group: ConditionGroup) -> Self {
        self.when = Some(group);
        self
    }

    /// Check whether this rule applies to a request
    ///
    /// In order: the action must be equal, the target pattern must cover the
    /// concrete target, and the condition group (if any) must hold. The
    /// effect is not consulted.
    #[must_use]
    pub fn applies_to(&self, ctx: &EvaluationContext) -> bool {
        if self.action != ctx.action() {
            return false;
        }

        if !self.target.matches(ctx.target()) {
            trace!(pattern = self.target.as_str(), target = ctx.target(), "target not covered");
            return false;
        }

        if let Some(group) = &self.when {
            if !group.evaluate(ctx) {
                trace!(action = self.action.as_str(), "conditions not satisfied");
                return false;
            }
        }

        true
    }

    /// Check load-time limits for this rule
    ///
    /// # Errors
    ///
    /// - `InvalidRule` if the action is empty
    /// - `PatternTooLong` if the target exceeds `MAX_TARGET_PATTERN_LENGTH`
    /// - `FieldPathTooLong` if a condition path exceeds `MAX_FIELD_PATH_SEGMENTS`
    pub fn validate(&self) -> Result<()> {
        if self.action.is_empty() {
            return Err(PolicyError::InvalidRule(
                "Rule action cannot be empty".to_string(),
            ));
        }

        let length = self.target.as_str().len();
        if length > MAX_TARGET_PATTERN_LENGTH {
            return Err(PolicyError::PatternTooLong {
                max: MAX_TARGET_PATTERN_LENGTH,
                length,
            });
        }

        if let Some(group) = &self.when {
            for condition in group.conditions() {
                let segments = condition.path_segments();
                if segments > MAX_FIELD_PATH_SEGMENTS {
                    return Err(PolicyError::FieldPathTooLong {
                        max: MAX_FIELD_PATH_SEGMENTS,
                        segments,
                    });
                }
            }
        }

        Ok(())
    }
}

/// An ordered sequence of rules
///
/// Fields are private so every instance goes through validation, either
/// via the constructors or via `#[serde(try_from)]` on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyRaw")]
pub struct Policy {
    /// Optional label used in logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    /// Rules in evaluation order
    flow: Vec<Rule>,
}

/// Raw policy entry for deserialization (internal use only)
///
/// One flat struct covers both shapes so that errors inside a rule keep
/// their own message. The presence of `flow` selects the nested shape;
/// otherwise the entry must be a complete bare rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyRaw {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    flow: Option<Vec<Rule>>,
    #[serde(default)]
    effect: Option<Effect>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    target: Option<TargetPattern>,
    #[serde(default)]
    when: Option<ConditionGroup>,
}

impl TryFrom<PolicyRaw> for Policy {
    type Error = PolicyError;

    fn try_from(raw: PolicyRaw) -> Result<Self> {
        let policy = match raw.flow {
            Some(flow) => {
                if raw.effect.is_some()
                    || raw.action.is_some()
                    || raw.target.is_some()
                    || raw.when.is_some()
                {
                    return Err(PolicyError::InvalidRule(
                        "a policy with `flow` cannot also carry rule fields".to_string(),
                    ));
                }
                Policy {
                    name: raw.name,
                    flow,
                }
            }
            None => {
                if raw.name.is_some() {
                    return Err(PolicyError::InvalidRule(
                        "`name` requires a `flow` of rules".to_string(),
                    ));
                }
                let missing = |field: &str| {
                    PolicyError::InvalidRule(alloc::format!("bare rule is missing `{field}`"))
                };
                Policy::from_rule(Rule {
                    effect: raw.effect.ok_or_else(|| missing("effect"))?,
                    action: raw.action.ok_or_else(|| missing("action"))?,
                    target: raw.target.ok_or_else(|| missing("target"))?,
                    when: raw.when,
                })
            }
        };

        policy.validate()?;
        Ok(policy)
    }
}

impl Policy {
    // ===== Constructors =====

    /// Create a new empty policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty policy with a label
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            flow: Vec::new(),
        }
    }

    /// Wrap a single rule, as a bare rule in a document would load
    #[must_use]
    pub fn from_rule(rule: Rule) -> Self {
        Self {
            name: None,
            flow: vec![rule],
        }
    }

    /// Build a policy from rules, validating them
    ///
    /// # Errors
    ///
    /// See `validate()`
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Result<Self> {
        let policy = Self {
            name: None,
            flow: rules.into_iter().collect(),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Add a rule to this policy
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::TooManyRules` if adding this rule would exceed `MAX_RULES_PER_POLICY`,
    /// or the rule's own validation error
    pub fn add_rule(mut self, rule: Rule) -> Result<Self> {
        if self.flow.len() >= MAX_RULES_PER_POLICY {
            return Err(PolicyError::TooManyRules {
                max: MAX_RULES_PER_POLICY,
                attempted: self.flow.len() + 1,
            });
        }

        rule.validate()?;
        self.flow.push(rule);
        Ok(self)
    }

    // ===== Accessors =====

    /// Get the policy label
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the rules in evaluation order
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.flow
    }

    /// Validate load-time limits
    ///
    /// An empty policy is valid; it simply never matches.
    ///
    /// # Errors
    ///
    /// - `TooManyRules` if the policy holds more than `MAX_RULES_PER_POLICY` rules
    /// - any error from `Rule::validate()`
    pub fn validate(&self) -> Result<()> {
        if self.flow.len() > MAX_RULES_PER_POLICY {
            return Err(PolicyError::TooManyRules {
                max: MAX_RULES_PER_POLICY,
                attempted: self.flow.len(),
            });
        }

        self.flow.iter().try_for_each(Rule::validate)
    }
}

/// A principal's ordered policies
///
/// The effective rule set is the in-order concatenation of every policy's
/// rules; see [`PolicySet::rules`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Policy>", into = "Vec<Policy>")]
pub struct PolicySet {
    policies: Vec<Policy>,
}

/// TOML documents must be tables, so policies live under `[[policies]]`
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDocument {
    #[serde(default)]
    policies: PolicySet,
}

impl TryFrom<Vec<Policy>> for PolicySet {
    type Error = PolicyError;

    fn try_from(policies: Vec<Policy>) -> Result<Self> {
        Self::new(policies)
    }
}

impl From<PolicySet> for Vec<Policy> {
    fn from(set: PolicySet) -> Self {
        set.policies
    }
}

impl PolicySet {
    /// Create a policy set
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::TooManyPolicies` if more than `MAX_POLICIES_PER_SET`
    /// policies are supplied, or any policy's validation error
    pub fn new(policies: Vec<Policy>) -> Result<Self> {
        if policies.len() > MAX_POLICIES_PER_SET {
            return Err(PolicyError::TooManyPolicies {
                max: MAX_POLICIES_PER_SET,
                attempted: policies.len(),
            });
        }

        policies.iter().try_for_each(Policy::validate)?;
        Ok(Self { policies })
    }

    /// Create an empty policy set (always denies)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a policy
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::TooManyPolicies` if the set is full, or the
    /// policy's validation error
    pub fn push(&mut self, policy: Policy) -> Result<()> {
        if self.policies.len() >= MAX_POLICIES_PER_SET {
            return Err(PolicyError::TooManyPolicies {
                max: MAX_POLICIES_PER_SET,
                attempted: self.policies.len() + 1,
            });
        }

        policy.validate()?;
        self.policies.push(policy);
        Ok(())
    }

    /// Get the policies in order
    #[must_use]
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Flatten every policy's rules, preserving policy then rule order
    pub fn rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.policies.iter().flat_map(Policy::rules)
    }

    /// Number of policies
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the set holds no policies
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Load a policy set from a JSON array
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::JsonError` if parsing or validation fails
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a JSON array
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::SerializationError` if serialization fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }

    /// Load a policy set from TOML (`[[policies]]` tables)
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::TomlError` if parsing or validation fails
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let document: TomlDocument = toml::from_str(toml_str)?;
        Ok(document.policies)
    }

    /// Serialize to TOML
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::SerializationError` if TOML serialization fails
    pub fn to_toml(&self) -> Result<String> {
        let document = TomlDocument {
            policies: self.clone(),
        };
        toml::to_string(&document).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }
}

impl AsRef<[Policy]> for PolicySet {
    fn as_ref(&self) -> &[Policy] {
        &self.policies
    }
}

impl FromIterator<Policy> for PolicySet {
    /// Collect without limit checks; use `PolicySet::new` for untrusted input
    fn from_iter<I: IntoIterator<Item = Policy>>(iter: I) -> Self {
        Self {
            policies: iter.into_iter().collect(),
        }
    }
}

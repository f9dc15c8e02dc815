//! Builder pattern for ergonomic policy construction

use crate::condition::{Condition, ConditionGroup};
use crate::error::{PolicyError, Result};
use crate::policy::{Effect, Policy, Rule};
use crate::target::TargetPattern;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Builder for creating `Rule` instances with a fluent API
///
/// # Examples
///
/// ```
/// use flow_policy::builder::RuleBuilder;
/// use flow_policy::Condition;
///
/// # fn example() -> Result<(), flow_policy::PolicyError> {
/// // Unconditional allow
/// let rule = RuleBuilder::new()
///     .allow("invoice.read")
///     .on("invoice:*")
///     .build()?;
///
/// // Allow gated on the request payload
/// let rule = RuleBuilder::new()
///     .allow("invoice.approve")
///     .on("invoice:*")
///     .when_all([Condition::lte("context.amount", 5000)])
///     .build()?;
///
/// // Deny for anyone outside the finance team
/// let rule = RuleBuilder::new()
///     .deny("invoice.delete")
///     .on("invoice:*")
///     .when_any([Condition::one_of("user.team", ["sales", "support"])])
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RuleBuilder {
    effect: Option<Effect>,
    action: Option<String>,
    target: Option<String>,
    when: Option<ConditionGroup>,
}

impl RuleBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make this an allow rule for `action`
    #[must_use]
    pub fn allow(mut self, action: impl Into<String>) -> Self {
        self.effect = Some(Effect::Allow);
        self.action = Some(action.into());
        self
    }

    /// Make this a deny rule for `action`
    #[must_use]
    pub fn deny(mut self, action: impl Into<String>) -> Self {
        self.effect = Some(Effect::Deny);
        self.action = Some(action.into());
        self
    }

    /// Set the target pattern
    #[must_use]
    pub fn on(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Require every condition to hold
    #[must_use]
    pub fn when_all(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.when = Some(ConditionGroup::all(conditions));
        self
    }

    /// Require at least one condition to hold
    #[must_use]
    pub fn when_any(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.when = Some(ConditionGroup::any(conditions));
        self
    }

    /// Build the `Rule`, returning an error if required fields are missing
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidRule` if the effect/action or the target
    /// is missing, and any error from `Rule::validate()`
    pub fn build(self) -> Result<Rule> {
        let effect = self.effect.ok_or_else(|| {
            PolicyError::InvalidRule("effect and action are required".to_string())
        })?;

        let action = self
            .action
            .ok_or_else(|| PolicyError::InvalidRule("action is required".to_string()))?;

        let target = self
            .target
            .ok_or_else(|| PolicyError::InvalidRule("target is required".to_string()))?;

        let rule = Rule {
            effect,
            action,
            target: TargetPattern::new(target)?,
            when: self.when,
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// Builder for creating `Policy` instances with a fluent API
///
/// Unlike adding pre-built rules, `add_rule_with` defers rule errors: the
/// first one is returned from `build()` so an incomplete deny rule can never
/// be dropped silently.
///
/// # Examples
///
/// ```
/// use flow_policy::{Condition, PolicyBuilder};
///
/// let policy = PolicyBuilder::new()
///     .name("invoices")
///     .add_rule_with(|rule| rule.allow("invoice.read").on("invoice:*"))
///     .add_rule_with(|rule| {
///         rule.deny("invoice.approve")
///             .on("invoice:*")
///             .when_all([Condition::gt("context.amount", 5000)])
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(policy.rules().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    name: Option<String>,
    rules: Vec<Rule>,
    error: Option<PolicyError>,
}

impl PolicyBuilder {
    /// Create a new policy builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Label the policy
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a rule using a builder function
    #[must_use]
    pub fn add_rule_with<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RuleBuilder) -> RuleBuilder,
    {
        match f(RuleBuilder::new()).build() {
            Ok(rule) => self.rules.push(rule),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Add a pre-constructed rule
    #[must_use]
    pub fn add_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Build the Policy, returning an error if any rule was invalid
    ///
    /// # Errors
    ///
    /// Returns the first deferred rule error, or any error from
    /// `Policy::add_rule()`
    pub fn build(self) -> Result<Policy> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let policy = match self.name {
            Some(name) => Policy::named(name),
            None => Policy::new(),
        };

        self.rules
            .into_iter()
            .try_fold(policy, |policy, rule| policy.add_rule(rule))
    }
}

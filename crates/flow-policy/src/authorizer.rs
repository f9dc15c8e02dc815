//! Deny-overrides decision engine
//!
//! This module holds the authorization algorithm and nothing else: policy
//! construction, loading and validation live in [`crate::policy`].
//!
//! ## Algorithm
//!
//! 1. Start from `Deny`.
//! 2. Walk every rule of every policy, in order. Skip rules whose action,
//!    target or conditions do not match.
//! 3. A matching `Deny` rule ends evaluation with `Deny`.
//! 4. A matching `Allow` rule sets the result to `Allow` and scanning goes on,
//!    so a later `Deny` can still veto it.
//! 5. Return the result.
//!
//! Evaluation is a pure read over borrowed inputs; nothing is cached between
//! calls, so one authorizer can be shared across threads freely.

use crate::context::EvaluationContext;
use crate::policy::{Effect, Policy, PolicySet, Rule};
use core::fmt;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Final outcome of an evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Access granted
    Allow,
    /// Access refused (also the default when nothing matches)
    #[default]
    Deny,
}

impl Decision {
    /// Whether access is granted
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Whether access is refused
    #[must_use]
    pub const fn is_denied(self) -> bool {
        matches!(self, Self::Deny)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

impl From<Effect> for Decision {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Allow => Self::Allow,
            Effect::Deny => Self::Deny,
        }
    }
}

/// Evaluates a principal's policies
///
/// ## Example
///
/// ```
/// use flow_policy::{Decision, EvaluationContext, Policy, PolicyAuthorizer, Rule};
///
/// let policies = vec![
///     Policy::from_rule(Rule::allow("invoice.read", "invoice:*")),
///     Policy::from_rule(Rule::deny("invoice.read", "invoice:666")),
/// ];
///
/// let authorizer = PolicyAuthorizer::new(&policies);
/// let read = |target| EvaluationContext::new("invoice.read", target);
///
/// assert_eq!(authorizer.decide(&read("invoice:555")), Decision::Allow);
/// assert_eq!(authorizer.decide(&read("invoice:666")), Decision::Deny);
/// assert_eq!(authorizer.decide(&read("user:1")), Decision::Deny);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PolicyAuthorizer<'a> {
    policies: &'a [Policy],
}

impl<'a> PolicyAuthorizer<'a> {
    /// Create a new authorizer over the given policies
    #[must_use]
    pub const fn new(policies: &'a [Policy]) -> Self {
        Self { policies }
    }

    /// Flattened rules with their `(policy index, rule index)` positions
    pub fn rules(&self) -> impl Iterator<Item = (usize, usize, &'a Rule)> + 'a {
        let policies: &'a [Policy] = self.policies;
        policies
            .iter()
            .enumerate()
            .flat_map(|(p, policy)| policy.rules().iter().enumerate().map(move |(r, rule)| (p, r, rule)))
    }

    /// Decide a request under deny-overrides
    ///
    /// # Returns
    ///
    /// `Decision::Allow` only if at least one allow rule matched and no deny
    /// rule matched; `Decision::Deny` otherwise, including for an empty set.
    #[must_use]
    pub fn decide(&self, ctx: &EvaluationContext) -> Decision {
        let mut decision = Decision::Deny;

        for (policy_index, rule_index, rule) in self.rules() {
            if !rule.applies_to(ctx) {
                continue;
            }

            match rule.effect {
                Effect::Deny => {
                    debug!(
                        action = ctx.action(),
                        target = ctx.target(),
                        policy = policy_index,
                        rule = rule_index,
                        "deny rule matched"
                    );
                    return Decision::Deny;
                }
                Effect::Allow => decision = Decision::Allow,
            }
        }

        debug!(
            action = ctx.action(),
            target = ctx.target(),
            rules = self.rule_count(),
            decision = %decision,
            "policy evaluation finished"
        );
        decision
    }

    /// Shorthand for `decide(ctx).is_allowed()`
    #[must_use]
    pub fn is_allowed(&self, ctx: &EvaluationContext) -> bool {
        self.decide(ctx).is_allowed()
    }

    /// Get every rule that applies to the request, whatever its effect
    ///
    /// Useful for auditing and debugging decisions. Does not short-circuit on
    /// deny, so it may list rules that `decide` never reached.
    pub fn matching_rules<'c>(
        &self,
        ctx: &'c EvaluationContext,
    ) -> impl Iterator<Item = &'a Rule> + 'c
    where
        'a: 'c,
    {
        self.rules()
            .map(|(_, _, rule)| rule)
            .filter(move |rule| rule.applies_to(ctx))
    }

    /// Get the number of rules being evaluated
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.policies.iter().map(|p| p.rules().len()).sum()
    }
}

/// Decide a request against an ordered policy sequence
///
/// Shorthand for `PolicyAuthorizer::new(policies).decide(ctx)`.
#[must_use]
pub fn decide(policies: &[Policy], ctx: &EvaluationContext) -> Decision {
    PolicyAuthorizer::new(policies).decide(ctx)
}

/// Trait for types that can decide requests
///
/// Callers such as request guards depend on this abstraction rather than on
/// a concrete policy container.
pub trait Authorizer {
    /// Decide a request
    fn decide(&self, ctx: &EvaluationContext) -> Decision;

    /// Check if access is allowed
    fn is_allowed(&self, ctx: &EvaluationContext) -> bool {
        self.decide(ctx).is_allowed()
    }
}

impl<'a> Authorizer for PolicyAuthorizer<'a> {
    fn decide(&self, ctx: &EvaluationContext) -> Decision {
        PolicyAuthorizer::decide(self, ctx)
    }
}

impl Authorizer for PolicySet {
    fn decide(&self, ctx: &EvaluationContext) -> Decision {
        PolicyAuthorizer::new(self.policies()).decide(ctx)
    }
}

impl Authorizer for [Policy] {
    fn decide(&self, ctx: &EvaluationContext) -> Decision {
        PolicyAuthorizer::new(self).decide(ctx)
    }
}

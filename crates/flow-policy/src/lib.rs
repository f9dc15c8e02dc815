// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Flowgate Team

//! # flow-policy
//!
//! Pure deny-overrides ABAC decision engine with no I/O and no shared state.
//!
//! This crate provides:
//! - Target matching with trailing wildcards (`invoice:*`)
//! - Condition groups over dotted context paths (`context.amount lte 5000`)
//! - Ordered policies and policy sets with JSON/TOML loading
//! - The deny-overrides, default-deny decision algorithm
//!
//! ## Quick Start
//!
//! ```
//! use flow_policy::{decide, Condition, ConditionGroup, Decision, EvaluationContext, Policy, Rule, Value};
//!
//! let policies = vec![Policy::from_rule(
//!     Rule::allow("invoice.approve", "invoice:*")
//!         .when(ConditionGroup::all([Condition::lte("context.amount", 5000)])),
//! )];
//!
//! let ctx = EvaluationContext::new("invoice.approve", "invoice:555")
//!     .with_context([("amount", 3000)].into_iter().collect::<Value>());
//!
//! assert_eq!(decide(&policies, &ctx), Decision::Allow);
//! ```
//!
//! ## Load-time limits
//!
//! Evaluation is total, but loading untrusted documents is bounded:
//!   - MAX_POLICIES_PER_SET = 256
//!   - MAX_RULES_PER_POLICY = 1024
//!   - MAX_TARGET_PATTERN_LENGTH = 256
//!   - MAX_FIELD_PATH_SEGMENTS = 16

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod authorizer;
pub mod builder;
pub mod condition;
pub mod context;
pub mod error;
pub mod policy;
pub mod target;
pub mod value;

pub use authorizer::{decide, Authorizer, Decision, PolicyAuthorizer};
pub use builder::{PolicyBuilder, RuleBuilder};
pub use condition::{Condition, ConditionGroup, Operator};
pub use context::EvaluationContext;
/// Re-export commonly used types
pub use error::{PolicyError, Result};
pub use policy::{Effect, Policy, PolicySet, Rule};
pub use target::{matches, TargetPattern};
pub use value::Value;

/// Maximum number of policies per set
pub const MAX_POLICIES_PER_SET: usize = 256;

/// Maximum number of rules per policy
pub const MAX_RULES_PER_POLICY: usize = 1024;

/// Maximum length for target patterns
pub const MAX_TARGET_PATTERN_LENGTH: usize = 256;

/// Maximum number of segments in a condition field path
pub const MAX_FIELD_PATH_SEGMENTS: usize = 16;

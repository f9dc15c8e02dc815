// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Flowgate Team

//! # flowgate
//!
//! Deny-overrides attribute-based authorization for request pipelines.
//!
//! This crate provides a unified API over the flowgate crates:
//!
//! - **Policy Engine**: Pure decision function over ordered policies
//! - **Loaders**: JSON, TOML and YAML policy documents
//! - **Guard**: Framework-free request guard with 401/403 outcomes
//!
//! ## Quick Start
//!
//! ```rust
//! use flowgate::policy::{decide, Decision, EvaluationContext};
//! use flowgate::utils::{JsonParser, PolicyParser};
//!
//! let set = JsonParser
//!     .parse(r#"[{ "effect": "allow", "action": "invoice.read", "target": "invoice:*" }]"#)
//!     .unwrap();
//!
//! let ctx = EvaluationContext::new("invoice.read", "invoice:555");
//! assert_eq!(decide(set.policies(), &ctx), Decision::Allow);
//! ```
//!
//! ## Architecture
//!
//! This facade crate re-exports the following modules:
//!
//! - [`policy`] - Decision engine (from `flow-policy`)
//! - [`utils`] - Parsers and the request guard (from `app-utils`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Policy engine module.
///
/// Re-exports `flow_policy` for policy evaluation.
pub mod policy {
    pub use flow_policy::*;
}

/// Parsers and request guard.
///
/// Re-exports `app_utils`.
pub mod utils {
    pub use app_utils::*;
}

// Convenience re-exports at root level
pub use app_utils::{Guard, GuardError, Principal, RequestParts};
pub use flow_policy::{decide, Decision, EvaluationContext, Policy, PolicySet, Rule, Value};

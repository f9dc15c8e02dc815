//! Request guard mapping policy decisions onto request outcomes
//!
//! The guard is framework-free: a web layer implements [`Principal`] for its
//! authenticated user and [`RequestParts`] for its request type, then turns
//! a [`GuardError`] into a response with [`GuardError::status_code`] and
//! [`GuardError::body`].
//!
//! # Outcomes
//!
//! - No principal: `Unauthenticated` (401). The engine is not invoked.
//! - Engine decides `Deny`: `Forbidden` (403).
//! - Engine decides `Allow`: `Ok(())`, the request may continue.
//!
//! # Example
//!
//! ```
//! use app_utils::guard::{Guard, Principal, RequestParts};
//! use flow_policy::{Policy, Rule};
//!
//! struct User {
//!     policies: Vec<Policy>,
//! }
//!
//! impl Principal for User {
//!     fn policies(&self) -> &[Policy] {
//!         &self.policies
//!     }
//! }
//!
//! struct Request {
//!     id: String,
//! }
//!
//! impl RequestParts for Request {}
//!
//! let guard = Guard::new("invoice.read", |req: &Request| format!("invoice:{}", req.id));
//! let user = User {
//!     policies: vec![Policy::from_rule(Rule::allow("invoice.read", "invoice:*"))],
//! };
//! let request = Request { id: "555".into() };
//!
//! assert!(guard.check(Some(&user), &request).is_ok());
//! assert_eq!(guard.check(None::<&User>, &request).unwrap_err().status_code(), 401);
//! ```

use flow_policy::{decide, Decision, EvaluationContext, Policy, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

/// An authenticated caller
pub trait Principal {
    /// The caller's policies, in evaluation order
    fn policies(&self) -> &[Policy];

    /// Attributes exposed to conditions under the `user` root
    fn attributes(&self) -> Value {
        Value::Null
    }
}

/// Payload sources of an incoming request
///
/// The evaluation context is the first present of `body`, `params` and
/// `query`, in that order.
pub trait RequestParts {
    /// Decoded request body
    fn body(&self) -> Option<Value> {
        None
    }

    /// Path parameters
    fn params(&self) -> Option<Value> {
        None
    }

    /// Query string parameters
    fn query(&self) -> Option<Value> {
        None
    }
}

/// Why a guarded request may not continue
#[derive(Error, Debug)]
pub enum GuardError {
    /// The request carries no principal
    #[error("request is not authenticated")]
    Unauthenticated,

    /// The principal's policies deny the request
    #[error("{action} on {target} is forbidden")]
    Forbidden {
        /// Action that was checked
        action: String,
        /// Concrete target that was checked
        target: String,
    },

    /// Policies could not be obtained or loaded
    #[error("authorization failed: {0}")]
    Internal(#[from] crate::Error),
}

impl GuardError {
    /// HTTP status code for this outcome
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden { .. } => 403,
            Self::Internal(_) => 500,
        }
    }

    /// JSON error body for this outcome
    ///
    /// Bodies never name the action, target or policy involved.
    pub fn body(&self) -> String {
        let message = match self {
            Self::Unauthenticated => "Unauthorized",
            Self::Forbidden { .. } => "Forbidden",
            Self::Internal(_) => "Internal Server Error",
        };
        serde_json::json!({ "error": message }).to_string()
    }
}

/// Guards one action, computing the concrete target from each request
pub struct Guard<F> {
    action: String,
    target: F,
}

impl<F> Guard<F> {
    /// Create a guard for `action`; `target` builds the concrete target
    /// (e.g. `invoice:{id}`) from the request
    pub fn new(action: impl Into<String>, target: F) -> Self {
        Self {
            action: action.into(),
            target,
        }
    }

    /// Shorthand for [`Guard::new`]
    pub fn allow(action: impl Into<String>, target: F) -> Self {
        Self::new(action, target)
    }

    /// The guarded action
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Decide a request without mapping the outcome
    ///
    /// Returns `None` when there is no principal.
    pub fn decide<P, R>(&self, principal: Option<&P>, request: &R) -> Option<Decision>
    where
        P: Principal + ?Sized,
        R: RequestParts,
        F: Fn(&R) -> String,
    {
        let principal = principal?;
        Some(decide(principal.policies(), &self.context(principal, request)))
    }

    /// Check a request
    ///
    /// # Errors
    ///
    /// - `GuardError::Unauthenticated` when `principal` is `None`
    /// - `GuardError::Forbidden` when the principal's policies deny the request
    pub fn check<P, R>(&self, principal: Option<&P>, request: &R) -> Result<(), GuardError>
    where
        P: Principal + ?Sized,
        R: RequestParts,
        F: Fn(&R) -> String,
    {
        let Some(principal) = principal else {
            warn!(action = self.action.as_str(), "guard rejected: not authenticated");
            return Err(GuardError::Unauthenticated);
        };

        let ctx = self.context(principal, request);
        match decide(principal.policies(), &ctx) {
            Decision::Allow => {
                debug!(action = ctx.action(), target = ctx.target(), "guard allowed");
                Ok(())
            }
            Decision::Deny => {
                info!(action = ctx.action(), target = ctx.target(), "guard rejected: forbidden");
                Err(GuardError::Forbidden {
                    action: self.action.clone(),
                    target: ctx.target().to_string(),
                })
            }
        }
    }

    fn context<P, R>(&self, principal: &P, request: &R) -> EvaluationContext
    where
        P: Principal + ?Sized,
        R: RequestParts,
        F: Fn(&R) -> String,
    {
        let context = request
            .body()
            .or_else(|| request.params())
            .or_else(|| request.query())
            .unwrap_or_default();

        EvaluationContext::new(self.action.as_str(), (self.target)(request))
            .with_user(principal.attributes())
            .with_context(context)
    }
}

impl<F> std::fmt::Debug for Guard<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard").field("action", &self.action).finish_non_exhaustive()
    }
}

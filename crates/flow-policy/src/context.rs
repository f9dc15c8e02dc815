//! Per-request evaluation context

use crate::value::Value;
use alloc::borrow::Cow;
use alloc::string::String;

/// Read-only input assembled for a single decision
///
/// Condition field paths resolve against this context as if it were the
/// mapping `{ user, context, action, target }`.
///
/// ```
/// use flow_policy::{EvaluationContext, Value};
///
/// let ctx = EvaluationContext::new("invoice.approve", "invoice:inv-101")
///     .with_context([("amount", 3000)].into_iter().collect::<Value>());
///
/// assert_eq!(ctx.resolve("context.amount").as_deref(), Some(&Value::Number(3000.0)));
/// assert!(ctx.resolve("context.missing.amount").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    user: Value,
    context: Value,
    action: String,
    target: String,
}

impl EvaluationContext {
    /// Create a context for `action` on the concrete `target`
    #[must_use]
    pub fn new(action: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            user: Value::Null,
            context: Value::Null,
            action: action.into(),
            target: target.into(),
        }
    }

    /// Attach the principal's attributes
    #[must_use]
    pub fn with_user(mut self, user: impl Into<Value>) -> Self {
        self.user = user.into();
        self
    }

    /// Attach the request-supplied payload
    #[must_use]
    pub fn with_context(mut self, context: impl Into<Value>) -> Self {
        self.context = context.into();
        self
    }

    /// Action being attempted
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Concrete target identifier
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Principal attributes
    #[must_use]
    pub const fn user(&self) -> &Value {
        &self.user
    }

    /// Request payload
    #[must_use]
    pub const fn context(&self) -> &Value {
        &self.context
    }

    /// Resolve a dotted field path
    ///
    /// The first segment selects `user`, `context`, `action` or `target`;
    /// the remaining segments descend through nested mappings. Any miss
    /// yields `None`. `action` and `target` are strings, so they only
    /// resolve when they are the whole path.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Cow<'_, Value>> {
        let mut segments = path.split('.');
        let root = segments.next()?;

        match root {
            "user" => self.user.lookup(segments).map(Cow::Borrowed),
            "context" => self.context.lookup(segments).map(Cow::Borrowed),
            "action" | "target" => {
                if segments.next().is_some() {
                    return None;
                }
                let s = if root == "action" {
                    &self.action
                } else {
                    &self.target
                };
                Some(Cow::Owned(Value::String(s.clone())))
            }
            _ => None,
        }
    }
}

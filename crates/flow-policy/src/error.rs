//! Error types for flow-policy
//!
//! Errors only arise while building or loading policies. Evaluation itself
//! is total and never returns one of these.

use alloc::string::String;
use core::fmt;

/// Result type alias for policy operations
pub type Result<T> = core::result::Result<T, PolicyError>;

/// Errors that can occur while constructing or loading policies
#[derive(Debug)]
pub enum PolicyError {
    /// Invalid or incomplete rule
    InvalidRule(String),

    /// Serialization error
    SerializationError(String),

    /// TOML parsing error
    TomlError(toml::de::Error),

    /// JSON parsing error
    JsonError(serde_json::Error),

    // ===== Load-time limits =====

    /// Policy exceeds maximum allowed rules
    TooManyRules {
        /// Maximum allowed rules
        max: usize,
        /// Attempted number of rules
        attempted: usize,
    },

    /// Policy set exceeds maximum allowed policies
    TooManyPolicies {
        /// Maximum allowed policies
        max: usize,
        /// Attempted number of policies
        attempted: usize,
    },

    /// Target pattern exceeds maximum length
    PatternTooLong {
        /// Maximum allowed length
        max: usize,
        /// Actual pattern length
        length: usize,
    },

    /// Condition field path has too many segments
    FieldPathTooLong {
        /// Maximum allowed segments
        max: usize,
        /// Actual number of segments
        segments: usize,
    },

    /// Internal error
    InternalError(String),
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRule(msg) => write!(f, "Invalid policy rule: {}", msg),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Self::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            Self::JsonError(e) => write!(f, "JSON parsing error: {}", e),
            Self::TooManyRules { max, attempted } => write!(
                f,
                "Policy exceeds maximum {} rules (attempted: {})",
                max, attempted
            ),
            Self::TooManyPolicies { max, attempted } => write!(
                f,
                "Policy set exceeds maximum {} policies (attempted: {})",
                max, attempted
            ),
            Self::PatternTooLong { max, length } => write!(
                f,
                "Target pattern exceeds maximum {} characters (length: {})",
                max, length
            ),
            Self::FieldPathTooLong { max, segments } => write!(
                f,
                "Condition field path exceeds maximum {} segments (segments: {})",
                max, segments
            ),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<toml::de::Error> for PolicyError {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlError(err)
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err)
    }
}

impl core::error::Error for PolicyError {}

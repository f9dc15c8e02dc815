use flow_policy::PolicyError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the `app-utils` crate
#[derive(Error, Debug)]
pub enum Error {
    /// Policy construction, validation or JSON/TOML loading failed
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// YAML parsing failed
    #[error("YAML parsing failed: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    /// A JSON payload (user or context) could not be read
    #[error("JSON parsing failed: {0}")]
    JsonParseError(#[from] serde_json::Error),

    /// The file extension does not name a supported format
    #[error("unsupported policy format for {}: expected .json, .toml, .yaml or .yml", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Reading a policy document failed
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

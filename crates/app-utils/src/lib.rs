//! # app-utils
//!
//! Non-core features built around `flow-policy`:
//! - Policy document parsing (JSON, TOML, YAML) behind one trait
//! - A framework-free request guard mapping decisions to 401/403 outcomes

#![forbid(unsafe_code)]

pub mod error;
pub mod guard;

pub mod parser {
    //! Policy document parsing and serialization
    use super::error::{Error, Result};
    use flow_policy::PolicySet;
    use serde::{Deserialize, Serialize};
    use std::path::Path;
    use tracing::debug;

    /// Trait for policy parsers, one per document format
    pub trait PolicyParser {
        /// Parse a policy set from a string
        fn parse(&self, input: &str) -> Result<PolicySet>;
    }

    /// JSON parser implementation
    #[derive(Debug, Clone, Copy, Default)]
    pub struct JsonParser;

    impl PolicyParser for JsonParser {
        fn parse(&self, input: &str) -> Result<PolicySet> {
            Ok(PolicySet::from_json(input)?)
        }
    }

    /// TOML parser implementation (`[[policies]]` tables)
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TomlParser;

    impl PolicyParser for TomlParser {
        fn parse(&self, input: &str) -> Result<PolicySet> {
            Ok(PolicySet::from_toml(input)?)
        }
    }

    /// YAML parser implementation
    #[derive(Debug, Clone, Copy, Default)]
    pub struct YamlParser;

    impl PolicyParser for YamlParser {
        fn parse(&self, input: &str) -> Result<PolicySet> {
            // Limits are enforced by PolicySet's own deserialization
            from_yaml(input)
        }
    }

    /// Serialize a value to YAML
    pub fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
        Ok(serde_yaml::to_string(value)?)
    }

    /// Deserialize from YAML
    pub fn from_yaml<'a, T: Deserialize<'a>>(input: &'a str) -> Result<T> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Supported policy document formats
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Format {
        /// `.json`
        Json,
        /// `.toml`
        Toml,
        /// `.yaml` / `.yml`
        Yaml,
    }

    impl Format {
        /// Pick the format from a file extension (case-insensitive)
        pub fn from_path(path: &Path) -> Result<Self> {
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);

            match extension.as_deref() {
                Some("json") => Ok(Self::Json),
                Some("toml") => Ok(Self::Toml),
                Some("yaml" | "yml") => Ok(Self::Yaml),
                _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
            }
        }

        /// Parser for this format
        pub fn parser(self) -> &'static dyn PolicyParser {
            match self {
                Self::Json => &JsonParser,
                Self::Toml => &TomlParser,
                Self::Yaml => &YamlParser,
            }
        }
    }

    /// Read and parse a policy document, choosing the parser by extension
    pub fn load_policies(path: impl AsRef<Path>) -> Result<PolicySet> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let input = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let set = format.parser().parse(&input)?;
        debug!(path = %path.display(), ?format, policies = set.len(), "loaded policy document");
        Ok(set)
    }
}

/// Re-export commonly used types
pub use error::{Error, Result};
pub use guard::{Guard, GuardError, Principal, RequestParts};
pub use parser::{load_policies, Format, JsonParser, PolicyParser, TomlParser, YamlParser};

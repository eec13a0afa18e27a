//! Session configuration.
//!
//! A [`SessionConfig`] names each test group, gives it a human-readable
//! description and lists the integrations its failures are routed to. It is
//! usually loaded from a TOML file:
//!
//! ```toml
//! name = "plant-monitor"
//! verbose = false
//!
//! [[tests]]
//! name = "boiler_checks"
//! description = "Boiler temperature stays within limits"
//! integrations = ["ops-channel"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Base trait for configuration types.
pub trait Config: Send + Sync {
    /// Returns the configuration name/identifier.
    fn name(&self) -> &str {
        "default"
    }

    /// Returns whether verbose output is enabled.
    fn is_verbose(&self) -> bool {
        false
    }

    /// Validates the configuration.
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }
}

/// Trait for configurations that support file-based loading.
pub trait FileConfig: Config {
    /// Load configuration from a file path.
    fn from_file(path: &Path) -> ConfigResult<Self>
    where
        Self: Sized;

    /// Save configuration to a file path.
    fn to_file(&self, path: &Path) -> ConfigResult<()>;
}

/// Trait for configurations that can be merged.
pub trait MergeableConfig: Config {
    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` where applicable.
    fn merge(&mut self, other: &Self);

    /// Create a new configuration by merging two configurations.
    fn merged(base: &Self, overlay: &Self) -> Self
    where
        Self: Clone,
    {
        let mut result = base.clone();
        result.merge(overlay);
        result
    }
}

/// Builder trait for constructing configurations.
pub trait ConfigBuilder {
    /// The configuration type this builder produces.
    type Config: Config;

    /// Build the configuration.
    fn build(self) -> ConfigResult<Self::Config>;
}

/// Binding of one test group to its description and integrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Correlation name used by `expect`.
    pub name: String,
    /// Human-readable description placed in every notification.
    #[serde(default)]
    pub description: String,
    /// Names of the integrations notified on failure, in order.
    #[serde(default)]
    pub integrations: Vec<String>,
}

impl TestConfig {
    /// Create a binding with no integrations.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            integrations: Vec::new(),
        }
    }

    /// Route failures to an additional integration.
    pub fn with_integration(mut self, integration: impl Into<String>) -> Self {
        self.integrations.push(integration.into());
        self
    }
}

/// Configuration of a checking session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session name, used in log spans
    #[serde(default)]
    pub name: String,
    /// Log passing checks as well as failures
    #[serde(default)]
    pub verbose: bool,
    /// Test group bindings
    #[serde(default)]
    pub tests: Vec<TestConfig>,
}

impl SessionConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a configuration.
    pub fn builder(name: impl Into<String>) -> SessionConfigBuilder {
        SessionConfigBuilder::new(name)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: SessionConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a test binding by correlation name.
    pub fn test(&self, name: &str) -> Option<&TestConfig> {
        self.tests.iter().find(|t| t.name == name)
    }
}

impl Config for SessionConfig {
    fn name(&self) -> &str {
        if self.name.is_empty() {
            "default"
        } else {
            &self.name
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for test in &self.tests {
            if test.name.trim().is_empty() {
                return Err(ConfigError::Invalid("test name must not be empty".to_string()));
            }
            if !seen.insert(test.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "test {:?} is declared more than once",
                    test.name
                )));
            }
            if test.integrations.iter().any(|i| i.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "test {:?} lists an empty integration name",
                    test.name
                )));
            }
        }
        Ok(())
    }
}

impl FileConfig for SessionConfig {
    fn from_file(path: &Path) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    fn to_file(&self, path: &Path) -> ConfigResult<()> {
        let rendered = toml::to_string_pretty(self)?;
        std::fs::write(path, rendered)?;
        Ok(())
    }
}

/// The overlay's name wins when non-empty, verbose output stays on if either
/// side enables it, and tests are replaced or appended by name.
impl MergeableConfig for SessionConfig {
    fn merge(&mut self, other: &Self) {
        if !other.name.is_empty() {
            self.name = other.name.clone();
        }
        self.verbose |= other.verbose;
        for test in &other.tests {
            match self.tests.iter_mut().find(|t| t.name == test.name) {
                Some(existing) => *existing = test.clone(),
                None => self.tests.push(test.clone()),
            }
        }
    }
}

/// Fluent builder for [`SessionConfig`].
///
/// ```rust
/// use sellus::{ConfigBuilder, SessionConfig, TestConfig};
///
/// let config = SessionConfig::builder("plant-monitor")
///     .test(TestConfig::new("boiler_checks", "Boiler stays within limits").with_integration("ops"))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.tests.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a builder for a named session.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: SessionConfig {
                name: name.into(),
                ..SessionConfig::default()
            },
        }
    }

    /// Enable verbose output.
    pub fn verbose(mut self) -> Self {
        self.config.verbose = true;
        self
    }

    /// Add a test binding.
    pub fn test(mut self, test: TestConfig) -> Self {
        self.config.tests.push(test);
        self
    }
}

impl ConfigBuilder for SessionConfigBuilder {
    type Config = SessionConfig;

    fn build(self) -> ConfigResult<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name = "plant-monitor"
verbose = true

[[tests]]
name = "boiler_checks"
description = "Boiler temperature stays within limits"
integrations = ["ops", "pager"]

[[tests]]
name = "flow_checks"
description = "Flow meter reports sane values"
"#;

    #[test]
    fn test_parse_toml() {
        let config = SessionConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.name(), "plant-monitor");
        assert!(config.is_verbose());
        assert_eq!(config.tests.len(), 2);
        assert_eq!(
            config.test("boiler_checks").unwrap().integrations,
            vec!["ops", "pager"]
        );
        assert!(config.test("flow_checks").unwrap().integrations.is_empty());
        assert!(config.test("missing").is_none());
    }

    #[test]
    fn test_default_name() {
        assert_eq!(SessionConfig::new().name(), "default");
    }

    #[test]
    fn test_rejects_duplicate_tests() {
        let result = SessionConfig::builder("dup")
            .test(TestConfig::new("a", "first"))
            .test(TestConfig::new("a", "second"))
            .build();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_blank_names() {
        let blank_test = SessionConfig::builder("x")
            .test(TestConfig::new(" ", "nameless"))
            .build();
        assert!(blank_test.is_err());

        let blank_integration = SessionConfig::builder("x")
            .test(TestConfig::new("a", "desc").with_integration(""))
            .build();
        assert!(blank_integration.is_err());
    }

    #[test]
    fn test_parse_error() {
        let result = SessionConfig::from_toml_str("tests = 3");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_merge_overlays_tests_by_name() {
        let base = SessionConfig::builder("base")
            .test(TestConfig::new("a", "old").with_integration("ops"))
            .test(TestConfig::new("b", "kept"))
            .build()
            .unwrap();
        let overlay = SessionConfig::builder("")
            .verbose()
            .test(TestConfig::new("a", "new"))
            .test(TestConfig::new("c", "added"))
            .build()
            .unwrap();

        let merged = SessionConfig::merged(&base, &overlay);

        assert_eq!(merged.name, "base");
        assert!(merged.verbose);
        let names: Vec<&str> = merged.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(merged.test("a").unwrap().description, "new");
        assert!(merged.test("a").unwrap().integrations.is_empty());
    }

    #[test]
    fn test_merge_keeps_base_verbose() {
        let base = SessionConfig::builder("base").verbose().build().unwrap();
        let overlay = SessionConfig::builder("overlay").build().unwrap();

        let merged = SessionConfig::merged(&base, &overlay);

        assert_eq!(merged.name, "overlay");
        assert!(merged.verbose);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sellus.toml");
        let config = SessionConfig::from_toml_str(SAMPLE).unwrap();

        config.to_file(&path).unwrap();
        let loaded = SessionConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let result = SessionConfig::from_file(Path::new("/nonexistent/sellus.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

//! Session configuration and key validation for the route handler.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{HandlerError, Result};
use crate::types::SumoTime;

/// Default begin of flows that do not set `begin`.
pub const DEFAULT_FLOW_BEGIN: SumoTime = SumoTime::ZERO;

/// Parameter keys may not contain whitespace controls or markup-significant characters.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PARAMETER_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[^\t\n\r@$%^&|\\{}*'";<>]+$"#).expect("valid regex"));

/// Options that change how a session treats its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HandlerConfig {
    /// Abort the session on invalid vehicle, flow, person or container
    /// definitions instead of skipping them.
    pub hard_fail: bool,

    /// Begin of flows without an explicit `begin`.
    pub begin: SumoTime,

    /// End of flows without an explicit `end`; unbounded when unset.
    pub end: Option<SumoTime>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            hard_fail: false,
            begin: DEFAULT_FLOW_BEGIN,
            end: None,
        }
    }
}

impl HandlerConfig {
    /// Parse a YAML configuration document.
    ///
    /// # Examples
    /// ```
    /// use route_handler::config::HandlerConfig;
    /// use route_handler::types::SumoTime;
    ///
    /// let config = HandlerConfig::from_yaml_str("hard-fail: true\nend: '1:00:00'\n").unwrap();
    /// assert!(config.hard_fail);
    /// assert_eq!(config.end, Some(SumoTime::from_secs(3600)));
    /// ```
    ///
    /// # Errors
    /// Returns `Config` for malformed YAML and `InvalidConfig` when
    /// `begin` lies after `end`.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`HandlerConfig::from_yaml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Check that the configured flow interval is not inverted.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when `begin` lies after `end`.
    pub fn validate(&self) -> Result<()> {
        match self.end {
            Some(end) if end < self.begin => Err(HandlerError::InvalidConfig(format!(
                "begin ({}) lies after end ({end})",
                self.begin
            ))),
            _ => Ok(()),
        }
    }
}

/// Check that a generic parameter key is non-empty and free of invalid characters.
///
/// # Examples
/// ```
/// use route_handler::config::is_valid_parameter_key;
///
/// assert!(is_valid_parameter_key("has.ride"));
/// assert!(!is_valid_parameter_key(""));
/// assert!(!is_valid_parameter_key("a|b"));
/// ```
#[must_use]
pub fn is_valid_parameter_key(key: &str) -> bool {
    PARAMETER_KEY_PATTERN.is_match(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HandlerConfig::default();
        assert!(!config.hard_fail);
        assert_eq!(config.begin, SumoTime::ZERO);
        assert_eq!(config.end, None);
    }

    #[test]
    fn test_yaml_numeric_times() {
        let config = HandlerConfig::from_yaml_str("begin: 10\nend: 20.5\n").unwrap();
        assert_eq!(config.begin, SumoTime::from_secs(10));
        assert_eq!(config.end, Some(SumoTime::from_millis(20_500)));
    }

    #[test]
    fn test_yaml_rejects_inverted_interval() {
        let result = HandlerConfig::from_yaml_str("begin: 100\nend: 10\n");
        assert!(matches!(result, Err(HandlerError::InvalidConfig(_))));
    }

    #[test]
    fn test_yaml_rejects_unknown_keys() {
        let result = HandlerConfig::from_yaml_str("strict: true\n");
        assert!(matches!(result, Err(HandlerError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hard-fail: true").unwrap();
        let config = HandlerConfig::load(file.path()).unwrap();
        assert!(config.hard_fail);
    }

    #[test]
    fn test_parameter_keys() {
        assert!(is_valid_parameter_key("device.rerouting.probability"));
        assert!(is_valid_parameter_key("key with spaces"));
        assert!(!is_valid_parameter_key("tab\tkey"));
        assert!(!is_valid_parameter_key("<key>"));
        assert!(!is_valid_parameter_key("it's"));
    }
}

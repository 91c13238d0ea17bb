//! Mentor configuration, loaded from YAML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::prompt::DEFAULT_TEMPERATURE;
use crate::MentorError;

/// Settings for the mentor's text generator. Every field has a default, so
/// an empty file is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentorConfig {
    /// Base URL of the generateContent API.
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound for one mentor request, in milliseconds.
    pub timeout_ms: u64,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_ms: 4_000,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl MentorConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, MentorError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: MentorConfig =
            serde_yaml::from_str(text).map_err(|e| MentorError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MentorError> {
        let text = fs::read_to_string(path.as_ref())
            .map_err(|e| MentorError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> Result<(), MentorError> {
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(MentorError::Config(format!(
                "temperature {} outside [0, 2]",
                self.temperature
            )));
        }
        if self.timeout_ms == 0 {
            return Err(MentorError::Config("timeout_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = MentorConfig::from_yaml_str("").unwrap();
        assert_eq!(cfg, MentorConfig::default());
        assert_eq!(cfg.timeout(), Duration::from_secs(4));
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let cfg = MentorConfig::from_yaml_str("model: gemini-2.0-flash\ntimeout_ms: 1500\n").unwrap();
        assert_eq!(cfg.model, "gemini-2.0-flash");
        assert_eq!(cfg.timeout_ms, 1500);
        assert_eq!(cfg.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(cfg.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(MentorConfig::from_yaml_str("temperature: 7.5").is_err());
        assert!(MentorConfig::from_yaml_str("timeout_ms: 0").is_err());
        assert!(MentorConfig::from_yaml_str("model: [1, 2").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "temperature: 0.3").unwrap();
        writeln!(f, "api_key_env: HERO_TEST_UNSET_KEY").unwrap();
        let cfg = MentorConfig::load(f.path()).unwrap();
        assert_eq!(cfg.temperature, 0.3);
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../assets/config/mentor.yaml");
        let cfg = MentorConfig::load(path).unwrap();
        assert_eq!(cfg, MentorConfig::default());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = MentorConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, MentorError::Config(_)));
    }
}

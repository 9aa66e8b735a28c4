use crate::errors::ConfigError;
use serde::Deserialize;
use std::{collections::HashMap, env, fs, path::Path};

// Environment variable overrides
pub const ENV_VALIDATE_SCOPES: &str = "SERVICE_DECORATION_VALIDATE_SCOPES";
pub const ENV_DETECT_CYCLES: &str = "SERVICE_DECORATION_DETECT_CYCLES";

/// Service provider options
///
/// Loaded from TOML, every field optional:
///
/// ```toml
/// validate_scopes = true
/// detect_cycles = true
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderOptions {
    /// Reject scoped services resolved from the root provider
    pub validate_scopes: bool,
    /// Track the resolution chain and report circular dependencies
    pub detect_cycles: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            validate_scopes: false,
            detect_cycles: true,
        }
    }
}

impl ProviderOptions {
    /// Options with every validation enabled
    pub fn strict() -> Self {
        Self {
            validate_scopes: true,
            detect_cycles: true,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParse("<inline>".to_string(), e))
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string_lossy().to_string(), e))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::TomlParse(path.to_string_lossy().to_string(), e))
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        let env_map = [ENV_VALIDATE_SCOPES, ENV_DETECT_CYCLES]
            .iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        self.with_overrides(&env_map)
    }

    /// Apply overrides from a collected environment map; unparsable values are ignored
    pub fn with_overrides(mut self, env_map: &HashMap<String, String>) -> Self {
        if let Some(value) = env_map.get(ENV_VALIDATE_SCOPES).and_then(|v| parse_bool(v)) {
            self.validate_scopes = value;
        }
        if let Some(value) = env_map.get(ENV_DETECT_CYCLES).and_then(|v| parse_bool(v)) {
            self.detect_cycles = value;
        }
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(value, "Ignoring unparsable boolean override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_fields() {
        let options = ProviderOptions::from_toml_str("validate_scopes = true").unwrap();
        assert!(options.validate_scopes);
        assert!(options.detect_cycles);

        let empty = ProviderOptions::from_toml_str("").unwrap();
        assert_eq!(empty, ProviderOptions::default());
    }

    #[test]
    fn test_invalid_toml() {
        let result = ProviderOptions::from_toml_str("validate_scopes = \"maybe\"");
        assert!(matches!(result, Err(ConfigError::TomlParse(_, _))));
    }

    #[test]
    fn test_env_overrides() {
        let mut env_map = HashMap::new();
        env_map.insert(ENV_VALIDATE_SCOPES.to_string(), "on".to_string());
        env_map.insert(ENV_DETECT_CYCLES.to_string(), "nonsense".to_string());

        let options = ProviderOptions::default().with_overrides(&env_map);

        assert!(options.validate_scopes);
        assert!(options.detect_cycles);
    }

    #[test]
    fn test_process_env_overrides() {
        env::set_var(ENV_VALIDATE_SCOPES, "true");
        env::set_var(ENV_DETECT_CYCLES, "0");

        let options = ProviderOptions::default().with_env_overrides();

        env::remove_var(ENV_VALIDATE_SCOPES);
        env::remove_var(ENV_DETECT_CYCLES);

        assert!(options.validate_scopes);
        assert!(!options.detect_cycles);
        assert_eq!(
            ProviderOptions::strict().with_env_overrides(),
            ProviderOptions::strict()
        );
    }
}

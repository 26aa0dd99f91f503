//! Configuration for project-resolver

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound on generations walked per resolution (unbounded if unset).
    /// Only a corrupted, cyclic version chain can need this.
    #[serde(default)]
    pub max_generations: Option<usize>,

    /// Binding type that contract names are resolved under
    #[serde(default = "default_contract_type")]
    pub contract_type: String,
}

fn default_contract_type() -> String {
    "Contract".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_generations: None,
            contract_type: default_contract_type(),
        }
    }
}

impl ResolverConfig {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.max_generations, None);
        assert_eq!(config.contract_type, "Contract");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ResolverConfig::from_toml_str("max_generations = 64\n").unwrap();
        assert_eq!(config.max_generations, Some(64));
        assert_eq!(config.contract_type, "Contract");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("resolver.toml");
        std::fs::write(&path, "contract_type = \"Library\"\n").unwrap();

        let config = ResolverConfig::load(&path).unwrap();
        assert_eq!(config.contract_type, "Library");
        assert_eq!(config.max_generations, None);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ResolverConfig {
            max_generations: Some(8),
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(ResolverConfig::from_toml_str(&text).unwrap(), config);
    }
}

//! Configuration loading and management for governance aggregation
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML
//! formats into clean domain objects
//! - Raw YAML structures are converted and validated before use
//! - The domain list doubles as the priority order for organizations
//! - Constructed once at process start and passed in; no hidden globals

use crate::domain::model::{GovernanceError, GovernanceResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration for governance aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Configuration format version
    pub version: String,
    /// Where the governance content tree lives
    pub content: ContentConfig,
    /// Domains to aggregate, in priority order; the root domain comes first
    pub domains: Vec<DomainEntry>,
}

/// Content tree location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Root directory of the governance document tree
    pub root: PathBuf,
}

/// One configured domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntry {
    /// Domain identifier, matching its directory name (e.g. "animal-welfare")
    pub id: String,
    /// Display name; defaults to a title-cased form of the id
    pub name: Option<String>,
}

impl DomainEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: Some(name.into()) }
    }

    /// Display name, title-casing the id when none is configured.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .id
                .split('-')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl GovernanceConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GovernanceResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            GovernanceError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            GovernanceError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> GovernanceResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| GovernanceError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Default configuration: the conventional DAHAO domain set rooted at
    /// `./governance`.
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            content: ContentConfig { root: PathBuf::from("governance") },
            domains: vec![
                DomainEntry::new("core-governance"),
                DomainEntry::new("animal-welfare"),
                DomainEntry::new("environment"),
                DomainEntry::new("music-industry"),
            ],
        }
    }

    /// Override the content root, keeping everything else.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.content.root = root.into();
        self
    }

    /// Domain ids in priority order.
    pub fn domain_ids(&self) -> Vec<&str> {
        self.domains.iter().map(|d| d.id.as_str()).collect()
    }

    /// Look up a configured domain by id.
    pub fn domain(&self, id: &str) -> Option<&DomainEntry> {
        self.domains.iter().find(|d| d.id == id)
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> GovernanceResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(GovernanceError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        if self.domains.is_empty() {
            return Err(GovernanceError::config(
                "At least one domain must be configured".to_string(),
            ));
        }

        for entry in &self.domains {
            if entry.id.trim().is_empty() {
                return Err(GovernanceError::config("Empty domain id".to_string()));
            }
            if !entry
                .id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(GovernanceError::config(format!(
                    "Invalid domain id '{}': use lowercase, digits, and hyphens",
                    entry.id
                )));
            }

            let duplicates = self.domains.iter().filter(|d| d.id == entry.id).count();
            if duplicates > 1 {
                return Err(GovernanceError::config(format!(
                    "Duplicate domain id '{}'",
                    entry.id
                )));
            }
        }

        Ok(())
    }

    /// Convert to JSON for serialization
    pub fn to_json(&self) -> GovernanceResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GovernanceError::config(format!("Failed to serialize config: {e}")))
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: GovernanceConfig,
}

impl ConfigBuilder {
    /// Start from defaults but with an empty domain list.
    pub fn new() -> Self {
        let mut config = GovernanceConfig::default();
        config.domains.clear();
        Self { config }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.content.root = root.into();
        self
    }

    pub fn add_domain(mut self, entry: DomainEntry) -> Self {
        self.config.domains.push(entry);
        self
    }

    pub fn build(self) -> GovernanceResult<GovernanceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = GovernanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.domain_ids()[0], "core-governance");
    }

    #[test]
    fn test_load_from_str() {
        let yaml = concat!(
            "version: \"1.0\"\n",
            "content:\n",
            "  root: ./governance\n",
            "domains:\n",
            "  - id: core-governance\n",
            "    name: Core Governance\n",
            "  - id: animal-welfare\n",
        );

        let config = GovernanceConfig::load_from_str(yaml).unwrap();
        assert_eq!(config.domains.len(), 2);
        assert_eq!(
            config.domain("core-governance").unwrap().display_name(),
            "Core Governance"
        );
        assert_eq!(
            config.domain("animal-welfare").unwrap().display_name(),
            "Animal Welfare"
        );
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let yaml = "version: \"9.9\"\ncontent:\n  root: .\ndomains:\n  - id: core\n";
        assert!(matches!(
            GovernanceConfig::load_from_str(yaml),
            Err(GovernanceError::Config { .. })
        ));
    }

    #[test]
    fn test_empty_domain_list_rejected() {
        let yaml = "version: \"1.0\"\ncontent:\n  root: .\ndomains: []\n";
        assert!(GovernanceConfig::load_from_str(yaml).is_err());
    }

    #[test]
    fn test_duplicate_domain_rejected() {
        let config = ConfigBuilder::new()
            .add_domain(DomainEntry::new("core-governance"))
            .add_domain(DomainEntry::new("core-governance"))
            .build();
        assert!(config.is_err());
    }

    #[rstest::rstest]
    #[case("core-governance", true)]
    #[case("ok-123", true)]
    #[case("Core-Governance", false)]
    #[case("with_underscore", false)]
    #[case("spaced out", false)]
    fn test_domain_id_charset(#[case] id: &str, #[case] accepted: bool) {
        let config = ConfigBuilder::new().add_domain(DomainEntry::new(id)).build();
        assert_eq!(config.is_ok(), accepted);
    }

    #[test]
    fn test_builder() {
        let config = ConfigBuilder::new()
            .root("/srv/governance")
            .add_domain(DomainEntry::named("core-governance", "Core"))
            .add_domain(DomainEntry::new("animal-welfare"))
            .build()
            .unwrap();

        assert_eq!(config.content.root, PathBuf::from("/srv/governance"));
        assert_eq!(config.domain_ids(), ["core-governance", "animal-welfare"]);
    }

    #[test]
    fn test_display_name_title_cases_id() {
        assert_eq!(DomainEntry::new("music-industry").display_name(), "Music Industry");
        assert_eq!(DomainEntry::new("environment").display_name(), "Environment");
    }

    #[test]
    fn test_serialization_round_trip() {
        let config = GovernanceConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let rehydrated = GovernanceConfig::load_from_str(&yaml).unwrap();
        assert_eq!(config, rehydrated);
    }
}

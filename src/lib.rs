//! DAHAO governance aggregation - loading, inheritance, and indexing of
//! governance documents
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure domain logic separated from infrastructure concerns
//! - Clean boundaries between aggregation logic and content storage
//! - The service API wraps one repository handle and one configuration,
//!   constructed at process start and threaded through explicitly

pub mod aggregator;
pub mod config;
pub mod discussion;
pub mod domain;
pub mod inheritance;
pub mod loader;
pub mod report;
pub mod repository;

// Re-export main types for convenient access
pub use domain::model::{
    Discussion, DiscussionStatus, GovernanceData, GovernanceError, GovernanceOrganization,
    GovernanceResult, InheritanceConfig, Omission, Principle, PrincipleCategory, Term, TermRef,
};

pub use config::{ConfigBuilder, DomainEntry, GovernanceConfig};

pub use aggregator::GovernanceAggregator;

pub use inheritance::{InheritanceResolver, ResolvedDomain};

pub use report::{GovernanceReportFormatter, OutputFormat, ReportOptions};

pub use repository::{ContentRepository, FsRepository, MemoryRepository, RawDocument};

use std::path::Path;

/// Main governance service providing high-level aggregation operations.
///
/// Owns the configuration and the content repository handle; every load is a
/// fresh, side-effect-free pass over repository state.
pub struct GovernanceService {
    config: GovernanceConfig,
    repository: Box<dyn ContentRepository>,
    report_formatter: GovernanceReportFormatter,
}

impl GovernanceService {
    /// Create a service over the filesystem tree named by the configuration.
    pub fn new_with_config(config: GovernanceConfig) -> Self {
        let repository = Box::new(FsRepository::new(&config.content.root));
        Self {
            config,
            repository,
            report_formatter: GovernanceReportFormatter::default(),
        }
    }

    /// Create a service with default configuration.
    pub fn new() -> Self {
        Self::new_with_config(GovernanceConfig::default())
    }

    /// Create a service loading configuration from a YAML file.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> GovernanceResult<Self> {
        let config = GovernanceConfig::load_from_file(path)?;
        Ok(Self::new_with_config(config))
    }

    /// Swap in a custom repository (e.g. an in-memory fake, or a remote
    /// contents reader).
    pub fn with_repository(mut self, repository: Box<dyn ContentRepository>) -> Self {
        self.repository = repository;
        self
    }

    /// Set a custom report formatter.
    pub fn with_report_formatter(mut self, formatter: GovernanceReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Assemble the complete governance data set.
    ///
    /// Safe to call repeatedly: no shared state is mutated, and unchanged
    /// repository content yields a structurally equal result.
    pub async fn load_governance_data(&self) -> GovernanceResult<GovernanceData> {
        let aggregator = GovernanceAggregator::new(&self.config, self.repository.as_ref());
        aggregator.load_governance_data()
    }

    /// Resolve one domain's effective principle set without a full load.
    pub fn resolve_domain(&self, domain: &str) -> GovernanceResult<ResolvedDomain> {
        InheritanceResolver::new(self.repository.as_ref()).resolve(domain)
    }

    /// Format aggregated data for output.
    pub fn format_report(
        &self,
        data: &GovernanceData,
        format: OutputFormat,
    ) -> GovernanceResult<String> {
        self.report_formatter.format_report(data, format)
    }
}

impl Default for GovernanceService {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to aggregate a governance tree on disk with the
/// default domain set.
pub async fn load_governance_data<P: AsRef<Path>>(root: P) -> GovernanceResult<GovernanceData> {
    let config = GovernanceConfig::default().with_root(root.as_ref());
    let service = GovernanceService::new_with_config(config);
    service.load_governance_data().await
}

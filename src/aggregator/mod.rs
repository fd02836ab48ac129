//! Governance aggregation orchestrator
//!
//! CDD Principle: Domain Services - The aggregator coordinates loading,
//! inheritance resolution, and discussion indexing across all configured
//! domains
//! - Same input file set, same aggregate: a pure function of repository state
//!   at call time, with no caching or memoization across calls
//! - Failure containment at domain granularity: a domain that cannot resolve
//!   is omitted and recorded, never fatal for the whole aggregation
//! - Organizations keep the configured priority order, root domain first

use crate::config::GovernanceConfig;
use crate::discussion::DiscussionIndexer;
use crate::domain::model::{
    Discussion, GovernanceData, GovernanceOrganization, GovernanceResult, Omission,
};
use crate::inheritance::InheritanceResolver;
use crate::loader::Loader;
use crate::repository::ContentRepository;
use std::collections::BTreeSet;

/// Aggregates the full governance data set from a content repository.
pub struct GovernanceAggregator<'a> {
    config: &'a GovernanceConfig,
    repository: &'a dyn ContentRepository,
    loader: Loader,
    indexer: DiscussionIndexer,
}

impl<'a> GovernanceAggregator<'a> {
    pub fn new(config: &'a GovernanceConfig, repository: &'a dyn ContentRepository) -> Self {
        Self {
            config,
            repository,
            loader: Loader::new(),
            indexer: DiscussionIndexer::new(),
        }
    }

    /// Assemble the complete `GovernanceData` for the configured domains.
    ///
    /// Best-effort by contract: a domain whose inheritance chain is cyclic,
    /// whose config is unreadable, or whose upstream fetch fails is omitted
    /// from `organizations` with an entry in `omissions`; files that fail to
    /// parse are skipped the same way. Only repository-level failures that
    /// leave nothing to aggregate surface as errors.
    pub fn load_governance_data(&self) -> GovernanceResult<GovernanceData> {
        let mut data = GovernanceData::empty();
        let resolver = InheritanceResolver::new(self.repository);

        for entry in &self.config.domains {
            match self.aggregate_domain(&resolver, &entry.id, &entry.display_name()) {
                Ok((organization, omissions)) => {
                    data.principles_by_org
                        .insert(organization.id.clone(), organization.principles.clone());
                    data.organizations.push(organization);
                    data.omissions.extend(omissions);
                }
                Err(e) => {
                    tracing::warn!("Omitting domain '{}': {}", entry.id, e);
                    data.omissions.push(Omission::domain_level(&entry.id, e.to_string()));
                }
            }
        }

        if let Some(first) = data.organizations.first() {
            if !first.inheritance.is_root() {
                tracing::warn!(
                    "First configured domain '{}' is not the inheritance root",
                    first.id
                );
            }
        }

        self.index_discussions(&mut data);
        Ok(data)
    }

    /// Load one domain end to end: inheritance chain, terms, discussions.
    fn aggregate_domain(
        &self,
        resolver: &InheritanceResolver<'_>,
        domain: &str,
        display_name: &str,
    ) -> GovernanceResult<(GovernanceOrganization, Vec<Omission>)> {
        let resolved = resolver.resolve(domain)?;
        let mut omissions = resolved.omissions;

        let term_documents = self.repository.read_term_files(domain)?;
        let (terms, term_omissions) = self.loader.load_terms(domain, &term_documents)?;
        omissions.extend(term_omissions);

        let (discussions, discussion_omissions) = self.load_discussions(domain)?;
        omissions.extend(discussion_omissions);

        let mut principles: Vec<_> = resolved.effective.into_values().collect();
        principles.sort_by(crate::domain::model::Principle::display_order);

        let organization = GovernanceOrganization {
            id: domain.to_string(),
            name: display_name.to_string(),
            inheritance: resolved.inheritance,
            terms,
            principles,
            discussions,
        };

        Ok((organization, omissions))
    }

    fn load_discussions(
        &self,
        domain: &str,
    ) -> GovernanceResult<(Vec<Discussion>, Vec<Omission>)> {
        let documents = self.repository.read_discussion_files(domain)?;

        let mut discussions = Vec::with_capacity(documents.len());
        let mut omissions = Vec::new();

        for document in &documents {
            match self.indexer.parse(document) {
                Ok(discussion) => discussions.push(discussion),
                Err(e) => {
                    tracing::warn!(
                        "Skipping discussion {}: {}",
                        document.path.display(),
                        e
                    );
                    omissions.push(Omission::file_level(domain, &document.path, e.to_string()));
                }
            }
        }

        discussions.sort_by(Discussion::recency_order);
        Ok((discussions, omissions))
    }

    /// Build the global discussions-by-principle index over every
    /// organization's effective principle ids.
    fn index_discussions(&self, data: &mut GovernanceData) {
        for organization in &data.organizations {
            let known: BTreeSet<String> = organization
                .principles
                .iter()
                .map(|p| p.principle_id.clone())
                .collect();

            let index = self.indexer.index_by_principle(&organization.discussions, &known);
            for (principle_id, mut discussions) in index {
                data.discussions_by_principle
                    .entry(principle_id)
                    .or_default()
                    .append(&mut discussions);
            }
        }

        // Cross-domain merges need a final re-sort to stay newest-first
        for bucket in data.discussions_by_principle.values_mut() {
            bucket.sort_by(Discussion::recency_order);
        }
    }
}

//! Domain inheritance resolution
//!
//! CDD Principle: Domain Services - The resolver orchestrates the
//! parent-before-child assembly of a domain's effective principle set
//! - Parent chains are resolved recursively, root first, then the child's own
//!   principles are layered on top
//! - A child principle with the same id as an inherited one shadows it; the
//!   shadowed version stays retrievable on the resolution
//! - Cycle detection tracks the current resolution path and fails the domain
//!   with `CyclicInheritance` instead of recursing forever

use crate::domain::model::{
    GovernanceError, GovernanceResult, InheritanceConfig, Omission, Principle,
};
use crate::loader::{Loader, PrincipleSet};
use crate::repository::ContentRepository;
use std::collections::BTreeMap;

/// Outcome of resolving one domain's inheritance chain.
#[derive(Debug, Clone, Default)]
pub struct ResolvedDomain {
    /// The domain's own inheritance declaration
    pub inheritance: InheritanceConfig,
    /// Effective principles by principle id, after layering the whole chain
    pub effective: BTreeMap<String, Principle>,
    /// Inherited principles that a nearer domain shadowed
    pub shadowed: Vec<Principle>,
    /// Every retained version of this domain's own principles
    pub own_set: PrincipleSet,
    /// File-level skips encountered while loading the chain
    pub omissions: Vec<Omission>,
}

/// Resolves `extends` chains against a content repository.
pub struct InheritanceResolver<'a> {
    repository: &'a dyn ContentRepository,
    loader: Loader,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(repository: &'a dyn ContentRepository) -> Self {
        Self { repository, loader: Loader::new() }
    }

    /// Resolve the effective principle set for `domain`.
    ///
    /// Fails with `CyclicInheritance` if the `extends` chain revisits a
    /// domain (including `extends: <self>`), and with `Parse` if the domain's
    /// inheritance declaration cannot be read as YAML. Either failure is
    /// fatal for this domain only; callers omit the domain and continue.
    pub fn resolve(&self, domain: &str) -> GovernanceResult<ResolvedDomain> {
        let mut path = Vec::new();
        self.resolve_inner(domain, &mut path)
    }

    /// Load just the inheritance declaration for `domain`.
    ///
    /// A missing `inheritance.yaml` yields a standalone (root) config rather
    /// than an error so bare domains still aggregate.
    pub fn load_config(&self, domain: &str) -> GovernanceResult<InheritanceConfig> {
        let document = match self.repository.read_inheritance_config(domain) {
            Ok(document) => document,
            Err(GovernanceError::NotFound { .. }) => {
                tracing::debug!("No inheritance config for '{domain}', treating as standalone");
                return Ok(InheritanceConfig::standalone(domain));
            }
            Err(e) => return Err(e),
        };

        let mut config: InheritanceConfig =
            serde_yaml::from_str(&document.text).map_err(|e| {
                GovernanceError::parse(document.path.display().to_string(), e.to_string())
            })?;

        if config.domain != domain {
            tracing::warn!(
                "Inheritance config in {} declares domain '{}', expected '{}'",
                document.path.display(),
                config.domain,
                domain
            );
            config.domain = domain.to_string();
        }

        Ok(config)
    }

    fn resolve_inner(
        &self,
        domain: &str,
        path: &mut Vec<String>,
    ) -> GovernanceResult<ResolvedDomain> {
        if path.iter().any(|seen| seen == domain) {
            let mut chain = path.clone();
            chain.push(domain.to_string());
            return Err(GovernanceError::cyclic(domain, &chain));
        }
        path.push(domain.to_string());

        let config = self.load_config(domain)?;

        // Parent first, so nearer domains layer over farther ones
        let mut resolved = match &config.extends {
            Some(parent) => {
                let parent_resolution = self.resolve_inner(parent, path)?;
                ResolvedDomain {
                    inheritance: config,
                    effective: parent_resolution.effective,
                    shadowed: parent_resolution.shadowed,
                    own_set: PrincipleSet::default(),
                    omissions: parent_resolution.omissions,
                }
            }
            None => ResolvedDomain { inheritance: config, ..Default::default() },
        };

        let documents = self.repository.read_principle_files(domain)?;
        let (own_set, omissions) = self.loader.load_principles(domain, &documents)?;
        resolved.omissions.extend(omissions);

        for (principle_id, principle) in own_set.heads() {
            if let Some(displaced) = resolved.effective.insert(principle_id, principle) {
                resolved.shadowed.push(displaced);
            }
        }
        resolved.own_set = own_set;

        path.pop();
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    fn principle_yaml(id: &str, version: &str, category: &str, name: &str) -> String {
        format!(
            concat!(
                "principles:\n",
                "  {id}:\n",
                "    version: \"{version}\"\n",
                "    name: {name}\n",
                "    description: d\n",
                "    category: {category}\n",
            ),
            id = id,
            version = version,
            category = category,
            name = name,
        )
    }

    fn inheritance_yaml(domain: &str, extends: Option<&str>) -> String {
        match extends {
            Some(parent) => format!("domain: {domain}\nextends: {parent}\n"),
            None => format!("domain: {domain}\nextends: null\n"),
        }
    }

    #[test]
    fn test_root_domain_returns_own_set() {
        let repo = MemoryRepository::new()
            .with_inheritance("core-governance", inheritance_yaml("core-governance", None))
            .with_principle_file(
                "core-governance",
                "p.yaml",
                principle_yaml("transparency", "1.0", "core", "Transparency"),
            );

        let resolver = InheritanceResolver::new(&repo);
        let resolved = resolver.resolve("core-governance").unwrap();

        assert!(resolved.inheritance.is_root());
        assert_eq!(resolved.effective.len(), 1);
        assert_eq!(resolved.effective["transparency"].version, "1.0");
        assert!(resolved.shadowed.is_empty());
        // Own set carries the full retained history for the domain
        assert_eq!(resolved.own_set.len(), 1);
        assert!(resolved.own_set.get("transparency@1.0").is_some());
    }

    #[test]
    fn test_child_inherits_unshadowed_parent_principles() {
        let repo = MemoryRepository::new()
            .with_inheritance("core-governance", inheritance_yaml("core-governance", None))
            .with_principle_file(
                "core-governance",
                "p.yaml",
                principle_yaml("transparency", "1.0", "core", "Transparency"),
            )
            .with_inheritance(
                "animal-welfare",
                inheritance_yaml("animal-welfare", Some("core-governance")),
            )
            .with_principle_file(
                "animal-welfare",
                "p.yaml",
                principle_yaml("five-freedoms", "1.0", "domain_core", "Five Freedoms"),
            );

        let resolver = InheritanceResolver::new(&repo);
        let resolved = resolver.resolve("animal-welfare").unwrap();

        // transparency@1.0 arrives unchanged from the parent
        assert_eq!(resolved.effective.len(), 2);
        assert_eq!(resolved.effective["transparency"].version, "1.0");
        assert_eq!(
            resolved.effective["transparency"].domain.as_deref(),
            Some("core-governance")
        );
        assert_eq!(resolved.effective["five-freedoms"].version, "1.0");
    }

    #[test]
    fn test_child_shadows_parent_principle() {
        let repo = MemoryRepository::new()
            .with_inheritance("core-governance", inheritance_yaml("core-governance", None))
            .with_principle_file(
                "core-governance",
                "p.yaml",
                principle_yaml("transparency", "1.0", "core", "Transparency"),
            )
            .with_inheritance(
                "animal-welfare",
                inheritance_yaml("animal-welfare", Some("core-governance")),
            )
            .with_principle_file(
                "animal-welfare",
                "p.yaml",
                principle_yaml("transparency", "1.1", "domain_enhanced", "Transparency"),
            );

        let resolver = InheritanceResolver::new(&repo);
        let resolved = resolver.resolve("animal-welfare").unwrap();

        assert_eq!(resolved.effective.len(), 1);
        assert_eq!(resolved.effective["transparency"].version, "1.1");
        // The parent version remains retrievable via shadow history
        assert_eq!(resolved.shadowed.len(), 1);
        assert_eq!(resolved.shadowed[0].version, "1.0");
    }

    #[test]
    fn test_three_level_chain() {
        // music-industry -> animal-welfare -> core-governance
        let repo = MemoryRepository::new()
            .with_inheritance("core-governance", inheritance_yaml("core-governance", None))
            .with_principle_file(
                "core-governance",
                "p.yaml",
                principle_yaml("transparency", "1.0", "core", "Transparency"),
            )
            .with_inheritance(
                "animal-welfare",
                inheritance_yaml("animal-welfare", Some("core-governance")),
            )
            .with_principle_file(
                "animal-welfare",
                "p.yaml",
                principle_yaml("five-freedoms", "1.0", "domain_core", "Five Freedoms"),
            )
            .with_inheritance(
                "music-industry",
                inheritance_yaml("music-industry", Some("animal-welfare")),
            )
            .with_principle_file(
                "music-industry",
                "p.yaml",
                principle_yaml("fair-royalties", "1.0", "domain_specific", "Fair Royalties"),
            );

        let resolver = InheritanceResolver::new(&repo);
        let resolved = resolver.resolve("music-industry").unwrap();

        assert_eq!(resolved.effective.len(), 3);
        assert!(resolved.effective.contains_key("transparency"));
        assert!(resolved.effective.contains_key("five-freedoms"));
        assert!(resolved.effective.contains_key("fair-royalties"));
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let repo = MemoryRepository::new().with_inheritance(
            "narcissus",
            inheritance_yaml("narcissus", Some("narcissus")),
        );

        let resolver = InheritanceResolver::new(&repo);
        let err = resolver.resolve("narcissus").unwrap_err();
        assert!(matches!(err, GovernanceError::CyclicInheritance { .. }));
    }

    #[test]
    fn test_two_domain_cycle_detected() {
        let repo = MemoryRepository::new()
            .with_inheritance("a", inheritance_yaml("a", Some("b")))
            .with_inheritance("b", inheritance_yaml("b", Some("a")));

        let resolver = InheritanceResolver::new(&repo);
        let err = resolver.resolve("a").unwrap_err();
        match err {
            GovernanceError::CyclicInheritance { domain, chain } => {
                assert_eq!(domain, "a");
                assert_eq!(chain, "a -> b -> a");
            }
            other => panic!("expected cyclic inheritance, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_config_treated_as_standalone() {
        let repo = MemoryRepository::new().with_principle_file(
            "loner",
            "p.yaml",
            principle_yaml("self-rule", "1.0", "domain_core", "Self Rule"),
        );

        let resolver = InheritanceResolver::new(&repo);
        let resolved = resolver.resolve("loner").unwrap();

        assert!(resolved.inheritance.is_root());
        assert_eq!(resolved.effective.len(), 1);
    }

    #[test]
    fn test_malformed_inheritance_config_fails_domain() {
        let repo = MemoryRepository::new().with_inheritance("broken", "extends: [not: valid");

        let resolver = InheritanceResolver::new(&repo);
        assert!(matches!(
            resolver.resolve("broken"),
            Err(GovernanceError::Parse { .. })
        ));
    }

    #[test]
    fn test_parent_parse_omissions_propagate() {
        let repo = MemoryRepository::new()
            .with_inheritance("core-governance", inheritance_yaml("core-governance", None))
            .with_principle_file("core-governance", "bad.yaml", "principles: [broken")
            .with_inheritance(
                "child",
                inheritance_yaml("child", Some("core-governance")),
            );

        let resolver = InheritanceResolver::new(&repo);
        let resolved = resolver.resolve("child").unwrap();

        assert_eq!(resolved.omissions.len(), 1);
        assert_eq!(resolved.omissions[0].domain, "core-governance");
    }
}

//! Term and principle document loading
//!
//! Architecture: Anti-Corruption Layer - Raw YAML documents are converted to
//! typed domain entities before anything else sees them
//! - Serde document structs mirror the on-disk shape; domain types are built
//!   from them through validation, never by spreading arbitrary keys
//! - Malformed documents are quarantined as omissions, not propagated
//! - Merge policy: last file wins by lexicographic path order

use crate::domain::model::{
    GovernanceResult, Omission, Principle, PrincipleCategory, Term, TermRef,
};
use crate::repository::RawDocument;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// On-disk shape of a term file: `terms: { <id>: {...} }`.
#[derive(Debug, Deserialize)]
struct TermDocument {
    #[serde(default)]
    terms: BTreeMap<String, RawTerm>,
}

#[derive(Debug, Deserialize)]
struct RawTerm {
    definition: String,
    version: String,
    ratified: Option<NaiveDate>,
    approval_rate: Option<f64>,
    extends: Option<RawTermRef>,
    specificity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTermRef {
    domain: String,
    id: String,
    version: Option<String>,
}

/// On-disk shape of a principle file: `principles: { <id>: {...} }`.
///
/// A single file defines at most one version per principle id; further
/// versions of the same id live in sibling files (conventionally history
/// files), and the merged dictionary keys them as `id@version`.
#[derive(Debug, Deserialize)]
struct PrincipleDocument {
    #[serde(default)]
    principles: BTreeMap<String, RawPrinciple>,
}

#[derive(Debug, Deserialize)]
struct RawPrinciple {
    version: String,
    name: String,
    description: String,
    category: PrincipleCategory,
    previous_version: Option<String>,
    #[serde(default)]
    requirements: Vec<String>,
    #[serde(default)]
    validation_rules: Vec<String>,
    #[serde(default)]
    cross_domain_applications: BTreeMap<String, String>,
}

/// All versions of a domain's principles, keyed by `id@version`.
///
/// Prior versions are retained for history; the effective set exposed to the
/// inheritance resolver is the chain head per principle id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrincipleSet {
    by_qualified: BTreeMap<String, Principle>,
}

impl PrincipleSet {
    pub fn is_empty(&self) -> bool {
        self.by_qualified.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_qualified.len()
    }

    /// Look up an exact `id@version`.
    pub fn get(&self, qualified_id: &str) -> Option<&Principle> {
        self.by_qualified.get(qualified_id)
    }

    /// All retained versions of one principle id, oldest qualified id first.
    pub fn history(&self, principle_id: &str) -> Vec<&Principle> {
        self.by_qualified
            .values()
            .filter(|p| p.principle_id == principle_id)
            .collect()
    }

    /// Current version per principle id: the version no other version of the
    /// same id names as its `previous_version`. Broken chains fall back to
    /// the greatest version string so the result stays deterministic.
    pub fn heads(&self) -> BTreeMap<String, Principle> {
        let mut referenced: BTreeSet<(String, String)> = BTreeSet::new();
        for p in self.by_qualified.values() {
            if let Some(prev) = &p.previous_version {
                referenced.insert((p.principle_id.clone(), prev.clone()));
            }
        }

        let mut heads: BTreeMap<String, Principle> = BTreeMap::new();
        for p in self.by_qualified.values() {
            let is_referenced =
                referenced.contains(&(p.principle_id.clone(), p.version.clone()));
            if is_referenced {
                continue;
            }
            match heads.get(&p.principle_id) {
                Some(existing) if existing.version >= p.version => {}
                _ => {
                    heads.insert(p.principle_id.clone(), p.clone());
                }
            }
        }

        // A previous_version cycle leaves every version referenced, so the
        // reference rule selects no head at all. Fall back to the greatest
        // version string for those ids.
        let headless: BTreeSet<String> = self
            .by_qualified
            .values()
            .filter(|p| !heads.contains_key(&p.principle_id))
            .map(|p| p.principle_id.clone())
            .collect();
        for p in self.by_qualified.values() {
            if !headless.contains(&p.principle_id) {
                continue;
            }
            match heads.get(&p.principle_id) {
                Some(existing) if existing.version >= p.version => {}
                _ => {
                    heads.insert(p.principle_id.clone(), p.clone());
                }
            }
        }

        heads
    }

    fn insert(&mut self, principle: Principle) {
        self.by_qualified.insert(principle.qualified_id(), principle);
    }
}

/// Loads and merges term/principle documents for one domain at a time.
///
/// Stateless by design: every load is a pure function of the documents passed
/// in, so repeated loads against unchanged input are structurally equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Loader;

impl Loader {
    pub fn new() -> Self {
        Self
    }

    /// Parse and merge a domain's term files into one dictionary keyed by
    /// term id. Later files (lexicographic path order) win on id collision;
    /// files that fail to parse are skipped and recorded as omissions.
    pub fn load_terms(
        &self,
        domain: &str,
        documents: &[RawDocument],
    ) -> GovernanceResult<(BTreeMap<String, Term>, Vec<Omission>)> {
        let parsed = Self::parse_all::<TermDocument>(documents);

        let mut terms = BTreeMap::new();
        let mut omissions = Vec::new();

        for (document, outcome) in documents.iter().zip(parsed) {
            match outcome {
                Ok(doc) => {
                    for (id, raw) in doc.terms {
                        match Self::validate_term(domain, &id, raw, &document.path) {
                            Ok(term) => {
                                // Last file wins on collision
                                terms.insert(id, term);
                            }
                            Err(reason) => {
                                tracing::warn!(
                                    "Skipping term '{}' in {}: {}",
                                    id,
                                    document.path.display(),
                                    reason
                                );
                                omissions.push(Omission::file_level(
                                    domain,
                                    &document.path,
                                    format!("term '{id}': {reason}"),
                                ));
                            }
                        }
                    }
                }
                Err(message) => {
                    tracing::warn!(
                        "Failed to parse term file {}: {}",
                        document.path.display(),
                        message
                    );
                    omissions.push(Omission::file_level(domain, &document.path, message));
                }
            }
        }

        Ok((terms, omissions))
    }

    /// Parse and merge a domain's principle files, retaining every version.
    /// Collisions on the same `id@version` are last-file-wins; dangling
    /// `previous_version` links are recorded as omissions but the principle
    /// is retained.
    pub fn load_principles(
        &self,
        domain: &str,
        documents: &[RawDocument],
    ) -> GovernanceResult<(PrincipleSet, Vec<Omission>)> {
        let parsed = Self::parse_all::<PrincipleDocument>(documents);

        let mut set = PrincipleSet::default();
        let mut omissions = Vec::new();

        for (document, outcome) in documents.iter().zip(parsed) {
            match outcome {
                Ok(doc) => {
                    for (id, raw) in doc.principles {
                        match Self::validate_principle(domain, &id, raw, &document.path) {
                            Ok(principle) => set.insert(principle),
                            Err(reason) => {
                                tracing::warn!(
                                    "Skipping principle '{}' in {}: {}",
                                    id,
                                    document.path.display(),
                                    reason
                                );
                                omissions.push(Omission::file_level(
                                    domain,
                                    &document.path,
                                    format!("principle '{id}': {reason}"),
                                ));
                            }
                        }
                    }
                }
                Err(message) => {
                    tracing::warn!(
                        "Failed to parse principle file {}: {}",
                        document.path.display(),
                        message
                    );
                    omissions.push(Omission::file_level(domain, &document.path, message));
                }
            }
        }

        omissions.extend(Self::check_version_chains(domain, &set));

        Ok((set, omissions))
    }

    /// Parse all documents in parallel. Results come back in input order so
    /// the sequential merge preserves last-file-wins semantics.
    fn parse_all<T>(documents: &[RawDocument]) -> Vec<Result<T, String>>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        documents
            .par_iter()
            .map(|doc| serde_yaml::from_str::<T>(&doc.text).map_err(|e| e.to_string()))
            .collect()
    }

    fn validate_term(
        domain: &str,
        id: &str,
        raw: RawTerm,
        _path: &Path,
    ) -> Result<Term, String> {
        if id.trim().is_empty() {
            return Err("empty term id".to_string());
        }
        if raw.definition.trim().is_empty() {
            return Err("empty definition".to_string());
        }
        if raw.version.trim().is_empty() {
            return Err("empty version".to_string());
        }

        Ok(Term {
            id: id.to_string(),
            domain: domain.to_string(),
            definition: raw.definition,
            version: raw.version,
            ratified: raw.ratified,
            approval_rate: raw.approval_rate,
            extends: raw.extends.map(|r| TermRef {
                domain: r.domain,
                id: r.id,
                version: r.version,
            }),
            specificity: raw.specificity,
        })
    }

    fn validate_principle(
        domain: &str,
        id: &str,
        raw: RawPrinciple,
        _path: &Path,
    ) -> Result<Principle, String> {
        if id.trim().is_empty() {
            return Err("empty principle id".to_string());
        }
        if raw.version.trim().is_empty() {
            return Err("empty version".to_string());
        }
        if raw.name.trim().is_empty() {
            return Err("empty name".to_string());
        }

        Ok(Principle {
            principle_id: id.to_string(),
            version: raw.version,
            name: raw.name,
            description: raw.description,
            category: raw.category,
            domain: Some(domain.to_string()),
            previous_version: raw.previous_version,
            requirements: raw.requirements,
            validation_rules: raw.validation_rules,
            cross_domain_applications: raw.cross_domain_applications,
        })
    }

    /// Every non-root version's `previous_version` must resolve to a loaded
    /// version of the same id in the same domain, and each id must have a
    /// version no other version references (otherwise the chain is cyclic).
    fn check_version_chains(domain: &str, set: &PrincipleSet) -> Vec<Omission> {
        let mut omissions = Vec::new();
        let mut referenced: BTreeSet<(&str, &str)> = BTreeSet::new();

        for principle in set.by_qualified.values() {
            if let Some(prev) = &principle.previous_version {
                referenced.insert((principle.principle_id.as_str(), prev.as_str()));
                let wanted = format!("{}@{}", principle.principle_id, prev);
                if set.get(&wanted).is_none() {
                    tracing::warn!(
                        "Principle {} names missing previous version {}",
                        principle.qualified_id(),
                        wanted
                    );
                    omissions.push(Omission::domain_level(
                        domain,
                        format!(
                            "principle {} names missing previous version {}",
                            principle.qualified_id(),
                            wanted
                        ),
                    ));
                }
            }
        }

        // An id whose every version is referenced has a previous_version
        // cycle; heads() falls back to the greatest version for it.
        let mut cyclic: BTreeSet<&str> = set
            .by_qualified
            .values()
            .map(|p| p.principle_id.as_str())
            .collect();
        for principle in set.by_qualified.values() {
            if !referenced
                .contains(&(principle.principle_id.as_str(), principle.version.as_str()))
            {
                cyclic.remove(principle.principle_id.as_str());
            }
        }
        for id in cyclic {
            tracing::warn!(
                "Principle '{}' versions form a previous_version cycle; greatest version used",
                id
            );
            omissions.push(Omission::domain_level(
                domain,
                format!(
                    "principle '{id}' versions form a previous_version cycle; greatest version used"
                ),
            ));
        }

        omissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str, text: &str) -> RawDocument {
        RawDocument::new(path, text)
    }

    #[test]
    fn test_load_terms_merges_files() {
        let docs = vec![
            doc(
                "core/terms/a.yaml",
                "terms:\n  harm:\n    definition: Damage to wellbeing\n    version: \"1.0\"\n",
            ),
            doc(
                "core/terms/b.yaml",
                "terms:\n  being:\n    definition: Any sentient entity\n    version: \"1.1\"\n",
            ),
        ];

        let loader = Loader::new();
        let (terms, omissions) = loader.load_terms("core-governance", &docs).unwrap();

        assert_eq!(terms.len(), 2);
        assert!(omissions.is_empty());
        assert_eq!(terms["harm"].domain, "core-governance");
        assert_eq!(terms["being"].version, "1.1");
    }

    #[test]
    fn test_term_merge_last_file_wins() {
        // Lexicographic path order defines "last": b.yaml overrides a.yaml
        let docs = vec![
            doc(
                "core/terms/a.yaml",
                "terms:\n  harm:\n    definition: First definition\n    version: \"1.0\"\n",
            ),
            doc(
                "core/terms/b.yaml",
                "terms:\n  harm:\n    definition: Second definition\n    version: \"2.0\"\n",
            ),
        ];

        let loader = Loader::new();
        let (terms, _) = loader.load_terms("core-governance", &docs).unwrap();

        assert_eq!(terms.len(), 1);
        assert_eq!(terms["harm"].definition, "Second definition");
        assert_eq!(terms["harm"].version, "2.0");
    }

    #[test]
    fn test_malformed_term_file_is_skipped() {
        let docs = vec![
            doc(
                "core/terms/a.yaml",
                "terms:\n  harm:\n    definition: Valid\n    version: \"1.0\"\n",
            ),
            doc("core/terms/b.yaml", "terms: [this is not a map"),
            doc(
                "core/terms/c.yaml",
                "terms:\n  dignity:\n    definition: Also valid\n    version: \"1.0\"\n",
            ),
        ];

        let loader = Loader::new();
        let (terms, omissions) = loader.load_terms("core-governance", &docs).unwrap();

        assert_eq!(terms.len(), 2);
        assert_eq!(omissions.len(), 1);
        assert_eq!(
            omissions[0].source_path.as_deref(),
            Some(Path::new("core/terms/b.yaml"))
        );
    }

    #[test]
    fn test_term_with_empty_definition_quarantined() {
        let docs = vec![doc(
            "core/terms/a.yaml",
            "terms:\n  harm:\n    definition: \"\"\n    version: \"1.0\"\n",
        )];

        let loader = Loader::new();
        let (terms, omissions) = loader.load_terms("core-governance", &docs).unwrap();

        assert!(terms.is_empty());
        assert_eq!(omissions.len(), 1);
        assert!(omissions[0].reason.contains("empty definition"));
    }

    #[test]
    fn test_load_principles_retains_history() {
        let docs = vec![
            doc(
                "core/principles/history.yaml",
                concat!(
                    "principles:\n",
                    "  transparency:\n",
                    "    version: \"1.0\"\n",
                    "    name: Transparency\n",
                    "    description: Original statement\n",
                    "    category: core\n",
                ),
            ),
            doc(
                "core/principles/current.yaml",
                concat!(
                    "principles:\n",
                    "  transparency:\n",
                    "    version: \"1.1\"\n",
                    "    name: Transparency\n",
                    "    description: Revised statement\n",
                    "    category: core\n",
                    "    previous_version: \"1.0\"\n",
                ),
            ),
        ];

        let loader = Loader::new();
        let (set, omissions) = loader.load_principles("core-governance", &docs).unwrap();

        assert!(omissions.is_empty());
        assert_eq!(set.len(), 2);
        assert_eq!(set.history("transparency").len(), 2);

        let heads = set.heads();
        assert_eq!(heads.len(), 1);
        assert_eq!(heads["transparency"].version, "1.1");
        // The shadowed version stays retrievable
        assert!(set.get("transparency@1.0").is_some());
    }

    #[test]
    fn test_dangling_previous_version_recorded() {
        let docs = vec![doc(
            "core/principles/p.yaml",
            concat!(
                "principles:\n",
                "  fairness:\n",
                "    version: \"2.0\"\n",
                "    name: Fairness\n",
                "    description: d\n",
                "    category: core\n",
                "    previous_version: \"1.9\"\n",
            ),
        )];

        let loader = Loader::new();
        let (set, omissions) = loader.load_principles("core-governance", &docs).unwrap();

        // Retained despite the broken chain
        assert!(set.get("fairness@2.0").is_some());
        assert_eq!(omissions.len(), 1);
        assert!(omissions[0].reason.contains("fairness@1.9"));
    }

    #[test]
    fn test_cyclic_previous_version_falls_back_to_greatest() {
        // 1.0 and 2.0 name each other, so neither is an unreferenced head
        let docs = vec![doc(
            "core/principles/p.yaml",
            concat!(
                "principles:\n",
                "  fairness:\n",
                "    version: \"2.0\"\n",
                "    name: Fairness\n",
                "    description: d\n",
                "    category: core\n",
                "    previous_version: \"1.0\"\n",
            ),
        ), doc(
            "core/principles/q.yaml",
            concat!(
                "principles:\n",
                "  fairness:\n",
                "    version: \"1.0\"\n",
                "    name: Fairness\n",
                "    description: d\n",
                "    category: core\n",
                "    previous_version: \"2.0\"\n",
            ),
        )];

        let loader = Loader::new();
        let (set, omissions) = loader.load_principles("core-governance", &docs).unwrap();

        assert_eq!(set.len(), 2);
        let heads = set.heads();
        assert_eq!(heads["fairness"].version, "2.0");
        assert_eq!(omissions.len(), 1);
        assert!(omissions[0].reason.contains("cycle"));
    }

    #[test]
    fn test_unknown_category_is_parse_failure() {
        let docs = vec![doc(
            "core/principles/p.yaml",
            concat!(
                "principles:\n",
                "  fairness:\n",
                "    version: \"1.0\"\n",
                "    name: Fairness\n",
                "    description: d\n",
                "    category: not_a_category\n",
            ),
        )];

        let loader = Loader::new();
        let (set, omissions) = loader.load_principles("core-governance", &docs).unwrap();

        assert!(set.is_empty());
        assert_eq!(omissions.len(), 1);
    }

    #[test]
    fn test_empty_document_list() {
        let loader = Loader::new();
        let (terms, omissions) = loader.load_terms("core-governance", &[]).unwrap();
        assert!(terms.is_empty());
        assert!(omissions.is_empty());
    }

    #[test]
    fn test_determinism_across_loads() {
        let docs = vec![
            doc(
                "core/terms/a.yaml",
                "terms:\n  harm:\n    definition: One\n    version: \"1.0\"\n",
            ),
            doc(
                "core/terms/b.yaml",
                "terms:\n  harm:\n    definition: Two\n    version: \"1.1\"\n",
            ),
        ];

        let loader = Loader::new();
        let first = loader.load_terms("core-governance", &docs).unwrap();
        let second = loader.load_terms("core-governance", &docs).unwrap();
        assert_eq!(first.0, second.0);
    }
}

//! Content repository abstraction over the governance document tree
//!
//! Architecture: Anti-Corruption Layer - Repositories translate storage layouts
//! into raw documents
//! - The trait is the seam for swapping the filesystem for a remote contents API
//! - Documents are returned as (path, text) pairs so merge order stays testable
//! - All listings are lexicographically ordered; last-file-wins depends on it

use crate::domain::model::{GovernanceError, GovernanceResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A raw document read from the content tree, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub path: PathBuf,
    pub text: String,
}

impl RawDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self { path: path.into(), text: text.into() }
    }
}

/// Upstream collaborator interface: everything the aggregation reads.
///
/// Implementations must return documents in lexicographic path order; the
/// loader's last-file-wins merge is defined over that order. A missing
/// subtree yields `Ok(vec![])`, not an error; a missing inheritance config
/// yields `NotFound` so the caller can fall back to a standalone config.
/// Remote implementations map fetch failures to `Upstream`, which the
/// aggregator contains by omitting the affected domain.
pub trait ContentRepository: Send + Sync {
    /// Domains present in the content tree, lexicographically ordered.
    fn list_domains(&self) -> GovernanceResult<Vec<String>>;

    /// Term documents under `<domain>/terms/`.
    fn read_term_files(&self, domain: &str) -> GovernanceResult<Vec<RawDocument>>;

    /// Principle documents under `<domain>/principles/`.
    fn read_principle_files(&self, domain: &str) -> GovernanceResult<Vec<RawDocument>>;

    /// The domain's `inheritance.yaml`, if present.
    fn read_inheritance_config(&self, domain: &str) -> GovernanceResult<RawDocument>;

    /// Discussion documents under `<domain>/discussions/`.
    fn read_discussion_files(&self, domain: &str) -> GovernanceResult<Vec<RawDocument>>;
}

/// File extensions recognized as structured governance documents.
const YAML_EXTENSIONS: &[&str] = &["yaml", "yml"];
/// File extensions recognized as discussion documents.
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

const INHERITANCE_FILE: &str = "inheritance.yaml";
const TERMS_DIR: &str = "terms";
const PRINCIPLES_DIR: &str = "principles";
const DISCUSSIONS_DIR: &str = "discussions";

/// Filesystem-backed repository rooted at a governance content directory.
///
/// Layout convention:
/// ```text
/// <root>/<domain>/inheritance.yaml
/// <root>/<domain>/terms/*.yaml
/// <root>/<domain>/principles/*.yaml
/// <root>/<domain>/discussions/*.md
/// ```
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn domain_dir(&self, domain: &str) -> PathBuf {
        self.root.join(domain)
    }

    /// Read every file with one of `extensions` directly under `dir`, sorted
    /// by path. A missing directory is an empty result, not an error.
    fn read_dir_documents(
        &self,
        dir: &Path,
        extensions: &[&str],
    ) -> GovernanceResult<Vec<RawDocument>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| extensions.contains(&ext))
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let text = fs::read_to_string(&path)?;
            documents.push(RawDocument { path, text });
        }
        Ok(documents)
    }
}

impl ContentRepository for FsRepository {
    fn list_domains(&self) -> GovernanceResult<Vec<String>> {
        if !self.root.is_dir() {
            return Err(GovernanceError::not_found(format!(
                "content root '{}'",
                self.root.display()
            )));
        }

        let mut domains: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        domains.sort();
        Ok(domains)
    }

    fn read_term_files(&self, domain: &str) -> GovernanceResult<Vec<RawDocument>> {
        self.read_dir_documents(&self.domain_dir(domain).join(TERMS_DIR), YAML_EXTENSIONS)
    }

    fn read_principle_files(&self, domain: &str) -> GovernanceResult<Vec<RawDocument>> {
        self.read_dir_documents(&self.domain_dir(domain).join(PRINCIPLES_DIR), YAML_EXTENSIONS)
    }

    fn read_inheritance_config(&self, domain: &str) -> GovernanceResult<RawDocument> {
        let path = self.domain_dir(domain).join(INHERITANCE_FILE);
        if !path.is_file() {
            return Err(GovernanceError::not_found(format!(
                "{} for domain '{}'",
                INHERITANCE_FILE, domain
            )));
        }
        let text = fs::read_to_string(&path)?;
        Ok(RawDocument { path, text })
    }

    fn read_discussion_files(&self, domain: &str) -> GovernanceResult<Vec<RawDocument>> {
        self.read_dir_documents(
            &self.domain_dir(domain).join(DISCUSSIONS_DIR),
            MARKDOWN_EXTENSIONS,
        )
    }
}

/// In-memory repository for tests and embedded fixtures.
///
/// Paths are synthetic (`<domain>/terms/<name>`) and documents are returned in
/// BTreeMap order, which matches the lexicographic contract.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    terms: BTreeMap<String, BTreeMap<String, String>>,
    principles: BTreeMap<String, BTreeMap<String, String>>,
    inheritance: BTreeMap<String, String>,
    discussions: BTreeMap<String, BTreeMap<String, String>>,
    domains: Vec<String>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn register_domain(&mut self, domain: &str) {
        if !self.domains.iter().any(|d| d == domain) {
            self.domains.push(domain.to_string());
            self.domains.sort();
        }
    }

    pub fn with_term_file(
        mut self,
        domain: &str,
        file_name: &str,
        text: impl Into<String>,
    ) -> Self {
        self.register_domain(domain);
        self.terms
            .entry(domain.to_string())
            .or_default()
            .insert(file_name.to_string(), text.into());
        self
    }

    pub fn with_principle_file(
        mut self,
        domain: &str,
        file_name: &str,
        text: impl Into<String>,
    ) -> Self {
        self.register_domain(domain);
        self.principles
            .entry(domain.to_string())
            .or_default()
            .insert(file_name.to_string(), text.into());
        self
    }

    pub fn with_inheritance(mut self, domain: &str, text: impl Into<String>) -> Self {
        self.register_domain(domain);
        self.inheritance.insert(domain.to_string(), text.into());
        self
    }

    pub fn with_discussion_file(
        mut self,
        domain: &str,
        file_name: &str,
        text: impl Into<String>,
    ) -> Self {
        self.register_domain(domain);
        self.discussions
            .entry(domain.to_string())
            .or_default()
            .insert(file_name.to_string(), text.into());
        self
    }

    fn documents_for(
        map: &BTreeMap<String, BTreeMap<String, String>>,
        domain: &str,
        subdir: &str,
    ) -> Vec<RawDocument> {
        map.get(domain)
            .map(|files| {
                files
                    .iter()
                    .map(|(name, text)| {
                        RawDocument::new(
                            PathBuf::from(domain).join(subdir).join(name),
                            text.clone(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ContentRepository for MemoryRepository {
    fn list_domains(&self) -> GovernanceResult<Vec<String>> {
        Ok(self.domains.clone())
    }

    fn read_term_files(&self, domain: &str) -> GovernanceResult<Vec<RawDocument>> {
        Ok(Self::documents_for(&self.terms, domain, TERMS_DIR))
    }

    fn read_principle_files(&self, domain: &str) -> GovernanceResult<Vec<RawDocument>> {
        Ok(Self::documents_for(&self.principles, domain, PRINCIPLES_DIR))
    }

    fn read_inheritance_config(&self, domain: &str) -> GovernanceResult<RawDocument> {
        self.inheritance
            .get(domain)
            .map(|text| {
                RawDocument::new(PathBuf::from(domain).join(INHERITANCE_FILE), text.clone())
            })
            .ok_or_else(|| {
                GovernanceError::not_found(format!(
                    "{} for domain '{}'",
                    INHERITANCE_FILE, domain
                ))
            })
    }

    fn read_discussion_files(&self, domain: &str) -> GovernanceResult<Vec<RawDocument>> {
        Ok(Self::documents_for(&self.discussions, domain, DISCUSSIONS_DIR))
    }
}

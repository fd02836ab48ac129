//! Core domain models for governance documents and aggregation results
//!
//! Architecture: Rich Domain Models - Entities carry their ordering and lookup
//! behavior, not just data
//! - Principles know their category rank; discussions know their recency order
//! - GovernanceData acts as an aggregate root assembled once per load
//! - All structures are immutable after construction; nothing here touches I/O

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A versioned definition of a vocabulary word scoped to a domain.
///
/// Unique per `(domain, id, version)`; a new edit creates a new version rather
/// than mutating an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Identifier of the term within its domain (e.g. "harm")
    pub id: String,
    /// Domain the term belongs to (e.g. "animal-welfare")
    pub domain: String,
    /// Definition text
    pub definition: String,
    /// Version string (e.g. "1.2")
    pub version: String,
    /// Date the version was ratified, if recorded
    pub ratified: Option<NaiveDate>,
    /// Approval rate at ratification, as a percentage
    pub approval_rate: Option<f64>,
    /// Parent term this definition extends, if any
    pub extends: Option<TermRef>,
    /// Free-form note on how this term narrows its parent
    pub specificity: Option<String>,
}

/// Reference to a term in a (possibly different) domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub domain: String,
    pub id: String,
    /// Pinned version; `None` means "latest"
    pub version: Option<String>,
}

/// Category of a principle, ranked from most general to most specialized.
///
/// The ordering of the variants is the display rank used when listing a
/// domain's effective principles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipleCategory {
    /// Root-domain principle inherited by every domain
    Core,
    /// Domain-level principle that anchors the domain's own set
    DomainCore,
    /// Principle specific to one domain
    DomainSpecific,
    /// Domain refinement of an inherited principle
    DomainEnhanced,
}

impl PrincipleCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::DomainCore => "domain_core",
            Self::DomainSpecific => "domain_specific",
            Self::DomainEnhanced => "domain_enhanced",
        }
    }
}

/// A versioned governance rule statement scoped to a domain.
///
/// Versions form a singly linked chain via `previous_version`, most recent
/// first. A non-root version's `previous_version` must name an existing prior
/// version in the same domain; the loader quarantines documents that break
/// this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principle {
    pub principle_id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub category: PrincipleCategory,
    /// Owning domain; `None` for principles defined before domains existed
    pub domain: Option<String>,
    /// Previous version in the chain, if this is not the root version
    pub previous_version: Option<String>,
    /// Concrete requirements the principle imposes
    pub requirements: Vec<String>,
    /// Machine-checkable validation rules
    pub validation_rules: Vec<String>,
    /// How the principle applies when projected into other domains
    pub cross_domain_applications: BTreeMap<String, String>,
}

impl Principle {
    /// Canonical `id@version` form used in references and indexes.
    pub fn qualified_id(&self) -> String {
        format!("{}@{}", self.principle_id, self.version)
    }

    /// Stable ordering for display: category rank, then name.
    pub fn display_order(a: &Principle, b: &Principle) -> std::cmp::Ordering {
        a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name))
    }
}

/// Per-domain inheritance declaration.
///
/// The `extends` graph across all configured domains must be acyclic with
/// exactly one root (`extends: null`, conventionally "core-governance").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceConfig {
    pub domain: String,
    /// Parent domain, or `None` for the root domain
    pub extends: Option<String>,
    /// Capabilities this domain provides to children
    #[serde(default)]
    pub provides: Vec<String>,
    /// Free-form inheritance rules
    #[serde(default)]
    pub rules: Vec<String>,
}

impl InheritanceConfig {
    /// Standalone config for a domain with no inheritance declaration on disk.
    pub fn standalone(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            extends: None,
            provides: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.extends.is_none()
    }
}

impl Default for InheritanceConfig {
    fn default() -> Self {
        Self::standalone("")
    }
}

/// Lifecycle status of a discussion document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscussionStatus {
    Draft,
    Discussion,
    Voting,
    Approved,
    Rejected,
    Implemented,
}

impl DiscussionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Discussion => "discussion",
            Self::Voting => "voting",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Implemented => "implemented",
        }
    }

    /// Whether the discussion has reached a terminal outcome.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Implemented)
    }
}

impl Default for DiscussionStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// A community conversation record attached to a proposal, principle, or term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub title: String,
    pub status: DiscussionStatus,
    /// Proposal the discussion tracks (e.g. an issue slug), if any
    pub proposal: Option<String>,
    pub created: Option<NaiveDate>,
    pub author: String,
    pub summary: Option<String>,
    /// Markdown body without front matter
    pub content: String,
    /// Path of the source document, for attribution
    pub source_path: PathBuf,
    /// Principle/term ids referenced by this discussion. May name ids that do
    /// not resolve in the domain; unresolved ids stay here but are excluded
    /// from the discussions-by-principle index.
    pub references: Vec<String>,
}

impl Discussion {
    /// Ordering for an index bucket: newest created first, undated last,
    /// ties broken by title for stable output.
    pub fn recency_order(a: &Discussion, b: &Discussion) -> std::cmp::Ordering {
        match (a.created, b.created) {
            (Some(da), Some(db)) => db.cmp(&da),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.title.cmp(&b.title))
    }
}

/// Aggregate root for one domain: its inheritance declaration, effective
/// principles, and discussions. Constructed fresh on every load and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceOrganization {
    pub id: String,
    pub name: String,
    pub inheritance: InheritanceConfig,
    /// Merged term dictionary for the domain, keyed by term id
    pub terms: BTreeMap<String, Term>,
    pub principles: Vec<Principle>,
    pub discussions: Vec<Discussion>,
}

/// A unit the aggregation skipped, with the reason. Best-effort loads surface
/// these instead of failing the whole aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Omission {
    /// Domain the skipped unit belongs to
    pub domain: String,
    /// Source path of the skipped unit, when it was a single file
    pub source_path: Option<PathBuf>,
    /// Why the unit was skipped
    pub reason: String,
}

impl Omission {
    pub fn domain_level(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { domain: domain.into(), source_path: None, reason: reason.into() }
    }

    pub fn file_level(
        domain: impl Into<String>,
        source_path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            source_path: Some(source_path.into()),
            reason: reason.into(),
        }
    }
}

/// Complete aggregation output: the structure a single load call returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceData {
    /// Organizations in configured priority order, root domain first
    pub organizations: Vec<GovernanceOrganization>,
    /// Domain id -> effective principles, category rank then name
    pub principles_by_org: BTreeMap<String, Vec<Principle>>,
    /// Principle id -> referencing discussions, newest created first
    pub discussions_by_principle: BTreeMap<String, Vec<Discussion>>,
    /// Units skipped during the load, for caller-side logging
    pub omissions: Vec<Omission>,
}

impl GovernanceData {
    pub fn empty() -> Self {
        Self {
            organizations: Vec::new(),
            principles_by_org: BTreeMap::new(),
            discussions_by_principle: BTreeMap::new(),
            omissions: Vec::new(),
        }
    }

    pub fn organization(&self, domain: &str) -> Option<&GovernanceOrganization> {
        self.organizations.iter().find(|org| org.id == domain)
    }

    /// Total number of discussions across all organizations.
    pub fn discussion_count(&self) -> usize {
        self.organizations.iter().map(|org| org.discussions.len()).sum()
    }

    /// Total number of effective principles across all organizations.
    pub fn principle_count(&self) -> usize {
        self.organizations.iter().map(|org| org.principles.len()).sum()
    }
}

impl Default for GovernanceData {
    fn default() -> Self {
        Self::empty()
    }
}

/// Error types that can occur during governance loading
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    /// Domain or file absent - recoverable, yields an empty result for that unit
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Malformed document - recoverable, the unit is skipped and logged
    #[error("Parse error in {source_path}: {message}")]
    Parse { source_path: String, message: String },

    /// Inheritance chain revisits a domain - fatal for that domain's resolution
    #[error("Cyclic inheritance involving '{domain}': {chain}")]
    CyclicInheritance { domain: String, chain: String },

    /// Upstream collaborator fetch failed - that domain is omitted
    #[error("Upstream unavailable: {message}")]
    Upstream { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl GovernanceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn parse(source_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_path: source_path.into(),
            message: message.into(),
        }
    }

    pub fn cyclic(domain: impl Into<String>, chain: &[String]) -> Self {
        Self::CyclicInheritance {
            domain: domain.into(),
            chain: chain.join(" -> "),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Whether the aggregation may continue past this error by omitting the
    /// failed unit.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config { .. })
    }
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;

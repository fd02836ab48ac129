//! Discussion document parsing and principle indexing
//!
//! Architecture: Anti-Corruption Layer - Markdown-with-front-matter documents
//! become typed `Discussion` records before indexing
//! - Front matter is YAML between `---` fences; the body is plain Markdown
//! - Reference markers are wiki-style `[[id]]` or `[[id@version]]` links in
//!   the body, unioned with an optional `references` list in the front matter
//! - Unresolvable references stay on the record but are excluded from the
//!   discussions-by-principle index

use crate::domain::model::{Discussion, DiscussionStatus, GovernanceError, GovernanceResult};
use crate::repository::RawDocument;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

lazy_static! {
    /// `[[transparency]]`, `[[transparency@1.0]]`
    static ref REFERENCE_MARKER: Regex =
        Regex::new(r"\[\[([A-Za-z0-9][A-Za-z0-9._-]*(?:@[A-Za-z0-9.]+)?)\]\]").unwrap();
    /// First ATX heading, used as a title fallback
    static ref FIRST_HEADING: Regex = Regex::new(r"(?m)^#\s+(.+)$").unwrap();
}

const FRONT_MATTER_FENCE: &str = "---";

/// Front matter shape accepted on discussion documents. Everything is
/// optional; the parser supplies fallbacks rather than rejecting documents
/// written before the conventions settled.
#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    title: Option<String>,
    status: Option<DiscussionStatus>,
    author: Option<String>,
    created: Option<NaiveDate>,
    proposal: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    references: Vec<String>,
}

/// Parses discussion documents and builds the principle index.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscussionIndexer;

impl DiscussionIndexer {
    pub fn new() -> Self {
        Self
    }

    /// Parse one discussion document into a `Discussion` record.
    ///
    /// A document without front matter still parses: the title falls back to
    /// the first heading or the file stem, the status to `draft`, the author
    /// to "unknown". A document whose front matter exists but is not valid
    /// YAML fails with `Parse`; callers skip it and record the omission.
    pub fn parse(&self, document: &RawDocument) -> GovernanceResult<Discussion> {
        let (front_matter, body) = Self::split_front_matter(&document.text)?;

        // An empty block between the fences is as good as no front matter
        let front = match front_matter {
            Some(block) if !block.trim().is_empty() => {
                serde_yaml::from_str::<FrontMatter>(block).map_err(|e| {
                    GovernanceError::parse(document.path.display().to_string(), e.to_string())
                })?
            }
            _ => FrontMatter::default(),
        };

        let title = front
            .title
            .or_else(|| {
                FIRST_HEADING
                    .captures(body)
                    .map(|c| c[1].trim().to_string())
            })
            .or_else(|| {
                document
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "untitled".to_string());

        let mut references: BTreeSet<String> = front.references.into_iter().collect();
        for capture in REFERENCE_MARKER.captures_iter(body) {
            references.insert(capture[1].to_string());
        }

        Ok(Discussion {
            title,
            status: front.status.unwrap_or_default(),
            proposal: front.proposal,
            created: front.created,
            author: front.author.unwrap_or_else(|| "unknown".to_string()),
            summary: front.summary,
            content: body.trim_start_matches('\n').to_string(),
            source_path: document.path.clone(),
            references: references.into_iter().collect(),
        })
    }

    /// Group discussions under the principle ids they reference.
    ///
    /// Only references resolving to a known principle id are indexed; a
    /// versioned marker (`id@version`) resolves by its bare id. Buckets are
    /// ordered newest-created-first.
    pub fn index_by_principle(
        &self,
        discussions: &[Discussion],
        known_principles: &BTreeSet<String>,
    ) -> BTreeMap<String, Vec<Discussion>> {
        let mut index: BTreeMap<String, Vec<Discussion>> = BTreeMap::new();

        for discussion in discussions {
            let mut seen = BTreeSet::new();
            for reference in &discussion.references {
                let bare_id = reference.split('@').next().unwrap_or(reference);
                if !known_principles.contains(bare_id) {
                    // Unresolved references are kept on the record only
                    continue;
                }
                if seen.insert(bare_id.to_string()) {
                    index
                        .entry(bare_id.to_string())
                        .or_default()
                        .push(discussion.clone());
                }
            }
        }

        for bucket in index.values_mut() {
            bucket.sort_by(Discussion::recency_order);
        }
        index
    }

    /// Split a document into its front matter block and body.
    ///
    /// Front matter is present when the document starts with a `---` line and
    /// a matching closing fence exists; an opening fence without a closing
    /// one is a parse failure, not silently-body.
    fn split_front_matter(text: &str) -> GovernanceResult<(Option<&str>, &str)> {
        let trimmed = text.trim_start_matches('\u{feff}');
        let mut lines = trimmed.splitn(2, '\n');
        let first_line = lines.next().unwrap_or("").trim_end_matches('\r');

        if first_line.trim() != FRONT_MATTER_FENCE {
            return Ok((None, trimmed));
        }

        let rest = lines.next().unwrap_or("");

        // Find the closing fence on its own line
        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            let content = line.trim_end_matches('\n').trim_end_matches('\r');
            if content.trim() == FRONT_MATTER_FENCE {
                let body = &rest[offset + line.len()..];
                return Ok((Some(&rest[..offset]), body));
            }
            offset += line.len();
        }

        Err(GovernanceError::parse(
            "<front matter>",
            "unterminated front matter fence".to_string(),
        ))
    }
}

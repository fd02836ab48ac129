//! Report generation for aggregated governance data
//!
//! Architecture: Anti-Corruption Layer - Formatters translate domain objects
//! to external formats
//! - GovernanceData (domain) is converted to terminal or JSON representations
//! - Each formatter encapsulates the rules for its specific output format
//! - Domain structures stay pure while supporting multiple presentation needs

use crate::domain::model::{GovernanceData, GovernanceError, GovernanceResult};
use std::io::Write;

/// Supported output formats for governance reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with per-organization sections
    Human,
    /// JSON format for programmatic consumption
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json"]
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Whether to list each organization's terms
    pub show_terms: bool,
    /// Whether to list each organization's discussions
    pub show_discussions: bool,
    /// Whether to print the omissions section
    pub show_omissions: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_terms: false,
            show_discussions: true,
            show_omissions: true,
        }
    }
}

/// Formats aggregated governance data for output.
pub struct GovernanceReportFormatter {
    options: ReportOptions,
}

impl GovernanceReportFormatter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn format_report(
        &self,
        data: &GovernanceData,
        format: OutputFormat,
    ) -> GovernanceResult<String> {
        match format {
            OutputFormat::Human => Ok(self.format_human(data)),
            OutputFormat::Json => self.format_json(data),
        }
    }

    pub fn write_report<W: Write>(
        &self,
        data: &GovernanceData,
        format: OutputFormat,
        mut writer: W,
    ) -> GovernanceResult<()> {
        let formatted = self.format_report(data, format)?;
        writer
            .write_all(formatted.as_bytes())
            .map_err(|e| GovernanceError::Io { source: e })?;
        Ok(())
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.options.use_colors {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn format_human(&self, data: &GovernanceData) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} organization{}, {} principle{}, {} discussion{}\n\n",
            data.organizations.len(),
            plural(data.organizations.len()),
            data.principle_count(),
            plural(data.principle_count()),
            data.discussion_count(),
            plural(data.discussion_count()),
        ));

        for organization in &data.organizations {
            let header = format!("{} ({})", organization.name, organization.id);
            output.push_str(&self.paint("1;34", &header));
            output.push('\n');

            match &organization.inheritance.extends {
                Some(parent) => output.push_str(&format!("  extends: {parent}\n")),
                None => output.push_str("  extends: (root)\n"),
            }

            for principle in &organization.principles {
                output.push_str(&format!(
                    "  [{}] {} {}\n",
                    principle.category.as_str(),
                    self.paint("32", &principle.qualified_id()),
                    principle.name,
                ));
            }

            if self.options.show_terms && !organization.terms.is_empty() {
                output.push_str("  terms:\n");
                for term in organization.terms.values() {
                    output.push_str(&format!("    {}@{}\n", term.id, term.version));
                }
            }

            if self.options.show_discussions {
                for discussion in &organization.discussions {
                    let created = discussion
                        .created
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "undated".to_string());
                    output.push_str(&format!(
                        "  - {} [{}] by {} ({})\n",
                        discussion.title,
                        discussion.status.as_str(),
                        discussion.author,
                        created,
                    ));
                }
            }

            output.push('\n');
        }

        if self.options.show_omissions && !data.omissions.is_empty() {
            let header = format!("{} unit(s) omitted:", data.omissions.len());
            output.push_str(&self.paint("33", &header));
            output.push('\n');
            for omission in &data.omissions {
                match &omission.source_path {
                    Some(path) => output.push_str(&format!(
                        "  {}: {} ({})\n",
                        omission.domain,
                        omission.reason,
                        path.display()
                    )),
                    None => {
                        output.push_str(&format!("  {}: {}\n", omission.domain, omission.reason))
                    }
                }
            }
        }

        output
    }

    fn format_json(&self, data: &GovernanceData) -> GovernanceResult<String> {
        serde_json::to_string_pretty(data).map_err(|e| {
            GovernanceError::config(format!("Failed to serialize governance data: {e}"))
        })
    }
}

impl Default for GovernanceReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

//! DAHAO governance CLI - command-line interface for governance aggregation
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to aggregation operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Provides clean separation between user interface and aggregation logic

use clap::{Parser, Subcommand, ValueEnum};
use dahao_governance::{
    GovernanceConfig, GovernanceReportFormatter, GovernanceResult, GovernanceService,
    OutputFormat, ReportOptions,
};
use std::path::{Path, PathBuf};
use std::process;

/// DAHAO governance aggregation
#[derive(Parser)]
#[command(name = "dahao-gov")]
#[command(version = "0.1.0")]
#[command(about = "Aggregates versioned governance principles, terms, and discussions")]
#[command(
    long_about = "dahao-gov loads a governance document tree, resolves domain inheritance, and indexes discussions against the principles they reference. Designed for content-serving pipelines and CI checks over governance repositories."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the content root directory
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate all configured domains and print the result
    Load {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Include each organization's term dictionary
        #[arg(long)]
        show_terms: bool,

        /// Omit discussion listings
        #[arg(long)]
        no_discussions: bool,

        /// Exit non-zero if any domain or file was omitted
        #[arg(long)]
        strict: bool,
    },

    /// List configured domains and their resolution status
    Domains,

    /// Resolve one domain's effective principle set
    Resolve {
        /// Domain to resolve
        domain: String,

        /// Include shadowed (overridden) inherited principles
        #[arg(long)]
        show_shadowed: bool,
    },

    /// Show discussions indexed under a principle id
    Discussions {
        /// Principle id (bare, without version)
        principle_id: String,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = run_command(cli).await;

    match result {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run_command(cli: Cli) -> GovernanceResult<i32> {
    match cli.command {
        Commands::Load { format, show_terms, no_discussions, strict } => {
            run_load(
                cli.config,
                cli.root,
                format,
                show_terms,
                no_discussions,
                strict,
                !cli.no_color,
            )
            .await
        }
        Commands::Domains => run_domains(cli.config, cli.root).await,
        Commands::Resolve { domain, show_shadowed } => {
            run_resolve(cli.config, cli.root, domain, show_shadowed)
        }
        Commands::Discussions { principle_id } => {
            run_discussions(cli.config, cli.root, principle_id).await
        }
        Commands::ValidateConfig { config_file } => {
            run_validate_config(config_file.or(cli.config))
        }
    }
}

/// Load the effective configuration: explicit file, conventional file names,
/// or defaults, with an optional root override.
fn load_config(
    config_path: Option<PathBuf>,
    root: Option<PathBuf>,
) -> GovernanceResult<GovernanceConfig> {
    let config = if let Some(config_path) = config_path {
        GovernanceConfig::load_from_file(config_path)?
    } else {
        let default_configs = ["dahao.yaml", "dahao.yml", ".dahao.yaml"];
        let mut config = None;

        for config_name in &default_configs {
            if Path::new(config_name).exists() {
                config = Some(GovernanceConfig::load_from_file(config_name)?);
                break;
            }
        }

        config.unwrap_or_default()
    };

    Ok(match root {
        Some(root) => config.with_root(root),
        None => config,
    })
}

fn build_service(
    config_path: Option<PathBuf>,
    root: Option<PathBuf>,
) -> GovernanceResult<GovernanceService> {
    let config = load_config(config_path, root)?;
    Ok(GovernanceService::new_with_config(config))
}

async fn run_load(
    config_path: Option<PathBuf>,
    root: Option<PathBuf>,
    format: OutputFormatArg,
    show_terms: bool,
    no_discussions: bool,
    strict: bool,
    use_colors: bool,
) -> GovernanceResult<i32> {
    let options = ReportOptions {
        use_colors,
        show_terms,
        show_discussions: !no_discussions,
        ..Default::default()
    };

    let service = build_service(config_path, root)?
        .with_report_formatter(GovernanceReportFormatter::new(options));

    let data = service.load_governance_data().await?;

    let formatted = service.format_report(&data, format.into())?;
    println!("{formatted}");

    if strict && !data.omissions.is_empty() {
        Ok(1)
    } else {
        Ok(0)
    }
}

async fn run_domains(
    config_path: Option<PathBuf>,
    root: Option<PathBuf>,
) -> GovernanceResult<i32> {
    let service = build_service(config_path, root)?;
    let data = service.load_governance_data().await?;

    for entry in &service.config().domains {
        match data.organization(&entry.id) {
            Some(org) => {
                let parent = org
                    .inheritance
                    .extends
                    .as_deref()
                    .unwrap_or("(root)");
                println!(
                    "{:<24} extends {:<20} {} principles, {} discussions",
                    org.id,
                    parent,
                    org.principles.len(),
                    org.discussions.len()
                );
            }
            None => {
                let reason = data
                    .omissions
                    .iter()
                    .find(|o| o.domain == entry.id && o.source_path.is_none())
                    .map(|o| o.reason.as_str())
                    .unwrap_or("omitted");
                println!("{:<24} OMITTED: {}", entry.id, reason);
            }
        }
    }

    Ok(0)
}

fn run_resolve(
    config_path: Option<PathBuf>,
    root: Option<PathBuf>,
    domain: String,
    show_shadowed: bool,
) -> GovernanceResult<i32> {
    let service = build_service(config_path, root)?;
    let resolved = service.resolve_domain(&domain)?;

    match &resolved.inheritance.extends {
        Some(parent) => println!("{domain} extends {parent}"),
        None => println!("{domain} is a root domain"),
    }

    let mut principles: Vec<_> = resolved.effective.values().collect();
    principles.sort_by(|a, b| dahao_governance::Principle::display_order(a, b));
    for principle in principles {
        println!(
            "  [{}] {} {}",
            principle.category.as_str(),
            principle.qualified_id(),
            principle.name
        );
    }

    if show_shadowed && !resolved.shadowed.is_empty() {
        println!("shadowed by nearer domains:");
        for principle in &resolved.shadowed {
            println!("  {} {}", principle.qualified_id(), principle.name);
        }
    }

    for omission in &resolved.omissions {
        eprintln!("warning: {}: {}", omission.domain, omission.reason);
    }

    Ok(0)
}

async fn run_discussions(
    config_path: Option<PathBuf>,
    root: Option<PathBuf>,
    principle_id: String,
) -> GovernanceResult<i32> {
    let service = build_service(config_path, root)?;
    let data = service.load_governance_data().await?;

    match data.discussions_by_principle.get(&principle_id) {
        Some(discussions) => {
            for discussion in discussions {
                let created = discussion
                    .created
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "undated".to_string());
                println!(
                    "{} [{}] by {} ({}) - {}",
                    discussion.title,
                    discussion.status.as_str(),
                    discussion.author,
                    created,
                    discussion.source_path.display()
                );
            }
            Ok(0)
        }
        None => {
            println!("No discussions reference '{principle_id}'");
            Ok(0)
        }
    }
}

fn run_validate_config(config_path: Option<PathBuf>) -> GovernanceResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("dahao.yaml"));

    println!("Validating configuration: {}", config_path.display());

    match GovernanceConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("Configuration is valid");
            println!("  Content root: {}", config.content.root.display());
            println!("  Domains: {}", config.domains.len());
            for entry in &config.domains {
                println!("    {} ({})", entry.id, entry.display_name());
            }
            Ok(0)
        }
        Err(e) => {
            eprintln!("Configuration is invalid: {e}");
            Ok(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_defaults_when_nothing_found() {
        let config = load_config(None, None).unwrap();
        assert!(!config.domains.is_empty());
    }

    #[test]
    fn test_root_override_applies() {
        let config = load_config(None, Some(PathBuf::from("/tmp/gov"))).unwrap();
        assert_eq!(config.content.root, PathBuf::from("/tmp/gov"));
    }

    #[test]
    fn test_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dahao.yaml");
        fs::write(
            &path,
            concat!(
                "version: \"1.0\"\n",
                "content:\n",
                "  root: ./governance\n",
                "domains:\n",
                "  - id: core-governance\n",
            ),
        )
        .unwrap();

        let config = load_config(Some(path), None).unwrap();
        assert_eq!(config.domain_ids(), ["core-governance"]);
    }

    #[test]
    fn test_invalid_config_file_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dahao.yaml");
        fs::write(&path, "version: \"2.0\"\ncontent:\n  root: .\ndomains: []\n").unwrap();

        assert!(load_config(Some(path), None).is_err());
    }

    #[test]
    fn test_output_format_conversion() {
        assert_eq!(OutputFormat::from(OutputFormatArg::Human), OutputFormat::Human);
        assert_eq!(OutputFormat::from(OutputFormatArg::Json), OutputFormat::Json);
    }
}

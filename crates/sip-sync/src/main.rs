//! CLI for mirroring SIP proposal state into the documentation website
//!
//! Run `sip-sync --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use proposals::{
    catalog, classify, classify_detailed, proposal_file_name, render_document, Classification,
    Frontmatter,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sip_sync::{GitCli, GitHubClient, GitHubToken, RepoRef, SyncConfig, SyncDriver, SyncReport};

#[derive(Parser)]
#[command(name = "sip-sync")]
#[command(about = "Mirror SIP proposal state into the documentation website")]
#[command(version)]
struct Cli {
    /// Output format: json, text
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Log format: json, text
    #[arg(long, global = true, default_value = "text")]
    log_format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the website's proposal directory and push the result
    Sync(SyncArgs),

    /// Classify a set of labels
    Classify {
        /// Label on the proposal (repeatable)
        #[arg(short, long = "label", required = true)]
        labels: Vec<String>,
    },

    /// Render the document a proposal would get
    Render {
        /// Pull request title
        #[arg(short, long)]
        title: String,

        /// Pull request number
        #[arg(short, long)]
        number: u64,

        /// Label on the proposal (repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,
    },

    /// List every valid proposal state and its labels
    Catalog,
}

#[derive(Args)]
struct SyncArgs {
    /// YAML config file; flags below override its values
    #[arg(short, long, env = "SIP_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// GitHub token used for the API and for cloning/pushing
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Proposals repository (owner/repo[@branch])
    #[arg(long)]
    proposals_repo: Option<RepoRef>,

    /// Website repository (owner/repo[@branch])
    #[arg(long)]
    website_repo: Option<RepoRef>,

    /// Merged proposals directory inside the proposals repository
    #[arg(long)]
    content_dir: Option<PathBuf>,

    /// Generated directory inside the website repository
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// Git host used for clone URLs
    #[arg(long)]
    git_host: Option<String>,

    /// Commit message for the website change
    #[arg(long)]
    commit_message: Option<String>,

    /// Commit locally but do not push
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("sip_sync=debug,proposals=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sip_sync=info,warn"))
    };

    match cli.log_format {
        OutputFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        OutputFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    match cli.command {
        Commands::Sync(args) => run_sync(args, cli.format).await,
        Commands::Classify { labels } => run_classify(&labels, cli.format),
        Commands::Render {
            title,
            number,
            labels,
        } => run_render(&title, number, &labels, cli.format),
        Commands::Catalog => run_catalog(cli.format),
    }
}

fn build_config(args: SyncArgs) -> Result<SyncConfig> {
    let mut config = match &args.config {
        Some(path) => SyncConfig::from_file(path)?,
        None => SyncConfig::default(),
    };

    if let Some(repo) = args.proposals_repo {
        config.proposals_repo = repo;
    }
    if let Some(repo) = args.website_repo {
        config.website_repo = repo;
    }
    if let Some(dir) = args.content_dir {
        config.content_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if let Some(host) = args.git_host {
        config.git_host = host;
    }
    if let Some(message) = args.commit_message {
        config.commit_message = message;
    }
    config.dry_run |= args.dry_run;
    config.github_token = GitHubToken::new(args.github_token.unwrap_or_default());

    config.validate()?;
    Ok(config)
}

async fn run_sync(args: SyncArgs, format: OutputFormat) -> Result<()> {
    let config = build_config(args).context("Invalid sync configuration")?;

    let github = GitHubClient::new(&config.github_token, config.api_url.as_str())
        .context("Failed to create GitHub client")?;
    let git = GitCli::new(
        config.git_host.as_str(),
        config.github_token.clone(),
        config.author_name.as_str(),
        config.author_email.as_str(),
    );

    let driver = SyncDriver::new(config, Arc::new(github), Arc::new(git));
    let report = driver.run().await.context("Sync failed")?;

    print_report(&report, format)
}

fn print_report(report: &SyncReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            println!("Copied {} merged proposal(s)", report.copied.len());
            println!("Rendered {} pull request(s)", report.rendered.len());
            for rendered in &report.rendered {
                println!(
                    "  #{} {} ({})",
                    rendered.number, rendered.file_name, rendered.state
                );
            }
            if !report.skipped.is_empty() {
                println!("Skipped {} unclassifiable pull request(s)", report.skipped.len());
                for skipped in &report.skipped {
                    println!(
                        "  #{} {} [{}]",
                        skipped.number,
                        skipped.title,
                        skipped.labels.join(", ")
                    );
                }
            }
            match (report.committed, report.pushed) {
                (false, _) => println!("No changes"),
                (true, false) => println!("Committed (not pushed)"),
                (true, true) => println!("Committed and pushed"),
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ClassifyOutput {
    state: Option<String>,
    candidates: Vec<String>,
}

fn run_classify(labels: &[String], format: OutputFormat) -> Result<()> {
    let classification = classify_detailed(labels);
    let candidates: Vec<String> = match &classification {
        Classification::Ambiguous { candidates, .. } => {
            candidates.iter().map(ToString::to_string).collect()
        }
        _ => Vec::new(),
    };
    let output = ClassifyOutput {
        state: classification.state().map(|s| s.to_string()),
        candidates,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => match &output.state {
            None => println!("unclassifiable"),
            Some(state) if output.candidates.is_empty() => println!("{state}"),
            Some(state) => println!(
                "{state} (ambiguous: {})",
                output.candidates.join(", ")
            ),
        },
    }
    Ok(())
}

#[derive(Serialize)]
struct RenderOutput {
    file_name: String,
    document: String,
}

fn run_render(title: &str, number: u64, labels: &[String], format: OutputFormat) -> Result<()> {
    let Some(state) = classify(labels) else {
        anyhow::bail!("Labels [{}] do not encode a valid proposal state", labels.join(", "));
    };

    let output = RenderOutput {
        file_name: proposal_file_name(title, number),
        document: render_document(&Frontmatter::new(title, number, &state))?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => {
            println!("# {}", output.file_name);
            print!("{}", output.document);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct CatalogEntry {
    state: String,
    labels: Vec<String>,
}

fn run_catalog(format: OutputFormat) -> Result<()> {
    let entries: Vec<CatalogEntry> = catalog()
        .iter()
        .map(|state| CatalogEntry {
            state: state.to_string(),
            labels: state.encoded_labels(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for entry in entries {
                println!("{:<40} {}", entry.state, entry.labels.join(" "));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> SyncArgs {
        let mut argv = vec!["sip-sync", "sync"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Sync(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_build_config_applies_flags() {
        let config = build_config(args(&[
            "--github-token",
            "t0ken",
            "--website-repo",
            "me/site@gh-pages",
            "--output-dir",
            "sips",
            "--dry-run",
        ]))
        .unwrap();

        assert_eq!(config.website_repo, RepoRef::new("me", "site", "gh-pages"));
        assert_eq!(config.output_dir, PathBuf::from("sips"));
        assert!(config.dry_run);
        assert_eq!(config.github_token.expose(), "t0ken");
        assert_eq!(config.proposals_repo.slug(), "scala/improvement-proposals");
    }

    #[test]
    fn test_build_config_reads_file_then_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sync.yaml");
        std::fs::write(&path, "outputDir: from-file\ncommitMessage: from file\n").unwrap();

        let config = build_config(args(&[
            "--config",
            path.to_str().unwrap(),
            "--github-token",
            "t",
            "--commit-message",
            "from flag",
        ]))
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("from-file"));
        assert_eq!(config.commit_message, "from flag");
    }

    #[test]
    fn test_build_config_rejects_bad_repo_flag() {
        let result = Cli::try_parse_from(["sip-sync", "sync", "--website-repo", "not-a-repo"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_label_for_classify() {
        assert!(Cli::try_parse_from(["sip-sync", "classify"]).is_err());
        assert!(Cli::try_parse_from(["sip-sync", "classify", "-l", "status:rejected"]).is_ok());
    }

    #[test]
    fn test_render_unclassifiable_is_error() {
        let labels = vec!["status:vote-requested".to_string(), "stage:implementation".to_string()];
        assert!(run_render("x", 1, &labels, OutputFormat::Text).is_err());
    }
}

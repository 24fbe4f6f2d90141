// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Sky Scraper: Local Validation & Labeling
//!
//! Command-line entry point: serve the review UI, unpack input data and
//! inspect or export collected feedback.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use skyscraper::archive::{extract_archive, list_batches};
use skyscraper::articles::ArticleStore;
use skyscraper::config::AppConfig;
use skyscraper::feedback::{FeedbackStore, COLUMNS};
use skyscraper::web::{start_server, AppState};
use skyscraper::{LabelError, Result};

/// Sky Scraper CLI - human validation of satellite change events
#[derive(Parser, Debug)]
#[command(name = "skyscraper")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Local validation and labeling tool for satellite change events", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Batch to work on (overrides config `date`)
    #[arg(short, long, global = true)]
    date: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the validation UI
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },

    /// Unzip a supplied data archive into the data folder
    Extract {
        /// ZIP archive to unpack
        archive: PathBuf,

        /// Destination (default: config `data_dir`)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Show review progress for the batch
    Status,

    /// Print collected feedback
    Export {
        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Create data and feedback folders with a default configuration
    Init {
        /// Directory to initialize (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(date) = cli.date {
        config.date = date;
    }

    match cli.command {
        Some(Commands::Serve { host, port, open }) => run_serve(config, host, port, open).await,
        Some(Commands::Extract { archive, data_dir }) => run_extract(config, archive, data_dir),
        Some(Commands::Status) => run_status(config),
        Some(Commands::Export { format }) => run_export(config, format),
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        Some(Commands::Init { dir, force }) => run_init(dir, force),
        // Default: serve the UI
        None => run_serve(config, None, None, false).await,
    }
}

/// Run the review UI until interrupted
async fn run_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    open: bool,
) -> Result<()> {
    // Apply CLI overrides
    if let Some(host) = host {
        config.web.host = host;
    }
    if let Some(port) = port {
        config.web.port = port;
    }
    config.validate()?;

    let validation_dir = config.validation_dir();
    if !validation_dir.exists() {
        warn!(
            "Data folder {:?} does not exist; unzip the data archive first (skyscraper extract <zip>)",
            validation_dir
        );
    }

    let articles = ArticleStore::load(&validation_dir)?;
    if articles.is_empty() {
        warn!("No articles with metadata.json found in {:?}", validation_dir);
    }

    let feedback_file = config.feedback_file();
    if let Some(parent) = feedback_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!("Batch {}: feedback goes to {:?}", config.date, feedback_file);

    let url = format!("http://{}:{}", config.web.host, config.web.port);
    let state = AppState::new(config, articles, FeedbackStore::new(feedback_file))?;

    if open {
        if let Err(e) = open_browser(&url) {
            error!("Failed to open browser: {}", e);
        }
    }

    start_server(state).await
}

fn run_extract(config: AppConfig, archive: PathBuf, data_dir: Option<PathBuf>) -> Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| PathBuf::from(&config.data_dir));
    let summary = extract_archive(&archive, &data_dir)?;

    println!("Extracted {} files into {:?}", summary.files, data_dir);
    if summary.skipped > 0 {
        println!("Skipped {} entries", summary.skipped);
    }
    println!("Batches available: {}", summary.batches.join(", "));
    if !summary.batches.contains(&config.date) {
        println!("Note: configured date {} is not among them", config.date);
    }
    Ok(())
}

fn run_status(config: AppConfig) -> Result<()> {
    config.validate()?;
    let articles = ArticleStore::load(&config.validation_dir())?;
    let store = FeedbackStore::new(config.feedback_file());
    let table = store.load()?;
    let progress = store.progress(articles.len())?;

    println!("Batch:     {}", config.date);
    println!("Data:      {:?}", config.validation_dir());
    println!("Feedback:  {:?}", config.feedback_file());
    println!("Progress:  {} of {} articles fully reviewed", progress.reviewed, progress.total);
    for (verdict, count) in table.verdict_counts() {
        println!("  {:<8} {}", verdict, count);
    }

    let unknown: Vec<&str> = table.records.iter()
        .map(|r| r.article_id.as_str())
        .filter(|id| articles.find(id).is_none())
        .collect();
    if !unknown.is_empty() {
        println!("Feedback for articles not in this batch: {}", unknown.join(", "));
    }

    let other_batches = list_batches(Path::new(&config.data_dir))?;
    if other_batches.len() > 1 {
        println!("Other batches: {}", other_batches.iter()
            .filter(|b| **b != config.date)
            .cloned()
            .collect::<Vec<_>>()
            .join(", "));
    }
    Ok(())
}

fn run_export(config: AppConfig, format: ExportFormat) -> Result<()> {
    config.validate()?;
    let table = FeedbackStore::new(config.feedback_file()).load()?;

    match format {
        ExportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&table.records)?);
        }
        ExportFormat::Csv => {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(std::io::stdout());
            writer.write_record(COLUMNS)?;
            for record in &table.records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated default configuration at {:?}", output);
        }
        ConfigCommands::Validate => {
            if !config_path.exists() {
                return Err(LabelError::Config(format!("Config file not found: {:?}", config_path)));
            }
            config.validate()?;
            println!("Configuration is valid: {:?}", config_path);
        }
    }
    Ok(())
}

fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(LabelError::Config(format!(
            "{:?} already exists (use --force to overwrite)",
            config_path
        )));
    }

    let config = AppConfig::default();
    std::fs::create_dir_all(target.join(&config.data_dir))?;
    std::fs::create_dir_all(target.join(&config.feedback_dir))?;
    config.save(&config_path)?;

    println!("Initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - config.json");
    println!("  - {}/", config.data_dir);
    println!("  - {}/", config.feedback_dir);
    println!("\nNext steps:");
    println!("  1. Unpack the data: skyscraper extract <archive.zip>");
    println!("  2. Set \"date\" in config.json to the batch to review");
    println!("  3. Start the UI: skyscraper serve --open");

    Ok(())
}

fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["skyscraper"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("config.json"));
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::try_parse_from([
            "skyscraper", "serve", "--port", "9000", "--open", "--date", "202302"
        ]).unwrap();

        assert_eq!(cli.date.as_deref(), Some("202302"));
        match cli.command {
            Some(Commands::Serve { port, open, host }) => {
                assert_eq!(port, Some(9000));
                assert!(open);
                assert!(host.is_none());
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_extract_command() {
        let cli = Cli::try_parse_from([
            "skyscraper", "extract", "/tmp/batch.zip", "--data-dir", "/tmp/data"
        ]).unwrap();

        match cli.command {
            Some(Commands::Extract { archive, data_dir }) => {
                assert_eq!(archive, PathBuf::from("/tmp/batch.zip"));
                assert_eq!(data_dir, Some(PathBuf::from("/tmp/data")));
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_cli_export_format() {
        let cli = Cli::try_parse_from(["skyscraper", "export", "--format", "json"]).unwrap();
        match cli.command {
            Some(Commands::Export { format }) => assert_eq!(format, ExportFormat::Json),
            _ => panic!("Expected Export command"),
        }
        assert!(Cli::try_parse_from(["skyscraper", "export", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        run_init(Some(dir.path().to_path_buf()), false).unwrap();
        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("feedback").is_dir());
        assert!(run_init(Some(dir.path().to_path_buf()), false).is_err());
        assert!(run_init(Some(dir.path().to_path_buf()), true).is_ok());
    }
}

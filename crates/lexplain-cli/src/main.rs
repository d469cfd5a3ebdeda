mod display;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;

use lexplain_core::{DetailLevel, Document, EngineConfig, TransparencyConfig};
use lexplain_engine::Engine;
use lexplain_sync::ConnectivityMonitor;

#[derive(Parser)]
#[command(name = "lexplain", version, about = "Clause-level risk analysis for legal documents")]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(long, env = "LEXPLAIN_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse a plain-text document and print the clause risk report.
    Analyze {
        /// Path to the extracted document text.
        path: PathBuf,

        /// BCP-47 language tag of the document.
        #[arg(long, default_value = "en")]
        language: String,

        /// Explanation detail level.
        #[arg(long, value_enum, default_value_t = LevelArg::Medium)]
        detail: LevelArg,

        /// Hide confidence scores.
        #[arg(long)]
        no_confidence: bool,

        /// Hide source citations.
        #[arg(long)]
        no_citations: bool,
    },

    /// Probe the configured endpoints and print connectivity status.
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LevelArg {
    VerySimple,
    Simple,
    Medium,
    Detailed,
    LegalDetailed,
}

impl From<LevelArg> for DetailLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::VerySimple => DetailLevel::VerySimple,
            LevelArg::Simple => DetailLevel::Simple,
            LevelArg::Medium => DetailLevel::Medium,
            LevelArg::Detailed => DetailLevel::Detailed,
            LevelArg::LegalDetailed => DetailLevel::LegalDetailed,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("lexplain v{}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Analyze {
            path,
            language,
            detail,
            no_confidence,
            no_citations,
        } => {
            let prefs = TransparencyConfig {
                detail_level: detail.into(),
                show_confidence: !no_confidence,
                show_citations: !no_citations,
            };
            run_analyze(config, &path, language, prefs).await
        }
        Command::Status => run_status(config).await,
    }
}

async fn run_analyze(
    config: EngineConfig,
    path: &PathBuf,
    language: String,
    prefs: TransparencyConfig,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading document from {}", path.display()))?;
    let document = Document::new(text, language);

    // One-shot probe: a single check decides online/offline for this run.
    let monitor = ConnectivityMonitor::new(config.probe.clone()).context("building prober")?;
    let status = monitor.check(None).await;
    let (_status_tx, status_rx) = watch::channel(status.clone());

    let engine = Engine::new(config, status_rx).context("starting engine")?;
    let assessment = engine.analyze(&document, &prefs).await?;

    display::print_assessment(&assessment, &status);
    Ok(())
}

async fn run_status(config: EngineConfig) -> anyhow::Result<()> {
    let monitor = ConnectivityMonitor::new(config.probe.clone()).context("building prober")?;
    let status = monitor.check(None).await;
    display::print_status(&status);
    Ok(())
}

mod research_cmds;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ideascope_config::AppConfig;

const DEFAULT_CONFIG_PATH: &str = "config/ideascope.toml";

#[derive(Debug, Parser)]
#[command(
    name = "ideascope",
    version,
    about = "Research a topic on the web, summarise it, and ask Gemini for trends & insights"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one research pass and print the report.
    Run {
        /// Topic to explore.
        #[arg(value_name = "TOPIC")]
        topic: Option<String>,
        /// Use one of the sample topics instead (see `ideascope topics`).
        #[arg(long, value_name = "N", conflicts_with = "topic")]
        quick: Option<usize>,
        /// Result pages to scrape (1-5).  Defaults to `search.default_depth`.
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(1..=5))]
        depth: Option<u8>,
        /// Write the Markdown report.  Without a path the file lands in
        /// `report.export_dir` as `report_<topic>.md`.
        #[arg(long, value_name = "PATH", num_args = 0..=1)]
        export: Option<Option<PathBuf>>,
        /// Print the full outcome as JSON instead of the terminal view.
        #[arg(long)]
        json: bool,
    },
    /// Show configuration and whether Gemini predictions are enabled.
    Status,
    /// Write a config file with every default filled in.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// List the sample topics usable with `run --quick`.
    Topics,
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)?;
    init_tracing(&config);

    match cli.command {
        Commands::Run {
            topic,
            quick,
            depth,
            export,
            json,
        } => {
            let topic = research_cmds::resolve_topic(topic, quick)?;
            let depth = depth.map(usize::from).unwrap_or(config.search.default_depth);
            let options = research_cmds::RunOptions { depth, export, json };
            research_cmds::run_research(&config, &topic, options).await?;
        }
        Commands::Status => research_cmds::run_status(&config, &cli.config)?,
        Commands::Init { force } => research_cmds::run_init(&cli.config, force)?,
        Commands::Topics => research_cmds::run_topics(),
    }

    Ok(())
}

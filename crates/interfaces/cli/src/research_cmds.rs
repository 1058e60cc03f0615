use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::info;

use ideascope_config::AppConfig;
use ideascope_llm::{GeminiClient, InsightGenerator};
use ideascope_research::{ResearchOutcome, Researcher, SnippetTable};

pub(crate) const QUICK_TOPICS: &[&str] = &[
    "AI agents for education and personalised learning",
    "Autonomous AI agents in software development",
    "AI agents for environmental monitoring",
];

pub(crate) struct RunOptions {
    pub depth: usize,
    pub export: Option<Option<PathBuf>>,
    pub json: bool,
}

/// Pick the explicit topic, or the 1-based `quick` sample.  With neither,
/// the empty topic is passed on and rejected by the pipeline.
pub(crate) fn resolve_topic(topic: Option<String>, quick: Option<usize>) -> Result<String> {
    match (topic, quick) {
        (Some(topic), _) => Ok(topic),
        (None, Some(n)) => match n.checked_sub(1).and_then(|i| QUICK_TOPICS.get(i)) {
            Some(topic) => Ok(topic.to_string()),
            None => bail!("no sample topic #{n}; run `ideascope topics` to list them"),
        },
        (None, None) => Ok(String::new()),
    }
}

pub(crate) async fn run_research(config: &AppConfig, topic: &str, options: RunOptions) -> Result<()> {
    let insights: Arc<dyn InsightGenerator> = Arc::new(GeminiClient::new(&config.llm)?);
    let researcher = Researcher::from_config(config, insights)?;

    let outcome = researcher.run(topic, options.depth).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome, config.report.preview_snippets);
    }

    if let Some(path) = options.export {
        let path = path.unwrap_or_else(|| Path::new(&config.report.export_dir).join(&outcome.filename));
        export_report(&outcome, &path)?;
        // Keep stdout parseable in JSON mode.
        if options.json {
            info!(path = %path.display(), "report written");
        } else {
            println!("report written to {}", path.display());
        }
    }

    Ok(())
}

pub(crate) fn export_report(outcome: &ResearchOutcome, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, &outcome.document)?;
    Ok(())
}

fn print_outcome(outcome: &ResearchOutcome, preview: usize) {
    println!("Fetched {} snippets from the web.", outcome.snippets.len());
    println!();

    println!("── Summary of what the web says ─────────────────────────────");
    println!("{}", outcome.summary);
    println!();

    println!("── Predictions & insights (Gemini) ──────────────────────────");
    println!("{}", outcome.insight);
    println!();

    println!("── Snippet samples ──────────────────────────────────────────");
    for s in outcome.snippets.iter().take(preview) {
        println!("  {}", s.title);
        println!("      {}", s.snippet);
    }
    println!();

    println!("── All snippets ─────────────────────────────────────────────");
    print!("{}", SnippetTable::from_snippets(&outcome.snippets));
}

pub(crate) fn run_status(config: &AppConfig, config_path: &Path) -> Result<()> {
    let gemini = GeminiClient::new(&config.llm)?;

    println!("ideascope status");
    println!(
        "- config file: {}{}",
        config_path.display(),
        if config_path.exists() { "" } else { " (not found, using defaults)" }
    );
    println!("- search endpoint: {}", config.search.endpoint);
    println!("- user agent: {}", config.search.user_agent);
    println!("- default depth: {}", config.search.default_depth);
    println!("- export dir: {}", config.report.export_dir);
    if gemini.enabled() {
        println!("- gemini: enabled (model {})", gemini.model());
    } else {
        println!("- gemini: disabled (set GEMINI_API_KEY to enable predictions)");
    }
    Ok(())
}

/// Write the default config to `path`.  Defaults are written rather than
/// the loaded config so an API key taken from the environment never lands
/// on disk.
pub(crate) fn run_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    AppConfig::default().save_to(path)?;
    println!("wrote default configuration to {}", path.display());
    Ok(())
}

pub(crate) fn run_topics() {
    println!("── sample topics ────────────────────────────────────────────");
    for (i, topic) in QUICK_TOPICS.iter().enumerate() {
        println!("  {}. {topic}", i + 1);
    }
}

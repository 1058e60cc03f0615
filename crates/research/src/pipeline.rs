//! One research run: validate, fetch, summarize, ask for insights, report.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use ideascope_config::AppConfig;
use ideascope_llm::{DISABLED_INSIGHT, InsightGenerator, insight_prompt};

use crate::report::{TOP_SNIPPET_LIMIT, build_report, export_filename};
use crate::source::SnippetSource;
use crate::summarize::{DEFAULT_MAX_SENTENCES, snippet_corpus, summarize};
use crate::Snippet;

/// Deepest page count a run may request.
pub const MAX_DEPTH: usize = 5;

/// The only failures a caller sees; everything else degrades to
/// placeholder content.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResearchError {
    #[error("please enter a topic first")]
    EmptyTopic,
    #[error("depth must be between 1 and {max}, got {depth}")]
    DepthOutOfRange { depth: usize, max: usize },
    #[error("no snippets found; try a different topic or reduce depth")]
    NoSnippets,
}

/// Everything a presentation layer needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutcome {
    pub topic: String,
    pub snippets: Vec<Snippet>,
    pub summary: String,
    pub insight: String,
    pub insight_enabled: bool,
    /// Markdown report embedding the top slice of `snippets`.
    pub document: String,
    pub filename: String,
}

pub struct Researcher {
    source: SnippetSource,
    insights: Arc<dyn InsightGenerator>,
    summary_sentences: usize,
    top_snippets: usize,
}

impl Researcher {
    pub fn new(source: SnippetSource, insights: Arc<dyn InsightGenerator>) -> Self {
        Self {
            source,
            insights,
            summary_sentences: DEFAULT_MAX_SENTENCES,
            top_snippets: TOP_SNIPPET_LIMIT,
        }
    }

    /// Wire an HTTP snippet source and apply the `[report]` limits.
    pub fn from_config(config: &AppConfig, insights: Arc<dyn InsightGenerator>) -> anyhow::Result<Self> {
        let source = SnippetSource::from_config(&config.search)?;
        Ok(Self::new(source, insights)
            .with_summary_sentences(config.report.summary_sentences)
            .with_top_snippets(config.report.top_snippets))
    }

    pub fn with_summary_sentences(mut self, sentences: usize) -> Self {
        self.summary_sentences = sentences.max(1);
        self
    }

    pub fn with_top_snippets(mut self, limit: usize) -> Self {
        self.top_snippets = limit;
        self
    }

    pub async fn run(&self, topic: &str, depth: usize) -> Result<ResearchOutcome, ResearchError> {
        let topic = validate_topic(topic)?;
        validate_depth(depth)?;

        info!(topic, depth, "starting research run");
        let snippets = self.source.fetch(topic, depth).await;
        if snippets.is_empty() {
            return Err(ResearchError::NoSnippets);
        }

        let summary = summarize(&snippet_corpus(&snippets), self.summary_sentences);
        debug!(summary_chars = summary.len(), "summarized snippets");

        let insight_enabled = self.insights.enabled();
        let insight = if insight_enabled {
            self.insights.generate(&insight_prompt(&summary)).await
        } else {
            DISABLED_INSIGHT.to_string()
        };

        let top = &snippets[..snippets.len().min(self.top_snippets)];
        let document = build_report(topic, &summary, &insight, top);

        Ok(ResearchOutcome {
            topic: topic.to_string(),
            filename: export_filename(topic),
            snippets,
            summary,
            insight,
            insight_enabled,
            document,
        })
    }
}

/// Trimmed topic, or [`ResearchError::EmptyTopic`] when nothing is left.
pub fn validate_topic(topic: &str) -> Result<&str, ResearchError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ResearchError::EmptyTopic);
    }
    Ok(topic)
}

pub fn validate_depth(depth: usize) -> Result<(), ResearchError> {
    if !(1..=MAX_DEPTH).contains(&depth) {
        return Err(ResearchError::DepthOutOfRange { depth, max: MAX_DEPTH });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::source::tests::{StubBackend, StubPage};
    use crate::source::fallback_snippets;

    /// Records prompts and answers with a canned reply.
    struct StubInsights {
        enabled: bool,
        prompts: Mutex<Vec<String>>,
    }

    impl StubInsights {
        fn new(enabled: bool) -> Arc<Self> {
            Arc::new(Self {
                enabled,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InsightGenerator for StubInsights {
        fn enabled(&self) -> bool {
            self.enabled
        }

        async fn generate(&self, prompt: &str) -> String {
            self.prompts.lock().unwrap().push(prompt.to_string());
            "1) Trend. 2) Insight.".to_string()
        }
    }

    fn researcher(backend: Arc<StubBackend>, insights: Arc<StubInsights>) -> Researcher {
        Researcher::new(SnippetSource::new(backend), insights)
    }

    #[tokio::test]
    async fn whitespace_topic_is_rejected_before_fetch() {
        let backend = Arc::new(StubBackend::with_results(&[&[("t", Some("b"))]]));
        let insights = StubInsights::new(true);
        let r = researcher(backend.clone(), insights.clone());

        assert_eq!(r.run("   \t", 2).await.unwrap_err(), ResearchError::EmptyTopic);
        assert_eq!(r.run("", 2).await.unwrap_err(), ResearchError::EmptyTopic);
        assert_eq!(backend.calls(), 0);
        assert!(insights.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn depth_outside_range_is_rejected_before_fetch() {
        let backend = Arc::new(StubBackend::with_results(&[]));
        let r = researcher(backend.clone(), StubInsights::new(false));

        assert_eq!(
            r.run("topic", 0).await.unwrap_err(),
            ResearchError::DepthOutOfRange { depth: 0, max: 5 }
        );
        assert!(r.run("topic", 6).await.is_err());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn offline_run_still_produces_a_report() {
        let backend = Arc::new(StubBackend::new(vec![StubPage::Fail]));
        let r = researcher(backend, StubInsights::new(false));

        let outcome = r.run("  edge AI  ", 2).await.unwrap();
        assert_eq!(outcome.topic, "edge AI");
        assert_eq!(outcome.snippets, fallback_snippets("edge AI"));
        assert!(!outcome.summary.is_empty());
        assert!(!outcome.insight_enabled);
        assert_eq!(outcome.insight, DISABLED_INSIGHT);
        assert!(outcome.document.contains("# Research report — edge AI"));
        assert!(outcome.document.contains("Overview of edge AI: "));
        assert_eq!(outcome.filename, "report_edge_AI.md");
    }

    #[tokio::test]
    async fn enabled_insights_receive_the_summary() {
        let backend = Arc::new(StubBackend::with_results(&[&[
            ("A", Some("Alpha is first. Alpha again.")),
            ("B", Some("Beta follows.")),
        ]]));
        let insights = StubInsights::new(true);
        let r = researcher(backend, insights.clone());

        let outcome = r.run("greek letters", 1).await.unwrap();
        assert_eq!(outcome.summary, "Alpha is first. Alpha again. Beta follows.");
        assert!(outcome.insight_enabled);
        assert_eq!(outcome.insight, "1) Trend. 2) Insight.");

        let prompts = insights.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with(&outcome.summary));
        assert!(outcome.document.contains("1) Trend. 2) Insight."));
    }

    #[tokio::test]
    async fn document_embeds_only_the_top_slice() {
        let titles: Vec<String> = (0..12).map(|i| format!("R{i:02}")).collect();
        let results: Vec<(&str, Option<&str>)> =
            titles.iter().map(|t| (t.as_str(), Some("Body."))).collect();
        let backend = Arc::new(StubBackend::with_results(&[results.as_slice()]));
        let r = researcher(backend, StubInsights::new(false)).with_top_snippets(10);

        let outcome = r.run("paging", 1).await.unwrap();
        assert_eq!(outcome.snippets.len(), 12);
        assert!(outcome.document.contains("R09: Body."));
        assert!(!outcome.document.contains("R10"));
    }

    #[tokio::test]
    async fn summary_respects_sentence_cap() {
        let backend = Arc::new(StubBackend::with_results(&[&[
            ("A", Some("One. Two. Three.")),
            ("B", Some("Four. Five. Six.")),
        ]]));
        let r = researcher(backend, StubInsights::new(false)).with_summary_sentences(4);

        let outcome = r.run("counting", 1).await.unwrap();
        assert_eq!(outcome.summary, "One. Two. Three. Four.");
    }

    #[tokio::test]
    async fn outcome_serializes_for_json_output() {
        let backend = Arc::new(StubBackend::with_results(&[&[("T1", Some("B1."))]]));
        let r = researcher(backend, StubInsights::new(false));

        let outcome = r.run("json view", 1).await.unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["topic"], "json view");
        assert_eq!(json["snippets"][0], serde_json::json!({ "title": "T1", "snippet": "B1." }));
        assert_eq!(json["insight_enabled"], false);
        assert_eq!(json["filename"], "report_json_view.md");
    }

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(ResearchError::EmptyTopic.to_string(), "please enter a topic first");
        assert_eq!(
            ResearchError::DepthOutOfRange { depth: 9, max: 5 }.to_string(),
            "depth must be between 1 and 5, got 9"
        );
    }
}

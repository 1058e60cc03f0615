//! Snippet acquisition: paged HTML search scraping with a deterministic
//! synthetic fallback.
//!
//! [`SnippetSource::fetch`] runs in two stages.  [`SnippetSource::fetch_live`]
//! walks result pages until one fails or comes back empty; if that yields
//! nothing, [`fallback_snippets`] templates four placeholder results from
//! the query so downstream stages always have input, even offline.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use ideascope_config::SearchConfig;

use crate::Snippet;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("valid title selector"));
static SNIPPET_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__snippet").expect("valid snippet selector"));

// ─── Transport ───────────────────────────────────────────────────────────────

/// Raw response for one result page.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub status: u16,
    pub body: String,
}

impl SearchPage {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches one page of search results.  `offset` is the index of the first
/// result on the page.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn fetch_page(&self, query: &str, offset: usize) -> Result<SearchPage>;
}

/// DuckDuckGo-style HTML endpoint over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSearchBackend {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn fetch_page(&self, query: &str, offset: usize) -> Result<SearchPage> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("s", &offset.to_string())])
            .header("Accept", "text/html")
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(SearchPage { status, body })
    }
}

// ─── SnippetSource ───────────────────────────────────────────────────────────

pub struct SnippetSource {
    backend: Arc<dyn SearchBackend>,
    results_per_page: usize,
    concurrency: usize,
}

impl SnippetSource {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            results_per_page: 10,
            concurrency: 1,
        }
    }

    /// Build an HTTP-backed source from the `[search]` config section.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let backend = HttpSearchBackend::new(config)?;
        Ok(Self::new(Arc::new(backend))
            .with_results_per_page(config.results_per_page)
            .with_concurrency(config.concurrency))
    }

    pub fn with_results_per_page(mut self, results_per_page: usize) -> Self {
        self.results_per_page = results_per_page.max(1);
        self
    }

    /// Allow up to `concurrency` page requests in flight.  Pages are still
    /// consumed in order, so the result is the same as a sequential fetch.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Live results when there are any, otherwise the synthetic fallback.
    /// Never empty.
    pub async fn fetch(&self, query: &str, max_pages: usize) -> Vec<Snippet> {
        let snippets = self.fetch_live(query, max_pages).await;
        if !snippets.is_empty() {
            info!(count = snippets.len(), "fetched live snippets");
            return snippets;
        }

        info!(query, "no live results, using fallback snippets");
        fallback_snippets(query)
    }

    /// Scrape up to `max_pages` pages.  Stops at the first page that fails,
    /// returns a non-success status, or parses to zero results; everything
    /// gathered before that point is kept in page order.
    pub async fn fetch_live(&self, query: &str, max_pages: usize) -> Vec<Snippet> {
        let backend = self.backend.as_ref();
        let per_page = self.results_per_page;

        let mut pages = stream::iter(0..max_pages)
            .map(move |page| async move { (page, backend.fetch_page(query, page * per_page).await) })
            .buffered(self.concurrency);

        let mut snippets = Vec::new();
        while let Some((page, result)) = pages.next().await {
            let response = match result {
                Ok(response) => response,
                Err(err) => {
                    warn!(page, error = %err, "search request failed");
                    break;
                }
            };

            if !response.is_success() {
                debug!(page, status = response.status, "search returned non-success status");
                break;
            }

            let parsed = parse_results(&response.body, query);
            if parsed.is_empty() {
                debug!(page, "no results on page");
                break;
            }

            debug!(page, count = parsed.len(), "parsed result page");
            snippets.extend(parsed);
        }

        snippets
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Extract snippets from one result page.  Titles and bodies are paired by
/// position; a title without a matching body gets the query placeholder.
pub fn parse_results(html: &str, query: &str) -> Vec<Snippet> {
    let doc = Html::parse_document(html);

    let titles: Vec<String> = doc.select(&TITLE_SELECTOR).map(element_text).collect();
    let bodies: Vec<String> = doc.select(&SNIPPET_SELECTOR).map(element_text).collect();

    titles
        .into_iter()
        .enumerate()
        .map(|(i, title)| {
            let body = bodies.get(i).cloned().unwrap_or_default();
            Snippet {
                title: if title.is_empty() { format!("Result {}", i + 1) } else { title },
                snippet: if body.is_empty() { format!("Snippet for {query}") } else { body },
            }
        })
        .collect()
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Four templated snippets about `query`, used when live retrieval is empty.
pub fn fallback_snippets(query: &str) -> Vec<Snippet> {
    vec![
        Snippet::new(
            format!("Overview of {query}"),
            format!("{query} is an emerging area where AI agents are used to solve real-world problems."),
        ),
        Snippet::new(
            format!("Applications of {query}"),
            format!(
                "Common applications of {query} include automation, decision support, \
                 and personalised user experiences."
            ),
        ),
        Snippet::new(
            format!("Challenges in {query}"),
            format!(
                "Key challenges in {query} involve data quality, scalability, safety, \
                 and ethical considerations."
            ),
        ),
        Snippet::new(
            format!("Future of {query}"),
            format!(
                "Future trends in {query} point towards more autonomy, better collaboration \
                 between agents, and tighter integration with existing systems."
            ),
        ),
    ]
}

// ═════════════════════════════════════════════════════════════════════════════
//  Tests
// ═════════════════════════════════════════════════════════════════════════════

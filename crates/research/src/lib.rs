//! Topic research pipeline: scrape search snippets, condense them into an
//! extractive summary, and assemble a Markdown report.

use serde::{Deserialize, Serialize};

pub mod pipeline;
pub mod report;
pub mod source;
pub mod summarize;

pub use pipeline::{MAX_DEPTH, ResearchError, ResearchOutcome, Researcher};
pub use report::{SnippetTable, TOP_SNIPPET_LIMIT, build_report, export_filename};
pub use source::{HttpSearchBackend, SearchBackend, SearchPage, SnippetSource, fallback_snippets};
pub use summarize::{DEFAULT_MAX_SENTENCES, snippet_corpus, summarize};

/// One search result.  Both fields are non-empty once a [`SnippetSource`]
/// hands it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
    pub snippet: String,
}

impl Snippet {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
        }
    }
}

//! Report assembly: the exportable Markdown document and the flat snippet
//! table.

use std::fmt;

use crate::Snippet;

/// Snippets embedded in the exported document.
pub const TOP_SNIPPET_LIMIT: usize = 10;

/// Widest a table cell is rendered before it gets an ellipsis.
const MAX_CELL_CHARS: usize = 80;

/// Render the research report as Markdown.
///
/// Sections always appear in the same order: title, summary, predictions
/// and insights, top snippets.  `top_snippets` is rendered as given; callers
/// slice it to [`TOP_SNIPPET_LIMIT`].
pub fn build_report(topic: &str, summary: &str, insight: &str, top_snippets: &[Snippet]) -> String {
    let mut md = vec![
        format!("# Research report — {topic}\n"),
        "## Summary\n".to_string(),
        format!("{summary}\n"),
        "## Predictions & Insights\n".to_string(),
        format!("{insight}\n"),
        "## Top snippets\n".to_string(),
    ];
    for s in top_snippets {
        md.push(format!("- {}: {}\n", s.title, s.snippet));
    }
    md.join("\n")
}

/// File name for an exported report, e.g. `report_AI_agents.md`.
pub fn export_filename(topic: &str) -> String {
    let stem = topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['/', '\\'], "_");
    format!("report_{stem}.md")
}

// ── Tabular view ─────────────────────────────────────────────────────────────

/// All snippets projected onto `title` / `snippet` columns, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetTable {
    pub columns: [&'static str; 2],
    pub rows: Vec<[String; 2]>,
}

impl SnippetTable {
    pub fn from_snippets(snippets: &[Snippet]) -> Self {
        Self {
            columns: ["title", "snippet"],
            rows: snippets
                .iter()
                .map(|s| [s.title.clone(), s.snippet.clone()])
                .collect(),
        }
    }
}

impl fmt::Display for SnippetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 2]> = self
            .rows
            .iter()
            .map(|[title, snippet]| [clip(title), clip(snippet)])
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let mut widths = self.columns.map(|c| c.chars().count());
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write!(f, "{:index_width$}", "")?;
        for (column, width) in self.columns.iter().zip(widths) {
            write!(f, "  {column:<width$}")?;
        }
        writeln!(f)?;

        for (i, row) in cells.iter().enumerate() {
            write!(f, "{i:>index_width$}")?;
            for (cell, width) in row.iter().zip(widths) {
                write!(f, "  {cell:<width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn clip(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL_CHARS {
        return cell.to_string();
    }
    let kept: String = cell.chars().take(MAX_CELL_CHARS - 1).collect();
    format!("{}…", kept.trim_end())
}

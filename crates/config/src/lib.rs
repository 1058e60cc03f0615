use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable overriding the scraper's `User-Agent` header.
pub const USER_AGENT_ENV: &str = "USER_AGENT";

pub const DEFAULT_USER_AGENT: &str = "AutoAgentHackathon/1.0";

// ── Search config ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// HTML search endpoint.  Queried with `q=<topic>` and `s=<offset>`.
    pub endpoint: String,
    /// Sent as the `User-Agent` header.  Overridden by `USER_AGENT` when set.
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Offset step between result pages.
    pub results_per_page: usize,
    /// Pages fetched when the CLI is not given `--depth`.
    pub default_depth: usize,
    /// Maximum result pages requested at once.  `1` fetches strictly one
    /// page after another.
    pub concurrency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://duckduckgo.com/html/".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            results_per_page: 10,
            default_depth: 2,
            concurrency: 1,
        }
    }
}

// ── LLM config ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Gemini API key.  Empty disables predictions.  `GEMINI_API_KEY` takes
    /// precedence over the file value.
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// ── Report config ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub summary_sentences: usize,
    /// Snippets embedded in the exported document.
    pub top_snippets: usize,
    /// Snippets shown as samples in the terminal view.
    pub preview_snippets: usize,
    pub export_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            summary_sentences: 5,
            top_snippets: 10,
            preview_snippets: 5,
            export_dir: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub report: ReportConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides through `lookup` so callers (and tests)
    /// can supply their own source instead of the process environment.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(GEMINI_API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.llm.api_key = key.trim().to_string();
            }
        }

        if let Some(agent) = lookup(USER_AGENT_ENV) {
            if !agent.trim().is_empty() {
                self.search.user_agent = agent;
            }
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.search.endpoint, "https://duckduckgo.com/html/");
        assert_eq!(cfg.search.user_agent, "AutoAgentHackathon/1.0");
        assert_eq!(cfg.search.timeout_secs, 10);
        assert_eq!(cfg.search.results_per_page, 10);
        assert_eq!(cfg.search.default_depth, 2);
        assert_eq!(cfg.search.concurrency, 1);
        assert_eq!(cfg.llm.model, "gemini-2.5-flash");
        assert!(!cfg.llm.has_credentials());
        assert_eq!(cfg.report.summary_sentences, 5);
        assert_eq!(cfg.report.top_snippets, 10);
        assert_eq!(cfg.report.preview_snippets, 5);
        assert_eq!(cfg.telemetry.log_level, "warn");
    }

    // ── load_from ──────────────────────────────────────────────────────────

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(dir.path().join("nonexistent.toml")).unwrap();
        assert_eq!(cfg.search.default_depth, 2);
        assert_eq!(cfg.llm.model, "gemini-2.5-flash");
    }

    #[test]
    fn load_from_partial_toml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(
            &path,
            r#"
[search]
default_depth = 4
concurrency = 3

[report]
export_dir = "reports"
"#,
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.search.default_depth, 4);
        assert_eq!(cfg.search.concurrency, 3);
        assert_eq!(cfg.report.export_dir, "reports");
        // Untouched fields keep their defaults
        assert_eq!(cfg.search.results_per_page, 10);
        assert_eq!(cfg.report.summary_sentences, 5);
    }

    #[test]
    fn load_from_invalid_toml_returns_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/ideascope.toml");

        let mut cfg = AppConfig::default();
        cfg.search.user_agent = "Custom/2.0".to_string();
        cfg.llm.model = "gemini-2.0-flash".to_string();
        cfg.report.top_snippets = 7;

        cfg.save_to(&path).unwrap();
        assert!(path.exists());

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.llm.model, "gemini-2.0-flash");
        assert_eq!(loaded.report.top_snippets, 7);
    }

    // ── Env overrides ──────────────────────────────────────────────────────

    #[test]
    fn env_api_key_enables_credentials() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides(lookup_from(&[("GEMINI_API_KEY", " secret ")]));
        assert_eq!(cfg.llm.api_key, "secret");
        assert!(cfg.llm.has_credentials());
    }

    #[test]
    fn env_api_key_overrides_file_value() {
        let mut cfg = AppConfig::default();
        cfg.llm.api_key = "from-file".to_string();
        cfg.apply_env_overrides(lookup_from(&[("GEMINI_API_KEY", "from-env")]));
        assert_eq!(cfg.llm.api_key, "from-env");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = AppConfig::default();
        cfg.llm.api_key = "from-file".to_string();
        cfg.apply_env_overrides(lookup_from(&[("GEMINI_API_KEY", "  "), ("USER_AGENT", "")]));
        assert_eq!(cfg.llm.api_key, "from-file");
        assert_eq!(cfg.search.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn env_user_agent_overrides_default() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides(lookup_from(&[("USER_AGENT", "ResearchBot/0.3")]));
        assert_eq!(cfg.search.user_agent, "ResearchBot/0.3");
    }
}

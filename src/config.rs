use std::path::PathBuf;
use std::time::Duration;

use crate::llm::LlmEngine;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CAPTION_LANG: &str = "ja";

/// File-system layout of a working directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join("youtube_links.json")
    }

    pub fn captions_dir(&self) -> PathBuf {
        self.root.join("captions")
    }

    pub fn highlight_dir(&self) -> PathBuf {
        self.root.join("highlight")
    }

    pub fn summary_dir(&self) -> PathBuf {
        self.root.join("summary")
    }

    pub fn quiz_dir(&self) -> PathBuf {
        self.root.join("problem_bank")
    }

    /// `summary/<title>.md`; `title` must already be sanitized.
    pub fn summary_path(&self, title: &str) -> PathBuf {
        self.summary_dir().join(format!("{title}.md"))
    }

    pub fn quiz_path(&self, title: &str) -> PathBuf {
        self.quiz_dir().join(format!("{title}.md"))
    }
}

/// Which gateway to build and how.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub engine: LlmEngine,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub command: Option<String>,
    pub command_args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Resolves the Gemini settings. Flags win over `GEMINI_MODEL` /
    /// `GEMINI_BASE_URL`; the key comes only from `GEMINI_API_KEY`.
    pub fn gemini(&self) -> anyhow::Result<GeminiConfig> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY is not set"))?;
        let model = self
            .model
            .clone()
            .or_else(|| std::env::var("GEMINI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_owned());
        let base_url = self
            .base_url
            .clone()
            .or_else(|| std::env::var("GEMINI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_owned());

        Ok(GeminiConfig {
            api_key,
            model,
            base_url,
            timeout: self.timeout,
        })
    }
}

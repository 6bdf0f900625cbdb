//! Batch passes over the workspace.
//!
//! Each pass keeps going when a single item fails to generate or parse, and
//! records it in the returned [`BatchReport`]. A failed write of a ledger or
//! artifact aborts the pass.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::captions;
use crate::config::Workspace;
use crate::downloader::CaptionDownloader;
use crate::frontmatter::{self, FieldValue, SummaryArtifact};
use crate::highlight;
use crate::ledger::Ledger;
use crate::llm::Gateway;
use crate::quiz::{self, QaPair};
use crate::sanitize::sanitize;
use crate::store;
use crate::summarize;

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    fn fail(&mut self, item: impl Into<String>, err: impl std::fmt::Display) {
        let item = item.into();
        let error = err.to_string();
        tracing::warn!(item = %item, error = %error, "item failed");
        self.failed.push((item, error));
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn log(&self, pass: &str) {
        tracing::info!(
            pass,
            succeeded = self.succeeded.len(),
            skipped = self.skipped.len(),
            failed = self.failed.len(),
            "batch finished"
        );
    }
}

/// Downloads captions for every link that has not been fetched yet.
pub fn fetch_pending<D: CaptionDownloader + ?Sized>(
    ledger: &mut Ledger,
    downloader: &D,
    captions_dir: &Path,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();

    for item in ledger.pending_fetch() {
        let Some(video_id) = item.id() else {
            report.fail(&item.url, "ledger entry has no valid video id");
            continue;
        };

        match downloader.download(&item.url, captions_dir) {
            Ok(title) => {
                ledger.mark_fetched(&video_id, &title)?;
                tracing::info!(video_id = %video_id, title = %title, "captions fetched");
                report.succeeded.push(video_id.to_string());
            }
            Err(err) => report.fail(video_id.as_str(), format!("{err:#}")),
        }
    }

    Ok(report)
}

/// Summarizes the captions of every fetched but unsummarized link.
pub fn summarize_captions<G: Gateway + ?Sized>(
    ledger: &mut Ledger,
    gateway: &G,
    workspace: &Workspace,
    lang: &str,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();
    let pending = ledger.pending_summary();
    if pending.is_empty() {
        tracing::info!("no fetched captions waiting for a summary");
        return Ok(report);
    }

    let captions_dir = workspace.captions_dir();
    if !captions_dir.is_dir() {
        anyhow::bail!("captions dir does not exist: {}", captions_dir.display());
    }
    let caption_files = index_captions(&captions_dir, lang)?;

    for (key, path) in &caption_files {
        let tracked = ledger
            .items()
            .iter()
            .any(|item| item.title.as_deref().is_some_and(|t| captions::title_key(t) == *key));
        if !tracked {
            tracing::warn!(path = %path.display(), "caption file has no ledger entry");
        }
    }

    for item in pending {
        let (Some(video_id), Some(title)) = (item.id(), item.title.clone()) else {
            report.fail(&item.url, "fetched ledger entry has no title");
            continue;
        };

        let Some(caption_path) = caption_files.get(&captions::title_key(&title)) else {
            report.fail(video_id.as_str(), format!("no caption file for title {title}"));
            continue;
        };

        let srt = match std::fs::read_to_string(caption_path) {
            Ok(srt) => srt,
            Err(err) => {
                report.fail(
                    video_id.as_str(),
                    format!("read {}: {err}", caption_path.display()),
                );
                continue;
            }
        };
        let lines = captions::spoken_lines(&srt);
        if lines.is_empty() {
            report.fail(video_id.as_str(), "caption file has no spoken text");
            continue;
        }

        let body = match summarize::summarize_transcript(gateway, &lines) {
            Ok(body) => body,
            Err(err) => {
                report.fail(video_id.as_str(), err);
                continue;
            }
        };

        let artifact = SummaryArtifact {
            title: title.clone(),
            fields: vec![
                ("title".to_owned(), FieldValue::Text(title.clone())),
                ("source".to_owned(), FieldValue::Text(item.url.clone())),
                ("date".to_owned(), FieldValue::Text(today())),
                ("tags".to_owned(), tags(&["youtube", "quiz"])),
            ],
            body,
        };
        let out_path = workspace.summary_path(&artifact.title);
        store::write_atomic(&out_path, artifact.render()?.as_bytes())
            .with_context(|| format!("write summary: {}", out_path.display()))?;
        ledger.mark_summarized(&video_id)?;

        tracing::info!(video_id = %video_id, path = %out_path.display(), "summary written");
        report.succeeded.push(video_id.to_string());
    }

    Ok(report)
}

/// Maps the [`captions::title_key`] of each caption file to its path.
fn index_captions(dir: &Path, lang: &str) -> anyhow::Result<HashMap<String, PathBuf>> {
    let mut index = HashMap::new();
    for path in store::list_files(dir, Some("srt"))? {
        match captions::caption_title(&path, lang) {
            Some(title) => {
                index.insert(captions::title_key(&title), path);
            }
            None => tracing::debug!(path = %path.display(), lang, "skipping caption file"),
        }
    }
    Ok(index)
}

/// Summarizes every Kindle export under `highlight/`.
pub fn summarize_highlights<G: Gateway + ?Sized>(
    gateway: &G,
    workspace: &Workspace,
    force: bool,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();
    let highlight_dir = workspace.highlight_dir();
    if !highlight_dir.is_dir() {
        anyhow::bail!("highlight dir does not exist: {}", highlight_dir.display());
    }

    for path in store::list_files(&highlight_dir, None)? {
        let label = file_label(&path);
        if label.starts_with('.') {
            continue;
        }

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                report.fail(label, format!("read: {err}"));
                continue;
            }
        };
        let doc = match highlight::extract(&text) {
            Ok(doc) => doc,
            Err(err) => {
                report.fail(label, err);
                continue;
            }
        };

        let title = sanitize(&doc.title);
        let out_path = workspace.summary_path(&title);
        if out_path.exists() && !force {
            tracing::info!(path = %out_path.display(), "summary exists; skipping");
            report.skipped.push(label);
            continue;
        }
        if doc.passages.is_empty() {
            report.fail(label, "no highlight passages found");
            continue;
        }

        let body = match summarize::summarize_highlights(gateway, &doc) {
            Ok(body) => body,
            Err(err) => {
                report.fail(label, err);
                continue;
            }
        };

        let artifact = SummaryArtifact {
            title,
            fields: vec![
                ("title".to_owned(), FieldValue::Text(doc.title.clone())),
                ("author".to_owned(), FieldValue::Text(doc.author.clone())),
                ("date".to_owned(), FieldValue::Text(today())),
                ("tags".to_owned(), tags(&["kindle", "quiz"])),
            ],
            body,
        };
        store::write_atomic(&out_path, artifact.render()?.as_bytes())
            .with_context(|| format!("write summary: {}", out_path.display()))?;

        tracing::info!(
            title = %doc.title,
            passages = doc.passages.len(),
            path = %out_path.display(),
            "summary written"
        );
        report.succeeded.push(label);
    }

    Ok(report)
}

/// Writes a Markdown quiz bank under `problem_bank/` for every summary.
pub fn build_quiz_bank<G: Gateway + ?Sized>(
    gateway: &G,
    workspace: &Workspace,
    force: bool,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();
    let summary_dir = workspace.summary_dir();
    if !summary_dir.is_dir() {
        anyhow::bail!("summary dir does not exist: {}", summary_dir.display());
    }

    for path in store::list_files(&summary_dir, Some("md"))? {
        let label = file_label(&path);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                report.fail(label, format!("read: {err}"));
                continue;
            }
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let (block, title, body) = match frontmatter::parse(&text) {
            Some(parsed) => {
                let title = parsed.text("title").map(sanitize).unwrap_or(stem);
                (parsed.block.to_owned(), title, parsed.body)
            }
            None => {
                let fields = [("title".to_owned(), FieldValue::Text(stem.clone()))];
                let block = frontmatter::render_block(&fields)?;
                (block.trim_end().to_owned(), stem, text.as_str())
            }
        };

        if body.trim().is_empty() {
            report.fail(label, "summary body is empty");
            continue;
        }

        let out_path = workspace.quiz_path(&title);
        if out_path.exists() && !force {
            tracing::info!(path = %out_path.display(), "quiz bank exists; skipping");
            report.skipped.push(label);
            continue;
        }

        let questions = match quiz::bank_markdown(gateway, body) {
            Ok(questions) => questions,
            Err(err) => {
                report.fail(label, err);
                continue;
            }
        };

        let contents = format!("{block}\n{questions}");
        store::write_atomic(&out_path, contents.as_bytes())
            .with_context(|| format!("write quiz bank: {}", out_path.display()))?;
        tracing::info!(path = %out_path.display(), "quiz bank written");
        report.succeeded.push(label);
    }

    Ok(report)
}

/// Summary files to quiz on: the given ones, or every summary when none given.
pub fn select_summaries(workspace: &Workspace, explicit: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }
    let summary_dir = workspace.summary_dir();
    if !summary_dir.is_dir() {
        anyhow::bail!("summary dir does not exist: {}", summary_dir.display());
    }
    store::list_files(&summary_dir, Some("md"))
}

/// Generates one question set from the concatenated bodies of all `summaries`.
pub fn quiz_from_summaries<G: Gateway + ?Sized>(
    gateway: &G,
    summaries: &[PathBuf],
    count: usize,
) -> anyhow::Result<Vec<QaPair>> {
    let mut combined = String::new();
    for path in summaries {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read summary: {}", path.display()))?;
        let body = frontmatter::parse(&text).map_or(text.as_str(), |parsed| parsed.body);
        if !combined.is_empty() {
            combined.push_str("\n\n");
        }
        combined.push_str(body.trim());
    }

    tracing::info!(summaries = summaries.len(), count, "generate quiz");
    let pairs = quiz::generate_quiz(gateway, &combined, count).context("generate quiz")?;
    if pairs.len() < count {
        tracing::warn!(requested = count, received = pairs.len(), "quiz is shorter than requested");
    }
    Ok(pairs)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn tags(values: &[&str]) -> FieldValue {
    FieldValue::List(values.iter().map(|v| (*v).to_owned()).collect())
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

use std::path::PathBuf;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::sanitize::sanitize;
use crate::store::write_json_atomic;
use crate::youtube::{self, VideoId};

/// One YouTube link tracked through fetch and summarize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub url: String,
    #[serde(default)]
    pub video_id: String,
    pub done: bool,
    pub title: Option<String>,
    #[serde(alias = "LLM_gen")]
    pub summarized: bool,
}

/// JSON-backed record of every link and its processing state.
///
/// The whole file is rewritten after each mutation. Writes are atomic, but
/// nothing guards against two processes mutating the same ledger at once.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    items: Vec<WorkItem>,
}

impl Ledger {
    /// Loads the ledger at `path`; a missing file is an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let mut items: Vec<WorkItem> = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("parse ledger: {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("read ledger: {}", path.display()));
            }
        };

        for item in &mut items {
            normalize_legacy(item);
        }

        tracing::debug!(path = %path.display(), items = items.len(), "ledger loaded");
        Ok(Self { path, items })
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn find(&self, video_id: &str) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.video_id == video_id)
    }

    /// Adds `url` unless its video is already tracked.
    ///
    /// Returns `false` for a URL that is not a YouTube video link; the file is
    /// not touched in that case, nor when the video is already present.
    pub fn insert(&mut self, url: &str) -> anyhow::Result<bool> {
        let video_id = match youtube::video_id(url) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(%err, "ledger insert rejected");
                return Ok(false);
            }
        };

        if let Some(existing) = self.find(video_id.as_str()) {
            tracing::info!(
                video_id = %video_id,
                url = %existing.url,
                "ledger insert skipped; video already tracked"
            );
            return Ok(true);
        }

        self.items.push(WorkItem {
            url: url.trim().to_owned(),
            video_id: video_id.as_str().to_owned(),
            done: false,
            title: None,
            summarized: false,
        });
        self.save()?;
        tracing::info!(video_id = %video_id, "ledger insert");
        Ok(true)
    }

    /// Records that captions were fetched. The title is stored sanitized so it
    /// matches caption and summary file names.
    pub fn mark_fetched(&mut self, video_id: &VideoId, title: &str) -> anyhow::Result<()> {
        let title = sanitize(title);
        if title.is_empty() {
            anyhow::bail!("fetched title for {video_id} is empty");
        }
        let item = self.item_mut(video_id)?;
        item.done = true;
        item.title = Some(title);
        self.save()
    }

    pub fn mark_summarized(&mut self, video_id: &VideoId) -> anyhow::Result<()> {
        let item = self.item_mut(video_id)?;
        if !item.done {
            anyhow::bail!("cannot mark {video_id} summarized before its captions are fetched");
        }
        item.summarized = true;
        self.save()
    }

    /// Puts an item back to the not-fetched state, e.g. after its caption file
    /// was deleted.
    pub fn reset(&mut self, video_id: &VideoId) -> anyhow::Result<()> {
        let item = self.item_mut(video_id)?;
        item.done = false;
        item.title = None;
        item.summarized = false;
        self.save()
    }

    pub fn pending_fetch(&self) -> Vec<WorkItem> {
        self.items.iter().filter(|item| !item.done).cloned().collect()
    }

    pub fn pending_summary(&self) -> Vec<WorkItem> {
        self.items
            .iter()
            .filter(|item| item.done && !item.summarized)
            .cloned()
            .collect()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        write_json_atomic(&self.path, &self.items)
            .with_context(|| format!("write ledger: {}", self.path.display()))
    }

    fn item_mut(&mut self, video_id: &VideoId) -> anyhow::Result<&mut WorkItem> {
        self.items
            .iter_mut()
            .find(|item| item.video_id == video_id.as_str())
            .ok_or_else(|| anyhow::anyhow!("video is not in the ledger: {video_id}"))
    }
}

/// Brings entries written by older versions up to the current shape: derives
/// a missing `video_id` and stores the title sanitized.
fn normalize_legacy(item: &mut WorkItem) {
    if item.video_id.is_empty() {
        let url = item.url.trim();
        let derived = youtube::video_id(url)
            .or_else(|err| youtube::video_id(&format!("https://{url}")).map_err(|_| err));
        match derived {
            Ok(id) => item.video_id = id.as_str().to_owned(),
            // Kept with an empty id; `fetch_pending` reports it per item.
            Err(err) => tracing::warn!(%err, "ledger entry has no usable video id"),
        }
    }

    if let Some(title) = item.title.take() {
        let title = sanitize(&title);
        item.title = (!title.is_empty()).then_some(title);
    }
}

impl WorkItem {
    pub fn id(&self) -> Option<VideoId> {
        VideoId::parse(&self.video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> VideoId {
        VideoId::parse(raw).unwrap()
    }

    #[test]
    fn insert_collapses_links_to_the_same_video() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("youtube_links.json");
        let mut ledger = Ledger::open(&path)?;

        assert!(ledger.insert("https://www.youtube.com/watch?v=dQw4w9WgXcQ")?);
        assert!(ledger.insert("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s")?);
        assert!(ledger.insert("https://youtu.be/dQw4w9WgXcQ")?);
        assert_eq!(ledger.items().len(), 1);

        let reopened = Ledger::open(&path)?;
        assert_eq!(reopened.items().len(), 1);
        assert_eq!(reopened.items()[0].video_id, "dQw4w9WgXcQ");
        Ok(())
    }

    #[test]
    fn insert_rejects_invalid_url_without_touching_file() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("youtube_links.json");
        let mut ledger = Ledger::open(&path)?;
        ledger.insert("https://www.youtube.com/watch?v=dQw4w9WgXcQ")?;
        let before = std::fs::read(&path)?;

        assert!(!ledger.insert("not a url")?);

        assert_eq!(std::fs::read(&path)?, before);
        assert_eq!(ledger.items().len(), 1);
        Ok(())
    }

    #[test]
    fn insert_rejected_on_fresh_ledger_creates_no_file() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("youtube_links.json");
        let mut ledger = Ledger::open(&path)?;

        assert!(!ledger.insert("not a url")?);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn lifecycle_drains_pending_queues() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("youtube_links.json");
        let mut ledger = Ledger::open(&path)?;

        ledger.insert("https://www.youtube.com/watch?v=aaaaaaaaaaa")?;
        assert_eq!(ledger.items().len(), 1);
        assert!(!ledger.items()[0].done);
        assert_eq!(ledger.pending_fetch().len(), 1);
        assert!(ledger.pending_summary().is_empty());

        ledger.mark_fetched(&id("aaaaaaaaaaa"), "T")?;
        assert!(ledger.pending_fetch().is_empty());
        assert_eq!(ledger.pending_summary().len(), 1);

        ledger.mark_summarized(&id("aaaaaaaaaaa"))?;
        assert!(ledger.pending_fetch().is_empty());
        assert!(ledger.pending_summary().is_empty());

        let reopened = Ledger::open(&path)?;
        assert_eq!(reopened.items(), ledger.items());
        Ok(())
    }

    #[test]
    fn mark_fetched_stores_sanitized_title() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let mut ledger = Ledger::open(temp.path().join("links.json"))?;
        ledger.insert("https://youtu.be/bbbbbbbbbbb")?;

        ledger.mark_fetched(&id("bbbbbbbbbbb"), "Rust: Part 1/2")?;

        let item = ledger.find("bbbbbbbbbbb").unwrap();
        assert!(item.done);
        assert_eq!(item.title.as_deref(), Some("Rust-Part1-2"));
        Ok(())
    }

    #[test]
    fn mutations_of_unknown_videos_fail() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let mut ledger = Ledger::open(temp.path().join("links.json"))?;

        assert!(ledger.mark_fetched(&id("ccccccccccc"), "T").is_err());
        assert!(ledger.mark_summarized(&id("ccccccccccc")).is_err());
        assert!(ledger.reset(&id("ccccccccccc")).is_err());
        Ok(())
    }

    #[test]
    fn reset_returns_item_to_pending_fetch() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let mut ledger = Ledger::open(temp.path().join("links.json"))?;
        ledger.insert("https://youtu.be/ddddddddddd")?;
        ledger.mark_fetched(&id("ddddddddddd"), "Title")?;
        ledger.mark_summarized(&id("ddddddddddd"))?;

        ledger.reset(&id("ddddddddddd"))?;

        let item = ledger.find("ddddddddddd").unwrap();
        assert!(!item.done && !item.summarized);
        assert_eq!(item.title, None);
        assert_eq!(ledger.pending_fetch().len(), 1);
        Ok(())
    }

    #[test]
    fn open_reads_legacy_field_names() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("youtube_links.json");
        std::fs::write(
            &path,
            r#"[
  {
    "url": "https://www.youtube.com/watch?v=eeeeeeeeeee",
    "done": true,
    "title": "Old-Title",
    "LLM_gen": false
  }
]"#,
        )?;

        let ledger = Ledger::open(&path)?;
        let item = &ledger.items()[0];
        assert_eq!(item.video_id, "eeeeeeeeeee");
        assert!(item.done && !item.summarized);
        assert_eq!(ledger.pending_summary().len(), 1);
        Ok(())
    }

    #[test]
    fn open_sanitizes_legacy_raw_titles() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("youtube_links.json");
        std::fs::write(
            &path,
            r#"[{"url":"https://www.youtube.com/watch?v=eeeeeeeeeee","done":true,"title":"My Video: Part 1","LLM_gen":false}]"#,
        )?;

        let ledger = Ledger::open(&path)?;
        assert_eq!(ledger.items()[0].title.as_deref(), Some("MyVideo-Part1"));
        Ok(())
    }

    #[test]
    fn open_keeps_entries_whose_url_has_no_video_id() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("youtube_links.json");
        std::fs::write(
            &path,
            r#"[
  {"url":"www.youtube.com/watch?v=eeeeeeeeeee","done":false,"title":null,"LLM_gen":false},
  {"url":"https://vimeo.com/12345","done":false,"title":null,"LLM_gen":false},
  {"url":"https://youtu.be/fffffffffff","done":false,"title":null,"LLM_gen":false}
]"#,
        )?;

        let mut ledger = Ledger::open(&path)?;
        let ids = ledger
            .items()
            .iter()
            .map(|item| item.video_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["eeeeeeeeeee", "", "fffffffffff"]);
        assert_eq!(ledger.items()[1].id(), None);

        // The rest of the ledger stays usable.
        ledger.mark_fetched(&id("fffffffffff"), "T")?;
        assert!(ledger.insert("https://youtu.be/ggggggggggg")?);
        assert_eq!(Ledger::open(&path)?.items().len(), 4);
        Ok(())
    }

    #[test]
    fn open_rejects_corrupt_json() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("youtube_links.json");
        std::fs::write(&path, "[{\"url\": ")?;

        assert!(Ledger::open(&path).is_err());
        Ok(())
    }

    #[test]
    fn saved_ledger_uses_standard_field_order() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("youtube_links.json");
        let mut ledger = Ledger::open(&path)?;
        ledger.insert("https://youtu.be/fffffffffff")?;

        let text = std::fs::read_to_string(&path)?;
        let keys = ["\"url\"", "\"video_id\"", "\"done\"", "\"title\"", "\"summarized\""];
        let positions = keys
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect::<Vec<_>>();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
        Ok(())
    }
}

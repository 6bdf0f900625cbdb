use std::sync::LazyLock;

use regex::Regex;

static HIGHLIGHTS_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"##\s*Highlights\n*(.*)—\slocation").expect("valid highlights heading regex")
});

static DASH_WRAPPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"---\n*(.*)\n*—\slocation").expect("valid dash wrapped regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("highlight export has no `{field}` line")]
    MissingMetadata { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightDocument {
    pub title: String,
    pub author: String,
    pub passages: Vec<String>,
}

impl HighlightDocument {
    /// One `- <passage>` bullet per passage, in document order.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for passage in &self.passages {
            out.push_str("- ");
            out.push_str(passage);
            out.push('\n');
        }
        out
    }
}

/// Parses a Kindle highlight export.
///
/// Passages are collected from two layouts: the first highlight right after a
/// `## Highlights` heading, and every highlight wrapped by a `---` separator.
/// Both are ended by a `— location` marker. Matches of the first layout come
/// first; nothing is deduplicated across the two.
pub fn extract(document: &str) -> Result<HighlightDocument, ExtractError> {
    let text = document.replace("\r\n", "\n");

    let title = metadata_value(&text, "title")
        .ok_or(ExtractError::MissingMetadata { field: "title" })?;
    let author = metadata_value(&text, "author")
        .ok_or(ExtractError::MissingMetadata { field: "author" })?;

    let passages = HIGHLIGHTS_HEADING
        .captures_iter(&text)
        .chain(DASH_WRAPPED.captures_iter(&text))
        .map(|caps| caps[1].trim().to_owned())
        .collect();

    Ok(HighlightDocument {
        title,
        author,
        passages,
    })
}

/// Value of the first `key: value` line; indentation before the key is allowed.
fn metadata_value(text: &str, key: &str) -> Option<String> {
    let value = text.lines().find_map(|line| {
        line.trim_start()
            .strip_prefix(key)?
            .trim_start()
            .strip_prefix(':')
    })?;
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_owned())
}

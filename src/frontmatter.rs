//! `---`-delimited metadata header written in front of summary and quiz files.
//!
//! Scalars are written as-is after `key: `; lists are written as JSON arrays.

use anyhow::Context as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

/// A Markdown document with an ordered frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryArtifact {
    pub title: String,
    pub fields: Vec<(String, FieldValue)>,
    pub body: String,
}

impl SummaryArtifact {
    pub fn render(&self) -> anyhow::Result<String> {
        let mut out = render_block(&self.fields)?;
        out.push_str(&self.body);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }
}

pub fn render_block(fields: &[(String, FieldValue)]) -> anyhow::Result<String> {
    let mut out = String::from("---\n");
    for (key, value) in fields {
        out.push_str(key);
        out.push_str(": ");
        match value {
            FieldValue::Text(text) => out.push_str(&text.replace('\n', " ")),
            FieldValue::List(items) => {
                let json = serde_json::to_string(items)
                    .with_context(|| format!("serialize frontmatter list: {key}"))?;
                out.push_str(&json);
            }
        }
        out.push('\n');
    }
    out.push_str("---\n");
    Ok(out)
}

/// A frontmatter block split off the front of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<'a> {
    /// The block verbatim, delimiters included, without the trailing newline.
    pub block: &'a str,
    pub fields: Vec<(String, FieldValue)>,
    pub body: &'a str,
}

impl Parsed<'_> {
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.iter().find_map(|(k, v)| match v {
            FieldValue::Text(text) if k == key => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Splits `contents` into frontmatter and body. Returns `None` when the
/// document does not open with a closed `---` block.
pub fn parse(contents: &str) -> Option<Parsed<'_>> {
    let rest = contents
        .strip_prefix("---\n")
        .or_else(|| contents.strip_prefix("---\r\n"))?;
    let open_len = contents.len() - rest.len();

    let mut offset = 0usize;
    let mut fields = Vec::new();
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" {
            let block_end = open_len + offset + "---".len();
            let body_start = open_len + offset + line.len();
            return Some(Parsed {
                block: &contents[..block_end],
                fields,
                body: &contents[body_start..],
            });
        }
        if let Some((key, value)) = trimmed.split_once(':') {
            fields.push((key.trim().to_owned(), parse_value(value.trim())));
        }
        offset += line.len();
    }

    None
}

fn parse_value(raw: &str) -> FieldValue {
    if raw.starts_with('[')
        && let Ok(items) = serde_json::from_str::<Vec<String>>(raw)
    {
        return FieldValue::List(items);
    }
    FieldValue::Text(raw.to_owned())
}

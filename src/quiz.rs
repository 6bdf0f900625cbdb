use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::{Gateway, GenerationError};

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid fenced block regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    #[serde(rename = "Q")]
    pub question: String,
    #[serde(rename = "A")]
    pub answer: String,
}

pub fn quiz_prompt(source: &str, count: usize) -> String {
    format!(
        "Read the following Markdown document and write {count} quiz questions that check \
whether the reader understood it.\n\
\n\
Rules:\n\
- Output a JSON array of exactly {count} objects.\n\
- Each object has exactly two keys: \"Q\" (the question) and \"A\" (the answer).\n\
- Base every question on facts or key points of the document; test understanding, not paraphrase.\n\
- Write in the same language as the document.\n\
- Output nothing but the JSON array: no prose, no code fences.\n\
\n\
[Markdown]\n\
{source}\n"
    )
}

/// Asks the gateway for up to `count` question/answer pairs about `source`.
///
/// A blank source or a zero count returns an empty list without calling the
/// gateway. A response that cannot be read as a JSON list also yields an empty
/// list; only the gateway call itself can fail.
pub fn generate_quiz<G: Gateway + ?Sized>(
    gateway: &G,
    source: &str,
    count: usize,
) -> Result<Vec<QaPair>, GenerationError> {
    let source = source.trim();
    if source.is_empty() || count == 0 {
        return Ok(Vec::new());
    }

    let raw = gateway.generate(&quiz_prompt(source, count))?;

    let Some(entries) = parse_quiz_response(&raw) else {
        tracing::warn!(
            response_chars = raw.chars().count(),
            "quiz response is not a JSON list; returning no questions"
        );
        return Ok(Vec::new());
    };

    let (pairs, dropped) = collect_pairs(entries, count);
    if dropped > 0 {
        tracing::debug!(dropped, kept = pairs.len(), "dropped malformed quiz entries");
    }
    Ok(pairs)
}

/// Reads a JSON list out of an LLM response, trying in order: the whole
/// text, the first fenced code block, and the span from the first `[` to the
/// last `]`.
pub fn parse_quiz_response(response: &str) -> Option<Vec<Value>> {
    let text = response.trim();

    parse_list(text)
        .or_else(|| {
            let caps = FENCED_BLOCK.captures(text)?;
            parse_list(&caps[1])
        })
        .or_else(|| {
            let start = text.find('[')?;
            let end = text.rfind(']')?;
            if end < start {
                return None;
            }
            parse_list(&text[start..=end])
        })
}

fn parse_list(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Keeps entries with a non-empty `Q` and `A`, stopping after `count`.
/// Returns the kept pairs and how many entries were skipped before stopping.
pub fn collect_pairs(entries: Vec<Value>, count: usize) -> (Vec<QaPair>, usize) {
    let mut pairs = Vec::new();
    let mut dropped = 0usize;

    for entry in entries {
        if pairs.len() >= count {
            break;
        }
        let question = entry.get("Q").and_then(scalar_text);
        let answer = entry.get("A").and_then(scalar_text);
        match (question, answer) {
            (Some(question), Some(answer)) => pairs.push(QaPair { question, answer }),
            _ => dropped += 1,
        }
    }

    (pairs, dropped)
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

pub fn bank_prompt(summary: &str) -> String {
    format!(
        "The following text summarizes part of a book or video. Write questions that together \
cover the whole summary.\n\
Mix several angles: definitions, reasons, comparisons, and applied scenarios.\n\
Every question must follow this Markdown format exactly:\n\
\n\
### (the question itself, one per heading)\n\
**Answer** (the answer)\n\
**Explanation** (the explanation)\n\
\n\
Do not write any preamble or text unrelated to the questions.\n\
Write in the same language as the summary.\n\
\n\
{summary}"
    )
}

/// Asks for a Markdown quiz bank (`###` question, **Answer**, **Explanation**).
pub fn bank_markdown<G: Gateway + ?Sized>(
    gateway: &G,
    summary: &str,
) -> Result<String, GenerationError> {
    gateway.generate(&bank_prompt(summary))
}

use crate::highlight::HighlightDocument;
use crate::llm::{Gateway, GenerationError};

const MARKDOWN_RULES: &str = "Output rules:\n\
- Output Markdown only.\n\
- Do not write any preamble, closing remark, or explanation unrelated to the summary.\n\
- Organize the summary with headings and bullet lists where helpful.\n\
- Write in the same language as the source text.\n";

pub fn transcript_prompt(lines: &[String]) -> String {
    format!(
        "The following text is the transcript of a YouTube video. Summarize it.\n\
\n\
{MARKDOWN_RULES}\n\
{}",
        lines.join("\n")
    )
}

pub fn highlights_prompt(highlights_md: &str) -> String {
    format!(
        "The following Markdown list contains highlights taken from a book. Summarize it.\n\
\n\
{MARKDOWN_RULES}\n\
{highlights_md}"
    )
}

/// Summarizes cleaned caption lines. The response is returned as-is; it is
/// not checked to be Markdown.
pub fn summarize_transcript<G: Gateway + ?Sized>(
    gateway: &G,
    lines: &[String],
) -> Result<String, GenerationError> {
    gateway.generate(&transcript_prompt(lines))
}

pub fn summarize_highlights<G: Gateway + ?Sized>(
    gateway: &G,
    doc: &HighlightDocument,
) -> Result<String, GenerationError> {
    gateway.generate(&highlights_prompt(&doc.to_markdown()))
}

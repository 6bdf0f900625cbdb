use std::path::Path;

use crate::sanitize::sanitize;

/// Full-width stand-ins yt-dlp writes into file names for characters that are
/// unsafe on disk, paired with the character each one replaces.
const YTDLP_SUBSTITUTES: &[(char, char)] = &[
    ('\u{FF02}', '"'),
    ('\u{FF0A}', '*'),
    ('\u{FF1A}', ':'),
    ('\u{FF1C}', '<'),
    ('\u{FF1E}', '>'),
    ('\u{FF1F}', '?'),
    ('\u{FF5C}', '|'),
    ('\u{29F8}', '/'),
    ('\u{29F9}', '\\'),
];

/// Returns the spoken-text lines of an SRT document, in order.
///
/// Timing lines, blank separators and the cue index that precedes each
/// timing line are dropped. A cue with several text lines contributes each
/// of them.
pub fn spoken_lines(srt: &str) -> Vec<String> {
    let lines = srt
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .collect::<Vec<_>>();

    let mut spoken = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.is_empty() || is_timing(line) {
            continue;
        }
        if is_cue_index(line) && lines.get(idx + 1).is_some_and(|next| is_timing(next)) {
            continue;
        }
        spoken.push((*line).to_owned());
    }
    spoken
}

fn is_cue_index(line: &str) -> bool {
    line.bytes().all(|b| b.is_ascii_digit())
}

fn is_timing(line: &str) -> bool {
    line.contains("-->")
}

/// Recovers the video title embedded in a caption file name of the form
/// `<title>.<lang>.srt`.
pub fn caption_title(path: &Path, lang: &str) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let suffix = format!(".{lang}.srt");
    let title = file_name.strip_suffix(&suffix)?;
    if title.is_empty() {
        return None;
    }
    Some(title.to_owned())
}

/// Key under which a ledger title and a caption file title are compared.
///
/// Both sides are folded back from yt-dlp's full-width stand-ins before
/// sanitizing, so `Rust: Why?` and the file name `Rust： Why？` agree.
pub fn title_key(title: &str) -> String {
    let folded = title
        .chars()
        .map(|ch| {
            YTDLP_SUBSTITUTES
                .iter()
                .find_map(|&(wide, ascii)| (wide == ch).then_some(ascii))
                .unwrap_or(ch)
        })
        .collect::<String>();
    sanitize(&folded)
}

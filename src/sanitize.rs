const UNSAFE_CHARS: &[char] = &[
    '\\', '/', ':', '*', '?', '"', '<', '>', '|', '¥', '￥', '＜', '＞', '｜',
];

/// Turns a title into a string that is safe to use as a file name stem.
///
/// Every character from the unsafe set becomes `-`, then all whitespace is
/// dropped. Applying it twice yields the same result as applying it once.
#[must_use]
pub fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| if UNSAFE_CHARS.contains(&ch) { '-' } else { ch })
        .collect()
}

//! Lenient parsing of JSON embedded in free-text model output.
//!
//! Models asked for "JSON only" still wrap it in prose or markdown fences
//! from time to time. The content is parsed as-is first; failing that, the
//! span between the first and last bracket of each kind is tried.

use serde::de::DeserializeOwned;

/// Removes a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    let content_start = after_fence.find('\n').map(|nl| nl + 1).unwrap_or(0);
    let content = &after_fence[content_start..];
    match content.find("```") {
        Some(end) => content[..end].trim(),
        None => content.trim(),
    }
}

/// The slice from the first `open` to the last `close`, inclusive.
fn bracketed(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (start < end).then(|| &text[start..=end])
}

/// Candidate JSON slices in the order they should be tried.
pub fn candidates(text: &str) -> Vec<&str> {
    let mut out = vec![text.trim()];
    let unfenced = strip_code_fence(text);
    if unfenced != out[0] {
        out.push(unfenced);
    }
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(span) = bracketed(unfenced, open, close) {
            if !out.contains(&span) {
                out.push(span);
            }
        }
    }
    out
}

/// Parses `text` into `T`, falling back to bracket scanning.
///
/// The error of the first attempt is returned when nothing parses.
pub fn parse_lenient<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let mut tries = candidates(text).into_iter();
    let first = tries.next().unwrap_or_default();
    let first_err = match serde_json::from_str::<T>(first) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    tries
        .find_map(|candidate| serde_json::from_str::<T>(candidate).ok())
        .ok_or(first_err)
}

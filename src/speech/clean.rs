//! Text preparation for speech synthesis
//!
//! Strips markup emphasis, spells out the degree sign and turns line
//! breaks into sentence breaks so the synthesiser pauses between lines.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Markdown emphasis and heading markers
static EMPHASIS_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_~`#]+").unwrap());

/// Degree sign with surrounding spaces
static DEGREE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*°\s*").unwrap());

/// Line breaks, with any sentence punctuation already ending the line
static LINE_BREAK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?:;,])?[ \t]*(?:\r?\n)+\s*").unwrap());

/// Runs of whitespace
static MULTI_SPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Prepare recipe text for reading aloud
pub fn clean_for_speech(text: &str) -> String {
    let text = EMPHASIS_PATTERN.replace_all(text, "");
    let text = DEGREE_PATTERN.replace_all(&text, " degrees ");
    let text = LINE_BREAK_PATTERN.replace_all(text.trim(), |caps: &Captures<'_>| {
        match caps.get(1) {
            Some(punct) => format!("{} ", punct.as_str()),
            None => ". ".to_string(),
        }
    });
    let text = MULTI_SPACE_PATTERN.replace_all(&text, " ");
    text.trim().to_string()
}

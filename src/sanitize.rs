//! Text cleanup applied to raw model output before it is exported.
//!
//! Extraction is best-effort: the returned slice still has to be parsed by the
//! caller. When several bracketed candidates exist, the first `[` is paired with
//! the last `]` of the whole text (greedy), so nested arrays and trailing prose
//! containing a stray `]` are both swallowed into one candidate. Objects are only
//! considered when no array candidate exists.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, instrument};

fn leading_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^```(?:json)?\s*").expect("leading fence pattern"))
}

fn trailing_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```\s*$").expect("trailing fence pattern"))
}

fn array_candidate() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("array pattern"))
}

fn object_candidate() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("object pattern"))
}

/// Replace every German sharp s with "ss".
pub fn normalize_orthography(text: &str) -> String {
    text.replace('ß', "ss")
}

/// Strip Markdown code fences and surrounding prose from a model response,
/// returning the outermost JSON array (or object) candidate.
#[instrument(target = "question_forge::sanitize", skip(raw), fields(raw_len = raw.len()))]
pub fn extract_json_payload(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_lead = leading_fence().replace(trimmed, "");
    let without_fences = trailing_fence().replace(&without_lead, "");
    let cleaned = without_fences.trim();

    if let Some(m) = array_candidate().find(cleaned) {
        debug!(target = "question_forge::sanitize", start = m.start(), end = m.end(), "array candidate");
        return m.as_str().to_string();
    }
    if let Some(m) = object_candidate().find(cleaned) {
        debug!(target = "question_forge::sanitize", start = m.start(), end = m.end(), "object candidate");
        return m.as_str().to_string();
    }
    debug!(target = "question_forge::sanitize", "no bracketed candidate, returning cleaned text");
    cleaned.to_string()
}

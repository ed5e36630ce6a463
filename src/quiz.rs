//! OLAT text export for blank-style questions.
//!
//! Every [`QuestionItem`] is rendered twice: as a fill-in-blank record where the
//! learner types each answer, and as an inline-choice record where each gap is a
//! drop-down over a shared option pool. Records are tab separated `Key\tValue`
//! lines, and records of one batch are separated by a blank line.

use rand::seq::SliceRandom;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::FormatError;
use crate::sanitize::{extract_json_payload, normalize_orthography};

pub const FIB_TITLE: &str = "✏️ Vervollständigen Sie die Lücken mit dem korrekten Begriff. ✏️";
pub const INLINE_CHOICE_TITLE: &str = "Wörter einordnen";
pub const INLINE_CHOICE_QUESTION: &str = "✏️ Wählen Sie die richtigen Wörter. ✏️";
pub const ANSWER_WEIGHT: u32 = 1;
pub const FIB_TOLERANCE: u32 = 20;
pub const OPTION_SEPARATOR: &str = "|";
pub const DOCUMENT_SEPARATOR: &str = "---";

/// One passage with the correct terms that are cut out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Question Item", description = "A passage with gaps for fill-in-blank and inline-choice questions")]
pub struct QuestionItem {
    /// Passage containing every blank verbatim
    #[serde(default)]
    #[schemars(description = "Full sentence or passage; every blank appears in it verbatim")]
    pub text: String,
    /// Correct terms in order of appearance
    #[serde(default)]
    #[schemars(description = "Correct terms, in the order they appear in text")]
    pub blanks: Vec<String>,
    /// Plausible but wrong alternatives
    #[serde(default)]
    #[schemars(description = "Plausible wrong terms offered as decoys")]
    pub wrong_substitutes: Vec<String>,
}

/// A located blank: byte range in the item text plus the expected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Gap<'a> {
    start: usize,
    end: usize,
    answer: &'a str,
}

impl QuestionItem {
    /// Split `text` around its blanks.
    ///
    /// Each blank, in declaration order, consumes the first occurrence that does
    /// not overlap an occurrence consumed by an earlier blank. The result holds
    /// `blanks.len() + 1` segments and the answers in positional order.
    pub fn segments(&self, item_index: usize) -> Result<(Vec<&str>, Vec<&str>), FormatError> {
        let mut gaps: Vec<Gap<'_>> = Vec::with_capacity(self.blanks.len());

        for blank in &self.blanks {
            let gap = self
                .first_free_occurrence(blank, &gaps)
                .ok_or_else(|| FormatError::BlankNotFound { item_index, blank: blank.clone() })?;
            gaps.push(gap);
        }
        gaps.sort_by_key(|g| g.start);

        let mut segments = Vec::with_capacity(gaps.len() + 1);
        let mut cursor = 0;
        for gap in &gaps {
            segments.push(&self.text[cursor..gap.start]);
            cursor = gap.end;
        }
        segments.push(&self.text[cursor..]);

        let answers = gaps.iter().map(|g| g.answer).collect();
        Ok((segments, answers))
    }

    fn first_free_occurrence<'a>(&self, blank: &'a str, taken: &[Gap<'_>]) -> Option<Gap<'a>> {
        if blank.is_empty() {
            return None;
        }
        let mut from = 0;
        while let Some(offset) = self.text[from..].find(blank) {
            let start = from + offset;
            let end = start + blank.len();
            if taken.iter().all(|g| end <= g.start || start >= g.end) {
                return Some(Gap { start, end, answer: blank });
            }
            // step past the first char of this hit
            from = start + self.text[start..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }
}

/// Both OLAT renderings of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDocument {
    pub fib: String,
    pub inline_choice: String,
}

impl QuizDocument {
    pub fn from_item<R: Rng + ?Sized>(item: &QuestionItem, item_index: usize, rng: &mut R) -> Result<Self, FormatError> {
        let (segments, answers) = item.segments(item_index)?;
        let points = item.blanks.len();

        let mut fib = vec![
            "Type\tFIB".to_string(),
            format!("Title\t{}", FIB_TITLE),
            format!("Points\t{}", points),
        ];
        for (index, segment) in segments.iter().enumerate() {
            fib.push(format!("Text\t{}", segment.trim()));
            if let Some(answer) = answers.get(index) {
                fib.push(format!("{}\t{}\t{}", ANSWER_WEIGHT, answer, FIB_TOLERANCE));
            }
        }

        let mut pool: Vec<&str> = item
            .blanks
            .iter()
            .chain(item.wrong_substitutes.iter())
            .map(String::as_str)
            .collect();
        pool.shuffle(rng);
        let options = pool.join(OPTION_SEPARATOR);

        let mut inline_choice = vec![
            "Type\tInlinechoice".to_string(),
            format!("Title\t{}", INLINE_CHOICE_TITLE),
            format!("Question\t{}", INLINE_CHOICE_QUESTION),
            format!("Points\t{}", points),
        ];
        for (index, segment) in segments.iter().enumerate() {
            inline_choice.push(format!("Text\t{}", segment.trim()));
            if let Some(answer) = answers.get(index) {
                inline_choice.push(format!("{}\t{}\t{}\t{}", ANSWER_WEIGHT, options, answer, OPTION_SEPARATOR));
            }
        }

        Ok(Self {
            fib: fib.join("\n"),
            inline_choice: inline_choice.join("\n"),
        })
    }
}

/// Render a batch of items with the thread-local RNG.
pub fn format_quiz_items(items: &[QuestionItem]) -> Result<(String, String), FormatError> {
    format_quiz_items_with_rng(items, &mut rand::thread_rng())
}

/// Render a batch of items, returning `(fib_text, inline_choice_text)`.
pub fn format_quiz_items_with_rng<R: Rng + ?Sized>(items: &[QuestionItem], rng: &mut R) -> Result<(String, String), FormatError> {
    let mut fib = Vec::with_capacity(items.len());
    let mut inline_choice = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let doc = QuizDocument::from_item(item, index, rng)?;
        fib.push(doc.fib);
        inline_choice.push(doc.inline_choice);
    }
    debug!(target = "question_forge::quiz", items = items.len(), "formatted quiz items");
    Ok((fib.join("\n\n"), inline_choice.join("\n\n")))
}

/// Turn a raw structured model response into the exported text:
/// inline-choice records, a `---` line, then fill-in-blank records.
pub fn transform_structured_response(raw: &str) -> Result<String, FormatError> {
    transform_structured_response_with_rng(raw, &mut rand::thread_rng())
}

#[instrument(target = "question_forge::quiz", skip(raw, rng), fields(raw_len = raw.len()))]
pub fn transform_structured_response_with_rng<R: Rng + ?Sized>(raw: &str, rng: &mut R) -> Result<String, FormatError> {
    let payload = extract_json_payload(raw);
    let items: Vec<QuestionItem> = serde_json::from_str(&payload).map_err(|source| {
        warn!(target = "question_forge::quiz", error = %source, "structured response is not a list of items");
        FormatError::MalformedResponse { source, raw: raw.to_string() }
    })?;

    let (fib, inline_choice) = format_quiz_items_with_rng(&items, rng)?;
    Ok(format!(
        "{}\n{}\n{}",
        normalize_orthography(&inline_choice),
        DOCUMENT_SEPARATOR,
        normalize_orthography(&fib)
    ))
}

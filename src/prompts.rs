//! Prompt templates and prompt composition.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use schemars::schema_for;
use tracing::debug;

use crate::catalog::{QuestionType, TargetLevel};
use crate::quiz::QuestionItem;

const LEVEL_MARKER: &str = "[ZIELNIVEAU_INJECTION]";

const SYSTEM_PROMPT_TEMPLATE: &str = "Du bist ein Experte im Bildungsbereich, spezialisiert auf die Erstellung von Testfragen und -antworten.

# Zielniveaus
[ZIELNIVEAU_INJECTION]

Achte stets darauf, dass die Formulierungen und kognitiven Anforderungen dem Niveau des vorgesehenen Lernendenkreises entsprechen.";

/// System prompt with the level descriptor filled in.
pub fn system_prompt(level: TargetLevel) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace(LEVEL_MARKER, level.descriptor())
}

/// Template followed by the source text and the learning goals. The structured
/// type additionally carries a JSON schema of the expected items.
pub fn compose_prompt(question_type: QuestionType, template: &str, source_text: &str, learning_goals: &str) -> String {
    let prompt = format!("{}\n\nBenutzereingabe: {}\n\nLernziele: {}", template, source_text, learning_goals);
    if question_type.is_structured() {
        add_schema_guidance(prompt)
    } else {
        prompt
    }
}

fn add_schema_guidance(prompt: String) -> String {
    let schema = schema_for!(Vec<QuestionItem>);
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "Schema serialization failed".to_string());

    format!(
        "{}\n\n## Response Format\nRespond with a JSON array matching this schema:\n```json\n{}\n```",
        prompt, schema_json
    )
}

/// Reads `<dir>/<question_type>.md` once per session.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
    loaded: HashMap<QuestionType, String>,
}

impl PromptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), loaded: HashMap::new() }
    }

    /// Library with templates supplied in memory.
    pub fn from_templates<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = (QuestionType, S)>,
        S: Into<String>,
    {
        Self {
            dir: PathBuf::new(),
            loaded: templates.into_iter().map(|(t, s)| (t, s.into())).collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, question_type: QuestionType) -> PathBuf {
        self.dir.join(format!("{}.md", question_type.id()))
    }

    pub async fn template(&mut self, question_type: QuestionType) -> std::io::Result<&str> {
        if !self.loaded.contains_key(&question_type) {
            let path = self.path_for(question_type);
            let text = tokio::fs::read_to_string(&path).await?;
            debug!(question_type = %question_type, path = %path.display(), "Loaded prompt template");
            self.loaded.insert(question_type, text);
        }
        Ok(self.loaded.get(&question_type).map(String::as_str).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_descriptor_is_injected() {
        let prompt = system_prompt(TargetLevel::C2);
        assert!(prompt.contains("C2 (Master/Expertenniveau)"));
        assert!(!prompt.contains(LEVEL_MARKER));
    }

    #[test]
    fn composed_prompt_carries_input_and_goals() {
        let prompt = compose_prompt(QuestionType::Kprim, "TEMPLATE", "Quelltext", "Ziele");
        assert_eq!(prompt, "TEMPLATE\n\nBenutzereingabe: Quelltext\n\nLernziele: Ziele");
    }

    #[test]
    fn structured_prompt_carries_schema() {
        let prompt = compose_prompt(QuestionType::InlineFib, "T", "S", "");
        assert!(prompt.contains("wrong_substitutes"));
    }

    #[tokio::test]
    async fn missing_template_is_an_io_error() {
        let mut library = PromptLibrary::new("/nonexistent/prompt/dir");
        assert!(library.template(QuestionType::Truefalse).await.is_err());
    }
}

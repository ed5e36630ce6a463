#[derive(Debug, Clone, PartialEq, Default)]
pub enum OpenAIModel {
    #[default]
    Gpt4o,
    Gpt41,
    O4Mini,
    Override(String),
}

impl OpenAIModel {
    pub const OPTIONS: [OpenAIModel; 3] = [Self::Gpt4o, Self::Gpt41, Self::O4Mini];

    pub fn id(&self) -> &str {
        match self {
            Self::Gpt4o => "gpt-4o",
            Self::Gpt41 => "gpt-4.1",
            Self::O4Mini => "o4-mini",
            Self::Override(s) => s.as_str(),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Gpt4o => "OpenAI GPT-4o",
            Self::Gpt41 => "OpenAI GPT-4.1",
            Self::O4Mini => "OpenAI o4-mini (reasoning)",
            Self::Override(_) => "OpenAI (override)",
        }
    }

    /// Known ids map to their variant, anything else becomes an override.
    pub fn from_id(id: &str) -> Self {
        let id = id.trim();
        Self::OPTIONS
            .iter()
            .find(|m| m.id().eq_ignore_ascii_case(id))
            .cloned()
            .unwrap_or_else(|| Self::Override(id.to_string()))
    }

    /// Models served through the responses API with a reasoning-effort setting.
    pub fn uses_reasoning_effort(&self) -> bool {
        matches!(self, Self::O4Mini)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_resolve_to_variants() {
        assert_eq!(OpenAIModel::from_id("o4-mini"), OpenAIModel::O4Mini);
        assert_eq!(OpenAIModel::from_id("GPT-4.1"), OpenAIModel::Gpt41);
        assert_eq!(OpenAIModel::from_id("gpt-5"), OpenAIModel::Override("gpt-5".into()));
        assert!(OpenAIModel::O4Mini.uses_reasoning_effort());
        assert!(!OpenAIModel::Gpt4o.uses_reasoning_effort());
    }
}

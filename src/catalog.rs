//! Fixed catalogs: question types, output languages, target levels and
//! reasoning-effort settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice1,
    MultipleChoice2,
    MultipleChoice3,
    Kprim,
    Truefalse,
    Draganddrop,
    InlineFib,
}

impl QuestionType {
    pub const ALL: [QuestionType; 8] = [
        Self::SingleChoice,
        Self::MultipleChoice1,
        Self::MultipleChoice2,
        Self::MultipleChoice3,
        Self::Kprim,
        Self::Truefalse,
        Self::Draganddrop,
        Self::InlineFib,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::SingleChoice => "single_choice",
            Self::MultipleChoice1 => "multiple_choice1",
            Self::MultipleChoice2 => "multiple_choice2",
            Self::MultipleChoice3 => "multiple_choice3",
            Self::Kprim => "kprim",
            Self::Truefalse => "truefalse",
            Self::Draganddrop => "draganddrop",
            Self::InlineFib => "inline_fib",
        }
    }

    /// Whether the model answers this type with blank-style JSON items.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::InlineFib)
    }

    /// Human readable label: underscores become spaces, words are capitalized.
    /// The structured type is marked as post-processed.
    pub fn label(&self) -> String {
        let title = title_case(&self.id().replace('_', " "));
        if self.is_structured() {
            format!("{} (Verarbeitet)", title)
        } else {
            title
        }
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.id() == s.trim().to_lowercase())
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::ALL.iter().map(|t| t.id()).collect();
                format!("Unknown question type: '{}'. Supported: {}", s, supported.join(", "))
            })
    }
}

/// Output language of the generated questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    German,
    English,
    French,
    Italian,
    Spanish,
}

impl Language {
    /// Name passed to the model.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::German => "German",
            Self::English => "English",
            Self::French => "French",
            Self::Italian => "Italian",
            Self::Spanish => "Spanish",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::German => "Deutsch",
            Self::English => "Englisch",
            Self::French => "Französisch",
            Self::Italian => "Italienisch",
            Self::Spanish => "Spanisch",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "german" | "deutsch" | "de" => Ok(Self::German),
            "english" | "englisch" | "en" => Ok(Self::English),
            "french" | "französisch" | "fr" => Ok(Self::French),
            "italian" | "italienisch" | "it" => Ok(Self::Italian),
            "spanish" | "spanisch" | "es" => Ok(Self::Spanish),
            _ => Err(format!("Unknown language: '{}'", s)),
        }
    }
}

/// Target audience level (CEFR-style) injected into the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetLevel {
    A2,
    B1,
    #[default]
    B2,
    C1,
    C2,
}

impl TargetLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::A2 => "A2 (elementar / Primarstufe, frühe Sek I)",
            Self::B1 => "B1 (untere Sek II, Berufsschule, Realschule)",
            Self::B2 => "B2 (obere Sek II, Maturität, Bachelorbeginn)",
            Self::C1 => "C1 (Bachelor/Master, Hochschulreife)",
            Self::C2 => "C2 (Master/Expertenniveau)",
        }
    }

    /// Instruction block describing the expected language complexity.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Self::A2 => "🟢 A2 (elementar / Primarstufe, frühe Sek I)\nVerwende einfache Satzstrukturen und grundlegenden Wortschatz. Die Fragen sollen sich auf vertraute Alltagssituationen beziehen. Verwende visuelle Hilfen, wenn möglich. Halte die Fragen kurz und klar. Vermeide abstrakte Begriffe.",
            Self::B1 => "🔵 B1 (untere Sek II, Berufsschule, Realschule)\nVerwende alltagsnahes, aber anspruchsvolleres Vokabular. Die Fragen sollen einfache Schlussfolgerungen und erste Transferleistungen ermöglichen. Verwende konkrete Kontexte (z. B. Schule, Arbeit, Freizeit). Halte sprachliche Komplexität moderat.",
            Self::B2 => "🟡 B2 (obere Sek II, Maturität, Bachelorbeginn)\nVerwende akademisch orientierten Wortschatz und moderate sprachliche Komplexität. Die Fragen sollen analytisches und kritisches Denken fördern. Es sind auch hypothetische Szenarien erlaubt. Fremdwörter können vorkommen, aber sollten kontextuell erschließbar sein.",
            Self::C1 => "🟠 C1 (Bachelor/Master, Hochschulreife)\nVerwende komplexe Satzstrukturen und einen gehobenen, akademischen Sprachstil. Die Fragen sollen Argumentation, Bewertung und Synthese fördern. Die Lernenden sollen eigenständig Thesen entwickeln und verschiedene Perspektiven vergleichen können.",
            Self::C2 => "🔴 C2 (Master/Expertenniveau)\nVerwende präzise, abstrakte und komplexe Sprache. Die Fragen sollen kreative, originelle Denkprozesse anregen und fächerübergreifende Kompetenzen einbeziehen. Es wird ein hohes Maß an Autonomie und metakognitivem Denken vorausgesetzt.",
        }
    }
}

impl FromStr for TargetLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            "C2" => Ok(Self::C2),
            _ => Err(format!("Unknown target level: '{}'. Supported: A2, B1, B2, C1, C2", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    #[default]
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for ReasoningEffort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown reasoning effort: '{}'. Supported: low, medium, high", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_title_case() {
        assert_eq!(QuestionType::SingleChoice.label(), "Single Choice");
        assert_eq!(QuestionType::MultipleChoice2.label(), "Multiple Choice2");
        assert_eq!(QuestionType::Truefalse.label(), "Truefalse");
        assert_eq!(QuestionType::InlineFib.label(), "Inline Fib (Verarbeitet)");
    }

    #[test]
    fn question_type_round_trips_through_id() {
        for t in QuestionType::ALL {
            assert_eq!(t.id().parse::<QuestionType>().unwrap(), t);
        }
        assert!("essay".parse::<QuestionType>().is_err());
    }
}

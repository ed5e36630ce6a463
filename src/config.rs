use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::catalog::{Language, ReasoningEffort, TargetLevel};
use crate::clients::openai::models::OpenAIModel;

/// Trait for types that can retrieve their configuration key from environment variables
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Find the API key by checking environment variables first, then .env file
    fn find_key() -> Option<String> {
        // First try to load .env file (silently fail if not found)
        let _ = dotenvy::dotenv();

        env::var(Self::KEY_NAME).ok().filter(|k| !k.trim().is_empty())
    }
}

/// Settings for one generation session.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub model: OpenAIModel,
    pub language: Language,
    pub level: TargetLevel,
    pub reasoning_effort: ReasoningEffort,
    /// Directory holding `<question_type>.md` prompt templates
    pub prompts_dir: PathBuf,
    /// When set, every fresh prompt/response pair is written here
    pub transcript_dir: Option<PathBuf>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: OpenAIModel::default(),
            language: Language::default(),
            level: TargetLevel::default(),
            reasoning_effort: ReasoningEffort::default(),
            prompts_dir: PathBuf::from("prompts"),
            transcript_dir: None,
            max_tokens: 15000,
            temperature: 0.4,
        }
    }
}

impl GeneratorConfig {
    /// Defaults overridden by `QF_*` variables. Unparseable values are logged
    /// and ignored.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let default = Self::default();
        Self {
            model: env::var("QF_MODEL").map(|m| OpenAIModel::from_id(&m)).unwrap_or(default.model),
            language: parsed_var("QF_LANGUAGE").unwrap_or(default.language),
            level: parsed_var("QF_LEVEL").unwrap_or(default.level),
            reasoning_effort: parsed_var("QF_REASONING_EFFORT").unwrap_or(default.reasoning_effort),
            prompts_dir: env::var("QF_PROMPTS_DIR").map(PathBuf::from).unwrap_or(default.prompts_dir),
            transcript_dir: env::var("QF_TRANSCRIPT_DIR").ok().map(PathBuf::from),
            ..default
        }
    }
}

fn parsed_var<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(var = name, error = %e, "Ignoring invalid configuration value");
            None
        }
    }
}

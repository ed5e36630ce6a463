use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use question_forge::catalog::{Language, QuestionType, ReasoningEffort, TargetLevel};
use question_forge::clients::{OpenAIClient, OpenAIConfig, OpenAIModel};
use question_forge::config::{GeneratorConfig, KeyFromEnv};
use question_forge::error::GenerationError;
use question_forge::interceptors::FileInterceptor;
use question_forge::media::{process_uploads, UploadedFile};
use question_forge::prompts::PromptLibrary;
use question_forge::{GenerationRequest, QuestionGenerator};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "📝 Generate OLAT quiz questions from documents and images", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    OPENAI_API_KEY       API key (also read from .env)
    QF_MODEL             gpt-4o | gpt-4.1 | o4-mini
    QF_LANGUAGE          German | English | French | Italian | Spanish
    QF_LEVEL             A2 | B1 | B2 (default) | C1 | C2
    QF_REASONING_EFFORT  low | medium | high (o4-mini only)
    QF_PROMPTS_DIR       directory with <question_type>.md templates
    QF_TRANSCRIPT_DIR    write prompt/response transcripts here

EXAMPLES:
    question-forge --file skript.pdf --type single_choice --type inline_fib
    question-forge --text \"Paris is the capital of France\" --type inline_fib --language english")]
struct Args {
    /// Source files: one PDF/DOCX or up to 10 images
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    /// Source text (appended after text extracted from files)
    #[arg(long)]
    text: Option<String>,

    /// Optional learning goals
    #[arg(long, default_value = "")]
    goals: String,

    /// Question types to generate, in output order
    #[arg(short = 't', long = "type", required = true)]
    types: Vec<QuestionType>,

    /// Model id [default: QF_MODEL or gpt-4o]
    #[arg(short, long)]
    model: Option<String>,

    /// Output language [default: QF_LANGUAGE or German]
    #[arg(short, long)]
    language: Option<Language>,

    /// Target level [default: QF_LEVEL or B2]
    #[arg(long)]
    level: Option<TargetLevel>,

    /// Reasoning effort for reasoning models
    #[arg(long)]
    reasoning_effort: Option<ReasoningEffort>,

    /// Prompt template directory
    #[arg(long)]
    prompts_dir: Option<PathBuf>,

    /// Where to write the combined document
    #[arg(short, long, default_value = "alle_antworten.txt")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = GeneratorConfig::from_env();
    if let Some(model) = &args.model {
        config.model = OpenAIModel::from_id(model);
    }
    if let Some(language) = args.language {
        config.language = language;
    }
    if let Some(level) = args.level {
        config.level = level;
    }
    if let Some(effort) = args.reasoning_effort {
        config.reasoning_effort = effort;
    }
    if let Some(dir) = &args.prompts_dir {
        config.prompts_dir = dir.clone();
    }

    let uploads = args
        .files
        .iter()
        .map(|path| UploadedFile::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;
    let content = process_uploads(&uploads).context("Failed to process uploaded files")?;

    let mut source_text = content.text;
    if let Some(text) = &args.text {
        if !source_text.is_empty() {
            source_text.push_str("\n\n");
        }
        source_text.push_str(text);
    }

    let api_key = OpenAIConfig::find_key().unwrap_or_default();
    let client = OpenAIClient::new(OpenAIConfig::new(api_key, &config));
    let mut generator = QuestionGenerator::new(client, PromptLibrary::new(config.prompts_dir.clone()));
    if let Some(dir) = &config.transcript_dir {
        let interceptor = FileInterceptor::new(dir.clone());
        info!(dir = %interceptor.base_path().display(), "Writing prompt transcripts");
        generator = generator.with_interceptor(Arc::new(interceptor));
    }

    println!("🤖 Modell: {} ({:?})", config.model.display_name(), generator.backend().kind());
    println!("🌐 Sprache: {}", config.language.display_name());
    println!("🎯 Zielniveau: {}", config.level.label());

    let request = GenerationRequest::new(args.types.clone(), source_text)
        .with_learning_goals(args.goals.clone())
        .with_images(content.images)
        .with_language(config.language)
        .with_level(config.level);

    let result = generator.generate(&request).await?;

    println!("Generierter Inhalt:");
    for output in &result.outputs {
        let origin = if output.from_cache { " (Cache)" } else { "" };
        println!("✔️ {}{}", output.label, origin);
    }
    for failure in &result.failures {
        eprintln!("❌ {}: {}", failure.question_type.label(), failure.error);
        if let GenerationError::Format { source, .. } = &failure.error {
            if let Some(raw) = source.raw_response() {
                eprintln!("--- Fehlerhafter JSON-String ---\n{}", raw);
            }
        }
    }

    if !result.is_empty() {
        tokio::fs::write(&args.output, &result.document)
            .await
            .with_context(|| format!("Failed to write {}", args.output.display()))?;
        info!(path = %args.output.display(), "Wrote combined document");
    }

    Ok(())
}

use anyhow::{bail, Context, Result};
use fluent_translator::languages::LanguageRegistry;
use fluent_translator::{OpenAiTranslator, Translator, TranslatorConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage:\n  fluent-translator -a            Translate every configured dictionary\n  fluent-translator -c <code>     Translate one language";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    TranslateAll,
    TranslateOne(String),
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [flag] if flag == "-a" => Ok(Command::TranslateAll),
        [flag, code] if flag == "-c" => Ok(Command::TranslateOne(code.clone())),
        _ => bail!("Invalid arguments\n{}", USAGE),
    }
}

/// `RUST_LOG` wins when set; otherwise only this crate logs, at `default_level`.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fluent_translator={}", default_level)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Invalid argument combinations abort before any work
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let config_path = TranslatorConfig::default_path();
    let config = TranslatorConfig::load(&config_path)?;

    // Progress and cost lines are info-level; `logs: false` hides them
    let default_level = if config.logs { "info" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(env_filter(default_level)).init();

    let source_name = LanguageRegistry::get()
        .name_for(&config.source_language)
        .map(str::to_string)
        .unwrap_or_else(|_| config.source_language.clone());
    let provider = OpenAiTranslator::from_config(&config, &source_name)?;
    let translator = Translator::new(config, provider).context("Invalid configuration")?;

    match command {
        Command::TranslateOne(code) => {
            let outcome = translator
                .translate(&code)
                .await
                .with_context(|| format!("Failed to translate {}", code))?;
            info!(
                "{}: {} keys written to {}",
                outcome.language_code,
                outcome.translated_keys,
                outcome.path.display()
            );
        }
        Command::TranslateAll => {
            let codes = translator.config().target_languages();
            let report = translator.bulk_translate(&codes).await?;

            if !report.is_success() {
                let failed: Vec<_> = report
                    .failed
                    .iter()
                    .map(|failure| format!("{} ({})", failure.language_code, failure.error))
                    .collect();
                bail!("Translation failed for: {}", failed.join(", "));
            }
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use multilang_translator::error::ConfigError;
use multilang_translator::config::{ServiceConfig, TranslationConfig};
use multilang_translator::events::DEFAULT_POLL_INTERVAL;
use multilang_translator::i18n::{Language, LanguageRegistry};
use multilang_translator::openai::OpenAiTranslator;
use multilang_translator::orchestrator::{InputSource, Orchestrator, RunOutcome, TranslationRequest};
use multilang_translator::output;
use multilang_translator::render::TerminalRenderer;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Translate text or a file into several languages, one request per language
#[derive(Parser, Debug)]
#[command(name = "multilang-translator", version, about)]
struct Cli {
    /// Text to translate (read from stdin when neither --text nor --file is given)
    #[arg(short, long, conflicts_with = "file")]
    text: Option<String>,

    /// File to translate; outputs are written next to it
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Target language by name, e.g. -l 日语 -l 法语 (order is kept)
    #[arg(short = 'l', long = "lang", value_name = "LANGUAGE")]
    languages: Vec<String>,

    /// Translate into every supported language
    #[arg(long, conflicts_with = "languages")]
    all: bool,

    /// Model name (overrides OPENAI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// System prompt template containing {lang}
    #[arg(long)]
    prompt_template: Option<String>,

    /// Sampling temperature (overrides TRANSLATION_TEMPERATURE)
    #[arg(long)]
    temperature: Option<String>,

    /// Extra requirements appended to the system prompt
    #[arg(short = 'r', long)]
    requirements: Option<String>,

    /// Print the supported languages and exit
    #[arg(long)]
    list_languages: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("multilang_translator=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_languages {
        for language in LanguageRegistry::get().list_all() {
            if language.code.is_empty() {
                println!("{}", language.name);
            } else {
                println!("{}\t{}", language.name, language.code);
            }
        }
        return Ok(());
    }

    // Resolved before any input is read so a bad language list fails fast
    let languages = target_languages(&cli)?;

    let service = ServiceConfig::from_env()?;

    let config = TranslationConfig::new(
        cli.model.unwrap_or_else(|| service.model.clone()),
        cli.prompt_template
            .unwrap_or_else(|| service.prompt_template.clone()),
        cli.temperature.as_deref().unwrap_or(&service.temperature),
        cli.requirements,
    )?;

    let (source_text, input) = match cli.file {
        Some(path) => (output::read_input(&path).await?, InputSource::File(path)),
        None => {
            let text = match cli.text {
                Some(text) => text,
                None => {
                    let mut text = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut text)
                        .await
                        .context("Failed to read text from stdin")?;
                    text
                }
            };
            (text, InputSource::Text)
        }
    };

    let request = TranslationRequest::new(source_text, languages, config, input)?;

    let translator = Arc::new(OpenAiTranslator::new(&service));
    let orchestrator = Orchestrator::new(translator);

    let mut handle = orchestrator.start(request)?;

    // Ctrl-C stops before the next language; the request in flight still completes
    let stop = handle.stop_signal();
    tokio::spawn(async move {
        let ctrl_c = || async { tokio::signal::ctrl_c().await.is_ok() };
        if watch_interrupts(ctrl_c, stop).await {
            std::process::exit(130);
        }
    });

    let mut renderer = TerminalRenderer::stdio();
    handle
        .events
        .poll_until_done(DEFAULT_POLL_INTERVAL, &mut renderer)
        .await;

    match handle.join().await? {
        RunOutcome::Completed(usage) => info!(
            "Translated into {} language(s), {} error(s), {} tokens",
            usage.len(),
            renderer.error_count(),
            usage.total()
        ),
        RunOutcome::Cancelled => info!("Translation stopped"),
    }

    Ok(())
}

/// Languages from `--all` or the `-l` list, in the order given.
fn target_languages(cli: &Cli) -> Result<Vec<Language>, ConfigError> {
    let languages = if cli.all {
        Language::all()
    } else {
        Language::parse_list(&cli.languages)?
    };
    if languages.is_empty() {
        return Err(ConfigError::NoTargetLanguages);
    }
    Ok(languages)
}

/// First interrupt cancels `stop`; returns true when a second one arrives.
///
/// `next_interrupt` resolves to false once no more interrupts can be delivered.
async fn watch_interrupts<F, Fut>(mut next_interrupt: F, stop: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    if !next_interrupt().await {
        return false;
    }
    warn!("Stop requested, finishing the current language (Ctrl-C again to quit)");
    stop.cancel();

    if !next_interrupt().await {
        return false;
    }
    warn!("Second interrupt, exiting");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("multilang-translator").chain(args.iter().copied()))
            .unwrap()
    }

    // ==================== Language Selection Tests ====================

    #[test]
    fn test_missing_languages_rejected_before_input() {
        let cli = parse(&[]);
        assert_eq!(
            target_languages(&cli),
            Err(ConfigError::NoTargetLanguages)
        );
    }

    #[test]
    fn test_languages_keep_cli_order() {
        let cli = parse(&["--text", "Hello", "-l", "法语", "-l", "日语"]);
        let names: Vec<_> = target_languages(&cli)
            .unwrap()
            .iter()
            .map(|l| l.name())
            .collect();
        assert_eq!(names, vec!["法语", "日语"]);
    }

    #[test]
    fn test_all_selects_every_language() {
        let cli = parse(&["--all"]);
        assert_eq!(target_languages(&cli).unwrap(), Language::all());
    }

    #[test]
    fn test_unknown_language_rejected() {
        let cli = parse(&["-l", "火星语"]);
        assert_eq!(
            target_languages(&cli),
            Err(ConfigError::UnknownLanguage("火星语".to_string()))
        );
    }

    // ==================== Interrupt Tests ====================

    type Interrupt = std::pin::Pin<Box<dyn Future<Output = bool> + Send>>;

    /// Each call resolves once `notify` fires
    fn notified(notify: &Arc<Notify>) -> impl FnMut() -> Interrupt + Send + 'static {
        let notify = Arc::clone(notify);
        move || {
            let notify = Arc::clone(&notify);
            Box::pin(async move {
                notify.notified().await;
                true
            })
        }
    }

    #[tokio::test]
    async fn test_first_interrupt_stops_second_exits() {
        let notify = Arc::new(Notify::new());
        let stop = CancellationToken::new();
        let watcher = tokio::spawn(watch_interrupts(notified(&notify), stop.clone()));

        notify.notify_one();
        tokio::time::timeout(Duration::from_secs(1), stop.cancelled())
            .await
            .unwrap();
        assert!(!watcher.is_finished());

        notify.notify_one();
        let exit = tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .unwrap()
            .unwrap();
        assert!(exit);
    }

    #[tokio::test]
    async fn test_unavailable_signal_neither_stops_nor_exits() {
        let stop = CancellationToken::new();
        let exit = watch_interrupts(|| async { false }, stop.clone()).await;
        assert!(!exit);
        assert!(!stop.is_cancelled());
    }
}

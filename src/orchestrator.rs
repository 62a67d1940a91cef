//! The translation run: one request per target language, strictly in order.
//!
//! A run checks its stop signal before each language, never while a request is
//! in flight. Per-language failures become `Error` events and the run moves on;
//! only invalid input (rejected when the request is built) prevents a run.
//! `TokenStats` is emitted only when every language was attempted, and `Done`
//! always ends the event sequence.

use crate::config::TranslationConfig;
use crate::error::{ConfigError, RunError, TranslationError};
use crate::events::{self, EventSink, EventStream, OrchestrationEvent};
use crate::i18n::Language;
use crate::openai::Translator;
use crate::output;
use crate::usage::UsageRecord;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Where the source text came from, which decides how translations are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Typed text: translations are emitted as events
    Text,
    /// A file: translations are written next to it
    File(PathBuf),
}

/// Immutable input for one run.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    source_text: String,
    target_languages: Vec<Language>,
    config: TranslationConfig,
    input: InputSource,
}

impl TranslationRequest {
    pub fn new(
        source_text: impl Into<String>,
        target_languages: Vec<Language>,
        config: TranslationConfig,
        input: InputSource,
    ) -> Result<Self, ConfigError> {
        let source_text = source_text.into();
        // File contents are taken as-is; only typed text is trimmed
        let empty = match &input {
            InputSource::Text => source_text.trim().is_empty(),
            InputSource::File(_) => source_text.is_empty(),
        };
        if empty {
            return Err(ConfigError::EmptyInput);
        }
        if target_languages.is_empty() {
            return Err(ConfigError::NoTargetLanguages);
        }
        Ok(Self {
            source_text,
            target_languages,
            config,
            input,
        })
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn target_languages(&self) -> &[Language] {
        &self.target_languages
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn input(&self) -> &InputSource {
        &self.input
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every language was attempted; usage of the successful ones
    Completed(UsageRecord),
    /// The stop signal was observed before all languages were attempted
    Cancelled,
}

// Owned by a single `run` call and dropped with it.
#[derive(Default)]
struct RunState {
    usage: UsageRecord,
}

/// Drives translation runs through a `Translator`, one run at a time.
#[derive(Clone)]
pub struct Orchestrator {
    translator: Arc<dyn Translator>,
    active: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self {
            translator,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a run started with [`Orchestrator::start`] is still executing.
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Run the loop to completion on the current task, emitting into `sink`.
    pub async fn run(
        &self,
        request: &TranslationRequest,
        sink: &EventSink,
        stop: &CancellationToken,
    ) -> RunOutcome {
        let mut state = RunState::default();
        let total = request.target_languages.len();

        info!(
            "Starting translation run: {} language(s) with model {}",
            total, request.config.model
        );

        for (i, &language) in request.target_languages.iter().enumerate() {
            if stop.is_cancelled() {
                info!(
                    "Translation stopped before {} ({}/{} attempted)",
                    language, i, total
                );
                sink.emit(OrchestrationEvent::Done);
                return RunOutcome::Cancelled;
            }

            match self.translate_one(request, language, stop, sink).await {
                Ok(tokens) => {
                    info!("{} translated ({} tokens)", language, tokens);
                    state.usage.insert(language.name(), tokens);
                }
                // Stop landed between our check and the client's; nothing was sent
                Err(TranslationError::Stopped) => {
                    info!(
                        "Translation stopped before {} ({}/{} attempted)",
                        language, i, total
                    );
                    sink.emit(OrchestrationEvent::Done);
                    return RunOutcome::Cancelled;
                }
                Err(e) => {
                    warn!("{} translation failed: {}", language, e);
                    sink.emit(OrchestrationEvent::Error(format!(
                        "{}翻译过程中出现错误: {}",
                        language, e
                    )));
                }
            }

            sink.emit(OrchestrationEvent::Progress(
                (i + 1) as f64 / total as f64 * 100.0,
            ));
        }

        let total_tokens = state.usage.total();
        info!(
            "Translation run finished: {}/{} language(s), {} tokens",
            state.usage.len(),
            total,
            total_tokens
        );

        sink.emit(OrchestrationEvent::TokenStats {
            usage: state.usage.clone(),
            total: total_tokens,
        });
        sink.emit(OrchestrationEvent::Done);

        RunOutcome::Completed(state.usage)
    }

    /// Translate and deliver one language, returning its token usage.
    async fn translate_one(
        &self,
        request: &TranslationRequest,
        language: Language,
        stop: &CancellationToken,
        sink: &EventSink,
    ) -> Result<usize, TranslationError> {
        let translation = self
            .translator
            .translate(&request.source_text, language, &request.config, stop)
            .await?;

        match &request.input {
            InputSource::File(path) => {
                let saved = output::save_translation(path, language, &translation.text).await?;
                sink.emit(OrchestrationEvent::Log(format!(
                    "{}翻译完成，已存为: {}",
                    language, saved
                )));
            }
            InputSource::Text => {
                sink.emit(OrchestrationEvent::Translation {
                    language: language.name().to_string(),
                    text: translation.text,
                });
            }
        }

        Ok(translation.tokens)
    }

    /// Spawn a run in the background.
    ///
    /// Fails with [`RunError::AlreadyRunning`] while an earlier run from this
    /// orchestrator is still executing.
    pub fn start(&self, request: TranslationRequest) -> Result<RunHandle, RunError> {
        let guard = ActiveRun::acquire(&self.active)?;
        let (sink, events) = events::channel();
        let stop = CancellationToken::new();

        let orchestrator = self.clone();
        let task_stop = stop.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            orchestrator.run(&request, &sink, &task_stop).await
        });

        Ok(RunHandle { events, stop, task })
    }
}

// Clears the active flag when the background run ends, even on panic.
struct ActiveRun(Arc<AtomicBool>);

impl ActiveRun {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, RunError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RunError::AlreadyRunning)?;
        Ok(ActiveRun(Arc::clone(flag)))
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A run executing in the background.
pub struct RunHandle {
    /// Events of this run, for the consumer to drain
    pub events: EventStream,
    stop: CancellationToken,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// Ask the run to stop before its next language.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// A clone of the stop signal, e.g. for a Ctrl-C handler.
    pub fn stop_signal(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Wait for the background run to finish.
    pub async fn join(self) -> Result<RunOutcome, RunError> {
        Ok(self.task.await?)
    }
}

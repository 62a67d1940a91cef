//! Ordered event channel between a background run and its consumer.
//!
//! The run is the only producer. The consumer drains without ever waiting on
//! the queue: each pass takes whatever is available, dispatches it by tag and
//! returns, and passes repeat on the consumer's own schedule until `Done`.

use crate::usage::UsageRecord;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// Interval between drain passes used by interactive consumers
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub enum OrchestrationEvent {
    /// A translation delivered directly (text input)
    Translation { language: String, text: String },
    /// Percentage of languages attempted so far
    Progress(f64),
    Log(String),
    Error(String),
    TokenStats { usage: UsageRecord, total: usize },
    Done,
}

/// Create a connected sink/stream pair for one run.
pub fn channel() -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventSink { tx },
        EventStream {
            rx,
            finished: false,
        },
    )
}

/// Producer side, owned by the orchestration loop.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<OrchestrationEvent>,
}

impl EventSink {
    pub fn emit(&self, event: OrchestrationEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event consumer went away; dropping event");
        }
    }
}

/// Per-tag callbacks. Unhandled tags are ignored.
pub trait EventHandler {
    fn on_translation(&mut self, _language: &str, _text: &str) {}
    fn on_progress(&mut self, _percent: f64) {}
    fn on_log(&mut self, _message: &str) {}
    fn on_error(&mut self, _message: &str) {}
    fn on_token_stats(&mut self, _usage: &UsageRecord, _total: usize) {}
    fn on_done(&mut self) {}
}

pub fn dispatch<H: EventHandler + ?Sized>(handler: &mut H, event: &OrchestrationEvent) {
    match event {
        OrchestrationEvent::Translation { language, text } => handler.on_translation(language, text),
        OrchestrationEvent::Progress(percent) => handler.on_progress(*percent),
        OrchestrationEvent::Log(message) => handler.on_log(message),
        OrchestrationEvent::Error(message) => handler.on_error(message),
        OrchestrationEvent::TokenStats { usage, total } => handler.on_token_stats(usage, *total),
        OrchestrationEvent::Done => handler.on_done(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Queue is momentarily empty; drain again later
    Pending,
    /// `Done` was observed (or the producer vanished); stop polling
    Finished,
}

/// Consumer side of the channel.
#[derive(Debug)]
pub struct EventStream {
    rx: UnboundedReceiver<OrchestrationEvent>,
    finished: bool,
}

impl EventStream {
    /// One non-blocking pass: dispatch every event currently queued.
    ///
    /// Nothing after `Done` is dispatched.
    pub fn drain<H: EventHandler + ?Sized>(&mut self, handler: &mut H) -> DrainStatus {
        if self.finished {
            return DrainStatus::Finished;
        }
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    dispatch(handler, &event);
                    if event == OrchestrationEvent::Done {
                        self.finished = true;
                        return DrainStatus::Finished;
                    }
                }
                Err(TryRecvError::Empty) => return DrainStatus::Pending,
                Err(TryRecvError::Disconnected) => {
                    warn!("Event producer closed without sending Done");
                    self.finished = true;
                    return DrainStatus::Finished;
                }
            }
        }
    }

    /// Drain on a fixed interval until `Done`.
    pub async fn poll_until_done<H: EventHandler + ?Sized>(
        &mut self,
        period: Duration,
        handler: &mut H,
    ) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if self.drain(handler) == DrainStatus::Finished {
                break;
            }
        }
    }

    /// Await every event up to and including `Done`.
    pub async fn collect(mut self) -> Vec<OrchestrationEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            let done = event == OrchestrationEvent::Done;
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

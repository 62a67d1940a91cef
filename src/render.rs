//! Terminal rendering of run events.
//!
//! Translations, saved-file logs and the token summary go to `out`; progress
//! and errors go to `err` so stdout can be piped.

use crate::events::EventHandler;
use crate::usage::UsageRecord;
use std::io::Write;
use tracing::error;

pub struct TerminalRenderer<O: Write, E: Write> {
    out: O,
    err: E,
    errors: usize,
}

impl TerminalRenderer<std::io::Stdout, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdout(), std::io::stderr())
    }
}

impl<O: Write, E: Write> TerminalRenderer<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            errors: 0,
        }
    }

    /// Number of `Error` events rendered so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn write_out(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            error!("Failed to write output: {}", e);
        }
    }

    fn write_err(&mut self, text: &str) {
        // Nowhere left to report a failing stderr
        let _ = self.err.write_all(text.as_bytes());
        let _ = self.err.flush();
    }
}

impl<O: Write, E: Write> EventHandler for TerminalRenderer<O, E> {
    fn on_translation(&mut self, language: &str, text: &str) {
        self.write_out(&format!("{} 翻译结果:\n{}\n\n", language, text));
    }

    fn on_progress(&mut self, percent: f64) {
        self.write_err(&format!("进度: {:.1}%\n", percent));
    }

    fn on_log(&mut self, message: &str) {
        self.write_out(&format!("{}\n", message));
    }

    fn on_error(&mut self, message: &str) {
        self.errors += 1;
        self.write_err(&format!("错误: {}\n", message));
    }

    fn on_token_stats(&mut self, usage: &UsageRecord, total: usize) {
        let mut summary = String::from("\n--- 总 Token 统计 ---\n");
        for (language, tokens) in usage.iter() {
            summary.push_str(&format!("{}: {} tokens\n", language, tokens));
        }
        summary.push_str(&format!("\n总计: {} tokens\n", total));
        self.write_out(&summary);
    }
}

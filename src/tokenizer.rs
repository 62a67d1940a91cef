//! Token counting used for per-language usage statistics.
//!
//! Usage is counted locally (system prompt + user text + response) rather than
//! taken from the API response, so the counter is injectable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Counts tokens of `text` as the given model would tokenize it.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str, model: &str) -> usize;
}

/// tiktoken-based counter. Encoders are loaded lazily and cached per model.
///
/// Unknown model names fall back to `cl100k_base`; if no encoder can be
/// loaded at all the heuristic estimate is used.
#[derive(Default)]
pub struct TiktokenCounter {
    encoders: Mutex<HashMap<String, Option<Arc<CoreBPE>>>>,
}

impl TiktokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn encoder_for(&self, model: &str) -> Option<Arc<CoreBPE>> {
        let mut encoders = self
            .encoders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        encoders
            .entry(model.to_string())
            .or_insert_with(|| load_encoder(model).map(Arc::new))
            .clone()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str, model: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.encoder_for(model) {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => estimate_tokens(text),
        }
    }
}

fn load_encoder(model: &str) -> Option<CoreBPE> {
    match tiktoken_rs::get_bpe_from_model(model) {
        Ok(bpe) => Some(bpe),
        Err(e) => {
            debug!("No tiktoken encoding for model '{}' ({}), using cl100k_base", model, e);
            match tiktoken_rs::cl100k_base() {
                Ok(bpe) => Some(bpe),
                Err(e) => {
                    warn!("Failed to load cl100k_base ({}), estimating tokens heuristically", e);
                    None
                }
            }
        }
    }
}

/// Model-independent approximation.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count_tokens(&self, text: &str, _model: &str) -> usize {
        estimate_tokens(text)
    }
}

// ASCII alphanumerics run about 4 chars per token, punctuation tokenizes
// more finely, CJK/kana/hangul about one token per char.
fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let mut sum: f32 = 0.0;
    for ch in text.chars() {
        if ch.is_ascii() {
            if ch.is_ascii_alphanumeric() {
                sum += 0.25;
            } else if ch.is_ascii_whitespace() {
                sum += 0.05;
            } else {
                sum += 0.30;
            }
            continue;
        }
        let cp = ch as u32;
        if is_cjk(cp) || is_kana(cp) || is_hangul(cp) {
            sum += 1.0;
        } else {
            sum += 0.8;
        }
    }
    (sum.round() as usize).max(1)
}

fn is_cjk(cp: u32) -> bool {
    (0x4E00..=0x9FFF).contains(&cp)
        || (0x3400..=0x4DBF).contains(&cp)
        || (0x20000..=0x2A6DF).contains(&cp)
        || (0xF900..=0xFAFF).contains(&cp)
}

fn is_kana(cp: u32) -> bool {
    (0x3040..=0x30FF).contains(&cp)
}

fn is_hangul(cp: u32) -> bool {
    (0xAC00..=0xD7AF).contains(&cp)
}

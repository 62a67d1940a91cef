//! Target language support.
//!
//! - `registry`: the static table of selectable languages and their file-name codes
//! - `language`: the validated `Language` type handed to the translator

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};

//! Reading input files and writing one output file per translated language.

use crate::error::TranslationError;
use crate::i18n::{Language, LanguageRegistry};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Read a whole UTF-8 input file.
pub async fn read_input(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read input file {}", path.display()))
}

/// Output path for `input` translated into `language`.
///
/// A trailing `.{code}` on the file stem is dropped when it is a known
/// language code, then the new code is inserted before the extension:
/// `docs/readme.ja.md` + 法语 → `docs/readme.fr.md`. Languages with an
/// empty code get no suffix.
pub fn output_path(input: &Path, language: Language) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let base = match stem.rsplit_once('.') {
        Some((head, tail)) if LanguageRegistry::get().is_known_code(tail) => head.to_string(),
        _ => stem,
    };

    let mut file_name = base;
    if !language.code().is_empty() {
        file_name.push('.');
        file_name.push_str(language.code());
    }
    if let Some(ext) = input.extension() {
        file_name.push('.');
        file_name.push_str(&ext.to_string_lossy());
    }

    input.with_file_name(file_name)
}

/// Write a translation next to `input`, returning the written file's name.
pub async fn save_translation(
    input: &Path,
    language: Language,
    text: &str,
) -> Result<String, TranslationError> {
    let path = output_path(input, language);
    if path == input {
        warn!("{} output overwrites the input file {}", language, path.display());
    }

    tokio::fs::write(&path, text)
        .await
        .map_err(|source| TranslationError::Output {
            path: path.clone(),
            source,
        })?;

    info!("Saved {} translation to {}", language, path.display());

    Ok(path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default())
}

/*!
 * Answer extraction from raw model output.
 *
 * Models are asked to put their final answer in a triple-backtick fence.
 * Some reason first and fence drafts along the way, so the last fence wins.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::TranslationError;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(.*?)```").unwrap());

/// Trimmed content of the last fenced block in `response`
pub fn extract_answer(response: &str) -> Result<String, TranslationError> {
    FENCED_BLOCK
        .captures_iter(response)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or(TranslationError::Extraction)
}

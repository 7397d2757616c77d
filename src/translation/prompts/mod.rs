/*!
 * Prompt construction for field translation.
 *
 * This module provides:
 * - `{{placeholder}}` templates loaded from text resources
 * - The builder pairing the system prompt with a rendered user prompt
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptSet, PromptTemplate, TranslationPromptBuilder};

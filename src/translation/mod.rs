/*!
 * Translation service for character codex records using chat-completion providers.
 *
 * This module contains the core functionality for translating record fields.
 * It is split into several submodules:
 *
 * - `core`: field job and record translator
 * - `endpoints`: endpoint pool with round-robin selection
 * - `invoker`: single completion call plus debug transcript
 * - `extract`: fenced answer extraction
 * - `retry`: attempt budget, backoff and sleep abstraction
 * - `prompts`: prompt templates and builders
 */

// Re-export main types for easier usage
pub use self::core::CharacterTranslator;
pub use self::endpoints::{Endpoint, EndpointParams, EndpointPool};
pub use self::invoker::CompletionInvoker;
pub use self::retry::{RetryPolicy, Sleeper, TokioSleeper};

// Re-export prompt types
pub use self::prompts::{PromptSet, PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod core;
pub mod endpoints;
pub mod extract;
pub mod invoker;
pub mod prompts;
pub mod retry;

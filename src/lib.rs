/*!
 * # codex-translator
 *
 * Batch translation of character codex records into Chinese through
 * OpenAI-compatible chat-completion endpoints.
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `dataset`: Character records and their JSON file
 * - `script`: Unicode script classification of text
 * - `translation`: Field and record translation:
 *   - `translation::core`: Field job and record translator
 *   - `translation::endpoints`: Round-robin endpoint pool
 *   - `translation::invoker`: Single completion call
 *   - `translation::extract`: Fenced answer extraction
 *   - `translation::retry`: Attempt budget and backoff
 *   - `translation::prompts`: Prompt templates
 * - `checkpoint`: Throttled dataset checkpoints
 * - `app_controller`: Batch driver over the dataset
 * - `providers`: Chat API clients
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod checkpoint;
pub mod dataset;
pub mod errors;
pub mod file_utils;
pub mod providers;
pub mod script;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary, build_translator};
pub use checkpoint::Checkpointer;
pub use dataset::{CharacterRecord, DatasetFile, DatasetStatus};
pub use errors::{AppError, ProviderError, TranslationError};
pub use translation::CharacterTranslator;

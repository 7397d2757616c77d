/*!
 * Core translation service implementation.
 *
 * `CharacterTranslator` runs the field job (skip check, attempts with
 * endpoint rotation, script validation, backoff) and applies it to both
 * translatable fields of a record.
 */

use log::{debug, warn};
use std::sync::Arc;

use crate::dataset::CharacterRecord;
use crate::errors::TranslationError;
use crate::providers::ChatProvider;
use crate::script;

use super::endpoints::EndpointPool;
use super::extract::extract_answer;
use super::invoker::CompletionInvoker;
use super::prompts::{PromptTemplate, TranslationPromptBuilder};
use super::retry::{AttemptOutcome, RetryBudget, RetryPolicy, Sleeper, TokioSleeper};

/// Translates character records through a pool of chat endpoints
pub struct CharacterTranslator<P> {
    pool: EndpointPool<P>,
    invoker: CompletionInvoker,
    prompt: PromptTemplate,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<P: ChatProvider> CharacterTranslator<P> {
    /// Create a translator with the default retry policy and a real timer
    pub fn new(pool: EndpointPool<P>, invoker: CompletionInvoker, prompt: PromptTemplate) -> Self {
        Self {
            pool,
            invoker,
            prompt,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn pool(&self) -> &EndpointPool<P> {
        &self.pool
    }

    /// Translate one field of `record`.
    ///
    /// Text that already contains Chinese comes back unchanged without any
    /// request. Otherwise attempt `k` goes to endpoint `k % pool.len()`
    /// until an answer passes the script check or the budget runs out.
    pub async fn translate_field(&self, record: &CharacterRecord, text: &str) -> Result<String, TranslationError> {
        if !script::needs_translation(text) {
            debug!("Skip translation for {}: already in target script", record.character_name);
            return Ok(text.to_string());
        }

        let mut budget = RetryBudget::new(self.policy.clone());
        while budget.has_remaining() {
            match self.run_attempt(record, text, budget.attempt()).await {
                AttemptOutcome::Accepted(answer) => return Ok(answer),
                AttemptOutcome::Rejected(answer) => {
                    let reason = match script::disqualifying_script(&answer) {
                        Some(found) => format!("contains {} script", found),
                        None => "no Chinese in answer".to_string(),
                    };
                    warn!("{}", failure_line(&record.character_name, &reason, text));
                }
                AttemptOutcome::Errored(e) => {
                    warn!("{}", failure_line(&record.character_name, &e, text));
                }
            }

            budget.record_failure();
            warn!("{} attempts left for {}", budget.remaining(), record.character_name);
            self.sleeper.sleep(budget.backoff()).await;
        }

        Err(TranslationError::Exhausted {
            character: record.character_name.clone(),
            text: text.to_string(),
            attempts: budget.attempt(),
        })
    }

    async fn run_attempt(&self, record: &CharacterRecord, text: &str, attempt: u32) -> AttemptOutcome {
        let endpoint = self.pool.select(attempt);
        let user_prompt = TranslationPromptBuilder::new(&self.prompt, record, text).build_user_prompt();

        let raw = match self.invoker.invoke(&user_prompt, endpoint).await {
            Ok(raw) => raw,
            Err(e) => return AttemptOutcome::Errored(e.into()),
        };
        let answer = match extract_answer(&raw) {
            Ok(answer) => answer,
            Err(e) => return AttemptOutcome::Errored(e),
        };

        if script::is_pass_answer(&answer) {
            debug!("Accepted answer from {} on attempt {}", endpoint.label(), attempt + 1);
            AttemptOutcome::Accepted(answer)
        } else {
            AttemptOutcome::Rejected(answer)
        }
    }

    /// Translate `description` then `scenario` in place.
    ///
    /// Returns whether the record differs from its state before the call.
    pub async fn translate_record(&self, record: &mut CharacterRecord) -> Result<bool, TranslationError> {
        let snapshot = record.clone();

        let description = self.translate_field(&*record, &record.description).await?;
        record.description = description;

        let scenario = self.translate_field(&*record, &record.scenario).await?;
        record.scenario = scenario;

        Ok(*record != snapshot)
    }
}

/// Log line for a failed attempt, naming the source text whatever the cause
fn failure_line(character: &str, reason: &dyn std::fmt::Display, text: &str) -> String {
    format!("Failed to translate {} ({}): {}", character, reason, text)
}

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

use std::collections::HashMap;

use crate::app_config::Config;
use crate::checkpoint::Checkpointer;
use crate::dataset::{CharacterRecord, CheckpointSink};
use crate::providers::ChatProvider;
use crate::providers::openai::OpenAI;
use crate::translation::{
    CharacterTranslator, CompletionInvoker, Endpoint, EndpointPool, PromptSet, Sleeper, TokioSleeper,
};

// @module: Batch driver over the character dataset

/// Build one client per provider referenced by the endpoint list, in
/// endpoint order. Endpoints on the same provider share its client.
pub fn build_endpoint_pool(config: &Config) -> Result<EndpointPool<OpenAI>> {
    let proxy = config.resolve_proxy();
    let mut clients: HashMap<String, Arc<OpenAI>> = HashMap::new();
    let mut endpoints = Vec::with_capacity(config.endpoints.len());

    for endpoint in &config.endpoints {
        let provider = config
            .get_provider(&endpoint.provider)
            .with_context(|| format!("Unknown provider '{}'", endpoint.provider))?;

        let client = match clients.get(&provider.name) {
            Some(client) => Arc::clone(client),
            None => {
                let proxy_url = if provider.use_proxy { proxy.as_deref() } else { None };
                let client = Arc::new(OpenAI::new_with_config(
                    provider.resolve_api_key(),
                    provider.endpoint.clone(),
                    proxy_url,
                    provider.timeout_secs,
                )?);
                clients.insert(provider.name.clone(), Arc::clone(&client));
                client
            }
        };

        endpoints.push(Endpoint::new(provider.name.clone(), client, endpoint.params.clone()));
    }

    Ok(EndpointPool::new(endpoints)?)
}

/// Wire config and prompts into a translator backed by real HTTP clients
pub fn build_translator(config: &Config, prompts: PromptSet) -> Result<CharacterTranslator<OpenAI>> {
    let pool = build_endpoint_pool(config)?;
    let mut invoker = CompletionInvoker::new(prompts.system);
    if let Some(path) = &config.debug_output_path {
        invoker = invoker.with_transcript(path);
    }
    Ok(CharacterTranslator::new(pool, invoker, prompts.input).with_retry_policy(config.retry.policy()))
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Records visited
    pub processed: usize,
    /// Records whose fields were translated
    pub changed: usize,
    /// Dataset writes performed
    pub checkpoints: usize,
}

/// Main application controller: walks the dataset in order, translating
/// each record and checkpointing after changes
pub struct Controller<P> {
    // @field: Field/record translator
    translator: CharacterTranslator<P>,
    // @field: Upper bound of the pause after a changed record
    jitter: Duration,
    sleeper: Arc<dyn Sleeper>,
    show_progress: bool,
}

impl<P: ChatProvider> Controller<P> {
    // @method: Create a new controller around a translator
    pub fn new(translator: CharacterTranslator<P>, jitter: Duration) -> Self {
        Self {
            translator,
            jitter,
            sleeper: Arc::new(TokioSleeper),
            show_progress: true,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar
    }

    /// Random pause in `0..=jitter`
    fn jitter_delay(&self) -> Duration {
        let max_ms = self.jitter.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }

    /// Run the batch over `records`, strictly in order.
    ///
    /// A field that exhausts its retries aborts the run. Before the error
    /// is returned, a checkpoint still pending in the throttle window is
    /// flushed so finished translations are not lost.
    pub async fn run<S: CheckpointSink>(
        &self,
        records: &mut [CharacterRecord],
        checkpointer: &mut Checkpointer<S>,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();
        let progress_bar = self.progress_bar(records.len());
        let mut summary = RunSummary::default();

        for index in 0..records.len() {
            progress_bar.set_message(records[index].character_name.clone());

            let changed = match self.translator.translate_record(&mut records[index]).await {
                Ok(changed) => changed,
                Err(e) => {
                    progress_bar.abandon();
                    error!("Aborting at record {} of {}: {}", index + 1, records.len(), e);
                    if let Err(flush_error) = checkpointer.flush(records) {
                        warn!("Failed to flush pending checkpoint: {}", flush_error);
                    }
                    return Err(e).context(format!("Translation failed at record {}", index));
                }
            };

            summary.processed += 1;
            if changed {
                summary.changed += 1;
                checkpointer.save(records).context("Failed to write checkpoint")?;
                self.sleeper.sleep(self.jitter_delay()).await;
            }
            progress_bar.inc(1);
        }

        checkpointer.flush(records).context("Failed to write final checkpoint")?;
        progress_bar.finish_with_message("done");

        summary.checkpoints = checkpointer.writes();
        info!(
            "Processed {} records, translated {}, wrote {} checkpoints in {:.1}s",
            summary.processed,
            summary.changed,
            summary.checkpoints,
            start_time.elapsed().as_secs_f64()
        );
        Ok(summary)
    }
}

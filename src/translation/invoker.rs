/*!
 * Single chat-completion call against one endpoint.
 */

use log::{debug, warn};
use std::path::PathBuf;

use crate::errors::ProviderError;
use crate::file_utils::FileManager;
use crate::providers::ChatProvider;
use crate::providers::openai::OpenAIRequest;

use super::endpoints::Endpoint;

/// Sampling values used when an endpoint leaves one unset
#[derive(Debug, Clone, PartialEq)]
struct SamplingDefaults {
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

impl Default for SamplingDefaults {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 1.0,
            max_tokens: 512,
        }
    }
}

/// Sends prompts to endpoints and returns the raw reply text
#[derive(Debug, Clone)]
pub struct CompletionInvoker {
    system_prompt: String,
    defaults: SamplingDefaults,
    /// Overwritten with the last prompt and reply when set
    transcript_path: Option<PathBuf>,
}

impl CompletionInvoker {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            defaults: SamplingDefaults::default(),
            transcript_path: None,
        }
    }

    pub fn with_transcript(mut self, path: impl Into<PathBuf>) -> Self {
        self.transcript_path = Some(path.into());
        self
    }

    /// Request for `endpoint`; its parameters take precedence over the defaults
    pub fn build_request<P>(&self, user_prompt: &str, endpoint: &Endpoint<P>) -> OpenAIRequest {
        let params = &endpoint.params;
        OpenAIRequest::new(params.model.clone())
            .add_message("system", self.system_prompt.clone())
            .add_message("user", user_prompt)
            .temperature(params.temperature.unwrap_or(self.defaults.temperature))
            .top_p(params.top_p.unwrap_or(self.defaults.top_p))
            .max_tokens(params.max_tokens.unwrap_or(self.defaults.max_tokens))
    }

    /// Send one request and return the first choice's text ("" if absent)
    pub async fn invoke<P: ChatProvider>(
        &self,
        user_prompt: &str,
        endpoint: &Endpoint<P>,
    ) -> Result<String, ProviderError> {
        let request = self.build_request(user_prompt, endpoint);
        debug!("Sending prompt to {}", endpoint.label());

        let response = endpoint.client.complete(request).await?;
        let output = P::extract_text(&response);

        self.write_transcript(user_prompt, &output);
        Ok(output)
    }

    fn write_transcript(&self, user_prompt: &str, output: &str) {
        if let Some(path) = &self.transcript_path {
            let content = format!("{}\n\n{}", user_prompt, output);
            if let Err(e) = FileManager::write_to_file(path, &content) {
                warn!("Failed to write debug transcript: {:#}", e);
            }
        }
    }
}

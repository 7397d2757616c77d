/*!
 * Provider implementations for chat-completion services.
 *
 * Every configured vendor (Groq, DeepInfra, DeepSeek) speaks the
 * OpenAI-compatible chat API, so one client covers them all:
 * - `openai`: OpenAI-compatible HTTP client
 * - `mock`: scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    ///
    /// # Arguments
    /// * `response` - The response from the provider
    ///
    /// # Returns
    /// * `String` - The extracted text
    fn extract_text(response: &Self::Response) -> String;
}

/// Provider speaking the OpenAI chat-completion wire format
pub trait ChatProvider:
    Provider<Request = openai::OpenAIRequest, Response = openai::OpenAIResponse>
{
}

impl<T> ChatProvider for T where
    T: Provider<Request = openai::OpenAIRequest, Response = openai::OpenAIResponse>
{
}

pub mod mock;
pub mod openai;

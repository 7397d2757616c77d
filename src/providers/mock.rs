/*!
 * Mock provider implementation for testing.
 *
 * `MockProvider` plays back a script of replies, one per request, and
 * records every request it receives so tests can check which model an
 * attempt was routed to. Once the script runs out the fallback reply is
 * repeated.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::providers::openai::{OpenAIChoice, OpenAIMessage, OpenAIRequest, OpenAIResponse};

/// Type of error to simulate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockErrorType {
    /// Authentication error (invalid API key)
    Auth,
    /// Connection error
    Connection,
    /// Rate limit error
    RateLimit,
    /// API error
    Api,
}

/// One scripted reply
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Respond with this content
    Text(String),
    /// Respond with a choice whose content is null
    NoContent,
    /// Fail the request
    Error(MockErrorType),
}

impl MockReply {
    /// Wrap `answer` in a fenced block, the way a well-behaved model replies
    pub fn fenced(answer: &str) -> Self {
        Self::Text(format!("```\n{}\n```", answer))
    }
}

/// Scripted provider for tests
#[derive(Debug)]
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    requests: Mutex<Vec<OpenAIRequest>>,
}

impl MockProvider {
    /// Play back `replies` in order, then keep repeating `fallback`
    pub fn new(replies: Vec<MockReply>, fallback: MockReply) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same reply
    pub fn always(reply: MockReply) -> Self {
        Self::new(Vec::new(), reply)
    }

    /// Play back `replies`, then fail every further request
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self::new(replies, MockReply::Error(MockErrorType::Api))
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Copy of every request received so far
    pub fn requests(&self) -> Vec<OpenAIRequest> {
        self.requests.lock().clone()
    }

    /// Model id of each request, in arrival order
    pub fn requested_models(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.model.clone()).collect()
    }

    fn next_reply(&self) -> MockReply {
        self.replies.lock().pop_front().unwrap_or_else(|| self.fallback.clone())
    }

    fn response_with(content: Option<String>) -> OpenAIResponse {
        OpenAIResponse {
            choices: vec![OpenAIChoice {
                message: OpenAIMessage {
                    role: "assistant".to_string(),
                    content,
                },
            }],
            usage: None,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.requests.lock().push(request);

        match self.next_reply() {
            MockReply::Text(text) => Ok(Self::response_with(Some(text))),
            MockReply::NoContent => Ok(Self::response_with(None)),
            MockReply::Error(error_type) => Err(match error_type {
                MockErrorType::Auth => ProviderError::AuthenticationError("Invalid API key".into()),
                MockErrorType::Connection => ProviderError::ConnectionError("Connection failed".into()),
                MockErrorType::RateLimit => ProviderError::RateLimitExceeded("Rate limit exceeded".into()),
                MockErrorType::Api => ProviderError::ApiError {
                    status_code: 500,
                    message: "Mock API failure".into(),
                },
            }),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.choices.first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}

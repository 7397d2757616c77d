/*!
 * Endpoint pool with round-robin selection by attempt number.
 */

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::AppError;
use crate::providers::ChatProvider;

/// Request parameters bound to one endpoint. Unset values fall back to the
/// invoker defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointParams {
    /// Model identifier
    pub model: String,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl EndpointParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A provider client paired with its request parameters
#[derive(Debug)]
pub struct Endpoint<P> {
    /// Display name, usually the provider name
    pub name: String,
    /// Shared client; several endpoints may use the same one
    pub client: Arc<P>,
    pub params: EndpointParams,
}

impl<P> Endpoint<P> {
    pub fn new(name: impl Into<String>, client: Arc<P>, params: EndpointParams) -> Self {
        Self {
            name: name.into(),
            client,
            params,
        }
    }

    /// `provider/model`, for logs
    pub fn label(&self) -> String {
        format!("{}/{}", self.name, self.params.model)
    }
}

/// Index of the endpoint serving attempt `attempt` in a pool of `len`
pub fn select_index(attempt: u32, len: usize) -> usize {
    attempt as usize % len
}

/// Fixed, ordered, non-empty list of endpoints
#[derive(Debug)]
pub struct EndpointPool<P> {
    endpoints: Vec<Endpoint<P>>,
}

impl<P: ChatProvider> EndpointPool<P> {
    /// Build a pool; an empty list is a configuration error
    pub fn new(endpoints: Vec<Endpoint<P>>) -> Result<Self, AppError> {
        if endpoints.is_empty() {
            return Err(AppError::Config("Endpoint pool cannot be empty".to_string()));
        }
        Ok(Self { endpoints })
    }

    /// Endpoint serving attempt `attempt` (0-indexed)
    pub fn select(&self, attempt: u32) -> &Endpoint<P> {
        &self.endpoints[select_index(attempt, self.endpoints.len())]
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint<P>> {
        self.endpoints.iter()
    }
}

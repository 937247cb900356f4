use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One completion request to the generative model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Optional system instruction.
    pub system: Option<String>,
    /// User prompt body.
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature: 0.2,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Raw completion text. Extracting and validating any structured payload
/// inside it is the caller's job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
}

impl ModelResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Errors from the model transport.
///
/// Every variant here is recoverable by the stage that issued the call;
/// none of them is ever surfaced to the engine's caller as fatal.
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    #[error("model call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("model endpoint returned {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("model response failed validation: {0}")]
    InvalidResponse(String),

    #[error("client not configured: {0}")]
    NotConfigured(String),
}

impl ModelError {
    /// Transient failures are worth one retry; validation failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ModelError::Timeout(_) | ModelError::Transport(_) | ModelError::Http { status: 500..=599, .. }
        )
    }
}

/// Pure transport to a generative model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn transient_classification() {
        assert!(ModelError::Timeout(Duration::from_secs(8)).is_transient());
        assert!(ModelError::Transport("reset".into()).is_transient());
        assert!(ModelError::Http {
            status: 503,
            detail: "overloaded".into()
        }
        .is_transient());
        assert!(!ModelError::Http {
            status: 401,
            detail: "bad key".into()
        }
        .is_transient());
        assert!(!ModelError::InvalidResponse("not json".into()).is_transient());
    }

    #[test]
    fn request_builder() {
        let req = ModelRequest::new("rank the devices").with_system("you are a scorer");
        assert_eq!(req.system.as_deref(), Some("you are a scorer"));
        assert_eq!(req.max_tokens, 1024);
    }
}

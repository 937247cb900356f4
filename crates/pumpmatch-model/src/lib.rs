//! Generative-Model Client boundary.
//!
//! The scoring engine consults a generative model in three of its stages.
//! This crate owns only the transport: a [`ModelClient`] trait, HTTP
//! adapters for OpenAI- and Anthropic-style APIs, and a retry wrapper that
//! bounds worst-case latency. Prompt construction and response validation
//! belong to the engine; all non-determinism in the pipeline is isolated
//! behind this boundary so the arithmetic core stays unit-testable with
//! zero network dependency.

pub mod client;
pub mod http;
pub mod mock;
pub mod retry;

pub use client::{ModelClient, ModelError, ModelRequest, ModelResponse};
pub use http::{AnthropicClient, HttpClientConfig, OpenAiClient};
pub use mock::MockModelClient;
pub use retry::RetryingClient;

//! Mock model client for testing.
//!
//! Stages 4-6 of the pipeline are tested against canned structured
//! responses played through this client; with a scripted mock, two runs on
//! identical input produce byte-identical results.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{ModelClient, ModelError, ModelRequest, ModelResponse};

enum Behavior {
    /// Play responses from a queue; an exhausted queue is a transport error.
    Scripted(Mutex<VecDeque<Result<ModelResponse, ModelError>>>),
    /// Return the same text for every call.
    Always(String),
    /// Fail every call with a clone of the given error.
    FailAll(ModelError),
}

pub struct MockModelClient {
    behavior: Behavior,
    calls: AtomicUsize,
    prompts: Mutex<Vec<ModelRequest>>,
}

impl MockModelClient {
    /// Play the given results in order, one per call.
    pub fn scripted(responses: Vec<Result<ModelResponse, ModelError>>) -> Self {
        Self {
            behavior: Behavior::Scripted(Mutex::new(responses.into())),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Return the same completion text for every call.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Always(text.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with the given error.
    pub fn fail_all(err: ModelError) -> Self {
        Self {
            behavior: Behavior::FailAll(err),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in order.
    pub fn recorded_requests(&self) -> Vec<ModelRequest> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.clone());

        match &self.behavior {
            Behavior::Scripted(queue) => queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ModelError::Transport("mock script exhausted".into()))),
            Behavior::Always(text) => Ok(ModelResponse::new(text.clone())),
            Behavior::FailAll(err) => Err(err.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_plays_in_order() {
        let mock = MockModelClient::scripted(vec![
            Ok(ModelResponse::new("one")),
            Ok(ModelResponse::new("two")),
        ]);
        assert_eq!(mock.complete(&ModelRequest::new("a")).await.unwrap().text, "one");
        assert_eq!(mock.complete(&ModelRequest::new("b")).await.unwrap().text, "two");
        assert!(mock.complete(&ModelRequest::new("c")).await.is_err());
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn records_requests() {
        let mock = MockModelClient::always("ok");
        mock.complete(&ModelRequest::new("first prompt")).await.unwrap();
        let recorded = mock.recorded_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].prompt, "first prompt");
    }

    #[tokio::test]
    async fn fail_all_fails() {
        let mock = MockModelClient::fail_all(ModelError::Timeout(std::time::Duration::from_secs(8)));
        assert!(mock.complete(&ModelRequest::new("x")).await.is_err());
    }
}

//! The five pipeline stages. Stage 1 (baseline initialization) lives in the
//! score board; stages 2-3 are pure rule lookups; stages 4-6 each make
//! exactly one model consultation.

pub mod arbiter;
pub mod conflict;
pub mod feature;
pub mod narrative;
pub mod slider;

pub use arbiter::ArbiterStage;
pub use conflict::ConflictStage;
pub use feature::FeatureStage;
pub use narrative::NarrativeStage;
pub use slider::SliderStage;

use std::time::Duration;

use pumpmatch_model::{ModelClient, ModelError, ModelRequest, ModelResponse};
use tokio::sync::watch;

use crate::error::EngineError;

async fn cancel_requested(rx: &mut watch::Receiver<bool>) {
    // A dropped sender means nobody can cancel anymore; park forever so the
    // model call side of the select wins.
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// One deadline-bounded model consultation, raced against caller
/// cancellation.
///
/// The outer error is cancellation (hard, aborts the pipeline); the inner
/// result is the stage-local model outcome the owning stage degrades on.
pub(crate) async fn consult_model(
    client: &dyn ModelClient,
    request: &ModelRequest,
    timeout: Duration,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<Result<ModelResponse, ModelError>, EngineError> {
    let call = async {
        match tokio::time::timeout(timeout, client.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(timeout)),
        }
    };

    match cancel {
        None => Ok(call.await),
        Some(mut rx) => {
            if *rx.borrow() {
                return Err(EngineError::Cancelled);
            }
            tokio::select! {
                result = call => Ok(result),
                _ = cancel_requested(&mut rx) => Err(EngineError::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pumpmatch_model::MockModelClient;

    #[tokio::test]
    async fn consult_returns_inner_result() {
        let client = MockModelClient::always("hello");
        let result = consult_model(
            &client,
            &ModelRequest::new("prompt"),
            Duration::from_secs(1),
            None,
        )
        .await
        .unwrap();
        assert_eq!(result.unwrap().text, "hello");
    }

    #[tokio::test]
    async fn consult_times_out() {
        struct SlowClient;

        #[async_trait::async_trait]
        impl ModelClient for SlowClient {
            async fn complete(
                &self,
                _request: &ModelRequest,
            ) -> Result<ModelResponse, ModelError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(ModelResponse::new("too late"))
            }
        }

        tokio::time::pause();
        let request = ModelRequest::new("prompt");
        let call = consult_model(
            &SlowClient,
            &request,
            Duration::from_secs(8),
            None,
        );
        let result = call.await.unwrap();
        assert!(matches!(result, Err(ModelError::Timeout(_))));
    }

    #[tokio::test]
    async fn pre_cancelled_call_is_hard_error() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let client = MockModelClient::always("never used");
        let err = consult_model(
            &client,
            &ModelRequest::new("prompt"),
            Duration::from_secs(1),
            Some(rx),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn cancellation_aborts_outstanding_call() {
        struct SlowClient;

        #[async_trait::async_trait]
        impl ModelClient for SlowClient {
            async fn complete(
                &self,
                _request: &ModelRequest,
            ) -> Result<ModelResponse, ModelError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(ModelResponse::new("too late"))
            }
        }

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            consult_model(
                &SlowClient,
                &ModelRequest::new("prompt"),
                Duration::from_secs(120),
                Some(rx),
            )
            .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[tokio::test]
    async fn dropped_sender_does_not_cancel() {
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let client = MockModelClient::always("still works");
        let result = consult_model(
            &client,
            &ModelRequest::new("prompt"),
            Duration::from_secs(1),
            Some(rx),
        )
        .await
        .unwrap();
        assert_eq!(result.unwrap().text, "still works");
    }
}

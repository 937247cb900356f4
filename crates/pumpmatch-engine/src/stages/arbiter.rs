use std::sync::Arc;

use async_trait::async_trait;
use pumpmatch_model::{ModelClient, ModelRequest};
use tracing::{debug, warn};

use crate::context::{ScoreContext, StageOutcome};
use crate::error::EngineError;
use crate::prompt;
use crate::schema::ArbiterVerdict;
use crate::stages::consult_model;
use crate::traits::ScoringStage;

/// Stage 6: Final Arbiter.
///
/// Holistic re-score over the complete dimension catalog, the full
/// preference input and the current standings: a bonus per device in
/// [0, cap] plus a reasoning string expected to cite at least one
/// dimension number. Reasoning without a citation is accepted but flagged
/// uncited. On call failure every device gets zero bonus and the result
/// carries the stage-6 degradation marker.
pub struct ArbiterStage {
    client: Arc<dyn ModelClient>,
}

impl ArbiterStage {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScoringStage for ArbiterStage {
    fn stage_name(&self) -> &str {
        "final_arbiter"
    }

    fn stage_number(&self) -> u8 {
        6
    }

    async fn evaluate(&self, context: &mut ScoreContext) -> Result<StageOutcome, EngineError> {
        let cap = context.config.arbiter_bonus_cap;
        let request = ModelRequest::new(prompt::arbiter_prompt(
            &context.catalog,
            &context.input,
            &context.board,
            cap,
        ))
        .with_system(prompt::ARBITER_SYSTEM);

        let reply = consult_model(
            self.client.as_ref(),
            &request,
            context.config.model_timeout,
            context.cancel.clone(),
        )
        .await?;

        match reply.and_then(|r| ArbiterVerdict::parse(&r.text, &context.catalog, cap)) {
            Ok(verdict) => {
                let cited = verdict.cites_dimension(&context.catalog);
                if !cited {
                    debug!("Arbiter reasoning lacks a dimension citation");
                }
                let deltas = verdict.bonus_deltas(&context.catalog);
                context.uncited_verdict = !cited;
                context.verdict = Some(verdict);
                Ok(StageOutcome::Applied(deltas))
            }
            Err(err) => {
                warn!(error = %err, "Final arbiter degraded to zero bonus");
                Ok(StageOutcome::Degraded {
                    reason: err.to_string(),
                })
            }
        }
    }
}

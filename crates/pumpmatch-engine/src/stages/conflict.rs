use std::sync::Arc;

use async_trait::async_trait;
use pumpmatch_model::{ModelClient, ModelRequest};
use tracing::{debug, info, warn};

use crate::context::{ScoreContext, StageOutcome};
use crate::error::EngineError;
use crate::prompt;
use crate::schema::{validate_option_deltas, ClarifyingQuestion};
use crate::stages::consult_model;
use crate::traits::ScoringStage;

/// Deterministic id for the single question a request can issue.
const QUESTION_ID: &str = "clarify-1";

/// Stage 5: Conflict Resolver.
///
/// Fires only when the standings after stage 4 cannot be confidently
/// differentiated: the leader's gap to any other device is at or below the
/// closeness threshold, or the narrative left more than the allowed number
/// of decision-relevant dimensions unaddressed. On a second pass the
/// supplied answer's deltas apply directly and the trigger is skipped.
/// Failure to generate a question degrades to a no-op — clarification
/// refines a result, it is never required to produce one.
pub struct ConflictStage {
    client: Arc<dyn ModelClient>,
}

impl ConflictStage {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn should_trigger(&self, context: &ScoreContext) -> Option<String> {
        if let Some(gap) = context.board.tightest_gap() {
            if gap <= context.config.closeness_threshold {
                return Some(format!(
                    "leader gap {gap:.1} within closeness threshold {:.1}",
                    context.config.closeness_threshold
                ));
            }
        }
        let gaps = context.decision_gaps();
        if gaps.len() > context.config.missing_dimension_limit {
            return Some(format!(
                "{} decision-relevant dimensions unaddressed (limit {})",
                gaps.len(),
                context.config.missing_dimension_limit
            ));
        }
        None
    }
}

#[async_trait]
impl ScoringStage for ConflictStage {
    fn stage_name(&self) -> &str {
        "conflict_resolver"
    }

    fn stage_number(&self) -> u8 {
        5
    }

    async fn evaluate(&self, context: &mut ScoreContext) -> Result<StageOutcome, EngineError> {
        // Second pass: apply the chosen option, never re-trigger.
        if let Some(answer) = context.prior_answer.clone() {
            validate_option_deltas(
                &answer.option,
                &context.catalog,
                context.config.clarify_delta_cap,
            )
            .map_err(|err| EngineError::InvalidClarification(err.to_string()))?;

            info!(
                question = %answer.question_id,
                option = %answer.option.id,
                "Applying clarification answer"
            );
            return Ok(StageOutcome::Applied(answer.option.deltas));
        }

        let Some(trigger) = self.should_trigger(context) else {
            debug!("Standings sufficiently separated, no clarification needed");
            return Ok(StageOutcome::Skipped("no conflict".into()));
        };
        info!(trigger = %trigger, "Conflict detected, generating clarifying question");

        let request = ModelRequest::new(prompt::conflict_prompt(
            &context.catalog,
            &context.board,
            context.intents.as_ref(),
            &context.decision_gaps(),
            context.config.clarify_delta_cap,
        ))
        .with_system(prompt::CONFLICT_SYSTEM);

        let reply = consult_model(
            self.client.as_ref(),
            &request,
            context.config.model_timeout,
            context.cancel.clone(),
        )
        .await?;

        match reply.and_then(|r| {
            ClarifyingQuestion::parse(
                &r.text,
                &context.catalog,
                context.config.clarify_delta_cap,
                QUESTION_ID,
            )
        }) {
            Ok(question) => Ok(StageOutcome::NeedsClarification(question)),
            Err(err) => {
                warn!(error = %err, "Question generation degraded to a no-op");
                Ok(StageOutcome::Degraded {
                    reason: err.to_string(),
                })
            }
        }
    }
}

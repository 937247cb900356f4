use std::sync::Arc;

use async_trait::async_trait;
use pumpmatch_model::{ModelClient, ModelRequest};
use tracing::{debug, warn};

use crate::context::{ScoreContext, StageOutcome};
use crate::error::EngineError;
use crate::prompt;
use crate::schema::IntentExtraction;
use crate::stages::consult_model;
use crate::traits::ScoringStage;

/// Stage 4: Narrative Analyzer.
///
/// Converts the free-text narrative into an intent extraction plus bounded
/// per-device awards in [0, cap]. An empty or whitespace narrative skips
/// the model call entirely: zero deltas, no intents, and every
/// decision-relevant dimension marked missing — a cost-control shortcut
/// that raises the odds the conflict resolver asks a clarifying question.
/// Transient call failures and invalid responses degrade to zero deltas;
/// the pipeline stays available without this stage.
pub struct NarrativeStage {
    client: Arc<dyn ModelClient>,
}

impl NarrativeStage {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScoringStage for NarrativeStage {
    fn stage_name(&self) -> &str {
        "narrative_analyzer"
    }

    fn stage_number(&self) -> u8 {
        4
    }

    async fn evaluate(&self, context: &mut ScoreContext) -> Result<StageOutcome, EngineError> {
        if !context.input.has_narrative() {
            context.intents = Some(IntentExtraction {
                intents: Vec::new(),
                missing_dimensions: context.config.decision_dimensions.clone(),
                awards: Default::default(),
            });
            return Ok(StageOutcome::Skipped("empty narrative".into()));
        }

        let cap = context.config.narrative_award_cap;
        let request = ModelRequest::new(prompt::narrative_prompt(
            &context.catalog,
            &context.input,
            cap,
        ))
        .with_system(prompt::NARRATIVE_SYSTEM);

        let reply = consult_model(
            self.client.as_ref(),
            &request,
            context.config.model_timeout,
            context.cancel.clone(),
        )
        .await?;

        match reply.and_then(|r| IntentExtraction::parse(&r.text, &context.catalog, cap)) {
            Ok(extraction) => {
                debug!(
                    intents = extraction.intents.len(),
                    missing = extraction.missing_dimensions.len(),
                    "Narrative analyzed"
                );
                let deltas = extraction.award_deltas(&context.catalog);
                context.intents = Some(extraction);
                Ok(StageOutcome::Applied(deltas))
            }
            Err(err) => {
                warn!(error = %err, "Narrative stage degraded to zero deltas");
                Ok(StageOutcome::Degraded {
                    reason: err.to_string(),
                })
            }
        }
    }
}

//! Pipeline orchestrator.
//!
//! One `score` call is one logical request with its own score board; the
//! only state shared across requests is the read-only catalog behind a
//! single-flight loader. Stages run in fixed order and the board clamps
//! once per stage, so with a scripted model client the whole run is a pure
//! function of its input.

use std::sync::Arc;

use pumpmatch_catalog::{CatalogError, CatalogSource, DeviceId, SharedCatalog};
use pumpmatch_model::ModelClient;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, info, instrument};

use crate::board::ScoreBoard;
use crate::config::EngineConfig;
use crate::context::{ScoreContext, StageOutcome};
use crate::error::EngineError;
use crate::input::{ClarificationAnswer, PreferenceInput};
use crate::schema::{ClarifyingQuestion, Confidence};
use crate::stages::{ArbiterStage, ConflictStage, FeatureStage, NarrativeStage, SliderStage};
use crate::tables::{FeatureImpacts, SliderBands};
use crate::traits::ScoringStage;

/// One device's position in the final ranking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedDevice {
    pub id: DeviceId,
    pub name: String,
    pub score: f64,
    /// 1-based, ties broken by catalog device order.
    pub rank: usize,
    pub reason: String,
}

/// A stage that fell back to a zero contribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDegradation {
    pub stage: String,
    pub number: u8,
    pub reason: String,
}

/// Standings snapshot after one stage's clamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageTraceEntry {
    pub stage: String,
    pub number: u8,
    pub outcome: String,
    pub leader: DeviceId,
    pub leader_score: f64,
}

/// Final output of a completed pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// All devices, best first.
    pub rankings: Vec<RankedDevice>,
    pub top: DeviceId,
    /// Citation-bearing explanation for the top choice, assembled from the
    /// narrative intents and the arbiter reasoning.
    pub explanation: String,
    /// True when the arbiter reasoning lacked a dimension citation.
    pub uncited_verdict: bool,
    /// Stages that fell back to a zero contribution; a consumer can
    /// disclose "based on limited information" when this is non-empty.
    pub degraded_stages: Vec<StageDegradation>,
    /// Per-stage standings, in pipeline order.
    pub stage_trace: Vec<StageTraceEntry>,
}

impl RecommendationResult {
    /// Whether the named stage number degraded.
    pub fn stage_degraded(&self, number: u8) -> bool {
        self.degraded_stages.iter().any(|d| d.number == number)
    }
}

/// Outcome of one pipeline pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScoreOutcome {
    /// A complete ranking.
    Final(RecommendationResult),
    /// The conflict resolver needs an answer first; score again with the
    /// chosen option to finish.
    ClarificationNeeded(ClarifyingQuestion),
}

/// The six-stage recommendation engine.
///
/// Cheap to share behind an `Arc`; concurrent `score` calls need no
/// coordination.
pub struct RecommendationEngine {
    catalog: SharedCatalog,
    client: Arc<dyn ModelClient>,
    config: EngineConfig,
    slider_bands: Arc<SliderBands>,
    feature_impacts: Arc<FeatureImpacts>,
}

impl RecommendationEngine {
    pub fn new(source: Box<dyn CatalogSource>, client: Arc<dyn ModelClient>) -> Self {
        Self::with_config(source, client, EngineConfig::default())
    }

    pub fn with_config(
        source: Box<dyn CatalogSource>,
        client: Arc<dyn ModelClient>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog: SharedCatalog::new(source),
            client,
            config,
            slider_bands: Arc::new(SliderBands::builtin()),
            feature_impacts: Arc::new(FeatureImpacts::builtin()),
        }
    }

    /// Replace the built-in rule tables.
    pub fn with_tables(mut self, bands: SliderBands, impacts: FeatureImpacts) -> Self {
        self.slider_bands = Arc::new(bands);
        self.feature_impacts = Arc::new(impacts);
        self
    }

    /// Run the pipeline once.
    ///
    /// `prior_answer` carries a previously-issued clarifying question's
    /// chosen option on a second pass; the engine itself is stateless
    /// across passes.
    pub async fn score(
        &self,
        input: PreferenceInput,
        prior_answer: Option<ClarificationAnswer>,
    ) -> Result<ScoreOutcome, EngineError> {
        self.score_with_cancel(input, prior_answer, None).await
    }

    /// Like [`score`](Self::score), raced against a caller cancellation
    /// signal. Cancellation aborts any outstanding model call and returns
    /// [`EngineError::Cancelled`] instead of a partial score.
    #[instrument(skip_all)]
    pub async fn score_with_cancel(
        &self,
        input: PreferenceInput,
        prior_answer: Option<ClarificationAnswer>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<ScoreOutcome, EngineError> {
        let catalog = self.catalog.get().await?;
        if let Err(problem) = self.slider_bands.validate(&catalog) {
            error!(%problem, "Slider band table inconsistent with catalog");
        }
        if let Err(problem) = self.feature_impacts.validate(&catalog) {
            error!(%problem, "Feature impact table inconsistent with catalog");
        }

        let mut context =
            ScoreContext::new(catalog.clone(), self.config.clone(), input, prior_answer);
        context.cancel = cancel;

        let mut degraded_stages = Vec::new();
        let mut stage_trace = Vec::new();
        push_trace(&mut stage_trace, "baseline_init", 1, "applied", &context.board);

        let stages: [Box<dyn ScoringStage>; 5] = [
            Box::new(SliderStage::new(self.slider_bands.clone())),
            Box::new(FeatureStage::new(self.feature_impacts.clone())),
            Box::new(NarrativeStage::new(self.client.clone())),
            Box::new(ConflictStage::new(self.client.clone())),
            Box::new(ArbiterStage::new(self.client.clone())),
        ];

        for stage in stages {
            let outcome = stage.evaluate(&mut context).await?;
            context.record_stage(stage.stage_name(), stage.stage_number(), &outcome);
            match &outcome {
                StageOutcome::Applied(deltas) => context.board.apply(deltas),
                StageOutcome::Skipped(_) => {}
                StageOutcome::Degraded { reason } => degraded_stages.push(StageDegradation {
                    stage: stage.stage_name().to_string(),
                    number: stage.stage_number(),
                    reason: reason.clone(),
                }),
                StageOutcome::NeedsClarification(question) => {
                    info!(question = %question.id, "Pausing for clarification");
                    return Ok(ScoreOutcome::ClarificationNeeded(question.clone()));
                }
            }
            push_trace(
                &mut stage_trace,
                stage.stage_name(),
                stage.stage_number(),
                outcome.kind(),
                &context.board,
            );
        }

        let result = self.assemble(&context, degraded_stages, stage_trace)?;
        info!(top = %result.top, degraded = result.degraded_stages.len(), "Scoring complete");
        Ok(ScoreOutcome::Final(result))
    }

    fn assemble(
        &self,
        context: &ScoreContext,
        degraded_stages: Vec<StageDegradation>,
        stage_trace: Vec<StageTraceEntry>,
    ) -> Result<RecommendationResult, EngineError> {
        let mut ordered = context.board.scores_in_order();
        // Stable sort keeps catalog order as the tie-break.
        ordered.sort_by(|a, b| b.1.total_cmp(&a.1));

        let top = ordered
            .first()
            .map(|(id, _)| id.clone())
            .ok_or(EngineError::Catalog(CatalogError::NoDevices))?;
        let top_name = device_name(context, &top);

        let rankings = ordered
            .iter()
            .enumerate()
            .map(|(index, (id, score))| RankedDevice {
                id: id.clone(),
                name: device_name(context, id),
                score: *score,
                rank: index + 1,
                reason: if index == 0 {
                    "Highest combined score across all six stages.".to_string()
                } else {
                    let gap = ordered[0].1 - score;
                    format!("Trails {top_name} by {gap:.1} points.")
                },
            })
            .collect();

        Ok(RecommendationResult {
            rankings,
            top: top.clone(),
            explanation: assemble_explanation(context, &top, &top_name),
            uncited_verdict: context.uncited_verdict,
            degraded_stages,
            stage_trace,
        })
    }
}

fn device_name(context: &ScoreContext, id: &DeviceId) -> String {
    context
        .catalog
        .device(id)
        .map(|d| d.display_name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn push_trace(
    trace: &mut Vec<StageTraceEntry>,
    stage: &str,
    number: u8,
    outcome: &str,
    board: &ScoreBoard,
) {
    // The catalog rejects an empty device list at load, so a leader always
    // exists.
    if let Some((leader, leader_score)) = board.leader() {
        trace.push(StageTraceEntry {
            stage: stage.to_string(),
            number,
            outcome: outcome.to_string(),
            leader,
            leader_score,
        });
    }
}

/// Explanation for the top choice: the highest-confidence narrative intents
/// first, then the arbiter's citation-bearing reasoning. With every model
/// stage degraded this falls back to naming the deterministic inputs.
fn assemble_explanation(context: &ScoreContext, top: &DeviceId, top_name: &str) -> String {
    let mut parts = Vec::new();

    if let Some(extraction) = &context.intents {
        let mut intents: Vec<_> = extraction.intents.iter().collect();
        intents.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        for intent in intents.iter().take(3) {
            let qualifier = match intent.confidence {
                Confidence::High => "clearly",
                Confidence::Medium => "likely",
                Confidence::Low => "possibly",
            };
            parts.push(format!("You {qualifier} {}.", intent.summary.trim_end_matches('.')));
        }
        let award = extraction.awards.get(top).copied().unwrap_or(0.0);
        if award > 0.0 {
            parts.push(format!(
                "Your narrative contributed {award:.1} points toward {top_name}."
            ));
        }
    }

    if let Some(verdict) = &context.verdict {
        parts.push(verdict.reasoning.trim().to_string());
    }

    if parts.is_empty() {
        format!(
            "{top_name} scored highest from your slider ratings and selected features alone."
        )
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Intent, IntentExtraction};
    use pumpmatch_catalog::{BuiltinSource, Catalog};
    use std::collections::BTreeMap;

    fn context() -> ScoreContext {
        let catalog = Arc::new(Catalog::load(&BuiltinSource).unwrap());
        ScoreContext::new(
            catalog,
            EngineConfig::default(),
            PreferenceInput::default(),
            None,
        )
    }

    #[test]
    fn explanation_falls_back_without_model_output() {
        let ctx = context();
        let text = assemble_explanation(&ctx, &DeviceId::new("omnipod5"), "Omnipod 5");
        assert!(text.contains("slider ratings"));
    }

    #[test]
    fn explanation_orders_intents_by_confidence() {
        let mut ctx = context();
        ctx.intents = Some(IntentExtraction {
            intents: vec![
                Intent {
                    summary: "might want remote viewing".into(),
                    confidence: Confidence::Low,
                    dimensions: vec![20],
                },
                Intent {
                    summary: "want a tubeless pump".into(),
                    confidence: Confidence::High,
                    dimensions: vec![3],
                },
            ],
            missing_dimensions: vec![],
            awards: BTreeMap::from([(DeviceId::new("omnipod5"), 20.0)]),
        });

        let text = assemble_explanation(&ctx, &DeviceId::new("omnipod5"), "Omnipod 5");
        let high = text.find("clearly want a tubeless pump").unwrap();
        let low = text.find("possibly might want remote viewing").unwrap();
        assert!(high < low);
        assert!(text.contains("contributed 20.0 points"));
    }

    #[test]
    fn result_reports_degraded_stage_numbers() {
        let result = RecommendationResult {
            rankings: vec![],
            top: DeviceId::new("omnipod5"),
            explanation: String::new(),
            uncited_verdict: false,
            degraded_stages: vec![StageDegradation {
                stage: "final_arbiter".into(),
                number: 6,
                reason: "timeout".into(),
            }],
            stage_trace: vec![],
        };
        assert!(result.stage_degraded(6));
        assert!(!result.stage_degraded(4));
    }
}

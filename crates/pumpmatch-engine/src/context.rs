use std::sync::Arc;

use pumpmatch_catalog::Catalog;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::board::{DeltaMap, ScoreBoard};
use crate::config::EngineConfig;
use crate::input::{ClarificationAnswer, PreferenceInput};
use crate::schema::{ArbiterVerdict, ClarifyingQuestion, IntentExtraction};

/// Result of a single stage evaluation.
///
/// An expected-but-degraded path is a value here, never an unwound error:
/// the orchestrator's sequencing must not rely on exception-style control
/// flow for paths that are part of normal operation.
#[derive(Clone, Debug)]
pub enum StageOutcome {
    /// Stage computed deltas; the orchestrator applies them in one clamp.
    Applied(DeltaMap),
    /// Stage had nothing to do (e.g. empty narrative, no trigger).
    Skipped(String),
    /// Stage's model consultation failed; contribution degraded to zero.
    Degraded { reason: String },
    /// Stage requires a clarifying answer before a final result can exist.
    NeedsClarification(ClarifyingQuestion),
}

impl StageOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            StageOutcome::Applied(_) => "applied",
            StageOutcome::Skipped(_) => "skipped",
            StageOutcome::Degraded { .. } => "degraded",
            StageOutcome::NeedsClarification(_) => "needs_clarification",
        }
    }
}

/// Compact record of one evaluated stage, kept for the result trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: String,
    pub number: u8,
    pub outcome: String,
}

/// Context passed through all stages of one scoring request.
///
/// Created fresh per request and discarded after the result is returned;
/// the only shared state is the read-only catalog.
pub struct ScoreContext {
    pub catalog: Arc<Catalog>,
    pub config: EngineConfig,
    pub input: PreferenceInput,
    /// Present only on a second pass through the pipeline.
    pub prior_answer: Option<ClarificationAnswer>,
    pub board: ScoreBoard,
    /// Set by the narrative stage (stage 4).
    pub intents: Option<IntentExtraction>,
    /// Set by the arbiter stage (stage 6).
    pub verdict: Option<ArbiterVerdict>,
    /// True when the arbiter reasoning lacked a dimension citation.
    pub uncited_verdict: bool,
    pub stage_records: Vec<StageRecord>,
    /// Caller cancellation signal; model calls race against it.
    pub cancel: Option<watch::Receiver<bool>>,
}

impl ScoreContext {
    pub fn new(
        catalog: Arc<Catalog>,
        config: EngineConfig,
        input: PreferenceInput,
        prior_answer: Option<ClarificationAnswer>,
    ) -> Self {
        let board = ScoreBoard::initialize(catalog.device_ids(), config.baseline_score);
        Self {
            catalog,
            config,
            input,
            prior_answer,
            board,
            intents: None,
            verdict: None,
            uncited_verdict: false,
            stage_records: Vec::new(),
            cancel: None,
        }
    }

    pub fn record_stage(&mut self, stage: &str, number: u8, outcome: &StageOutcome) {
        self.stage_records.push(StageRecord {
            stage: stage.to_string(),
            number,
            outcome: outcome.kind().to_string(),
        });
    }

    /// Decision-relevant dimensions the narrative left unaddressed.
    pub fn decision_gaps(&self) -> Vec<u8> {
        self.intents
            .as_ref()
            .map(|i| i.decision_gaps(&self.config.decision_dimensions))
            .unwrap_or_default()
    }
}

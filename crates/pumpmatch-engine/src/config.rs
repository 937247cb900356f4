use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine tunables.
///
/// The numeric values were empirically tuned and may be recalibrated
/// without architectural change; the structure (per-stage caps,
/// clamp-after-sum, paired boost/penalty tables) is the invariant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Starting score for every active device.
    pub baseline_score: f64,
    /// Stage-5 trigger: gap between the leader and any other device at or
    /// below this fires a clarifying question.
    pub closeness_threshold: f64,
    /// Stage-5 trigger: more than this many decision-relevant dimensions
    /// reported missing by the narrative stage fires a clarifying question.
    pub missing_dimension_limit: usize,
    /// Stage-4 per-device award cap (awards live in [0, cap]).
    pub narrative_award_cap: f64,
    /// Stage-5 per-option, per-device delta cap (deltas live in [-cap, cap]).
    pub clarify_delta_cap: f64,
    /// Stage-6 per-device bonus cap (bonuses live in [0, cap]).
    pub arbiter_bonus_cap: f64,
    /// Deadline for each model consultation.
    pub model_timeout: Duration,
    /// Dimension numbers that count as decision-relevant for the stage-5
    /// coverage-gap trigger.
    pub decision_dimensions: Vec<u8>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_score: 40.0,
            closeness_threshold: 10.0,
            missing_dimension_limit: 2,
            narrative_award_cap: 25.0,
            clarify_delta_cap: 5.0,
            arbiter_bonus_cap: 20.0,
            model_timeout: Duration::from_secs(8),
            decision_dimensions: vec![2, 3, 4, 8, 13, 18, 22],
        }
    }
}

//! PumpMatch scoring engine — six-stage explainable recommendation pipeline.
//!
//! Matches a patient's stated preferences against the dimension catalog of
//! candidate pump systems and produces a ranked, citation-backed
//! recommendation.
//!
//! ## Pipeline
//!
//! 1. **Initialization** — every active device starts at the baseline score
//! 2. **Slider Adjuster** — five 1-10 ratings, banded rule-table deltas (pure)
//! 3. **Feature Adjuster** — selected feature flags, paired boost/penalty deltas (pure)
//! 4. **Narrative Analyzer** — free text → intents + bounded awards (model-backed)
//! 5. **Conflict Resolver** — clarifying question on near-ties or coverage gaps (model-backed, conditional)
//! 6. **Final Arbiter** — holistic bonus with dimension citations (model-backed)
//!
//! After each stage the pending deltas are summed and clamped once into
//! [0, 100], so within-stage delta ordering never affects the result. Model
//! failures degrade the owning stage to a zero contribution and are recorded
//! as degradation markers; only catalog-load failure and explicit
//! cancellation are hard errors. With a scripted model client the whole
//! pipeline is deterministic: identical input yields byte-identical output.

pub mod board;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod input;
pub mod prompt;
pub mod schema;
pub mod stages;
pub mod tables;
pub mod traits;

pub use board::{DeltaMap, ScoreBoard};
pub use config::EngineConfig;
pub use context::{ScoreContext, StageOutcome, StageRecord};
pub use engine::{
    RankedDevice, RecommendationEngine, RecommendationResult, ScoreOutcome, StageDegradation,
    StageTraceEntry,
};
pub use error::EngineError;
pub use input::{Band, ClarificationAnswer, PreferenceInput, Slider, SliderRatings};
pub use schema::{
    ArbiterVerdict, ClarifyingOption, ClarifyingQuestion, Confidence, Intent, IntentExtraction,
};
pub use stages::{ArbiterStage, ConflictStage, FeatureStage, NarrativeStage, SliderStage};
pub use tables::{BandDeltas, FeatureImpacts, ImpactRecord, SliderBands};
pub use traits::ScoringStage;

use async_trait::async_trait;

use crate::context::{ScoreContext, StageOutcome};
use crate::error::EngineError;

/// One stage of the scoring pipeline.
///
/// Stages are evaluated sequentially in fixed order. A stage computes all
/// of its deltas before handing them back; the orchestrator applies them to
/// the board in a single clamped pass. The only hard errors a stage may
/// return are cancellation and a rejected second-pass clarification —
/// model failures are expressed as `StageOutcome::Degraded`.
#[async_trait]
pub trait ScoringStage: Send + Sync {
    /// Human-readable name of this stage.
    fn stage_name(&self) -> &str;

    /// Stage number in the pipeline (2-6; stage 1 is board initialization).
    fn stage_number(&self) -> u8;

    /// Evaluate the request in the current context.
    ///
    /// May read and annotate the context (intents, verdict) but never
    /// mutates the board directly.
    async fn evaluate(&self, context: &mut ScoreContext) -> Result<StageOutcome, EngineError>;
}

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::board::DeltaMap;
use crate::context::{ScoreContext, StageOutcome};
use crate::error::EngineError;
use crate::tables::FeatureImpacts;
use crate::traits::ScoringStage;

/// Stage 3: Feature Adjuster.
///
/// Each selected feature's impact record contributes both its boost map
/// and its penalty map, so a selection costs points to poorly-aligned
/// devices rather than only rewarding the best fit. Unknown feature
/// identifiers are ignored with a warning — forward-compatible with
/// catalog growth, never fatal.
pub struct FeatureStage {
    impacts: Arc<FeatureImpacts>,
}

impl FeatureStage {
    pub fn new(impacts: Arc<FeatureImpacts>) -> Self {
        Self { impacts }
    }
}

#[async_trait]
impl ScoringStage for FeatureStage {
    fn stage_name(&self) -> &str {
        "feature_adjuster"
    }

    fn stage_number(&self) -> u8 {
        3
    }

    async fn evaluate(&self, context: &mut ScoreContext) -> Result<StageOutcome, EngineError> {
        let mut deltas = DeltaMap::new();
        for feature in &context.input.features {
            match self.impacts.get(feature) {
                Some(record) => {
                    debug!(feature = %feature, "Applying feature impact");
                    deltas.merge(&record.combined());
                }
                None => {
                    warn!(feature = %feature, "Unknown feature identifier ignored");
                }
            }
        }
        Ok(StageOutcome::Applied(deltas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::input::PreferenceInput;
    use pumpmatch_catalog::{BuiltinSource, Catalog, DeviceId, FeatureId};
    use std::collections::BTreeSet;

    fn context(features: &[&str]) -> ScoreContext {
        let catalog = Arc::new(Catalog::load(&BuiltinSource).unwrap());
        let features: BTreeSet<FeatureId> = features.iter().map(|f| FeatureId::new(*f)).collect();
        ScoreContext::new(
            catalog,
            EngineConfig::default(),
            PreferenceInput {
                features,
                ..Default::default()
            },
            None,
        )
    }

    async fn deltas_for(features: &[&str]) -> DeltaMap {
        let stage = FeatureStage::new(Arc::new(FeatureImpacts::builtin()));
        let mut ctx = context(features);
        match stage.evaluate(&mut ctx).await.unwrap() {
            StageOutcome::Applied(deltas) => deltas,
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn boost_and_penalty_both_apply() {
        let deltas = deltas_for(&["tubeless-design"]).await;
        assert_eq!(deltas.get(&DeviceId::new("omnipod5")), 4.0);
        assert_eq!(deltas.get(&DeviceId::new("minimed780g")), -2.0);
    }

    #[tokio::test]
    async fn selections_accumulate() {
        let deltas = deltas_for(&["tubeless-design", "waterproof-wear"]).await;
        // 4.0 + 3.0 boosts for the pod; -2.0 + -2.0 for the touchscreen pump.
        assert_eq!(deltas.get(&DeviceId::new("omnipod5")), 7.0);
        assert_eq!(deltas.get(&DeviceId::new("tslimx2")), -4.0);
    }

    #[tokio::test]
    async fn unknown_feature_is_ignored() {
        let deltas = deltas_for(&["hover-mode"]).await;
        assert!(deltas.is_empty());
    }

    #[tokio::test]
    async fn no_features_is_a_noop() {
        let deltas = deltas_for(&[]).await;
        assert!(deltas.is_empty());
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::board::DeltaMap;
use crate::context::{ScoreContext, StageOutcome};
use crate::error::EngineError;
use crate::input::Slider;
use crate::tables::SliderBands;
use crate::traits::ScoringStage;

/// Stage 2: Slider Adjuster.
///
/// Pure function over the five ratings. Each rating is bucketed into its
/// band and the fixed lookup table yields per-device deltas; all five
/// sliders sum into one delta map. No failure modes, order-independent,
/// side-effect-free.
pub struct SliderStage {
    bands: Arc<SliderBands>,
}

impl SliderStage {
    pub fn new(bands: Arc<SliderBands>) -> Self {
        Self { bands }
    }
}

#[async_trait]
impl ScoringStage for SliderStage {
    fn stage_name(&self) -> &str {
        "slider_adjuster"
    }

    fn stage_number(&self) -> u8 {
        2
    }

    async fn evaluate(&self, context: &mut ScoreContext) -> Result<StageOutcome, EngineError> {
        let mut deltas = DeltaMap::new();
        for slider in Slider::ALL {
            let band = context.input.sliders.band(slider);
            let cell = self.bands.deltas(slider, band);
            debug!(
                slider = slider.as_str(),
                rating = context.input.sliders.rating(slider),
                band = ?band,
                entries = cell.iter().count(),
                "Slider banded"
            );
            deltas.merge(cell);
        }
        Ok(StageOutcome::Applied(deltas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::input::{PreferenceInput, SliderRatings};
    use pumpmatch_catalog::{BuiltinSource, Catalog, DeviceId};

    fn context(sliders: SliderRatings) -> ScoreContext {
        let catalog = Arc::new(Catalog::load(&BuiltinSource).unwrap());
        ScoreContext::new(
            catalog,
            EngineConfig::default(),
            PreferenceInput {
                sliders,
                ..Default::default()
            },
            None,
        )
    }

    #[tokio::test]
    async fn neutral_sliders_produce_no_deltas() {
        let stage = SliderStage::new(Arc::new(SliderBands::builtin()));
        let mut ctx = context(SliderRatings::default());
        let outcome = stage.evaluate(&mut ctx).await.unwrap();
        match outcome {
            StageOutcome::Applied(deltas) => {
                for device in ctx.catalog.devices() {
                    assert_eq!(deltas.get(&device.id), 0.0);
                }
            }
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn active_discreet_profile_favors_tubeless() {
        let stage = SliderStage::new(Arc::new(SliderBands::builtin()));
        let mut ctx = context(SliderRatings {
            activity: Some(8),
            tech_comfort: Some(2),
            simplicity: Some(8),
            discreteness: Some(8),
            time_dedication: Some(5),
        });
        let outcome = stage.evaluate(&mut ctx).await.unwrap();
        let StageOutcome::Applied(deltas) = outcome else {
            panic!("expected Applied");
        };
        let pod = deltas.get(&DeviceId::new("omnipod5"));
        let bulky = deltas.get(&DeviceId::new("minimed780g"));
        assert!(pod > 0.0, "omnipod5 delta {pod}");
        assert!(bulky < 0.0, "minimed780g delta {bulky}");
    }
}

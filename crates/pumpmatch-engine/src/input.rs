use std::collections::BTreeSet;

use pumpmatch_catalog::FeatureId;
use serde::{Deserialize, Serialize};

use crate::schema::ClarifyingOption;

/// The five preference sliders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slider {
    Activity,
    TechComfort,
    Simplicity,
    Discreteness,
    TimeDedication,
}

impl Slider {
    pub const ALL: [Slider; 5] = [
        Slider::Activity,
        Slider::TechComfort,
        Slider::Simplicity,
        Slider::Discreteness,
        Slider::TimeDedication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slider::Activity => "activity",
            Slider::TechComfort => "tech_comfort",
            Slider::Simplicity => "simplicity",
            Slider::Discreteness => "discreteness",
            Slider::TimeDedication => "time_dedication",
        }
    }
}

/// Band a 1-10 rating falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    /// 1-3 Low, 4-7 Mid, 8-10 High.
    pub fn of(rating: u8) -> Self {
        match rating {
            0..=3 => Band::Low,
            4..=7 => Band::Mid,
            _ => Band::High,
        }
    }
}

/// Neutral midpoint used when a slider is absent.
pub const NEUTRAL_RATING: u8 = 5;

/// The five named slider ratings, each 1-10.
///
/// Absent ratings default to the neutral midpoint; out-of-range values are
/// clamped into 1-10. Missing input never errors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderRatings {
    pub activity: Option<u8>,
    pub tech_comfort: Option<u8>,
    pub simplicity: Option<u8>,
    pub discreteness: Option<u8>,
    pub time_dedication: Option<u8>,
}

impl SliderRatings {
    /// Effective rating for one slider, defaulted and clamped.
    pub fn rating(&self, slider: Slider) -> u8 {
        let raw = match slider {
            Slider::Activity => self.activity,
            Slider::TechComfort => self.tech_comfort,
            Slider::Simplicity => self.simplicity,
            Slider::Discreteness => self.discreteness,
            Slider::TimeDedication => self.time_dedication,
        };
        raw.unwrap_or(NEUTRAL_RATING).clamp(1, 10)
    }

    /// Band for one slider.
    pub fn band(&self, slider: Slider) -> Band {
        Band::of(self.rating(slider))
    }
}

/// Per-request, ephemeral preference input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceInput {
    pub sliders: SliderRatings,
    pub features: BTreeSet<FeatureId>,
    /// Free-text description of needs and situation; possibly empty.
    pub narrative: String,
}

impl PreferenceInput {
    pub fn has_narrative(&self) -> bool {
        !self.narrative.trim().is_empty()
    }
}

/// A previously-issued clarifying question's chosen option, supplied on the
/// second pass. The engine is stateless across passes, so the answer
/// carries the full chosen option (including its deltas) back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClarificationAnswer {
    pub question_id: String,
    pub option: ClarifyingOption,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sliders_default_to_neutral() {
        let ratings = SliderRatings::default();
        for slider in Slider::ALL {
            assert_eq!(ratings.rating(slider), NEUTRAL_RATING);
            assert_eq!(ratings.band(slider), Band::Mid);
        }
    }

    #[test]
    fn band_edges() {
        assert_eq!(Band::of(1), Band::Low);
        assert_eq!(Band::of(3), Band::Low);
        assert_eq!(Band::of(4), Band::Mid);
        assert_eq!(Band::of(7), Band::Mid);
        assert_eq!(Band::of(8), Band::High);
        assert_eq!(Band::of(10), Band::High);
    }

    #[test]
    fn out_of_range_ratings_clamp() {
        let ratings = SliderRatings {
            activity: Some(0),
            tech_comfort: Some(200),
            ..Default::default()
        };
        assert_eq!(ratings.rating(Slider::Activity), 1);
        assert_eq!(ratings.rating(Slider::TechComfort), 10);
    }

    #[test]
    fn whitespace_narrative_is_empty() {
        let input = PreferenceInput {
            narrative: "   \n\t ".into(),
            ..Default::default()
        };
        assert!(!input.has_narrative());
    }
}

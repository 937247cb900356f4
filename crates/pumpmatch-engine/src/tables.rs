//! Tunable rule tables for the deterministic stages.
//!
//! The deltas here were empirically tuned against the builtin catalog and
//! are configuration, not architecture: both tables deserialize from JSON
//! so a deployment can recalibrate without a code change. The designed
//! envelopes are ±12 per device across all five sliders and ±8 per device
//! per feature record.

use std::collections::BTreeMap;

use pumpmatch_catalog::{Catalog, FeatureId};
use serde::{Deserialize, Serialize};

use crate::board::DeltaMap;
use crate::input::{Band, Slider};

/// Deltas for one slider across its three bands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BandDeltas {
    pub low: DeltaMap,
    pub mid: DeltaMap,
    pub high: DeltaMap,
}

impl BandDeltas {
    pub fn for_band(&self, band: Band) -> &DeltaMap {
        match band {
            Band::Low => &self.low,
            Band::Mid => &self.mid,
            Band::High => &self.high,
        }
    }
}

/// Lookup table mapping (slider, band) to per-device deltas.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SliderBands {
    pub activity: BandDeltas,
    pub tech_comfort: BandDeltas,
    pub simplicity: BandDeltas,
    pub discreteness: BandDeltas,
    pub time_dedication: BandDeltas,
}

impl SliderBands {
    pub fn for_slider(&self, slider: Slider) -> &BandDeltas {
        match slider {
            Slider::Activity => &self.activity,
            Slider::TechComfort => &self.tech_comfort,
            Slider::Simplicity => &self.simplicity,
            Slider::Discreteness => &self.discreteness,
            Slider::TimeDedication => &self.time_dedication,
        }
    }

    /// Deltas for one (slider, band) cell.
    pub fn deltas(&self, slider: Slider, band: Band) -> &DeltaMap {
        self.for_slider(slider).for_band(band)
    }

    /// Check every referenced device exists and every delta is finite.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), String> {
        for slider in Slider::ALL {
            for band in [Band::Low, Band::Mid, Band::High] {
                for (device, delta) in self.deltas(slider, band).iter() {
                    if catalog.device(device).is_none() {
                        return Err(format!(
                            "slider table references unknown device {device} ({} {:?})",
                            slider.as_str(),
                            band
                        ));
                    }
                    if !delta.is_finite() {
                        return Err(format!(
                            "non-finite delta for {device} in {} {:?}",
                            slider.as_str(),
                            band
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Tuned defaults for the builtin catalog.
    pub fn builtin() -> Self {
        Self {
            activity: BandDeltas {
                low: DeltaMap::from_entries(&[("tslimx2", 1.0), ("minimed780g", 1.0)]),
                mid: DeltaMap::new(),
                high: DeltaMap::from_entries(&[
                    ("omnipod5", 3.0),
                    ("twiist", 2.0),
                    ("mobi", 1.0),
                    ("tslimx2", -1.0),
                    ("minimed780g", -2.0),
                ]),
            },
            tech_comfort: BandDeltas {
                low: DeltaMap::from_entries(&[
                    ("ilet", 3.0),
                    ("omnipod5", 2.0),
                    ("minimed780g", -1.0),
                    ("tslimx2", -2.0),
                ]),
                mid: DeltaMap::new(),
                high: DeltaMap::from_entries(&[
                    ("tslimx2", 3.0),
                    ("mobi", 2.0),
                    ("twiist", 2.0),
                    ("ilet", -2.0),
                ]),
            },
            simplicity: BandDeltas {
                low: DeltaMap::from_entries(&[("tslimx2", 2.0), ("minimed780g", 2.0)]),
                mid: DeltaMap::new(),
                high: DeltaMap::from_entries(&[
                    ("ilet", 3.0),
                    ("omnipod5", 3.0),
                    ("tslimx2", -1.0),
                    ("minimed780g", -2.0),
                ]),
            },
            discreteness: BandDeltas {
                low: DeltaMap::new(),
                mid: DeltaMap::new(),
                high: DeltaMap::from_entries(&[
                    ("mobi", 3.0),
                    ("twiist", 2.0),
                    ("omnipod5", 2.0),
                    ("minimed780g", -3.0),
                ]),
            },
            time_dedication: BandDeltas {
                low: DeltaMap::from_entries(&[
                    ("ilet", 3.0),
                    ("omnipod5", 2.0),
                    ("minimed780g", -2.0),
                ]),
                mid: DeltaMap::new(),
                high: DeltaMap::from_entries(&[("tslimx2", 2.0), ("minimed780g", 2.0)]),
            },
        }
    }
}

/// Paired boost/penalty deltas for one selectable feature.
///
/// The pairing is deliberate: a feature selection must cost points to
/// poorly-aligned devices, not just reward the best fit, or averaging
/// across many selections washes out differentiation entirely.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactRecord {
    /// Devices favored by this selection (non-negative deltas).
    pub boost: DeltaMap,
    /// Devices disadvantaged by the same choice (non-positive deltas).
    pub penalty: DeltaMap,
}

impl ImpactRecord {
    /// Combined boost + penalty deltas.
    pub fn combined(&self) -> DeltaMap {
        let mut map = self.boost.clone();
        map.merge(&self.penalty);
        map
    }
}

/// Lookup table mapping feature identifiers to impact records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpacts {
    pub impacts: BTreeMap<FeatureId, ImpactRecord>,
}

impl FeatureImpacts {
    pub fn get(&self, feature: &FeatureId) -> Option<&ImpactRecord> {
        self.impacts.get(feature)
    }

    /// Check device references, signs and the ±8 per-device envelope.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), String> {
        for (feature, record) in &self.impacts {
            for (device, delta) in record.boost.iter() {
                if catalog.device(device).is_none() {
                    return Err(format!("{feature} boost references unknown device {device}"));
                }
                if !(0.0..=8.0).contains(&delta) {
                    return Err(format!("{feature} boost for {device} out of range: {delta}"));
                }
            }
            for (device, delta) in record.penalty.iter() {
                if catalog.device(device).is_none() {
                    return Err(format!(
                        "{feature} penalty references unknown device {device}"
                    ));
                }
                if !(-8.0..=0.0).contains(&delta) {
                    return Err(format!(
                        "{feature} penalty for {device} out of range: {delta}"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Tuned defaults for the builtin catalog.
    pub fn builtin() -> Self {
        let mut impacts = BTreeMap::new();

        let mut put = |id: &str, boost: &[(&str, f64)], penalty: &[(&str, f64)]| {
            impacts.insert(
                FeatureId::new(id),
                ImpactRecord {
                    boost: DeltaMap::from_entries(boost),
                    penalty: DeltaMap::from_entries(penalty),
                },
            );
        };

        put(
            "tubeless-design",
            &[("omnipod5", 4.0)],
            &[("tslimx2", -2.0), ("minimed780g", -2.0), ("mobi", -1.0)],
        );
        put(
            "phone-bolusing",
            &[("mobi", 3.0), ("omnipod5", 2.0), ("twiist", 2.0)],
            &[("minimed780g", -2.0)],
        );
        put(
            "touchscreen-device",
            &[("tslimx2", 4.0)],
            &[("omnipod5", -1.0), ("ilet", -1.0)],
        );
        put(
            "smallest-size",
            &[("mobi", 4.0), ("twiist", 2.0)],
            &[("minimed780g", -3.0), ("tslimx2", -1.0)],
        );
        put(
            "no-carb-counting",
            &[("ilet", 4.0)],
            &[("tslimx2", -1.0), ("mobi", -1.0)],
        );
        put(
            "waterproof-wear",
            &[("omnipod5", 3.0), ("mobi", 2.0)],
            &[("tslimx2", -2.0), ("minimed780g", -1.0)],
        );
        put(
            "aggressive-automation",
            &[("minimed780g", 4.0), ("tslimx2", 1.0)],
            &[("ilet", -2.0)],
        );
        put(
            "apple-watch-control",
            &[("twiist", 4.0)],
            &[("minimed780g", -2.0), ("ilet", -1.0)],
        );
        put(
            "large-reservoir",
            &[("tslimx2", 2.0), ("minimed780g", 2.0), ("twiist", 1.0)],
            &[("mobi", -2.0), ("omnipod5", -1.0)],
        );
        put(
            "shared-caregiver-view",
            &[("omnipod5", 2.0), ("tslimx2", 2.0), ("mobi", 2.0)],
            &[("ilet", -1.0)],
        );

        Self { impacts }
    }
}

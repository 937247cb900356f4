use std::collections::BTreeMap;

use pumpmatch_catalog::DeviceId;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Accumulated per-device deltas for one stage.
///
/// A stage computes all of its deltas into one map and hands it to the
/// board in a single [`ScoreBoard::apply`] call; clamping per individual
/// delta would make the result depend on delta ordering within the stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaMap(BTreeMap<DeviceId, f64>);

impl DeltaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a delta for a device.
    pub fn add(&mut self, device: DeviceId, delta: f64) {
        *self.0.entry(device).or_insert(0.0) += delta;
    }

    /// Fold another delta map into this one.
    pub fn merge(&mut self, other: &DeltaMap) {
        for (device, delta) in &other.0 {
            self.add(device.clone(), *delta);
        }
    }

    pub fn get(&self, device: &DeviceId) -> f64 {
        self.0.get(device).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, f64)> {
        self.0.iter().map(|(d, v)| (d, *v))
    }

    pub fn from_entries(entries: &[(&str, f64)]) -> Self {
        let mut map = Self::new();
        for (id, delta) in entries {
            map.add(DeviceId::new(*id), *delta);
        }
        map
    }
}

/// Per-request mutable score accumulator with clamp semantics.
///
/// Initialized to a fixed baseline for every active device, mutated
/// additively stage by stage. `apply` sums each device's pending delta and
/// then clamps every score into [0, 100] in one pass per call. The board
/// preserves the catalog's canonical device order, which is the tie-break
/// order for equal final scores.
#[derive(Clone, Debug)]
pub struct ScoreBoard {
    scores: BTreeMap<DeviceId, f64>,
    order: Vec<DeviceId>,
}

impl ScoreBoard {
    /// Set every device to the baseline.
    pub fn initialize(device_ids: Vec<DeviceId>, baseline: f64) -> Self {
        let scores = device_ids
            .iter()
            .cloned()
            .map(|id| (id, baseline))
            .collect();
        Self {
            scores,
            order: device_ids,
        }
    }

    /// Add each device's delta, then clamp every score to [0, 100].
    ///
    /// One call per stage. Deltas for devices the board does not know are
    /// skipped with a warning; validated tables and schemas should never
    /// produce them.
    pub fn apply(&mut self, deltas: &DeltaMap) {
        for (device, delta) in deltas.iter() {
            match self.scores.get_mut(device) {
                Some(score) => *score += delta,
                None => warn!(device = %device, delta, "Delta for unknown device ignored"),
            }
        }
        for score in self.scores.values_mut() {
            *score = score.clamp(0.0, 100.0);
        }
    }

    pub fn score(&self, device: &DeviceId) -> Option<f64> {
        self.scores.get(device).copied()
    }

    /// Scores in canonical device order.
    pub fn scores_in_order(&self) -> Vec<(DeviceId, f64)> {
        self.order
            .iter()
            .map(|id| (id.clone(), self.scores[id]))
            .collect()
    }

    /// Current leader: highest score, earliest in canonical order on ties.
    pub fn leader(&self) -> Option<(DeviceId, f64)> {
        let mut best: Option<(DeviceId, f64)> = None;
        for (id, score) in self.scores_in_order() {
            match &best {
                Some((_, best_score)) if score <= *best_score => {}
                _ => best = Some((id, score)),
            }
        }
        best
    }

    /// Smallest gap between the leader and any other device.
    pub fn tightest_gap(&self) -> Option<f64> {
        let (leader, leader_score) = self.leader()?;
        self.scores_in_order()
            .into_iter()
            .filter(|(id, _)| *id != leader)
            .map(|(_, score)| leader_score - score)
            .fold(None, |min, gap| match min {
                Some(m) if m <= gap => Some(m),
                _ => Some(gap),
            })
    }

    pub fn device_ids(&self) -> &[DeviceId] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> ScoreBoard {
        ScoreBoard::initialize(
            vec![DeviceId::new("a"), DeviceId::new("b"), DeviceId::new("c")],
            40.0,
        )
    }

    #[test]
    fn initialize_sets_baseline() {
        let board = board();
        for (_, score) in board.scores_in_order() {
            assert_eq!(score, 40.0);
        }
    }

    #[test]
    fn apply_adds_then_clamps() {
        let mut board = board();
        let mut deltas = DeltaMap::new();
        deltas.add(DeviceId::new("a"), 90.0);
        deltas.add(DeviceId::new("b"), -90.0);
        board.apply(&deltas);

        assert_eq!(board.score(&DeviceId::new("a")), Some(100.0));
        assert_eq!(board.score(&DeviceId::new("b")), Some(0.0));
        assert_eq!(board.score(&DeviceId::new("c")), Some(40.0));
    }

    #[test]
    fn within_stage_order_is_irrelevant() {
        // Two deltas for the same device in one stage sum before the clamp.
        let mut board = board();
        let mut deltas = DeltaMap::new();
        deltas.add(DeviceId::new("a"), 80.0);
        deltas.add(DeviceId::new("a"), -30.0);
        board.apply(&deltas);
        // 40 + 80 - 30 = 90, not clamp(40+80) - 30 = 70.
        assert_eq!(board.score(&DeviceId::new("a")), Some(90.0));
    }

    #[test]
    fn leader_breaks_ties_by_order() {
        let mut board = board();
        let mut deltas = DeltaMap::new();
        deltas.add(DeviceId::new("b"), 10.0);
        deltas.add(DeviceId::new("c"), 10.0);
        board.apply(&deltas);

        let (leader, score) = board.leader().unwrap();
        assert_eq!(leader, DeviceId::new("b"));
        assert_eq!(score, 50.0);
    }

    #[test]
    fn tightest_gap_measures_runner_up() {
        let mut board = board();
        let mut deltas = DeltaMap::new();
        deltas.add(DeviceId::new("a"), 20.0);
        deltas.add(DeviceId::new("b"), 12.0);
        board.apply(&deltas);

        assert_eq!(board.tightest_gap(), Some(8.0));
    }

    #[test]
    fn unknown_device_delta_is_ignored() {
        let mut board = board();
        let mut deltas = DeltaMap::new();
        deltas.add(DeviceId::new("ghost"), 50.0);
        board.apply(&deltas);
        for (_, score) in board.scores_in_order() {
            assert_eq!(score, 40.0);
        }
    }

    #[test]
    fn delta_map_accumulates() {
        let mut map = DeltaMap::new();
        map.add(DeviceId::new("a"), 2.0);
        map.add(DeviceId::new("a"), 3.0);
        assert_eq!(map.get(&DeviceId::new("a")), 5.0);
    }
}

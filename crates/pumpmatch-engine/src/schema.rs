//! Validated structured contracts for the model-backed stages.
//!
//! The model replies with free text that should contain one JSON object.
//! Generative formatting varies (code fences, surrounding prose), so the
//! engine extracts the first balanced JSON object before parsing, then
//! enforces the per-stage caps. A violation is a stage-local
//! `ModelError::InvalidResponse`, handled by degrading that stage — never
//! surfaced to the engine's caller.

use std::collections::BTreeMap;

use pumpmatch_catalog::{Catalog, DeviceId};
use pumpmatch_model::ModelError;
use serde::{Deserialize, Serialize};

use crate::board::DeltaMap;

/// Confidence level of an inferred intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// One intent inferred from the narrative, mapped to the dimensions it
/// speaks to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub summary: String,
    pub confidence: Confidence,
    pub dimensions: Vec<u8>,
}

/// Structured output of the Narrative Analyzer (stage 4).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentExtraction {
    /// Inferred intents, ordered by the model.
    #[serde(default)]
    pub intents: Vec<Intent>,
    /// Dimensions the narrative left unaddressed.
    #[serde(default)]
    pub missing_dimensions: Vec<u8>,
    /// Per-device award, each in [0, cap].
    #[serde(default)]
    pub awards: BTreeMap<DeviceId, f64>,
}

impl IntentExtraction {
    /// Parse and validate a model reply against the catalog and award cap.
    ///
    /// Devices absent from `awards` receive zero; an unknown device id or
    /// an award outside [0, cap] rejects the whole response.
    pub fn parse(text: &str, catalog: &Catalog, cap: f64) -> Result<Self, ModelError> {
        let json = extract_json(text)
            .ok_or_else(|| ModelError::InvalidResponse("no JSON object in reply".into()))?;
        let extraction: IntentExtraction = serde_json::from_str(&json)
            .map_err(|e| ModelError::InvalidResponse(format!("intent schema: {e}")))?;

        for (device, award) in &extraction.awards {
            if catalog.device(device).is_none() {
                return Err(ModelError::InvalidResponse(format!(
                    "award for unknown device {device}"
                )));
            }
            if !award.is_finite() || *award < 0.0 || *award > cap {
                return Err(ModelError::InvalidResponse(format!(
                    "award {award} for {device} outside [0, {cap}]"
                )));
            }
        }
        for intent in &extraction.intents {
            for number in &intent.dimensions {
                if catalog.dimension(*number).is_none() {
                    return Err(ModelError::InvalidResponse(format!(
                        "intent cites unknown dimension {number}"
                    )));
                }
            }
        }

        Ok(extraction)
    }

    /// Award deltas for the board, zero-filled for unmentioned devices.
    pub fn award_deltas(&self, catalog: &Catalog) -> DeltaMap {
        let mut deltas = DeltaMap::new();
        for device in catalog.devices() {
            deltas.add(
                device.id.clone(),
                self.awards.get(&device.id).copied().unwrap_or(0.0),
            );
        }
        deltas
    }

    /// Missing dimensions restricted to the decision-relevant set.
    pub fn decision_gaps(&self, decision_dimensions: &[u8]) -> Vec<u8> {
        self.missing_dimensions
            .iter()
            .copied()
            .filter(|n| decision_dimensions.contains(n))
            .collect()
    }
}

/// One answer option of a clarifying question, carrying its own bounded
/// per-device deltas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClarifyingOption {
    pub id: String,
    pub label: String,
    pub deltas: DeltaMap,
}

/// A single follow-up multiple-choice question generated when top
/// candidates cannot be confidently differentiated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub id: String,
    pub question: String,
    pub rationale: String,
    pub options: Vec<ClarifyingOption>,
}

impl ClarifyingQuestion {
    /// Parse and validate a model reply: 2-4 options, every delta within
    /// ±cap, every device known.
    pub fn parse(
        text: &str,
        catalog: &Catalog,
        cap: f64,
        question_id: &str,
    ) -> Result<Self, ModelError> {
        #[derive(Deserialize)]
        struct Raw {
            question: String,
            #[serde(default)]
            rationale: String,
            options: Vec<ClarifyingOption>,
        }

        let json = extract_json(text)
            .ok_or_else(|| ModelError::InvalidResponse("no JSON object in reply".into()))?;
        let raw: Raw = serde_json::from_str(&json)
            .map_err(|e| ModelError::InvalidResponse(format!("question schema: {e}")))?;

        if !(2..=4).contains(&raw.options.len()) {
            return Err(ModelError::InvalidResponse(format!(
                "expected 2-4 options, got {}",
                raw.options.len()
            )));
        }
        for option in &raw.options {
            validate_option_deltas(option, catalog, cap)?;
        }

        Ok(Self {
            id: question_id.to_string(),
            question: raw.question,
            rationale: raw.rationale,
            options: raw.options,
        })
    }
}

/// Shared option-delta validation, also used when a second-pass answer
/// replays an option back to the engine.
pub(crate) fn validate_option_deltas(
    option: &ClarifyingOption,
    catalog: &Catalog,
    cap: f64,
) -> Result<(), ModelError> {
    for (device, delta) in option.deltas.iter() {
        if catalog.device(device).is_none() {
            return Err(ModelError::InvalidResponse(format!(
                "option {} references unknown device {device}",
                option.id
            )));
        }
        if !delta.is_finite() || delta.abs() > cap {
            return Err(ModelError::InvalidResponse(format!(
                "option {} delta {delta} for {device} outside ±{cap}",
                option.id
            )));
        }
    }
    Ok(())
}

/// Structured output of the Final Arbiter (stage 6).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArbiterVerdict {
    /// Per-device bonus, each in [0, cap].
    #[serde(default)]
    pub bonuses: BTreeMap<DeviceId, f64>,
    pub reasoning: String,
}

impl ArbiterVerdict {
    pub fn parse(text: &str, catalog: &Catalog, cap: f64) -> Result<Self, ModelError> {
        let json = extract_json(text)
            .ok_or_else(|| ModelError::InvalidResponse("no JSON object in reply".into()))?;
        let verdict: ArbiterVerdict = serde_json::from_str(&json)
            .map_err(|e| ModelError::InvalidResponse(format!("verdict schema: {e}")))?;

        for (device, bonus) in &verdict.bonuses {
            if catalog.device(device).is_none() {
                return Err(ModelError::InvalidResponse(format!(
                    "bonus for unknown device {device}"
                )));
            }
            if !bonus.is_finite() || *bonus < 0.0 || *bonus > cap {
                return Err(ModelError::InvalidResponse(format!(
                    "bonus {bonus} for {device} outside [0, {cap}]"
                )));
            }
        }

        Ok(verdict)
    }

    /// Bonus deltas for the board, zero-filled for unmentioned devices.
    pub fn bonus_deltas(&self, catalog: &Catalog) -> DeltaMap {
        let mut deltas = DeltaMap::new();
        for device in catalog.devices() {
            deltas.add(
                device.id.clone(),
                self.bonuses.get(&device.id).copied().unwrap_or(0.0),
            );
        }
        deltas
    }

    /// Whether the reasoning references at least one catalog dimension
    /// number. A missing citation is a quality signal, not a rejection.
    pub fn cites_dimension(&self, catalog: &Catalog) -> bool {
        let mut digits = String::new();
        for ch in self.reasoning.chars().chain(std::iter::once(' ')) {
            if ch.is_ascii_digit() {
                digits.push(ch);
            } else if !digits.is_empty() {
                if let Ok(number) = digits.parse::<u8>() {
                    if catalog.dimension(number).is_some() {
                        return true;
                    }
                }
                digits.clear();
            }
        }
        false
    }
}

/// Extract the first balanced top-level JSON object from free text.
///
/// Tracks string literals and escapes so braces inside strings do not
/// unbalance the scan.
pub fn extract_json(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pumpmatch_catalog::BuiltinSource;

    fn catalog() -> Catalog {
        Catalog::load(&BuiltinSource).unwrap()
    }

    #[test]
    fn extract_json_from_fenced_reply() {
        let text = "Here you go:\n```json\n{\"a\": \"closing } inside\"}\n```\nDone.";
        assert_eq!(
            extract_json(text).unwrap(),
            "{\"a\": \"closing } inside\"}"
        );
    }

    #[test]
    fn extract_json_handles_nesting() {
        let text = "prefix {\"outer\": {\"inner\": 1}} suffix";
        assert_eq!(extract_json(text).unwrap(), "{\"outer\": {\"inner\": 1}}");
    }

    #[test]
    fn extract_json_rejects_unbalanced() {
        assert!(extract_json("{\"open\": ").is_none());
        assert!(extract_json("no braces here").is_none());
    }

    #[test]
    fn intent_extraction_parses_valid_reply() {
        let reply = r#"{
            "intents": [
                {"summary": "wants something discreet", "confidence": "high", "dimensions": [18, 22]}
            ],
            "missing_dimensions": [4, 8],
            "awards": {"omnipod5": 25.0, "mobi": 10.0}
        }"#;
        let extraction = IntentExtraction::parse(reply, &catalog(), 25.0).unwrap();
        assert_eq!(extraction.intents.len(), 1);

        let deltas = extraction.award_deltas(&catalog());
        assert_eq!(deltas.get(&DeviceId::new("omnipod5")), 25.0);
        assert_eq!(deltas.get(&DeviceId::new("tslimx2")), 0.0);
    }

    #[test]
    fn intent_award_over_cap_is_invalid() {
        let reply = r#"{"awards": {"omnipod5": 26.0}}"#;
        let err = IntentExtraction::parse(reply, &catalog(), 25.0).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }

    #[test]
    fn intent_unknown_device_is_invalid() {
        let reply = r#"{"awards": {"ghost": 5.0}}"#;
        assert!(IntentExtraction::parse(reply, &catalog(), 25.0).is_err());
    }

    #[test]
    fn intent_unknown_dimension_is_invalid() {
        let reply = r#"{"intents": [{"summary": "x", "confidence": "low", "dimensions": [99]}]}"#;
        assert!(IntentExtraction::parse(reply, &catalog(), 25.0).is_err());
    }

    #[test]
    fn decision_gaps_filter_to_relevant_set() {
        let extraction = IntentExtraction {
            missing_dimensions: vec![3, 4, 21],
            ..Default::default()
        };
        assert_eq!(extraction.decision_gaps(&[2, 3, 4, 8]), vec![3, 4]);
    }

    #[test]
    fn question_parses_and_bounds_options() {
        let reply = r#"{
            "question": "Tubed or tubeless?",
            "rationale": "Top devices differ mainly in wear style.",
            "options": [
                {"id": "a", "label": "Tubeless", "deltas": {"omnipod5": 5.0, "tslimx2": -4.0}},
                {"id": "b", "label": "Tubed is fine", "deltas": {"tslimx2": 4.0}}
            ]
        }"#;
        let question = ClarifyingQuestion::parse(reply, &catalog(), 5.0, "clarify-1").unwrap();
        assert_eq!(question.id, "clarify-1");
        assert_eq!(question.options.len(), 2);
    }

    #[test]
    fn question_with_one_option_is_invalid() {
        let reply = r#"{"question": "?", "options": [{"id": "a", "label": "x", "deltas": {}}]}"#;
        assert!(ClarifyingQuestion::parse(reply, &catalog(), 5.0, "q").is_err());
    }

    #[test]
    fn question_option_over_cap_is_invalid() {
        let reply = r#"{
            "question": "?",
            "options": [
                {"id": "a", "label": "x", "deltas": {"omnipod5": 6.0}},
                {"id": "b", "label": "y", "deltas": {}}
            ]
        }"#;
        assert!(ClarifyingQuestion::parse(reply, &catalog(), 5.0, "q").is_err());
    }

    #[test]
    fn verdict_parses_and_detects_citation() {
        let reply = r#"{
            "bonuses": {"omnipod5": 15.0, "minimed780g": 2.0},
            "reasoning": "Tubeless wear (dimension 3) and discretion (dimension 18) dominate."
        }"#;
        let verdict = ArbiterVerdict::parse(reply, &catalog(), 20.0).unwrap();
        assert!(verdict.cites_dimension(&catalog()));
        assert_eq!(verdict.bonus_deltas(&catalog()).get(&DeviceId::new("ilet")), 0.0);
    }

    #[test]
    fn verdict_without_number_is_uncited() {
        let verdict = ArbiterVerdict {
            bonuses: BTreeMap::new(),
            reasoning: "Feels like the best overall fit.".into(),
        };
        assert!(!verdict.cites_dimension(&catalog()));
    }

    #[test]
    fn verdict_number_not_in_catalog_is_uncited() {
        let verdict = ArbiterVerdict {
            bonuses: BTreeMap::new(),
            reasoning: "Scores 99 out of 100.".into(),
        };
        // 99 and 100 are not dimension numbers.
        assert!(!verdict.cites_dimension(&catalog()));
    }

    #[test]
    fn verdict_bonus_over_cap_is_invalid() {
        let reply = r#"{"bonuses": {"omnipod5": 21.0}, "reasoning": "dimension 3"}"#;
        assert!(ArbiterVerdict::parse(reply, &catalog(), 20.0).is_err());
    }
}

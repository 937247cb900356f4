//! Prompt construction for the model-backed stages.
//!
//! The engine owns the full contract with the model: these builders fold
//! the dimension corpus, the preference input and the current scores into
//! one structured prompt per stage, and the expected reply shape is spelled
//! out inline so the schema module can validate what comes back.

use pumpmatch_catalog::Catalog;

use crate::board::ScoreBoard;
use crate::input::{PreferenceInput, Slider};
use crate::schema::IntentExtraction;

pub const NARRATIVE_SYSTEM: &str = "You analyze a patient's free-text description of their \
needs and map it to insulin pump comparison dimensions. Reply with exactly one JSON object \
and no other commentary.";

pub const CONFLICT_SYSTEM: &str = "You write one short multiple-choice question that would \
best separate closely-ranked insulin pump candidates. Reply with exactly one JSON object \
and no other commentary.";

pub const ARBITER_SYSTEM: &str = "You are the final reviewer of an insulin pump \
recommendation. Weigh the full dimension catalog against the patient's stated preferences \
and current standings. Reply with exactly one JSON object and no other commentary.";

/// Per-device dimension corpus: every dimension's detail text per device.
fn dimension_corpus(catalog: &Catalog) -> String {
    let mut out = String::new();
    for device in catalog.devices() {
        out.push_str(&format!("### {} ({})\n", device.display_name, device.id));
        for dim in catalog.dimensions() {
            if let Some(detail) = dim.detail(&device.id) {
                out.push_str(&format!("{}. {}: {}\n", dim.number, dim.name, detail));
            }
        }
        out.push('\n');
    }
    out
}

fn slider_summary(input: &PreferenceInput) -> String {
    Slider::ALL
        .iter()
        .map(|s| format!("{}={}", s.as_str(), input.sliders.rating(*s)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn board_summary(board: &ScoreBoard) -> String {
    board
        .scores_in_order()
        .into_iter()
        .map(|(id, score)| format!("{}: {score:.1}", id.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stage 4 prompt: narrative + corpus + worked example + reply schema.
pub fn narrative_prompt(catalog: &Catalog, input: &PreferenceInput, award_cap: f64) -> String {
    format!(
        "Patient narrative:\n\"\"\"\n{narrative}\n\"\"\"\n\n\
         Device catalog:\n{corpus}\
         Infer the patient's intents, the dimension numbers each intent maps to, and which \
         dimension numbers the narrative leaves unaddressed. Award each device between 0 and \
         {cap} points for how well its catalog entries satisfy the narrative.\n\n\
         Reply with one JSON object:\n\
         {{\"intents\": [{{\"summary\": \"...\", \"confidence\": \"low|medium|high\", \
         \"dimensions\": [3]}}], \"missing_dimensions\": [4, 8], \
         \"awards\": {{\"<device id>\": 0.0}}}}\n\n\
         Worked example — narrative \"I swim daily and hate tubing\" yields:\n\
         {{\"intents\": [{{\"summary\": \"needs waterproof tubeless wear\", \
         \"confidence\": \"high\", \"dimensions\": [3, 11]}}], \
         \"missing_dimensions\": [2, 4, 8, 13, 22], \
         \"awards\": {{\"omnipod5\": {cap}, \"tslimx2\": 2.0, \"mobi\": 12.0, \
         \"minimed780g\": 4.0, \"ilet\": 3.0, \"twiist\": 6.0}}}}",
        narrative = input.narrative.trim(),
        corpus = dimension_corpus(catalog),
        cap = award_cap,
    )
}

/// Stage 5 prompt: current standings + coverage gaps → one question.
pub fn conflict_prompt(
    catalog: &Catalog,
    board: &ScoreBoard,
    intents: Option<&IntentExtraction>,
    gaps: &[u8],
    delta_cap: f64,
) -> String {
    let gap_names: Vec<String> = gaps
        .iter()
        .filter_map(|n| catalog.dimension(*n))
        .map(|d| format!("{}. {}", d.number, d.name))
        .collect();
    let intent_lines: Vec<String> = intents
        .map(|i| {
            i.intents
                .iter()
                .map(|intent| format!("- {} ({:?})", intent.summary, intent.confidence))
                .collect()
        })
        .unwrap_or_default();

    format!(
        "Current standings:\n{standings}\n\n\
         Known intents:\n{intents}\n\n\
         Unaddressed decision-relevant dimensions:\n{gaps}\n\n\
         Write ONE multiple-choice question (2-4 options) that best separates the \
         closely-ranked devices. Each option carries per-device score deltas between \
         -{cap} and {cap}.\n\n\
         Reply with one JSON object:\n\
         {{\"question\": \"...\", \"rationale\": \"...\", \"options\": \
         [{{\"id\": \"a\", \"label\": \"...\", \"deltas\": {{\"<device id>\": 0.0}}}}]}}",
        standings = board_summary(board),
        intents = if intent_lines.is_empty() {
            "- none".to_string()
        } else {
            intent_lines.join("\n")
        },
        gaps = if gap_names.is_empty() {
            "- none".to_string()
        } else {
            gap_names.join("\n")
        },
        cap = delta_cap,
    )
}

/// Stage 6 prompt: everything — catalog, input, standings — for a holistic
/// bonus with dimension citations.
pub fn arbiter_prompt(
    catalog: &Catalog,
    input: &PreferenceInput,
    board: &ScoreBoard,
    bonus_cap: f64,
) -> String {
    let features: Vec<&str> = input.features.iter().map(|f| f.as_str()).collect();
    format!(
        "Patient sliders (1-10): {sliders}\n\
         Selected features: {features}\n\
         Narrative:\n\"\"\"\n{narrative}\n\"\"\"\n\n\
         Current standings after the rule-based and narrative stages:\n{standings}\n\n\
         Device catalog:\n{corpus}\
         Holistically re-score: award each device a bonus between 0 and {cap} points and \
         explain the top choice, citing at least one dimension number in the reasoning.\n\n\
         Reply with one JSON object:\n\
         {{\"bonuses\": {{\"<device id>\": 0.0}}, \"reasoning\": \"...\"}}",
        sliders = slider_summary(input),
        features = if features.is_empty() {
            "none".to_string()
        } else {
            features.join(", ")
        },
        narrative = input.narrative.trim(),
        standings = board_summary(board),
        corpus = dimension_corpus(catalog),
        cap = bonus_cap,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pumpmatch_catalog::BuiltinSource;
    use std::sync::Arc;

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::load(&BuiltinSource).unwrap())
    }

    #[test]
    fn narrative_prompt_contains_corpus_and_narrative() {
        let catalog = catalog();
        let input = PreferenceInput {
            narrative: "I want the smallest possible pump".into(),
            ..Default::default()
        };
        let prompt = narrative_prompt(&catalog, &input, 25.0);
        assert!(prompt.contains("smallest possible pump"));
        assert!(prompt.contains("Tandem Mobi"));
        assert!(prompt.contains("missing_dimensions"));
    }

    #[test]
    fn conflict_prompt_lists_gaps_by_name() {
        let catalog = catalog();
        let board = ScoreBoard::initialize(catalog.device_ids(), 40.0);
        let prompt = conflict_prompt(&catalog, &board, None, &[3, 18], 5.0);
        assert!(prompt.contains("3. Tubing style"));
        assert!(prompt.contains("18. Discretion & visibility"));
    }

    #[test]
    fn arbiter_prompt_contains_standings() {
        let catalog = catalog();
        let board = ScoreBoard::initialize(catalog.device_ids(), 40.0);
        let prompt = arbiter_prompt(&catalog, &PreferenceInput::default(), &board, 20.0);
        assert!(prompt.contains("omnipod5: 40.0"));
        assert!(prompt.contains("dimension number"));
    }
}

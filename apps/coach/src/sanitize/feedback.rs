//! Answer-feedback extraction with the keyword-sentiment score fallback.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::sanitize::{parse_json_object, score_from_json, Extracted};

pub const DEFAULT_SCORE: u8 = 75;
const EXCERPT_CHARS: usize = 200;

/// Where a feedback score came from. Heuristic and default scores carry no
/// real judgement of the answer and should be presented as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreProvenance {
    Parsed,
    Heuristic,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub score: u8,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub explanation: String,
    pub provenance: ScoreProvenance,
}

impl AnswerFeedback {
    /// Used when the generator could not be reached at all.
    pub fn unavailable() -> Self {
        Self {
            score: DEFAULT_SCORE,
            feedback: "Your answer has been received. For detailed feedback, ensure you're \
                providing specific examples and clear explanations."
                .to_string(),
            strengths: strings(&["Answer submitted", "Timely response"]),
            improvements: strings(&[
                "Add specific metrics",
                "Include real examples",
                "Explain technical concepts clearly",
            ]),
            explanation: "Default score - provide more details for accurate evaluation"
                .to_string(),
            provenance: ScoreProvenance::Default,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// First-match-wins sentiment table, scanned over the lowercased response.
pub const SCORE_TERMS: &[(&[&str], u8)] = &[
    (&["excellent", "outstanding", "perfect"], 95),
    (&["very good", "great"], 85),
    (&["good", "solid"], 78),
    (&["average", "adequate"], 70),
    (&["below average", "needs improvement"], 60),
    (&["poor", "weak"], 50),
];

pub fn heuristic_score(raw: &str) -> u8 {
    let text = raw.to_lowercase();
    SCORE_TERMS
        .iter()
        .find(|(terms, _)| terms.iter().any(|t| text.contains(t)))
        .map_or(DEFAULT_SCORE, |(_, score)| *score)
}

fn heuristic_feedback(raw: &str) -> AnswerFeedback {
    let excerpt = if raw.chars().count() > EXCERPT_CHARS {
        format!("{}...", raw.chars().take(EXCERPT_CHARS).collect::<String>())
    } else {
        raw.to_string()
    };

    AnswerFeedback {
        score: heuristic_score(raw),
        feedback: format!("Your answer has been evaluated. {excerpt}"),
        strengths: strings(&["Answer submitted", "Relevant to question"]),
        improvements: strings(&["Review feedback above for specific improvements"]),
        explanation: "Score determined based on answer quality analysis".to_string(),
        provenance: ScoreProvenance::Heuristic,
    }
}

fn text_field(value: &Value, field: &str, default: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn list_field(value: &Value, field: &str, default: &[&str]) -> Vec<String> {
    match value.get(field).and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        None => strings(default),
    }
}

/// Parsed feedback with defaults for missing fields, or the heuristic fallback.
pub fn parse_feedback(raw: &str) -> Extracted<AnswerFeedback> {
    let value = match parse_json_object(raw) {
        Ok(v) => v,
        Err(reason) => {
            warn!("Feedback not parseable ({:?}); scoring by keywords", reason);
            return Extracted::fallback(heuristic_feedback(raw), reason);
        }
    };

    let (score, provenance) = match value.get("score").and_then(score_from_json) {
        Some(score) => (score, ScoreProvenance::Parsed),
        None => (DEFAULT_SCORE, ScoreProvenance::Default),
    };

    Extracted::Parsed(AnswerFeedback {
        score,
        feedback: text_field(
            &value,
            "feedback",
            "Your answer shows understanding. Consider adding more specific examples.",
        ),
        strengths: list_field(&value, "strengths", &["Clear communication"]),
        improvements: list_field(&value, "improvements", &["Add more specific examples"]),
        explanation: text_field(
            &value,
            "ratingExplanation",
            "Based on general answer quality",
        ),
        provenance,
    })
}

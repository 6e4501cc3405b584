//! Résumé classifier: a fixed heuristic rule table over extracted text.
//!
//! Every signal is evaluated against the full text (no short-circuiting) and the
//! weights of triggered signals are summed. The text is accepted at `ACCEPT_THRESHOLD`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Texts shorter than this (in characters) are rejected without scoring.
pub const MIN_RESUME_CHARS: usize = 100;
pub const ACCEPT_THRESHOLD: u8 = 5;
pub const MAX_SCORE: u8 = 8;

/// One row of the rule table.
pub struct Signal {
    pub name: &'static str,
    pattern: &'static str,
    pub weight: u8,
}

pub const SIGNALS: &[Signal] = &[
    Signal {
        name: "experience",
        pattern: r"(?i)(experience|work history|employment)",
        weight: 2,
    },
    Signal {
        name: "education",
        pattern: r"(?i)(education|academic)",
        weight: 2,
    },
    Signal {
        name: "skills",
        pattern: r"(?i)(skills|technical|programming)",
        weight: 1,
    },
    Signal {
        name: "dates",
        pattern: r"(?i)\b(20\d{2}|19\d{2}|present|current)\b",
        weight: 1,
    },
    Signal {
        name: "bullets",
        pattern: r"(•|-|\*|\d\.)",
        weight: 1,
    },
    Signal {
        name: "job_titles",
        pattern: r"(?i)\b(intern|developer|engineer|analyst|manager|director|lead|senior|junior)\b",
        weight: 1,
    },
];

static COMPILED: Lazy<Vec<(&'static Signal, Regex)>> = Lazy::new(|| {
    SIGNALS
        .iter()
        .map(|s| (s, Regex::new(s.pattern).expect("static regex")))
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub accepted: bool,
    pub score: u8,
    pub matched: Vec<&'static str>,
}

impl Signal {
    /// Whether this single rule fires on `text`.
    pub fn matches(&self, text: &str) -> bool {
        COMPILED
            .iter()
            .find(|(s, _)| s.name == self.name)
            .is_some_and(|(_, re)| re.is_match(text))
    }
}

pub fn classify(text: &str) -> ClassificationResult {
    classify_with(text, &COMPILED)
}

/// Scores `text` against `rules`. Each rule is evaluated on its own, so the
/// result does not depend on the order of the slice apart from `matched` order.
fn classify_with(text: &str, rules: &[(&'static Signal, Regex)]) -> ClassificationResult {
    if text.chars().count() < MIN_RESUME_CHARS {
        return ClassificationResult {
            accepted: false,
            score: 0,
            matched: vec![],
        };
    }

    let (matched, total) = rules
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .fold((Vec::new(), 0u8), |(mut names, total), (s, _)| {
            names.push(s.name);
            (names, total.saturating_add(s.weight))
        });
    let score = total.min(MAX_SCORE);

    ClassificationResult {
        accepted: score >= ACCEPT_THRESHOLD,
        score,
        matched,
    }
}

//! Structured text formatter: turns semi-structured generator text into titled sections.
//!
//! Lines are classified by an ordered rule table (first match wins) and folded
//! into sections by a small accumulator. Text that yields no section at all is
//! handed back as plain content.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Plain text longer than this opens a section when none is titled yet.
pub const LONG_LINE_CHARS: usize = 50;
/// Shortest plain line kept as a point.
pub const MIN_POINT_CHARS: usize = 3;
pub const EMPHASIZED_TITLE: &str = "SAMPLE ANSWER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub points: Vec<String>,
    pub is_emphasized: bool,
}

impl Section {
    fn titled(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            is_emphasized: title == EMPHASIZED_TITLE,
            title,
            points: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.title.is_empty() && self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormattedText {
    Plain { content: String },
    Structured { sections: Vec<Section> },
}

impl FormattedText {
    pub fn is_structured(&self) -> bool {
        matches!(self, FormattedText::Structured { .. })
    }

    pub fn sections(&self) -> &[Section] {
        match self {
            FormattedText::Structured { sections } => sections,
            FormattedText::Plain { .. } => &[],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Markup cleaning
// ────────────────────────────────────────────────────────────────────────────

static MARKUP: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?s)```.*?```", ""),
        (r"\*\*(.+?)\*\*", "$1"),
        (r"__(.+?)__", "$1"),
        (r"\*([^*\s][^*\n]*?)\*", "$1"),
        (r"\*\*", ""),
        (r"(?m)^[ \t]*#{1,6}[ \t]*", ""),
        (r"`", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("static regex"), replacement))
    .collect()
});

/// Strips fenced code, bold/italic markers, heading markers and inline code markers.
pub fn strip_markup(text: &str) -> String {
    MARKUP
        .iter()
        .fold(text.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Line rules
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    /// Group 1 is the title; optional group 2 is trailing text kept as the first point.
    OpenSection,
    /// Group 1 is the point with its marker stripped.
    AppendPoint,
}

pub struct LineRule {
    pub name: &'static str,
    pattern: &'static str,
    pub action: LineAction,
}

pub const LINE_RULES: &[LineRule] = &[
    LineRule {
        name: "suggestion_heading",
        pattern: r"(?i)^(structure|key points|examples|tips|steps|approach|what to include|how to structure|important notes|do's and don'ts):\s*(.*)$",
        action: LineAction::OpenSection,
    },
    LineRule {
        name: "capitalized_heading",
        pattern: r"^([A-Z][A-Za-z'\s]*[A-Za-z]):$",
        action: LineAction::OpenSection,
    },
    LineRule {
        name: "bullet",
        pattern: r"^[•\-–—*]\s+(.*)$",
        action: LineAction::AppendPoint,
    },
    LineRule {
        name: "numbered",
        pattern: r"^\d+[.)]\s+(.*)$",
        action: LineAction::AppendPoint,
    },
];

static COMPILED_RULES: Lazy<Vec<(&'static LineRule, Regex)>> = Lazy::new(|| {
    LINE_RULES
        .iter()
        .map(|rule| (rule, Regex::new(rule.pattern).expect("static regex")))
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Title { title: String, rest: Option<String> },
    Point(String),
    Text(String),
}

pub fn classify_line(line: &str) -> Line {
    for (rule, re) in COMPILED_RULES.iter() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        let group = |i: usize| caps.get(i).map(|m| m.as_str().trim().to_string());
        return match rule.action {
            LineAction::OpenSection => Line::Title {
                title: group(1).unwrap_or_default(),
                rest: group(2).filter(|r| !r.is_empty()),
            },
            LineAction::AppendPoint => Line::Point(group(1).unwrap_or_default()),
        };
    }
    Line::Text(line.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Accumulator
// ────────────────────────────────────────────────────────────────────────────

fn close(sections: &mut Vec<Section>, current: Section) {
    if !current.is_empty() {
        sections.push(current);
    }
}

pub fn format_text(text: &str) -> FormattedText {
    let cleaned = strip_markup(text);

    let mut sections = Vec::new();
    let mut current = Section::titled("");

    for line in cleaned.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match classify_line(line) {
            Line::Title { title, rest } => {
                close(&mut sections, std::mem::replace(&mut current, Section::titled(title)));
                current.points.extend(rest);
            }
            Line::Point(point) => {
                if !point.is_empty() {
                    current.points.push(point);
                }
            }
            Line::Text(text) => {
                let len = text.chars().count();
                if current.title.is_empty() && len > LONG_LINE_CHARS {
                    close(&mut sections, std::mem::replace(&mut current, Section::titled(text)));
                } else if len >= MIN_POINT_CHARS {
                    current.points.push(text);
                }
            }
        }
    }
    close(&mut sections, current);

    if sections.is_empty() {
        FormattedText::Plain { content: cleaned }
    } else {
        FormattedText::Structured { sections }
    }
}

//! Interview session state and its partial-update patch.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::FormattedText;
use crate::sanitize::feedback::AnswerFeedback;
use crate::sanitize::questions::{QuestionSet, QUESTIONS_PER_CATEGORY};
use crate::store::Merge;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Medium,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Medium => "medium",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown difficulty level '{0}'")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "medium" => Ok(Difficulty::Medium),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(ParseDifficultyError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewMode {
    Classic,
    Interactive,
    Analytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Technical,
    Behavioral,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Technical => "technical",
            QuestionType::Behavioral => "behavioral",
        }
    }
}

/// Map key for per-question data, rendered as `{questionType}-{index}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct QuestionKey {
    pub kind: QuestionType,
    pub index: usize,
}

impl QuestionKey {
    pub fn new(kind: QuestionType, index: usize) -> Self {
        Self { kind, index }
    }

    pub fn technical(index: usize) -> Self {
        Self::new(QuestionType::Technical, index)
    }

    pub fn behavioral(index: usize) -> Self {
        Self::new(QuestionType::Behavioral, index)
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.as_str(), self.index)
    }
}

#[derive(Debug, Error)]
#[error("malformed question key '{0}'")]
pub struct ParseQuestionKeyError(String);

impl FromStr for QuestionKey {
    type Err = ParseQuestionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseQuestionKeyError(s.to_string());
        let (kind, index) = s.rsplit_once('-').ok_or_else(err)?;
        let kind = match kind {
            "technical" => QuestionType::Technical,
            "behavioral" => QuestionType::Behavioral,
            _ => return Err(err()),
        };
        let index = index.parse().map_err(|_| err())?;
        Ok(Self { kind, index })
    }
}

impl From<QuestionKey> for String {
    fn from(key: QuestionKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for QuestionKey {
    type Error = ParseQuestionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Everything the interview screens read. Only ever replaced through `SessionPatch`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub resume_file: Option<String>,
    pub job_description: String,
    pub difficulty_level: Difficulty,
    pub selected_level: Option<Difficulty>,
    pub interview_mode: Option<InterviewMode>,
    pub current_index: usize,
    pub questions: Option<QuestionSet>,
    pub answers: BTreeMap<QuestionKey, String>,
    pub feedback: BTreeMap<QuestionKey, AnswerFeedback>,
    pub suggestions: BTreeMap<QuestionKey, FormattedText>,
    pub follow_ups: BTreeMap<QuestionKey, String>,
}

impl SessionState {
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty_level: difficulty,
            ..Self::default()
        }
    }

    /// Number of questions available in one category once questions exist.
    pub fn question_count(&self) -> usize {
        if self.questions.is_some() {
            QUESTIONS_PER_CATEGORY
        } else {
            0
        }
    }
}

/// Whole-field partial update. `None` keeps the prior value; nullable fields use
/// `Some(None)` to clear.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub resume_file: Option<Option<String>>,
    pub job_description: Option<String>,
    pub difficulty_level: Option<Difficulty>,
    pub selected_level: Option<Option<Difficulty>>,
    pub interview_mode: Option<Option<InterviewMode>>,
    pub current_index: Option<usize>,
    pub questions: Option<Option<QuestionSet>>,
    pub answers: Option<BTreeMap<QuestionKey, String>>,
    pub feedback: Option<BTreeMap<QuestionKey, AnswerFeedback>>,
    pub suggestions: Option<BTreeMap<QuestionKey, FormattedText>>,
    pub follow_ups: Option<BTreeMap<QuestionKey, String>>,
}

impl Merge for SessionState {
    type Patch = SessionPatch;

    fn merge(&mut self, patch: SessionPatch) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut self.resume_file, patch.resume_file);
        set(&mut self.job_description, patch.job_description);
        set(&mut self.difficulty_level, patch.difficulty_level);
        set(&mut self.selected_level, patch.selected_level);
        set(&mut self.interview_mode, patch.interview_mode);
        set(&mut self.current_index, patch.current_index);
        set(&mut self.questions, patch.questions);
        set(&mut self.answers, patch.answers);
        set(&mut self.feedback, patch.feedback);
        set(&mut self.suggestions, patch.suggestions);
        set(&mut self.follow_ups, patch.follow_ups);
    }
}

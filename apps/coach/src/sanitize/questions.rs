//! Question-set extraction with the exactly-five-per-category invariant.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::sanitize::{parse_json_object, Extracted, FallbackReason};
use crate::session::{Difficulty, QuestionType};

pub const QUESTIONS_PER_CATEGORY: usize = 5;

const TECHNICAL_FIELD: &str = "technicalQuestions";
const BEHAVIORAL_FIELD: &str = "behavioralQuestions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub technical: [String; QUESTIONS_PER_CATEGORY],
    pub behavioral: [String; QUESTIONS_PER_CATEGORY],
}

impl QuestionSet {
    pub fn get(&self, kind: QuestionType, index: usize) -> Option<&str> {
        let list = match kind {
            QuestionType::Technical => &self.technical,
            QuestionType::Behavioral => &self.behavioral,
        };
        list.get(index).map(String::as_str)
    }

    /// Hardcoded set used whenever generation or parsing fails.
    pub fn default_for(difficulty: Difficulty) -> Self {
        let (technical, behavioral) = match difficulty {
            Difficulty::Beginner => (BEGINNER_TECHNICAL, BEGINNER_BEHAVIORAL),
            Difficulty::Medium => (MEDIUM_TECHNICAL, MEDIUM_BEHAVIORAL),
            Difficulty::Advanced => (ADVANCED_TECHNICAL, ADVANCED_BEHAVIORAL),
        };
        Self {
            technical: technical.map(String::from),
            behavioral: behavioral.map(String::from),
        }
    }
}

pub fn technical_placeholder(difficulty: Difficulty) -> String {
    format!("Technical question about {difficulty} concepts")
}

pub fn behavioral_placeholder() -> String {
    "Behavioral question about teamwork and collaboration".to_string()
}

/// Truncates to five entries, right-padding with `placeholder()` when short.
pub fn pad_questions<F>(items: Vec<String>, placeholder: F) -> [String; QUESTIONS_PER_CATEGORY]
where
    F: Fn() -> String,
{
    let mut items = items.into_iter();
    std::array::from_fn(|_| items.next().unwrap_or_else(&placeholder))
}

fn string_entries(value: &Value, field: &'static str) -> Result<Vec<String>, FallbackReason> {
    let array = value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| FallbackReason::InvalidShape(format!("`{field}` must be an array")))?;

    Ok(array
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(String::from)
        .collect())
}

/// Both arrays are required; anything else yields the default set for `difficulty`.
pub fn parse_question_set(raw: &str, difficulty: Difficulty) -> Extracted<QuestionSet> {
    let parsed = parse_json_object(raw).and_then(|value| {
        let technical = string_entries(&value, TECHNICAL_FIELD)?;
        let behavioral = string_entries(&value, BEHAVIORAL_FIELD)?;
        Ok((technical, behavioral))
    });

    match parsed {
        Ok((technical, behavioral)) => {
            debug!(
                "Parsed questions: technical={}, behavioral={}",
                technical.len(),
                behavioral.len()
            );
            Extracted::Parsed(QuestionSet {
                technical: pad_questions(technical, || technical_placeholder(difficulty)),
                behavioral: pad_questions(behavioral, behavioral_placeholder),
            })
        }
        Err(reason) => {
            warn!("Question payload unusable ({:?}); using {difficulty} defaults", reason);
            Extracted::fallback(QuestionSet::default_for(difficulty), reason)
        }
    }
}

const BEGINNER_TECHNICAL: [&str; QUESTIONS_PER_CATEGORY] = [
    "Explain the concept of variables and data types in programming.",
    "What is version control and why is it important?",
    "Describe the difference between front-end and back-end development.",
    "What are the basic HTTP methods and their purposes?",
    "Explain what a database is and give an example of when you would use one.",
];

const BEGINNER_BEHAVIORAL: [&str; QUESTIONS_PER_CATEGORY] = [
    "Tell me about a time when you learned a new programming concept.",
    "Describe a group project you worked on and your role in it.",
    "How do you approach solving a coding problem you've never seen before?",
    "What do you do when you get stuck on a technical problem?",
    "Why are you interested in a career in this field?",
];

const MEDIUM_TECHNICAL: [&str; QUESTIONS_PER_CATEGORY] = [
    "Explain the concept of closures and provide a practical use case.",
    "What is the difference between SQL and NoSQL databases? When would you use each?",
    "Describe the SOLID principles in object-oriented programming.",
    "How does a virtual DOM work and what are its benefits?",
    "Explain the concept of CI/CD and its importance in modern software development.",
];

const MEDIUM_BEHAVIORAL: [&str; QUESTIONS_PER_CATEGORY] = [
    "Tell me about a time when you had to debug a critical production issue under pressure.",
    "Describe a situation where you disagreed with a team member. How did you handle it?",
    "Share an example of a project where you had to learn a new technology quickly.",
    "How do you prioritize tasks when working on multiple projects with tight deadlines?",
    "Tell me about a time when you received constructive criticism. How did you respond?",
];

const ADVANCED_TECHNICAL: [&str; QUESTIONS_PER_CATEGORY] = [
    "Design a scalable microservices architecture for a high-traffic e-commerce platform.",
    "Explain how you would implement a distributed caching system and handle cache invalidation.",
    "Describe the trade-offs between different database replication strategies.",
    "How would you design a system to handle 1 million concurrent WebSocket connections?",
    "Explain the CAP theorem and its implications for distributed system design.",
];

const ADVANCED_BEHAVIORAL: [&str; QUESTIONS_PER_CATEGORY] = [
    "Describe a time when you had to lead a major architectural redesign. What challenges did you face?",
    "How do you mentor junior engineers and help them grow in their careers?",
    "Tell me about a time you had to make a critical technical decision with incomplete information.",
    "Describe your approach to managing technical debt in a large codebase.",
    "How do you handle conflict between engineering teams with different technical priorities?",
];

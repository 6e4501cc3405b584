// Prompt templates for the interview flow.
// Placeholders in `{braces}` are substituted in one pass by `fill`, so values
// containing placeholder-like text are never expanded.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, RESUME_CONTENT_LABEL};
use crate::session::Difficulty;

/// Replace: {resume_label}, {resume_text}, {target}, {difficulty_guidance},
///          {difficulty}, {json_only}
const QUESTIONS_PROMPT_TEMPLATE: &str = r#"You are an expert interview coach. Analyze the resume provided and generate personalized interview questions.

{resume_label}
{resume_text}

{target}

{difficulty_guidance}

Generate TWO SEPARATE types of questions based on the candidate's experience, skills, and projects mentioned in their resume:

1. TECHNICAL QUESTIONS (5 questions):
   - Focus on technical skills, technologies, and tools mentioned in the resume
   - Ask about projects, architectures, and technical decisions they made
   - Difficulty level: {difficulty}

2. BEHAVIORAL QUESTIONS (5 questions):
   - Focus on past experiences, challenges, and achievements from their resume
   - Use STAR method format (Situation, Task, Action, Result)
   - Start with: "Tell me about a time...", "Describe a situation...", "In your role at [company]..."

{json_only}

Return this exact shape:
{
  "technicalQuestions": ["q1", "q2", "q3", "q4", "q5"],
  "behavioralQuestions": ["q1", "q2", "q3", "q4", "q5"]
}

The questions MUST reference specific technologies, projects, or experiences from the resume."#;

/// Replace: {question}, {answer}, {json_only}
const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are a strict technical interview evaluator. Analyze this interview answer and provide ACCURATE scoring from 0-100.

Question: {question}
Answer: {answer}

CRITERIA FOR SCORING (0-100):
- 90-100: Excellent - Clear, detailed, specific examples, correct technical depth
- 80-89: Good - Covers main points, some examples, mostly correct
- 70-79: Average - Basic understanding, vague, lacks examples
- 60-69: Below Average - Incomplete, technical inaccuracies
- Below 60: Poor - Major gaps or incorrect information

{json_only}

{
  "score": <integer 0-100>,
  "feedback": "<2-3 sentences of specific feedback>",
  "strengths": ["strength1", "strength2"],
  "improvements": ["improvement1", "improvement2"],
  "ratingExplanation": "<brief explanation of why this score>"
}"#;

/// Replace: {question}
const SAMPLE_ANSWER_PROMPT_TEMPLATE: &str = r#"You are an expert technical interviewer. Provide a COMPLETE SAMPLE ANSWER for this interview question that would score 95+/100.

Question: {question}

FORMAT THE ANSWER AS FOLLOWS:
SAMPLE ANSWER:
[Start with a complete paragraph introducing your approach]

DETAILED EXPLANATION:
• [Break down the key components]
• [Include specific examples]
• [Discuss challenges and solutions]

EXAMPLE SCENARIO:
• [Describe a real project/situation]
• [Include numbers/metrics/results]

KEY POINTS TO REMEMBER:
• [Summarize critical elements]
• [Common pitfalls to avoid]

Keep it between 250 and 400 words, professional but conversational, with specific numbers and real tools."#;

/// Replace: {question}, {answer}
const FOLLOW_UP_PROMPT_TEMPLATE: &str = r#"You are an expert interviewer. Based on the candidate's answer, generate a relevant follow-up question that digs deeper.

Original Question: {question}
Candidate's Answer: {answer}

Generate one thoughtful follow-up question that helps explore their understanding further or clarifies specific points. Reply with the question only."#;

/// Shown when sample-answer generation fails. Replace: {question}
const SAMPLE_ANSWER_FALLBACK_TEMPLATE: &str = "SAMPLE ANSWER:
When addressing \"{question}\", I would approach it by first understanding the core requirements and then applying systematic problem-solving.

DETAILED EXPLANATION:
• Start by clarifying the problem scope and constraints
• Break down complex problems into manageable components
• Apply relevant design patterns or architectural principles
• Consider edge cases and failure scenarios
• Optimize for performance, scalability, and maintainability

EXAMPLE SCENARIO:
• In my previous role, I implemented a caching solution using Redis
• This reduced API response times from 300ms to 50ms (83% improvement)
• The system handled 10,000+ concurrent users with 99.9% uptime

KEY POINTS TO REMEMBER:
• Always start with requirements clarification
• Discuss trade-offs between different approaches
• Include specific metrics and results
• Connect back to business impact";

pub const FOLLOW_UP_FALLBACK: &str = "Can you elaborate on how you would handle a situation \
    where the initial approach doesn't work as expected?";

pub fn difficulty_guidance(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Beginner => {
            "Generate basic, fundamental questions suitable for entry-level/junior positions."
        }
        Difficulty::Medium => {
            "Generate practical, experience-based questions suitable for mid-level positions."
        }
        Difficulty::Advanced => {
            "Generate complex, system-level and leadership questions suitable for senior/expert positions."
        }
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("static regex"));

/// Substitutes every known `{key}` in `template`. Unknown keys stay verbatim.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map_or_else(|| caps[0].to_string(), |(_, v)| v.to_string())
        })
        .into_owned()
}

pub fn questions_prompt(resume_text: &str, job_description: &str, difficulty: Difficulty) -> String {
    let job_description = job_description.trim();
    let target = if job_description.is_empty() {
        "Generate questions for a general technical role".to_string()
    } else {
        format!("Target Job Description: {job_description}")
    };

    fill(
        QUESTIONS_PROMPT_TEMPLATE,
        &[
            ("resume_label", RESUME_CONTENT_LABEL),
            ("resume_text", resume_text),
            ("target", target.as_str()),
            ("difficulty_guidance", difficulty_guidance(difficulty)),
            ("difficulty", difficulty.as_str()),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

pub fn evaluation_prompt(question: &str, answer: &str) -> String {
    fill(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("question", question),
            ("answer", answer),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

pub fn sample_answer_prompt(question: &str) -> String {
    fill(SAMPLE_ANSWER_PROMPT_TEMPLATE, &[("question", question)])
}

pub fn follow_up_prompt(question: &str, answer: &str) -> String {
    fill(FOLLOW_UP_PROMPT_TEMPLATE, &[("question", question), ("answer", answer)])
}

pub fn sample_answer_fallback(question: &str) -> String {
    fill(SAMPLE_ANSWER_FALLBACK_TEMPLATE, &[("question", question)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_prompt_without_job_description() {
        let prompt = questions_prompt("Senior engineer at Acme", "  ", Difficulty::Beginner);
        assert!(prompt.contains("Resume Content:\nSenior engineer at Acme"));
        assert!(prompt.contains("Generate questions for a general technical role"));
        assert!(prompt.contains("entry-level/junior"));
        assert!(prompt.contains("Difficulty level: beginner"));
        assert!(prompt.contains("technicalQuestions"));
        assert!(!prompt.contains("{json_only}"));
    }

    #[test]
    fn test_questions_prompt_with_job_description() {
        let prompt = questions_prompt("text", "Platform engineer, Kubernetes", Difficulty::Advanced);
        assert!(prompt.contains("Target Job Description: Platform engineer, Kubernetes"));
        assert!(prompt.contains("senior/expert"));
    }

    #[test]
    fn test_resume_text_with_braces_not_expanded() {
        let prompt = questions_prompt("Built {difficulty} parser", "", Difficulty::Medium);
        assert!(prompt.contains("Built {difficulty} parser"));
    }

    #[test]
    fn test_job_description_placeholders_stay_literal() {
        let prompt = questions_prompt(
            "Rust developer",
            "Paste {resume_text} here at {difficulty} level",
            Difficulty::Advanced,
        );
        assert!(prompt.contains("Target Job Description: Paste {resume_text} here at {difficulty} level"));
        assert_eq!(prompt.matches("Rust developer").count(), 1);
        assert!(prompt.contains("Difficulty level: advanced"));
    }

    #[test]
    fn test_question_mentioning_answer_placeholder_kept() {
        let prompt = evaluation_prompt("What does {answer} mean in Rust?", "A lock.");
        assert!(prompt.contains("Question: What does {answer} mean in Rust?"));
        assert!(prompt.contains("Answer: A lock."));

        let prompt = follow_up_prompt("Explain {answer} and {json_only}", "Shared state.");
        assert!(prompt.contains("Original Question: Explain {answer} and {json_only}"));
        assert!(prompt.contains("Candidate's Answer: Shared state."));
    }

    #[test]
    fn test_unknown_placeholder_left_verbatim() {
        assert_eq!(fill("a {x} {y}", &[("y", "1")]), "a {x} 1");
        assert_eq!(fill("{ \"k\": 1 }", &[]), "{ \"k\": 1 }");
    }

    #[test]
    fn test_evaluation_prompt_embeds_question_and_answer() {
        let prompt = evaluation_prompt("What is a mutex?", "A lock.");
        assert!(prompt.contains("Question: What is a mutex?"));
        assert!(prompt.contains("Answer: A lock."));
        assert!(prompt.contains("\"ratingExplanation\""));
    }

    #[test]
    fn test_sample_answer_fallback_names_question() {
        let text = sample_answer_fallback("Explain CAP");
        assert!(text.starts_with("SAMPLE ANSWER:"));
        assert!(text.contains("\"Explain CAP\""));
    }

    #[test]
    fn test_follow_up_prompt() {
        let prompt = follow_up_prompt("Q", "A");
        assert!(prompt.contains("Original Question: Q"));
        assert!(prompt.contains("Candidate's Answer: A"));
    }
}

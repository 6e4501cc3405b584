//! Interview flow: upload to questions, answer to feedback plus sample answer, follow-ups.
//!
//! Generation failures never leave this module. Each generator call degrades to a
//! fixed fallback and logs why. File-input failures propagate as `AppError`.

pub mod prompts;
pub mod transcript;

pub use transcript::{TranscriptBuffer, TranscriptFragment};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::format::{format_text, FormattedText};
use crate::ingest::{classify, extract_upload, ClassificationResult, ExtractedText, UploadSource};
use crate::llm_client::{GenerationRequest, TextGenerator};
use crate::sanitize::feedback::{parse_feedback, AnswerFeedback};
use crate::sanitize::questions::{parse_question_set, QuestionSet};
use crate::sanitize::{Extracted, FallbackReason};
use crate::session::{Difficulty, InterviewMode, QuestionKey, QuestionType, SessionPatch};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct IngestedResume {
    pub document: ExtractedText,
    pub classification: ClassificationResult,
}

/// Both halves of an answer evaluation, as committed to the session.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub feedback: Extracted<AnswerFeedback>,
    pub suggestion: FormattedText,
}

async fn generate_text(
    generator: &dyn TextGenerator,
    prompt: String,
    purpose: &str,
) -> Result<String, FallbackReason> {
    generator
        .generate(&GenerationRequest::new(prompt))
        .await
        .map_err(|e| {
            warn!("{purpose} generation failed: {e}");
            FallbackReason::Generation(e.to_string())
        })
}

/// Extract then classify. Rejected text surfaces as `AppError::NotAResume`.
pub async fn ingest_resume(upload: &dyn UploadSource) -> Result<IngestedResume, AppError> {
    let document = extract_upload(upload).await?;
    let classification = classify(&document.text);
    debug!(
        "Classified {}: score={} matched={:?}",
        document.source_file_name, classification.score, classification.matched
    );

    if !classification.accepted {
        warn!(
            "{} rejected as non-resume (score {})",
            document.source_file_name, classification.score
        );
        return Err(AppError::NotAResume {
            score: classification.score,
        });
    }

    Ok(IngestedResume {
        document,
        classification,
    })
}

/// Ingests the upload, generates the question set and commits it in one update.
pub async fn prepare_interview(
    state: &AppState,
    upload: &dyn UploadSource,
    job_description: &str,
) -> Result<Extracted<QuestionSet>, AppError> {
    let resume = ingest_resume(upload).await?;
    let difficulty = state.session().difficulty_level;

    info!(
        "Generating {difficulty} questions for {}",
        resume.document.source_file_name
    );
    let prompt = prompts::questions_prompt(&resume.document.text, job_description, difficulty);
    let questions = match generate_text(state.generator.as_ref(), prompt, "Question").await {
        Ok(raw) => parse_question_set(&raw, difficulty),
        Err(reason) => Extracted::fallback(QuestionSet::default_for(difficulty), reason),
    };

    state.store.set_state(SessionPatch {
        resume_file: Some(Some(resume.document.source_file_name)),
        job_description: Some(job_description.to_string()),
        questions: Some(Some(questions.value().clone())),
        current_index: Some(0),
        ..Default::default()
    });

    Ok(questions)
}

pub fn record_answer(state: &AppState, key: QuestionKey, answer: &str) {
    state.store.update(|s| {
        let mut answers = s.answers.clone();
        answers.insert(key, answer.to_string());
        SessionPatch {
            answers: Some(answers),
            ..Default::default()
        }
    });
}

async fn generate_feedback(
    generator: &dyn TextGenerator,
    question: &str,
    answer: &str,
) -> Extracted<AnswerFeedback> {
    let prompt = prompts::evaluation_prompt(question, answer);
    match generate_text(generator, prompt, "Feedback").await {
        Ok(raw) => parse_feedback(&raw),
        Err(reason) => Extracted::fallback(AnswerFeedback::unavailable(), reason),
    }
}

async fn generate_suggestion(generator: &dyn TextGenerator, question: &str) -> FormattedText {
    let prompt = prompts::sample_answer_prompt(question);
    match generate_text(generator, prompt, "Sample answer").await {
        Ok(raw) => format_text(&raw),
        Err(_) => format_text(&prompts::sample_answer_fallback(question)),
    }
}

/// Commits the answer, then evaluates it and generates a sample answer together.
/// Returns `None` for a blank answer.
pub async fn evaluate_answer(
    state: &AppState,
    key: QuestionKey,
    question: &str,
    answer: &str,
) -> Option<Evaluation> {
    if answer.trim().is_empty() {
        debug!("Ignoring empty answer for {key}");
        return None;
    }

    record_answer(state, key, answer);

    let generator = state.generator.as_ref();
    let (feedback, suggestion) = tokio::join!(
        generate_feedback(generator, question, answer),
        generate_suggestion(generator, question),
    );
    info!(
        "Evaluated {key}: score={} ({:?})",
        feedback.value().score,
        feedback.value().provenance
    );

    state.store.update(|s| {
        let mut feedback_map = s.feedback.clone();
        feedback_map.insert(key, feedback.value().clone());
        let mut suggestions = s.suggestions.clone();
        suggestions.insert(key, suggestion.clone());
        SessionPatch {
            feedback: Some(feedback_map),
            suggestions: Some(suggestions),
            ..Default::default()
        }
    });

    Some(Evaluation {
        feedback,
        suggestion,
    })
}

/// One probing follow-up question, committed under `key`.
pub async fn request_follow_up(
    state: &AppState,
    key: QuestionKey,
    question: &str,
    answer: &str,
) -> String {
    let prompt = prompts::follow_up_prompt(question, answer);
    let follow_up = match generate_text(state.generator.as_ref(), prompt, "Follow-up").await {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        Ok(_) => {
            warn!("Follow-up generation returned blank text for {key}");
            prompts::FOLLOW_UP_FALLBACK.to_string()
        }
        Err(_) => prompts::FOLLOW_UP_FALLBACK.to_string(),
    };

    state.store.update(|s| {
        let mut follow_ups = s.follow_ups.clone();
        follow_ups.insert(key, follow_up.clone());
        SessionPatch {
            follow_ups: Some(follow_ups),
            ..Default::default()
        }
    });

    follow_up
}

pub fn select_difficulty(state: &AppState, level: Difficulty) {
    state.store.set_state(SessionPatch {
        difficulty_level: Some(level),
        selected_level: Some(Some(level)),
        ..Default::default()
    });
}

/// Clears the explicit choice and returns to the default level.
pub fn clear_difficulty(state: &AppState) {
    state.store.set_state(SessionPatch {
        difficulty_level: Some(Difficulty::default()),
        selected_level: Some(None),
        ..Default::default()
    });
}

pub fn select_mode(state: &AppState, mode: Option<InterviewMode>) {
    state.store.set_state(SessionPatch {
        interview_mode: Some(mode),
        ..Default::default()
    });
}

/// Where `next_question` moved the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QuestionStep {
    /// Next question in the same category, at this index.
    Advanced(usize),
    /// Technical set exhausted; index reset to 0 in this category.
    SwitchedTo(QuestionType),
    /// Last behavioral question answered. `current_index` is left alone.
    Finished,
}

/// Advances within `active`. After the last technical question the interview
/// moves to the behavioral set; after the last behavioral question it is over.
pub fn next_question(state: &AppState, active: QuestionType) -> QuestionStep {
    let mut step = QuestionStep::Finished;
    state.store.update(|s| {
        let count = s.question_count();
        step = if count == 0 {
            QuestionStep::Finished
        } else if s.current_index + 1 < count {
            QuestionStep::Advanced(s.current_index + 1)
        } else if active == QuestionType::Technical {
            QuestionStep::SwitchedTo(QuestionType::Behavioral)
        } else {
            QuestionStep::Finished
        };
        let current_index = match step {
            QuestionStep::Advanced(i) => Some(i),
            QuestionStep::SwitchedTo(_) => Some(0),
            QuestionStep::Finished => None,
        };
        SessionPatch {
            current_index,
            ..Default::default()
        }
    });
    debug!("Next question from {}: {:?}", active.as_str(), step);
    step
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::ingest::ExtractionError;
    use crate::llm_client::GenerationError;
    use crate::sanitize::feedback::ScoreProvenance;

    type Script = Box<dyn Fn(&str) -> Result<String, GenerationError> + Send + Sync>;

    /// Answers each prompt through a closure and counts calls.
    struct ScriptedGenerator {
        script: Script,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new<F>(script: F) -> Arc<Self>
        where
            F: Fn(&str) -> Result<String, GenerationError> + Send + Sync + 'static,
        {
            Arc::new(Self {
                script: Box::new(script),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Self::new(|_| Err(GenerationError::EmptyContent))
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.script)(&request.prompt)
        }
    }

    struct MemoryUpload {
        name: String,
        bytes: Bytes,
    }

    impl MemoryUpload {
        fn new(name: &str, text: &str) -> Self {
            Self {
                name: name.to_string(),
                bytes: Bytes::from(text.to_string()),
            }
        }
    }

    #[async_trait]
    impl UploadSource for MemoryUpload {
        fn name(&self) -> &str {
            &self.name
        }

        fn len(&self) -> u64 {
            self.bytes.len() as u64
        }

        async fn read_all(&self) -> std::io::Result<Bytes> {
            Ok(self.bytes.clone())
        }
    }

    const RESUME: &str = "Alex Rivera\n\
        Professional Experience\n\
        Senior Software Engineer, Acme Corp (2019 - Present)\n\
        • Led migration of billing services to Rust\n\
        • Reduced p99 latency by 40%\n\
        Education\n\
        B.S. Computer Science, State University, 2015\n\
        Skills: Rust, PostgreSQL, Kubernetes\n";

    const QUESTIONS_JSON: &str = r#"Here you go:
```json
{"technicalQuestions": ["How did you migrate billing to Rust?", "T2", "T3", "T4", "T5"],
 "behavioralQuestions": ["B1", "B2", "B3"]}
```"#;

    fn state_with(generator: Arc<ScriptedGenerator>) -> AppState {
        AppState::new(generator, Difficulty::Medium)
    }

    #[tokio::test]
    async fn test_prepare_interview_commits_questions() {
        let generator = ScriptedGenerator::new(|prompt| {
            assert!(prompt.contains("Led migration of billing services"));
            assert!(prompt.contains("Target Job Description: Rust platform role"));
            Ok(QUESTIONS_JSON.to_string())
        });
        let state = state_with(generator.clone());

        let upload = MemoryUpload::new("alex.txt", RESUME);
        let questions = prepare_interview(&state, &upload, "Rust platform role")
            .await
            .unwrap();

        assert!(questions.is_parsed());
        let session = state.session();
        let set = session.questions.as_ref().unwrap();
        assert_eq!(set.technical[0], "How did you migrate billing to Rust?");
        assert_eq!(set.behavioral[3], "Behavioral question about teamwork and collaboration");
        assert_eq!(session.resume_file.as_deref(), Some("alex.txt"));
        assert_eq!(session.job_description, "Rust platform role");
        assert_eq!(session.current_index, 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prepare_interview_generation_failure_uses_defaults() {
        let state = state_with(ScriptedGenerator::failing());
        select_difficulty(&state, Difficulty::Advanced);

        let upload = MemoryUpload::new("alex.txt", RESUME);
        let questions = prepare_interview(&state, &upload, "").await.unwrap();

        assert!(matches!(
            questions.fallback_reason(),
            Some(FallbackReason::Generation(_))
        ));
        assert_eq!(
            state.session().questions.as_ref(),
            Some(&QuestionSet::default_for(Difficulty::Advanced))
        );
    }

    #[tokio::test]
    async fn test_short_text_upload_rejected_before_generation() {
        let generator = ScriptedGenerator::new(|_| Ok(QUESTIONS_JSON.to_string()));
        let state = state_with(generator.clone());

        // 50 bytes: well under the size cap, well under the classifier's length floor.
        let upload = MemoryUpload::new("note.txt", &"a".repeat(50));
        let err = prepare_interview(&state, &upload, "").await.unwrap_err();

        assert!(matches!(err, AppError::NotAResume { score: 0 }));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(state.session().questions.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_upload_propagates() {
        let state = state_with(ScriptedGenerator::failing());
        let upload = MemoryUpload::new("resume.odt", RESUME);
        let err = prepare_interview(&state, &upload, "").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_evaluate_answer_commits_feedback_and_suggestion_together() {
        let generator = ScriptedGenerator::new(|prompt| {
            if prompt.contains("strict technical interview evaluator") {
                Ok(r#"{"score": 82, "feedback": "Good use of metrics."}"#.to_string())
            } else {
                Ok("SAMPLE ANSWER:\nStart with the bottleneck.\nKEY POINTS:\n- Measure first".to_string())
            }
        });
        let state = state_with(generator.clone());
        let rounds = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&rounds);
        let _sub = state.store.subscribe(move |s| {
            assert!(s.feedback.contains_key(&QuestionKey::technical(1)));
            assert!(s.suggestions.contains_key(&QuestionKey::technical(1)));
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let key = QuestionKey::technical(1);
        let evaluation = evaluate_answer(&state, key, "How do you tune a slow API?", "Profile it.")
            .await
            .unwrap();

        assert_eq!(evaluation.feedback.value().score, 82);
        assert_eq!(evaluation.feedback.value().provenance, ScoreProvenance::Parsed);
        assert_eq!(evaluation.suggestion.sections()[0].title, "SAMPLE ANSWER");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);

        let session = state.session();
        assert_eq!(session.answers.get(&key).map(String::as_str), Some("Profile it."));
        assert_eq!(session.feedback.get(&key).map(|f| f.score), Some(82));

        // Answer commit and result commit coalesce into one notification round.
        assert!(state.store.flush());
        assert!(!state.store.flush());
        assert_eq!(rounds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_evaluate_answer_degrades_when_generator_down() {
        let state = state_with(ScriptedGenerator::failing());
        let key = QuestionKey::behavioral(0);
        let evaluation = evaluate_answer(&state, key, "Tell me about a conflict", "We talked.")
            .await
            .unwrap();

        assert_eq!(evaluation.feedback.value(), &AnswerFeedback::unavailable());
        assert!(matches!(
            evaluation.feedback.fallback_reason(),
            Some(FallbackReason::Generation(_))
        ));
        let sections = evaluation.suggestion.sections();
        assert!(sections[0].is_emphasized);
        assert!(sections[0].points[0].contains("Tell me about a conflict"));
        assert_eq!(state.session().suggestions.get(&key), Some(&evaluation.suggestion));
    }

    #[tokio::test]
    async fn test_blank_answer_ignored() {
        let generator = ScriptedGenerator::new(|_| Ok("{}".to_string()));
        let state = state_with(generator.clone());

        let result = evaluate_answer(&state, QuestionKey::technical(0), "Q", "   \n").await;

        assert!(result.is_none());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(state.session().answers.is_empty());
        assert!(!state.store.has_pending());
    }

    #[tokio::test]
    async fn test_follow_up_trimmed_and_committed() {
        let state = state_with(ScriptedGenerator::new(|_| {
            Ok("  What would you monitor first?\n".to_string())
        }));
        let key = QuestionKey::technical(2);
        let follow_up = request_follow_up(&state, key, "Q", "A").await;
        assert_eq!(follow_up, "What would you monitor first?");
        assert_eq!(
            state.session().follow_ups.get(&key).map(String::as_str),
            Some("What would you monitor first?")
        );
    }

    #[tokio::test]
    async fn test_follow_up_fallback() {
        let state = state_with(ScriptedGenerator::failing());
        let follow_up = request_follow_up(&state, QuestionKey::behavioral(1), "Q", "A").await;
        assert_eq!(follow_up, prompts::FOLLOW_UP_FALLBACK);
    }

    #[test]
    fn test_difficulty_selection_and_clear() {
        let state = state_with(ScriptedGenerator::failing());
        select_difficulty(&state, Difficulty::Beginner);
        assert_eq!(state.session().difficulty_level, Difficulty::Beginner);
        assert_eq!(state.session().selected_level, Some(Difficulty::Beginner));

        clear_difficulty(&state);
        assert_eq!(state.session().difficulty_level, Difficulty::Medium);
        assert_eq!(state.session().selected_level, None);
    }

    #[test]
    fn test_select_mode() {
        let state = state_with(ScriptedGenerator::failing());
        select_mode(&state, Some(InterviewMode::Interactive));
        assert_eq!(state.session().interview_mode, Some(InterviewMode::Interactive));
        select_mode(&state, None);
        assert_eq!(state.session().interview_mode, None);
    }

    fn with_questions_at(state: &AppState, index: usize) {
        state.store.set_state(SessionPatch {
            questions: Some(Some(QuestionSet::default_for(Difficulty::Medium))),
            current_index: Some(index),
            ..Default::default()
        });
    }

    #[test]
    fn test_next_question_advances_within_category() {
        let state = state_with(ScriptedGenerator::failing());
        with_questions_at(&state, 2);
        assert_eq!(
            next_question(&state, QuestionType::Technical),
            QuestionStep::Advanced(3)
        );
        assert_eq!(state.session().current_index, 3);
    }

    #[test]
    fn test_last_technical_question_switches_to_behavioral() {
        let state = state_with(ScriptedGenerator::failing());
        with_questions_at(&state, 4);
        assert_eq!(
            next_question(&state, QuestionType::Technical),
            QuestionStep::SwitchedTo(QuestionType::Behavioral)
        );
        assert_eq!(state.session().current_index, 0);
    }

    #[test]
    fn test_last_behavioral_question_finishes_without_moving() {
        let state = state_with(ScriptedGenerator::failing());
        with_questions_at(&state, 4);
        assert_eq!(
            next_question(&state, QuestionType::Behavioral),
            QuestionStep::Finished
        );
        assert_eq!(state.session().current_index, 4);
    }

    #[test]
    fn test_next_question_without_questions_is_finished() {
        let state = state_with(ScriptedGenerator::failing());
        assert_eq!(
            next_question(&state, QuestionType::Technical),
            QuestionStep::Finished
        );
        assert_eq!(state.session().current_index, 0);
    }
}

use thiserror::Error;

use crate::ingest::ExtractionError;
use crate::llm_client::GenerationError;

/// Application-level error type.
/// `user_facing` gives the stable code and message a front end should display.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("This does not appear to be a resume (score {score})")]
    NotAResume { score: u8 },

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_facing(&self) -> (&'static str, String) {
        match self {
            AppError::Extraction(e) => {
                let code = match e {
                    ExtractionError::TooLarge { .. } => "FILE_TOO_LARGE",
                    ExtractionError::UnsupportedFormat { .. } | ExtractionError::LegacyDoc => {
                        "UNSUPPORTED_FORMAT"
                    }
                    ExtractionError::Pdf(_) | ExtractionError::Docx(_) => "UNREADABLE_DOCUMENT",
                    ExtractionError::Read(_) => "READ_ERROR",
                };
                (code, e.to_string())
            }
            AppError::NotAResume { .. } => (
                "NOT_A_RESUME",
                "The uploaded file does not appear to be a resume. Please upload a resume \
                 with your experience, education and skills."
                    .to_string(),
            ),
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                (
                    "GENERATION_ERROR",
                    "The question service is unavailable right now".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

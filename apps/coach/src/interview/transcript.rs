//! Voice transcription boundary. Interim fragments are ignored; final fragments
//! accumulate until the caller folds them into an answer.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptFragment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    finals: Vec<String>,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: TranscriptFragment) {
        if !fragment.is_final {
            return;
        }
        let text = fragment.text.trim();
        if !text.is_empty() {
            self.finals.push(text.to_string());
        }
    }

    pub fn transcript(&self) -> String {
        self.finals.join(" ")
    }

    /// Appends the transcript to `existing` once and resets the buffer.
    pub fn finish(&mut self, existing: &str) -> String {
        let transcript = self.transcript();
        self.finals.clear();
        if transcript.is_empty() {
            existing.to_string()
        } else {
            format!("{existing} {transcript}")
        }
    }
}

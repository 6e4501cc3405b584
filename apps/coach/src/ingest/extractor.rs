//! Document extractor: turns an uploaded blob into plain text, dispatched on the declared extension.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ingest::docx::extract_docx_text;

/// 10 MiB, checked before any parsing (and before reading, for `UploadSource`s).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File too large. Please upload a file smaller than 10MB.")]
    TooLarge { size: u64, limit: u64 },

    #[error("Unsupported file format. Please upload PDF, DOCX, DOC, or TXT files.")]
    UnsupportedFormat { extension: String },

    #[error("Old .doc format detected. Please convert to .docx or .pdf.")]
    LegacyDoc,

    #[error("Failed to parse PDF file. Please ensure it is a valid PDF document.")]
    Pdf(String),

    #[error("Failed to parse DOCX file. Please ensure it is a valid Word document.")]
    Docx(String),

    #[error("Failed to read file: {0}")]
    Read(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Text,
    Pdf,
    Docx,
    LegacyDoc,
}

impl DocumentKind {
    fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "txt" => Some(DocumentKind::Text),
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "doc" => Some(DocumentKind::LegacyDoc),
            _ => None,
        }
    }
}

/// An upload held in memory for the duration of one extraction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub file_name: String,
    pub declared_extension: String,
}

impl RawDocument {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let declared_extension = declared_extension(&file_name);
        Self {
            bytes: bytes.into(),
            file_name,
            declared_extension,
        }
    }
}

/// Lowercased text after the last `.`; the whole lowercased name when there is none.
pub fn declared_extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or(file_name)
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub source_file_name: String,
}

pub async fn extract(document: RawDocument) -> Result<ExtractedText, ExtractionError> {
    let size = document.bytes.len() as u64;
    check_size(size)?;

    let kind = DocumentKind::from_extension(&document.declared_extension).ok_or_else(|| {
        ExtractionError::UnsupportedFormat {
            extension: document.declared_extension.clone(),
        }
    })?;

    debug!(
        "Extracting {} ({:?}, {} bytes)",
        document.file_name, kind, size
    );

    let raw = match kind {
        DocumentKind::Text => decode_utf8(&document.bytes),
        DocumentKind::Pdf => {
            let bytes = document.bytes.clone();
            tokio::task::spawn_blocking(move || pdf_text(&bytes))
                .await
                .map_err(|e| ExtractionError::Pdf(format!("decoder aborted: {e}")))??
        }
        DocumentKind::Docx => {
            let bytes = document.bytes.clone();
            tokio::task::spawn_blocking(move || extract_docx_text(&bytes))
                .await
                .map_err(|e| ExtractionError::Docx(format!("decoder aborted: {e}")))?
                .map_err(|e| ExtractionError::Docx(e.to_string()))?
        }
        DocumentKind::LegacyDoc => return Err(ExtractionError::LegacyDoc),
    };

    let text = match raw.trim() {
        "" => {
            warn!("{} produced no text; substituting placeholder", document.file_name);
            format!("Resume uploaded: {}", document.file_name)
        }
        trimmed => trimmed.to_string(),
    };

    info!(
        "Extracted {} chars from {}",
        text.chars().count(),
        document.file_name
    );

    Ok(ExtractedText {
        text,
        source_file_name: document.file_name,
    })
}

fn check_size(size: u64) -> Result<(), ExtractionError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ExtractionError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

fn decode_utf8(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

/// Pages in ascending order; tokens within a page joined by one space, pages by a newline.
fn pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    Ok(pages
        .iter()
        .map(|page| page.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n"))
}

// ────────────────────────────────────────────────────────────────────────────
// File input boundary
// ────────────────────────────────────────────────────────────────────────────

/// Opaque upload handle: name, declared length, whole-document read. No streaming.
#[async_trait]
pub trait UploadSource: Send + Sync {
    fn name(&self) -> &str;
    fn len(&self) -> u64;
    async fn read_all(&self) -> std::io::Result<Bytes>;
}

/// Enforces the size cap on the declared length before reading any bytes.
pub async fn extract_upload(source: &dyn UploadSource) -> Result<ExtractedText, ExtractionError> {
    check_size(source.len())?;
    let bytes = source.read_all().await?;
    extract(RawDocument::new(source.name(), bytes)).await
}

/// An upload backed by a file on local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    len: u64,
}

impl LocalFile {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = tokio::fs::metadata(&path).await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { path, name, len })
    }
}

#[async_trait]
impl UploadSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.len
    }

    async fn read_all(&self) -> std::io::Result<Bytes> {
        tokio::fs::read(&self.path).await.map(Bytes::from)
    }
}

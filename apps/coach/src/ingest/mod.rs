// Upload ingestion: document extraction and the résumé gate.
// Extraction failures are user-facing; classification never fails, it only scores.

pub mod classifier;
pub mod docx;
pub mod extractor;

pub use classifier::{classify, ClassificationResult};
pub use extractor::{
    extract, extract_upload, ExtractedText, ExtractionError, LocalFile, RawDocument,
    UploadSource, MAX_UPLOAD_BYTES,
};

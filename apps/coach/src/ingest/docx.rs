//! Raw-text extraction from the body of a `.docx` archive.

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::ingest::extractor::MAX_UPLOAD_BYTES;

const BODY_PART: &str = "word/document.xml";

/// Ceiling on the decompressed document body. The upload cap only bounds the
/// compressed archive.
pub const MAX_BODY_BYTES: u64 = 4 * MAX_UPLOAD_BYTES;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("not a readable zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to read word/document.xml: {0}")]
    Io(#[from] std::io::Error),

    #[error("word/document.xml has no document body")]
    NoBody,

    #[error("word/document.xml expands beyond {limit} bytes")]
    BodyTooLarge { limit: u64 },
}

// Text runs, tabs, line breaks and paragraph ends in document order.
static BODY_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>/]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>|</w:p>")
        .expect("static regex")
});

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("static regex"));

pub fn extract_docx_text(bytes: &[u8]) -> Result<String, DocxError> {
    extract_capped(bytes, MAX_BODY_BYTES)
}

/// The declared size is checked first; the read itself is bounded too, since
/// the header can lie.
fn extract_capped(bytes: &[u8], limit: u64) -> Result<String, DocxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let part = archive.by_name(BODY_PART)?;
    if part.size() > limit {
        return Err(DocxError::BodyTooLarge { limit });
    }

    let mut xml = String::new();
    part.take(limit + 1).read_to_string(&mut xml)?;
    if xml.len() as u64 > limit {
        return Err(DocxError::BodyTooLarge { limit });
    }
    body_text(&xml)
}

/// Paragraphs are each followed by a blank line.
fn body_text(xml: &str) -> Result<String, DocxError> {
    if !xml.contains("<w:body") {
        return Err(DocxError::NoBody);
    }

    let mut out = String::with_capacity(xml.len() / 4);
    for caps in BODY_TOKENS.captures_iter(xml) {
        let token = caps.get(0).map_or("", |m| m.as_str());
        if let Some(text) = caps.get(1) {
            out.push_str(&unescape_xml(text.as_str()));
        } else if token.starts_with("<w:tab") {
            out.push('\t');
        } else if token.starts_with("</w:p") {
            out.push_str("\n\n");
        } else {
            out.push('\n');
        }
    }
    Ok(out)
}

fn unescape_xml(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            match entity {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => {
                    let code = match entity.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                        .map(String::from)
                        .unwrap_or_else(|| caps[0].to_string())
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Builds a minimal .docx archive whose body holds `paragraphs_xml`.
    pub(crate) fn docx_fixture(paragraphs_xml: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{paragraphs_xml}</w:body></w:document>"#
        );
        let mut buf = Cursor::new(Vec::new());
        {
            let options = zip::write::FileOptions::default();
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer.start_file("[Content_Types].xml", options).unwrap();
            writer.write_all(b"<Types/>").unwrap();
            writer.start_file(BODY_PART, options).unwrap();
            writer.write_all(document.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_paragraphs_separated_by_blank_line() {
        let bytes = docx_fixture(
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p><w:p><w:r><w:t>Engineer</w:t></w:r></w:p>",
        );
        assert_eq!(extract_docx_text(&bytes).unwrap(), "Jane Doe\n\nEngineer\n\n");
    }

    #[test]
    fn test_runs_joined_and_preserve_space() {
        let bytes = docx_fixture(
            r#"<w:p><w:r><w:t xml:space="preserve">Senior </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>Developer</w:t></w:r></w:p>"#,
        );
        assert_eq!(extract_docx_text(&bytes).unwrap(), "Senior Developer\n\n");
    }

    #[test]
    fn test_tabs_breaks_and_entities() {
        let bytes = docx_fixture(
            "<w:p><w:r><w:t>R&amp;D</w:t><w:tab/><w:t>2020</w:t><w:br/><w:t>&#8226; Rust &lt;3</w:t></w:r></w:p>",
        );
        assert_eq!(extract_docx_text(&bytes).unwrap(), "R&D\t2020\n• Rust <3\n\n");
    }

    #[test]
    fn test_self_closing_text_run_is_empty() {
        let bytes = docx_fixture(
            r#"<w:p><w:r><w:t xml:space="preserve"/></w:r><w:r><w:t>After</w:t></w:r></w:p>"#,
        );
        assert_eq!(extract_docx_text(&bytes).unwrap(), "After\n\n");
    }

    #[test]
    fn test_not_a_zip_fails() {
        assert!(matches!(
            extract_docx_text(b"plain text, not an archive"),
            Err(DocxError::Archive(_))
        ));
    }

    #[test]
    fn test_missing_body_part_fails() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("other.xml", zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(b"<x/>").unwrap();
            writer.finish().unwrap();
        }
        assert!(extract_docx_text(&buf.into_inner()).is_err());
    }

    #[test]
    fn test_body_over_limit_rejected() {
        let run = "a".repeat(64 * 1024);
        let bytes = docx_fixture(&format!("<w:p><w:r><w:t>{run}</w:t></w:r></w:p>"));
        assert!(bytes.len() < 4 * 1024, "fixture compresses well");
        assert!(matches!(
            extract_capped(&bytes, 16 * 1024),
            Err(DocxError::BodyTooLarge { limit }) if limit == 16 * 1024
        ));
        assert!(extract_capped(&bytes, 128 * 1024).is_ok());
    }

    #[test]
    fn test_unknown_numeric_entity_left_verbatim() {
        assert_eq!(unescape_xml("a&#xD800;b"), "a&#xD800;b");
    }
}

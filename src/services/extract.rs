//! Document Text Extraction
//!
//! Turns uploaded bytes into plain text for indexing. Supported inputs:
//! - PDF (`application/pdf`) via `pdf-extract`
//! - Word (`.docx`, and `application/msword` when the payload is OOXML) via
//!   `zip` + `quick-xml`
//! - any `text/*` type, decoded as UTF-8 (lossy)

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::Event;
use tracing::debug;

use crate::utils::error::{AppError, AppResult};

/// Maximum accepted document size (10MB)
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Extracted text shorter than this is rejected.
pub const MIN_EXTRACTED_CHARS: usize = 50;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_MSWORD: &str = "application/msword";

/// Extract trimmed plain text from `bytes` of the given MIME type.
pub fn extract_text(bytes: &[u8], mime_type: &str) -> AppResult<String> {
    if bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(AppError::validation(format!(
            "File too large: {:.1} MB (max {:.1} MB)",
            bytes.len() as f64 / (1024.0 * 1024.0),
            MAX_DOCUMENT_BYTES as f64 / (1024.0 * 1024.0)
        )));
    }

    let mime = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let text = match mime.as_str() {
        MIME_PDF => extract_pdf(bytes)?,
        MIME_DOCX | MIME_MSWORD => extract_docx(bytes)?,
        m if m.starts_with("text/") => String::from_utf8_lossy(bytes).into_owned(),
        other => {
            return Err(AppError::unsupported_format(format!(
                "{} (supported: PDF, Word, text/*)",
                if other.is_empty() { "unknown" } else { other }
            )))
        }
    };

    let trimmed = text.trim();
    let chars = trimmed.chars().count();
    if chars < MIN_EXTRACTED_CHARS {
        return Err(AppError::empty_content(format!(
            "extracted {} characters, need at least {}",
            chars, MIN_EXTRACTED_CHARS
        )));
    }

    debug!(mime = %mime, chars, "extracted document text");
    Ok(trimmed.to_string())
}

/// Guess a MIME type from a file extension.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => MIME_PDF,
        "docx" => MIME_DOCX,
        "doc" => MIME_MSWORD,
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "txt" | "text" | "log" | "rst" => "text/plain",
        _ => "application/octet-stream",
    }
}

fn extract_pdf(bytes: &[u8]) -> AppResult<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::extraction(format!("Failed to extract PDF text: {}", e)))
}

/// Collect `<w:t>` runs from `word/document.xml`, one line per paragraph.
fn extract_docx(bytes: &[u8]) -> AppResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::extraction(format!("Failed to read Word document as ZIP: {}", e)))?;

    let mut doc_xml = String::new();
    {
        let mut entry = archive
            .by_name("word/document.xml")
            .map_err(|_| AppError::extraction("Invalid Word document: missing word/document.xml"))?;
        entry
            .read_to_string(&mut doc_xml)
            .map_err(|e| AppError::extraction(format!("Failed to read document.xml: {}", e)))?;
    }

    let mut reader = quick_xml::Reader::from_str(&doc_xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| AppError::extraction(format!("XML parse error: {}", err)))?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AppError::extraction(format!("XML parse error: {}", e))),
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(document_xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    const LONG_TEXT: &str =
        "Retrieval augmented generation grounds model answers in indexed source documents.";

    #[test]
    fn plain_text_is_trimmed() {
        let input = format!("   \n{}\n\n", LONG_TEXT);
        let text = extract_text(input.as_bytes(), "text/plain; charset=utf-8").unwrap();
        assert_eq!(text, LONG_TEXT);
    }

    #[test]
    fn any_text_subtype_is_accepted() {
        assert!(extract_text(LONG_TEXT.as_bytes(), "text/markdown").is_ok());
        assert!(extract_text(LONG_TEXT.as_bytes(), "TEXT/CSV").is_ok());
    }

    #[test]
    fn short_text_is_empty_content() {
        let err = extract_text(b"too short", "text/plain").unwrap_err();
        assert!(matches!(err, AppError::EmptyContent(_)));
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let err = extract_text(LONG_TEXT.as_bytes(), "image/png").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
        let err = extract_text(LONG_TEXT.as_bytes(), "").unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn oversized_input_is_rejected() {
        let bytes = vec![b'a'; MAX_DOCUMENT_BYTES + 1];
        let err = extract_text(&bytes, "text/plain").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Paris is the capital</w:t></w:r><w:r><w:t xml:space="preserve"> of France.</w:t></w:r></w:p>
    <w:p></w:p>
    <w:p><w:r><w:t>Berlin is the capital of Germany &amp; its largest city.</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = extract_text(&docx_bytes(xml), MIME_DOCX).unwrap();
        assert_eq!(
            text,
            "Paris is the capital of France.\nBerlin is the capital of Germany & its largest city."
        );
    }

    #[test]
    fn msword_with_ooxml_payload_is_accepted() {
        let xml = format!(
            r#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
            LONG_TEXT
        );
        assert_eq!(extract_text(&docx_bytes(&xml), MIME_MSWORD).unwrap(), LONG_TEXT);
    }

    #[test]
    fn corrupt_docx_is_extraction_error() {
        let err = extract_text(b"definitely not a zip archive at all, just bytes", MIME_DOCX).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn mime_guess_from_extension() {
        assert_eq!(mime_type_for_path(Path::new("report.PDF")), MIME_PDF);
        assert_eq!(mime_type_for_path(Path::new("notes.md")), "text/markdown");
        assert_eq!(mime_type_for_path(Path::new("letter.docx")), MIME_DOCX);
        assert_eq!(mime_type_for_path(Path::new("archive.tar")), "application/octet-stream");
    }
}

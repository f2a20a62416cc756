//! File extraction feeding the index flow.

use std::io::{Cursor, Write};

use citerag::commands::read_document;
use citerag::services::extract::{extract_text, MIME_DOCX};
use citerag::AppError;

use super::common::{default_harness, long_document};

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

#[tokio::test]
async fn word_document_can_be_indexed_and_queried() {
    let bytes = docx(&[
        "Refunds are issued within fourteen days of receiving the returned item.",
        "Shipping is free for orders above fifty euros within the European Union.",
    ]);
    let text = extract_text(&bytes, MIME_DOCX).unwrap();
    assert_eq!(text.lines().count(), 2);

    let h = default_harness();
    let stats = h.service.index(&text, "policy.docx", true).await.unwrap();
    assert_eq!(stats.chunks_created, 1);

    let response = h
        .service
        .query("How long do refunds take?", None, None)
        .await
        .unwrap()
        .into_response();
    assert_eq!(response.citations.len(), 1);
    assert_eq!(response.citations[0].source, "policy.docx");
}

#[test]
fn text_file_from_disk() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("earth.md");
    let body = long_document(500);
    std::fs::write(&path, &body).unwrap();
    assert_eq!(read_document(&path).unwrap(), body);
}

#[test]
fn nearly_empty_word_document_is_rejected() {
    let err = extract_text(&docx(&["Too short."]), MIME_DOCX).unwrap_err();
    assert!(matches!(err, AppError::EmptyContent(_)));
}

#[test]
fn unsupported_mime_type_is_rejected() {
    let err = extract_text(long_document(100).as_bytes(), "application/json").unwrap_err();
    assert!(matches!(err, AppError::UnsupportedFormat(_)));
}

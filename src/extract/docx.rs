//! DOCX text from `word/document.xml`.
//!
//! Only `w:t` runs contribute text. Paragraph ends become newlines, `w:tab`
//! becomes a tab, and `w:br`/`w:cr` become line breaks.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractionError;

/// Main document part inside the package.
const DOCUMENT_PART: &str = "word/document.xml";

/// Upper bound on the decompressed document part.
const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

/// Extract plain text from a DOCX file.
pub fn extract_docx_text(path: &Path) -> Result<String, ExtractionError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ExtractionError::ExtractionFailed(format!("not a DOCX package: {}", e)))?;

    let part = archive.by_name(DOCUMENT_PART).map_err(|_| {
        ExtractionError::ExtractionFailed(format!("missing {} in package", DOCUMENT_PART))
    })?;

    let mut xml = Vec::new();
    part.take(MAX_DOCUMENT_XML_BYTES).read_to_end(&mut xml)?;

    parse_document_xml(&xml)
}

/// Collect run text from WordprocessingML.
pub(crate) fn parse_document_xml(xml: &[u8]) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut text = String::new();
    let mut in_text_run = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = true,
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::CData(e)) if in_text_run => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(e)) if in_text_run => {
                let name = String::from_utf8_lossy(&e);
                if let Some(resolved) = resolve_entity(&name) {
                    text.push_str(&resolved);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::ExtractionFailed(format!(
                    "malformed document XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text.trim_end().to_string())
}

/// Resolve a predefined or numeric character reference (name without `&`/`;`).
fn resolve_entity(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    resolve_predefined_entity(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn body(paragraphs: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NS}><w:body>{paragraphs}</w:body></w:document>"#
        )
    }

    #[test]
    fn test_paragraphs_runs_and_tabs() {
        let xml = body(
            r#"<w:p><w:r><w:t>Term</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve"> Sheet</w:t></w:r></w:p><w:p><w:r><w:t>Line one</w:t><w:br/><w:t>Line two</w:t></w:r></w:p>"#,
        );
        let text = parse_document_xml(xml.as_bytes()).unwrap();
        assert_eq!(text, "Term\t Sheet\nLine one\nLine two");
    }

    #[test]
    fn test_entities_are_resolved() {
        let xml = body(r#"<w:p><w:r><w:t>Smith &amp; Sons &#169; &#x2014; &lt;A&gt;</w:t></w:r></w:p>"#);
        let text = parse_document_xml(xml.as_bytes()).unwrap();
        assert_eq!(text, "Smith & Sons \u{a9} \u{2014} <A>");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("quot").as_deref(), Some("\""));
        assert_eq!(resolve_entity("apos").as_deref(), Some("'"));
        assert_eq!(resolve_entity("#65").as_deref(), Some("A"));
        assert_eq!(resolve_entity("nbsp"), None);
        assert_eq!(resolve_entity("#xD800"), None);
    }

    #[test]
    fn test_non_run_text_is_ignored() {
        let xml = body(
            r#"<w:p><w:r><w:instrText>PAGE</w:instrText><w:t>Visible</w:t></w:r></w:p>"#,
        );
        assert_eq!(parse_document_xml(xml.as_bytes()).unwrap(), "Visible");
    }

    #[test]
    fn test_empty_document_is_empty_text() {
        let xml = body("");
        assert_eq!(parse_document_xml(xml.as_bytes()).unwrap(), "");
    }

    #[test]
    fn test_extract_from_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agreement.docx");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(body(r#"<w:p><w:r><w:t>Hello</w:t></w:r></w:p>"#).as_bytes())
            .unwrap();
        zip.finish().unwrap();

        assert_eq!(extract_docx_text(&path).unwrap(), "Hello");
    }

    #[test]
    fn test_non_zip_is_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, b"not a zip").unwrap();

        let err = extract_docx_text(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(ref m) if m.contains("DOCX")));
    }

    #[test]
    fn test_missing_document_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.docx");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.finish().unwrap();

        let err = extract_docx_text(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(ref m) if m.contains("missing")));
    }
}

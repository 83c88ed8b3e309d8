//! Text extraction by document kind.
//!
//! The kind is chosen from the file extension, case-insensitively.
//! Extractors return the raw text; emptiness is judged by the ingestor.

use aura_core::error::IngestError;
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Doc,
    Docx,
    Txt,
    Md,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Result<Self, IngestError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "doc" => Ok(Self::Doc),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            "md" => Ok(Self::Md),
            _ => Err(IngestError::UnsupportedDocumentType(if ext.is_empty() {
                filename.to_string()
            } else {
                ext
            })),
        }
    }

    /// Category label stored with the record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Md => "md",
        }
    }

    pub fn extractor(&self) -> &'static dyn TextExtractor {
        match self {
            Self::Pdf => &PdfExtractor,
            Self::Doc | Self::Docx => &WordXmlExtractor,
            Self::Txt | Self::Md => &PlainTextExtractor,
        }
    }
}

/// Turns document bytes into text. Errors are human-readable reasons.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, String>;
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, String> {
        let text = std::str::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {e}"))?;
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string())
    }
}

/// Reads `word/document.xml` out of an Office Open XML container.
/// Legacy binary `.doc` files are not zip containers and fail here.
pub struct WordXmlExtractor;

static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>|<w:br\s*/>").expect("valid regex"));
static TAB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<w:tab\s*/>").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

impl TextExtractor for WordXmlExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| format!("not a Word document container: {e}"))?;
        let mut part = archive
            .by_name("word/document.xml")
            .map_err(|e| format!("missing word/document.xml: {e}"))?;

        let mut xml = String::new();
        part.read_to_string(&mut xml).map_err(|e| e.to_string())?;

        Ok(xml_to_text(&xml))
    }
}

fn xml_to_text(xml: &str) -> String {
    let text = PARAGRAPH_END.replace_all(xml, "\n");
    let text = TAB.replace_all(&text, "\t");
    let text = TAG.replace_all(&text, "");
    unescape_xml(&text)
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Extract text from `bytes`, choosing the extractor from `filename`.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<(DocumentKind, String), IngestError> {
    let kind = DocumentKind::from_filename(filename)?;
    let text = kind
        .extractor()
        .extract(bytes)
        .map_err(|reason| IngestError::ExtractionFailed {
            file: filename.to_string(),
            reason,
        })?;
    Ok((kind, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(document_xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn kind_from_extension_is_case_insensitive() {
        assert_eq!(DocumentKind::from_filename("Guide.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("notes.md").unwrap(), DocumentKind::Md);
        assert_eq!(DocumentKind::from_filename("a.b.docx").unwrap(), DocumentKind::Docx);
    }

    #[test]
    fn unsupported_extension_rejected() {
        let err = DocumentKind::from_filename("photo.png").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedDocumentType(ref e) if e == "png"));

        let err = DocumentKind::from_filename("README").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedDocumentType(ref e) if e == "README"));
    }

    #[test]
    fn plain_text_strips_bom() {
        let (_, text) = extract_text("a.txt", "\u{feff}hello".as_bytes()).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn invalid_utf8_fails_extraction() {
        let err = extract_text("a.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, IngestError::ExtractionFailed { .. }));
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>Brand voice</w:t></w:r></w:p><w:p><w:r><w:t>Fish &amp; chips</w:t></w:r></w:p></w:body></w:document>"#;
        let (kind, text) = extract_text("style.docx", &docx_with(xml)).unwrap();
        assert_eq!(kind, DocumentKind::Docx);
        assert_eq!(text.trim(), "Brand voice\nFish & chips");
    }

    #[test]
    fn legacy_doc_fails_extraction() {
        let err = extract_text("old.doc", b"\xd0\xcf\x11\xe0 binary").unwrap_err();
        assert!(matches!(err, IngestError::ExtractionFailed { .. }));
    }
}

//! Plain-text extraction for uploaded application documents.
//!
//! Two formats are accepted: PDF and WordprocessingML (`.docx`). The caller
//! supplies bytes plus the declared media type; this module returns UTF-8
//! text. Extraction is pure and deterministic.

use std::io::Read;

use crate::error::ExtractError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Maximum decompressed bytes read from `word/document.xml` (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

const DOCX_BODY_ENTRY: &str = "word/document.xml";

/// A document format the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    WordXml,
}

impl DocumentFormat {
    /// Resolves a declared media type. Parameters such as `; charset=` are ignored.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            MIME_PDF => Some(DocumentFormat::Pdf),
            MIME_DOCX => Some(DocumentFormat::WordXml),
            _ => None,
        }
    }

    /// Guesses the media type from a file extension, for CLI submissions.
    pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(MIME_PDF),
            "docx" => Some(MIME_DOCX),
            _ => None,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => MIME_PDF,
            DocumentFormat::WordXml => MIME_DOCX,
        }
    }
}

/// Extracts plain text from `bytes` according to the declared `media_type`.
pub fn extract_text(bytes: &[u8], media_type: &str) -> Result<String, ExtractError> {
    match DocumentFormat::from_media_type(media_type) {
        Some(DocumentFormat::Pdf) => extract_pdf(bytes),
        Some(DocumentFormat::WordXml) => extract_docx(bytes),
        None => Err(ExtractError::UnsupportedFormat(media_type.to_string())),
    }
}

/// Pages in order, runs within a page joined by one space, pages joined by one space.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Corrupt(format!("PDF: {}", e)))?;

    let mut out = String::new();
    for page in &pages {
        for run in page.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(run);
        }
    }
    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Corrupt(format!("DOCX archive: {}", e)))?;
    let entry = archive.by_name(DOCX_BODY_ENTRY).map_err(|e| {
        ExtractError::Corrupt(format!("DOCX: {} missing: {}", DOCX_BODY_ENTRY, e))
    })?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Corrupt(format!("DOCX: {}", e)))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Corrupt(format!(
            "DOCX: {} exceeds size limit ({} bytes)",
            DOCX_BODY_ENTRY, MAX_XML_ENTRY_BYTES
        )));
    }
    extract_paragraph_text(&doc_xml)
}

/// Collects `<w:t>` text, one line per `<w:p>` paragraph. Tabs and breaks
/// inside a paragraph become whitespace so adjacent words do not fuse.
fn extract_paragraph_text(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Corrupt(format!("DOCX XML: {}", e)))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Corrupt(format!("DOCX XML: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}

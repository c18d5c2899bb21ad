//! CV text extraction. PDFs go through `pdf-extract`, DOCX bodies are read
//! from `word/document.xml`, and everything else must be readable text.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use bytes::Bytes;
use regex::Regex;
use thiserror::Error;

/// Shortest extracted text accepted as a CV.
pub const MIN_CV_TEXT_CHARS: usize = 50;

/// Largest share of control or replacement characters tolerated in a text upload.
const MAX_BINARY_RATIO: f64 = 0.05;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const DOCX_BODY: &str = "word/document.xml";
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Runs of text, paragraph ends, breaks and tabs in WordprocessingML.
static DOCX_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|</w:p>|<w:br\s*/>|<w:tab\s*/>")
        .expect("docx token regex is valid")
});

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX text extraction failed: {0}")]
    Docx(String),

    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Extracted text too short. Try another CV file.")]
    TooShort,
}

/// What the client told us about an uploaded file.
#[derive(Debug, Clone, Default)]
pub struct UploadMeta<'a> {
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Docx,
    Text,
}

impl UploadMeta<'_> {
    fn has_extension(&self, ext: &str) -> bool {
        self.filename
            .map(|f| f.to_lowercase().ends_with(ext))
            .unwrap_or(false)
    }

    fn has_content_type(&self, expected: &str) -> bool {
        self.content_type
            .map(|c| c.eq_ignore_ascii_case(expected))
            .unwrap_or(false)
    }
}

pub fn is_pdf(data: &[u8], meta: &UploadMeta<'_>) -> bool {
    data.starts_with(PDF_MAGIC) || meta.has_extension(".pdf") || meta.has_content_type("application/pdf")
}

/// Any zip payload is treated as DOCX; other zip files fail on the missing body part.
pub fn is_docx(data: &[u8], meta: &UploadMeta<'_>) -> bool {
    data.starts_with(ZIP_MAGIC) || meta.has_extension(".docx") || meta.has_content_type(DOCX_CONTENT_TYPE)
}

pub fn detect_kind(data: &[u8], meta: &UploadMeta<'_>) -> UploadKind {
    if is_pdf(data, meta) {
        UploadKind::Pdf
    } else if is_docx(data, meta) {
        UploadKind::Docx
    } else {
        UploadKind::Text
    }
}

/// Extracts plain text, strips NUL characters, trims, and enforces the minimum length.
/// CPU-bound: run it off the async executor.
pub fn extract_text(data: &Bytes, meta: &UploadMeta<'_>) -> Result<String, ExtractError> {
    let raw = match detect_kind(data, meta) {
        UploadKind::Pdf => pdf_extract::extract_text_from_mem(data)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        UploadKind::Docx => extract_docx_text(data)?,
        UploadKind::Text => {
            let text = String::from_utf8_lossy(data).into_owned();
            if looks_binary(&text) {
                return Err(ExtractError::Unsupported(
                    "upload a PDF, DOCX or plain-text CV".to_string(),
                ));
            }
            text
        }
    };

    let text = clean_text(&raw);
    if text.chars().count() < MIN_CV_TEXT_CHARS {
        return Err(ExtractError::TooShort);
    }
    Ok(text)
}

fn extract_docx_text(data: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| ExtractError::Docx(format!("{DOCX_BODY}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    Ok(docx_xml_to_text(&xml))
}

/// Flattens a WordprocessingML body to text, one line per paragraph.
pub fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    for caps in DOCX_TOKEN.captures_iter(xml) {
        match caps.get(1) {
            Some(run) => out.push_str(&decode_xml_entities(run.as_str())),
            None if caps[0].starts_with("<w:tab") => out.push('\t'),
            None => out.push('\n'),
        }
    }
    out
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// NUL is ignored here; it is stripped later and penalised by the readability score.
fn looks_binary(text: &str) -> bool {
    let mut total = 0usize;
    let mut suspicious = 0usize;
    for c in text.chars() {
        total += 1;
        if c == '\u{FFFD}' || (c.is_control() && !matches!(c, '\0' | '\n' | '\r' | '\t')) {
            suspicious += 1;
        }
    }
    total > 0 && suspicious as f64 / total as f64 > MAX_BINARY_RATIO
}

pub fn clean_text(raw: &str) -> String {
    raw.replace('\0', "").trim().to_string()
}

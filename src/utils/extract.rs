// src/utils/extract.rs

use std::io::{Cursor, Read};

use quick_xml::{Reader, events::Event};
use zip::ZipArchive;

use crate::error::AppError;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Body part of a Word document inside the DOCX archive.
const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
    Text,
}

impl ResumeFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::Docx => DOCX_MIME,
            ResumeFormat::Text => "text/plain",
        }
    }
}

/// Picks the format from the extension, falling back to the declared content type.
///
/// `.doc` is accepted as a Word upload; legacy binary files then fail extraction.
pub fn detect_format(file_name: &str, content_type: Option<&str>) -> Result<ResumeFormat, AppError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let format = match extension.as_str() {
        "pdf" => Some(ResumeFormat::Pdf),
        "docx" | "doc" => Some(ResumeFormat::Docx),
        "txt" => Some(ResumeFormat::Text),
        _ => None,
    };

    format
        .or(match content_type {
            Some("application/pdf") => Some(ResumeFormat::Pdf),
            Some(DOCX_MIME | "application/msword") => Some(ResumeFormat::Docx),
            Some("text/plain") => Some(ResumeFormat::Text),
            _ => None,
        })
        .ok_or_else(|| {
            AppError::BadRequest(
                "Unsupported file format, upload a PDF, Word or plain text file".to_string(),
            )
        })
}

pub fn extract_text(bytes: &[u8], format: ResumeFormat) -> Result<String, AppError> {
    let text = match format {
        ResumeFormat::Pdf => pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            tracing::warn!("PDF extraction failed: {}", e);
            AppError::BadRequest("Could not read the PDF file".to_string())
        })?,
        ResumeFormat::Docx => docx_text(bytes).map_err(|e| {
            tracing::warn!("DOCX extraction failed: {}", e);
            AppError::BadRequest("Could not read the Word document".to_string())
        })?,
        ResumeFormat::Text => String::from_utf8_lossy(bytes).into_owned(),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest(
            "No text could be extracted from the file".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// Text runs of a DOCX body, one line per paragraph.
fn docx_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                text.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

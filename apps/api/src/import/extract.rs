//! Document text extraction for PDF import.
//!
//! `pdf-extract` is synchronous and CPU-bound, so it runs inside
//! `tokio::task::spawn_blocking`. A panic inside the parser surfaces as a
//! `JoinError` and is reported as an unreadable file, never as a crashed request.

use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

/// Leading bytes every PDF file starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub text: String,
    pub page_count: usize,
}

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("Could not extract text from PDF. The file may be image-based or empty.")]
    Empty,

    #[error("Could not read PDF: {0}")]
    Unreadable(String),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::UnprocessableEntity(err.to_string())
    }
}

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Extracts the plain text of every page. Whitespace-only output is an error.
pub async fn extract_text(bytes: Vec<u8>) -> Result<ExtractedDocument, ExtractError> {
    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| ExtractError::Unreadable(e.to_string()))
    })
    .await
    .map_err(|e| {
        warn!("PDF parser aborted: {e}");
        ExtractError::Unreadable("the file is corrupt or uses unsupported features".to_string())
    })??;

    let document = join_pages(pages)?;
    debug!(
        "Extracted {} chars from {} PDF pages",
        document.text.len(),
        document.page_count
    );
    Ok(document)
}

fn join_pages(pages: Vec<String>) -> Result<ExtractedDocument, ExtractError> {
    let page_count = pages.len();
    let text = pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(ExtractedDocument { text, page_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(!looks_like_pdf(b"PK\x03\x04 docx"));
        assert!(!looks_like_pdf(b""));
    }

    #[test]
    fn test_join_pages_counts_every_page() {
        let document = join_pages(vec![
            "  Ada Lovelace\nEngineer ".to_string(),
            "\n\n".to_string(),
            "Experience".to_string(),
        ])
        .unwrap();
        assert_eq!(document.page_count, 3);
        assert_eq!(document.text, "Ada Lovelace\nEngineer\n\nExperience");
    }

    #[test]
    fn test_whitespace_only_pages_are_empty() {
        assert_eq!(
            join_pages(vec![" \n\t".to_string(), String::new()]),
            Err(ExtractError::Empty)
        );
        assert_eq!(join_pages(Vec::new()), Err(ExtractError::Empty));
    }

    #[test]
    fn test_extract_error_maps_to_422() {
        let err: AppError = ExtractError::Empty.into();
        assert!(matches!(
            err,
            AppError::UnprocessableEntity(ref m) if m.contains("image-based or empty")
        ));
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_unreadable() {
        let result = extract_text(b"%PDF-1.4\nthis is not really a pdf".to_vec()).await;
        assert!(matches!(result, Err(ExtractError::Unreadable(_))));
    }
}

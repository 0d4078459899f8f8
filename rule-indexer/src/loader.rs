//! Source-format-agnostic document text loading.

use crate::errors::IndexError;
use std::path::Path;
use tracing::info;

/// Reads the full text of a source document.
///
/// `.pdf` files go through `pdf-extract`; anything else is read as UTF-8
/// text.
///
/// # Errors
/// Returns [`IndexError::Io`] for filesystem problems and
/// [`IndexError::Pdf`] when PDF byte extraction fails.
pub fn load_text(path: impl AsRef<Path>) -> Result<String, IndexError> {
    let path = path.as_ref();

    let is_pdf = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    let text = if is_pdf {
        pdf_extract::extract_text(path).map_err(|e| IndexError::Pdf(e.to_string()))?
    } else {
        std::fs::read_to_string(path)?
    };

    info!("loaded {} chars from {:?}", text.chars().count(), path);
    Ok(text)
}

#[cfg(test)]
mod tests;

use std::path::Path;

use tracing::{debug, info};

use crate::RagError;

/// Whether the path names a PDF file, judged by extension only
#[inline]
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Extract the text of every page, concatenated in page order.
///
/// # Errors
///
/// Returns [`RagError::Pdf`] if the path is not a `.pdf` file, does not
/// exist, or cannot be parsed.
#[inline]
pub fn extract_text(path: &Path) -> Result<String, RagError> {
    if !is_pdf_path(path) {
        return Err(RagError::Pdf(format!(
            "Not a PDF file: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(RagError::Pdf(format!(
            "File not found: {}",
            path.display()
        )));
    }

    debug!("Extracting text from {}", path.display());
    let text = pdf_extract::extract_text(path)
        .map_err(|e| RagError::Pdf(format!("Failed to read {}: {}", path.display(), e)))?;

    info!(
        "Extracted {} characters from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

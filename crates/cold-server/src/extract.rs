//! Text extraction seam. The analyzer consumes already-extracted UTF-8
//! text; PDF and OCR extraction run in a separate service, so the only
//! extractor here validates plain text.

use anyhow::{bail, Result};

pub(crate) trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

pub(crate) struct Utf8Extractor;

impl TextExtractor for Utf8Extractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(bytes)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            bail!("document contains no text");
        }
        Ok(trimmed.to_string())
    }
}

//! Rich-text rendering seam.

use folio_api_types::RichText;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RichTextError {
    #[error("malformed rich text document: {0}")]
    Malformed(String),
}

/// Renders an opaque CMS rich-text document to HTML markup.
///
/// The document shape belongs to the CMS editor; folio only carries it from
/// the page document to a renderer. Failures propagate to the caller, they
/// are not swallowed at the block level.
pub trait RichTextRenderer: Send + Sync {
    fn render(&self, document: &RichText) -> Result<String, RichTextError>;
}

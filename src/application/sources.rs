//! Collaborator seams consumed by the application services.
//!
//! The content source and the submission endpoint are external systems; the
//! services only ever see these traits, so tests substitute stubs without any
//! ambient context.

use async_trait::async_trait;
use folio_api_types::{PageDocument, SubmissionRequest};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content source request failed: {0}")]
    Transport(String),
    #[error("content source returned a malformed document: {0}")]
    Malformed(String),
}

/// Content source: one operation, fetch a page document by slug.
///
/// A slug with no matching document is `Ok(None)`, not an error.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, slug: &str) -> Result<Option<PageDocument>, SourceError>;
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("submission endpoint returned status {status}")]
    Status { status: u16 },
    #[error("submission request failed: {0}")]
    Transport(String),
}

/// Form-submission endpoint: accepts the JSON submission payload.
///
/// Callers treat every error variant uniformly; the distinction exists only
/// for diagnostics.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<(), GatewayError>;
}

//! Landing page assembly.

use std::sync::Arc;

use axum::http::StatusCode;
use folio_api_types::{Block, FormReference};
use metrics::counter;

use crate::application::blocks::{BlockDispatcher, BlockRenderError};
use crate::application::error::HttpError;
use crate::application::sources::{PageSource, SourceError};
use crate::presentation::views::PageContext;

const SOURCE: &str = "application::page::PageService";

#[derive(Clone)]
pub struct PageService {
    source: Arc<dyn PageSource>,
    blocks: Arc<BlockDispatcher>,
}

impl PageService {
    pub fn new(source: Arc<dyn PageSource>, blocks: Arc<BlockDispatcher>) -> Self {
        Self { source, blocks }
    }

    /// Assemble the view context for one page, or `None` when no document
    /// matches the slug.
    ///
    /// Blocks render in layout order; unrecognized variants contribute
    /// nothing.
    pub async fn page_context(&self, slug: &str) -> Result<Option<PageContext>, HttpError> {
        counter!("folio_page_fetch_total").increment(1);
        let document = self
            .source
            .fetch_page(slug)
            .await
            .map_err(|err| source_failure("fetch_page", err))?;

        let Some(document) = document else {
            return Ok(None);
        };

        let mut blocks = Vec::with_capacity(document.layout.len());
        for block in &document.layout {
            if let Some(markup) = self
                .blocks
                .dispatch(block, slug)
                .map_err(render_failure)?
            {
                blocks.push(markup);
            }
        }

        Ok(Some(PageContext {
            title: document.title,
            blocks,
        }))
    }

    /// Locate the form referenced by a newsletter block on one page.
    ///
    /// Unresolved references still match by id so the submit path can apply
    /// its own silent-no-op guard.
    pub async fn find_form(
        &self,
        slug: &str,
        form_id: i64,
    ) -> Result<Option<FormReference>, HttpError> {
        let document = self
            .source
            .fetch_page(slug)
            .await
            .map_err(|err| source_failure("find_form", err))?;

        let Some(document) = document else {
            return Ok(None);
        };

        Ok(document.layout.iter().find_map(|block| match block {
            Block::NewsletterForm { form, .. } if form.id() == form_id => Some(form.clone()),
            _ => None,
        }))
    }
}

fn source_failure(operation: &'static str, err: SourceError) -> HttpError {
    HttpError::new(
        SOURCE,
        StatusCode::BAD_GATEWAY,
        "Failed to load page content",
        format!("{operation} failed: {err}"),
    )
}

fn render_failure(err: BlockRenderError) -> HttpError {
    HttpError::from_error(
        SOURCE,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to render page content",
        &err,
    )
}

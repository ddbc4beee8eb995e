use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, RawForm, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    application::{
        blocks::{BlockDispatcher, BlockRenderError},
        error::HttpError,
        page::PageService,
        submission::SubmissionService,
    },
    presentation::views::{
        FeedbackTemplate, FeedbackView, PageTemplate, render_not_found_response,
        render_template_response,
    },
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub pages: Arc<PageService>,
    pub submissions: Arc<SubmissionService>,
    pub blocks: Arc<BlockDispatcher>,
    pub landing_slug: String,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/pages/{slug}", get(page_by_slug))
        .route("/newsletter/{form_id}", post(submit_newsletter))
        .route("/_health", get(health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn landing(State(state): State<HttpState>) -> Response {
    let slug = state.landing_slug.clone();
    render_page(&state, &slug).await
}

async fn page_by_slug(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    render_page(&state, &slug).await
}

async fn render_page(state: &HttpState, slug: &str) -> Response {
    match state.pages.page_context(slug).await {
        Ok(Some(view)) => render_template_response(PageTemplate { view }, StatusCode::OK),
        Ok(None) => render_not_found_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubmitQuery {
    page: Option<String>,
}

/// Accepts one submit event for the addressed form and answers with the
/// feedback fragment for the resulting state.
///
/// Submission failures are contained here: the response is still a rendered
/// fragment with an inline message, not an error status.
async fn submit_newsletter(
    State(state): State<HttpState>,
    Path(form_id): Path<i64>,
    Query(query): Query<SubmitQuery>,
    RawForm(body): RawForm,
) -> Response {
    let slug = query.page.unwrap_or_else(|| state.landing_slug.clone());
    let reference = match state.pages.find_form(&slug, form_id).await {
        Ok(Some(reference)) => reference,
        Ok(None) => return render_not_found_response(),
        Err(err) => return err.into_response(),
    };

    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(&body).into_owned().collect();
    let submission = state.submissions.submit(&reference, &pairs).await;

    let feedback = match reference.resolved() {
        Some(form) => match state.blocks.feedback(form, &submission) {
            Ok(feedback) => feedback,
            Err(err) => return feedback_failure(err).into_response(),
        },
        // Unresolved references never submit; the form area stays as-is.
        None => FeedbackView::default(),
    };

    render_template_response(FeedbackTemplate { feedback }, StatusCode::OK)
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn fallback() -> Response {
    render_not_found_response()
}

fn feedback_failure(err: BlockRenderError) -> HttpError {
    HttpError::from_error(
        "infra::http::submit_newsletter",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to render form feedback",
        &err,
    )
}

use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::{ErrorReport, HttpError};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response() -> Response {
    let view = ErrorPageView::not_found();
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// One assembled page: document title plus its blocks, pre-rendered in
/// layout order.
pub struct PageContext {
    pub title: String,
    pub blocks: Vec<String>,
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub view: PageContext,
}

/// Newsletter form area. Fields are pre-rendered widget markup.
pub struct FormView {
    pub id: i64,
    pub heading: String,
    pub action: String,
    pub fields: Vec<String>,
    pub submit_label: String,
    pub feedback: FeedbackView,
}

/// The form's message area. At most one of success/error is set; idle and
/// loading show nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackView {
    pub is_success: bool,
    pub is_error: bool,
    pub error: String,
    pub confirmation_html: String,
}

#[derive(Template)]
#[template(path = "blocks/hero.html")]
pub struct HeroTemplate {
    pub heading: String,
    pub intro_html: String,
}

#[derive(Template)]
#[template(path = "blocks/content.html")]
pub struct ContentTemplate {
    pub heading: String,
    pub body_html: String,
}

#[derive(Template)]
#[template(path = "blocks/newsletter.html")]
pub struct FormTemplate {
    pub form: FormView,
}

#[derive(Template)]
#[template(path = "partials/feedback.html")]
pub struct FeedbackTemplate {
    pub feedback: FeedbackView,
}

#[derive(Template)]
#[template(path = "fields/input.html")]
pub struct InputFieldTemplate {
    pub kind: &'static str,
    pub name: String,
    pub label: String,
    pub required: bool,
}

#[derive(Template)]
#[template(path = "fields/textarea.html")]
pub struct TextareaFieldTemplate {
    pub name: String,
    pub label: String,
    pub required: bool,
}

#[derive(Template)]
#[template(path = "fields/checkbox.html")]
pub struct CheckboxFieldTemplate {
    pub name: String,
    pub label: String,
    pub required: bool,
}

pub struct SelectOptionView {
    pub label: String,
    pub value: String,
}

#[derive(Template)]
#[template(path = "fields/select.html")]
pub struct SelectFieldTemplate {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub options: Vec<SelectOptionView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub action_href: String,
    pub action_label: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
            action_href: "/".to_string(),
            action_label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: ErrorPageView,
}

//! Block dispatch: one CMS layout block in, rendered markup out.

use std::sync::Arc;

use askama::Template;
use folio_api_types::{Block, FormDocument, FormField, FormReference};
use thiserror::Error;

use crate::application::richtext::{RichTextError, RichTextRenderer};
use crate::application::submission::SubmissionService;
use crate::domain::forms;
use crate::domain::submission::{SubmissionMode, SubmissionState};
use crate::presentation::views::{
    CheckboxFieldTemplate, ContentTemplate, FeedbackView, FormTemplate, FormView, HeroTemplate,
    InputFieldTemplate, SelectFieldTemplate, SelectOptionView, TextareaFieldTemplate,
};

#[derive(Debug, Error)]
pub enum BlockRenderError {
    #[error(transparent)]
    RichText(#[from] RichTextError),
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

/// Maps a block's declared type to its renderer.
pub struct BlockDispatcher {
    richtext: Arc<dyn RichTextRenderer>,
    submissions: Arc<SubmissionService>,
}

impl BlockDispatcher {
    pub fn new(richtext: Arc<dyn RichTextRenderer>, submissions: Arc<SubmissionService>) -> Self {
        Self {
            richtext,
            submissions,
        }
    }

    /// Render one block, or nothing for unrecognized variants.
    ///
    /// An unknown `blockType` is a deliberate no-op fallback, never a
    /// failure; renderer errors for known blocks propagate upward.
    pub fn dispatch(
        &self,
        block: &Block,
        page_slug: &str,
    ) -> Result<Option<String>, BlockRenderError> {
        match block {
            Block::Hero { heading, rich_text } => {
                let template = HeroTemplate {
                    heading: heading.clone().unwrap_or_default(),
                    intro_html: self.render_optional(rich_text.as_ref())?,
                };
                Ok(Some(template.render()?))
            }
            Block::Content { heading, body } => {
                let template = ContentTemplate {
                    heading: heading.clone().unwrap_or_default(),
                    body_html: self.render_optional(body.as_ref())?,
                };
                Ok(Some(template.render()?))
            }
            Block::NewsletterForm { heading, form } => {
                self.newsletter(heading.as_deref(), form, page_slug)
            }
            Block::Unknown => Ok(None),
        }
    }

    /// Feedback area for a form's current submission state. Success renders
    /// the form's confirmation message; error renders the inline message.
    pub fn feedback(
        &self,
        form: &FormDocument,
        state: &SubmissionState,
    ) -> Result<FeedbackView, BlockRenderError> {
        let confirmation_html = match (&form.confirmation_message, state.mode()) {
            (Some(message), SubmissionMode::Success) => self.richtext.render(message)?,
            _ => String::new(),
        };
        Ok(FeedbackView {
            is_success: state.mode() == SubmissionMode::Success,
            is_error: state.mode() == SubmissionMode::Error,
            error: state.error_message().unwrap_or_default().to_string(),
            confirmation_html,
        })
    }

    fn newsletter(
        &self,
        heading: Option<&str>,
        reference: &FormReference,
        page_slug: &str,
    ) -> Result<Option<String>, BlockRenderError> {
        // The form UI is gated twice: the reference must be resolved, and
        // the document's title must equal the sentinel.
        let Some(form) = reference.resolved() else {
            return Ok(None);
        };
        if !forms::renders(form) {
            return Ok(None);
        }

        let state = self.submissions.state(form.id);
        let mut fields = Vec::new();
        for field in forms::renderable_fields(form) {
            if let Some(markup) = field_markup(field)? {
                fields.push(markup);
            }
        }

        let view = FormView {
            id: form.id,
            heading: heading.unwrap_or_default().to_string(),
            action: format!("/newsletter/{}?page={}", form.id, page_slug),
            fields,
            submit_label: form
                .submit_button_label
                .clone()
                .unwrap_or_else(|| "Submit".to_string()),
            feedback: self.feedback(form, &state)?,
        };
        Ok(Some(FormTemplate { form: view }.render()?))
    }

    fn render_optional(
        &self,
        document: Option<&folio_api_types::RichText>,
    ) -> Result<String, RichTextError> {
        match document {
            Some(document) => self.richtext.render(document),
            None => Ok(String::new()),
        }
    }
}

/// Widget table keyed by field variant. Country and state declare no option
/// list on this wire contract and render as plain text inputs.
fn field_markup(field: &FormField) -> Result<Option<String>, askama::Error> {
    let Some(attrs) = field.attributes() else {
        return Ok(None);
    };
    let name = match attrs.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Ok(None),
    };
    let label = attrs.label.clone().unwrap_or_default();
    let required = attrs.required;

    let markup = match field {
        FormField::Text(_) | FormField::Country(_) | FormField::State(_) => InputFieldTemplate {
            kind: "text",
            name,
            label,
            required,
        }
        .render()?,
        FormField::Email(_) => InputFieldTemplate {
            kind: "email",
            name,
            label,
            required,
        }
        .render()?,
        FormField::Number(_) => InputFieldTemplate {
            kind: "number",
            name,
            label,
            required,
        }
        .render()?,
        FormField::Textarea(_) => TextareaFieldTemplate {
            name,
            label,
            required,
        }
        .render()?,
        FormField::Checkbox(_) => CheckboxFieldTemplate {
            name,
            label,
            required,
        }
        .render()?,
        FormField::Select(select) => SelectFieldTemplate {
            name,
            label,
            required,
            options: select
                .options
                .iter()
                .map(|option| SelectOptionView {
                    label: option.label.clone(),
                    value: option.value.clone(),
                })
                .collect(),
        }
        .render()?,
        FormField::Unknown => return Ok(None),
    };
    Ok(Some(markup))
}

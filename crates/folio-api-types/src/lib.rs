//! Shared request and response types for the folio CMS content contract.
//!
//! These types mirror the documents served by the headless CMS: pages with an
//! ordered block layout, form definitions referenced by newsletter blocks, and
//! the JSON payload accepted by the form-submission endpoint. The server and
//! its tests both speak this contract.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Opaque rich-text document produced by the CMS editor.
///
/// The node-tree shape is owned by the CMS; consumers hand it to a rich-text
/// renderer rather than interpreting it themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub serde_json::Value);

/// One page document, identified by slug, owning an ordered block layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub layout: Vec<Block>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Envelope returned by the CMS page query endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageQueryResponse {
    #[serde(default)]
    pub docs: Vec<PageDocument>,
}

/// One entry in a page layout, tagged by `blockType`.
///
/// Tags this crate does not know deserialize to [`Block::Unknown`]; rendering
/// treats that as a deliberate no-op, not a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "blockType", rename_all = "kebab-case")]
pub enum Block {
    #[serde(rename_all = "camelCase")]
    Hero {
        #[serde(default)]
        heading: Option<String>,
        #[serde(default)]
        rich_text: Option<RichText>,
    },
    #[serde(rename_all = "camelCase")]
    Content {
        #[serde(default)]
        heading: Option<String>,
        #[serde(default)]
        body: Option<RichText>,
    },
    #[serde(rename_all = "camelCase")]
    NewsletterForm {
        #[serde(default)]
        heading: Option<String>,
        form: FormReference,
    },
    #[serde(other)]
    Unknown,
}

/// A form relation as the CMS serializes it: the full document when the query
/// depth reaches it, a bare id otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormReference {
    Resolved(Box<FormDocument>),
    Id(i64),
}

impl FormReference {
    /// The referenced document, if the relation was resolved.
    pub fn resolved(&self) -> Option<&FormDocument> {
        match self {
            FormReference::Resolved(form) => Some(form),
            FormReference::Id(_) => None,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            FormReference::Resolved(form) => form.id,
            FormReference::Id(id) => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDocument {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub submit_button_label: Option<String>,
    #[serde(default)]
    pub confirmation_message: Option<RichText>,
}

/// Common attributes every input kind carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldAttributes {
    pub name: Option<String>,
    pub label: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectField {
    #[serde(flatten)]
    pub attributes: FieldAttributes,
    pub options: Vec<SelectOption>,
}

/// One form field, tagged by `blockType` like layout blocks are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "blockType", rename_all = "lowercase")]
pub enum FormField {
    Text(FieldAttributes),
    Email(FieldAttributes),
    Textarea(FieldAttributes),
    Number(FieldAttributes),
    Checkbox(FieldAttributes),
    Select(SelectField),
    Country(FieldAttributes),
    State(FieldAttributes),
    #[serde(other)]
    Unknown,
}

impl FormField {
    pub fn attributes(&self) -> Option<&FieldAttributes> {
        match self {
            FormField::Text(attrs)
            | FormField::Email(attrs)
            | FormField::Textarea(attrs)
            | FormField::Number(attrs)
            | FormField::Checkbox(attrs)
            | FormField::Country(attrs)
            | FormField::State(attrs) => Some(attrs),
            FormField::Select(select) => Some(&select.attributes),
            FormField::Unknown => None,
        }
    }

    /// The form-data key for this field, when one is declared.
    pub fn name(&self) -> Option<&str> {
        self.attributes().and_then(|attrs| attrs.name.as_deref())
    }
}

/// JSON body posted to the form-submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub form: i64,
    #[serde(rename = "submissionData")]
    pub submission_data: Vec<SubmissionEntry>,
}

/// One field/value pair of a submission, in submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEntry {
    pub field: String,
    pub value: String,
}

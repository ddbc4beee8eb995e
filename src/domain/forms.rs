//! Rendering rules for CMS form documents.

use folio_api_types::{FormDocument, FormField};

/// Sentinel title gating whether a newsletter block's form UI is shown.
pub const NEWSLETTER_FORM_TITLE: &str = "newsletter-form-1";

/// A newsletter form renders only when its title equals the sentinel exactly.
pub fn renders(form: &FormDocument) -> bool {
    form.title == NEWSLETTER_FORM_TITLE
}

/// Fields that participate in rendering and submission. A field without a
/// name has no form-data key and is skipped.
pub fn renderable_fields(form: &FormDocument) -> impl Iterator<Item = &FormField> {
    form.fields
        .iter()
        .filter(|field| field.name().is_some_and(|name| !name.is_empty()))
}

//! Submission state machine for the newsletter form.

use folio_api_types::SubmissionEntry;

/// Inline message shown for any submission failure, regardless of cause.
pub const SUBMISSION_FAILED_MESSAGE: &str = "Failed to submit form.";

/// Local submission state of one mounted form.
///
/// The three flags encode four observable modes; exactly one mode is
/// meaningful at a time and [`SubmissionState::mode`] derives it. All
/// mutation goes through the transition methods below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionState {
    loading: bool,
    error: Option<String>,
    success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    Idle,
    Loading,
    Error,
    Success,
}

impl SubmissionState {
    pub fn mode(&self) -> SubmissionMode {
        if self.loading {
            SubmissionMode::Loading
        } else if self.success {
            SubmissionMode::Success
        } else if self.error.is_some() {
            SubmissionMode::Error
        } else {
            SubmissionMode::Idle
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Enter Loading from Idle or Error.
    ///
    /// Returns false without changing state while a submission is in flight
    /// or the success confirmation is showing, so at most one submission per
    /// form is ever in flight.
    pub fn begin(&mut self) -> bool {
        match self.mode() {
            SubmissionMode::Idle | SubmissionMode::Error => {
                self.loading = true;
                self.error = None;
                self.success = false;
                true
            }
            SubmissionMode::Loading | SubmissionMode::Success => false,
        }
    }

    /// Loading → Success.
    pub fn complete(&mut self) {
        self.loading = false;
        self.error = None;
        self.success = true;
    }

    /// Loading → Error.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.success = false;
        self.error = Some(message.into());
    }

    /// Back to Idle with every flag cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Collapse submitted name/value pairs into the wire payload.
///
/// Native form-data semantics: last value wins per name, entries keep the
/// first-seen order of their names, and nameless entries are dropped.
pub fn serialize_fields<'a, I>(pairs: I) -> Vec<SubmissionEntry>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut entries: Vec<SubmissionEntry> = Vec::new();
    for (name, value) in pairs {
        if name.is_empty() {
            continue;
        }
        match entries.iter_mut().find(|entry| entry.field == name) {
            Some(entry) => entry.value = value.to_string(),
            None => entries.push(SubmissionEntry {
                field: name.to_string(),
                value: value.to_string(),
            }),
        }
    }
    entries
}

//! Newsletter submission client: serialization, gateway call, state machine.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use folio_api_types::{FormReference, SubmissionRequest};
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::application::sources::{GatewayError, SubmissionGateway};
use crate::domain::submission::{SUBMISSION_FAILED_MESSAGE, SubmissionState, serialize_fields};

/// One mounted form: its submission state, the pending reset task, and an
/// epoch that invalidates resets superseded by newer transitions.
#[derive(Default)]
struct FormInstance {
    state: SubmissionState,
    epoch: u64,
    reset_task: Option<JoinHandle<()>>,
}

impl FormInstance {
    fn cancel_reset(&mut self) {
        if let Some(task) = self.reset_task.take() {
            task.abort();
        }
    }
}

impl Drop for FormInstance {
    fn drop(&mut self) {
        self.cancel_reset();
    }
}

/// Drives the submit flow for every newsletter form the site serves.
///
/// Each form id owns one instance. A submission moves the instance through
/// Idle → Loading → Success/Error; the confirmation window after success is
/// a scheduled reset back to Idle.
pub struct SubmissionService {
    gateway: Arc<dyn SubmissionGateway>,
    reset_delay: Duration,
    instances: Arc<DashMap<i64, FormInstance>>,
}

impl SubmissionService {
    pub fn new(gateway: Arc<dyn SubmissionGateway>, reset_delay: Duration) -> Self {
        Self {
            gateway,
            reset_delay,
            instances: Arc::new(DashMap::new()),
        }
    }

    /// Current state snapshot for one form. Forms that never submitted are
    /// Idle.
    pub fn state(&self, form_id: i64) -> SubmissionState {
        self.instances
            .get(&form_id)
            .map(|instance| instance.state.clone())
            .unwrap_or_default()
    }

    /// Handle one discrete submit event and return the resulting state.
    ///
    /// An unresolved form reference is a silent no-op. A submit arriving
    /// while a submission is in flight (or while the confirmation is
    /// showing) is ignored and the current state comes back unchanged.
    pub async fn submit(
        &self,
        reference: &FormReference,
        pairs: &[(String, String)],
    ) -> SubmissionState {
        let Some(form) = reference.resolved() else {
            debug!(
                target: "folio::submission",
                form = reference.id(),
                "form reference is unresolved, ignoring submit"
            );
            return self.state(reference.id());
        };

        {
            let mut instance = self.instances.entry(form.id).or_default();
            if !instance.state.begin() {
                debug!(
                    target: "folio::submission",
                    form = form.id,
                    "submission already in flight, ignoring re-entrant submit"
                );
                return instance.state.clone();
            }
            instance.epoch += 1;
            instance.cancel_reset();
        }

        let entries =
            serialize_fields(pairs.iter().map(|(name, value)| (name.as_str(), value.as_str())));
        // Field names only; submitted values are never logged.
        let field_names: Vec<&str> = entries.iter().map(|entry| entry.field.as_str()).collect();
        debug!(
            target: "folio::submission",
            form = form.id,
            fields = ?field_names,
            "submitting form"
        );
        counter!("folio_submission_total").increment(1);

        let request = SubmissionRequest {
            form: form.id,
            submission_data: entries,
        };
        let result = self.gateway.submit(&request).await;

        let mut instance = self.instances.entry(form.id).or_default();
        instance.epoch += 1;
        match result {
            Ok(()) => {
                instance.state.complete();
                instance.reset_task = Some(self.spawn_reset(form.id, instance.epoch));
            }
            Err(GatewayError::Status { status }) => {
                counter!("folio_submission_failure_total").increment(1);
                warn!(
                    target: "folio::submission",
                    form = form.id,
                    status,
                    "submission rejected by endpoint"
                );
                instance.state.fail(SUBMISSION_FAILED_MESSAGE);
            }
            Err(GatewayError::Transport(detail)) => {
                counter!("folio_submission_failure_total").increment(1);
                error!(
                    target: "folio::submission",
                    form = form.id,
                    error = %detail,
                    "submission transport failure"
                );
                instance.state.fail(SUBMISSION_FAILED_MESSAGE);
            }
        }
        instance.state.clone()
    }

    /// Tear down one form instance, cancelling any pending reset.
    pub fn teardown(&self, form_id: i64) {
        self.instances.remove(&form_id);
    }

    fn spawn_reset(&self, form_id: i64, epoch: u64) -> JoinHandle<()> {
        let instances = Arc::clone(&self.instances);
        let delay = self.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(mut instance) = instances.get_mut(&form_id) {
                // A transition that happened after this task was scheduled
                // owns the instance now; this reset must not clobber it.
                if instance.epoch != epoch {
                    return;
                }
                instance.state.reset();
                instance.reset_task = None;
                counter!("folio_submission_reset_total").increment(1);
                debug!(
                    target: "folio::submission",
                    form = form_id,
                    "confirmation window elapsed, state reset"
                );
            }
        })
    }
}

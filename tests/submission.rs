use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use folio::application::sources::{GatewayError, SubmissionGateway};
use folio::application::submission::SubmissionService;
use folio::domain::submission::{SUBMISSION_FAILED_MESSAGE, SubmissionMode};
use folio_api_types::{
    FieldAttributes, FormDocument, FormField, FormReference, RichText, SubmissionRequest,
};

#[derive(Default)]
struct StubGateway {
    responses: Mutex<VecDeque<Result<(), GatewayError>>>,
    seen: Mutex<Vec<SubmissionRequest>>,
}

impl StubGateway {
    fn respond_with(results: impl IntoIterator<Item = Result<(), GatewayError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(results.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<SubmissionRequest> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl SubmissionGateway for StubGateway {
    async fn submit(&self, request: &SubmissionRequest) -> Result<(), GatewayError> {
        self.seen.lock().expect("seen lock").push(request.clone());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Gateway that holds every submission until the test releases it.
#[derive(Default)]
struct BlockingGateway {
    release: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl SubmissionGateway for BlockingGateway {
    async fn submit(&self, _request: &SubmissionRequest) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        Ok(())
    }
}

fn newsletter_form() -> FormReference {
    FormReference::Resolved(Box::new(FormDocument {
        id: 42,
        title: "newsletter-form-1".to_string(),
        fields: vec![FormField::Email(FieldAttributes {
            name: Some("email".to_string()),
            label: Some("Email".to_string()),
            required: true,
        })],
        submit_button_label: Some("Join".to_string()),
        confirmation_message: Some(RichText(serde_json::json!({
            "root": { "children": [
                { "type": "paragraph", "children": [
                    { "type": "text", "text": "Thanks for subscribing!" }
                ]}
            ]}
        }))),
    }))
}

fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[tokio::test]
async fn ok_submission_reaches_success_and_posts_the_payload() {
    let gateway = StubGateway::respond_with([Ok(())]);
    let service = SubmissionService::new(gateway.clone(), Duration::from_secs(5));
    let reference = newsletter_form();

    let state = service
        .submit(&reference, &pairs(&[("email", "a@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Success);

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    let encoded = serde_json::to_string(&requests[0]).expect("serializes");
    assert_eq!(
        encoded,
        r#"{"form":42,"submissionData":[{"field":"email","value":"a@b.com"}]}"#
    );
}

#[tokio::test]
async fn rejected_submission_reports_the_generic_message_and_allows_retry() {
    let gateway = StubGateway::respond_with([Err(GatewayError::Status { status: 500 }), Ok(())]);
    let service = SubmissionService::new(gateway.clone(), Duration::from_secs(5));
    let reference = newsletter_form();

    let state = service
        .submit(&reference, &pairs(&[("email", "a@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Error);
    assert_eq!(state.error_message(), Some(SUBMISSION_FAILED_MESSAGE));

    let state = service
        .submit(&reference, &pairs(&[("email", "a@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Success);
    assert_eq!(gateway.requests().len(), 2);
}

#[tokio::test]
async fn transport_failure_is_reported_identically_to_rejection() {
    let gateway = StubGateway::respond_with([Err(GatewayError::Transport(
        "connection refused".to_string(),
    ))]);
    let service = SubmissionService::new(gateway, Duration::from_secs(5));

    let state = service
        .submit(&newsletter_form(), &pairs(&[("email", "a@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Error);
    assert_eq!(state.error_message(), Some(SUBMISSION_FAILED_MESSAGE));
}

#[tokio::test(start_paused = true)]
async fn success_resets_to_idle_after_the_confirmation_window() {
    let gateway = StubGateway::respond_with([Ok(())]);
    let service = SubmissionService::new(gateway, Duration::from_secs(5));

    let state = service
        .submit(&newsletter_form(), &pairs(&[("email", "a@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Success);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(service.state(42).mode(), SubmissionMode::Success);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(service.state(42).mode(), SubmissionMode::Idle);
    assert_eq!(service.state(42).error_message(), None);
}

#[tokio::test(start_paused = true)]
async fn success_window_swallows_submits_until_the_reset() {
    let gateway = StubGateway::respond_with([Ok(()), Ok(())]);
    let service = SubmissionService::new(gateway.clone(), Duration::from_secs(5));
    let reference = newsletter_form();

    let state = service
        .submit(&reference, &pairs(&[("email", "a@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Success);

    // The confirmation is showing; this submit must be ignored.
    let state = service
        .submit(&reference, &pairs(&[("email", "other@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Success);
    assert_eq!(gateway.requests().len(), 1);

    tokio::time::sleep(Duration::from_secs(6)).await;
    let state = service
        .submit(&reference, &pairs(&[("email", "other@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Success);
    assert_eq!(gateway.requests().len(), 2);
}

#[tokio::test]
async fn unresolved_reference_is_a_silent_noop() {
    let gateway = StubGateway::respond_with([Ok(())]);
    let service = SubmissionService::new(gateway.clone(), Duration::from_secs(5));

    let state = service
        .submit(&FormReference::Id(42), &pairs(&[("email", "a@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Idle);
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn nameless_pairs_are_excluded_from_the_payload() {
    let gateway = StubGateway::respond_with([Ok(())]);
    let service = SubmissionService::new(gateway.clone(), Duration::from_secs(5));

    service
        .submit(
            &newsletter_form(),
            &pairs(&[("", "stray"), ("email", "first@b.com"), ("email", "a@b.com")]),
        )
        .await;

    let requests = gateway.requests();
    assert_eq!(requests[0].submission_data.len(), 1);
    assert_eq!(requests[0].submission_data[0].field, "email");
    assert_eq!(requests[0].submission_data[0].value, "a@b.com");
}

#[tokio::test]
async fn reentrant_submit_is_ignored_while_in_flight() {
    let gateway = Arc::new(BlockingGateway::default());
    let service = Arc::new(SubmissionService::new(
        gateway.clone(),
        Duration::from_secs(5),
    ));
    let reference = newsletter_form();

    let first = tokio::spawn({
        let service = service.clone();
        let reference = reference.clone();
        async move {
            service
                .submit(&reference, &pairs(&[("email", "a@b.com")]))
                .await
        }
    });

    while service.state(42).mode() != SubmissionMode::Loading {
        tokio::task::yield_now().await;
    }

    let second = service
        .submit(&reference, &pairs(&[("email", "other@b.com")]))
        .await;
    assert_eq!(second.mode(), SubmissionMode::Loading);

    gateway.release.notify_one();
    let first = first.await.expect("first submit joins");
    assert_eq!(first.mode(), SubmissionMode::Success);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn teardown_drops_the_instance_and_its_pending_reset() {
    let gateway = StubGateway::respond_with([Ok(())]);
    let service = SubmissionService::new(gateway, Duration::from_secs(5));

    let state = service
        .submit(&newsletter_form(), &pairs(&[("email", "a@b.com")]))
        .await;
    assert_eq!(state.mode(), SubmissionMode::Success);

    service.teardown(42);
    assert_eq!(service.state(42).mode(), SubmissionMode::Idle);

    // The cancelled reset must not touch anything after the window elapses.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(service.state(42).mode(), SubmissionMode::Idle);
}

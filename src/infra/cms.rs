//! HTTP client for the headless CMS: content fetch and form submissions.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use folio_api_types::{PageDocument, PageQueryResponse, SubmissionRequest};

use crate::application::sources::{GatewayError, PageSource, SourceError, SubmissionGateway};
use crate::config::CmsSettings;
use crate::infra::error::InfraError;

const PAGES_PATH: &str = "api/pages";
const SUBMISSIONS_PATH: &str = "api/form-submissions";

/// One client serves both collaborator roles: it is the content source the
/// page service reads from and the gateway the submission client posts to.
pub struct CmsClient {
    client: Client,
    base: Url,
    api_token: Option<String>,
}

impl CmsClient {
    pub fn new(settings: &CmsSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build cms http client: {err}"))
            })?;

        let base = settings.base_url.join("/").map_err(|err| {
            InfraError::configuration(format!("invalid cms base url: {err}"))
        })?;

        Ok(Self {
            client,
            base,
            api_token: settings.api_token.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("folio/", env!("CARGO_PKG_VERSION"))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl PageSource for CmsClient {
    async fn fetch_page(&self, slug: &str) -> Result<Option<PageDocument>, SourceError> {
        let mut url = self
            .base
            .join(PAGES_PATH)
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("where[slug][equals]", slug)
            .append_pair("limit", "1")
            .append_pair("depth", "2");

        debug!(target: "folio::cms", slug, "fetching page document");
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SourceError::Transport(format!(
                "status {}",
                response.status()
            )));
        }

        let body: PageQueryResponse = response
            .json()
            .await
            .map_err(|err| SourceError::Malformed(err.to_string()))?;
        Ok(body.docs.into_iter().next())
    }
}

#[async_trait]
impl SubmissionGateway for CmsClient {
    async fn submit(&self, request: &SubmissionRequest) -> Result<(), GatewayError> {
        let url = self
            .base
            .join(SUBMISSIONS_PATH)
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let response = self
            .authorized(self.client.post(url).json(request))
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

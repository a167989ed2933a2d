//! HTTP client for the remote control API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use url::Url;

use crate::config::ControlConfig;
use crate::control::{ActionReceipt, ControlAction, ControlError, ControlPlane};

/// Issues start/stop actions against the control API.
#[derive(Clone)]
pub struct RemoteControlClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    timeout_secs: u64,
}

impl RemoteControlClient {
    /// Create a new client from configuration.
    pub fn new(config: &ControlConfig) -> Result<Self, ControlError> {
        Url::parse(&config.base_url).map_err(|_| ControlError::InvalidUrl(config.base_url.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ControlError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub async fn start(&self, remote_id: &str) -> Result<ActionReceipt, ControlError> {
        self.dispatch(remote_id, ControlAction::Start).await
    }

    pub async fn stop(&self, remote_id: &str) -> Result<ActionReceipt, ControlError> {
        self.dispatch(remote_id, ControlAction::Stop).await
    }

    fn action_url(&self, remote_id: &str, action: ControlAction) -> String {
        format!("{}/api/v2/servers/{}/action/{}", self.base_url, remote_id, action.endpoint())
    }
}

#[async_trait]
impl ControlPlane for RemoteControlClient {
    async fn dispatch(&self, remote_id: &str, action: ControlAction) -> Result<ActionReceipt, ControlError> {
        let url = self.action_url(remote_id, action);

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_token))
            .header(CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ControlError::Timeout(self.timeout_secs)
                } else {
                    ControlError::Transport(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(remote_id = %remote_id, action = %action, status = %status, "Control request accepted");
            Ok(ActionReceipt::Accepted)
        } else {
            tracing::warn!(
                remote_id = %remote_id,
                action = %action,
                status = %status,
                "Control API rejected request"
            );
            Ok(ActionReceipt::Rejected { status: status.as_u16() })
        }
    }
}

impl std::fmt::Debug for RemoteControlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteControlClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

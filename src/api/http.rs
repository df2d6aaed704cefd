use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::client::HealthApi;
use super::error::{ApiError, ErrorBody};
use super::types::LoginResponse;
use crate::config::ApiConfig;
use crate::models::{Credentials, MedicalRecord, UserProfile};
use crate::tab_storage::{TabStorage, AUTH_TOKEN_KEY};

/// HTTP client for the health backend.
///
/// Reads the bearer token from the tab's storage on every request, so a
/// login or logout in this tab takes effect on the very next call.
pub struct HttpHealthApi {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
    storage: Arc<dyn TabStorage>,
}

impl HttpHealthApi {
    pub fn new(config: &ApiConfig, storage: Arc<dyn TabStorage>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: config.timeout_secs,
            storage,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<String, ApiError> {
        match self.storage.get(AUTH_TOKEN_KEY) {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(ApiError::Unauthorized),
            Err(e) => {
                tracing::warn!("Token storage unreadable: {e}");
                Err(ApiError::Unauthorized)
            }
        }
    }

    async fn get_authorized<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let token = self.bearer()?;
        let request = self.client.get(self.url(path)).bearer_auth(token);
        self.send_json(request).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                ApiError::Transport(format!("Cannot connect to {}", self.base_url))
            } else if e.is_timeout() {
                ApiError::Transport(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: parsed.message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl HealthApi for HttpHealthApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = self.client.post(self.url("/auth/login")).json(credentials);
        self.send_json(request).await
    }

    async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        self.get_authorized("/auth/me").await
    }

    async fn get_assigned_requests(&self) -> Result<Vec<MedicalRecord>, ApiError> {
        self.get_authorized("/requests/assigned").await
    }
}

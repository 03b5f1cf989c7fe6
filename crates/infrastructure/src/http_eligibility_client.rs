use std::time::Duration;

use async_trait::async_trait;
use elevate_application::{
    CreateEligibilityInput, EligibilityClient, EligibilityEnvelope, UpdateEligibilityInput,
};
use elevate_core::{AppError, AppResult};
use reqwest::{Method, StatusCode, header};
use tracing::{debug, warn};
use url::Url;

const ELIGIBILITIES_PATH: &str = "eligibilities";

/// HTTP implementation of the eligibility client port.
///
/// Only idempotent calls (`GET`, `PUT`, `DELETE`) are retried, and only on
/// transport errors, `5xx` and `429`.
pub struct HttpEligibilityClient {
    http_client: reqwest::Client,
    base_url: Url,
    api_token: String,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl HttpEligibilityClient {
    /// Creates a new eligibility client.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: Url,
        api_token: impl Into<String>,
        max_attempts: u8,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            http_client,
            base_url,
            api_token: api_token.into(),
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    fn endpoint(&self, id: Option<&str>) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::Internal(format!(
                    "eligibility API base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty().push(ELIGIBILITIES_PATH);
            if let Some(id) = id {
                segments.push(id);
            }
        }

        Ok(url)
    }

    async fn send_with_retry<F>(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        build: F,
    ) -> AppResult<reqwest::Response>
    where
        F: Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        let max_attempts = if method == Method::POST {
            1
        } else {
            self.max_attempts
        };
        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < max_attempts {
            attempt = attempt.saturating_add(1);
            let request = self
                .http_client
                .request(method.clone(), url.clone())
                .bearer_auth(self.api_token.as_str())
                .header(header::ACCEPT, "application/json");
            let response = build(request).send().await;

            match response {
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == StatusCode::TOO_MANY_REQUESTS =>
                {
                    if attempt >= max_attempts {
                        return Ok(response);
                    }
                    last_error = Some(format!(
                        "transient HTTP status {} for eligibility {operation}",
                        response.status()
                    ));
                }
                Ok(response) => return Ok(response),
                Err(error) => {
                    last_error = Some(format!("eligibility {operation} transport error: {error}"));
                }
            }

            if attempt < max_attempts {
                warn!(
                    operation,
                    attempt,
                    error = last_error.as_deref().unwrap_or_default(),
                    "retrying eligibility call"
                );
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Client(last_error.unwrap_or_else(|| {
            format!("eligibility {operation} exhausted retries")
        })))
    }
}

async fn status_error(response: reqwest::Response, operation: &str) -> AppError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_owned());

    AppError::Client(format!(
        "eligibility {operation} returned status {}: {body}",
        status.as_u16()
    ))
}

async fn read_envelope(
    response: reqwest::Response,
    operation: &str,
) -> AppResult<Option<EligibilityEnvelope>> {
    let body = response.text().await.map_err(|error| {
        AppError::Client(format!(
            "failed to read eligibility {operation} response body: {error}"
        ))
    })?;

    if body.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Option<EligibilityEnvelope>>(body.as_str()).map_err(|error| {
        AppError::Internal(format!(
            "failed to parse eligibility {operation} response body: {error}"
        ))
    })
}

#[async_trait]
impl EligibilityClient for HttpEligibilityClient {
    async fn create_eligibility(
        &self,
        input: CreateEligibilityInput,
    ) -> AppResult<Option<EligibilityEnvelope>> {
        let url = self.endpoint(None)?;
        let response = self
            .send_with_retry("create", Method::POST, url, |request| request.json(&input))
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response, "create").await);
        }

        read_envelope(response, "create").await
    }

    async fn get_eligibility(&self, id: &str) -> AppResult<Option<EligibilityEnvelope>> {
        let url = self.endpoint(Some(id))?;
        let response = self
            .send_with_retry("read", Method::GET, url, |request| request)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(id, "eligibility not found");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(status_error(response, "read").await);
        }

        read_envelope(response, "read").await
    }

    async fn update_eligibility(
        &self,
        input: UpdateEligibilityInput,
    ) -> AppResult<Option<EligibilityEnvelope>> {
        let url = self.endpoint(Some(input.id.as_str()))?;
        let response = self
            .send_with_retry("update", Method::PUT, url, |request| request.json(&input))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "eligibility '{}' does not exist",
                input.id
            )));
        }

        if !response.status().is_success() {
            return Err(status_error(response, "update").await);
        }

        read_envelope(response, "update").await
    }

    async fn delete_eligibility(&self, id: &str) -> AppResult<()> {
        let url = self.endpoint(Some(id))?;
        let response = self
            .send_with_retry("delete", Method::DELETE, url, |request| request)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "eligibility '{id}' does not exist"
            )));
        }

        if !response.status().is_success() {
            return Err(status_error(response, "delete").await);
        }

        Ok(())
    }
}

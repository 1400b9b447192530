//! Client for the inference service's classify endpoint

use paperclass_core::{ClassificationRequest, ClassificationResponse};
use std::time::Duration;

/// Default time to wait for a classification
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Input was empty or whitespace; nothing was sent
    EmptyInput,
    Success(ClassificationResponse),
    /// The service answered with a non-success status
    HttpError { status: u16, body: String },
    /// The service could not be reached
    Unreachable(String),
    /// Timeouts, undecodable bodies and anything else
    Unexpected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid API URL '{0}': {1}")]
    InvalidUrl(String, String),

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Posts abstracts to the inference service
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    http: reqwest::Client,
    api_url: reqwest::Url,
}

impl ClassifierClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let api_url = reqwest::Url::parse(api_url)
            .map_err(|e| ClientError::InvalidUrl(api_url.to_string(), e.to_string()))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, api_url })
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_str()
    }

    /// Submit one abstract. Never retries.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::EmptyInput;
        }

        let response = match self
            .http
            .post(self.api_url.clone())
            .json(&ClassificationRequest::new(text))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_send_error(e),
        };

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => return SubmitOutcome::Unexpected(e.to_string()),
            };
            tracing::warn!("Inference service answered {}: {}", status, body);
            return SubmitOutcome::HttpError {
                status: status.as_u16(),
                body,
            };
        }

        match response.json::<ClassificationResponse>().await {
            Ok(result) => {
                tracing::debug!("Classified as {} ({:.4})", result.label, result.confidence);
                SubmitOutcome::Success(result)
            }
            Err(e) => SubmitOutcome::Unexpected(e.to_string()),
        }
    }
}

fn classify_send_error(e: reqwest::Error) -> SubmitOutcome {
    if e.is_connect() {
        tracing::warn!("Inference service unreachable: {}", e);
        SubmitOutcome::Unreachable(e.to_string())
    } else {
        tracing::warn!("Request failed: {}", e);
        SubmitOutcome::Unexpected(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_url() {
        let err = ClassifierClient::new("not a url", DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(..)));
    }

    #[tokio::test]
    async fn test_blank_input_short_circuits() {
        // Port 9 (discard) is never contacted for blank input
        let client = ClassifierClient::new("http://127.0.0.1:9/predict", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.submit("").await, SubmitOutcome::EmptyInput);
        assert_eq!(client.submit("  \n\t ").await, SubmitOutcome::EmptyInput);
    }
}

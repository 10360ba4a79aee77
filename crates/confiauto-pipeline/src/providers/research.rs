//! HTTP client for the deep-research collaborator.

use std::time::Duration;

use serde::Serialize;

use crate::error::ProviderError;
use crate::providers::DeepResearchProvider;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    name: &'a str,
    address: &'a str,
    place_id: &'a str,
}

/// Client for the deep-research service. The response body is treated as an
/// opaque JSON payload and attached to results unchanged.
pub struct ResearchClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ResearchClient {
    #[must_use]
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/analyze", base_url.trim_end_matches('/')),
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl DeepResearchProvider for ResearchClient {
    async fn analyze(
        &self,
        name: &str,
        address: &str,
        place_id: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let request = AnalyzeRequest {
            name,
            address,
            place_id,
        };

        let mut builder = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
            context: format!("deep analysis for {place_id}"),
            source: e,
        })
    }
}

impl std::fmt::Debug for ResearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchClient")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

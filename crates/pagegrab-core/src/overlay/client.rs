use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;

use crate::state::{ApiResponse, ChangeRequestBody};

/// The local endpoint as seen from the overlay
#[async_trait]
pub trait ChangeApi: Send + Sync {
    async fn post_message(&self, message: &str) -> Result<ApiResponse>;
}

#[derive(Clone)]
pub struct LocalApiClient {
    client: Client,
    endpoint_url: String,
}

impl LocalApiClient {
    pub fn new(endpoint_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint_url: endpoint_url.to_string(),
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

#[async_trait]
impl ChangeApi for LocalApiClient {
    async fn post_message(&self, message: &str) -> Result<ApiResponse> {
        let request = ChangeRequestBody {
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint_url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Could not reach {}", self.endpoint_url))?;

        // Error statuses still carry the JSON contract, except a disabled endpoint
        let status = response.status();
        let text = response.text().await?;
        serde_json::from_str::<ApiResponse>(&text).map_err(|_| {
            if status == reqwest::StatusCode::NOT_FOUND {
                anyhow!("Endpoint {} is not available (is the server running in development mode?)", self.endpoint_url)
            } else {
                anyhow!("Unexpected response from {} ({})", self.endpoint_url, status)
            }
        })
    }
}

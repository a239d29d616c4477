use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use super::{Assistant, AssistantError, PromptRequest};

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum PartInput<'a> {
    Text { text: &'a str },
}

#[derive(Serialize)]
struct PromptBody<'a> {
    parts: Vec<PartInput<'a>>,
}

/// Loose on purpose: untyped parts and null text count as no text
#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptResponse {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

impl PromptResponse {
    /// All text parts joined in order; tool calls, steps and the like are skipped
    fn text(self) -> String {
        self.parts
            .into_iter()
            .filter(|part| part.kind.as_deref() == Some("text"))
            .filter_map(|part| part.text)
            .collect()
    }
}

/// HTTP client for an OpenCode server's session API
#[derive(Clone)]
pub struct OpencodeClient {
    client: Client,
    base_url: String,
}

impl OpencodeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn create_session(
        &self,
        title: &str,
        directory: Option<&str>,
    ) -> Result<String, AssistantError> {
        let url = format!("{}/session", self.base_url);
        let request = self
            .client
            .post(&url)
            .json(&CreateSessionRequest { title });

        let response = self.send(with_directory(request, directory)).await?;
        let session: SessionResponse = response.json().await?;

        session
            .id
            .filter(|id| !id.is_empty())
            .ok_or(AssistantError::MissingSession)
    }

    /// Send one text prompt and wait for the complete reply
    pub async fn prompt_session(
        &self,
        session_id: &str,
        text: &str,
        directory: Option<&str>,
    ) -> Result<String, AssistantError> {
        let url = format!("{}/session/{}/message", self.base_url, session_id);
        let request = self.client.post(&url).json(&PromptBody {
            parts: vec![PartInput::Text { text }],
        });

        let response = self.send(with_directory(request, directory)).await?;
        let reply: PromptResponse = response.json().await?;
        Ok(reply.text())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AssistantError> {
        let response = request.send().await.map_err(|err| {
            if err.is_connect() {
                AssistantError::Unreachable {
                    base_url: self.base_url.clone(),
                }
            } else {
                AssistantError::Request(err)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Status { status, body });
        }

        Ok(response)
    }
}

fn with_directory(request: RequestBuilder, directory: Option<&str>) -> RequestBuilder {
    match directory {
        Some(dir) => request.query(&[("directory", dir)]),
        None => request,
    }
}

#[async_trait]
impl Assistant for OpencodeClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn run_prompt(&self, request: PromptRequest) -> Result<String, AssistantError> {
        let directory = request.directory.as_deref();

        let session_id = self.create_session(&request.session_title, directory).await?;
        tracing::debug!(session_id = %session_id, "opened assistant session");

        let text = self.prompt_session(&session_id, &request.text, directory).await?;
        tracing::debug!(session_id = %session_id, bytes = text.len(), "assistant replied");
        Ok(text)
    }
}

//! Local apply/change/commit endpoint, independent of any HTTP framework.
//!
//! Each request opens a fresh assistant session, sends one prompt and returns
//! the reply text. Nothing is kept between requests.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::assistant::{Assistant, AssistantError, PromptRequest};
use crate::config::{Config, DEFAULT_SESSION_TITLE};
use crate::mode::RunMode;
use crate::state::ApiResponse;

/// The endpoint variants. `Apply` and `Commit` pin the assistant to the
/// configured project; `Change` forwards the message as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRoute {
    Apply,
    Change,
    Commit,
}

impl EndpointRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRoute::Apply => "apply",
            EndpointRoute::Change => "change",
            EndpointRoute::Commit => "commit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "apply" => Some(EndpointRoute::Apply),
            "change" => Some(EndpointRoute::Change),
            "commit" => Some(EndpointRoute::Commit),
            _ => None,
        }
    }

    pub fn all() -> Vec<EndpointRoute> {
        vec![EndpointRoute::Apply, EndpointRoute::Change, EndpointRoute::Commit]
    }

    pub fn path(&self) -> String {
        format!("/api/opencode/{}", self.as_str())
    }

    fn pins_project(&self) -> bool {
        matches!(self, EndpointRoute::Apply | EndpointRoute::Commit)
    }
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Not available in production")]
    Disabled,

    #[error("Message is required")]
    MissingMessage,

    #[error("{0}")]
    MalformedBody(String),

    #[error(transparent)]
    Assistant(#[from] AssistantError),
}

impl EndpointError {
    pub fn status(&self) -> u16 {
        match self {
            EndpointError::Disabled => 404,
            EndpointError::MissingMessage => 400,
            EndpointError::Assistant(AssistantError::Unreachable { .. }) => 503,
            EndpointError::MalformedBody(_) | EndpointError::Assistant(_) => 500,
        }
    }

    /// JSON body for the error. A disabled endpoint reveals nothing.
    pub fn body(&self) -> Option<ApiResponse> {
        match self {
            EndpointError::Disabled => None,
            EndpointError::MissingMessage => Some(ApiResponse::rejected(self.to_string())),
            _ => Some(ApiResponse::failed(self.to_string())),
        }
    }
}

/// Status code plus optional JSON body, for the HTTP host to send as is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReply {
    pub status: u16,
    pub body: Option<ApiResponse>,
}

impl From<EndpointError> for EndpointReply {
    fn from(err: EndpointError) -> Self {
        Self {
            status: err.status(),
            body: err.body(),
        }
    }
}

pub struct ChangeEndpoint {
    mode: RunMode,
    assistant: Arc<dyn Assistant>,
    project_dir: Option<String>,
    session_title: String,
}

impl ChangeEndpoint {
    pub fn new(mode: RunMode, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            mode,
            assistant,
            project_dir: None,
            session_title: DEFAULT_SESSION_TITLE.to_string(),
        }
    }

    pub fn from_config(config: &Config, assistant: Arc<dyn Assistant>) -> Self {
        Self::new(config.mode, assistant)
            .with_project_dir(config.project_dir.clone())
            .with_session_title(&config.session_title)
    }

    pub fn with_project_dir(mut self, project_dir: Option<String>) -> Self {
        self.project_dir = project_dir.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_session_title(mut self, title: &str) -> Self {
        self.session_title = title.to_string();
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Handle one request. Never fails: every error becomes a reply.
    pub async fn handle(&self, route: EndpointRoute, body: &[u8]) -> EndpointReply {
        match self.process(route, body).await {
            Ok(text) => EndpointReply {
                status: 200,
                body: Some(ApiResponse::ok(text)),
            },
            Err(EndpointError::Disabled) => EndpointReply::from(EndpointError::Disabled),
            Err(err) => {
                match &err {
                    EndpointError::MissingMessage => {
                        tracing::warn!(route = route.as_str(), "rejected request without a message")
                    }
                    _ => tracing::error!(route = route.as_str(), error = %err, "OpenCode API error"),
                }
                EndpointReply::from(err)
            }
        }
    }

    async fn process(&self, route: EndpointRoute, body: &[u8]) -> Result<String, EndpointError> {
        if !self.mode.is_development() {
            return Err(EndpointError::Disabled);
        }

        let message = parse_message(body)?;
        let request = self.prompt_for(route, message);

        tracing::info!(
            route = route.as_str(),
            assistant = self.assistant.base_url(),
            bytes = request.text.len(),
            "forwarding change request"
        );
        let text = self.assistant.run_prompt(request).await?;
        Ok(text)
    }

    fn prompt_for(&self, route: EndpointRoute, message: String) -> PromptRequest {
        let directory = if route.pins_project() {
            self.project_dir.clone()
        } else {
            None
        };

        let text = match &directory {
            Some(dir) => format!(
                "{}\n\nMAKE CHANGES IN: {}, ASK ABSOLUTELY NO FOLLOW UP QUESTIONS",
                message, dir
            ),
            None => message,
        };

        PromptRequest {
            session_title: self.session_title.clone(),
            text,
            directory,
        }
    }
}

fn parse_message(body: &[u8]) -> Result<String, EndpointError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| EndpointError::MalformedBody(format!("Invalid JSON body: {}", e)))?;

    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .ok_or(EndpointError::MissingMessage)
}

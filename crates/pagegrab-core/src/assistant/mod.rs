pub mod opencode;

pub use opencode::OpencodeClient;

use async_trait::async_trait;
use thiserror::Error;

/// One prompt for a fresh assistant session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub session_title: String,
    pub text: String,
    /// Working directory the assistant should operate in
    pub directory: Option<String>,
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Cannot connect to OpenCode server at {base_url}. Please ensure the OpenCode server is running.")]
    Unreachable { base_url: String },

    #[error("Failed to create session")]
    MissingSession,

    #[error("OpenCode server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// A coding assistant that can run one prompt in a new session and reply
/// with text.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Address shown to users when the assistant can't be reached
    fn base_url(&self) -> &str;

    async fn run_prompt(&self, request: PromptRequest) -> Result<String, AssistantError>;
}

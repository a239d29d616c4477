//! Overlay controller: the apply/commit workflow behind the change panel.
//!
//! ```text
//! idle --apply--> applying --ok--> idle --commit--> committing --ok--> success
//!                    |                                   |
//!                    +--------------fail-----------------+--> error
//! success/error --reset--> idle
//! ```
//!
//! Network calls are split into `begin_*` (validate, move to the busy state,
//! hand back the message to post) and `finish_*` (fold the endpoint's answer
//! back in), so a host can run the call on its own task. `apply` and `commit`
//! do both in one go.

pub mod client;

pub use client::{ChangeApi, LocalApiClient};

use crate::commit::extract_commit_sha;
use crate::grab::build_change_prompt;
use crate::mode::RunMode;
use crate::state::{ApiResponse, CursorPosition, GrabContent, ProcessingState};

/// Instruction sent on commit; the assistant owns the git mechanics
pub const COMMIT_INSTRUCTION: &str = "add, commit, and push changes";

const APPLY_OK: &str = "Changes applied successfully";
const APPLY_FAILED: &str = "Failed to apply changes";
const COMMIT_FAILED: &str = "Failed to commit changes";
const GENERIC_ERROR: &str = "An error occurred";

#[derive(Debug, Clone)]
pub struct OverlayController {
    enabled: bool,
    open: bool,
    collapsed: bool,
    grab_content: Option<GrabContent>,
    change_request: String,
    processing_state: ProcessingState,
    api_response: String,
    commit_sha: Option<String>,
    has_applied_change: bool,
    cursor_position: Option<CursorPosition>,
}

impl OverlayController {
    /// The overlay only ever shows up in development mode
    pub fn new(mode: RunMode) -> Self {
        Self {
            enabled: mode.is_development(),
            open: false,
            collapsed: false,
            grab_content: None,
            change_request: String::new(),
            processing_state: ProcessingState::Idle,
            api_response: String::new(),
            commit_sha: None,
            has_applied_change: false,
            cursor_position: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn grab_content(&self) -> Option<&GrabContent> {
        self.grab_content.as_ref()
    }

    pub fn change_request(&self) -> &str {
        &self.change_request
    }

    pub fn processing_state(&self) -> ProcessingState {
        self.processing_state
    }

    pub fn api_response(&self) -> &str {
        &self.api_response
    }

    pub fn commit_sha(&self) -> Option<&str> {
        self.commit_sha.as_deref()
    }

    pub fn has_applied_change(&self) -> bool {
        self.has_applied_change
    }

    pub fn cursor_position(&self) -> Option<CursorPosition> {
        self.cursor_position
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Panel is drawn only with something captured
    pub fn is_visible(&self) -> bool {
        self.enabled && self.open && self.grab_content.is_some()
    }

    /// Request text can be edited
    pub fn inputs_enabled(&self) -> bool {
        self.processing_state == ProcessingState::Idle
    }

    pub fn can_apply(&self) -> bool {
        self.inputs_enabled()
            && self.grab_content.is_some()
            && !self.change_request.trim().is_empty()
    }

    pub fn can_commit(&self) -> bool {
        self.inputs_enabled() && self.grab_content.is_some() && self.has_applied_change
    }

    /// Store a picked element and open the panel.
    ///
    /// Returns false when the selection is dropped: the overlay is disabled or
    /// a call is in flight.
    pub fn capture(&mut self, grab: GrabContent) -> bool {
        if !self.enabled || self.processing_state.is_busy() {
            return false;
        }
        tracing::debug!(file = %grab.file_path, "captured element");
        self.grab_content = Some(grab);
        self.open = true;
        self.collapsed = false;
        true
    }

    pub fn set_change_request(&mut self, text: &str) {
        if self.inputs_enabled() {
            self.change_request = text.to_string();
        }
    }

    pub fn set_cursor_position(&mut self, position: CursorPosition) {
        self.cursor_position = Some(position);
    }

    pub fn toggle_collapse(&mut self) {
        self.collapsed = !self.collapsed;
    }

    /// Start an apply. Returns the message to post, or `None` when apply
    /// isn't allowed right now.
    pub fn begin_apply(&mut self) -> Option<String> {
        if !self.can_apply() {
            return None;
        }
        let grab = self.grab_content.as_ref()?;
        let message = build_change_prompt(grab, &self.change_request);
        self.processing_state = ProcessingState::Applying;
        Some(message)
    }

    /// Fold an apply result back in. Ignored unless an apply is in flight.
    pub fn finish_apply(&mut self, result: anyhow::Result<ApiResponse>) {
        if self.processing_state != ProcessingState::Applying {
            tracing::debug!(state = self.processing_state.as_str(), "dropping stale apply result");
            return;
        }

        match result {
            Ok(resp) if resp.success => {
                self.api_response = resp.message().unwrap_or(APPLY_OK).to_string();
                self.has_applied_change = true;
                self.processing_state = ProcessingState::Idle;
            }
            Ok(resp) => self.fail(resp.message().unwrap_or(APPLY_FAILED).to_string()),
            Err(err) => self.fail(error_text(&err)),
        }
    }

    /// Start a commit of previously applied changes
    pub fn begin_commit(&mut self) -> Option<String> {
        if !self.can_commit() {
            return None;
        }
        self.processing_state = ProcessingState::Committing;
        Some(COMMIT_INSTRUCTION.to_string())
    }

    /// Fold a commit result back in. Ignored unless a commit is in flight.
    pub fn finish_commit(&mut self, result: anyhow::Result<ApiResponse>) {
        if self.processing_state != ProcessingState::Committing {
            tracing::debug!(state = self.processing_state.as_str(), "dropping stale commit result");
            return;
        }

        match result {
            Ok(resp) if resp.success => {
                self.processing_state = ProcessingState::Success;
                if let Some(sha) = resp.response.as_deref().and_then(extract_commit_sha) {
                    self.commit_sha = Some(sha);
                }
            }
            Ok(resp) => self.fail(resp.message().unwrap_or(COMMIT_FAILED).to_string()),
            Err(err) => self.fail(error_text(&err)),
        }
    }

    pub async fn apply(&mut self, api: &dyn ChangeApi) -> ProcessingState {
        if let Some(message) = self.begin_apply() {
            let result = api.post_message(&message).await;
            self.finish_apply(result);
        }
        self.processing_state
    }

    pub async fn commit(&mut self, api: &dyn ChangeApi) -> ProcessingState {
        if let Some(message) = self.begin_commit() {
            let result = api.post_message(&message).await;
            self.finish_commit(result);
        }
        self.processing_state
    }

    /// Start a new cycle, keeping the panel open
    pub fn reset(&mut self) {
        self.clear();
    }

    /// Clear everything and close the panel
    pub fn dismiss(&mut self) {
        self.clear();
        self.open = false;
    }

    /// Human-readable line for the current state; nothing while idle
    pub fn status_line(&self) -> Option<String> {
        match self.processing_state {
            ProcessingState::Idle => None,
            ProcessingState::Applying => Some("Applying changes...".to_string()),
            ProcessingState::Committing => Some("Committing changes...".to_string()),
            ProcessingState::Success => Some(match &self.commit_sha {
                Some(sha) => format!("Changes applied! Commit {}", sha),
                None => "Changes applied!".to_string(),
            }),
            ProcessingState::Error => Some(if self.api_response.is_empty() {
                GENERIC_ERROR.to_string()
            } else {
                self.api_response.clone()
            }),
        }
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(state = self.processing_state.as_str(), message = %message, "change request failed");
        self.processing_state = ProcessingState::Error;
        self.api_response = message;
    }

    fn clear(&mut self) {
        self.grab_content = None;
        self.change_request.clear();
        self.processing_state = ProcessingState::Idle;
        self.api_response.clear();
        self.commit_sha = None;
        self.has_applied_change = false;
        self.cursor_position = None;
    }
}

fn error_text(err: &anyhow::Error) -> String {
    let text = err.to_string();
    if text.is_empty() {
        GENERIC_ERROR.to_string()
    } else {
        text
    }
}

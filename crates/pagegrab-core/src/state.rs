//! UI-agnostic overlay state types
//!
//! This module contains the data structures shared between the overlay hosts
//! (terminal panel, HTTP endpoint) and doesn't depend on any UI framework.

use serde::{Deserialize, Serialize};

/// An element captured by the picker: its rendered source snippet and the
/// file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrabContent {
    pub code: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

/// Most recent pointer position, used only to place the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub x: u16,
    pub y: u16,
}

/// Where the apply/commit workflow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
    #[default]
    Idle,
    Applying,
    Committing,
    Success,
    Error,
}

impl ProcessingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingState::Idle => "idle",
            ProcessingState::Applying => "applying",
            ProcessingState::Committing => "committing",
            ProcessingState::Success => "success",
            ProcessingState::Error => "error",
        }
    }

    /// A call to the local endpoint is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, ProcessingState::Applying | ProcessingState::Committing)
    }
}

/// Request body accepted by the local endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequestBody {
    pub message: String,
}

/// Response contract of every local endpoint call.
///
/// `success == false` always carries a human-readable message in either
/// `response` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: Some(response.into()),
            error: None,
        }
    }

    /// Failure with the message in `response`, the shape used for upstream errors
    pub fn failed(response: impl Into<String>) -> Self {
        Self {
            success: false,
            response: Some(response.into()),
            error: None,
        }
    }

    /// Failure with the message in `error`, the shape used for validation errors
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.into()),
        }
    }

    /// The first non-empty message carried by the response
    pub fn message(&self) -> Option<&str> {
        self.response
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.error.as_deref().filter(|s| !s.is_empty()))
    }
}

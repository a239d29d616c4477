pub mod assistant;
pub mod commit;
pub mod config;
pub mod endpoint;
pub mod grab;
pub mod mode;
pub mod overlay;
pub mod picker;
pub mod state;

// Re-export main types for convenience
pub use assistant::{Assistant, AssistantError, OpencodeClient, PromptRequest};
pub use commit::extract_commit_sha;
pub use config::Config;
pub use endpoint::{ChangeEndpoint, EndpointError, EndpointReply, EndpointRoute};
pub use grab::{build_change_prompt, parse_grab_output};
pub use mode::RunMode;
pub use overlay::{ChangeApi, LocalApiClient, OverlayController, COMMIT_INSTRUCTION};
pub use picker::{ElementPicker, PickerBridge, SelectionHook};
pub use state::{ApiResponse, ChangeRequestBody, CursorPosition, GrabContent, ProcessingState};

use anyhow::anyhow;
use pagegrab_core::{
    ApiResponse, ChangeApi, Config, ElementPicker, LocalApiClient, OverlayController,
    PickerBridge, RunMode,
};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Apply,
    Commit,
}

/// A call to the local endpoint running on its own task
pub struct PendingCall {
    pub kind: PendingKind,
    pub handle: JoinHandle<anyhow::Result<ApiResponse>>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub mode: RunMode,
    pub overlay: OverlayController,

    // Change request editor
    pub input: String,
    pub input_cursor: usize, // char position in input

    // Endpoint
    pub api: LocalApiClient,
    pub pending: Option<PendingCall>,

    // Element selection
    pub picker: PickerBridge,

    // Animation state
    pub animation_frame: u8,
}

impl App {
    pub fn new(config: &Config, picker: Option<Box<dyn ElementPicker>>) -> Self {
        // the picker is only wired up where the overlay can show
        let picker = if config.mode.is_development() {
            PickerBridge::attach(picker)
        } else {
            PickerBridge::detached()
        };

        Self {
            should_quit: false,
            mode: config.mode,
            overlay: OverlayController::new(config.mode),
            input: String::new(),
            input_cursor: 0,
            api: LocalApiClient::new(&config.endpoint_url),
            pending: None,
            picker,
            animation_frame: 0,
        }
    }

    pub fn tick_animation(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 4;
    }

    /// Move any new picker selections into the overlay
    pub fn poll_picker(&mut self) {
        while let Some(grab) = self.picker.try_next() {
            self.overlay.capture(grab);
        }
    }

    /// Push the editor contents into the overlay
    pub fn sync_input(&mut self) {
        self.overlay.set_change_request(&self.input);
    }

    pub fn submit_apply(&mut self) {
        if self.is_waiting() {
            return;
        }
        self.sync_input();
        if let Some(message) = self.overlay.begin_apply() {
            self.spawn_call(PendingKind::Apply, message);
        }
    }

    pub fn submit_commit(&mut self) {
        if self.is_waiting() {
            return;
        }
        if let Some(message) = self.overlay.begin_commit() {
            self.spawn_call(PendingKind::Commit, message);
        }
    }

    fn spawn_call(&mut self, kind: PendingKind, message: String) {
        tracing::info!(kind = ?kind, endpoint = self.api.endpoint_url(), "posting change request");
        let api = self.api.clone();
        self.pending = Some(PendingCall {
            kind,
            handle: tokio::spawn(async move { api.post_message(&message).await }),
        });
    }

    /// Fold a finished call back into the overlay; no-op while it runs
    pub async fn poll_pending(&mut self) {
        let finished = self
            .pending
            .as_ref()
            .map(|p| p.handle.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        let result = match pending.handle.await {
            Ok(result) => result,
            Err(err) => Err(anyhow!("request task failed: {}", err)),
        };

        match pending.kind {
            PendingKind::Apply => self.overlay.finish_apply(result),
            PendingKind::Commit => self.overlay.finish_commit(result),
        }
    }

    /// A running call can't be aborted, only waited out
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn reset(&mut self) {
        if self.is_waiting() {
            return;
        }
        self.overlay.reset();
        self.clear_input();
    }

    pub fn dismiss(&mut self) {
        if self.is_waiting() {
            return;
        }
        self.overlay.dismiss();
        self.clear_input();
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.input_cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagegrab_core::{GrabContent, ProcessingState};

    fn dev_config() -> Config {
        let mut config = Config::new();
        config.mode = RunMode::Development;
        // nothing listens here; calls fail fast
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        config.endpoint_url = format!("http://{}/api/opencode/apply", addr);
        config
    }

    fn grab() -> GrabContent {
        GrabContent {
            code: "<nav/>".to_string(),
            file_path: "components/header.tsx".to_string(),
        }
    }

    #[tokio::test]
    async fn test_failed_call_lands_in_error() {
        let mut app = App::new(&dev_config(), None);
        app.overlay.capture(grab());
        app.input = "hide the nav".to_string();

        app.submit_apply();
        assert_eq!(app.overlay.processing_state(), ProcessingState::Applying);
        assert!(app.pending.is_some());

        // second submit while pending is ignored
        app.submit_apply();

        while app.pending.is_some() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            app.poll_pending().await;
        }
        assert_eq!(app.overlay.processing_state(), ProcessingState::Error);
        assert!(!app.overlay.api_response().is_empty());
    }

    #[tokio::test]
    async fn test_reset_and_dismiss_wait_for_running_call() {
        // accepts connections but never answers
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = dev_config();
        config.endpoint_url = format!("http://{}/api/opencode/apply", silent.local_addr().unwrap());

        let mut app = App::new(&config, None);
        app.overlay.capture(grab());
        app.input = "hide the nav".to_string();
        app.submit_apply();
        assert!(app.is_waiting());

        app.dismiss();
        app.reset();
        assert!(app.overlay.is_visible());
        assert_eq!(app.overlay.processing_state(), ProcessingState::Applying);
        assert_eq!(app.input, "hide the nav");
        assert!(!app.overlay.can_apply());

        // a new selection can't slip in while the call runs
        let replaced = app.overlay.capture(GrabContent {
            code: "<footer/>".to_string(),
            file_path: "b.tsx".to_string(),
        });
        assert!(!replaced);
        assert_eq!(app.overlay.grab_content().unwrap().file_path, "components/header.tsx");

        if let Some(pending) = app.pending.take() {
            pending.handle.abort();
        }
    }

    #[test]
    fn test_production_never_attaches_picker() {
        let app = App::new(&Config::new(), None);
        assert!(!app.picker.is_attached());
        assert!(!app.overlay.is_enabled());
    }

    #[test]
    fn test_reset_clears_editor() {
        let mut app = App::new(&dev_config(), None);
        app.overlay.capture(grab());
        app.input = "x".to_string();
        app.input_cursor = 1;
        app.reset();
        assert!(app.input.is_empty());
        assert_eq!(app.input_cursor, 0);
        assert!(app.overlay.grab_content().is_none());
    }
}

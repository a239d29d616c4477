//! Clipboard-backed element picker.
//!
//! The browser-side picker copies the selected element's source to the
//! clipboard, so watching the clipboard is how the terminal panel learns
//! about selections.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use arboard::Clipboard;
use pagegrab_core::{parse_grab_output, ElementPicker, SelectionHook};

/// Decides which clipboard reads count as a new selection
#[derive(Debug, Default)]
struct SelectionTracker {
    last: Option<String>,
}

impl SelectionTracker {
    fn seeded(current: Option<String>) -> Self {
        Self { last: current }
    }

    /// True when `text` differs from the previous read
    fn observe(&mut self, text: &str) -> bool {
        if self.last.as_deref() == Some(text) {
            return false;
        }
        self.last = Some(text.to_string());
        true
    }

    /// The selection was delivered and the clipboard emptied
    fn consumed(&mut self) {
        self.last = None;
    }
}

pub struct ClipboardPicker {
    active: Arc<AtomicBool>,
    hook: Arc<Mutex<Option<SelectionHook>>>,
    stop: Arc<AtomicBool>,
}

impl ClipboardPicker {
    /// Start watching the clipboard. `None` when there is no clipboard to
    /// watch (headless session, no display server).
    pub fn spawn(interval: Duration) -> Option<Self> {
        let active = Arc::new(AtomicBool::new(false));
        let hook: Arc<Mutex<Option<SelectionHook>>> = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let (thread_active, thread_hook, thread_stop) = (active.clone(), hook.clone(), stop.clone());
        let spawned = thread::Builder::new()
            .name("clipboard-picker".to_string())
            .spawn(move || {
                let mut clipboard = match Clipboard::new() {
                    Ok(clipboard) => {
                        let _ = ready_tx.send(true);
                        clipboard
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "clipboard unavailable; element picker disabled");
                        let _ = ready_tx.send(false);
                        return;
                    }
                };

                // whatever was copied before startup is not a selection
                let mut tracker = SelectionTracker::seeded(clipboard.get_text().ok());

                while !thread_stop.load(Ordering::Relaxed) {
                    thread::sleep(interval);

                    let Ok(text) = clipboard.get_text() else {
                        continue;
                    };
                    if !tracker.observe(&text) {
                        continue;
                    }

                    if !thread_active.load(Ordering::Relaxed) {
                        continue;
                    }
                    let hook = thread_hook.lock().ok().and_then(|guard| guard.as_ref().cloned());
                    let Some(hook) = hook else {
                        continue;
                    };
                    let is_grab = parse_grab_output(&text).is_some();
                    if hook.send(text).is_ok() && is_grab {
                        // empty the clipboard so copying the same element again is seen
                        match clipboard.clear() {
                            Ok(()) => tracker.consumed(),
                            Err(err) => tracing::debug!(error = %err, "could not clear clipboard"),
                        }
                    }
                }
            });

        if let Err(err) = spawned {
            tracing::warn!(error = %err, "could not start clipboard watcher");
            return None;
        }

        match ready_rx.recv() {
            Ok(true) => Some(Self { active, hook, stop }),
            _ => None,
        }
    }
}

impl ElementPicker for ClipboardPicker {
    fn activate(&mut self) {
        self.active.store(true, Ordering::Relaxed);
    }

    fn deactivate(&mut self) {
        self.active.store(false, Ordering::Relaxed);
    }

    fn register(&mut self, hook: SelectionHook) {
        if let Ok(mut slot) = self.hook.lock() {
            *slot = Some(hook);
        }
    }

    fn unregister(&mut self) {
        if let Ok(mut slot) = self.hook.lock() {
            *slot = None;
        }
    }
}

impl Drop for ClipboardPicker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

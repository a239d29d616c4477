//! Element picker capability
//!
//! The picker is whatever lets a user point at a rendered element and hand
//! its source to the overlay. It is optional: hosts without one simply never
//! receive a selection.

use tokio::sync::mpsc;

use crate::grab::parse_grab_output;
use crate::state::GrabContent;

/// Hook a picker calls with its raw selection output
pub type SelectionHook = mpsc::UnboundedSender<String>;

pub trait ElementPicker: Send {
    /// Start reporting selections
    fn activate(&mut self);

    /// Stop reporting selections
    fn deactivate(&mut self);

    /// Deliver every future selection to `hook`
    fn register(&mut self, hook: SelectionHook);

    /// Drop the hook registered by `register`
    fn unregister(&mut self);
}

/// Subscription of the overlay to an optional picker.
///
/// Subscribes on `attach` and unsubscribes on drop. With no picker every
/// query returns nothing.
pub struct PickerBridge {
    picker: Option<Box<dyn ElementPicker>>,
    rx: Option<mpsc::UnboundedReceiver<String>>,
}

impl PickerBridge {
    pub fn attach(picker: Option<Box<dyn ElementPicker>>) -> Self {
        let Some(mut picker) = picker else {
            tracing::debug!("no element picker available; overlay will stay hidden");
            return Self::detached();
        };

        let (tx, rx) = mpsc::unbounded_channel();
        picker.register(tx);
        picker.activate();
        tracing::info!("element picker attached");

        Self {
            picker: Some(picker),
            rx: Some(rx),
        }
    }

    pub fn detached() -> Self {
        Self { picker: None, rx: None }
    }

    pub fn is_attached(&self) -> bool {
        self.picker.is_some()
    }

    /// Next well-formed selection, skipping picker output that isn't a grab
    pub fn try_next(&mut self) -> Option<GrabContent> {
        let rx = self.rx.as_mut()?;
        while let Ok(raw) = rx.try_recv() {
            match parse_grab_output(&raw) {
                Some(grab) => return Some(grab),
                None => tracing::debug!(len = raw.len(), "ignoring picker output without a file path"),
            }
        }
        None
    }

    pub fn detach(&mut self) {
        if let Some(mut picker) = self.picker.take() {
            picker.deactivate();
            picker.unregister();
            tracing::info!("element picker detached");
        }
        self.rx = None;
    }
}

impl Drop for PickerBridge {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        active: bool,
        hook: Option<SelectionHook>,
        unregistered: bool,
    }

    struct FakePicker(Arc<Mutex<Calls>>);

    impl ElementPicker for FakePicker {
        fn activate(&mut self) {
            self.0.lock().unwrap().active = true;
        }
        fn deactivate(&mut self) {
            self.0.lock().unwrap().active = false;
        }
        fn register(&mut self, hook: SelectionHook) {
            self.0.lock().unwrap().hook = Some(hook);
        }
        fn unregister(&mut self) {
            let mut calls = self.0.lock().unwrap();
            calls.hook = None;
            calls.unregistered = true;
        }
    }

    fn select(calls: &Arc<Mutex<Calls>>, text: &str) {
        let calls = calls.lock().unwrap();
        calls.hook.as_ref().unwrap().send(text.to_string()).unwrap();
    }

    #[test]
    fn test_absent_picker_is_noop() {
        let mut bridge = PickerBridge::attach(None);
        assert!(!bridge.is_attached());
        assert_eq!(bridge.try_next(), None);
        bridge.detach();
    }

    #[test]
    fn test_attach_registers_and_activates() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let bridge = PickerBridge::attach(Some(Box::new(FakePicker(calls.clone()))));
        assert!(bridge.is_attached());
        assert!(calls.lock().unwrap().active);
        assert!(calls.lock().unwrap().hook.is_some());
    }

    #[test]
    fn test_delivers_parsed_selection_and_skips_noise() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut bridge = PickerBridge::attach(Some(Box::new(FakePicker(calls.clone()))));

        select(&calls, "not a grab");
        select(&calls, "<h2>About</h2>\n\nin components/about.tsx");

        let grab = bridge.try_next().unwrap();
        assert_eq!(grab.file_path, "components/about.tsx");
        assert_eq!(bridge.try_next(), None);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        {
            let _bridge = PickerBridge::attach(Some(Box::new(FakePicker(calls.clone()))));
        }
        let calls = calls.lock().unwrap();
        assert!(!calls.active);
        assert!(calls.unregistered);
        assert!(calls.hook.is_none());
    }
}

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use pagegrab_core::{parse_grab_output, CursorPosition};
use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_picker();
            app.poll_pending().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any state
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Esc => {
            app.dismiss();
            return;
        }
        KeyCode::Char('r') if ctrl => {
            app.reset();
            return;
        }
        KeyCode::Char('t') if ctrl => {
            app.overlay.toggle_collapse();
            return;
        }
        _ => {}
    }

    // Everything below edits or submits, which only an idle, visible panel allows
    if !app.overlay.is_visible() || !app.overlay.inputs_enabled() {
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_apply(),
        KeyCode::Char('g') if ctrl => app.submit_commit(),
        KeyCode::Char(c) if !ctrl => insert_text(app, &c.to_string()),
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
                app.sync_input();
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
                app.sync_input();
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.input_cursor = 0,
        KeyCode::End => app.input_cursor = app.input.chars().count(),
        _ => {}
    }
}

fn insert_text(app: &mut App, text: &str) {
    let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
    app.input.insert_str(byte_pos, text);
    app.input_cursor += text.chars().count();
    app.sync_input();
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Down(_) => {
            app.overlay.set_cursor_position(CursorPosition {
                x: mouse.column,
                y: mouse.row,
            });
        }
        _ => {}
    }
}

/// A pasted grab acts as a selection; anything else is request text
fn handle_paste(app: &mut App, text: &str) {
    if let Some(grab) = parse_grab_output(text) {
        if app.overlay.capture(grab) {
            return;
        }
    }

    if app.overlay.is_visible() && app.overlay.inputs_enabled() {
        // the request is a single line
        let flattened = text.replace(['\r', '\n'], " ");
        insert_text(app, &flattened);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use pagegrab_core::{Config, ProcessingState, RunMode};

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn dev_app() -> App {
        let mut config = Config::new();
        config.mode = RunMode::Development;
        App::new(&config, None)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_paste_grab_opens_panel() {
        let mut app = dev_app();
        handle_event(&mut app, AppEvent::Paste("<h1>Hi</h1>\n\nin components/hero.tsx".to_string()))
            .await
            .unwrap();
        assert!(app.overlay.is_visible());
        assert_eq!(app.overlay.grab_content().unwrap().file_path, "components/hero.tsx");
    }

    #[tokio::test]
    async fn test_typing_ignored_without_selection() {
        let mut app = dev_app();
        type_text(&mut app, "hello").await;
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn test_editing_keeps_overlay_in_sync() {
        let mut app = dev_app();
        handle_event(&mut app, AppEvent::Paste("<p>x</p>\nin a.tsx".to_string())).await.unwrap();

        type_text(&mut app, "bluë").await;
        handle_event(&mut app, key(KeyCode::Left)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Backspace)).await.unwrap();
        assert_eq!(app.input, "blë");
        assert_eq!(app.overlay.change_request(), "blë");

        handle_event(&mut app, AppEvent::Paste("more\ntext".to_string())).await.unwrap();
        assert_eq!(app.input, "blmore textë");
    }

    #[tokio::test]
    async fn test_commit_key_disabled_until_apply() {
        let mut app = dev_app();
        handle_event(&mut app, AppEvent::Paste("<p>x</p>\nin a.tsx".to_string())).await.unwrap();
        type_text(&mut app, "change").await;

        handle_event(&mut app, ctrl('g')).await.unwrap();
        assert_eq!(app.overlay.processing_state(), ProcessingState::Idle);
        assert!(app.pending.is_none());
    }

    #[tokio::test]
    async fn test_escape_ignored_while_applying() {
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = Config::new();
        config.mode = RunMode::Development;
        config.endpoint_url = format!("http://{}/api/opencode/apply", silent.local_addr().unwrap());
        let mut app = App::new(&config, None);

        handle_event(&mut app, AppEvent::Paste("<p>x</p>\nin a.tsx".to_string())).await.unwrap();
        type_text(&mut app, "change").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.overlay.processing_state(), ProcessingState::Applying);

        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        handle_event(&mut app, ctrl('r')).await.unwrap();
        assert!(app.overlay.is_visible());
        assert_eq!(app.overlay.processing_state(), ProcessingState::Applying);
        assert!(app.is_waiting());

        if let Some(pending) = app.pending.take() {
            pending.handle.abort();
        }
    }

    #[tokio::test]
    async fn test_escape_dismisses() {
        let mut app = dev_app();
        handle_event(&mut app, AppEvent::Paste("<p>x</p>\nin a.tsx".to_string())).await.unwrap();
        type_text(&mut app, "change").await;

        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert!(!app.overlay.is_visible());
        assert!(app.input.is_empty());
        assert!(app.overlay.change_request().is_empty());
    }
}

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use pagegrab_core::{CursorPosition, OverlayController, ProcessingState};
use crate::app::App;

const PANEL_WIDTH: u16 = 52;
const CODE_PREVIEW_LINES: usize = 4;
/// Where the panel goes before the pointer has moved
const DEFAULT_POSITION: CursorPosition = CursorPosition { x: 10, y: 5 };

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    render_backdrop(frame, app, area);

    if app.overlay.is_visible() {
        render_panel(frame, app, area);
    }
}

fn render_backdrop(frame: &mut Frame, app: &App, area: Rect) {
    let picker_status = if app.picker.is_attached() {
        Span::styled("watching clipboard", Style::default().fg(Color::Green))
    } else {
        Span::styled("no clipboard (paste selections instead)", Style::default().fg(Color::Yellow))
    };

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Mode: "),
            Span::styled(app.mode.display_name(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![Span::raw("Endpoint: "), Span::raw(app.api.endpoint_url()).dim()]),
        Line::from(vec![Span::raw("Picker: "), picker_status]),
        Line::default(),
    ];

    if app.overlay.is_enabled() {
        lines.push(Line::from("Select an element in the browser to copy it, or paste a selection here."));
        lines.push(Line::from("Enter apply · Ctrl-G commit · Ctrl-R reset · Ctrl-T collapse · Esc dismiss · Ctrl-Q quit").dim());
    } else {
        lines.push(Line::from("Editing is disabled outside development mode.").fg(Color::Yellow));
        lines.push(Line::from("Ctrl-Q quit").dim());
    }

    let backdrop = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" pagegrab "))
        .wrap(Wrap { trim: false });
    frame.render_widget(backdrop, area);
}

/// Panel placement: just below-right of the pointer, pushed back inside the frame
pub fn panel_rect(area: Rect, cursor: Option<CursorPosition>, height: u16) -> Rect {
    let width = PANEL_WIDTH.min(area.width);
    let height = height.min(area.height);
    let pos = cursor.unwrap_or(DEFAULT_POSITION);

    let max_x = area.x + area.width.saturating_sub(width);
    let max_y = area.y + area.height.saturating_sub(height);
    let x = pos.x.saturating_add(1).clamp(area.x, max_x);
    let y = pos.y.saturating_add(1).clamp(area.y, max_y);

    Rect::new(x, y, width, height)
}

fn panel_height(overlay: &OverlayController) -> u16 {
    if overlay.is_collapsed() {
        return 3;
    }
    let code_lines = overlay
        .grab_content()
        .map(|g| g.code.lines().count().min(CODE_PREVIEW_LINES))
        .unwrap_or(0) as u16;
    // borders + code + input box + status + response + hints
    2 + code_lines + 3 + 2 + 4 + 1
}

fn render_panel(frame: &mut Frame, app: &App, area: Rect) {
    let overlay = &app.overlay;
    let Some(grab) = overlay.grab_content() else {
        return;
    };

    let rect = panel_rect(area, overlay.cursor_position(), panel_height(overlay));
    frame.render_widget(Clear, rect);

    let toggle = if overlay.is_collapsed() { "▼" } else { "▲" };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Line::from(format!(" in {} ", grab.file_path)).fg(Color::Cyan))
        .title(Line::from(format!(" {} ", toggle)).right_aligned());

    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    if overlay.is_collapsed() {
        let summary = overlay
            .status_line()
            .unwrap_or_else(|| "Ctrl-T to expand".to_string());
        frame.render_widget(Paragraph::new(summary).dim(), inner);
        return;
    }

    let code_lines: Vec<Line> = grab
        .code
        .lines()
        .take(CODE_PREVIEW_LINES)
        .map(|l| Line::from(l.to_string()).dim())
        .collect();

    let [code_area, input_area, status_area, response_area, hints_area] = Layout::vertical([
        Constraint::Length(code_lines.len() as u16),
        Constraint::Length(3),
        Constraint::Length(2),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(Paragraph::new(Text::from(code_lines)), code_area);
    render_input(frame, app, input_area);
    render_status(frame, app, status_area);

    if overlay.processing_state() == ProcessingState::Idle && !overlay.api_response().is_empty() {
        let response = Paragraph::new(overlay.api_response().to_string())
            .wrap(Wrap { trim: true })
            .fg(Color::Gray);
        frame.render_widget(response, response_area);
    }

    render_hints(frame, overlay, hints_area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let enabled = app.overlay.inputs_enabled();
    let border = if enabled { Color::White } else { Color::DarkGray };

    let content = if app.input.is_empty() {
        Span::raw("What would you like to change?").dim()
    } else if enabled {
        Span::raw(app.input.as_str())
    } else {
        Span::raw(app.input.as_str()).dim()
    };

    let input = Paragraph::new(Line::from(content)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(input, area);

    if enabled {
        // keep the cursor inside the box even for long requests
        let max_col = area.width.saturating_sub(3);
        let col = (app.input_cursor as u16).min(max_col);
        frame.set_cursor_position((area.x + 1 + col, area.y + 1));
    }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let overlay = &app.overlay;
    let Some(text) = overlay.status_line() else {
        return;
    };

    let line = match overlay.processing_state() {
        ProcessingState::Applying | ProcessingState::Committing => {
            let spinner = SPINNER[app.animation_frame as usize % SPINNER.len()];
            Line::from(format!("{} {}", spinner, text)).fg(Color::Blue)
        }
        ProcessingState::Success => Line::from(format!("✓ {}", text)).fg(Color::Green),
        ProcessingState::Error => Line::from(format!("✗ {}", text)).fg(Color::Red),
        ProcessingState::Idle => Line::from(text),
    };

    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
}

fn render_hints(frame: &mut Frame, overlay: &OverlayController, area: Rect) {
    let enabled = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let disabled = Style::default().fg(Color::DarkGray);
    let style_for = |on: bool| if on { enabled } else { disabled };

    let mut spans = vec![
        Span::styled("[Enter] Apply", style_for(overlay.can_apply())),
        Span::raw("  "),
        Span::styled("[^G] Commit", style_for(overlay.can_commit())),
    ];
    if matches!(
        overlay.processing_state(),
        ProcessingState::Success | ProcessingState::Error
    ) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("[^R] Reset", enabled));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

//! Picker output parsing and change-request prompt building

use crate::state::GrabContent;

/// Parse the text the element picker copies on selection.
///
/// The picker emits the element's source followed by the file it lives in:
///
/// ```text
/// <h1 class="hero">Welcome</h1>
///
/// in /app/components/hero.tsx
/// ```
///
/// Returns `None` for anything that isn't in that shape.
pub fn parse_grab_output(text: &str) -> Option<GrabContent> {
    if !text.contains("\nin ") {
        return None;
    }

    let mut code_lines = Vec::new();
    let mut file_path = None;
    let mut in_file_section = false;

    for line in text.split('\n') {
        if line.starts_with("in ") {
            in_file_section = true;
            if file_path.is_none() {
                file_path = Some(line["in".len()..].trim_start().trim_end_matches('\r'));
            }
        } else if !in_file_section {
            code_lines.push(line);
        }
    }

    let code = code_lines.join("\n").trim().to_string();
    let file_path = file_path.unwrap_or_default().to_string();

    if code.is_empty() || file_path.is_empty() {
        return None;
    }

    Some(GrabContent { code, file_path })
}

/// Build the single prompt sent for an apply: element source, its file, then
/// the user's request.
pub fn build_change_prompt(grab: &GrabContent, change_request: &str) -> String {
    format!(
        "{}\n\nin {}\n\nChange request: {}",
        grab.code, grab.file_path, change_request
    )
}

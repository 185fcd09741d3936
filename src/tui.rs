use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::fmt::money;
use crate::form::{FieldKind, Form};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const STATUS_STYLE: Style = Style::new().fg(Color::Yellow);

const BORDER_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Format an amount as a colored Span (green for gains, red for losses).
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money(amount), style)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

pub fn title_line(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {title}"),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

/// Draw the greeting header, separator and footer shared by every page.
/// Returns the content area between them.
pub fn draw_chrome(frame: &mut Frame, greeting: &str, footer: &str, status: Option<&str>) -> Rect {
    let area = frame.area();
    let [header_area, sep, content_area, hints_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new(format!(" {greeting}")).style(HEADER_STYLE),
        header_area,
    );

    let sep_line = "━".repeat(area.width as usize);
    frame.render_widget(Paragraph::new(sep_line.as_str()).style(BORDER_STYLE), sep);

    match status {
        Some(msg) => frame.render_widget(
            Paragraph::new(format!(" {msg}")).style(STATUS_STYLE),
            hints_area,
        ),
        None => frame.render_widget(Paragraph::new(format!(" {footer}")).style(FOOTER_STYLE), hints_area),
    }

    content_area
}

/// Render a form as labelled rows, highlighting the focused field.
pub fn form_lines(title: &str, form: &Form, status: Option<&str>) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(""), title_line(title), Line::from("")];

    let label_width = form
        .fields
        .iter()
        .map(|f| f.label.chars().count())
        .max()
        .unwrap_or(0)
        .max(14);

    for (i, field) in form.fields.iter().enumerate() {
        let is_focused = i == form.focused;
        let label_style = if is_focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let value_style = if is_focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let value = match &field.kind {
            FieldKind::Text => {
                let cursor = if is_focused { "_" } else { "" };
                format!("{}{cursor}", field.value)
            }
            FieldKind::Selector { .. } => {
                let arrows = if is_focused { ("< ", " >") } else { ("  ", "  ") };
                format!("{}{}{}", arrows.0, field.value, arrows.1)
            }
        };
        lines.push(Line::from(vec![
            Span::styled(format!("   {:<label_width$} ", field.label), label_style),
            Span::styled(value, value_style),
        ]));
    }

    if let Some(msg) = status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("   {msg}"), STATUS_STYLE)));
    }
    lines
}

/// Returned by every page's key handler to its dashboard.
pub enum PageAction {
    Continue,
    Close,
}

/// Vertical scroll keeping `line` inside a viewport of `height` rows.
pub fn scroll_offset(line: usize, height: u16) -> u16 {
    let height = height as usize;
    if height == 0 || line < height {
        0
    } else {
        (line + 1 - height) as u16
    }
}

pub const FORM_HINTS: &str = "Tab=next field  Left/Right=choose  Enter=save  Esc=cancel";

/// A footer message that clears itself after a few key presses.
#[derive(Default)]
pub struct StatusLine {
    message: Option<String>,
    ttl: u8,
}

impl StatusLine {
    pub fn set(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.ttl = 3;
    }

    /// Count down one key press.
    pub fn tick(&mut self) {
        if self.ttl > 0 {
            self.ttl -= 1;
            if self.ttl == 0 {
                self.message = None;
            }
        }
    }

    pub fn get(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormField;

    #[test]
    fn test_status_line_expires_after_three_keys() {
        let mut status = StatusLine::default();
        status.set("Saved");
        status.tick();
        status.tick();
        assert_eq!(status.get(), Some("Saved"));
        status.tick();
        assert_eq!(status.get(), None);
    }

    #[test]
    fn test_form_lines_mark_focused_field() {
        let form = Form::new(vec![
            FormField::text("Farmer", "Ana"),
            FormField::selector("Area", vec!["North".into()], 0),
        ]);
        let lines = form_lines("Add Record", &form, Some("Area is required"));
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert!(text.iter().any(|l| l.contains("Ana_")));
        assert!(text.iter().any(|l| l.contains("  North  ")));
        assert!(text.last().unwrap().contains("Area is required"));
    }

    #[test]
    fn test_scroll_offset_keeps_line_visible() {
        assert_eq!(scroll_offset(3, 10), 0);
        assert_eq!(scroll_offset(10, 10), 1);
        assert_eq!(scroll_offset(25, 10), 16);
    }

    #[test]
    fn test_wrap_text_counts_lines() {
        let (wrapped, lines) = wrap_text("one two three four", 9);
        assert_eq!(lines, 3);
        assert!(wrapped.contains('\n'));
    }
}

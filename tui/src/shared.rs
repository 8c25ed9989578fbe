//! Shared rendering helpers for the wizard and chat screens.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use anvil_engine::form::FieldEditor;

use crate::theme::{Palette, styles};

/// A single-line field scrolled so the cursor stays inside the visible
/// window.
pub(crate) struct FieldView {
    pub(crate) text: String,
    /// Cursor offset in columns from the field's left edge.
    pub(crate) cursor_col: u16,
}

pub(crate) fn field_view(editor: &FieldEditor, content_width: usize) -> FieldView {
    let text = editor.text();
    let before_cursor = &text[..editor.cursor()];
    let cursor_display_pos = before_cursor.width();

    if cursor_display_pos >= content_width {
        let scroll_target = cursor_display_pos - content_width + 1;
        let mut byte_offset = 0;
        let mut skipped_width = 0;
        for (idx, grapheme) in text.grapheme_indices(true) {
            if skipped_width >= scroll_target {
                byte_offset = idx;
                break;
            }
            skipped_width += grapheme.width();
        }
        FieldView {
            text: text[byte_offset..].to_string(),
            cursor_col: cursor_display_pos.saturating_sub(skipped_width) as u16,
        }
    } else {
        FieldView {
            text: text.to_string(),
            cursor_col: cursor_display_pos as u16,
        }
    }
}

/// Alternating key/action spans for a hint row.
pub(crate) fn hint_spans<'a>(pairs: &[(&'a str, &'a str)], palette: &Palette) -> Vec<Span<'a>> {
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (key, action) in pairs {
        spans.push(Span::styled(*key, styles::key_highlight(palette)));
        spans.push(Span::styled(
            format!(" {action}  "),
            styles::key_hint(palette),
        ));
    }
    spans
}

/// A label/value row, label right-aligned in a fixed gutter.
pub(crate) fn kv_line<'a>(label: &'a str, value: String, palette: &Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("{label:>16}  "),
            ratatui::style::Style::default().fg(palette.text_muted),
        ),
        Span::styled(
            value,
            ratatui::style::Style::default().fg(palette.text_primary),
        ),
    ])
}

/// A `width` by `height` rectangle centered in `area`, clamped to it.
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width) / 2),
        y: area.y + (area.height.saturating_sub(height) / 2),
        width,
        height,
    }
}

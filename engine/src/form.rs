//! Single-line text field editing.
//!
//! [`FieldEditor`] backs every editable field in the wizard (endpoint fields,
//! tool server registration, the chat input). The cursor always sits on a
//! grapheme boundary, so multi-byte input edits cleanly.

use unicode_segmentation::UnicodeSegmentation;

/// Cursor and deletion commands a field understands.
///
/// [`FieldEditor::apply`] reports whether the text changed; pure cursor
/// motion does not count as an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMotion {
    Left,
    Right,
    Home,
    End,
    Backspace,
    Delete,
    /// Delete the word before the cursor (Ctrl+W).
    DeleteWord,
    /// Clear the whole field (Ctrl+U).
    Clear,
}

impl EditMotion {
    /// The motion a key maps to, if it is a field-editing key at all.
    pub(crate) fn from_key(key: &crate::UiKey) -> Option<Self> {
        use crate::UiKey;
        Some(match key {
            UiKey::Left => Self::Left,
            UiKey::Right => Self::Right,
            UiKey::Home => Self::Home,
            UiKey::End => Self::End,
            UiKey::Backspace => Self::Backspace,
            UiKey::Delete => Self::Delete,
            UiKey::CtrlW => Self::DeleteWord,
            UiKey::CtrlU => Self::Clear,
            _ => return None,
        })
    }
}

/// An editable single-line text field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldEditor {
    text: String,
    /// Byte offset into `text`, always on a grapheme boundary.
    cursor: usize,
}

impl FieldEditor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A field prefilled with `text`, cursor at the end.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the cursor within [`Self::text`].
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the contents, moving the cursor to the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    /// Insert one character at the cursor. Always an edit.
    pub fn insert_char(&mut self, ch: char) -> bool {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        true
    }

    /// Insert a pasted chunk at the cursor. Control characters other than tab
    /// are stripped; a paste of only control characters is not an edit.
    pub fn insert_str(&mut self, chunk: &str) -> bool {
        let cleaned: String = chunk
            .chars()
            .filter(|c| !c.is_control() || *c == '\t')
            .collect();
        if cleaned.is_empty() {
            return false;
        }
        self.text.insert_str(self.cursor, &cleaned);
        self.cursor += cleaned.len();
        true
    }

    /// Apply a motion. Returns true when the text changed.
    pub fn apply(&mut self, motion: EditMotion) -> bool {
        match motion {
            EditMotion::Left => {
                if let Some(start) = self.prev_boundary() {
                    self.cursor = start;
                }
                false
            }
            EditMotion::Right => {
                if let Some(end) = self.next_boundary() {
                    self.cursor = end;
                }
                false
            }
            EditMotion::Home => {
                self.cursor = 0;
                false
            }
            EditMotion::End => {
                self.cursor = self.text.len();
                false
            }
            EditMotion::Backspace => match self.prev_boundary() {
                Some(start) => {
                    self.text.replace_range(start..self.cursor, "");
                    self.cursor = start;
                    true
                }
                None => false,
            },
            EditMotion::Delete => match self.next_boundary() {
                Some(end) => {
                    self.text.replace_range(self.cursor..end, "");
                    true
                }
                None => false,
            },
            EditMotion::DeleteWord => {
                let start = self.word_start();
                if start == self.cursor {
                    return false;
                }
                self.text.replace_range(start..self.cursor, "");
                self.cursor = start;
                true
            }
            EditMotion::Clear => {
                if self.text.is_empty() {
                    return false;
                }
                self.text.clear();
                self.cursor = 0;
                true
            }
        }
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor]
            .grapheme_indices(true)
            .last()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .graphemes(true)
            .next()
            .map(|g| self.cursor + g.len())
    }

    /// Start of the word before the cursor: the last non-whitespace segment
    /// boundary, so Ctrl+W also swallows trailing spaces.
    fn word_start(&self) -> usize {
        self.text[..self.cursor]
            .split_word_bound_indices()
            .filter(|(_, seg)| !seg.trim().is_empty())
            .last()
            .map_or(0, |(i, _)| i)
    }
}

//! Single-line text buffer backing the API key field.
//!
//! The cursor is a character offset (not a byte offset) so that multi-byte input never splits a
//! code point. Only the handful of edits the field needs are supported; there is no selection,
//! undo or word motion.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    content: String,
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    /// Cursor position in characters, `0..=len()`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Replace the whole content and move the cursor to the end.
    pub fn set_text(&mut self, text: &str) {
        self.content = text.to_string();
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.len());
    }

    /// Splice `text` into the buffer at character offset `offset` and return the new cursor
    /// (`offset + chars(text)`). The cursor is moved there as well.
    ///
    /// `offset` must not exceed [`TextBuffer::len`]. Debug builds assert on that; release builds
    /// clamp the offset to the end of the buffer.
    pub fn insert_at(&mut self, offset: usize, text: &str) -> usize {
        let len = self.len();
        debug_assert!(
            offset <= len,
            "insert offset {offset} out of bounds for buffer of {len} chars"
        );
        let offset = offset.min(len);
        let byte_idx = self.byte_index(offset);
        self.content.insert_str(byte_idx, text);
        self.cursor = offset + text.chars().count();
        self.cursor
    }

    /// Insert `text` at the cursor and advance the cursor past it.
    pub fn insert_str(&mut self, text: &str) -> usize {
        self.insert_at(self.cursor, text)
    }

    pub fn insert_char(&mut self, ch: char) {
        let byte_idx = self.byte_index(self.cursor);
        self.content.insert(byte_idx, ch);
        self.cursor += 1;
    }

    /// Delete the character before the cursor. Returns false at the start of the buffer.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let byte_idx = self.byte_index(self.cursor - 1);
        self.content.remove(byte_idx);
        self.cursor -= 1;
        true
    }

    /// Delete the character under the cursor. Returns false at the end of the buffer.
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        let byte_idx = self.byte_index(self.cursor);
        self.content.remove(byte_idx);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    fn byte_index(&self, char_offset: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_offset)
            .map_or(self.content.len(), |(idx, _)| idx)
    }
}

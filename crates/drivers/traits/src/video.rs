//! Display Trait
//!
//! Implemented by the text-mode screen renderer.
//! Used by the console requests of the dispatcher.

/// Text-mode display
pub trait Display {
    fn clear_screen(&mut self);

    /// Write a character at the cursor and advance it
    fn out_char(&mut self, c: u8);

    /// Write a character with a color attribute at a cell, cursor untouched
    fn out_char_attr(&mut self, x: u16, y: u16, c: u8, attr: u8);

    fn set_cursor_pos(&mut self, x: u16, y: u16);

    /// Current cursor cell, `(x, y)`
    fn cursor_pos(&self) -> (u16, u16);

    fn set_cursor_visible(&mut self, visible: bool);
}

//! UI preference types shared by the engine and the terminal frontend.
//!
//! Pure data with no IO and no ratatui dependency; the engine owns the
//! values, the TUI reads them when picking palettes and glyphs.

/// Rendering preferences derived from the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    /// Use ASCII-only glyphs for icons and spinners.
    pub ascii_only: bool,
    /// Use a high-contrast color palette.
    pub high_contrast: bool,
    /// Freeze spinners and other animated elements.
    pub reduced_motion: bool,
}

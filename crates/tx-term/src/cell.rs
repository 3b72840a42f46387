// SPDX-License-Identifier: MIT
//
// Cell — one character position on screen, plus its style token.
//
// The renderer compares cells by value: same character and same style means
// nothing to write. Styles are deliberately small and `Copy` so that this
// comparison is a couple of integer compares and a whole grid can be copied
// around without thinking about ownership.
//
// The style is opaque to the engine. It never blends, inherits, or merges
// styles; it only turns one into a single SGR escape right before the
// character and resets right after, so styled cells never bleed into the
// next write.

// ─── Color ───────────────────────────────────────────────────────────────────

/// The sixteen-colour ANSI palette.
///
/// Every terminal that understands SGR supports these, which is all a
/// character-cell game needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl Color {
    /// Palette index 0–15.
    const fn index(self) -> u8 {
        self as u8
    }

    /// SGR parameter for this colour as a foreground (30–37, 90–97).
    #[must_use]
    pub const fn fg_code(self) -> u8 {
        let i = self.index();
        if i < 8 { 30 + i } else { 90 + i - 8 }
    }

    /// SGR parameter for this colour as a background (40–47, 100–107).
    #[must_use]
    pub const fn bg_code(self) -> u8 {
        let i = self.index();
        if i < 8 { 40 + i } else { 100 + i - 8 }
    }
}

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes as a compact bitfield.
    ///
    /// ```
    /// use tx_term::cell::Attr;
    ///
    /// let a = Attr::BOLD | Attr::UNDERLINE;
    /// assert!(a.contains(Attr::BOLD));
    /// assert!(!a.contains(Attr::DIM));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1
        const BOLD      = 1 << 0;
        /// SGR 2
        const DIM       = 1 << 1;
        /// SGR 3
        const ITALIC    = 1 << 2;
        /// SGR 4
        const UNDERLINE = 1 << 3;
        /// SGR 7
        const INVERSE   = 1 << 4;
    }
}

impl Attr {
    /// SGR parameters for the set flags, in ascending order.
    pub fn codes(self) -> impl Iterator<Item = u8> {
        [
            (Self::BOLD, 1),
            (Self::DIM, 2),
            (Self::ITALIC, 3),
            (Self::UNDERLINE, 4),
            (Self::INVERSE, 7),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, code)| code)
    }
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// The style token carried by every cell.
///
/// [`Style::NONE`] emits no escape at all; anything else becomes one SGR
/// sequence in front of the character.
///
/// ```
/// use tx_term::cell::{Attr, Color, Style};
///
/// let warn = Style::NONE.fg(Color::Yellow).attrs(Attr::BOLD);
/// assert!(!warn.is_none());
/// assert_ne!(warn, Style::NONE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub attrs: Attr,
}

impl Style {
    /// Terminal defaults, no escape emitted.
    pub const NONE: Self = Self {
        fg: None,
        bg: None,
        attrs: Attr::empty(),
    };

    #[must_use]
    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    #[must_use]
    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    #[must_use]
    pub const fn attrs(mut self, attrs: Attr) -> Self {
        self.attrs = attrs;
        self
    }

    /// Whether this style leaves the terminal defaults untouched.
    #[inline]
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty()
    }

    /// All SGR parameters for this style: attributes, then fg, then bg.
    pub fn sgr_params(&self) -> impl Iterator<Item = u8> {
        self.attrs
            .codes()
            .chain(self.fg.map(Color::fg_code))
            .chain(self.bg.map(Color::bg_code))
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single terminal cell.
///
/// ```
/// use tx_term::cell::{Cell, Color, Style};
///
/// assert_eq!(Cell::default(), Cell::EMPTY);
/// let c = Cell::styled('#', Style::NONE.fg(Color::Red));
/// assert_eq!(c.ch, '#');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Cell {
    /// A blank: space with no style.
    pub const EMPTY: Self = Self {
        ch: ' ',
        style: Style::NONE,
    };

    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            style: Style::NONE,
        }
    }

    #[inline]
    #[must_use]
    pub const fn styled(ch: char, style: Style) -> Self {
        Self { ch, style }
    }

    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl From<char> for Cell {
    fn from(ch: char) -> Self {
        Self::new(ch)
    }
}

// ─── Glyphs ──────────────────────────────────────────────────────────────────

/// Block elements for pixel-style drawing.
pub mod glyph {
    pub const FULL: char = '█';
    pub const DARK: char = '▓';
    pub const MEDIUM: char = '▒';
    pub const LIGHT: char = '░';
    pub const UPPER_HALF: char = '▀';
    pub const LOWER_HALF: char = '▄';
}

// ─── Tests ───────────────────────────────────────────────────────────────────

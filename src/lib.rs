//! Security filter for the OpenType character-to-glyph mapping (`cmap`)
//! table.
//!
//! The input is an arbitrary, untrusted `cmap` table from a font file. Every
//! structural and semantic rule of the format is checked — offsets, lengths,
//! subtable ordering and overlap, and the glyph bound taken from `maxp` —
//! and on success a minimal, canonical table containing only the supported
//! subtables can be emitted for downstream rasterizers.
//!
//! Three quirks observed in widely-circulated fonts are tolerated with a
//! warning instead of a rejection; everything else fails hard. Subtable
//! formats 4 and 14 are validated exhaustively (format 4 by simulating the
//! lookup of every covered code point) and then copied through byte-for-byte;
//! formats 0, 12 and 13 are decoded and rebuilt.
//!
//! A typical pipeline run:
//!
//! 1. [`cmap::parse`] the raw table against the font's glyph count;
//! 2. check [`cmap::should_serialize`];
//! 3. [`cmap::serialize`] into an [`OutputStream`].

pub mod buffer;
pub mod cmap;
pub mod error;
pub mod stream;

pub use crate::cmap::{MapGroup, ParsedCmap};
pub use crate::error::Error;
pub use crate::stream::OutputStream;

/// The `usFirstCharIndex` / `usLastCharIndex` pair from the `OS/2` table.
///
/// Many fonts ship these fields out of sync with what their `cmap` actually
/// covers; format-4 parsing widens the pair to match the segments it
/// accepts. The value 0xFFFF is a sentinel and is never adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharIndexRange {
    pub first: u16,
    pub last: u16,
}

/// Per-font sanitizer state threaded through the table processors.
///
/// Only the collaborator values this crate consumes are represented: the
/// glyph count from `maxp`, the `OS/2` character index range, and the parsed
/// `cmap` itself.
#[derive(Debug, Default)]
pub struct OpenTypeFont<'a> {
    /// `maxp.numGlyphs`; every glyph id the table references must stay
    /// below it.
    pub num_glyphs: u16,
    /// `None` when the font carries no `OS/2` table.
    pub os2_char_range: Option<CharIndexRange>,
    /// Populated by a successful [`cmap::parse`].
    pub cmap: Option<ParsedCmap<'a>>,
}

//! Format 0 (byte encoding table): the classic Mac Roman mapping.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-0-byte-encoding-table>

use crate::buffer::Buffer;
use crate::error::Error;

/// One glyph id per byte value.
pub(crate) const GLYPH_ARRAY_SIZE: usize = 256;

/// Parses a format-0 subtable into its 256-entry glyph array.
///
/// Glyph ids here are single bytes, so no check against the font's glyph
/// count is needed.
pub(crate) fn parse(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut subtable = Buffer::new(data);

    subtable.skip(4)?; // format + length
    let language = subtable.read_u16()?;
    if language != 0 {
        // Seen in real fonts (e.g. simsun.ttf); the array itself is still usable.
        log::warn!("format 0 subtable with non-zero language id {language}");
    }

    let mut glyphs = Vec::with_capacity(GLYPH_ARRAY_SIZE);
    for _ in 0..GLYPH_ARRAY_SIZE {
        glyphs.push(subtable.read_u8()?);
    }

    Ok(glyphs)
}

#[cfg(test)]
mod tests {
    use super::{parse, GLYPH_ARRAY_SIZE};

    fn subtable() -> Vec<u8> {
        let mut data = vec![
            0x00, 0x00, // format: 0
            0x01, 0x06, // length: 262
            0x00, 0x00, // language: 0
        ];
        for i in 0..GLYPH_ARRAY_SIZE {
            data.push(i as u8);
        }
        data
    }

    #[test]
    fn whole_array_is_read() {
        let glyphs = parse(&subtable()).unwrap();
        assert_eq!(glyphs.len(), GLYPH_ARRAY_SIZE);
        assert_eq!(glyphs[0x41], 0x41);
        assert_eq!(glyphs[0xFF], 0xFF);
    }

    #[test]
    fn non_zero_language_is_tolerated() {
        let mut data = subtable();
        data[5] = 0x01;
        assert!(parse(&data).is_ok());
    }

    #[test]
    fn truncated_array_fails() {
        let mut data = subtable();
        data.truncate(data.len() - 1);
        assert!(parse(&data).is_err());
    }
}

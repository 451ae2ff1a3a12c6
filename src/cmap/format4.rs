//! Format 4 (segment mapping to delta values): the BMP workhorse.
//!
//! Rather than decoding and recompacting the segment structure, the
//! sanitizer validates it here and copies the bytes through untouched. The
//! validation simulates the lookup of every covered code point: that is the
//! only check that proves the trailing glyph-id array is never indexed
//! outside the subtable.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-4-segment-mapping-to-delta-values>

use crate::buffer::Buffer;
use crate::error::{bail, bail_if, Error};
use crate::CharIndexRange;

#[derive(Default, Clone)]
struct Segment {
    start_code: u16,
    end_code: u16,
    id_delta: i16,
    id_range_offset: u16,
    /// Byte offset within the subtable at which `id_range_offset` was read.
    /// The glyph-array indirection is relative to the field's own location,
    /// so it has to be captured while reading.
    id_range_offset_pos: usize,
}

/// Validates a format-4 subtable against the font's glyph count and widens
/// the `OS/2` character index range to what the segments actually cover.
///
/// On success the caller stores `data` verbatim.
pub(crate) fn parse(
    data: &[u8],
    num_glyphs: u16,
    char_range: &mut CharIndexRange,
) -> Result<(), Error> {
    let mut subtable = Buffer::new(data);

    subtable.skip(4)?; // format + length
    let language = subtable.read_u16()?;
    // Windows-platform subtables are language-neutral.
    bail_if!(language != 0);

    let seg_count_x2 = subtable.read_u16()?;
    let search_range = subtable.read_u16()?;
    let entry_selector = subtable.read_u16()?;
    let range_shift = subtable.read_u16()?;

    bail_if!(seg_count_x2 & 1 != 0 || search_range & 1 != 0);
    let seg_count = seg_count_x2 / 2;
    bail_if!(seg_count < 1);

    // The largest k with 2^(k+1) <= seg_count; the binary-search fields all
    // derive from it.
    let mut log2_seg_count = 0u16;
    while 1u32 << (log2_seg_count + 1) <= u32::from(seg_count) {
        log2_seg_count += 1;
    }
    bail_if!(search_range != 2 * (1 << log2_seg_count));
    bail_if!(entry_selector != log2_seg_count);
    bail_if!(range_shift != seg_count_x2 - search_range);

    let mut segments = vec![Segment::default(); usize::from(seg_count)];

    for segment in &mut segments {
        segment.end_code = subtable.read_u16()?;
    }

    let padding = subtable.read_u16()?;
    bail_if!(padding != 0);

    for segment in &mut segments {
        segment.start_code = subtable.read_u16()?;
    }
    for segment in &mut segments {
        segment.id_delta = subtable.read_i16()?;
    }

    let last = segments.len() - 1;
    for (i, segment) in segments.iter_mut().enumerate() {
        segment.id_range_offset_pos = subtable.offset();
        segment.id_range_offset = subtable.read_u16()?;

        if segment.id_range_offset & 1 != 0 {
            // Some font generators put 65535 here on the 0xFFFF-0xFFFF
            // terminator segment.
            if i == last {
                log::warn!("odd id_range_offset in the final segment");
                // Only the simulation below sees the coerced value; the
                // stored bytes go through unchanged.
                segment.id_range_offset = 0;
            } else {
                bail!();
            }
        }
    }

    // Segments must be in ascending end-code order and may not overlap.
    for i in 1..segments.len() {
        if i == last
            && segments[i - 1].start_code == 0xFFFF
            && segments[i - 1].end_code == 0xFFFF
            && segments[i].start_code == 0xFFFF
            && segments[i].end_code == 0xFFFF
        {
            // Some fonts (e.g. Germania.ttf) close with more than one
            // terminator segment; accept the duplicate.
            log::warn!("multiple 0xFFFF terminator segments");
            continue;
        }

        bail_if!(segments[i].end_code <= segments[i - 1].end_code);
        bail_if!(segments[i].start_code <= segments[i - 1].end_code);

        // The OS/2 first/last char indices are frequently wrong in the wild;
        // widen them to what the segments actually cover.
        if char_range.first != 0xFFFF
            && segments[i].start_code != 0xFFFF
            && char_range.first > segments[i].start_code
        {
            char_range.first = segments[i].start_code;
        }
        if char_range.last != 0xFFFF
            && segments[i].end_code != 0xFFFF
            && char_range.last < segments[i].end_code
        {
            char_range.last = segments[i].end_code;
        }
    }

    // Every table ends with a 0xFFFF terminator segment.
    bail_if!(segments[last].end_code != 0xFFFF);

    // Simulate the lookup of every covered code point and make sure each one
    // lands on a valid glyph without reading outside the subtable.
    for segment in &segments[1..] {
        for code_point in segment.start_code..=segment.end_code {
            if segment.id_range_offset == 0 {
                // The addition is explicitly allowed to wrap.
                let glyph = code_point.wrapping_add(segment.id_delta as u16);
                bail_if!(glyph >= num_glyphs);
            } else {
                // The offset is relative to the location of the offset field
                // itself.
                let glyph_pos = segment.id_range_offset_pos
                    + usize::from(segment.id_range_offset)
                    + usize::from(code_point - segment.start_code) * 2;
                bail_if!(glyph_pos + 1 >= data.len());

                let glyph = u16::from_be_bytes([data[glyph_pos], data[glyph_pos + 1]]);
                bail_if!(glyph >= num_glyphs);
            }
        }
    }

    Ok(())
}

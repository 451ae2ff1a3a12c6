//! Format 14 (Unicode variation sequences).
//!
//! The nested offset structure makes a canonical rewrite fiddly, so the
//! subtable is validated exhaustively here and then carried through to the
//! output byte-for-byte.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-14-unicode-variation-sequences>

use crate::buffer::Buffer;
use crate::cmap::UNICODE_UPPER_LIMIT;
use crate::error::{bail_if, Error};

/// The variation-selector records start at byte 10 of the subtable.
const VAR_SELECTOR_RECORDS_OFFSET: u32 = 10;
/// One record: a 24-bit selector plus two 32-bit offsets.
const VAR_SELECTOR_RECORD_SIZE: u32 = 11;

pub(crate) fn parse(data: &[u8], num_glyphs: u16) -> Result<(), Error> {
    let length = data.len() as u32;
    let mut subtable = Buffer::new(data);

    subtable.skip(6)?; // format + length
    let num_var_selector_records = subtable.read_u32()?;
    // The reads above guarantee length >= 10.
    bail_if!(
        (length - VAR_SELECTOR_RECORDS_OFFSET) / VAR_SELECTOR_RECORD_SIZE
            < num_var_selector_records
    );

    let mut prev_var_selector = 0u32;
    for _ in 0..num_var_selector_records {
        let var_selector = subtable.read_u24()?;
        let def_uvs_offset = subtable.read_u32()?;
        let non_def_uvs_offset = subtable.read_u32()?;

        bail_if!(
            var_selector <= prev_var_selector
                || var_selector > UNICODE_UPPER_LIMIT
                || def_uvs_offset > length - 4
                || non_def_uvs_offset > length - 4
        );
        prev_var_selector = var_selector;

        if def_uvs_offset != 0 {
            // Default UVS table: ranges of base code points that keep their
            // default glyph under this selector.
            let mut uvs_table = Buffer::new(&data[def_uvs_offset as usize..]);
            let num_unicode_value_ranges = uvs_table.read_u32()?;

            let mut prev_end_unicode = 0u32;
            for i in 0..num_unicode_value_ranges {
                let start_unicode = uvs_table.read_u24()?;
                let additional = uvs_table.read_u8()?;
                let end_unicode = start_unicode + u32::from(additional);

                bail_if!(
                    (i > 0 && start_unicode <= prev_end_unicode)
                        || end_unicode > UNICODE_UPPER_LIMIT
                );
                prev_end_unicode = end_unicode;
            }
        }

        if non_def_uvs_offset != 0 {
            // Non-default UVS table: explicit (code point, glyph) pairs.
            let mut uvs_table = Buffer::new(&data[non_def_uvs_offset as usize..]);
            let num_uvs_mappings = uvs_table.read_u32()?;

            let mut prev_unicode = 0u32;
            for i in 0..num_uvs_mappings {
                let unicode_value = uvs_table.read_u24()?;
                bail_if!(
                    (i > 0 && unicode_value <= prev_unicode)
                        || unicode_value > UNICODE_UPPER_LIMIT
                );

                let glyph = uvs_table.read_u16()?;
                bail_if!(glyph >= num_glyphs);
                prev_unicode = unicode_value;
            }
        }
    }

    Ok(())
}

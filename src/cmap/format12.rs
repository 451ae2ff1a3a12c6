//! Format 12 (segmented coverage): 32-bit code points mapped onto
//! consecutive runs of glyph ids.
//!
//! These tables are simple enough to decode fully; the serializer rebuilds
//! them from the group array.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-12-segmented-coverage>

use crate::buffer::Buffer;
use crate::cmap::{MapGroup, MAX_GROUPS, UNICODE_UPPER_LIMIT};
use crate::error::{bail_if, Error};

pub(crate) fn parse(data: &[u8], num_glyphs: u16) -> Result<Vec<MapGroup>, Error> {
    let mut subtable = Buffer::new(data);

    subtable.skip(8)?; // format + reserved + length
    let language = subtable.read_u32()?;
    bail_if!(language != 0);

    let num_groups = subtable.read_u32()?;
    bail_if!(num_groups == 0 || num_groups > MAX_GROUPS);

    let mut groups = Vec::with_capacity(num_groups as usize);
    for _ in 0..num_groups {
        let group = MapGroup {
            start_code: subtable.read_u32()?,
            end_code: subtable.read_u32()?,
            start_glyph_id: subtable.read_u32()?,
        };

        bail_if!(
            group.start_code > UNICODE_UPPER_LIMIT
                || group.end_code > UNICODE_UPPER_LIMIT
                || group.start_glyph_id > 0xFFFF
        );

        // [0xD800, 0xDFFF] are surrogate code points: a group may not start,
        // end, or straddle there.
        bail_if!(group.start_code >= 0xD800 && group.start_code <= 0xDFFF);
        bail_if!(group.end_code >= 0xD800 && group.end_code <= 0xDFFF);
        bail_if!(group.start_code < 0xD800 && group.end_code > 0xDFFF);

        // The limits above keep this arithmetic from overflowing.
        bail_if!(group.end_code < group.start_code);
        bail_if!(
            (group.end_code - group.start_code) + group.start_glyph_id > u32::from(num_glyphs)
        );

        groups.push(group);
    }

    // Groups must be sorted by start code and may not overlap.
    for i in 1..groups.len() {
        bail_if!(groups[i].start_code <= groups[i - 1].start_code);
        bail_if!(groups[i].start_code <= groups[i - 1].end_code);
    }

    Ok(groups)
}

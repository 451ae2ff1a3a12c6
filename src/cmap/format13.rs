//! Format 13 (many-to-one range mappings): every code point in a group maps
//! to the same glyph, typically a "last resort" fallback.
//!
//! The layout matches format 12; only the meaning of `start_glyph_id`
//! differs, so the glyph bound is checked against the single glyph rather
//! than the span of the group.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-13-many-to-one-range-mappings>

use crate::buffer::Buffer;
use crate::cmap::{MapGroup, MAX_GROUPS, UNICODE_UPPER_LIMIT};
use crate::error::{bail_if, Error};

pub(crate) fn parse(data: &[u8], num_glyphs: u16) -> Result<Vec<MapGroup>, Error> {
    let mut subtable = Buffer::new(data);

    subtable.skip(8)?; // format + reserved + length
    let language = subtable.read_u16()?;
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

        // Conservative caps so that downstream parsers never see values
        // anywhere near overflow territory.
        bail_if!(
            group.start_code > UNICODE_UPPER_LIMIT
                || group.end_code > UNICODE_UPPER_LIMIT
                || group.start_glyph_id > 0xFFFF
        );

        bail_if!(group.start_glyph_id >= u32::from(num_glyphs));

        groups.push(group);
    }

    // Groups must be sorted by start code and may not overlap.
    for i in 1..groups.len() {
        bail_if!(groups[i].start_code <= groups[i - 1].start_code);
        bail_if!(groups[i].start_code <= groups[i - 1].end_code);
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::parse;

    fn subtable(groups: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut data = vec![
            0x00, 0x0D, // format: 13
            0x00, 0x00, // reserved
        ];
        data.extend_from_slice(&(16 + 12 * groups.len() as u32).to_be_bytes()); // length
        data.extend_from_slice(&[0x00, 0x00]); // language
        data.extend_from_slice(&(groups.len() as u32).to_be_bytes());
        for &(start, end, glyph) in groups {
            data.extend_from_slice(&start.to_be_bytes());
            data.extend_from_slice(&end.to_be_bytes());
            data.extend_from_slice(&glyph.to_be_bytes());
        }
        data
    }

    #[test]
    fn fallback_ranges() {
        let groups = parse(&subtable(&[(0x0, 0xD7FF, 1), (0xE000, 0x10FFFF, 1)]), 3).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].start_glyph_id, 1);
    }

    #[test]
    fn wide_range_may_map_to_one_small_glyph() {
        // The span of the group does not bound the glyph id here.
        assert!(parse(&subtable(&[(0x0, 0x10FFFF, 2)]), 3).is_ok());
    }

    #[test]
    fn glyph_id_must_be_below_the_glyph_count() {
        assert!(parse(&subtable(&[(0x0, 0xFF, 3)]), 3).is_err());
    }

    #[test]
    fn groups_must_be_sorted_and_disjoint() {
        assert!(parse(&subtable(&[(0x100, 0x1FF, 0), (0x0, 0xFF, 0)]), 3).is_err());
        assert!(parse(&subtable(&[(0x0, 0x100, 0), (0x100, 0x1FF, 0)]), 3).is_err());
    }

    #[test]
    fn code_points_beyond_unicode_are_rejected() {
        assert!(parse(&subtable(&[(0x0, 0x110000, 0)]), 3).is_err());
    }
}

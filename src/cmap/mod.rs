//! Validating parser and canonical serializer for the character-to-glyph
//! mapping (`cmap`) table.
//!
//! The table is a directory of subtables keyed by (platform, encoding), each
//! in one of several binary formats. Only the subtables a downstream
//! rasterizer actually needs survive sanitization:
//!
//! | platform | encoding | format |                              |
//! |----------|----------|--------|------------------------------|
//! | 0        | 0        | 4      | Unicode default              |
//! | 0        | 3        | 4      | Unicode BMP                  |
//! | 0        | 3        | 12     | Unicode UCS-4                |
//! | 0        | 5        | 14     | Unicode variation sequences  |
//! | 1        | 0        | 0      | Mac Roman                    |
//! | 3        | 0        | 4      | MS Symbol                    |
//! | 3        | 1        | 4      | MS Unicode BMP               |
//! | 3        | 10       | 12     | MS Unicode UCS-4             |
//! | 3        | 10       | 13     | MS UCS-4 fallback            |
//!
//! Everything else is dropped silently. The Unicode-platform entries are
//! re-homed into the equivalent MS slots on output, the usual convention for
//! fonts that carry both.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap>

use bytes::Buf;

use crate::buffer::Buffer;
use crate::error::{bail_if, Error};
use crate::stream::OutputStream;
use crate::{CharIndexRange, OpenTypeFont};

mod format0;
mod format12;
mod format13;
mod format14;
mod format4;

/// The upper limit of the Unicode code space.
pub(crate) const UNICODE_UPPER_LIMIT: u32 = 0x10FFFF;

/// Maximum number of groups in a format 12 or 13 subtable. 0xFFFF is also
/// the most glyphs a single font can hold.
pub(crate) const MAX_GROUPS: u32 = 0xFFFF;

/// Subtable offsets and lengths are capped far above any real table size but
/// low enough that their sums can never overflow.
const MAX_SUBTABLE_EXTENT: u32 = 1 << 30;

/// A code point range mapped onto glyph ids. In a format-12 subtable the
/// glyph ids run consecutively from `start_glyph_id`; in a format-13
/// subtable every code point in the range maps to `start_glyph_id` itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapGroup {
    pub start_code: u32,
    pub end_code: u32,
    pub start_glyph_id: u32,
}

/// The accepted subtables of one `cmap` table, held until serialization.
///
/// Formats 12 and 13 are decoded into group arrays and rebuilt on output.
/// Formats 4 and 14 are validated in place and borrowed from the input
/// buffer; format 0 is copied into an owned array.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedCmap<'a> {
    /// (1,0,0) Mac Roman glyph array.
    pub mac_roman: Option<Vec<u8>>,
    /// (3,0,4) MS Symbol, verbatim.
    pub ms_symbol: Option<&'a [u8]>,
    /// (3,1,4) MS Unicode BMP, verbatim.
    pub ms_unicode_bmp: Option<&'a [u8]>,
    /// (3,10,12) UCS-4 groups.
    pub ucs4: Vec<MapGroup>,
    /// (3,10,13) UCS-4 many-to-one fallback groups.
    pub ucs4_fallback: Vec<MapGroup>,
    /// (0,5,14) Unicode variation sequences, verbatim.
    pub variation_sequences: Option<&'a [u8]>,
}

struct SubtableRecord {
    platform: u16,
    encoding: u16,
    offset: u32,
    format: u16,
    length: u32,
}

/// Parses and validates a whole `cmap` table.
///
/// On success the accepted subtables land in `font.cmap`. Any invariant
/// violation rejects the table as a whole and leaves `font.cmap` unset.
pub fn parse<'a>(font: &mut OpenTypeFont<'a>, data: &'a [u8]) -> Result<(), Error> {
    let cmap = parse_table(data, font.num_glyphs, &mut font.os2_char_range)?;
    font.cmap = Some(cmap);
    Ok(())
}

/// Whether a parsed table is available for emission.
pub fn should_serialize(font: &OpenTypeFont<'_>) -> bool {
    font.cmap.is_some()
}

fn parse_table<'a>(
    data: &'a [u8],
    num_glyphs: u16,
    os2_char_range: &mut Option<CharIndexRange>,
) -> Result<ParsedCmap<'a>, Error> {
    let mut input = data;

    let version = input.try_get_u16()?;
    let num_tables = input.try_get_u16()?;
    bail_if!(version != 0);
    bail_if!(num_tables == 0);

    let mut records = Vec::with_capacity(usize::from(num_tables));
    for _ in 0..num_tables {
        records.push(SubtableRecord {
            platform: input.try_get_u16()?,
            encoding: input.try_get_u16()?,
            offset: input.try_get_u32()?,
            format: 0,
            length: 0,
        });
    }

    // The subtable data area starts where the directory ends.
    let data_offset = 4 + 8 * usize::from(num_tables);

    // Every offset must land inside the table and past the directory, and
    // the records must be strictly sorted by (platform, encoding).
    let mut last_key = 0u32;
    for (i, record) in records.iter().enumerate() {
        bail_if!(record.offset >= MAX_SUBTABLE_EXTENT);
        bail_if!((record.offset as usize) < data_offset || record.offset as usize >= data.len());

        let key = (u32::from(record.platform) << 16) | u32::from(record.encoding);
        bail_if!(i != 0 && last_key >= key);
        last_key = key;
    }

    // The format is the first field of every subtable; where the length
    // lives depends on the format. Unrecognized formats recover length 0 and
    // fall out of the dispatch below.
    let mut table = Buffer::new(data);
    for record in &mut records {
        table.set_offset(record.offset as usize);
        record.format = table.read_u16()?;
        record.length = match record.format {
            0 | 4 => u32::from(table.read_u16()?),
            12 | 13 => {
                table.skip(2)?; // reserved
                table.read_u32()?
            }
            14 => table.read_u32()?,
            _ => 0,
        };
    }

    for record in &records {
        if record.length == 0 {
            continue;
        }
        bail_if!(record.length >= MAX_SUBTABLE_EXTENT);
        // Offset and length are both below 2^30, so the sum cannot overflow.
        bail_if!(record.offset as usize + record.length as usize > data.len());
    }

    check_extents_disjoint(&records)?;

    let mut cmap = ParsedCmap::default();
    for record in &records {
        let subtable = &data[record.offset as usize..(record.offset + record.length) as usize];

        match (record.platform, record.encoding, record.format) {
            // A 0,0,4 subtable occasionally carries MS Symbol data; both
            // Unicode flavours are filed as MS Unicode BMP and the conflict
            // is resolved at serialization time, where 3,0,4 wins.
            (0, 0, 4) | (0, 3, 4) | (3, 1, 4) => {
                let char_range = os2_char_range.as_mut().ok_or(Error::ParseFailed)?;
                format4::parse(subtable, num_glyphs, char_range)?;
                cmap.ms_unicode_bmp = Some(subtable);
            }
            (3, 0, 4) => {
                let char_range = os2_char_range.as_mut().ok_or(Error::ParseFailed)?;
                format4::parse(subtable, num_glyphs, char_range)?;
                cmap.ms_symbol = Some(subtable);
            }
            // The assignment drops any groups a 0,3,12 record left behind;
            // the direct MS record takes precedence.
            (0, 3, 12) | (3, 10, 12) => cmap.ucs4 = format12::parse(subtable, num_glyphs)?,
            (3, 10, 13) => cmap.ucs4_fallback = format13::parse(subtable, num_glyphs)?,
            (0, 5, 14) => {
                format14::parse(subtable, num_glyphs)?;
                cmap.variation_sequences = Some(subtable);
            }
            (1, 0, 0) => cmap.mac_roman = Some(format0::parse(subtable)?),
            _ => {}
        }
    }

    Ok(cmap)
}

/// Subtable extents may not overlap, except that two records may share one
/// identical extent (a Unicode record and an MS record pointing at the same
/// bytes is common).
fn check_extents_disjoint(records: &[SubtableRecord]) -> Result<(), Error> {
    let mut extents: Vec<(u32, u32)> = records
        .iter()
        .map(|record| (record.offset, record.offset + record.length))
        .collect();
    extents.sort_unstable();
    extents.dedup();

    // Interval sweep. Ends sort before starts at equal positions, so
    // back-to-back extents do not count as overlapping.
    let mut events: Vec<(u32, u8)> = Vec::with_capacity(extents.len() * 2);
    for &(start, end) in &extents {
        events.push((start, 1));
        events.push((end, 0));
    }
    events.sort_unstable();

    let mut open = 0i32;
    for &(_, is_start) in &events {
        open += if is_start == 1 { 1 } else { -1 };
        bail_if!(open > 1);
    }
    Ok(())
}

/// Emits the canonical table: a fresh directory in (platform, encoding)
/// order followed by the accepted subtable bodies.
///
/// Old Mac-only fonts define neither an MS Symbol nor an MS Unicode BMP
/// subtable; those are not supported and fail here.
pub fn serialize(out: &mut OutputStream, font: &OpenTypeFont<'_>) -> Result<(), Error> {
    let cmap = font.cmap.as_ref().ok_or(Error::MissingRequiredSubtable)?;

    // MS Symbol and MS Unicode BMP must not coexist; when both were parsed
    // only the Symbol table survives.
    let unicode_bmp = if cmap.ms_symbol.is_some() {
        None
    } else {
        cmap.ms_unicode_bmp
    };

    if cmap.ms_symbol.is_none() && unicode_bmp.is_none() {
        return Err(Error::MissingRequiredSubtable);
    }

    let have_ucs4 = !cmap.ucs4.is_empty();
    let have_ucs4_fallback = !cmap.ucs4_fallback.is_empty();
    let num_subtables = u16::from(cmap.variation_sequences.is_some())
        + u16::from(cmap.mac_roman.is_some())
        + u16::from(cmap.ms_symbol.is_some())
        + u16::from(unicode_bmp.is_some())
        + u16::from(have_ucs4)
        + u16::from(have_ucs4_fallback);

    let table_start = out.tell();

    out.write_u16(0)?; // version
    out.write_u16(num_subtables)?;

    // Reserve the directory; the record offsets are only known once the
    // bodies have been laid out.
    let record_offset = out.tell();
    out.pad(usize::from(num_subtables) * 8)?;

    let offset_mac_roman = out.tell();
    if let Some(glyphs) = &cmap.mac_roman {
        out.write_u16(0)?; // format
        out.write_u16(6 + format0::GLYPH_ARRAY_SIZE as u16)?; // length
        out.write_u16(0)?; // language
        out.write(glyphs)?;
    }

    let offset_symbol = out.tell();
    if let Some(subtable) = cmap.ms_symbol {
        out.write(subtable)?;
    }

    let offset_unicode_bmp = out.tell();
    if let Some(subtable) = unicode_bmp {
        out.write(subtable)?;
    }

    let offset_ucs4 = out.tell();
    if have_ucs4 {
        let num_groups = cmap.ucs4.len() as u32;
        out.write_u16(12)?; // format
        out.write_u16(0)?; // reserved
        out.write_u32(num_groups * 12 + 16)?; // length
        out.write_u32(0)?; // language
        out.write_u32(num_groups)?;
        for group in &cmap.ucs4 {
            out.write_u32(group.start_code)?;
            out.write_u32(group.end_code)?;
            out.write_u32(group.start_glyph_id)?;
        }
    }

    let offset_ucs4_fallback = out.tell();
    if have_ucs4_fallback {
        let num_groups = cmap.ucs4_fallback.len() as u32;
        out.write_u16(13)?; // format
        out.write_u16(0)?; // reserved
        // Two bytes short of the emitted header size; kept as-is for
        // bit-compatibility with existing consumers.
        out.write_u32(num_groups * 12 + 14)?; // length
        out.write_u32(0)?; // language
        out.write_u32(num_groups)?;
        for group in &cmap.ucs4_fallback {
            out.write_u32(group.start_code)?;
            out.write_u32(group.end_code)?;
            out.write_u32(group.start_glyph_id)?;
        }
    }

    let offset_variation_sequences = out.tell();
    if let Some(subtable) = cmap.variation_sequences {
        out.write(subtable)?;
    }

    let table_end = out.tell();

    // The stream may be carrying unfinished checksum bytes; park them while
    // the directory is filled in, then put them back.
    let saved_checksum = out.save_checksum_state();
    out.reset_checksum();

    out.seek(record_offset)?;

    if cmap.variation_sequences.is_some() {
        out.write_u16(0)?;
        out.write_u16(5)?;
        out.write_u32((offset_variation_sequences - table_start) as u32)?;
    }
    if cmap.mac_roman.is_some() {
        out.write_u16(1)?;
        out.write_u16(0)?;
        out.write_u32((offset_mac_roman - table_start) as u32)?;
    }
    if cmap.ms_symbol.is_some() {
        out.write_u16(3)?;
        out.write_u16(0)?;
        out.write_u32((offset_symbol - table_start) as u32)?;
    }
    if unicode_bmp.is_some() {
        out.write_u16(3)?;
        out.write_u16(1)?;
        out.write_u32((offset_unicode_bmp - table_start) as u32)?;
    }
    if have_ucs4 {
        out.write_u16(3)?;
        out.write_u16(10)?;
        out.write_u32((offset_ucs4 - table_start) as u32)?;
    }
    if have_ucs4_fallback {
        out.write_u16(3)?;
        out.write_u16(10)?;
        out.write_u32((offset_ucs4_fallback - table_start) as u32)?;
    }

    out.seek(table_end)?;
    out.restore_checksum(saved_checksum);

    Ok(())
}

//! Parse → serialize → parse round trips over a multi-subtable font.

use cmap_sanitizer::{cmap, CharIndexRange, OpenTypeFont, OutputStream};

// One segment 0x41..=0x43 (glyphs 0..=2) plus the terminator.
const BMP_SUBTABLE: &[u8] = &[
    0x00, 0x04, // format: 4
    0x00, 0x20, // length: 32
    0x00, 0x00, // language: 0
    0x00, 0x04, // 2 x segCount: 4
    0x00, 0x04, // search range: 4
    0x00, 0x01, // entry selector: 1
    0x00, 0x00, // range shift: 0
    0x00, 0x43, 0xFF, 0xFF, // end codes
    0x00, 0x00, // reserved
    0x00, 0x41, 0xFF, 0xFF, // start codes
    0xFF, 0xBF, 0x00, 0x01, // deltas
    0x00, 0x00, 0x00, 0x00, // id range offsets
];

const UCS4_SUBTABLE: &[u8] = &[
    0x00, 0x0C, // format: 12
    0x00, 0x00, // reserved
    0x00, 0x00, 0x00, 0x28, // length: 40
    0x00, 0x00, 0x00, 0x00, // language
    0x00, 0x00, 0x00, 0x02, // group count: 2
    0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x60,
];

const UVS_SUBTABLE: &[u8] = &[
    0x00, 0x0E, // format: 14
    0x00, 0x00, 0x00, 0x1E, // length: 30
    0x00, 0x00, 0x00, 0x01, // record count: 1
    0x00, 0xFE, 0x0F, // var selector
    0x00, 0x00, 0x00, 0x00, // default UVS offset: none
    0x00, 0x00, 0x00, 0x15, // non-default UVS offset: 21
    0x00, 0x00, 0x00, 0x01, // mapping count: 1
    0x00, 0x30, 0x42, // unicode value
    0x00, 0x0A, // glyph: 10
];

fn mac_roman_subtable() -> Vec<u8> {
    let mut data = vec![
        0x00, 0x00, // format: 0
        0x01, 0x06, // length: 262
        0x00, 0x00, // language: 0
    ];
    data.extend((0..=255u8).map(|i| i % 7));
    data
}

fn cmap_table(subtables: &[(u16, u16, &[u8])]) -> Vec<u8> {
    let mut data = vec![0x00, 0x00];
    data.extend_from_slice(&(subtables.len() as u16).to_be_bytes());

    let mut offset = 4 + 8 * subtables.len() as u32;
    for &(platform, encoding, subtable) in subtables {
        data.extend_from_slice(&platform.to_be_bytes());
        data.extend_from_slice(&encoding.to_be_bytes());
        data.extend_from_slice(&offset.to_be_bytes());
        offset += subtable.len() as u32;
    }
    for &(_, _, subtable) in subtables {
        data.extend_from_slice(subtable);
    }
    data
}

fn font<'a>(num_glyphs: u16) -> OpenTypeFont<'a> {
    OpenTypeFont {
        num_glyphs,
        os2_char_range: Some(CharIndexRange {
            first: 0x41,
            last: 0x43,
        }),
        cmap: None,
    }
}

#[test]
fn reparsing_the_emitted_table_reproduces_the_same_state() {
    let mac_roman = mac_roman_subtable();
    let table = cmap_table(&[
        (0, 5, UVS_SUBTABLE),
        (1, 0, &mac_roman),
        (3, 1, BMP_SUBTABLE),
        (3, 10, UCS4_SUBTABLE),
    ]);

    let mut original = font(300);
    cmap::parse(&mut original, &table).unwrap();

    let mut out = OutputStream::new();
    cmap::serialize(&mut out, &original).unwrap();
    let emitted = out.into_vec();

    let mut reparsed = font(300);
    cmap::parse(&mut reparsed, &emitted).unwrap();

    assert_eq!(original.cmap, reparsed.cmap);
}

#[test]
fn serialization_is_idempotent() {
    let table = cmap_table(&[(3, 1, BMP_SUBTABLE), (3, 10, UCS4_SUBTABLE)]);
    let mut font = font(300);
    cmap::parse(&mut font, &table).unwrap();

    let mut first = OutputStream::new();
    cmap::serialize(&mut first, &font).unwrap();
    let mut second = OutputStream::new();
    cmap::serialize(&mut second, &font).unwrap();

    assert_eq!(first.data(), second.data());
}

#[test]
fn emitting_twice_into_one_stream_yields_two_identical_tables() {
    let table = cmap_table(&[(3, 1, BMP_SUBTABLE)]);
    let mut font = font(3);
    cmap::parse(&mut font, &table).unwrap();

    let mut out = OutputStream::new();
    cmap::serialize(&mut out, &font).unwrap();
    let first_len = out.data().len();
    cmap::serialize(&mut out, &font).unwrap();

    let (first, second) = out.data().split_at(first_len);
    assert_eq!(first, second);
}

#[test]
fn symbol_and_unicode_bmp_never_coexist_in_the_output() {
    // Two records sharing one extent, so both MS slots get populated.
    let mut table = cmap_table(&[(3, 0, BMP_SUBTABLE), (3, 1, &[])]);
    let shared_offset = (4 + 8 * 2u32).to_be_bytes();
    table[16..20].copy_from_slice(&shared_offset);

    let mut parsed = font(3);
    cmap::parse(&mut parsed, &table).unwrap();

    let mut out = OutputStream::new();
    cmap::serialize(&mut out, &parsed).unwrap();
    let emitted = out.into_vec();

    let mut reparsed = font(3);
    cmap::parse(&mut reparsed, &emitted).unwrap();
    let cmap = reparsed.cmap.as_ref().unwrap();
    assert_eq!(cmap.ms_symbol, Some(BMP_SUBTABLE));
    assert_eq!(cmap.ms_unicode_bmp, None);
}

#[test]
fn round_trip_preserves_the_verbatim_subtables_exactly() {
    let table = cmap_table(&[(0, 5, UVS_SUBTABLE), (3, 1, BMP_SUBTABLE)]);
    let mut parsed = font(300);
    cmap::parse(&mut parsed, &table).unwrap();

    let mut out = OutputStream::new();
    cmap::serialize(&mut out, &parsed).unwrap();
    let emitted = out.into_vec();

    let mut reparsed = font(300);
    cmap::parse(&mut reparsed, &emitted).unwrap();
    let cmap = reparsed.cmap.as_ref().unwrap();
    assert_eq!(cmap.ms_unicode_bmp, Some(BMP_SUBTABLE));
    assert_eq!(cmap.variation_sequences, Some(UVS_SUBTABLE));
}

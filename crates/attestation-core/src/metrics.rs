//! Helvetica text metrics and font-size fitting
//!
//! Widths and kerning pairs come from the standard Helvetica AFM, in
//! thousandths of an em, for the WinAnsi (cp1252) range the overlay can
//! draw. Text is measured as it will be drawn: encoded to WinAnsi first,
//! with unencodable characters already replaced by `?`.

use tracing::debug;

/// Width used for bytes with no glyph in WinAnsi
const FALLBACK_WIDTH: u16 = 556;

/// Advance widths for U+0020..=U+007E
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Advance widths for bytes 0x80..=0x9F; 0x81, 0x8D, 0x8F, 0x90 and 0x9D
/// are unassigned
const CP1252_WIDTHS: [u16; 32] = [
    556, FALLBACK_WIDTH, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, FALLBACK_WIDTH, 611, FALLBACK_WIDTH, // 80..8F
    FALLBACK_WIDTH, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, FALLBACK_WIDTH, 500, 667, // 90..9F
];

/// Advance widths for bytes 0xA0..=0xFF
const LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // A0..AF
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // B0..BF
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // C0..CF
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // D0..DF
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // E0..EF
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // F0..FF
];

fn byte_width(byte: u8) -> u16 {
    match byte {
        0x20..=0x7E => ASCII_WIDTHS[(byte - 0x20) as usize],
        0x80..=0x9F => CP1252_WIDTHS[(byte - 0x80) as usize],
        0xA0..=0xFF => LATIN1_WIDTHS[(byte - 0xA0) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Kerning adjustment between two WinAnsi bytes
fn kerning(left: u8, right: u8) -> i16 {
    match (left, right) {
        (b'A', b'C' | b'G' | b'O' | b'Q' | b'u') => -30,
        (b'A', b'T') => -120,
        (b'A', b'U') => -50,
        (b'A', b'V') => -70,
        (b'A', b'W') => -50,
        (b'A', b'Y') => -100,
        (b'A', b'v' | b'w' | b'y') => -40,
        (b'D', b'A') => -40,
        (b'D', b'V') => -70,
        (b'D', b'W') => -40,
        (b'D', b'Y') => -90,
        (b'D', b',' | b'.') => -70,
        (b'F', b'A') => -80,
        (b'F', b'a') => -50,
        (b'F', b'e' | b'o') => -30,
        (b'F', b'r') => -45,
        (b'F', b',' | b'.') => -150,
        (b'L', b'T') => -110,
        (b'L', b'V') => -110,
        (b'L', b'W') => -70,
        (b'L', b'Y') => -140,
        (b'L', b'y') => -30,
        (b'L', 0x92) => -160,
        (b'L', 0x94) => -140,
        (b'O', b'A') => -20,
        (b'O', b'T') => -40,
        (b'O', b'V') => -50,
        (b'O', b'W') => -30,
        (b'O', b'Y') => -70,
        (b'O', b',' | b'.') => -40,
        (b'P', b'A') => -120,
        (b'P', b'a') => -40,
        (b'P', b'e' | b'o') => -50,
        (b'P', b',' | b'.') => -180,
        (b'R', b'O') => -20,
        (b'R', b'T') => -30,
        (b'R', b'U') => -40,
        (b'R', b'V') => -50,
        (b'R', b'W') => -30,
        (b'R', b'Y') => -50,
        (b'T', b'A') => -120,
        (b'T', b'O') => -40,
        (b'T', b'a' | b'e' | b'o' | b'r' | b'u' | b'w' | b'y') => -120,
        (b'T', b',' | b'.') => -120,
        (b'T', b'-') => -140,
        (b'T', b':' | b';') => -20,
        (b'V', b'A') => -80,
        (b'V', b'G' | b'O') => -40,
        (b'V', b'a' | b'u') => -70,
        (b'V', b'e' | b'o') => -80,
        (b'V', b'-') => -80,
        (b'V', b',' | b'.') => -125,
        (b'V', b':' | b';') => -40,
        (b'W', b'A') => -50,
        (b'W', b'O') => -20,
        (b'W', b'a') => -40,
        (b'W', b'e' | b'o' | b'u') => -30,
        (b'W', b'y') => -20,
        (b'W', b'-') => -40,
        (b'W', b',' | b'.') => -80,
        (b'Y', b'A') => -110,
        (b'Y', b'O') => -85,
        (b'Y', b'a' | b'e' | b'o') => -140,
        (b'Y', b'i') => -20,
        (b'Y', b'u' | b'v') => -110,
        (b'Y', b'-') => -140,
        (b'Y', b',' | b'.') => -140,
        (b'Y', b':' | b';') => -60,
        (b'f', b'a' | b'e' | b'o') => -30,
        (b'f', b',' | b'.') => -30,
        (b'o', b'v' | b'w') => -15,
        (b'o', b'x' | b'y') => -30,
        (b'o', b',' | b'.') => -40,
        (b'r', b'-') => -20,
        (b'r', b',' | b'.') => -50,
        (b'v', b'a' | b'e' | b'o') => -25,
        (b'v', b',' | b'.') => -125,
        (b'w', b'a') => -15,
        (b'w', b'e' | b'o') => -10,
        (b'w', b',' | b'.') => -60,
        (b'y', b'a' | b'e' | b'o') => -20,
        (b'y', b',' | b'.') => -100,
        (b',' | b'.', 0x92 | 0x94) => -100,
        (b' ', b'T' | b'V') => -50,
        (b' ', b'W') => -40,
        (b' ', b'Y') => -90,
        (0x91, 0x91) => -57,
        (0x92, 0x92) => -57,
        (0x92, b'd' | b'r' | b's') => -50,
        (0x92, b' ') => -70,
        _ => 0,
    }
}

/// Width of `text` in points when set in Helvetica at `size`, kerning
/// pairs included
pub fn text_width(text: &str, size: f32) -> f32 {
    let bytes = encode_win_ansi(text);
    let advance: i32 = bytes.iter().map(|&b| byte_width(b) as i32).sum();
    let kern: i32 = bytes
        .windows(2)
        .map(|pair| kerning(pair[0], pair[1]) as i32)
        .sum();
    (advance + kern) as f32 * size / 1000.0
}

/// Largest font size in `min_size..=default_size` at which `text` fits in
/// `max_width`, stepping down one point at a time.
///
/// Returns `None` when the text still overflows at `min_size`.
pub fn ideal_font_size(text: &str, max_width: f32, min_size: u32, default_size: u32) -> Option<u32> {
    let mut size = default_size;
    let mut width = text_width(text, size as f32);

    while width > max_width && size > min_size {
        size -= 1;
        width = text_width(text, size as f32);
    }

    debug!(text, size, width, max_width, "fitted font size");

    if width > max_width {
        None
    } else {
        Some(size)
    }
}

/// WinAnsi byte for `c`, if the encoding has one
pub fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' | '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Encode text as WinAnsi bytes. Characters outside the encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| win_ansi_byte(c).unwrap_or(b'?'))
        .collect()
}

/// Distinct characters of `text` that WinAnsi cannot encode, in order of
/// first appearance
pub fn unencodable_chars(text: &str) -> Vec<char> {
    let mut chars = Vec::new();
    for c in text.chars() {
        if win_ansi_byte(c).is_none() && !chars.contains(&c) {
            chars.push(c);
        }
    }
    chars
}

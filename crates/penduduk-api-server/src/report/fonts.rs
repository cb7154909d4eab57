//! Advance widths of the base-14 Helvetica faces (1/1000 em) for the
//! printable ASCII range. Everything else falls back to `DEFAULT_WIDTH`.

use super::canvas::FontStyle;

const DEFAULT_WIDTH: u16 = 556;
const FIRST: u32 = 32;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // p..~
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width of one glyph in 1/1000 em. Oblique shares the upright metrics.
pub fn glyph_width(style: FontStyle, c: char) -> u16 {
    let table = match style {
        FontStyle::Bold => &HELVETICA_BOLD,
        FontStyle::Regular | FontStyle::Italic => &HELVETICA,
    };
    let code = c as u32;
    if (FIRST..FIRST + table.len() as u32).contains(&code) {
        table[(code - FIRST) as usize]
    } else {
        DEFAULT_WIDTH
    }
}

/// Width of `text` in points at `size_pt`.
pub fn text_width_pt(style: FontStyle, size_pt: f32, text: &str) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(style, c))).sum();
    units as f32 * size_pt / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(glyph_width(FontStyle::Regular, ' '), 278);
        assert_eq!(glyph_width(FontStyle::Regular, 'W'), 944);
        assert_eq!(glyph_width(FontStyle::Bold, 'a'), 556);
        assert_eq!(glyph_width(FontStyle::Bold, 'b'), 611);
        assert_eq!(glyph_width(FontStyle::Italic, '~'), 584);
        assert_eq!(glyph_width(FontStyle::Regular, 'é'), DEFAULT_WIDTH);
    }

    #[test]
    fn test_text_width() {
        // "AB" regular = 667 + 667 units
        let w = text_width_pt(FontStyle::Regular, 10.0, "AB");
        assert!((w - 13.34).abs() < 1e-3);
    }
}

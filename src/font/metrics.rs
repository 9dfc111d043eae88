//! Advance widths for the standard Helvetica faces, taken from the Adobe
//! AFM files. Units are 1/1000 em, indexed by `char - 32` for printable ASCII.

pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    /// Used for anything outside printable ASCII.
    default_width: u16,
}

impl StandardFontMetrics {
    /// Width of one character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let code = ch as u32;
        let w = if (32..=126).contains(&code) {
            self.widths[(code - 32) as usize]
        } else {
            self.default_width
        };
        w as f64 / 1000.0 * font_size
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

pub(super) static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_WIDTHS,
    default_width: 556,
};

pub(super) static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_BOLD_WIDTHS,
    default_width: 556,
};

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    333, 333, 584, 584, 584, 611, 975,
    // A-Z
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    333, 278, 333, 584, 556, 333,
    // a-z
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    // { | } ~
    389, 280, 389, 584,
];

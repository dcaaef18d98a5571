//! Advance widths for the standard PDF fonts, in 1/1000 em.
//!
//! Tables cover printable ASCII (0x20..=0x7E). Anything outside that range
//! falls back to the font's default advance. Oblique and italic faces reuse
//! the upright widths.

/// Width table for one standard face.
#[derive(Debug)]
pub struct StandardFontMetrics {
    pub widths: [u16; 95],
    pub default_width: u16,
}

impl StandardFontMetrics {
    /// Advance width of `ch` in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        let code = ch as u32;
        if (0x20..=0x7E).contains(&code) {
            self.widths[(code - 0x20) as usize]
        } else {
            self.default_width
        }
    }
}

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
        278, 278, 584, 584, 584, 556, 1015, // :..@
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
        278, 278, 278, 469, 556, 333, // [..`
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
        334, 260, 334, 584, // {..~
    ],
    default_width: 556,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ],
    default_width: 611,
};

pub static TIMES_ROMAN: StandardFontMetrics = StandardFontMetrics {
    widths: [
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        278, 278, 564, 564, 564, 444, 921,
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        333, 278, 333, 469, 500, 333,
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        480, 200, 480, 541,
    ],
    default_width: 500,
};

pub static TIMES_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: [
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        333, 333, 570, 570, 570, 500, 930,
        722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
        722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
        333, 278, 333, 581, 500, 333,
        500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
        556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
        394, 220, 394, 520,
    ],
    default_width: 556,
};

pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    widths: [600; 95],
    default_width: 600,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_lookup() {
        assert_eq!(HELVETICA.advance(' '), 278);
        assert_eq!(HELVETICA.advance('A'), 667);
        assert_eq!(HELVETICA.advance('z'), 500);
        assert_eq!(HELVETICA.advance('~'), 584);
        assert_eq!(TIMES_ROMAN.advance('0'), 500);
    }

    #[test]
    fn non_ascii_uses_default() {
        assert_eq!(HELVETICA.advance('é'), 556);
        assert_eq!(COURIER.advance('€'), 600);
    }

    #[test]
    fn digits_share_one_width() {
        for table in [&HELVETICA, &HELVETICA_BOLD, &TIMES_ROMAN, &TIMES_BOLD, &COURIER] {
            let zero = table.advance('0');
            assert!(('1'..='9').all(|d| table.advance(d) == zero));
        }
    }
}

//! # Font Metrics
//!
//! Width measurement for the standard PDF fonts. The engine never embeds
//! fonts; it only needs advance widths to decide where lines wrap, which in
//! turn decides how tall every block is.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use crate::config::FontFamily;

/// The standard PDF faces the engine can measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// Pick the face of `family` matching the requested weight and slant.
    pub fn resolve(family: FontFamily, bold: bool, italic: bool) -> Self {
        match (family, bold, italic) {
            (FontFamily::Helvetica, false, false) => Self::Helvetica,
            (FontFamily::Helvetica, true, false) => Self::HelveticaBold,
            (FontFamily::Helvetica, false, true) => Self::HelveticaOblique,
            (FontFamily::Helvetica, true, true) => Self::HelveticaBoldOblique,
            (FontFamily::TimesRoman, false, false) => Self::TimesRoman,
            (FontFamily::TimesRoman, true, false) => Self::TimesBold,
            (FontFamily::TimesRoman, false, true) => Self::TimesItalic,
            (FontFamily::TimesRoman, true, true) => Self::TimesBoldItalic,
            (FontFamily::Courier, false, false) => Self::Courier,
            (FontFamily::Courier, true, false) => Self::CourierBold,
            (FontFamily::Courier, false, true) => Self::CourierOblique,
            (FontFamily::Courier, true, true) => Self::CourierBoldOblique,
        }
    }

    /// The monospace face used for code, whatever the body family is.
    pub fn monospace(bold: bool, italic: bool) -> Self {
        Self::resolve(FontFamily::Courier, bold, italic)
    }

    fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &metrics::HELVETICA,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &metrics::HELVETICA_BOLD,
            Self::TimesRoman | Self::TimesItalic => &metrics::TIMES_ROMAN,
            Self::TimesBold | Self::TimesBoldItalic => &metrics::TIMES_BOLD,
            Self::Courier
            | Self::CourierBold
            | Self::CourierOblique
            | Self::CourierBoldOblique => &metrics::COURIER,
        }
    }

    /// Width of one character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        if ch == '\u{00AD}' || ch.is_control() {
            return 0.0;
        }
        self.metrics().advance(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points.
    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_is_wider() {
        let regular = StandardFont::resolve(FontFamily::Helvetica, false, false);
        let bold = StandardFont::resolve(FontFamily::Helvetica, true, false);
        assert!(bold.measure("Paginate", 12.0) > regular.measure("Paginate", 12.0));
    }

    #[test]
    fn courier_is_fixed_pitch() {
        let font = StandardFont::monospace(false, false);
        assert_eq!(font.measure("iiii", 10.0), font.measure("WWWW", 10.0));
        assert_eq!(font.measure("abc", 10.0), 18.0);
    }

    #[test]
    fn faces_resolve_by_weight_and_slant() {
        assert_eq!(
            StandardFont::resolve(FontFamily::TimesRoman, true, true),
            StandardFont::TimesBoldItalic
        );
        assert_eq!(StandardFont::monospace(false, true), StandardFont::CourierOblique);
    }
}

//! # Typography
//!
//! The fixed style sheet of the documentation export: heading sizes,
//! leading, paddings and spacing for every block kind, derived from the
//! configured base font size and family.
//!
//! Only the vertical metrics matter to pagination. Colors and decoration are
//! the render sink's business and do not appear here.

use crate::config::{ExportConfig, FontFamily};
use crate::font::StandardFont;
use crate::model::StyledRun;

/// Heading sizes for levels 1..=6, in points.
const HEADING_SIZES: [f64; 6] = [24.0, 20.0, 16.0, 14.0, 12.0, 11.0];

/// Vertical metrics of a heading level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingStyle {
    pub font: StandardFont,
    pub font_size: f64,
    pub leading: f64,
    pub space_before: f64,
    pub space_after: f64,
}

/// Metrics of one table-of-contents entry level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TocEntryStyle {
    pub font: StandardFont,
    pub font_size: f64,
    pub leading: f64,
    pub indent: f64,
    pub space_after: f64,
}

/// Style sheet for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    pub family: FontFamily,
    pub base_size: f64,
    /// Body leading: base size + 5.
    pub body_leading: f64,
    pub paragraph_space_after: f64,
    pub description_space_after: f64,

    pub quote_indent: f64,
    pub quote_padding: f64,
    pub quote_leading: f64,
    pub quote_space_after: f64,

    pub code_size: f64,
    pub code_leading: f64,
    pub code_padding: f64,
    pub code_indent: f64,
    pub code_space_after: f64,

    pub table_size: f64,
    pub table_header_size: f64,
    pub table_leading: f64,
    pub table_cell_padding_x: f64,
    pub table_row_padding: f64,
    pub table_header_padding_bottom: f64,
    pub table_space_after: f64,

    pub list_indent: f64,
    pub list_space_after: f64,

    pub rule_height: f64,
    pub rule_space: f64,

    /// Gap left after each section's own body.
    pub section_gap: f64,

    pub toc_title_size: f64,
    pub toc_title_leading: f64,
    pub toc_title_space_after: f64,
}

impl Typography {
    pub fn from_config(config: &ExportConfig) -> Self {
        let base = config.base_font_size;
        Self {
            family: config.font_family,
            base_size: base,
            body_leading: base + 5.0,
            paragraph_space_after: 8.0,
            description_space_after: 16.0,

            quote_indent: 20.0,
            quote_padding: 10.0,
            quote_leading: base + 4.0,
            quote_space_after: 12.0,

            code_size: 9.0,
            code_leading: 12.0,
            code_padding: 8.0,
            code_indent: 10.0,
            code_space_after: 12.0,

            table_size: 9.0,
            table_header_size: 10.0,
            table_leading: 12.0,
            table_cell_padding_x: 6.0,
            table_row_padding: 6.0,
            table_header_padding_bottom: 12.0,
            table_space_after: 12.0,

            list_indent: 20.0,
            list_space_after: 8.0,

            rule_height: 1.0,
            rule_space: 12.0,

            section_gap: 12.0,

            toc_title_size: 24.0,
            toc_title_leading: 30.0,
            toc_title_space_after: 30.0,
        }
    }

    /// Body face for a run's styling. Inline code uses the monospace face.
    pub fn run_font(&self, run: &StyledRun) -> StandardFont {
        if run.code {
            StandardFont::monospace(run.bold, run.italic)
        } else {
            StandardFont::resolve(self.family, run.bold, run.italic)
        }
    }

    pub fn body_font(&self) -> StandardFont {
        StandardFont::resolve(self.family, false, false)
    }

    pub fn italic_font(&self) -> StandardFont {
        StandardFont::resolve(self.family, false, true)
    }

    pub fn code_font(&self) -> StandardFont {
        StandardFont::monospace(false, false)
    }

    pub fn table_font(&self, header: bool) -> StandardFont {
        StandardFont::resolve(self.family, header, false)
    }

    /// Metrics for heading `level` (1..=6; out-of-range levels clamp).
    pub fn heading(&self, level: u8) -> HeadingStyle {
        let level = level.clamp(1, 6);
        let font_size = HEADING_SIZES[(level - 1) as usize];
        HeadingStyle {
            font: StandardFont::resolve(self.family, true, false),
            font_size,
            leading: font_size + 6.0,
            space_before: if level <= 2 { 16.0 } else { 12.0 },
            space_after: 8.0,
        }
    }

    /// Metrics for a TOC entry of a section at `depth`. Depths past 3 share
    /// the level-3 style.
    pub fn toc_entry(&self, depth: usize) -> TocEntryStyle {
        let level = depth.clamp(1, 3) as f64;
        TocEntryStyle {
            font: StandardFont::resolve(self.family, depth == 1, false),
            font_size: 12.0 - (level - 1.0),
            leading: 18.0 - (level - 1.0) * 2.0,
            indent: (depth.clamp(1, 5) - 1) as f64 * 20.0,
            space_after: 6.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels_shrink() {
        let typo = Typography::from_config(&ExportConfig::default());
        let sizes: Vec<f64> = (1..=6).map(|l| typo.heading(l).font_size).collect();
        assert_eq!(sizes, HEADING_SIZES.to_vec());
        assert_eq!(typo.heading(1).leading, 30.0);
        assert_eq!(typo.heading(9), typo.heading(6));
    }

    #[test]
    fn body_leading_follows_base_size() {
        let config = ExportConfig {
            base_font_size: 13.0,
            ..Default::default()
        };
        assert_eq!(Typography::from_config(&config).body_leading, 18.0);
    }

    #[test]
    fn toc_entries_indent_by_depth() {
        let typo = Typography::from_config(&ExportConfig::default());
        assert_eq!(typo.toc_entry(1).indent, 0.0);
        assert_eq!(typo.toc_entry(4).indent, 60.0);
        assert_eq!(typo.toc_entry(4).font_size, typo.toc_entry(3).font_size);
    }

    #[test]
    fn inline_code_is_monospace() {
        let typo = Typography::from_config(&ExportConfig::default());
        let run = StyledRun {
            text: "x".into(),
            code: true,
            ..Default::default()
        };
        assert_eq!(typo.run_font(&run), StandardFont::Courier);
    }
}

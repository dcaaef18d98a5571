//! # Export Configuration
//!
//! Page geometry and export options. Everything here is a pure input: the
//! engine keeps no state between runs, so two exports with the same config
//! and the same document produce the same pages.
//!
//! Field names follow the camelCase JSON the content tool sends, e.g.
//! `{ "pageSize": "A4", "marginTop": 54, "tocMaxDepth": 2 }`. Omitted fields
//! take the defaults below.

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    Letter,
    A4,
    /// Arbitrary geometry, mostly useful for tests and unusual media.
    Custom { width: f64, height: f64 },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// The fixed set of font families the engine has metrics for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Helvetica,
    #[serde(rename = "Times-Roman", alias = "Times")]
    TimesRoman,
    Courier,
}

/// Resolved page geometry. Derived from [`ExportConfig`] once per export and
/// handed to the layout engine and to render sinks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    /// Band reserved at the top of the content area for the running header.
    pub header_height: f64,
    /// Band reserved at the bottom of the content area for the footer.
    pub footer_height: f64,
}

impl PageGeometry {
    /// Left edge of the body area.
    pub fn content_x(&self) -> f64 {
        self.margin_left
    }

    /// Top edge of the body area, below the header band.
    pub fn content_y(&self) -> f64 {
        self.margin_top + self.header_height
    }

    pub fn content_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    /// Vertical space available for body fragments on every page.
    pub fn usable_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom - self.header_height - self.footer_height
    }
}

/// All options for one export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    pub page_size: PageSize,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub header_height: f64,
    pub footer_height: f64,
    pub base_font_size: f64,
    pub font_family: FontFamily,

    /// Deepest section level listed in the table of contents (1..=5).
    pub toc_max_depth: u8,
    pub include_toc: bool,
    /// Force the number of digits reserved for TOC page numbers. When unset
    /// the width is derived from an upper bound on the page count.
    pub toc_number_digits: Option<usize>,

    pub include_cover: bool,
    pub include_header: bool,
    pub include_footer: bool,
    /// Header template. Supports `{title}`, `{section}`, `{page}`, `{total}`.
    pub header_text: Option<String>,
    /// Footer template, e.g. a copyright line.
    pub footer_text: Option<String>,
    pub show_page_numbers: bool,
    pub page_number_format: String,

    pub include_hidden_sections: bool,
    pub include_page_descriptions: bool,
    /// A top-level section starts on a new page when less than this many
    /// points remain on the current one. Zero disables the check.
    pub section_break_threshold: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::Letter,
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
            header_height: 18.0,
            footer_height: 18.0,
            base_font_size: 11.0,
            font_family: FontFamily::Helvetica,
            toc_max_depth: 3,
            include_toc: true,
            toc_number_digits: None,
            include_cover: false,
            include_header: true,
            include_footer: true,
            header_text: None,
            footer_text: None,
            show_page_numbers: true,
            page_number_format: "Page {page} of {total}".to_string(),
            include_hidden_sections: false,
            include_page_descriptions: true,
            section_break_threshold: 216.0,
        }
    }
}

impl ExportConfig {
    pub fn geometry(&self) -> PageGeometry {
        let (width, height) = self.page_size.dimensions();
        PageGeometry {
            width,
            height,
            margin_top: self.margin_top,
            margin_bottom: self.margin_bottom,
            margin_left: self.margin_left,
            margin_right: self.margin_right,
            header_height: self.header_height,
            footer_height: self.footer_height,
        }
    }

    /// Parse a config from JSON, then validate it.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let config: ExportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject options the engine cannot honor.
    pub fn validate(&self) -> Result<(), ExportError> {
        if !(1..=5).contains(&self.toc_max_depth) {
            return Err(ExportError::InvalidConfig(format!(
                "tocMaxDepth must be between 1 and 5, got {}",
                self.toc_max_depth
            )));
        }
        if !(9.0..=14.0).contains(&self.base_font_size) {
            return Err(ExportError::InvalidConfig(format!(
                "baseFontSize must be between 9 and 14, got {}",
                self.base_font_size
            )));
        }
        let margins = [
            ("marginTop", self.margin_top),
            ("marginBottom", self.margin_bottom),
            ("marginLeft", self.margin_left),
            ("marginRight", self.margin_right),
            ("headerHeight", self.header_height),
            ("footerHeight", self.footer_height),
            ("sectionBreakThreshold", self.section_break_threshold),
        ];
        for (name, value) in margins {
            if !(value >= 0.0) {
                return Err(ExportError::InvalidConfig(format!(
                    "{name} must be zero or positive, got {value}"
                )));
            }
        }
        if self.toc_number_digits == Some(0) {
            return Err(ExportError::InvalidConfig(
                "tocNumberDigits must be at least 1".to_string(),
            ));
        }
        let geometry = self.geometry();
        if geometry.content_width() <= 0.0 || geometry.usable_height() <= 0.0 {
            return Err(ExportError::InvalidConfig(format!(
                "margins and header/footer bands leave no room on a {:.0}x{:.0}pt page",
                geometry.width, geometry.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ExportConfig::default().validate().is_ok());
    }

    #[test]
    fn letter_usable_height() {
        let geometry = ExportConfig::default().geometry();
        assert_eq!(geometry.usable_height(), 792.0 - 144.0 - 36.0);
        assert_eq!(geometry.content_width(), 612.0 - 144.0);
    }

    #[test]
    fn camel_case_json() {
        let config = ExportConfig::from_json(
            r#"{ "pageSize": "A4", "tocMaxDepth": 2, "fontFamily": "Times-Roman", "showPageNumbers": false }"#,
        )
        .unwrap();
        assert_eq!(config.page_size, PageSize::A4);
        assert_eq!(config.toc_max_depth, 2);
        assert_eq!(config.font_family, FontFamily::TimesRoman);
        assert!(!config.show_page_numbers);
        // untouched fields keep their defaults
        assert_eq!(config.base_font_size, 11.0);
    }

    #[test]
    fn toc_depth_out_of_range() {
        let config = ExportConfig {
            toc_max_depth: 6,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ExportError::InvalidConfig(_))));
    }

    #[test]
    fn base_font_size_out_of_range() {
        let config = ExportConfig {
            base_font_size: 20.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ExportError::InvalidConfig(_))));
    }

    #[test]
    fn margins_eat_the_page() {
        let config = ExportConfig {
            margin_top: 400.0,
            margin_bottom: 400.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ExportError::InvalidConfig(_))));
    }
}

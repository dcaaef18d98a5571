//! # Pagination Resolver
//!
//! Runs the layout engine twice. The first pass uses placeholder TOC page
//! numbers and yields the anchor map; the second pass fills the TOC in from
//! that map. Because the placeholder reserves exactly the width the real
//! numbers get, the second pass cannot move anything, and we check that it
//! didn't.

use serde::Serialize;

use crate::config::{ExportConfig, PageGeometry};
use crate::error::ExportError;
use crate::layout::toc::TocMode;
use crate::layout::{AnchorMap, Decorations, FragmentContent, LayoutEngine, Page, PageKind};
use crate::model::{Block, Document, Section};

/// Final, fully paginated export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedExport {
    pub title: String,
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
    pub anchors: AnchorMap,
    /// Digits reserved for TOC page numbers.
    pub toc_digits: usize,
}

impl ResolvedExport {
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// `(title, printed page label, target)` for every TOC entry.
    pub fn toc_entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.pages
            .iter()
            .flat_map(|p| &p.fragments)
            .filter_map(|f| match (&f.content, &f.link) {
                (FragmentContent::TocEntry { title, page_label, .. }, Some(target)) => {
                    Some((title.as_str(), page_label.as_str(), target.as_str()))
                }
                _ => None,
            })
    }
}

/// Number of decimal digits in `n` (at least one).
pub fn decimal_width(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Upper bound on the page count. Every page receives at least one
/// indivisible unit, so counting units bounds the pages.
pub fn page_upper_bound(document: &Document, config: &ExportConfig) -> usize {
    fn section_units(section: &Section, descriptions: bool) -> usize {
        let description = usize::from(descriptions && section.description.is_some());
        1 + description
            + section.body.iter().map(Block::unit_count).sum::<usize>()
            + section
                .children
                .iter()
                .map(|c| section_units(c, descriptions))
                .sum::<usize>()
    }

    let cover = usize::from(config.include_cover);
    let toc = if config.include_toc {
        let max_depth = config.toc_max_depth as usize;
        document
            .pre_order()
            .iter()
            .filter(|s| s.depth <= max_depth)
            .count()
            + 1
    } else {
        0
    };
    let content = document
        .sections
        .iter()
        .map(|s| section_units(s, config.include_page_descriptions))
        .sum::<usize>()
        .max(1);
    cover + toc + content
}

/// Expand `{title}`, `{section}`, `{page}` and `{total}` in a template.
pub fn expand_template(template: &str, title: &str, section: &str, page: usize, total: usize) -> String {
    template
        .replace("{title}", title)
        .replace("{section}", section)
        .replace("{page}", &page.to_string())
        .replace("{total}", &total.to_string())
}

/// Runs both layout passes and binds page decorations.
#[derive(Debug, Clone)]
pub struct PaginationResolver<'a> {
    config: &'a ExportConfig,
}

impl<'a> PaginationResolver<'a> {
    pub fn new(config: &'a ExportConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, document: &Document) -> Result<ResolvedExport, ExportError> {
        let config = self.config;
        config.validate()?;
        document.validate()?;
        let document = document.pruned(config.include_hidden_sections);

        let engine = LayoutEngine::new(config);
        let digits = match config.toc_number_digits {
            Some(digits) => digits,
            None => decimal_width(page_upper_bound(&document, config)),
        };
        log::debug!("reserving {digits} digit(s) for TOC page numbers");

        let first = engine.layout(&document, TocMode::Placeholder { digits })?;
        let total = first.pages.len();
        let required = decimal_width(total);
        if config.include_toc && required > digits {
            return Err(ExportError::TocWidthExceeded {
                reserved: digits,
                required,
                total_pages: total,
            });
        }

        let second = engine.layout(
            &document,
            TocMode::Resolved {
                digits,
                anchors: &first.anchors,
            },
        )?;
        if second.pages.len() != total {
            return Err(ExportError::PaginationDiverged(format!(
                "first pass produced {total} page(s), second pass {}",
                second.pages.len()
            )));
        }
        if second.anchors != first.anchors {
            let moved = first
                .anchors
                .iter()
                .zip(second.anchors.iter())
                .find(|(a, b)| a != b)
                .map_or_else(|| "anchor count".to_string(), |(a, _)| a.id.to_string());
            return Err(ExportError::PaginationDiverged(format!(
                "anchor `{moved}` moved between passes"
            )));
        }

        let mut pages = second.pages;
        for page in &mut pages {
            page.decorations = Some(self.decorations(page, &document.title, total));
        }

        log::info!(
            "exported `{}`: {} page(s), {} anchor(s)",
            document.title,
            total,
            second.anchors.len()
        );

        Ok(ResolvedExport {
            title: document.title.clone(),
            geometry: *engine.geometry(),
            pages,
            anchors: second.anchors,
            toc_digits: digits,
        })
    }

    /// Running header, footer and page label. The cover carries none.
    fn decorations(&self, page: &Page, title: &str, total: usize) -> Decorations {
        let config = self.config;
        if page.kind == PageKind::Cover {
            return Decorations::default();
        }
        let section = page.section_title.as_deref().unwrap_or("");
        let expand = |template: &str| {
            let text = expand_template(template, title, section, page.number, total);
            Some(text).filter(|t| !t.trim().is_empty())
        };
        Decorations {
            header: if config.include_header {
                expand(config.header_text.as_deref().unwrap_or("{section}"))
            } else {
                None
            },
            footer: if config.include_footer {
                config.footer_text.as_deref().and_then(expand)
            } else {
                None
            },
            page_label: if config.show_page_numbers {
                expand(&config.page_number_format)
            } else {
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new(
            "Guide",
            vec![
                Section::new("intro", "Introduction", 1)
                    .with_body(vec![Block::paragraph("Welcome.")]),
                Section::new("usage", "Usage", 1).with_body(vec![Block::code(Some("sh"), &["run"])]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn decimal_widths() {
        assert_eq!(decimal_width(0), 1);
        assert_eq!(decimal_width(9), 1);
        assert_eq!(decimal_width(10), 2);
        assert_eq!(decimal_width(999), 3);
        assert_eq!(decimal_width(1000), 4);
    }

    #[test]
    fn upper_bound_counts_units() {
        let config = ExportConfig::default();
        // toc: 2 entries + title, content: 2 headings + 1 paragraph + 1 code line
        assert_eq!(page_upper_bound(&doc(), &config), 3 + 4);
    }

    #[test]
    fn templates_expand() {
        assert_eq!(
            expand_template("{title}: {section} ({page}/{total})", "Guide", "Usage", 3, 9),
            "Guide: Usage (3/9)"
        );
    }

    #[test]
    fn resolve_binds_numbers_and_decorations() {
        let config = ExportConfig {
            include_cover: true,
            ..Default::default()
        };
        let export = PaginationResolver::new(&config).resolve(&doc()).unwrap();
        assert_eq!(export.pages[0].kind, PageKind::Cover);
        assert_eq!(export.pages[0].decorations, Some(Decorations::default()));

        let total = export.total_pages();
        let last = export.pages.last().unwrap();
        let label = last.decorations.as_ref().unwrap().page_label.clone();
        assert_eq!(label, Some(format!("Page {total} of {total}")));

        for (_, label, target) in export.toc_entries() {
            let page = export.anchors.page_number(target).unwrap();
            assert_eq!(label, page.to_string());
        }
    }

    #[test]
    fn footer_is_off_without_text() {
        let export = PaginationResolver::new(&ExportConfig::default())
            .resolve(&doc())
            .unwrap();
        let decorations = export.pages[1].decorations.as_ref().unwrap();
        assert_eq!(decorations.footer, None);
        assert_eq!(decorations.header.as_deref(), Some("Introduction"));
    }

    #[test]
    fn invalid_config_is_rejected_before_layout() {
        let config = ExportConfig {
            toc_max_depth: 0,
            ..Default::default()
        };
        let err = PaginationResolver::new(&config).resolve(&doc()).unwrap_err();
        assert!(matches!(err, ExportError::InvalidConfig(_)));
    }
}

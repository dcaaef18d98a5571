//! Table of contents pages.
//!
//! The TOC is laid out like any other content, with one twist: its page
//! numbers are not known until the body has been paginated. The first pass
//! lays it out with placeholders, the second with the real numbers. Both
//! passes reserve the same fixed-width slot for the number, so the TOC
//! occupies exactly the same lines and pages either way.

use super::{AnchorId, AnchorMap, Fragment, FragmentContent, LayoutEngine, PageKind, PaginationState};
use crate::error::ExportError;
use crate::font::StandardFont;
use crate::model::Document;
use crate::text::break_text;

pub const TOC_TITLE: &str = "Table of Contents";

/// Gap between an entry's title and its page number slot.
const NUMBER_GAP: f64 = 12.0;

/// Where TOC page numbers come from in a pass.
#[derive(Debug, Clone, Copy)]
pub enum TocMode<'a> {
    /// First pass: numbers are unknown, reserve `digits` characters.
    Placeholder { digits: usize },
    /// Second pass: numbers come from the first pass's anchors.
    Resolved { digits: usize, anchors: &'a AnchorMap },
}

impl TocMode<'_> {
    pub fn digits(&self) -> usize {
        match self {
            TocMode::Placeholder { digits } | TocMode::Resolved { digits, .. } => *digits,
        }
    }

    fn label(&self, id: &str) -> Result<String, ExportError> {
        match self {
            TocMode::Placeholder { digits } => Ok("#".repeat(*digits)),
            TocMode::Resolved { anchors, .. } => anchors
                .page_number(id)
                .map(|n| n.to_string())
                .ok_or_else(|| {
                    ExportError::PaginationDiverged(format!("no anchor recorded for TOC entry `{id}`"))
                }),
        }
    }
}

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub id: String,
    pub title: String,
    pub depth: usize,
}

/// Sections that get a TOC entry: every section down to `max_depth`, in
/// document order.
pub fn collect_entries(document: &Document, max_depth: usize) -> Vec<TocEntry> {
    document
        .pre_order()
        .into_iter()
        .filter(|s| s.depth <= max_depth)
        .map(|s| TocEntry {
            id: s.id.clone(),
            title: s.title.clone(),
            depth: s.depth,
        })
        .collect()
}

/// Width reserved for a page number of `digits` digits. Digits share one
/// advance width in every standard face.
pub fn number_slot_width(font: StandardFont, font_size: f64, digits: usize) -> f64 {
    font.char_width('0', font_size) * digits as f64
}

/// Lay the TOC out onto the current page and as many following pages as it
/// needs. The caller opens the first body page afterwards.
pub(super) fn layout_toc(
    engine: &LayoutEngine<'_>,
    entries: &[TocEntry],
    mode: TocMode<'_>,
    state: &mut PaginationState,
) -> Result<(), ExportError> {
    let geometry = engine.geometry();
    let typo = engine.typography();
    state.set_current_section(Some(TOC_TITLE.to_string()));

    let title_font = StandardFont::resolve(typo.family, true, false);
    let title_lines = break_text(TOC_TITLE, title_font, typo.toc_title_size, geometry.content_width());
    state.place(Fragment {
        content: FragmentContent::TocTitle {
            text: TOC_TITLE.to_string(),
        },
        section_id: None,
        block_index: None,
        x: geometry.content_x(),
        y: 0.0,
        width: geometry.content_width(),
        height: title_lines.len().max(1) as f64 * typo.toc_title_leading,
        anchor: None,
        link: None,
    });
    state.advance(typo.toc_title_space_after);

    for entry in entries {
        let style = typo.toc_entry(entry.depth);
        let slot = number_slot_width(style.font, style.font_size, mode.digits());
        let title_width = geometry.content_width() - style.indent - slot - NUMBER_GAP;
        let lines = break_text(&entry.title, style.font, style.font_size, title_width);
        let height = lines.len().max(1) as f64 * style.leading;

        if height > geometry.usable_height() {
            return Err(ExportError::UnsplittableOverflow {
                section_id: entry.id.clone(),
                block_index: None,
                unit_height: height,
                page_height: geometry.usable_height(),
            });
        }
        if height > state.remaining_height() {
            state.break_page(PageKind::Toc);
        }

        state.place(Fragment {
            content: FragmentContent::TocEntry {
                title: entry.title.clone(),
                depth: entry.depth,
                page_label: mode.label(&entry.id)?,
            },
            section_id: Some(entry.id.clone()),
            block_index: None,
            x: geometry.content_x() + style.indent,
            y: 0.0,
            width: geometry.content_width() - style.indent,
            height,
            anchor: None,
            link: Some(AnchorId(entry.id.clone())),
        });
        state.advance(style.space_after);
    }

    Ok(())
}

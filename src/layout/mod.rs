//! # Page-Aware Layout Engine
//!
//! Walks the section tree in document order and places content INTO pages
//! of fixed geometry. There is no infinite canvas that gets sliced later:
//! before anything is placed the engine asks "does this fit?", and the
//! answer comes from the block splitter.
//!
//! The algorithm for one pass:
//!
//! 1. Front matter: an optional cover page, then the table of contents with
//!    either placeholder or resolved page numbers.
//! 2. For every section in pre-order: keep the heading with the first unit
//!    of what follows it, place it, and record the section's anchor as the
//!    page the heading actually landed on.
//! 3. Feed each body block to the splitter against the remaining height.
//!    Place the part that fits, open a new page, continue with the rest.
//! 4. Recurse into child sections.
//!
//! All mutable bookkeeping lives in a [`PaginationState`] created fresh for
//! each pass and threaded explicitly through the walk, so two passes over
//! the same input are independent and produce identical results.

pub mod measure;
pub mod page_break;
pub mod toc;

use serde::Serialize;
use std::collections::HashMap;

use crate::config::{ExportConfig, PageGeometry};
use crate::error::ExportError;
use crate::model::{Block, Document, Section};
use crate::style::Typography;
use measure::Measurer;
use page_break::BlockSplitter;
use toc::TocMode;

/// Name of a link destination. Always a section id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AnchorId(pub String);

impl AnchorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Section anchors and the 0-based page index each one landed on, in
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnchorMap {
    entries: Vec<AnchorEntry>,
    #[serde(skip)]
    index: HashMap<AnchorId, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorEntry {
    pub id: AnchorId,
    pub page_index: usize,
}

impl AnchorMap {
    fn insert(&mut self, id: AnchorId, page_index: usize) {
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push(AnchorEntry { id, page_index });
    }

    /// 0-based page index of an anchor.
    pub fn page_index(&self, id: &str) -> Option<usize> {
        self.index
            .get(&AnchorId(id.to_string()))
            .map(|&i| self.entries[i].page_index)
    }

    /// 1-based printed page number of an anchor.
    pub fn page_number(&self, id: &str) -> Option<usize> {
        self.page_index(id).map(|i| i + 1)
    }

    pub fn contains(&self, id: &AnchorId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Anchors in document (pre-order) order.
    pub fn iter(&self) -> impl Iterator<Item = &AnchorEntry> {
        self.entries.iter()
    }
}

/// Where a page sits in the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageKind {
    Cover,
    Toc,
    Content,
}

/// What a fragment draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum FragmentContent {
    /// The cover is drawn by an external collaborator; the engine only
    /// reserves its page.
    Cover { title: String },
    SectionHeading { level: u8, text: String },
    Description { text: String },
    /// The part of a body block placed on this page.
    Block {
        block: Block,
        /// This piece continues a block started on an earlier page.
        continuation: bool,
    },
    TocTitle { text: String },
    TocEntry {
        title: String,
        depth: usize,
        /// Printed page number, or the placeholder in the first pass.
        page_label: String,
    },
}

impl FragmentContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FragmentContent::Cover { .. } => "Cover",
            FragmentContent::SectionHeading { .. } => "SectionHeading",
            FragmentContent::Description { .. } => "Description",
            FragmentContent::Block { block, .. } => block.kind_name(),
            FragmentContent::TocTitle { .. } => "TocTitle",
            FragmentContent::TocEntry { .. } => "TocEntry",
        }
    }

    /// Headings must not end a page while their content continues on the
    /// next one.
    pub fn is_heading(&self) -> bool {
        matches!(
            self,
            FragmentContent::SectionHeading { .. }
                | FragmentContent::Block {
                    block: Block::Heading { .. },
                    ..
                }
        )
    }
}

/// Top-left position in points, y growing downward from the page top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A piece of content placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub content: FragmentContent,
    pub section_id: Option<String>,
    /// Position of the source block in its section body.
    pub block_index: Option<usize>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Destination defined by this fragment (section headings).
    pub anchor: Option<AnchorId>,
    /// Internal link covering this fragment (TOC entries).
    pub link: Option<AnchorId>,
}

impl Fragment {
    pub fn position(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Resolved running header and footer text for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decorations {
    pub header: Option<String>,
    pub footer: Option<String>,
    pub page_label: Option<String>,
}

/// One finished page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 0-based position in the export.
    pub index: usize,
    /// 1-based printed page number.
    pub number: usize,
    pub kind: PageKind,
    pub fragments: Vec<Fragment>,
    /// Title of the section the page belongs to, for the running header.
    pub section_title: Option<String>,
    /// Bound by the resolver after the final pass.
    pub decorations: Option<Decorations>,
}

impl Page {
    fn new(index: usize, kind: PageKind, section_title: Option<String>) -> Self {
        Self {
            index,
            number: index + 1,
            kind,
            fragments: Vec::new(),
            section_title,
            decorations: None,
        }
    }
}

/// Output of one layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPass {
    pub pages: Vec<Page>,
    pub anchors: AnchorMap,
}

/// Where we are during one pass. Reset for every pass.
#[derive(Debug, Clone)]
pub struct PaginationState {
    geometry: PageGeometry,
    pages: Vec<Page>,
    current: Page,
    /// Offset of the cursor below the top of the body area.
    y: f64,
    current_section: Option<String>,
    anchors: AnchorMap,
}

impl PaginationState {
    pub fn new(geometry: PageGeometry, kind: PageKind) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            current: Page::new(0, kind, None),
            y: 0.0,
            current_section: None,
            anchors: AnchorMap::default(),
        }
    }

    pub fn page_index(&self) -> usize {
        self.current.index
    }

    pub fn remaining_height(&self) -> f64 {
        (self.geometry.usable_height() - self.y).max(0.0)
    }

    pub fn is_page_empty(&self) -> bool {
        self.current.fragments.is_empty()
    }

    pub fn set_current_section(&mut self, title: Option<String>) {
        self.current_section = title;
    }

    /// Close the current page and open the next one.
    pub fn break_page(&mut self, kind: PageKind) {
        log::trace!(
            "page {} closed with {} fragment(s)",
            self.current.number,
            self.current.fragments.len()
        );
        let next = Page::new(self.current.index + 1, kind, self.current_section.clone());
        self.pages.push(std::mem::replace(&mut self.current, next));
        self.y = 0.0;
    }

    /// Vertical space that collapses at the top of a page.
    fn space_before(&mut self, amount: f64) {
        if !self.is_page_empty() {
            self.advance(amount);
        }
    }

    /// Move the cursor down, never past the bottom of the body area.
    fn advance(&mut self, amount: f64) {
        self.y = (self.y + amount).min(self.geometry.usable_height());
    }

    fn record_anchor(&mut self, id: &str) -> AnchorId {
        let anchor = AnchorId(id.to_string());
        self.anchors.insert(anchor.clone(), self.current.index);
        anchor
    }

    fn place(&mut self, mut fragment: Fragment) {
        if self.is_page_empty() {
            if let FragmentContent::SectionHeading { text, .. } = &fragment.content {
                self.current.section_title = Some(text.clone());
            } else if self.current.section_title.is_none() {
                self.current.section_title = self.current_section.clone();
            }
        }
        fragment.y = self.geometry.content_y() + self.y;
        self.y += fragment.height;
        self.current.fragments.push(fragment);
    }

    /// Finish the pass. A trailing empty page is dropped unless it is the
    /// only page.
    fn finish(mut self) -> LayoutPass {
        if !self.current.fragments.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        LayoutPass {
            pages: self.pages,
            anchors: self.anchors,
        }
    }
}

/// The main layout engine. Holds only inputs; every pass builds its own
/// [`PaginationState`].
#[derive(Debug, Clone)]
pub struct LayoutEngine<'a> {
    config: &'a ExportConfig,
    geometry: PageGeometry,
    typo: Typography,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a ExportConfig) -> Self {
        Self {
            config,
            geometry: config.geometry(),
            typo: Typography::from_config(config),
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn typography(&self) -> &Typography {
        &self.typo
    }

    pub fn measurer(&self) -> Measurer<'_> {
        Measurer::new(&self.typo, self.geometry.content_width())
    }

    /// Run one full pass over the document.
    pub fn layout(&self, document: &Document, toc_mode: TocMode<'_>) -> Result<LayoutPass, ExportError> {
        let first_kind = if self.config.include_cover {
            PageKind::Cover
        } else if self.config.include_toc {
            PageKind::Toc
        } else {
            PageKind::Content
        };
        let mut state = PaginationState::new(self.geometry, first_kind);

        if self.config.include_cover {
            state.place(Fragment {
                content: FragmentContent::Cover {
                    title: document.title.clone(),
                },
                section_id: None,
                block_index: None,
                x: self.geometry.content_x(),
                y: 0.0,
                width: self.geometry.content_width(),
                height: self.geometry.usable_height(),
                anchor: None,
                link: None,
            });
            let next = if self.config.include_toc {
                PageKind::Toc
            } else {
                PageKind::Content
            };
            state.break_page(next);
        }

        if self.config.include_toc {
            let entries = toc::collect_entries(document, self.config.toc_max_depth as usize);
            toc::layout_toc(self, &entries, toc_mode, &mut state)?;
            state.set_current_section(None);
            state.break_page(PageKind::Content);
        }

        for (i, section) in document.sections.iter().enumerate() {
            self.layout_section(section, document.sections.get(i + 1), &mut state)?;
        }

        let pass = state.finish();
        log::debug!(
            "layout pass: {} page(s), {} anchor(s)",
            pass.pages.len(),
            pass.anchors.len()
        );
        Ok(pass)
    }

    fn overflow(&self, section: &Section, block_index: Option<usize>, unit_height: f64) -> ExportError {
        ExportError::UnsplittableOverflow {
            section_id: section.id.clone(),
            block_index,
            unit_height,
            page_height: self.geometry.usable_height(),
        }
    }

    /// Height needed by the first indivisible piece after a heading, with
    /// the space in front of it.
    fn lead_in(&self, next: Option<&Block>) -> f64 {
        let m = self.measurer();
        next.map_or(0.0, |block| m.space_before(block) + m.min_unit_height(block))
    }

    /// Height a section heading needs together with the first piece it
    /// keeps with, space in front included.
    fn heading_lead(&self, section: &Section) -> f64 {
        let m = self.measurer();
        let level = section.heading_level();
        let style = self.typo.heading(level);
        let follow = self.section_follow(section);
        style.space_before
            + m.heading_height(level, &section.title)
            + if follow > 0.0 { style.space_after + follow } else { 0.0 }
    }

    /// What a section heading keeps with: its description, its first block,
    /// or the heading of its first child. An empty leaf keeps with nothing.
    fn section_follow(&self, section: &Section) -> f64 {
        if let Some(text) = self.description(section) {
            return self.measurer().description_height(&text);
        }
        if let Some(block) = section.body.first() {
            return self.lead_in(Some(block));
        }
        self.after_body(section, None)
    }

    /// Lead of whatever comes after the body of `section`: its first child,
    /// else `next`, the section that follows its subtree.
    fn after_body(&self, section: &Section, next: Option<&Section>) -> f64 {
        let lead = match (section.children.first(), next) {
            (Some(child), _) => self.heading_lead(child),
            (None, Some(next)) => {
                let lead = self.heading_lead(next);
                let threshold = self.config.section_break_threshold;
                // A top-level section needs `threshold` left or it starts a new page
                if next.depth == 1 && threshold > 0.0 {
                    lead.max(threshold)
                } else {
                    lead
                }
            }
            (None, None) => return 0.0,
        };
        self.typo.section_gap + lead
    }

    fn description(&self, section: &Section) -> Option<String> {
        section
            .description
            .as_ref()
            .filter(|d| self.config.include_page_descriptions && !d.trim().is_empty())
            .cloned()
    }

    /// Lay out `section` and its subtree. `next` is the section that follows
    /// the subtree in document order.
    fn layout_section(
        &self,
        section: &Section,
        next: Option<&Section>,
        state: &mut PaginationState,
    ) -> Result<(), ExportError> {
        let m = self.measurer();
        let level = section.heading_level();
        let style = self.typo.heading(level);
        let heading_height = m.heading_height(level, &section.title);
        if heading_height > self.geometry.usable_height() {
            return Err(self.overflow(section, None, heading_height));
        }

        let threshold = self.config.section_break_threshold;
        if section.depth == 1
            && threshold > 0.0
            && !state.is_page_empty()
            && state.remaining_height() < threshold
        {
            state.break_page(PageKind::Content);
        }

        // Keep the heading with the first piece of what follows it
        let description = self.description(section);
        let follow = self.section_follow(section);
        if !state.is_page_empty() {
            let needed = style.space_before
                + heading_height
                + if follow > 0.0 { style.space_after + follow } else { 0.0 };
            if needed > state.remaining_height() {
                state.break_page(PageKind::Content);
            }
        }

        state.space_before(style.space_before);
        if heading_height > state.remaining_height() {
            state.break_page(PageKind::Content);
        }
        state.set_current_section(Some(section.title.clone()));
        let anchor = state.record_anchor(&section.id);
        state.place(Fragment {
            content: FragmentContent::SectionHeading {
                level,
                text: section.title.clone(),
            },
            section_id: Some(section.id.clone()),
            block_index: None,
            x: self.geometry.content_x(),
            y: 0.0,
            width: self.geometry.content_width(),
            height: heading_height,
            anchor: Some(anchor),
            link: None,
        });
        state.advance(style.space_after);

        if let Some(text) = description {
            let height = m.description_height(&text);
            if height > self.geometry.usable_height() {
                return Err(self.overflow(section, None, height));
            }
            if height > state.remaining_height() {
                state.break_page(PageKind::Content);
            }
            state.place(Fragment {
                content: FragmentContent::Description { text },
                section_id: Some(section.id.clone()),
                block_index: None,
                x: self.geometry.content_x(),
                y: 0.0,
                width: self.geometry.content_width(),
                height,
                anchor: None,
                link: None,
            });
            state.advance(self.typo.description_space_after);
        }

        for (index, block) in section.body.iter().enumerate() {
            self.layout_block(section, index, block, next, state)?;
        }
        state.advance(self.typo.section_gap);

        for (i, child) in section.children.iter().enumerate() {
            self.layout_section(child, section.children.get(i + 1).or(next), state)?;
        }

        Ok(())
    }

    /// Horizontal inset of a block on each side.
    fn inset(&self, block: &Block) -> (f64, f64) {
        match block {
            Block::Quote { .. } => (self.typo.quote_indent, 0.0),
            Block::CodeBlock { .. } => (self.typo.code_indent, self.typo.code_indent),
            _ => (0.0, 0.0),
        }
    }

    fn layout_block(
        &self,
        section: &Section,
        index: usize,
        block: &Block,
        next: Option<&Section>,
        state: &mut PaginationState,
    ) -> Result<(), ExportError> {
        let m = self.measurer();
        let splitter = BlockSplitter::new(m);

        if let Block::Heading { .. } = block {
            let follow = match section.body.get(index + 1) {
                Some(after) => self.lead_in(Some(after)),
                None => self.after_body(section, next),
            };
            if follow > 0.0 && !state.is_page_empty() {
                let needed =
                    m.space_before(block) + m.block_height(block) + m.space_after(block) + follow;
                if needed > state.remaining_height() {
                    state.break_page(PageKind::Content);
                }
            }
        }

        let (left, right) = self.inset(block);
        let mut pending = block.clone();
        let mut continuation = false;

        loop {
            let space = if state.is_page_empty() || continuation {
                0.0
            } else {
                m.space_before(&pending)
            };
            let split = splitter.split(&pending, state.remaining_height() - space);

            match split {
                page_break::Split {
                    fits: Some(fit),
                    remainder,
                } => {
                    state.space_before(space);
                    let height = m.block_height(&fit);
                    state.place(Fragment {
                        content: FragmentContent::Block {
                            block: fit,
                            continuation,
                        },
                        section_id: Some(section.id.clone()),
                        block_index: Some(index),
                        x: self.geometry.content_x() + left,
                        y: 0.0,
                        width: self.geometry.content_width() - left - right,
                        height,
                        anchor: None,
                        link: None,
                    });
                    match remainder {
                        None => {
                            state.advance(m.space_after(block));
                            return Ok(());
                        }
                        Some(rest) => {
                            state.break_page(PageKind::Content);
                            pending = rest;
                            continuation = true;
                        }
                    }
                }
                page_break::Split {
                    fits: None,
                    remainder: Some(rest),
                } => {
                    if state.is_page_empty() {
                        return Err(self.overflow(section, Some(index), m.min_unit_height(&rest)));
                    }
                    state.break_page(PageKind::Content);
                    pending = rest;
                }
                page_break::Split {
                    fits: None,
                    remainder: None,
                } => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSize;
    use crate::model::StyledRun;

    fn config() -> ExportConfig {
        ExportConfig {
            include_toc: false,
            section_break_threshold: 0.0,
            ..Default::default()
        }
    }

    fn layout(doc: &Document, config: &ExportConfig) -> LayoutPass {
        LayoutEngine::new(config)
            .layout(doc, TocMode::Placeholder { digits: 3 })
            .unwrap()
    }

    #[test]
    fn empty_document_has_one_page() {
        let doc = Document::new("Empty", vec![]).unwrap();
        let pass = layout(&doc, &config());
        assert_eq!(pass.pages.len(), 1);
        assert!(pass.anchors.is_empty());
    }

    #[test]
    fn empty_section_still_gets_an_anchor() {
        let doc = Document::new("Guide", vec![Section::new("empty", "Empty", 1)]).unwrap();
        let pass = layout(&doc, &config());
        assert_eq!(pass.anchors.page_index("empty"), Some(0));
        assert!(pass.pages[0].fragments[0].anchor.is_some());
    }

    #[test]
    fn heading_is_kept_with_first_block() {
        let config = ExportConfig {
            page_size: PageSize::Custom {
                width: 400.0,
                height: 300.0,
            },
            margin_top: 20.0,
            margin_bottom: 20.0,
            header_height: 0.0,
            footer_height: 0.0,
            ..config()
        };
        // usable height 260
        let filler = Block::code(None, &["x"; 18]); // 16 + 216 = 232
        let doc = Document::new(
            "Guide",
            vec![
                Section::new("a", "A", 1).with_body(vec![filler]),
                Section::new("b", "B", 1).with_body(vec![Block::paragraph("body")]),
            ],
        )
        .unwrap();
        let pass = layout(&doc, &config);
        // The code block spills one line onto page 2, where B's heading
        // must still be followed by its paragraph.
        assert_eq!(pass.anchors.page_index("a"), Some(0));
        let b_page = pass.anchors.page_index("b").unwrap();
        let page = &pass.pages[b_page];
        let heading_pos = page
            .fragments
            .iter()
            .position(|f| f.section_id.as_deref() == Some("b") && f.content.is_heading())
            .unwrap();
        assert!(heading_pos + 1 < page.fragments.len());
    }

    #[test]
    fn section_title_follows_content() {
        let config = ExportConfig {
            page_size: PageSize::Custom {
                width: 400.0,
                height: 200.0,
            },
            margin_top: 20.0,
            margin_bottom: 20.0,
            header_height: 0.0,
            footer_height: 0.0,
            ..config()
        };
        let runs: Vec<StyledRun> = (0..20).map(|i| StyledRun::plain(format!("line {i}\n"))).collect();
        let doc = Document::new(
            "Guide",
            vec![Section::new("long", "Long", 1).with_body(vec![Block::Paragraph { runs }])],
        )
        .unwrap();
        let pass = layout(&doc, &config);
        assert!(pass.pages.len() > 1);
        for page in &pass.pages {
            assert_eq!(page.section_title.as_deref(), Some("Long"));
        }
    }

    #[test]
    fn anchors_are_in_document_order() {
        let doc = Document::new(
            "Guide",
            vec![
                Section::new("a", "A", 1).with_children(vec![Section::new("a1", "A.1", 2)]),
                Section::new("b", "B", 1),
            ],
        )
        .unwrap();
        let pass = layout(&doc, &config());
        let ids: Vec<&str> = pass.anchors.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "b"]);
    }
}

//! # Render Sink
//!
//! The boundary between pagination and drawing. A sink receives finished
//! pages in order and turns fragments into output; it never decides where
//! anything goes. Anchors and links are both resolved by the sink at the
//! end of the document, because TOC links point forward to pages that have
//! not been emitted yet.

use serde::Serialize;
use std::convert::Infallible;

use crate::config::PageGeometry;
use crate::error::ExportError;
use crate::layout::{AnchorId, Decorations, Fragment, PageKind, Point, Rect};
use crate::resolve::ResolvedExport;

/// A drawing backend.
pub trait RenderSink {
    /// Per-page drawing context returned by [`RenderSink::begin_page`].
    type Page;
    type Error: std::error::Error + Send + Sync + 'static;

    fn begin_page(
        &mut self,
        geometry: &PageGeometry,
        kind: PageKind,
        number: usize,
    ) -> Result<Self::Page, Self::Error>;

    fn draw_fragment(
        &mut self,
        page: &mut Self::Page,
        fragment: &Fragment,
        position: Point,
    ) -> Result<(), Self::Error>;

    /// Mark the current position of `page` as the destination `anchor`.
    fn define_anchor(&mut self, page: &mut Self::Page, anchor: &AnchorId, position: Point)
        -> Result<(), Self::Error>;

    /// Make `region` of `page` a link to `target`.
    fn draw_internal_link(
        &mut self,
        page: &mut Self::Page,
        region: Rect,
        target: &AnchorId,
    ) -> Result<(), Self::Error>;

    /// Running header, footer and page label. Sinks without decorations can
    /// ignore them.
    fn draw_decorations(
        &mut self,
        _page: &mut Self::Page,
        _decorations: &Decorations,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn end_page(&mut self, page: Self::Page) -> Result<(), Self::Error>;
}

fn sink_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> ExportError {
    ExportError::Sink(Box::new(err))
}

/// Replay a resolved export into `sink`, page by page.
///
/// Every link target is checked against the anchor map before the first
/// page is emitted, so a sink never sees a dangling link.
pub fn emit<S: RenderSink>(export: &ResolvedExport, sink: &mut S) -> Result<(), ExportError> {
    for fragment in export.pages.iter().flat_map(|p| &p.fragments) {
        if let Some(target) = &fragment.link {
            if !export.anchors.contains(target) {
                return Err(ExportError::PaginationDiverged(format!(
                    "link to `{target}` has no anchor"
                )));
            }
        }
    }

    for page in &export.pages {
        let mut handle = sink
            .begin_page(&export.geometry, page.kind, page.number)
            .map_err(sink_error)?;
        for fragment in &page.fragments {
            if let Some(anchor) = &fragment.anchor {
                sink.define_anchor(&mut handle, anchor, fragment.position())
                    .map_err(sink_error)?;
            }
            sink.draw_fragment(&mut handle, fragment, fragment.position())
                .map_err(sink_error)?;
            if let Some(target) = &fragment.link {
                sink.draw_internal_link(&mut handle, fragment.rect(), target)
                    .map_err(sink_error)?;
            }
        }
        if let Some(decorations) = &page.decorations {
            sink.draw_decorations(&mut handle, decorations)
                .map_err(sink_error)?;
        }
        sink.end_page(handle).map_err(sink_error)?;
    }

    log::debug!("emitted {} page(s)", export.pages.len());
    Ok(())
}

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SinkOp {
    BeginPage { number: usize, kind: PageKind },
    Fragment {
        kind: String,
        section_id: Option<String>,
        at: Point,
        height: f64,
    },
    Anchor { id: AnchorId, page: usize },
    Link { target: AnchorId, page: usize, region: Rect },
    Decorations {
        page: usize,
        decorations: Decorations,
    },
    EndPage { number: usize },
}

/// A sink that records every call. Used by the CLI's `--ops` output and by
/// tests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Recorder {
    pub ops: Vec<SinkOp>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page number of every defined anchor.
    pub fn anchors(&self) -> impl Iterator<Item = (&AnchorId, usize)> {
        self.ops.iter().filter_map(|op| match op {
            SinkOp::Anchor { id, page } => Some((id, *page)),
            _ => None,
        })
    }

    /// Every link target, with the page the link sits on.
    pub fn links(&self) -> impl Iterator<Item = (&AnchorId, usize)> {
        self.ops.iter().filter_map(|op| match op {
            SinkOp::Link { target, page, .. } => Some((target, *page)),
            _ => None,
        })
    }
}

impl RenderSink for Recorder {
    /// The page number.
    type Page = usize;
    type Error = Infallible;

    fn begin_page(
        &mut self,
        _geometry: &PageGeometry,
        kind: PageKind,
        number: usize,
    ) -> Result<usize, Infallible> {
        self.ops.push(SinkOp::BeginPage { number, kind });
        Ok(number)
    }

    fn draw_fragment(&mut self, _page: &mut usize, fragment: &Fragment, position: Point) -> Result<(), Infallible> {
        self.ops.push(SinkOp::Fragment {
            kind: fragment.content.kind_name().to_string(),
            section_id: fragment.section_id.clone(),
            at: position,
            height: fragment.height,
        });
        Ok(())
    }

    fn define_anchor(&mut self, page: &mut usize, anchor: &AnchorId, _position: Point) -> Result<(), Infallible> {
        self.ops.push(SinkOp::Anchor {
            id: anchor.clone(),
            page: *page,
        });
        Ok(())
    }

    fn draw_internal_link(&mut self, page: &mut usize, region: Rect, target: &AnchorId) -> Result<(), Infallible> {
        self.ops.push(SinkOp::Link {
            target: target.clone(),
            page: *page,
            region,
        });
        Ok(())
    }

    fn draw_decorations(&mut self, page: &mut usize, decorations: &Decorations) -> Result<(), Infallible> {
        if *decorations != Decorations::default() {
            self.ops.push(SinkOp::Decorations {
                page: *page,
                decorations: decorations.clone(),
            });
        }
        Ok(())
    }

    fn end_page(&mut self, page: usize) -> Result<(), Infallible> {
        self.ops.push(SinkOp::EndPage { number: page });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::model::{Block, Document, Section};
    use crate::resolve::PaginationResolver;
    use std::collections::HashMap;

    fn export() -> ResolvedExport {
        let doc = Document::new(
            "Guide",
            vec![
                Section::new("a", "Alpha", 1).with_body(vec![Block::paragraph("text")]),
                Section::new("b", "Beta", 1).with_children(vec![Section::new("b1", "Beta One", 2)]),
            ],
        )
        .unwrap();
        PaginationResolver::new(&ExportConfig::default())
            .resolve(&doc)
            .unwrap()
    }

    #[test]
    fn every_link_has_a_defined_anchor() {
        let mut recorder = Recorder::new();
        emit(&export(), &mut recorder).unwrap();
        let anchors: HashMap<&AnchorId, usize> = recorder.anchors().collect();
        assert_eq!(anchors.len(), 3);
        let mut links = 0;
        for (target, _) in recorder.links() {
            assert!(anchors.contains_key(target));
            links += 1;
        }
        assert_eq!(links, 3);
    }

    #[test]
    fn pages_are_bracketed() {
        let export = export();
        let mut recorder = Recorder::new();
        emit(&export, &mut recorder).unwrap();
        let begins = recorder
            .ops
            .iter()
            .filter(|op| matches!(op, SinkOp::BeginPage { .. }))
            .count();
        let ends = recorder
            .ops
            .iter()
            .filter(|op| matches!(op, SinkOp::EndPage { .. }))
            .count();
        assert_eq!(begins, export.total_pages());
        assert_eq!(ends, export.total_pages());
        assert!(matches!(recorder.ops.last(), Some(SinkOp::EndPage { .. })));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    struct Failing;

    impl RenderSink for Failing {
        type Page = ();
        type Error = DiskFull;

        fn begin_page(&mut self, _: &PageGeometry, _: PageKind, _: usize) -> Result<(), DiskFull> {
            Ok(())
        }
        fn draw_fragment(&mut self, _: &mut (), _: &Fragment, _: Point) -> Result<(), DiskFull> {
            Err(DiskFull)
        }
        fn define_anchor(&mut self, _: &mut (), _: &AnchorId, _: Point) -> Result<(), DiskFull> {
            Ok(())
        }
        fn draw_internal_link(&mut self, _: &mut (), _: Rect, _: &AnchorId) -> Result<(), DiskFull> {
            Ok(())
        }
        fn end_page(&mut self, _: ()) -> Result<(), DiskFull> {
            Ok(())
        }
    }

    #[test]
    fn sink_errors_are_wrapped() {
        let err = emit(&export(), &mut Failing).unwrap_err();
        assert!(matches!(err, ExportError::Sink(_)));
        assert_eq!(err.to_string(), "render sink failed: disk full");
    }
}

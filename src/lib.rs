//! # Folio
//!
//! A page-native pagination engine for documentation exports.
//!
//! A documentation site is a tree of pages. Exporting it means laying that
//! tree out into fixed-size pages with a table of contents up front, and
//! the TOC has a chicken-and-egg problem: it needs the page number of every
//! section, and those numbers depend on how long the TOC itself is.
//!
//! Folio does the layout **into** pages, never onto a canvas sliced later:
//! every block is measured against the space left on the current page and
//! split at its natural boundaries (runs, rows, lines, items). The TOC is
//! resolved with two passes. The first pass reserves a fixed-width slot for
//! every page number and records where each section lands; the second pass
//! fills the slots in. Since the slot width does not change, nothing moves.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    : Section tree and typed blocks
//!       ↓
//!   [style]    : Fixed typography derived from the export config
//!       ↓
//!   [layout]   : Page-aware layout engine + block splitter + TOC
//!       ↓
//!   [resolve]  : Two passes, page numbers, headers and footers
//!       ↓
//!   [sink]     : Hand finished pages to a drawing backend
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod resolve;
pub mod sink;
pub mod style;
pub mod text;

use serde::Deserialize;

use config::ExportConfig;
use error::ExportError;
use model::{Document, SectionRecord};
use resolve::{PaginationResolver, ResolvedExport};
use sink::RenderSink;

/// Paginate a document.
///
/// This is the primary entry point. Either every page comes back with its
/// TOC numbers and decorations resolved, or the export fails as a whole.
pub fn export(document: &Document, config: &ExportConfig) -> Result<ResolvedExport, ExportError> {
    PaginationResolver::new(config).resolve(document)
}

/// Paginate a document and replay the pages into `sink`.
pub fn export_to<S: RenderSink>(
    document: &Document,
    config: &ExportConfig,
    sink: &mut S,
) -> Result<ResolvedExport, ExportError> {
    let resolved = export(document, config)?;
    sink::emit(&resolved, sink)?;
    Ok(resolved)
}

/// An export request as JSON: either a nested `document`, or a `title`
/// with the flat `records` of a content source, plus an optional `config`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub records: Option<Vec<SectionRecord>>,
    #[serde(default)]
    pub config: ExportConfig,
}

impl ExportRequest {
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The section tree this request describes.
    pub fn document(&self) -> Result<Document, ExportError> {
        match (&self.document, &self.records) {
            (Some(document), None) => Ok(document.clone()),
            (None, Some(records)) => Document::from_records(
                self.title.clone().unwrap_or_default(),
                records.clone(),
            ),
            (Some(_), Some(_)) => Err(ExportError::InvalidConfig(
                "request has both `document` and `records`".to_string(),
            )),
            (None, None) => Err(ExportError::InvalidConfig(
                "request needs either `document` or `records`".to_string(),
            )),
        }
    }
}

/// Paginate an export request given as JSON.
pub fn export_json(json: &str) -> Result<ResolvedExport, ExportError> {
    let request = ExportRequest::from_json(json)?;
    export(&request.document()?, &request.config)
}

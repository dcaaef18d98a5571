//! Structured error types for the folio pagination engine.
//!
//! Every variant is terminal for the export that raised it. There is no
//! partial or degraded output: the caller decides whether to retry with a
//! different geometry or different content.

use thiserror::Error;

/// The unified error type returned by all public folio API functions.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Two sections share the same id.
    #[error("duplicate section id `{id}`: every section needs a unique anchor")]
    DuplicateAnchor { id: String },

    /// A dangling parent reference or an inconsistent depth.
    #[error("malformed section tree at `{id}`: {reason}")]
    MalformedTree { id: String, reason: String },

    /// A single indivisible unit (table row, code line, heading, image
    /// placeholder) is taller than the usable page height.
    #[error(
        "content in section `{section_id}`{} needs {unit_height:.1}pt but a page only has {page_height:.1}pt",
        block_label(.block_index)
    )]
    UnsplittableOverflow {
        section_id: String,
        /// Position in the section body. `None` for the section heading or
        /// its description.
        block_index: Option<usize>,
        unit_height: f64,
        page_height: f64,
    },

    /// The real page count needs more digits than the TOC reserved in pass 1.
    #[error(
        "table of contents reserved {reserved} digit(s) for page numbers but the document has {total_pages} pages ({required} digits)"
    )]
    TocWidthExceeded {
        reserved: usize,
        required: usize,
        total_pages: usize,
    },

    /// The second layout pass did not reproduce the page boundaries of the
    /// first one.
    #[error("pagination diverged between passes: {0}")]
    PaginationDiverged(String),

    /// An option is out of its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON input failed to parse.
    #[error("failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// The render sink refused a drawing operation.
    #[error("render sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn block_label(block_index: &Option<usize>) -> String {
    match block_index {
        Some(index) => format!(" (block {})", index),
        None => " (heading)".to_string(),
    }
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the export request schema. Check field names and block types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input, is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ExportError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_message_names_block() {
        let err = ExportError::UnsplittableOverflow {
            section_id: "intro".to_string(),
            block_index: Some(3),
            unit_height: 900.0,
            page_height: 600.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("`intro`"));
        assert!(msg.contains("block 3"));
    }

    #[test]
    fn overflow_message_for_heading() {
        let err = ExportError::UnsplittableOverflow {
            section_id: "intro".to_string(),
            block_index: None,
            unit_height: 900.0,
            page_height: 600.0,
        };
        assert!(err.to_string().contains("(heading)"));
    }

    #[test]
    fn parse_error_carries_hint() {
        let e = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}").unwrap_err();
        let err: ExportError = e.into();
        match &err {
            ExportError::Parse { hint, .. } => assert!(hint.contains("trailing commas")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("Hint:"));
    }
}

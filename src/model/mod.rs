//! # Document Model
//!
//! The input representation for the pagination engine. A document is a tree
//! of sections; each section owns an ordered body of typed blocks and an
//! ordered list of child sections.
//!
//! The model is pure data. The only behavior here is structural: validating
//! the tree (unique ids, consistent depths), pruning hidden sections, and the
//! block reassembly used to check that splitting never loses content.
//!
//! Blocks are a closed enum on purpose. The block splitter has exactly one
//! rule per variant and a new variant will not compile until it has one.

pub mod tree;

pub use tree::SectionRecord;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ExportError;

/// A complete document ready for pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Document title, used by the cover page and the `{title}` header
    /// placeholder.
    #[serde(default)]
    pub title: String,
    /// Top-level sections, depth 1.
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// One documentation page: a node in the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Stable id derived from the source page. Doubles as the anchor name.
    pub id: String,
    pub title: String,
    /// 1-based nesting level.
    pub depth: usize,
    /// Short summary shown in italics under the heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hidden pages are pruned unless the export asks for them.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub body: Vec<Block>,
    #[serde(default)]
    pub children: Vec<Section>,
}

/// A span of text with uniform styling. Paragraphs never split inside one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    /// Inline code, measured in the monospace face.
    #[serde(default)]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Default::default()
        }
    }
}

/// One typed unit of content within a section body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Block {
    /// An in-body heading, level 1..=6.
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<StyledRun> },
    /// Indented block quote. Splits like a paragraph.
    Quote { runs: Vec<StyledRun> },
    CodeBlock {
        #[serde(default)]
        language: Option<String>,
        lines: Vec<String>,
    },
    Table {
        #[serde(default)]
        header_row: Option<Vec<String>>,
        rows: Vec<Vec<String>>,
    },
    ListBlock(ListBlock),
    /// Stands in for an image; drawn as `[Image: caption]`.
    ImagePlaceholder { caption: String },
    /// Horizontal rule.
    Rule,
}

/// A bulleted or numbered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBlock {
    pub ordered: bool,
    /// Number of the first item. Continuation fragments of an ordered list
    /// keep counting from where the previous page stopped.
    #[serde(default = "default_list_start")]
    pub start: usize,
    pub items: Vec<ListItem>,
}

fn default_list_start() -> usize {
    1
}

/// One list entry. Its own text is indivisible; its nested list is not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    #[serde(default)]
    pub runs: Vec<StyledRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublist: Option<ListBlock>,
    /// Set on the first item of a continuation fragment whose text was
    /// already placed on the previous page. Only its sublist is drawn.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub continued: bool,
}

impl ListItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![StyledRun::plain(text)],
            ..Default::default()
        }
    }

    pub fn with_sublist(mut self, sublist: ListBlock) -> Self {
        self.sublist = Some(sublist);
        self
    }
}

impl ListBlock {
    pub fn new(ordered: bool, items: Vec<ListItem>) -> Self {
        Self {
            ordered,
            start: 1,
            items,
        }
    }

    /// Indivisible units: one per item text plus everything nested.
    pub fn unit_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| {
                let own = usize::from(!item.continued);
                own + item.sublist.as_ref().map_or(0, ListBlock::unit_count)
            })
            .sum()
    }

    fn merge(mut self, continuation: ListBlock) -> Option<ListBlock> {
        if self.ordered != continuation.ordered {
            return None;
        }
        let mut rest = continuation.items.into_iter();
        if let Some(first) = rest.next() {
            if first.continued {
                let last = self.items.last_mut()?;
                last.sublist = match (last.sublist.take(), first.sublist) {
                    (Some(head), Some(tail)) => Some(head.merge(tail)?),
                    (head, None) => head,
                    (None, tail) => tail,
                };
            } else {
                self.items.push(first);
            }
        }
        self.items.extend(rest);
        Some(self)
    }
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            runs: vec![StyledRun::plain(text)],
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn code(language: Option<&str>, lines: &[&str]) -> Self {
        Block::CodeBlock {
            language: language.map(str::to_string),
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn table(header: Option<Vec<&str>>, rows: Vec<Vec<&str>>) -> Self {
        let owned = |cells: Vec<&str>| cells.into_iter().map(str::to_string).collect::<Vec<_>>();
        Block::Table {
            header_row: header.map(owned),
            rows: rows.into_iter().map(owned).collect(),
        }
    }

    /// Short name used in logs and layout summaries.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "Heading",
            Block::Paragraph { .. } => "Paragraph",
            Block::Quote { .. } => "Quote",
            Block::CodeBlock { .. } => "CodeBlock",
            Block::Table { .. } => "Table",
            Block::ListBlock(_) => "ListBlock",
            Block::ImagePlaceholder { .. } => "ImagePlaceholder",
            Block::Rule => "Rule",
        }
    }

    /// Number of indivisible units in this block. Every page carries at
    /// least one unit, so the sum over a document bounds its page count.
    pub fn unit_count(&self) -> usize {
        let units = match self {
            Block::Paragraph { runs } | Block::Quote { runs } => runs.len(),
            Block::CodeBlock { lines, .. } => lines.len(),
            Block::Table { rows, .. } => rows.len(),
            Block::ListBlock(list) => list.unit_count(),
            Block::Heading { .. } | Block::ImagePlaceholder { .. } | Block::Rule => 1,
        };
        units.max(1)
    }

    /// Join a fragment with the continuation the splitter produced for it.
    /// Returns `None` when the two pieces cannot come from the same block.
    pub fn merge(self, continuation: Block) -> Option<Block> {
        match (self, continuation) {
            (Block::Paragraph { mut runs }, Block::Paragraph { runs: tail }) => {
                runs.extend(tail);
                Some(Block::Paragraph { runs })
            }
            (Block::Quote { mut runs }, Block::Quote { runs: tail }) => {
                runs.extend(tail);
                Some(Block::Quote { runs })
            }
            (
                Block::CodeBlock { language, mut lines },
                Block::CodeBlock {
                    language: tail_language,
                    lines: tail,
                },
            ) if language == tail_language => {
                lines.extend(tail);
                Some(Block::CodeBlock { language, lines })
            }
            (
                Block::Table { header_row, mut rows },
                Block::Table {
                    header_row: tail_header,
                    rows: tail,
                },
            ) if header_row == tail_header => {
                rows.extend(tail);
                Some(Block::Table { header_row, rows })
            }
            (Block::ListBlock(head), Block::ListBlock(tail)) => head.merge(tail).map(Block::ListBlock),
            _ => None,
        }
    }
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>, depth: usize) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            depth,
            description: None,
            hidden: false,
            body: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: Vec<Block>) -> Self {
        self.body = body;
        self
    }

    pub fn with_children(mut self, children: Vec<Section>) -> Self {
        self.children = children;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Heading level for the section title. Levels past 6 share the smallest
    /// heading style.
    pub fn heading_level(&self) -> u8 {
        self.depth.clamp(1, 6) as u8
    }

    fn collect_pre_order<'a>(&'a self, out: &mut Vec<&'a Section>) {
        out.push(self);
        for child in &self.children {
            child.collect_pre_order(out);
        }
    }
}

impl Document {
    /// Build a document, validating the section tree.
    pub fn new(title: impl Into<String>, sections: Vec<Section>) -> Result<Self, ExportError> {
        let document = Self {
            title: title.into(),
            sections,
        };
        document.validate()?;
        Ok(document)
    }

    /// Parse a document tree from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let document: Document = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Check the structural invariants: roots at depth 1, every child one
    /// level below its parent, ids unique across the whole tree.
    pub fn validate(&self) -> Result<(), ExportError> {
        let mut seen = HashSet::new();
        let mut stack: Vec<(&Section, usize)> = self.sections.iter().rev().map(|s| (s, 1)).collect();

        while let Some((section, expected_depth)) = stack.pop() {
            if !seen.insert(section.id.as_str()) {
                return Err(ExportError::DuplicateAnchor {
                    id: section.id.clone(),
                });
            }
            if section.depth != expected_depth {
                return Err(ExportError::MalformedTree {
                    id: section.id.clone(),
                    reason: format!(
                        "depth is {} but its position in the tree implies {}",
                        section.depth, expected_depth
                    ),
                });
            }
            stack.extend(section.children.iter().rev().map(|c| (c, expected_depth + 1)));
        }

        Ok(())
    }

    /// All sections in document (pre-order) order.
    pub fn pre_order(&self) -> Vec<&Section> {
        let mut out = Vec::new();
        for section in &self.sections {
            section.collect_pre_order(&mut out);
        }
        out
    }

    pub fn find(&self, id: &str) -> Option<&Section> {
        self.pre_order().into_iter().find(|s| s.id == id)
    }

    /// Copy of the document without hidden sections. A hidden section takes
    /// its whole subtree with it.
    pub fn pruned(&self, include_hidden: bool) -> Document {
        if include_hidden {
            return self.clone();
        }

        fn prune(sections: &[Section], dropped: &mut usize) -> Vec<Section> {
            let mut kept = Vec::with_capacity(sections.len());
            for section in sections {
                if section.hidden {
                    *dropped += 1;
                    continue;
                }
                kept.push(Section {
                    id: section.id.clone(),
                    title: section.title.clone(),
                    depth: section.depth,
                    description: section.description.clone(),
                    hidden: false,
                    body: section.body.clone(),
                    children: prune(&section.children, dropped),
                });
            }
            kept
        }

        let mut dropped = 0;
        let sections = prune(&self.sections, &mut dropped);
        if dropped > 0 {
            log::debug!("pruned {} hidden section subtree(s)", dropped);
        }
        Document {
            title: self.title.clone(),
            sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(
            "Guide",
            vec![
                Section::new("a", "A", 1).with_children(vec![
                    Section::new("a1", "A.1", 2),
                    Section::new("a2", "A.2", 2).hidden(),
                ]),
                Section::new("b", "B", 1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn pre_order_walk() {
        let doc = sample();
        let ids: Vec<&str> = doc.pre_order().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "a2", "b"]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let err = Document::new(
            "Guide",
            vec![
                Section::new("a", "A", 1).with_children(vec![Section::new("x", "X", 2)]),
                Section::new("x", "X again", 1),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::DuplicateAnchor { id } if id == "x"));
    }

    #[test]
    fn child_depth_must_follow_parent() {
        let err = Document::new(
            "Guide",
            vec![Section::new("a", "A", 1).with_children(vec![Section::new("b", "B", 3)])],
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::MalformedTree { id, .. } if id == "b"));
    }

    #[test]
    fn root_depth_must_be_one() {
        let err = Document::new("Guide", vec![Section::new("a", "A", 2)]).unwrap_err();
        assert!(matches!(err, ExportError::MalformedTree { .. }));
    }

    #[test]
    fn empty_section_is_valid() {
        assert!(Document::new("Guide", vec![Section::new("empty", "Empty", 1)]).is_ok());
    }

    #[test]
    fn prune_hidden() {
        let doc = sample();
        let pruned = doc.pruned(false);
        assert!(pruned.find("a2").is_none());
        assert!(pruned.find("a1").is_some());
        assert_eq!(doc.pruned(true), doc);
    }

    #[test]
    fn json_blocks_are_type_tagged() {
        let doc = Document::from_json(
            r#"{
              "title": "Guide",
              "sections": [{
                "id": "intro", "title": "Intro", "depth": 1,
                "body": [
                  { "type": "Paragraph", "runs": [{ "text": "Hello " }, { "text": "world", "bold": true }] },
                  { "type": "CodeBlock", "language": "rust", "lines": ["fn main() {}"] },
                  { "type": "Table", "headerRow": ["k", "v"], "rows": [["a", "1"]] },
                  { "type": "ListBlock", "ordered": true, "items": [{ "runs": [{ "text": "one" }] }] },
                  { "type": "ImagePlaceholder", "caption": "diagram" },
                  { "type": "Rule" }
                ]
              }]
            }"#,
        )
        .unwrap();
        let body = &doc.sections[0].body;
        assert_eq!(body.len(), 6);
        assert!(matches!(&body[2], Block::Table { header_row: Some(h), .. } if h.len() == 2));
        assert!(matches!(&body[3], Block::ListBlock(list) if list.start == 1 && list.ordered));
    }

    #[test]
    fn merge_continued_list_item() {
        let head = ListBlock::new(
            false,
            vec![ListItem::text("parent").with_sublist(ListBlock::new(false, vec![ListItem::text("x")]))],
        );
        let tail = ListBlock {
            ordered: false,
            start: 2,
            items: vec![
                ListItem {
                    continued: true,
                    sublist: Some(ListBlock {
                        ordered: false,
                        start: 2,
                        items: vec![ListItem::text("y")],
                    }),
                    ..Default::default()
                },
                ListItem::text("sibling"),
            ],
        };
        let merged = Block::ListBlock(head).merge(Block::ListBlock(tail)).unwrap();
        let Block::ListBlock(list) = merged else {
            panic!("expected a list");
        };
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].sublist.as_ref().unwrap().items.len(), 2);
    }

    #[test]
    fn merge_rejects_mismatched_blocks() {
        assert!(Block::paragraph("a").merge(Block::Rule).is_none());
        assert!(Block::code(Some("rust"), &["a"])
            .merge(Block::code(Some("python"), &["b"]))
            .is_none());
    }
}

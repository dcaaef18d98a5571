//! Assembling the section tree from the content source's flat records.
//!
//! The content API hands over pages as a flat, ordered list where every entry
//! names its parent. Parents always come before their children. Anything
//! else is malformed input and fails fast; nothing is repaired.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Block, Document, Section};
use crate::error::ExportError;

/// One page as delivered by the content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub title: String,
    pub depth: usize,
    #[serde(default)]
    pub body: Vec<Block>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

impl SectionRecord {
    pub fn new(
        id: impl Into<String>,
        parent_id: Option<&str>,
        title: impl Into<String>,
        depth: usize,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
            title: title.into(),
            depth,
            body: Vec::new(),
            description: None,
            hidden: false,
        }
    }

    pub fn with_body(mut self, body: Vec<Block>) -> Self {
        self.body = body;
        self
    }
}

impl Document {
    /// Build the tree from flat records, keeping the record order among
    /// siblings.
    pub fn from_records(
        title: impl Into<String>,
        records: Vec<SectionRecord>,
    ) -> Result<Self, ExportError> {
        let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut nodes: Vec<Option<Section>> = Vec::with_capacity(records.len());
        let mut children: Vec<Vec<usize>> = Vec::with_capacity(records.len());
        let mut roots = Vec::new();

        for record in records {
            if index.contains_key(&record.id) {
                return Err(ExportError::DuplicateAnchor { id: record.id });
            }

            let slot = nodes.len();
            match record.parent_id.as_deref() {
                None => {
                    if record.depth != 1 {
                        return Err(ExportError::MalformedTree {
                            id: record.id,
                            reason: format!("root section has depth {}", record.depth),
                        });
                    }
                    roots.push(slot);
                }
                Some(parent_id) => {
                    let Some(&parent) = index.get(parent_id) else {
                        return Err(ExportError::MalformedTree {
                            reason: format!("parent `{}` does not precede it", parent_id),
                            id: record.id,
                        });
                    };
                    let parent_depth = nodes[parent].as_ref().map_or(0, |p| p.depth);
                    if record.depth != parent_depth + 1 {
                        return Err(ExportError::MalformedTree {
                            reason: format!(
                                "depth {} under parent `{}` at depth {}",
                                record.depth, parent_id, parent_depth
                            ),
                            id: record.id,
                        });
                    }
                    children[parent].push(slot);
                }
            }

            index.insert(record.id.clone(), slot);
            children.push(Vec::new());
            nodes.push(Some(Section {
                id: record.id,
                title: record.title,
                depth: record.depth,
                description: record.description,
                hidden: record.hidden,
                body: record.body,
                children: Vec::new(),
            }));
        }

        fn assemble(slot: usize, nodes: &mut [Option<Section>], children: &[Vec<usize>]) -> Section {
            let kids = children[slot]
                .iter()
                .map(|&child| assemble(child, nodes, children))
                .collect();
            let mut section = nodes[slot].take().unwrap_or_else(|| Section::new("", "", 0));
            section.children = kids;
            section
        }

        let sections = roots
            .iter()
            .map(|&root| assemble(root, &mut nodes, &children))
            .collect();

        Document::new(title, sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_become_a_tree() {
        let doc = Document::from_records(
            "Guide",
            vec![
                SectionRecord::new("a", None, "A", 1),
                SectionRecord::new("a1", Some("a"), "A.1", 2),
                SectionRecord::new("b", None, "B", 1),
                SectionRecord::new("a2", Some("a"), "A.2", 2),
                SectionRecord::new("a2x", Some("a2"), "A.2.x", 3),
            ],
        )
        .unwrap();

        assert_eq!(doc.sections.len(), 2);
        let a = &doc.sections[0];
        let ids: Vec<&str> = a.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);
        assert_eq!(a.children[1].children[0].id, "a2x");
    }

    #[test]
    fn dangling_parent() {
        let err = Document::from_records(
            "Guide",
            vec![
                SectionRecord::new("a", None, "A", 1),
                SectionRecord::new("c", Some("missing"), "C", 2),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::MalformedTree { id, .. } if id == "c"));
    }

    #[test]
    fn parent_after_child_is_dangling() {
        let err = Document::from_records(
            "Guide",
            vec![
                SectionRecord::new("a1", Some("a"), "A.1", 2),
                SectionRecord::new("a", None, "A", 1),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::MalformedTree { .. }));
    }

    #[test]
    fn depth_mismatch() {
        let err = Document::from_records(
            "Guide",
            vec![
                SectionRecord::new("a", None, "A", 1),
                SectionRecord::new("a1", Some("a"), "A.1", 3),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::MalformedTree { id, .. } if id == "a1"));
    }

    #[test]
    fn duplicate_record_id() {
        let err = Document::from_records(
            "Guide",
            vec![
                SectionRecord::new("a", None, "A", 1),
                SectionRecord::new("a", None, "A again", 1),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::DuplicateAnchor { .. }));
    }
}

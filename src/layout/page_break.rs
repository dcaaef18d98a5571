//! # Page Break Decisions
//!
//! Logic for deciding when and how to break a block across pages. Every
//! block variant has exactly one rule:
//!
//! - Paragraphs and quotes split between styled runs, never inside one.
//! - Code blocks split between source lines; the continuation keeps the
//!   language tag.
//! - Tables split between rows and repeat the header row on every
//!   continuation.
//! - Lists split between items. An item's own text is indivisible but its
//!   nested list splits recursively by the same rule.
//! - Headings, image placeholders and rules never split.
//!
//! The splitter never truncates. When nothing fits it hands the whole block
//! back as the remainder; deciding that the block can never fit is the
//! layout engine's job.

use super::measure::Measurer;
use crate::model::{Block, ListBlock, ListItem, StyledRun};

/// Decide what to do when a node doesn't fit on the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place the entire node on the current page (it fits).
    Place,
    /// Move the entire node to the next page (unbreakable, or nothing fits).
    MoveToNextPage,
    /// Split the node: place some content here, continue on the next page.
    Split {
        /// How many units fit on the current page.
        items_on_current_page: usize,
    },
}

/// Given the remaining space on a page and a list of unit heights, decide
/// how to break. Any single unit is a valid fragment, so there is no
/// orphan or widow adjustment.
pub fn decide_break(remaining_height: f64, unit_heights: &[f64], is_breakable: bool) -> BreakDecision {
    let total: f64 = unit_heights.iter().sum();

    if total <= remaining_height {
        return BreakDecision::Place;
    }

    if !is_breakable {
        return BreakDecision::MoveToNextPage;
    }

    let mut running = 0.0;
    let mut fit_count = 0;
    for &h in unit_heights {
        if running + h > remaining_height {
            break;
        }
        running += h;
        fit_count += 1;
    }

    if fit_count == 0 {
        return BreakDecision::MoveToNextPage;
    }

    BreakDecision::Split {
        items_on_current_page: fit_count,
    }
}

/// Outcome of splitting one block against the space left on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// What goes on the current page.
    pub fits: Option<Block>,
    /// What carries over to the next page.
    pub remainder: Option<Block>,
}

impl Split {
    fn whole(block: &Block) -> Self {
        Self {
            fits: Some(block.clone()),
            remainder: None,
        }
    }

    fn deferred(block: &Block) -> Self {
        Self {
            fits: None,
            remainder: Some(block.clone()),
        }
    }
}

/// Splits blocks at their natural boundaries. A single line, row or item is
/// a valid fragment.
#[derive(Debug, Clone, Copy)]
pub struct BlockSplitter<'a> {
    measurer: Measurer<'a>,
}

impl<'a> BlockSplitter<'a> {
    pub fn new(measurer: Measurer<'a>) -> Self {
        Self { measurer }
    }

    /// Split `block` so that the first piece fits in `available_height`.
    pub fn split(&self, block: &Block, available_height: f64) -> Split {
        let m = &self.measurer;
        let typo = m.typo;
        match block {
            Block::Paragraph { runs } => self.split_runs(
                block,
                runs,
                (m.paragraph_width(), typo.body_leading, 0.0),
                available_height,
                |runs| Block::Paragraph { runs },
            ),
            Block::Quote { runs } => self.split_runs(
                block,
                runs,
                (m.quote_width(), typo.quote_leading, 2.0 * typo.quote_padding),
                available_height,
                |runs| Block::Quote { runs },
            ),
            Block::CodeBlock { language, lines } => {
                let heights: Vec<f64> = lines.iter().map(|l| m.code_line_height(l)).collect();
                let overhead = 2.0 * typo.code_padding;
                match decide_break(available_height - overhead, &heights, true) {
                    BreakDecision::Place if overhead <= available_height => Split::whole(block),
                    BreakDecision::Place | BreakDecision::MoveToNextPage => Split::deferred(block),
                    BreakDecision::Split {
                        items_on_current_page: k,
                    } => Split {
                        fits: Some(Block::CodeBlock {
                            language: language.clone(),
                            lines: lines[..k].to_vec(),
                        }),
                        remainder: Some(Block::CodeBlock {
                            language: language.clone(),
                            lines: lines[k..].to_vec(),
                        }),
                    },
                }
            }
            Block::Table { header_row, rows } => {
                let columns = Measurer::table_columns(header_row.as_ref(), rows);
                let header_height = header_row
                    .as_ref()
                    .map_or(0.0, |h| m.table_row_height(h, columns, true));
                let heights: Vec<f64> = rows
                    .iter()
                    .map(|r| m.table_row_height(r, columns, false))
                    .collect();
                match decide_break(available_height - header_height, &heights, true) {
                    BreakDecision::Place if header_height <= available_height => Split::whole(block),
                    BreakDecision::Place | BreakDecision::MoveToNextPage => Split::deferred(block),
                    BreakDecision::Split {
                        items_on_current_page: k,
                    } => Split {
                        fits: Some(Block::Table {
                            header_row: header_row.clone(),
                            rows: rows[..k].to_vec(),
                        }),
                        remainder: Some(Block::Table {
                            header_row: header_row.clone(),
                            rows: rows[k..].to_vec(),
                        }),
                    },
                }
            }
            Block::ListBlock(list) => {
                let (fits, remainder) = self.split_list(list, 0, available_height);
                Split {
                    fits: fits.map(Block::ListBlock),
                    remainder: remainder.map(Block::ListBlock),
                }
            }
            Block::Heading { .. } | Block::ImagePlaceholder { .. } | Block::Rule => {
                match decide_break(available_height, &[m.block_height(block)], false) {
                    BreakDecision::Place => Split::whole(block),
                    _ => Split::deferred(block),
                }
            }
        }
    }

    /// `metrics` is `(width, leading, overhead)` of the run container.
    fn split_runs(
        &self,
        block: &Block,
        runs: &[StyledRun],
        metrics: (f64, f64, f64),
        available_height: f64,
        rebuild: impl Fn(Vec<StyledRun>) -> Block,
    ) -> Split {
        let m = &self.measurer;
        let (width, leading, overhead) = metrics;
        let ends = m.run_end_heights(runs, width, leading);
        let total = ends.last().copied().unwrap_or(0.0);
        if total + overhead <= available_height {
            return Split::whole(block);
        }
        if overhead > available_height {
            return Split::deferred(block);
        }

        // run-end heights telescope into per-run increments
        let increments: Vec<f64> = ends
            .iter()
            .scan(0.0, |prev, &h| {
                let inc = h - *prev;
                *prev = h;
                Some(inc)
            })
            .collect();
        let mut k = match decide_break(available_height - overhead, &increments, true) {
            BreakDecision::Split {
                items_on_current_page,
            } => items_on_current_page,
            BreakDecision::Place | BreakDecision::MoveToNextPage => 0,
        };

        // A prefix set on its own can end a line earlier or later than the
        // run end inside the whole paragraph; the fragment is what gets placed.
        let fits = |k: usize| {
            m.run_line_count(&runs[..k], width) as f64 * leading + overhead <= available_height
        };
        if k == 0 && runs.len() > 1 && fits(1) {
            k = 1;
        }
        while k > 0 && !fits(k) {
            k -= 1;
        }

        if k == 0 {
            return Split::deferred(block);
        }
        Split {
            fits: Some(rebuild(runs[..k].to_vec())),
            remainder: Some(rebuild(runs[k..].to_vec())),
        }
    }

    fn split_list(
        &self,
        list: &ListBlock,
        level: usize,
        available_height: f64,
    ) -> (Option<ListBlock>, Option<ListBlock>) {
        if list.items.is_empty() {
            return (Some(list.clone()), None);
        }

        let m = &self.measurer;
        let heights: Vec<f64> = list
            .items
            .iter()
            .map(|item| m.list_item_height(item, level))
            .collect();

        let k = match decide_break(available_height, &heights, true) {
            BreakDecision::Place => return (Some(list.clone()), None),
            BreakDecision::MoveToNextPage => 0,
            BreakDecision::Split {
                items_on_current_page,
            } => items_on_current_page,
        };

        let used: f64 = heights[..k].iter().sum();
        let item = &list.items[k];

        // The first item that does not fit may still place its own text and
        // part of its nested list.
        if let Some(sub) = &item.sublist {
            let room = available_height - used - m.list_item_text_height(item, level);
            if room >= 0.0 {
                let (sub_fit, sub_rest) = self.split_list(sub, level + 1, room);
                let placed_something = sub_fit.is_some() || !item.continued;
                if let (true, Some(sub_rest)) = (placed_something, sub_rest) {
                    let mut fit_items = list.items[..k].to_vec();
                    fit_items.push(ListItem {
                        runs: item.runs.clone(),
                        sublist: sub_fit,
                        continued: item.continued,
                    });

                    let mut rest_items = vec![ListItem {
                        runs: Vec::new(),
                        sublist: Some(sub_rest),
                        continued: true,
                    }];
                    rest_items.extend_from_slice(&list.items[k + 1..]);

                    return (
                        Some(ListBlock {
                            ordered: list.ordered,
                            start: list.start,
                            items: fit_items,
                        }),
                        Some(ListBlock {
                            ordered: list.ordered,
                            start: list.start + k,
                            items: rest_items,
                        }),
                    );
                }
            }
        }

        if k == 0 {
            return (None, Some(list.clone()));
        }

        (
            Some(ListBlock {
                ordered: list.ordered,
                start: list.start,
                items: list.items[..k].to_vec(),
            }),
            Some(ListBlock {
                ordered: list.ordered,
                start: list.start + k,
                items: list.items[k..].to_vec(),
            }),
        )
    }
}

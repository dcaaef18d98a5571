//! Block measurement: how tall a block (or a piece of one) is when set in the
//! body column.

use crate::model::{Block, ListBlock, ListItem, StyledRun};
use crate::style::Typography;
use crate::text::{break_spans, break_text, span_end_line_counts, wrap_code_line, TextSpan};

/// Measures blocks against a fixed column width.
#[derive(Debug, Clone, Copy)]
pub struct Measurer<'a> {
    pub typo: &'a Typography,
    pub content_width: f64,
}

impl<'a> Measurer<'a> {
    pub fn new(typo: &'a Typography, content_width: f64) -> Self {
        Self {
            typo,
            content_width,
        }
    }

    fn spans<'r>(&self, runs: &'r [StyledRun]) -> Vec<TextSpan<'r>> {
        runs.iter()
            .map(|run| TextSpan {
                text: &run.text,
                font: self.typo.run_font(run),
            })
            .collect()
    }

    /// Number of lines `runs` occupy when flowed into `width`.
    pub fn run_line_count(&self, runs: &[StyledRun], width: f64) -> usize {
        break_spans(&self.spans(runs), self.typo.base_size, width).len()
    }

    /// Height reached at the end of every run when the whole paragraph is
    /// flowed once. Runs flow inline, so these are not sums of per-run
    /// heights. The last entry is the height of the whole paragraph; an
    /// earlier entry can be a line short of the prefix set on its own.
    pub fn run_end_heights(&self, runs: &[StyledRun], width: f64, leading: f64) -> Vec<f64> {
        span_end_line_counts(&self.spans(runs), self.typo.base_size, width)
            .into_iter()
            .map(|lines| lines as f64 * leading)
            .collect()
    }

    pub fn paragraph_width(&self) -> f64 {
        self.content_width
    }

    pub fn quote_width(&self) -> f64 {
        self.content_width - self.typo.quote_indent - 2.0 * self.typo.quote_padding
    }

    pub fn heading_height(&self, level: u8, text: &str) -> f64 {
        let style = self.typo.heading(level);
        let lines = break_text(text, style.font, style.font_size, self.content_width).len();
        lines.max(1) as f64 * style.leading
    }

    /// Plain italic paragraph under a section heading.
    pub fn description_height(&self, text: &str) -> f64 {
        let lines = break_text(text, self.typo.italic_font(), self.typo.base_size, self.content_width);
        lines.len() as f64 * self.typo.body_leading
    }

    pub fn code_width(&self) -> f64 {
        self.content_width - 2.0 * self.typo.code_indent - 2.0 * self.typo.code_padding
    }

    /// One source line, wrapped at character boundaries.
    pub fn code_line_height(&self, line: &str) -> f64 {
        let rows = wrap_code_line(line, self.typo.code_font(), self.typo.code_size, self.code_width());
        rows.len() as f64 * self.typo.code_leading
    }

    pub fn table_columns(header_row: Option<&Vec<String>>, rows: &[Vec<String>]) -> usize {
        rows.iter()
            .map(Vec::len)
            .chain(header_row.map(Vec::len))
            .max()
            .unwrap_or(0)
            .max(1)
    }

    pub fn table_row_height(&self, cells: &[String], columns: usize, header: bool) -> f64 {
        let typo = self.typo;
        let column_width = self.content_width / columns as f64 - 2.0 * typo.table_cell_padding_x;
        let size = if header {
            typo.table_header_size
        } else {
            typo.table_size
        };
        let lines = cells
            .iter()
            .map(|cell| break_text(cell, typo.table_font(header), size, column_width).len())
            .max()
            .unwrap_or(0)
            .max(1);
        let padding_bottom = if header {
            typo.table_header_padding_bottom
        } else {
            typo.table_row_padding
        };
        lines as f64 * typo.table_leading + typo.table_row_padding + padding_bottom
    }

    /// Width of item text in a list nested `level` deep (0 = outermost).
    pub fn list_text_width(&self, level: usize) -> f64 {
        self.content_width - self.typo.list_indent * (level + 1) as f64
    }

    /// Height of an item's own text. Continuation items draw no text.
    pub fn list_item_text_height(&self, item: &ListItem, level: usize) -> f64 {
        if item.continued {
            return 0.0;
        }
        let lines = self.run_line_count(&item.runs, self.list_text_width(level));
        lines.max(1) as f64 * self.typo.body_leading
    }

    pub fn list_item_height(&self, item: &ListItem, level: usize) -> f64 {
        self.list_item_text_height(item, level)
            + item
                .sublist
                .as_ref()
                .map_or(0.0, |sub| self.list_height(sub, level + 1))
    }

    pub fn list_height(&self, list: &ListBlock, level: usize) -> f64 {
        list.items.iter().map(|item| self.list_item_height(item, level)).sum()
    }

    /// Height of the first indivisible piece of a nested list.
    fn list_min_unit(&self, list: &ListBlock, level: usize) -> f64 {
        match list.items.first() {
            None => 0.0,
            Some(item) if item.continued => item
                .sublist
                .as_ref()
                .map_or(0.0, |sub| self.list_min_unit(sub, level + 1)),
            Some(item) => self.list_item_text_height(item, level),
        }
    }

    pub fn image_text(caption: &str) -> String {
        format!("[Image: {}]", caption)
    }

    /// Full height of a block, excluding the space around it.
    pub fn block_height(&self, block: &Block) -> f64 {
        let typo = self.typo;
        match block {
            Block::Heading { level, text } => self.heading_height(*level, text),
            Block::Paragraph { runs } => {
                self.run_line_count(runs, self.paragraph_width()) as f64 * typo.body_leading
            }
            Block::Quote { runs } => {
                self.run_line_count(runs, self.quote_width()) as f64 * typo.quote_leading
                    + 2.0 * typo.quote_padding
            }
            Block::CodeBlock { lines, .. } => {
                lines.iter().map(|l| self.code_line_height(l)).sum::<f64>() + 2.0 * typo.code_padding
            }
            Block::Table { header_row, rows } => {
                let columns = Self::table_columns(header_row.as_ref(), rows);
                header_row
                    .as_ref()
                    .map_or(0.0, |h| self.table_row_height(h, columns, true))
                    + rows
                        .iter()
                        .map(|r| self.table_row_height(r, columns, false))
                        .sum::<f64>()
            }
            Block::ListBlock(list) => self.list_height(list, 0),
            Block::ImagePlaceholder { caption } => {
                let text = Self::image_text(caption);
                let lines = break_text(&text, typo.body_font(), typo.base_size, self.content_width);
                lines.len().max(1) as f64 * typo.body_leading
            }
            Block::Rule => typo.rule_height,
        }
    }

    /// Height of the smallest piece the splitter can put on a page: the
    /// first run prefix, code line, header plus first row, list item text.
    pub fn min_unit_height(&self, block: &Block) -> f64 {
        let typo = self.typo;
        match block {
            Block::Paragraph { runs } => {
                self.run_line_count(&runs[..runs.len().min(1)], self.paragraph_width()) as f64
                    * typo.body_leading
            }
            Block::Quote { runs } => {
                self.run_line_count(&runs[..runs.len().min(1)], self.quote_width()) as f64
                    * typo.quote_leading
                    + 2.0 * typo.quote_padding
            }
            Block::CodeBlock { lines, .. } => {
                lines.first().map_or(0.0, |l| self.code_line_height(l)) + 2.0 * typo.code_padding
            }
            Block::Table { header_row, rows } => {
                let columns = Self::table_columns(header_row.as_ref(), rows);
                header_row
                    .as_ref()
                    .map_or(0.0, |h| self.table_row_height(h, columns, true))
                    + rows
                        .first()
                        .map_or(0.0, |r| self.table_row_height(r, columns, false))
            }
            Block::ListBlock(list) => self.list_min_unit(list, 0),
            Block::Heading { .. } | Block::ImagePlaceholder { .. } | Block::Rule => {
                self.block_height(block)
            }
        }
    }

    pub fn space_before(&self, block: &Block) -> f64 {
        match block {
            Block::Heading { level, .. } => self.typo.heading(*level).space_before,
            Block::Rule => self.typo.rule_space,
            _ => 0.0,
        }
    }

    pub fn space_after(&self, block: &Block) -> f64 {
        let typo = self.typo;
        match block {
            Block::Heading { level, .. } => typo.heading(*level).space_after,
            Block::Paragraph { .. } | Block::ImagePlaceholder { .. } => typo.paragraph_space_after,
            Block::Quote { .. } => typo.quote_space_after,
            Block::CodeBlock { .. } => typo.code_space_after,
            Block::Table { .. } => typo.table_space_after,
            Block::ListBlock(_) => typo.list_space_after,
            Block::Rule => typo.rule_space,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;

    fn typo() -> Typography {
        Typography::from_config(&ExportConfig::default())
    }

    fn runs_of(text: &str) -> Vec<StyledRun> {
        vec![StyledRun::plain(text)]
    }

    #[test]
    fn code_block_height_counts_lines_and_padding() {
        let typo = typo();
        let m = Measurer::new(&typo, 468.0);
        let block = Block::code(Some("rust"), &["a", "b", "c"]);
        assert_eq!(m.block_height(&block), 3.0 * 12.0 + 16.0);
        assert_eq!(m.min_unit_height(&block), 12.0 + 16.0);
    }

    #[test]
    fn long_code_line_wraps() {
        let typo = typo();
        let m = Measurer::new(&typo, 468.0);
        let long = "x".repeat(400);
        assert!(m.code_line_height(&long) > 12.0 * 4.0);
    }

    #[test]
    fn table_header_counts_in_min_unit() {
        let typo = typo();
        let m = Measurer::new(&typo, 468.0);
        let table = Block::table(Some(vec!["k", "v"]), vec![vec!["a", "1"], vec!["b", "2"]]);
        // header: 12 + 6 + 12, body row: 12 + 6 + 6
        assert_eq!(m.min_unit_height(&table), 30.0 + 24.0);
        assert_eq!(m.block_height(&table), 30.0 + 48.0);
    }

    #[test]
    fn paragraph_run_end_heights_grow() {
        let typo = typo();
        let m = Measurer::new(&typo, 100.0);
        let runs = vec![
            StyledRun::plain("A fairly long sentence that wraps. "),
            StyledRun::plain("Another one that wraps as well. "),
        ];
        let ends = m.run_end_heights(&runs, 100.0, 16.0);
        assert_eq!(ends.len(), 2);
        assert!(ends[0] < ends[1]);
        assert_eq!(*ends.last().unwrap(), m.block_height(&Block::Paragraph { runs }));
    }

    #[test]
    fn first_unit_of_a_long_paragraph_is_its_first_run() {
        let typo = typo();
        let m = Measurer::new(&typo, 468.0);
        let mut runs = vec![StyledRun::plain("one\ntwo\n")];
        runs.extend((0..5000).map(|i| StyledRun::plain(format!("run {i} "))));
        let paragraph = Block::Paragraph { runs };
        assert_eq!(m.min_unit_height(&paragraph), 2.0 * 16.0);
        assert_eq!(m.min_unit_height(&Block::Paragraph { runs: vec![] }), 0.0);
    }

    #[test]
    fn quote_has_its_own_spacing() {
        let typo = Typography {
            quote_space_after: 20.0,
            ..typo()
        };
        let m = Measurer::new(&typo, 468.0);
        assert_eq!(m.space_after(&Block::Quote { runs: runs_of("cited") }), 20.0);
        assert_eq!(m.space_after(&Block::code(None, &["x"])), typo.code_space_after);
    }

    #[test]
    fn nested_list_height() {
        let typo = typo();
        let m = Measurer::new(&typo, 468.0);
        let list = ListBlock::new(
            false,
            vec![
                ListItem::text("one").with_sublist(ListBlock::new(false, vec![ListItem::text("a")])),
                ListItem::text("two"),
            ],
        );
        assert_eq!(m.list_height(&list, 0), 3.0 * 16.0);
        assert_eq!(m.min_unit_height(&Block::ListBlock(list)), 16.0);
    }
}

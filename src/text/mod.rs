//! # Text Layout
//!
//! Line breaking and text measurement. Block heights are line counts times
//! leading, so everything the splitter decides rests on where these
//! functions wrap.
//!
//! Prose is broken at UAX#14 opportunities over the whole paragraph, so a
//! word that spans two styled runs (`**bold**,`) is never split at the run
//! boundary. Code is wrapped at character boundaries.

use crate::font::StandardFont;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A styled piece of text to measure: the text plus the face it is set in.
#[derive(Debug, Clone, Copy)]
pub struct TextSpan<'a> {
    pub text: &'a str,
    pub font: StandardFont,
}

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    /// The text on this line, trailing whitespace included.
    pub text: String,
    /// Width without trailing whitespace.
    pub width: f64,
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character position. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields byte offsets of the position AFTER the break
    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        let mut char_idx = 0;
        for (byte_idx, _) in text.char_indices() {
            map[byte_idx] = char_idx;
            char_idx += 1;
        }
        map[text.len()] = char_idx;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

/// One unbreakable stretch between two break opportunities.
struct Segment {
    start: usize,
    end: usize,
    /// Width including trailing whitespace.
    full: f64,
    /// Width without trailing whitespace.
    trimmed: f64,
    /// A mandatory break follows this segment.
    hard_break: bool,
}

fn segments(widths: &[f64], chars: &[char], opps: &[Option<BreakOpportunity>]) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=chars.len() {
        let boundary = i == chars.len() || opps[i].is_some();
        if !boundary {
            continue;
        }
        let full: f64 = widths[start..i].iter().sum();
        let mut trim_end = i;
        while trim_end > start && chars[trim_end - 1].is_whitespace() {
            trim_end -= 1;
        }
        let trimmed: f64 = widths[start..trim_end].iter().sum();
        let hard_break = i < chars.len() && opps[i] == Some(BreakOpportunity::Mandatory);
        out.push(Segment {
            start,
            end: i,
            full,
            trimmed,
            hard_break,
        });
        start = i;
    }
    out
}

fn make_line(chars: &[char], widths: &[f64], start: usize, end: usize) -> BrokenLine {
    let text: String = chars[start..end]
        .iter()
        .filter(|c| **c != '\n' && **c != '\r')
        .collect();
    let mut trim_end = end;
    while trim_end > start && chars[trim_end - 1].is_whitespace() {
        trim_end -= 1;
    }
    BrokenLine {
        text,
        width: widths[start..trim_end].iter().sum(),
    }
}

/// Spans concatenated into one string, with per-char advances.
struct Flowed {
    chars: Vec<char>,
    widths: Vec<f64>,
    /// Char offset at which each span ends.
    span_ends: Vec<usize>,
    /// `(start, end)` char range of every line.
    lines: Vec<(usize, usize)>,
}

fn flow(spans: &[TextSpan<'_>], font_size: f64, max_width: f64) -> Flowed {
    let mut text = String::new();
    let mut widths = Vec::new();
    let mut span_ends = Vec::with_capacity(spans.len());
    for span in spans {
        text.push_str(span.text);
        widths.extend(span.text.chars().map(|ch| span.font.char_width(ch, font_size)));
        span_ends.push(widths.len());
    }

    let chars: Vec<char> = text.chars().collect();
    let opps = compute_break_opportunities(&text);
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_end = 0;
    let mut line_width = 0.0;

    for seg in segments(&widths, &chars, &opps) {
        let occupied = line_end > line_start;
        if occupied && line_width + seg.trimmed > max_width {
            lines.push((line_start, line_end));
            line_start = seg.start;
            line_width = 0.0;
        }

        if line_width == 0.0 && seg.trimmed > max_width {
            // Emergency break inside an overlong word
            let mut piece_start = seg.start;
            let mut piece_width = 0.0;
            for i in seg.start..seg.end {
                if i > piece_start && piece_width + widths[i] > max_width {
                    lines.push((piece_start, i));
                    piece_start = i;
                    piece_width = 0.0;
                }
                piece_width += widths[i];
            }
            line_start = piece_start;
            line_width = piece_width;
        } else {
            line_width += seg.full;
        }
        line_end = seg.end;

        if seg.hard_break {
            lines.push((line_start, line_end));
            line_start = seg.end;
            line_end = seg.end;
            line_width = 0.0;
        }
    }

    if line_end > line_start {
        lines.push((line_start, line_end));
    }

    Flowed {
        chars,
        widths,
        span_ends,
        lines,
    }
}

/// Break a sequence of styled spans into lines no wider than `max_width`.
///
/// A single word wider than the line is broken between characters. Empty
/// input yields no lines.
pub fn break_spans(spans: &[TextSpan<'_>], font_size: f64, max_width: f64) -> Vec<BrokenLine> {
    let flowed = flow(spans, font_size, max_width);
    flowed
        .lines
        .iter()
        .map(|&(start, end)| make_line(&flowed.chars, &flowed.widths, start, end))
        .collect()
}

/// For every span, the number of lines occupied by the text up to the end
/// of that span when all spans are broken together, in a single pass.
///
/// Breaking a prefix on its own can differ on its last line, where a word
/// runs on into the next span.
pub fn span_end_line_counts(spans: &[TextSpan<'_>], font_size: f64, max_width: f64) -> Vec<usize> {
    let flowed = flow(spans, font_size, max_width);
    let mut counts = Vec::with_capacity(spans.len());
    let mut started = 0;
    for &end in &flowed.span_ends {
        while started < flowed.lines.len() && flowed.lines[started].0 < end {
            started += 1;
        }
        counts.push(started);
    }
    counts
}

/// Break plain text set in a single face.
pub fn break_text(text: &str, font: StandardFont, font_size: f64, max_width: f64) -> Vec<BrokenLine> {
    break_spans(&[TextSpan { text, font }], font_size, max_width)
}

/// Wrap one line of code at character boundaries. Always yields at least
/// one line, so an empty source line still occupies a row.
pub fn wrap_code_line(line: &str, font: StandardFont, font_size: f64, max_width: f64) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut width = 0.0;
    for ch in line.chars() {
        let w = if ch == '\t' {
            font.char_width(' ', font_size) * 4.0
        } else {
            font.char_width(ch, font_size)
        };
        if !current.is_empty() && width + w > max_width {
            rows.push(std::mem::take(&mut current));
            width = 0.0;
        }
        current.push(ch);
        width += w;
    }
    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELV: StandardFont = StandardFont::Helvetica;

    #[test]
    fn test_single_line() {
        let lines = break_text("Hello", HELV, 12.0, 500.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello");
    }

    #[test]
    fn test_line_break_at_space() {
        // the line must hold the wider of the two words
        let width = HELV.measure("Greetings", 12.0) + 1.0;
        assert!(HELV.measure("world", 12.0) < width);
        let lines = break_text("Greetings world", HELV, 12.0, width);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Greetings ");
        assert_eq!(lines[1].text, "world");
    }

    #[test]
    fn test_trailing_space_not_counted() {
        let width = HELV.measure("Greetings", 12.0);
        let lines = break_text("Greetings world", HELV, 12.0, width);
        assert_eq!(lines.len(), 2);
        assert!((lines[0].width - width).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_newline() {
        let lines = break_text("one\ntwo", HELV, 12.0, 500.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "one");
        assert_eq!(lines[1].text, "two");
    }

    #[test]
    fn test_empty_string() {
        assert!(break_text("", HELV, 12.0, 100.0).is_empty());
    }

    #[test]
    fn test_overlong_word_is_split() {
        let lines = break_text("Supercalifragilistic", HELV, 12.0, 40.0);
        assert!(lines.len() > 1);
        let rejoined: String = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(rejoined, "Supercalifragilistic");
        assert!(lines.iter().all(|l| l.width <= 40.0));
    }

    #[test]
    fn test_no_break_between_runs_inside_word() {
        let spans = [
            TextSpan {
                text: "bold",
                font: StandardFont::HelveticaBold,
            },
            TextSpan {
                text: ", then plain",
                font: HELV,
            },
        ];
        let narrow = StandardFont::HelveticaBold.measure("bold", 12.0) + HELV.measure(",", 12.0) + 1.0;
        let lines = break_spans(&spans, 12.0, narrow);
        // the comma belongs to the bold word even though it is in another run
        assert_eq!(lines[0].text, "bold, ");
        assert_eq!(lines[1].text, "then ");
    }

    #[test]
    fn test_span_end_line_counts() {
        let spans = [
            TextSpan {
                text: "one\n",
                font: HELV,
            },
            TextSpan {
                text: "two\nthree ",
                font: HELV,
            },
            TextSpan {
                text: "four",
                font: HELV,
            },
        ];
        assert_eq!(span_end_line_counts(&spans, 12.0, 500.0), vec![1, 3, 3]);
        assert_eq!(span_end_line_counts(&[], 12.0, 500.0), Vec::<usize>::new());
    }

    #[test]
    fn test_span_end_line_counts_match_full_break() {
        let text = "Many words that wrap over several lines in a narrow column. ";
        let spans: Vec<TextSpan<'_>> = (0..40).map(|_| TextSpan { text, font: HELV }).collect();
        let counts = span_end_line_counts(&spans, 12.0, 120.0);
        assert_eq!(counts.len(), 40);
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*counts.last().unwrap(), break_spans(&spans, 12.0, 120.0).len());
    }

    #[test]
    fn test_code_wraps_by_chars() {
        let font = StandardFont::Courier;
        // 10 chars of 6pt each per 60pt row
        let rows = wrap_code_line(&"x".repeat(25), font, 10.0, 60.0);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 10);
        assert_eq!(rows[2].len(), 5);
    }

    #[test]
    fn test_empty_code_line_takes_a_row() {
        assert_eq!(wrap_code_line("", StandardFont::Courier, 9.0, 100.0), vec![String::new()]);
    }
}

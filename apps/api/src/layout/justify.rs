//! Fully justified paragraph layout.
//!
//! Greedy word-wrap (same packing rule as a typewriter: take words until the next
//! one overflows), then every closed line except the last is stretched so both
//! edges align. All values are in the unit of the supplied [`TextMeasure`].

use serde::Serialize;

use crate::layout::font_metrics::TextMeasure;

/// A word with its horizontal offset from the paragraph's left edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedWord {
    pub text: String,
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JustifiedLine {
    pub words: Vec<PlacedWord>,
    /// Offset from the paragraph's first baseline (`index * line_height`).
    pub y: f32,
    /// Gap inserted between adjacent words on this line.
    pub gap: f32,
    /// False for the last line and single-word lines, which stay ragged-right.
    pub justified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JustifiedParagraph {
    pub lines: Vec<JustifiedLine>,
}

impl JustifiedParagraph {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Vertical space consumed, for advancing a cursor past the paragraph.
    pub fn height(&self, line_height: f32) -> f32 {
        self.line_count() as f32 * line_height
    }
}

struct Measured<'a> {
    text: &'a str,
    width: f32,
}

/// Lays out `text` into justified lines no wider than `max_width`.
///
/// The first line starts `first_line_indent` in from the left edge and the
/// indent counts against its width. A word wider than `max_width` still gets
/// a line of its own; words are never split.
pub fn justify_paragraph(
    text: &str,
    measure: &impl TextMeasure,
    max_width: f32,
    line_height: f32,
    first_line_indent: f32,
) -> JustifiedParagraph {
    let space_width = measure.space_width();
    let words: Vec<Measured> = text
        .split_whitespace()
        .map(|w| Measured {
            text: w,
            width: measure.measure(w),
        })
        .collect();
    if words.is_empty() {
        return JustifiedParagraph::default();
    }

    // Greedy packing.
    let mut packed: Vec<Vec<Measured>> = Vec::new();
    let mut current: Vec<Measured> = Vec::new();
    let mut current_width = 0.0_f32;

    for word in words {
        let lead = if current.is_empty() {
            if packed.is_empty() {
                first_line_indent
            } else {
                0.0
            }
        } else {
            space_width
        };

        if current.is_empty() || current_width + lead + word.width <= max_width {
            current_width += lead + word.width;
            current.push(word);
        } else {
            packed.push(std::mem::take(&mut current));
            current_width = word.width;
            current.push(word);
        }
    }
    packed.push(current);

    // Spacing.
    let last = packed.len() - 1;
    let lines = packed
        .into_iter()
        .enumerate()
        .map(|(i, words)| {
            let indent = if i == 0 { first_line_indent } else { 0.0 };
            let words_width: f32 = words.iter().map(|w| w.width).sum();
            let gaps = words.len().saturating_sub(1);
            let justified = i != last && gaps > 0;
            let gap = if justified {
                (max_width - indent - words_width) / gaps as f32
            } else {
                space_width
            };

            let mut x = indent;
            let placed = words
                .into_iter()
                .map(|w| {
                    let word = PlacedWord {
                        text: w.text.to_string(),
                        x,
                        width: w.width,
                    };
                    x += w.width + gap;
                    word
                })
                .collect();

            JustifiedLine {
                words: placed,
                y: i as f32 * line_height,
                gap,
                justified,
            }
        })
        .collect();

    JustifiedParagraph { lines }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::HELVETICA;
    use proptest::prelude::*;

    /// One unit per character, so widths are easy to reason about.
    struct Mono;

    impl TextMeasure for Mono {
        fn measure(&self, s: &str) -> f32 {
            s.chars().count() as f32
        }
    }

    fn texts(line: &JustifiedLine) -> Vec<&str> {
        line.words.iter().map(|w| w.text.as_str()).collect()
    }

    fn right_edge(line: &JustifiedLine) -> f32 {
        let w = line.words.last().unwrap();
        w.x + w.width
    }

    #[test]
    fn test_empty_text_yields_no_lines() {
        assert_eq!(justify_paragraph("", &Mono, 10.0, 1.0, 0.0).line_count(), 0);
        assert_eq!(justify_paragraph("  \n\t ", &Mono, 10.0, 1.0, 0.0).line_count(), 0);
    }

    #[test]
    fn test_exact_fit_is_one_unstretched_line() {
        // "aaa bbb cc" = 3 + 1 + 3 + 1 + 2 = 10
        let p = justify_paragraph("aaa bbb cc", &Mono, 10.0, 1.0, 0.0);
        assert_eq!(p.line_count(), 1);
        let line = &p.lines[0];
        assert!(!line.justified);
        assert_eq!(line.gap, 1.0);
        assert_eq!(right_edge(line), 10.0);
    }

    #[test]
    fn test_wrap_and_justify_non_final_lines() {
        let p = justify_paragraph("aa bb cc dd ee", &Mono, 9.0, 2.0, 0.0);
        // line 1: "aa bb cc" = 8, adding " dd" would be 11
        assert_eq!(p.line_count(), 2);
        assert_eq!(texts(&p.lines[0]), ["aa", "bb", "cc"]);
        assert_eq!(texts(&p.lines[1]), ["dd", "ee"]);

        let first = &p.lines[0];
        assert!(first.justified);
        assert!((first.gap - 1.5).abs() < 1e-6);
        assert!((right_edge(first) - 9.0).abs() < 1e-5);

        let second = &p.lines[1];
        assert!(!second.justified);
        assert_eq!(second.gap, 1.0);
        assert_eq!(second.y, 2.0);
    }

    #[test]
    fn test_first_line_indent_counts_against_width() {
        let p = justify_paragraph("aaa bbb ccc", &Mono, 8.0, 1.0, 2.0);
        // line 1: indent 2 + "aaa" 3 + " bbb" 4 = 9 > 8, so "aaa" alone
        assert_eq!(texts(&p.lines[0]), ["aaa"]);
        assert_eq!(p.lines[0].words[0].x, 2.0);
        // later lines start at 0 with no indent
        assert_eq!(texts(&p.lines[1]), ["bbb", "ccc"]);
        assert_eq!(p.lines[1].words[0].x, 0.0);
    }

    #[test]
    fn test_indented_first_line_fills_to_max_width() {
        let p = justify_paragraph("aa bb cc dd", &Mono, 9.0, 1.0, 1.0);
        // 1 + 2 + 3 + 3 = 9 fits; " dd" overflows
        let first = &p.lines[0];
        assert_eq!(texts(first), ["aa", "bb", "cc"]);
        assert!(first.justified);
        assert!((right_edge(first) - 9.0).abs() < 1e-5);
        // (9 - 1 - 6) / 2
        assert!((first.gap - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_word_lines_are_not_stretched() {
        let p = justify_paragraph("aaaaaa bbbbbb", &Mono, 8.0, 1.0, 0.0);
        assert_eq!(p.line_count(), 2);
        assert!(!p.lines[0].justified);
        assert_eq!(p.lines[0].gap, 1.0);
    }

    #[test]
    fn test_overwide_word_gets_its_own_line() {
        let p = justify_paragraph("supercalifragilistic ok", &Mono, 5.0, 1.0, 1.0);
        assert_eq!(p.line_count(), 2);
        assert_eq!(texts(&p.lines[0]), ["supercalifragilistic"]);
        assert_eq!(texts(&p.lines[1]), ["ok"]);
    }

    #[test]
    fn test_height_advances_by_line_height() {
        let p = justify_paragraph("a b c d e f", &Mono, 3.0, 0.5, 0.0);
        assert_eq!(p.line_count(), 3);
        assert!((p.height(0.5) - 1.5).abs() < 1e-6);
        assert_eq!(p.lines[2].y, 1.0);
    }

    #[test]
    fn test_with_helvetica_metrics() {
        let font = HELVETICA.at_size(12.0);
        let text = "Declaramos para fins de apresentação à Receita Federal do Brasil que a \
                    senhora MARIA DA SILVA portador do 111.222.333-44 é beneficiária titular";
        let max_width = 476.22;
        let p = justify_paragraph(text, &font, max_width, 14.17, 28.35);
        assert!(p.line_count() >= 2);
        for line in &p.lines[..p.line_count() - 1] {
            assert!((right_edge(line) - max_width).abs() < 1e-2);
        }
    }

    proptest! {
        #[test]
        fn non_final_lines_fill_exactly(
            words in proptest::collection::vec("[a-z]{1,8}", 1..40),
            max_width in 10.0f32..40.0,
            indent in 0.0f32..4.0,
        ) {
            let text = words.join(" ");
            let p = justify_paragraph(&text, &Mono, max_width, 1.0, indent);
            let total: usize = p.lines.iter().map(|l| l.words.len()).sum();
            prop_assert_eq!(total, words.len());

            for (i, line) in p.lines.iter().enumerate() {
                let indent = if i == 0 { indent } else { 0.0 };
                if line.justified {
                    let words_width: f32 = line.words.iter().map(|w| w.width).sum();
                    let injected = line.gap * (line.words.len() - 1) as f32;
                    prop_assert!((words_width + injected - (max_width - indent)).abs() < 1e-3);
                } else {
                    prop_assert!(i == p.lines.len() - 1 || line.words.len() == 1);
                }
                prop_assert!(!line.words.is_empty());
            }
        }
    }
}

//! Visual line reconstruction from text spans.
//!
//! Spans are clustered into lines by the vertical position of their top edge,
//! then ordered left to right and joined with gap-aware spacing. The same
//! lines feed both the plain-text assembler and the heading detector, so the
//! two views of a page always agree on what a "line" is.

use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::reader::TextSpan;

/// A reconstructed visual line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Line text with inter-span spacing applied
    pub text: String,
    /// Union of the span boxes
    pub bbox: Rect,
    /// Whether at least `bold_ratio` of the spans are bold
    pub bold: bool,
    /// Number of spans merged into the line
    pub span_count: usize,
    /// Text runs separated by gaps wider than `same_line_x_gap`
    pub columns: Vec<String>,
}

impl Line {
    /// Line text with column breaks rendered as two spaces.
    ///
    /// Tabular rows keep their shape this way in the plain text, where the
    /// question formatter splits them on runs of two or more spaces.
    pub fn column_text(&self) -> String {
        self.columns.join("  ")
    }
}

struct LineBuilder<'a> {
    running_y0: f32,
    bbox: Rect,
    spans: Vec<&'a TextSpan>,
}

const NO_SPACE_AFTER: [&str; 6] = [" ", "-", "\u{201c}", "\"", "(", "/"];
const NO_SPACE_BEFORE: [&str; 5] = [",", ".", ")", ":", ";"];

fn round_tenth(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// Build lines from the spans of one page, sorted top to bottom then left to right.
///
/// # Examples
///
/// ```
/// use icsara::config::LayoutConfig;
/// use icsara::geometry::Rect;
/// use icsara::layout::build_lines;
/// use icsara::reader::TextSpan;
///
/// let spans = vec![
///     TextSpan::new("mundo", Rect::new(40.0, 100.5, 70.0, 110.0), false),
///     TextSpan::new("Hola", Rect::new(10.0, 100.0, 35.0, 110.0), false),
/// ];
/// let lines = build_lines(&spans, &LayoutConfig::default());
/// assert_eq!(lines.len(), 1);
/// assert_eq!(lines[0].text, "Hola mundo");
/// ```
pub fn build_lines(spans: &[TextSpan], config: &LayoutConfig) -> Vec<Line> {
    let mut sorted: Vec<&TextSpan> = spans.iter().filter(|s| !s.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| {
        round_tenth(a.bbox.y0)
            .total_cmp(&round_tenth(b.bbox.y0))
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut builders: Vec<LineBuilder> = Vec::new();
    for span in sorted {
        match builders
            .iter_mut()
            .find(|b| (b.running_y0 - span.bbox.y0).abs() <= config.same_line_y)
        {
            Some(builder) => {
                builder.running_y0 = (builder.running_y0 + span.bbox.y0) / 2.0;
                builder.bbox = builder.bbox.union(&span.bbox);
                builder.spans.push(span);
            },
            None => builders.push(LineBuilder {
                running_y0: span.bbox.y0,
                bbox: span.bbox,
                spans: vec![span],
            }),
        }
    }

    let mut lines: Vec<Line> = builders
        .into_iter()
        .map(|mut builder| {
            builder.spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            let bold_count = builder.spans.iter().filter(|s| s.bold).count();
            let span_count = builder.spans.len();
            let columns = join_spans(&builder.spans, config.same_line_x_gap);
            Line {
                text: columns.join(" "),
                bbox: builder.bbox,
                bold: bold_count as f32 / span_count.max(1) as f32 >= config.bold_ratio,
                span_count,
                columns,
            }
        })
        .collect();

    lines.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    lines
}

fn join_spans(spans: &[&TextSpan], wide_gap: f32) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    let mut out = String::new();
    let mut prev: Option<&TextSpan> = None;
    for span in spans {
        let text = span.text.trim();
        if let Some(p) = prev {
            if span.bbox.x0 - p.bbox.x1 > wide_gap {
                columns.push(std::mem::take(&mut out));
            } else if !NO_SPACE_AFTER.iter().any(|s| out.ends_with(s))
                && !NO_SPACE_BEFORE.iter().any(|s| text.starts_with(s))
            {
                out.push(' ');
            }
        }
        out.push_str(text);
        prev = Some(span);
    }
    columns.push(out);
    columns
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x0: f32, y0: f32, x1: f32, bold: bool) -> TextSpan {
        TextSpan::new(text, Rect::new(x0, y0, x1, y0 + 10.0), bold)
    }

    #[test]
    fn test_spans_on_two_lines() {
        let spans = vec![
            span("segunda", 10.0, 130.0, 60.0, false),
            span("primera", 10.0, 100.0, 60.0, false),
        ];
        let lines = build_lines(&spans, &LayoutConfig::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "primera");
        assert_eq!(lines[1].text, "segunda");
    }

    #[test]
    fn test_punctuation_spacing() {
        let spans = vec![
            span("Hola", 10.0, 100.0, 30.0, false),
            span(",", 30.0, 100.0, 32.0, false),
            span("(", 35.0, 100.0, 37.0, false),
            span("texto", 37.0, 100.0, 60.0, false),
            span(")", 60.0, 100.0, 62.0, false),
        ];
        let lines = build_lines(&spans, &LayoutConfig::default());
        assert_eq!(lines[0].text, "Hola, (texto)");
    }

    #[test]
    fn test_wide_gap_forces_space() {
        let spans = vec![
            span("Tabla", 10.0, 100.0, 40.0, false),
            span(".", 80.0, 100.0, 82.0, false),
        ];
        let lines = build_lines(&spans, &LayoutConfig::default());
        assert_eq!(lines[0].text, "Tabla .");
        assert_eq!(lines[0].column_text(), "Tabla  .");
    }

    #[test]
    fn test_bold_majority() {
        let spans = vec![
            span("I.", 10.0, 50.0, 20.0, true),
            span("Medio", 22.0, 50.0, 50.0, true),
            span("Ambiente", 52.0, 50.0, 90.0, false),
        ];
        let lines = build_lines(&spans, &LayoutConfig::default());
        assert!(lines[0].bold); // 2/3 >= 0.6

        let spans = vec![
            span("uno", 10.0, 50.0, 20.0, true),
            span("dos", 22.0, 50.0, 50.0, false),
        ];
        let lines = build_lines(&spans, &LayoutConfig::default());
        assert!(!lines[0].bold); // 1/2 < 0.6
    }

    #[test]
    fn test_slightly_offset_spans_share_a_line() {
        let spans = vec![
            span("a", 10.0, 100.0, 15.0, false),
            span("b", 20.0, 102.0, 25.0, false),
        ];
        let lines = build_lines(&spans, &LayoutConfig::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].bbox, Rect::new(10.0, 100.0, 25.0, 112.0));
        assert_eq!(lines[0].span_count, 2);
    }

    #[test]
    fn test_blank_spans_ignored() {
        let spans = vec![span("   ", 10.0, 100.0, 15.0, true)];
        assert!(build_lines(&spans, &LayoutConfig::default()).is_empty());
    }
}

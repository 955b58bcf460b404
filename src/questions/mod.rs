//! Question segmentation of the stitched document text.
//!
//! Boundaries are lines that begin with `<digits>. `. Candidates go through two
//! filters before the text is sliced: a per-candidate false-start check
//! (signature dates, bare numbers, leading zeros) and a monotonicity filter
//! over the accepted sequence.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::config::SegmenterConfig;
use crate::text::format_question;

lazy_static! {
    static ref BOUNDARY: Regex = Regex::new(r"(?m)^\s*(\d{1,4})\.\s+").unwrap();
}

const SPANISH_LETTERS: &str = "ÁÉÍÓÚÜÑáéíóúüñ";

/// A question start found in the stitched text.
///
/// Distinct from [`crate::layout::LayoutQuestionStart`]: this one only knows a
/// byte offset, never a page position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuestionStart {
    /// Parsed question number
    pub number: u32,
    /// The digits as written
    pub digits: String,
    /// Byte offset of the first digit
    pub offset: usize,
}

/// A segmented question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Question number
    pub number: u32,
    /// Formatted body, without the number prefix
    pub body: String,
}

fn line_bounds(text: &str, pos: usize) -> (usize, usize) {
    let start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let end = text[pos..].find('\n').map_or(text.len(), |i| pos + i);
    (start, end)
}

fn next_nonempty_line(text: &str, from: usize) -> &str {
    text.get(from..)
        .unwrap_or("")
        .split('\n')
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

fn starts_with_letter(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || SPANISH_LETTERS.contains(c))
}

/// Splits stitched text into numbered questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionSegmenter {
    config: SegmenterConfig,
}

impl QuestionSegmenter {
    /// Create a segmenter with the given settings.
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    fn in_year_range(&self, start: &TextQuestionStart) -> bool {
        start.digits.len() == 4
            && (self.config.year_min..=self.config.year_max).contains(&start.number)
    }

    /// Every line start matching the boundary pattern.
    pub fn candidates(&self, text: &str) -> Vec<TextQuestionStart> {
        BOUNDARY
            .captures_iter(text)
            .filter_map(|caps| {
                let digits = caps.get(1)?;
                Some(TextQuestionStart {
                    number: digits.as_str().parse().ok()?,
                    digits: digits.as_str().to_string(),
                    offset: digits.start(),
                })
            })
            .collect()
    }

    /// Whether a candidate is noise rather than a question start.
    ///
    /// - a 4-digit year on a line carrying signature tokens
    /// - a bare `<digits>.` line that is a year, has a leading zero, or is
    ///   followed by a line that does not start with a letter
    pub fn is_false_start(&self, text: &str, start: &TextQuestionStart) -> bool {
        let (line_start, line_end) = line_bounds(text, start.offset);
        let line = text[line_start..line_end].trim();

        if self.in_year_range(start) {
            let lower = line.to_lowercase();
            if self
                .config
                .signature_tokens
                .iter()
                .any(|t| lower.contains(t.as_str()))
            {
                return true;
            }
        }

        let bare = line
            .strip_prefix(start.digits.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|rest| rest.trim().is_empty());
        if !bare {
            return false;
        }
        if self.in_year_range(start) {
            return true;
        }
        if start.digits.len() >= 2 && start.digits.starts_with('0') {
            return true;
        }
        let next = next_nonempty_line(text, line_end + 1);
        !next.is_empty() && !starts_with_letter(next)
    }

    /// Drop candidates that roll back too far or repeat a kept number.
    ///
    /// A candidate is dropped when it is at least `rollback_tolerance` below
    /// the last kept number; any other candidate is kept and becomes the new
    /// reference. Repeated numbers are dropped so each number keys one
    /// question.
    pub fn apply_monotonic_filter(&self, starts: Vec<TextQuestionStart>) -> Vec<TextQuestionStart> {
        let mut kept: Vec<TextQuestionStart> = Vec::with_capacity(starts.len());
        let mut seen: HashSet<u32> = HashSet::new();
        for start in starts {
            if let Some(last) = kept.last() {
                if start.number < last.number
                    && last.number - start.number >= self.config.rollback_tolerance
                {
                    log::debug!(
                        "Dropping question {} after {} (rollback)",
                        start.number,
                        last.number
                    );
                    continue;
                }
            }
            if !seen.insert(start.number) {
                log::debug!("Dropping repeated question number {}", start.number);
                continue;
            }
            kept.push(start);
        }
        kept
    }

    /// Accepted question starts, in text order.
    pub fn boundaries(&self, text: &str) -> Vec<TextQuestionStart> {
        let accepted: Vec<TextQuestionStart> = self
            .candidates(text)
            .into_iter()
            .filter(|start| {
                let rejected = self.is_false_start(text, start);
                if rejected {
                    log::debug!("Rejecting false question start {}", start.digits);
                }
                !rejected
            })
            .collect();
        self.apply_monotonic_filter(accepted)
    }

    /// Split the text into questions with formatted bodies.
    pub fn segment(&self, text: &str) -> Vec<Question> {
        let starts = self.boundaries(text);
        starts
            .iter()
            .enumerate()
            .map(|(i, start)| {
                let end = starts.get(i + 1).map_or(text.len(), |next| next.offset);
                let raw = text[start.offset..end].trim();
                let raw = raw
                    .strip_prefix(start.digits.as_str())
                    .and_then(|rest| rest.strip_prefix('.'))
                    .unwrap_or(raw)
                    .trim_start();
                Question {
                    number: start.number,
                    body: format_question(raw),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(segmenter: &QuestionSegmenter, text: &str) -> Vec<u32> {
        segmenter.boundaries(text).iter().map(|s| s.number).collect()
    }

    #[test]
    fn test_basic_segmentation() {
        let text = "Introducción\n1. ¿Cuál es el alcance?\nDetalle.\n2. Segunda pregunta.";
        let questions = QuestionSegmenter::default().segment(text);
        assert_eq!(
            questions,
            vec![
                Question {
                    number: 1,
                    body: "¿Cuál es el alcance? Detalle.".to_string()
                },
                Question {
                    number: 2,
                    body: "Segunda pregunta.".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_rollback_dropped_and_later_increase_kept() {
        let text = "45. Pregunta cuarenta y cinco\n12. nota al pie\n46. Siguiente";
        let segmenter = QuestionSegmenter::default();
        assert_eq!(numbers(&segmenter, text), vec![45, 46]);
        let questions = segmenter.segment(text);
        assert_eq!(questions[0].body, "Pregunta cuarenta y cinco 12. nota al pie");
    }

    #[test]
    fn test_small_rollback_tolerated() {
        let text = "10. a\n8. b\n9. c";
        assert_eq!(numbers(&QuestionSegmenter::default(), text), vec![10, 8, 9]);
    }

    #[test]
    fn test_repeated_number_dropped() {
        let text = "3. a\n4. b\n4. c";
        assert_eq!(numbers(&QuestionSegmenter::default(), text), vec![3, 4]);
    }

    #[test]
    fn test_year_with_signature_tokens_rejected() {
        let text = "1. Pregunta\n2024. Fecha: 01-02-2024 UTC-03:00";
        assert_eq!(numbers(&QuestionSegmenter::default(), text), vec![1]);
    }

    #[test]
    fn test_bare_number_rules() {
        let segmenter = QuestionSegmenter::default();
        // bare year
        assert_eq!(numbers(&segmenter, "1. a\n2023.\nTexto"), vec![1]);
        // leading zero
        assert_eq!(numbers(&segmenter, "1. a\n05.\nTexto"), vec![1]);
        // followed by a non-letter line
        assert_eq!(numbers(&segmenter, "1. a\n2.\n(ver tabla)"), vec![1]);
        // followed by a letter line
        assert_eq!(numbers(&segmenter, "1. a\n2.\n\nÉsta es la pregunta"), vec![1, 2]);
        // last line of the text
        assert_eq!(numbers(&segmenter, "1. a\n2.\n"), vec![1, 2]);
    }

    #[test]
    fn test_boundary_needs_space_after_period() {
        let text = "1. uno\n3.5 millones\n2. dos";
        assert_eq!(numbers(&QuestionSegmenter::default(), text), vec![1, 2]);
    }

    #[test]
    fn test_rollback_tolerance_is_configurable() {
        let config = SegmenterConfig {
            rollback_tolerance: 50,
            ..Default::default()
        };
        let text = "45. a\n12. b";
        assert_eq!(numbers(&QuestionSegmenter::new(config), text), vec![45, 12]);
    }

    #[test]
    fn test_no_candidates() {
        assert!(QuestionSegmenter::default().segment("Solo texto").is_empty());
    }
}

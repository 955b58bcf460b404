//! Plain-text assembly across pages.
//!
//! Page text is rebuilt from visual lines, skipping any line that overlaps a
//! detected region so exported tables and figures are not duplicated in the
//! text. Running headers and footers are removed by frequency across the whole
//! document before the pages are stitched together.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::config::TextConfig;
use crate::layout::Line;
use crate::regions::Region;

lazy_static! {
    static ref PAGE_NUMBER: Regex = Regex::new(r"^\d{1,4}$").unwrap();
}

/// Assembles the stitched document text from per-page lines.
#[derive(Debug, Clone, Default)]
pub struct TextAssembler {
    config: TextConfig,
}

impl TextAssembler {
    /// Create an assembler with the given settings.
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    /// Text lines of one page, with empty lines at paragraph gaps.
    ///
    /// Lines intersecting any of `regions` are dropped.
    pub fn page_lines(&self, lines: &[Line], regions: &[Region]) -> Vec<String> {
        let mut out = Vec::with_capacity(lines.len());
        let mut prev: Option<&Line> = None;
        for line in lines {
            if regions.iter().any(|r| line.bbox.intersects(&r.bbox)) {
                continue;
            }
            if let Some(p) = prev {
                let gap = line.bbox.y0 - p.bbox.y1;
                if gap > self.config.paragraph_gap_ratio * p.bbox.height() {
                    out.push(String::new());
                }
            }
            out.push(line.column_text());
            prev = Some(line);
        }
        out
    }

    /// Lines frequent enough across pages to be running headers or footers.
    ///
    /// A trimmed line qualifies when it appears on at least
    /// `max(frequent_line_floor, ceil(frequent_line_ratio * pages))` distinct
    /// pages.
    pub fn frequent_lines(&self, pages: &[Vec<String>]) -> HashSet<String> {
        let threshold = frequency_threshold(
            pages.len(),
            self.config.frequent_line_ratio,
            self.config.frequent_line_floor,
        );

        let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        for lines in pages {
            let distinct: HashSet<&str> = lines
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect();
            for line in distinct {
                *counts.entry(line).or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .filter(|&(_, count)| count >= threshold)
            .map(|(line, _)| line.to_string())
            .collect()
    }

    /// Remove frequent lines, boilerplate phrases and lone page numbers.
    ///
    /// Empty lines are kept; every other line is trimmed.
    pub fn clean_page(&self, lines: &[String], frequent: &HashSet<String>) -> Vec<String> {
        let phrases: Vec<String> = self
            .config
            .noise_phrases
            .iter()
            .map(|p| p.to_lowercase())
            .collect();

        lines
            .iter()
            .filter_map(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return Some(String::new());
                }
                if frequent.contains(trimmed) || PAGE_NUMBER.is_match(trimmed) {
                    return None;
                }
                let lower = trimmed.to_lowercase();
                if phrases.iter().any(|p| lower.contains(p.as_str())) {
                    return None;
                }
                Some(trimmed.to_string())
            })
            .collect()
    }

    /// Clean every page and stitch the result into one text.
    pub fn assemble(&self, pages: &[Vec<String>]) -> String {
        let frequent = self.frequent_lines(pages);
        log::debug!("{} running header/footer line(s) suppressed", frequent.len());
        let cleaned: Vec<Vec<String>> = pages
            .iter()
            .map(|lines| self.clean_page(lines, &frequent))
            .collect();
        stitch_pages(&cleaned)
    }
}

// Products like 0.6 * 10 may land just above the integer they denote.
const THRESHOLD_EPSILON: f64 = 1e-9;

fn frequency_threshold(pages: usize, ratio: f64, floor: usize) -> usize {
    let scaled = (ratio * pages as f64 - THRESHOLD_EPSILON).ceil().max(0.0) as usize;
    scaled.max(floor)
}

/// Join cleaned pages into one text.
///
/// A page that ends in a hyphen continues the word on the next page: the
/// hyphen is dropped and no line break is added. Empty pages are skipped.
pub fn stitch_pages(pages: &[Vec<String>]) -> String {
    let mut text = String::new();
    for lines in pages {
        let page_text = lines.join("\n");
        let page_text = page_text.trim();
        if page_text.is_empty() {
            continue;
        }
        if text.is_empty() {
            text.push_str(page_text);
            continue;
        }
        let prev_len = text.trim_end().len();
        text.truncate(prev_len);
        if text.ends_with('-') {
            text.pop();
        } else {
            text.push('\n');
        }
        text.push_str(page_text);
    }
    text
}

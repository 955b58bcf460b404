//! Chapter and hinge detection from typography and position.
//!
//! Bold lines are merged into runs. A run shaped like `IV. Title` is a
//! chapter. Any other run is a hinge only when a question start sits just
//! below it, either on the same page or, for a run near the bottom margin, at
//! the top of the following page. Runs matching neither rule are dropped.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::LayoutConfig;
use crate::geometry::{Rect, SortKey};
use crate::layout::lines::Line;
use crate::regions::Region;

lazy_static! {
    static ref CHAPTER_TITLE: Regex =
        Regex::new(r"(?i)^\s*([IVXLCDM]{1,10})\.\s+(.+?)\s*$").unwrap();
    static ref QUESTION_START: Regex = Regex::new(r"^\s*(\d{1,4})\.\s+").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r"\s{2,}").unwrap();
}

/// One or more adjacent bold lines treated as a single heading candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct BoldRun {
    /// Joined text of the lines
    pub text: String,
    /// Union of the line boxes
    pub bbox: Rect,
}

/// A question start found on the page layout.
///
/// Layout starts anchor hinges and artifacts; the question text itself always
/// comes from the stitched plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutQuestionStart {
    /// Question number
    pub number: u32,
    /// 1-based page number
    pub page: usize,
    /// Bounds of the line that starts the question
    pub bbox: Rect,
}

impl LayoutQuestionStart {
    /// Global document position.
    pub fn sort_key(&self) -> SortKey {
        SortKey::new(self.page, self.bbox.y0)
    }
}

/// A chapter or hinge heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Heading text
    pub text: String,
    /// 1-based page number
    pub page: usize,
    /// Heading bounds
    pub bbox: Rect,
}

impl Heading {
    /// Global document position.
    pub fn sort_key(&self) -> SortKey {
        SortKey::new(self.page, self.bbox.y0)
    }
}

/// Layout facts of one page gathered during the per-page pass.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// 1-based page number
    pub page: usize,
    /// Page height in points
    pub height: f32,
    /// Merged bold runs
    pub bold_runs: Vec<BoldRun>,
    /// Question starts, sorted top to bottom
    pub question_starts: Vec<LayoutQuestionStart>,
}

/// Headings classified on one page.
#[derive(Debug, Clone, Default)]
pub struct PageHeadings {
    /// Chapter headings
    pub chapters: Vec<Heading>,
    /// Hinge headings
    pub hinges: Vec<Heading>,
}

fn overlaps_any(bbox: &Rect, regions: &[Region]) -> bool {
    regions.iter().any(|r| bbox.intersects(&r.bbox))
}

/// Whether the text has the `<roman>. <title>` chapter shape.
pub fn is_chapter_title(text: &str) -> bool {
    CHAPTER_TITLE.is_match(text)
}

/// Merge bold lines into runs.
///
/// A line continues the current run when it sits on the same visual line to
/// the right of the run's start, or directly below the run within
/// `bold_merge_y_gap` and left-aligned within `bold_merge_x_tolerance`.
pub fn merge_bold_lines(lines: &[Line], config: &LayoutConfig) -> Vec<BoldRun> {
    let mut bold: Vec<&Line> = lines
        .iter()
        .filter(|l| l.bold && !l.text.is_empty())
        .collect();
    bold.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut runs: Vec<BoldRun> = Vec::new();
    let mut current: Option<BoldRun> = None;
    for line in bold {
        current = Some(match current.take() {
            None => BoldRun {
                text: line.text.clone(),
                bbox: line.bbox,
            },
            Some(mut run) => {
                let dy = line.bbox.y0 - run.bbox.y1;
                let same_line = (line.bbox.y0 - run.bbox.y0).abs() <= config.same_line_y
                    && line.bbox.x0 >= run.bbox.x0;
                let next_line = (0.0..=config.bold_merge_y_gap).contains(&dy)
                    && (line.bbox.x0 - run.bbox.x0).abs() <= config.bold_merge_x_tolerance;
                if same_line || next_line {
                    run.text = format!("{} {}", run.text, line.text).trim().to_string();
                    run.bbox = run.bbox.union(&line.bbox);
                    run
                } else {
                    runs.push(run);
                    BoldRun {
                        text: line.text.clone(),
                        bbox: line.bbox,
                    }
                }
            },
        });
    }
    runs.extend(current);

    for run in &mut runs {
        run.text = MULTI_SPACE.replace_all(&run.text, " ").trim().to_string();
    }
    runs
}

/// Find lines that start with `<digits>. ` outside every region.
pub fn detect_question_starts(lines: &[Line], regions: &[Region], page: usize) -> Vec<LayoutQuestionStart> {
    let mut starts: Vec<LayoutQuestionStart> = lines
        .iter()
        .filter(|l| !overlaps_any(&l.bbox, regions))
        .filter_map(|l| {
            let caps = QUESTION_START.captures(&l.text)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some(LayoutQuestionStart {
                number,
                page,
                bbox: l.bbox,
            })
        })
        .collect();
    starts.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    starts
}

/// Gather the layout facts of one page.
pub fn analyze_page(
    page: usize,
    height: f32,
    lines: &[Line],
    regions: &[Region],
    config: &LayoutConfig,
) -> PageLayout {
    PageLayout {
        page,
        height,
        bold_runs: merge_bold_lines(lines, config),
        question_starts: detect_question_starts(lines, regions, page),
    }
}

/// Classify the bold runs of a page into chapters and hinges.
///
/// `next` is consulted only for runs within `bottom_page_margin` of the page
/// bottom, and only when it is the immediately following page; a hinge whose
/// question lies further away is not emitted.
pub fn classify_headings(
    layout: &PageLayout,
    next: Option<&PageLayout>,
    regions: &[Region],
    config: &LayoutConfig,
) -> PageHeadings {
    let next = next.filter(|n| n.page == layout.page + 1);
    let mut headings = PageHeadings::default();

    for run in &layout.bold_runs {
        if overlaps_any(&run.bbox, regions) {
            continue;
        }
        let text = run.text.trim();
        let heading = Heading {
            text: text.to_string(),
            page: layout.page,
            bbox: run.bbox,
        };

        if is_chapter_title(text) {
            headings.chapters.push(heading);
            continue;
        }

        let bottom = run.bbox.y1;
        let mut anchored = false;
        for start in &layout.question_starts {
            if start.bbox.y0 < bottom {
                continue;
            }
            anchored = start.bbox.y0 - bottom <= config.max_hinge_to_question_gap;
            break;
        }

        if !anchored && layout.height - bottom <= config.bottom_page_margin {
            if let Some(next) = next {
                anchored = next
                    .question_starts
                    .iter()
                    .any(|s| s.bbox.y0 <= config.next_page_search_window);
            }
        }

        if anchored {
            headings.hinges.push(heading);
        } else {
            log::debug!("Page {}: discarding bold run {:?}", layout.page, text);
        }
    }
    headings
}

/// Keep layout question starts whose numbers never decrease in document order.
pub fn filter_by_continuity(starts: &[LayoutQuestionStart]) -> Vec<LayoutQuestionStart> {
    let mut sorted: Vec<&LayoutQuestionStart> = starts.iter().collect();
    sorted.sort_by_key(|s| s.sort_key());

    let mut kept: Vec<LayoutQuestionStart> = Vec::with_capacity(sorted.len());
    for start in sorted {
        if kept.last().map_or(true, |last| start.number >= last.number) {
            kept.push(start.clone());
        }
    }
    kept
}

//! Layout analysis of a page.
//!
//! - Visual line reconstruction shared by every consumer of page text
//! - Bold-run merging and chapter/hinge classification
//! - Layout question starts used as anchors for hinges and artifacts

pub mod headings;
pub mod lines;

// Re-export main types
pub use headings::{
    analyze_page, classify_headings, detect_question_starts, filter_by_continuity,
    is_chapter_title, merge_bold_lines, BoldRun, Heading, LayoutQuestionStart, PageHeadings,
    PageLayout,
};
pub use lines::{build_lines, Line};

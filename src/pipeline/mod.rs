//! End-to-end extraction.
//!
//! ```text
//! PDF file
//!     ↓
//! [PageSource] (spans, drawings, image placements per page)
//!     ↓  phase 1, page by page
//! regions ─ text lines ─ bold runs + layout question starts
//!     ↓  phase 2, whole document
//! stitched text → questions
//! headings → hierarchy
//! regions + question index → artifacts (→ PNG crops)
//!     ↓
//! questions.json, questions.txt, full_text.txt, hierarchy.json
//! ```
//!
//! Phase 2 needs every page of phase 1: frequent-line suppression, question
//! numbering and cross-page hinges all look across page boundaries.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::artifacts::{associate, export_artifacts, QuestionIndex};
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::hierarchy::Hierarchy;
use crate::layout::{analyze_page, build_lines, classify_headings, filter_by_continuity, PageLayout};
use crate::output::{assemble_records, write_outputs};
use crate::questions::QuestionSegmenter;
use crate::reader::{bind_pdfium, PageSource, PdfiumSource};
use crate::regions::{detect_regions, Region, RegionKind};
use crate::text::TextAssembler;

/// Counts reported by an extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    /// Pages read
    pub pages: usize,
    /// Chapters in the hierarchy
    pub chapters: usize,
    /// Hinges in the hierarchy
    pub hinges: usize,
    /// Question records written
    pub questions: usize,
    /// Table regions detected
    pub tables: usize,
    /// Figure regions detected
    pub figures: usize,
    /// All regions detected
    pub total_detections: usize,
    /// Directory holding the outputs
    pub output_dir: PathBuf,
}

struct PageAnalysis {
    regions: Vec<Region>,
    text_lines: Vec<String>,
    layout: PageLayout,
}

/// Extract a PDF with the default configuration.
pub fn extract(pdf_path: &Path, output_dir: &Path, include_exports: bool) -> Result<ExtractionSummary> {
    extract_with_config(pdf_path, output_dir, include_exports, &ExtractionConfig::default())
}

/// Extract a PDF through PDFium.
///
/// A missing input fails with [`Error::InputNotFound`] before the output
/// directory is touched.
pub fn extract_with_config(
    pdf_path: &Path,
    output_dir: &Path,
    include_exports: bool,
    config: &ExtractionConfig,
) -> Result<ExtractionSummary> {
    if !pdf_path.exists() {
        return Err(Error::InputNotFound(pdf_path.to_path_buf()));
    }
    config.validate()?;

    let pdfium = bind_pdfium(config.reader.pdfium_library_dir.as_deref())?;
    let source = PdfiumSource::open(&pdfium, pdf_path)?;
    log::info!("Opened {} ({} page(s))", pdf_path.display(), source.page_count());
    extract_from_source(&source, output_dir, include_exports, config)
}

fn analyze<S: PageSource + ?Sized>(
    source: &S,
    index: usize,
    assembler: &TextAssembler,
    config: &ExtractionConfig,
) -> Result<PageAnalysis> {
    let page = source.read_page(index)?;
    let regions = detect_regions(&page, &config.geometry);
    let lines = build_lines(&page.spans, &config.layout);
    let text_lines = assembler.page_lines(&lines, &regions);
    let layout = analyze_page(page.number, page.height, &lines, &regions, &config.layout);
    Ok(PageAnalysis {
        regions,
        text_lines,
        layout,
    })
}

/// Run the full extraction over any page source.
pub fn extract_from_source<S: PageSource + ?Sized>(
    source: &S,
    output_dir: &Path,
    include_exports: bool,
    config: &ExtractionConfig,
) -> Result<ExtractionSummary> {
    let started = Instant::now();
    let assembler = TextAssembler::new(config.text.clone());

    // Phase 1
    let pages = (0..source.page_count())
        .map(|index| analyze(source, index, &assembler, config))
        .collect::<Result<Vec<_>>>()?;
    log::info!("Read {} page(s)", pages.len());

    // Phase 2: text
    let page_texts: Vec<Vec<String>> = pages.iter().map(|p| p.text_lines.clone()).collect();
    let full_text = assembler.assemble(&page_texts);
    let questions = QuestionSegmenter::new(config.segmenter.clone()).segment(&full_text);
    log::info!("Segmented {} question(s)", questions.len());

    // Phase 2: layout
    let mut chapters = Vec::new();
    let mut hinges = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        let next = pages.get(i + 1).map(|p| &p.layout);
        let headings = classify_headings(&page.layout, next, &page.regions, &config.layout);
        chapters.extend(headings.chapters);
        hinges.extend(headings.hinges);
    }
    let layout_starts: Vec<_> = pages
        .iter()
        .flat_map(|p| p.layout.question_starts.iter().cloned())
        .collect();
    let layout_starts = filter_by_continuity(&layout_starts);
    let hierarchy = Hierarchy::build(&chapters, &hinges, &layout_starts);
    log::info!(
        "Hierarchy: {} chapter(s), {} hinge(s)",
        hierarchy.chapters.len(),
        hierarchy.hinge_count()
    );

    // Phase 2: artifacts
    let regions: Vec<Region> = pages.iter().flat_map(|p| p.regions.iter().copied()).collect();
    let index = QuestionIndex::new(&layout_starts);
    log::debug!("Indexed {} layout question start(s)", index.len());
    let artifacts = associate(&regions, &index);
    if include_exports {
        export_artifacts(
            source,
            &artifacts,
            &output_dir.join(&config.export.dir_name),
            config.export.dpi,
        )?;
    }

    let records = assemble_records(&questions, &hierarchy.lookup(), &artifacts, &hierarchy.hinge_texts());
    write_outputs(output_dir, &full_text, &records, &hierarchy)?;

    let tables = regions.iter().filter(|r| r.kind == RegionKind::Table).count();
    let summary = ExtractionSummary {
        pages: pages.len(),
        chapters: hierarchy.chapters.len(),
        hinges: hierarchy.hinge_count(),
        questions: records.len(),
        tables,
        figures: regions.len() - tables,
        total_detections: regions.len(),
        output_dir: output_dir.to_path_buf(),
    };
    log::info!(
        "Extraction finished in {:.2?}: {} question(s), {} table(s), {} figure(s)",
        started.elapsed(),
        summary.questions,
        summary.tables,
        summary.figures
    );
    Ok(summary)
}

//! Tunable thresholds for the extraction pipeline.
//!
//! Every heuristic constant lives here instead of inline in the detectors. The
//! defaults are the values the engine was tuned with on real ICSARA documents.
//! All structs deserialize with `#[serde(default)]`, so a JSON config file only
//! needs to name the fields it overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Vector table and raster figure detection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Maximum thickness of a drawn rectangle to count as a rule
    pub thin_max: f32,
    /// Maximum off-axis extent of a stroked segment to count as a rule
    pub line_axis_tolerance: f32,
    /// Minimum length of a rule
    pub min_line_length: f32,
    /// Minimum number of horizontal rules on a page for a table candidate
    pub min_horizontal_lines: usize,
    /// Minimum number of vertical rules on a page for a table candidate
    pub min_vertical_lines: usize,
    /// Proximity gap for merging rules
    pub merge_gap: f32,
    /// Minimum area of a table region (pt²)
    pub min_table_area: f32,
    /// Minimum area of a figure (pt²)
    pub min_figure_area: f32,
    /// Proximity gap for merging image placements
    pub figure_merge_gap: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            thin_max: 1.2,
            line_axis_tolerance: 1.0,
            min_line_length: 25.0,
            min_horizontal_lines: 6,
            min_vertical_lines: 4,
            merge_gap: 12.0,
            min_table_area: 15_000.0,
            min_figure_area: 8_000.0,
            figure_merge_gap: 10.0,
        }
    }
}

/// Plain-text assembly settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Fraction of pages a line must appear on to be a running header/footer
    pub frequent_line_ratio: f64,
    /// Lower bound on the page count for the frequent-line filter
    pub frequent_line_floor: usize,
    /// Boilerplate phrases removed wherever they appear in a line (case-insensitive)
    pub noise_phrases: Vec<String>,
    /// Vertical gap, as a multiple of the previous line height, that starts a new paragraph
    pub paragraph_gap_ratio: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            frequent_line_ratio: 0.60,
            frequent_line_floor: 2,
            noise_phrases: [
                "Para validar las firmas de este documento",
                "sea.gob.cl/validar",
                "validar las firmas",
                "https://validador.sea.gob.cl/validar",
                "Firmado Digitalmente",
                "sellodigital.sea.gob.cl",
                "Razón:",
                "Razon:",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            paragraph_gap_ratio: 1.0,
        }
    }
}

/// Question boundary detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// A candidate this far below the last kept number is dropped
    pub rollback_tolerance: u32,
    /// Smallest number treated as a year
    pub year_min: u32,
    /// Largest number treated as a year
    pub year_max: u32,
    /// Lowercase tokens that mark a digital-signature line
    pub signature_tokens: Vec<String>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            rollback_tolerance: 5,
            year_min: 1900,
            year_max: 2100,
            signature_tokens: [
                "firmado digitalmente",
                "sellodigital",
                "utc",
                "fecha:",
                "razón",
                "razon",
                "lugar:",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Line building and heading classification tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Maximum y0 difference for two spans on the same line
    pub same_line_y: f32,
    /// Horizontal gap above which spans are always separated by a space
    pub same_line_x_gap: f32,
    /// Fraction of bold spans for a line to be bold
    pub bold_ratio: f32,
    /// Maximum vertical gap between bold lines of one run
    pub bold_merge_y_gap: f32,
    /// Maximum left-edge misalignment between bold lines of one run
    pub bold_merge_x_tolerance: f32,
    /// Maximum gap from a hinge's bottom edge to the question start below it
    pub max_hinge_to_question_gap: f32,
    /// Distance from the page bottom within which a hinge may resolve on the next page
    pub bottom_page_margin: f32,
    /// Top-of-page window searched on the next page
    pub next_page_search_window: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            same_line_y: 2.5,
            same_line_x_gap: 22.0,
            bold_ratio: 0.6,
            bold_merge_y_gap: 6.0,
            bold_merge_x_tolerance: 24.0,
            max_hinge_to_question_gap: 55.0,
            bottom_page_margin: 120.0,
            next_page_search_window: 250.0,
        }
    }
}

/// PNG export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Render resolution for crops
    pub dpi: u32,
    /// Directory (inside the output directory) receiving the crops
    pub dir_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            dir_name: "exports".to_string(),
        }
    }
}

/// PDF backend settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Directory holding the PDFium shared library, tried before `./` and the system path
    pub pdfium_library_dir: Option<PathBuf>,
}

/// Complete extraction configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Table/figure detection
    pub geometry: GeometryConfig,
    /// Plain-text assembly
    pub text: TextConfig,
    /// Question segmentation
    pub segmenter: SegmenterConfig,
    /// Layout structure detection
    pub layout: LayoutConfig,
    /// PNG export
    pub export: ExportConfig,
    /// PDF backend
    pub reader: ReaderConfig,
}

impl ExtractionConfig {
    /// Create a configuration with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a (possibly partial) configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no heuristic can work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.text.frequent_line_ratio) {
            return Err(Error::Config(format!(
                "frequent_line_ratio must be within [0, 1], got {}",
                self.text.frequent_line_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.layout.bold_ratio) {
            return Err(Error::Config(format!(
                "bold_ratio must be within [0, 1], got {}",
                self.layout.bold_ratio
            )));
        }
        if self.export.dpi == 0 {
            return Err(Error::Config("export dpi must be positive".to_string()));
        }
        if self.export.dir_name.trim().is_empty() {
            return Err(Error::Config("export dir_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Replace the geometry thresholds.
    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    /// Replace the text assembly settings.
    pub fn with_text(mut self, text: TextConfig) -> Self {
        self.text = text;
        self
    }

    /// Replace the segmenter settings.
    pub fn with_segmenter(mut self, segmenter: SegmenterConfig) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Replace the layout tolerances.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set the crop render resolution.
    pub fn with_export_dpi(mut self, dpi: u32) -> Self {
        self.export.dpi = dpi;
        self
    }

    /// Set the directory searched first for the PDFium library.
    pub fn with_pdfium_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reader.pdfium_library_dir = Some(dir.into());
        self
    }
}

/// Topic classifier weights and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum score for a topic to be reported
    pub min_score: f64,
    /// Score added per keyword found in the chapter title
    pub chapter_weight: f64,
    /// Score added per keyword found in the hinge
    pub hinge_weight: f64,
    /// Score added per keyword found in the body
    pub text_weight: f64,
    /// Topics within this fraction of the top score are also primary
    pub multi_primary_ratio: f64,
    /// Maximum number of secondary topics reported
    pub max_secondary: usize,
    /// Maximum number of keyword matches reported
    pub max_keyword_matches: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_score: 2.0,
            chapter_weight: 3.0,
            hinge_weight: 5.0,
            text_weight: 1.0,
            multi_primary_ratio: 0.80,
            max_secondary: 3,
            max_keyword_matches: 10,
        }
    }
}

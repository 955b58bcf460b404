#![warn(missing_docs)]

//! # ICSARA
//!
//! Structure inference for ICSARA documents: the observation reports
//! Chilean environmental reviewers issue during an environmental impact
//! assessment. A report is a long PDF of numbered questions grouped under
//! Roman-numbered chapters and bold "hinge" subheadings, interleaved with
//! tables and figures.
//!
//! ## Features
//!
//! - **Question segmentation** from the stitched document text, rejecting
//!   years, signature lines and bare numbers that only look like boundaries
//! - **Hierarchy inference** of chapter → hinge → question from bold runs
//!   and question positions, including hinges that end a page
//! - **Table and figure detection** from vector strokes and image
//!   placements, each tied to the question it appears under
//! - **PNG export** of detected regions through PDFium
//! - **Topic classification** of extracted questions against a keyword
//!   taxonomy
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::path::Path;
//!
//! # fn main() -> icsara::Result<()> {
//! let summary = icsara::extract(Path::new("icsara.pdf"), Path::new("out"), true)?;
//! println!("{} questions", summary.questions);
//!
//! let classified = icsara::classify(&Path::new("out").join("questions.json"), Path::new("out"))?;
//! println!("{} classified", classified.classified);
//! # Ok(())
//! # }
//! ```
//!
//! Any [`reader::PageSource`] can stand in for PDFium through
//! [`extract_from_source`].

pub mod artifacts;
pub mod classify;
pub mod config;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod questions;
pub mod reader;
pub mod regions;
pub mod text;

pub use classify::{classify, ClassificationSummary};
pub use config::{ClassifierConfig, ExtractionConfig};
pub use error::{Error, Result};
pub use pipeline::{extract, extract_from_source, extract_with_config, ExtractionSummary};

//! PDFium-backed page reader and region renderer.
//!
//! Text objects become [`TextSpan`]s, path objects become the lines and
//! rectangles of their segments and image objects become image placements.
//! PDFium reports coordinates bottom-up; they are flipped to top-down page
//! space here so no other module sees PDF user-space coordinates.

use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

use super::{is_bold_font, path_drawings, Drawing, PageSource, PathOperation, RawPage, TextSpan};
use crate::error::{Error, Result};
use crate::geometry::Rect;

impl From<PdfiumError> for Error {
    fn from(err: PdfiumError) -> Self {
        Error::Backend(format!("{:?}", err))
    }
}

/// Bind to the PDFium shared library.
///
/// Searches, in order: `library_dir` (if given), the current directory, and
/// the system library path.
pub fn bind_pdfium(library_dir: Option<&Path>) -> Result<Pdfium> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = library_dir {
        candidates.push(dir.to_path_buf());
    }
    candidates.push(PathBuf::from("./"));

    for dir in &candidates {
        match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
            Ok(bindings) => {
                log::debug!("Bound PDFium from {}", dir.display());
                return Ok(Pdfium::new(bindings));
            },
            Err(e) => log::debug!("PDFium not loadable from {}: {:?}", dir.display(), e),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| Error::DocumentOpen(format!("failed to load the PDFium library: {:?}", e)))
}

/// A document opened through PDFium.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumSource<'a> {
    /// Open a PDF file.
    ///
    /// A missing file is [`Error::InputNotFound`]; anything PDFium refuses to
    /// load is [`Error::DocumentOpen`].
    pub fn open(pdfium: &'a Pdfium, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| Error::DocumentOpen(format!("{}: {:?}", path.display(), e)))?;
        Ok(Self { document })
    }
}

fn page_index(index: usize) -> Result<PdfPageIndex> {
    PdfPageIndex::try_from(index)
        .map_err(|_| Error::Backend(format!("page index {} out of range", index)))
}

fn font_weight_value(weight: PdfFontWeight) -> u32 {
    #[allow(unreachable_patterns)]
    match weight {
        PdfFontWeight::Weight100 => 100,
        PdfFontWeight::Weight200 => 200,
        PdfFontWeight::Weight300 => 300,
        PdfFontWeight::Weight400Normal => 400,
        PdfFontWeight::Weight500 => 500,
        PdfFontWeight::Weight600 => 600,
        PdfFontWeight::Weight700Bold => 700,
        PdfFontWeight::Weight800 => 800,
        PdfFontWeight::Weight900 => 900,
        PdfFontWeight::Custom(value) => value,
        _ => 400,
    }
}

/// Path segments in page user space, with the object's matrix applied.
fn path_operations(path: &PdfPagePathObject) -> Vec<PathOperation> {
    let segments = path.segments();
    let segments = match path.matrix() {
        Ok(matrix) => segments.transform(matrix),
        Err(_) => segments.raw(),
    };

    let mut operations = Vec::with_capacity(segments.len() as usize);
    for index in 0..segments.len() {
        let segment = match segments.get(index) {
            Ok(segment) => segment,
            Err(_) => continue,
        };
        let (x, y) = segment.point();
        let (x, y) = (x.value, y.value);
        match segment.segment_type() {
            PdfPathSegmentType::MoveTo => operations.push(PathOperation::MoveTo(x, y)),
            PdfPathSegmentType::LineTo => operations.push(PathOperation::LineTo(x, y)),
            PdfPathSegmentType::BezierTo => operations.push(PathOperation::CurveTo(x, y)),
            PdfPathSegmentType::Unknown => continue,
        }
        if segment.is_close() {
            operations.push(PathOperation::ClosePath);
        }
    }
    operations
}

impl PageSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn read_page(&self, index: usize) -> Result<RawPage> {
        let page = self.document.pages().get(page_index(index)?)?;
        let width = page.width().value;
        let height = page.height().value;
        let mut raw = RawPage::new(index + 1, width, height);

        for object in page.objects().iter() {
            let bounds = match object.bounds() {
                Ok(bounds) => bounds,
                Err(e) => {
                    log::warn!("Page {}: skipping object without bounds: {:?}", index + 1, e);
                    continue;
                },
            };
            let bbox = Rect::new(
                bounds.left().value,
                height - bounds.top().value,
                bounds.right().value,
                height - bounds.bottom().value,
            );

            match object.object_type() {
                PdfPageObjectType::Text => {
                    if let Some(text_object) = object.as_text_object() {
                        let text = text_object.text();
                        if text.trim().is_empty() {
                            continue;
                        }
                        let font = text_object.font();
                        let weight = font.weight().ok().map(font_weight_value);
                        let bold = is_bold_font(&font.name(), weight, font.is_bold_reenforced());
                        raw.spans.push(TextSpan::new(text, bbox, bold));
                    }
                },
                PdfPageObjectType::Path => {
                    let drawings = object
                        .as_path_object()
                        .map(|path| path_drawings(&path_operations(path), height))
                        .unwrap_or_default();
                    if drawings.is_empty() {
                        raw.drawings.push(Drawing::Rect(bbox));
                    } else {
                        raw.drawings.extend(drawings);
                    }
                },
                PdfPageObjectType::Image => raw.images.push(bbox),
                _ => {},
            }
        }

        log::debug!(
            "Page {}: {} spans, {} drawings, {} images",
            raw.number,
            raw.spans.len(),
            raw.drawings.len(),
            raw.images.len()
        );
        Ok(raw)
    }

    fn render_region(&self, index: usize, bbox: &Rect, dpi: u32) -> Result<RgbaImage> {
        let page = self.document.pages().get(page_index(index)?)?;
        let scale = dpi as f32 / 72.0;
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&config)?;

        let full_width = bitmap.width() as u32;
        let full_height = bitmap.height() as u32;
        let full = RgbaImage::from_raw(full_width, full_height, bitmap.as_rgba_bytes())
            .ok_or_else(|| Error::Backend(format!("page {}: bitmap size mismatch", index + 1)))?;

        let (x, y, w, h) = crop_window(bbox, scale, full_width, full_height);
        Ok(image::imageops::crop_imm(&full, x, y, w, h).to_image())
    }
}

/// Pixel window of a page-space box rendered at `scale`, clamped to the bitmap.
fn crop_window(bbox: &Rect, scale: f32, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let x0 = ((bbox.x0 * scale).floor().max(0.0) as u32).min(width.saturating_sub(1));
    let y0 = ((bbox.y0 * scale).floor().max(0.0) as u32).min(height.saturating_sub(1));
    let x1 = ((bbox.x1 * scale).ceil().max(0.0) as u32).min(width);
    let y1 = ((bbox.y1 * scale).ceil().max(0.0) as u32).min(height);
    (x0, y0, x1.saturating_sub(x0).max(1), y1.saturating_sub(y0).max(1))
}

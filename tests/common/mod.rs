#![allow(dead_code)]
//! Shared fixtures: an in-memory page source and a synthetic ICSARA report.

use icsara::error::{Error, Result};
use icsara::geometry::{Point, Rect};
use icsara::reader::{Drawing, PageSource, RawPage, TextSpan};
use image::RgbaImage;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// Pages held in memory; crops render as blank images of the crop size.
pub struct MemorySource {
    pub pages: Vec<RawPage>,
}

impl PageSource for MemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn read_page(&self, index: usize) -> Result<RawPage> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| Error::Backend(format!("no page {}", index)))
    }

    fn render_region(&self, _index: usize, bbox: &Rect, _dpi: u32) -> Result<RgbaImage> {
        let w = bbox.width().max(1.0) as u32;
        let h = bbox.height().max(1.0) as u32;
        Ok(RgbaImage::new(w, h))
    }
}

pub fn page(number: usize) -> RawPage {
    RawPage::new(number, PAGE_WIDTH, PAGE_HEIGHT)
}

/// A 10pt-high line of text starting at x=50.
pub fn text(s: &str, y0: f32) -> TextSpan {
    let width = 6.0 * s.chars().count() as f32;
    TextSpan::new(s, Rect::new(50.0, y0, 50.0 + width, y0 + 10.0), false)
}

pub fn bold(s: &str, y0: f32) -> TextSpan {
    let mut span = text(s, y0);
    span.bold = true;
    span
}

/// A ruled grid: `rows` horizontal and `cols` vertical rules.
pub fn grid(page: RawPage, bbox: Rect, rows: usize, cols: usize) -> RawPage {
    let mut page = page;
    let dy = bbox.height() / (rows - 1) as f32;
    for i in 0..rows {
        let y = bbox.y0 + dy * i as f32;
        page = page.with_drawing(Drawing::Line {
            from: Point::new(bbox.x0, y),
            to: Point::new(bbox.x1, y),
        });
    }
    let dx = bbox.width() / (cols - 1) as f32;
    for i in 0..cols {
        let x = bbox.x0 + dx * i as f32;
        page = page.with_drawing(Drawing::Line {
            from: Point::new(x, bbox.y0),
            to: Point::new(x, bbox.y1),
        });
    }
    page
}

/// Three pages: two chapters, a hinge anchored on its own page, a hinge
/// resolved on the next page, one ruled table and one raster figure.
pub fn sample_report() -> MemorySource {
    let page1 = page(1)
        .with_span(bold("I. Medio Ambiente", 60.0))
        .with_span(text("1. ¿Cuál es el alcance?", 80.0))
        .with_span(text("Describa el área de influencia.", 92.0))
        .with_span(bold("Calidad del aire", 130.0))
        .with_span(text("2. Indique las emisiones.", 155.0))
        .with_span(text("de material particulado.", 167.0));

    let page2 = grid(page(2), Rect::new(50.0, 300.0, 450.0, 370.0), 8, 5)
        .with_span(text("3. Presente el modelo de dispersión.", 60.0))
        .with_span(text("Celda de tabla", 305.0))
        .with_span(bold("Ruido", 700.0));

    let page3 = page(3)
        .with_span(text("4. Entregue las mediciones de ruido.", 60.0))
        .with_span(bold("II. Medio Humano", 100.0))
        .with_span(text("5. Describa los grupos humanos.", 130.0))
        .with_image(Rect::new(100.0, 400.0, 300.0, 500.0));

    MemorySource {
        pages: vec![page1, page2, page3],
    }
}

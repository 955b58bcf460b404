//! Per-page primitives read from a PDF backend.
//!
//! The engine never talks to a PDF library directly. It consumes [`RawPage`]s
//! from a [`PageSource`], which keeps every detector testable with synthetic
//! pages and confines backend quirks to one implementation
//! ([`pdfium::PdfiumSource`]).

pub mod pdfium;

use image::RgbaImage;

use crate::error::Result;
use crate::geometry::{Point, Rect};

pub use self::pdfium::{bind_pdfium, PdfiumSource};

/// A text fragment with uniform font.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// Text content
    pub text: String,
    /// Bounding box in page space
    pub bbox: Rect,
    /// Whether the font is bold (by name or weight)
    pub bold: bool,
}

impl TextSpan {
    /// Create a new span.
    pub fn new(text: impl Into<String>, bbox: Rect, bold: bool) -> Self {
        Self {
            text: text.into(),
            bbox,
            bold,
        }
    }
}

/// A vector drawing primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drawing {
    /// A stroked straight segment
    Line {
        /// Segment start
        from: Point,
        /// Segment end
        to: Point,
    },
    /// A painted rectangle (or the bounds of a painted path)
    Rect(Rect),
}

/// Everything the engine needs from one page.
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    /// 1-based page number
    pub number: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Text spans in content order
    pub spans: Vec<TextSpan>,
    /// Vector drawings
    pub drawings: Vec<Drawing>,
    /// Placements of raster images
    pub images: Vec<Rect>,
}

impl RawPage {
    /// Create an empty page of the given size.
    pub fn new(number: usize, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            ..Default::default()
        }
    }

    /// Add a text span.
    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.spans.push(span);
        self
    }

    /// Add a drawing.
    pub fn with_drawing(mut self, drawing: Drawing) -> Self {
        self.drawings.push(drawing);
        self
    }

    /// Add an image placement.
    pub fn with_image(mut self, bbox: Rect) -> Self {
        self.images.push(bbox);
        self
    }
}

/// A readable document.
///
/// Implementations may hold a handle that is not safe for concurrent use;
/// the pipeline calls these methods sequentially.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Read the primitives of the page at a 0-based index.
    fn read_page(&self, index: usize) -> Result<RawPage>;

    /// Render the given page-space box of a 0-based page at `dpi`.
    fn render_region(&self, index: usize, bbox: &Rect, dpi: u32) -> Result<RgbaImage>;
}

/// Decide whether a font is bold from its name, its weight (if known) and the
/// force-bold descriptor flag.
///
/// Subset fonts often carry neutral names like `ABCDEF+F1`, in which case only
/// the weight or the flag can tell.
///
/// ```
/// use icsara::reader::is_bold_font;
///
/// assert!(is_bold_font("Arial-BoldMT", None, false));
/// assert!(is_bold_font("Calibri", Some(700), false));
/// assert!(is_bold_font("ABCDEF+F1", None, true));
/// assert!(!is_bold_font("Calibri", Some(400), false));
/// ```
pub fn is_bold_font(font_name: &str, weight: Option<u32>, force_bold: bool) -> bool {
    force_bold || font_name.to_lowercase().contains("bold") || weight.is_some_and(|w| w >= 700)
}

/// One construction step of a vector path, in bottom-up PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOperation {
    /// Begin a new subpath
    MoveTo(f32, f32),
    /// Straight segment from the current point
    LineTo(f32, f32),
    /// Curve from the current point, by its end point
    CurveTo(f32, f32),
    /// Close the current subpath back to its start
    ClosePath,
}

const CORNER_EPSILON: f32 = 0.01;

type Edge = (Point, Point);

#[derive(Default)]
struct Subpath {
    start: Option<Point>,
    current: Option<Point>,
    edges: Vec<Edge>,
    curved: bool,
}

impl Subpath {
    fn begin(&mut self, point: Point) {
        self.start = Some(point);
        self.current = Some(point);
    }

    fn line_to(&mut self, point: Point) {
        match self.current {
            Some(from) if !same_point(from, point) => self.edges.push((from, point)),
            Some(_) => {},
            None => self.start = Some(point),
        }
        self.current = Some(point);
    }

    fn close(&mut self) {
        if let Some(start) = self.start {
            self.line_to(start);
        }
    }

    /// Emit the subpath: an axis-aligned closed quadrilateral as one rectangle,
    /// anything else as its straight edges.
    fn flush(&mut self, drawings: &mut Vec<Drawing>) {
        let subpath = std::mem::take(self);
        if !subpath.curved {
            if let Some(rect) = axis_rectangle(&subpath.edges) {
                drawings.push(Drawing::Rect(rect));
                return;
            }
        }
        drawings.extend(
            subpath
                .edges
                .into_iter()
                .map(|(from, to)| Drawing::Line { from, to }),
        );
    }
}

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= CORNER_EPSILON && (a.y - b.y).abs() <= CORNER_EPSILON
}

fn axis_rectangle(edges: &[Edge]) -> Option<Rect> {
    if edges.len() != 4 || !same_point(edges[3].1, edges[0].0) {
        return None;
    }
    let horizontal = |(a, b): &Edge| (a.y - b.y).abs() <= CORNER_EPSILON;
    let vertical = |(a, b): &Edge| (a.x - b.x).abs() <= CORNER_EPSILON;
    let alternates = |even: &dyn Fn(&Edge) -> bool, odd: &dyn Fn(&Edge) -> bool| {
        edges
            .iter()
            .enumerate()
            .all(|(i, edge)| if i % 2 == 0 { even(edge) } else { odd(edge) })
    };
    if !alternates(&horizontal, &vertical) && !alternates(&vertical, &horizontal) {
        return None;
    }
    edges
        .iter()
        .map(|&(from, to)| Rect::from_points(from, to))
        .reduce(|a, b| a.union(&b))
}

/// Turn path operations into drawings in top-down page space.
///
/// Closed axis-aligned quadrilaterals (the `re` operator and its expanded
/// form) become [`Drawing::Rect`]; every other straight segment becomes a
/// [`Drawing::Line`]. Curved segments produce nothing.
///
/// ```
/// use icsara::reader::{path_drawings, Drawing, PathOperation};
///
/// let ops = [PathOperation::MoveTo(50.0, 700.0), PathOperation::LineTo(300.0, 700.0)];
/// let drawings = path_drawings(&ops, 792.0);
/// assert!(matches!(drawings[0], Drawing::Line { from, .. } if from.y == 92.0));
/// ```
pub fn path_drawings(operations: &[PathOperation], page_height: f32) -> Vec<Drawing> {
    let flip = |x: f32, y: f32| Point::new(x, page_height - y);
    let mut drawings = Vec::new();
    let mut subpath = Subpath::default();
    for operation in operations {
        match *operation {
            PathOperation::MoveTo(x, y) => {
                subpath.flush(&mut drawings);
                subpath.begin(flip(x, y));
            },
            PathOperation::LineTo(x, y) => subpath.line_to(flip(x, y)),
            PathOperation::CurveTo(x, y) => {
                let point = flip(x, y);
                if subpath.start.is_none() {
                    subpath.start = Some(point);
                }
                subpath.curved = true;
                subpath.current = Some(point);
            },
            PathOperation::ClosePath => {
                subpath.close();
                let start = subpath.start;
                subpath.flush(&mut drawings);
                if let Some(start) = start {
                    subpath.begin(start);
                }
            },
        }
    }
    subpath.flush(&mut drawings);
    drawings
}

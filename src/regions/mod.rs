//! Table and figure region detection from vector and raster primitives.
//!
//! Tables are recognised by their ruling: a page must carry enough thin
//! horizontal and vertical rules, spread over a large enough area, before any
//! clustering happens. The rules are then merged transitively by proximity and
//! re-clustered at twice the gap so the cells of one table coalesce into a
//! single region. Figures are raster placements merged by a smaller gap.
//!
//! Detection is a pure function of a page's primitives; a page without
//! qualifying primitives simply yields no regions.

use serde::{Deserialize, Serialize};

use crate::config::GeometryConfig;
use crate::geometry::{bounding_box, Rect};
use crate::reader::{Drawing, RawPage};

/// Kind of a detected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Vector-ruled table
    Table,
    /// Raster figure
    Figure,
}

impl RegionKind {
    /// Lowercase name used in file names and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Table => "table",
            RegionKind::Figure => "figure",
        }
    }
}

/// A detected table or figure on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// What produced the region
    pub kind: RegionKind,
    /// 1-based page number
    pub page: usize,
    /// Region bounds
    pub bbox: Rect,
}

/// Orientation of a thin rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Horizontal,
    Vertical,
}

fn classify_drawing(drawing: &Drawing, config: &GeometryConfig) -> Option<(Rule, Rect)> {
    match *drawing {
        Drawing::Line { from, to } => {
            let dx = (to.x - from.x).abs();
            let dy = (to.y - from.y).abs();
            let rect = Rect::from_points(from, to);
            if dx >= config.min_line_length && dy <= config.line_axis_tolerance {
                Some((Rule::Horizontal, rect))
            } else if dy >= config.min_line_length && dx <= config.line_axis_tolerance {
                Some((Rule::Vertical, rect))
            } else {
                None
            }
        },
        Drawing::Rect(rect) => {
            let (w, h) = (rect.width(), rect.height());
            if h <= config.thin_max && w >= config.min_line_length {
                Some((Rule::Horizontal, rect))
            } else if w <= config.thin_max && h >= config.min_line_length {
                Some((Rule::Vertical, rect))
            } else {
                None
            }
        },
    }
}

/// Merge rectangles until no two of them are within `gap` of each other.
///
/// The result is a fixed point: every pair of output rectangles is farther
/// apart than `gap`. Output order follows the order in which each cluster was
/// first seen, so the function is deterministic for a given input order.
///
/// ```
/// use icsara::geometry::Rect;
/// use icsara::regions::merge_rects;
///
/// let rects = vec![
///     Rect::new(0.0, 0.0, 10.0, 10.0),
///     Rect::new(100.0, 0.0, 110.0, 10.0),
///     Rect::new(15.0, 0.0, 95.0, 10.0), // bridges the two
/// ];
/// let merged = merge_rects(&rects, 6.0);
/// assert_eq!(merged, vec![Rect::new(0.0, 0.0, 110.0, 10.0)]);
/// ```
pub fn merge_rects(rects: &[Rect], gap: f32) -> Vec<Rect> {
    let mut clusters: Vec<Rect> = Vec::with_capacity(rects.len());
    for rect in rects {
        match clusters.iter_mut().find(|c| c.is_near(rect, gap)) {
            Some(cluster) => *cluster = cluster.union(rect),
            None => clusters.push(*rect),
        }
    }

    // A union can grow into a cluster it was not near before; repeat until stable.
    loop {
        let mut changed = false;
        let mut i = 0;
        while i < clusters.len() {
            let mut j = i + 1;
            while j < clusters.len() {
                if clusters[i].is_near(&clusters[j], gap) {
                    let absorbed = clusters.remove(j);
                    clusters[i] = clusters[i].union(&absorbed);
                    changed = true;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        if !changed {
            return clusters;
        }
    }
}

/// Detect vector-ruled tables on a page.
pub fn detect_tables(page: &RawPage, config: &GeometryConfig) -> Vec<Rect> {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    for drawing in &page.drawings {
        match classify_drawing(drawing, config) {
            Some((Rule::Horizontal, rect)) => horizontal.push(rect),
            Some((Rule::Vertical, rect)) => vertical.push(rect),
            None => {},
        }
    }

    if horizontal.len() < config.min_horizontal_lines || vertical.len() < config.min_vertical_lines
    {
        return vec![];
    }

    let rules: Vec<Rect> = horizontal.into_iter().chain(vertical).collect();
    let extent = match bounding_box(&rules) {
        Some(extent) => extent,
        None => return vec![],
    };
    if extent.area() < config.min_table_area {
        return vec![];
    }

    let merged = merge_rects(&rules, config.merge_gap);
    merge_rects(&merged, config.merge_gap * 2.0)
        .into_iter()
        .filter(|group| group.area() >= config.min_table_area)
        .collect()
}

/// Detect raster figures on a page.
pub fn detect_figures(page: &RawPage, config: &GeometryConfig) -> Vec<Rect> {
    let placements: Vec<Rect> = page
        .images
        .iter()
        .copied()
        .filter(|r| r.area() >= config.min_figure_area)
        .collect();
    merge_rects(&placements, config.figure_merge_gap)
        .into_iter()
        .filter(|group| group.area() >= config.min_figure_area)
        .collect()
}

/// Detect all regions on a page: tables first, then figures.
pub fn detect_regions(page: &RawPage, config: &GeometryConfig) -> Vec<Region> {
    let tables = detect_tables(page, config);
    let figures = detect_figures(page, config);
    log::debug!(
        "Page {}: {} table region(s), {} figure region(s)",
        page.number,
        tables.len(),
        figures.len()
    );

    tables
        .into_iter()
        .map(|bbox| Region {
            kind: RegionKind::Table,
            page: page.number,
            bbox,
        })
        .chain(figures.into_iter().map(|bbox| Region {
            kind: RegionKind::Figure,
            page: page.number,
            bbox,
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    /// A ruled grid of `rows` horizontal and `cols` vertical lines.
    fn grid_page(x0: f32, y0: f32, width: f32, height: f32, rows: usize, cols: usize) -> RawPage {
        let mut page = RawPage::new(1, 612.0, 792.0);
        for r in 0..rows {
            let y = y0 + height * r as f32 / (rows - 1) as f32;
            page = page.with_drawing(Drawing::Line {
                from: Point::new(x0, y),
                to: Point::new(x0 + width, y),
            });
        }
        for c in 0..cols {
            let x = x0 + width * c as f32 / (cols - 1) as f32;
            page = page.with_drawing(Drawing::Rect(Rect::new(x, y0, x + 0.5, y0 + height)));
        }
        page
    }

    #[test]
    fn test_grid_yields_one_table() {
        let page = grid_page(100.0, 300.0, 200.0, 100.0, 8, 5);
        let tables = detect_tables(&page, &GeometryConfig::default());
        assert_eq!(tables.len(), 1);
        let table = tables[0];
        assert_eq!(table.x0, 100.0);
        assert_eq!(table.y0, 300.0);
        assert!(table.area() >= 20_000.0);
    }

    #[test]
    fn test_too_few_vertical_rules() {
        let page = grid_page(100.0, 300.0, 200.0, 100.0, 8, 3);
        assert!(detect_tables(&page, &GeometryConfig::default()).is_empty());
    }

    #[test]
    fn test_small_grid_rejected_by_area() {
        let page = grid_page(100.0, 300.0, 60.0, 60.0, 8, 5);
        assert!(detect_tables(&page, &GeometryConfig::default()).is_empty());
    }

    #[test]
    fn test_thick_rects_are_not_rules() {
        let mut page = RawPage::new(1, 612.0, 792.0);
        for i in 0..10 {
            let y = 100.0 + i as f32 * 20.0;
            page = page.with_drawing(Drawing::Rect(Rect::new(50.0, y, 400.0, y + 5.0)));
        }
        assert!(detect_tables(&page, &GeometryConfig::default()).is_empty());
    }

    #[test]
    fn test_two_separate_tables() {
        let mut page = grid_page(50.0, 100.0, 200.0, 100.0, 6, 4);
        let other = grid_page(50.0, 500.0, 200.0, 100.0, 6, 4);
        page.drawings.extend(other.drawings);
        let tables = detect_tables(&page, &GeometryConfig::default());
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn test_merge_rects_fixed_point() {
        let rects = vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(50.0, 0.0, 60.0, 10.0),
            Rect::new(100.0, 0.0, 110.0, 10.0),
            Rect::new(12.0, 0.0, 48.0, 10.0),
            Rect::new(62.0, 0.0, 98.0, 10.0),
        ];
        let merged = merge_rects(&rects, 3.0);
        assert_eq!(merged, vec![Rect::new(0.0, 0.0, 110.0, 10.0)]);
        for (i, a) in merged.iter().enumerate() {
            for b in merged.iter().skip(i + 1) {
                assert!(!a.is_near(b, 3.0));
            }
        }
    }

    #[test]
    fn test_figures_filtered_then_merged() {
        let page = RawPage::new(2, 612.0, 792.0)
            .with_image(Rect::new(50.0, 50.0, 150.0, 150.0))
            .with_image(Rect::new(155.0, 50.0, 255.0, 150.0))
            .with_image(Rect::new(400.0, 400.0, 410.0, 410.0));
        let figures = detect_figures(&page, &GeometryConfig::default());
        assert_eq!(figures, vec![Rect::new(50.0, 50.0, 255.0, 150.0)]);
    }

    #[test]
    fn test_detect_regions_tags_kind_and_page() {
        let mut page = grid_page(100.0, 300.0, 200.0, 100.0, 8, 5);
        page.number = 4;
        page.images.push(Rect::new(50.0, 500.0, 200.0, 650.0));
        let regions = detect_regions(&page, &GeometryConfig::default());
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].kind, RegionKind::Table);
        assert_eq!(regions[1].kind, RegionKind::Figure);
        assert!(regions.iter().all(|r| r.page == 4));
    }

    #[test]
    fn test_empty_page_has_no_regions() {
        let page = RawPage::new(1, 612.0, 792.0);
        assert!(detect_regions(&page, &GeometryConfig::default()).is_empty());
    }
}

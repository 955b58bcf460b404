//! Table/figure ownership and PNG export.
//!
//! Layout question starts are kept in one array sorted by [`SortKey`]; a
//! region belongs to the rightmost start whose key is not after the region's
//! own `(page, y0)`. Regions above the first question are unowned.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::geometry::{Rect, SortKey};
use crate::layout::LayoutQuestionStart;
use crate::reader::PageSource;
use crate::regions::{Region, RegionKind};

/// Layout question starts indexed by document position.
#[derive(Debug, Clone, Default)]
pub struct QuestionIndex {
    keys: Vec<SortKey>,
    numbers: Vec<u32>,
}

impl QuestionIndex {
    /// Build the index from layout question starts in any order.
    pub fn new(starts: &[LayoutQuestionStart]) -> Self {
        let mut entries: Vec<(SortKey, u32)> =
            starts.iter().map(|s| (s.sort_key(), s.number)).collect();
        entries.sort_by_key(|&(key, _)| key);
        let (keys, numbers) = entries.into_iter().unzip();
        Self { keys, numbers }
    }

    /// Number of indexed starts.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The question owning a position, if any start precedes it.
    ///
    /// ```
    /// use icsara::artifacts::QuestionIndex;
    /// use icsara::geometry::{Rect, SortKey};
    /// use icsara::layout::LayoutQuestionStart;
    ///
    /// let start = |number, page, y0| LayoutQuestionStart {
    ///     number,
    ///     page,
    ///     bbox: Rect::new(50.0, y0, 300.0, y0 + 10.0),
    /// };
    /// let index = QuestionIndex::new(&[start(2, 1, 400.0), start(1, 1, 100.0)]);
    /// assert_eq!(index.owner(SortKey::new(1, 50.0)), None);
    /// assert_eq!(index.owner(SortKey::new(1, 100.0)), Some(1));
    /// assert_eq!(index.owner(SortKey::new(2, 10.0)), Some(2));
    /// ```
    pub fn owner(&self, key: SortKey) -> Option<u32> {
        let idx = self.keys.partition_point(|k| *k <= key);
        idx.checked_sub(1).map(|i| self.numbers[i])
    }
}

/// A region tied to its owning question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactAssociation {
    /// Region kind
    pub kind: RegionKind,
    /// 1-based index within (question, kind)
    pub sequence: usize,
    /// Export file name
    pub filename: String,
    /// Owning question, `None` above the first question
    pub question: Option<u32>,
    /// 1-based page number
    pub page: usize,
    /// Region bounds
    pub bbox: Rect,
}

/// Export file name `p{question:03}_part{sequence:03}_{kind}.png`.
///
/// ```
/// use icsara::artifacts::export_filename;
/// use icsara::regions::RegionKind;
///
/// assert_eq!(export_filename(Some(7), 2, RegionKind::Table), "p007_part002_table.png");
/// assert_eq!(export_filename(None, 1, RegionKind::Figure), "p000_part001_figure.png");
/// ```
pub fn export_filename(question: Option<u32>, sequence: usize, kind: RegionKind) -> String {
    format!(
        "p{:03}_part{:03}_{}.png",
        question.unwrap_or(0),
        sequence,
        kind.as_str()
    )
}

/// Associate regions, in processing order, with their owning questions.
pub fn associate(regions: &[Region], index: &QuestionIndex) -> Vec<ArtifactAssociation> {
    let mut counters: HashMap<(Option<u32>, RegionKind), usize> = HashMap::new();
    regions
        .iter()
        .map(|region| {
            let question = index.owner(SortKey::new(region.page, region.bbox.y0));
            let counter = counters.entry((question, region.kind)).or_insert(0);
            *counter += 1;
            ArtifactAssociation {
                kind: region.kind,
                sequence: *counter,
                filename: export_filename(question, *counter, region.kind),
                question,
                page: region.page,
                bbox: region.bbox,
            }
        })
        .collect()
}

/// Render every artifact to a PNG under `dir`, returning how many were written.
///
/// `dir` is created if absent. A crop that fails to render is logged and
/// skipped; failing to write a rendered crop is an error.
pub fn export_artifacts<S: PageSource + ?Sized>(
    source: &S,
    artifacts: &[ArtifactAssociation],
    dir: &Path,
    dpi: u32,
) -> Result<usize> {
    std::fs::create_dir_all(dir)?;
    let mut written = 0;
    for artifact in artifacts {
        let index = artifact.page.saturating_sub(1);
        match source.render_region(index, &artifact.bbox, dpi) {
            Ok(image) => {
                image.save(dir.join(&artifact.filename))?;
                written += 1;
            },
            Err(e) => log::warn!(
                "Page {}: could not render {}: {}",
                artifact.page,
                artifact.filename,
                e
            ),
        }
    }
    log::info!("Exported {} of {} crop(s) to {}", written, artifacts.len(), dir.display());
    Ok(written)
}

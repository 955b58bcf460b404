//! Final question records and the files written for them.
//!
//! Bodies are cleaned of trailing digital-signature blocks and of hinge text
//! that bled into the end of a question, then joined with their hierarchy
//! context and exported artifacts.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::artifacts::ArtifactAssociation;
use crate::error::Result;
use crate::hierarchy::{Hierarchy, QuestionContext};
use crate::questions::Question;
use crate::regions::RegionKind;

/// Question records, as JSON.
pub const QUESTIONS_JSON: &str = "questions.json";
/// Question records, human readable.
pub const QUESTIONS_TXT: &str = "questions.txt";
/// The stitched document text.
pub const FULL_TEXT_TXT: &str = "full_text.txt";
/// The chapter/hinge hierarchy.
pub const HIERARCHY_JSON: &str = "hierarchy.json";

const RECORD_SEPARATOR: &str = "------------";

lazy_static! {
    static ref SIGNATURE_LINE: Regex =
        Regex::new(r"(?i)Firmado\s+Digitalmente\s+por\s+[^\n]+").unwrap();
    static ref SIGNATURE_STAMP: Regex = Regex::new(
        r"(?i)(?:Fecha:\s*\d{1,2}[-/]\d{1,2}[-/]\d{2,4}\s+\d{1,2}:\d{2}[:\d.]*\s*(?:UTC\s*[+-]?\d{2}:\d{2})?\s*(?:Lugar:\s*\S+)?[ \t]*)+"
    )
    .unwrap();
    static ref TRAILING_DATE: Regex =
        Regex::new(r"(?i)\d{1,2}\s+de\s+\w+\s+de\s+\d{4}\.\s*$").unwrap();
}

/// One exported table or figure of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// `"table"` or `"figure"`
    pub tipo: RegionKind,
    /// 1-based part number within the kind
    pub parte: usize,
    /// PNG file name under the exports directory
    pub png: String,
}

/// A final question record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Question number
    pub numero: u32,
    /// Chapter text, empty when unknown
    #[serde(default)]
    pub capitulo: String,
    /// Hinge text
    #[serde(default)]
    pub bisagra: Option<String>,
    /// Cleaned body
    #[serde(default)]
    pub texto: String,
    /// Associated tables and figures, ordered by (kind name, part)
    #[serde(default)]
    pub tablas_figuras: Vec<ArtifactRef>,
}

/// Strip a trailing digital-signature block.
///
/// ```
/// use icsara::output::clean_signature;
///
/// let body = "Acredite conforme a la ley. Fecha: 01-02-2024 10:00:00 UTC-03:00 \
///             Lugar: Santiago Firmado Digitalmente por Juan Pérez";
/// assert_eq!(clean_signature(body), "Acredite conforme a la ley.");
/// ```
pub fn clean_signature(text: &str) -> String {
    let text = SIGNATURE_LINE.replace_all(text, "");
    let text = SIGNATURE_STAMP.replace_all(&text, "");
    let mut text = text.trim_end().to_string();
    if let Some(m) = TRAILING_DATE.find(&text) {
        let start = m.start();
        text.truncate(start);
        text.truncate(text.trim_end().len());
    }
    text
}

/// Strip a trailing copy of any hinge text, exact or without its final period.
pub fn clean_trailing_hinge(text: &str, hinge_texts: &[String]) -> String {
    let body = text.trim_end();
    for hinge in hinge_texts.iter().map(|h| h.trim()).filter(|h| !h.is_empty()) {
        if let Some(rest) = body.strip_suffix(hinge) {
            return rest.trim_end().to_string();
        }
        if let Some(rest) = hinge.strip_suffix('.').and_then(|h| body.strip_suffix(h)) {
            return rest.trim_end().to_string();
        }
    }
    body.to_string()
}

/// Join question bodies with hierarchy context and artifacts.
///
/// Questions missing from the lookup get an empty chapter and no hinge.
pub fn assemble_records(
    questions: &[Question],
    lookup: &HashMap<u32, QuestionContext>,
    artifacts: &[ArtifactAssociation],
    hinge_texts: &[String],
) -> Vec<QuestionRecord> {
    let mut by_question: HashMap<u32, Vec<ArtifactRef>> = HashMap::new();
    for artifact in artifacts {
        if let Some(number) = artifact.question {
            by_question.entry(number).or_default().push(ArtifactRef {
                tipo: artifact.kind,
                parte: artifact.sequence,
                png: artifact.filename.clone(),
            });
        }
    }

    questions
        .iter()
        .map(|question| {
            let context = lookup.get(&question.number);
            let mut tablas_figuras = by_question.remove(&question.number).unwrap_or_default();
            tablas_figuras.sort_by(|a, b| {
                (a.tipo.as_str(), a.parte).cmp(&(b.tipo.as_str(), b.parte))
            });
            QuestionRecord {
                numero: question.number,
                capitulo: context.map(|c| c.chapter.clone()).unwrap_or_default(),
                bisagra: context.and_then(|c| c.hinge.clone()),
                texto: clean_trailing_hinge(&clean_signature(&question.body), hinge_texts),
                tablas_figuras,
            }
        })
        .collect()
}

/// Render records in the separator-delimited text format.
pub fn render_questions_txt(records: &[QuestionRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(RECORD_SEPARATOR);
        out.push('\n');
        if !record.capitulo.is_empty() {
            out.push_str(&format!("CAPITULO: {}\n", record.capitulo));
        }
        if let Some(hinge) = record.bisagra.as_deref().filter(|h| !h.is_empty()) {
            out.push_str(&format!("BISAGRA: {}\n", hinge));
        }
        out.push_str(&format!("NUMERO: {}\n", record.numero));
        out.push_str(&record.texto);
        out.push('\n');
        for artifact in &record.tablas_figuras {
            out.push_str(&format!(
                "  [{}] parte {}: {}\n",
                artifact.tipo.as_str().to_uppercase(),
                artifact.parte,
                artifact.png
            ));
        }
    }
    out.push_str(RECORD_SEPARATOR);
    out.push('\n');
    out
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Write the four extraction artifacts into `dir`, creating it if needed.
pub fn write_outputs(
    dir: &Path,
    full_text: &str,
    records: &[QuestionRecord],
    hierarchy: &Hierarchy,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(FULL_TEXT_TXT), full_text)?;
    write_json(&dir.join(QUESTIONS_JSON), records)?;
    std::fs::write(dir.join(QUESTIONS_TXT), render_questions_txt(records))?;
    write_json(&dir.join(HIERARCHY_JSON), hierarchy)?;
    log::debug!("Wrote {} record(s) to {}", records.len(), dir.display());
    Ok(())
}

/// Read records back from a `questions.json` file.
pub fn read_records(path: &Path) -> Result<Vec<QuestionRecord>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

//! Keyword-weighted topic classification of extracted questions.
//!
//! Every topic is scored against three zones of a record with different
//! weights: chapter, hinge and body. Topics under `min_score` are dropped;
//! every topic within `multi_primary_ratio` of the best one is primary.

pub mod taxonomy;

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::ClassifierConfig;
use crate::error::{Error, Result};
use crate::output::{read_records, ArtifactRef, QuestionRecord};

pub use taxonomy::{fold_accents, normalize, Taxonomy, Topic, TopicSpec};

/// Classified records.
pub const CLASSIFIED_JSON: &str = "questions_classified.json";
/// Classified records with per-topic evidence.
pub const CLASSIFIED_DETAIL_JSON: &str = "questions_classified_detail.json";

const UNCLASSIFIED_NAME: &str = "Sin clasificar";
const UNCLASSIFIED_ID: &str = "SIN_CLASIFICAR";

/// Keywords matched in each zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneMatches {
    /// Matched in the chapter
    pub capitulo: Vec<String>,
    /// Matched in the hinge
    pub bisagra: Vec<String>,
    /// Matched in the body
    pub texto: Vec<String>,
}

/// Score of one topic for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicScore {
    /// Topic identifier
    pub id: String,
    /// Topic name
    pub nombre: String,
    /// Weighted score
    pub score: f64,
    /// Keywords matched in any zone
    pub matches: Vec<String>,
    /// Keywords matched per zone
    pub detalle: ZoneMatches,
}

/// Result of classifying one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Retained topics, best first
    pub topics: Vec<TopicScore>,
    /// How many leading entries of `topics` are primary
    pub primary_count: usize,
}

impl Classification {
    /// Primary topics, best first.
    pub fn primary(&self) -> &[TopicScore] {
        &self.topics[..self.primary_count]
    }

    /// Name and id of the best topic, or the unclassified marker.
    pub fn main_topic(&self) -> (&str, &str) {
        self.topics
            .first()
            .map_or((UNCLASSIFIED_NAME, UNCLASSIFIED_ID), |t| {
                (t.nombre.as_str(), t.id.as_str())
            })
    }

    /// Whether any topic was retained.
    pub fn is_classified(&self) -> bool {
        !self.topics.is_empty()
    }
}

/// A secondary topic in the compact output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondaryTopic {
    /// Topic name
    pub nombre: String,
    /// Weighted score
    pub score: f64,
}

/// One record of `questions_classified.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    /// Question number
    pub numero: u32,
    /// Chapter text
    pub capitulo: String,
    /// Hinge text
    pub bisagra: Option<String>,
    /// Best topic name
    pub tema_principal: String,
    /// Best topic id
    pub tema_principal_id: String,
    /// Primary topic names
    pub temas_principales: Vec<String>,
    /// Primary topic ids
    pub temas_principales_id: Vec<String>,
    /// Best score, 0 when unclassified
    pub score: f64,
    /// Best non-primary topics
    pub temas_secundarios: Vec<SecondaryTopic>,
    /// Keywords of the best topic
    pub keywords_match: Vec<String>,
    /// Question body
    pub texto: String,
    /// Associated tables and figures
    pub tablas_figuras: Vec<ArtifactRef>,
}

/// One record of `questions_classified_detail.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedDetail {
    /// Question number
    pub numero: u32,
    /// Chapter text
    pub capitulo: String,
    /// Hinge text
    pub bisagra: Option<String>,
    /// Best topic name
    pub tema_principal: String,
    /// Best topic id
    pub tema_principal_id: String,
    /// Primary topic names
    pub temas_principales: Vec<String>,
    /// Primary topic ids
    pub temas_principales_id: Vec<String>,
    /// Every retained topic with evidence
    pub temas: Vec<TopicScore>,
}

/// Counts and paths of a classification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationSummary {
    /// Records read
    pub total: usize,
    /// Records with at least one topic
    pub classified: usize,
    /// Records without topics
    pub unclassified: usize,
    /// Path of `questions_classified.json`
    pub output_json: PathBuf,
    /// Path of `questions_classified_detail.json`
    pub output_detail_json: PathBuf,
}

struct Zone {
    normalized: String,
    folded: String,
    weight: f64,
}

impl Zone {
    fn new(text: &str, weight: f64) -> Self {
        let normalized = normalize(text);
        let folded = fold_accents(&normalized);
        Self {
            normalized,
            folded,
            weight,
        }
    }
}

/// Scores records against a taxonomy.
#[derive(Debug, Clone)]
pub struct Classifier {
    taxonomy: Taxonomy,
    config: ClassifierConfig,
}

impl Classifier {
    /// Create a classifier.
    pub fn new(taxonomy: Taxonomy, config: ClassifierConfig) -> Self {
        Self { taxonomy, config }
    }

    fn score_topic(&self, topic: &Topic, zones: &[Zone; 3]) -> TopicScore {
        let mut score = 0.0;
        let mut matches = Vec::new();
        let mut detalle = ZoneMatches::default();

        for keyword in &topic.keywords {
            let mut found = false;
            for (i, zone) in zones.iter().enumerate() {
                if zone.normalized.is_empty() || !keyword.matches(&zone.normalized, &zone.folded) {
                    continue;
                }
                score += zone.weight;
                let bucket = match i {
                    0 => &mut detalle.capitulo,
                    1 => &mut detalle.bisagra,
                    _ => &mut detalle.texto,
                };
                bucket.push(keyword.text.clone());
                found = true;
            }
            if found {
                matches.push(keyword.text.clone());
            }
        }

        TopicScore {
            id: topic.id.clone(),
            nombre: topic.name.clone(),
            score,
            matches,
            detalle,
        }
    }

    /// Classify one record.
    pub fn classify_record(&self, record: &QuestionRecord) -> Classification {
        let zones = [
            Zone::new(&record.capitulo, self.config.chapter_weight),
            Zone::new(record.bisagra.as_deref().unwrap_or(""), self.config.hinge_weight),
            Zone::new(&record.texto, self.config.text_weight),
        ];

        let mut topics: Vec<TopicScore> = self
            .taxonomy
            .topics()
            .iter()
            .map(|topic| self.score_topic(topic, &zones))
            .filter(|t| t.score >= self.config.min_score)
            .collect();
        topics.sort_by(|a, b| b.score.total_cmp(&a.score));

        let threshold = topics.first().map_or(f64::INFINITY, |top| {
            self.config
                .min_score
                .max(self.config.multi_primary_ratio * top.score)
        });
        let primary_count = topics.iter().take_while(|t| t.score >= threshold).count();

        Classification {
            topics,
            primary_count,
        }
    }

    /// Build both output records for one input record.
    pub fn build_outputs(&self, record: &QuestionRecord) -> (ClassifiedRecord, ClassifiedDetail) {
        let classification = self.classify_record(record);
        let (name, id) = classification.main_topic();
        let (name, id) = (name.to_string(), id.to_string());
        let primary_names: Vec<String> =
            classification.primary().iter().map(|t| t.nombre.clone()).collect();
        let primary_ids: Vec<String> =
            classification.primary().iter().map(|t| t.id.clone()).collect();

        let primary_set: HashSet<&str> = primary_names.iter().map(String::as_str).collect();
        let secondary = classification
            .topics
            .iter()
            .filter(|t| !primary_set.contains(t.nombre.as_str()))
            .take(self.config.max_secondary)
            .map(|t| SecondaryTopic {
                nombre: t.nombre.clone(),
                score: t.score,
            })
            .collect();
        let top = classification.topics.first();

        let compact = ClassifiedRecord {
            numero: record.numero,
            capitulo: record.capitulo.clone(),
            bisagra: record.bisagra.clone(),
            tema_principal: name.clone(),
            tema_principal_id: id.clone(),
            temas_principales: primary_names.clone(),
            temas_principales_id: primary_ids.clone(),
            score: top.map_or(0.0, |t| t.score),
            temas_secundarios: secondary,
            keywords_match: top
                .map(|t| {
                    t.matches
                        .iter()
                        .take(self.config.max_keyword_matches)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            texto: record.texto.clone(),
            tablas_figuras: record.tablas_figuras.clone(),
        };
        let detail = ClassifiedDetail {
            numero: record.numero,
            capitulo: record.capitulo.clone(),
            bisagra: record.bisagra.clone(),
            tema_principal: name,
            tema_principal_id: id,
            temas_principales: primary_names,
            temas_principales_id: primary_ids,
            temas: classification.topics,
        };
        (compact, detail)
    }

    /// Classify a `questions.json` file into `output_dir`.
    pub fn run(&self, questions_json: &Path, output_dir: &Path) -> Result<ClassificationSummary> {
        if !questions_json.exists() {
            return Err(Error::InputNotFound(questions_json.to_path_buf()));
        }
        let records = read_records(questions_json)?;
        log::info!(
            "Classifying {} question(s) against {} topic(s)",
            records.len(),
            self.taxonomy.len()
        );

        let (compact, detail): (Vec<_>, Vec<_>) =
            records.iter().map(|r| self.build_outputs(r)).unzip();
        let unclassified = compact
            .iter()
            .filter(|r| r.tema_principal_id == UNCLASSIFIED_ID)
            .count();

        std::fs::create_dir_all(output_dir)?;
        let output_json = output_dir.join(CLASSIFIED_JSON);
        let output_detail_json = output_dir.join(CLASSIFIED_DETAIL_JSON);
        std::fs::write(&output_json, serde_json::to_string_pretty(&compact)?)?;
        std::fs::write(&output_detail_json, serde_json::to_string_pretty(&detail)?)?;

        log::info!(
            "Classified {}/{} question(s)",
            compact.len() - unclassified,
            compact.len()
        );
        Ok(ClassificationSummary {
            total: compact.len(),
            classified: compact.len() - unclassified,
            unclassified,
            output_json,
            output_detail_json,
        })
    }
}

/// Classify `questions.json` with the embedded taxonomy and default weights.
pub fn classify(questions_json: &Path, output_dir: &Path) -> Result<ClassificationSummary> {
    Classifier::new(Taxonomy::embedded()?, ClassifierConfig::default()).run(questions_json, output_dir)
}

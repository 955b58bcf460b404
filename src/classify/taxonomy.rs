//! Keyword taxonomy of ICSARA topics.
//!
//! The taxonomy is a JSON object `{topic_id: {nombre, keywords}}`. Topic order
//! is the file order and breaks score ties. A default copy ships inside the
//! binary; a file given at run time replaces it without rebuilding.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

const EMBEDDED_TAXONOMY: &str = include_str!("../../data/taxonomy.json");

/// Keywords this short (in characters) only match whole words.
const WHOLE_WORD_MAX_CHARS: usize = 4;

/// A topic as written in the taxonomy file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSpec {
    /// Display name
    pub nombre: String,
    /// Match keywords, any case
    pub keywords: Vec<String>,
}

/// A keyword with its compiled patterns.
#[derive(Debug, Clone)]
pub struct Keyword {
    /// Keyword as written in the taxonomy
    pub text: String,
    accented: Regex,
    folded: Regex,
}

impl Keyword {
    fn compile(text: &str) -> Result<Option<Self>> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Ok(None);
        }
        let folded = fold_accents(&normalized);
        let whole_word = normalized.chars().count() <= WHOLE_WORD_MAX_CHARS;
        let build = |kw: &str| {
            let escaped = regex::escape(kw);
            let pattern = if whole_word {
                format!(r"\b{}\b", escaped)
            } else {
                escaped
            };
            Regex::new(&pattern)
                .map_err(|e| Error::Taxonomy(format!("keyword {:?}: {}", text, e)))
        };
        Ok(Some(Self {
            text: text.to_string(),
            accented: build(&normalized)?,
            folded: build(&folded)?,
        }))
    }

    /// Whether the keyword occurs in a zone, given its normalized and
    /// accent-folded forms.
    pub fn matches(&self, normalized: &str, folded: &str) -> bool {
        self.accented.is_match(normalized) || self.folded.is_match(folded)
    }
}

/// A topic ready for scoring.
#[derive(Debug, Clone)]
pub struct Topic {
    /// Topic identifier, e.g. `RUIDO_VIBRACIONES`
    pub id: String,
    /// Display name
    pub name: String,
    /// Compiled keywords, in file order
    pub keywords: Vec<Keyword>,
}

/// An ordered set of topics.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    topics: Vec<Topic>,
}

impl Taxonomy {
    /// Parse a taxonomy from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let specs: IndexMap<String, TopicSpec> =
            serde_json::from_str(json).map_err(|e| Error::Taxonomy(e.to_string()))?;
        Self::from_specs(specs)
    }

    /// Read a taxonomy file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let taxonomy = Self::from_json_str(&json)?;
        log::info!(
            "Loaded {} topic(s) from {}",
            taxonomy.topics.len(),
            path.display()
        );
        Ok(taxonomy)
    }

    /// The taxonomy shipped with the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_json_str(EMBEDDED_TAXONOMY)
    }

    /// Build from already-parsed topic specs, keeping their order.
    pub fn from_specs(specs: IndexMap<String, TopicSpec>) -> Result<Self> {
        let topics = specs
            .into_iter()
            .map(|(id, spec)| {
                let mut keywords = Vec::with_capacity(spec.keywords.len());
                for kw in &spec.keywords {
                    keywords.extend(Keyword::compile(kw)?);
                }
                Ok(Topic {
                    id,
                    name: spec.nombre,
                    keywords,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { topics })
    }

    /// Topics in file order.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Number of topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Whether there are no topics.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// Lowercase, trim and collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Fold the Spanish accented vowels and `ñ` of lowercase text.
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

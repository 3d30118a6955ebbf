//! Corpus model and loading
//!
//! A corpus is a JSON object of `"Book:Canto": "<text>"` pairs. Section
//! order is the order in the source document and is significant: the
//! search cap is applied in this order.

use crate::config::CorpusSource;
use crate::errors::{AppError, Result};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// One named unit of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: String,
    pub text: String,
}

/// Ordered, immutable collection of sections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    sections: Vec<Section>,
}

impl Corpus {
    /// Build a corpus from `(id, text)` pairs, keeping their order.
    ///
    /// A repeated id replaces the earlier text in place.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut corpus = Corpus::default();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (id, text) in pairs {
            corpus.insert(&mut positions, id.into(), text.into());
        }
        corpus
    }

    fn insert(&mut self, positions: &mut HashMap<String, usize>, id: String, text: String) {
        match positions.get(&id) {
            Some(&idx) => self.sections[idx].text = text,
            None => {
                positions.insert(id.clone(), self.sections.len());
                self.sections.push(Section { id, text });
            }
        }
    }

    /// Parse a corpus from a JSON object
    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a corpus file from disk
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| AppError::CorpusLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let corpus = Self::from_json_str(&raw).map_err(|e| AppError::CorpusLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        info!(sections = corpus.len(), "Corpus loaded");
        Ok(corpus)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

// Manual deserialization keeps the document order of the JSON object
impl<'de> Deserialize<'de> for Corpus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CorpusVisitor;

        impl<'de> Visitor<'de> for CorpusVisitor {
            type Value = Corpus;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object mapping section ids to text")
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Corpus, V::Error>
            where
                V: MapAccess<'de>,
            {
                let mut corpus = Corpus::default();
                let mut positions = HashMap::new();
                while let Some(id) = map.next_key::<String>()? {
                    let text: String = map
                        .next_value()
                        .map_err(|e| de::Error::custom(format!("section {}: {}", id, e)))?;
                    corpus.insert(&mut positions, id, text);
                }
                Ok(corpus)
            }
        }

        deserializer.deserialize_map(CorpusVisitor)
    }
}

/// Loaded corpora, addressed by code
#[derive(Debug, Clone, Default)]
pub struct CorpusRegistry {
    corpora: HashMap<String, Arc<Corpus>>,
}

impl CorpusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every configured corpus; the first failure aborts
    pub fn load(sources: &[CorpusSource]) -> Result<Self> {
        let mut registry = Self::new();
        for source in sources {
            info!(code = %source.code, path = %source.path, "Loading corpus");
            let corpus = Corpus::from_path(&source.path)?;
            crate::metrics::record_corpus(&source.code, corpus.len());
            registry.insert(source.code.clone(), corpus);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, code: impl Into<String>, corpus: Corpus) {
        self.corpora.insert(code.into(), Arc::new(corpus));
    }

    /// Look up a corpus by code
    pub fn get(&self, code: &str) -> Result<Arc<Corpus>> {
        self.corpora
            .get(code)
            .cloned()
            .ok_or_else(|| AppError::CorpusNotFound {
                code: code.to_string(),
            })
    }

    /// Codes and section counts, sorted by code
    pub fn summary(&self) -> Vec<(String, usize)> {
        let mut out: Vec<_> = self
            .corpora
            .iter()
            .map(|(code, corpus)| (code.clone(), corpus.len()))
            .collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.corpora.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpora.is_empty()
    }
}

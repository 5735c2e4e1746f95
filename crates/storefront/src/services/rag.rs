//! Keyword-heuristic retrieval over a static knowledge corpus.
//!
//! Each text is mapped to an 8-dimensional vector, one dimension per keyword
//! family. A token counts towards a family when it equals or starts with one
//! of the family's keywords. Search ranks documents by cosine similarity.
//!
//! The corpus is small and loaded once at startup, so search is a linear
//! scan over precomputed document vectors.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of embedding dimensions.
pub const DIMENSIONS: usize = 8;

/// Default number of results.
pub const DEFAULT_TOP_K: usize = 3;

/// Upper bound on `top_k`.
pub const MAX_TOP_K: usize = 10;

const TITLE_WEIGHT: f32 = 2.0;

/// Pseudo-embedding vector.
pub type Embedding = [f32; DIMENSIONS];

/// Keyword family, one per embedding dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Products,
    Pricing,
    Shipping,
    Returns,
    Orders,
    Payments,
    Careers,
    Store,
}

impl Family {
    /// All families in dimension order.
    pub const ALL: [Self; DIMENSIONS] = [
        Self::Products,
        Self::Pricing,
        Self::Shipping,
        Self::Returns,
        Self::Orders,
        Self::Payments,
        Self::Careers,
        Self::Store,
    ];

    const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Products => &[
                "product", "item", "suit", "shirt", "kurta", "dress", "lawn", "fabric",
                "size", "color", "colour", "stock", "collection", "catalog", "variant",
            ],
            Self::Pricing => &[
                "price", "cost", "cheap", "expensive", "discount", "sale", "offer",
                "rupee", "pkr", "fee", "deal",
            ],
            Self::Shipping => &[
                "ship", "deliver", "courier", "tcs", "dispatch", "pickup", "freight",
                "address", "city",
            ],
            Self::Returns => &[
                "return", "refund", "exchange", "damage", "defect", "restock", "replace",
            ],
            Self::Orders => &[
                "order", "track", "status", "cancel", "consign", "invoice", "purchase",
            ],
            Self::Payments => &[
                "pay", "cash", "cod", "bank", "transfer", "card", "wallet", "receipt",
            ],
            Self::Careers => &[
                "job", "career", "hiring", "hire", "vacanc", "apply", "applica", "resume",
                "cv", "position", "intern",
            ],
            Self::Store => &[
                "store", "branch", "shop", "outlet", "location", "hour", "open", "timing",
                "contact", "phone",
            ],
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Products => 0,
            Self::Pricing => 1,
            Self::Shipping => 2,
            Self::Returns => 3,
            Self::Orders => 4,
            Self::Payments => 5,
            Self::Careers => 6,
            Self::Store => 7,
        }
    }
}

/// Errors from loading the corpus.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("failed to read corpus {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid corpus JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate document id: {0}")]
    DuplicateId(String),

    #[error("document {0} has an empty id or title")]
    InvalidDocument(usize),
}

/// A corpus document as stored in the JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub score: f32,
}

/// Lowercase, split on non-alphanumerics.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn add_text(vector: &mut Embedding, text: &str, weight: f32) {
    for token in tokens(text) {
        for family in Family::ALL {
            if family
                .keywords()
                .iter()
                .any(|kw| token == *kw || token.starts_with(kw))
                && let Some(slot) = vector.get_mut(family.index())
            {
                *slot += weight;
            }
        }
    }
}

/// Embed a piece of text.
#[must_use]
pub fn embed(text: &str) -> Embedding {
    let mut vector = [0.0; DIMENSIONS];
    add_text(&mut vector, text, 1.0);
    vector
}

/// Embed a document: title counts double, then content and tags.
#[must_use]
pub fn embed_document(doc: &Document) -> Embedding {
    let mut vector = [0.0; DIMENSIONS];
    add_text(&mut vector, &doc.title, TITLE_WEIGHT);
    add_text(&mut vector, &doc.content, 1.0);
    for tag in &doc.tags {
        add_text(&mut vector, tag, 1.0);
    }
    vector
}

/// Cosine similarity. Zero vectors score 0.
#[must_use]
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Family with the largest weight, if any dimension is non-zero.
///
/// Ties go to the earlier family.
#[must_use]
pub fn dominant_family(vector: &Embedding) -> Option<Family> {
    let mut best: Option<(Family, f32)> = None;
    for family in Family::ALL {
        let weight = vector.get(family.index()).copied().unwrap_or_default();
        if weight > 0.0 && best.is_none_or(|(_, w)| weight > w) {
            best = Some((family, weight));
        }
    }
    best.map(|(family, _)| family)
}

/// Clamp a requested `top_k` to `1..=MAX_TOP_K`.
#[must_use]
pub fn clamp_top_k(top_k: Option<usize>) -> usize {
    top_k.unwrap_or(DEFAULT_TOP_K).clamp(1, MAX_TOP_K)
}

/// In-memory corpus with precomputed embeddings.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    documents: Vec<(Document, Embedding)>,
}

impl KnowledgeBase {
    /// Build from documents, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// `DuplicateId` or `InvalidDocument`.
    pub fn new(documents: Vec<Document>) -> Result<Self, RagError> {
        let mut seen = HashSet::with_capacity(documents.len());
        let mut indexed = Vec::with_capacity(documents.len());
        for (position, doc) in documents.into_iter().enumerate() {
            if doc.id.trim().is_empty() || doc.title.trim().is_empty() {
                return Err(RagError::InvalidDocument(position));
            }
            if !seen.insert(doc.id.clone()) {
                return Err(RagError::DuplicateId(doc.id));
            }
            let vector = embed_document(&doc);
            indexed.push((doc, vector));
        }
        Ok(Self { documents: indexed })
    }

    /// Parse a JSON array of documents.
    ///
    /// # Errors
    ///
    /// `Json` for malformed input, plus everything [`KnowledgeBase::new`] rejects.
    pub fn from_json(json: &str) -> Result<Self, RagError> {
        let documents: Vec<Document> = serde_json::from_str(json)?;
        Self::new(documents)
    }

    /// Load the corpus file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, plus everything
    /// [`KnowledgeBase::from_json`] rejects.
    pub fn load(path: &Path) -> Result<Self, RagError> {
        let json = std::fs::read_to_string(path).map_err(|source| RagError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let kb = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            documents = kb.len(),
            "Knowledge corpus loaded"
        );
        Ok(kb)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Top documents for a query with a positive score.
    ///
    /// Sorted by score descending, ties by corpus order.
    #[must_use]
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        let query_vector = embed(query);
        let mut scored: Vec<(usize, f32)> = self
            .documents
            .iter()
            .enumerate()
            .map(|(position, (_, vector))| (position, cosine_similarity(&query_vector, vector)))
            .filter(|&(_, score)| score > 0.0)
            .collect();

        // Stable sort keeps corpus order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(top_k)
            .filter_map(|(position, score)| {
                self.documents.get(position).map(|(doc, _)| SearchHit {
                    id: doc.id.clone(),
                    title: doc.title.clone(),
                    content: doc.content.clone(),
                    category: doc.category.clone(),
                    score,
                })
            })
            .collect()
    }
}

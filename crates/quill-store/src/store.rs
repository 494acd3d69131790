//! Similarity store seam

use async_trait::async_trait;
use quill_core::{Context, Result};
use serde::{Deserialize, Serialize};

/// A stored item ranked against a query vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItem {
    pub id: String,
    pub content: String,
    /// Cosine similarity to the query, higher is closer
    pub similarity: f64,
    #[serde(default)]
    pub metadata: Context,
}

impl SimilarItem {
    /// Originating department or source, when the metadata carries one
    pub fn origin(&self) -> Option<&str> {
        self.metadata
            .get("department")
            .or_else(|| self.metadata.get("source"))
            .and_then(|v| v.as_str())
    }
}

/// Vector store consumed by the consistency lookup and written by ingestion
///
/// Read-mostly. Concurrent reads and writes need no isolation beyond what the
/// implementation gives for a single call.
#[async_trait]
pub trait ConsistencyStore: Send + Sync {
    /// Items ranked by descending similarity, at most `limit` of them
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SimilarItem>>;

    /// Insert an item and return its id
    async fn upsert(&self, content: &str, embedding: Vec<f32>, metadata: Context) -> Result<String>;

    /// Number of stored items
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

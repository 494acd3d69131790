//! In-process similarity store with optional JSON snapshot persistence

use crate::store::{ConsistencyStore, SimilarItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quill_core::{Context, QuillError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// One indexed item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Context,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    dimensions: usize,
    items: Vec<StoredItem>,
}

/// Brute-force cosine search over an in-memory item list
#[derive(Debug)]
pub struct MemoryStore {
    dimensions: usize,
    path: Option<PathBuf>,
    items: RwLock<Vec<StoredItem>>,
}

impl MemoryStore {
    /// Empty, unpersisted store for vectors of the given length
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            path: None,
            items: RwLock::new(Vec::new()),
        }
    }

    /// Load a snapshot from `path`, or start empty if it does not exist yet
    pub fn open(path: impl AsRef<Path>, dimensions: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let items = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let snapshot: Snapshot = serde_json::from_str(&content)?;
            if snapshot.dimensions != dimensions {
                return Err(QuillError::Store(format!(
                    "{} holds {}-dimensional vectors, expected {}",
                    path.display(),
                    snapshot.dimensions,
                    dimensions
                )));
            }
            info!("Loaded {} items from {}", snapshot.items.len(), path.display());
            snapshot.items
        } else {
            debug!("No store at {}, starting empty", path.display());
            Vec::new()
        };

        Ok(Self {
            dimensions,
            path: Some(path),
            items: RwLock::new(items),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Write the snapshot back to the path it was opened from
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Err(QuillError::Store(
                "store was not opened from a file".to_string(),
            ));
        };

        let snapshot = Snapshot {
            dimensions: self.dimensions,
            items: self.items.read().await.clone(),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serde_json::to_string(&snapshot)?).await?;

        info!("Saved {} items to {}", snapshot.items.len(), path.display());
        Ok(())
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(QuillError::Store(format!(
                "vector has {} dimensions, store expects {}",
                vector.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ConsistencyStore for MemoryStore {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SimilarItem>> {
        self.check_vector(vector)?;

        let items = self.items.read().await;
        let mut ranked: Vec<SimilarItem> = items
            .iter()
            .map(|item| SimilarItem {
                id: item.id.clone(),
                content: item.content.clone(),
                similarity: cosine_similarity(vector, &item.embedding),
                metadata: item.metadata.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        ranked.truncate(limit);

        debug!("Search over {} items returned {}", items.len(), ranked.len());
        Ok(ranked)
    }

    async fn upsert(&self, content: &str, embedding: Vec<f32>, metadata: Context) -> Result<String> {
        self.check_vector(&embedding)?;

        let id = uuid::Uuid::new_v4().to_string();
        self.items.write().await.push(StoredItem {
            id: id.clone(),
            content: content.to_string(),
            embedding,
            metadata,
            created_at: Utc::now(),
        });

        Ok(id)
    }

    async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

/// Cosine similarity between two vectors of equal length, 0.0 for zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (ai, bi) in a.iter().zip(b.iter()) {
        let ai = f64::from(*ai);
        let bi = f64::from(*bi);
        dot += ai * bi;
        norm_a += ai * ai;
        norm_b += bi * bi;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}

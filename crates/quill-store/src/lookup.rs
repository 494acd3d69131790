//! Grounding context for the consistency reviewer

use crate::store::{ConsistencyStore, SimilarItem};
use quill_agent::Embedder;
use quill_core::config::ConsistencyConfig;
use quill_core::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Text used when nothing similar enough is indexed
pub const NO_MATCHES: &str = "No existing content found.";

const PREVIEW_CHARS: usize = 200;

/// Embeds content, searches the store and keeps close matches only
#[derive(Clone)]
pub struct ConsistencyLookup {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ConsistencyStore>,
    limit: usize,
    threshold: f64,
}

impl ConsistencyLookup {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn ConsistencyStore>) -> Self {
        let defaults = ConsistencyConfig::default();
        Self {
            embedder,
            store,
            limit: defaults.limit,
            threshold: defaults.similarity_threshold,
        }
    }

    pub fn from_config(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn ConsistencyStore>,
        config: &ConsistencyConfig,
    ) -> Self {
        Self::new(embedder, store)
            .with_limit(config.limit)
            .with_threshold(config.similarity_threshold)
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Stored items strictly above the similarity threshold, best first
    #[instrument(skip(self, content))]
    pub async fn find(&self, content: &str) -> Result<Vec<SimilarItem>> {
        let vector = self.embedder.embed(content).await?;
        let candidates = self.store.search(&vector, self.limit).await?;
        let total = candidates.len();

        let matches: Vec<SimilarItem> = candidates
            .into_iter()
            .filter(|item| item.similarity > self.threshold)
            .collect();

        debug!("{} of {} candidates above {:.2}", matches.len(), total, self.threshold);
        Ok(matches)
    }

    /// Find matches and render them as reviewer context in one step
    pub async fn context_for(&self, content: &str) -> Result<String> {
        let matches = self.find(content).await?;
        Ok(format_context(&matches))
    }
}

/// Render matches as one line each for the consistency prompt
pub fn format_context(matches: &[SimilarItem]) -> String {
    if matches.is_empty() {
        return NO_MATCHES.to_string();
    }

    let mut out = String::from("Found the following similar content in the knowledge base:\n");
    for item in matches {
        out.push_str(&format!("- [ID: {}] (Similarity: {:.2})", item.id, item.similarity));
        if let Some(origin) = item.origin() {
            out.push_str(&format!(" [Department: {}]", origin));
        }
        out.push_str(&format!(": {}\n", preview(&item.content)));
    }
    out
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;

    /// Returns a fixed vector for every input
    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new(2));
        let hmrc = json!({"department": "HMRC"}).as_object().cloned().unwrap();
        store
            .upsert("VAT is mandatory for digital services.", vec![1.0, 0.0], hmrc)
            .await
            .unwrap();
        store
            .upsert("Fishing licences.", vec![0.0, 1.0], Default::default())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_find_filters_by_threshold() {
        let store = seeded_store().await;
        let lookup = ConsistencyLookup::new(Arc::new(FixedEmbedder(vec![0.95, 0.1])), store);

        let matches = lookup.find("VAT is optional").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].origin(), Some("HMRC"));
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let store = Arc::new(MemoryStore::new(2));
        store
            .upsert("exact", vec![1.0, 0.0], Default::default())
            .await
            .unwrap();
        let lookup = ConsistencyLookup::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), store)
            .with_threshold(1.0);

        assert!(lookup.find("exact").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_context_for_empty_store() {
        let lookup = ConsistencyLookup::new(
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            Arc::new(MemoryStore::new(2)),
        );
        assert_eq!(lookup.context_for("anything").await.unwrap(), NO_MATCHES);
    }

    #[test]
    fn test_format_context_lines() {
        let long = "x".repeat(250);
        let matches = vec![
            SimilarItem {
                id: "abc".into(),
                content: "VAT is mandatory.".into(),
                similarity: 0.8567,
                metadata: json!({"department": "HMRC"}).as_object().cloned().unwrap(),
            },
            SimilarItem {
                id: "def".into(),
                content: long,
                similarity: 0.71,
                metadata: Default::default(),
            },
        ];

        let text = format_context(&matches);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "- [ID: abc] (Similarity: 0.86) [Department: HMRC]: VAT is mandatory."
        );
        assert!(lines[2].starts_with("- [ID: def] (Similarity: 0.71): xxx"));
        assert!(lines[2].ends_with("..."));
        assert_eq!(lines[2].matches('x').count(), 200);
    }
}

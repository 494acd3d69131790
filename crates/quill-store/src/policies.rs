//! Built-in cross-department policies used to seed the store
//!
//! These give the consistency reviewer something to contradict out of the box.

use crate::store::ConsistencyStore;
use quill_agent::Embedder;
use quill_core::{Context, Result};
use serde_json::Value;
use tracing::info;

/// A policy statement owned by another department
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPolicy {
    pub department: &'static str,
    pub title: &'static str,
    pub content: &'static str,
}

impl ExternalPolicy {
    /// Text that gets embedded and stored
    pub fn document(&self) -> String {
        format!("{}\n\n{}", self.title, self.content)
    }

    pub fn metadata(&self) -> Context {
        let mut metadata = Context::new();
        metadata.insert("department".into(), Value::from(self.department));
        metadata.insert("type".into(), Value::from("external_policy"));
        metadata.insert("title".into(), Value::from(self.title));
        metadata
    }
}

pub const EXTERNAL_POLICIES: &[ExternalPolicy] = &[
    ExternalPolicy {
        department: "HMRC",
        title: "VAT on Digital Services",
        content: "You must charge VAT on all digital services supplied to UK consumers, regardless of your turnover. The threshold of £85,000 does NOT apply to digital services.",
    },
    ExternalPolicy {
        department: "Home Office",
        title: "Right to Work Checks",
        content: "From 1 October 2022, employers typically cannot use COVID-19 adjusted right to work checks. You must verify physical documents or use the online share code service.",
    },
    ExternalPolicy {
        department: "DWP",
        title: "Universal Credit Capital Limits",
        content: "If you have more than £16,000 in money, savings and investments, you are not eligible for Universal Credit.",
    },
    ExternalPolicy {
        department: "DEFRA",
        title: "Fishing Rod Licenses",
        content: "You need a rod fishing licence to fish for salmon, trout, freshwater fish, smelt or eel with a rod and line in England (except the River Tweed), Wales and the Border Esk region of Scotland.",
    },
];

/// Embed and store every built-in policy, returning the new ids
pub async fn seed_policies(embedder: &dyn Embedder, store: &dyn ConsistencyStore) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(EXTERNAL_POLICIES.len());

    for policy in EXTERNAL_POLICIES {
        info!("Seeding {} ({})", policy.title, policy.department);
        let document = policy.document();
        let embedding = embedder.embed(&document).await?;
        ids.push(store.upsert(&document, embedding, policy.metadata()).await?);
    }

    info!("Seeded {} external policies", ids.len());
    Ok(ids)
}

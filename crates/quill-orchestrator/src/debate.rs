//! Debate sub-loop: two opposing rewrites settled by a mediator
//!
//! The participants share nothing, so they run concurrently. The join is
//! fail-fast: if either participant errors, the other is dropped and the
//! mediator never runs.

use quill_core::{Result, StructuredFeedback};
use quill_review::{mediation_prompt, position_text, ReviewStep};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything a debate produced
#[derive(Debug, Clone, Serialize)]
pub struct DebateOutcome {
    pub original: String,
    pub simplified: StructuredFeedback,
    pub precise: StructuredFeedback,
    pub verdict: StructuredFeedback,
}

impl DebateOutcome {
    /// The mediator's text, or its summary if it returned no rewrite
    pub fn final_content(&self) -> &str {
        position_text(&self.verdict)
    }
}

/// Fork-join composition of simplifier, legalist and mediator
#[derive(Clone)]
pub struct DebateSubLoop {
    simplifier: Arc<dyn ReviewStep>,
    legalist: Arc<dyn ReviewStep>,
    mediator: Arc<dyn ReviewStep>,
}

impl DebateSubLoop {
    pub fn new(
        simplifier: Arc<dyn ReviewStep>,
        legalist: Arc<dyn ReviewStep>,
        mediator: Arc<dyn ReviewStep>,
    ) -> Self {
        Self {
            simplifier,
            legalist,
            mediator,
        }
    }

    #[instrument(skip(self, content))]
    pub async fn run(&self, content: &str) -> Result<DebateOutcome> {
        info!("Starting debate ({} chars)", content.len());

        let (simplified, precise) = tokio::try_join!(
            self.simplifier.execute(content, None),
            self.legalist.execute(content, None),
        )?;

        info!("Both positions in, mediating");
        let prompt = mediation_prompt(content, position_text(&simplified), position_text(&precise));
        let verdict = self.mediator.execute(&prompt, None).await?;

        Ok(DebateOutcome {
            original: content.to_string(),
            simplified,
            precise,
            verdict,
        })
    }
}

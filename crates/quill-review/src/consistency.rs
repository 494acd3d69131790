//! Consistency review grounded in similar existing content

use crate::prompts::StepKind;
use crate::step::{PromptStep, ReviewStep};
use async_trait::async_trait;
use quill_agent::ModelInvoker;
use quill_core::{Context, Result, StructuredFeedback};
use quill_store::ConsistencyLookup;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Context key the lookup block is stored under
pub const EXISTING_CONTENT_KEY: &str = "existing_content";

/// Looks up similar content, then reviews with that block as context
pub struct ConsistencyReviewer {
    step: PromptStep,
    lookup: ConsistencyLookup,
}

impl ConsistencyReviewer {
    pub fn new(invoker: Arc<dyn ModelInvoker>, lookup: ConsistencyLookup) -> Self {
        Self {
            step: PromptStep::new(StepKind::Consistency, invoker),
            lookup,
        }
    }
}

#[async_trait]
impl ReviewStep for ConsistencyReviewer {
    fn name(&self) -> &str {
        self.step.name()
    }

    #[instrument(skip(self, content, context))]
    async fn execute(&self, content: &str, context: Option<&Context>) -> Result<StructuredFeedback> {
        let existing = self.lookup.context_for(content).await?;
        debug!("Consistency context: {} chars", existing.len());

        let mut full_context = Context::new();
        full_context.insert(EXISTING_CONTENT_KEY.to_string(), Value::String(existing));
        // Caller keys win, including a caller-supplied existing_content
        if let Some(caller) = context {
            full_context.extend(caller.clone());
        }

        self.step.execute(content, Some(&full_context)).await
    }
}

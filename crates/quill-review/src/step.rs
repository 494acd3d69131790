//! The review step contract and its shared execution path

use crate::prompts::StepKind;
use async_trait::async_trait;
use quill_agent::{parse_feedback, IssueNormalization, ModelInvoker};
use quill_core::{Context, Result, StructuredFeedback};
use std::sync::Arc;
use tracing::{info, instrument};

/// A unit of review work: content in, structured feedback out
///
/// Invocation failures are returned to the caller. Malformed model output is
/// not a failure; it degrades into low-information feedback.
#[async_trait]
pub trait ReviewStep: Send + Sync {
    /// Name recorded on the feedback this step produces
    fn name(&self) -> &str;

    async fn execute(&self, content: &str, context: Option<&Context>) -> Result<StructuredFeedback>;
}

/// Build the user message every step sends
pub fn review_request(content: &str) -> String {
    format!("Please review the following content:\n\n{}", content)
}

/// Review step driven entirely by a fixed system prompt
#[derive(Clone)]
pub struct PromptStep {
    name: String,
    system_prompt: String,
    invoker: Arc<dyn ModelInvoker>,
    normalization: IssueNormalization,
}

impl PromptStep {
    /// Step with the given kind's name and prompt
    pub fn new(kind: StepKind, invoker: Arc<dyn ModelInvoker>) -> Self {
        Self::custom(kind.display_name(), kind.system_prompt(), invoker)
    }

    /// Step with an arbitrary name and prompt
    pub fn custom(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        invoker: Arc<dyn ModelInvoker>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            invoker,
            normalization: IssueNormalization::Standard,
        }
    }

    pub fn with_normalization(mut self, normalization: IssueNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Run with an explicit system prompt instead of the stored one
    pub(crate) async fn execute_with_prompt(
        &self,
        system_prompt: &str,
        content: &str,
        context: Option<&Context>,
    ) -> Result<StructuredFeedback> {
        let raw = self
            .invoker
            .invoke(system_prompt, &review_request(content), context)
            .await?;

        let feedback = parse_feedback(&self.name, &raw, self.normalization);
        info!(
            "{} finished (score: {:?}, {} issues)",
            self.name,
            feedback.score,
            feedback.issues.len()
        );
        Ok(feedback)
    }
}

#[async_trait]
impl ReviewStep for PromptStep {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, content, context), fields(step = %self.name))]
    async fn execute(&self, content: &str, context: Option<&Context>) -> Result<StructuredFeedback> {
        self.execute_with_prompt(&self.system_prompt, content, context)
            .await
    }
}

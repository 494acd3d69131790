//! Debate participants and the mediator that settles them

use crate::prompts::StepKind;
use crate::step::{PromptStep, ReviewStep};
use async_trait::async_trait;
use quill_agent::ModelInvoker;
use quill_core::{Context, Result, StructuredFeedback};
use std::sync::Arc;
use tracing::instrument;

/// Participant arguing for the simplest possible wording
pub fn simplifier(invoker: Arc<dyn ModelInvoker>) -> PromptStep {
    PromptStep::new(StepKind::Simplifier, invoker)
}

/// Participant arguing for legally precise wording
pub fn legalist(invoker: Arc<dyn ModelInvoker>) -> PromptStep {
    PromptStep::new(StepKind::Legalist, invoker)
}

/// The text a participant brings to mediation
///
/// Participants that did not return a rewrite contribute their summary.
pub fn position_text(feedback: &StructuredFeedback) -> &str {
    feedback
        .rewritten_content
        .as_deref()
        .unwrap_or(feedback.summary.as_str())
}

/// Single comparison prompt holding the original and both arguments
pub fn mediation_prompt(original: &str, simplified: &str, precise: &str) -> String {
    format!(
        "ORIGINAL CONTENT:\n{}\n\n---\n\nARGUMENT A (THE SIMPLIFIER):\n{}\n\n---\n\nARGUMENT B (THE LEGALIST):\n{}\n\n---\n\nDECISION:\nSynthesize the final version.",
        original, simplified, precise
    )
}

/// Synthesizes one final text from the two debate positions
///
/// Expects a [`mediation_prompt`] as its content.
pub struct Mediator {
    step: PromptStep,
}

impl Mediator {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self {
            step: PromptStep::new(StepKind::Mediator, invoker),
        }
    }
}

#[async_trait]
impl ReviewStep for Mediator {
    fn name(&self) -> &str {
        self.step.name()
    }

    #[instrument(skip(self, content, context))]
    async fn execute(&self, content: &str, context: Option<&Context>) -> Result<StructuredFeedback> {
        self.step.execute(content, context).await
    }
}

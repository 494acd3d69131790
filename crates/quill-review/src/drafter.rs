//! First drafts from content templates

use crate::prompts::StepKind;
use crate::step::{PromptStep, ReviewStep};
use quill_agent::ModelInvoker;
use quill_core::{ContentTemplate, Result, TemplateRegistry};
use std::sync::Arc;
use tracing::{info, warn};

/// Scaffolds a draft from a named template and a short brief
pub struct TemplateDrafter {
    step: PromptStep,
    templates: TemplateRegistry,
}

impl TemplateDrafter {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self::with_templates(invoker, TemplateRegistry::builtin())
    }

    pub fn with_templates(invoker: Arc<dyn ModelInvoker>, templates: TemplateRegistry) -> Self {
        Self {
            step: PromptStep::new(StepKind::Drafter, invoker),
            templates,
        }
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Generate a markdown draft. Falls back to the model's summary when it
    /// returns no draft text.
    pub async fn generate_draft(&self, template_key: &str, brief: &str) -> Result<String> {
        let template = self.templates.get(template_key)?;
        info!("Drafting from template {}", template.key);

        let feedback = self
            .step
            .execute(&draft_request(template, brief), None)
            .await?;

        match feedback.rewritten_content {
            Some(draft) => Ok(draft),
            None => {
                warn!("Drafter returned no draft, using its summary");
                Ok(feedback.summary)
            }
        }
    }
}

fn draft_request(template: &ContentTemplate, brief: &str) -> String {
    format!(
        "GENERATE CONTENT FROM THIS TEMPLATE:\n\nTEMPLATE NAME: {}\nDESCRIPTION: {}\n\nSPECIFIC GUIDANCE:\n{}\n\nREQUIRED STRUCTURE (Markdown):\n{}\n\n---\nUSER BRIEF:\n{}",
        template.name, template.description, template.prompt_guidance, template.structure, brief
    )
}

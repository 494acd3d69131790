//! Reader simulation under a selectable persona

use crate::prompts::{StepKind, PERSONA_RESPONSE_FORMAT};
use crate::step::{PromptStep, ReviewStep};
use async_trait::async_trait;
use quill_agent::{IssueNormalization, ModelInvoker};
use quill_core::{Context, Persona, PersonaRegistry, Result, StructuredFeedback, DEFAULT_PERSONA};
use std::sync::Arc;
use tracing::{info, instrument};

/// Reads content as one of the registered personas would
///
/// The active persona is the only state a step carries between calls.
pub struct PersonaSimulator {
    step: PromptStep,
    registry: PersonaRegistry,
    active: String,
}

impl PersonaSimulator {
    /// Simulator over the built-in personas, starting with the default one
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self::with_registry(invoker, PersonaRegistry::builtin())
    }

    pub fn with_registry(invoker: Arc<dyn ModelInvoker>, registry: PersonaRegistry) -> Self {
        Self {
            step: PromptStep::new(StepKind::Persona, invoker)
                .with_normalization(IssueNormalization::Lenient),
            registry,
            active: DEFAULT_PERSONA.to_string(),
        }
    }

    /// Switch persona. Unknown keys leave the active persona unchanged.
    pub fn set_persona(&mut self, key: &str) -> Result<()> {
        self.registry.get(key)?;
        info!("Persona set to {}", key);
        self.active = key.to_string();
        Ok(())
    }

    pub fn active_key(&self) -> &str {
        &self.active
    }

    pub fn active_persona(&self) -> Result<&Persona> {
        self.registry.get(&self.active)
    }

    pub fn registry(&self) -> &PersonaRegistry {
        &self.registry
    }

    /// Persona instruction followed by the fixed response format
    pub fn system_prompt(&self) -> Result<String> {
        let persona = self.active_persona()?;
        Ok(format!("{}\n\n{}", persona.system_prompt, PERSONA_RESPONSE_FORMAT))
    }
}

#[async_trait]
impl ReviewStep for PersonaSimulator {
    fn name(&self) -> &str {
        self.step.name()
    }

    #[instrument(skip(self, content, context), fields(persona = %self.active))]
    async fn execute(&self, content: &str, context: Option<&Context>) -> Result<StructuredFeedback> {
        let system_prompt = self.system_prompt()?;
        self.step
            .execute_with_prompt(&system_prompt, content, context)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInvoker;
    use quill_core::{QuillError, Severity};

    #[tokio::test]
    async fn test_string_issues_are_promoted() {
        let invoker = Arc::new(ScriptedInvoker::new([
            r#"{"summary":"ok","score":60,"issues":["too vague"]}"#,
        ]));
        let simulator = PersonaSimulator::new(invoker);

        let feedback = simulator.execute("Apply now.", None).await.unwrap();
        assert_eq!(feedback.score, Some(60));
        assert_eq!(
            serde_json::to_value(&feedback.issues).unwrap(),
            serde_json::json!([{"description": "too vague", "severity": "Medium"}])
        );
    }

    #[tokio::test]
    async fn test_dict_issues_resolved_leniently() {
        let invoker = Arc::new(ScriptedInvoker::new([
            r#"{"summary":"confusing","issues":[{"Description":"What is a UTR?","Severity":"High"},{"text":"Deadline unclear"}]}"#,
        ]));
        let simulator = PersonaSimulator::new(invoker);

        let feedback = simulator.execute("Quote your UTR.", None).await.unwrap();
        assert_eq!(feedback.issues[0].description, "What is a UTR?");
        assert_eq!(feedback.issues[0].severity, Severity::High);
        assert_eq!(feedback.issues[1].description, "Deadline unclear");
        assert_eq!(feedback.issues[1].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn test_set_persona_changes_prompt() {
        let invoker = Arc::new(ScriptedInvoker::new([r#"{"summary":"fine"}"#]));
        let mut simulator = PersonaSimulator::new(invoker.clone());
        assert_eq!(simulator.active_key(), DEFAULT_PERSONA);

        simulator.set_persona("expert").unwrap();
        simulator.execute("text", None).await.unwrap();

        let expected = simulator.registry().get("expert").unwrap().system_prompt.clone();
        let calls = invoker.calls();
        let system = &calls[0].system;
        assert!(system.starts_with(&expected));
        assert!(system.ends_with(PERSONA_RESPONSE_FORMAT));
    }

    #[test]
    fn test_unknown_persona_rejected() {
        let mut simulator = PersonaSimulator::new(Arc::new(ScriptedInvoker::new(Vec::<String>::new())));
        let err = simulator.set_persona("pirate").unwrap_err();
        assert!(matches!(err, QuillError::UnknownPersona(_)));
        assert_eq!(simulator.active_key(), DEFAULT_PERSONA);
    }
}

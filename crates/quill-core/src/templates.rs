//! Content templates consumed by the drafting step

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{QuillError, Result};

/// Named markdown scaffold plus guidance for the drafter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTemplate {
    pub key: String,
    pub name: String,
    pub description: String,
    /// Markdown skeleton the draft must follow
    pub structure: String,
    pub prompt_guidance: String,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, ContentTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stock templates: guide, start_page, answer
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(ContentTemplate {
            key: "guide".to_string(),
            name: "Detailed guide".to_string(),
            description: "Walks through one task or process in depth. Suits complex topics."
                .to_string(),
            structure: "# [Title starting with a verb, e.g. \"Apply for...\"]\n\n\
                [Summary, at most 140 characters]\n\n\
                ## Overview\n[Who this is for and what they get]\n\n\
                ## Eligibility\n[Bulleted requirements]\n\n\
                ## How to [action]\n[Numbered steps]\n\n\
                ## After you [action]\n[What happens next]\n\n\
                ## Contact\n[Where to get help]\n"
                .to_string(),
            prompt_guidance: "Lead with the action. Address the reader as 'you'. Keep sentences short."
                .to_string(),
        });

        registry.register(ContentTemplate {
            key: "start_page".to_string(),
            name: "Start page".to_string(),
            description: "Entry point to a digital service. Has to be short and direct."
                .to_string(),
            structure: "# [Service name]\n\n\
                [What this service lets you do]\n\n\
                ## Use this service to:\n* [Task 1]\n* [Task 2]\n\n\
                ## Before you start\nYou cannot use this service if:\n* [Condition 1]\n\n\
                You'll need:\n* [Requirement 1]\n\n\
                [Start button]\n\n\
                ## Other ways to apply\n"
                .to_string(),
            prompt_guidance: "List everything the user needs before they start. Nothing else."
                .to_string(),
        });

        registry.register(ContentTemplate {
            key: "answer".to_string(),
            name: "Quick answer".to_string(),
            description: "Answers one specific question, such as 'When are bank holidays?'."
                .to_string(),
            structure: "# [Question?]\n\n\
                [The answer in one or two sentences]\n\n\
                ## [Detail or exception 1]\n[Explanation]\n\n\
                ## [Detail or exception 2]\n[Explanation]\n"
                .to_string(),
            prompt_guidance: "The first paragraph must answer the question on its own.".to_string(),
        });

        registry
    }

    pub fn register(&mut self, template: ContentTemplate) {
        self.templates.insert(template.key.clone(), template);
    }

    pub fn get(&self, key: &str) -> Result<&ContentTemplate> {
        self.templates
            .get(key)
            .ok_or_else(|| QuillError::UnknownTemplate(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentTemplate> {
        self.templates.values()
    }
}

//! Reader personas for persona simulation
//!
//! Personas are read-only data resolved at step construction time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{QuillError, Result};

/// Persona selected when none is requested
pub const DEFAULT_PERSONA: &str = "anxious";

/// A simulated reader archetype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub key: String,
    pub name: String,
    /// One-line description of who this reader is
    pub role: String,
    pub stress_level: String,
    pub reading_ability: String,
    /// Instruction that puts the model in this reader's shoes
    pub system_prompt: String,
}

/// Key -> persona lookup
#[derive(Debug, Clone, Default)]
pub struct PersonaRegistry {
    personas: BTreeMap<String, Persona>,
}

impl PersonaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three stock personas: anxious, non_native, expert
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(Persona {
            key: "anxious".to_string(),
            name: "Alex (anxious, short on time)".to_string(),
            role: "Alex is under pressure, has a deadline and is afraid of getting it wrong."
                .to_string(),
            stress_level: "High".to_string(),
            reading_ability: "Average, reduced by stress".to_string(),
            system_prompt: "You are Alex.\n\
                You are stressed and short on time: this has to be done before school pickup.\n\
                Official forms worry you because you are afraid of being fined or breaking a rule.\n\
                Read the content you are given.\n\
                Vague, ambiguous or complicated wording makes you give up reading.\n\
                Tell us:\n\
                1. Whether you knew straight away what you had to do.\n\
                2. Which sentences made you more worried.\n\
                3. Whether you read to the end."
                .to_string(),
        });

        registry.register(Persona {
            key: "non_native".to_string(),
            name: "Sam (English as a second language)".to_string(),
            role: "Sam reads English as a second language at roughly B2 level.".to_string(),
            stress_level: "Medium".to_string(),
            reading_ability: "B2: good, but idioms and dense grammar are hard".to_string(),
            system_prompt: "You are Sam.\n\
                English is your second language. You read it well, but these slow you down:\n\
                - sentences with several clauses\n\
                - rare words such as 'stipulate' or 'facilitate'\n\
                - idioms and cultural references\n\
                Read the content and point out every word or sentence you did not understand.\n\
                If you cannot work out the main action, say so."
                .to_string(),
        });

        registry.register(Persona {
            key: "expert".to_string(),
            name: "Jordan (subject matter expert)".to_string(),
            role: "Jordan knows the underlying law better than the author.".to_string(),
            stress_level: "Low".to_string(),
            reading_ability: "High".to_string(),
            system_prompt: "You are Jordan.\n\
                You practise law in this area and read guidance like this every day.\n\
                Simplification that drops legal conditions irritates you.\n\
                Read the content and point out where it is so simple that it becomes \
                inaccurate or misleading."
                .to_string(),
        });

        registry
    }

    /// Add or replace a persona under its key
    pub fn register(&mut self, persona: Persona) {
        self.personas.insert(persona.key.clone(), persona);
    }

    pub fn get(&self, key: &str) -> Result<&Persona> {
        self.personas
            .get(key)
            .ok_or_else(|| QuillError::UnknownPersona(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.personas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.values()
    }
}

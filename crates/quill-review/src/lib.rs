//! # quill-review
//!
//! Review steps for the Quill pipeline.
//!
//! Every step satisfies [`ReviewStep`]: content plus optional context in,
//! [`quill_core::StructuredFeedback`] out. Most steps are a [`PromptStep`]
//! configured with a [`StepKind`]; the rest wrap one with extra behavior:
//!
//! - [`ConsistencyReviewer`] grounds the model in similar existing content
//! - [`PersonaSimulator`] reads as a selectable persona
//! - [`Mediator`] arbitrates between the two debate participants
//! - [`TemplateDrafter`] scaffolds a first draft from a content template

mod consistency;
mod debate;
mod drafter;
mod persona;
pub mod prompts;
mod step;

#[cfg(test)]
mod testing;

pub use consistency::{ConsistencyReviewer, EXISTING_CONTENT_KEY};
pub use debate::{legalist, mediation_prompt, position_text, simplifier, Mediator};
pub use drafter::TemplateDrafter;
pub use persona::PersonaSimulator;
pub use prompts::StepKind;
pub use step::{review_request, PromptStep, ReviewStep};

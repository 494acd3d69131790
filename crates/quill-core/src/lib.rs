//! # quill-core
//!
//! Core types for the Quill content-review pipeline.
//!
//! A fixed panel of model-backed review steps examines a piece of text, the
//! rewriter addresses their feedback, and a judge decides whether another round
//! is needed. This crate holds the shapes every other crate agrees on:
//!
//! - [`StructuredFeedback`]: the uniform result of any review step
//! - [`RevisionState`]: the loop's working memory
//! - [`QuillError`]: the error taxonomy, including transient/non-transient
//!   classification of provider failures
//! - [`QuillConfig`], [`PersonaRegistry`], [`TemplateRegistry`]: read-only configuration

pub mod config;
mod error;
mod personas;
mod templates;
mod types;

pub use config::QuillConfig;
pub use error::{InvocationFailure, QuillError, Result};
pub use personas::{Persona, PersonaRegistry, DEFAULT_PERSONA};
pub use templates::{ContentTemplate, TemplateRegistry};
pub use types::*;

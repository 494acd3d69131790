//! # quill-orchestrator
//!
//! Orchestration for the Quill content-review pipeline.
//!
//! This crate provides:
//! - A pure phase state machine for one revision round ([`transition`])
//! - The revision loop engine that drives it with real review steps
//! - The debate sub-loop: two concurrent opposing rewrites and a mediator
//!
//! ## Key Pattern
//!
//! Steps are injected, never global. A [`RevisionLoop`] holds only shared,
//! read-only collaborators, so independent runs can proceed concurrently and
//! each starts from a fresh [`quill_core::RevisionState`].

mod debate;
mod loop_engine;
mod state_machine;

pub use debate::{DebateOutcome, DebateSubLoop};
pub use loop_engine::{rewrite_context, ReviewPanel, RevisionLoop};
pub use state_machine::{transition, Action, Event, Phase};

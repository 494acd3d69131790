//! # quill-agent
//!
//! Model and embedding clients for Quill review steps.
//!
//! This crate owns everything between a review step and a provider:
//! - [`ModelInvoker`]: the single "instructions in, raw text out" seam
//! - [`ModelClient`]: Anthropic / OpenAI implementation with per-attempt
//!   timeouts and bounded exponential backoff for transient failures
//! - [`Embedder`] / [`OpenAiEmbedder`]: fixed-dimension text embeddings
//! - [`parse_feedback`]: degrade-gracefully extraction of
//!   [`quill_core::StructuredFeedback`] from raw model text
//!
//! Credentials are read from the environment at first use, so every client can
//! be constructed without them.

mod auth;
mod client;
mod embedding;
mod invoker;
pub mod parse;
mod retry;
mod types;

pub use auth::resolve_api_key;
pub use client::ModelClient;
pub use embedding::{check_dimensions, Embedder, OpenAiEmbedder};
pub use invoker::{render_user_message, ModelInvoker};
pub use parse::{parse_feedback, IssueNormalization};
pub use retry::{retry_transient, RetryPolicy};
pub use types::{Provider, Usage};

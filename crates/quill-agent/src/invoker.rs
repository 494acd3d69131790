//! The "send instructions, get text back" seam every review step depends on

use async_trait::async_trait;
use quill_core::{Context, Result};

/// Provider-agnostic model invocation
///
/// Implementations own transport, retries and timeouts. Callers only see the
/// raw response text or a classified [`quill_core::QuillError`].
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Send a system instruction plus user content and return the raw reply
    async fn invoke(&self, system: &str, user: &str, aux: Option<&Context>) -> Result<String>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

/// Append the auxiliary context block to the user message
///
/// An absent or empty context leaves the message untouched.
pub fn render_user_message(user: &str, aux: Option<&Context>) -> String {
    match aux {
        Some(ctx) if !ctx.is_empty() => {
            let rendered = serde_json::to_string_pretty(ctx).unwrap_or_else(|_| "{}".to_string());
            format!("{}\n\nAdditional Context:\n{}", user, rendered)
        }
        _ => user.to_string(),
    }
}

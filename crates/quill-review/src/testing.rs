//! Hand-written invokers for unit tests

use async_trait::async_trait;
use quill_agent::ModelInvoker;
use quill_core::{Context, InvocationFailure, QuillError, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub aux: Option<Context>,
}

/// Replays canned responses in order and records every call
pub struct ScriptedInvoker {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedInvoker {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn invoke(&self, system: &str, user: &str, aux: Option<&Context>) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.to_string(),
            user: user.to_string(),
            aux: aux.cloned(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| QuillError::Other("script exhausted".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Fails every call with the given classification
pub struct FailingInvoker(pub InvocationFailure);

#[async_trait]
impl ModelInvoker for FailingInvoker {
    async fn invoke(&self, _system: &str, _user: &str, _aux: Option<&Context>) -> Result<String> {
        Err(QuillError::invocation(self.0, "scripted failure"))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

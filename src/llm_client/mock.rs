// src/llm_client/mock.rs

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use super::{LlmError, Prompt, TextGenerator};

type Responder = dyn Fn(&Prompt) -> Result<String, LlmError> + Send + Sync;

/// Generator for tests and offline runs: answers every prompt with a closure.
#[derive(Clone)]
pub struct ScriptedClient {
    responder: Arc<Responder>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Prompt) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answers with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fails as if the model returned nothing.
    pub fn failing() -> Self {
        Self::new(|_| Err(LlmError::EmptyContent))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Scripted answer to `prompt`, so one script can wrap another.
    pub fn reply(&self, prompt: &Prompt) -> Result<String, LlmError> {
        (self.responder)(prompt)
    }
}

#[async_trait]
impl TextGenerator for ScriptedClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply(prompt)
    }
}

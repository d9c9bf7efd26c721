//! Simulated chat session
//!
//! Questions are only accepted once at least one document is ready. The
//! reply is a fixed delay that toggles the loading flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::ChatConfig;
use crate::upload::{DocumentManager, Pacer, TokioPacer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("No documents are ready for questions")]
    NoDocuments,

    #[error("A previous message is still being answered")]
    Busy,
}

/// Clears the loading flag when the send completes or is dropped
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ChatSession {
    documents: DocumentManager,
    pacer: Arc<dyn Pacer>,
    config: ChatConfig,
    loading: AtomicBool,
    history: Mutex<Vec<ChatMessage>>,
}

impl ChatSession {
    pub fn new(documents: DocumentManager, config: ChatConfig) -> Self {
        Self::with_pacer(documents, config, Arc::new(TokioPacer))
    }

    pub fn with_pacer(documents: DocumentManager, config: ChatConfig, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            documents,
            pacer,
            config,
            loading: AtomicBool::new(false),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Send a question and wait for the simulated reply
    pub async fn send(&self, message: &str) -> Result<(), ChatError> {
        let text = message.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if !self.documents.has_ready_documents() {
            return Err(ChatError::NoDocuments);
        }
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ChatError::Busy);
        }
        let _loading = LoadingGuard(&self.loading);

        self.history.lock().push(ChatMessage {
            text: text.to_string(),
            sent_at: Utc::now(),
        });
        tracing::debug!(message_len = text.len(), "Chat message sent");

        self.pacer.pause(self.config.response_delay).await;

        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().clone()
    }
}

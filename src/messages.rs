use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::Config;

/// Fixed identifiers for the user-facing strings the orchestrator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageId {
    /// Replaces the transport message of a single retryable failure
    GenericFailure,
    /// Summary for a group of retryable failures
    AggregateFailure,
    /// Summary for a group of files over the size limit
    SizeAggregate,
    /// Summary for a group of files that failed validation
    ValidAggregate,
}

impl MessageId {
    pub const ALL: [MessageId; 4] = [
        MessageId::GenericFailure,
        MessageId::AggregateFailure,
        MessageId::SizeAggregate,
        MessageId::ValidAggregate,
    ];

    fn default_text(self) -> &'static str {
        match self {
            MessageId::GenericFailure => "Sorry, file has failed to upload",
            MessageId::AggregateFailure => "Sorry, files have failed to upload",
            MessageId::SizeAggregate => "Some files are too large to upload",
            MessageId::ValidAggregate => "Some files are not a supported type",
        }
    }
}

/// Source of localized strings. The orchestrator treats the returned text as opaque.
pub trait MessageProvider: Send + Sync {
    fn message(&self, id: MessageId) -> String;
}

/// English defaults with optional per-id overrides.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    overrides: HashMap<MessageId, String>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<MessageId, String>) -> Self {
        let overrides = overrides
            .into_iter()
            .filter(|(id, text)| {
                if text.trim().is_empty() {
                    log::warn!("Ignoring empty message override for {:?}", id);
                    false
                } else {
                    true
                }
            })
            .collect();
        Self { overrides }
    }

    /// Aggregate size/valid summaries reuse the per-file messages unless
    /// `config.messages` overrides them.
    pub fn from_config(config: &Config) -> Self {
        let mut overrides = HashMap::new();
        overrides.insert(MessageId::SizeAggregate, config.size_error_message.clone());
        overrides.insert(MessageId::ValidAggregate, config.valid_error_message.clone());
        overrides.extend(config.messages.clone());
        Self::with_overrides(overrides)
    }

    pub fn set(&mut self, id: MessageId, text: impl Into<String>) {
        self.overrides.insert(id, text.into());
    }
}

impl MessageProvider for MessageCatalog {
    fn message(&self, id: MessageId) -> String {
        self.overrides
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.default_text().to_string())
    }
}

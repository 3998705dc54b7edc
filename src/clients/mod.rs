pub mod elevenlabs;

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

use crate::models::transcript::Conversation;

/// Where report assembly gets call transcripts from.
#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation>;
}

/// Transcripts held in memory, keyed by conversation id.
///
/// Backs the offline `report` command (a transcript saved to disk) and the
/// test suites.
#[derive(Debug, Clone, Default)]
pub struct StaticTranscripts {
    conversations: HashMap<String, Conversation>,
}

impl StaticTranscripts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, conversation_id: impl Into<String>, conversation: Conversation) -> Self {
        self.conversations.insert(conversation_id.into(), conversation);
        self
    }

    /// Loads a conversation document saved as JSON, registering it under its
    /// own `conversation_id` (or the file stem if it has none).
    pub fn from_file(path: &Path) -> Result<(Self, String)> {
        use anyhow::Context;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript file: {}", path.display()))?;
        let conversation: Conversation = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse transcript file: {}", path.display()))?;

        let id = conversation.conversation_id.clone().unwrap_or_else(|| {
            path.file_stem()
                .map_or_else(|| "conversation".to_string(), |s| s.to_string_lossy().into_owned())
        });

        Ok((Self::new().with(id.clone(), conversation), id))
    }
}

#[async_trait::async_trait]
impl TranscriptSource for StaticTranscripts {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        self.conversations
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Conversation {conversation_id} not found"))
    }
}

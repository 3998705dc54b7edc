use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::TranscriptSource;
use crate::config::TranscriptsConfig;
use crate::models::transcript::Conversation;

const API_KEY_HEADER: &str = "xi-api-key";

/// Client for the ElevenLabs conversational-AI history API.
#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ElevenLabsClient {
    pub fn new(config: &TranscriptsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("ornotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build transcript HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// The id arrives from request bodies, so it is encoded as a single path segment.
    fn conversation_url(&self, conversation_id: &str) -> String {
        format!(
            "{}/v1/convai/conversations/{}",
            self.base_url,
            urlencoding::encode(conversation_id)
        )
    }
}

#[async_trait::async_trait]
impl TranscriptSource for ElevenLabsClient {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        if self.api_key.is_empty() {
            anyhow::bail!("Transcript API key is not configured");
        }

        let url = self.conversation_url(conversation_id);
        debug!(conversation_id, "Fetching conversation transcript");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("Transcript request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Transcript service returned {status}: {body}");
        }

        response
            .json::<Conversation>()
            .await
            .context("Failed to decode conversation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_url_trims_slash() {
        let config = TranscriptsConfig {
            base_url: "https://api.example.test/".to_string(),
            api_key: "key".to_string(),
            request_timeout_seconds: 5,
        };
        let client = ElevenLabsClient::new(&config).unwrap();
        assert_eq!(
            client.conversation_url("conv_123"),
            "https://api.example.test/v1/convai/conversations/conv_123"
        );
    }

    #[test]
    fn test_conversation_id_stays_in_one_segment() {
        let config = TranscriptsConfig {
            base_url: "https://api.example.test".to_string(),
            api_key: "key".to_string(),
            request_timeout_seconds: 5,
        };
        let client = ElevenLabsClient::new(&config).unwrap();

        let url = client.conversation_url("../../user?x=1");
        assert_eq!(
            url,
            "https://api.example.test/v1/convai/conversations/..%2F..%2Fuser%3Fx%3D1"
        );

        let parsed = reqwest::Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/v1/convai/conversations/..%2F..%2Fuser%3Fx%3D1");
        assert_eq!(parsed.query(), None);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let client = ElevenLabsClient::new(&TranscriptsConfig::default()).unwrap();
        let err = client.get_conversation("conv_123").await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}

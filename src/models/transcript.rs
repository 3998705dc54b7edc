//! Conversation payload returned by the conversational-AI service.
//!
//! Only the fields the report needs are modelled; everything else in the
//! upstream document is ignored. Missing sections deserialize to defaults so
//! a conversation that is still being analysed yields an empty summary rather
//! than a decode failure.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub conversation_id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub transcript: Vec<Turn>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ConversationMetadata,

    #[serde(default, deserialize_with = "null_as_default")]
    pub analysis: ConversationAnalysis,
}

impl Conversation {
    #[must_use]
    pub fn summary(&self) -> &str {
        self.analysis.transcript_summary.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub const fn duration_secs(&self) -> f64 {
        self.metadata.call_duration_secs
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationMetadata {
    #[serde(default)]
    pub call_duration_secs: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationAnalysis {
    #[serde(default)]
    pub transcript_summary: Option<String>,
}

/// One conversational turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// A tool invocation embedded in a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub tool_name: Option<String>,

    /// Either a JSON-encoded string or an already structured object.
    #[serde(default)]
    pub params_as_json: serde_json::Value,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_upstream_shape() {
        let json = r#"{
            "agent_id": "agent_1",
            "conversation_id": "conv_1",
            "status": "done",
            "transcript": [
                {"role": "user", "message": "Start the surgery", "tool_calls": null},
                {"role": "agent", "message": null, "tool_calls": [
                    {"request_id": "r1", "tool_name": "displayEvent",
                     "params_as_json": "{\"eventType\":\"medicine\",\"eventValue\":\"Surgery started\"}",
                     "tool_has_been_called": true}
                ]}
            ],
            "metadata": {"start_time_unix_secs": 1717236000, "call_duration_secs": 42},
            "analysis": {"transcript_summary": "Surgery went well."}
        }"#;

        let conversation: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conversation.conversation_id.as_deref(), Some("conv_1"));
        assert_eq!(conversation.transcript.len(), 2);
        assert!(conversation.transcript[0].tool_calls.is_none());
        assert_eq!(conversation.summary(), "Surgery went well.");
        assert!((conversation.duration_secs() - 42.0).abs() < f64::EPSILON);

        let call = &conversation.transcript[1].tool_calls.as_ref().unwrap()[0];
        assert_eq!(call.tool_name.as_deref(), Some("displayEvent"));
        assert!(call.params_as_json.is_string());
    }

    #[test]
    fn test_missing_analysis_is_empty_summary() {
        let json = r#"{"transcript": [], "analysis": null}"#;
        let conversation: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conversation.summary(), "");
        assert!(conversation.duration_secs().abs() < f64::EPSILON);
    }
}

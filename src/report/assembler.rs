//! Turns a call transcript into the rows of the surgery report.
//!
//! Extraction is pure and tolerant: every `displayEvent` tool call either
//! becomes a [`DisplayEvent`] or a [`SkippedToolCall`] explaining why it was
//! dropped. Enrichment then looks each parsed event up in the store to find
//! when it was logged.

use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::timezone::utc_to_local;
use crate::constants::report::{DISPLAY_EVENT_TOOL, EVENT_TYPE_KEY, EVENT_VALUE_KEY};
use crate::db::Store;
use crate::models::transcript::Turn;

/// Looks up when an event with a given value was logged for an operation.
#[async_trait::async_trait]
pub trait EventTimestamps: Send + Sync {
    async fn stored_timestamp(
        &self,
        operation_id: i32,
        event_value: &str,
    ) -> anyhow::Result<Option<String>>;
}

#[async_trait::async_trait]
impl EventTimestamps for Store {
    async fn stored_timestamp(
        &self,
        operation_id: i32,
        event_value: &str,
    ) -> anyhow::Result<Option<String>> {
        self.find_event_timestamp(operation_id, event_value).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEvent {
    pub event_type: String,
    pub event_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidJson(String),
    NotAnObject,
    MissingField(&'static str),
    NonStringField(&'static str),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(e) => write!(f, "parameters are not valid JSON: {e}"),
            Self::NotAnObject => write!(f, "parameters are not a JSON object"),
            Self::MissingField(name) => write!(f, "missing `{name}`"),
            Self::NonStringField(name) => write!(f, "`{name}` is not a string"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedToolCall {
    /// Index of the turn in the transcript
    pub turn: usize,
    /// Index of the call within that turn
    pub call: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCallOutcome {
    Parsed(DisplayEvent),
    Skipped(SkippedToolCall),
}

/// One line of the event table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    /// Local wall clock, or empty when no stored event matched
    pub timestamp: String,
    pub event_type: String,
    pub event_value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledReport {
    pub rows: Vec<ReportRow>,
    pub summary: String,
    pub duration_secs: f64,
    pub diagnostics: Vec<SkippedToolCall>,
}

/// Decodes `displayEvent` parameters, which arrive either as a JSON string or
/// as an already structured object.
pub fn parse_display_params(params: &Value) -> Result<DisplayEvent, SkipReason> {
    let decoded;
    let object = match params {
        Value::String(raw) => {
            decoded = serde_json::from_str::<Value>(raw)
                .map_err(|e| SkipReason::InvalidJson(e.to_string()))?;
            decoded.as_object().ok_or(SkipReason::NotAnObject)?
        }
        Value::Object(map) => map,
        _ => return Err(SkipReason::NotAnObject),
    };

    let field = |name: &'static str| -> Result<String, SkipReason> {
        match object.get(name) {
            None | Some(Value::Null) => Err(SkipReason::MissingField(name)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(SkipReason::NonStringField(name)),
        }
    };

    Ok(DisplayEvent {
        event_type: field(EVENT_TYPE_KEY)?,
        event_value: field(EVENT_VALUE_KEY)?,
    })
}

/// Walks the transcript in order and classifies every `displayEvent` call.
/// Calls to other tools are not reported at all.
#[must_use]
pub fn extract_display_events(turns: &[Turn]) -> Vec<ToolCallOutcome> {
    let mut outcomes = Vec::new();

    for (turn_index, turn) in turns.iter().enumerate() {
        let Some(calls) = turn.tool_calls.as_deref() else {
            continue;
        };

        for (call_index, call) in calls.iter().enumerate() {
            if call.tool_name.as_deref() != Some(DISPLAY_EVENT_TOOL) {
                continue;
            }

            let outcome = match parse_display_params(&call.params_as_json) {
                Ok(event) => ToolCallOutcome::Parsed(event),
                Err(reason) => ToolCallOutcome::Skipped(SkippedToolCall {
                    turn: turn_index,
                    call: call_index,
                    reason,
                }),
            };
            outcomes.push(outcome);
        }
    }

    outcomes
}

pub struct ReportAssembler {
    tz: Tz,
}

impl ReportAssembler {
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Builds the report rows in transcript order.
    ///
    /// A value with no stored event gets an empty timestamp. Store failures
    /// propagate; malformed tool calls only end up in `diagnostics`.
    pub async fn assemble(
        &self,
        lookup: &dyn EventTimestamps,
        operation_id: i32,
        turns: &[Turn],
        summary: &str,
        duration_secs: f64,
    ) -> anyhow::Result<AssembledReport> {
        let mut rows = Vec::new();
        let mut diagnostics = Vec::new();

        for outcome in extract_display_events(turns) {
            match outcome {
                ToolCallOutcome::Parsed(event) => {
                    let stored = lookup
                        .stored_timestamp(operation_id, &event.event_value)
                        .await?;
                    let timestamp = stored.map_or_else(String::new, |ts| self.localize(&ts));

                    rows.push(ReportRow {
                        timestamp,
                        event_type: event.event_type,
                        event_value: event.event_value,
                    });
                }
                ToolCallOutcome::Skipped(skipped) => {
                    warn!(
                        operation_id,
                        turn = skipped.turn,
                        call = skipped.call,
                        reason = %skipped.reason,
                        "Skipping malformed displayEvent call"
                    );
                    diagnostics.push(skipped);
                }
            }
        }

        if !diagnostics.is_empty() {
            metrics::counter!("report_tool_calls_skipped_total").increment(diagnostics.len() as u64);
        }
        debug!(
            operation_id,
            rows = rows.len(),
            skipped = diagnostics.len(),
            "Report assembled"
        );

        Ok(AssembledReport {
            rows,
            summary: summary.to_string(),
            duration_secs,
            diagnostics,
        })
    }

    fn localize(&self, stored: &str) -> String {
        utc_to_local(stored, self.tz).unwrap_or_else(|e| {
            warn!(stored, error = %e, "Stored event timestamp is not in the expected format");
            stored.to_string()
        })
    }
}

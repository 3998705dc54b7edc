//! Fetch, assemble and render a surgery report.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::TranscriptSource;
use crate::config::ReportConfig;
use crate::db::Store;
use crate::report::{
    AssembledReport, Letterhead, PatientDetails, RenderedReport, ReportAssembler, ReportError,
    render,
};

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub conversation_id: String,
    pub operation_id: i32,
    pub patient: PatientDetails,
}

#[derive(Debug)]
pub struct GeneratedReport {
    pub document: RenderedReport,
    /// `displayEvent` calls dropped because their parameters were unusable
    pub skipped_events: usize,
}

pub struct ReportService {
    store: Store,
    transcripts: Arc<dyn TranscriptSource>,
    assembler: ReportAssembler,
    letterhead: Letterhead,
}

impl ReportService {
    pub fn new(
        store: Store,
        transcripts: Arc<dyn TranscriptSource>,
        config: &ReportConfig,
    ) -> anyhow::Result<Self> {
        let tz = config
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid report timezone '{}': {e}", config.timezone))?;

        Ok(Self {
            store,
            transcripts,
            assembler: ReportAssembler::new(tz),
            letterhead: Letterhead {
                logo_path: config.logo_path.as_ref().map(PathBuf::from),
                branding: config.branding.clone(),
            },
        })
    }

    pub async fn generate(&self, request: &ReportRequest) -> Result<GeneratedReport, ReportError> {
        let operation = self
            .store
            .get_operation(request.operation_id)
            .await
            .map_err(|e| ReportError::Store(e.to_string()))?;
        if operation.is_none() {
            return Err(ReportError::OperationNotFound(request.operation_id));
        }

        let conversation = self
            .transcripts
            .get_conversation(&request.conversation_id)
            .await
            .map_err(|e| {
                warn!(
                    conversation_id = %request.conversation_id,
                    error = %e,
                    "Transcript fetch failed"
                );
                ReportError::Transcript(format!("{e:#}"))
            })?;

        let assembled = self
            .assembler
            .assemble(
                &self.store,
                request.operation_id,
                &conversation.transcript,
                conversation.summary(),
                conversation.duration_secs(),
            )
            .await
            .map_err(|e| ReportError::Store(e.to_string()))?;

        let skipped_events = assembled.diagnostics.len();
        let document = self.render(request.patient.clone(), assembled).await?;

        metrics::counter!("reports_generated_total").increment(1);
        info!(
            operation_id = request.operation_id,
            conversation_id = %request.conversation_id,
            pages = document.pages,
            skipped_events,
            "Surgery report generated"
        );

        Ok(GeneratedReport {
            document,
            skipped_events,
        })
    }

    async fn render(
        &self,
        patient: PatientDetails,
        assembled: AssembledReport,
    ) -> Result<RenderedReport, ReportError> {
        let letterhead = self.letterhead.clone();
        tokio::task::spawn_blocking(move || render(&patient, &assembled, &letterhead))
            .await
            .map_err(|e| ReportError::Render(format!("Render task panicked: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::StaticTranscripts;
    use crate::config::SecurityConfig;
    use crate::models::event::NewEvent;
    use crate::models::operation::NewOperation;
    use crate::models::transcript::Conversation;
    use crate::models::user::NewUser;

    fn conversation(values: &[&str]) -> Conversation {
        let calls: Vec<serde_json::Value> = values
            .iter()
            .map(|v| {
                serde_json::json!({
                    "tool_name": "displayEvent",
                    "params_as_json": serde_json::json!({"eventType": "medicine", "eventValue": v}).to_string(),
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({
            "conversation_id": "conv_1",
            "transcript": [{"role": "agent", "message": null, "tool_calls": calls}],
            "metadata": {"call_duration_secs": 42},
            "analysis": {"transcript_summary": "Routine procedure."}
        }))
        .unwrap()
    }

    async fn store_with_operation() -> (Store, i32) {
        let path = std::env::temp_dir().join(format!("ornotes-report-test-{}.db", uuid::Uuid::new_v4()));
        let store = Store::new(&format!("sqlite:{}", path.display())).await.unwrap();
        let user = store
            .create_user(
                NewUser {
                    first_name: "Jan".to_string(),
                    last_name: "Kowalski".to_string(),
                    role: "Doctor".to_string(),
                    email: "jan@example.com".to_string(),
                    password: "password123".to_string(),
                },
                &SecurityConfig {
                    argon2_memory_cost_kib: 1024,
                    argon2_time_cost: 1,
                    ..SecurityConfig::default()
                },
            )
            .await
            .unwrap();
        let operation_id = store
            .create_operation(NewOperation {
                room_id: 1,
                user_id: user.id,
                patient_first_name: "Tomasz".to_string(),
                patient_last_name: "Lis".to_string(),
                patient_id: "90010112345".to_string(),
                operation_type: "Appendectomy".to_string(),
            })
            .await
            .unwrap();
        (store, operation_id)
    }

    fn request(operation_id: i32, conversation_id: &str) -> ReportRequest {
        ReportRequest {
            conversation_id: conversation_id.to_string(),
            operation_id,
            patient: PatientDetails {
                first_name: "Tomasz".to_string(),
                last_name: "Lis".to_string(),
                procedure: "Appendectomy".to_string(),
                patient_id: "90010112345".to_string(),
            },
        }
    }

    fn config() -> ReportConfig {
        ReportConfig {
            logo_path: None,
            ..ReportConfig::default()
        }
    }

    #[tokio::test]
    async fn test_generate_report() {
        let (store, operation_id) = store_with_operation().await;
        store
            .append_event(NewEvent {
                operation_id,
                event_type: "medicine".to_string(),
                event_value: "Surgery started".to_string(),
            })
            .await
            .unwrap();

        let transcripts = StaticTranscripts::new().with("conv_1", conversation(&["Surgery started"]));
        let service = ReportService::new(store, Arc::new(transcripts), &config()).unwrap();

        let report = service.generate(&request(operation_id, "conv_1")).await.unwrap();
        assert!(report.document.bytes.starts_with(b"%PDF"));
        assert_eq!(report.document.filename, "surgery_report_90010112345.pdf");
        assert_eq!(report.skipped_events, 0);
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_transcript_error() {
        let (store, operation_id) = store_with_operation().await;
        let service = ReportService::new(store, Arc::new(StaticTranscripts::new()), &config()).unwrap();

        let err = service.generate(&request(operation_id, "missing")).await.unwrap_err();
        assert!(matches!(err, ReportError::Transcript(_)));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let (store, _) = store_with_operation().await;
        let transcripts = StaticTranscripts::new().with("conv_1", conversation(&[]));
        let service = ReportService::new(store, Arc::new(transcripts), &config()).unwrap();

        let err = service.generate(&request(999, "conv_1")).await.unwrap_err();
        assert!(matches!(err, ReportError::OperationNotFound(999)));
    }

    #[tokio::test]
    async fn test_invalid_timezone_is_rejected() {
        let config = ReportConfig {
            timezone: "Mars/Olympus".to_string(),
            ..ReportConfig::default()
        };
        let (store, _) = store_with_operation().await;
        assert!(ReportService::new(store, Arc::new(StaticTranscripts::new()), &config).is_err());
    }
}

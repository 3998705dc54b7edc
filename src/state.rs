use std::sync::Arc;

use crate::clients::TranscriptSource;
use crate::clients::elevenlabs::ElevenLabsClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, ReportService, SeaOrmAuthService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub report_service: Arc<ReportService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let transcripts = Arc::new(ElevenLabsClient::new(&config.transcripts)?);
        Self::with_transcripts(config, transcripts).await
    }

    /// Same as [`SharedState::new`] but with the transcript source supplied
    /// by the caller.
    pub async fn with_transcripts(
        config: Config,
        transcripts: Arc<dyn TranscriptSource>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let report_service = Arc::new(ReportService::new(
            store.clone(),
            transcripts,
            &config.report,
        )?);

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
            report_service,
        })
    }
}

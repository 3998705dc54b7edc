use crate::config::SecurityConfig;
use crate::models::event::{Event, NewEvent};
use crate::models::operation::{NewOperation, Operation};
use crate::models::room::OperatingRoom;
use crate::models::user::{NewUser, User};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

mod fixtures;
pub mod migrator;
pub mod repositories;

pub use fixtures::SeedSummary;

/// Names of the tables owned by the migrations.
pub const TABLES: [&str; 4] = ["users", "operating_rooms", "operations", "events"];

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `:memory:` is a separate database.
        let max_connections = if in_memory { 1 } else { max_connections };
        let min_connections = min_connections.min(max_connections);

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Names of the application tables that currently exist, sorted.
    pub async fn existing_tables(&self) -> Result<Vec<String>> {
        let backend = self.conn.get_database_backend();
        let rows = self
            .conn
            .query_all(Statement::from_string(
                backend,
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name".to_string(),
            ))
            .await?;

        let mut names = Vec::new();
        for row in rows {
            let name: String = row.try_get("", "name")?;
            if TABLES.contains(&name.as_str()) {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn room_repo(&self) -> repositories::room::RoomRepository {
        repositories::room::RoomRepository::new(self.conn.clone())
    }

    fn operation_repo(&self) -> repositories::operation::OperationRepository {
        repositories::operation::OperationRepository::new(self.conn.clone())
    }

    fn event_repo(&self) -> repositories::event::EventRepository {
        repositories::event::EventRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    // Operating rooms

    pub async fn list_rooms(&self) -> Result<Vec<OperatingRoom>> {
        self.room_repo().list().await
    }

    pub async fn get_room(&self, id: i32) -> Result<Option<OperatingRoom>> {
        self.room_repo().get(id).await
    }

    // Operations

    pub async fn create_operation(&self, new: NewOperation) -> Result<i32> {
        self.operation_repo().create(new).await
    }

    pub async fn get_operation(&self, id: i32) -> Result<Option<Operation>> {
        self.operation_repo().get(id).await
    }

    pub async fn last_operation_id(&self) -> Result<Option<i32>> {
        self.operation_repo().last_with_events().await
    }

    // Events

    pub async fn append_event(&self, new: NewEvent) -> Result<Event> {
        self.event_repo().append(new).await
    }

    pub async fn list_events(&self, operation_id: i32) -> Result<Vec<Event>> {
        self.event_repo().list_for_operation(operation_id).await
    }

    pub async fn find_event_timestamp(
        &self,
        operation_id: i32,
        event_value: &str,
    ) -> Result<Option<String>> {
        self.event_repo().find_timestamp(operation_id, event_value).await
    }

    // Fixtures

    pub async fn seed_sample_data(&self, security: &SecurityConfig) -> Result<SeedSummary> {
        fixtures::seed(&self.conn, security).await
    }
}

use crate::entities::{events, prelude::*};
use crate::models::event::{Event, NewEvent};
use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

pub struct EventRepository {
    conn: DatabaseConnection,
}

impl EventRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: events::Model) -> Event {
        Event {
            id: m.id,
            operation_id: m.operation_id,
            timestamp: m.timestamp,
            event_type: m.event_type,
            event_value: m.event_value,
        }
    }

    /// Inserts the event and reads it back so the caller sees the
    /// database-assigned timestamp.
    pub async fn append(&self, new: NewEvent) -> Result<Event> {
        let active_model = events::ActiveModel {
            operation_id: Set(new.operation_id),
            event_type: Set(new.event_type),
            event_value: Set(new.event_value),
            ..Default::default()
        };

        let res = Events::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to insert event")?;

        let row = Events::find_by_id(res.last_insert_id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Event {} vanished after insert", res.last_insert_id))?;

        Ok(Self::map_model(row))
    }

    pub async fn list_for_operation(&self, operation_id: i32) -> Result<Vec<Event>> {
        let rows = Events::find()
            .filter(events::Column::OperationId.eq(operation_id))
            .order_by_asc(events::Column::Timestamp)
            .order_by_asc(events::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Stored timestamp of the earliest event in `operation_id` whose value
    /// equals `event_value`. Repeated values all resolve to that first row.
    pub async fn find_timestamp(&self, operation_id: i32, event_value: &str) -> Result<Option<String>> {
        let row = Events::find()
            .filter(events::Column::OperationId.eq(operation_id))
            .filter(events::Column::EventValue.eq(event_value))
            .order_by_asc(events::Column::Timestamp)
            .order_by_asc(events::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to look up event timestamp")?;

        Ok(row.map(|r| r.timestamp))
    }
}

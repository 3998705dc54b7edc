use crate::entities::{events, operations, prelude::*};
use crate::models::operation::{NewOperation, Operation};
use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QuerySelect, Set};

pub struct OperationRepository {
    conn: DatabaseConnection,
}

impl OperationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: operations::Model) -> Operation {
        Operation {
            id: m.id,
            room_id: m.room_id,
            user_id: m.user_id,
            patient_first_name: m.patient_first_name,
            patient_last_name: m.patient_last_name,
            patient_id: m.patient_id,
            operation_type: m.operation_type,
        }
    }

    pub async fn create(&self, new: NewOperation) -> Result<i32> {
        let active_model = operations::ActiveModel {
            room_id: Set(new.room_id),
            user_id: Set(new.user_id),
            patient_first_name: Set(new.patient_first_name),
            patient_last_name: Set(new.patient_last_name),
            patient_id: Set(new.patient_id),
            operation_type: Set(new.operation_type),
            ..Default::default()
        };

        let res = Operations::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to insert operation")?;

        Ok(res.last_insert_id)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Operation>> {
        let row = Operations::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    /// Highest operation id that has at least one logged event.
    pub async fn last_with_events(&self) -> Result<Option<i32>> {
        let max: Option<Option<i32>> = Events::find()
            .select_only()
            .column_as(events::Column::OperationId.max(), "max_operation_id")
            .into_tuple()
            .one(&self.conn)
            .await
            .context("Failed to query last operation id")?;

        Ok(max.flatten())
    }
}

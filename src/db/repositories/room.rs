use crate::entities::{operating_rooms, prelude::*};
use crate::models::room::OperatingRoom;
use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

pub struct RoomRepository {
    conn: DatabaseConnection,
}

impl RoomRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: operating_rooms::Model) -> OperatingRoom {
        OperatingRoom {
            id: m.id,
            name: m.name,
            is_available: m.is_available,
        }
    }

    pub async fn list(&self) -> Result<Vec<OperatingRoom>> {
        let rows = OperatingRooms::find()
            .order_by_asc(operating_rooms::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<OperatingRoom>> {
        let row = OperatingRooms::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }
}

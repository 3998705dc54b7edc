use crate::constants::rooms::SEEDED;
use crate::entities::{operating_rooms, prelude::OperatingRooms};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert()
            .into_table(OperatingRooms)
            .columns([
                operating_rooms::Column::Name,
                operating_rooms::Column::IsAvailable,
            ])
            .to_owned();

        for (name, available) in SEEDED {
            insert.values_panic([(*name).into(), (*available).into()]);
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete().from_table(OperatingRooms).to_owned();
        manager.exec_stmt(delete).await
    }
}

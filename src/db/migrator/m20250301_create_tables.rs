use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::FirstName).string().not_null())
                    .col(ColumnDef::new(Users::LastName).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OperatingRooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OperatingRooms::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OperatingRooms::Name).string().not_null())
                    .col(
                        ColumnDef::new(OperatingRooms::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Operations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Operations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Operations::RoomId).integer().not_null())
                    .col(ColumnDef::new(Operations::UserId).integer().not_null())
                    .col(ColumnDef::new(Operations::PatientFirstName).string().not_null())
                    .col(ColumnDef::new(Operations::PatientLastName).string().not_null())
                    .col(ColumnDef::new(Operations::PatientId).string().not_null())
                    .col(ColumnDef::new(Operations::OperationType).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_operations_room")
                            .from(Operations::Table, Operations::RoomId)
                            .to(OperatingRooms::Table, OperatingRooms::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_operations_user")
                            .from(Operations::Table, Operations::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Events::OperationId).integer().not_null())
                    .col(
                        ColumnDef::new(Events::Timestamp)
                            .text()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_owned()),
                    )
                    .col(ColumnDef::new(Events::EventType).string().not_null())
                    .col(ColumnDef::new(Events::EventValue).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_operation")
                            .from(Events::Table, Events::OperationId)
                            .to(Operations::Table, Operations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Report assembly looks events up by (operation, value)
        manager
            .create_index(
                Index::create()
                    .name("idx_events_operation_value")
                    .table(Events::Table)
                    .col(Events::OperationId)
                    .col(Events::EventValue)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Operations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OperatingRooms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    FirstName,
    LastName,
    Role,
    Email,
    PasswordHash,
}

#[derive(Iden)]
enum OperatingRooms {
    Table,
    Id,
    Name,
    IsAvailable,
}

#[derive(Iden)]
enum Operations {
    Table,
    Id,
    RoomId,
    UserId,
    PatientFirstName,
    PatientLastName,
    PatientId,
    OperationType,
}

#[derive(Iden)]
enum Events {
    Table,
    Id,
    OperationId,
    Timestamp,
    EventType,
    EventValue,
}

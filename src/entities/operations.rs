use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "operations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub room_id: i32,
    pub user_id: i32,
    pub patient_first_name: String,
    pub patient_last_name: String,
    /// National patient identifier
    pub patient_id: String,
    pub operation_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::operating_rooms::Entity",
        from = "Column::RoomId",
        to = "super::operating_rooms::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    OperatingRoom,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    User,

    #[sea_orm(has_many = "super::events::Entity")]
    Events,
}

impl Related<super::operating_rooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OperatingRoom.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

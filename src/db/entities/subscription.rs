use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Plan limits of an account. Written by the billing side, read here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub plan: String,   // free, pro, business, enterprise
    pub status: String, // active, cancelled, expired
    pub max_websites: i32,
    pub min_check_interval: i32,
    pub history_days: i32,
    pub email_alerts: bool,
    pub sms_alerts: bool,
    pub started_at: ChronoDateTimeUtc,
    #[sea_orm(nullable)]
    pub expires_at: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

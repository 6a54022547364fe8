use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An account owning monitored targets.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::target::Entity")]
    Targets,

    #[sea_orm(has_one = "super::subscription::Entity")]
    Subscription,

    #[sea_orm(has_many = "super::alert_channel::Entity")]
    AlertChannels,
}

impl Related<super::target::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Targets.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl Related<super::alert_channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertChannels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

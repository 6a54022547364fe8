use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::entities::alert_channel;

pub async fn create_channel<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    channel_type: &str,
    config: serde_json::Value,
) -> Result<alert_channel::Model, DbErr> {
    alert_channel::ActiveModel {
        user_id: Set(user_id),
        channel_type: Set(channel_type.to_string()),
        config: Set(config),
        is_enabled: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

pub async fn get_enabled_channels_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<Vec<alert_channel::Model>, DbErr> {
    alert_channel::Entity::find()
        .filter(alert_channel::Column::UserId.eq(user_id))
        .filter(alert_channel::Column::IsEnabled.eq(true))
        .order_by_asc(alert_channel::Column::Id)
        .all(conn)
        .await
}

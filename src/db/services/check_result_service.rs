use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::db::entities::check_result;
use crate::monitoring::models::CheckResult;

pub async fn insert_check_result<C: ConnectionTrait>(
    conn: &C,
    result: &CheckResult,
) -> Result<check_result::Model, DbErr> {
    check_result::ActiveModel {
        target_id: Set(result.target_id),
        checked_at: Set(result.checked_at),
        status: Set(result.status.to_string()),
        response_time_ms: Set(result.response_time_ms),
        status_code: Set(result.status_code.map(i32::from)),
        error_message: Set(result.error_message.clone()),
        location: Set(result.location.clone()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

/// Newest first.
pub async fn get_recent_check_results<C: ConnectionTrait>(
    conn: &C,
    target_id: i32,
    limit: u64,
) -> Result<Vec<check_result::Model>, DbErr> {
    check_result::Entity::find()
        .filter(check_result::Column::TargetId.eq(target_id))
        .order_by_desc(check_result::Column::CheckedAt)
        .limit(limit)
        .all(conn)
        .await
}

pub async fn delete_check_results_before<C: ConnectionTrait>(
    conn: &C,
    target_ids: &[i32],
    cutoff: DateTime<Utc>,
) -> Result<u64, DbErr> {
    if target_ids.is_empty() {
        return Ok(0);
    }
    let result = check_result::Entity::delete_many()
        .filter(check_result::Column::TargetId.is_in(target_ids.iter().copied()))
        .filter(check_result::Column::CheckedAt.lt(cutoff))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

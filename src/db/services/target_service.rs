//! Target reads and the status writes the scheduler is allowed to make.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::db::entities::target;
use crate::monitoring::models::Status;

pub async fn get_active_targets<C: ConnectionTrait>(conn: &C) -> Result<Vec<target::Model>, DbErr> {
    target::Entity::find()
        .filter(target::Column::IsActive.eq(true))
        .order_by_asc(target::Column::Id)
        .all(conn)
        .await
}

pub async fn get_target_by_id<C: ConnectionTrait>(
    conn: &C,
    target_id: i32,
) -> Result<Option<target::Model>, DbErr> {
    target::Entity::find_by_id(target_id).one(conn).await
}

pub async fn get_target_ids_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<Vec<i32>, DbErr> {
    target::Entity::find()
        .select_only()
        .column(target::Column::Id)
        .filter(target::Column::UserId.eq(user_id))
        .into_tuple::<i32>()
        .all(conn)
        .await
}

/// Distinct owners of at least one target.
pub async fn get_user_ids_with_targets<C: ConnectionTrait>(conn: &C) -> Result<Vec<i32>, DbErr> {
    target::Entity::find()
        .select_only()
        .column(target::Column::UserId)
        .distinct()
        .order_by_asc(target::Column::UserId)
        .into_tuple::<i32>()
        .all(conn)
        .await
}

/// Writes the new status and check time. Returns `false` if the target is gone.
pub async fn update_target_status<C: ConnectionTrait>(
    conn: &C,
    target_id: i32,
    status: Status,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let mut update = target::Entity::update_many()
        .col_expr(target::Column::CurrentStatus, Expr::value(status.as_str()))
        .col_expr(target::Column::LastChecked, Expr::value(now));
    update = match status {
        Status::Up => update.col_expr(target::Column::LastUp, Expr::value(now)),
        Status::Down => update.col_expr(target::Column::LastDown, Expr::value(now)),
        Status::Unknown => update,
    };
    let result = update
        .filter(target::Column::Id.eq(target_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

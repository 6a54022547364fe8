use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::info;

use super::entities::{alert_channel, check_result, subscription, target, user};

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Creates any missing table straight from the entity definitions.
///
/// Meant for local SQLite setups and tests. Production databases are owned by
/// the web application's migrations.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, user::Entity).await?;
    create_table(db, subscription::Entity).await?;
    create_table(db, target::Entity).await?;
    create_table(db, check_result::Entity).await?;
    create_table(db, alert_channel::Entity).await?;
    info!("Database schema ensured.");
    Ok(())
}

/// A private in-memory SQLite database with the schema applied.
#[cfg(test)]
pub(crate) async fn memory_database() -> DatabaseConnection {
    use sea_orm::{ConnectOptions, Database};

    // One connection, otherwise every pooled connection gets its own database.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("in-memory sqlite should open");
    ensure_schema(&db).await.expect("schema should apply");
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let db = memory_database().await;
        ensure_schema(&db).await.unwrap();
        assert!(user::Entity::find().all(&db).await.unwrap().is_empty());
        assert!(target::Entity::find().all(&db).await.unwrap().is_empty());
    }
}

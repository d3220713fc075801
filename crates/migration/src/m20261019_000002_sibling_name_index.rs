//! Storage-level backstop for unique sibling names.
//!
//! Only live rows take part, and root categories (NULL parent) share one
//! group, hence the expression + partial index. sea-query has no builder for
//! that shape, so the statement is written by hand; SQLite and PostgreSQL both
//! accept it.

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEX_NAME: &str = "idx-categories-live-sibling-name-unique";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{INDEX_NAME}\" \
                 ON categories (company_id, COALESCE(parent_id, ''), name) \
                 WHERE deleted_at IS NULL"
            ))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!("DROP INDEX IF EXISTS \"{INDEX_NAME}\""))
            .await?;
        Ok(())
    }
}

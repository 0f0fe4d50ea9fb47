use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `username` and `access_tokens.token` are unique at the column level; these
/// cover the linked-account identity and the lookup paths.
const INDEXES: &[(&str, &str)] = &[
    (
        "idx_linked_accounts_identity_unique",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_linked_accounts_identity_unique ON linked_accounts(account_type, account_id)",
    ),
    (
        "idx_linked_accounts_type",
        "CREATE INDEX IF NOT EXISTS idx_linked_accounts_type ON linked_accounts(account_type)",
    ),
    (
        "idx_linked_accounts_token",
        "CREATE INDEX IF NOT EXISTS idx_linked_accounts_token ON linked_accounts(token)",
    ),
    (
        "idx_access_tokens_user_issued",
        "CREATE INDEX IF NOT EXISTS idx_access_tokens_user_issued ON access_tokens(user_id, issued_at)",
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for (_, sql) in INDEXES {
            conn.execute_unprepared(sql).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for (name, _) in INDEXES {
            conn.execute_unprepared(&format!("DROP INDEX IF EXISTS {name}"))
                .await?;
        }

        Ok(())
    }
}

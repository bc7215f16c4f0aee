//! Create poll table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Poll::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Poll::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Poll::Title).string_len(50).not_null())
                    .col(ColumnDef::new(Poll::Description).text())
                    .col(
                        ColumnDef::new(Poll::StartedAt)
                            .date()
                            .not_null()
                            .default(Expr::current_date()),
                    )
                    .col(ColumnDef::new(Poll::FinishedAt).date())
                    .to_owned(),
            )
            .await?;

        // Index: started_at (default listing order)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_started_at")
                    .table(Poll::Table)
                    .col(Poll::StartedAt)
                    .to_owned(),
            )
            .await?;

        // Index: finished_at (visibility filter)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_finished_at")
                    .table(Poll::Table)
                    .col(Poll::FinishedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Poll::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
    Title,
    Description,
    StartedAt,
    FinishedAt,
}

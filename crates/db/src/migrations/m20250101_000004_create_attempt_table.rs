//! Create attempt and answer tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create attempt table
        manager
            .create_table(
                Table::create()
                    .table(Attempt::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Attempt::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Attempt::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Attempt::PollId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Attempt::Time)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attempt_user")
                            .from(Attempt::Table, Attempt::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attempt_poll")
                            .from(Attempt::Table, Attempt::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, time) for results listing
        manager
            .create_index(
                Index::create()
                    .name("idx_attempt_user_id_time")
                    .table(Attempt::Table)
                    .col(Attempt::UserId)
                    .col(Attempt::Time)
                    .to_owned(),
            )
            .await?;

        // Index: poll_id
        manager
            .create_index(
                Index::create()
                    .name("idx_attempt_poll_id")
                    .table(Attempt::Table)
                    .col(Attempt::PollId)
                    .to_owned(),
            )
            .await?;

        // Create answer table
        manager
            .create_table(
                Table::create()
                    .table(Answer::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Answer::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Answer::AttemptId).string_len(32).not_null())
                    .col(ColumnDef::new(Answer::QuestionId).string_len(32).not_null())
                    .col(ColumnDef::new(Answer::Answer).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_attempt")
                            .from(Answer::Table, Answer::AttemptId)
                            .to(Attempt::Table, Attempt::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_question")
                            .from(Answer::Table, Answer::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: attempt_id
        manager
            .create_index(
                Index::create()
                    .name("idx_answer_attempt_id")
                    .table(Answer::Table)
                    .col(Answer::AttemptId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Answer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attempt::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Attempt {
    Table,
    Id,
    UserId,
    PollId,
    Time,
}

#[derive(Iden)]
enum Answer {
    Table,
    Id,
    AttemptId,
    QuestionId,
    Answer,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
}

//! Create question and choice tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create question table
        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Question::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Question::PollId).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Position).integer().not_null())
                    .col(
                        ColumnDef::new(Question::QuestionType)
                            .small_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Question::MainText).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_poll")
                            .from(Question::Table, Question::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (poll_id, position)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_poll_id_position")
                    .table(Question::Table)
                    .col(Question::PollId)
                    .col(Question::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create choice table
        manager
            .create_table(
                Table::create()
                    .table(Choice::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Choice::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Choice::QuestionId).string_len(32).not_null())
                    .col(ColumnDef::new(Choice::ChoiceText).string_len(50).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_choice_question")
                            .from(Choice::Table, Choice::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: question_id
        manager
            .create_index(
                Index::create()
                    .name("idx_choice_question_id")
                    .table(Choice::Table)
                    .col(Choice::QuestionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Choice::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    PollId,
    Position,
    QuestionType,
    MainText,
}

#[derive(Iden)]
enum Choice {
    Table,
    Id,
    QuestionId,
    ChoiceText,
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
}

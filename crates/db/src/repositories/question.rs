//! Question repository, including the choices each question owns.

use std::sync::Arc;

use crate::entities::{Choice, Question, choice, question};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, SqlErr,
};
use survey_common::{AppError, AppResult};

/// Message used when a question position is already taken within its poll.
pub const POSITION_TAKEN: &str = "Position already exists!";

fn map_write_err(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Validation(POSITION_TAKEN.into()),
        _ => AppError::Database(e.to_string()),
    }
}

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Underlying connection, used to open transactions.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Questions of a poll ordered by position.
    pub async fn find_by_poll(&self, poll_id: &str) -> AppResult<Vec<question::Model>> {
        Self::find_by_poll_in(self.db.as_ref(), poll_id).await
    }

    /// Questions of a poll ordered by position, on the given connection.
    pub async fn find_by_poll_in<C: ConnectionTrait>(
        conn: &C,
        poll_id: &str,
    ) -> AppResult<Vec<question::Model>> {
        Question::find()
            .filter(question::Column::PollId.eq(poll_id))
            .order_by_asc(question::Column::Position)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the question at `position` in a poll.
    pub async fn find_by_position(
        &self,
        poll_id: &str,
        position: i32,
    ) -> AppResult<Option<question::Model>> {
        Question::find()
            .filter(question::Column::PollId.eq(poll_id))
            .filter(question::Column::Position.eq(position))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the question at `position`, returning an error if not found.
    pub async fn get_by_position(
        &self,
        poll_id: &str,
        position: i32,
    ) -> AppResult<question::Model> {
        self.find_by_position(poll_id, position)
            .await?
            .ok_or_else(|| AppError::QuestionNotFound(format!("#{position} of poll {poll_id}")))
    }

    /// Find questions by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<question::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Question::find()
            .filter(question::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether `position` is already used by a question of the poll.
    pub async fn position_taken(&self, poll_id: &str, position: i32) -> AppResult<bool> {
        let count = Question::find()
            .filter(question::Column::PollId.eq(poll_id))
            .filter(question::Column::Position.eq(position))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Choices belonging to any of the given questions.
    pub async fn find_choices(&self, question_ids: &[String]) -> AppResult<Vec<choice::Model>> {
        Self::find_choices_in(self.db.as_ref(), question_ids).await
    }

    /// Choices belonging to any of the given questions, on the given connection.
    pub async fn find_choices_in<C: ConnectionTrait>(
        conn: &C,
        question_ids: &[String],
    ) -> AppResult<Vec<choice::Model>> {
        if question_ids.is_empty() {
            return Ok(vec![]);
        }

        Choice::find()
            .filter(choice::Column::QuestionId.is_in(question_ids.to_vec()))
            .order_by_asc(choice::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a question on the given connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: question::ActiveModel,
    ) -> AppResult<question::Model> {
        model.insert(conn).await.map_err(map_write_err)
    }

    /// Update a question on the given connection.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: question::ActiveModel,
    ) -> AppResult<question::Model> {
        model.update(conn).await.map_err(map_write_err)
    }

    /// Bulk-insert choices on the given connection.
    pub async fn insert_choices_in<C: ConnectionTrait>(
        conn: &C,
        choices: Vec<choice::ActiveModel>,
    ) -> AppResult<()> {
        if choices.is_empty() {
            return Ok(());
        }

        Choice::insert_many(choices)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete every choice of a question on the given connection.
    pub async fn delete_choices_in<C: ConnectionTrait>(
        conn: &C,
        question_id: &str,
    ) -> AppResult<u64> {
        let result = Choice::delete_many()
            .filter(choice::Column::QuestionId.eq(question_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete a question. Its choices go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Question::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

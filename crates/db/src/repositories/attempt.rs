//! Attempt repository: vote submissions and their answers.

use std::sync::Arc;

use crate::entities::{Answer, Attempt, answer, attempt};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use survey_common::{AppError, AppResult};

/// Attempt repository for database operations.
#[derive(Clone)]
pub struct AttemptRepository {
    db: Arc<DatabaseConnection>,
}

impl AttemptRepository {
    /// Create a new attempt repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert an attempt on the given connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: attempt::ActiveModel,
    ) -> AppResult<attempt::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bulk-insert answers on the given connection.
    pub async fn insert_answers_in<C: ConnectionTrait>(
        conn: &C,
        answers: Vec<answer::ActiveModel>,
    ) -> AppResult<()> {
        if answers.is_empty() {
            return Ok(());
        }

        Answer::insert_many(answers)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Attempts made by a user, most recent first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<attempt::Model>> {
        Attempt::find()
            .filter(attempt::Column::UserId.eq(user_id))
            .order_by_desc(attempt::Column::Time)
            .order_by_desc(attempt::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Answers belonging to any of the given attempts.
    pub async fn find_answers(&self, attempt_ids: &[String]) -> AppResult<Vec<answer::Model>> {
        if attempt_ids.is_empty() {
            return Ok(vec![]);
        }

        Answer::find()
            .filter(answer::Column::AttemptId.is_in(attempt_ids.to_vec()))
            .order_by_asc(answer::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, poll};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use survey_common::{AppError, AppResult};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Underlying connection, used to open transactions.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a poll by ID on the given connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a poll by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PollNotFound(id.to_string()))
    }

    /// All polls, newest `started_at` first.
    pub async fn find_all(&self) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .order_by_desc(poll::Column::StartedAt)
            .order_by_desc(poll::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Polls still active on `today`, newest `started_at` first.
    pub async fn find_active(&self, today: NaiveDate) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(
                Condition::any()
                    .add(poll::Column::FinishedAt.is_null())
                    .add(poll::Column::FinishedAt.gt(today)),
            )
            .order_by_desc(poll::Column::StartedAt)
            .order_by_desc(poll::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find polls by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<poll::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Poll::find()
            .filter(poll::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new poll on the given connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: poll::ActiveModel,
    ) -> AppResult<poll::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a poll.
    pub async fn update(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a poll. Questions, choices and attempts go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Poll::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::PollNotFound(id.to_string()));
        }
        Ok(())
    }
}

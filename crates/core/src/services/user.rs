//! User service.

use chrono::Utc;
use sea_orm::Set;
use survey_common::{AppError, AppResult, IdGenerator};
use survey_db::{entities::user, repositories::UserRepository};
use tracing::info;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Make sure a staff account named `username` exists and answers to `token`.
    pub async fn ensure_staff(&self, username: &str, token: &str) -> AppResult<user::Model> {
        if username.trim().is_empty() || token.trim().is_empty() {
            return Err(AppError::Config(
                "Staff bootstrap needs a username and a token".to_string(),
            ));
        }

        if let Some(existing) = self.user_repo.find_by_username(username).await? {
            if existing.is_staff && existing.token.as_deref() == Some(token) {
                return Ok(existing);
            }

            let mut active: user::ActiveModel = existing.into();
            active.is_staff = Set(true);
            active.token = Set(Some(token.to_string()));
            let updated = self.user_repo.update(active).await?;
            info!(user_id = %updated.id, username = %username, "Staff account refreshed");
            return Ok(updated);
        }

        let created = self
            .user_repo
            .create(user::ActiveModel {
                id: Set(self.id_gen.generate()),
                username: Set(username.to_string()),
                token: Set(Some(token.to_string())),
                is_staff: Set(true),
                created_at: Set(Utc::now().into()),
            })
            .await?;
        info!(user_id = %created.id, username = %username, "Staff account created");
        Ok(created)
    }
}

//! Poll service.

use chrono::{NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait};
use serde::{Deserialize, Deserializer};
use survey_common::{AppError, AppResult, IdGenerator};
use survey_db::{
    entities::{choice, poll, question},
    repositories::{PollRepository, QuestionRepository},
};
use tracing::info;
use validator::Validate;

use super::question::{
    QuestionDraft, QuestionWithChoices, attach_choices, choice_models, to_active, validate_drafts,
};

/// Distinguishes an explicit `null` from an absent field.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Input for creating a poll.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePollInput {
    #[validate(length(min = 1, max = 50))]
    pub title: String,
    pub description: Option<String>,
    pub finished_at: Option<NaiveDate>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

/// Input for updating a poll.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePollInput {
    #[validate(length(min = 1, max = 50))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub finished_at: Option<Option<NaiveDate>>,
}

/// A poll with its questions in position order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDetail {
    pub poll: poll::Model,
    pub questions: Vec<QuestionWithChoices>,
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    question_repo: QuestionRepository,
    id_gen: IdGenerator,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository, question_repo: QuestionRepository) -> Self {
        Self {
            poll_repo,
            question_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List polls visible to the viewer, newest first.
    ///
    /// Staff see every poll; everyone else only sees polls that have not finished.
    pub async fn list(&self, viewer_is_staff: bool) -> AppResult<Vec<poll::Model>> {
        if viewer_is_staff {
            self.poll_repo.find_all().await
        } else {
            self.poll_repo.find_active(Utc::now().date_naive()).await
        }
    }

    /// Get a poll with its questions.
    pub async fn get_detail(&self, id: &str, viewer_is_staff: bool) -> AppResult<PollDetail> {
        let poll = self.poll_repo.get_by_id(id).await?;
        if !viewer_is_staff && !poll.is_active() {
            return Err(AppError::PollNotFound(id.to_string()));
        }

        let questions = self.question_repo.find_by_poll(id).await?;
        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let choices = self.question_repo.find_choices(&ids).await?;

        Ok(PollDetail {
            poll,
            questions: attach_choices(questions, choices),
        })
    }

    /// Create a poll together with its questions and their choices.
    pub async fn create(&self, input: CreatePollInput) -> AppResult<PollDetail> {
        input.validate()?;
        let drafts = validate_drafts(input.questions)?;

        let poll_id = self.id_gen.generate();
        let mut question_models = Vec::with_capacity(drafts.len());
        let mut choices: Vec<choice::Model> = Vec::new();
        for draft in drafts {
            let question_id = self.id_gen.generate();
            choices.extend(choice_models(&self.id_gen, &question_id, &draft.choices));
            question_models.push(question::ActiveModel {
                id: Set(question_id),
                poll_id: Set(poll_id.clone()),
                position: Set(draft.position),
                question_type: Set(draft.question_type),
                main_text: Set(draft.main_text),
            });
        }

        let txn = self
            .poll_repo
            .db()
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let poll = PollRepository::create_in(
            &txn,
            poll::ActiveModel {
                id: Set(poll_id),
                title: Set(input.title),
                description: Set(input.description),
                started_at: Set(Utc::now().date_naive()),
                finished_at: Set(input.finished_at),
            },
        )
        .await?;

        let mut questions = Vec::with_capacity(question_models.len());
        for model in question_models {
            questions.push(QuestionRepository::create_in(&txn, model).await?);
        }
        QuestionRepository::insert_choices_in(&txn, to_active(&choices)).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(poll_id = %poll.id, questions = questions.len(), "Poll created");

        questions.sort_by_key(|q| q.position);
        Ok(PollDetail {
            poll,
            questions: attach_choices(questions, choices),
        })
    }

    /// Partially update a poll's own fields.
    pub async fn update(&self, id: &str, input: UpdatePollInput) -> AppResult<poll::Model> {
        input.validate()?;

        let poll = self.poll_repo.get_by_id(id).await?;
        let mut active: poll::ActiveModel = poll.clone().into();
        let mut changed = false;

        if let Some(title) = input.title {
            active.title = Set(title);
            changed = true;
        }
        if let Some(description) = input.description {
            active.description = Set(description);
            changed = true;
        }
        if let Some(finished_at) = input.finished_at {
            active.finished_at = Set(finished_at);
            changed = true;
        }

        if !changed {
            return Ok(poll);
        }

        let updated = self.poll_repo.update(active).await?;
        info!(poll_id = %id, "Poll updated");
        Ok(updated)
    }

    /// Delete a poll with everything that belongs to it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.poll_repo.delete(id).await?;
        info!(poll_id = %id, "Poll deleted");
        Ok(())
    }
}

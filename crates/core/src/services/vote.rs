//! Vote submission.
//!
//! A ballot is checked against the poll's questions by [`check_ballot`] and then
//! written as one attempt plus its answers. The whole submission runs inside a single
//! transaction, so a rejected ballot never leaves a partial attempt behind.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{Set, TransactionTrait};
use serde::Deserialize;
use survey_common::{AppError, AppResult, IdGenerator};
use survey_db::{
    entities::{QuestionType, answer, answer::ANSWER_SEPARATOR, attempt, user},
    repositories::{AttemptRepository, PollRepository, QuestionRepository, UserRepository},
};
use tracing::{debug, info};

use super::question::{QuestionWithChoices, attach_choices};

/// Identity handed out to an anonymous voter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedIdentity {
    pub id: String,
    pub username: String,
}

/// Source of identities for anonymous voters.
///
/// Called at most once per submission, and only after the ballot is accepted.
pub trait IdentityIssuer: Send + Sync {
    /// Produce a fresh identity for an account that does not exist yet.
    fn issue(&self) -> IssuedIdentity;
}

/// Default issuer: a generated id that doubles as the username.
#[derive(Debug, Clone, Default)]
pub struct GeneratedIdentity {
    id_gen: IdGenerator,
}

impl GeneratedIdentity {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            id_gen: IdGenerator::new(),
        }
    }
}

impl IdentityIssuer for GeneratedIdentity {
    fn issue(&self) -> IssuedIdentity {
        let id = self.id_gen.generate();
        IssuedIdentity {
            username: id.clone(),
            id,
        }
    }
}

/// Type alias for a shared identity issuer.
pub type IdentityService = Arc<dyn IdentityIssuer>;

/// One submitted answer, addressed by question position.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub position: i32,
    #[serde(default)]
    pub answer: Vec<String>,
}

/// A vote submission.
#[derive(Debug, Clone, Deserialize)]
pub struct VoteInput {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

/// An answer that passed the ballot rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedAnswer {
    pub question_id: String,
    pub values: Vec<String>,
}

impl CheckedAnswer {
    /// The value as stored: submitted values joined by the answer separator.
    #[must_use]
    pub fn stored_value(&self) -> String {
        self.values.join(ANSWER_SEPARATOR)
    }
}

fn invalid(message: String) -> AppError {
    AppError::Validation(message)
}

/// Check a ballot against the questions of a poll.
///
/// Every question must be answered exactly once. Text and single-choice answers carry
/// one value, multi-choice answers at least one. Choice values must name a choice of
/// the question, and each choice can be used once per answer.
pub fn check_ballot(
    poll_id: &str,
    questions: &[QuestionWithChoices],
    answers: &[AnswerInput],
) -> AppResult<Vec<CheckedAnswer>> {
    if questions.is_empty() {
        return Err(invalid(format!("Poll #{poll_id} doesn't have questions")));
    }

    let mut pending: HashSet<&str> = questions.iter().map(|q| q.question.id.as_str()).collect();
    let mut checked = Vec::with_capacity(answers.len());

    for submitted in answers {
        let position = submitted.position;
        let entry = questions
            .iter()
            .find(|q| q.question.position == position)
            .ok_or_else(|| {
                AppError::QuestionNotFound(format!("Question #{position} doesn't exists"))
            })?;

        if !pending.remove(entry.question.id.as_str()) {
            return Err(invalid(format!("Question #{position} answered more than once")));
        }

        match entry.question.question_type {
            QuestionType::Text | QuestionType::SingleChoice if submitted.answer.len() != 1 => {
                return Err(invalid(format!("Question #{position} required one answer")));
            }
            QuestionType::MultiChoice if submitted.answer.is_empty() => {
                return Err(invalid(format!(
                    "Question #{position} required at least one answer"
                )));
            }
            _ => {}
        }

        if entry.question.question_type.has_choices() {
            let mut available: Vec<&str> =
                entry.choices.iter().map(|c| c.choice_text.as_str()).collect();
            for value in &submitted.answer {
                let Some(idx) = available.iter().position(|c| *c == value.as_str()) else {
                    return Err(invalid(format!("Question #{position}: invalid answer")));
                };
                available.swap_remove(idx);
            }
        }

        checked.push(CheckedAnswer {
            question_id: entry.question.id.clone(),
            values: submitted.answer.clone(),
        });
    }

    if !pending.is_empty() {
        return Err(invalid("You must answer every question".to_string()));
    }

    Ok(checked)
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    poll_repo: PollRepository,
    identity: IdentityService,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service with the default identity issuer.
    #[must_use]
    pub fn new(poll_repo: PollRepository) -> Self {
        Self::with_identity(poll_repo, Arc::new(GeneratedIdentity::new()))
    }

    /// Create a new vote service with a custom identity issuer.
    #[must_use]
    pub const fn with_identity(poll_repo: PollRepository, identity: IdentityService) -> Self {
        Self {
            poll_repo,
            identity,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record a vote for a poll.
    ///
    /// The voter is the authenticated requester when there is one, otherwise the
    /// submitted user id, otherwise a freshly issued anonymous account.
    pub async fn submit(
        &self,
        poll_id: &str,
        requester: Option<&user::Model>,
        input: VoteInput,
    ) -> AppResult<attempt::Model> {
        let db_err = |e: sea_orm::DbErr| AppError::Database(e.to_string());
        let txn = self.poll_repo.db().begin().await.map_err(db_err)?;

        let poll = PollRepository::find_by_id_in(&txn, poll_id)
            .await?
            .ok_or_else(|| AppError::PollNotFound(poll_id.to_string()))?;
        if !poll.is_active() {
            return Err(AppError::PollInactive(format!("Poll #{poll_id} is not active")));
        }

        let questions = QuestionRepository::find_by_poll_in(&txn, poll_id).await?;
        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let choices = QuestionRepository::find_choices_in(&txn, &ids).await?;
        let questions = attach_choices(questions, choices);

        let checked = check_ballot(poll_id, &questions, &input.answers)?;

        let submitted_user = input.user.filter(|id| !id.trim().is_empty());
        let user_id = match (requester, submitted_user) {
            (Some(requester), _) => requester.id.clone(),
            (None, Some(id)) => {
                UserRepository::find_by_id_in(&txn, &id)
                    .await?
                    .ok_or(AppError::UserNotFound(id))?
                    .id
            }
            (None, None) => {
                let identity = self.identity.issue();
                debug!(user_id = %identity.id, "Issuing anonymous voter");
                UserRepository::create_in(
                    &txn,
                    user::ActiveModel {
                        id: Set(identity.id),
                        username: Set(identity.username),
                        token: Set(None),
                        is_staff: Set(false),
                        created_at: Set(Utc::now().into()),
                    },
                )
                .await?
                .id
            }
        };

        let attempt = AttemptRepository::create_in(
            &txn,
            attempt::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id),
                poll_id: Set(poll.id.clone()),
                time: Set(Utc::now().into()),
            },
        )
        .await?;

        let answers = checked
            .iter()
            .map(|a| answer::ActiveModel {
                id: Set(self.id_gen.generate()),
                attempt_id: Set(attempt.id.clone()),
                question_id: Set(a.question_id.clone()),
                answer: Set(a.stored_value()),
            })
            .collect();
        AttemptRepository::insert_answers_in(&txn, answers).await?;

        txn.commit().await.map_err(db_err)?;

        info!(
            attempt_id = %attempt.id,
            poll_id = %poll_id,
            user_id = %attempt.user_id,
            "Vote recorded"
        );
        Ok(attempt)
    }
}

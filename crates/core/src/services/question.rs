//! Question service: question definitions and the rules they must satisfy.

use std::collections::{HashMap, HashSet};

use sea_orm::{Set, TransactionTrait};
use serde::Deserialize;
use serde_json::Value;
use survey_common::{AppError, AppResult, IdGenerator};
use survey_db::{
    entities::{QuestionType, choice, question},
    repositories::{POSITION_TAKEN, PollRepository, QuestionRepository},
};
use tracing::info;
use validator::Validate;

/// Minimum number of choices for a choice question.
pub const MIN_CHOICES: usize = 2;

const INVALID_QUESTION_TYPE: &str = "Invalid question type value";
const TOO_FEW_CHOICES: &str = "This type of question must have at least 2 choices";
const UNEXPECTED_CHOICES: &str = "This type of question can't have choices";

/// One choice in a question definition.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChoiceDraft {
    #[validate(length(min = 1, max = 50))]
    pub choice_text: String,
}

/// A full question definition.
///
/// `question_type` is whatever the client sent; it is resolved by
/// [`validate_question_type`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionDraft {
    pub position: i32,
    pub question_type: Value,
    #[validate(length(min = 1))]
    pub main_text: String,
    #[serde(default)]
    pub choices: Option<Vec<ChoiceDraft>>,
}

/// A partial question update. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct QuestionPatch {
    pub position: Option<i32>,
    pub question_type: Option<Value>,
    #[validate(length(min = 1))]
    pub main_text: Option<String>,
    pub choices: Option<Vec<ChoiceDraft>>,
}

/// A question together with its choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionWithChoices {
    pub question: question::Model,
    pub choices: Vec<choice::Model>,
}

/// Resolve a client-supplied question type.
///
/// Accepts the display label, the integer code, or the code as a string.
pub fn validate_question_type(raw: &Value) -> AppResult<QuestionType> {
    let resolved = match raw {
        Value::Number(n) => n.as_i64().and_then(QuestionType::from_code),
        Value::String(s) => QuestionType::from_label(s)
            .or_else(|| s.trim().parse::<i64>().ok().and_then(QuestionType::from_code)),
        _ => None,
    };
    resolved.ok_or_else(|| AppError::Validation(INVALID_QUESTION_TYPE.to_string()))
}

/// Check a choice set against the question type.
///
/// Choice questions need at least [`MIN_CHOICES`] entries. A text question accepts
/// no choices at all, or an explicitly empty list.
pub fn validate_choices(
    question_type: QuestionType,
    choices: Option<&[ChoiceDraft]>,
) -> AppResult<()> {
    if question_type.has_choices() {
        let choices = choices.unwrap_or_default();
        if choices.len() < MIN_CHOICES {
            return Err(AppError::Validation(TOO_FEW_CHOICES.to_string()));
        }
        for choice in choices {
            choice.validate()?;
        }
    } else if choices.is_some_and(|c| !c.is_empty()) {
        return Err(AppError::Validation(UNEXPECTED_CHOICES.to_string()));
    }
    Ok(())
}

/// A draft that passed validation, with its type resolved.
pub(crate) struct ValidDraft {
    pub position: i32,
    pub question_type: QuestionType,
    pub main_text: String,
    pub choices: Vec<ChoiceDraft>,
}

/// Validate one draft without touching storage.
pub(crate) fn validate_draft(draft: QuestionDraft) -> AppResult<ValidDraft> {
    draft.validate()?;
    let question_type = validate_question_type(&draft.question_type)?;
    validate_choices(question_type, draft.choices.as_deref())?;

    Ok(ValidDraft {
        position: draft.position,
        question_type,
        main_text: draft.main_text,
        choices: draft.choices.unwrap_or_default(),
    })
}

/// Validate a batch of drafts, including position uniqueness inside the batch.
pub(crate) fn validate_drafts(drafts: Vec<QuestionDraft>) -> AppResult<Vec<ValidDraft>> {
    let mut seen = HashSet::new();
    drafts
        .into_iter()
        .map(|draft| {
            if !seen.insert(draft.position) {
                return Err(AppError::Validation(POSITION_TAKEN.to_string()));
            }
            validate_draft(draft)
        })
        .collect()
}

pub(crate) fn choice_models(
    id_gen: &IdGenerator,
    question_id: &str,
    choices: &[ChoiceDraft],
) -> Vec<choice::Model> {
    choices
        .iter()
        .map(|c| choice::Model {
            id: id_gen.generate(),
            question_id: question_id.to_string(),
            choice_text: c.choice_text.clone(),
        })
        .collect()
}

pub(crate) fn to_active(choices: &[choice::Model]) -> Vec<choice::ActiveModel> {
    choices
        .iter()
        .map(|c| choice::ActiveModel {
            id: Set(c.id.clone()),
            question_id: Set(c.question_id.clone()),
            choice_text: Set(c.choice_text.clone()),
        })
        .collect()
}

/// Pair every question with its choices, keeping the question order.
pub(crate) fn attach_choices(
    questions: Vec<question::Model>,
    choices: Vec<choice::Model>,
) -> Vec<QuestionWithChoices> {
    let mut by_question: HashMap<String, Vec<choice::Model>> = HashMap::new();
    for choice in choices {
        by_question
            .entry(choice.question_id.clone())
            .or_default()
            .push(choice);
    }

    questions
        .into_iter()
        .map(|question| QuestionWithChoices {
            choices: by_question.remove(&question.id).unwrap_or_default(),
            question,
        })
        .collect()
}

fn db_err(e: sea_orm::DbErr) -> AppError {
    AppError::Database(e.to_string())
}

/// Question service for business logic.
#[derive(Clone)]
pub struct QuestionService {
    question_repo: QuestionRepository,
    poll_repo: PollRepository,
    id_gen: IdGenerator,
}

impl QuestionService {
    /// Create a new question service.
    #[must_use]
    pub const fn new(question_repo: QuestionRepository, poll_repo: PollRepository) -> Self {
        Self {
            question_repo,
            poll_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Questions of a poll, ordered by position.
    pub async fn list(&self, poll_id: &str) -> AppResult<Vec<QuestionWithChoices>> {
        self.poll_repo.get_by_id(poll_id).await?;

        let questions = self.question_repo.find_by_poll(poll_id).await?;
        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let choices = self.question_repo.find_choices(&ids).await?;

        Ok(attach_choices(questions, choices))
    }

    /// The question at `position` in a poll.
    pub async fn get(&self, poll_id: &str, position: i32) -> AppResult<QuestionWithChoices> {
        let question = self.question_repo.get_by_position(poll_id, position).await?;
        let choices = self
            .question_repo
            .find_choices(std::slice::from_ref(&question.id))
            .await?;

        Ok(QuestionWithChoices { question, choices })
    }

    /// Add a question with its choices to an existing poll.
    pub async fn create(
        &self,
        poll_id: &str,
        draft: QuestionDraft,
    ) -> AppResult<QuestionWithChoices> {
        self.poll_repo.get_by_id(poll_id).await?;

        if self
            .question_repo
            .position_taken(poll_id, draft.position)
            .await?
        {
            return Err(AppError::Validation(POSITION_TAKEN.to_string()));
        }

        let draft = validate_draft(draft)?;
        let question_id = self.id_gen.generate();
        let choices = choice_models(&self.id_gen, &question_id, &draft.choices);

        let txn = self.question_repo.db().begin().await.map_err(db_err)?;

        let question = QuestionRepository::create_in(
            &txn,
            question::ActiveModel {
                id: Set(question_id),
                poll_id: Set(poll_id.to_string()),
                position: Set(draft.position),
                question_type: Set(draft.question_type),
                main_text: Set(draft.main_text),
            },
        )
        .await?;
        QuestionRepository::insert_choices_in(&txn, to_active(&choices)).await?;

        txn.commit().await.map_err(db_err)?;

        info!(poll_id = %poll_id, position = question.position, "Question created");
        Ok(QuestionWithChoices { question, choices })
    }

    /// Partially update the question at `position`.
    ///
    /// Choices are replaced when new ones are supplied or when the resulting type is
    /// text. Otherwise the stored choices stay and must still satisfy the type.
    pub async fn update(
        &self,
        poll_id: &str,
        position: i32,
        patch: QuestionPatch,
    ) -> AppResult<QuestionWithChoices> {
        patch.validate()?;

        let existing = self.question_repo.get_by_position(poll_id, position).await?;

        if let Some(new_position) = patch.position.filter(|p| *p != existing.position) {
            if self
                .question_repo
                .position_taken(poll_id, new_position)
                .await?
            {
                return Err(AppError::Validation(POSITION_TAKEN.to_string()));
            }
        }

        let question_type = match &patch.question_type {
            Some(raw) => validate_question_type(raw)?,
            None => existing.question_type,
        };

        let replace_choices = patch.choices.is_some() || !question_type.has_choices();
        let kept_choices = if replace_choices {
            Vec::new()
        } else {
            let stored = self
                .question_repo
                .find_choices(std::slice::from_ref(&existing.id))
                .await?;
            if stored.len() < MIN_CHOICES {
                return Err(AppError::Validation(TOO_FEW_CHOICES.to_string()));
            }
            stored
        };
        if replace_choices {
            validate_choices(question_type, patch.choices.as_deref())?;
        }

        let new_choices = if replace_choices {
            choice_models(
                &self.id_gen,
                &existing.id,
                patch.choices.as_deref().unwrap_or_default(),
            )
        } else {
            kept_choices
        };

        let question_id = existing.id.clone();
        let mut active: question::ActiveModel = existing.into();
        if let Some(p) = patch.position {
            active.position = Set(p);
        }
        if patch.question_type.is_some() {
            active.question_type = Set(question_type);
        }
        if let Some(text) = patch.main_text {
            active.main_text = Set(text);
        }

        let txn = self.question_repo.db().begin().await.map_err(db_err)?;

        let question = QuestionRepository::update_in(&txn, active).await?;
        if replace_choices {
            QuestionRepository::delete_choices_in(&txn, &question_id).await?;
            QuestionRepository::insert_choices_in(&txn, to_active(&new_choices)).await?;
        }

        txn.commit().await.map_err(db_err)?;

        info!(poll_id = %poll_id, position = question.position, "Question updated");
        Ok(QuestionWithChoices {
            question,
            choices: new_choices,
        })
    }

    /// Delete the question at `position`. Its choices go with it.
    pub async fn delete(&self, poll_id: &str, position: i32) -> AppResult<()> {
        let question = self.question_repo.get_by_position(poll_id, position).await?;
        self.question_repo.delete(&question.id).await?;

        info!(poll_id = %poll_id, position, "Question deleted");
        Ok(())
    }
}

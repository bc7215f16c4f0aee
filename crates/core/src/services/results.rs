//! Results retrieval: a user's past attempts with their poll and answers.

use std::collections::HashMap;

use survey_common::AppResult;
use survey_db::{
    entities::{attempt, poll},
    repositories::{AttemptRepository, PollRepository, QuestionRepository},
};
use tracing::warn;

use super::question::{QuestionWithChoices, attach_choices};

/// One stored answer with the question it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerDetail {
    pub question: QuestionWithChoices,
    pub answer: String,
}

/// One attempt with its poll and answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptDetail {
    pub attempt: attempt::Model,
    pub poll: poll::Model,
    pub answers: Vec<AnswerDetail>,
}

/// Results service for business logic.
#[derive(Clone)]
pub struct ResultsService {
    attempt_repo: AttemptRepository,
    poll_repo: PollRepository,
    question_repo: QuestionRepository,
}

impl ResultsService {
    /// Create a new results service.
    #[must_use]
    pub const fn new(
        attempt_repo: AttemptRepository,
        poll_repo: PollRepository,
        question_repo: QuestionRepository,
    ) -> Self {
        Self {
            attempt_repo,
            poll_repo,
            question_repo,
        }
    }

    /// Every attempt made by `user_id`, most recent first, answers in question order.
    ///
    /// An unknown user simply has no attempts.
    pub async fn attempts_for_user(&self, user_id: &str) -> AppResult<Vec<AttemptDetail>> {
        let attempts = self.attempt_repo.find_by_user(user_id).await?;
        if attempts.is_empty() {
            return Ok(vec![]);
        }

        let mut poll_ids: Vec<String> = attempts.iter().map(|a| a.poll_id.clone()).collect();
        poll_ids.sort();
        poll_ids.dedup();
        let polls: HashMap<String, poll::Model> = self
            .poll_repo
            .find_by_ids(&poll_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let attempt_ids: Vec<String> = attempts.iter().map(|a| a.id.clone()).collect();
        let answers = self.attempt_repo.find_answers(&attempt_ids).await?;

        let mut question_ids: Vec<String> = answers.iter().map(|a| a.question_id.clone()).collect();
        question_ids.sort();
        question_ids.dedup();
        let questions = self.question_repo.find_by_ids(&question_ids).await?;
        let choices = self.question_repo.find_choices(&question_ids).await?;
        let questions: HashMap<String, QuestionWithChoices> = attach_choices(questions, choices)
            .into_iter()
            .map(|q| (q.question.id.clone(), q))
            .collect();

        let mut answers_by_attempt: HashMap<String, Vec<AnswerDetail>> = HashMap::new();
        for answer in answers {
            let Some(question) = questions.get(&answer.question_id) else {
                warn!(answer_id = %answer.id, "Answer references a missing question");
                continue;
            };
            answers_by_attempt
                .entry(answer.attempt_id)
                .or_default()
                .push(AnswerDetail {
                    question: question.clone(),
                    answer: answer.answer,
                });
        }

        Ok(attempts
            .into_iter()
            .filter_map(|attempt| {
                let Some(poll) = polls.get(&attempt.poll_id) else {
                    warn!(attempt_id = %attempt.id, "Attempt references a missing poll");
                    return None;
                };
                let mut answers = answers_by_attempt.remove(&attempt.id).unwrap_or_default();
                answers.sort_by_key(|a| a.question.question.position);
                Some(AttemptDetail {
                    answers,
                    poll: poll.clone(),
                    attempt,
                })
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use survey_db::entities::{QuestionType, answer, choice, question};

    fn service(db: &Arc<DatabaseConnection>) -> ResultsService {
        ResultsService::new(
            AttemptRepository::new(Arc::clone(db)),
            PollRepository::new(Arc::clone(db)),
            QuestionRepository::new(Arc::clone(db)),
        )
    }

    fn create_test_attempt(id: &str, hour: u32) -> attempt::Model {
        attempt::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            poll_id: "poll1".to_string(),
            time: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap().into(),
        }
    }

    fn create_test_answer(id: &str, attempt_id: &str, value: &str) -> answer::Model {
        create_test_answer_for(id, attempt_id, "q1", value)
    }

    fn create_test_answer_for(
        id: &str,
        attempt_id: &str,
        question_id: &str,
        value: &str,
    ) -> answer::Model {
        answer::Model {
            id: id.to_string(),
            attempt_id: attempt_id.to_string(),
            question_id: question_id.to_string(),
            answer: value.to_string(),
        }
    }

    fn create_test_question(id: &str, position: i32) -> question::Model {
        question::Model {
            id: id.to_string(),
            poll_id: "poll1".to_string(),
            position,
            question_type: QuestionType::Text,
            main_text: format!("Question {position}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_attempts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<attempt::Model>::new()])
                .into_connection(),
        );

        let results = service(&db).attempts_for_user("ghost").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_attempts_nest_poll_and_answers() {
        let poll = poll::Model {
            id: "poll1".to_string(),
            title: "P1".to_string(),
            description: None,
            started_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            finished_at: None,
        };
        let question = question::Model {
            id: "q1".to_string(),
            poll_id: "poll1".to_string(),
            position: 1,
            question_type: QuestionType::SingleChoice,
            main_text: "Pick".to_string(),
        };
        let choices = vec![
            choice::Model {
                id: "c1".to_string(),
                question_id: "q1".to_string(),
                choice_text: "A".to_string(),
            },
            choice::Model {
                id: "c2".to_string(),
                question_id: "q1".to_string(),
                choice_text: "B".to_string(),
            },
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_attempt("a2", 12),
                    create_test_attempt("a1", 9),
                ]])
                .append_query_results([[poll]])
                .append_query_results([[
                    create_test_answer("ans1", "a1", "A"),
                    create_test_answer("ans2", "a2", "B"),
                ]])
                .append_query_results([[question]])
                .append_query_results([choices])
                .into_connection(),
        );

        let results = service(&db).attempts_for_user("user1").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].attempt.id, "a2");
        assert_eq!(results[0].answers[0].answer, "B");
        assert_eq!(results[1].answers[0].answer, "A");
        assert_eq!(results[1].poll.title, "P1");
        assert_eq!(results[1].answers[0].question.choices.len(), 2);
    }

    #[tokio::test]
    async fn test_answers_follow_question_position() {
        let poll = poll::Model {
            id: "poll1".to_string(),
            title: "P1".to_string(),
            description: None,
            started_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            finished_at: None,
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_attempt("a1", 9)]])
                .append_query_results([[poll]])
                .append_query_results([[
                    create_test_answer_for("ans1", "a1", "q3", "third"),
                    create_test_answer_for("ans2", "a1", "q1", "first"),
                    create_test_answer_for("ans3", "a1", "q2", "second"),
                ]])
                .append_query_results([[
                    create_test_question("q2", 2),
                    create_test_question("q3", 3),
                    create_test_question("q1", 1),
                ]])
                .append_query_results([Vec::<choice::Model>::new()])
                .into_connection(),
        );

        let results = service(&db).attempts_for_user("user1").await.unwrap();

        let answers: Vec<&str> = results[0].answers.iter().map(|a| a.answer.as_str()).collect();
        assert_eq!(answers, ["first", "second", "third"]);
        let positions: Vec<i32> = results[0]
            .answers
            .iter()
            .map(|a| a.question.question.position)
            .collect();
        assert_eq!(positions, [1, 2, 3]);
    }
}

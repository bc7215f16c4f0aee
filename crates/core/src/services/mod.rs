//! Business logic services.

#![allow(missing_docs)]

pub mod poll;
pub mod question;
pub mod results;
pub mod user;
pub mod vote;

pub use poll::{CreatePollInput, PollDetail, PollService, UpdatePollInput};
pub use question::{
    ChoiceDraft, MIN_CHOICES, QuestionDraft, QuestionPatch, QuestionService, QuestionWithChoices,
    validate_choices, validate_question_type,
};
pub use results::{AnswerDetail, AttemptDetail, ResultsService};
pub use user::UserService;
pub use vote::{
    AnswerInput, CheckedAnswer, GeneratedIdentity, IdentityIssuer, IdentityService, IssuedIdentity,
    VoteInput, VoteService, check_ballot,
};

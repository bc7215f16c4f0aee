//! Database entities.

#![allow(missing_docs)]

pub mod answer;
pub mod attempt;
pub mod choice;
pub mod poll;
pub mod question;
pub mod user;

pub use answer::Entity as Answer;
pub use attempt::Entity as Attempt;
pub use choice::Entity as Choice;
pub use poll::Entity as Poll;
pub use question::{Entity as Question, QuestionType};
pub use user::Entity as User;

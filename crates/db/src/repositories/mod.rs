//! Repository layer for database operations.
//!
//! Repositories own an `Arc<DatabaseConnection>`. Methods suffixed `_in` take an explicit
//! connection so services can run them inside a transaction.

mod attempt;
mod poll;
mod question;
mod user;

pub use attempt::AttemptRepository;
pub use poll::PollRepository;
pub use question::{POSITION_TAKEN, QuestionRepository};
pub use user::UserRepository;

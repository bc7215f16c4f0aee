//! ID generation utilities.

use std::sync::{Mutex, PoisonError};

use ulid::{Generator, Ulid};

/// Process-wide generator so ids stay ordered across every [`IdGenerator`].
static GENERATOR: Mutex<Generator> = Mutex::new(Generator::new());

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// Ids are monotonic within the process: two ids minted in the same millisecond
    /// still sort in creation order, so rows ordered by id (choices of a question,
    /// answers of an attempt) come back in the order they were written.
    #[must_use]
    pub fn generate(&self) -> String {
        let ulid = GENERATOR
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()
            // Random part overflowed within one millisecond
            .unwrap_or_else(|_| Ulid::new());
        ulid.to_string().to_lowercase()
    }
}

//! Question entity and the question type lookup table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of answer a question expects.
///
/// Stored as a small integer code; rendered on the wire as its label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    #[sea_orm(num_value = 1)]
    Text,
    #[sea_orm(num_value = 2)]
    SingleChoice,
    #[sea_orm(num_value = 3)]
    MultiChoice,
}

/// Code/label table shared by every read and write path.
const QUESTION_TYPES: [(QuestionType, i16, &str); 3] = [
    (QuestionType::Text, 1, "Ответ текстом"),
    (QuestionType::SingleChoice, 2, "Ответ с выбором одного варианта"),
    (
        QuestionType::MultiChoice,
        3,
        "Ответ с выбором нескольких вариантов",
    ),
];

impl QuestionType {
    /// Stored integer code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Text => QUESTION_TYPES[0].1,
            Self::SingleChoice => QUESTION_TYPES[1].1,
            Self::MultiChoice => QUESTION_TYPES[2].1,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => QUESTION_TYPES[0].2,
            Self::SingleChoice => QUESTION_TYPES[1].2,
            Self::MultiChoice => QUESTION_TYPES[2].2,
        }
    }

    /// Look up a type by its stored code.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        QUESTION_TYPES
            .iter()
            .find(|(_, c, _)| i64::from(*c) == code)
            .map(|(t, _, _)| *t)
    }

    /// Look up a type by its label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        QUESTION_TYPES
            .iter()
            .find(|(_, _, l)| *l == label)
            .map(|(t, _, _)| *t)
    }

    /// Whether answers are picked from the question's choices.
    #[must_use]
    pub const fn has_choices(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub poll_id: String,

    /// Number of the question in its poll (unique per poll)
    pub position: i32,

    pub question_type: QuestionType,

    #[sea_orm(column_type = "Text")]
    pub main_text: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::poll::Entity",
        from = "Column::PollId",
        to = "super::poll::Column::Id",
        on_delete = "Cascade"
    )]
    Poll,

    #[sea_orm(has_many = "super::choice::Entity")]
    Choices,
}

impl Related<super::poll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Poll.def()
    }
}

impl Related<super::choice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Choices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_label_lookup_agree() {
        for (question_type, code, label) in QUESTION_TYPES {
            assert_eq!(question_type.code(), code);
            assert_eq!(question_type.label(), label);
            assert_eq!(QuestionType::from_code(i64::from(code)), Some(question_type));
            assert_eq!(QuestionType::from_label(label), Some(question_type));
        }
    }

    #[test]
    fn test_unknown_values() {
        assert_eq!(QuestionType::from_code(0), None);
        assert_eq!(QuestionType::from_code(4), None);
        assert_eq!(QuestionType::from_label("Free text"), None);
    }

    #[test]
    fn test_has_choices() {
        assert!(!QuestionType::Text.has_choices());
        assert!(QuestionType::SingleChoice.has_choices());
        assert!(QuestionType::MultiChoice.has_choices());
    }
}

//! Poll entity.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Set once, on creation
    pub started_at: Date,

    /// NULL = open-ended
    #[sea_orm(nullable)]
    pub finished_at: Option<Date>,
}

impl Model {
    /// Whether the poll accepts votes on `today`.
    ///
    /// A poll is active until its finish date; on the finish date itself it is closed.
    #[must_use]
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.finished_at.is_none_or(|finished_at| finished_at > today)
    }

    /// Whether the poll accepts votes today (UTC).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active_on(chrono::Utc::now().date_naive())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::question::Entity")]
    Questions,

    #[sea_orm(has_many = "super::attempt::Entity")]
    Attempts,
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attempts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

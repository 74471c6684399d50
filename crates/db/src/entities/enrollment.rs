//! Enrollment entity.
//!
//! The user↔event join row carrying the claim workflow state. A user may
//! enroll in a given event at most once (unique index on user+event).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Enrollment workflow states.
///
/// `Join` is the initial state. `Scanned` is an intermediate check-in
/// marker. `Attended` awards points and is terminal. `Rejected` closes the
/// enrollment without points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum EnrollmentStatus {
    #[sea_orm(string_value = "JOIN")]
    Join,
    #[sea_orm(string_value = "SCANNED")]
    Scanned,
    #[sea_orm(string_value = "ATTENDED")]
    Attended,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub event_id: String,

    pub status: EnrollmentStatus,

    /// Set once when the user requests points; never reset
    #[sea_orm(default_value = false)]
    pub claim_point: bool,

    /// Day-before reminder already delivered for this enrollment
    #[sea_orm(default_value = false)]
    pub reminder_sent: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Cascade"
    )]
    Event,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

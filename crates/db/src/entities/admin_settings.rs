//! Global admin policy settings entity.
//!
//! A singleton row keyed by a fixed ID. The policy switches here gate the
//! claim auto-approval, outside-event creation, new-event broadcasts, and
//! the reminder sweep.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed primary key of the singleton row.
pub const SINGLETON_ID: &str = "admin_settings";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Claim requests skip admin review and award points immediately
    #[sea_orm(default_value = true)]
    pub auto_approve_point: bool,

    /// Users may propose outside events
    #[sea_orm(default_value = true)]
    pub allow_custom_point: bool,

    /// Broadcast a push notification when a new event is created
    #[sea_orm(default_value = true)]
    pub create_event_notify: bool,

    /// Run the day-before reminder sweep
    #[sea_orm(default_value = true)]
    pub event_reminders: bool,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The defaults used when the singleton row has not been seeded yet.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            id: SINGLETON_ID.to_string(),
            auto_approve_point: true,
            allow_custom_point: true,
            create_event_notify: true,
            event_reminders: true,
            updated_at: None,
        }
    }
}

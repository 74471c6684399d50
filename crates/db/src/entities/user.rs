//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "USER")]
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    /// Contact address for transactional mail (optional)
    #[sea_orm(nullable)]
    pub email: Option<String>,

    /// Argon2 password hash. API responses go through a DTO that omits it.
    pub password_hash: String,

    pub role: UserRole,

    /// Accounts start inactive and are unlocked by an admin
    #[sea_orm(default_value = false)]
    pub is_active: bool,

    /// Soft delete flag; rows are never hard-deleted
    #[sea_orm(default_value = false)]
    pub is_deleted: bool,

    /// Running points balance, mutated only by the approval workflows
    #[sea_orm(default_value = 0)]
    pub point: i32,

    /// Push notification device token
    #[sea_orm(nullable)]
    pub fcm_token: Option<String>,

    /// Profile image URL
    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    /// Notify when a claim or outside event is approved
    #[sea_orm(default_value = true)]
    pub is_event_approve_notify: bool,

    /// Notify when a new event is published
    #[sea_orm(default_value = true)]
    pub is_new_event_notify: bool,

    /// Send day-before event reminders
    #[sea_orm(default_value = true)]
    pub is_event_reminder: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,

    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendances,

    #[sea_orm(has_many = "super::outside_event::Entity")]
    OutsideEvents,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendances.def()
    }
}

impl Related<super::outside_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OutsideEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Business logic services.

#![allow(missing_docs)]

pub mod attendance;
pub mod auth;
pub mod enrollment;
pub mod event;
pub mod mail;
pub mod outside_event;
pub mod push;
pub mod reminder;
pub mod seed;
pub mod settings;

pub use attendance::{AttendanceService, AttendanceWithUser, day_window, utc_day_window};
pub use auth::{
    AuthService, ChangePasswordInput, Claims, JwtKeys, RegisterInput, TokenPair,
    UpdateProfileInput, hash_password, verify_password,
};
pub use enrollment::{
    ClaimPointsInput, ClaimedEnrollment, EnrollmentService, EnrollmentWithEvent,
};
pub use event::{
    CreateEventInput, EnrollmentStats, EventService, EventWithEnrollments, UpcomingEvent,
    UpdateEventInput,
};
pub use mail::{EmailMessage, MailQueue, MailService, NoOpMailQueue};
pub use outside_event::{
    ApprovalDecision, CreateOutsideEventInput, DecisionOutcome, OutsideEventService,
    OutsideEventSummary, OutsideEventWithUser,
};
pub use push::{
    BulkPushOutcome, FcmDispatcher, NoOpPush, PendingPush, PushDispatcher, PushService,
};
pub use reminder::ReminderService;
pub use seed::seed_admin;
pub use settings::{
    NotificationSettings, SettingsService, UpdateAdminSettingsInput,
    UpdateNotificationSettingsInput,
};

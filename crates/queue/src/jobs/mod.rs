//! Queue job types.

mod email;

pub use email::EmailJob;

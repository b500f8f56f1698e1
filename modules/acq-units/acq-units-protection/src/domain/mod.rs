//! Domain layer for acquisition unit protection.

pub mod error;
pub mod merge;
pub mod service;
mod units;
pub mod visibility;

pub use error::{ErrorBody, ErrorCode, ErrorParameter, ProtectionError};
pub use merge::is_restricted;
pub use service::ProtectionService;
pub use visibility::VisibilityService;

//! Acquisition Units Protection
//!
//! Gates CRUD access to shared records by acquisition-unit membership:
//!
//! - [`ProtectionService::evaluate`] - may the caller perform these operations
//!   on a record assigned to these units?
//! - [`ProtectionService::guard_reassignment`] - may the caller change which
//!   units a record is assigned to?
//! - [`VisibilityService::build_clause`] - CQL clause limiting a search to
//!   records the caller may read
//!
//! Every call is stateless: units and memberships are fetched fresh through
//! the [`acq_units_sdk::AcqUnitsClient`] gateway on each evaluation.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{MANAGE_ASSIGNMENTS_PERMISSION, ProtectionConfig};
pub use domain::{
    ErrorBody, ErrorCode, ErrorParameter, ProtectionError, ProtectionService, VisibilityService,
    is_restricted,
};

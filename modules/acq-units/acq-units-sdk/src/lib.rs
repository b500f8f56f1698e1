#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Acquisition Units SDK
//!
//! This crate provides the shared vocabulary for acquisition-unit protection:
//!
//! - [`AcqUnitsClient`] - Gateway trait for fetching units and memberships
//! - [`AcquisitionUnit`], [`AcquisitionUnitMembership`] - Storage models
//! - [`ProtectedOperationType`] - CRUD operations a unit may protect
//! - [`ProtectedResource`] - Records carrying an `acqUnitIds` assignment
//! - [`CallerContext`] - Authenticated caller and its granted permissions
//! - [`AcqUnitsError`] - Gateway failures
//! - [`cql`] - CQL query builder helpers
//!
//! ## Usage
//!
//! ```ignore
//! use acq_units_sdk::{cql, AcqUnitsClient, UNBOUNDED_LIMIT};
//!
//! let query = cql::combine("and", &[cql::ALL_UNITS_CQL, &cql::ids_to_query(&ids)]);
//! let units = gateway.fetch_units(&query, 0, UNBOUNDED_LIMIT).await?;
//! ```

pub mod api;
pub mod caller;
pub mod cql;
pub mod error;
pub mod models;
pub mod operation;

// Re-export main types at crate root
pub use api::{AcqUnitsClient, UNBOUNDED_LIMIT};
pub use caller::{CallerContext, CallerContextBuilder, parse_permissions_header};
pub use error::AcqUnitsError;
pub use models::{
    AcquisitionUnit, AcquisitionUnitCollection, AcquisitionUnitMembership,
    AcquisitionUnitMembershipCollection, ProtectedResource,
};
pub use operation::ProtectedOperationType;

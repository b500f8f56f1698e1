#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Acquisition Units Plugin
//!
//! In-memory [`acq_units_sdk::AcqUnitsClient`] backed by units and
//! memberships seeded from configuration. Intended for development and
//! tests; it evaluates the CQL vocabulary the protection engine emits.
//!
//! ## Configuration
//!
//! ```yaml
//! units:
//!   - id: "11111111-1111-1111-1111-111111111111"
//!     name: "Main library"
//!     protectRead: true
//! memberships:
//!   - id: "44444444-4444-4444-4444-444444444444"
//!     acquisitionsUnitId: "11111111-1111-1111-1111-111111111111"
//!     userId: "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"
//! ```
//!
//! ## Query support
//!
//! Relations `==`, `=` and `<>`; values `*`, `[]`, quoted or bare terms and
//! `(a or b)` lists; `and`, `or`, `not` combined left to right;
//! `cql.allRecords=1`. A trailing `sortBy` is accepted and ignored.

pub mod config;
pub mod domain;

pub use config::StaticAcqUnitsPluginConfig;
pub use domain::query::{CqlQuery, CqlRecord, FieldValue, QueryError, matches};
pub use domain::service::Service;

//! Storage models for acquisition units and their memberships.
//!
//! Field names follow the remote storage JSON schema (camelCase).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::operation::ProtectedOperationType;

/// A named policy boundary flagging CRUD operations as protected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)] // one flag per protected operation, as stored
pub struct AcquisitionUnit {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default = "protected_by_default")]
    pub protect_create: bool,
    #[serde(default)]
    pub protect_read: bool,
    #[serde(default = "protected_by_default")]
    pub protect_update: bool,
    #[serde(default = "protected_by_default")]
    pub protect_delete: bool,
}

fn protected_by_default() -> bool {
    true
}

impl AcquisitionUnit {
    /// Create an active unit with the storage default flags
    /// (everything protected except READ).
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            name: String::new(),
            is_deleted: false,
            protect_create: true,
            protect_read: false,
            protect_update: true,
            protect_delete: true,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the protect flag for a single operation.
    #[must_use]
    pub fn with_protection(mut self, operation: ProtectedOperationType, protected: bool) -> Self {
        match operation {
            ProtectedOperationType::Create => self.protect_create = protected,
            ProtectedOperationType::Read => self.protect_read = protected,
            ProtectedOperationType::Update => self.protect_update = protected,
            ProtectedOperationType::Delete => self.protect_delete = protected,
        }
        self
    }

    #[must_use]
    pub fn with_deleted(mut self, is_deleted: bool) -> Self {
        self.is_deleted = is_deleted;
        self
    }
}

/// Join record between a user and an acquisition unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionUnitMembership {
    pub id: Uuid,
    pub acquisitions_unit_id: Uuid,
    pub user_id: Uuid,
}

impl AcquisitionUnitMembership {
    #[must_use]
    pub fn new(acquisitions_unit_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            acquisitions_unit_id,
            user_id,
        }
    }
}

/// One page of acquisition units.
///
/// `total_records` is the full match count reported by the storage, which
/// may exceed the page length. It is signed because the storage schema is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionUnitCollection {
    #[serde(default)]
    pub acquisitions_units: Vec<AcquisitionUnit>,
    #[serde(default)]
    pub total_records: i64,
}

impl AcquisitionUnitCollection {
    /// Wrap a complete result set.
    #[must_use]
    pub fn from_units(units: Vec<AcquisitionUnit>) -> Self {
        let total_records = i64::try_from(units.len()).unwrap_or(i64::MAX);
        Self {
            acquisitions_units: units,
            total_records,
        }
    }
}

/// One page of acquisition unit memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionUnitMembershipCollection {
    #[serde(default)]
    pub acquisitions_unit_memberships: Vec<AcquisitionUnitMembership>,
    #[serde(default)]
    pub total_records: i64,
}

impl AcquisitionUnitMembershipCollection {
    /// Wrap a complete result set.
    #[must_use]
    pub fn from_memberships(memberships: Vec<AcquisitionUnitMembership>) -> Self {
        let total_records = i64::try_from(memberships.len()).unwrap_or(i64::MAX);
        Self {
            acquisitions_unit_memberships: memberships,
            total_records,
        }
    }
}

/// A domain record whose visibility and mutation are gated by the
/// acquisition units it is assigned to.
///
/// The assignment may be empty and may reference deleted or unknown units.
pub trait ProtectedResource {
    fn acq_unit_ids(&self) -> &[Uuid];
}

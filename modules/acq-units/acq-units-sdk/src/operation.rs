//! CRUD operations an acquisition unit can protect.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::AcquisitionUnit;

/// Operation requested on a protected record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProtectedOperationType {
    Create,
    Read,
    Update,
    Delete,
}

impl ProtectedOperationType {
    pub const ALL: [Self; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    /// Whether `unit` flags this operation as protected.
    #[must_use]
    pub fn is_protected(self, unit: &AcquisitionUnit) -> bool {
        match self {
            Self::Create => unit.protect_create,
            Self::Read => unit.protect_read,
            Self::Update => unit.protect_update,
            Self::Delete => unit.protect_delete,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ProtectedOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn each_operation_reads_its_own_flag() {
        for op in ProtectedOperationType::ALL {
            let open = AcquisitionUnit::new(Uuid::nil()).with_protection(op, false);
            let closed = AcquisitionUnit::new(Uuid::nil()).with_protection(op, true);

            assert!(!op.is_protected(&open), "{op} should be open");
            assert!(op.is_protected(&closed), "{op} should be protected");
        }
    }

    #[test]
    fn serializes_uppercase() {
        let json = serde_json::to_string(&ProtectedOperationType::Update).unwrap();
        assert_eq!(json, r#""UPDATE""#);
        assert_eq!(ProtectedOperationType::Delete.to_string(), "DELETE");
    }
}

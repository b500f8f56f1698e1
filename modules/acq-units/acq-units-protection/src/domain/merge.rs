//! Merge strategy combining several units' protect flags into one verdict.

use acq_units_sdk::{AcquisitionUnit, ProtectedOperationType};

/// Whether the requested operations are restricted by the given active units.
///
/// Restricted iff EVERY unit protects AT LEAST ONE of the requested
/// operations. A single unit leaving all requested operations open lifts the
/// restriction for the whole record.
///
/// Returns `true` for an empty unit set; callers decide what "no active
/// units" means before asking.
#[must_use]
pub fn is_restricted(units: &[AcquisitionUnit], operations: &[ProtectedOperationType]) -> bool {
    units
        .iter()
        .all(|unit| operations.iter().any(|op| op.is_protected(unit)))
}

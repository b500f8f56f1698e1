//! Unit resolution by id.

use std::collections::BTreeSet;

use acq_units_sdk::{AcqUnitsClient, AcqUnitsError, AcquisitionUnit, UNBOUNDED_LIMIT, cql};
use uuid::Uuid;

use super::error::ProtectionError;

/// Units with the given ids in any deletion state, fetched in one
/// maximum-size page.
///
/// Ids unknown to the storage are absent from the result.
pub async fn units_by_ids(
    client: &dyn AcqUnitsClient,
    ids: &BTreeSet<Uuid>,
) -> Result<Vec<AcquisitionUnit>, ProtectionError> {
    let query = cql::combine("and", &[cql::ALL_UNITS_CQL.to_owned(), cql::ids_to_query(ids)]);
    let collection = client
        .fetch_units(&query, 0, UNBOUNDED_LIMIT)
        .await
        .map_err(|e| log_upstream("fetch_units", e))?;
    checked_total(collection.total_records)?;

    tracing::debug!(
        requested = ids.len(),
        found = collection.acquisitions_units.len(),
        "acquisition units fetched by id"
    );
    Ok(collection.acquisitions_units)
}

/// Validate a storage-reported record count.
pub fn checked_total(total_records: i64) -> Result<u64, ProtectionError> {
    u64::try_from(total_records).map_err(|_| {
        tracing::error!(total_records, "storage reported a negative record count");
        ProtectionError::internal(format!("negative totalRecords: {total_records}"))
    })
}

pub fn log_upstream(op: &str, e: AcqUnitsError) -> ProtectionError {
    tracing::error!(operation = op, error = %e, "acquisition units gateway call failed");
    e.into()
}

/// `expected - found`, in `expected` order.
#[must_use]
pub fn missing_ids(expected: &BTreeSet<Uuid>, found: &BTreeSet<Uuid>) -> Vec<Uuid> {
    expected.difference(found).copied().collect()
}

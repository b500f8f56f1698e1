//! Protection engine: CRUD gating and unit reassignment guard.

use std::collections::BTreeSet;
use std::sync::Arc;

use acq_units_sdk::{
    AcqUnitsClient, AcquisitionUnit, CallerContext, ProtectedOperationType, ProtectedResource,
    UNBOUNDED_LIMIT, cql,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::ProtectionError;
use super::merge::is_restricted;
use super::units::{checked_total, log_upstream, missing_ids, units_by_ids};
use crate::config::ProtectionConfig;

/// Acquisition unit protection service.
///
/// Holds only the gateway and configuration. Every decision is computed
/// from data fetched during the call itself.
#[derive(Clone)]
pub struct ProtectionService {
    client: Arc<dyn AcqUnitsClient>,
    config: ProtectionConfig,
}

impl ProtectionService {
    #[must_use]
    pub fn new(client: Arc<dyn AcqUnitsClient>, config: ProtectionConfig) -> Self {
        Self { client, config }
    }

    /// Check whether `caller` may perform `operations` on a record assigned
    /// to `unit_ids`.
    ///
    /// Allowed when no units are assigned, when every assigned unit is
    /// deleted, when some active unit leaves all requested operations open,
    /// or when the caller is a member of ANY active assigned unit.
    ///
    /// # Errors
    ///
    /// - `UnitsNotFound` listing assigned ids the storage does not know
    /// - `Forbidden` if the record is restricted and the caller is not a member
    /// - `Upstream` / `Internal` if the gateway fails or returns bad data
    #[tracing::instrument(
        skip_all,
        fields(user_id = %caller.user_id(), units = unit_ids.len(), operations = ?operations)
    )]
    pub async fn evaluate(
        &self,
        unit_ids: &[Uuid],
        operations: &[ProtectedOperationType],
        caller: &CallerContext,
    ) -> Result<(), ProtectionError> {
        let assigned: BTreeSet<Uuid> = unit_ids.iter().copied().collect();
        if assigned.is_empty() {
            return Ok(());
        }

        let units = units_by_ids(self.client.as_ref(), &assigned).await?;
        if units.len() != assigned.len() {
            let found: BTreeSet<Uuid> = units.iter().map(|unit| unit.id).collect();
            let missing = missing_ids(&assigned, &found);
            warn!(missing = ?missing, "assigned acquisition units not found");
            return Err(ProtectionError::units_not_found(missing));
        }

        let active: Vec<AcquisitionUnit> = units.into_iter().filter(|unit| !unit.is_deleted).collect();
        if active.is_empty() {
            debug!("only deleted units assigned");
            return Ok(());
        }

        if !is_restricted(&active, operations) {
            debug!(active_units = active.len(), "operations not restricted");
            return Ok(());
        }

        let active_ids: Vec<Uuid> = active.iter().map(|unit| unit.id).collect();
        self.verify_membership(caller.user_id(), &active_ids).await
    }

    /// [`Self::evaluate`] for a record's own unit assignment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::evaluate`].
    pub async fn evaluate_resource<R>(
        &self,
        resource: &R,
        operations: &[ProtectedOperationType],
        caller: &CallerContext,
    ) -> Result<(), ProtectionError>
    where
        R: ProtectedResource + ?Sized,
    {
        self.evaluate(resource.acq_unit_ids(), operations, caller)
            .await
    }

    /// Check whether `caller` may replace a record's unit assignment
    /// `current_unit_ids` with `new_unit_ids`.
    ///
    /// 1. Any change to the (unordered) unit set requires the manage
    ///    permission, whatever the units' protect flags say.
    /// 2. Newly added units must exist and be active.
    /// 3. The CURRENT assignment must allow UPDATE for the caller.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the manage permission is missing for a changed set,
    ///   or the current units deny UPDATE
    /// - `UnitsNotFound` listing added units that are unknown or deleted,
    ///   or current units that are unknown
    /// - `Upstream` / `Internal` if the gateway fails or returns bad data
    #[tracing::instrument(
        skip_all,
        fields(
            user_id = %caller.user_id(),
            new_units = new_unit_ids.len(),
            current_units = current_unit_ids.len()
        )
    )]
    pub async fn guard_reassignment(
        &self,
        new_unit_ids: &[Uuid],
        current_unit_ids: &[Uuid],
        caller: &CallerContext,
    ) -> Result<(), ProtectionError> {
        let new_units: BTreeSet<Uuid> = new_unit_ids.iter().copied().collect();
        let current_units: BTreeSet<Uuid> = current_unit_ids.iter().copied().collect();

        if new_units != current_units && !caller.has_permission(&self.config.manage_permission) {
            warn!("unit assignment change rejected: manage permission missing");
            return Err(ProtectionError::no_manage_permission());
        }

        let added: BTreeSet<Uuid> = new_units.difference(&current_units).copied().collect();
        if !added.is_empty() {
            verify_units_active(self.client.as_ref(), &added).await?;
        }

        self.evaluate(current_unit_ids, &[ProtectedOperationType::Update], caller)
            .await
    }

    /// [`Self::guard_reassignment`] for an updated record against its stored version.
    ///
    /// # Errors
    ///
    /// Same as [`Self::guard_reassignment`].
    pub async fn guard_update<R>(
        &self,
        updated: &R,
        current: &R,
        caller: &CallerContext,
    ) -> Result<(), ProtectionError>
    where
        R: ProtectedResource + ?Sized,
    {
        self.guard_reassignment(updated.acq_unit_ids(), current.acq_unit_ids(), caller)
            .await
    }

    /// Membership in ANY of `unit_ids` is sufficient.
    async fn verify_membership(
        &self,
        user_id: Uuid,
        unit_ids: &[Uuid],
    ) -> Result<(), ProtectionError> {
        let query = cql::user_memberships_query(user_id, unit_ids);
        let memberships = self
            .client
            .fetch_memberships(&query, 0, UNBOUNDED_LIMIT)
            .await
            .map_err(|e| log_upstream("fetch_memberships", e))?;

        if checked_total(memberships.total_records)? == 0 {
            warn!(units = unit_ids.len(), "caller is not a member of any protecting unit");
            return Err(ProtectionError::no_membership());
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProtectionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectionService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Every id in `unit_ids` must resolve to an active unit.
async fn verify_units_active(
    client: &dyn AcqUnitsClient,
    unit_ids: &BTreeSet<Uuid>,
) -> Result<(), ProtectionError> {
    let active: BTreeSet<Uuid> = units_by_ids(client, unit_ids)
        .await?
        .into_iter()
        .filter(|unit| !unit.is_deleted)
        .map(|unit| unit.id)
        .collect();

    if active.len() != unit_ids.len() {
        let missing = missing_ids(unit_ids, &active);
        warn!(missing = ?missing, "added acquisition units are missing or deleted");
        return Err(ProtectionError::units_not_found(missing));
    }
    Ok(())
}

//! Visibility clause for list and search queries.

use std::collections::HashSet;
use std::sync::Arc;

use acq_units_sdk::{AcqUnitsClient, CallerContext, UNBOUNDED_LIMIT, cql};
use tracing::debug;
use uuid::Uuid;

use super::error::ProtectionError;
use super::units::log_upstream;
use crate::config::ProtectionConfig;

/// Builds the CQL clause restricting a search to records the caller may read.
#[derive(Clone)]
pub struct VisibilityService {
    client: Arc<dyn AcqUnitsClient>,
    config: ProtectionConfig,
}

impl VisibilityService {
    #[must_use]
    pub fn new(client: Arc<dyn AcqUnitsClient>, config: ProtectionConfig) -> Self {
        Self { client, config }
    }

    /// Clause matching records that either carry no unit or carry at least
    /// one unit the caller belongs to or that is open for read.
    ///
    /// The membership and open-for-read lookups run concurrently; the first
    /// failure aborts the other.
    ///
    /// # Errors
    ///
    /// `Upstream` if either gateway lookup fails.
    #[tracing::instrument(skip_all, fields(user_id = %caller.user_id()))]
    pub async fn build_clause(&self, caller: &CallerContext) -> Result<String, ProtectionError> {
        let (member_of, open_for_read) = futures::try_join!(
            self.member_unit_ids(caller.user_id()),
            self.open_for_read_unit_ids()
        )?;

        debug!(
            member_units = member_of.len(),
            open_units = open_for_read.len(),
            "visibility units resolved"
        );

        let mut seen = HashSet::new();
        let unit_ids: Vec<Uuid> = member_of
            .into_iter()
            .chain(open_for_read)
            .filter(|id| seen.insert(*id))
            .collect();

        if unit_ids.is_empty() {
            return Ok(cql::NO_ACQ_UNIT_ASSIGNED_CQL.to_owned());
        }
        Ok(format!(
            "{} or ({})",
            cql::ids_to_clause(&unit_ids, cql::ACQUISITIONS_UNIT_IDS, false),
            cql::NO_ACQ_UNIT_ASSIGNED_CQL
        ))
    }

    /// `query` narrowed to what the caller may read; a trailing `sortBy` on
    /// `query` keeps ordering the whole result.
    ///
    /// # Errors
    ///
    /// Same as [`Self::build_clause`].
    pub async fn scope_query(
        &self,
        caller: &CallerContext,
        query: &str,
    ) -> Result<String, ProtectionError> {
        let clause = self.build_clause(caller).await?;
        Ok(cql::combine("and", &[clause.as_str(), query]))
    }

    async fn member_unit_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ProtectionError> {
        let query = format!("{}=={user_id}", cql::USER_ID);
        let memberships = self
            .client
            .fetch_memberships(&query, 0, UNBOUNDED_LIMIT)
            .await
            .map_err(|e| log_upstream("fetch_memberships", e))?;
        Ok(memberships
            .acquisitions_unit_memberships
            .into_iter()
            .map(|m| m.acquisitions_unit_id)
            .collect())
    }

    async fn open_for_read_unit_ids(&self) -> Result<Vec<Uuid>, ProtectionError> {
        let query = cql::combine("and", &[cql::ACTIVE_UNITS_CQL, cql::OPEN_FOR_READ_UNITS_CQL]);
        let units = self
            .client
            .fetch_units(&query, 0, UNBOUNDED_LIMIT)
            .await
            .map_err(|e| log_upstream("fetch_units", e))?;
        Ok(units.acquisitions_units.into_iter().map(|u| u.id).collect())
    }
}

impl std::fmt::Debug for VisibilityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

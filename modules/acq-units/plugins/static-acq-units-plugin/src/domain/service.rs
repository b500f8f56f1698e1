//! Service implementation for the static acquisition units plugin.

use acq_units_sdk::{
    AcquisitionUnit, AcquisitionUnitCollection, AcquisitionUnitMembership,
    AcquisitionUnitMembershipCollection, cql,
};

use super::query::{CqlQuery, QueryError};
use crate::config::StaticAcqUnitsPluginConfig;

/// Static acquisition units store.
///
/// Serves the configured units and memberships in configuration order.
/// Unit searches only see active units unless the query mentions `isDeleted`.
#[derive(Debug, Clone, Default)]
pub struct Service {
    units: Vec<AcquisitionUnit>,
    memberships: Vec<AcquisitionUnitMembership>,
}

impl Service {
    #[must_use]
    pub fn new(units: Vec<AcquisitionUnit>, memberships: Vec<AcquisitionUnitMembership>) -> Self {
        Self { units, memberships }
    }

    #[must_use]
    pub fn from_config(cfg: StaticAcqUnitsPluginConfig) -> Self {
        Self::new(cfg.units, cfg.memberships)
    }

    /// Search units.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if `query` cannot be parsed.
    pub fn search_units(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<AcquisitionUnitCollection, QueryError> {
        let filter = CqlQuery::parse(&cql::with_active_units_default(query))?;
        let (acquisitions_units, total_records) = page(&self.units, &filter, offset, limit);
        Ok(AcquisitionUnitCollection {
            acquisitions_units,
            total_records,
        })
    }

    /// Search memberships.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if `query` cannot be parsed.
    pub fn search_memberships(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<AcquisitionUnitMembershipCollection, QueryError> {
        let filter = CqlQuery::parse(query)?;
        let (acquisitions_unit_memberships, total_records) =
            page(&self.memberships, &filter, offset, limit);
        Ok(AcquisitionUnitMembershipCollection {
            acquisitions_unit_memberships,
            total_records,
        })
    }
}

/// One page of matches plus the full match count.
fn page<T>(records: &[T], filter: &CqlQuery, offset: u32, limit: u32) -> (Vec<T>, i64)
where
    T: super::query::CqlRecord + Clone,
{
    let hits: Vec<&T> = records.iter().filter(|r| filter.matches(*r)).collect();
    let total = i64::try_from(hits.len()).unwrap_or(i64::MAX);
    let page = hits
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .cloned()
        .collect();
    (page, total)
}

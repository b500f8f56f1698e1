//! Client implementation for the static acquisition units plugin.

use acq_units_sdk::{
    AcqUnitsClient, AcqUnitsError, AcquisitionUnitCollection, AcquisitionUnitMembershipCollection,
};
use async_trait::async_trait;

use super::query::QueryError;
use super::service::Service;

fn invalid_query(query: &str, e: &QueryError) -> AcqUnitsError {
    tracing::warn!(query, error = %e, "static plugin rejected query");
    AcqUnitsError::invalid_query(format!("{e}: {query}"))
}

#[async_trait]
impl AcqUnitsClient for Service {
    async fn fetch_units(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<AcquisitionUnitCollection, AcqUnitsError> {
        self.search_units(query, offset, limit)
            .map_err(|e| invalid_query(query, &e))
    }

    async fn fetch_memberships(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<AcquisitionUnitMembershipCollection, AcqUnitsError> {
        self.search_memberships(query, offset, limit)
            .map_err(|e| invalid_query(query, &e))
    }
}

//! Gateway trait for the acquisition units storage.

use async_trait::async_trait;

use crate::error::AcqUnitsError;
use crate::models::{AcquisitionUnitCollection, AcquisitionUnitMembershipCollection};

/// Page size requested when a complete result set is required.
///
/// Callers never paginate: asking for the largest page the storage accepts
/// is how "give me everything matching" is expressed.
pub const UNBOUNDED_LIMIT: u32 = 2_147_483_647;

/// Gateway to the remote acquisition units storage.
///
/// Implementations own transport concerns (HTTP client, tenant headers,
/// timeouts). Queries are CQL strings built with [`crate::cql`].
///
/// ```ignore
/// let units = gateway.fetch_units("isDeleted=*", 0, UNBOUNDED_LIMIT).await?;
/// ```
#[async_trait]
pub trait AcqUnitsClient: Send + Sync {
    /// Fetch acquisition units matching a CQL filter.
    ///
    /// # Errors
    ///
    /// - `Upstream` if the storage answered with a non-success status
    /// - `Unavailable` if the storage could not be reached
    /// - `InvalidQuery` if the filter was rejected
    async fn fetch_units(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<AcquisitionUnitCollection, AcqUnitsError>;

    /// Fetch acquisition unit memberships matching a CQL filter.
    ///
    /// # Errors
    ///
    /// Same failure classes as [`AcqUnitsClient::fetch_units`].
    async fn fetch_memberships(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<AcquisitionUnitMembershipCollection, AcqUnitsError>;
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::AcquisitionUnit;
    use uuid::Uuid;

    struct SingleUnitMock;

    #[async_trait]
    impl AcqUnitsClient for SingleUnitMock {
        async fn fetch_units(
            &self,
            _query: &str,
            _offset: u32,
            _limit: u32,
        ) -> Result<AcquisitionUnitCollection, AcqUnitsError> {
            Ok(AcquisitionUnitCollection::from_units(vec![
                AcquisitionUnit::new(Uuid::nil()),
            ]))
        }

        async fn fetch_memberships(
            &self,
            _query: &str,
            _offset: u32,
            _limit: u32,
        ) -> Result<AcquisitionUnitMembershipCollection, AcqUnitsError> {
            Err(AcqUnitsError::Unavailable("storage is down".to_owned()))
        }
    }

    #[tokio::test]
    async fn client_is_object_safe() {
        let client: Arc<dyn AcqUnitsClient> = Arc::new(SingleUnitMock);

        let units = client.fetch_units("isDeleted=*", 0, UNBOUNDED_LIMIT).await;
        assert_eq!(units.unwrap().total_records, 1);

        let memberships = client.fetch_memberships("userId==x", 0, 0).await;
        assert!(matches!(memberships, Err(AcqUnitsError::Unavailable(_))));
    }

    #[test]
    fn unbounded_limit_matches_storage_maximum() {
        assert_eq!(UNBOUNDED_LIMIT, u32::try_from(i32::MAX).unwrap());
    }
}

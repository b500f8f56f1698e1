//! Protection errors and the error code catalog.

use acq_units_sdk::AcqUnitsError;
use acq_units_sdk::cql::ACQUISITIONS_UNIT_IDS;
use http::StatusCode;
use serde::Serialize;
use uuid::Uuid;

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    GenericError,
    UnitsNotFound,
    UserHasNoPermission,
    UserHasNoAcqPermission,
}

impl ErrorCode {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::GenericError => "genericError",
            Self::UnitsNotFound => "organizationAcqUnitsNotFound",
            Self::UserHasNoPermission => "userHasNoPermission",
            Self::UserHasNoAcqPermission => "userHasNoAcqPermission",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::GenericError => "Generic error",
            Self::UnitsNotFound => {
                "Acquisitions units assigned to organization cannot be found"
            }
            Self::UserHasNoPermission => {
                "User does not have permissions - operation is restricted"
            }
            Self::UserHasNoAcqPermission => {
                "User does not have permissions to manage acquisition units assignments - operation is restricted"
            }
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// Outcome of a failed protection check.
///
/// `UnitsNotFound` and `Forbidden` are expected outcomes. Both are terminal:
/// a retry must re-run the whole evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ProtectionError {
    /// Referenced unit ids do not exist (or are not active where required).
    #[error("acquisition units not found: {unit_ids:?}")]
    UnitsNotFound { unit_ids: Vec<Uuid> },

    /// Membership or permission check failed.
    #[error("operation is restricted ({code})")]
    Forbidden { code: ErrorCode },

    /// The units gateway failed; surfaced unmodified.
    #[error("acquisition units gateway failed: {0}")]
    Upstream(#[from] AcqUnitsError),

    /// Invariant violation in gateway data.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProtectionError {
    #[must_use]
    pub fn units_not_found(unit_ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self::UnitsNotFound {
            unit_ids: unit_ids.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn no_membership() -> Self {
        Self::Forbidden {
            code: ErrorCode::UserHasNoPermission,
        }
    }

    #[must_use]
    pub fn no_manage_permission() -> Self {
        Self::Forbidden {
            code: ErrorCode::UserHasNoAcqPermission,
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnitsNotFound { .. } => ErrorCode::UnitsNotFound,
            Self::Forbidden { code } => *code,
            Self::Upstream(_) | Self::Internal(_) => ErrorCode::GenericError,
        }
    }

    /// HTTP status class of this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnitsNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Upstream(AcqUnitsError::Upstream { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Upstream(AcqUnitsError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(AcqUnitsError::InvalidQuery(_) | AcqUnitsError::Internal(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the response body for this error.
    ///
    /// Forbidden bodies carry the code only, so they never reveal which
    /// units exist or protect the record.
    #[must_use]
    pub fn to_error_body(&self) -> ErrorBody {
        let code = self.error_code();
        let message = match self {
            Self::UnitsNotFound { .. } | Self::Forbidden { .. } => code.description().to_owned(),
            Self::Upstream(e) => e.to_string(),
            Self::Internal(msg) => msg.clone(),
        };
        let parameters = match self {
            Self::UnitsNotFound { unit_ids } => vec![ErrorParameter {
                key: ACQUISITIONS_UNIT_IDS.to_owned(),
                value: unit_ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(","),
            }],
            _ => Vec::new(),
        };
        ErrorBody {
            code: code.code().to_owned(),
            message,
            parameters,
        }
    }
}

/// Serializable error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ErrorParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorParameter {
    pub key: String,
    pub value: String,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    const U1: &str = "11111111-1111-1111-1111-111111111111";

    #[test]
    fn units_not_found_is_unprocessable_and_lists_ids() {
        let err = ProtectionError::units_not_found([Uuid::parse_str(U1).unwrap()]);

        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            serde_json::to_value(err.to_error_body()).unwrap(),
            json!({
                "code": "organizationAcqUnitsNotFound",
                "message": "Acquisitions units assigned to organization cannot be found",
                "parameters": [{ "key": "acqUnitIds", "value": U1 }],
            })
        );
    }

    #[test]
    fn forbidden_body_carries_code_only() {
        let err = ProtectionError::no_membership();
        let body = serde_json::to_value(err.to_error_body()).unwrap();

        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(body["code"], json!("userHasNoPermission"));
        assert!(body.get("parameters").is_none());
    }

    #[test]
    fn manage_permission_denial_has_its_own_code() {
        let err = ProtectionError::no_manage_permission();
        assert_eq!(err.error_code(), ErrorCode::UserHasNoAcqPermission);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn upstream_status_passes_through() {
        let err = ProtectionError::from(AcqUnitsError::upstream(504, "gateway timeout"));
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let err = ProtectionError::from(AcqUnitsError::Unavailable("refused".to_owned()));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err = ProtectionError::from(AcqUnitsError::upstream(42, "nonsense"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn internal_is_server_error() {
        let err = ProtectionError::internal("negative totalRecords");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_error_body().code, "genericError");
    }
}

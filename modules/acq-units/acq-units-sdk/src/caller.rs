//! Caller identity and permissions for a protection check.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `CallerContext` carries the authenticated caller of one request.
///
/// Identity and permissions are verified upstream; this type only
/// transports them into protection checks. Permission strings are opaque
/// and matched by exact equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallerContext {
    user_id: Uuid,
    #[serde(default)]
    permissions: HashSet<String>,
}

impl CallerContext {
    /// Create a new `CallerContext` builder
    #[must_use]
    pub fn builder() -> CallerContextBuilder {
        CallerContextBuilder::default()
    }

    /// Get the ID of the calling user
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Get the permissions granted to the caller
    #[must_use]
    pub fn permissions(&self) -> &HashSet<String> {
        &self.permissions
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

#[derive(Default)]
pub struct CallerContextBuilder {
    user_id: Option<Uuid>,
    permissions: HashSet<String>,
}

impl CallerContextBuilder {
    #[must_use]
    pub fn user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    #[must_use]
    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn build(self) -> CallerContext {
        CallerContext {
            user_id: self.user_id.unwrap_or_default(),
            permissions: self.permissions,
        }
    }
}

/// Parse the JSON array of granted permissions forwarded by the gateway
/// (e.g. `["orders.item.get", "organizations.acquisitions-units-assignments.manage"]`).
///
/// An absent header means no permissions were granted.
///
/// # Errors
///
/// Returns the JSON error if the header is present but is not an array of strings.
pub fn parse_permissions_header(raw: Option<&str>) -> Result<HashSet<String>, serde_json::Error> {
    match raw {
        None => Ok(HashSet::new()),
        Some(raw) => serde_json::from_str(raw),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    const MANAGE: &str = "organizations.acquisitions-units-assignments.manage";

    #[test]
    fn builder_collects_permissions() {
        let user_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap();
        let ctx = CallerContext::builder()
            .user_id(user_id)
            .permission(MANAGE)
            .permissions(["organizations.item.get", "organizations.item.put"])
            .build();

        assert_eq!(ctx.user_id(), user_id);
        assert_eq!(ctx.permissions().len(), 3);
        assert!(ctx.has_permission(MANAGE));
    }

    #[test]
    fn permission_match_is_exact() {
        let ctx = CallerContext::builder()
            .permission("organizations.acquisitions-units-assignments")
            .build();

        assert!(!ctx.has_permission(MANAGE));
        assert!(!ctx.has_permission("ORGANIZATIONS.ACQUISITIONS-UNITS-ASSIGNMENTS"));
    }

    #[test]
    fn minimal_builder_has_nil_user_and_no_permissions() {
        let ctx = CallerContext::builder().build();

        assert_eq!(ctx.user_id(), Uuid::default());
        assert!(ctx.permissions().is_empty());
    }

    #[test]
    fn parse_header_variants() {
        assert!(parse_permissions_header(None).unwrap().is_empty());
        assert!(parse_permissions_header(Some("[]")).unwrap().is_empty());

        let perms = parse_permissions_header(Some(&format!(r#"["{MANAGE}", "a.b"]"#))).unwrap();
        assert!(perms.contains(MANAGE));
        assert!(perms.contains("a.b"));

        assert!(parse_permissions_header(Some("not json")).is_err());
        assert!(parse_permissions_header(Some(r#"{"a": 1}"#)).is_err());
    }
}

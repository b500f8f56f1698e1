//! CQL query builder helpers.
//!
//! Pure string functions used to express unit, membership and visibility
//! filters pushed to the remote storage.
//!
//! | Clause | Meaning |
//! |---|---|
//! | `isDeleted=*` | all units, any deletion state |
//! | `isDeleted==false` | active units only |
//! | `id==(a or b)` | strict id-set membership |
//! | `acqUnitIds=(a or b)` | loose array-contains match |
//! | `cql.allRecords=1 not acqUnitIds <> []` | no unit assigned |
//! | `userId==U AND acquisitionsUnitId==(a or b)` | membership lookup |

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

pub const ID: &str = "id";
pub const USER_ID: &str = "userId";
pub const ACQUISITIONS_UNIT_ID: &str = "acquisitionsUnitId";
pub const ACQUISITIONS_UNIT_IDS: &str = "acqUnitIds";
pub const IS_DELETED: &str = "isDeleted";
pub const PROTECT_READ: &str = "protectRead";

pub const ALL_UNITS_CQL: &str = "isDeleted=*";
pub const ACTIVE_UNITS_CQL: &str = "isDeleted==false";
pub const OPEN_FOR_READ_UNITS_CQL: &str = "protectRead==false";
pub const NO_ACQ_UNIT_ASSIGNED_CQL: &str = "cql.allRecords=1 not acqUnitIds <> []";

pub const UNITS_PATH: &str = "/acquisitions-units-storage/units";
pub const MEMBERSHIPS_PATH: &str = "/acquisitions-units-storage/memberships";

// Greedy prefix: splits at the last `sortBy` keyword.
#[allow(clippy::expect_used)]
static SORT_BY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(.*)(\ssortBy\s.*)$").expect("Invalid regex pattern")
});

/// Split a trailing `sortBy ...` directive off a CQL expression.
///
/// Returns `(filter, sorting)`; `sorting` keeps its leading whitespace so it
/// can be appended verbatim, and is empty when there is no directive.
#[must_use]
pub fn split_sort_by(expression: &str) -> (&str, &str) {
    match SORT_BY_PATTERN.captures(expression) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(filter), Some(sorting)) => (filter.as_str(), sorting.as_str()),
            _ => (expression, ""),
        },
        None => (expression, ""),
    }
}

/// Combine CQL expressions with a boolean operator.
///
/// Every non-blank expression is wrapped in parentheses. A `sortBy` directive
/// on the last expression is moved behind the final parenthesis so that it
/// orders the whole combined filter.
///
/// ```
/// use acq_units_sdk::cql::combine;
///
/// assert_eq!(combine("and", &["a==1", "b==2 sortBy c"]), "(a==1) and (b==2) sortBy c");
/// ```
#[must_use]
pub fn combine<S: AsRef<str>>(operator: &str, expressions: &[S]) -> String {
    let Some((last, rest)) = expressions.split_last() else {
        return String::new();
    };
    let (last, sorting) = split_sort_by(last.as_ref());

    let parts: Vec<&str> = rest
        .iter()
        .map(AsRef::as_ref)
        .chain(std::iter::once(last))
        .filter(|e| !e.trim().is_empty())
        .collect();

    if parts.is_empty() {
        return String::new();
    }

    let separator = format!(") {operator} (");
    format!("({}){sorting}", parts.join(&separator))
}

/// Build an id-set clause: `field==(a or b)` when `strict_match`, else
/// `field=(a or b)`.
///
/// An empty set yields `field==()`, which is valid CQL that matches nothing.
/// Callers wanting "no restriction" for an empty set must handle it first.
#[must_use]
pub fn ids_to_clause<I, T>(ids: I, field_name: &str, strict_match: bool) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let relation = if strict_match { "==" } else { "=" };
    let values = ids
        .into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    format!("{field_name}{relation}({values})")
}

/// Strict match on record ids: `id==(a or b)`.
#[must_use]
pub fn ids_to_query<I, T>(ids: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    ids_to_clause(ids, ID, true)
}

/// Memberships of `user_id` in any of `unit_ids`.
#[must_use]
pub fn user_memberships_query<I, T>(user_id: impl Display, unit_ids: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    format!(
        "{USER_ID}=={user_id} AND {}",
        ids_to_clause(unit_ids, ACQUISITIONS_UNIT_ID, true)
    )
}

/// Apply the unit storage default scope: units are active-only unless the
/// query mentions `isDeleted` itself.
#[must_use]
pub fn with_active_units_default(query: &str) -> String {
    if query.trim().is_empty() {
        ACTIVE_UNITS_CQL.to_owned()
    } else if query.contains(IS_DELETED) {
        query.to_owned()
    } else {
        combine("and", &[ACTIVE_UNITS_CQL, query])
    }
}

/// Percent-encode a filter for a request URL.
///
/// Blank input yields an empty string so "no filter" stays distinguishable
/// from an always-false filter such as `id==()`.
#[must_use]
pub fn encode_for_transport(query: &str) -> String {
    if query.trim().is_empty() {
        String::new()
    } else {
        urlencoding::encode(query).into_owned()
    }
}

/// Render paging and filter parameters: `?limit=L&offset=O[&query=...]`.
#[must_use]
pub fn search_params(query: &str, offset: u32, limit: u32) -> String {
    let encoded = encode_for_transport(query);
    if encoded.is_empty() {
        format!("?limit={limit}&offset={offset}")
    } else {
        format!("?limit={limit}&offset={offset}&query={encoded}")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use uuid::Uuid;

    // === combine ===

    #[test]
    fn combine_moves_sort_behind_closing_parenthesis() {
        assert_eq!(
            combine("and", &["a==1", "b==2 sortBy c"]),
            "(a==1) and (b==2) sortBy c"
        );
    }

    #[test]
    fn combine_sort_keyword_is_case_insensitive() {
        assert_eq!(
            combine("or", &["a==1", "b==2 SORTBY name/sort.descending"]),
            "(a==1) or (b==2) SORTBY name/sort.descending"
        );
    }

    #[test]
    fn combine_skips_blank_expressions() {
        assert_eq!(combine("and", &["", "a==1", "  ", "b==2"]), "(a==1) and (b==2)");
    }

    #[test]
    fn combine_empty_input_yields_empty_string() {
        let none: [&str; 0] = [];
        assert_eq!(combine("and", &none), "");
        assert_eq!(combine("and", &["", " "]), "");
    }

    #[test]
    fn combine_only_extracts_sort_from_last_expression() {
        assert_eq!(
            combine("and", &["a==1 sortBy x", "b==2"]),
            "(a==1 sortBy x) and (b==2)"
        );
    }

    #[test]
    fn combine_single_expression() {
        assert_eq!(combine("and", &[ALL_UNITS_CQL]), "(isDeleted=*)");
    }

    #[test]
    fn combine_accepts_owned_strings() {
        let parts = vec![ACTIVE_UNITS_CQL.to_owned(), ids_to_query(["u1"])];
        assert_eq!(combine("and", &parts), "(isDeleted==false) and (id==(u1))");
    }

    #[test]
    fn split_sort_by_requires_surrounding_whitespace() {
        assert_eq!(split_sort_by("name==sortByMe"), ("name==sortByMe", ""));
        assert_eq!(split_sort_by("a==1 sortBy b"), ("a==1", " sortBy b"));
    }

    // === ids_to_clause ===

    #[test]
    fn ids_to_clause_strict_and_loose() {
        assert_eq!(ids_to_clause(["x", "y"], "id", true), "id==(x or y)");
        assert_eq!(
            ids_to_clause(["x", "y"], ACQUISITIONS_UNIT_IDS, false),
            "acqUnitIds=(x or y)"
        );
    }

    #[test]
    fn ids_to_clause_empty_set_is_always_false_clause() {
        let none: [&str; 0] = [];
        assert_eq!(ids_to_clause(none, "id", true), "id==()");
    }

    #[test]
    fn ids_to_clause_formats_uuids() {
        let id = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        assert_eq!(
            ids_to_query(&[id]),
            "id==(11111111-1111-1111-1111-111111111111)"
        );
    }

    #[test]
    fn user_memberships_query_format() {
        assert_eq!(
            user_memberships_query("u", ["a", "b"]),
            "userId==u AND acquisitionsUnitId==(a or b)"
        );
    }

    // === default scope ===

    #[test]
    fn active_default_applies_unless_deletion_is_mentioned() {
        assert_eq!(with_active_units_default(""), "isDeleted==false");
        assert_eq!(
            with_active_units_default("protectRead==false"),
            "(isDeleted==false) and (protectRead==false)"
        );
        assert_eq!(
            with_active_units_default("(isDeleted=*) and (id==(a))"),
            "(isDeleted=*) and (id==(a))"
        );
    }

    // === transport ===

    #[test]
    fn encode_blank_is_empty() {
        assert_eq!(encode_for_transport(""), "");
        assert_eq!(encode_for_transport("   "), "");
    }

    #[test]
    fn encode_percent_encodes_reserved_characters() {
        assert_eq!(
            encode_for_transport("id==(a or b)"),
            "id%3D%3D%28a%20or%20b%29"
        );
    }

    #[test]
    fn search_params_with_and_without_query() {
        assert_eq!(search_params("", 0, 10), "?limit=10&offset=0");
        assert_eq!(
            search_params("isDeleted=*", 5, 10),
            "?limit=10&offset=5&query=isDeleted%3D%2A"
        );
    }
}

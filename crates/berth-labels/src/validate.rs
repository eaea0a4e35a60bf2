//! Payload shape checks shared by the store implementations and the service.

use crate::error::{LabelError, LabelResult};
use crate::model::{LabelId, LabelQuery, LabelScope, MAX_PAGE_SIZE, NewLabel, ProjectId};

/// Trim a label name and reject it when nothing remains.
///
/// # Errors
///
/// Returns `InvalidArgument` when the trimmed name is empty.
pub fn normalize_name(raw: &str) -> LabelResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LabelError::invalid("name", "must_not_be_empty"));
    }
    Ok(trimmed.to_string())
}

/// Reject non-positive label identifiers.
///
/// # Errors
///
/// Returns `InvalidArgument` when `id` is zero or negative.
pub const fn check_id(id: LabelId) -> LabelResult<()> {
    if id <= 0 {
        return Err(LabelError::invalid("id", "must_be_positive"));
    }
    Ok(())
}

/// Check the scope/project pairing and return the project id as stored.
///
/// Global labels carry project 0; project labels require a positive id.
///
/// # Errors
///
/// Returns `InvalidArgument` when the pairing is inconsistent.
pub const fn check_scope(scope: LabelScope, project_id: Option<ProjectId>) -> LabelResult<ProjectId> {
    match (scope, project_id) {
        (LabelScope::Global, None | Some(0)) => Ok(0),
        (LabelScope::Global, Some(_)) => {
            Err(LabelError::invalid("project_id", "must_be_zero_for_global_scope"))
        }
        (LabelScope::Project, Some(id)) if id > 0 => Ok(id),
        (LabelScope::Project, _) => Err(LabelError::invalid(
            "project_id",
            "must_be_positive_for_project_scope",
        )),
    }
}

/// Normalize a creation payload: trimmed name, consistent scope pairing.
///
/// # Errors
///
/// Returns `InvalidArgument` for an empty name or an inconsistent scope.
pub fn normalize_new_label(label: NewLabel) -> LabelResult<NewLabel> {
    let name = normalize_name(&label.name)?;
    let project_id = check_scope(label.scope, label.project_id)?;
    Ok(NewLabel {
        name,
        project_id: Some(project_id),
        ..label
    })
}

/// Check the scope pairing and pagination bounds of a listing query.
///
/// # Errors
///
/// Returns `InvalidArgument` for an inconsistent scope, `page` below 1, or a
/// `page_size` outside `1..=100`.
pub fn check_query(query: &LabelQuery) -> LabelResult<ProjectId> {
    let project_id = check_scope(query.scope, query.project_id)?;
    if query.page == 0 {
        return Err(LabelError::invalid("page", "must_be_positive"));
    }
    if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
        return Err(LabelError::invalid("page_size", "out_of_range"));
    }
    Ok(project_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_must_not_be_empty() {
        assert_eq!(normalize_name("  security ").ok().as_deref(), Some("security"));
        assert!(normalize_name("   ").is_err());
        assert!(normalize_name("").is_err());
    }

    #[test]
    fn ids_must_be_positive() {
        assert!(check_id(1).is_ok());
        assert!(check_id(0).is_err());
        assert!(check_id(-4).is_err());
    }

    #[test]
    fn scope_pairing_rules() {
        assert_eq!(check_scope(LabelScope::Global, None).ok(), Some(0));
        assert_eq!(check_scope(LabelScope::Global, Some(0)).ok(), Some(0));
        assert!(check_scope(LabelScope::Global, Some(2)).is_err());
        assert_eq!(check_scope(LabelScope::Project, Some(2)).ok(), Some(2));
        assert!(check_scope(LabelScope::Project, Some(0)).is_err());
        assert!(check_scope(LabelScope::Project, None).is_err());
        assert!(check_scope(LabelScope::Project, Some(-1)).is_err());
    }

    #[test]
    fn new_label_is_normalized() {
        let normalized = normalize_new_label(NewLabel::global(" sec ")).expect("valid payload");
        assert_eq!(normalized.name, "sec");
        assert_eq!(normalized.project_id, Some(0));
        assert!(normalize_new_label(NewLabel::project("dev", 0)).is_err());
    }

    #[test]
    fn query_pagination_bounds() {
        assert!(check_query(&LabelQuery::global()).is_ok());
        assert!(check_query(&LabelQuery::global().with_page(0, 10)).is_err());
        assert!(check_query(&LabelQuery::global().with_page(1, 0)).is_err());
        assert!(check_query(&LabelQuery::global().with_page(1, 101)).is_err());
        assert!(check_query(&LabelQuery::project(0)).is_err());
    }
}

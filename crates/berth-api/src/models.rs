//! Wire-level request and response shapes.
//!
//! Request bodies keep every field optional so that missing values surface
//! as field-level validation failures rather than extractor rejections.

use berth_labels::{
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE, LabelId, LabelQuery, LabelResult, LabelScope, LabelUpdate,
    NewLabel, ProjectId,
};
use serde::{Deserialize, Serialize};

/// RFC 9457 problem document returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary of the problem type.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Body of `POST /api/labels`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLabelRequest {
    /// Label name.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional display color.
    #[serde(default)]
    pub color: Option<String>,
    /// Scope code (`g` or `p`).
    #[serde(default)]
    pub scope: Option<String>,
    /// Owning project for project labels.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

impl CreateLabelRequest {
    /// Convert into the domain payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the scope is missing or unknown.
    pub fn into_new_label(self) -> LabelResult<NewLabel> {
        let scope = parse_scope(self.scope.as_deref())?;
        Ok(NewLabel {
            name: self.name.unwrap_or_default(),
            description: self.description,
            color: self.color,
            scope,
            project_id: self.project_id,
        })
    }
}

/// Body of `PUT /api/labels/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLabelRequest {
    /// Replacement name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement color.
    #[serde(default)]
    pub color: Option<String>,
    /// Scope echoed by the caller.
    #[serde(default)]
    pub scope: Option<String>,
    /// Project echoed by the caller.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

impl UpdateLabelRequest {
    /// Convert into the domain payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when a supplied scope is unknown.
    pub fn into_update(self) -> LabelResult<LabelUpdate> {
        let scope = match self.scope.as_deref() {
            Some(raw) => Some(raw.parse::<LabelScope>()?),
            None => None,
        };
        Ok(LabelUpdate {
            name: self.name.unwrap_or_default(),
            description: self.description,
            color: self.color,
            scope,
            project_id: self.project_id,
        })
    }
}

/// Query string of `GET /api/labels`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLabelsParams {
    /// Scope code (`g` or `p`).
    #[serde(default)]
    pub scope: Option<String>,
    /// Project filter.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Name fragment.
    #[serde(default)]
    pub name: Option<String>,
    /// One-based page index.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page.
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ListLabelsParams {
    /// Convert into a domain query, applying pagination defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the scope is missing or unknown.
    pub fn into_query(self) -> LabelResult<LabelQuery> {
        let scope = parse_scope(self.scope.as_deref())?;
        Ok(LabelQuery {
            scope,
            project_id: self.project_id,
            name: self.name.filter(|name| !name.is_empty()),
            page: self.page.unwrap_or(DEFAULT_PAGE),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

/// Body returned by a successful create.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedLabel {
    /// Identifier of the new label.
    pub id: LabelId,
}

fn parse_scope(raw: Option<&str>) -> LabelResult<LabelScope> {
    raw.unwrap_or_default().parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_labels::{ErrorKind, LabelError};

    #[test]
    fn create_request_requires_known_scope() {
        let missing = CreateLabelRequest::default().into_new_label();
        assert!(matches!(
            missing,
            Err(LabelError::InvalidArgument {
                field: "scope",
                reason: "required"
            })
        ));

        let unknown = CreateLabelRequest {
            scope: Some("x".to_string()),
            ..CreateLabelRequest::default()
        }
        .into_new_label();
        assert!(matches!(
            unknown,
            Err(LabelError::InvalidArgument {
                reason: "unknown_scope",
                ..
            })
        ));
    }

    #[test]
    fn create_request_maps_fields() -> LabelResult<()> {
        let request: CreateLabelRequest = serde_json::from_str(
            r##"{"name":"dev","scope":"p","project_id":3,"color":"#ff0000"}"##,
        )
        .map_err(|err| LabelError::backend("decode", err))?;
        let label = request.into_new_label()?;
        assert_eq!(label.name, "dev");
        assert_eq!(label.scope, LabelScope::Project);
        assert_eq!(label.project_id, Some(3));
        assert_eq!(label.color.as_deref(), Some("#ff0000"));
        Ok(())
    }

    #[test]
    fn list_params_apply_defaults() -> LabelResult<()> {
        let query = ListLabelsParams {
            scope: Some("g".to_string()),
            name: Some(String::new()),
            ..ListLabelsParams::default()
        }
        .into_query()?;
        assert_eq!(query, LabelQuery::global());

        let err = ListLabelsParams::default().into_query().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        Ok(())
    }

    #[test]
    fn update_request_parses_optional_scope() -> LabelResult<()> {
        let update = UpdateLabelRequest {
            name: Some("renamed".to_string()),
            scope: Some("g".to_string()),
            ..UpdateLabelRequest::default()
        }
        .into_update()?;
        assert_eq!(update.scope, Some(LabelScope::Global));
        assert_eq!(update.name, "renamed");

        let none = UpdateLabelRequest::default().into_update()?;
        assert_eq!(none.scope, None);
        Ok(())
    }
}

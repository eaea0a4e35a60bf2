//! Label route handlers.
//!
//! Every handler resolves its inputs into a `LabelResult`, lets the service
//! do the work, counts the outcome, then renders success or a problem
//! document. Malformed ids and bodies count as invalid arguments.
//! Mutating routes reject anonymous callers before looking at the request.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Extension, Path as AxumPath, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderName, HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use berth_labels::{
    Credential, Label, LabelError, LabelId, LabelPage, LabelResources, LabelResult, Operation,
};
use tracing::debug;

use crate::http::constants::{HEADER_TOTAL_COUNT, LABELS_PATH};
use crate::http::errors::ApiError;
use crate::models::{CreateLabelRequest, CreatedLabel, ListLabelsParams, UpdateLabelRequest};
use crate::state::ApiState;

pub(crate) async fn create_label(
    State(state): State<Arc<ApiState>>,
    Extension(credential): Extension<Credential>,
    payload: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let result: LabelResult<LabelId> = async {
        require_credential(&credential)?;
        let Json(request) = payload.map_err(body_rejected)?;
        let label = request.into_new_label()?;
        state.labels.create_label(&credential, label).await
    }
    .await;
    state.record(Operation::Create, &result);
    let id = result?;

    let location = HeaderValue::from_str(&format!("{LABELS_PATH}/{id}"))
        .map_err(|_| ApiError::internal("failed to build location header"))?;
    let mut response = (StatusCode::CREATED, Json(CreatedLabel { id })).into_response();
    response.headers_mut().insert(LOCATION, location);
    Ok(response)
}

pub(crate) async fn list_labels(
    State(state): State<Arc<ApiState>>,
    Extension(credential): Extension<Credential>,
    params: Result<Query<ListLabelsParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let result: LabelResult<LabelPage> = async {
        let Query(params) = params.map_err(|rejection| {
            debug!(error = %rejection, "rejected label list query");
            LabelError::invalid("query", "malformed")
        })?;
        let query = params.into_query()?;
        state.labels.list_labels(&credential, query).await
    }
    .await;
    state.record(Operation::List, &result);
    let page = result?;

    let mut response = Json(page.items).into_response();
    response.headers_mut().insert(
        HeaderName::from_static(HEADER_TOTAL_COUNT),
        HeaderValue::from(page.total),
    );
    Ok(response)
}

pub(crate) async fn get_label(
    State(state): State<Arc<ApiState>>,
    Extension(credential): Extension<Credential>,
    AxumPath(raw_id): AxumPath<String>,
) -> Result<Json<Label>, ApiError> {
    let result: LabelResult<Label> = async {
        let id = parse_label_id(&raw_id)?;
        state.labels.get_label(&credential, id).await
    }
    .await;
    state.record(Operation::Read, &result);
    Ok(Json(result?))
}

pub(crate) async fn update_label(
    State(state): State<Arc<ApiState>>,
    Extension(credential): Extension<Credential>,
    AxumPath(raw_id): AxumPath<String>,
    payload: Result<Json<UpdateLabelRequest>, JsonRejection>,
) -> Result<Json<Label>, ApiError> {
    let result: LabelResult<Label> = async {
        require_credential(&credential)?;
        let id = parse_label_id(&raw_id)?;
        let Json(request) = payload.map_err(body_rejected)?;
        let update = request.into_update()?;
        state.labels.update_label(&credential, id, update).await
    }
    .await;
    state.record(Operation::Update, &result);
    Ok(Json(result?))
}

pub(crate) async fn delete_label(
    State(state): State<Arc<ApiState>>,
    Extension(credential): Extension<Credential>,
    AxumPath(raw_id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let result: LabelResult<()> = async {
        require_credential(&credential)?;
        let id = parse_label_id(&raw_id)?;
        state.labels.delete_label(&credential, id).await
    }
    .await;
    state.record(Operation::Delete, &result);
    result?;
    Ok(StatusCode::OK)
}

pub(crate) async fn list_label_resources(
    State(state): State<Arc<ApiState>>,
    Extension(credential): Extension<Credential>,
    AxumPath(raw_id): AxumPath<String>,
) -> Result<Json<LabelResources>, ApiError> {
    let result: LabelResult<LabelResources> = async {
        require_credential(&credential)?;
        let id = parse_label_id(&raw_id)?;
        state.labels.list_label_resources(&credential, id).await
    }
    .await;
    state.record(Operation::ListResources, &result);
    Ok(Json(result?))
}

const fn require_credential(credential: &Credential) -> LabelResult<()> {
    match credential {
        Credential::Anonymous => Err(LabelError::Unauthenticated),
        _ => Ok(()),
    }
}

fn parse_label_id(raw: &str) -> LabelResult<LabelId> {
    raw.trim()
        .parse::<LabelId>()
        .map_err(|_| LabelError::invalid("id", "must_be_numeric"))
}

fn body_rejected(rejection: JsonRejection) -> LabelError {
    debug!(error = %rejection, "rejected label payload");
    LabelError::invalid("body", "malformed_json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_ids_must_be_numeric() {
        assert_eq!(parse_label_id("42").ok(), Some(42));
        assert_eq!(parse_label_id(" 7 ").ok(), Some(7));
        assert!(matches!(
            parse_label_id("abc"),
            Err(LabelError::InvalidArgument {
                field: "id",
                reason: "must_be_numeric"
            })
        ));
    }

    #[test]
    fn anonymous_callers_are_unauthenticated() {
        assert!(matches!(
            require_credential(&Credential::Anonymous),
            Err(LabelError::Unauthenticated)
        ));
        assert!(require_credential(&Credential::api_key("dev", "secret")).is_ok());
    }
}

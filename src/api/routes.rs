//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                            | Return Type         |
// |-----------------------|----------------------------------------|---------------------|
// | health                | Health check endpoint                  | Response            |
// | create_event          | Create an event                        | ApiResult<Response> |
// | get_event             | Current state of an event              | ApiResult<Response> |
// | get_history           | Audit log of an event                  | ApiResult<Response> |
// | attach_post           | Link the announcement post             | ApiResult<Response> |
// | update_settings       | Replace event settings                 | ApiResult<Response> |
// | lookup_registration   | Registration of one participant        | ApiResult<Response> |
// | add_couple            | Couple signup                          | ApiResult<Response> |
// | add_single            | Single signup                          | ApiResult<Response> |
// | remove_dancer         | Withdraw a participant                 | ApiResult<Response> |
//--------------------------------------------------------------------------------------------------

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{
    AppState, ApiResult, AttachPostRequest, CoupleRequest, CreateEventRequest, DancerRequest,
    RegistrationResponse, UpdateSettingsRequest,
};

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

pub async fn create_event(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<Response> {
    let event = state
        .service
        .create_event(req.owner, &req.caption, req.settings)
        .await?;
    Ok((StatusCode::CREATED, Json(event)).into_response())
}

pub async fn get_event(
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> ApiResult<Response> {
    let event = state.service.get_event(&event_id).await?;
    Ok((StatusCode::OK, Json(event)).into_response())
}

pub async fn get_history(
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> ApiResult<Response> {
    let history = state.service.event_history(&event_id).await?;
    Ok((StatusCode::OK, Json(history)).into_response())
}

pub async fn attach_post(
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(req): Json<AttachPostRequest>,
) -> ApiResult<Response> {
    let event = state
        .service
        .attach_post(&event_id, req.post, req.initiator)
        .await?;
    Ok((StatusCode::OK, Json(event)).into_response())
}

pub async fn update_settings(
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Response> {
    let event = state
        .service
        .update_settings(&event_id, req.settings, req.initiator)
        .await?;
    Ok((StatusCode::OK, Json(event)).into_response())
}

pub async fn lookup_registration(
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(req): Json<DancerRequest>,
) -> ApiResult<Response> {
    let dancer = req.dancer.into_participant()?;
    let reg = state.service.registration_get(&event_id, &dancer).await?;
    Ok((StatusCode::OK, Json(RegistrationResponse::from(reg))).into_response())
}

pub async fn add_couple(
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(req): Json<CoupleRequest>,
) -> ApiResult<Response> {
    let dancer = req.dancer.into_participant()?;
    let partner = req.partner.into_participant()?;
    let reg = state.service.couple_add(&event_id, &dancer, &partner).await?;
    Ok((StatusCode::OK, Json(RegistrationResponse::from(reg))).into_response())
}

pub async fn add_single(
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(req): Json<DancerRequest>,
) -> ApiResult<Response> {
    let dancer = req.dancer.into_participant()?;
    let reg = state.service.single_add(&event_id, &dancer).await?;
    Ok((StatusCode::OK, Json(RegistrationResponse::from(reg))).into_response())
}

pub async fn remove_dancer(
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(req): Json<DancerRequest>,
) -> ApiResult<Response> {
    let dancer = req.dancer.into_participant()?;
    let reg = state.service.dancer_remove(&event_id, &dancer).await?;
    Ok((StatusCode::OK, Json(RegistrationResponse::from(reg))).into_response())
}

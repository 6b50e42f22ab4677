// src/handlers/merge.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::restaurant::{CreateMergeGroupPayload, UpdateMergeGroupPayload},
};

pub async fn get_merge_groups(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let groups = app_state.restaurant_service.get_merge_groups().await?;
    Ok(Json(groups))
}

pub async fn get_merge_group(
    State(app_state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let group = app_state.restaurant_service.get_merge_group(group_id).await?;
    Ok(Json(group))
}

pub async fn create_merge_group(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateMergeGroupPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let group = app_state
        .restaurant_service
        .create_merge_group(&payload)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update_merge_group(
    State(app_state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<UpdateMergeGroupPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let group = app_state
        .restaurant_service
        .update_merge_group(group_id, payload.name.as_deref(), payload.is_active)
        .await?;
    Ok(Json(group))
}

// Desfaz a união: as mesas membro continuam existindo
pub async fn delete_merge_group(
    State(app_state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.restaurant_service.delete_merge_group(group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

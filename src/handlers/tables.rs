// src/handlers/tables.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::restaurant::{ChairRearrangement, CreateTablePayload, UpdateTablePayload},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTablesQuery {
    // Por padrão só mesas ativas
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

pub async fn get_tables(
    State(app_state): State<AppState>,
    Query(query): Query<ListTablesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tables = app_state.restaurant_service.get_tables(query.active_only).await?;
    Ok(Json(tables))
}

pub async fn get_table(
    State(app_state): State<AppState>,
    Path(table_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let table = app_state.restaurant_service.get_table(table_id).await?;
    Ok(Json(table))
}

pub async fn create_table(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateTablePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    // Validação de consistência entre campos (o validator não cobre relações)
    payload.validate_consistency().map_err(|e| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("maxChairs".into(), e);
        AppError::ValidationError(errors)
    })?;

    let table = app_state.restaurant_service.create_table(&payload).await?;
    Ok((StatusCode::CREATED, Json(table)))
}

pub async fn update_table(
    State(app_state): State<AppState>,
    Path(table_id): Path<Uuid>,
    Json(payload): Json<UpdateTablePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let table = app_state
        .restaurant_service
        .update_table(table_id, &payload)
        .await?;
    Ok(Json(table))
}

// Mesas com histórico de reservas são apenas desativadas
pub async fn delete_table(
    State(app_state): State<AppState>,
    Path(table_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.restaurant_service.delete_table(table_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Remaneja cadeiras entre várias mesas e o estoque compartilhado, de forma
// atômica
pub async fn rearrange_chairs(
    State(app_state): State<AppState>,
    Json(payload): Json<Vec<ChairRearrangement>>,
) -> Result<impl IntoResponse, AppError> {
    for rearrangement in &payload {
        rearrangement.validate().map_err(AppError::ValidationError)?;
    }

    let tables = app_state.restaurant_service.rearrange_chairs(&payload).await?;
    Ok(Json(tables))
}

// src/handlers/config.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::restaurant::{CreateConfigPayload, UpdateConfigPayload},
};

// Busca a configuração do restaurante (pode não existir antes do setup)
pub async fn get_config(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let config = app_state.restaurant_service.get_config().await?;
    Ok(Json(config))
}

// Cria a configuração (setup único)
pub async fn create_config(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateConfigPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let config = app_state
        .restaurant_service
        .create_config(&payload.name, payload.total_extra_chairs)
        .await?;
    Ok((StatusCode::CREATED, Json(config)))
}

pub async fn update_config(
    State(app_state): State<AppState>,
    Json(payload): Json<UpdateConfigPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let config = app_state
        .restaurant_service
        .update_config(payload.name.as_deref(), payload.total_extra_chairs)
        .await?;
    Ok(Json(config))
}

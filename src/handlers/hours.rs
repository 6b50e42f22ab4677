// src/handlers/hours.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::hours::{
        CreateOperatingHoursPayload, CreateSpecialHoursPayload, UpdateOperatingHoursPayload,
        UpdateSpecialHoursPayload,
    },
};

fn consistency_error(e: validator::ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add("openTime".into(), e);
    AppError::ValidationError(errors)
}

// ---
// Horário semanal
// ---

pub async fn get_all_hours(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let hours = app_state.hours_service.get_all_hours().await?;
    Ok(Json(hours))
}

pub async fn create_hours(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateOperatingHoursPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    payload.validate_consistency().map_err(consistency_error)?;

    let hours = app_state
        .hours_service
        .create_hours(
            payload.day_of_week,
            payload.open_time,
            payload.close_time,
            payload.is_closed,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(hours)))
}

// Cadastro da semana inteira de uma vez (assistente de configuração)
pub async fn bulk_create_hours(
    State(app_state): State<AppState>,
    Json(payload): Json<Vec<CreateOperatingHoursPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let mut entries = Vec::with_capacity(payload.len());
    for p in &payload {
        p.validate().map_err(AppError::ValidationError)?;
        p.validate_consistency().map_err(consistency_error)?;
        entries.push((p.day_of_week, p.open_time, p.close_time, p.is_closed));
    }

    let hours = app_state.hours_service.bulk_create_hours(&entries).await?;
    Ok((StatusCode::CREATED, Json(hours)))
}

pub async fn update_hours(
    State(app_state): State<AppState>,
    Path(day_of_week): Path<i16>,
    Json(payload): Json<UpdateOperatingHoursPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !(0..=6).contains(&day_of_week) {
        return Err(AppError::NotFound(format!("Horário para o dia {}", day_of_week)));
    }

    let hours = app_state
        .hours_service
        .update_hours(
            day_of_week,
            payload.open_time,
            payload.close_time,
            payload.is_closed,
        )
        .await?;
    Ok(Json(hours))
}

// ---
// Horários especiais
// ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialHoursQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn get_special_hours(
    State(app_state): State<AppState>,
    Query(query): Query<SpecialHoursQuery>,
) -> Result<impl IntoResponse, AppError> {
    let hours = app_state
        .hours_service
        .get_special_hours(query.start_date, query.end_date)
        .await?;
    Ok(Json(hours))
}

pub async fn create_special_hours(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateSpecialHoursPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    payload.validate_consistency().map_err(consistency_error)?;

    let hours = app_state
        .hours_service
        .create_special_hours(
            payload.date,
            payload.open_time,
            payload.close_time,
            payload.is_closed,
            payload.reason.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(hours)))
}

pub async fn update_special_hours(
    State(app_state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(payload): Json<UpdateSpecialHoursPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let hours = app_state
        .hours_service
        .update_special_hours(
            date,
            payload.open_time,
            payload.close_time,
            payload.is_closed,
            payload.reason.as_deref(),
        )
        .await?;
    Ok(Json(hours))
}

pub async fn delete_special_hours(
    State(app_state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<impl IntoResponse, AppError> {
    app_state.hours_service.delete_special_hours(date).await?;
    Ok(StatusCode::NO_CONTENT)
}

// src/handlers/reservations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::reservation::{
        AvailabilityQuery, CreateReservationPayload, ReservationFilters, UpdateReservationPayload,
    },
};

pub async fn get_reservations(
    State(app_state): State<AppState>,
    Query(filters): Query<ReservationFilters>,
) -> Result<impl IntoResponse, AppError> {
    let reservations = app_state
        .reservation_service
        .get_reservations(&filters)
        .await?;
    Ok(Json(reservations))
}

// Busca de disponibilidade: mesas livres e suficientes para o slot pedido
pub async fn get_available_tables(
    State(app_state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate().map_err(AppError::ValidationError)?;

    let options = app_state
        .reservation_service
        .get_available_tables(
            query.reservation_date,
            query.reservation_time,
            query.party_size,
            query.duration_minutes,
        )
        .await?;
    Ok(Json(options))
}

pub async fn get_reservation(
    State(app_state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = app_state
        .reservation_service
        .get_reservation(reservation_id)
        .await?;
    Ok(Json(reservation))
}

// Criação de reserva. Regras aplicadas pelo serviço:
// - dentro do horário de funcionamento, respeitando a antecedência mínima
// - telefone obrigatório para grupos de 4+
// - mesas atribuídas, ativas e com capacidade suficiente
// - sem conflito com reservas ativas nas mesmas mesas
pub async fn create_reservation(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateReservationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let reservation = app_state
        .reservation_service
        .create_reservation(&payload)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn update_reservation(
    State(app_state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
    Json(payload): Json<UpdateReservationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let reservation = app_state
        .reservation_service
        .update_reservation(reservation_id, &payload)
        .await?;
    Ok(Json(reservation))
}

pub async fn cancel_reservation(
    State(app_state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = app_state
        .reservation_service
        .cancel_reservation(reservation_id)
        .await?;
    Ok(Json(reservation))
}

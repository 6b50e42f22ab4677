// src/models/reservation.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::restaurant::Table;

// --- Status da reserva ---
// Enum fechado com transições validadas, em vez de string livre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "snake_case")] // Banco
#[serde(rename_all = "snake_case")] // JSON
pub enum ReservationStatus {
    Confirmed,
    Seated,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    // Estados terminais absorvem: nenhuma transição sai deles.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed
                | ReservationStatus::Cancelled
                | ReservationStatus::NoShow
        )
    }

    pub fn can_transition_to(self, to: ReservationStatus) -> bool {
        use ReservationStatus::*;
        match self {
            Confirmed => matches!(to, Seated | Cancelled | NoShow),
            Seated => matches!(to, Completed | Cancelled),
            Completed | Cancelled | NoShow => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Seated => "seated",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no_show",
        }
    }
}

// --- Reserva ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: Uuid,

    pub guest_name: String,
    pub party_size: i32,
    pub phone_number: Option<String>,
    pub notes: Option<String>,

    // O intervalo semiaberto [início, início + duração)
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub duration_minutes: i32,

    // Proveniência: preenchido quando a reserva foi feita sobre um grupo de
    // mesas unidas. As mesas em si ficam em reservation_tables.
    pub merge_group_id: Option<Uuid>,

    pub status: ReservationStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Reserva com as mesas atribuídas, como devolvida pela API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub tables: Vec<Table>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do cliente é obrigatório."))]
    pub guest_name: String,

    #[validate(range(min = 1, message = "O tamanho do grupo deve ser positivo."))]
    pub party_size: i32,

    #[validate(length(max = 20, message = "O telefone é longo demais."))]
    pub phone_number: Option<String>,

    pub notes: Option<String>,

    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,

    #[validate(range(min = 1, message = "A duração deve ser positiva."))]
    pub duration_minutes: Option<i32>,

    // Exatamente um dos dois deve ser informado
    pub table_ids: Option<Vec<Uuid>>,
    pub merge_group_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservationPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do cliente não pode ser vazio."))]
    pub guest_name: Option<String>,

    #[validate(range(min = 1, message = "O tamanho do grupo deve ser positivo."))]
    pub party_size: Option<i32>,

    #[validate(length(max = 20, message = "O telefone é longo demais."))]
    pub phone_number: Option<String>,

    pub notes: Option<String>,

    pub reservation_date: Option<NaiveDate>,
    pub reservation_time: Option<NaiveTime>,

    #[validate(range(min = 1, message = "A duração deve ser positiva."))]
    pub duration_minutes: Option<i32>,

    pub table_ids: Option<Vec<Uuid>>,
    pub merge_group_id: Option<Uuid>,

    pub status: Option<ReservationStatus>,
}

// Filtros da listagem de reservas
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
    pub table_id: Option<Uuid>,
}

// Ocupação de uma mesa por uma reserva ativa em uma data: o recorte mínimo
// que a busca de disponibilidade precisa para o teste de sobreposição.
#[derive(Debug, Clone, FromRow)]
pub struct TableOccupancy {
    pub table_id: Uuid,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub duration_minutes: i32,
}

// --- Busca de disponibilidade ---
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,

    #[validate(range(min = 1, message = "O tamanho do grupo deve ser positivo."))]
    pub party_size: i32,

    #[validate(range(min = 1, message = "A duração deve ser positiva."))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityKind {
    Table,
    Combo,
}

// Uma opção de assento livre e suficiente para o grupo:
// uma mesa individual ou uma combinação de mesas livres.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityOption {
    #[serde(rename = "type")]
    pub kind: AvailabilityKind,
    pub table_ids: Vec<Uuid>,
    pub table_numbers: Vec<String>,
    pub capacity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmed_transitions() {
        let s = ReservationStatus::Confirmed;
        assert!(s.can_transition_to(ReservationStatus::Seated));
        assert!(s.can_transition_to(ReservationStatus::Cancelled));
        assert!(s.can_transition_to(ReservationStatus::NoShow));
        assert!(!s.can_transition_to(ReservationStatus::Completed));
    }

    #[test]
    fn test_seated_transitions() {
        let s = ReservationStatus::Seated;
        assert!(s.can_transition_to(ReservationStatus::Completed));
        assert!(s.can_transition_to(ReservationStatus::Cancelled));
        assert!(!s.can_transition_to(ReservationStatus::NoShow));
        assert!(!s.can_transition_to(ReservationStatus::Confirmed));
    }

    #[test]
    fn test_availability_query_rejects_non_positive_values() {
        let base = AvailabilityQuery {
            reservation_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            reservation_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            party_size: 2,
            duration_minutes: Some(90),
        };
        assert!(base.validate().is_ok());

        let bad_party = AvailabilityQuery { party_size: 0, ..base };
        assert!(bad_party.validate().is_err());

        let bad_duration = AvailabilityQuery {
            party_size: 2,
            duration_minutes: Some(-30),
            ..bad_party
        };
        assert!(bad_duration.validate().is_err());
    }

    #[test]
    fn test_terminal_states_absorb() {
        for terminal in [
            ReservationStatus::Completed,
            ReservationStatus::Cancelled,
            ReservationStatus::NoShow,
        ] {
            assert!(terminal.is_terminal());
            for to in [
                ReservationStatus::Confirmed,
                ReservationStatus::Seated,
                ReservationStatus::Completed,
                ReservationStatus::Cancelled,
                ReservationStatus::NoShow,
            ] {
                assert!(!terminal.can_transition_to(to));
            }
        }
    }
}

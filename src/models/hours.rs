// src/models/hours.rs

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Horário semanal recorrente ---
// day_of_week: 0 = segunda ... 6 = domingo
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OperatingHours {
    pub id: Uuid,
    pub day_of_week: i16,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_closed: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperatingHoursPayload {
    #[validate(range(min = 0, max = 6, message = "O dia da semana deve estar entre 0 e 6."))]
    pub day_of_week: i16,

    pub open_time: NaiveTime,
    pub close_time: NaiveTime,

    #[serde(default)]
    pub is_closed: bool,
}

impl CreateOperatingHoursPayload {
    pub fn validate_consistency(&self) -> Result<(), ValidationError> {
        validate_open_before_close(self.is_closed, Some(self.open_time), Some(self.close_time))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOperatingHoursPayload {
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub is_closed: Option<bool>,
}

// --- Horário especial por data ---
// Quando existe uma entrada para a data, ela substitui o horário semanal
// por completo (inclusive para fechar um dia normalmente aberto).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SpecialHours {
    pub id: Uuid,
    pub date: NaiveDate,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub is_closed: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpecialHoursPayload {
    pub date: NaiveDate,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,

    #[serde(default)]
    pub is_closed: bool,

    #[validate(length(max = 255, message = "O motivo é longo demais."))]
    pub reason: Option<String>,
}

impl CreateSpecialHoursPayload {
    pub fn validate_consistency(&self) -> Result<(), ValidationError> {
        validate_open_before_close(self.is_closed, self.open_time, self.close_time)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpecialHoursPayload {
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub is_closed: Option<bool>,

    #[validate(length(max = 255, message = "O motivo é longo demais."))]
    pub reason: Option<String>,
}

// A janela de funcionamento efetiva para uma data, depois de aplicar a
// cadeia de resolução: especial -> semanal -> fechado por padrão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveHours {
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub is_closed: bool,
}

impl EffectiveHours {
    pub const CLOSED: Self = Self {
        open_time: None,
        close_time: None,
        is_closed: true,
    };
}

// Regra compartilhada: quando aberto, precisa de abertura < fechamento.
pub fn validate_open_before_close(
    is_closed: bool,
    open_time: Option<NaiveTime>,
    close_time: Option<NaiveTime>,
) -> Result<(), ValidationError> {
    if is_closed {
        return Ok(());
    }
    let (Some(open), Some(close)) = (open_time, close_time) else {
        let mut err = ValidationError::new("missing_times");
        err.message = Some("openTime e closeTime são obrigatórios quando não está fechado.".into());
        return Err(err);
    };
    if open >= close {
        let mut err = ValidationError::new("open_after_close");
        err.message = Some("openTime deve ser anterior a closeTime.".into());
        return Err(err);
    }
    Ok(())
}

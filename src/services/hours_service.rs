// src/services/hours_service.rs

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use crate::{
    common::error::AppError,
    config::Settings,
    db::HoursRepository,
    models::hours::{
        validate_open_before_close, EffectiveHours, OperatingHours, SpecialHours,
    },
};

#[derive(Clone)]
pub struct HoursService {
    hours_repo: HoursRepository,
    settings: Settings,
}

impl HoursService {
    pub fn new(hours_repo: HoursRepository, settings: Settings) -> Self {
        Self { hours_repo, settings }
    }

    // ---
    // CRUD do horário semanal
    // ---

    pub async fn get_all_hours(&self) -> Result<Vec<OperatingHours>, AppError> {
        self.hours_repo.get_all_hours().await
    }

    pub async fn create_hours(
        &self,
        day_of_week: i16,
        open_time: NaiveTime,
        close_time: NaiveTime,
        is_closed: bool,
    ) -> Result<OperatingHours, AppError> {
        self.hours_repo
            .create_hours(self.hours_repo_pool(), day_of_week, open_time, close_time, is_closed)
            .await
    }

    // Cadastro da semana inteira de uma vez (assistente de configuração).
    // Tudo ou nada: uma transação única.
    pub async fn bulk_create_hours(
        &self,
        entries: &[(i16, NaiveTime, NaiveTime, bool)],
    ) -> Result<Vec<OperatingHours>, AppError> {
        let mut tx = self.hours_repo_pool().begin().await?;
        let mut created = Vec::with_capacity(entries.len());
        for (day, open, close, closed) in entries {
            let hours = self
                .hours_repo
                .create_hours(&mut *tx, *day, *open, *close, *closed)
                .await?;
            created.push(hours);
        }
        tx.commit().await?;
        Ok(created)
    }

    pub async fn update_hours(
        &self,
        day_of_week: i16,
        open_time: Option<NaiveTime>,
        close_time: Option<NaiveTime>,
        is_closed: Option<bool>,
    ) -> Result<OperatingHours, AppError> {
        let existing = self
            .hours_repo
            .get_hours_for_day(day_of_week)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Horário para o dia {}", day_of_week)))?;

        // Valida o resultado da fusão, não só os campos enviados
        let new_open = open_time.unwrap_or(existing.open_time);
        let new_close = close_time.unwrap_or(existing.close_time);
        let new_closed = is_closed.unwrap_or(existing.is_closed);
        validate_open_before_close(new_closed, Some(new_open), Some(new_close))
            .map_err(|e| field_error("openTime", e))?;

        let updated = self
            .hours_repo
            .update_hours(day_of_week, open_time, close_time, is_closed)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Horário para o dia {}", day_of_week)))?;
        Ok(updated)
    }

    // ---
    // CRUD dos horários especiais
    // ---

    pub async fn get_special_hours(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<SpecialHours>, AppError> {
        self.hours_repo.get_special_hours(start_date, end_date).await
    }

    pub async fn create_special_hours(
        &self,
        date: NaiveDate,
        open_time: Option<NaiveTime>,
        close_time: Option<NaiveTime>,
        is_closed: bool,
        reason: Option<&str>,
    ) -> Result<SpecialHours, AppError> {
        self.hours_repo
            .create_special_hours(date, open_time, close_time, is_closed, reason)
            .await
    }

    pub async fn update_special_hours(
        &self,
        date: NaiveDate,
        open_time: Option<NaiveTime>,
        close_time: Option<NaiveTime>,
        is_closed: Option<bool>,
        reason: Option<&str>,
    ) -> Result<SpecialHours, AppError> {
        let existing = self
            .hours_repo
            .get_special_hours_for_date(date)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Horário especial para {}", date)))?;

        let new_open = open_time.or(existing.open_time);
        let new_close = close_time.or(existing.close_time);
        let new_closed = is_closed.unwrap_or(existing.is_closed);
        validate_open_before_close(new_closed, new_open, new_close)
            .map_err(|e| field_error("openTime", e))?;

        let updated = self
            .hours_repo
            .update_special_hours(date, open_time, close_time, is_closed, reason)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Horário especial para {}", date)))?;
        Ok(updated)
    }

    pub async fn delete_special_hours(&self, date: NaiveDate) -> Result<(), AppError> {
        let deleted = self.hours_repo.delete_special_hours(date).await?;
        if !deleted {
            return Err(AppError::NotFound(format!("Horário especial para {}", date)));
        }
        Ok(())
    }

    // ---
    // Resolução de horário efetivo
    // ---

    // Cadeia de resolução: especial -> semanal -> fechado por padrão.
    // Ausência de configuração significa fechado, não "aberto o dia todo".
    pub async fn resolve(&self, date: NaiveDate) -> Result<EffectiveHours, AppError> {
        if let Some(special) = self.hours_repo.get_special_hours_for_date(date).await? {
            return Ok(EffectiveHours {
                open_time: special.open_time,
                close_time: special.close_time,
                is_closed: special.is_closed,
            });
        }

        // chrono: num_days_from_monday já dá 0 = segunda ... 6 = domingo
        let day_of_week = date.weekday().num_days_from_monday() as i16;
        if let Some(regular) = self.hours_repo.get_hours_for_day(day_of_week).await? {
            return Ok(EffectiveHours {
                open_time: Some(regular.open_time),
                close_time: Some(regular.close_time),
                is_closed: regular.is_closed,
            });
        }

        Ok(EffectiveHours::CLOSED)
    }

    // Valida um slot de reserva contra o horário efetivo da data
    pub async fn validate_slot(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i32,
    ) -> Result<(), AppError> {
        let hours = self.resolve(date).await?;
        check_slot(
            hours,
            date,
            time,
            duration_minutes,
            self.settings.reservation_cutoff_minutes,
        )
    }

    fn hours_repo_pool(&self) -> &sqlx::PgPool {
        self.hours_repo.pool()
    }
}

// Checagem pura do slot: toda a aritmética é feita em data-hora completa para
// que durações que cruzam a meia-noite sejam tratadas corretamente.
pub fn check_slot(
    hours: EffectiveHours,
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: i32,
    cutoff_minutes: i32,
) -> Result<(), AppError> {
    if hours.is_closed {
        return Err(AppError::Closed);
    }
    let (Some(open), Some(close)) = (hours.open_time, hours.close_time) else {
        return Err(AppError::Closed);
    };

    if time < open {
        return Err(AppError::BeforeOpening { open });
    }

    let start_dt = date.and_time(time);
    let close_dt = date.and_time(close);

    // Antecedência mínima antes do fechamento
    let cutoff_dt = close_dt - Duration::minutes(cutoff_minutes as i64);
    if start_dt > cutoff_dt {
        return Err(AppError::TooCloseToClosing { cutoff: cutoff_minutes, close });
    }

    // A reserva não pode ultrapassar o fechamento
    let end_dt = start_dt + Duration::minutes(duration_minutes as i64);
    if end_dt > close_dt {
        return Err(AppError::ExtendsPastClosing { close });
    }

    Ok(())
}

fn field_error(field: &'static str, e: validator::ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field.into(), e);
    AppError::ValidationError(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap() // uma segunda-feira
    }

    fn open_11_22() -> EffectiveHours {
        EffectiveHours {
            open_time: Some(t(11, 0)),
            close_time: Some(t(22, 0)),
            is_closed: false,
        }
    }

    #[test]
    fn test_accepts_slot_within_hours() {
        assert!(check_slot(open_11_22(), d(), t(18, 0), 90, 30).is_ok());
    }

    #[test]
    fn test_rejects_closed_day() {
        assert!(matches!(
            check_slot(EffectiveHours::CLOSED, d(), t(18, 0), 90, 30),
            Err(AppError::Closed)
        ));
    }

    #[test]
    fn test_rejects_missing_times_as_closed() {
        let hours = EffectiveHours {
            open_time: None,
            close_time: None,
            is_closed: false,
        };
        assert!(matches!(
            check_slot(hours, d(), t(18, 0), 90, 30),
            Err(AppError::Closed)
        ));
    }

    #[test]
    fn test_rejects_before_opening() {
        assert!(matches!(
            check_slot(open_11_22(), d(), t(10, 30), 60, 30),
            Err(AppError::BeforeOpening { .. })
        ));
    }

    #[test]
    fn test_rejects_too_close_to_closing() {
        // Fecha às 22:00, antecedência de 30min: 21:45 é tarde demais
        assert!(matches!(
            check_slot(open_11_22(), d(), t(21, 45), 90, 30),
            Err(AppError::TooCloseToClosing { .. })
        ));
    }

    #[test]
    fn test_accepts_exactly_at_cutoff() {
        // 21:30 é exatamente o limite, com duração que cabe
        assert!(check_slot(open_11_22(), d(), t(21, 30), 30, 30).is_ok());
    }

    #[test]
    fn test_rejects_extends_past_closing() {
        // 21:00 + 90min = 22:30 > 22:00
        assert!(matches!(
            check_slot(open_11_22(), d(), t(21, 0), 90, 30),
            Err(AppError::ExtendsPastClosing { .. })
        ));
    }

    #[test]
    fn test_accepts_ending_exactly_at_closing() {
        // 20:30 + 90min = 22:00, exatamente no fechamento
        assert!(check_slot(open_11_22(), d(), t(20, 30), 90, 30).is_ok());
    }
}

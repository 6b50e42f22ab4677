// src/db/hours_repo.rs

use chrono::{NaiveDate, NaiveTime};
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::hours::{OperatingHours, SpecialHours},
};

// Repositório dos horários de funcionamento (semanais e especiais)
#[derive(Clone)]
pub struct HoursRepository {
    pool: PgPool,
}

impl HoursRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Horário semanal
    // ---

    pub async fn get_all_hours(&self) -> Result<Vec<OperatingHours>, AppError> {
        let hours = sqlx::query_as::<_, OperatingHours>(
            "SELECT * FROM operating_hours ORDER BY day_of_week ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(hours)
    }

    pub async fn get_hours_for_day(
        &self,
        day_of_week: i16,
    ) -> Result<Option<OperatingHours>, AppError> {
        let hours = sqlx::query_as::<_, OperatingHours>(
            "SELECT * FROM operating_hours WHERE day_of_week = $1",
        )
        .bind(day_of_week)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hours)
    }

    pub async fn create_hours<'e, E>(
        &self,
        executor: E,
        day_of_week: i16,
        open_time: NaiveTime,
        close_time: NaiveTime,
        is_closed: bool,
    ) -> Result<OperatingHours, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, OperatingHours>(
            "INSERT INTO operating_hours (day_of_week, open_time, close_time, is_closed)
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(day_of_week)
        .bind(open_time)
        .bind(close_time)
        .bind(is_closed)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::AlreadyExists(format!("Horário para o dia {}", day_of_week));
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn update_hours(
        &self,
        day_of_week: i16,
        open_time: Option<NaiveTime>,
        close_time: Option<NaiveTime>,
        is_closed: Option<bool>,
    ) -> Result<Option<OperatingHours>, AppError> {
        let hours = sqlx::query_as::<_, OperatingHours>(
            "UPDATE operating_hours SET
                open_time = COALESCE($2, open_time),
                close_time = COALESCE($3, close_time),
                is_closed = COALESCE($4, is_closed)
             WHERE day_of_week = $1 RETURNING *",
        )
        .bind(day_of_week)
        .bind(open_time)
        .bind(close_time)
        .bind(is_closed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hours)
    }

    // ---
    // Horários especiais
    // ---

    pub async fn get_special_hours(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<SpecialHours>, AppError> {
        let hours = sqlx::query_as::<_, SpecialHours>(
            "SELECT * FROM special_hours
             WHERE ($1::date IS NULL OR date >= $1)
               AND ($2::date IS NULL OR date <= $2)
             ORDER BY date ASC",
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(hours)
    }

    pub async fn get_special_hours_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<SpecialHours>, AppError> {
        let hours =
            sqlx::query_as::<_, SpecialHours>("SELECT * FROM special_hours WHERE date = $1")
                .bind(date)
                .fetch_optional(&self.pool)
                .await?;
        Ok(hours)
    }

    pub async fn create_special_hours(
        &self,
        date: NaiveDate,
        open_time: Option<NaiveTime>,
        close_time: Option<NaiveTime>,
        is_closed: bool,
        reason: Option<&str>,
    ) -> Result<SpecialHours, AppError> {
        sqlx::query_as::<_, SpecialHours>(
            "INSERT INTO special_hours (date, open_time, close_time, is_closed, reason)
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(date)
        .bind(open_time)
        .bind(close_time)
        .bind(is_closed)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::AlreadyExists(format!("Horário especial para {}", date));
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn update_special_hours(
        &self,
        date: NaiveDate,
        open_time: Option<NaiveTime>,
        close_time: Option<NaiveTime>,
        is_closed: Option<bool>,
        reason: Option<&str>,
    ) -> Result<Option<SpecialHours>, AppError> {
        let hours = sqlx::query_as::<_, SpecialHours>(
            "UPDATE special_hours SET
                open_time = COALESCE($2, open_time),
                close_time = COALESCE($3, close_time),
                is_closed = COALESCE($4, is_closed),
                reason = COALESCE($5, reason)
             WHERE date = $1 RETURNING *",
        )
        .bind(date)
        .bind(open_time)
        .bind(close_time)
        .bind(is_closed)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hours)
    }

    // Acesso à pool para o serviço abrir transações
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn delete_special_hours(&self, date: NaiveDate) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM special_hours WHERE date = $1")
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// src/db/reservation_repo.rs

use chrono::{NaiveDate, NaiveTime};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        reservation::{Reservation, ReservationFilters, ReservationStatus, TableOccupancy},
        restaurant::Table,
    },
};

// Repositório de reservas e da tabela de junção reservation_tables
#[derive(Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_reservation<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(reservation)
    }

    // Trava a linha da reserva dentro da transação de alteração: mudanças
    // de status concorrentes serializam aqui.
    pub async fn find_reservation_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(reservation)
    }

    pub async fn list_reservations(
        &self,
        filters: &ReservationFilters,
    ) -> Result<Vec<Reservation>, AppError> {
        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations r
             WHERE ($1::date IS NULL OR r.reservation_date >= $1)
               AND ($2::date IS NULL OR r.reservation_date <= $2)
               AND ($3::reservation_status IS NULL OR r.status = $3)
               AND ($4::uuid IS NULL OR EXISTS (
                        SELECT 1 FROM reservation_tables rt
                        WHERE rt.reservation_id = r.id AND rt.table_id = $4))
             ORDER BY r.reservation_date ASC, r.reservation_time ASC",
        )
        .bind(filters.start_date)
        .bind(filters.end_date)
        .bind(filters.status)
        .bind(filters.table_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reservations)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_reservation<'e, E>(
        &self,
        executor: E,
        guest_name: &str,
        party_size: i32,
        phone_number: Option<&str>,
        notes: Option<&str>,
        reservation_date: NaiveDate,
        reservation_time: NaiveTime,
        duration_minutes: i32,
        merge_group_id: Option<Uuid>,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservation = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations
                (guest_name, party_size, phone_number, notes,
                 reservation_date, reservation_time, duration_minutes, merge_group_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(guest_name)
        .bind(party_size)
        .bind(phone_number)
        .bind(notes)
        .bind(reservation_date)
        .bind(reservation_time)
        .bind(duration_minutes)
        .bind(merge_group_id)
        .fetch_one(executor)
        .await?;
        Ok(reservation)
    }

    // Grava o estado final completo: o serviço já fez a fusão entre os
    // campos antigos e os alterados.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_reservation<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        guest_name: &str,
        party_size: i32,
        phone_number: Option<&str>,
        notes: Option<&str>,
        reservation_date: NaiveDate,
        reservation_time: NaiveTime,
        duration_minutes: i32,
        merge_group_id: Option<Uuid>,
        status: ReservationStatus,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservation = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET
                guest_name = $2, party_size = $3, phone_number = $4, notes = $5,
                reservation_date = $6, reservation_time = $7, duration_minutes = $8,
                merge_group_id = $9, status = $10, updated_at = now()
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(guest_name)
        .bind(party_size)
        .bind(phone_number)
        .bind(notes)
        .bind(reservation_date)
        .bind(reservation_time)
        .bind(duration_minutes)
        .bind(merge_group_id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(reservation)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservation = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(reservation)
    }

    // ---
    // Junção reserva <-> mesas
    // ---

    pub async fn link_tables<'e, E>(
        &self,
        executor: E,
        reservation_id: Uuid,
        table_ids: &[Uuid],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO reservation_tables (reservation_id, table_id)
             SELECT $1, unnest($2::uuid[])",
        )
        .bind(reservation_id)
        .bind(table_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn clear_tables<'e, E>(
        &self,
        executor: E,
        reservation_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM reservation_tables WHERE reservation_id = $1")
            .bind(reservation_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn get_reservation_tables<'e, E>(
        &self,
        executor: E,
        reservation_id: Uuid,
    ) -> Result<Vec<Table>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tables = sqlx::query_as::<_, Table>(
            "SELECT t.* FROM tables t
             JOIN reservation_tables rt ON rt.table_id = t.id
             WHERE rt.reservation_id = $1
             ORDER BY t.table_number ASC",
        )
        .bind(reservation_id)
        .fetch_all(executor)
        .await?;
        Ok(tables)
    }

    // Reservas ativas da data que tocam qualquer mesa candidata. O teste de
    // interseção de intervalos fica no serviço; aqui só o recorte por data,
    // status e mesas.
    pub async fn active_reservations_for_tables<'e, E>(
        &self,
        executor: E,
        table_ids: &[Uuid],
        date: NaiveDate,
        exclude_reservation_id: Option<Uuid>,
    ) -> Result<Vec<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT DISTINCT r.* FROM reservations r
             JOIN reservation_tables rt ON rt.reservation_id = r.id
             WHERE r.reservation_date = $1
               AND r.status IN ('confirmed', 'seated')
               AND rt.table_id = ANY($2)
               AND ($3::uuid IS NULL OR r.id <> $3)",
        )
        .bind(date)
        .bind(table_ids)
        .bind(exclude_reservation_id)
        .fetch_all(executor)
        .await?;
        Ok(reservations)
    }

    // Ocupação de todas as mesas por reservas ativas em uma data, para a
    // busca de disponibilidade avaliar a sobreposição mesa a mesa.
    pub async fn occupancies_for_date<'e, E>(
        &self,
        executor: E,
        date: NaiveDate,
    ) -> Result<Vec<TableOccupancy>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let occupancies = sqlx::query_as::<_, TableOccupancy>(
            "SELECT rt.table_id, r.reservation_date, r.reservation_time, r.duration_minutes
             FROM reservations r
             JOIN reservation_tables rt ON rt.reservation_id = r.id
             WHERE r.reservation_date = $1
               AND r.status IN ('confirmed', 'seated')",
        )
        .bind(date)
        .fetch_all(executor)
        .await?;
        Ok(occupancies)
    }

    // Existe alguma reserva (histórica ou ativa) referenciando a mesa?
    // Decide entre exclusão física e desativação.
    pub async fn table_has_reservations<'e, E>(
        &self,
        executor: E,
        table_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM reservation_tables WHERE table_id = $1)",
        )
        .bind(table_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    // Anula a proveniência das reservas do grupo removido. O histórico fica:
    // as mesas atribuídas em reservation_tables não são tocadas.
    pub async fn clear_group_provenance<'e, E>(
        &self,
        executor: E,
        group_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE reservations SET merge_group_id = NULL WHERE merge_group_id = $1")
            .bind(group_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Existe reserva não terminal apontando para o grupo?
    pub async fn group_has_active_reservations<'e, E>(
        &self,
        executor: E,
        group_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM reservations
                WHERE merge_group_id = $1 AND status IN ('confirmed', 'seated')
             )",
        )
        .bind(group_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    // Acesso à pool para os serviços abrirem transações
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

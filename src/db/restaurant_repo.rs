// src/db/restaurant_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::restaurant::{MergeGroup, RestaurantConfig, Table},
};

// Repositório de configuração, mesas e grupos de mesas unidas.
// Os métodos recebem um executor genérico para que os serviços possam
// encadear várias operações dentro de uma mesma transação.
#[derive(Clone)]
pub struct RestaurantRepository {
    pool: PgPool,
}

impl RestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Configuração global (linha única)
    // ---

    pub async fn get_config<'e, E>(&self, executor: E) -> Result<Option<RestaurantConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config = sqlx::query_as::<_, RestaurantConfig>("SELECT * FROM restaurant_config")
            .fetch_optional(executor)
            .await?;
        Ok(config)
    }

    pub async fn create_config<'e, E>(
        &self,
        executor: E,
        name: &str,
        total_extra_chairs: i32,
    ) -> Result<RestaurantConfig, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, RestaurantConfig>(
            "INSERT INTO restaurant_config (id, name, total_extra_chairs)
             VALUES (1, $1, $2) RETURNING *",
        )
        .bind(name)
        .bind(total_extra_chairs)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::AlreadyExists("Configuração do restaurante".to_string());
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn update_config<'e, E>(
        &self,
        executor: E,
        name: Option<&str>,
        total_extra_chairs: Option<i32>,
    ) -> Result<Option<RestaurantConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config = sqlx::query_as::<_, RestaurantConfig>(
            "UPDATE restaurant_config SET
                name = COALESCE($1, name),
                total_extra_chairs = COALESCE($2, total_extra_chairs)
             WHERE id = 1 RETURNING *",
        )
        .bind(name)
        .bind(total_extra_chairs)
        .fetch_optional(executor)
        .await?;
        Ok(config)
    }

    // Trava a linha de configuração durante o remanejamento de cadeiras,
    // serializando remanejamentos concorrentes.
    pub async fn get_config_for_update<'e, E>(
        &self,
        executor: E,
    ) -> Result<Option<RestaurantConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config =
            sqlx::query_as::<_, RestaurantConfig>("SELECT * FROM restaurant_config FOR UPDATE")
                .fetch_optional(executor)
                .await?;
        Ok(config)
    }

    // ---
    // Mesas
    // ---

    pub async fn get_tables<'e, E>(&self, executor: E, active_only: bool) -> Result<Vec<Table>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tables = sqlx::query_as::<_, Table>(
            "SELECT * FROM tables WHERE ($1 = FALSE OR is_active = TRUE) ORDER BY table_number ASC",
        )
        .bind(active_only)
        .fetch_all(executor)
        .await?;
        Ok(tables)
    }

    pub async fn find_table<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Table>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let table = sqlx::query_as::<_, Table>("SELECT * FROM tables WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(table)
    }

    // Trava as mesas candidatas dentro da transação de admissão. Duas
    // admissões concorrentes sobre a mesma mesa serializam aqui, fechando a
    // janela de dupla reserva entre a checagem de conflito e o commit.
    pub async fn lock_tables<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Table>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tables = sqlx::query_as::<_, Table>(
            "SELECT * FROM tables WHERE id = ANY($1) ORDER BY table_number ASC FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(tables)
    }

    pub async fn create_table<'e, E>(
        &self,
        executor: E,
        table_number: &str,
        default_chairs: i32,
        max_chairs: i32,
        is_mergeable: bool,
        is_active: bool,
    ) -> Result<Table, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // current_chairs nasce igual a default_chairs
        sqlx::query_as::<_, Table>(
            "INSERT INTO tables
                (table_number, default_chairs, max_chairs, current_chairs, is_mergeable, is_active)
             VALUES ($1, $2, $3, $2, $4, $5) RETURNING *",
        )
        .bind(table_number)
        .bind(default_chairs)
        .bind(max_chairs)
        .bind(is_mergeable)
        .bind(is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::AlreadyExists(format!("Mesa '{}'", table_number));
                }
            }
            AppError::DatabaseError(e)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_table<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        table_number: Option<&str>,
        default_chairs: Option<i32>,
        max_chairs: Option<i32>,
        current_chairs: Option<i32>,
        is_mergeable: Option<bool>,
        is_active: Option<bool>,
    ) -> Result<Table, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Table>(
            "UPDATE tables SET
                table_number = COALESCE($2, table_number),
                default_chairs = COALESCE($3, default_chairs),
                max_chairs = COALESCE($4, max_chairs),
                current_chairs = COALESCE($5, current_chairs),
                is_mergeable = COALESCE($6, is_mergeable),
                is_active = COALESCE($7, is_active)
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(table_number)
        .bind(default_chairs)
        .bind(max_chairs)
        .bind(current_chairs)
        .bind(is_mergeable)
        .bind(is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::AlreadyExists("Mesa com esse número".to_string());
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn set_current_chairs<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        current_chairs: i32,
    ) -> Result<Table, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let table = sqlx::query_as::<_, Table>(
            "UPDATE tables SET current_chairs = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(current_chairs)
        .fetch_one(executor)
        .await?;
        Ok(table)
    }

    pub async fn set_table_active<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        is_active: bool,
    ) -> Result<Table, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let table =
            sqlx::query_as::<_, Table>("UPDATE tables SET is_active = $2 WHERE id = $1 RETURNING *")
                .bind(id)
                .bind(is_active)
                .fetch_one(executor)
                .await?;
        Ok(table)
    }

    pub async fn delete_table<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM tables WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // Grupos de mesas unidas
    // ---

    pub async fn get_merge_groups<'e, E>(&self, executor: E) -> Result<Vec<MergeGroup>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let groups = sqlx::query_as::<_, MergeGroup>("SELECT * FROM merge_groups ORDER BY name ASC")
            .fetch_all(executor)
            .await?;
        Ok(groups)
    }

    pub async fn find_merge_group<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<MergeGroup>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, MergeGroup>("SELECT * FROM merge_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(group)
    }

    pub async fn create_merge_group<'e, E>(
        &self,
        executor: E,
        name: Option<&str>,
    ) -> Result<MergeGroup, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, MergeGroup>(
            "INSERT INTO merge_groups (name) VALUES ($1) RETURNING *",
        )
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(group)
    }

    pub async fn update_merge_group<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<MergeGroup, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, MergeGroup>(
            "UPDATE merge_groups SET
                name = COALESCE($2, name),
                is_active = COALESCE($3, is_active)
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(is_active)
        .fetch_one(executor)
        .await?;
        Ok(group)
    }

    // Mesas que atualmente pertencem ao grupo (merge_group_id é a única
    // fonte de verdade da associação)
    pub async fn get_group_members<'e, E>(
        &self,
        executor: E,
        group_id: Uuid,
    ) -> Result<Vec<Table>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tables = sqlx::query_as::<_, Table>(
            "SELECT * FROM tables WHERE merge_group_id = $1 ORDER BY table_number ASC",
        )
        .bind(group_id)
        .fetch_all(executor)
        .await?;
        Ok(tables)
    }

    pub async fn set_tables_merge_group<'e, E>(
        &self,
        executor: E,
        table_ids: &[Uuid],
        group_id: Option<Uuid>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE tables SET merge_group_id = $2 WHERE id = ANY($1)")
            .bind(table_ids)
            .bind(group_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn clear_group_members<'e, E>(&self, executor: E, group_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE tables SET merge_group_id = NULL WHERE merge_group_id = $1")
            .bind(group_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_merge_group<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM merge_groups WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Acesso à pool para os serviços abrirem transações
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// src/services/restaurant_service.rs

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ReservationRepository, RestaurantRepository},
    models::restaurant::{
        ChairRearrangement, CreateMergeGroupPayload, CreateTablePayload, MergeGroup,
        MergeGroupDetail, RestaurantConfig, Table, UpdateTablePayload,
    },
};

#[derive(Clone)]
pub struct RestaurantService {
    restaurant_repo: RestaurantRepository,
    reservation_repo: ReservationRepository,
}

impl RestaurantService {
    pub fn new(
        restaurant_repo: RestaurantRepository,
        reservation_repo: ReservationRepository,
    ) -> Self {
        Self { restaurant_repo, reservation_repo }
    }

    // ---
    // Configuração global
    // ---

    pub async fn get_config(&self) -> Result<Option<RestaurantConfig>, AppError> {
        self.restaurant_repo.get_config(self.pool()).await
    }

    pub async fn create_config(
        &self,
        name: &str,
        total_extra_chairs: i32,
    ) -> Result<RestaurantConfig, AppError> {
        // A chave primária fixa (id = 1) garante a linha única; a checagem
        // prévia só melhora a mensagem de erro.
        if self.restaurant_repo.get_config(self.pool()).await?.is_some() {
            return Err(AppError::AlreadyExists("Configuração do restaurante".to_string()));
        }
        self.restaurant_repo
            .create_config(self.pool(), name, total_extra_chairs)
            .await
    }

    pub async fn update_config(
        &self,
        name: Option<&str>,
        total_extra_chairs: Option<i32>,
    ) -> Result<RestaurantConfig, AppError> {
        self.restaurant_repo
            .update_config(self.pool(), name, total_extra_chairs)
            .await?
            .ok_or(AppError::ConfigMissing)
    }

    // ---
    // Mesas
    // ---

    pub async fn get_tables(&self, active_only: bool) -> Result<Vec<Table>, AppError> {
        self.restaurant_repo.get_tables(self.pool(), active_only).await
    }

    pub async fn get_table(&self, id: Uuid) -> Result<Table, AppError> {
        self.restaurant_repo
            .find_table(self.pool(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Mesa {}", id)))
    }

    pub async fn create_table(&self, payload: &CreateTablePayload) -> Result<Table, AppError> {
        self.restaurant_repo
            .create_table(
                self.pool(),
                &payload.table_number,
                payload.default_chairs,
                payload.max_chairs,
                payload.is_mergeable,
                payload.is_active,
            )
            .await
    }

    pub async fn update_table(
        &self,
        id: Uuid,
        payload: &UpdateTablePayload,
    ) -> Result<Table, AppError> {
        let existing = self.get_table(id).await?;

        // As invariantes valem para o resultado da fusão, não só para os
        // campos enviados.
        let new_default = payload.default_chairs.unwrap_or(existing.default_chairs);
        let new_max = payload.max_chairs.unwrap_or(existing.max_chairs);
        let new_current = payload.current_chairs.unwrap_or(existing.current_chairs);

        if new_max < new_default {
            return Err(invariant_error(
                "maxChairs",
                "max_lt_default",
                "maxChairs não pode ser menor que defaultChairs.",
            ));
        }
        if new_current > new_max {
            return Err(invariant_error(
                "currentChairs",
                "current_gt_max",
                "currentChairs não pode exceder maxChairs.",
            ));
        }

        self.restaurant_repo
            .update_table(
                self.pool(),
                id,
                payload.table_number.as_deref(),
                payload.default_chairs,
                payload.max_chairs,
                payload.current_chairs,
                payload.is_mergeable,
                payload.is_active,
            )
            .await
    }

    // Exclusão com preservação de histórico: uma mesa já referenciada por
    // alguma reserva é apenas desativada; só mesas nunca usadas saem do banco.
    pub async fn delete_table(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool().begin().await?;

        let table = self
            .restaurant_repo
            .find_table(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Mesa {}", id)))?;

        // Desfazer a união antes de remover o membro
        if table.merge_group_id.is_some() {
            return Err(AppError::AlreadyMerged(table.table_number));
        }

        if self.reservation_repo.table_has_reservations(&mut *tx, id).await? {
            self.restaurant_repo.set_table_active(&mut *tx, id, false).await?;
        } else {
            self.restaurant_repo.delete_table(&mut *tx, id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // ---
    // Remanejamento de cadeiras (livro-razão de capacidade)
    // ---
    // Cadeiras se movem entre as mesas e o estoque compartilhado, nunca são
    // criadas nem destruídas. Tudo dentro de uma transação: ou todos os
    // movimentos se aplicam, ou nenhum.
    pub async fn rearrange_chairs(
        &self,
        moves: &[ChairRearrangement],
    ) -> Result<Vec<Table>, AppError> {
        // Uma mesa repetida contaria o mesmo delta duas vezes contra a
        // mesma leitura de current_chairs, quebrando a conservação.
        if find_duplicate_table(moves).is_some() {
            return Err(invariant_error(
                "tableId",
                "duplicate_table",
                "Cada mesa pode aparecer no máximo uma vez no remanejamento.",
            ));
        }

        let mut tx = self.pool().begin().await?;

        // Trava a config: remanejamentos concorrentes serializam aqui
        let config = self
            .restaurant_repo
            .get_config_for_update(&mut *tx)
            .await?
            .ok_or(AppError::ConfigMissing)?;

        let ids: Vec<Uuid> = moves.iter().map(|m| m.table_id).collect();
        let tables = self.restaurant_repo.lock_tables(&mut *tx, &ids).await?;
        let by_id: HashMap<Uuid, &Table> = tables.iter().map(|t| (t.id, t)).collect();

        let mut plan = Vec::with_capacity(moves.len());
        for m in moves {
            let table = by_id
                .get(&m.table_id)
                .ok_or_else(|| AppError::NotFound(format!("Mesa {}", m.table_id)))?;
            if m.new_chair_count > table.max_chairs {
                return Err(AppError::ExceedsMax {
                    table_number: table.table_number.clone(),
                    max: table.max_chairs,
                });
            }
            plan.push((table.id, table.current_chairs, m.new_chair_count));
        }

        let net = net_chairs_from_pool(plan.iter().map(|&(_, cur, new)| (cur, new)));
        if net > config.total_extra_chairs {
            return Err(AppError::InsufficientPool {
                needed: net,
                available: config.total_extra_chairs,
            });
        }

        let mut updated = Vec::with_capacity(plan.len());
        for (id, _, new_count) in plan {
            updated.push(
                self.restaurant_repo
                    .set_current_chairs(&mut *tx, id, new_count)
                    .await?,
            );
        }
        self.restaurant_repo
            .update_config(&mut *tx, None, Some(config.total_extra_chairs - net))
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // ---
    // Grupos de mesas unidas
    // ---

    pub async fn get_merge_groups(&self) -> Result<Vec<MergeGroupDetail>, AppError> {
        let groups = self.restaurant_repo.get_merge_groups(self.pool()).await?;
        let mut details = Vec::with_capacity(groups.len());
        for group in groups {
            details.push(self.group_detail(group).await?);
        }
        Ok(details)
    }

    pub async fn get_merge_group(&self, id: Uuid) -> Result<MergeGroupDetail, AppError> {
        let group = self
            .restaurant_repo
            .find_merge_group(self.pool(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Grupo de mesas {}", id)))?;
        self.group_detail(group).await
    }

    pub async fn create_merge_group(
        &self,
        payload: &CreateMergeGroupPayload,
    ) -> Result<MergeGroupDetail, AppError> {
        let mut tx = self.pool().begin().await?;

        // Trava as mesas: duas criações de grupo concorrentes sobre a mesma
        // mesa serializam aqui
        let tables = self
            .restaurant_repo
            .lock_tables(&mut *tx, &payload.table_ids)
            .await?;

        for id in &payload.table_ids {
            if !tables.iter().any(|t| t.id == *id) {
                return Err(AppError::NotFound(format!("Mesa {}", id)));
            }
        }
        for table in &tables {
            if !table.is_mergeable {
                return Err(AppError::NotMergeable(table.table_number.clone()));
            }
            if table.merge_group_id.is_some() {
                return Err(AppError::AlreadyMerged(table.table_number.clone()));
            }
        }

        let group = self
            .restaurant_repo
            .create_merge_group(&mut *tx, payload.name.as_deref())
            .await?;
        self.restaurant_repo
            .set_tables_merge_group(&mut *tx, &payload.table_ids, Some(group.id))
            .await?;

        tx.commit().await?;
        self.group_detail(group).await
    }

    pub async fn update_merge_group(
        &self,
        id: Uuid,
        name: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<MergeGroupDetail, AppError> {
        self.restaurant_repo
            .find_merge_group(self.pool(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Grupo de mesas {}", id)))?;
        let group = self
            .restaurant_repo
            .update_merge_group(self.pool(), id, name, is_active)
            .await?;
        self.group_detail(group).await
    }

    // Desfaz a união: limpa a referência de cada membro e remove o grupo.
    // As mesas continuam existindo, e reservas históricas (completed,
    // cancelled, no_show) apenas perdem a proveniência do grupo.
    pub async fn delete_merge_group(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool().begin().await?;

        self.restaurant_repo
            .find_merge_group(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Grupo de mesas {}", id)))?;

        if self
            .reservation_repo
            .group_has_active_reservations(&mut *tx, id)
            .await?
        {
            return Err(AppError::GroupInUse);
        }

        self.restaurant_repo.clear_group_members(&mut *tx, id).await?;
        self.reservation_repo.clear_group_provenance(&mut *tx, id).await?;
        self.restaurant_repo.delete_merge_group(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(())
    }

    // Capacidade combinada sempre calculada ao vivo a partir de
    // current_chairs, refletindo o último remanejamento
    async fn group_detail(&self, group: MergeGroup) -> Result<MergeGroupDetail, AppError> {
        let tables = self
            .restaurant_repo
            .get_group_members(self.pool(), group.id)
            .await?;
        let total_capacity = tables.iter().map(|t| t.current_chairs).sum();
        Ok(MergeGroupDetail { group, tables, total_capacity })
    }

    fn pool(&self) -> &sqlx::PgPool {
        self.restaurant_repo.pool()
    }
}

// Primeira mesa que aparece mais de uma vez na lista de movimentos
pub fn find_duplicate_table(moves: &[ChairRearrangement]) -> Option<Uuid> {
    let mut seen = HashSet::new();
    moves
        .iter()
        .find(|m| !seen.insert(m.table_id))
        .map(|m| m.table_id)
}

// Saldo líquido que o remanejamento retira do estoque de cadeiras extras.
// Negativo significa que sobram cadeiras e o estoque cresce.
pub fn net_chairs_from_pool(moves: impl Iterator<Item = (i32, i32)>) -> i32 {
    let mut needed = 0;
    let mut released = 0;
    for (current, new) in moves {
        let delta = new - current;
        if delta > 0 {
            needed += delta;
        } else {
            released += -delta;
        }
    }
    needed - released
}

fn invariant_error(field: &'static str, code: &'static str, message: &'static str) -> AppError {
    let mut err = validator::ValidationError::new(code);
    err.message = Some(message.into());
    let mut errors = validator::ValidationErrors::new();
    errors.add(field.into(), err);
    AppError::ValidationError(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicate_table_in_moves() {
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let moves = [
            ChairRearrangement { table_id: id_a, new_chair_count: 6 },
            ChairRearrangement { table_id: id_b, new_chair_count: 4 },
            ChairRearrangement { table_id: id_a, new_chair_count: 6 },
        ];
        assert_eq!(find_duplicate_table(&moves), Some(id_a));
    }

    #[test]
    fn test_accepts_distinct_tables_in_moves() {
        let moves = [
            ChairRearrangement { table_id: Uuid::new_v4(), new_chair_count: 6 },
            ChairRearrangement { table_id: Uuid::new_v4(), new_chair_count: 4 },
        ];
        assert_eq!(find_duplicate_table(&moves), None);
    }

    #[test]
    fn test_net_needs_chairs_from_pool() {
        // Duas mesas ganham 3 cadeiras cada, uma libera 2: saldo 4
        let moves = [(4, 7), (4, 7), (6, 4)];
        assert_eq!(net_chairs_from_pool(moves.into_iter()), 4);
    }

    #[test]
    fn test_net_releases_to_pool() {
        let moves = [(6, 2), (4, 4)];
        assert_eq!(net_chairs_from_pool(moves.into_iter()), -4);
    }

    #[test]
    fn test_pure_swap_is_zero() {
        // Mover cadeiras de uma mesa para outra não mexe no estoque
        let moves = [(4, 6), (6, 4)];
        assert_eq!(net_chairs_from_pool(moves.into_iter()), 0);
    }

    #[test]
    fn test_conservation_of_chairs() {
        // Σ(current - default) + pool é invariante para qualquer sequência
        // de remanejamentos bem-sucedidos
        let defaults = [4, 4, 6];
        let mut current = [4, 5, 6];
        let mut pool = 10 - 1; // uma cadeira extra já está na mesa 2

        let invariant = |current: &[i32; 3], pool: i32| {
            current
                .iter()
                .zip(defaults.iter())
                .map(|(c, d)| c - d)
                .sum::<i32>()
                + pool
        };
        let before = invariant(&current, pool);

        for new_counts in [[6, 4, 6], [4, 4, 8], [5, 5, 5]] {
            let net = net_chairs_from_pool(current.iter().copied().zip(new_counts.iter().copied()));
            assert!(net <= pool);
            current = new_counts;
            pool -= net;
            assert_eq!(invariant(&current, pool), before);
        }
    }
}

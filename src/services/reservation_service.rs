// src/services/reservation_service.rs

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::Settings,
    db::{ReservationRepository, RestaurantRepository},
    models::{
        reservation::{
            AvailabilityKind, AvailabilityOption, CreateReservationPayload, Reservation,
            ReservationDetail, ReservationFilters, ReservationStatus, TableOccupancy,
            UpdateReservationPayload,
        },
        restaurant::Table,
    },
    services::hours_service::HoursService,
};

// Limite do tamanho das combinações na busca de disponibilidade. Sem ele a
// enumeração de subconjuntos explode em salões com muitas mesas livres.
const MAX_COMBO_SIZE: usize = 4;

#[derive(Clone)]
pub struct ReservationService {
    reservation_repo: ReservationRepository,
    restaurant_repo: RestaurantRepository,
    hours_service: HoursService,
    settings: Settings,
}

impl ReservationService {
    pub fn new(
        reservation_repo: ReservationRepository,
        restaurant_repo: RestaurantRepository,
        hours_service: HoursService,
        settings: Settings,
    ) -> Self {
        Self {
            reservation_repo,
            restaurant_repo,
            hours_service,
            settings,
        }
    }

    // ---
    // Consultas
    // ---

    pub async fn get_reservations(
        &self,
        filters: &ReservationFilters,
    ) -> Result<Vec<ReservationDetail>, AppError> {
        let reservations = self.reservation_repo.list_reservations(filters).await?;
        let mut details = Vec::with_capacity(reservations.len());
        for reservation in reservations {
            let tables = self
                .reservation_repo
                .get_reservation_tables(self.pool(), reservation.id)
                .await?;
            details.push(ReservationDetail { reservation, tables });
        }
        Ok(details)
    }

    pub async fn get_reservation(&self, id: Uuid) -> Result<ReservationDetail, AppError> {
        let reservation = self
            .reservation_repo
            .find_reservation(self.pool(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reserva {}", id)))?;
        let tables = self
            .reservation_repo
            .get_reservation_tables(self.pool(), id)
            .await?;
        Ok(ReservationDetail { reservation, tables })
    }

    // ---
    // Admissão: criação
    // ---

    pub async fn create_reservation(
        &self,
        payload: &CreateReservationPayload,
    ) -> Result<ReservationDetail, AppError> {
        // 1. Telefone obrigatório para grupos grandes
        check_party_contact(payload.party_size, &payload.phone_number)?;

        let duration = payload
            .duration_minutes
            .unwrap_or(self.settings.default_reservation_duration_minutes);

        let mut tx = self.pool().begin().await?;

        // 2–3. Resolve a atribuição de mesas, travando as linhas envolvidas
        let (tables, merge_group_id) = self
            .resolve_assignment(
                &mut tx,
                payload.table_ids.as_deref(),
                payload.merge_group_id,
            )
            .await?;

        // 4. Capacidade combinada
        check_capacity(payload.party_size, &tables)?;

        // 5. Horário de funcionamento
        self.hours_service
            .validate_slot(payload.reservation_date, payload.reservation_time, duration)
            .await?;

        // 6. Conflito com reservas ativas nas mesmas mesas
        let table_ids: Vec<Uuid> = tables.iter().map(|t| t.id).collect();
        self.check_no_conflict(
            &mut tx,
            &table_ids,
            payload.reservation_date,
            payload.reservation_time,
            duration,
            None,
        )
        .await?;

        // 7. Persiste em status confirmed
        let reservation = self
            .reservation_repo
            .create_reservation(
                &mut *tx,
                &payload.guest_name,
                payload.party_size,
                payload.phone_number.as_deref(),
                payload.notes.as_deref(),
                payload.reservation_date,
                payload.reservation_time,
                duration,
                merge_group_id,
            )
            .await?;
        self.reservation_repo
            .link_tables(&mut *tx, reservation.id, &table_ids)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "📅 Reserva criada para {} ({} pessoas) em {} {}",
            reservation.guest_name,
            reservation.party_size,
            reservation.reservation_date,
            reservation.reservation_time
        );

        Ok(ReservationDetail { reservation, tables })
    }

    // ---
    // Admissão: atualização
    // ---
    // Só re-executa as validações dos campos realmente alterados: horário se
    // data/hora/duração mudou, capacidade se grupo ou mesas mudaram, conflito
    // se qualquer um dos dois mudou (sempre excluindo a própria reserva).
    pub async fn update_reservation(
        &self,
        id: Uuid,
        payload: &UpdateReservationPayload,
    ) -> Result<ReservationDetail, AppError> {
        let mut tx = self.pool().begin().await?;

        let existing = self
            .reservation_repo
            .find_reservation_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reserva {}", id)))?;

        let new_date = payload.reservation_date.unwrap_or(existing.reservation_date);
        let new_time = payload.reservation_time.unwrap_or(existing.reservation_time);
        let new_duration = payload.duration_minutes.unwrap_or(existing.duration_minutes);
        let new_party_size = payload.party_size.unwrap_or(existing.party_size);
        let new_phone = payload
            .phone_number
            .clone()
            .or_else(|| existing.phone_number.clone());

        check_party_contact(new_party_size, &new_phone)?;

        // Transição de status validada pelo enum fechado
        let new_status = match payload.status {
            Some(to) if to != existing.status => {
                if !existing.status.can_transition_to(to) {
                    return Err(AppError::InvalidStatusTransition {
                        from: existing.status.as_str().to_string(),
                        to: to.as_str().to_string(),
                    });
                }
                to
            }
            _ => existing.status,
        };

        // Reatribuição de mesas, se solicitada
        let assignment_changed =
            payload.table_ids.is_some() || payload.merge_group_id.is_some();
        let (tables, new_merge_group_id) = if assignment_changed {
            self.resolve_assignment(&mut tx, payload.table_ids.as_deref(), payload.merge_group_id)
                .await?
        } else {
            let tables = self
                .reservation_repo
                .get_reservation_tables(&mut *tx, id)
                .await?;
            (tables, existing.merge_group_id)
        };

        let schedule_changed = payload.reservation_date.is_some()
            || payload.reservation_time.is_some()
            || payload.duration_minutes.is_some();

        if schedule_changed {
            self.hours_service
                .validate_slot(new_date, new_time, new_duration)
                .await?;
        }

        if payload.party_size.is_some() || assignment_changed {
            check_capacity(new_party_size, &tables)?;
        }

        let table_ids: Vec<Uuid> = tables.iter().map(|t| t.id).collect();
        if schedule_changed || assignment_changed {
            self.check_no_conflict(&mut tx, &table_ids, new_date, new_time, new_duration, Some(id))
                .await?;
        }

        let reservation = self
            .reservation_repo
            .update_reservation(
                &mut *tx,
                id,
                payload.guest_name.as_deref().unwrap_or(&existing.guest_name),
                new_party_size,
                new_phone.as_deref(),
                payload.notes.as_deref().or(existing.notes.as_deref()),
                new_date,
                new_time,
                new_duration,
                new_merge_group_id,
                new_status,
            )
            .await?;

        if assignment_changed {
            self.reservation_repo.clear_tables(&mut *tx, id).await?;
            self.reservation_repo
                .link_tables(&mut *tx, id, &table_ids)
                .await?;
        }

        tx.commit().await?;
        Ok(ReservationDetail { reservation, tables })
    }

    // ---
    // Cancelamento
    // ---
    // Nenhum outro efeito: as mesas ficam livres implicitamente porque a
    // checagem de conflito só considera reservas confirmed/seated. A linha
    // fica travada entre a checagem de status terminal e a gravação, para
    // que um cancelamento e uma conclusão concorrentes serializem.
    pub async fn cancel_reservation(&self, id: Uuid) -> Result<ReservationDetail, AppError> {
        let mut tx = self.pool().begin().await?;

        let existing = self
            .reservation_repo
            .find_reservation_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reserva {}", id)))?;

        if existing.status.is_terminal() {
            return Err(AppError::AlreadyTerminal(existing.status.as_str().to_string()));
        }

        let reservation = self
            .reservation_repo
            .set_status(&mut *tx, id, ReservationStatus::Cancelled)
            .await?;
        let tables = self
            .reservation_repo
            .get_reservation_tables(&mut *tx, id)
            .await?;

        tx.commit().await?;
        Ok(ReservationDetail { reservation, tables })
    }

    // ---
    // Busca de disponibilidade
    // ---
    // Mesas individuais que comportam o grupo; só quando nenhuma comporta,
    // combinações de mesas livres do menor tamanho suficiente.
    pub async fn get_available_tables(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        party_size: i32,
        duration_minutes: Option<i32>,
    ) -> Result<Vec<AvailabilityOption>, AppError> {
        let duration = duration_minutes
            .unwrap_or(self.settings.default_reservation_duration_minutes);

        self.hours_service.validate_slot(date, time, duration).await?;

        let tables = self.restaurant_repo.get_tables(self.pool(), true).await?;
        let occupancies = self
            .reservation_repo
            .occupancies_for_date(self.pool(), date)
            .await?;

        let (start, end) = slot_interval(date, time, duration);
        let free_tables = free_tables_for_slot(tables, &occupancies, start, end);

        Ok(availability_options(&free_tables, party_size, MAX_COMBO_SIZE))
    }

    // ---
    // Internos
    // ---

    // Resolve (e trava) as mesas da atribuição: ou uma lista explícita de
    // mesas, ou um grupo de mesas unidas expandido para os membros.
    async fn resolve_assignment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        table_ids: Option<&[Uuid]>,
        merge_group_id: Option<Uuid>,
    ) -> Result<(Vec<Table>, Option<Uuid>), AppError> {
        let (tables, group_id) = match (table_ids, merge_group_id) {
            (Some(_), Some(_)) => return Err(AppError::AmbiguousAssignment),
            (None, None) => return Err(AppError::NoAssignment),
            (Some(ids), None) => {
                if ids.is_empty() {
                    return Err(AppError::NoAssignment);
                }
                let tables = self.restaurant_repo.lock_tables(&mut **tx, ids).await?;
                for id in ids {
                    if !tables.iter().any(|t| t.id == *id) {
                        return Err(AppError::NotFound(format!("Mesa {}", id)));
                    }
                }
                (tables, None)
            }
            (None, Some(group_id)) => {
                let group = self
                    .restaurant_repo
                    .find_merge_group(&mut **tx, group_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Grupo de mesas {}", group_id))
                    })?;
                if !group.is_active {
                    return Err(AppError::GroupInactive);
                }
                let members = self
                    .restaurant_repo
                    .get_group_members(&mut **tx, group_id)
                    .await?;
                let member_ids: Vec<Uuid> = members.iter().map(|t| t.id).collect();
                // Retrava via FOR UPDATE para serializar admissões concorrentes
                let tables = self.restaurant_repo.lock_tables(&mut **tx, &member_ids).await?;
                (tables, Some(group_id))
            }
        };

        for table in &tables {
            if !table.is_active {
                return Err(AppError::TableInactive(table.table_number.clone()));
            }
        }

        Ok((tables, group_id))
    }

    async fn check_no_conflict(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        table_ids: &[Uuid],
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i32,
        exclude_reservation_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let candidates = self
            .reservation_repo
            .active_reservations_for_tables(&mut **tx, table_ids, date, exclude_reservation_id)
            .await?;

        if let Some(conflict) = find_conflict(&candidates, date, time, duration_minutes) {
            return Err(AppError::SlotConflict {
                guest_name: conflict.guest_name.clone(),
                time: conflict.reservation_time,
            });
        }
        Ok(())
    }

    fn pool(&self) -> &sqlx::PgPool {
        self.reservation_repo.pool()
    }
}

// O intervalo semiaberto [início, início + duração) de um slot
pub fn slot_interval(
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: i32,
) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(time);
    (start, start + Duration::minutes(duration_minutes as i64))
}

// Interseção estrita de intervalos semiabertos: reservas encostadas
// (fim de uma == início da outra) não conflitam.
pub fn intervals_overlap(
    start_a: NaiveDateTime,
    end_a: NaiveDateTime,
    start_b: NaiveDateTime,
    end_b: NaiveDateTime,
) -> bool {
    start_a < end_b && end_a > start_b
}

// Telefone obrigatório para grupos de 4 ou mais pessoas
pub fn check_party_contact(party_size: i32, phone: &Option<String>) -> Result<(), AppError> {
    if party_size >= 4 && !has_phone(phone) {
        return Err(AppError::PhoneRequired);
    }
    Ok(())
}

// O grupo precisa caber na soma de current_chairs das mesas atribuídas
pub fn check_capacity(party_size: i32, tables: &[Table]) -> Result<(), AppError> {
    let capacity: i32 = tables.iter().map(|t| t.current_chairs).sum();
    if party_size > capacity {
        return Err(AppError::CapacityExceeded { party_size, capacity });
    }
    Ok(())
}

// Mesas sem nenhuma ocupação ativa que cruze o slot pedido
pub fn free_tables_for_slot(
    tables: Vec<Table>,
    occupancies: &[TableOccupancy],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<Table> {
    tables
        .into_iter()
        .filter(|table| {
            !occupancies.iter().any(|occ| {
                occ.table_id == table.id && {
                    let (occ_start, occ_end) = slot_interval(
                        occ.reservation_date,
                        occ.reservation_time,
                        occ.duration_minutes,
                    );
                    intervals_overlap(start, end, occ_start, occ_end)
                }
            })
        })
        .collect()
}

// Primeira reserva candidata cujo intervalo cruza o slot pedido
pub fn find_conflict(
    candidates: &[Reservation],
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: i32,
) -> Option<&Reservation> {
    let (start, end) = slot_interval(date, time, duration_minutes);
    candidates.iter().find(|res| {
        let (res_start, res_end) = slot_interval(
            res.reservation_date,
            res.reservation_time,
            res.duration_minutes,
        );
        intervals_overlap(start, end, res_start, res_end)
    })
}

// Enumeração das opções de assento sobre as mesas livres.
// Mesas individuais que comportam o grupo entram primeiro; combinações só
// aparecem quando nenhuma mesa sozinha basta, e apenas no menor tamanho de
// combinação que resolve (nunca combinações maiores depois disso).
pub fn availability_options(
    free_tables: &[Table],
    party_size: i32,
    max_combo_size: usize,
) -> Vec<AvailabilityOption> {
    let mut options: Vec<AvailabilityOption> = free_tables
        .iter()
        .filter(|t| t.current_chairs >= party_size)
        .map(|t| AvailabilityOption {
            kind: AvailabilityKind::Table,
            table_ids: vec![t.id],
            table_numbers: vec![t.table_number.clone()],
            capacity: t.current_chairs,
        })
        .collect();

    if !options.is_empty() {
        return options;
    }

    let max_size = max_combo_size.min(free_tables.len());
    for size in 2..=max_size {
        for combo in combinations(free_tables, size) {
            let capacity: i32 = combo.iter().map(|t| t.current_chairs).sum();
            if capacity >= party_size {
                options.push(AvailabilityOption {
                    kind: AvailabilityKind::Combo,
                    table_ids: combo.iter().map(|t| t.id).collect(),
                    table_numbers: combo.iter().map(|t| t.table_number.clone()).collect(),
                    capacity,
                });
            }
        }
        // Para no menor tamanho que resolve
        if !options.is_empty() {
            break;
        }
    }

    options
}

// Todos os subconjuntos de tamanho `size`, na ordem do slice de entrada
fn combinations<T>(items: &[T], size: usize) -> Vec<Vec<&T>> {
    fn walk<'a, T>(items: &'a [T], size: usize, start: usize, current: &mut Vec<&'a T>, out: &mut Vec<Vec<&'a T>>) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for i in start..items.len() {
            current.push(&items[i]);
            walk(items, size, i + 1, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    if size <= items.len() {
        walk(items, size, 0, &mut Vec::new(), &mut out);
    }
    out
}

fn has_phone(phone: &Option<String>) -> bool {
    phone.as_deref().is_some_and(|p| !p.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn reservation(time: NaiveTime, duration: i32) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            guest_name: "Ana".to_string(),
            party_size: 2,
            phone_number: None,
            notes: None,
            reservation_date: d(),
            reservation_time: time,
            duration_minutes: duration,
            merge_group_id: None,
            status: ReservationStatus::Confirmed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn table(number: &str, chairs: i32) -> Table {
        Table {
            id: Uuid::new_v4(),
            table_number: number.to_string(),
            default_chairs: chairs,
            max_chairs: chairs + 2,
            current_chairs: chairs,
            is_mergeable: true,
            merge_group_id: None,
            is_active: true,
        }
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let (a_start, a_end) = slot_interval(d(), t(18, 0), 90);
        let (b_start, b_end) = slot_interval(d(), t(18, 30), 90);
        assert!(intervals_overlap(a_start, a_end, b_start, b_end));
        assert!(intervals_overlap(b_start, b_end, a_start, a_end));
    }

    #[test]
    fn test_back_to_back_does_not_overlap() {
        // 18:00–19:30 e 19:30–21:00 encostam mas não conflitam
        let (a_start, a_end) = slot_interval(d(), t(18, 0), 90);
        let (b_start, b_end) = slot_interval(d(), t(19, 30), 90);
        assert!(!intervals_overlap(a_start, a_end, b_start, b_end));
        assert!(!intervals_overlap(b_start, b_end, a_start, a_end));
    }

    #[test]
    fn test_find_conflict_detects_overlap() {
        let existing = vec![reservation(t(18, 0), 90)];
        let conflict = find_conflict(&existing, d(), t(18, 30), 90);
        assert!(conflict.is_some());
        assert_eq!(conflict.unwrap().guest_name, "Ana");
    }

    #[test]
    fn test_find_conflict_allows_back_to_back() {
        let existing = vec![reservation(t(18, 0), 90)];
        assert!(find_conflict(&existing, d(), t(19, 30), 90).is_none());
    }

    #[test]
    fn test_midnight_crossing_duration() {
        // 23:00 + 120min termina 01:00 do dia seguinte e conflita com uma
        // reserva às 23:30 do mesmo dia
        let existing = vec![reservation(t(23, 30), 60)];
        assert!(find_conflict(&existing, d(), t(23, 0), 120).is_some());
    }

    #[test]
    fn test_party_of_four_requires_phone() {
        assert!(matches!(
            check_party_contact(4, &None),
            Err(AppError::PhoneRequired)
        ));
        assert!(matches!(
            check_party_contact(6, &Some("   ".to_string())),
            Err(AppError::PhoneRequired)
        ));
        assert!(check_party_contact(4, &Some("11 99999-0000".to_string())).is_ok());
        assert!(check_party_contact(3, &None).is_ok());
    }

    #[test]
    fn test_capacity_exceeded_for_combined_tables() {
        let tables = vec![table("T1", 2), table("T2", 2)];
        let err = check_capacity(5, &tables);
        assert!(matches!(
            err,
            Err(AppError::CapacityExceeded { party_size: 5, capacity: 4 })
        ));
        assert!(check_capacity(4, &tables).is_ok());
    }

    #[test]
    fn test_group_expansion_conflicts_with_member_booking() {
        // Reserva individual só na mesa T2; uma reserva sobre o grupo
        // expandido para [T1, T2] disputa a mesma mesa no mesmo intervalo
        let t1 = table("T1", 4);
        let t2 = table("T2", 4);
        let booked = reservation(t(19, 0), 90);
        let booked_tables = vec![t2.id];

        let expanded = [t1.id, t2.id];
        let candidates: Vec<Reservation> = [(booked, booked_tables)]
            .into_iter()
            .filter(|(_, ids)| ids.iter().any(|id| expanded.contains(id)))
            .map(|(r, _)| r)
            .collect();

        let conflict = find_conflict(&candidates, d(), t(19, 30), 90);
        assert!(conflict.is_some());
        assert_eq!(conflict.unwrap().guest_name, "Ana");
    }

    #[test]
    fn test_member_occupancy_removes_table_from_free_set() {
        let t1 = table("T1", 4);
        let t2 = table("T2", 4);
        let occupied_id = t2.id;
        let occ = TableOccupancy {
            table_id: occupied_id,
            reservation_date: d(),
            reservation_time: t(19, 0),
            duration_minutes: 90,
        };

        let (start, end) = slot_interval(d(), t(19, 30), 90);
        let free = free_tables_for_slot(vec![t1.clone(), t2], &[occ], start, end);
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].id, t1.id);
    }

    #[test]
    fn test_single_tables_that_fit() {
        let free = vec![table("T1", 2), table("T2", 4), table("T3", 6)];
        let options = availability_options(&free, 4, MAX_COMBO_SIZE);
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|o| o.kind == AvailabilityKind::Table));
        assert!(options.iter().all(|o| o.capacity >= 4));
    }

    #[test]
    fn test_combos_only_when_no_single_fits() {
        let free = vec![table("T1", 2), table("T2", 2), table("T3", 4)];
        let options = availability_options(&free, 6, MAX_COMBO_SIZE);
        // Nenhuma mesa sozinha comporta 6; pares suficientes: T1+T3 e T2+T3
        assert!(!options.is_empty());
        assert!(options.iter().all(|o| o.kind == AvailabilityKind::Combo));
        assert!(options.iter().all(|o| o.table_ids.len() == 2));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_stops_at_smallest_sufficient_combo_size() {
        let free = vec![table("T1", 2), table("T2", 2), table("T3", 2)];
        let options = availability_options(&free, 4, MAX_COMBO_SIZE);
        // Pares já resolvem; trios nunca são sugeridos
        assert!(options.iter().all(|o| o.table_ids.len() == 2));
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn test_combo_size_is_capped() {
        // 5 mesas de 1 cadeira: grupo de 5 só caberia em uma combinação de
        // 5 mesas, acima do limite, então não há opção
        let free = vec![
            table("T1", 1),
            table("T2", 1),
            table("T3", 1),
            table("T4", 1),
            table("T5", 1),
        ];
        let options = availability_options(&free, 5, MAX_COMBO_SIZE);
        assert!(options.is_empty());
    }

    #[test]
    fn test_no_free_tables_no_options() {
        let options = availability_options(&[], 2, MAX_COMBO_SIZE);
        assert!(options.is_empty());
    }
}

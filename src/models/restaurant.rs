// src/models/restaurant.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- 1. Configuração Global (linha única) ---
// Guarda o nome do restaurante e o estoque de cadeiras extras não atribuídas
// a nenhuma mesa (o "pool" usado pelo remanejamento de cadeiras).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantConfig {
    pub id: i32,
    pub name: String,
    pub total_extra_chairs: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfigPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(range(min = 0, message = "O número de cadeiras extras não pode ser negativo."))]
    #[serde(default)]
    pub total_extra_chairs: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigPayload {
    #[validate(length(min = 1, max = 255, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,

    #[validate(range(min = 0, message = "O número de cadeiras extras não pode ser negativo."))]
    pub total_extra_chairs: Option<i32>,
}

// --- 2. Mesas ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: Uuid,
    pub table_number: String,

    // Configuração de cadeiras: current acompanha as cadeiras físicas
    // realmente na mesa e só muda via remanejamento.
    pub default_chairs: i32,
    pub max_chairs: i32,
    pub current_chairs: i32,

    pub is_mergeable: bool,
    pub merge_group_id: Option<Uuid>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTablePayload {
    #[validate(length(min = 1, max = 50, message = "O número da mesa é obrigatório."))]
    pub table_number: String,

    #[validate(range(min = 1, message = "A mesa precisa de pelo menos uma cadeira."))]
    pub default_chairs: i32,

    #[validate(range(min = 1, message = "O máximo de cadeiras deve ser positivo."))]
    pub max_chairs: i32,

    #[serde(default = "default_true")]
    pub is_mergeable: bool,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl CreateTablePayload {
    // Invariante entre campos: o validator não cobre relações, então fica aqui.
    pub fn validate_consistency(&self) -> Result<(), ValidationError> {
        if self.max_chairs < self.default_chairs {
            let mut err = ValidationError::new("max_lt_default");
            err.message = Some("maxChairs deve ser maior ou igual a defaultChairs.".into());
            return Err(err);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTablePayload {
    #[validate(length(min = 1, max = 50, message = "O número da mesa não pode ser vazio."))]
    pub table_number: Option<String>,

    #[validate(range(min = 1, message = "A mesa precisa de pelo menos uma cadeira."))]
    pub default_chairs: Option<i32>,

    #[validate(range(min = 1, message = "O máximo de cadeiras deve ser positivo."))]
    pub max_chairs: Option<i32>,

    #[validate(range(min = 0, message = "O número de cadeiras não pode ser negativo."))]
    pub current_chairs: Option<i32>,

    pub is_mergeable: Option<bool>,
    pub is_active: Option<bool>,
}

// Um movimento do remanejamento: quantas cadeiras a mesa deve passar a ter
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChairRearrangement {
    pub table_id: Uuid,

    #[validate(range(min = 0, message = "O número de cadeiras não pode ser negativo."))]
    pub new_chair_count: i32,
}

// --- 3. Grupos de mesas unidas ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MergeGroup {
    pub id: Uuid,
    pub name: Option<String>,
    pub is_active: bool,
}

// Grupo com as mesas membro e a capacidade combinada, sempre calculada ao
// vivo a partir de current_chairs (nunca cacheada).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeGroupDetail {
    #[serde(flatten)]
    pub group: MergeGroup,
    pub tables: Vec<Table>,
    pub total_capacity: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMergeGroupPayload {
    #[validate(length(max = 100, message = "O nome do grupo é longo demais."))]
    pub name: Option<String>,

    #[validate(length(min = 2, message = "Um grupo precisa de pelo menos 2 mesas."))]
    pub table_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMergeGroupPayload {
    #[validate(length(max = 100, message = "O nome do grupo é longo demais."))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveTime;
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante corresponde a uma regra de negócio que pode falhar; a
// tradução para código HTTP fica toda no `IntoResponse` abaixo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Recursos ---
    #[error("{0} não encontrado(a)")]
    NotFound(String),

    #[error("{0} já existe")]
    AlreadyExists(String),

    #[error("Mesa {0} está inativa")]
    TableInactive(String),

    #[error("Configuração do restaurante ainda não foi criada")]
    ConfigMissing,

    // --- Horário de funcionamento ---
    #[error("O restaurante está fechado nesta data")]
    Closed,

    #[error("Horário anterior à abertura ({open})")]
    BeforeOpening { open: NaiveTime },

    #[error("Reservas devem ser feitas com pelo menos {cutoff} minutos de antecedência do fechamento ({close})")]
    TooCloseToClosing { cutoff: i32, close: NaiveTime },

    #[error("A reserva ultrapassaria o horário de fechamento ({close})")]
    ExtendsPastClosing { close: NaiveTime },

    // --- Admissão de reservas ---
    #[error("Tamanho do grupo ({party_size}) excede a capacidade combinada das mesas ({capacity})")]
    CapacityExceeded { party_size: i32, capacity: i32 },

    #[error("Conflito com reserva existente de {guest_name} às {time}")]
    SlotConflict { guest_name: String, time: NaiveTime },

    #[error("Telefone é obrigatório para grupos de 4 ou mais pessoas")]
    PhoneRequired,

    #[error("É necessário informar mesas ou um grupo de mesas")]
    NoAssignment,

    #[error("Não é possível informar mesas e grupo de mesas ao mesmo tempo")]
    AmbiguousAssignment,

    #[error("Não é possível cancelar uma reserva com status '{0}'")]
    AlreadyTerminal(String),

    #[error("Transição de status inválida: '{from}' -> '{to}'")]
    InvalidStatusTransition { from: String, to: String },

    // --- União de mesas ---
    #[error("Mesa {0} não permite união")]
    NotMergeable(String),

    #[error("Mesa {0} já pertence a um grupo")]
    AlreadyMerged(String),

    #[error("Grupo de mesas está inativo")]
    GroupInactive,

    #[error("Grupo de mesas possui reservas ativas")]
    GroupInUse,

    // --- Remanejamento de cadeiras ---
    #[error("Cadeiras extras insuficientes. Necessárias: {needed}, disponíveis: {available}")]
    InsufficientPool { needed: i32, available: i32 },

    #[error("Mesa {table_number} não pode exceder {max} cadeiras")]
    ExceedsMax { table_number: String, max: i32 },

    // --- Autenticação ---
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::NotFound(_) | AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }

            AppError::AlreadyExists(_) => (StatusCode::CONFLICT, self.to_string()),

            // Regras de negócio violadas: a requisição era bem formada,
            // mas o estado atual do restaurante não a permite.
            AppError::TableInactive(_)
            | AppError::ConfigMissing
            | AppError::Closed
            | AppError::BeforeOpening { .. }
            | AppError::TooCloseToClosing { .. }
            | AppError::ExtendsPastClosing { .. }
            | AppError::CapacityExceeded { .. }
            | AppError::SlotConflict { .. }
            | AppError::PhoneRequired
            | AppError::NoAssignment
            | AppError::AmbiguousAssignment
            | AppError::AlreadyTerminal(_)
            | AppError::InvalidStatusTransition { .. }
            | AppError::NotMergeable(_)
            | AppError::AlreadyMerged(_)
            | AppError::GroupInactive
            | AppError::GroupInUse
            | AppError::InsufficientPool { .. }
            | AppError::ExceedsMax { .. } => (StatusCode::BAD_REQUEST, self.to_string()),

            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` vai logar a mensagem detalhada que `thiserror` nos deu.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

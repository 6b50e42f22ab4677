// src/config.rs

use crate::{
    db::{HoursRepository, ReservationRepository, RestaurantRepository, UserRepository},
    services::{
        auth::AuthService, hours_service::HoursService,
        reservation_service::ReservationService, restaurant_service::RestaurantService,
    },
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

// Parâmetros de reserva configuráveis por ambiente.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    // Antecedência mínima (em minutos) antes do fechamento para aceitar reservas
    pub reservation_cutoff_minutes: i32,
    // Duração padrão de uma reserva quando o cliente não informa
    pub default_reservation_duration_minutes: i32,
}

impl Settings {
    fn from_env() -> Self {
        Self {
            reservation_cutoff_minutes: env_or("RESERVATION_CUTOFF_MINUTES", 30),
            default_reservation_duration_minutes: env_or(
                "DEFAULT_RESERVATION_DURATION_MINUTES",
                90,
            ),
        }
    }
}

fn env_or(key: &str, default: i32) -> i32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub settings: Settings,
    // Serviços no estado, montados uma única vez
    pub auth_service: AuthService,
    pub restaurant_service: RestaurantService,
    pub hours_service: HoursService,
    pub reservation_service: ReservationService,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar, o main decide parar.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let settings = Settings::from_env();

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let restaurant_repo = RestaurantRepository::new(db_pool.clone());
        let hours_repo = HoursRepository::new(db_pool.clone());
        let reservation_repo = ReservationRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret.clone());
        let restaurant_service =
            RestaurantService::new(restaurant_repo.clone(), reservation_repo.clone());
        let hours_service = HoursService::new(hours_repo, settings);
        let reservation_service = ReservationService::new(
            reservation_repo,
            restaurant_repo,
            hours_service.clone(),
            settings,
        );

        Ok(Self {
            db_pool,
            jwt_secret,
            settings,
            auth_service,
            restaurant_service,
            hours_service,
            reservation_service,
        })
    }
}

//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Configuração geral do restaurante (nome, pool de cadeiras extras)
    let config_routes = Router::new()
        .route(
            "/",
            post(handlers::config::create_config)
                .get(handlers::config::get_config)
                .patch(handlers::config::update_config),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let table_routes = Router::new()
        .route(
            "/",
            post(handlers::tables::create_table).get(handlers::tables::get_tables),
        )
        .route(
            "/rearrange-chairs",
            post(handlers::tables::rearrange_chairs),
        )
        .route(
            "/{table_id}",
            get(handlers::tables::get_table)
                .patch(handlers::tables::update_table)
                .delete(handlers::tables::delete_table),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let merge_routes = Router::new()
        .route(
            "/",
            post(handlers::merge::create_merge_group).get(handlers::merge::get_merge_groups),
        )
        .route(
            "/{group_id}",
            get(handlers::merge::get_merge_group)
                .patch(handlers::merge::update_merge_group)
                .delete(handlers::merge::delete_merge_group),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let hours_routes = Router::new()
        .route(
            "/",
            post(handlers::hours::create_hours).get(handlers::hours::get_all_hours),
        )
        .route("/bulk", post(handlers::hours::bulk_create_hours))
        .route(
            "/special",
            post(handlers::hours::create_special_hours).get(handlers::hours::get_special_hours),
        )
        .route(
            "/special/{date}",
            patch(handlers::hours::update_special_hours)
                .delete(handlers::hours::delete_special_hours),
        )
        .route("/{day_of_week}", patch(handlers::hours::update_hours))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Reservas ficam públicas: clientes consultam disponibilidade e reservam sem login
    let reservation_routes = Router::new()
        .route(
            "/",
            post(handlers::reservations::create_reservation)
                .get(handlers::reservations::get_reservations),
        )
        .route(
            "/available",
            get(handlers::reservations::get_available_tables),
        )
        .route(
            "/{reservation_id}",
            get(handlers::reservations::get_reservation)
                .patch(handlers::reservations::update_reservation),
        )
        .route(
            "/{reservation_id}/cancel",
            post(handlers::reservations::cancel_reservation),
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/config", config_routes)
        .nest("/api/tables", table_routes)
        .nest("/api/merge-groups", merge_routes)
        .nest("/api/hours", hours_routes)
        .nest("/api/reservations", reservation_routes)
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}

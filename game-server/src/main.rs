mod bomb;
mod config;
mod connection;
mod dispatcher;
mod error;
mod game;
mod grid;
mod ids;
mod movement;
mod player;
mod position;
mod powerup;
mod registry;
mod shrink;

use std::sync::Arc;

use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::GLOBAL_GAME_ID;
use crate::game::Game;
use crate::registry::AppState;

#[tokio::main]
/// Boots tracing, seeds the permanent `"global"` lobby, and serves the
/// single `/websocket` upgrade route for the rest of the process lifetime.
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .init();

    let state = Arc::new(AppState::default());
    state.games.add(Game::new(GLOBAL_GAME_ID.to_string())).await;

    let app = Router::new()
        .route("/websocket", get(websocket_handler))
        .with_state(state);

    let port = config::backend_port();
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap_or_else(|err| panic!("failed to bind port {port}: {err}"));
    tracing::info!(port, "game server listening");

    axum::serve(listener, app).await.unwrap();
}

/// Upgrades the single HTTP route to a websocket and hands the connection
/// off to the per-connection read/write loop.
async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| connection::handle_socket(socket, state))
}

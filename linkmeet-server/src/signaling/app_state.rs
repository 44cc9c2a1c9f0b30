use crate::config::RelayConfig;
use crate::room::RoomManager;
use crate::signaling::{Relay, SignalingService, ws_handler};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;

pub struct AppState {
    pub signaling: SignalingService,
    pub relay: Relay,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> Arc<Self> {
        let signaling = SignalingService::new(config.ice_servers.clone());
        let relay = Relay::new(RoomManager::new(), Arc::new(signaling.clone()));

        Arc::new(Self { signaling, relay })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// Binds `config.bind_addr` and serves the relay until the listener fails.
pub async fn serve(config: RelayConfig) -> std::io::Result<()> {
    let state = AppState::new(&config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    tracing::info!("Signaling relay listening on ws://{}/ws", listener.local_addr()?);

    axum::serve(listener, router(state)).await
}

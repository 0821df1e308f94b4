mod api;
mod buzzer;
mod config;
mod error;
mod rooms;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use warp::Filter;

use buzzer::BuzzerServer;
use config::Config;
use rooms::RoomManager;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let manager = Arc::new(RoomManager::new(config.rooms.clone()));
    manager.clone().start_reaper();

    let server = Arc::new(BuzzerServer::new(manager, &config));

    let routes = api::routes::buzzer_websocket_route(server)
        .or(api::routes::health_check())
        .with(api::routes::cors(&config.server.cors_origin).build());

    let addr = config.socket_addr();
    tracing::info!(%addr, "Buzzer server listening");
    warp::serve(routes).run(addr).await;
}

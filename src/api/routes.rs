use std::sync::Arc;

use warp::Filter;

use crate::buzzer::BuzzerServer;

use super::websocket;

/// WebSocket upgrade for the buzzer protocol at /buzzer
pub fn buzzer_websocket_route(
    server: Arc<BuzzerServer>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("buzzer")
        .and(warp::ws())
        .and(with_server(server))
        .map(|ws: warp::ws::Ws, server: Arc<BuzzerServer>| {
            ws.on_upgrade(move |websocket| websocket::handle_buzzer_websocket(websocket, server))
        })
}

pub fn health_check() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("health").and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "service": "Buzzer Server",
        }))
    })
}

pub fn cors(origin: &str) -> warp::cors::Builder {
    let cors = warp::cors().allow_methods(vec!["GET", "POST"]);
    if origin == "*" {
        cors.allow_any_origin()
    } else {
        cors.allow_origin(origin)
    }
}

fn with_server(
    server: Arc<BuzzerServer>,
) -> impl Filter<Extract = (Arc<BuzzerServer>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || server.clone())
}

use std::convert::Infallible;
use std::sync::Arc;

use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use warp::http::{HeaderMap, StatusCode};
use warp::ws::WebSocket;
use warp::{Filter, Rejection, Reply};

use crate::auth::token::TokenManager;
use crate::constants::WS_PATH;
use crate::core::connection::Connection;
use crate::core::message::ClientAction;
use crate::core::server::SharedRelay;
use crate::handlers::auth::authenticate_connection;

/// Rejection raised when the credential check fails
#[derive(Debug)]
struct Unauthorized;

impl warp::reject::Reject for Unauthorized {}

/// Build the relay's routes: the upgrade-capable signaling endpoint and a
/// health check. When a verifier is supplied, the credential is checked
/// before the upgrade completes and a bad one is answered with 401.
pub fn relay_routes(
    relay: SharedRelay,
    verifier: Option<Arc<TokenManager>>,
    max_message_size: usize,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let ws_route = warp::path(WS_PATH)
        .and(warp::ws())
        .and(warp::header::headers_cloned())
        .and(with_relay(relay))
        .and(with_verifier(verifier))
        .and_then(
            move |ws: warp::ws::Ws,
                  headers: HeaderMap,
                  relay: SharedRelay,
                  verifier: Option<Arc<TokenManager>>| async move {
                let peer = match authenticate_connection(&headers, verifier.as_deref()) {
                    Ok(peer) => peer,
                    Err(e) => {
                        warn!("Rejecting connection: {}", e);
                        return Err(warp::reject::custom(Unauthorized));
                    }
                };

                Ok(ws
                    .max_message_size(max_message_size)
                    .on_upgrade(move |socket| handle_ws_client(socket, relay, peer)))
            },
        );

    let health_route = warp::path("health").map(|| "OK");

    ws_route.or(health_route).recover(handle_rejection)
}

async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Rejection> {
    if err.find::<Unauthorized>().is_some() {
        Ok(warp::reply::with_status("Unauthorized", StatusCode::UNAUTHORIZED))
    } else {
        Err(err)
    }
}

// Helper filters to include shared state in requests
fn with_relay(
    relay: SharedRelay,
) -> impl Filter<Extract = (SharedRelay,), Error = Infallible> + Clone {
    warp::any().map(move || relay.clone())
}

fn with_verifier(
    verifier: Option<Arc<TokenManager>>,
) -> impl Filter<Extract = (Option<Arc<TokenManager>>,), Error = Infallible> + Clone {
    warp::any().map(move || verifier.clone())
}

/// Own one WebSocket connection from accept to teardown
pub async fn handle_ws_client(ws: WebSocket, relay: SharedRelay, peer: Option<String>) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Writer task: drains the outbound channel, so messages to this peer
    // keep their send order.
    tokio::task::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_tx.send(message).await {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let mut connection = Connection::new(tx);
    connection.open();
    let client_id = connection.id.clone();

    relay.register(connection).await;
    match &peer {
        Some(peer_id) => info!("Peer connected: {} (subject {})", client_id, peer_id),
        None => info!("Peer connected: {}", client_id),
    }
    info!("Current connections: {}", relay.connection_count().await);

    // Receive loop. Frames that fail JSON decoding are dropped and the loop
    // continues; a transport-level read error is treated as a disconnect.
    // The loop suspends while the peer is idle, which is the back-pressure
    // point: a slow peer costs nothing here.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(msg) => {
                // Only text frames carry signaling; binary and control
                // frames are ignored
                if let Ok(text) = msg.to_str() {
                    dispatch(text, &client_id, &relay).await;
                }
            }
            Err(e) => {
                debug!("WebSocket read error for {}: {}", client_id, e);
                break;
            }
        }
    }

    // Peer is gone: leave every room and notify the remaining members
    relay.teardown(&client_id).await;
    info!("Peer disconnected: {}", client_id);
    info!("Current connections: {}", relay.connection_count().await);
}

// Route one decoded message to the relay
async fn dispatch(text: &str, client_id: &str, relay: &SharedRelay) {
    match ClientAction::parse(text) {
        Ok(ClientAction::Join { room }) => relay.join_room(client_id, &room).await,
        Ok(ClientAction::Leave { room }) => relay.leave_room(client_id, &room).await,
        Ok(ClientAction::Data { room, data }) => relay.relay_data(client_id, &room, data).await,
        Ok(ClientAction::Unrecognized) => {
            debug!("Ignoring unrecognized message from {}", client_id);
        }
        Err(e) => {
            warn!("Dropping malformed frame from {}: {}", client_id, e);
        }
    }
}

//! WebSocket handler for realtime base collaboration.
//!
//! Clients connect with `GET /ws?baseId=<uuid>&token=<session>`; the token
//! travels as a query parameter because browsers cannot reliably set
//! headers on upgrade requests. After authentication and role resolution
//! the connection joins its base's room on the hub.

use std::ops::ControlFlow;

use axum::extract::State;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use gridbase_postgres::PgClient;
use gridbase_postgres::query::BaseCollaboratorRepository;
use serde::Deserialize;
use uuid::Uuid;

use crate::extract::{Identity, Query, resolve_session_token};
use crate::handler::{ErrorKind, Result};
use crate::service::realtime::{
    PING_INTERVAL, READ_DEADLINE, RealtimeHub, RealtimeMessage, WRITE_DEADLINE,
};

/// Tracing target for websocket operations.
const TRACING_TARGET: &str = "gridbase_server::handler::websocket";

/// Query parameters of the upgrade request.
#[derive(Debug, Deserialize)]
struct WsQuery {
    /// The base to join.
    #[serde(rename = "baseId")]
    base_id: Uuid,
    /// The opaque session token.
    token: String,
}

/// Authenticates and upgrades a realtime connection.
#[tracing::instrument(skip_all)]
async fn ws_handler(
    State(pg_client): State<PgClient>,
    State(hub): State<RealtimeHub>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    if query.token.trim().is_empty() {
        return Err(ErrorKind::TokenRequired.into_error());
    }

    let identity = resolve_session_token(&pg_client, &query.token).await?;

    // Any collaborator role suffices to observe a base.
    let mut conn = pg_client.get_connection().await?;
    let role = conn
        .find_collaborator_role(query.base_id, identity.user_id)
        .await?;
    if role.is_none() {
        return Err(ErrorKind::Forbidden.into_error());
    }

    tracing::info!(
        target: TRACING_TARGET,
        user_id = %identity.user_id,
        base_id = %query.base_id,
        "websocket upgrade authorized"
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, query.base_id, identity, hub)))
}

/// Runs one realtime connection until either side closes it.
///
/// The writer drains the hub's send queue and emits pings; the reader
/// enforces the pong deadline and relays client cursor frames. Whichever
/// half finishes first ends the connection.
async fn handle_socket(socket: WebSocket, base_id: Uuid, identity: Identity, hub: RealtimeHub) {
    let registration = hub.register(
        base_id,
        identity.user_id,
        identity.email.clone(),
        identity.display_name.clone(),
    );
    let connection_id = registration.connection_id;
    let mut queue = registration.receiver;

    let (mut sender, mut receiver) = socket.split();

    // Seed the new client with the room's current presence, skipping its
    // own user per the origin filter.
    for entry in hub.presence_snapshot(base_id) {
        if entry.user_id == identity.user_id {
            continue;
        }
        let frame =
            RealtimeMessage::presence(true, base_id, entry.user_id, &entry.display_name);
        if let Ok(text) = serde_json::to_string(&frame)
            && sender.send(Message::Text(Utf8Bytes::from(text))).await.is_err()
        {
            hub.unregister(base_id, connection_id);
            return;
        }
    }

    // Writer: drain the send queue, pinging on idle.
    let write_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(PING_INTERVAL);
        ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ping.tick().await; // first tick completes immediately

        loop {
            tokio::select! {
                frame = queue.recv() => {
                    let Some(frame) = frame else {
                        // Hub dropped the queue: overflow kick or shutdown.
                        break;
                    };
                    let message = Message::Text(Utf8Bytes::from(frame.as_ref()));
                    let sent =
                        tokio::time::timeout(WRITE_DEADLINE, sender.send(message)).await;
                    match sent {
                        Ok(Ok(())) => {}
                        Ok(Err(_)) | Err(_) => break,
                    }
                }
                _ = ping.tick() => {
                    let sent = tokio::time::timeout(
                        WRITE_DEADLINE,
                        sender.send(Message::Ping(Vec::new().into())),
                    )
                    .await;
                    match sent {
                        Ok(Ok(())) => {}
                        Ok(Err(_)) | Err(_) => break,
                    }
                }
            }
        }

        let _ = sender.close().await;
    });

    // Reader: enforce the pong deadline and relay client frames.
    let read_hub = hub.clone();
    let read_identity = identity.clone();
    let read_task = tokio::spawn(async move {
        loop {
            let frame = tokio::time::timeout(READ_DEADLINE, receiver.next()).await;
            let message = match frame {
                Ok(Some(Ok(message))) => message,
                Ok(Some(Err(err))) => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        connection_id = %connection_id,
                        error = %err,
                        "websocket read error"
                    );
                    break;
                }
                Ok(None) => break,
                Err(_deadline) => {
                    tracing::info!(
                        target: TRACING_TARGET,
                        connection_id = %connection_id,
                        "read deadline exceeded, closing connection"
                    );
                    break;
                }
            };

            if handle_client_frame(&read_hub, base_id, connection_id, &read_identity, message)
                .is_break()
            {
                break;
            }
        }
    });

    // Whichever half ends first tears the connection down.
    tokio::select! {
        _ = write_task => {}
        _ = read_task => {}
    }

    hub.unregister(base_id, connection_id);

    tracing::info!(
        target: TRACING_TARGET,
        connection_id = %connection_id,
        user_id = %identity.user_id,
        base_id = %base_id,
        "websocket connection closed"
    );
}

/// Processes one inbound frame from the client.
fn handle_client_frame(
    hub: &RealtimeHub,
    base_id: Uuid,
    connection_id: Uuid,
    identity: &Identity,
    message: Message,
) -> ControlFlow<()> {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<RealtimeMessage>(&text) {
                Ok(mut frame) => {
                    // Clients cannot speak for other users or other bases.
                    frame.base_id = base_id;
                    frame.user_id = Some(identity.user_id);
                    hub.relay(base_id, connection_id, &frame);
                }
                Err(err) => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        connection_id = %connection_id,
                        error = %err,
                        "unparseable client frame, dropping"
                    );
                }
            }
            ControlFlow::Continue(())
        }
        Message::Binary(_) => {
            tracing::debug!(
                target: TRACING_TARGET,
                connection_id = %connection_id,
                "binary frames are not supported, dropping"
            );
            ControlFlow::Continue(())
        }
        // The pong itself already reset the read deadline.
        Message::Pong(_) | Message::Ping(_) => ControlFlow::Continue(()),
        Message::Close(_) => ControlFlow::Break(()),
    }
}

/// Returns the realtime upgrade route.
pub fn routes() -> axum::Router<crate::service::ServiceState> {
    axum::Router::new().route("/ws", axum::routing::get(ws_handler))
}

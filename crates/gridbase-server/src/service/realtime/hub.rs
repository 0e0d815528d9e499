//! The realtime hub: per-base rooms of connected clients.
//!
//! The hub owns every client's bounded send queue. Broadcast never blocks:
//! a frame is serialized once and enqueued with `try_send`; a client whose
//! queue is full is disconnected rather than allowed to back-pressure the
//! mutation path, and must reconnect and refetch state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use gridbase_events::EventBus;
use jiff::Timestamp;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::message::RealtimeMessage;

/// Tracing target for realtime hub operations.
const TRACING_TARGET: &str = "gridbase_server::service::realtime";

/// Capacity of each client's send queue.
pub const SEND_QUEUE_CAPACITY: usize = 64;

/// Interval between server pings on an idle connection.
pub const PING_INTERVAL: Duration = Duration::from_secs(54);

/// Deadline for a single client socket write.
pub const WRITE_DEADLINE: Duration = Duration::from_secs(10);

/// Deadline for hearing anything (including pongs) from a client.
pub const READ_DEADLINE: Duration = Duration::from_secs(60);

/// A live entry in a base's presence set.
#[derive(Debug, Clone, Serialize)]
pub struct PresenceEntry {
    /// The connection's identifier.
    pub connection_id: Uuid,
    /// The connected account.
    pub user_id: Uuid,
    /// The account's email address.
    pub email: String,
    /// The account's display name.
    pub display_name: String,
    /// When the connection joined the base.
    pub joined_at: Timestamp,
    /// The connection's most recent cursor payload, if any.
    pub cursor: Option<serde_json::Value>,
}

/// A registered client connection handle.
struct ClientHandle {
    user_id: Uuid,
    email: String,
    display_name: String,
    sender: mpsc::Sender<Arc<str>>,
    cursor: Mutex<Option<serde_json::Value>>,
    joined_at: Timestamp,
}

/// A base's broadcast group.
struct Room {
    clients: HashMap<Uuid, ClientHandle>,
    forwarder: tokio::task::JoinHandle<()>,
}

/// The result of registering a connection.
pub struct Registration {
    /// Identifier of the new connection.
    pub connection_id: Uuid,
    /// The connection's outbound frame queue; drained by the writer loop.
    pub receiver: mpsc::Receiver<Arc<str>>,
}

/// Process-wide realtime hub.
///
/// Cloning is cheap; all clones share the room registry. Constructed once
/// at startup next to the event bus it forwards from.
#[derive(Clone)]
pub struct RealtimeHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    bus: EventBus,
    rooms: RwLock<HashMap<Uuid, Room>>,
}

impl RealtimeHub {
    /// Creates a hub forwarding from the given bus.
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(HubInner {
                bus,
                rooms: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Registers a connection with a base's room.
    ///
    /// The first connection of a base spawns the room's bus forwarder. A
    /// `presence.join` frame is broadcast to the room; per the origin
    /// filter, the joining user's own connections do not receive it.
    pub fn register(
        &self,
        base_id: Uuid,
        user_id: Uuid,
        email: String,
        display_name: String,
    ) -> Registration {
        let connection_id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(SEND_QUEUE_CAPACITY);

        let handle = ClientHandle {
            user_id,
            email,
            display_name: display_name.clone(),
            sender,
            cursor: Mutex::new(None),
            joined_at: Timestamp::now(),
        };

        {
            let mut rooms = self.inner.rooms.write().expect("room registry poisoned");
            let room = rooms.entry(base_id).or_insert_with(|| Room {
                clients: HashMap::new(),
                forwarder: spawn_forwarder(Arc::downgrade(&self.inner), base_id),
            });
            room.clients.insert(connection_id, handle);
        }

        tracing::info!(
            target: TRACING_TARGET,
            connection_id = %connection_id,
            user_id = %user_id,
            base_id = %base_id,
            "client registered"
        );

        let join = RealtimeMessage::presence(true, base_id, user_id, &display_name);
        self.inner
            .broadcast_and_reap(base_id, &join, Some(user_id), None);

        Registration {
            connection_id,
            receiver,
        }
    }

    /// Unregisters a connection, broadcasting `presence.leave` when the
    /// connection was still present.
    ///
    /// Idempotent: the hub may already have dropped an overflowing client.
    pub fn unregister(&self, base_id: Uuid, connection_id: Uuid) {
        if let Some((user_id, display_name)) = self.inner.remove_client(base_id, connection_id) {
            tracing::info!(
                target: TRACING_TARGET,
                connection_id = %connection_id,
                user_id = %user_id,
                base_id = %base_id,
                "client unregistered"
            );

            let leave = RealtimeMessage::presence(false, base_id, user_id, &display_name);
            self.inner
                .broadcast_and_reap(base_id, &leave, Some(user_id), None);
        }
    }

    /// Broadcasts a frame to a base's room.
    pub fn broadcast(
        &self,
        base_id: Uuid,
        frame: &RealtimeMessage,
        skip_user: Option<Uuid>,
        skip_connection: Option<Uuid>,
    ) {
        self.inner
            .broadcast_and_reap(base_id, frame, skip_user, skip_connection);
    }

    /// Relays a client-originated frame to the rest of the room.
    ///
    /// Only cursor frames are relayed; the origin *connection* is skipped
    /// (not the whole user), so a user's other windows still see their own
    /// cursor from elsewhere.
    pub fn relay(&self, base_id: Uuid, origin_connection: Uuid, frame: &RealtimeMessage) {
        if !frame.message_type.is_client_origin() {
            tracing::debug!(
                target: TRACING_TARGET,
                connection_id = %origin_connection,
                frame_type = ?frame.message_type,
                "dropping non-relayable client frame"
            );
            return;
        }

        // Remember the cursor for presence snapshots.
        {
            let rooms = self.inner.rooms.read().expect("room registry poisoned");
            if let Some(client) = rooms
                .get(&base_id)
                .and_then(|room| room.clients.get(&origin_connection))
            {
                *client.cursor.lock().expect("cursor lock poisoned") =
                    Some(frame.payload.clone());
            }
        }

        self.inner
            .broadcast_and_reap(base_id, frame, None, Some(origin_connection));
    }

    /// Returns a read-only snapshot of a base's presence set.
    pub fn presence_snapshot(&self, base_id: Uuid) -> Vec<PresenceEntry> {
        let rooms = self.inner.rooms.read().expect("room registry poisoned");
        let Some(room) = rooms.get(&base_id) else {
            return Vec::new();
        };

        room.clients
            .iter()
            .map(|(connection_id, client)| PresenceEntry {
                connection_id: *connection_id,
                user_id: client.user_id,
                email: client.email.clone(),
                display_name: client.display_name.clone(),
                joined_at: client.joined_at,
                cursor: client.cursor.lock().expect("cursor lock poisoned").clone(),
            })
            .collect()
    }

    /// Returns the number of live connections across all bases.
    pub fn connection_count(&self) -> usize {
        let rooms = self.inner.rooms.read().expect("room registry poisoned");
        rooms.values().map(|room| room.clients.len()).sum()
    }

    /// Disconnects everything, ending all forwarders.
    ///
    /// Dropping the senders closes every client's queue; writer loops drain
    /// what is already queued and end.
    pub fn shutdown(&self) {
        let mut rooms = self.inner.rooms.write().expect("room registry poisoned");
        for (base_id, room) in rooms.drain() {
            room.forwarder.abort();
            tracing::debug!(
                target: TRACING_TARGET,
                base_id = %base_id,
                clients = room.clients.len(),
                "room closed during shutdown"
            );
        }
    }
}

impl std::fmt::Debug for RealtimeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHub")
            .field("connections", &self.connection_count())
            .finish()
    }
}

impl HubInner {
    /// Broadcasts and disconnects every client whose queue overflowed.
    fn broadcast_and_reap(
        &self,
        base_id: Uuid,
        frame: &RealtimeMessage,
        skip_user: Option<Uuid>,
        skip_connection: Option<Uuid>,
    ) {
        let mut kicked = self.broadcast_once(base_id, frame, skip_user, skip_connection);

        // Disconnecting a client broadcasts its leave, which can in turn
        // overflow someone else; keep reaping until the room is stable.
        while let Some(connection_id) = kicked.pop() {
            if let Some((user_id, display_name)) = self.remove_client(base_id, connection_id) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    connection_id = %connection_id,
                    user_id = %user_id,
                    base_id = %base_id,
                    "send queue overflow, disconnecting client"
                );

                let leave = RealtimeMessage::presence(false, base_id, user_id, &display_name);
                kicked.extend(self.broadcast_once(base_id, &leave, Some(user_id), None));
            }
        }
    }

    /// Serializes a frame once and enqueues it for every eligible client.
    ///
    /// Returns the connections whose queues were full or closed.
    fn broadcast_once(
        &self,
        base_id: Uuid,
        frame: &RealtimeMessage,
        skip_user: Option<Uuid>,
        skip_connection: Option<Uuid>,
    ) -> Vec<Uuid> {
        let serialized: Arc<str> = match serde_json::to_string(frame) {
            Ok(text) => Arc::from(text.as_str()),
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "failed to serialize realtime frame"
                );
                return Vec::new();
            }
        };

        let rooms = self.rooms.read().expect("room registry poisoned");
        let Some(room) = rooms.get(&base_id) else {
            return Vec::new();
        };

        let mut kicked = Vec::new();
        for (connection_id, client) in &room.clients {
            if skip_connection == Some(*connection_id) {
                continue;
            }
            if skip_user == Some(client.user_id) {
                continue;
            }

            if client.sender.try_send(Arc::clone(&serialized)).is_err() {
                kicked.push(*connection_id);
            }
        }

        kicked
    }

    /// Removes a connection; tears the room down when it becomes empty.
    fn remove_client(&self, base_id: Uuid, connection_id: Uuid) -> Option<(Uuid, String)> {
        let mut rooms = self.rooms.write().expect("room registry poisoned");
        let room = rooms.get_mut(&base_id)?;
        let client = room.clients.remove(&connection_id)?;

        if room.clients.is_empty() {
            if let Some(room) = rooms.remove(&base_id) {
                room.forwarder.abort();
            }
            tracing::debug!(
                target: TRACING_TARGET,
                base_id = %base_id,
                "last client left, room closed"
            );
        }

        Some((client.user_id, client.display_name))
    }
}

/// Spawns the task forwarding bus events into a room.
///
/// The task holds only a weak reference so an idle hub can drop freely; it
/// ends when the room is torn down (abort) or the bus closes.
fn spawn_forwarder(hub: Weak<HubInner>, base_id: Uuid) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let Some(inner) = hub.upgrade() else {
            return;
        };
        let mut stream = inner.bus.subscribe(base_id);
        drop(inner);

        while let Some(event) = {
            // Hold no strong reference while parked on the stream.
            stream.next().await
        } {
            let Some(inner) = hub.upgrade() else {
                return;
            };
            let Some(frame) = RealtimeMessage::from_event(&event) else {
                continue;
            };

            // Origin filter: the acting user's own connections are skipped.
            inner.broadcast_and_reap(base_id, &frame, event.user_id, None);
        }
    })
}

#[cfg(test)]
mod tests {
    use gridbase_events::{BaseEvent, EventType};

    use super::*;

    fn hub() -> (RealtimeHub, EventBus) {
        let bus = EventBus::new();
        (RealtimeHub::new(bus.clone()), bus)
    }

    async fn recv_frame(
        receiver: &mut mpsc::Receiver<Arc<str>>,
    ) -> Option<serde_json::Value> {
        let timeout = tokio::time::timeout(Duration::from_secs(2), receiver.recv()).await;
        timeout.ok().flatten().map(|text| {
            serde_json::from_str(&text).expect("frames are valid JSON")
        })
    }

    #[tokio::test]
    async fn presence_join_reaches_other_users() {
        let (hub, _bus) = hub();
        let base_id = Uuid::new_v4();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        let mut reg_a = hub.register(base_id, user_a, "a@x.io".into(), "A".into());
        let _reg_b = hub.register(base_id, user_b, "b@x.io".into(), "B".into());

        let frame = recv_frame(&mut reg_a.receiver).await.unwrap();
        assert_eq!(frame["type"], "presence.join");
        assert_eq!(frame["user_id"], serde_json::json!(user_b));
    }

    #[tokio::test]
    async fn own_events_are_filtered_by_user() {
        let (hub, bus) = hub();
        let base_id = Uuid::new_v4();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        let mut reg_a = hub.register(base_id, user_a, "a@x.io".into(), "A".into());
        let mut reg_b = hub.register(base_id, user_b, "b@x.io".into(), "B".into());

        // Drain presence frames.
        let _ = recv_frame(&mut reg_a.receiver).await;

        bus.publish(
            BaseEvent::new(EventType::RecordUpdated, base_id)
                .with_table(Uuid::new_v4())
                .with_entity(Uuid::new_v4())
                .with_user(user_a)
                .with_record(serde_json::json!({"values": {}})),
        );

        let frame = recv_frame(&mut reg_b.receiver).await.unwrap();
        assert_eq!(frame["type"], "record.updated");
        assert_eq!(frame["user_id"], serde_json::json!(user_a));

        // The actor's own connection must not see the event; the next thing
        // it can observe is B's presence or nothing at all.
        let silent =
            tokio::time::timeout(Duration::from_millis(200), reg_a.receiver.recv()).await;
        assert!(silent.is_err());
    }

    #[tokio::test]
    async fn cross_base_events_stay_in_their_room() {
        let (hub, bus) = hub();
        let base_a = Uuid::new_v4();
        let base_b = Uuid::new_v4();

        let mut reg = hub.register(base_a, Uuid::new_v4(), "a@x.io".into(), "A".into());

        bus.publish(
            BaseEvent::new(EventType::RecordCreated, base_b)
                .with_entity(Uuid::new_v4())
                .with_user(Uuid::new_v4()),
        );

        let silent = tokio::time::timeout(Duration::from_millis(200), reg.receiver.recv()).await;
        assert!(silent.is_err());
    }

    #[tokio::test]
    async fn cursor_relay_skips_origin_connection_only() {
        let (hub, _bus) = hub();
        let base_id = Uuid::new_v4();
        let user = Uuid::new_v4();

        let reg_first = hub.register(base_id, user, "a@x.io".into(), "A".into());
        let mut reg_second = hub.register(base_id, user, "a@x.io".into(), "A".into());

        let cursor = RealtimeMessage {
            message_type: super::super::message::MessageType::CursorMove,
            base_id,
            table_id: None,
            record_id: None,
            user_id: Some(user),
            payload: serde_json::json!({"x": 4, "y": 2}),
        };
        hub.relay(base_id, reg_first.connection_id, &cursor);

        // Same user, different window: cursor still arrives.
        let frame = recv_frame(&mut reg_second.receiver).await.unwrap();
        assert_eq!(frame["type"], "cursor.move");
        assert_eq!(frame["payload"]["x"], 4);
    }

    #[tokio::test]
    async fn unregister_broadcasts_leave_once() {
        let (hub, _bus) = hub();
        let base_id = Uuid::new_v4();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        let reg_a = hub.register(base_id, user_a, "a@x.io".into(), "A".into());
        let mut reg_b = hub.register(base_id, user_b, "b@x.io".into(), "B".into());

        hub.unregister(base_id, reg_a.connection_id);
        // Second unregister is a no-op.
        hub.unregister(base_id, reg_a.connection_id);

        let frame = recv_frame(&mut reg_b.receiver).await.unwrap();
        assert_eq!(frame["type"], "presence.leave");
        assert_eq!(frame["user_id"], serde_json::json!(user_a));

        let silent = tokio::time::timeout(Duration::from_millis(200), reg_b.receiver.recv()).await;
        assert!(silent.is_err());
    }

    #[tokio::test]
    async fn overflowing_client_is_disconnected() {
        let (hub, _bus) = hub();
        let base_id = Uuid::new_v4();
        let slow_user = Uuid::new_v4();

        let reg_slow = hub.register(base_id, slow_user, "s@x.io".into(), "S".into());

        // Never drain the slow client; overflow its queue.
        let frame = RealtimeMessage::presence(true, base_id, Uuid::new_v4(), "noise");
        for _ in 0..(SEND_QUEUE_CAPACITY + 8) {
            hub.broadcast(base_id, &frame, None, None);
        }

        // The slow client was reaped; its connection is gone.
        assert_eq!(hub.connection_count(), 0);
        drop(reg_slow);
    }

    #[tokio::test]
    async fn presence_snapshot_reflects_registrations() {
        let (hub, _bus) = hub();
        let base_id = Uuid::new_v4();
        let user = Uuid::new_v4();

        let reg = hub.register(base_id, user, "a@x.io".into(), "Ana".into());

        let snapshot = hub.presence_snapshot(base_id);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].user_id, user);
        assert_eq!(snapshot[0].display_name, "Ana");
        assert_eq!(snapshot[0].connection_id, reg.connection_id);

        hub.unregister(base_id, reg.connection_id);
        assert!(hub.presence_snapshot(base_id).is_empty());
    }
}

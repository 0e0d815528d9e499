//! Realtime collaboration: the hub, client frames, and presence.

mod hub;
mod message;

pub use hub::{
    PING_INTERVAL, PresenceEntry, READ_DEADLINE, RealtimeHub, Registration,
    SEND_QUEUE_CAPACITY, WRITE_DEADLINE,
};
pub use message::{MessageType, RealtimeMessage};

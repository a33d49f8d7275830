// apps/marketplace/src/realtime/hub.rs

//! In-process chat relay.
//!
//! Tracks which connection sits in which room and fans `send_message` out to
//! the room. Persistence runs on its own task so a slow or failing store never
//! holds up the broadcast; the sender learns about each outcome through a
//! separate acknowledgement frame.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, instrument};

use super::events::{SendMessagePayload, ServerEvent};
use crate::errors::{AppError, Result};
use crate::services::chat::{self, NewMessage};
use crate::store::DocumentStore;

pub type ConnId = u64;

const THREAD_PREFIX: &str = "thread";

/// Canonical room for the conversation between `a` and `b` about a product.
/// The two user ids are sorted so both sides derive the same room.
pub fn thread_room(product_id: &str, a: &str, b: &str) -> String {
  let (first, second) = if a <= b { (a, b) } else { (b, a) };
  format!("{}:{}:{}:{}", THREAD_PREFIX, product_id, first, second)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRoom {
  pub product_id: String,
  pub user_a: String,
  pub user_b: String,
}

impl ThreadRoom {
  pub fn parse(room: &str) -> Option<Self> {
    let mut parts = room.splitn(4, ':');
    if parts.next()? != THREAD_PREFIX {
      return None;
    }
    let product_id = parts.next()?;
    let user_a = parts.next()?;
    let user_b = parts.next()?;
    if product_id.is_empty() || user_a.is_empty() || user_b.is_empty() {
      return None;
    }
    Some(Self {
      product_id: product_id.to_string(),
      user_a: user_a.to_string(),
      user_b: user_b.to_string(),
    })
  }

  pub fn has_participant(&self, user_id: &str) -> bool {
    self.user_a == user_id || self.user_b == user_id
  }

  /// True if `{x, y}` is exactly this thread's participant pair.
  pub fn is_pair(&self, x: &str, y: &str) -> bool {
    (self.user_a == x && self.user_b == y) || (self.user_a == y && self.user_b == x)
  }
}

struct Connection {
  user_id: String,
  outbox: UnboundedSender<ServerEvent>,
  rooms: HashSet<String>,
}

#[derive(Default)]
struct RelayState {
  connections: HashMap<ConnId, Connection>,
  rooms: HashMap<String, HashSet<ConnId>>,
}

pub struct ChatRelay {
  store: Arc<dyn DocumentStore>,
  strict_rooms: bool,
  next_id: AtomicU64,
  state: RwLock<RelayState>,
}

impl ChatRelay {
  pub fn new(store: Arc<dyn DocumentStore>, strict_rooms: bool) -> Self {
    Self {
      store,
      strict_rooms,
      next_id: AtomicU64::new(1),
      state: RwLock::new(RelayState::default()),
    }
  }

  /// Registers a socket for an authenticated user. Frames for the socket
  /// arrive on the returned receiver.
  pub fn connect(&self, user_id: &str) -> (ConnId, UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    self.state.write().connections.insert(
      id,
      Connection {
        user_id: user_id.to_string(),
        outbox: tx,
        rooms: HashSet::new(),
      },
    );
    debug!(conn_id = id, user_id, "Socket connected.");
    (id, rx)
  }

  /// Drops the socket from every room it joined.
  pub fn disconnect(&self, conn: ConnId) {
    let mut state = self.state.write();
    let Some(connection) = state.connections.remove(&conn) else {
      return;
    };
    for room in &connection.rooms {
      if let Some(members) = state.rooms.get_mut(room) {
        members.remove(&conn);
        if members.is_empty() {
          state.rooms.remove(room);
        }
      }
    }
    debug!(conn_id = conn, rooms = connection.rooms.len(), "Socket disconnected.");
  }

  fn check_room(&self, room: &str, user_id: &str) -> Result<Option<ThreadRoom>> {
    if room.trim().is_empty() {
      return Err(AppError::InvalidState("Room is required".to_string()));
    }
    match ThreadRoom::parse(room) {
      Some(thread) if thread.has_participant(user_id) => Ok(Some(thread)),
      Some(_) => Err(AppError::Unauthorized("Not a participant of this thread".to_string())),
      None if self.strict_rooms => Err(AppError::InvalidState(
        "Only thread rooms may be joined".to_string(),
      )),
      None => Ok(None),
    }
  }

  #[instrument(name = "relay::join_room", skip(self))]
  pub fn join_room(&self, conn: ConnId, room: &str) -> Result<()> {
    let mut state = self.state.write();
    let connection = state
      .connections
      .get_mut(&conn)
      .ok_or_else(|| AppError::Internal("unknown connection".to_string()))?;
    self.check_room(room, &connection.user_id)?;

    connection.rooms.insert(room.to_string());
    let _ = connection.outbox.send(ServerEvent::RoomJoined { room: room.to_string() });
    state.rooms.entry(room.to_string()).or_default().insert(conn);
    debug!("Joined room.");
    Ok(())
  }

  pub fn leave_room(&self, conn: ConnId, room: &str) {
    let mut state = self.state.write();
    if let Some(connection) = state.connections.get_mut(&conn) {
      connection.rooms.remove(room);
    }
    if let Some(members) = state.rooms.get_mut(room) {
      members.remove(&conn);
      if members.is_empty() {
        state.rooms.remove(room);
      }
    }
  }

  /// Broadcasts `payload` to its room and persists it in the background.
  /// Returns how many sockets the broadcast reached.
  #[instrument(name = "relay::send_message", skip(self, payload), fields(room = %payload.room))]
  pub fn send_message(&self, conn: ConnId, payload: SendMessagePayload) -> Result<usize> {
    let (user_id, sender_outbox) = {
      let state = self.state.read();
      let connection = state
        .connections
        .get(&conn)
        .ok_or_else(|| AppError::Internal("unknown connection".to_string()))?;
      (connection.user_id.clone(), connection.outbox.clone())
    };

    if payload.sender != user_id {
      return Err(AppError::Unauthorized("Sender does not match the connected user".to_string()));
    }
    if payload.content.trim().is_empty() {
      return Err(AppError::InvalidState("Message content is required".to_string()));
    }
    if payload.receiver.trim().is_empty() || payload.receiver == payload.sender {
      return Err(AppError::InvalidState("A different receiver is required".to_string()));
    }
    let mut product = payload.product_id.clone();
    if let Some(thread) = self.check_room(&payload.room, &user_id)? {
      if !thread.is_pair(&payload.sender, &payload.receiver) {
        return Err(AppError::Unauthorized("Receiver is not part of this thread".to_string()));
      }
      match &payload.product_id {
        Some(pid) if *pid != thread.product_id => {
          return Err(AppError::InvalidState("Product does not match the thread".to_string()));
        }
        Some(_) => {}
        None => product = Some(thread.product_id),
      }
    }

    // Thread rooms imply their product; only the stored copy carries it.
    self.spawn_persist(
      NewMessage {
        sender: payload.sender.clone(),
        receiver: payload.receiver.clone(),
        content: payload.content.clone(),
        product,
        room: Some(payload.room.clone()),
      },
      sender_outbox.clone(),
    );

    let recipients = {
      let state = self.state.read();
      state
        .rooms
        .get(&payload.room)
        .map(|members| {
          members
            .iter()
            .filter_map(|id| state.connections.get(id))
            .filter(|c| c.outbox.send(ServerEvent::ReceiveMessage(payload.clone())).is_ok())
            .count()
        })
        .unwrap_or(0)
    };

    let _ = sender_outbox.send(ServerEvent::MessageDelivered {
      room: payload.room.clone(),
      recipients,
    });
    debug!(recipients, "Message broadcast.");
    Ok(recipients)
  }

  fn spawn_persist(&self, message: NewMessage, ack: UnboundedSender<ServerEvent>) {
    let store = self.store.clone();
    let room = message.room.clone().unwrap_or_default();
    tokio::spawn(async move {
      let event = match chat::record_message(store.as_ref(), message).await {
        Ok(stored) => {
          info!(message_id = %stored.id, room = %room, "Chat message persisted.");
          ServerEvent::MessagePersisted { id: stored.id, room }
        }
        Err(e) => {
          error!(room = %room, error = %e, "Failed to persist chat message.");
          ServerEvent::MessagePersistFailed {
            room,
            error: e.public_message(),
          }
        }
      };
      // The sender may be gone by now; the outcome is already logged.
      let _ = ack.send(event);
    });
  }

  pub fn room_size(&self, room: &str) -> usize {
    self.state.read().rooms.get(room).map_or(0, HashSet::len)
  }
}

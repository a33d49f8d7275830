// apps/marketplace/src/realtime/events.rs

//! Socket frames. Every frame is `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
  pub sender: String,
  pub receiver: String,
  pub content: String,
  pub room: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub product_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
  JoinRoom(String),
  LeaveRoom(String),
  SendMessage(SendMessagePayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
  /// Broadcast to every socket in the room, sender included if joined.
  ReceiveMessage(SendMessagePayload),
  RoomJoined { room: String },
  MessageDelivered { room: String, recipients: usize },
  MessagePersisted { id: String, room: String },
  MessagePersistFailed { room: String, error: String },
  Error { code: String, message: String },
}

// apps/marketplace/src/services/chat.rs

//! Chat persistence and thread reconstruction.
//!
//! Messages are an append-only log with no index by participant, so both the
//! per-thread history and the per-user thread list are rebuilt from a full
//! scan. Scans are not snapshots: a message written concurrently may or may
//! not show up.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

use crate::errors::Result;
use crate::models::{ChatThreadSummary, Message, Product};
use crate::services::users;
use crate::store::{self, Collection, DocumentStore};

/// Input for a new message; id and timestamp are assigned here.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub sender: String,
  pub receiver: String,
  pub content: String,
  pub product: Option<String>,
  pub room: Option<String>,
}

#[instrument(name = "chat::record", skip(store, msg), fields(sender = %msg.sender, room = ?msg.room))]
pub async fn record_message(store: &dyn DocumentStore, msg: NewMessage) -> Result<Message> {
  let message = Message {
    id: store::new_id(),
    sender: msg.sender,
    receiver: msg.receiver,
    content: msg.content,
    product: msg.product.filter(|p| !p.is_empty()),
    room: msg.room,
    read: false,
    created_at: Utc::now(),
  };
  message.validate()?;
  store::save_if(store, Collection::Messages, &message.id, None, &message).await?;
  debug!(message_id = %message.id, "Message persisted.");
  Ok(message)
}

/// Messages between `user_id` and `other_user_id` about `product_id`, oldest
/// first. Equal timestamps keep insertion order.
#[instrument(name = "chat::history", skip(store))]
pub async fn chat_history(
  store: &dyn DocumentStore,
  user_id: &str,
  other_user_id: &str,
  product_id: &str,
) -> Result<Vec<Message>> {
  let mut messages: Vec<Message> = store::load_all::<Message>(store, Collection::Messages)
    .await?
    .into_iter()
    .map(|v| v.doc)
    .filter(|m| m.product.as_deref() == Some(product_id) && m.is_between(user_id, other_user_id))
    .collect();
  // Scan order is insertion order and sort_by is stable.
  messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
  Ok(messages)
}

/// One row per `(product, counterpart)` the user has exchanged messages
/// with. The first message seen for a key decides the row.
#[instrument(name = "chat::my_chats", skip(store))]
pub async fn my_chats(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<ChatThreadSummary>> {
  let messages = store::load_all::<Message>(store, Collection::Messages).await?;

  let mut seen: HashSet<(Option<String>, String)> = HashSet::new();
  let mut keys = Vec::new();
  for message in messages.into_iter().map(|v| v.doc) {
    let Some(other) = message.counterpart_of(user_id) else {
      continue;
    };
    let key = (message.product.clone(), other.to_string());
    if seen.insert(key.clone()) {
      keys.push(key);
    }
  }

  let mut titles: HashMap<String, Option<String>> = HashMap::new();
  let mut names: HashMap<String, Option<String>> = HashMap::new();
  let mut threads = Vec::with_capacity(keys.len());
  for (product_id, other_user_id) in keys {
    let product_title = match &product_id {
      Some(pid) => {
        if !titles.contains_key(pid) {
          let title = store::load::<Product>(store, Collection::Products, pid)
            .await?
            .map(|v| v.doc.title);
          titles.insert(pid.clone(), title);
        }
        titles.get(pid).cloned().flatten()
      }
      None => None,
    };
    if !names.contains_key(&other_user_id) {
      let name = users::display_name(store, &other_user_id).await?;
      names.insert(other_user_id.clone(), name);
    }
    let other_user_name = names.get(&other_user_id).cloned().flatten();

    threads.push(ChatThreadSummary {
      product_id,
      product_title,
      other_user_id,
      other_user_name,
    });
  }
  Ok(threads)
}

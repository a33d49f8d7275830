// apps/marketplace/src/realtime/session.rs

//! Per-connection socket loop. Pings every 5s and drops a client that has
//! been silent for 10s.

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;
use tracing::{debug, info, warn};

use super::events::{ClientEvent, ServerEvent};
use super::hub::{ChatRelay, ConnId};
use crate::errors::AppError;

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

enum SessionError {
  ClientClosed(Option<CloseReason>),
  StreamClosed,
  HeartbeatTimeout,
  Protocol(ProtocolError),
  Network(Closed),
}

enum CloseAction {
  None,
  Close(Option<CloseReason>),
}

pub(super) struct ChatSession {
  relay: Arc<ChatRelay>,
  conn: ConnId,
  user_id: String,
}

impl ChatSession {
  pub(super) fn new(relay: Arc<ChatRelay>, conn: ConnId, user_id: String) -> Self {
    Self { relay, conn, user_id }
  }

  pub(super) async fn run(
    self,
    mut session: Session,
    mut stream: MessageStream,
    mut inbox: UnboundedReceiver<ServerEvent>,
  ) {
    info!(user_id = %self.user_id, conn_id = self.conn, "Chat socket opened.");
    let mut last_heartbeat = Instant::now();
    let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

    loop {
      let result = tokio::select! {
        _ = heartbeat.tick() => {
          self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
        }
        message = stream.recv() => {
          self.handle_stream_message(&mut session, &mut last_heartbeat, message).await
        }
        Some(event) = inbox.recv() => {
          send_event(&mut session, &event).await.map_err(SessionError::Network)
        }
      };

      if let Err(error) = result {
        self.log_shutdown_reason(&error);
        self.relay.disconnect(self.conn);
        close_session_if_needed(session, close_action_for(&error)).await;
        return;
      }
    }
  }

  async fn handle_heartbeat_tick(&self, session: &mut Session, last_heartbeat: &Instant) -> Result<(), SessionError> {
    if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
      return Err(SessionError::HeartbeatTimeout);
    }
    session.ping(b"").await.map_err(SessionError::Network)
  }

  async fn handle_stream_message(
    &self,
    session: &mut Session,
    last_heartbeat: &mut Instant,
    message: Option<Result<Message, ProtocolError>>,
  ) -> Result<(), SessionError> {
    let Some(message) = message else {
      return Err(SessionError::StreamClosed);
    };
    let message = message.map_err(SessionError::Protocol)?;
    *last_heartbeat = Instant::now();

    match message {
      Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
      Message::Text(text) => self.handle_text(session, text.as_ref()).await,
      Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => Ok(()),
      Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
    }
  }

  async fn handle_text(&self, session: &mut Session, text: &str) -> Result<(), SessionError> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
      Ok(event) => event,
      Err(e) => {
        debug!(error = %e, "Malformed chat frame.");
        let err = AppError::Validation("Malformed event frame".to_string());
        return send_event(session, &error_event(&err)).await.map_err(SessionError::Network);
      }
    };

    let outcome = match event {
      ClientEvent::JoinRoom(room) => self.relay.join_room(self.conn, &room),
      ClientEvent::LeaveRoom(room) => {
        self.relay.leave_room(self.conn, &room);
        Ok(())
      }
      ClientEvent::SendMessage(payload) => self.relay.send_message(self.conn, payload).map(|_| ()),
    };

    match outcome {
      Ok(()) => Ok(()),
      Err(err) => {
        warn!(user_id = %self.user_id, code = err.code(), error = %err, "Chat event rejected.");
        send_event(session, &error_event(&err)).await.map_err(SessionError::Network)
      }
    }
  }

  fn log_shutdown_reason(&self, error: &SessionError) {
    match error {
      SessionError::HeartbeatTimeout => warn!(user_id = %self.user_id, "Chat socket heartbeat timeout."),
      SessionError::Protocol(e) => warn!(error = %e, "Chat socket protocol error."),
      SessionError::Network(e) => warn!(error = %e, "Chat socket send failed."),
      SessionError::ClientClosed(_) | SessionError::StreamClosed => {
        info!(user_id = %self.user_id, conn_id = self.conn, "Chat socket closed.")
      }
    }
  }
}

fn error_event(err: &AppError) -> ServerEvent {
  ServerEvent::Error {
    code: err.code().to_string(),
    message: err.public_message(),
  }
}

async fn send_event(session: &mut Session, event: &ServerEvent) -> Result<(), Closed> {
  match serde_json::to_string(event) {
    Ok(body) => session.text(body).await,
    Err(e) => {
      warn!(error = %e, "Failed to serialize chat frame.");
      Ok(())
    }
  }
}

fn close_action_for(error: &SessionError) -> CloseAction {
  match error {
    SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
      code: CloseCode::Normal,
      description: Some("heartbeat timeout".to_owned()),
    })),
    SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
      code: CloseCode::Protocol,
      description: Some("protocol error".to_owned()),
    })),
    SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
    SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
  }
}

async fn close_session_if_needed(session: Session, action: CloseAction) {
  if let CloseAction::Close(reason) = action {
    if let Err(e) = session.close(reason).await {
      warn!(error = %e, "Failed to close chat socket.");
    }
  }
}

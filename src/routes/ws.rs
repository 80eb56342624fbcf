//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::{fmt::Display, sync::Arc};
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, error, info, instrument};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "lesson_flow", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
  serve_socket(socket, &state).await;
}

/// Message loop over any socket-shaped stream/sink. Stops on close, read
/// error, or the first failed send.
async fn serve_socket<S, E>(mut socket: S, state: &AppState)
where
  S: Stream<Item = Result<Message, E>> + Sink<Message> + Unpin,
  <S as Sink<Message>>::Error: Display,
{
  info!(target: "lesson_flow", "WebSocket connected");
  while let Some(Ok(msg)) = socket.next().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "lesson_flow", kind = message_kind(&incoming), "WS received");
            handle_client_ws(incoming, state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "lesson_flow", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        if let Err(e) = socket.send(Message::Pong(payload)).await {
          error!(target: "lesson_flow", error = %e, "WS pong send error");
          break;
        }
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "lesson_flow", "WebSocket disconnected");
}

/// Tag for logs; `Debug` would print the token.
fn message_kind(msg: &ClientWsMessage) -> &'static str {
  match msg {
    ClientWsMessage::Ping => "ping",
    ClientWsMessage::StartFlow { .. } => "start_flow",
    ClientWsMessage::GetFlow { .. } => "get_flow",
    ClientWsMessage::Advance { .. } => "advance",
    ClientWsMessage::StartFinalQuiz { .. } => "start_final_quiz",
  }
}

#[instrument(level = "info", skip_all, fields(kind = message_kind(&msg)))]
pub async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  let result = match msg {
    ClientWsMessage::Ping => return ServerWsMessage::Pong,
    ClientWsMessage::StartFlow { lesson_id, token } => {
      let token = token.filter(|t| !t.trim().is_empty());
      start_flow(state, &lesson_id, token).await
    }
    ClientWsMessage::GetFlow { flow_id } => current_flow(state, &flow_id).await,
    ClientWsMessage::Advance { flow_id, answered_correctly } => {
      advance_flow(state, &flow_id, answered_correctly).await
    }
    ClientWsMessage::StartFinalQuiz { flow_id } => start_final_quiz(state, &flow_id).await,
  };

  match result {
    Ok(flow) => ServerWsMessage::Flow { flow },
    Err(e) => ServerWsMessage::Error { message: e.to_string() },
  }
}

//! WebSocket upgrade + message loop. Each connection owns at most one student
//! session; every client message gets exactly one JSON reply.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::error::{AppError, AppResult};
use crate::logic;
use crate::protocol::{session_view, ClientWsMessage, ServerWsMessage};
use crate::session::StudentSession;
use crate::state::AppState;

#[instrument(level = "info", skip(state, ws))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "readfit_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "readfit_backend", "WebSocket connected");
  let mut session: Option<StudentSession> = None;

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "readfit_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut session)
              .await
              .unwrap_or_else(|e| ServerWsMessage::Error { error: e.kind().into(), message: e.user_message() })
          }
          Err(e) => ServerWsMessage::Error { error: "validation".into(), message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "error": "internal", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "readfit_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  if let Some(s) = &session {
    info!(target: "session", id = %s.id, "WebSocket session dropped");
  }
  info!(target: "readfit_backend", "WebSocket disconnected");
}

fn active(session: &mut Option<StudentSession>) -> AppResult<&mut StudentSession> {
  session
    .as_mut()
    .ok_or_else(|| AppError::NotFound("No active session. Send `enter` with your access code first.".into()))
}

#[instrument(level = "info", skip_all)]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  session: &mut Option<StudentSession>,
) -> AppResult<ServerWsMessage> {
  Ok(match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Enter { access_code, student_name } => {
      // Entering again replaces the connection's current session.
      let s = logic::enter(state, &access_code, &student_name).await?;
      let view = session_view(&s);
      *session = Some(s);
      ServerWsMessage::Session { session: view }
    }

    ClientWsMessage::SubmitQuiz { answers } => {
      let result = logic::submit_quiz(active(session)?, &answers)?;
      ServerWsMessage::QuizResult { result }
    }

    ClientWsMessage::ChooseMission { mission } => {
      let view = logic::choose_mission(active(session)?, mission)?;
      ServerWsMessage::Session { session: view }
    }

    ClientWsMessage::StartActivity => {
      let activity = logic::start_activity(state, active(session)?).await?;
      ServerWsMessage::Activity { activity }
    }

    ClientWsMessage::Hint => ServerWsMessage::Hint { hint: logic::hint(active(session)?)? },

    ClientWsMessage::SubmitActivity { answer } => {
      let report = logic::submit_activity(state, active(session)?, &answer).await?;
      ServerWsMessage::Report { report }
    }

    ClientWsMessage::Report => ServerWsMessage::Report { report: logic::report(active(session)?)? },

    ClientWsMessage::Retry => {
      let view = logic::retry(active(session)?)?;
      ServerWsMessage::Session { session: view }
    }

    ClientWsMessage::Leave => {
      if let Some(s) = session.take() {
        info!(target: "session", id = %s.id, "WS leave");
      }
      ServerWsMessage::Left
    }
  })
}

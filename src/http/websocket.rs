//! Router directive stream.
//!
//! # Responsibilities
//! - Upgrade `GET /router/directives` to a WebSocket
//! - Forward every `RouterDirective` as a JSON text frame
//!
//! # Data Flow
//! ```text
//! SessionRoster ──broadcast──▶ directive stream ──WS text frames──▶ Router
//! ```
//!
//! # Design Decisions
//! - Subscribe before the upgrade so no directive published during the
//!   handshake is lost
//! - A lagging router skips directives rather than stalling publishers
//! - The stream closes on server shutdown

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::http::server::AppState;
use crate::lifecycle::ShutdownSignal;
use crate::router::RouterDirective;

pub async fn directives_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let directives = state.fleet.sessions.subscribe();
    let shutdown = state.shutdown.clone();
    ws.on_upgrade(move |socket| stream_directives(socket, directives, shutdown))
}

async fn stream_directives(
    mut socket: WebSocket,
    mut directives: broadcast::Receiver<RouterDirective>,
    shutdown: ShutdownSignal,
) {
    tracing::info!("Router connected to directive stream");
    let shutdown = shutdown.recv();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            directive = directives.recv() => match directive {
                Ok(directive) => {
                    let json = match serde_json::to_string(&directive) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to encode directive");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Router fell behind on directives");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("Router disconnected from directive stream");
}

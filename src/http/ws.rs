use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::state::AppState;
use crate::audio::AudioFragment;
use crate::error::TriageError;
use crate::session::{CallEvent, CallSettings};

/// Client→server frames on a live call connection.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    /// Must be the first frame; may be re-sent to update settings
    Config {
        language: Option<String>,
        noise_filtering: Option<bool>,
    },
    /// One ordered audio fragment, PCM base64-encoded
    AudioChunk {
        sequence: u64,
        pcm: String,
        #[allow(dead_code)]
        timestamp: Option<String>,
        input_level: Option<f32>,
    },
}

/// Error frame pushed when a client frame is rejected; record snapshots
/// are sent as bare flat records with no `type` tag.
#[derive(Debug, Serialize)]
struct ErrorFrame<'a> {
    r#type: &'static str,
    code: &'a str,
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Language hint; the config frame takes precedence
    pub language: Option<String>,
}

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// GET /ws/calls/:call_id
/// Upgrade to the live call stream
pub async fn call_stream(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_call(socket, state, call_id, params.language))
}

async fn handle_call(socket: WebSocket, state: AppState, call_id: String, language: Option<String>) {
    info!(%call_id, "Call stream connected");

    let (sender, mut receiver) = socket.split();
    let sender: WsSender = Arc::new(Mutex::new(sender));

    // The first frame must be config.
    let settings = match read_config_frame(&state, &mut receiver, language).await {
        Some(settings) => settings,
        None => {
            send_error_text(
                &sender,
                "bad_frame",
                "expected a config frame before any audio",
            )
            .await;
            return;
        }
    };

    let session = match state.manager.open(&call_id, settings).await {
        Ok(session) => session,
        Err(e) => {
            warn!(%call_id, error = %e, "Rejecting call stream");
            send_error(&sender, &e).await;
            return;
        }
    };

    // Forward the call's ordered snapshot sequence to the client.
    let mut snapshots = session.subscribe();
    let forward_sender = Arc::clone(&sender);
    let forward_call_id = call_id.clone();
    let forward = tokio::spawn(async move {
        loop {
            match snapshots.recv().await {
                Ok(snapshot) => {
                    let json = match serde_json::to_string(&snapshot) {
                        Ok(j) => j,
                        Err(e) => {
                            warn!(call_id = %forward_call_id, error = %e, "Snapshot serialize failed");
                            continue;
                        }
                    };
                    let mut guard = forward_sender.lock().await;
                    if guard.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                // Skipped snapshots are fine: each push is a complete
                // record, so the next one covers anything missed.
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(call_id = %forward_call_id, skipped, "Observer lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Receive loop. Idle timeout drives the same finalize path as a
    // client disconnect.
    loop {
        let msg = match timeout(state.idle_timeout, receiver.next()).await {
            Err(_) => {
                info!(%call_id, "Idle timeout, finalizing call");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                warn!(%call_id, error = %e, "Call stream error");
                break;
            }
            Ok(Some(Ok(msg))) => msg,
        };

        match msg {
            Message::Text(text) => {
                let frame: ClientFrame = match serde_json::from_str(&text) {
                    Ok(f) => f,
                    Err(e) => {
                        debug!(%call_id, error = %e, "Unparseable client frame");
                        send_error_text(&sender, "bad_frame", "unparseable frame").await;
                        continue;
                    }
                };

                if handle_frame(&state, &call_id, &sender, frame).await.is_break() {
                    break;
                }
            }
            Message::Ping(data) => {
                let mut guard = sender.lock().await;
                let _ = guard.send(Message::Pong(data)).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    forward.abort();

    match state.manager.close(&call_id).await {
        Ok(record) => {
            info!(
                %call_id,
                class = record.predicted_class.as_str(),
                severity = record.severity.as_str(),
                "Call finalized on disconnect"
            );
            // Push the finalized snapshot if the client is still there
            // (idle timeout leaves the socket open).
            if let Ok(json) = serde_json::to_string(&record) {
                let mut guard = sender.lock().await;
                let _ = guard.send(Message::Text(json)).await;
            }
        }
        // Already closed elsewhere; nothing left to do.
        Err(TriageError::UnknownCall(_)) => {}
        Err(e) => warn!(%call_id, error = %e, "Close failed"),
    }

    info!(%call_id, "Call stream disconnected");
}

async fn read_config_frame(
    state: &AppState,
    receiver: &mut SplitStream<WebSocket>,
    language_param: Option<String>,
) -> Option<CallSettings> {
    loop {
        let msg = timeout(state.idle_timeout, receiver.next()).await.ok()??;
        match msg.ok()? {
            Message::Text(text) => {
                return match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(ClientFrame::Config {
                        language,
                        noise_filtering,
                    }) => Some(CallSettings {
                        language: language.or(language_param),
                        noise_filtering: noise_filtering.unwrap_or(false),
                    }),
                    _ => None,
                };
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            _ => return None,
        }
    }
}

/// Route one parsed frame. Returns `Break` when the call must finalize.
async fn handle_frame(
    state: &AppState,
    call_id: &str,
    sender: &WsSender,
    frame: ClientFrame,
) -> ControlFlow<()> {
    match frame {
        ClientFrame::Config {
            language,
            noise_filtering,
        } => {
            let settings = CallSettings {
                language,
                noise_filtering: noise_filtering.unwrap_or(false),
            };
            if let Err(e) = state
                .manager
                .dispatch(call_id, CallEvent::Config(settings))
                .await
            {
                send_error(sender, &e).await;
            }
            ControlFlow::Continue(())
        }
        ClientFrame::AudioChunk {
            sequence,
            pcm,
            timestamp: _,
            input_level,
        } => {
            let bytes = match BASE64.decode(pcm.as_bytes()) {
                Ok(b) => b,
                Err(e) => {
                    debug!(%call_id, error = %e, "Undecodable audio chunk");
                    send_error_text(sender, "bad_frame", "undecodable pcm payload").await;
                    return ControlFlow::Continue(());
                }
            };

            let fragment = AudioFragment::new(sequence, bytes, input_level.unwrap_or(0.0));

            match state
                .manager
                .dispatch(call_id, CallEvent::Audio(fragment))
                .await
            {
                Ok(()) => ControlFlow::Continue(()),
                // Over budget: reject the fragment and finalize the call.
                Err(e @ TriageError::TooLargeAudio { .. }) => {
                    send_error(sender, &e).await;
                    ControlFlow::Break(())
                }
                // Rejected fragment; the call itself continues.
                Err(e) => {
                    send_error(sender, &e).await;
                    ControlFlow::Continue(())
                }
            }
        }
    }
}

async fn send_error(sender: &WsSender, error: &TriageError) {
    send_error_text(sender, error.code(), &error.to_string()).await;
}

async fn send_error_text(sender: &WsSender, code: &str, message: &str) {
    let frame = ErrorFrame {
        r#type: "error",
        code,
        message: message.to_string(),
    };
    let Ok(json) = serde_json::to_string(&frame) else {
        return;
    };
    let mut guard = sender.lock().await;
    let _ = guard.send(Message::Text(json)).await;
}

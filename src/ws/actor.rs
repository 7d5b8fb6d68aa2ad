use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::state::AppState;
use crate::ws::protocol;
use crate::ws::ConnectionSender;

/// Ping interval: server sends WebSocket ping every 30 seconds.
/// Prevents registry leaks from abrupt disconnects.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pong timeout: if pong not received within 10 seconds after ping, close.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the actor-per-connection pattern for an admitted WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel
/// - Reader loop: processes inbound frames in arrival order, dispatching
///   each event to the relay one at a time
///
/// The mpsc sender doubles as the connection's registry entry; cloning it is
/// how fanout reaches this client.
pub async fn run_connection(socket: WebSocket, state: AppState, email: String) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    // Join the channel keyed by this connection's identity
    register_connection(&state, &email, tx.clone());

    tracing::info!(email = %email, "WebSocket actor started");

    // Spawn writer task: forwards mpsc messages to the WebSocket sink
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();

    // Spawn ping task: sends periodic pings and monitors pong responses
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // Skip the first immediate tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // Writer task has died — connection is gone
                break;
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {
                    // Pong received, continue
                }
                _ => {
                    tracing::warn!("Pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    // Reader loop: one connection's events are handled in the order received
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    protocol::handle_text_message(text.as_str(), &tx, &state, &email).await;
                }
                Message::Binary(_) => {
                    tracing::debug!(
                        email = %email,
                        "Ignoring binary frame (protocol is JSON text)"
                    );
                }
                Message::Pong(_) => {
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::info!(email = %email, reason = ?frame, "Client initiated close");
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(email = %email, error = %e, "WebSocket receive error");
                break;
            }
            None => {
                // Stream ended — client disconnected
                tracing::info!(email = %email, "WebSocket stream ended");
                break;
            }
        }
    }

    // Cleanup: abort writer and ping tasks, then leave the channel.
    // Any send the relay already accepted keeps running to completion on its
    // own task; only this connection's membership is torn down here.
    writer_handle.abort();
    ping_handle.abort();

    unregister_connection(&state, &email, &tx);

    tracing::info!(email = %email, "WebSocket actor stopped");
}

/// Writer task: receives messages from the mpsc channel and forwards them to
/// the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed — connection is broken
            break;
        }
    }
}

/// Register a connection sender in the connection registry.
fn register_connection(state: &AppState, email: &str, tx: ConnectionSender) {
    state
        .connections
        .entry(email.to_string())
        .or_default()
        .push(tx);

    let conn_count = state.connections.get(email).map(|v| v.len()).unwrap_or(0);
    tracing::debug!(
        email = %email,
        connections = conn_count,
        "Connection registered"
    );
}

/// Remove this connection from the registry, dropping the email's entry
/// entirely once its last connection is gone.
fn unregister_connection(state: &AppState, email: &str, tx: &ConnectionSender) {
    let mut remove_user = false;

    if let Some(mut connections) = state.connections.get_mut(email) {
        connections.retain(|sender| !sender.same_channel(tx));
        if connections.is_empty() {
            remove_user = true;
        }
    }

    if remove_user {
        state.connections.remove(email);
    }

    tracing::debug!(email = %email, "Connection unregistered");
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use goldroom_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::{Dispatcher, Subscription};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

const MAX_MISSED_HEARTBEATS: u8 = 2;

/// Handle a single change-feed WebSocket connection.
///
/// The client receives `Ready` immediately and nothing else until it sends
/// a `Subscribe` command; from then on it gets every row event of the
/// subscribed room and tables.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher) {
    let conn_id = Uuid::new_v4();
    let (mut sender, receiver) = socket.split();

    info!("Gateway connection {} opened", conn_id);

    if !send_event(&mut sender, &GatewayEvent::Ready { connection_id: conn_id }).await {
        return;
    }

    run_connection_loop(sender, receiver, dispatcher.clone(), conn_id).await;

    dispatcher.remove_connection(conn_id).await;
    info!("Gateway connection {} closed", conn_id);
}

async fn run_connection_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    dispatcher: Dispatcher,
    conn_id: Uuid,
) {
    // Subscribe before reading commands so no event published after a
    // Subscribed ack can be missed.
    let mut broadcast_rx = dispatcher.subscribe();
    let send_dispatcher = dispatcher.clone();

    // Replies to commands, produced by the recv task
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<GatewayEvent>();

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received;

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = broadcast_rx.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(RecvError::Lagged(n)) => {
                            warn!("Connection {} lagged by {} events", conn_id, n);
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    let wanted = send_dispatcher
                        .subscription(conn_id)
                        .await
                        .is_some_and(|sub| sub.matches(&event));
                    if !wanted {
                        continue;
                    }

                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                reply = reply_rx.recv() => {
                    let Some(event) = reply else { break };
                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= MAX_MISSED_HEARTBEATS {
                            warn!("Heartbeat timeout on {} (missed {} pongs), dropping connection", conn_id, missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Default::default())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => {
                        if let Some(reply) = handle_command(&dispatcher, conn_id, cmd).await {
                            if reply_tx.send(reply).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Connection {} bad command: {} -- raw: {}",
                            conn_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

async fn handle_command(
    dispatcher: &Dispatcher,
    conn_id: Uuid,
    cmd: GatewayCommand,
) -> Option<GatewayEvent> {
    match cmd {
        GatewayCommand::Subscribe { room_id, tables } => {
            info!(
                "Connection {} subscribing to room {} ({:?})",
                conn_id, room_id, tables
            );
            dispatcher
                .set_subscription(conn_id, Subscription::new(room_id, tables.iter().copied()))
                .await;
            debug!(
                "Room {} now has {} subscribers",
                room_id,
                dispatcher.subscriber_count(room_id).await
            );
            Some(GatewayEvent::Subscribed { room_id, tables })
        }
    }
}

/// Serialize and send one event. Returns false once the socket is unusable.
async fn send_event(sender: &mut SplitSink<WebSocket, Message>, event: &GatewayEvent) -> bool {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to serialize gateway event: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(text.into())).await.is_ok()
}

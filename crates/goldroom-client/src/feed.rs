use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use uuid::Uuid;

use goldroom_types::events::{GatewayCommand, GatewayEvent, Table};

use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens change-feed subscriptions against a server's `/gateway`.
#[derive(Debug, Clone)]
pub struct FeedClient {
    gateway_url: String,
}

impl FeedClient {
    /// `base_url` is the server's HTTP base URL; the scheme is switched to
    /// `ws`/`wss`.
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        Self {
            gateway_url: format!("{}/gateway", ws_base),
        }
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Connect and subscribe. Returns once the server acknowledged the
    /// subscription, so every row event published afterwards is delivered.
    pub async fn subscribe(&self, room_id: Uuid, tables: Vec<Table>) -> Result<Feed, ClientError> {
        let (ws, _) = connect_async(self.gateway_url.as_str()).await?;
        let (mut sink, mut stream) = ws.split();

        match next_event(&mut stream).await? {
            GatewayEvent::Ready { connection_id } => {
                debug!("Gateway ready, connection {}", connection_id)
            }
            other => warn!("Expected Ready from gateway, got {:?}", other),
        }

        let cmd = serde_json::to_string(&GatewayCommand::Subscribe { room_id, tables })?;
        sink.send(WsMessage::Text(cmd.into())).await?;

        loop {
            match next_event(&mut stream).await? {
                GatewayEvent::Subscribed { room_id: acked, tables } if acked == room_id => {
                    info!("Feed subscription active for room {} ({:?})", room_id, tables);
                    break;
                }
                other => debug!("Skipping {:?} while waiting for subscription", other),
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            // Keep the sink alive so the socket stays open.
            let _sink = sink;
            loop {
                match next_event(&mut stream).await {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(ClientError::Closed) => {
                        info!("Feed for room {} closed by server", room_id);
                        break;
                    }
                    Err(ClientError::Decode(e)) => {
                        warn!("Ignoring malformed feed event: {}", e);
                    }
                    Err(e) => {
                        warn!("Feed for room {} failed: {}", room_id, e);
                        break;
                    }
                }
            }
        });

        Ok(Feed {
            room_id,
            events: rx,
            task,
        })
    }
}

/// A live change-feed subscription. Dropping it closes the socket.
pub struct Feed {
    room_id: Uuid,
    events: mpsc::UnboundedReceiver<GatewayEvent>,
    task: JoinHandle<()>,
}

impl Feed {
    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    /// Next row event, or `None` once the connection is gone.
    pub async fn next(&mut self) -> Option<GatewayEvent> {
        self.events.recv().await
    }

    /// Next already-received event, without waiting.
    pub fn try_next(&mut self) -> Option<GatewayEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        debug!("Cleaning up feed subscription for room {}", self.room_id);
        self.task.abort();
    }
}

/// Read frames until the next JSON event. Pings are answered by tungstenite.
async fn next_event(stream: &mut SplitStream<WsStream>) -> Result<GatewayEvent, ClientError> {
    while let Some(msg) = stream.next().await {
        match msg? {
            WsMessage::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
            WsMessage::Close(_) => return Err(ClientError::Closed),
            _ => {}
        }
    }
    Err(ClientError::Closed)
}

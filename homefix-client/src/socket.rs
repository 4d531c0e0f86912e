use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Notify};
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use homefix_core::channel::RoomRegistry;
use homefix_core::{RealtimeChannel, Room, Subscription};
use homefix_shared::{InboundEvent, OutboundEvent};
use homefix_store::Config;

use crate::codec::{socket_url, Packet};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const INBOUND_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Base URL of the backend or a full socket endpoint.
    pub url: String,
    pub reconnect_delay: Duration,
    /// None = retry forever. Resets after each successful connection.
    pub max_reconnect_attempts: Option<usize>,
}

impl SocketConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.realtime_url(),
            reconnect_delay: config.realtime.reconnect_delay(),
            max_reconnect_attempts: config.realtime.max_reconnect_attempts,
        }
    }
}

type Outbox = Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>;

/// Socket.IO client implementing [`RealtimeChannel`].
///
/// One connection per instance. Joined rooms are announced again after every
/// reconnect. Nothing is queued while offline.
pub struct SocketChannel {
    config: SocketConfig,
    registry: Arc<RoomRegistry>,
    tx: Outbox,
    connected: Arc<AtomicBool>,
    connected_notify: Arc<Notify>,
    started: AtomicBool,
    shutdown: Arc<Notify>,
    shutdown_flag: Arc<AtomicBool>,
}

impl SocketChannel {
    pub fn new(config: SocketConfig) -> Self {
        Self {
            config,
            registry: Arc::new(RoomRegistry::new(INBOUND_CAPACITY)),
            tx: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
            connected_notify: Arc::new(Notify::new()),
            started: AtomicBool::new(false),
            shutdown: Arc::new(Notify::new()),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns the connection task. Calling it again is a no-op.
    pub fn connect(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let url = socket_url(&self.config.url);
        let reconnect_delay = self.config.reconnect_delay;
        let max_attempts = self.config.max_reconnect_attempts;
        let registry = self.registry.clone();
        let tx_holder = self.tx.clone();
        let connected = self.connected.clone();
        let connected_notify = self.connected_notify.clone();
        let shutdown = self.shutdown.clone();
        let shutdown_flag = self.shutdown_flag.clone();

        tokio::spawn(async move {
            let mut attempts: usize = 0;

            loop {
                if shutdown_flag.load(Ordering::SeqCst) {
                    break;
                }
                if let Some(max) = max_attempts {
                    if attempts >= max {
                        warn!(attempts, "max reconnection attempts reached, giving up");
                        break;
                    }
                }
                attempts += 1;

                debug!(url = %url, attempt = attempts, "connecting to socket");
                let ws_stream = match time::timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(url.as_str())).await {
                    Ok(Ok((stream, _))) => stream,
                    Ok(Err(e)) => {
                        warn!(attempt = attempts, error = %e, "socket connection failed, will retry");
                        wait_reconnect(&shutdown, reconnect_delay).await;
                        continue;
                    }
                    Err(_) => {
                        warn!(attempt = attempts, "socket connect timed out ({}s), will retry", CONNECT_TIMEOUT.as_secs());
                        wait_reconnect(&shutdown, reconnect_delay).await;
                        continue;
                    }
                };
                attempts = 0;

                let (mut write, mut read) = ws_stream.split();
                let (send_tx, mut send_rx) = mpsc::unbounded_channel::<String>();
                set_outbox(&tx_holder, Some(send_tx.clone()));

                let write_task = async {
                    while let Some(frame) = send_rx.recv().await {
                        if write.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                };

                let read_task = async {
                    while let Some(msg) = read.next().await {
                        let text = match msg {
                            Ok(Message::Text(text)) => text,
                            Ok(Message::Close(_)) => break,
                            Ok(_) => continue,
                            Err(e) => {
                                warn!(error = %e, "socket read error");
                                break;
                            }
                        };
                        let frame: &str = &text;
                        let packet = match Packet::decode(frame) {
                            Ok(packet) => packet,
                            Err(e) => {
                                warn!(error = %e, "dropping undecodable frame");
                                continue;
                            }
                        };

                        match packet {
                            Packet::Open(_) => {
                                let _ = send_tx.send(Packet::Connect.encode());
                            }
                            Packet::Ping => {
                                let _ = send_tx.send(Packet::Pong.encode());
                            }
                            Packet::Connect => {
                                connected.store(true, Ordering::SeqCst);
                                let rooms = registry.joined();
                                for room in &rooms {
                                    let _ = send_tx.send(Packet::event(&room.join_event()).encode());
                                }
                                info!(rooms = rooms.len(), "socket connected");
                                connected_notify.notify_waiters();
                            }
                            Packet::Event { name, payload } => match InboundEvent::decode(&name, payload) {
                                Ok(Some(event)) => registry.dispatch(event),
                                Ok(None) => debug!(event = %name, "ignoring unknown event"),
                                Err(e) => warn!(event = %name, error = %e, "malformed event payload"),
                            },
                            Packet::ConnectError(body) => {
                                warn!(%body, "namespace connect refused");
                                break;
                            }
                            Packet::Close | Packet::Disconnect => break,
                            Packet::Pong | Packet::Noop => {}
                        }
                    }
                };

                tokio::select! {
                    _ = write_task => {},
                    _ = read_task => {},
                    _ = shutdown.notified() => {
                        connected.store(false, Ordering::SeqCst);
                        set_outbox(&tx_holder, None);
                        return;
                    }
                }

                connected.store(false, Ordering::SeqCst);
                set_outbox(&tx_holder, None);
                info!("socket disconnected, scheduling reconnect");

                wait_reconnect(&shutdown, reconnect_delay).await;
            }
        });
    }

    /// Waits until the namespace handshake has completed.
    pub async fn wait_connected(&self, timeout: Duration) -> bool {
        let notified = self.connected_notify.notified();
        if self.is_connected() {
            return true;
        }
        time::timeout(timeout, notified).await.is_ok()
    }

    /// Disconnects and stops reconnecting.
    pub fn close(&self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
    }
}

impl RealtimeChannel for SocketChannel {
    fn join(&self, room: Room) -> Subscription {
        let subscription = self.registry.insert(room.clone());
        if !self.publish(room.join_event()) {
            debug!(room = ?room, "join deferred until connected");
        }
        subscription
    }

    fn leave(&self, room: &Room) {
        self.registry.remove(room);
    }

    fn publish(&self, event: OutboundEvent) -> bool {
        if !self.is_connected() {
            warn!(event = event.name(), "socket offline, event dropped");
            return false;
        }
        let frame = Packet::event(&event).encode();
        let sent = self
            .tx
            .lock()
            .ok()
            .and_then(|tx| tx.as_ref().map(|tx| tx.send(frame).is_ok()))
            .unwrap_or(false);
        if sent {
            debug!(event = event.name(), "event emitted");
        }
        sent
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Drop for SocketChannel {
    fn drop(&mut self) {
        self.close();
    }
}

fn set_outbox(holder: &Outbox, tx: Option<mpsc::UnboundedSender<String>>) {
    if let Ok(mut guard) = holder.lock() {
        *guard = tx;
    }
}

async fn wait_reconnect(shutdown: &Notify, delay: Duration) {
    debug!(delay_ms = delay.as_millis() as u64, "waiting before reconnect");
    tokio::select! {
        _ = time::sleep(delay) => {},
        _ = shutdown.notified() => {},
    }
}

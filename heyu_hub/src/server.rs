//! Hub lifecycle: start/stop/shutdown plus one accept loop per listen
//! endpoint.
//!
//! Grounded on `hotaru_core::app::application::App::run_app_loop`: bind,
//! spawn a signal task that feeds a channel, then `select!` between
//! `listener.accept()` and the shutdown signal. Extended to two signal
//! classes (SIGINT/SIGTERM → graceful stop, SIGUSR1 → abrupt shutdown) per
//! §4.3, and to multiple listen endpoints.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use heyu_proto::Message;
use heyu_transport::connect::accept as tls_accept;
use heyu_transport::endpoint::Endpoint;
use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::connection::handle_connection;
use crate::error::{HubError, Result};
use crate::registry::SubscriberRegistry;

enum Supervisor {
    Stop,
    Shutdown,
}

pub struct HubServer {
    registry: SubscriberRegistry,
    tls_config: Option<Arc<ServerConfig>>,
    stopping: AtomicBool,
}

impl HubServer {
    pub fn new(tls_config: Option<Arc<ServerConfig>>) -> Arc<Self> {
        Arc::new(HubServer {
            registry: SubscriberRegistry::new(),
            tls_config,
            stopping: AtomicBool::new(false),
        })
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Fans `msg` out to every current subscriber. Holds the registry lock
    /// only long enough to snapshot it; the encode-and-send work for each
    /// subscriber runs concurrently with the lock already released (§5).
    pub async fn fan_out(&self, msg: &Message) {
        let subscribers = self.registry.snapshot();
        let writes = subscribers.into_iter().map(|(id, version, sender)| {
            let msg = msg.clone();
            async move {
                match msg.encode_for_version(version) {
                    Ok(frame) => {
                        let _ = sender.send(frame);
                    }
                    Err(e) => {
                        tracing::debug!(subscriber = id, version, error = %e, "skipping subscriber: unencodable version");
                    }
                }
            }
        });
        futures::future::join_all(writes).await;
    }

    /// Binds every endpoint and runs its accept loop until *stop* or
    /// *shutdown* is requested.
    pub async fn start(self: Arc<Self>, endpoints: &[Endpoint]) -> Result<()> {
        if endpoints.is_empty() {
            return Err(HubError::NoListenEndpoints);
        }

        let (supervisor_tx, mut supervisor_rx) = mpsc::unbounded_channel::<Supervisor>();
        spawn_signal_handlers(supervisor_tx);

        let mut listeners = Vec::new();
        for endpoint in endpoints {
            let listener = TcpListener::bind(endpoint.to_socket_addr_string()).await?;
            info!(endpoint = %endpoint, "listening");
            listeners.push(listener);
        }

        loop {
            let accept_any = async {
                let (stream, addr) = select_accept(&listeners).await;
                (stream, addr)
            };

            tokio::select! {
                (accept_result, addr) = accept_any => {
                    match accept_result {
                        Ok(tcp) => {
                            let hub = self.clone();
                            let tls_config = self.tls_config.clone();
                            tokio::spawn(async move {
                                match tls_accept(tcp, tls_config).await {
                                    Ok(stream) => handle_connection(hub, stream, addr.ip()).await,
                                    Err(e) => error!(error = %e, "TLS handshake failed"),
                                }
                            });
                        }
                        Err(e) => error!(error = %e, "accept failed"),
                    }
                }
                cmd = supervisor_rx.recv() => {
                    match cmd {
                        Some(Supervisor::Stop) | None => {
                            info!("stopping: no longer accepting new connections");
                            break;
                        }
                        Some(Supervisor::Shutdown) => {
                            info!("shutting down abruptly");
                            self.registry.snapshot().into_iter().for_each(|(id, _, _)| {
                                self.registry.unsubscribe(id);
                            });
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Relaxed)
    }
}

async fn select_accept(
    listeners: &[TcpListener],
) -> (std::io::Result<tokio::net::TcpStream>, std::net::SocketAddr) {
    // A small manual select over N listeners: each is polled by a future
    // in an unordered FuturesUnordered-like race via select_all.
    let futs = listeners.iter().map(|l| Box::pin(l.accept()));
    let (result, _index, _rest) = futures::future::select_all(futs).await;
    match result {
        Ok((stream, addr)) => (Ok(stream), addr),
        Err(e) => {
            let placeholder: std::net::SocketAddr = ([0, 0, 0, 0], 0).into();
            (Err(e), placeholder)
        }
    }
}

fn spawn_signal_handlers(tx: mpsc::UnboundedSender<Supervisor>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigusr1 = signal(SignalKind::user_defined1()).expect("failed to install SIGUSR1 handler");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sigint.recv() => { let _ = tx.send(Supervisor::Stop); }
                    _ = sigterm.recv() => { let _ = tx.send(Supervisor::Stop); }
                    _ = sigusr1.recv() => { let _ = tx.send(Supervisor::Shutdown); }
                    else => break,
                }
            }
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(Supervisor::Stop);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fan_out_skips_subscribers_above_max_encode_version() {
        let hub = HubServer::new(None);
        let mut receivers = Vec::new();
        for version in [0u8, 1, 2, 3, 4] {
            let (tx, rx) = mpsc::unbounded_channel();
            let id = hub.registry().next_connection_id();
            hub.registry().subscribe(id, version, tx);
            receivers.push((version, rx));
        }

        let msg = Message::notify("chat", "hi", "there");
        hub.fan_out(&msg).await;

        for (version, mut rx) in receivers {
            let got = rx.try_recv();
            if version <= 2 {
                assert!(got.is_ok(), "version {version} should have received a frame");
            } else {
                assert!(got.is_err(), "version {version} should have been skipped");
            }
        }
    }

    #[tokio::test]
    async fn fan_out_reaches_every_live_subscriber() {
        let hub = HubServer::new(None);
        let mut receivers = Vec::new();
        for _ in 0..5 {
            let (tx, rx) = mpsc::unbounded_channel();
            let id = hub.registry().next_connection_id();
            hub.registry().subscribe(id, 0, tx);
            receivers.push(rx);
        }

        hub.fan_out(&Message::notify("chat", "hi", "there")).await;

        for mut rx in receivers {
            assert!(rx.try_recv().is_ok());
        }
    }
}

//! The notifier's connection state machine and reconnect loop.
//!
//! Grounded on `heyu.notifier.NotifierApplication`/`NotifierServer` for the
//! state transitions, and on `ConnectionBuilder::connect`'s retry-with-sleep
//! shape (here generalized via [`crate::backoff::Backoff`]) for the outer
//! loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use heyu_proto::{Message, MessageBody};
use heyu_transport::endpoint::Endpoint;
use heyu_transport::{connect, framed};
use rustls::ClientConfig;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::events::{EventQueue, NotifierEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Run,
    Stop,
    Shutdown,
}

/// Outcome of one connect-subscribe-read session, deciding whether the
/// outer loop reconnects or exits entirely.
enum SessionOutcome {
    Reconnect,
    Stop,
}

pub struct NotifierClient {
    endpoint: Endpoint,
    tls_config: Option<Arc<ClientConfig>>,
    events: EventQueue,
    control: watch::Receiver<Control>,
}

impl NotifierClient {
    pub fn new(
        endpoint: Endpoint,
        tls_config: Option<Arc<ClientConfig>>,
        events: EventQueue,
        control: watch::Receiver<Control>,
    ) -> Self {
        NotifierClient {
            endpoint,
            tls_config,
            events,
            control,
        }
    }

    /// Runs the reconnect loop until a `Stop`/`Shutdown` control signal is
    /// observed. Each connection attempt is timed; the elapsed duration
    /// drives [`Backoff`] per spec.md §4.4.
    pub async fn run(mut self) {
        let mut backoff = Backoff::new(Duration::from_secs(300), Duration::from_secs(30), 5);

        loop {
            if matches!(*self.control.borrow(), Control::Stop | Control::Shutdown) {
                break;
            }

            let started = Instant::now();
            let outcome = self.one_session().await;
            let elapsed = started.elapsed();

            self.events.push(NotifierEvent::Disconnected);

            match outcome {
                SessionOutcome::Stop => break,
                SessionOutcome::Reconnect => {}
            }

            if matches!(*self.control.borrow(), Control::Stop | Control::Shutdown) {
                break;
            }

            let sleep_for = backoff.record_attempt(elapsed);
            debug!(sleep_secs = sleep_for.as_secs(), "reconnecting after backoff");
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = self.control.changed() => {
                    if matches!(*self.control.borrow(), Control::Stop | Control::Shutdown) {
                        break;
                    }
                }
            }
        }

        // An abrupt shutdown discards whatever is still queued; a graceful
        // stop lets the sink finish draining what it already has.
        if matches!(*self.control.borrow(), Control::Shutdown) {
            self.events.clear();
        }
        self.events.push(NotifierEvent::Shutdown);
    }

    async fn one_session(&mut self) -> SessionOutcome {
        let addr = self.endpoint.to_socket_addr_string();
        let stream = match connect::connect(
            &addr,
            &self.endpoint.host,
            self.tls_config.clone(),
            Duration::from_secs(30),
        )
        .await
        {
            Ok(stream) => stream,
            Err(e) => {
                self.events.push(NotifierEvent::Error(e.to_string()));
                return SessionOutcome::Reconnect;
            }
        };

        let mut transport = framed(stream);
        if transport.send(Message::subscribe().to_frame()).await.is_err() {
            return SessionOutcome::Reconnect;
        }

        // AWAIT_SUBSCRIBED: the first frame back must be `subscribed`.
        let first = match transport.next().await {
            Some(Ok(frame)) => frame,
            _ => return SessionOutcome::Reconnect,
        };
        match Message::decode(&first) {
            Ok(msg) if matches!(msg.body(), MessageBody::Subscribed) => {
                self.events.push(NotifierEvent::Connected);
            }
            _ => return SessionOutcome::Reconnect,
        }

        loop {
            tokio::select! {
                frame = transport.next() => {
                    match frame {
                        Some(Ok(bytes)) => match Message::decode(&bytes) {
                            Ok(msg) => match msg.body() {
                                MessageBody::Notify { .. } => {
                                    self.events.push(NotifierEvent::Notification(msg.clone()));
                                }
                                MessageBody::Goodbye => return SessionOutcome::Reconnect,
                                MessageBody::Error { reason } => {
                                    self.events.push(NotifierEvent::Error(reason.clone()));
                                    // Matches `NotifierApplication.recv_frame`'s error branch:
                                    // the whole notifier stops, it does not reconnect.
                                    return SessionOutcome::Stop;
                                }
                                _ => {
                                    debug!(msg_type = msg.msg_type(), "ignoring unrecognized message on subscribed channel");
                                }
                            },
                            Err(e) => {
                                self.events.push(NotifierEvent::Error(e.to_string()));
                                return SessionOutcome::Reconnect;
                            }
                        },
                        Some(Err(e)) => {
                            warn!(error = %e, "transport error");
                            return SessionOutcome::Reconnect;
                        }
                        None => return SessionOutcome::Reconnect,
                    }
                }
                changed = self.control.changed() => {
                    if changed.is_err() {
                        continue;
                    }
                    match *self.control.borrow() {
                        Control::Stop => {
                            let _ = transport.send(Message::goodbye().to_frame()).await;
                            return SessionOutcome::Stop;
                        }
                        Control::Shutdown => {
                            info!("abrupt shutdown: dropping connection without goodbye");
                            return SessionOutcome::Stop;
                        }
                        Control::Run => {}
                    }
                }
            }
        }
    }
}

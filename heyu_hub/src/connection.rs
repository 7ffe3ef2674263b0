//! Per-connection state machine: UNCLASSIFIED → (notify | subscribe |
//! goodbye | unknown) → CLOSED or PERSISTENT.
//!
//! Grounded on `heyu.hub.HubApplication.recv_frame`/`notify`/`subscribe`/
//! `disconnect`, and on `hotaru_core::app::application::App::
//! handle_connection`'s pattern of spawning one task per accepted
//! connection, wrapped in `tokio::select!` against a timeout.

use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use heyu_proto::{Message, MessageBody};
use heyu_transport::{framed, TcpOrTlsStream};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::hostname::resolve_origin_host;
use crate::server::HubServer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Unclassified,
    Persistent,
}

pub async fn handle_connection(hub: Arc<HubServer>, stream: TcpOrTlsStream, peer_ip: IpAddr) {
    let connection_id = hub.registry().next_connection_id();
    let (mut sink, mut source) = framed(stream).split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sink.send(frame).await {
                warn!(connection_id, error = %e, "failed writing frame, dropping connection");
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut state = ConnectionState::Unclassified;
    let mut negotiated_version: u8 = 0;

    while let Some(frame_result) = source.next().await {
        let frame = match frame_result {
            Ok(frame) => frame,
            Err(e) => {
                warn!(connection_id, error = %e, "transport error reading frame");
                break;
            }
        };

        let decoded = match Message::decode(&frame) {
            Ok(m) => m,
            Err(e) => {
                debug!(connection_id, error = %e, "malformed PDU");
                let _ = tx.send(Message::error("invalid PDU").to_frame());
                break;
            }
        };

        negotiated_version = decoded.version();

        match (state, decoded.body()) {
            (ConnectionState::Unclassified, MessageBody::Notify { .. }) => {
                handle_notify(&hub, &tx, peer_ip, &decoded).await;
                break;
            }
            (ConnectionState::Unclassified, MessageBody::Subscribe) => {
                hub.registry().subscribe(connection_id, negotiated_version, tx.clone());
                let _ = tx.send(Message::subscribed().to_frame());
                state = ConnectionState::Persistent;
            }
            (ConnectionState::Unclassified, MessageBody::Goodbye) => break,
            (ConnectionState::Persistent, MessageBody::Goodbye) => {
                let _ = tx.send(Message::goodbye().to_frame());
                break;
            }
            (ConnectionState::Persistent, _) => {
                // Ignored: a persistent subscriber sends nothing else of
                // substance once subscribed.
            }
            (ConnectionState::Unclassified, _) => {
                debug!(connection_id, msg_type = decoded.msg_type(), "unrecognized protocol message");
                let _ = tx.send(
                    Message::error(format!("unrecognized message type '{}'", decoded.msg_type())).to_frame(),
                );
                break;
            }
        }
    }

    hub.registry().unsubscribe(connection_id);
    drop(tx);
    let _ = writer.await;
    debug!(connection_id, "connection closed");
}

async fn handle_notify(
    hub: &Arc<HubServer>,
    tx: &mpsc::UnboundedSender<Bytes>,
    peer_ip: IpAddr,
    decoded: &Message,
) {
    let MessageBody::Notify {
        app_name,
        summary,
        body,
        urgency,
        category,
        id,
    } = decoded.body()
    else {
        unreachable!("caller already matched Notify");
    };

    let origin_host = resolve_origin_host(peer_ip);
    let rewritten_name = format!("[{}]{}", origin_host, app_name);
    let notify_id = id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut fanned = Message::notify(rewritten_name, summary.clone(), body.clone())
        .with_urgency(*urgency)
        .with_id(notify_id.clone());
    if let Some(category) = category {
        fanned = fanned.with_category(category.clone());
    }

    hub.fan_out(&fanned).await;

    let _ = tx.send(Message::accepted(notify_id).to_frame());
}

//! WebSocket transport
//!
//! One task per connection reads frames and hands them to the relay; a second
//! task drains the connection's `Outbox` into the socket. The relay lock is
//! only taken for the synchronous relay call and never held across an
//! `.await`.
//!
//! With an idle timeout configured, the writer also pings the client every
//! half timeout. A live client answers with a pong, which counts as inbound
//! traffic, so only unresponsive peers hit the timeout.
//!
//! The close path runs exactly once per connection no matter which side
//! notices first: the reader (close frame, socket error, idle timeout) or
//! the writer (socket write failure).

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, interval_at, timeout};
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::client::{BackpressureHook, LogBackpressure, Outbox};
use crate::config::RelaySettings;
use crate::message::OutboundEvent;
use crate::relay::handshake::client_name_from_query;
use crate::relay::{SharedRelay, lock as lock_relay};
use crate::utils::RelayError;

/// Sent to a connection whose admission was refused.
const REJECTED_MESSAGE: &str = "Connection id already in use";

pub async fn start_websocket_server(
    addr: String,
    relay: SharedRelay,
    settings: RelaySettings,
) -> Result<(), RelayError> {
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket relay listening on ws://{addr}");

    serve(listener, relay, settings, Arc::new(LogBackpressure)).await;
    Ok(())
}

/// Accept loop. Runs until the task is dropped.
pub async fn serve(
    listener: TcpListener,
    relay: SharedRelay,
    settings: RelaySettings,
    hook: Arc<dyn BackpressureHook>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };

        let relay = relay.clone();
        let settings = settings.clone();
        let hook = hook.clone();
        spawn(handle_connection(stream, peer, relay, settings, hook));
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    relay: SharedRelay,
    settings: RelaySettings,
    hook: Arc<dyn BackpressureHook>,
) {
    let mut client_name = None;
    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        debug!(%peer, uri = %req.uri(), "upgrade request");
        client_name = client_name_from_query(req.uri().query());
        Ok(resp)
    };

    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(settings.max_payload_bytes))
        .max_frame_size(Some(settings.max_payload_bytes));

    let ws_stream = match accept_hdr_async_with_config(stream, callback, Some(ws_config)).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake error");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let outbox = Outbox::with_backpressure(tx, settings.backpressure_threshold, hook);
    let gauge = outbox.gauge();

    let admitted = lock_relay(&relay).open(client_name.as_deref(), outbox);
    let client_id = match admitted {
        Ok(admission) => admission.id,
        Err(e) => {
            warn!(%peer, error = %e, "rejecting connection");
            if let Ok(frame) = OutboundEvent::error(REJECTED_MESSAGE).to_ws() {
                let _ = ws_sender.send(frame).await;
            }
            let _ = ws_sender.close().await;
            return;
        }
    };

    let cleanup_called = Arc::new(AtomicBool::new(false));

    let do_cleanup = {
        let relay = relay.clone();
        let client_id = client_id.clone();
        let cleanup_called = cleanup_called.clone();

        move || {
            if !cleanup_called.swap(true, Ordering::SeqCst) {
                lock_relay(&relay).close(&client_id);
            }
        }
    };

    let idle = (settings.idle_timeout_secs > 0).then(|| Duration::from_secs(settings.idle_timeout_secs));

    {
        let client_id = client_id.clone();
        let do_cleanup = do_cleanup.clone();
        let mut keepalive = idle.map(|limit| {
            let period = limit / 2;
            interval_at(Instant::now() + period, period)
        });

        spawn(async move {
            loop {
                let msg = tokio::select! {
                    queued = rx.recv() => match queued {
                        Some(msg) => {
                            gauge.written();
                            msg
                        }
                        None => break,
                    },
                    _ = tick(&mut keepalive) => WsMessage::Ping(Default::default()),
                };

                if let Err(e) = ws_sender.send(msg).await {
                    debug!(connection_id = %client_id, error = %e, "failed to write frame");
                    break;
                }
            }

            let _ = ws_sender.close().await;
            do_cleanup();
            debug!(connection_id = %client_id, "send loop closed");
        });
    }

    loop {
        let next = match idle {
            Some(limit) => match timeout(limit, ws_receiver.next()).await {
                Ok(next) => next,
                Err(_) => {
                    info!(connection_id = %client_id, "idle timeout");
                    break;
                }
            },
            None => ws_receiver.next().await,
        };

        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                debug!(connection_id = %client_id, error = %e, "read error");
                break;
            }
            None => break,
        };

        match msg {
            WsMessage::Text(text) => lock_relay(&relay).handle_text(&client_id, text.as_str()),
            WsMessage::Binary(bytes) => lock_relay(&relay).handle_bytes(&client_id, &bytes),
            WsMessage::Close(frame) => {
                debug!(connection_id = %client_id, ?frame, "close frame received");
                break;
            }
            // protocol ping/pong is answered by tungstenite
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }

    do_cleanup();
}

/// Next keepalive tick; never resolves when keepalive is off.
async fn tick(keepalive: &mut Option<Interval>) {
    match keepalive {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

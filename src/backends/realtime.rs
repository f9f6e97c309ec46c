//! Listener for the hosted backend's realtime channel.
//!
//! The backend pushes row changes over a websocket speaking the Phoenix
//! channel protocol. The store only needs to know *that* something changed,
//! so every change message collapses into a bare notification.

use crate::error::{Result, StoreError};
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

const JOIN_REF: &str = "1";

#[derive(Debug, Deserialize)]
struct ChannelMessage {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

/// Websocket endpoint derived from the REST base URL.
pub fn endpoint(base: &Url, key: &str) -> Result<Url> {
    let mut url = base
        .join("realtime/v1/websocket")
        .map_err(|e| StoreError::Config(format!("invalid backend URL: {}", e)))?;

    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(StoreError::Config(format!(
                "unsupported backend scheme: {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| StoreError::Config("cannot derive realtime endpoint".to_string()))?;
    url.query_pairs_mut()
        .append_pair("apikey", key)
        .append_pair("vsn", "1.0.0");
    Ok(url)
}

/// Whether a raw channel frame reports a row change.
pub fn is_change_event(frame: &str) -> bool {
    match serde_json::from_str::<ChannelMessage>(frame) {
        Ok(message) => matches!(
            message.event.as_str(),
            "postgres_changes" | "INSERT" | "UPDATE" | "DELETE"
        ),
        Err(e) => {
            debug!("Ignoring unparseable realtime frame: {}", e);
            false
        }
    }
}

/// Outcome of our `phx_join` if `frame` is the server's reply to it.
///
/// `Some(Err(reason))` means the subscription was refused, for example
/// because of a bad API key.
pub fn join_reply(frame: &str) -> Option<std::result::Result<(), String>> {
    let message: ChannelMessage = serde_json::from_str(frame).ok()?;
    if message.event != "phx_reply" || message.reference.as_deref() != Some(JOIN_REF) {
        return None;
    }

    match message.payload.get("status").and_then(|s| s.as_str()) {
        Some("ok") => Some(Ok(())),
        status => {
            let reason = message
                .payload
                .get("response")
                .map(|r| r.to_string())
                .unwrap_or_else(|| format!("status {}", status.unwrap_or("missing")));
            Some(Err(reason))
        }
    }
}

fn reconnect_delay(attempt: u32) -> Duration {
    let secs = 1u64 << attempt.min(5);
    Duration::from_secs(secs).min(MAX_RECONNECT_DELAY)
}

/// Keep a subscription to `table` open until `changes` is closed.
pub async fn run(endpoint: Url, table: &'static str, changes: mpsc::Sender<()>) {
    let mut attempt = 0u32;
    loop {
        match listen(&endpoint, table, &changes).await {
            Ok(()) => {
                debug!("Realtime channel for {} closed", table);
                attempt = 0;
            }
            Err(e) => {
                warn!("Realtime channel for {} failed: {}", table, e);
                attempt = attempt.saturating_add(1);
            }
        }

        if changes.is_closed() {
            break;
        }
        tokio::time::sleep(reconnect_delay(attempt)).await;
    }
}

async fn listen(endpoint: &Url, table: &str, changes: &mpsc::Sender<()>) -> Result<()> {
    let (socket, _) = tokio_tungstenite::connect_async(endpoint.as_str()).await?;
    let (mut sink, mut stream) = socket.split();

    let topic = format!("realtime:public:{}", table);
    let join = json!({
        "topic": topic,
        "event": "phx_join",
        "payload": {
            "config": {
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": table }
                ]
            }
        },
        "ref": JOIN_REF,
    });
    sink.send(Message::Text(join.to_string())).await?;
    debug!("Joining realtime channel for {}", table);

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut next_ref = 2u64;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                let beat = json!({
                    "topic": "phoenix",
                    "event": "heartbeat",
                    "payload": {},
                    "ref": next_ref.to_string(),
                });
                next_ref += 1;
                sink.send(Message::Text(beat.to_string())).await?;
            }
            frame = stream.next() => match frame {
                None => return Ok(()),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Message::Text(text))) => match join_reply(&text) {
                    Some(Ok(())) => info!("Subscribed to realtime changes on {}", table),
                    Some(Err(reason)) => {
                        warn!("Realtime subscription to {} rejected: {}", table, reason);
                        return Err(StoreError::JoinRejected(reason));
                    }
                    None => {
                        if is_change_event(&text) && changes.send(()).await.is_err() {
                            return Ok(());
                        }
                    }
                },
                Some(Ok(Message::Close(_))) => return Ok(()),
                Some(Ok(_)) => {}
            },
            _ = changes.closed() => return Ok(()),
        }
    }
}

//! WebSocket transport for the live feed.
//!
//! `GET /ws/{channel}` upgrades the connection and subscribes it to the named broadcast
//! channel. Every event is forwarded as one JSON text frame. The feed is one-way: client
//! text/binary frames are ignored, pings are answered.
//!
//! The server pings every `ws_heartbeat_interval`. Any client frame counts as a sign of
//! life; a client silent for `ws_client_timeout` is closed so its subscription is released.

use std::time::Duration;

use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::{CloseCode, CloseReason, Message, MessageStream, Session};
use futures_util::StreamExt;
use serde_json::json;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::broadcast::{Broadcaster, Channel, Subscription};
use crate::config::Config;

#[derive(Debug, Clone, Copy)]
pub struct Heartbeat {
    pub interval: Duration,
    pub client_timeout: Duration,
}

impl Heartbeat {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.ws_heartbeat_interval,
            client_timeout: config.ws_client_timeout,
        }
    }

    fn expired(&self, last_seen: Instant, now: Instant) -> bool {
        now.saturating_duration_since(last_seen) > self.client_timeout
    }
}

pub async fn subscribe(
    req: HttpRequest,
    body: web::Payload,
    path: web::Path<String>,
    broadcaster: web::Data<Broadcaster>,
    config: web::Data<Config>,
) -> actix_web::Result<HttpResponse> {
    let channel = match path.parse::<Channel>() {
        Ok(channel) => channel,
        Err(_) => {
            debug!(channel = %path, "WebSocket rejected: unknown channel");
            return Ok(HttpResponse::NotFound().json(json!({
                "success": false,
                "message": "Unknown channel"
            })));
        }
    };

    let (response, session, msg_stream) = actix_ws::handle(&req, body)?;

    // subscribe before returning so nothing published after the upgrade is missed
    let subscription = broadcaster.subscribe(channel);
    let connection_id = Uuid::new_v4().to_simple().to_string();

    info!(
        connection_id = %connection_id,
        channel = channel.as_ref(),
        subscribers = broadcaster.subscriber_count(channel),
        "Live feed connected"
    );

    actix_web::rt::spawn(forward_events(
        connection_id,
        session,
        msg_stream,
        subscription,
        Heartbeat::from_config(&config),
    ));

    Ok(response)
}

/// Runs for the lifetime of one connection. A slow client only stalls its own task; the
/// broadcaster drops whatever it falls behind on.
async fn forward_events(
    connection_id: String,
    mut session: Session,
    mut msg_stream: MessageStream,
    mut subscription: Subscription,
    heartbeat: Heartbeat,
) {
    let mut ticker = tokio::time::interval(heartbeat.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick fires immediately
    ticker.tick().await;
    let mut last_seen = Instant::now();

    let close_reason = loop {
        tokio::select! {
            event = subscription.next_event() => match event {
                Some(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            error!(connection_id = %connection_id, error = %e, "Failed to serialize live event");
                            continue;
                        }
                    };
                    if session.text(payload).await.is_err() {
                        break None;
                    }
                }
                None => break Some(CloseReason {
                    code: CloseCode::Away,
                    description: Some("Server shutting down".into()),
                }),
            },

            _ = ticker.tick() => {
                if heartbeat.expired(last_seen, Instant::now()) {
                    warn!(connection_id = %connection_id, "Live feed heartbeat timeout");
                    break Some(CloseReason {
                        code: CloseCode::Normal,
                        description: Some("Heartbeat timeout".into()),
                    });
                }
                if session.ping(b"").await.is_err() {
                    break None;
                }
            },

            msg = msg_stream.next() => match msg {
                Some(Ok(msg)) => {
                    last_seen = Instant::now();
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break None;
                            }
                        }
                        Message::Close(reason) => break reason,
                        _ => {}
                    }
                }
                Some(Err(e)) => {
                    warn!(connection_id = %connection_id, error = %e, "WebSocket protocol error");
                    break None;
                }
                None => break None,
            },
        }
    };

    let _ = session.close(close_reason).await;
    info!(connection_id = %connection_id, "Live feed disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_expires_only_after_the_client_timeout() {
        let heartbeat = Heartbeat {
            interval: Duration::from_secs(5),
            client_timeout: Duration::from_secs(30),
        };
        let last_seen = Instant::now();

        assert!(!heartbeat.expired(last_seen, last_seen));
        assert!(!heartbeat.expired(last_seen, last_seen + Duration::from_secs(30)));
        assert!(heartbeat.expired(last_seen, last_seen + Duration::from_secs(31)));
        // a frame that lands after the tick was scheduled never counts as silence
        assert!(!heartbeat.expired(last_seen + Duration::from_secs(1), last_seen));
    }

    #[test]
    fn heartbeat_follows_config() {
        let config = Config {
            ws_heartbeat_interval: Duration::from_millis(50),
            ws_client_timeout: Duration::from_millis(200),
            ..Config::in_memory()
        };
        let heartbeat = Heartbeat::from_config(&config);
        assert_eq!(heartbeat.interval, Duration::from_millis(50));
        assert_eq!(heartbeat.client_timeout, Duration::from_millis(200));
    }
}

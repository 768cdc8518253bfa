//! In-process publish/subscribe for the live feed.
//!
//! Each [`Channel`] owns a `tokio::sync::broadcast` sender. Publishing never waits on
//! subscribers: a subscriber that falls more than `capacity` events behind skips what it
//! missed and carries on from the oldest event still buffered. Nothing is replayed to
//! subscribers that join later.

use futures::stream::{self, Stream};
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter, EnumString};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::model::attendance::Attendance;

/// Named broadcast topics. The string form is what clients put in `/ws/{channel}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, EnumIter)]
pub enum Channel {
    #[strum(serialize = "attendance")]
    AttendanceUpdates,
}

/// Payload carried on a channel. Serialized untagged, so subscribers of the attendance
/// channel receive the bare record JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LiveEvent {
    Attendance(Attendance),
}

pub struct Broadcaster {
    // indexed by `Channel as usize`; built from Channel::iter() so every variant is present
    senders: Vec<broadcast::Sender<LiveEvent>>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        // broadcast::channel panics on zero capacity
        let capacity = capacity.max(1);
        let senders = Channel::iter()
            .map(|_| broadcast::channel(capacity).0)
            .collect();
        Self { senders }
    }

    fn sender(&self, channel: Channel) -> &broadcast::Sender<LiveEvent> {
        &self.senders[channel as usize]
    }

    /// Fire-and-forget delivery to everyone currently subscribed to `channel`.
    ///
    /// Returns how many subscribers the event was queued for; zero is not an error.
    pub fn publish(&self, channel: Channel, event: LiveEvent) -> usize {
        match self.sender(channel).send(event) {
            Ok(receivers) => {
                debug!(channel = channel.as_ref(), receivers, "Event published");
                receivers
            }
            Err(_) => {
                debug!(channel = channel.as_ref(), "Event dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self, channel: Channel) -> Subscription {
        Subscription {
            channel,
            rx: self.sender(channel).subscribe(),
        }
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.sender(channel).receiver_count()
    }
}

/// One subscriber's view of a channel. Dropping it unsubscribes.
pub struct Subscription {
    channel: Channel,
    rx: broadcast::Receiver<LiveEvent>,
}

impl Subscription {
    /// Waits for the next event. `None` once the broadcaster is gone.
    pub async fn next_event(&mut self) -> Option<LiveEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        channel = self.channel.as_ref(),
                        skipped, "Subscriber lagged, events skipped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = LiveEvent> {
        stream::unfold(self, |mut sub| async move {
            sub.next_event().await.map(|event| (event, sub))
        })
    }
}

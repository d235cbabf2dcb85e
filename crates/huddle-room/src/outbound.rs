//! Best-effort event delivery to participants.
//!
//! Every connection owns a bounded queue of [`Event`]s drained by its
//! writer task. Rooms hold the sending half. Delivery is at-most-once: an
//! event that cannot be queued within the send timeout, or whose queue is
//! already closed, is dropped and never retried.

use std::time::Duration;

use huddle_protocol::{Event, ParticipantId};
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// The sending half of a participant's outbound queue.
///
/// Cheap to clone; every room the participant joins keeps its own copy.
#[derive(Debug, Clone)]
pub struct ParticipantSender {
    tx: mpsc::Sender<Event>,
}

impl ParticipantSender {
    /// Creates a queue holding up to `buffer` undelivered events.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Returns `true` once the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Queues `event`, giving up after `timeout`. Returns whether the
    /// event was queued.
    pub async fn deliver(&self, event: Event, timeout: Duration) -> bool {
        if self.is_closed() {
            return false;
        }
        self.tx.send_timeout(event, timeout).await.is_ok()
    }
}

/// One event addressed to one participant.
#[derive(Debug, Clone)]
pub(crate) struct Delivery {
    pub(crate) recipient: ParticipantId,
    pub(crate) sender: ParticipantSender,
    pub(crate) event: Event,
}

/// Sends every delivery and waits until each one has either landed or
/// been dropped.
///
/// Recipients are served concurrently; each recipient's events go out in
/// plan order. Once one event to a recipient is dropped, the rest of that
/// recipient's batch is skipped.
pub(crate) async fn deliver_all(deliveries: Vec<Delivery>, timeout: Duration) {
    if deliveries.is_empty() {
        return;
    }

    let mut batches: IndexMap<ParticipantId, (ParticipantSender, Vec<Event>)> = IndexMap::new();
    for delivery in deliveries {
        batches
            .entry(delivery.recipient)
            .or_insert_with(|| (delivery.sender, Vec::new()))
            .1
            .push(delivery.event);
    }

    let mut sends = JoinSet::new();
    for (recipient, (sender, events)) in batches {
        sends.spawn(async move {
            let total = events.len();
            for (sent, event) in events.into_iter().enumerate() {
                let kind = event.kind();
                if !sender.deliver(event, timeout).await {
                    tracing::debug!(
                        %recipient,
                        event = kind,
                        skipped = total - sent - 1,
                        "event dropped"
                    );
                    break;
                }
            }
        });
    }
    while sends.join_next().await.is_some() {}
}

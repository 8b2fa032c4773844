use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the service layer.
///
/// Handlers never block on these; sends are best-effort and a full channel is
/// logged rather than propagated to the caller.
#[derive(Debug, Clone)]
pub enum Event {
    RfqCreated {
        rfq_id: Uuid,
        rfq_number: String,
    },
    RfqPartsUpdated {
        rfq_id: Uuid,
    },
    RfqExpired {
        rfq_id: Uuid,
        rfq_number: String,
    },
    RfqCompleted {
        rfq_id: Uuid,
    },
    RequoteRequested {
        rfq_id: Uuid,
        supplier_ids: Vec<Uuid>,
    },
    ReplySubmitted {
        reply_id: Uuid,
        rfq_id: Uuid,
        supplier_id: Uuid,
    },
    RequoteSubmitted {
        reply_id: Uuid,
        revision_number: i32,
    },
    ReplyStatusChanged {
        reply_id: Uuid,
        old_status: String,
        new_status: String,
    },
    SupplierRegistered {
        supplier_id: Uuid,
    },
    UserRegistered {
        user_id: Uuid,
    },
}

/// Cloneable handle for emitting events from services.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging instead of failing when the consumer lags.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("event channel closed, dropping event: {}", e);
        }
    }
}

/// Creates the event channel with a bounded buffer.
pub fn event_channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Consumes events for the lifetime of the process.
///
/// Today this is an audit log; downstream integrations (webhooks, analytics)
/// would hang off this loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::RfqCreated { rfq_id, rfq_number } => {
                info!(%rfq_id, %rfq_number, "rfq created");
            }
            Event::RfqExpired { rfq_id, rfq_number } => {
                info!(%rfq_id, %rfq_number, "rfq expired");
            }
            Event::RequoteRequested { rfq_id, supplier_ids } => {
                info!(%rfq_id, suppliers = supplier_ids.len(), "re-quote requested");
            }
            Event::ReplySubmitted {
                reply_id,
                rfq_id,
                supplier_id,
            } => {
                info!(%reply_id, %rfq_id, %supplier_id, "reply submitted");
            }
            Event::RequoteSubmitted {
                reply_id,
                revision_number,
            } => {
                info!(%reply_id, revision_number, "re-quote submitted");
            }
            Event::ReplyStatusChanged {
                reply_id,
                old_status,
                new_status,
            } => {
                info!(%reply_id, %old_status, %new_status, "reply status changed");
            }
            other => {
                info!(event = ?other, "event");
            }
        }
    }

    info!("event channel closed, stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_the_channel() {
        let (sender, mut rx) = event_channel(8);
        let rfq_id = Uuid::new_v4();
        sender
            .send(Event::RfqCreated {
                rfq_id,
                rfq_number: "RFQ-2503-001".to_string(),
            })
            .await;

        match rx.recv().await {
            Some(Event::RfqCreated { rfq_id: got, .. }) => assert_eq!(got, rfq_id),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_does_not_panic() {
        let (sender, rx) = event_channel(1);
        drop(rx);
        sender
            .send(Event::RfqPartsUpdated {
                rfq_id: Uuid::new_v4(),
            })
            .await;
    }
}

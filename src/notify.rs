//! Fan-out of domain events after they have been persisted.

use chrono::{DateTime, Utc};

use crate::domain::events::DomainEvent;
use crate::support::{ChatMessage, SupportHub};

#[derive(Clone)]
pub struct Notifier {
    nats: Option<async_nats::Client>,
    hub: SupportHub,
}

impl Notifier {
    pub fn new(nats: Option<async_nats::Client>, hub: SupportHub) -> Self { Self { nats, hub } }

    pub fn hub(&self) -> &SupportHub { &self.hub }

    /// Best effort: failures are logged, never returned.
    pub async fn publish(&self, events: Vec<DomainEvent>, at: DateTime<Utc>) {
        for event in events {
            let subject = event.subject();
            tracing::debug!(%subject, customer_id = event.customer_id(), "publishing domain event");
            if let Some(client) = &self.nats {
                match serde_json::to_vec(&event) {
                    Ok(payload) => {
                        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                            tracing::warn!(%subject, error = %e, "nats publish failed");
                        }
                    }
                    Err(e) => tracing::warn!(%subject, error = %e, "event encoding failed"),
                }
            }
            let room = SupportHub::room_for(event.customer_id());
            self.hub.post(ChatMessage::notification(&room, event.summary(), at));
        }
    }
}

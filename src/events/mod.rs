use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;

/// Domain events emitted by the lifecycle core after a successful commit.
/// Delivery is best-effort: a full channel never fails the operation that
/// produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    BookingCreated {
        booking_id: Uuid,
        customer_id: Uuid,
    },
    BookingStatusChanged {
        booking_id: Uuid,
        old_status: BookingStatus,
        new_status: BookingStatus,
    },
    BookingAssigned {
        booking_id: Uuid,
        technician_id: Uuid,
        assignment_id: Uuid,
    },
    BookingCompleted {
        booking_id: Uuid,
        technician_id: Uuid,
    },
    BookingCancelled {
        booking_id: Uuid,
    },
    ReviewSubmitted {
        review_id: Uuid,
        booking_id: Uuid,
    },
    ReviewModerated {
        review_id: Uuid,
        published: bool,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates a bounded event channel.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Notification fan-out
/// (SMS/email) is an external collaborator and not handled here.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::BookingCreated {
                booking_id,
                customer_id,
            } => info!(booking_id = %booking_id, customer_id = %customer_id, "event: booking created"),
            Event::BookingStatusChanged {
                booking_id,
                old_status,
                new_status,
            } => info!(booking_id = %booking_id, %old_status, %new_status, "event: booking status changed"),
            Event::BookingAssigned {
                booking_id,
                technician_id,
                assignment_id,
            } => info!(booking_id = %booking_id, technician_id = %technician_id, assignment_id = %assignment_id, "event: booking assigned"),
            Event::BookingCompleted {
                booking_id,
                technician_id,
            } => info!(booking_id = %booking_id, technician_id = %technician_id, "event: booking completed"),
            Event::BookingCancelled { booking_id } => {
                info!(booking_id = %booking_id, "event: booking cancelled")
            }
            Event::ReviewSubmitted {
                review_id,
                booking_id,
            } => info!(review_id = %review_id, booking_id = %booking_id, "event: review submitted"),
            Event::ReviewModerated {
                review_id,
                published,
            } => info!(review_id = %review_id, published, "event: review moderated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_the_channel() {
        let (sender, mut rx) = channel(8);
        let booking_id = Uuid::new_v4();
        sender
            .send(Event::BookingCancelled { booking_id })
            .await
            .unwrap();
        match rx.recv().await {
            Some(Event::BookingCancelled { booking_id: id }) => assert_eq!(id, booking_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

use crate::domain::event::DomainEvent;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Fire-and-forget fan-out of domain events to in-process subscribers.
///
/// Events are emitted only after the mutation has committed. Delivery to the
/// notification/achievement collaborators happens through whatever transport
/// the host wires onto a subscription; the engine assumes none.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: DomainEvent) {
        tracing::debug!(?event, "domain event");
        // No subscribers is the normal case for an embedded engine.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

//! Typed events delivered to host subscriptions

use super::viewport::ViewportTransform;
use crate::render::RenderStatus;
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum MapEvent {
    /// Code under the pointer (fine code or group code, per the drawn tier)
    Hover(Option<String>),
    /// Selected group code
    Select(Option<String>),
    TransformChanged(ViewportTransform),
    StatusChanged(RenderStatus),
}

/// Fan-out of events to every live subscriber
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<MapEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        self.subscribe_with(None::<MapEvent>)
    }

    /// Subscribe, with `initial` queued for this subscriber only
    pub fn subscribe_with(&mut self, initial: impl IntoIterator<Item = MapEvent>) -> Receiver<MapEvent> {
        let (tx, rx) = mpsc::channel();
        for event in initial {
            let _ = tx.send(event);
        }
        self.subscribers.push(tx);
        rx
    }

    /// Send to every subscriber, forgetting those whose receiver was dropped
    pub fn emit(&mut self, event: MapEvent) {
        tracing::trace!("[Events] {:?}", event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let mut bus = EventBus::new();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        drop(dropped);

        bus.emit(MapEvent::Hover(Some("900A".into())));
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), MapEvent::Hover(Some("900A".into())));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(MapEvent::Select(None)).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "select", "value": null }));
    }
}

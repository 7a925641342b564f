//! Server state: one map, its boundary store and its event subscription

use crate::config::MapOptions;
use crate::map::ChoroplethMap;
use crate::render::RecordingBackend;
use crate::source::{BoundaryStore, DirectoryStore};
use crate::view::MapEvent;
use std::sync::mpsc::Receiver;

pub struct ServerState {
    pub map: ChoroplethMap<RecordingBackend>,
    pub store: Box<dyn BoundaryStore>,
    pub events: Receiver<MapEvent>,
    pub data_loaded: bool,
}

impl ServerState {
    pub fn new(options: MapOptions, store: Box<dyn BoundaryStore>) -> Self {
        let mut map = ChoroplethMap::new(options, || Ok(RecordingBackend::new()));
        let events = map.subscribe();
        Self { map, store, events, data_loaded: false }
    }

    pub fn is_data_loaded(&self) -> bool {
        self.data_loaded
    }

    /// Events queued since the last drain, in emission order
    pub fn drain_events(&self) -> Vec<MapEvent> {
        self.events.try_iter().collect()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(MapOptions::default(), Box::new(DirectoryStore::new(".")))
    }
}

//! Synchronous change notifications.
//!
//! Each [`crate::key::IdentificationKey`] owns one [`EventBus`]. Listeners are
//! registered per [`EventKind`] and run in registration order. A listener gets
//! the event and a shared reference to the key, so it reads fully settled
//! derived state but cannot call back into the mutating API.
//!
//! A failing listener does not stop the others: every listener of every
//! pending event runs, and the first error is handed back to the caller.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::construct::OtherHasher;
use crate::error::{KeyError, Result};
use crate::key::IdentificationKey;
use crate::payload::Auxiliary;

pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
pub type Listener = Box<dyn FnMut(&KeyEvent, &IdentificationKey) -> ListenerResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ValueInitialized,
    BeforeValueSelected,
    ValueSelected,
    ValueDeselected,
    ValuePossibilityChanged,
    FilterVisibilityChanged,
    PointsUpdated,
    ItemComplete,
    ResultsUpdated,
}
impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ValueInitialized => "valueInitialized",
            EventKind::BeforeValueSelected => "beforeValueSelected",
            EventKind::ValueSelected => "valueSelected",
            EventKind::ValueDeselected => "valueDeselected",
            EventKind::ValuePossibilityChanged => "valuePossibilityChanged",
            EventKind::FilterVisibilityChanged => "filterVisibilityChanged",
            EventKind::PointsUpdated => "pointsUpdated",
            EventKind::ItemComplete => "itemComplete",
            EventKind::ResultsUpdated => "resultsUpdated",
        }
    }
}
impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyEvent {
    ValueInitialized { index: usize },
    BeforeValueSelected { index: usize, payload: Option<Auxiliary> },
    ValueSelected { index: usize, payload: Option<Auxiliary> },
    ValueDeselected { index: usize, payload: Option<Auxiliary> },
    ValuePossibilityChanged { index: usize, possible: bool },
    FilterVisibilityChanged { filter: usize, visible: bool },
    /// An item's score changed; `confidence` is points over max points.
    PointsUpdated {
        item: usize,
        points: f64,
        max_points: f64,
        confidence: f64,
    },
    /// Follows the `PointsUpdated` that brought an item to full confidence.
    ItemComplete { item: usize },
    ResultsUpdated { count: usize },
}
impl KeyEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            KeyEvent::ValueInitialized { .. } => EventKind::ValueInitialized,
            KeyEvent::BeforeValueSelected { .. } => EventKind::BeforeValueSelected,
            KeyEvent::ValueSelected { .. } => EventKind::ValueSelected,
            KeyEvent::ValueDeselected { .. } => EventKind::ValueDeselected,
            KeyEvent::ValuePossibilityChanged { .. } => EventKind::ValuePossibilityChanged,
            KeyEvent::FilterVisibilityChanged { .. } => EventKind::FilterVisibilityChanged,
            KeyEvent::PointsUpdated { .. } => EventKind::PointsUpdated,
            KeyEvent::ItemComplete { .. } => EventKind::ItemComplete,
            KeyEvent::ResultsUpdated { .. } => EventKind::ResultsUpdated,
        }
    }
}

/// Opaque listener identifier, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>, OtherHasher>,
}
impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }
    fn allocate_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&KeyEvent, &IdentificationKey) -> ListenerResult + 'static,
    {
        let id = self.allocate_id();
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }
    /// Removes a listener. Returns false if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        for listeners in self.listeners.values_mut() {
            if let Some(position) = listeners.iter().position(|(l, _)| *l == id) {
                drop(listeners.remove(position));
                return true;
            }
        }
        false
    }
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn dispatch(&mut self, events: &[KeyEvent], key: &IdentificationKey) -> Result<()> {
        let mut first_error = None;
        for event in events {
            let kind = event.kind();
            let Some(listeners) = self.listeners.get_mut(&kind) else {
                continue;
            };
            trace!(event = %kind, listeners = listeners.len(), "dispatching");
            for (_, listener) in listeners.iter_mut() {
                if let Err(source) = listener(event, key) {
                    if first_error.is_none() {
                        first_error = Some(KeyError::Listener {
                            event: kind.name(),
                            source,
                        });
                    }
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::Cell;
use crate::render::{ElementSource, ShapeKind};

/// Event pushed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerEvent {
    /// `click-<elementType>`, `mouseover-<elementType>`, `mouseout-<elementType>` or `destroy`.
    pub name: String,
    pub layer_id: String,
    pub element_type: Option<ShapeKind>,
    /// Originating data row, empty for lifecycle events.
    pub row: Vec<Cell>,
    pub source: Option<ElementSource>,
}

impl LayerEvent {
    #[must_use]
    pub fn lifecycle(name: &str, layer_id: &str) -> Self {
        Self {
            name: name.to_owned(),
            layer_id: layer_id.to_owned(),
            element_type: None,
            row: Vec::new(),
            source: None,
        }
    }

    #[must_use]
    pub fn element(action: PointerAction, kind: ShapeKind, source: &ElementSource) -> Self {
        Self {
            name: event_name(action, kind),
            layer_id: source.layer_id.clone(),
            element_type: Some(kind),
            row: source.row.clone(),
            source: Some(source.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerAction {
    Click,
    MouseOver,
    MouseOut,
}

impl PointerAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
        }
    }
}

#[must_use]
pub fn event_name(action: PointerAction, kind: ShapeKind) -> String {
    format!("{}-{}", action.as_str(), kind.as_str())
}

pub type EventHandler = Box<dyn FnMut(&LayerEvent)>;

/// Per-layer handler registry keyed by event name.
#[derive(Default)]
pub struct EventBus {
    handlers: IndexMap<String, Vec<EventHandler>>,
}

impl EventBus {
    pub fn on<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(&LayerEvent) + 'static,
    {
        self.handlers
            .entry(name.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Removes every handler of `name`; returns how many were removed.
    pub fn off(&mut self, name: &str) -> usize {
        self.handlers
            .shift_remove(name)
            .map_or(0, |handlers| handlers.len())
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.handlers
            .get(name)
            .is_some_and(|handlers| !handlers.is_empty())
    }

    /// Invokes the handlers of `event.name`; returns how many ran.
    pub fn fire(&mut self, event: &LayerEvent) -> usize {
        let Some(handlers) = self.handlers.get_mut(&event.name) else {
            return 0;
        };
        for handler in handlers.iter_mut() {
            handler(event);
        }
        handlers.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.handlers
                    .iter()
                    .map(|(name, handlers)| (name, handlers.len())),
            )
            .finish()
    }
}

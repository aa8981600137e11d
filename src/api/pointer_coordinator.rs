use tracing::trace;

use crate::interaction::{HitTarget, TooltipUpdate, hit_test};
use crate::layer::{LayerEvent, PointerAction};
use crate::render::{Backend, ElementConfig};

use super::Wave;

/// Pointer slack in pixels for thin shapes such as lines and paths.
pub const HIT_TOLERANCE: f64 = 3.0;

impl<B: Backend> Wave<B> {
    /// Tracks the pointer, dispatches hover events and returns the tooltip
    /// to show, if the pointer is over a data element.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<TooltipUpdate> {
        self.interaction.on_pointer_move(x, y);
        let hit = hit_test(&self.backend, x, y, HIT_TOLERANCE);
        if let Some(previous) = self.interaction.set_hovered(hit.clone()) {
            if let Some(previous) = previous {
                self.dispatch(PointerAction::MouseOut, &previous);
            }
            if let Some(current) = &hit {
                self.dispatch(PointerAction::MouseOver, current);
            }
        }

        let Some(target) = hit else {
            self.tooltip.hide();
            return None;
        };
        let backup: Vec<&ElementConfig> = self
            .backend
            .elements()
            .into_iter()
            .map(|(_, element)| element)
            .collect();
        let hovered = self.backend.group(&target.key).get(target.index).copied()?;
        Some(self.tooltip.show(hovered, &backup, (x, y)))
    }

    /// Clears hover state, firing `mouseout` for the element left behind.
    pub fn pointer_leave(&mut self) {
        if let Some(previous) = self.interaction.on_pointer_leave() {
            self.dispatch(PointerAction::MouseOut, &previous);
        }
        self.tooltip.hide();
    }

    /// Fires `click-<elementType>` on the element under the pointer.
    pub fn click(&mut self, x: f64, y: f64) -> Option<LayerEvent> {
        let target = hit_test(&self.backend, x, y, HIT_TOLERANCE)?;
        Some(self.dispatch(PointerAction::Click, &target))
    }

    fn dispatch(&mut self, action: PointerAction, target: &HitTarget) -> LayerEvent {
        let event = LayerEvent::element(action, target.kind, &target.source);
        let handled = self
            .layers
            .iter_mut()
            .find(|layer| layer.id() == target.key.layer)
            .map_or(0, |layer| layer.base_mut().events_mut().fire(&event));
        trace!(event = %event.name, layer = %event.layer_id, handled, "pointer event");
        event
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::api::WaveConfig;
    use crate::core::{Cell, Padding, SelectMode, Viewport};
    use crate::interaction::TooltipMode;
    use crate::layer::{LayerKind, LayerOptions, RectOptions};
    use crate::render::SvgBackend;

    fn wave(mode: TooltipMode) -> Wave<SvgBackend> {
        let config = WaveConfig::new(Viewport::new(200, 100))
            .with_padding(Padding::new(0.0, 0.0, 0.0, 0.0))
            .with_tooltip(mode);
        let mut wave = Wave::new(SvgBackend::new(200.0, 100.0), config).expect("wave");
        wave.create_layer(LayerKind::Rect(
            RectOptions::new(LayerOptions::new("bars")).with_mode(SelectMode::Group),
        ))
        .expect("bars");
        wave.set_data_value("bars", &json!([["yr", "a", "b"], ["2020", 10, 20], ["2021", 15, 5]]))
            .expect("data");
        wave.draw_all().expect("draw");
        wave
    }

    #[test]
    fn hover_fires_over_and_out_once() {
        let mut wave = wave(TooltipMode::Single);
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in ["mouseover-rect", "mouseout-rect"] {
            let log = Rc::clone(&log);
            wave.on("bars", name, move |event| log.borrow_mut().push(event.name.clone()))
                .expect("subscribe");
        }

        // bottom of the first bar of 2020
        let update = wave.pointer_move(30.0, 99.0).expect("tooltip");
        assert_eq!(update.content.title, "2020");
        assert_eq!(update.content.items[0].value, "10");
        assert!(wave.pointer_move(31.0, 99.0).is_some_and(|update| !update.rerendered));
        wave.pointer_leave();
        assert_eq!(log.borrow().as_slice(), ["mouseover-rect", "mouseout-rect"]);
        assert!(wave.tooltip().shown().is_none());
    }

    #[test]
    fn group_tooltip_lists_the_whole_dimension() {
        let mut wave = wave(TooltipMode::Group);
        let update = wave.pointer_move(30.0, 99.0).expect("tooltip");
        let values: Vec<_> = update.content.items.iter().map(|item| item.value.as_str()).collect();
        assert_eq!(values, ["10", "20"]);
    }

    #[test]
    fn click_carries_the_data_row() {
        let mut wave = wave(TooltipMode::Single);
        let event = wave.click(30.0, 99.0).expect("click");
        assert_eq!(event.name, "click-rect");
        assert_eq!(event.row, [Cell::from("2020"), Cell::from(10.0), Cell::from(20.0)]);
        assert!(wave.click(199.0, 1.0).is_none());
    }
}

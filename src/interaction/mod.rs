//! Pointer state, brush geometry, hit testing and tooltip content.
//!
//! Everything here is backend-neutral state; the orchestrator wires it to
//! layers and backends.

mod brush;
mod hit;
mod tooltip;

pub use brush::Brush;
pub use hit::{HitTarget, hit_test};
pub use tooltip::{
    TooltipContent, TooltipController, TooltipItem, TooltipMode, TooltipPosition, TooltipUpdate,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    Idle,
    /// A brush drag is in progress.
    Brushing,
}

/// Pointer state exposed to host applications.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    mode: InteractionMode,
    cursor_x: f64,
    cursor_y: f64,
    inside: bool,
    brush_origin: Option<f64>,
    hovered: Option<HitTarget>,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            mode: InteractionMode::Idle,
            cursor_x: 0.0,
            cursor_y: 0.0,
            inside: false,
            brush_origin: None,
            hovered: None,
        }
    }
}

impl InteractionState {
    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    #[must_use]
    pub fn cursor(&self) -> (f64, f64) {
        (self.cursor_x, self.cursor_y)
    }

    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.inside
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&HitTarget> {
        self.hovered.as_ref()
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        self.cursor_x = x;
        self.cursor_y = y;
        self.inside = true;
    }

    /// Clears hover state; returns the element that was hovered.
    pub fn on_pointer_leave(&mut self) -> Option<HitTarget> {
        self.inside = false;
        self.hovered.take()
    }

    /// Replaces the hovered element; returns the previous one when it changed.
    pub fn set_hovered(&mut self, target: Option<HitTarget>) -> Option<Option<HitTarget>> {
        if self.hovered == target {
            return None;
        }
        Some(std::mem::replace(&mut self.hovered, target))
    }

    pub fn begin_brush(&mut self, x: f64) {
        self.mode = InteractionMode::Brushing;
        self.brush_origin = Some(x);
    }

    /// Ends a drag; returns the selected `[x0, x1]` span.
    pub fn end_brush(&mut self, x: f64) -> Option<(f64, f64)> {
        self.mode = InteractionMode::Idle;
        self.brush_origin.take().map(|origin| (origin, x))
    }
}

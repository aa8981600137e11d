//! wave-chart: declarative dual-backend 2-D chart rendering engine.
//!
//! Layers derive scales from tabular data and emit resolved element lists to
//! a retained-mode SVG document or an index-stable canvas scene graph. The
//! [`Wave`] orchestrator owns layout, the layer registry, coordinate binding,
//! brushing and tooltips.

pub mod api;
pub mod core;
pub mod error;
pub mod interaction;
pub mod layer;
pub mod render;
pub mod telemetry;

pub use api::{LayerSchema, Wave, WaveConfig, WaveContext, WaveState};
pub use error::{WaveError, WaveResult};

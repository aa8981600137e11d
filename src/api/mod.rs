//! Orchestrator facade: the `Wave` object, its configuration and the
//! explicit context handed to layers.
//!
//! `Wave` is split over several `impl` blocks, one per concern: lifecycle and
//! error boundary (`registry`), coordinate sharing (`binder`), range zoom
//! (`brush_coordinator`), pointer events (`pointer_coordinator`) and schema
//! translation (`schema`).

mod binder;
mod brush_coordinator;
mod config;
pub mod context;
mod pointer_coordinator;
mod registry;
mod schema;
mod wave;
mod wave_init;

pub use binder::{Binding, merge_scales};
pub use config::WaveConfig;
pub use context::WaveContext;
pub use pointer_coordinator::HIT_TOLERANCE;
pub use schema::{LayerConfiguration, LayerSchema};
pub use wave::{LayerWarning, Wave, WaveState};

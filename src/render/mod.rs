pub mod attr;
mod canvas_backend;
pub mod color;
pub mod element;
mod null_backend;
pub mod path;
pub mod primitives;
mod svg_backend;
pub mod theme;

pub use attr::{Attr, ShapeAttrs, get_attr};
pub use canvas_backend::{CanvasBackend, SceneObject};
pub use color::{Color, Lch, lch_palette};
pub use element::{
    AnimationOptions, ElementConfig, ElementSource, Geometry, GroupKey, Mapping, ShapeKind,
    ShapeStyle, TextAnchor, Transition, TransitionOptions, TransitionPlan, mapping,
};
pub use null_backend::NullBackend;
pub use path::{CurveKind, PathCommand, PathData};
pub use primitives::DrawTarget;
pub use svg_backend::{JoinStats, SvgBackend, SvgNode};
pub use theme::Theme;

use serde::{Deserialize, Serialize};

use crate::error::WaveResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Svg,
    Canvas,
    Null,
}

/// Contract implemented by any rendering backend.
///
/// Layers hand over fully resolved element lists; the backend owns structural
/// reconciliation of each group. Element `i` of an emission must land on the
/// same backend object as element `i` of the previous emission of that group.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Reconciles group `key` with `elements`.
    fn emit(
        &mut self,
        key: &GroupKey,
        elements: Vec<ElementConfig>,
        plan: TransitionPlan,
    ) -> WaveResult<()>;

    /// Releases every group owned by `layer`. Unknown layers are a no-op.
    fn remove_layer(&mut self, layer: &str) -> WaveResult<()>;

    /// Current elements in paint order.
    fn elements(&self) -> Vec<(&GroupKey, &ElementConfig)>;

    fn group(&self, key: &GroupKey) -> Vec<&ElementConfig> {
        self.elements()
            .into_iter()
            .filter(|(group, _)| *group == key)
            .map(|(_, element)| element)
            .collect()
    }
}

#[cfg(feature = "cairo-backend")]
mod cairo_backend;
#[cfg(feature = "cairo-backend")]
pub use cairo_backend::{CairoPaintStats, CairoScenePainter};

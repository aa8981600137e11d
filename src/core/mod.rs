pub mod band_scale;
pub mod geo_scale;
pub mod layout;
pub mod linear_scale;
pub mod scale;
pub mod table;
pub mod types;

pub use band_scale::{BandBoundary, BandScale, PointScale};
pub use geo_scale::{GeoAxis, GeoAxisScale, GeoScale};
pub use layout::{LayoutContext, LayoutPreset, Regions};
pub use linear_scale::{LinearScale, NiceOptions};
pub use scale::{Scale, ScaleDomain, ScaleKind, ScaleSpec, Tick};
pub use table::{Cell, ColumnSelector, SelectMode, SelectedColumn, Selection, Table};
pub use types::{Padding, Rect, Viewport};

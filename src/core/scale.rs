use serde::{Deserialize, Serialize};

use crate::core::table::Cell;
use crate::core::{
    BandBoundary, BandScale, GeoAxisScale, GeoScale, LinearScale, NiceOptions, PointScale, Rect,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Band,
    Point,
    Linear,
    Geographic,
}

/// Domain literal accepted in a scale spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleDomain {
    Continuous([f64; 2]),
    Geographic([[f64; 2]; 2]),
    Discrete(Vec<String>),
}

/// Declarative scale description, as found in the `scale` key of a layer schema.
///
/// Every field is optional; layers fill gaps from their data and region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScaleSpec {
    #[serde(rename = "type")]
    pub kind: Option<ScaleKind>,
    pub domain: Option<ScaleDomain>,
    pub range: Option<[f64; 2]>,
    /// Vertical output range of a geographic projection; `range` is the horizontal one.
    pub range_y: Option<[f64; 2]>,
    pub nice: Option<NiceOptions>,
    pub padding_inner: Option<f64>,
    /// Outer padding of point scales, in steps.
    pub padding: Option<f64>,
    pub fixed_band_width: Option<f64>,
    pub fixed_padding_inner: Option<f64>,
    pub fixed_boundary: Option<BandBoundary>,
}

impl ScaleSpec {
    /// Builds a scale purely from the spec. Missing pieces become empty.
    #[must_use]
    pub fn build(&self) -> Scale {
        let range = self.range.map_or((0.0, 0.0), |[start, end]| (start, end));
        match (self.kind, &self.domain) {
            (Some(ScaleKind::Geographic), Some(ScaleDomain::Geographic([[lon0, lat0], [lon1, lat1]]))) => {
                let range_y = self.range_y.map_or(range, |[start, end]| (start, end));
                Scale::Geographic(GeoScale::new((*lon0, *lon1), (*lat0, *lat1), range, range_y))
            }
            (Some(ScaleKind::Band), domain) => {
                Scale::Band(self.apply_band(BandScale::new(discrete(domain), range)))
            }
            (Some(ScaleKind::Point), domain) => {
                Scale::Point(self.apply_point(PointScale::new(discrete(domain), range)))
            }
            (_, Some(ScaleDomain::Discrete(labels))) => {
                Scale::Band(self.apply_band(BandScale::new(labels.clone(), range)))
            }
            (_, Some(ScaleDomain::Continuous([start, end]))) => {
                Scale::Linear(self.apply_linear(LinearScale::new((*start, *end), range)))
            }
            _ => Scale::Linear(self.apply_linear(LinearScale::new((0.0, 0.0), range))),
        }
    }

    /// Like [`ScaleSpec::build`], but a geographic projection without explicit
    /// ranges fits the horizontal and vertical extents of `region`.
    #[must_use]
    pub fn build_in(&self, region: Rect) -> Scale {
        match &self.domain {
            Some(ScaleDomain::Geographic([[lon0, lat0], [lon1, lat1]])) => {
                let (range_x, range_y) = self.geographic_ranges(region);
                Scale::Geographic(GeoScale::new((*lon0, *lon1), (*lat0, *lat1), range_x, range_y))
            }
            _ => self.build(),
        }
    }

    /// Pixel ranges of a projection inside `region`, overridden by `range` and `rangeY`.
    #[must_use]
    pub fn geographic_ranges(&self, region: Rect) -> ((f64, f64), (f64, f64)) {
        (
            self.range
                .map_or((region.left(), region.right()), |[start, end]| (start, end)),
            self.range_y
                .map_or((region.top(), region.bottom()), |[start, end]| (start, end)),
        )
    }

    /// Fills every unset field from `base`.
    pub fn inherit(&mut self, base: &ScaleSpec) {
        self.kind = self.kind.or(base.kind);
        if self.domain.is_none() {
            self.domain.clone_from(&base.domain);
        }
        self.range = self.range.or(base.range);
        self.range_y = self.range_y.or(base.range_y);
        self.nice = self.nice.or(base.nice);
        self.padding_inner = self.padding_inner.or(base.padding_inner);
        self.padding = self.padding.or(base.padding);
        self.fixed_band_width = self.fixed_band_width.or(base.fixed_band_width);
        self.fixed_padding_inner = self.fixed_padding_inner.or(base.fixed_padding_inner);
        self.fixed_boundary = self.fixed_boundary.or(base.fixed_boundary);
    }

    /// Applies fixed domain and nice settings on top of a data-derived scale.
    #[must_use]
    pub fn apply_linear(&self, mut scale: LinearScale) -> LinearScale {
        if let Some(ScaleDomain::Continuous([start, end])) = self.domain {
            scale.set_domain((start, end));
        }
        if let Some([start, end]) = self.range {
            scale.set_range((start, end));
        }
        match self.nice {
            Some(nice) => scale.nice(nice),
            None => scale,
        }
    }

    #[must_use]
    pub fn apply_point(&self, mut scale: PointScale) -> PointScale {
        if let Some(ScaleDomain::Discrete(labels)) = &self.domain {
            scale.set_domain(labels.clone());
        }
        if let Some([start, end]) = self.range {
            scale.set_range((start, end));
        }
        match self.padding {
            Some(padding) => scale.with_padding(padding),
            None => scale,
        }
    }

    /// Applies padding and band overrides; `fixedPaddingInner` wins over `paddingInner`.
    #[must_use]
    pub fn apply_band(&self, mut scale: BandScale) -> BandScale {
        if let Some(ScaleDomain::Discrete(labels)) = &self.domain {
            scale.set_domain(labels.clone());
        }
        if let Some([start, end]) = self.range {
            scale.set_range((start, end));
        }
        if let Some(padding) = self.fixed_padding_inner.or(self.padding_inner) {
            scale = scale.with_padding_inner(padding);
        }
        if self.fixed_band_width.is_some() {
            scale = scale.with_fixed_band_width(self.fixed_band_width);
        }
        if let Some(boundary) = self.fixed_boundary {
            scale = scale.with_boundary(boundary);
        }
        scale
    }
}

fn discrete(domain: &Option<ScaleDomain>) -> Vec<String> {
    match domain {
        Some(ScaleDomain::Discrete(labels)) => labels.clone(),
        _ => Vec::new(),
    }
}

/// Closed family of scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Scale {
    Band(BandScale),
    Point(PointScale),
    Linear(LinearScale),
    Geographic(GeoScale),
    /// Longitude or latitude callable synthesized from a projection.
    #[serde(rename = "geoaxis")]
    GeoAxis(GeoAxisScale),
}

impl Scale {
    #[must_use]
    pub fn kind(&self) -> ScaleKind {
        match self {
            Self::Band(_) => ScaleKind::Band,
            Self::Point(_) => ScaleKind::Point,
            Self::Linear(_) => ScaleKind::Linear,
            Self::Geographic(_) | Self::GeoAxis(_) => ScaleKind::Geographic,
        }
    }

    /// 1-D pixel range. Geographic scales report their horizontal range.
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Band(scale) => scale.range(),
            Self::Point(scale) => scale.range(),
            Self::Linear(scale) => scale.range(),
            Self::Geographic(scale) => scale.range().0,
            Self::GeoAxis(scale) => scale.range(),
        }
    }

    pub fn set_range(&mut self, range: (f64, f64)) {
        match self {
            Self::Band(scale) => scale.set_range(range),
            Self::Point(scale) => scale.set_range(range),
            Self::Linear(scale) => scale.set_range(range),
            Self::Geographic(scale) => {
                let (_, range_y) = scale.range();
                scale.set_range(range, range_y);
            }
            Self::GeoAxis(scale) => scale.set_range(range),
        }
    }

    #[must_use]
    pub fn bandwidth(&self) -> Option<f64> {
        match self {
            Self::Band(scale) => Some(scale.bandwidth()),
            Self::Point(scale) => Some(scale.bandwidth()),
            Self::Linear(_) | Self::Geographic(_) | Self::GeoAxis(_) => None,
        }
    }

    #[must_use]
    pub fn brushed(&self) -> bool {
        match self {
            Self::Band(scale) => scale.brushed(),
            Self::Point(scale) => scale.brushed(),
            Self::Linear(scale) => scale.brushed(),
            Self::Geographic(scale) => scale.brushed(),
            Self::GeoAxis(scale) => scale.brushed(),
        }
    }

    pub fn set_brushed(&mut self, brushed: bool) {
        match self {
            Self::Band(scale) => scale.set_brushed(brushed),
            Self::Point(scale) => scale.set_brushed(brushed),
            Self::Linear(scale) => scale.set_brushed(brushed),
            Self::Geographic(scale) => scale.set_brushed(brushed),
            Self::GeoAxis(scale) => scale.set_brushed(brushed),
        }
    }

    /// Maps one cell to a pixel. Discrete scales use the cell's label.
    #[must_use]
    pub fn map(&self, cell: &Cell) -> Option<f64> {
        match self {
            Self::Band(scale) => scale.scale(&cell.to_string()),
            Self::Point(scale) => scale.scale(&cell.to_string()),
            Self::Linear(scale) => cell.as_number().map(|value| scale.scale(value)),
            Self::GeoAxis(scale) => cell.as_number().map(|value| scale.scale(value)),
            Self::Geographic(_) => None,
        }
    }

    /// Discrete domain labels, empty for continuous scales.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        match self {
            Self::Band(scale) => scale.domain(),
            Self::Point(scale) => scale.domain(),
            Self::Linear(_) | Self::Geographic(_) | Self::GeoAxis(_) => &[],
        }
    }

    #[must_use]
    pub fn as_linear(&self) -> Option<&LinearScale> {
        match self {
            Self::Linear(scale) => Some(scale),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_geographic(&self) -> Option<&GeoScale> {
        match self {
            Self::Geographic(scale) => Some(scale),
            _ => None,
        }
    }

    /// Tick marks along the scale: band centres for discrete scales, 1/2/5
    /// steps for continuous ones.
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<Tick> {
        let continuous = |domain: (f64, f64), map: &dyn Fn(f64) -> f64| {
            LinearScale::new(domain, (0.0, 1.0))
                .ticks(count)
                .into_iter()
                .map(|value| Tick {
                    label: format_tick(value),
                    position: map(value),
                })
                .collect()
        };
        match self {
            Self::Band(_) | Self::Point(_) => self
                .labels()
                .iter()
                .filter_map(|label| {
                    self.map(&Cell::from(label.as_str())).map(|position| Tick {
                        label: label.clone(),
                        position: position + self.center_offset(),
                    })
                })
                .collect(),
            Self::Linear(scale) => continuous(scale.domain(), &|value| scale.scale(value)),
            Self::GeoAxis(scale) => continuous(scale.domain(), &|value| scale.scale(value)),
            Self::Geographic(_) => Vec::new(),
        }
    }

    /// Offset from a discrete position to the centre of its band.
    #[must_use]
    pub fn center_offset(&self) -> f64 {
        self.bandwidth().unwrap_or(0.0) / 2.0
    }
}

/// Axis tick: label plus pixel position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub label: String,
    pub position: f64,
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let text = format!("{value:.6}");
        text.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

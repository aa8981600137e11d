use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::core::{Cell, GeoAxis, GeoAxisScale, GeoScale, Scale, Table};
use crate::error::{WaveError, WaveResult};
use crate::layer::{
    Layer, LayerBase, LayerData, LayerOptions, LayerType, LegendEntry, PointStyle, ScaleSlot,
    row_source,
};
use crate::render::path::bent_line;
use crate::render::primitives;
use crate::render::{Attr, Backend, PathData, ShapeAttrs, ShapeKind, ShapeStyle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdLineOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
}

impl OdLineOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self { common }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OdLineStyle {
    pub path: ShapeAttrs,
    /// Sideways bend as a fraction of the segment length.
    pub bend: f64,
    pub point: PointStyle,
}

impl Default for OdLineStyle {
    fn default() -> Self {
        Self {
            path: ShapeAttrs {
                stroke_width: Some(Attr::Scalar(1.5)),
                ..ShapeAttrs::default()
            },
            bend: 0.2,
            point: PointStyle {
                enabled: true,
                ..PointStyle::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Flow {
    row: usize,
    label: String,
    from: (f64, f64),
    to: (f64, f64),
}

/// Origin to destination curves on a geographic projection.
///
/// Columns are `fromLon, fromLat, toLon, toLat`, optionally preceded by a
/// label column.
#[derive(Debug)]
pub struct OdLineLayer {
    base: LayerBase,
    table: Table,
    flows: Vec<Flow>,
}

impl OdLineLayer {
    pub fn new(options: OdLineOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        Ok(Self {
            base: LayerBase::new(options.common, context)?,
            table: Table::default(),
            flows: Vec::new(),
        })
    }

    fn read_flows(table: &Table) -> WaveResult<Vec<Flow>> {
        let first = match table.headers().len() {
            4 => 0,
            5 => 1,
            count => {
                return Err(WaveError::InvalidData(format!(
                    "od-line data needs 4 coordinate columns and an optional label, got {count} columns"
                )));
            }
        };
        Ok(table
            .rows()
            .iter()
            .enumerate()
            .filter_map(|(row, cells)| {
                let coordinates: Vec<f64> = cells[first..]
                    .iter()
                    .map(Cell::as_number)
                    .collect::<Option<_>>()?;
                Some(Flow {
                    row,
                    label: if first == 1 {
                        cells[0].to_string()
                    } else {
                        String::new()
                    },
                    from: (coordinates[0], coordinates[1]),
                    to: (coordinates[2], coordinates[3]),
                })
            })
            .collect())
    }

    /// `(longitude, latitude)` extent over every endpoint.
    fn extent(&self) -> ((f64, f64), (f64, f64)) {
        let mut longitude = (f64::INFINITY, f64::NEG_INFINITY);
        let mut latitude = (f64::INFINITY, f64::NEG_INFINITY);
        for flow in &self.flows {
            for (lon, lat) in [flow.from, flow.to] {
                longitude = (longitude.0.min(lon), longitude.1.max(lon));
                latitude = (latitude.0.min(lat), latitude.1.max(lat));
            }
        }
        if self.flows.is_empty() {
            return ((0.0, 0.0), (0.0, 0.0));
        }
        (longitude, latitude)
    }

    fn projected(&self) -> Vec<((f64, f64), (f64, f64))> {
        let Some(projection) = self
            .base
            .scale(ScaleSlot::Position)
            .and_then(Scale::as_geographic)
        else {
            return Vec::new();
        };
        self.flows
            .iter()
            .map(|flow| {
                (
                    projection.project(flow.from.0, flow.from.1),
                    projection.project(flow.to.0, flow.to.1),
                )
            })
            .collect()
    }
}

impl Layer for OdLineLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Odline
    }

    fn set_data(&mut self, data: LayerData) -> WaveResult<()> {
        let table = data.table()?;
        self.base.store_data(data);
        self.base.clear_scales();
        self.flows.clear();
        if table.headers().is_empty() {
            self.table = table;
            return Ok(());
        }
        self.flows = Self::read_flows(&table)?;
        self.table = table;

        let region = self.base.region();
        let (longitude, latitude) = self.extent();
        let (range_x, range_y) = self
            .base
            .scale_spec(ScaleSlot::Position)
            .geographic_ranges(region);
        let projection = GeoScale::new(longitude, latitude, range_x, range_y);
        debug!(layer = %self.base.id(), flows = self.flows.len(), "od-line data set");
        self.base
            .install_scale(ScaleSlot::Position, Scale::Geographic(projection));
        self.base.install_scale(
            ScaleSlot::X,
            Scale::GeoAxis(GeoAxisScale::new(projection, GeoAxis::Longitude)),
        );
        self.base.install_scale(
            ScaleSlot::Y,
            Scale::GeoAxis(GeoAxisScale::new(projection, GeoAxis::Latitude)),
        );
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: OdLineStyle = self.base.typed_style()?;
        let segments = self.projected();
        let colors = self.base.palette(self.flows.len().max(1));
        let id = self.base.id();

        let paths: Vec<PathData> = segments
            .iter()
            .map(|&(from, to)| bent_line(from, to, style.bend))
            .collect();
        let flow_colors: Vec<_> = (0..segments.len())
            .map(|index| colors[index % colors.len()])
            .collect();
        let sources: Vec<_> = self
            .flows
            .iter()
            .map(|flow| row_source(id, ShapeKind::Path, &self.table, flow.row, &flow.label, None))
            .collect();
        let mut path_attrs = ShapeAttrs {
            stroke: Some(Attr::PerElement(flow_colors.clone())),
            ..ShapeAttrs::default()
        };
        path_attrs.merge(&style.path);
        let path = self
            .base
            .common("path", ShapeKind::Path)
            .with_attrs(path_attrs)
            .with_sources(sources);

        let mut centers = Vec::new();
        let mut point_colors = Vec::new();
        let mut point_sources = Vec::new();
        if style.point.enabled {
            for ((from, to), (flow, color)) in segments.iter().zip(self.flows.iter().zip(&flow_colors)) {
                for center in [*from, *to] {
                    centers.push(center);
                    point_colors.push(*color);
                    point_sources.push(row_source(
                        id,
                        ShapeKind::Circle,
                        &self.table,
                        flow.row,
                        &flow.label,
                        None,
                    ));
                }
            }
        }
        let mut point_attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(point_colors)),
            ..ShapeAttrs::default()
        };
        point_attrs.merge(&style.point.circle);
        let points = self
            .base
            .common("circle", ShapeKind::Circle)
            .with_attrs(point_attrs)
            .with_defaults(ShapeStyle::default())
            .with_sources(point_sources);

        let mut target = self.base.target(backend);
        primitives::draw_path(&mut target, &path, &paths)?;
        primitives::draw_circle(
            &mut target,
            &points,
            &centers,
            Some(&Attr::Scalar(style.point.size)),
        )
    }

    fn legend_entries(&self) -> Vec<LegendEntry> {
        self.flows
            .iter()
            .filter(|flow| !flow.label.is_empty())
            .zip(self.base.palette(self.flows.len()))
            .map(|(flow, color)| LegendEntry {
                label: flow.label.clone(),
                color,
            })
            .collect()
    }
}

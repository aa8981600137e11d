use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};

const MAX_LATITUDE: f64 = 85.051_128_78;

/// Mercator projection fitted to a `[longitude, latitude]` extent.
///
/// The extent is scaled uniformly to fit the pixel rectangle and centred in it.
/// A degenerate extent or rectangle yields a projection that maps every
/// coordinate to the rectangle origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoScale {
    longitude: (f64, f64),
    latitude: (f64, f64),
    range_x: (f64, f64),
    range_y: (f64, f64),
    k: f64,
    translate: (f64, f64),
    #[serde(default)]
    brushed: bool,
}

impl GeoScale {
    #[must_use]
    pub fn new(
        longitude: (f64, f64),
        latitude: (f64, f64),
        range_x: (f64, f64),
        range_y: (f64, f64),
    ) -> Self {
        let mut scale = Self {
            longitude,
            latitude,
            range_x,
            range_y,
            k: 0.0,
            translate: (range_x.0, range_y.0),
            brushed: false,
        };
        scale.fit();
        scale
    }

    fn fit(&mut self) {
        let x0 = raw_x(self.longitude.0.min(self.longitude.1));
        let x1 = raw_x(self.longitude.0.max(self.longitude.1));
        let y0 = raw_y(self.latitude.0.max(self.latitude.1));
        let y1 = raw_y(self.latitude.0.min(self.latitude.1));
        let width = self.range_x.1 - self.range_x.0;
        let height = self.range_y.1 - self.range_y.0;

        let k = (width / (x1 - x0)).min(height / (y1 - y0));
        if !k.is_finite() || k <= 0.0 {
            self.k = 0.0;
            self.translate = (self.range_x.0, self.range_y.0);
            return;
        }

        self.k = k;
        self.translate = (
            self.range_x.0 + (width - k * (x1 - x0)) / 2.0 - k * x0,
            self.range_y.0 + (height - k * (y1 - y0)) / 2.0 - k * y0,
        );
    }

    /// `[[lon_min, lon_max], [lat_min, lat_max]]`.
    #[must_use]
    pub fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (self.longitude, self.latitude)
    }

    #[must_use]
    pub fn range(&self) -> ((f64, f64), (f64, f64)) {
        (self.range_x, self.range_y)
    }

    pub fn set_range(&mut self, range_x: (f64, f64), range_y: (f64, f64)) {
        self.range_x = range_x;
        self.range_y = range_y;
        self.fit();
    }

    pub fn set_domain(&mut self, longitude: (f64, f64), latitude: (f64, f64)) {
        self.longitude = longitude;
        self.latitude = latitude;
        self.fit();
    }

    #[must_use]
    pub fn brushed(&self) -> bool {
        self.brushed
    }

    pub fn set_brushed(&mut self, brushed: bool) {
        self.brushed = brushed;
    }

    #[must_use]
    pub fn project(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        (
            self.k * raw_x(longitude) + self.translate.0,
            self.k * raw_y(latitude) + self.translate.1,
        )
    }

    #[must_use]
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        if self.k == 0.0 {
            return (self.longitude.0, self.latitude.0);
        }
        let mx = (x - self.translate.0) / self.k;
        let my = (y - self.translate.1) / self.k;
        let latitude = 2.0 * (-my).exp().atan() - 2.0 * FRAC_PI_4;
        (mx.to_degrees(), latitude.to_degrees())
    }

    /// Longitude projected with latitude held at zero.
    #[must_use]
    pub fn scale_x(&self, longitude: f64) -> f64 {
        self.project(longitude, 0.0).0
    }

    /// Latitude projected with longitude held at zero.
    #[must_use]
    pub fn scale_y(&self, latitude: f64) -> f64 {
        self.project(0.0, latitude).1
    }
}

/// Which coordinate a [`GeoAxisScale`] maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoAxis {
    Longitude,
    Latitude,
}

/// One-dimensional view of a projection with the other coordinate held at 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoAxisScale {
    projection: GeoScale,
    axis: GeoAxis,
}

impl GeoAxisScale {
    #[must_use]
    pub fn new(projection: GeoScale, axis: GeoAxis) -> Self {
        Self { projection, axis }
    }

    #[must_use]
    pub fn axis(&self) -> GeoAxis {
        self.axis
    }

    #[must_use]
    pub fn projection(&self) -> &GeoScale {
        &self.projection
    }

    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        let (longitude, latitude) = self.projection.domain();
        match self.axis {
            GeoAxis::Longitude => longitude,
            GeoAxis::Latitude => latitude,
        }
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        let (range_x, range_y) = self.projection.range();
        match self.axis {
            GeoAxis::Longitude => range_x,
            GeoAxis::Latitude => range_y,
        }
    }

    pub fn set_range(&mut self, range: (f64, f64)) {
        let (range_x, range_y) = self.projection.range();
        match self.axis {
            GeoAxis::Longitude => self.projection.set_range(range, range_y),
            GeoAxis::Latitude => self.projection.set_range(range_x, range),
        }
    }

    #[must_use]
    pub fn brushed(&self) -> bool {
        self.projection.brushed()
    }

    pub fn set_brushed(&mut self, brushed: bool) {
        self.projection.set_brushed(brushed);
    }

    #[must_use]
    pub fn scale(&self, value: f64) -> f64 {
        match self.axis {
            GeoAxis::Longitude => self.projection.scale_x(value),
            GeoAxis::Latitude => self.projection.scale_y(value),
        }
    }
}

fn raw_x(longitude: f64) -> f64 {
    longitude.to_radians()
}

fn raw_y(latitude: f64) -> f64 {
    let phi = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    -(FRAC_PI_4 + phi / 2.0).tan().ln()
}

#[cfg(test)]
mod tests {
    use super::{GeoAxis, GeoAxisScale, GeoScale};
    use approx::assert_relative_eq;

    #[test]
    fn extent_fits_inside_range() {
        let scale = GeoScale::new((100.0, 120.0), (20.0, 40.0), (0.0, 400.0), (0.0, 400.0));
        let (x0, y0) = scale.project(100.0, 40.0);
        let (x1, y1) = scale.project(120.0, 20.0);
        assert!(x0 >= -1e-9 && x1 <= 400.0 + 1e-9);
        assert!(y0 >= -1e-9 && y1 <= 400.0 + 1e-9);
        assert!(x0 < x1 && y0 < y1);
    }

    #[test]
    fn invert_recovers_coordinates() {
        let scale = GeoScale::new((-10.0, 30.0), (35.0, 60.0), (0.0, 800.0), (0.0, 600.0));
        let (x, y) = scale.project(12.5, 48.0);
        let (lon, lat) = scale.invert(x, y);
        assert_relative_eq!(lon, 12.5, epsilon = 1e-9);
        assert_relative_eq!(lat, 48.0, epsilon = 1e-9);
    }

    #[test]
    fn axis_callables_hold_other_coordinate_at_zero() {
        let scale = GeoScale::new((-10.0, 30.0), (35.0, 60.0), (0.0, 800.0), (0.0, 600.0));
        assert_relative_eq!(scale.scale_x(5.0), scale.project(5.0, 0.0).0, epsilon = 1e-9);
        assert_relative_eq!(scale.scale_y(50.0), scale.project(0.0, 50.0).1, epsilon = 1e-9);
        assert_relative_eq!(scale.scale_x(5.0), scale.project(5.0, 50.0).0, epsilon = 1e-9);
    }

    #[test]
    fn axis_scale_follows_its_coordinate() {
        let scale = GeoScale::new((-10.0, 30.0), (35.0, 60.0), (0.0, 800.0), (0.0, 600.0));
        let latitude = GeoAxisScale::new(scale, GeoAxis::Latitude);
        assert_relative_eq!(latitude.scale(50.0), scale.scale_y(50.0), epsilon = 1e-9);
        assert_eq!(latitude.range(), (0.0, 600.0));
        assert_eq!(latitude.domain(), (35.0, 60.0));
    }

    #[test]
    fn degenerate_extent_is_constant() {
        let scale = GeoScale::new((10.0, 10.0), (5.0, 5.0), (3.0, 300.0), (7.0, 70.0));
        assert_eq!(scale.project(50.0, 50.0), (3.0, 7.0));
    }
}

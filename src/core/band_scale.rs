use serde::{Deserialize, Serialize};

/// Where the band block anchors inside its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandBoundary {
    /// Bands are centred in their slots and the block is centred in the range.
    #[default]
    Center,
    /// The first band's leading edge sits on the range start.
    Start,
}

/// Discrete domain mapped to pixel intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandScale {
    domain: Vec<String>,
    range: (f64, f64),
    padding_inner: f64,
    fixed_band_width: Option<f64>,
    boundary: BandBoundary,
    #[serde(default)]
    brushed: bool,
}

impl BandScale {
    #[must_use]
    pub fn new(domain: Vec<String>, range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            padding_inner: 0.0,
            fixed_band_width: None,
            boundary: BandBoundary::Center,
            brushed: false,
        }
    }

    #[must_use]
    pub fn with_padding_inner(mut self, padding_inner: f64) -> Self {
        self.padding_inner = clamp_padding(padding_inner);
        self
    }

    #[must_use]
    pub fn with_fixed_band_width(mut self, band_width: Option<f64>) -> Self {
        self.fixed_band_width = band_width.filter(|width| width.is_finite() && *width >= 0.0);
        self
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: BandBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    #[must_use]
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn set_domain(&mut self, domain: Vec<String>) {
        self.domain = domain;
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn set_range(&mut self, range: (f64, f64)) {
        self.range = range;
    }

    #[must_use]
    pub fn padding_inner(&self) -> f64 {
        self.padding_inner
    }

    #[must_use]
    pub fn boundary(&self) -> BandBoundary {
        self.boundary
    }

    #[must_use]
    pub fn brushed(&self) -> bool {
        self.brushed
    }

    pub fn set_brushed(&mut self, brushed: bool) {
        self.brushed = brushed;
    }

    /// Slot width including the inner gap, always `>= 0`.
    #[must_use]
    pub fn step(&self) -> f64 {
        if self.domain.is_empty() || !self.span().is_finite() {
            return 0.0;
        }
        match self.fixed_band_width {
            Some(width) => width / (1.0 - self.padding_inner),
            None => self.span().abs() / self.domain.len() as f64,
        }
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        if self.domain.is_empty() {
            return 0.0;
        }
        self.fixed_band_width
            .unwrap_or_else(|| self.step() * (1.0 - self.padding_inner))
    }

    /// Lower pixel edge of the band at `index`.
    #[must_use]
    pub fn position_at(&self, index: usize) -> f64 {
        let step = self.step();
        if step == 0.0 {
            return self.range.0;
        }
        let bandwidth = self.bandwidth();
        let count = self.domain.len() as f64;
        let span = self.span();
        let ascending = span >= 0.0;
        let low = self.range.0.min(self.range.1);
        let high = self.range.0.max(self.range.1);

        match self.boundary {
            BandBoundary::Center => {
                let block_offset = (span.abs() - step * count) / 2.0;
                let slot = if ascending {
                    index as f64
                } else {
                    count - 1.0 - index as f64
                };
                low + block_offset + step * slot + (step - bandwidth) / 2.0
            }
            BandBoundary::Start if ascending => low + step * index as f64,
            BandBoundary::Start => high - step * index as f64 - bandwidth,
        }
    }

    #[must_use]
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.domain.iter().position(|item| item == value)
    }

    /// Lower edge of the band for `value`.
    #[must_use]
    pub fn scale(&self, value: &str) -> Option<f64> {
        self.index_of(value).map(|index| self.position_at(index))
    }

    /// Band whose slot contains `pixel`.
    #[must_use]
    pub fn index_at(&self, pixel: f64) -> Option<usize> {
        let step = self.step();
        if step == 0.0 {
            return None;
        }
        (0..self.domain.len()).find(|&index| {
            let start = self.position_at(index) - (step - self.bandwidth()) / 2.0;
            pixel >= start && pixel < start + step
        })
    }

    fn span(&self) -> f64 {
        self.range.1 - self.range.0
    }
}

/// Discrete domain mapped to evenly spaced points of zero width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointScale {
    domain: Vec<String>,
    range: (f64, f64),
    padding: f64,
    #[serde(default)]
    brushed: bool,
}

impl PointScale {
    #[must_use]
    pub fn new(domain: Vec<String>, range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            padding: 0.0,
            brushed: false,
        }
    }

    /// Outer padding in multiples of the step.
    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = if padding.is_finite() {
            padding.max(0.0)
        } else {
            0.0
        };
        self
    }

    #[must_use]
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn set_domain(&mut self, domain: Vec<String>) {
        self.domain = domain;
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn set_range(&mut self, range: (f64, f64)) {
        self.range = range;
    }

    #[must_use]
    pub fn brushed(&self) -> bool {
        self.brushed
    }

    pub fn set_brushed(&mut self, brushed: bool) {
        self.brushed = brushed;
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        0.0
    }

    /// Signed distance between neighbouring points.
    #[must_use]
    pub fn step(&self) -> f64 {
        let gaps = self.domain.len().saturating_sub(1) as f64 + 2.0 * self.padding;
        if gaps == 0.0 {
            return 0.0;
        }
        (self.range.1 - self.range.0) / gaps
    }

    #[must_use]
    pub fn position_at(&self, index: usize) -> f64 {
        if self.domain.len() == 1 && self.padding == 0.0 {
            return (self.range.0 + self.range.1) / 2.0;
        }
        self.range.0 + self.step() * (self.padding + index as f64)
    }

    #[must_use]
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.domain.iter().position(|item| item == value)
    }

    #[must_use]
    pub fn scale(&self, value: &str) -> Option<f64> {
        self.index_of(value).map(|index| self.position_at(index))
    }

    /// Nearest point to `pixel`.
    #[must_use]
    pub fn index_at(&self, pixel: f64) -> Option<usize> {
        (0..self.domain.len()).min_by(|&a, &b| {
            let da = (self.position_at(a) - pixel).abs();
            let db = (self.position_at(b) - pixel).abs();
            da.total_cmp(&db)
        })
    }
}

fn clamp_padding(padding: f64) -> f64 {
    if padding.is_finite() {
        padding.clamp(0.0, 0.99)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn labels(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("c{i}")).collect()
    }

    #[test]
    fn centered_bands_sit_in_the_middle_of_their_slots() {
        let scale = BandScale::new(labels(4), (0.0, 400.0)).with_padding_inner(0.5);
        assert_relative_eq!(scale.step(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(scale.bandwidth(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(scale.position_at(0), 25.0, epsilon = 1e-9);
        assert_relative_eq!(scale.position_at(3), 325.0, epsilon = 1e-9);
    }

    #[test]
    fn start_boundary_pins_first_band() {
        let scale = BandScale::new(labels(4), (10.0, 410.0))
            .with_padding_inner(0.5)
            .with_boundary(BandBoundary::Start);
        assert_relative_eq!(scale.position_at(0), 10.0, epsilon = 1e-9);
        assert_relative_eq!(scale.position_at(1), 110.0, epsilon = 1e-9);
    }

    #[test]
    fn fixed_band_width_centres_the_whole_block() {
        let scale = BandScale::new(labels(2), (0.0, 400.0))
            .with_padding_inner(0.5)
            .with_fixed_band_width(Some(20.0));
        assert_relative_eq!(scale.step(), 40.0, epsilon = 1e-9);
        assert_relative_eq!(scale.bandwidth(), 20.0, epsilon = 1e-9);
        // block of 80px centred in 400px starts at 160, band centred in slot
        assert_relative_eq!(scale.position_at(0), 170.0, epsilon = 1e-9);

        let anchored = scale.clone().with_boundary(BandBoundary::Start);
        assert_relative_eq!(anchored.position_at(0), 0.0, epsilon = 1e-9);
        assert_relative_eq!(anchored.position_at(1), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn descending_range_reverses_order() {
        let scale = BandScale::new(labels(2), (200.0, 0.0));
        assert_relative_eq!(scale.position_at(0), 100.0, epsilon = 1e-9);
        assert_relative_eq!(scale.position_at(1), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_band_scale_is_constant() {
        let scale = BandScale::new(Vec::new(), (5.0, 100.0));
        assert_eq!(scale.bandwidth(), 0.0);
        assert_eq!(scale.position_at(3), 5.0);
        assert_eq!(scale.scale("x"), None);
    }

    #[test]
    fn point_scale_spreads_evenly() {
        let scale = PointScale::new(labels(3), (0.0, 100.0));
        assert_relative_eq!(scale.position_at(0), 0.0, epsilon = 1e-9);
        assert_relative_eq!(scale.position_at(1), 50.0, epsilon = 1e-9);
        assert_relative_eq!(scale.position_at(2), 100.0, epsilon = 1e-9);
        assert_eq!(scale.bandwidth(), 0.0);

        let single = PointScale::new(labels(1), (0.0, 100.0));
        assert_relative_eq!(single.position_at(0), 50.0, epsilon = 1e-9);
        assert_eq!(scale.index_at(60.0), Some(1));
    }
}

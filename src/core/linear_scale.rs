use serde::{Deserialize, Serialize};

/// Options for [`LinearScale::nice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NiceOptions {
    /// Target tick count.
    pub count: usize,
    /// Force the domain to include zero before rounding.
    pub zero: bool,
}

impl Default for NiceOptions {
    fn default() -> Self {
        Self {
            count: 5,
            zero: false,
        }
    }
}

impl NiceOptions {
    #[must_use]
    pub fn new(count: usize, zero: bool) -> Self {
        Self { count, zero }
    }
}

/// Continuous numeric domain mapped proportionally onto a pixel range.
///
/// Construction never fails: a zero-width domain maps every value to the
/// range start, a zero-width range inverts every pixel to the domain start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    #[serde(default)]
    brushed: bool,
}

impl LinearScale {
    #[must_use]
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain: sanitize(domain),
            range: sanitize(range),
            brushed: false,
        }
    }

    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn set_domain(&mut self, domain: (f64, f64)) {
        self.domain = sanitize(domain);
    }

    pub fn set_range(&mut self, range: (f64, f64)) {
        self.range = sanitize(range);
    }

    #[must_use]
    pub fn brushed(&self) -> bool {
        self.brushed
    }

    pub fn set_brushed(&mut self, brushed: bool) {
        self.brushed = brushed;
    }

    #[must_use]
    pub fn scale(&self, value: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span == 0.0 || !value.is_finite() {
            return self.range.0;
        }
        let normalized = (value - self.domain.0) / span;
        self.range.0 + normalized * (self.range.1 - self.range.0)
    }

    #[must_use]
    pub fn invert(&self, pixel: f64) -> f64 {
        let span = self.range.1 - self.range.0;
        if span == 0.0 || !pixel.is_finite() {
            return self.domain.0;
        }
        let normalized = (pixel - self.range.0) / span;
        self.domain.0 + normalized * (self.domain.1 - self.domain.0)
    }

    /// Extends the domain outward to round tick steps.
    ///
    /// Zero inclusion happens before rounding so the rounded bounds keep it.
    #[must_use]
    pub fn nice(mut self, options: NiceOptions) -> Self {
        let reversed = self.domain.1 < self.domain.0;
        let (mut min, mut max) = if reversed {
            (self.domain.1, self.domain.0)
        } else {
            self.domain
        };

        if options.zero {
            min = min.min(0.0);
            max = max.max(0.0);
        }

        let mut previous = None;
        for _ in 0..10 {
            let Some(step) = tick_step(min, max, options.count) else {
                break;
            };
            if previous == Some(step) {
                break;
            }
            if step < 1.0 {
                let inverse = (1.0 / step).round();
                min = (min * inverse).floor() / inverse;
                max = (max * inverse).ceil() / inverse;
            } else {
                min = (min / step).floor() * step;
                max = (max / step).ceil() * step;
            }
            previous = Some(step);
        }

        self.domain = if reversed { (max, min) } else { (min, max) };
        self
    }

    /// Round tick values inside the domain.
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (min, max) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        let Some(step) = tick_step(min, max, count) else {
            return if min == max { vec![min] } else { Vec::new() };
        };

        let first = (min / step).ceil() as i64;
        let last = (max / step).floor() as i64;
        (first..=last).map(|i| tick_value(i, step)).collect()
    }
}

/// Step of magnitude `10^k * {1, 2, 5}` closest to `span / count`.
pub(crate) fn tick_step(min: f64, max: f64, count: usize) -> Option<f64> {
    let span = max - min;
    if !span.is_finite() || span <= 0.0 {
        return None;
    }
    let raw = span / count.max(1) as f64;
    let power = raw.log10().floor();
    let base = 10f64.powf(power);
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    Some(factor * base)
}

fn tick_value(index: i64, step: f64) -> f64 {
    if step < 1.0 {
        // Dividing by the inverse step keeps decimal ticks exact.
        let inverse = (1.0 / step).round();
        index as f64 / inverse
    } else {
        index as f64 * step
    }
}

fn sanitize((start, end): (f64, f64)) -> (f64, f64) {
    match (start.is_finite(), end.is_finite()) {
        (true, true) => (start, end),
        (true, false) => (start, start),
        (false, true) => (end, end),
        (false, false) => (0.0, 0.0),
    }
}

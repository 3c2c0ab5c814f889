/// Number of travel histogram bins.
pub const TRAVEL_BINS: usize = 20;
/// Width of one velocity histogram bin, in mm/s.
pub const VELOCITY_BIN_WIDTH: f64 = 100.0;

/// Evenly spaced bin edges over a value range.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    pub edges: Vec<f64>,
}

impl Bins {
    /// [`TRAVEL_BINS`] bins covering `0..=max_travel`.
    pub fn travel(max_travel: f64) -> Self {
        let max = if max_travel > 0.0 { max_travel } else { 1.0 };
        let width = max / TRAVEL_BINS as f64;
        Self {
            edges: (0..=TRAVEL_BINS).map(|i| i as f64 * width).collect(),
        }
    }

    /// Fixed-width bins aligned to multiples of [`VELOCITY_BIN_WIDTH`] that
    /// cover every value.
    pub fn velocity(values: &[f64]) -> Self {
        let (min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        let lo = (min / VELOCITY_BIN_WIDTH).floor();
        let mut hi = (max / VELOCITY_BIN_WIDTH).ceil();
        if hi <= lo {
            hi = lo + 1.0;
        }
        Self {
            edges: (lo as i64..=hi as i64)
                .map(|i| i as f64 * VELOCITY_BIN_WIDTH)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the bin `value` falls into; out-of-range values go to the
    /// first or last bin.
    pub fn index(&self, value: f64) -> usize {
        let last = self.len().saturating_sub(1);
        let (Some(first), Some(end)) = (self.edges.first(), self.edges.last()) else {
            return 0;
        };
        let width = (end - first) / self.len().max(1) as f64;
        if !value.is_finite() || width <= 0.0 || value <= *first {
            return 0;
        }
        (((value - first) / width).floor() as usize).min(last)
    }

    pub fn digitize(&self, values: &[f64]) -> Vec<usize> {
        values.iter().map(|v| self.index(*v)).collect()
    }
}

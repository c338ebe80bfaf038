use thiserror::Error;

/// Default number of quantile bins.
pub const DEFAULT_TEMPO_BINS: usize = 5;

/// Tempo values above this are bucketed as exactly this value.
pub const DEFAULT_TEMPO_CAP: f64 = 250.0;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BinningError {
    #[error("no tempo values to bin")]
    Empty,
    #[error("tempo values collapse to a single bin edge ({0})")]
    InsufficientVariance(f64),
}

// ---------------------------------------------------------------------------
// Quantile bins over the filtered view
// ---------------------------------------------------------------------------

/// Ordered tempo ranges (slowest first). Edges depend on the values they were
/// computed from, so they change with every filter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoBins {
    /// Strictly increasing bin edges, `labels.len() + 1` of them.
    pub edges: Vec<f64>,
    /// `"{lower}-{upper}"` per bin, edges truncated to integers.
    pub labels: Vec<String>,
    cap: f64,
}

impl TempoBins {
    /// Compute up to `num_bins` quantile bins. Values are clamped to `cap`
    /// first; tied quantiles collapse, so fewer bins may come back.
    pub fn compute(values: &[f64], num_bins: usize, cap: f64) -> Result<Self, BinningError> {
        let mut clamped: Vec<f64> = values
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| v.min(cap))
            .collect();
        if clamped.is_empty() {
            return Err(BinningError::Empty);
        }
        clamped.sort_by(f64::total_cmp);

        let num_bins = num_bins.max(1);
        let step = 1.0 / num_bins as f64;
        let mut edges: Vec<f64> = (0..=num_bins)
            .map(|i| {
                let q = if i == num_bins { 1.0 } else { i as f64 * step };
                quantile(&clamped, q).min(cap)
            })
            .collect();
        edges.dedup();

        if edges.len() < 2 {
            return Err(BinningError::InsufficientVariance(edges[0]));
        }

        let labels = edges
            .windows(2)
            .map(|w| format!("{}-{}", w[0] as i64, w[1] as i64))
            .collect();

        Ok(TempoBins { edges, labels, cap })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index of the bin holding `value` (after clamping). The first bin is
    /// closed on both ends, the others are `(lower, upper]`.
    pub fn assign(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let v = value.min(self.cap);
        let first = *self.edges.first()?;
        let last = *self.edges.last()?;
        if v < first || v > last {
            return None;
        }
        // First edge >= v; the bin ends at that edge.
        let upper = self.edges.partition_point(|&e| e < v);
        Some(upper.saturating_sub(1))
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }
}

/// Linear interpolation between order statistics of a sorted slice.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = (pos.floor() as usize).min(sorted.len() - 1);
    let hi = (pos.ceil() as usize).min(sorted.len() - 1);
    let (a, b) = (sorted[lo], sorted[hi]);
    let t = pos - lo as f64;
    if t >= 0.5 {
        b - (b - a) * (1.0 - t)
    } else {
        a + (b - a) * t
    }
}

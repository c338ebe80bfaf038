use super::derive::{Bounds, Respondent, SurveyDataset};

// ---------------------------------------------------------------------------
// Range predicates
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` range on one numeric dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter {
    pub min: f64,
    pub max: f64,
}

impl RangeFilter {
    pub fn new(min: f64, max: f64) -> Self {
        RangeFilter { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Whether the range admits every observed value of the dimension.
    pub fn spans(&self, bounds: &Bounds) -> bool {
        self.min <= bounds.min && self.max >= bounds.max
    }
}

impl From<Bounds> for RangeFilter {
    fn from(b: Bounds) -> Self {
        RangeFilter::new(b.min, b.max)
    }
}

/// Current values of the primary range controls.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub hours: RangeFilter,
    pub avg_health: RangeFilter,
    /// Present only when the dataset has a tempo column.
    pub tempo: Option<RangeFilter>,
}

impl FilterState {
    /// Every control at its observed min/max: shows the whole cleaned table.
    pub fn full_range(dataset: &SurveyDataset) -> Self {
        let zero = Bounds { min: 0.0, max: 0.0 };
        FilterState {
            hours: dataset.hours_bounds().unwrap_or(zero).into(),
            avg_health: dataset.health_bounds().unwrap_or(zero).into(),
            tempo: dataset.tempo_bounds().map(RangeFilter::from),
        }
    }
}

/// Full-range state of the secondary hours control feeding the age-group view.
pub fn full_hours_range(dataset: &SurveyDataset) -> RangeFilter {
    dataset
        .hours_bounds()
        .map(RangeFilter::from)
        .unwrap_or(RangeFilter::new(0.0, 0.0))
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return indices of respondents that pass every active range.
///
/// A respondent passes the tempo range when:
/// * there is no tempo range → passes
/// * its tempo lies inside the range → passes
/// * it has no tempo value → passes only while the range spans every observed
///   tempo, i.e. the control is not constraining anything
pub fn filtered_indices(dataset: &SurveyDataset, filters: &FilterState) -> Vec<usize> {
    let tempo_unconstrained = match (&filters.tempo, dataset.tempo_bounds()) {
        (Some(range), Some(bounds)) => range.spans(&bounds),
        _ => true,
    };

    dataset
        .respondents
        .iter()
        .enumerate()
        .filter(|(_, r)| passes(r, filters, tempo_unconstrained))
        .map(|(i, _)| i)
        .collect()
}

fn passes(r: &Respondent, filters: &FilterState, tempo_unconstrained: bool) -> bool {
    if !filters.hours.contains(r.hours_per_day) {
        return false;
    }
    if !filters.avg_health.contains(r.avg_health) {
        return false;
    }
    match (&filters.tempo, r.tempo) {
        (Some(range), Some(tempo)) => range.contains(tempo),
        (Some(_), None) => tempo_unconstrained,
        (None, _) => true,
    }
}

/// Indices of respondents whose hours per day fall in `range`; used by the
/// age-group view independently of the primary filters.
pub fn hours_indices(dataset: &SurveyDataset, range: &RangeFilter) -> Vec<usize> {
    dataset
        .respondents
        .iter()
        .enumerate()
        .filter(|(_, r)| range.contains(r.hours_per_day))
        .map(|(i, _)| i)
        .collect()
}

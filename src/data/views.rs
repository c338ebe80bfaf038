use std::collections::BTreeMap;

use thiserror::Error;

use super::derive::{AgeGroup, ListeningType, Respondent, SurveyDataset};
use super::filter::{FilterState, RangeFilter, filtered_indices, hours_indices};
use super::tempo::{self, BinningError, DEFAULT_TEMPO_BINS, DEFAULT_TEMPO_CAP, TempoBins};

/// Why a single view has nothing to render. Never fatal: the other views of
/// the same pass are unaffected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ViewError {
    #[error("no data for this view")]
    NoData,
    #[error("tempo (BPM) data not found in this dataset")]
    TempoUnavailable,
    #[error("could not compute tempo bins: {0}")]
    Binning(#[from] BinningError),
}

pub type ViewResult<T> = Result<T, ViewError>;

/// Tunables of the view pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub tempo_bins: usize,
    pub tempo_cap: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            tempo_bins: DEFAULT_TEMPO_BINS,
            tempo_cap: DEFAULT_TEMPO_CAP,
        }
    }
}

// ---------------------------------------------------------------------------
// View shapes handed to the renderer
// ---------------------------------------------------------------------------

/// Ordinary least squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a trend line; `None` for fewer than two points or constant x.
pub fn linear_fit(points: &[[f64; 2]]) -> Option<Trend> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for p in points {
        let dx = p[0] - mean_x;
        sxy += dx * (p[1] - mean_y);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(Trend {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// A labelled point cloud with its own trend line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub label: String,
    pub points: Vec<[f64; 2]>,
    pub trend: Option<Trend>,
}

impl ScatterSeries {
    fn new(label: impl Into<String>, points: Vec<[f64; 2]>) -> Self {
        let trend = linear_fit(&points);
        ScatterSeries {
            label: label.into(),
            points,
            trend,
        }
    }
}

/// Grouped counts: one series per colour key, one count per category.
#[derive(Debug, Clone, PartialEq)]
pub struct CountHistogram {
    pub categories: Vec<String>,
    /// `(series label, count per category)`.
    pub series: Vec<(String, Vec<usize>)>,
}

/// Five-number summary of a distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxSummary {
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        Some(BoxSummary {
            min: sorted[0],
            q1: tempo::quantile(&sorted, 0.25),
            median: tempo::quantile(&sorted, 0.5),
            q3: tempo::quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Values of one group plus their summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub label: String,
    pub values: Vec<f64>,
    pub summary: BoxSummary,
}

impl Distribution {
    fn new(label: impl Into<String>, values: Vec<f64>) -> Option<Self> {
        let summary = BoxSummary::of(&values)?;
        Some(Distribution {
            label: label.into(),
            values,
            summary,
        })
    }
}

/// Average health per tempo range, slowest range first.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoBoxView {
    pub bins: TempoBins,
    /// One entry per non-empty bin, in bin order.
    pub groups: Vec<Distribution>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenreRow {
    pub genre: String,
    pub count: usize,
    /// Mean per health column.
    pub health_means: Vec<f64>,
    /// Mean of `health_means`; lower is better.
    pub overall: f64,
}

/// Favourite genres ranked best (lowest severity) to worst.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreSummary {
    pub health_columns: Vec<String>,
    pub rows: Vec<GenreRow>,
}

impl GenreSummary {
    /// Smallest and largest per-column mean, for heatmap scaling.
    pub fn mean_range(&self) -> (f64, f64) {
        self.rows
            .iter()
            .flat_map(|r| r.health_means.iter().copied())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListeningGroup {
    pub listening_type: ListeningType,
    pub count: usize,
    /// One distribution per health column.
    pub per_health: Vec<Distribution>,
}

/// Health distributions for single- vs multi-genre listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct ListeningDistribution {
    pub health_columns: Vec<String>,
    pub groups: Vec<ListeningGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeGroupRow {
    pub group: AgeGroup,
    pub count: usize,
    pub health_means: Vec<f64>,
    pub mean_hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeGroupSummary {
    pub health_columns: Vec<String>,
    pub rows: Vec<AgeGroupRow>,
}

// ---------------------------------------------------------------------------
// The pipeline
// ---------------------------------------------------------------------------

/// Everything the dashboard renders for one filter state.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardViews {
    /// Indices of respondents in the primary filtered view.
    pub visible: Vec<usize>,
    /// Respondents feeding the age-group view.
    pub age_rows: usize,
    pub hours_scatter: ViewResult<ScatterSeries>,
    pub effect_histogram: ViewResult<CountHistogram>,
    pub tempo_scatter: ViewResult<Vec<ScatterSeries>>,
    pub tempo_box: ViewResult<TempoBoxView>,
    pub genre_summary: ViewResult<GenreSummary>,
    pub listening: ViewResult<ListeningDistribution>,
    pub age_groups: ViewResult<AgeGroupSummary>,
}

/// Recompute every view from the base table. Pure: the same inputs always
/// yield the same output.
pub fn compute_views(
    dataset: &SurveyDataset,
    filters: &FilterState,
    age_hours: &RangeFilter,
    settings: &ViewSettings,
) -> DashboardViews {
    let visible = filtered_indices(dataset, filters);
    let rows = select(dataset, &visible);
    let age_idx = hours_indices(dataset, age_hours);
    let age_rows = select(dataset, &age_idx);
    let health_columns = dataset.health_columns();

    let tempo_box = tempo_box(dataset, &rows, settings);
    if let Err(ViewError::Binning(e)) = &tempo_box {
        log::warn!("Could not compute tempo bins: {e}");
    }

    DashboardViews {
        hours_scatter: hours_scatter(&rows),
        effect_histogram: effect_histogram(&rows),
        tempo_scatter: tempo_scatter(dataset, &rows),
        tempo_box,
        genre_summary: genre_summary(&rows, health_columns),
        listening: listening_distribution(&rows, health_columns),
        age_groups: age_group_summary(&age_rows, health_columns),
        age_rows: age_rows.len(),
        visible,
    }
}

fn select<'a>(dataset: &'a SurveyDataset, indices: &[usize]) -> Vec<&'a Respondent> {
    indices.iter().map(|&i| &dataset.respondents[i]).collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

fn health_means(rows: &[&Respondent], n_columns: usize) -> Vec<f64> {
    (0..n_columns)
        .map(|c| mean(rows.iter().map(|r| r.health[c])))
        .collect()
}

/// Hours listened vs average health.
pub fn hours_scatter(rows: &[&Respondent]) -> ViewResult<ScatterSeries> {
    if rows.is_empty() {
        return Err(ViewError::NoData);
    }
    let points = rows.iter().map(|r| [r.hours_per_day, r.avg_health]).collect();
    Ok(ScatterSeries::new("Respondents", points))
}

/// Reported music effect counts, split by exploratory listening.
pub fn effect_histogram(rows: &[&Respondent]) -> ViewResult<CountHistogram> {
    if rows.is_empty() {
        return Err(ViewError::NoData);
    }
    let mut counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    let mut categories: BTreeMap<&str, ()> = BTreeMap::new();
    for r in rows {
        categories.insert(&r.music_effect, ());
        *counts
            .entry(&r.exploratory)
            .or_default()
            .entry(&r.music_effect)
            .or_default() += 1;
    }
    let categories: Vec<&str> = categories.into_keys().collect();
    let series = counts
        .into_iter()
        .map(|(key, per_effect)| {
            let counts = categories
                .iter()
                .map(|c| per_effect.get(c).copied().unwrap_or(0))
                .collect();
            (key.to_string(), counts)
        })
        .collect();

    Ok(CountHistogram {
        categories: categories.into_iter().map(String::from).collect(),
        series,
    })
}

/// Tempo vs average health, one series per exploratory answer.
pub fn tempo_scatter(
    dataset: &SurveyDataset,
    rows: &[&Respondent],
) -> ViewResult<Vec<ScatterSeries>> {
    if !dataset.has_tempo() {
        return Err(ViewError::TempoUnavailable);
    }
    let mut groups: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for r in rows {
        if let Some(tempo) = r.tempo {
            groups
                .entry(&r.exploratory)
                .or_default()
                .push([tempo, r.avg_health]);
        }
    }
    if groups.is_empty() {
        return Err(ViewError::NoData);
    }
    Ok(groups
        .into_iter()
        .map(|(label, points)| ScatterSeries::new(label, points))
        .collect())
}

/// Average health per quantile tempo range of the current view.
pub fn tempo_box(
    dataset: &SurveyDataset,
    rows: &[&Respondent],
    settings: &ViewSettings,
) -> ViewResult<TempoBoxView> {
    if !dataset.has_tempo() {
        return Err(ViewError::TempoUnavailable);
    }
    if rows.is_empty() {
        return Err(ViewError::NoData);
    }
    let tempos: Vec<f64> = rows.iter().filter_map(|r| r.tempo).collect();
    let bins = TempoBins::compute(&tempos, settings.tempo_bins, settings.tempo_cap)?;

    let mut per_bin: Vec<Vec<f64>> = vec![Vec::new(); bins.len()];
    for r in rows {
        if let Some(bin) = r.tempo.and_then(|t| bins.assign(t)) {
            per_bin[bin].push(r.avg_health);
        }
    }
    let groups = bins
        .labels
        .iter()
        .zip(per_bin)
        .filter_map(|(label, values)| Distribution::new(label.as_str(), values))
        .collect();

    Ok(TempoBoxView { bins, groups })
}

/// Mean health per favourite genre, best genre first.
pub fn genre_summary(rows: &[&Respondent], health_columns: &[String]) -> ViewResult<GenreSummary> {
    let mut by_genre: BTreeMap<&str, Vec<&Respondent>> = BTreeMap::new();
    for &r in rows {
        if let Some(genre) = &r.fav_genre {
            by_genre.entry(genre).or_default().push(r);
        }
    }
    if by_genre.is_empty() {
        return Err(ViewError::NoData);
    }

    let mut out: Vec<GenreRow> = by_genre
        .into_iter()
        .map(|(genre, members)| {
            let health_means = health_means(&members, health_columns.len());
            GenreRow {
                genre: genre.to_string(),
                count: members.len(),
                overall: mean(health_means.iter().copied()),
                health_means,
            }
        })
        .collect();
    // Stable sort keeps genre names alphabetical among ties.
    out.sort_by(|a, b| a.overall.total_cmp(&b.overall));

    Ok(GenreSummary {
        health_columns: health_columns.to_vec(),
        rows: out,
    })
}

/// Health distributions for single- vs multi-genre listeners.
pub fn listening_distribution(
    rows: &[&Respondent],
    health_columns: &[String],
) -> ViewResult<ListeningDistribution> {
    let groups: Vec<ListeningGroup> = ListeningType::ALL
        .into_iter()
        .filter_map(|lt| {
            let members: Vec<&Respondent> = rows
                .iter()
                .copied()
                .filter(|r| r.listening_type == lt)
                .collect();
            if members.is_empty() {
                return None;
            }
            let per_health = health_columns
                .iter()
                .enumerate()
                .filter_map(|(c, col)| {
                    Distribution::new(col.as_str(), members.iter().map(|r| r.health[c]).collect())
                })
                .collect();
            Some(ListeningGroup {
                listening_type: lt,
                count: members.len(),
                per_health,
            })
        })
        .collect();

    if groups.is_empty() {
        return Err(ViewError::NoData);
    }
    Ok(ListeningDistribution {
        health_columns: health_columns.to_vec(),
        groups,
    })
}

/// Mean health and listening hours per age bucket.
pub fn age_group_summary(
    rows: &[&Respondent],
    health_columns: &[String],
) -> ViewResult<AgeGroupSummary> {
    let mut by_group: BTreeMap<AgeGroup, Vec<&Respondent>> = BTreeMap::new();
    for &r in rows {
        if let Some(group) = r.age_group {
            by_group.entry(group).or_default().push(r);
        }
    }
    if by_group.is_empty() {
        return Err(ViewError::NoData);
    }
    let rows = by_group
        .into_iter()
        .map(|(group, members)| AgeGroupRow {
            group,
            count: members.len(),
            health_means: health_means(&members, health_columns.len()),
            mean_hours: mean(members.iter().map(|r| r.hours_per_day)),
        })
        .collect();

    Ok(AgeGroupSummary {
        health_columns: health_columns.to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::tests::SURVEY_CSV;
    use crate::data::filter::full_hours_range;
    use crate::data::loader::parse_csv;
    use approx::assert_relative_eq;

    fn dataset(csv: &str) -> SurveyDataset {
        SurveyDataset::from_raw(&parse_csv(csv.as_bytes()).unwrap()).unwrap()
    }

    fn all_rows(ds: &SurveyDataset) -> Vec<&Respondent> {
        ds.respondents.iter().collect()
    }

    #[test]
    fn genre_means_rank_best_first() {
        let ds = dataset(
            "\
Fav genre,Hours per day,Exploratory,Music effects,Anxiety
Rock,1,Yes,Improve,4
Rock,2,No,Improve,6
Jazz,3,Yes,No effect,2
",
        );
        let summary = genre_summary(&all_rows(&ds), ds.health_columns()).unwrap();
        let genres: Vec<&str> = summary.rows.iter().map(|r| r.genre.as_str()).collect();
        assert_eq!(genres, ["Jazz", "Rock"]);
        assert_relative_eq!(summary.rows[0].health_means[0], 2.0);
        assert_relative_eq!(summary.rows[1].health_means[0], 5.0);
        assert_eq!(summary.rows[1].count, 2);
        assert_eq!(summary.mean_range(), (2.0, 5.0));
    }

    #[test]
    fn genre_overall_is_mean_of_column_means() {
        let ds = dataset(SURVEY_CSV);
        let summary = genre_summary(&all_rows(&ds), ds.health_columns()).unwrap();
        let rock = summary.rows.iter().find(|r| r.genre == "Rock").unwrap();
        // Rock rows: [7,6,2,1] and [8,7,5,4]
        assert_eq!(rock.health_means, vec![7.5, 6.5, 3.5, 2.5]);
        assert_relative_eq!(rock.overall, 5.0);
        assert!(summary.rows.windows(2).all(|w| w[0].overall <= w[1].overall));
    }

    #[test]
    fn listening_groups_hold_distributions() {
        let ds = dataset(SURVEY_CSV);
        let view = listening_distribution(&all_rows(&ds), ds.health_columns()).unwrap();
        assert_eq!(view.groups.len(), 2);
        let single = &view.groups[0];
        assert_eq!(single.listening_type, ListeningType::Single);
        // Rows 0, 1 and 4 have exactly one active genre.
        assert_eq!(single.count, 3);
        assert_eq!(single.per_health.len(), 4);
        assert_eq!(single.per_health[0].label, "Anxiety");
        assert_eq!(single.per_health[0].values, vec![7.0, 3.0, 9.0]);
        assert_relative_eq!(single.per_health[0].summary.median, 7.0);
        assert_relative_eq!(single.per_health[0].summary.min, 3.0);
        assert_relative_eq!(single.per_health[0].summary.max, 9.0);
    }

    #[test]
    fn age_groups_use_their_own_hours_range() {
        let ds = dataset(SURVEY_CSV);
        let mut filters = FilterState::full_range(&ds);
        filters.hours = RangeFilter::new(100.0, 200.0);
        let views = compute_views(&ds, &filters, &full_hours_range(&ds), &ViewSettings::default());

        assert!(views.visible.is_empty());
        let ages = views.age_groups.unwrap();
        let labels: Vec<&str> = ages.rows.iter().map(|r| r.group.label()).collect();
        assert_eq!(labels, ["18-25", "26-40", "41-60"]);
        let young = &ages.rows[0];
        assert_eq!(young.count, 2);
        assert_relative_eq!(young.mean_hours, 2.25);
    }

    #[test]
    fn secondary_hours_change_leaves_primary_views_alone() {
        let ds = dataset(SURVEY_CSV);
        let filters = FilterState::full_range(&ds);
        let settings = ViewSettings::default();
        let wide = compute_views(&ds, &filters, &full_hours_range(&ds), &settings);
        let narrow = compute_views(&ds, &filters, &RangeFilter::new(3.5, 4.0), &settings);

        assert_eq!(wide.visible, narrow.visible);
        assert_eq!(wide.genre_summary, narrow.genre_summary);
        assert_eq!(wide.listening, narrow.listening);
        assert_ne!(wide.age_groups, narrow.age_groups);
        assert_eq!(narrow.age_rows, 1);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let ds = dataset(SURVEY_CSV);
        let mut filters = FilterState::full_range(&ds);
        filters.avg_health = RangeFilter::new(1.0, 5.0);
        let age = RangeFilter::new(1.0, 3.0);
        let settings = ViewSettings::default();
        assert_eq!(
            compute_views(&ds, &filters, &age, &settings),
            compute_views(&ds, &filters, &age, &settings)
        );
    }

    #[test]
    fn excluding_every_row_reports_no_data() {
        let mut csv = String::from("Age,Hours per day,Fav genre,Exploratory,BPM,Anxiety,Depression,Music effects\n");
        for i in 0..10 {
            let depression = if i < 2 { String::new() } else { (i % 7).to_string() };
            csv.push_str(&format!(
                "{},{},Rock,Yes,{},{},{},Improve\n",
                20 + i,
                i % 5,
                80 + i * 10,
                i % 10,
                depression
            ));
        }
        let ds = dataset(&csv);
        assert_eq!(ds.len(), 8);

        let mut filters = FilterState::full_range(&ds);
        filters.hours = RangeFilter::new(50.0, 60.0);
        let views = compute_views(
            &ds,
            &filters,
            &RangeFilter::new(50.0, 60.0),
            &ViewSettings::default(),
        );

        assert_eq!(views.genre_summary, Err(ViewError::NoData));
        assert_eq!(views.listening, Err(ViewError::NoData));
        assert_eq!(views.age_groups, Err(ViewError::NoData));
        assert_eq!(views.hours_scatter, Err(ViewError::NoData));
        assert_eq!(views.effect_histogram, Err(ViewError::NoData));
        assert_eq!(views.tempo_scatter, Err(ViewError::NoData));
        assert_eq!(views.tempo_box, Err(ViewError::NoData));
    }

    #[test]
    fn tempo_views_unavailable_without_tempo_column() {
        let ds = dataset("Hours per day,Exploratory,Music effects,Anxiety\n1,No,Improve,3\n2,Yes,Worsen,5\n");
        let filters = FilterState::full_range(&ds);
        assert!(filters.tempo.is_none());
        let views = compute_views(&ds, &filters, &full_hours_range(&ds), &ViewSettings::default());
        assert_eq!(views.tempo_scatter, Err(ViewError::TempoUnavailable));
        assert_eq!(views.tempo_box, Err(ViewError::TempoUnavailable));
        assert!(views.hours_scatter.is_ok());
        assert!(views.effect_histogram.is_ok());
    }

    #[test]
    fn binning_failure_only_affects_tempo_box() {
        let ds = dataset(
            "Hours per day,Exploratory,Music effects,Anxiety,BPM\n1,No,Improve,3,120\n2,Yes,Worsen,5,120\n",
        );
        let filters = FilterState::full_range(&ds);
        let views = compute_views(&ds, &filters, &full_hours_range(&ds), &ViewSettings::default());
        assert_eq!(
            views.tempo_box,
            Err(ViewError::Binning(BinningError::InsufficientVariance(120.0)))
        );
        assert!(views.tempo_scatter.is_ok());
        assert!(views.hours_scatter.is_ok());
    }

    #[test]
    fn tempo_box_orders_ranges_slow_to_fast() {
        let ds = dataset(SURVEY_CSV);
        let rows = all_rows(&ds);
        let view = tempo_box(&ds, &rows, &ViewSettings { tempo_bins: 2, tempo_cap: 250.0 }).unwrap();
        // Tempos 90, 120, 160, 200 → edges 90, 140, 200.
        assert_eq!(view.bins.labels, ["90-140", "140-200"]);
        let labels: Vec<&str> = view.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["90-140", "140-200"]);
        assert_eq!(view.groups[0].values, vec![4.0, 1.5]);
        assert_eq!(view.groups[1].values, vec![6.0, 6.5]);
    }

    #[test]
    fn effect_histogram_counts_per_group() {
        let ds = dataset(SURVEY_CSV);
        let hist = effect_histogram(&all_rows(&ds)).unwrap();
        assert_eq!(hist.categories, ["Improve", "No effect", "Worsen"]);
        assert_eq!(
            hist.series,
            vec![
                ("No".to_string(), vec![0, 2, 0]),
                ("Yes".to_string(), vec![2, 0, 1]),
            ]
        );
    }

    #[test]
    fn trend_line_fits_exact_line() {
        let trend = linear_fit(&[[0.0, 1.0], [1.0, 3.0], [2.0, 5.0]]).unwrap();
        assert_relative_eq!(trend.slope, 2.0);
        assert_relative_eq!(trend.intercept, 1.0);
        assert_relative_eq!(trend.at(3.0), 7.0);
        assert!(linear_fit(&[[1.0, 1.0], [1.0, 2.0]]).is_none());
        assert!(linear_fit(&[[1.0, 1.0]]).is_none());
    }
}

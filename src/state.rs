use crate::config::DashboardConfig;
use crate::data::derive::SurveyDataset;
use crate::data::filter::{FilterState, RangeFilter, full_hours_range};
use crate::data::loader::load_source;
use crate::data::views::{DashboardViews, ViewSettings, compute_views};

// ---------------------------------------------------------------------------
// Session – one loaded dataset and its controls
// ---------------------------------------------------------------------------

/// Everything tied to the currently loaded dataset. The dataset is read-only;
/// only the control values change, and the views follow them.
pub struct Session {
    pub dataset: SurveyDataset,
    /// Where the dataset came from (URL or path).
    pub source: String,
    /// Primary range controls (sidebar).
    pub filters: FilterState,
    /// Hours range of the age-group view, separate from `filters.hours`.
    pub age_hours: RangeFilter,
    views: DashboardViews,
    /// Control values `views` were computed for.
    computed_for: (FilterState, RangeFilter),
}

impl Session {
    pub fn new(dataset: SurveyDataset, source: String, settings: &ViewSettings) -> Self {
        let filters = FilterState::full_range(&dataset);
        let age_hours = full_hours_range(&dataset);
        let views = compute_views(&dataset, &filters, &age_hours, settings);
        Session {
            computed_for: (filters.clone(), age_hours),
            dataset,
            source,
            filters,
            age_hours,
            views,
        }
    }

    pub fn views(&self) -> &DashboardViews {
        &self.views
    }

    /// Recompute the views if any control moved since the last pass.
    /// Returns whether a recompute happened.
    pub fn refresh(&mut self, settings: &ViewSettings) -> bool {
        let current = (self.filters.clone(), self.age_hours);
        if current == self.computed_for {
            return false;
        }
        self.views = compute_views(&self.dataset, &self.filters, &self.age_hours, settings);
        log::debug!(
            "Recomputed views: {} of {} respondents visible",
            self.views.visible.len(),
            self.dataset.len()
        );
        self.computed_for = current;
        true
    }

    /// Put every control back to its full observed range.
    pub fn reset_filters(&mut self) {
        self.filters = FilterState::full_range(&self.dataset);
        self.age_hours = full_hours_range(&self.dataset);
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset and controls (None until a source loads).
    pub session: Option<Session>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            session: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset with all controls at full range.
    pub fn set_dataset(&mut self, dataset: SurveyDataset, source: String) {
        log::info!(
            "Loaded {} respondents from {source} ({} rows excluded for missing fields)",
            dataset.len(),
            dataset.excluded()
        );
        log::info!(
            "Health columns {:?}, {} genre-frequency columns, tempo column: {:?}",
            dataset.roles.health,
            dataset.roles.genre_frequency.len(),
            dataset.roles.tempo
        );
        if !dataset.has_tempo() {
            log::warn!("No tempo column found; tempo views are unavailable");
        }

        self.session = Some(Session::new(dataset, source, &self.config.view_settings()));
        self.status_message = None;
    }

    /// Load a source and replace the current session. On failure the current
    /// session is kept and the error is shown in the status bar.
    pub fn open_source(&mut self, source: &str) {
        match load_dataset(source, &self.config) {
            Ok(dataset) => self.set_dataset(dataset, source.to_string()),
            Err(e) => {
                log::error!("Failed to load {source}: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Recompute views after control changes.
    pub fn refresh(&mut self) {
        let settings = self.config.view_settings();
        if let Some(session) = &mut self.session {
            session.refresh(&settings);
        }
    }
}

/// Fetch, classify, clean and derive in one step.
pub fn load_dataset(source: &str, config: &DashboardConfig) -> anyhow::Result<SurveyDataset> {
    let raw = load_source(source, &config.loader())?;
    Ok(SurveyDataset::from_raw(&raw)?)
}

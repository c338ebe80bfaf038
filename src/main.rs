mod app;
mod color;
mod config;
mod data;
mod report;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use app::DashboardApp;
use clap::Parser;
use config::DashboardConfig;
use data::filter::{FilterState, full_hours_range};
use data::views::compute_views;
use eframe::egui;
use state::AppState;

#[derive(Parser)]
#[command(name = "music-health-dashboard", version, about = "Music & mental health survey dashboard")]
struct Cli {
    /// Dataset URL or local .csv / .json / .parquet path (overrides the config file)
    #[arg(long)]
    source: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print every view at full filter range and exit without opening a window
    #[arg(long)]
    report: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = DashboardConfig::load(cli.config.as_deref());
    if let Some(source) = cli.source {
        config.source = source;
    }

    // The dataset is loaded once per session; without it there is nothing to show.
    let dataset = state::load_dataset(&config.source, &config)
        .with_context(|| format!("loading survey data from {}", config.source))?;

    if cli.report {
        let views = compute_views(
            &dataset,
            &FilterState::full_range(&dataset),
            &full_hours_range(&dataset),
            &config.view_settings(),
        );
        print!("{}", report::render(&dataset, &views));
        return Ok(());
    }

    let source = config.source.clone();
    let mut state = AppState::new(config);
    state.set_dataset(dataset, source);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Music & Mental Health – Survey Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard window: {e}"))
}

use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{CategoryColors, generate_palette, heat_color};
use crate::data::views::{
    AgeGroupSummary, CountHistogram, DashboardViews, Distribution, GenreSummary,
    ListeningDistribution, ScatterSeries, TempoBoxView, Trend, ViewError, ViewResult,
};
use crate::state::AppState;
use crate::ui::panels::range_slider;

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render every chart for the current session.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let settings = state.config.view_settings();
    let Some(session) = state.session.as_mut() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No dataset loaded  (File → Open…)");
        });
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Music & Mental Health Survey Analysis");
            ui.add_space(4.0);

            let views = session.views();
            ui.columns(2, |cols| {
                section(&mut cols[0], "Hours Listening vs Mental Health", &views.hours_scatter, |ui, v| {
                    hours_scatter(ui, v)
                });
                section(&mut cols[1], "Exploring New Genres vs Reported Effects", &views.effect_histogram, |ui, v| {
                    effect_histogram(ui, v)
                });
            });

            ui.separator();
            tempo_section(ui, views);

            ui.separator();
            section(ui, "Favorite Genre vs Mental Health", &views.genre_summary, |ui, v| {
                genre_bars(ui, v);
                ui.add_space(6.0);
                genre_heatmap(ui, v);
            });

            ui.separator();
            section(ui, "Single vs Multiple Genre Listeners", &views.listening, |ui, v| {
                listening_boxes(ui, v)
            });

            ui.separator();
            ui.heading("Mental Health by Age Group");
            if let Some(bounds) = session.dataset.hours_bounds() {
                range_slider(ui, "Hours per Day (age-group view)", &mut session.age_hours, bounds);
            }
            session.refresh(&settings);
            let views = session.views();
            ui.label(format!("{} respondents in range", views.age_rows));
            match &views.age_groups {
                Ok(v) => age_group_bars(ui, v),
                Err(e) => view_unavailable(ui, e),
            }
        });
}

/// Heading plus either the chart or the reason it is missing.
fn section<T>(ui: &mut Ui, title: &str, view: &ViewResult<T>, render: impl FnOnce(&mut Ui, &T)) {
    ui.heading(title);
    match view {
        Ok(v) => render(ui, v),
        Err(e) => view_unavailable(ui, e),
    }
}

fn view_unavailable(ui: &mut Ui, error: &ViewError) {
    let text = match error {
        ViewError::Binning(_) => RichText::new(format!("⚠ {error}")).color(Color32::YELLOW),
        ViewError::NoData | ViewError::TempoUnavailable => RichText::new(format!("ℹ {error}")).italics(),
    };
    ui.label(text);
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn trend_line(trend: &Trend, points: &[[f64; 2]]) -> Option<Line<'static>> {
    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if !lo.is_finite() {
        return None;
    }
    let line = PlotPoints::from(vec![[lo, trend.at(lo)], [hi, trend.at(hi)]]);
    Some(Line::new(line).width(2.0))
}

fn hours_scatter(ui: &mut Ui, series: &ScatterSeries) {
    let color = Color32::from_rgb(0x1f, 0x77, 0xb4);
    Plot::new("hours_scatter")
        .height(CHART_HEIGHT)
        .x_axis_label("Hours Listening per Day")
        .y_axis_label("Average Mental Health Score")
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(PlotPoints::from(series.points.clone()))
                    .radius(3.5)
                    .color(color.gamma_multiply(0.6))
                    .name(&series.label),
            );
            if let Some(line) = series.trend.as_ref().and_then(|t| trend_line(t, &series.points)) {
                plot_ui.line(line.color(color).name("OLS trend"));
            }
        });
}

fn effect_histogram(ui: &mut Ui, hist: &CountHistogram) {
    let colors = CategoryColors::new(hist.series.iter().map(|(label, _)| label.clone()));
    let n_series = hist.series.len().max(1) as f64;
    let width = 0.8 / n_series;

    Plot::new("effect_histogram")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Reported Effect of Music")
        .y_axis_label("Number of Respondents")
        .show(ui, |plot_ui| {
            for (s, (label, counts)) in hist.series.iter().enumerate() {
                let offset = (s as f64 - (n_series - 1.0) / 2.0) * width;
                let bars = counts
                    .iter()
                    .zip(&hist.categories)
                    .enumerate()
                    .map(|(c, (&count, category))| {
                        Bar::new(c as f64 + offset, count as f64)
                            .width(width)
                            .name(format!("{category} ({label})"))
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).color(colors.color_for(label)).name(label));
            }
        });
    category_caption(ui, &hist.categories);
}

fn tempo_section(ui: &mut Ui, views: &DashboardViews) {
    ui.heading("Relationship Between BPM and Mental Health");
    section(ui, "Scatter: BPM vs Average Mental Health", &views.tempo_scatter, |ui, v| {
        tempo_scatter(ui, v)
    });
    ui.add_space(6.0);
    section(ui, "Box Plot: Mental Health Across BPM Ranges (Slow → Fast)", &views.tempo_box, |ui, v| {
        tempo_box(ui, v)
    });
}

fn tempo_scatter(ui: &mut Ui, series: &[ScatterSeries]) {
    let colors = CategoryColors::new(series.iter().map(|s| s.label.clone()));
    Plot::new("tempo_scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Beats Per Minute (Preferred Tempo)")
        .y_axis_label("Average Mental Health Score")
        .show(ui, |plot_ui| {
            for s in series {
                let color = colors.color_for(&s.label);
                let name = format!("Explores new genres: {}", s.label);
                plot_ui.points(
                    Points::new(PlotPoints::from(s.points.clone()))
                        .radius(4.0)
                        .color(color.gamma_multiply(0.7))
                        .name(&name),
                );
                if let Some(line) = s.trend.as_ref().and_then(|t| trend_line(t, &s.points)) {
                    plot_ui.line(line.color(color).name(&name));
                }
            }
        });
}

fn box_elem(x: f64, dist: &Distribution, color: Color32, width: f64) -> BoxElem {
    let s = dist.summary;
    BoxElem::new(x, BoxSpread::new(s.min, s.q1, s.median, s.q3, s.max))
        .name(&dist.label)
        .box_width(width)
        .whisker_width(width / 2.0)
        .fill(color.gamma_multiply(0.3))
        .stroke(Stroke::new(1.5, color))
}

fn tempo_box(ui: &mut Ui, view: &TempoBoxView) {
    let palette = generate_palette(view.bins.len());
    Plot::new("tempo_box")
        .height(CHART_HEIGHT)
        .x_axis_label("Tempo Range (BPM)")
        .y_axis_label("Average Mental Health Score")
        .show(ui, |plot_ui| {
            for (i, dist) in view.groups.iter().enumerate() {
                let bin = view
                    .bins
                    .labels
                    .iter()
                    .position(|l| *l == dist.label)
                    .unwrap_or(i);
                let color = palette.get(bin).copied().unwrap_or(Color32::GRAY);
                plot_ui.box_plot(BoxPlot::new(vec![box_elem(bin as f64, dist, color, 0.6)]).name(&dist.label));
            }
        });
    category_caption(ui, &view.bins.labels);
}

fn genre_bars(ui: &mut Ui, summary: &GenreSummary) {
    let bars = summary
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Bar::new(i as f64, row.overall)
                .width(0.7)
                .name(format!("{} (n={})", row.genre, row.count))
        })
        .collect();
    Plot::new("genre_bars")
        .height(CHART_HEIGHT)
        .x_axis_label("Favorite Genre (best → worst)")
        .y_axis_label("Average Mental Health Score")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::from_rgb(0x63, 0x6e, 0xfa)));
        });
    let genres: Vec<String> = summary.rows.iter().map(|r| r.genre.clone()).collect();
    category_caption(ui, &genres);
}

fn genre_heatmap(ui: &mut Ui, summary: &GenreSummary) {
    let (lo, hi) = summary.mean_range();
    TableBuilder::new(ui)
        .striped(false)
        .vscroll(false)
        .column(Column::auto().at_least(120.0))
        .columns(Column::auto().at_least(80.0), summary.health_columns.len())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Genre");
            });
            for col in &summary.health_columns {
                header.col(|ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|mut body| {
            for row in &summary.rows {
                body.row(20.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(&row.genre);
                    });
                    for &value in &row.health_means {
                        table_row.col(|ui| {
                            ui.label(
                                RichText::new(format!("{value:.2}"))
                                    .color(Color32::BLACK)
                                    .background_color(heat_color(value, lo, hi)),
                            );
                        });
                    }
                });
            }
        });
}

fn listening_boxes(ui: &mut Ui, view: &ListeningDistribution) {
    let colors = CategoryColors::new(view.groups.iter().map(|g| g.listening_type.label()));
    let n_groups = view.groups.len().max(1) as f64;
    let width = 0.8 / n_groups;

    Plot::new("listening_boxes")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Mental Health Condition")
        .y_axis_label("Score")
        .show(ui, |plot_ui| {
            for (g, group) in view.groups.iter().enumerate() {
                let color = colors.color_for(group.listening_type.label());
                let offset = (g as f64 - (n_groups - 1.0) / 2.0) * width;
                let elems = view
                    .health_columns
                    .iter()
                    .enumerate()
                    .filter_map(|(c, col)| {
                        let dist = group.per_health.iter().find(|d| d.label == *col)?;
                        Some(box_elem(c as f64 + offset, dist, color, width * 0.9))
                    })
                    .collect();
                let name = format!("{} (n={})", group.listening_type, group.count);
                plot_ui.box_plot(BoxPlot::new(elems).name(name));
            }
        });
    category_caption(ui, &view.health_columns);
}

fn age_group_bars(ui: &mut Ui, summary: &AgeGroupSummary) {
    // One series per health column plus listening hours.
    let mut series: Vec<String> = summary.health_columns.clone();
    series.push("Hours per day".to_string());
    let colors = CategoryColors::new(series.iter().cloned());
    let width = 0.8 / series.len() as f64;

    Plot::new("age_group_bars")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Age Group")
        .y_axis_label("Mean")
        .show(ui, |plot_ui| {
            for (s, name) in series.iter().enumerate() {
                let offset = (s as f64 - (series.len() as f64 - 1.0) / 2.0) * width;
                let bars = summary
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| {
                        let value = row.health_means.get(s).copied().unwrap_or(row.mean_hours);
                        Bar::new(i as f64 + offset, value)
                            .width(width)
                            .name(format!("{} (n={})", row.group, row.count))
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).color(colors.color_for(name)).name(name));
            }
        });
    let groups: Vec<String> = summary.rows.iter().map(|r| r.group.to_string()).collect();
    category_caption(ui, &groups);
}

/// Axis legend for categorical x positions: `0: first, 1: second, ...`.
fn category_caption(ui: &mut Ui, categories: &[String]) {
    let caption = categories
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{i}: {c}"))
        .collect::<Vec<_>>()
        .join("   ");
    ui.label(RichText::new(caption).small().weak());
}

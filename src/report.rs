use std::fmt::Write;

use crate::data::columns::genre_label;
use crate::data::derive::SurveyDataset;
use crate::data::views::{DashboardViews, ViewResult};

/// Plain-text rendering of every view, for `--report`.
pub fn render(dataset: &SurveyDataset, views: &DashboardViews) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} respondents ({} of {} source rows excluded for missing fields), {} visible",
        dataset.len(),
        dataset.excluded(),
        dataset.source_rows,
        views.visible.len()
    );
    let genres: Vec<&str> = dataset
        .roles
        .genre_frequency
        .iter()
        .map(|c| genre_label(c))
        .collect();
    let _ = writeln!(out, "Genres tracked: {}", genres.join(", "));

    section(&mut out, "Hours listening vs mental health", &views.hours_scatter, |out, v| {
        match v.trend {
            Some(t) => writeln!(out, "  {} points, trend slope {:+.3}", v.points.len(), t.slope),
            None => writeln!(out, "  {} points, no trend", v.points.len()),
        }
    });

    section(&mut out, "Reported music effects", &views.effect_histogram, |out, v| {
        for (label, counts) in &v.series {
            let cells: Vec<String> = v
                .categories
                .iter()
                .zip(counts)
                .map(|(c, n)| format!("{c}={n}"))
                .collect();
            writeln!(out, "  Exploratory {label}: {}", cells.join(", "))?;
        }
        Ok(())
    });

    section(&mut out, "BPM vs mental health", &views.tempo_scatter, |out, v| {
        for s in v {
            writeln!(out, "  Exploratory {}: {} points", s.label, s.points.len())?;
        }
        Ok(())
    });

    section(&mut out, "Mental health across BPM ranges", &views.tempo_box, |out, v| {
        for g in &v.groups {
            writeln!(
                out,
                "  {:>9}  n={:<4} median {:.2}",
                g.label,
                g.values.len(),
                g.summary.median
            )?;
        }
        Ok(())
    });

    section(&mut out, "Favorite genre (best → worst)", &views.genre_summary, |out, v| {
        writeln!(out, "  {:<18} {:>4}  overall  {}", "genre", "n", v.health_columns.join("  "))?;
        for row in &v.rows {
            let means: Vec<String> = row.health_means.iter().map(|m| format!("{m:.2}")).collect();
            writeln!(
                out,
                "  {:<18} {:>4}  {:>7.2}  {}",
                row.genre,
                row.count,
                row.overall,
                means.join("  ")
            )?;
        }
        Ok(())
    });

    section(&mut out, "Single vs multiple genre listeners", &views.listening, |out, v| {
        for g in &v.groups {
            let medians: Vec<String> = g
                .per_health
                .iter()
                .map(|d| format!("{} median {:.1}", d.label, d.summary.median))
                .collect();
            writeln!(out, "  {} (n={}): {}", g.listening_type, g.count, medians.join(", "))?;
        }
        Ok(())
    });

    section(&mut out, "Age groups", &views.age_groups, |out, v| {
        for row in &v.rows {
            let means: Vec<String> = row.health_means.iter().map(|m| format!("{m:.2}")).collect();
            writeln!(
                out,
                "  {:<6} n={:<4} hours {:.2}  health {}",
                row.group.label(),
                row.count,
                row.mean_hours,
                means.join(" ")
            )?;
        }
        Ok(())
    });

    out
}

fn section<T>(
    out: &mut String,
    title: &str,
    view: &ViewResult<T>,
    body: impl FnOnce(&mut String, &T) -> std::fmt::Result,
) {
    let _ = writeln!(out, "\n== {title}");
    let _ = match view {
        Ok(v) => body(out, v),
        Err(e) => writeln!(out, "  ({e})"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::tests::SURVEY_CSV;
    use crate::data::filter::{FilterState, RangeFilter, full_hours_range};
    use crate::data::loader::parse_csv;
    use crate::data::views::{ViewSettings, compute_views};

    #[test]
    fn report_lists_every_section() {
        let ds = SurveyDataset::from_raw(&parse_csv(SURVEY_CSV.as_bytes()).unwrap()).unwrap();
        let views = compute_views(
            &ds,
            &FilterState::full_range(&ds),
            &full_hours_range(&ds),
            &ViewSettings::default(),
        );
        let text = render(&ds, &views);
        assert!(text.starts_with("5 respondents (1 of 6 source rows excluded"));
        assert!(text.contains("Genres tracked: Rock, Jazz, Pop"));
        assert!(text.contains("== Favorite genre"));
        assert!(text.contains("Exploratory Yes: Improve=2, No effect=0, Worsen=1"));
        assert!(text.contains("18-25"));
    }

    #[test]
    fn empty_views_say_so() {
        let ds = SurveyDataset::from_raw(&parse_csv(SURVEY_CSV.as_bytes()).unwrap()).unwrap();
        let mut filters = FilterState::full_range(&ds);
        filters.hours = RangeFilter::new(50.0, 60.0);
        let views = compute_views(&ds, &filters, &full_hours_range(&ds), &ViewSettings::default());
        let text = render(&ds, &views);
        assert!(text.contains("(no data for this view)"));
    }
}

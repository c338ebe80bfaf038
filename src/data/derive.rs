use std::fmt;

use super::columns::{self, ColumnRoles, SchemaError};
use super::model::{CellValue, RawRecord, RawTable};

// ---------------------------------------------------------------------------
// Ordinal genre frequency
// ---------------------------------------------------------------------------

/// The four-level listening frequency scale of the genre columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FrequencyLevel {
    Never,
    Rarely,
    Sometimes,
    VeryFrequently,
}

impl FrequencyLevel {
    /// Exact match on the survey wording; anything else is undefined.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Never" => Some(FrequencyLevel::Never),
            "Rarely" => Some(FrequencyLevel::Rarely),
            "Sometimes" => Some(FrequencyLevel::Sometimes),
            "Very frequently" => Some(FrequencyLevel::VeryFrequently),
            _ => None,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            FrequencyLevel::Never => 0,
            FrequencyLevel::Rarely => 1,
            FrequencyLevel::Sometimes => 2,
            FrequencyLevel::VeryFrequently => 3,
        }
    }
}

/// A genre counts as active from "Sometimes" upward.
pub const ACTIVE_RANK: u8 = 2;

// ---------------------------------------------------------------------------
// Listening style
// ---------------------------------------------------------------------------

/// Binary listening-style label. Zero active genres and several active genres
/// both map to `Multiple`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListeningType {
    Single,
    Multiple,
}

impl ListeningType {
    pub const ALL: [ListeningType; 2] = [ListeningType::Single, ListeningType::Multiple];

    pub fn from_active_count(active: usize) -> Self {
        if active == 1 {
            ListeningType::Single
        } else {
            ListeningType::Multiple
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListeningType::Single => "Single",
            ListeningType::Multiple => "Multiple",
        }
    }
}

impl fmt::Display for ListeningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Age buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeGroup {
    Age18To25,
    Age26To40,
    Age41To60,
    Over60,
}

impl AgeGroup {
    /// Buckets (0,25], (25,40], (40,60], (60,100] with 0 itself included in
    /// the first bucket. Ages outside [0, 100] have no bucket.
    pub fn from_age(age: f64) -> Option<Self> {
        if age.is_nan() || !(0.0..=100.0).contains(&age) {
            return None;
        }
        Some(if age <= 25.0 {
            AgeGroup::Age18To25
        } else if age <= 40.0 {
            AgeGroup::Age26To40
        } else if age <= 60.0 {
            AgeGroup::Age41To60
        } else {
            AgeGroup::Over60
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Age18To25 => "18-25",
            AgeGroup::Age26To40 => "26-40",
            AgeGroup::Age41To60 => "41-60",
            AgeGroup::Over60 => "60+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Respondent – one cleaned, enriched row
// ---------------------------------------------------------------------------

/// A retained survey response with its derived attributes.
/// Built once by [`SurveyDataset::from_raw`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Respondent {
    pub hours_per_day: f64,
    pub age: Option<f64>,
    pub tempo: Option<f64>,
    pub fav_genre: Option<String>,
    pub exploratory: String,
    pub music_effect: String,
    /// Health scores, aligned with [`ColumnRoles::health`].
    pub health: Vec<f64>,
    /// Ordinal-encoded genre frequencies, aligned with
    /// [`ColumnRoles::genre_frequency`].
    pub genre_ranks: Vec<Option<u8>>,
    /// Genre cells under a plain numeric cast, kept apart from the ranks.
    pub genre_raw: Vec<Option<f64>>,

    pub active_genre_count: usize,
    pub listening_type: ListeningType,
    pub variety: usize,
    pub avg_health: f64,
    pub age_group: Option<AgeGroup>,
}

impl Respondent {
    /// Clean and enrich one raw record. Returns `None` when a required field
    /// (any health score, hours per day, exploratory flag, music effect) is
    /// missing.
    fn from_record(record: &RawRecord, roles: &ColumnRoles) -> Option<Self> {
        let health = roles
            .health
            .iter()
            .map(|col| record.get(col).as_f64())
            .collect::<Option<Vec<f64>>>()?;
        let hours_per_day = record.get(columns::HOURS_PER_DAY).as_f64()?;
        let exploratory = record.get(columns::EXPLORATORY).as_label()?;
        let music_effect = record.get(columns::MUSIC_EFFECTS).as_label()?;

        let genre_ranks: Vec<Option<u8>> = roles
            .genre_frequency
            .iter()
            .map(|col| match record.get(col) {
                CellValue::String(s) => FrequencyLevel::parse(s).map(FrequencyLevel::rank),
                _ => None,
            })
            .collect();
        let genre_raw: Vec<Option<f64>> = roles
            .genre_frequency
            .iter()
            .map(|col| record.get(col).as_f64())
            .collect();

        let active_genre_count = genre_ranks
            .iter()
            .filter(|rank| rank.is_some_and(|r| r >= ACTIVE_RANK))
            .count();
        let variety = genre_raw
            .iter()
            .filter(|v| v.is_some_and(|v| v > 0.0))
            .count();
        let avg_health = health.iter().sum::<f64>() / health.len() as f64;

        let age = record.get(columns::AGE).as_f64();
        let tempo = roles
            .tempo
            .as_ref()
            .and_then(|col| record.get(col).as_f64());

        Some(Respondent {
            hours_per_day,
            age,
            tempo,
            fav_genre: record.get(columns::FAV_GENRE).as_label(),
            exploratory,
            music_effect,
            health,
            genre_ranks,
            genre_raw,
            active_genre_count,
            listening_type: ListeningType::from_active_count(active_genre_count),
            variety,
            avg_health,
            age_group: age.and_then(AgeGroup::from_age),
        })
    }
}

// ---------------------------------------------------------------------------
// SurveyDataset – the cleaned, enriched table
// ---------------------------------------------------------------------------

/// Observed `[min, max]` of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, v| match acc {
            None => Some(Bounds { min: v, max: v }),
            Some(b) => Some(Bounds {
                min: b.min.min(v),
                max: b.max.max(v),
            }),
        })
    }
}

/// The session's base table: read-only after construction.
#[derive(Debug, Clone)]
pub struct SurveyDataset {
    pub roles: ColumnRoles,
    pub respondents: Vec<Respondent>,
    /// Rows in the source before cleaning.
    pub source_rows: usize,
}

impl SurveyDataset {
    /// Classify, clean and derive.
    pub fn from_raw(raw: &RawTable) -> Result<Self, SchemaError> {
        let roles = ColumnRoles::classify(&raw.column_names);
        roles.validate(&raw.column_names)?;

        let respondents: Vec<Respondent> = raw
            .records
            .iter()
            .filter_map(|record| Respondent::from_record(record, &roles))
            .collect();

        Ok(SurveyDataset {
            roles,
            respondents,
            source_rows: raw.row_count(),
        })
    }

    /// Number of retained respondents.
    pub fn len(&self) -> usize {
        self.respondents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.respondents.is_empty()
    }

    /// Rows dropped by the missing-field exclusion.
    pub fn excluded(&self) -> usize {
        self.source_rows - self.respondents.len()
    }

    pub fn has_tempo(&self) -> bool {
        self.roles.has_tempo()
    }

    pub fn hours_bounds(&self) -> Option<Bounds> {
        Bounds::of(self.respondents.iter().map(|r| r.hours_per_day))
    }

    pub fn health_bounds(&self) -> Option<Bounds> {
        Bounds::of(self.respondents.iter().map(|r| r.avg_health))
    }

    /// `None` when the tempo column is absent or holds no numeric value.
    pub fn tempo_bounds(&self) -> Option<Bounds> {
        if !self.has_tempo() {
            return None;
        }
        Bounds::of(self.respondents.iter().filter_map(|r| r.tempo))
    }

    /// Short health column labels, in column order.
    pub fn health_columns(&self) -> &[String] {
        &self.roles.health
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::loader::parse_csv;
    use approx::assert_relative_eq;

    pub(crate) const SURVEY_CSV: &str = "\
Age,Hours per day,Fav genre,Exploratory,BPM,Frequency [Rock],Frequency [Jazz],Frequency [Pop],Anxiety,Depression,Insomnia,OCD,Music effects
18,3,Rock,Yes,120,Very frequently,Never,Rarely,7,6,2,1,Improve
25,1.5,Jazz,No,90,Never,Sometimes,Never,3,2,1,0,No effect
32,4,Rock,Yes,160,Sometimes,Sometimes,Very frequently,8,7,5,4,Improve
45,0.5,Pop,No,,Never,Never,Rarely,1,1,1,1,No effect
61,2,Jazz,Yes,70,Rarely,Very frequently,Never,5,4,,2,Improve
,6,Pop,Yes,200,Never,Never,Sometimes,9,8,6,3,Worsen
";

    fn survey() -> SurveyDataset {
        SurveyDataset::from_raw(&parse_csv(SURVEY_CSV.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn frequency_encoding() {
        assert_eq!(FrequencyLevel::parse("Never").map(FrequencyLevel::rank), Some(0));
        assert_eq!(FrequencyLevel::parse("Rarely").map(FrequencyLevel::rank), Some(1));
        assert_eq!(FrequencyLevel::parse("Sometimes").map(FrequencyLevel::rank), Some(2));
        assert_eq!(
            FrequencyLevel::parse("Very frequently").map(FrequencyLevel::rank),
            Some(3)
        );
        assert_eq!(FrequencyLevel::parse("very frequently"), None);
        assert_eq!(FrequencyLevel::parse("Often"), None);
    }

    #[test]
    fn age_buckets() {
        assert_eq!(AgeGroup::from_age(25.0), Some(AgeGroup::Age18To25));
        assert_eq!(AgeGroup::from_age(26.0), Some(AgeGroup::Age26To40));
        assert_eq!(AgeGroup::from_age(40.0), Some(AgeGroup::Age26To40));
        assert_eq!(AgeGroup::from_age(60.0), Some(AgeGroup::Age41To60));
        assert_eq!(AgeGroup::from_age(61.0), Some(AgeGroup::Over60));
        assert_eq!(AgeGroup::from_age(0.0), Some(AgeGroup::Age18To25));
        assert_eq!(AgeGroup::from_age(100.0), Some(AgeGroup::Over60));
        assert_eq!(AgeGroup::from_age(101.0), None);
        assert_eq!(AgeGroup::from_age(-1.0), None);
        assert_eq!(AgeGroup::Over60.to_string(), "60+");
    }

    #[test]
    fn listening_type_is_single_only_for_one_active_genre() {
        assert_eq!(ListeningType::from_active_count(0), ListeningType::Multiple);
        assert_eq!(ListeningType::from_active_count(1), ListeningType::Single);
        assert_eq!(ListeningType::from_active_count(2), ListeningType::Multiple);
        assert_eq!(ListeningType::from_active_count(7), ListeningType::Multiple);
    }

    #[test]
    fn missing_required_fields_are_excluded() {
        let ds = survey();
        assert_eq!(ds.source_rows, 6);
        // Row 5 lacks Insomnia.
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.excluded(), 1);
    }

    #[test]
    fn derived_attributes() {
        let ds = survey();
        for r in &ds.respondents {
            let expected = if r.active_genre_count == 1 {
                ListeningType::Single
            } else {
                ListeningType::Multiple
            };
            assert_eq!(r.listening_type, expected);
            assert_relative_eq!(
                r.avg_health,
                r.health.iter().sum::<f64>() / ds.health_columns().len() as f64
            );
        }

        let first = &ds.respondents[0];
        assert_eq!(first.genre_ranks, vec![Some(3), Some(0), Some(1)]);
        assert_eq!(first.active_genre_count, 1);
        assert_eq!(first.listening_type, ListeningType::Single);
        assert_relative_eq!(first.avg_health, 4.0);
        assert_eq!(first.age_group, Some(AgeGroup::Age18To25));

        let third = &ds.respondents[2];
        assert_eq!(third.active_genre_count, 3);
        assert_eq!(third.listening_type, ListeningType::Multiple);

        let fourth = &ds.respondents[3];
        assert_eq!(fourth.active_genre_count, 0);
        assert_eq!(fourth.listening_type, ListeningType::Multiple);
        assert_eq!(fourth.tempo, None);

        // Missing age keeps the row but yields no bucket.
        let last = &ds.respondents[4];
        assert_eq!(last.age, None);
        assert_eq!(last.age_group, None);
    }

    #[test]
    fn na_markers_count_as_missing_fields() {
        let csv = "\
Hours per day,Fav genre,Exploratory,Anxiety,Music effects
2,Rock,NaN,5,Improve
3,Rock,Yes,4,NA
4,nan,No,N/A,Improve
1,nan,Yes,6,No effect
5,Jazz,No,2,Worsen
";
        let ds = SurveyDataset::from_raw(&parse_csv(csv.as_bytes()).unwrap()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.excluded(), 3);

        let no_genre = &ds.respondents[0];
        assert_eq!(no_genre.fav_genre, None);
        assert_eq!(no_genre.exploratory, "Yes");
        assert_eq!(ds.respondents[1].fav_genre.as_deref(), Some("Jazz"));
    }

    #[test]
    fn variety_uses_numeric_cells_not_ranks() {
        let csv = "\
Hours per day,Exploratory,Music effects,Anxiety,Frequency [Rock],Frequency [Jazz],Frequency [Pop]
2,Yes,Improve,5,3,0,Sometimes
";
        let ds = SurveyDataset::from_raw(&parse_csv(csv.as_bytes()).unwrap()).unwrap();
        let r = &ds.respondents[0];
        assert_eq!(r.genre_raw, vec![Some(3.0), Some(0.0), None]);
        assert_eq!(r.variety, 1);
        assert_eq!(r.genre_ranks, vec![None, None, Some(2)]);
        assert_eq!(r.active_genre_count, 1);

        // Textual survey cells never count toward variety.
        for r in &survey().respondents {
            assert_eq!(r.variety, 0);
        }
    }

    #[test]
    fn bounds_cover_retained_rows() {
        let ds = survey();
        assert_eq!(ds.hours_bounds(), Some(Bounds { min: 0.5, max: 6.0 }));
        assert_eq!(ds.tempo_bounds(), Some(Bounds { min: 90.0, max: 200.0 }));
        let health = ds.health_bounds().unwrap();
        assert_relative_eq!(health.min, 1.0);
        assert_relative_eq!(health.max, 6.5);
    }

    #[test]
    fn tempo_bounds_absent_without_tempo_column() {
        let csv = "Hours per day,Exploratory,Music effects,Anxiety\n1,No,Improve,3\n";
        let ds = SurveyDataset::from_raw(&parse_csv(csv.as_bytes()).unwrap()).unwrap();
        assert!(!ds.has_tempo());
        assert_eq!(ds.tempo_bounds(), None);
    }
}

use thiserror::Error;

// ---------------------------------------------------------------------------
// Fixed column names of the survey export
// ---------------------------------------------------------------------------

pub const AGE: &str = "Age";
pub const HOURS_PER_DAY: &str = "Hours per day";
pub const FAV_GENRE: &str = "Fav genre";
pub const EXPLORATORY: &str = "Exploratory";
pub const MUSIC_EFFECTS: &str = "Music effects";

/// Substrings identifying a health-indicator column (case-sensitive).
pub const HEALTH_VOCABULARY: [&str; 4] = ["Anxiety", "Depression", "Insomnia", "OCD"];

/// Prefix of every genre-frequency column, e.g. `Frequency [Rock]`.
pub const GENRE_PREFIX: &str = "Frequency [";

/// Exact name of the optional tempo column.
pub const TEMPO_COLUMN: &str = "BPM";

/// The survey cannot form a cleaned table without these.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("no health-indicator columns found (expected names containing Anxiety, Depression, Insomnia or OCD)")]
    NoHealthColumns,
    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),
}

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

/// Semantic grouping of the source headers, discovered by name pattern so the
/// column order of the source file does not matter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRoles {
    /// Health-indicator columns in source order.
    pub health: Vec<String>,
    /// Genre-frequency columns in source order.
    pub genre_frequency: Vec<String>,
    /// Tempo column, if the source has one.
    pub tempo: Option<String>,
}

impl ColumnRoles {
    /// Classify a header list.
    pub fn classify<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut roles = ColumnRoles::default();
        for header in headers {
            let header = header.as_ref();
            if HEALTH_VOCABULARY.iter().any(|word| header.contains(word)) {
                roles.health.push(header.to_string());
            }
            if header.starts_with(GENRE_PREFIX) {
                roles.genre_frequency.push(header.to_string());
            }
            if header == TEMPO_COLUMN {
                roles.tempo = Some(header.to_string());
            }
        }
        roles
    }

    /// Check the headers a cleaned table cannot do without.
    pub fn validate<S: AsRef<str>>(&self, headers: &[S]) -> Result<(), SchemaError> {
        if self.health.is_empty() {
            return Err(SchemaError::NoHealthColumns);
        }
        let present = |name: &str| headers.iter().any(|h| h.as_ref() == name);
        for required in [HOURS_PER_DAY, EXPLORATORY, MUSIC_EFFECTS] {
            if !present(required) {
                return Err(SchemaError::MissingColumn(required));
            }
        }
        Ok(())
    }

    pub fn has_tempo(&self) -> bool {
        self.tempo.is_some()
    }
}

/// Short display label of a genre-frequency column: `Frequency [Rock]` → `Rock`.
pub fn genre_label(column: &str) -> &str {
    column
        .strip_prefix(GENRE_PREFIX)
        .map(|rest| rest.strip_suffix(']').unwrap_or(rest))
        .unwrap_or(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURVEY_HEADERS: &[&str] = &[
        "Timestamp",
        "Age",
        "Primary streaming service",
        "Hours per day",
        "While working",
        "Fav genre",
        "Exploratory",
        "BPM",
        "Frequency [Classical]",
        "Frequency [Rock]",
        "Anxiety",
        "Depression",
        "Insomnia",
        "OCD",
        "Music effects",
    ];

    #[test]
    fn classifies_survey_headers() {
        let roles = ColumnRoles::classify(SURVEY_HEADERS);
        assert_eq!(roles.health, ["Anxiety", "Depression", "Insomnia", "OCD"]);
        assert_eq!(
            roles.genre_frequency,
            ["Frequency [Classical]", "Frequency [Rock]"]
        );
        assert_eq!(roles.tempo.as_deref(), Some("BPM"));
        assert!(roles.validate(SURVEY_HEADERS).is_ok());
    }

    #[test]
    fn health_match_is_substring_and_case_sensitive() {
        let roles = ColumnRoles::classify(&["Anxiety score", "depression", "OCD (0-10)"]);
        assert_eq!(roles.health, ["Anxiety score", "OCD (0-10)"]);
    }

    #[test]
    fn tempo_requires_exact_name() {
        let roles = ColumnRoles::classify(&["BPM (avg)", "bpm", "Anxiety"]);
        assert!(roles.tempo.is_none());
        assert!(!roles.has_tempo());
    }

    #[test]
    fn reordered_headers_classify_the_same() {
        let mut reversed: Vec<&str> = SURVEY_HEADERS.to_vec();
        reversed.reverse();
        let roles = ColumnRoles::classify(&reversed);
        assert_eq!(roles.health.len(), 4);
        assert_eq!(roles.genre_frequency.len(), 2);
        assert!(roles.has_tempo());
    }

    #[test]
    fn validation_names_the_missing_column() {
        let headers = ["Anxiety", "Hours per day", "Exploratory"];
        let roles = ColumnRoles::classify(&headers);
        assert_eq!(
            roles.validate(&headers),
            Err(SchemaError::MissingColumn(MUSIC_EFFECTS))
        );

        let no_health = ["Hours per day", "Exploratory", "Music effects"];
        assert_eq!(
            ColumnRoles::classify(&no_health).validate(&no_health),
            Err(SchemaError::NoHealthColumns)
        );
    }

    #[test]
    fn genre_labels() {
        assert_eq!(genre_label("Frequency [Hip hop]"), "Hip hop");
        assert_eq!(genre_label("Rock"), "Rock");
    }
}

/// Data layer: loading, cleaning, derivation, filtering and summary views.
///
/// Architecture:
/// ```text
///  https:// .csv  /  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch / parse → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ columns + derive  │  classify headers, drop incomplete rows,
///   └──────────────────┘  derive features → SurveyDataset
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  range predicates → visible indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ views + tempo │  grouped means, distributions, tempo bins
///   └──────────────┘
/// ```

pub mod columns;
pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
pub mod tempo;
pub mod views;

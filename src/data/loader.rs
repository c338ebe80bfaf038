use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, RawRecord, RawTable};

/// Settings for fetching a dataset.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Whole-request timeout for remote sources.
    pub request_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Whether a source string names a remote resource.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load the survey table from a URL or a local path.
pub fn load_source(source: &str, config: &LoaderConfig) -> Result<RawTable> {
    if is_remote(source) {
        fetch_remote(source, config)
    } else {
        load_file(Path::new(source))
    }
}

/// Load a survey table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row + one respondent per line
/// * `.json`    – `[{ "Age": 18, "Hours per day": 3, ... }, ...]`
/// * `.parquet` – flat scalar columns, as written by `df.to_parquet()`
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            parse_csv(file)
        }
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Remote CSV
// ---------------------------------------------------------------------------

/// Fetch a CSV over HTTP. The connection lives only for this call; any
/// transport error or non-success status is returned to the caller.
fn fetch_remote(url: &str, config: &LoaderConfig) -> Result<RawTable> {
    log::info!("Fetching dataset from {url}");
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(config.request_timeout))
        .build()
        .into();

    let body = agent
        .get(url)
        .call()
        .with_context(|| format!("HTTP request failed for {url}"))?
        .body_mut()
        .read_to_string()
        .with_context(|| format!("reading response body from {url}"))?;

    log::debug!("Fetched {} bytes", body.len());
    parse_csv(body.as_bytes()).with_context(|| format!("parsing CSV from {url}"))
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse CSV text with a header row. Cell types are inferred per cell.
pub fn parse_csv<R: Read>(input: R) -> Result<RawTable> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        bail!("CSV has no header row");
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let fields: BTreeMap<String, CellValue> = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_cell_type(value)))
            .collect();
        records.push(RawRecord { fields });
    }

    Ok(RawTable::new(headers, records))
}

/// Text markers that survey exports use for a blank answer.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() || NA_MARKERS.contains(&s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Age": 18, "Hours per day": 3.0, "Fav genre": "Rock", "Anxiety": 7, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut column_names: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut fields = BTreeMap::new();
        for (key, val) in obj {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
            fields.insert(key.clone(), json_to_cell(val));
        }
        records.push(RawRecord { fields });
    }

    Ok(RawTable::new(column_names, records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet export of the survey. Every column must be a flat scalar
/// (string, integer, float or boolean); nested columns are read as their
/// type name.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let fields: BTreeMap<String, CellValue> = schema
                .fields()
                .iter()
                .enumerate()
                .map(|(col_idx, field)| {
                    (field.name().clone(), extract_cell(batch.column(col_idx), row))
                })
                .collect();
            records.push(RawRecord { fields });
        }
    }

    Ok(RawTable::new(column_names, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => match any.downcast_ref::<StringArray>() {
            Some(s) => CellValue::String(s.value(row).to_string()),
            None => CellValue::Null,
        },
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_cells_are_typed() {
        let csv = "Age,Hours per day,Fav genre,BPM\n18,2.5,Rock,\n";
        let table = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.column_names, ["Age", "Hours per day", "Fav genre", "BPM"]);
        assert_eq!(table.row_count(), 1);
        let row = &table.records[0];
        assert_eq!(row.get("Age"), &CellValue::Integer(18));
        assert_eq!(row.get("Hours per day"), &CellValue::Float(2.5));
        assert_eq!(row.get("Fav genre"), &CellValue::String("Rock".into()));
        assert!(row.is_missing("BPM"));
    }

    #[test]
    fn csv_header_order_is_preserved() {
        let csv = "Music effects,Anxiety,Age\nImprove,3,20\n";
        let table = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.column_names, ["Music effects", "Anxiety", "Age"]);
    }

    #[test]
    fn na_markers_read_as_missing() {
        let csv = "Fav genre,Exploratory,Music effects,BPM,Anxiety\nnan,NaN,NA,N/A,null\n";
        let table = parse_csv(csv.as_bytes()).unwrap();
        let row = &table.records[0];
        for column in &table.column_names {
            assert!(row.is_missing(column), "{column} should be missing");
        }
    }

    #[test]
    fn ragged_csv_is_an_error() {
        let csv = "Age,Anxiety\n18,3,extra\n";
        assert!(parse_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn json_records_load() {
        let json = r#"[
            {"Age": 18, "Hours per day": 2.5, "Exploratory": "Yes", "BPM": null},
            {"Age": 40, "Hours per day": 1, "Exploratory": "No", "BPM": 120}
        ]"#;
        let table = parse_json(json).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names, ["Age", "Hours per day", "Exploratory", "BPM"]);
        assert!(table.records[0].is_missing("BPM"));
        assert_eq!(table.records[1].get("BPM"), &CellValue::Integer(120));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(parse_json(r#"{"Age": 18}"#).is_err());
        assert!(parse_json("[1, 2]").is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("survey.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn unreachable_source_is_an_error() {
        assert!(load_source("/definitely/not/here.csv", &LoaderConfig::default()).is_err());
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.org/Dataset.csv"));
        assert!(is_remote("http://localhost/Dataset.csv"));
        assert!(!is_remote("data/Dataset.csv"));
    }
}

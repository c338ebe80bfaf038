//! Writes a synthetic music & mental health survey for offline use.
//!
//! Usage: `generate_sample [OUTPUT.csv|OUTPUT.parquet] [ROWS]`

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const GENRES: [&str; 8] = [
    "Classical", "EDM", "Hip hop", "Jazz", "Metal", "Pop", "Rock", "Video game music",
];
const FREQUENCIES: [&str; 4] = ["Never", "Rarely", "Sometimes", "Very frequently"];
const EFFECTS: [&str; 3] = ["Improve", "No effect", "Worsen"];
const CONDITIONS: [&str; 4] = ["Anxiety", "Depression", "Insomnia", "OCD"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// One synthetic respondent. `None` marks a blank cell.
struct Row {
    age: Option<i64>,
    hours: f64,
    fav_genre: String,
    exploratory: String,
    bpm: Option<f64>,
    frequencies: Vec<String>,
    health: Vec<Option<f64>>,
    effect: Option<String>,
}

fn generate_row(rng: &mut SimpleRng) -> Row {
    let hours = (rng.gauss(3.5, 2.5).clamp(0.0, 24.0) * 4.0).round() / 4.0;
    let base = rng.gauss(4.5, 2.0) + hours * 0.15;
    let health = CONDITIONS
        .iter()
        .map(|_| {
            if rng.chance(0.02) {
                None
            } else {
                Some(rng.gauss(base, 2.0).clamp(0.0, 10.0).round())
            }
        })
        .collect();

    Row {
        age: if rng.chance(0.01) {
            None
        } else {
            Some(rng.gauss(25.0, 12.0).clamp(10.0, 89.0).round() as i64)
        },
        hours,
        fav_genre: rng.pick(&GENRES).to_string(),
        exploratory: if rng.chance(0.7) { "Yes" } else { "No" }.to_string(),
        bpm: if rng.chance(0.1) {
            None
        } else {
            // A few outliers above any sensible tempo, as in real survey data.
            let bpm = if rng.chance(0.01) { 999.0 } else { rng.gauss(120.0, 30.0).clamp(40.0, 220.0) };
            Some(bpm.round())
        },
        frequencies: GENRES.iter().map(|_| rng.pick(&FREQUENCIES).to_string()).collect(),
        health,
        effect: if rng.chance(0.01) {
            None
        } else {
            Some(rng.pick(&EFFECTS).to_string())
        },
    }
}

fn headers() -> Vec<String> {
    let mut h: Vec<String> = ["Age", "Hours per day", "Fav genre", "Exploratory", "BPM"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    h.extend(GENRES.iter().map(|g| format!("Frequency [{g}]")));
    h.extend(CONDITIONS.iter().map(|c| c.to_string()));
    h.push("Music effects".to_string());
    h
}

fn opt<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(headers())?;
    for r in rows {
        let mut record = vec![
            opt(&r.age),
            r.hours.to_string(),
            r.fav_genre.clone(),
            r.exploratory.clone(),
            opt(&r.bpm),
        ];
        record.extend(r.frequencies.iter().cloned());
        record.extend(r.health.iter().map(opt));
        record.push(opt(&r.effect));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let names = headers();
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(rows.iter().map(|r| r.age).collect::<Vec<_>>())),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.hours).collect::<Vec<_>>())),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.fav_genre.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.exploratory.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.bpm).collect::<Vec<_>>())),
    ];
    for g in 0..GENRES.len() {
        columns.push(Arc::new(StringArray::from(
            rows.iter().map(|r| r.frequencies[g].as_str()).collect::<Vec<_>>(),
        )));
    }
    for c in 0..CONDITIONS.len() {
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.health[c]).collect::<Vec<_>>(),
        )));
    }
    columns.push(Arc::new(StringArray::from(
        rows.iter().map(|r| r.effect.as_deref()).collect::<Vec<_>>(),
    )));

    let fields: Vec<Field> = names
        .iter()
        .zip(&columns)
        .map(|(name, col)| Field::new(name, col.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "sample_survey.csv".to_string());
    let n_rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid row count '{n}'"))?,
        None => 600,
    };

    let mut rng = SimpleRng::new(42);
    let rows: Vec<Row> = (0..n_rows).map(|_| generate_row(&mut rng)).collect();

    let path = Path::new(&output);
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(path, &rows)?,
        Some("parquet") | Some("pq") => write_parquet(path, &rows)?,
        _ => bail!("output must end in .csv or .parquet: {output}"),
    }

    println!("Wrote {n_rows} survey responses to {output}");
    Ok(())
}

use anyhow::{Context, Result};
use climate_explorer::data::loader::MONTH_COLUMNS;

/// Stations as (id, mean °C, seasonal amplitude °C, first year).
const STATIONS: [(&str, f64, f64, i32); 4] = [
    ("10381", 9.5, 9.0, 1859),
    ("10147", 8.9, 8.0, 1881),
    ("10865", 8.2, 9.5, 1900),
    ("10015", 7.9, 5.5, 1950),
];
const LAST_YEAR: i32 = 2019;
/// Warming per year after 1900.
const TREND: f64 = 0.012;
/// Roughly one reading in this many is missing.
const MISSING_EVERY: u64 = 60;

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
}

fn monthly_temperature(mean: f64, amplitude: f64, year: i32, month: usize, rng: &mut SimpleRng) -> f64 {
    // Coldest in January, warmest in July.
    let phase = (month as f64 - 0.5) / 12.0 * 2.0 * std::f64::consts::PI;
    let season = -amplitude * phase.cos();
    let trend = TREND * (year - 1900).max(0) as f64;
    mean + season + trend + rng.gauss(0.0, 1.3)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_climate.csv".to_string());

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;

    let mut header = vec!["Station Number".to_string(), "Year".to_string()];
    header.extend(MONTH_COLUMNS.iter().map(|m| m.to_string()));
    writer.write_record(&header)?;

    let mut rows = 0usize;
    for &(id, mean, amplitude, first_year) in &STATIONS {
        for year in first_year..=LAST_YEAR {
            let mut row = vec![id.to_string(), year.to_string()];
            for month in 0..MONTH_COLUMNS.len() {
                let t = monthly_temperature(mean, amplitude, year, month, &mut rng);
                if rng.next_u64() % MISSING_EVERY == 0 {
                    row.push(String::new());
                } else {
                    row.push(format!("{t:.1}"));
                }
            }
            writer.write_record(&row)?;
            rows += 1;
        }
    }
    writer.flush()?;

    println!(
        "Wrote {rows} station-years for {} stations to {output_path}",
        STATIONS.len()
    );
    Ok(())
}

use std::path::Path;

use anyhow::{Context, Result, bail};

use super::model::{ClimateDataset, MonthlyDataResponse, MonthlyRecord};

/// Month column headers of the wide-format CSV, January first.
pub const MONTH_COLUMNS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const STATION_COLUMN: &str = "Station Number";
const YEAR_COLUMN: &str = "Year";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a climate dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – semicolon-separated wide format, one row per station and year
/// * `.json`         – a monthly data response `{ "stations": [...] }`
pub fn load_file(path: &Path) -> Result<ClimateDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Default display name for a station without a catalog entry.
pub fn default_station_name(id: &str) -> String {
    format!("Station {id}")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: semicolon-delimited, header row
/// `Station Number;Year;Jan;Feb;...;Dec`.
/// Month cells that are empty, `null` or not a number are missing readings.
fn load_csv(path: &Path) -> Result<ClimateDataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Data file not found: {}", path.display()))?;
    read_csv(file)
}

/// Parse the wide-format CSV from any reader.
pub fn read_csv<R: std::io::Read>(input: R) -> Result<ClimateDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let missing: Vec<&str> = [STATION_COLUMN, YEAR_COLUMN]
        .iter()
        .chain(MONTH_COLUMNS.iter())
        .copied()
        .filter(|c| !headers.iter().any(|h| h == c))
        .collect();
    if !missing.is_empty() {
        bail!("CSV missing required columns: {missing:?}. Found columns: {headers:?}");
    }

    let column = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let station_idx = column(STATION_COLUMN);
    let year_idx = column(YEAR_COLUMN);
    let month_idx: Vec<usize> = MONTH_COLUMNS.iter().map(|m| column(m)).collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let station_id = record.get(station_idx).unwrap_or("").to_string();
        if station_id.is_empty() {
            bail!("CSV row {row_no}: empty station number");
        }
        let year_cell = record.get(year_idx).unwrap_or("");
        let year: i32 = year_cell
            .parse()
            .with_context(|| format!("CSV row {row_no}: '{year_cell}' is not a year"))?;

        for (m, &idx) in month_idx.iter().enumerate() {
            records.push(MonthlyRecord {
                station_id: station_id.clone(),
                year,
                month: m as u8 + 1,
                temperature: parse_temperature(record.get(idx).unwrap_or("")),
            });
        }
    }

    let dataset = ClimateDataset::from_records(records, &default_station_name);
    log_loaded(&dataset);
    Ok(dataset)
}

fn parse_temperature(s: &str) -> Option<f64> {
    if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("nan") {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (a saved monthly response):
///
/// ```json
/// { "stations": [
///     { "station_id": "66062", "station_name": "Station 66062",
///       "data": [ { "year": 1859, "month": 1, "temperature": 25.7 }, ... ] }
/// ] }
/// ```
fn load_json(path: &Path) -> Result<ClimateDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let response: MonthlyDataResponse = serde_json::from_str(&text).context("parsing JSON")?;

    let mut names = std::collections::BTreeMap::new();
    let mut records = Vec::new();
    for station in response.stations {
        for point in &station.data {
            if !(1..=12).contains(&point.month) {
                bail!(
                    "Station {}: month {} out of range in year {}",
                    station.station_id,
                    point.month,
                    point.year
                );
            }
            records.push(MonthlyRecord {
                station_id: station.station_id.clone(),
                year: point.year,
                month: point.month,
                temperature: point.temperature,
            });
        }
        names.insert(station.station_id, station.station_name);
    }

    let dataset = ClimateDataset::from_records(records, &|id| {
        names
            .get(id)
            .cloned()
            .unwrap_or_else(|| default_station_name(id))
    });
    log_loaded(&dataset);
    Ok(dataset)
}

fn log_loaded(dataset: &ClimateDataset) {
    match dataset.year_bounds() {
        Some(bounds) => log::info!(
            "Loaded {} data points for {} stations (years {bounds})",
            dataset.len(),
            dataset.stations.len()
        ),
        None => log::warn!("Loaded an empty dataset"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Station Number;Year;Jan;Feb;Mar;Apr;May;Jun;Jul;Aug;Sep;Oct;Nov;Dec
66062;1859;25.7;25.4;24.2;21.0;18.1;15.6;14.9;16.0;18.3;20.9;22.9;24.8
66062;1860;25.1;null;24.0;;18.0;15.0;14.0;16.1;18.0;20.0;22.0;24.0
10001;1900;1.0;2.0;3.0;4.0;5.0;6.0;7.0;8.0;9.0;10.0;11.0;12.0
";

    #[test]
    fn wide_rows_become_long_format() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 36);
        assert_eq!(ds.records[0].station_id, "10001");
        assert_eq!(ds.stations[0].name, "Station 10001");
        let feb_1860 = ds
            .station_records("66062")
            .find(|r| r.year == 1860 && r.month == 2)
            .unwrap();
        assert_eq!(feb_1860.temperature, None);
        let apr_1860 = ds
            .station_records("66062")
            .find(|r| r.year == 1860 && r.month == 4)
            .unwrap();
        assert_eq!(apr_1860.temperature, None);
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = read_csv("Station Number;Year;Jan\n1;1900;1.0\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("Feb"));
    }

    #[test]
    fn bad_year_is_an_error() {
        let text = SAMPLE.replace("1900", "nineteen");
        assert!(read_csv(text.as_bytes()).is_err());
    }
}

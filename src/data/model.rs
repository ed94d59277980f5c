use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Year bounds
// ---------------------------------------------------------------------------

/// Inclusive year interval, e.g. the first and last year present in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl YearBounds {
    pub fn new(min: i32, max: i32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }

    pub fn clamp(&self, year: i32) -> i32 {
        year.clamp(self.min, self.max)
    }
}

impl fmt::Display for YearBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// Visualisation mode
// ---------------------------------------------------------------------------

/// Which aggregation the chart and the CSV export use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    #[default]
    Monthly,
    Annual,
}

impl DataMode {
    /// Lower-case name used in export file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataMode::Monthly => "monthly",
            DataMode::Annual => "annual",
        }
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Station catalog
// ---------------------------------------------------------------------------

/// A weather-observation site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
}

/// One row of the long-format dataset: a single station/month reading.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRecord {
    pub station_id: String,
    pub year: i32,
    /// 1..=12
    pub month: u8,
    pub temperature: Option<f64>,
}

// ---------------------------------------------------------------------------
// ClimateDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset in long format with its station catalog.
#[derive(Debug, Clone, Default)]
pub struct ClimateDataset {
    /// Records sorted by station id, year, month.
    pub records: Vec<MonthlyRecord>,
    /// Distinct stations sorted by name.
    pub stations: Vec<Station>,
}

impl ClimateDataset {
    /// Sort the records and derive the station catalog.
    pub fn from_records(mut records: Vec<MonthlyRecord>, names: &dyn Fn(&str) -> String) -> Self {
        records.sort_by(|a, b| {
            a.station_id
                .cmp(&b.station_id)
                .then(a.year.cmp(&b.year))
                .then(a.month.cmp(&b.month))
        });

        let mut stations: Vec<Station> = Vec::new();
        for rec in &records {
            if stations.last().map(|s| s.id.as_str()) != Some(rec.station_id.as_str()) {
                stations.push(Station {
                    id: rec.station_id.clone(),
                    name: names(&rec.station_id),
                });
            }
        }
        stations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        ClimateDataset { records, stations }
    }

    /// Number of long-format records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last year across all records.
    pub fn year_bounds(&self) -> Option<YearBounds> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some(YearBounds::new(min, max))
    }

    pub fn station(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    /// Records belonging to one station, in year/month order.
    pub fn station_records<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a MonthlyRecord> + 'a {
        // Records are sorted by station id, so the matching rows are contiguous.
        let start = self.records.partition_point(|r| r.station_id.as_str() < id);
        self.records[start..]
            .iter()
            .take_while(move |r| r.station_id == id)
    }
}

// ---------------------------------------------------------------------------
// Responses consumed by the chart and the exporters
// ---------------------------------------------------------------------------

/// Single monthly temperature reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyDataPoint {
    pub year: i32,
    pub month: u8,
    /// Temperature in °C, `None` when the reading is missing.
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationMonthlyData {
    pub station_id: String,
    pub station_name: String,
    pub data: Vec<MonthlyDataPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyDataResponse {
    pub stations: Vec<StationMonthlyData>,
    #[serde(default)]
    pub total_points: usize,
}

/// Annual statistics over the monthly readings of one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualDataPoint {
    pub year: i32,
    pub mean: f64,
    pub std: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    /// mean + 1σ
    pub upper_bound: f64,
    /// mean − 1σ
    pub lower_bound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationAnnualData {
    pub station_id: String,
    pub station_name: String,
    pub data: Vec<AnnualDataPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnualDataResponse {
    pub stations: Vec<StationAnnualData>,
    #[serde(default)]
    pub total_years: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(station: &str, year: i32, month: u8) -> MonthlyRecord {
        MonthlyRecord {
            station_id: station.to_string(),
            year,
            month,
            temperature: Some(1.0),
        }
    }

    #[test]
    fn from_records_sorts_and_builds_catalog() {
        let ds = ClimateDataset::from_records(
            vec![rec("200", 1901, 2), rec("100", 1900, 1), rec("200", 1901, 1)],
            &|id| format!("Station {id}"),
        );
        assert_eq!(ds.records[0].station_id, "100");
        assert_eq!(ds.records[1].month, 1);
        assert_eq!(ds.stations.len(), 2);
        assert_eq!(ds.year_bounds(), Some(YearBounds::new(1900, 1901)));
        assert_eq!(ds.station_records("200").count(), 2);
        assert_eq!(ds.station_records("300").count(), 0);
    }

    #[test]
    fn year_bounds_normalises_order() {
        let b = YearBounds::new(2019, 1859);
        assert_eq!((b.min, b.max), (1859, 2019));
        assert!(b.contains(1900));
        assert_eq!(b.clamp(2030), 2019);
    }
}

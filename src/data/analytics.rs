use serde::{Deserialize, Serialize};

use super::model::{ClimateDataset, MonthlyRecord, YearBounds};
use super::query::{self, DataQuery};

/// Reported when the query matches no rows at all.
pub const FALLBACK_YEAR_RANGE: YearBounds = YearBounds { min: 1859, max: 2019 };

/// Summary statistics for one station over the queried years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationAnalytics {
    pub station_id: String,
    pub station_name: String,
    /// Lowest monthly reading and when it was first seen.
    pub min_temp: f64,
    pub min_temp_year: i32,
    pub min_temp_month: u8,
    pub max_temp: f64,
    pub max_temp_year: i32,
    pub max_temp_month: u8,
    pub mean_temp: f64,
    /// Sample standard deviation; 0 with a single reading.
    pub std_temp: f64,
    /// Year with the lowest mean of its readings.
    pub coldest_year: i32,
    pub coldest_year_temp: f64,
    pub hottest_year: i32,
    pub hottest_year_temp: f64,
    /// Share of rows with a reading, in percent.
    pub data_coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub stations: Vec<StationAnalytics>,
    /// Years spanned by all matching rows, readings or not.
    pub year_range: YearBounds,
    pub total_stations: usize,
}

/// Per-station analytics for the queried stations, in query order.
///
/// Stations without rows in range or without a single reading are omitted.
/// Temperatures are rounded to two decimals, coverage to one.
pub fn analytics(dataset: &ClimateDataset, query: &DataQuery) -> AnalyticsResponse {
    let mut stations = Vec::new();
    let mut years: Option<YearBounds> = None;

    for id in &query.stations {
        let rows: Vec<&MonthlyRecord> = dataset
            .station_records(id)
            .filter(|r| query.accepts(r))
            .collect();
        for r in &rows {
            years = Some(match years {
                Some(b) => YearBounds::new(b.min.min(r.year), b.max.max(r.year)),
                None => YearBounds::new(r.year, r.year),
            });
        }
        if let Some(summary) = station_analytics(dataset, id, &rows) {
            stations.push(summary);
        }
    }

    AnalyticsResponse {
        total_stations: stations.len(),
        stations,
        year_range: years.unwrap_or(FALLBACK_YEAR_RANGE),
    }
}

fn station_analytics(
    dataset: &ClimateDataset,
    id: &str,
    rows: &[&MonthlyRecord],
) -> Option<StationAnalytics> {
    let readings: Vec<(&MonthlyRecord, f64)> = rows
        .iter()
        .filter_map(|r| r.temperature.map(|t| (*r, t)))
        .collect();
    if readings.is_empty() {
        return None;
    }

    // Ties keep the earliest row.
    let (min_row, min_temp) = readings
        .iter()
        .copied()
        .reduce(|best, cur| if cur.1 < best.1 { cur } else { best })?;
    let (max_row, max_temp) = readings
        .iter()
        .copied()
        .reduce(|best, cur| if cur.1 > best.1 { cur } else { best })?;

    let n = readings.len() as f64;
    let mean = readings.iter().map(|(_, t)| t).sum::<f64>() / n;
    let std = if readings.len() < 2 {
        0.0
    } else {
        (readings.iter().map(|(_, t)| (t - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    };

    let yearly = yearly_means(&readings);
    let (coldest_year, coldest) = yearly
        .iter()
        .copied()
        .reduce(|best, cur| if cur.1 < best.1 { cur } else { best })?;
    let (hottest_year, hottest) = yearly
        .iter()
        .copied()
        .reduce(|best, cur| if cur.1 > best.1 { cur } else { best })?;

    let coverage = readings.len() as f64 / rows.len() as f64 * 100.0;

    Some(StationAnalytics {
        station_id: id.to_string(),
        station_name: query::station_name(dataset, id),
        min_temp: query::round2(min_temp),
        min_temp_year: min_row.year,
        min_temp_month: min_row.month,
        max_temp: query::round2(max_temp),
        max_temp_year: max_row.year,
        max_temp_month: max_row.month,
        mean_temp: query::round2(mean),
        std_temp: query::round2(std),
        coldest_year,
        coldest_year_temp: query::round2(coldest),
        hottest_year,
        hottest_year_temp: query::round2(hottest),
        data_coverage: (coverage * 10.0).round() / 10.0,
    })
}

/// Mean reading per year, for years with at least one reading.
///
/// `readings` must be in year order.
fn yearly_means(readings: &[(&MonthlyRecord, f64)]) -> Vec<(i32, f64)> {
    let mut means = Vec::new();
    let mut current: Option<(i32, f64, usize)> = None;
    for (rec, t) in readings {
        current = match current {
            Some((year, sum, count)) if year == rec.year => Some((year, sum + t, count + 1)),
            Some((year, sum, count)) => {
                means.push((year, sum / count as f64));
                Some((rec.year, *t, 1))
            }
            None => Some((rec.year, *t, 1)),
        };
    }
    if let Some((year, sum, count)) = current {
        means.push((year, sum / count as f64));
    }
    means
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    const SAMPLE: &str = "\
Station Number;Year;Jan;Feb;Mar;Apr;May;Jun;Jul;Aug;Sep;Oct;Nov;Dec
1;2000;1;2;3;4;5;6;7;8;9;10;11;12
1;2001;20;-4;;;;;;;;;;
1;2002;;;;;;;;;;;;
2;2000;;;;;;;;;;;;
3;1990;7;7;7;7;7;7;7;7;7;7;7;7
";

    fn query(ids: &[&str], from: Option<i32>, to: Option<i32>) -> DataQuery {
        DataQuery {
            stations: ids.iter().map(|s| s.to_string()).collect(),
            year_from: from,
            year_to: to,
        }
    }

    #[test]
    fn hottest_and_coldest_years_use_yearly_means() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        let resp = analytics(&ds, &query(&["1"], None, None));
        let s = &resp.stations[0];

        // 2000 averages 6.5, 2001 averages 8.0; 2002 has no readings.
        assert_eq!((s.coldest_year, s.coldest_year_temp), (2000, 6.5));
        assert_eq!((s.hottest_year, s.hottest_year_temp), (2001, 8.0));

        assert_eq!((s.min_temp, s.min_temp_year, s.min_temp_month), (-4.0, 2001, 2));
        assert_eq!((s.max_temp, s.max_temp_year, s.max_temp_month), (20.0, 2001, 1));
        assert_eq!(s.mean_temp, 6.71);
    }

    #[test]
    fn coverage_counts_missing_rows() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        let resp = analytics(&ds, &query(&["1", "3"], None, None));

        // 14 readings out of 36 rows.
        assert_eq!(resp.stations[0].data_coverage, 38.9);
        assert_eq!(resp.stations[1].data_coverage, 100.0);
        assert_eq!(resp.stations[1].std_temp, 0.0);
        assert_eq!(resp.year_range, YearBounds::new(1990, 2002));
    }

    #[test]
    fn stations_without_readings_are_omitted() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        let resp = analytics(&ds, &query(&["2", "3", "missing"], None, None));
        assert_eq!(resp.total_stations, 1);
        assert_eq!(resp.stations[0].station_id, "3");
        // Station 2 still contributes its rows to the year range.
        assert_eq!(resp.year_range, YearBounds::new(1990, 2000));
    }

    #[test]
    fn empty_query_reports_fallback_range() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        let resp = analytics(&ds, &query(&["1"], Some(2050), None));
        assert!(resp.stations.is_empty());
        assert_eq!(resp.year_range, FALLBACK_YEAR_RANGE);
    }
}

use super::model::{
    AnnualDataPoint, AnnualDataResponse, ClimateDataset, MonthlyDataPoint, MonthlyDataResponse,
    MonthlyRecord, StationAnnualData, StationMonthlyData,
};

// ---------------------------------------------------------------------------
// Data query: which stations and which years
// ---------------------------------------------------------------------------

/// Stations (in display order) plus an inclusive, optionally open year range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataQuery {
    pub stations: Vec<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

impl DataQuery {
    pub(super) fn accepts(&self, rec: &MonthlyRecord) -> bool {
        self.year_from.map_or(true, |from| rec.year >= from)
            && self.year_to.map_or(true, |to| rec.year <= to)
    }
}

/// Monthly readings for the queried stations.
///
/// Stations keep the query order; stations without any rows in range are
/// omitted, unknown ids are skipped.
pub fn monthly(dataset: &ClimateDataset, query: &DataQuery) -> MonthlyDataResponse {
    let mut stations = Vec::new();
    let mut total_points = 0;

    for id in &query.stations {
        let data: Vec<MonthlyDataPoint> = dataset
            .station_records(id)
            .filter(|r| query.accepts(r))
            .map(|r| MonthlyDataPoint {
                year: r.year,
                month: r.month,
                temperature: r.temperature,
            })
            .collect();
        if data.is_empty() {
            continue;
        }
        total_points += data.len();
        stations.push(StationMonthlyData {
            station_id: id.clone(),
            station_name: station_name(dataset, id),
            data,
        });
    }

    MonthlyDataResponse {
        stations,
        total_points,
    }
}

/// Per-year statistics for the queried stations.
///
/// Computed over the non-missing monthly readings of each year: mean, sample
/// standard deviation (0 with fewer than two readings), min, max and the
/// ±1σ bounds. Values are rounded to two decimals; years without any reading
/// are skipped.
pub fn annual(dataset: &ClimateDataset, query: &DataQuery) -> AnnualDataResponse {
    let mut stations = Vec::new();
    let mut total_years = 0;

    for id in &query.stations {
        let mut data = Vec::new();
        let mut current: Option<i32> = None;
        let mut temps: Vec<f64> = Vec::with_capacity(12);
        let mut seen_rows = false;

        for rec in dataset.station_records(id).filter(|r| query.accepts(r)) {
            seen_rows = true;
            if current != Some(rec.year) {
                if let Some(year) = current {
                    data.extend(year_stats(year, &temps));
                }
                current = Some(rec.year);
                temps.clear();
            }
            if let Some(t) = rec.temperature {
                temps.push(t);
            }
        }
        if let Some(year) = current {
            data.extend(year_stats(year, &temps));
        }

        if !seen_rows {
            continue;
        }
        total_years = total_years.max(data.len());
        stations.push(StationAnnualData {
            station_id: id.clone(),
            station_name: station_name(dataset, id),
            data,
        });
    }

    AnnualDataResponse {
        stations,
        total_years,
    }
}

fn year_stats(year: i32, temps: &[f64]) -> Option<AnnualDataPoint> {
    if temps.is_empty() {
        return None;
    }
    let n = temps.len() as f64;
    let mean = temps.iter().sum::<f64>() / n;
    let std = if temps.len() < 2 {
        0.0
    } else {
        (temps.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    };
    let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
    let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(AnnualDataPoint {
        year,
        mean: round2(mean),
        std: round2(std),
        min_temp: round2(min),
        max_temp: round2(max),
        upper_bound: round2(mean + std),
        lower_bound: round2(mean - std),
    })
}

pub(super) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(super) fn station_name(dataset: &ClimateDataset, id: &str) -> String {
    dataset
        .station(id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| super::loader::default_station_name(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    const SAMPLE: &str = "\
Station Number;Year;Jan;Feb;Mar;Apr;May;Jun;Jul;Aug;Sep;Oct;Nov;Dec
1;2000;1;2;3;4;5;6;7;8;9;10;11;12
1;2001;5;;;;;;;;;;;
1;2002;;;;;;;;;;;;
2;2000;10;10;10;10;10;10;10;10;10;10;10;10
";

    fn query(ids: &[&str], from: Option<i32>, to: Option<i32>) -> DataQuery {
        DataQuery {
            stations: ids.iter().map(|s| s.to_string()).collect(),
            year_from: from,
            year_to: to,
        }
    }

    #[test]
    fn monthly_respects_order_and_range() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        let resp = monthly(&ds, &query(&["2", "1", "missing"], Some(2000), Some(2000)));
        assert_eq!(resp.stations.len(), 2);
        assert_eq!(resp.stations[0].station_id, "2");
        assert_eq!(resp.total_points, 24);
    }

    #[test]
    fn annual_statistics() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        let resp = annual(&ds, &query(&["1"], None, None));
        let points = &resp.stations[0].data;
        // 2002 has no readings and is skipped.
        assert_eq!(points.len(), 2);
        assert_eq!(resp.total_years, 2);

        let y2000 = &points[0];
        assert_eq!(y2000.mean, 6.5);
        assert_eq!(y2000.std, 3.61);
        assert_eq!(y2000.min_temp, 1.0);
        assert_eq!(y2000.max_temp, 12.0);
        assert_eq!(y2000.upper_bound, 10.11);
        assert_eq!(y2000.lower_bound, 2.89);

        let y2001 = &points[1];
        assert_eq!(y2001.std, 0.0);
        assert_eq!(y2001.upper_bound, 5.0);
    }
}

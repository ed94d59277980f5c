use chrono::NaiveDate;

use crate::data::model::{AnnualDataResponse, DataMode, MonthlyDataResponse};

use super::blob::{BlobRegistry, CSV_MIME};
use super::sink::DownloadSink;
use super::{Delivery, ExportError, export_file_name};

/// Written first so spreadsheet tools read the file (and "°C") as UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const MONTHLY_HEADER: [&str; 5] = [
    "Station ID",
    "Station Name",
    "Year",
    "Month",
    "Temperature (°C)",
];

pub const ANNUAL_HEADER: [&str; 9] = [
    "Station ID",
    "Station Name",
    "Year",
    "Mean (°C)",
    "Std Dev (°C)",
    "Min (°C)",
    "Max (°C)",
    "Lower Bound (°C)",
    "Upper Bound (°C)",
];

/// One CSV line, cell by cell.
pub type ExportRow = Vec<String>;

/// The dataset matching the active mode.
#[derive(Debug, Clone, Copy)]
pub enum ExportData<'a> {
    Monthly(&'a MonthlyDataResponse),
    Annual(&'a AnnualDataResponse),
}

impl<'a> ExportData<'a> {
    /// Pick the response for `mode`, if that one is loaded.
    pub fn for_mode(
        mode: DataMode,
        monthly: Option<&'a MonthlyDataResponse>,
        annual: Option<&'a AnnualDataResponse>,
    ) -> Option<Self> {
        match mode {
            DataMode::Monthly => monthly.map(ExportData::Monthly),
            DataMode::Annual => annual.map(ExportData::Annual),
        }
    }

    pub fn mode(&self) -> DataMode {
        match self {
            ExportData::Monthly(_) => DataMode::Monthly,
            ExportData::Annual(_) => DataMode::Annual,
        }
    }

    /// Header first, then one row per station and data point.
    pub fn rows(&self) -> Vec<ExportRow> {
        match self {
            ExportData::Monthly(resp) => {
                let mut rows = vec![MONTHLY_HEADER.iter().map(|h| h.to_string()).collect()];
                for station in &resp.stations {
                    for point in &station.data {
                        rows.push(vec![
                            station.station_id.clone(),
                            station.station_name.clone(),
                            point.year.to_string(),
                            point.month.to_string(),
                            point.temperature.map(|t| t.to_string()).unwrap_or_default(),
                        ]);
                    }
                }
                rows
            }
            ExportData::Annual(resp) => {
                let mut rows = vec![ANNUAL_HEADER.iter().map(|h| h.to_string()).collect()];
                for station in &resp.stations {
                    for point in &station.data {
                        rows.push(vec![
                            station.station_id.clone(),
                            station.station_name.clone(),
                            point.year.to_string(),
                            format!("{:.2}", point.mean),
                            format!("{:.2}", point.std),
                            format!("{:.2}", point.min_temp),
                            format!("{:.2}", point.max_temp),
                            format!("{:.2}", point.lower_bound),
                            format!("{:.2}", point.upper_bound),
                        ]);
                    }
                }
                rows
            }
        }
    }
}

/// Serialize rows as BOM-prefixed CSV.
///
/// A cell is quoted only when it contains a comma, a double quote or a line
/// break; embedded quotes are doubled. A carriage return counts as a line
/// break, so a lone `\r` is quoted as well.
pub fn to_csv_bytes(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = ::csv::WriterBuilder::new()
        .quote_style(::csv::QuoteStyle::Necessary)
        .terminator(::csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(UTF8_BOM.to_vec());

    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Export the dataset for `mode` and hand it to `sink`.
pub fn export_csv(
    mode: DataMode,
    monthly: Option<&MonthlyDataResponse>,
    annual: Option<&AnnualDataResponse>,
    date: NaiveDate,
    registry: &BlobRegistry,
    sink: &mut dyn DownloadSink,
) -> Result<Delivery, ExportError> {
    let data = ExportData::for_mode(mode, monthly, annual).ok_or(ExportError::NoData(mode))?;
    let rows = data.rows();
    let bytes = to_csv_bytes(&rows)?;
    log::debug!("CSV export: {} data rows, {} bytes", rows.len() - 1, bytes.len());

    let blob = registry.stage(CSV_MIME, bytes);
    let file_name = export_file_name("climate_data", mode, date, "csv");
    sink.deliver(&file_name, &blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AnnualDataPoint, MonthlyDataPoint, StationAnnualData, StationMonthlyData};
    use crate::export::sink::MemorySink;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    fn monthly() -> MonthlyDataResponse {
        MonthlyDataResponse {
            stations: vec![StationMonthlyData {
                station_id: "66062".into(),
                station_name: "Sydney, \"Observatory\"".into(),
                data: vec![
                    MonthlyDataPoint { year: 1859, month: 1, temperature: Some(25.7) },
                    MonthlyDataPoint { year: 1859, month: 2, temperature: None },
                ],
            }],
            total_points: 2,
        }
    }

    #[test]
    fn monthly_csv_escapes_and_leaves_missing_empty() {
        let rows = ExportData::Monthly(&monthly()).rows();
        let bytes = to_csv_bytes(&rows).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Station ID,Station Name,Year,Month,Temperature (°C)");
        assert_eq!(lines[1], "66062,\"Sydney, \"\"Observatory\"\"\",1859,1,25.7");
        assert_eq!(lines[2], "66062,\"Sydney, \"\"Observatory\"\"\",1859,2,");
    }

    #[test]
    fn carriage_return_is_quoted() {
        let rows = vec![vec!["a\rb".to_string(), "plain".to_string()]];
        let bytes = to_csv_bytes(&rows).unwrap();
        assert_eq!(&bytes[UTF8_BOM.len()..], b"\"a\rb\",plain\n");
    }

    #[test]
    fn annual_fields_have_two_decimals() {
        let resp = AnnualDataResponse {
            stations: vec![StationAnnualData {
                station_id: "1".into(),
                station_name: "One".into(),
                data: vec![AnnualDataPoint {
                    year: 2000,
                    mean: 12.0,
                    std: 1.005,
                    min_temp: -3.5,
                    max_temp: 20.123,
                    upper_bound: 13.0,
                    lower_bound: 11.0,
                }],
            }],
            total_years: 1,
        };
        let rows = ExportData::Annual(&resp).rows();
        assert_eq!(rows[0].len(), ANNUAL_HEADER.len());
        assert_eq!(rows[1][3], "12.00");
        assert_eq!(rows[1][5], "-3.50");
        assert_eq!(rows[1][6], "20.12");
        assert_eq!(rows[1][7], "11.00");
        assert_eq!(rows[1][8], "13.00");
    }

    #[test]
    fn export_uses_active_mode() {
        let registry = BlobRegistry::new();
        let mut sink = MemorySink::default();
        let data = monthly();

        let delivered =
            export_csv(DataMode::Monthly, Some(&data), None, date(), &registry, &mut sink).unwrap();
        assert_eq!(delivered, Delivery::Saved("climate_data_monthly_2024-01-31.csv".into()));
        assert_eq!(sink.files.len(), 1);

        let err = export_csv(DataMode::Annual, Some(&data), None, date(), &registry, &mut sink)
            .unwrap_err();
        assert!(matches!(err, ExportError::NoData(DataMode::Annual)));
        assert_eq!(registry.live_count(), 0);
    }
}

/// Data layer: core types, loading, and querying.
///
/// Architecture:
/// ```text
///  .csv (wide, `;`) / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ClimateDataset (long format)
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ ClimateDataset │  Vec<MonthlyRecord>, station catalog
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  query    │  stations + year range → monthly / annual responses
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ analytics  │  per-station extremes, hottest/coldest year, coverage
///   └───────────┘
/// ```

pub mod analytics;
pub mod loader;
pub mod model;
pub mod query;

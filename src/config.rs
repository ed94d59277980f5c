use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::model::YearBounds;

/// File looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "climate-explorer.json";

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Start-up configuration. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset opened at start-up.
    pub data_file: Option<PathBuf>,
    /// Delay before soft year warnings are shown.
    pub debounce_ms: u64,
    /// Years outside this range get a warning until a dataset is loaded.
    pub plausible_years: YearBounds,
    /// Initial zoom half-width in years.
    pub default_zoom_window: u32,
    /// Pixel density of exported PNG charts.
    pub png_scale: f32,
    /// "Last N years" preset buttons.
    pub year_presets: Vec<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            debounce_ms: 800,
            plausible_years: YearBounds::new(1859, 2100),
            default_zoom_window: 10,
            png_scale: 2.0,
            year_presets: vec![10, 30, 50, 100],
        }
    }
}

impl Config {
    /// Parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Resolve the configuration from command-line arguments.
    ///
    /// A first argument ending in `.json` is a config file, any other first
    /// argument is the data file. Without a config argument
    /// [`DEFAULT_CONFIG_FILE`] is used when it exists.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let first = args.into_iter().nth(1).map(PathBuf::from);

        match first {
            Some(path) if has_extension(&path, "json") => Config::load(&path),
            Some(data_file) => {
                let mut config = Config::from_default_file()?;
                config.data_file = Some(data_file);
                Ok(config)
            }
            None => Config::from_default_file(),
        }
    }

    fn from_default_file() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Config::load(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Clamp values the rest of the app relies on.
    fn sanitized(mut self) -> Self {
        if !(self.png_scale.is_finite() && self.png_scale >= 1.0) {
            log::warn!("png_scale {} is invalid, using 2.0", self.png_scale);
            self.png_scale = 2.0;
        }
        self.default_zoom_window = crate::filters::zoom::snap_window(self.default_zoom_window);
        self.plausible_years = YearBounds::new(self.plausible_years.min, self.plausible_years.max);
        self.year_presets.retain(|&n| n > 0);
        self
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

use eframe::egui::Color32;
use indexmap::IndexMap;
use palette::{Hsl, IntoColor, Srgb};

/// Colours stay put while the selection has at most this many stations.
const MIN_PALETTE: usize = 8;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Station colours: selection order → Color32
// ---------------------------------------------------------------------------

/// Assigns each selected station a colour by its position in the selection.
#[derive(Debug, Clone, Default)]
pub struct StationColors {
    mapping: IndexMap<String, Color32>,
}

impl StationColors {
    pub fn new<'a, I>(selection: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let ids: Vec<&String> = selection.into_iter().collect();
        let palette = generate_palette(ids.len().max(MIN_PALETTE));
        let mapping = ids
            .into_iter()
            .zip(palette)
            .map(|(id, c)| (id.clone(), c))
            .collect();
        Self { mapping }
    }

    /// Colour of a selected station; grey for anything else.
    pub fn color_for(&self, station_id: &str) -> Color32 {
        self.mapping
            .get(station_id)
            .copied()
            .unwrap_or(Color32::GRAY)
    }

    pub fn rgb_for(&self, station_id: &str) -> [u8; 3] {
        let c = self.color_for(station_id);
        [c.r(), c.g(), c.b()]
    }
}

use eframe::egui::{self, Color32};

/// Light or dark appearance, following the egui visuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark { Theme::Dark } else { Theme::Light }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        }
    }

    /// Fill behind exported charts.
    pub fn background(self) -> [u8; 3] {
        match self {
            Theme::Light => [0xff, 0xff, 0xff],
            Theme::Dark => [0x1f, 0x29, 0x37],
        }
    }

    /// Axis and frame colour in exported charts.
    pub fn foreground(self) -> [u8; 3] {
        match self {
            Theme::Light => [0x37, 0x41, 0x51],
            Theme::Dark => [0xd1, 0xd5, 0xdb],
        }
    }

    pub fn grid(self) -> [u8; 3] {
        match self {
            Theme::Light => [0xe5, 0xe7, 0xeb],
            Theme::Dark => [0x37, 0x41, 0x51],
        }
    }

    pub fn warning_color(self) -> Color32 {
        match self {
            Theme::Light => Color32::from_rgb(0xb4, 0x53, 0x09),
            Theme::Dark => Color32::from_rgb(0xfb, 0xbf, 0x24),
        }
    }

    pub fn error_color(self) -> Color32 {
        match self {
            Theme::Light => Color32::from_rgb(0xdc, 0x26, 0x26),
            Theme::Dark => Color32::from_rgb(0xf8, 0x71, 0x71),
        }
    }
}

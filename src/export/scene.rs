use std::borrow::Cow;
use std::sync::OnceLock;

use eframe::egui;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use serde::{Deserialize, Serialize};

use crate::data::model::{AnnualDataResponse, MonthlyDataResponse};
use crate::theme::Theme;

use super::ExportError;
use super::png::{ChartSnapshotSource, RasterCanvas, VectorSnapshot};

/// Layout of the exported chart, in logical pixels.
const MARGIN: f32 = 12.0;
const X_LABEL_AREA: f32 = 36.0;
const Y_LABEL_AREA: f32 = 52.0;
const FONT_SIZE: f32 = 12.0;
const LEGEND_LINE: f32 = 20.0;
const GRID_LINES: usize = 5;

/// Below this size axis text would not leave room for the plot.
const MIN_TEXT_WIDTH: f32 = 160.0;
const MIN_TEXT_HEIGHT: f32 = 120.0;

pub const X_AXIS_LABEL: &str = "Year";
pub const Y_AXIS_LABEL: &str = "Temperature (°C)";

/// egui's bundled proportional face, reused for exported chart text.
const CHART_FONT: &str = "Ubuntu-Light";

/// On-screen size of the chart in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f32,
    pub height: f32,
}

// ---------------------------------------------------------------------------
// Vector chart scene
// ---------------------------------------------------------------------------

/// A connected run of `[x, y]` points; gaps in the data start a new run.
pub type Segment = Vec<[f64; 2]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSeries {
    pub label: String,
    pub color: [u8; 3],
    pub segments: Vec<Segment>,
}

/// A filled band between two curves (the ±1σ overlay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBand {
    pub color: [u8; 3],
    pub upper: Segment,
    pub lower: Segment,
}

/// Resolution-independent description of the chart as drawn on screen.
///
/// `width`/`height` are only set on export copies; the live scene follows
/// the layout. The axis ranges start fitted to the content and follow the
/// plot's pan and zoom once [`ChartScene::set_view`] is called.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartScene {
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    pub foreground: [u8; 3],
    pub background: [u8; 3],
    pub grid: [u8; 3],
    pub bands: Vec<SceneBand>,
    pub series: Vec<SceneSeries>,
}

impl ChartScene {
    /// Assemble a scene and fit the axis ranges to its content.
    pub fn new(series: Vec<SceneSeries>, bands: Vec<SceneBand>, theme: Theme) -> Self {
        let mut scene = ChartScene {
            width: None,
            height: None,
            x_range: (0.0, 1.0),
            y_range: (0.0, 1.0),
            x_label: X_AXIS_LABEL.to_string(),
            y_label: Y_AXIS_LABEL.to_string(),
            foreground: theme.foreground(),
            background: theme.background(),
            grid: theme.grid(),
            bands,
            series,
        };
        scene.fit_ranges();
        scene
    }

    /// Stamp explicit pixel dimensions.
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = Some(width);
        self.height = Some(height);
    }

    pub fn size(&self) -> Option<(f32, f32)> {
        Some((self.width?, self.height?))
    }

    /// Show exactly these data ranges, e.g. the plot's current view.
    ///
    /// Empty or non-finite ranges are ignored.
    pub fn set_view(&mut self, x_range: (f64, f64), y_range: (f64, f64)) {
        if usable(x_range) && usable(y_range) {
            self.x_range = x_range;
            self.y_range = y_range;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.segments.iter().all(|seg| seg.is_empty()))
    }

    fn points(&self) -> impl Iterator<Item = &[f64; 2]> {
        let lines = self.series.iter().flat_map(|s| s.segments.iter().flatten());
        let bands = self.bands.iter().flat_map(|b| b.upper.iter().chain(b.lower.iter()));
        lines.chain(bands)
    }

    fn fit_ranges(&mut self) {
        let (mut x0, mut x1, mut y0, mut y1) =
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for [x, y] in self.points() {
            x0 = x0.min(*x);
            x1 = x1.max(*x);
            y0 = y0.min(*y);
            y1 = y1.max(*y);
        }
        if x0.is_finite() && y0.is_finite() {
            self.x_range = pad_range(x0, x1);
            self.y_range = pad_range(y0, y1);
        }
    }

    /// Draw onto `canvas`, whose background is already filled.
    ///
    /// Axis titles, tick labels and the legend need the chart font; if it
    /// cannot be used the chart is drawn again without text.
    pub fn draw(&self, canvas: &mut RasterCanvas) -> Result<(), ExportError> {
        let (width, height) = self
            .size()
            .ok_or_else(|| ExportError::ImageDecode("scene has no width/height".into()))?;

        let roomy = width >= MIN_TEXT_WIDTH && height >= MIN_TEXT_HEIGHT;
        if roomy && chart_font_available() {
            match self.render(canvas, true) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    log::warn!("Drawing chart text failed, exporting without it: {e}");
                    canvas.clear();
                }
            }
        }
        self.render(canvas, false)
    }

    fn render(&self, canvas: &mut RasterCanvas, with_text: bool) -> Result<(), ExportError> {
        let scale = canvas.scale();
        let px = |v: f32| (v * scale).round().max(0.0) as u32;
        let x_range = if usable(self.x_range) { self.x_range } else { (0.0, 1.0) };
        let y_range = if usable(self.y_range) { self.y_range } else { (0.0, 1.0) };

        // Plotters does not clip to the plot area, so cut everything to the view first.
        let bands: Vec<(RGBColor, Vec<(f64, f64)>)> = self
            .bands
            .iter()
            .map(|b| {
                let outline = b.upper.iter().chain(b.lower.iter().rev()).copied().collect();
                let clipped = clip_polygon(outline, x_range, y_range);
                (rgb(b.color), clipped.into_iter().map(|[x, y]| (x, y)).collect::<Vec<_>>())
            })
            .filter(|(_, outline)| outline.len() >= 3)
            .collect();
        let lines: Vec<(&str, RGBColor, Vec<Segment>)> = self
            .series
            .iter()
            .map(|s| {
                let mut runs: Vec<Segment> = s
                    .segments
                    .iter()
                    .flat_map(|seg| clip_polyline(seg, x_range, y_range))
                    .collect();
                // An empty run still carries the legend entry.
                if runs.is_empty() {
                    runs.push(Vec::new());
                }
                (s.label.as_str(), rgb(s.color), runs)
            })
            .collect();

        let fg = rgb(self.foreground);
        let thin = px(1.0).max(1);
        let line_width = px(1.5).max(1);
        let legend_len = px(LEGEND_LINE) as i32;
        let font = ("sans-serif", (FONT_SIZE * scale).round() as i32)
            .into_font()
            .color(&fg);
        let x_fmt = |x: &f64| format!("{x:.0}");
        let y_fmt = |y: &f64| format!("{y:.1}");
        let (w_px, h_px) = (canvas.width(), canvas.height());
        let margin = px(MARGIN).min(w_px / 8).min(h_px / 8);
        let render = |e: &dyn std::fmt::Display| ExportError::Render(e.to_string());

        let root = BitMapBackend::with_buffer(canvas.pixels_mut(), (w_px, h_px)).into_drawing_area();
        let mut builder = ChartBuilder::on(&root);
        builder.margin(margin);
        if with_text {
            builder
                .x_label_area_size(px(X_LABEL_AREA))
                .y_label_area_size(px(Y_LABEL_AREA));
        }
        let mut chart = builder
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
            .map_err(|e| render(&e))?;

        {
            let mut mesh = chart.configure_mesh();
            mesh.x_labels(GRID_LINES)
                .y_labels(GRID_LINES)
                .max_light_lines(0)
                .bold_line_style(rgb(self.grid).stroke_width(thin))
                .axis_style(fg.stroke_width(thin));
            if with_text {
                mesh.x_desc(self.x_label.as_str())
                    .y_desc(self.y_label.as_str())
                    .label_style(font.clone())
                    .axis_desc_style(font.clone())
                    .x_label_formatter(&x_fmt)
                    .y_label_formatter(&y_fmt);
            } else {
                mesh.disable_x_axis().disable_y_axis();
            }
            mesh.draw().map_err(|e| render(&e))?;
        }

        for (color, outline) in bands {
            chart
                .draw_series(std::iter::once(Polygon::new(outline, color.mix(0.25).filled())))
                .map_err(|e| render(&e))?;
        }

        let mut labelled = false;
        for (label, color, runs) in lines {
            let style = color.stroke_width(line_width);
            for (i, run) in runs.into_iter().enumerate() {
                let anno = chart
                    .draw_series(LineSeries::new(run.into_iter().map(|[x, y]| (x, y)), style))
                    .map_err(|e| render(&e))?;
                if i == 0 && with_text && !label.is_empty() {
                    anno.label(label).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + legend_len, y)], style)
                    });
                    labelled = true;
                }
            }
        }

        if labelled {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(rgb(self.background).mix(0.8))
                .border_style(fg)
                .label_font(font)
                .draw()
                .map_err(|e| render(&e))?;
        }

        root.present().map_err(|e| render(&e))?;
        Ok(())
    }
}

/// Register egui's bundled font with plotters once; false if that failed.
fn chart_font_available() -> bool {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    *REGISTERED.get_or_init(|| {
        let fonts = egui::FontDefinitions::default();
        let Some(data) = fonts.font_data.get(CHART_FONT) else {
            log::warn!("Font {CHART_FONT} is not bundled; exported charts will have no text");
            return false;
        };
        let bytes: &'static [u8] = match &data.font {
            Cow::Borrowed(bytes) => *bytes,
            Cow::Owned(bytes) => Box::leak(bytes.clone().into_boxed_slice()),
        };
        match register_font("sans-serif", FontStyle::Normal, bytes) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("Cannot use {CHART_FONT} for chart text: invalid font data");
                false
            }
        }
    })
}

fn usable((lo, hi): (f64, f64)) -> bool {
    lo.is_finite() && hi.is_finite() && hi > lo
}

fn pad_range(lo: f64, hi: f64) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        (lo - 1.0, hi + 1.0)
    } else {
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    }
}

// ---------------------------------------------------------------------------
// Clipping to the visible range
// ---------------------------------------------------------------------------

/// The part of a polyline inside the view, split where it leaves the view.
fn clip_polyline(points: &[[f64; 2]], x_range: (f64, f64), y_range: (f64, f64)) -> Vec<Segment> {
    let mut runs: Vec<Segment> = Vec::new();
    if let [only] = points {
        let [x, y] = *only;
        if (x_range.0..=x_range.1).contains(&x) && (y_range.0..=y_range.1).contains(&y) {
            runs.push(vec![*only]);
        }
        return runs;
    }

    // Whether the last run ends at an unclipped point.
    let mut open = false;
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let Some((t0, t1)) = clip_parameters(a, b, x_range, y_range) else {
            open = false;
            continue;
        };
        let at = |t: f64| [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t];
        if !open || t0 > 0.0 {
            runs.push(vec![at(t0)]);
        }
        if let Some(run) = runs.last_mut() {
            run.push(at(t1));
        }
        open = t1 >= 1.0;
    }
    runs
}

/// Liang–Barsky: the parameter interval of `a → b` inside the view.
fn clip_parameters(
    a: [f64; 2],
    b: [f64; 2],
    x_range: (f64, f64),
    y_range: (f64, f64),
) -> Option<(f64, f64)> {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, a[0] - x_range.0),
        (dx, x_range.1 - a[0]),
        (-dy, a[1] - y_range.0),
        (dy, y_range.1 - a[1]),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((t0, t1))
}

/// Sutherland–Hodgman against the four view edges.
fn clip_polygon(
    outline: Vec<[f64; 2]>,
    x_range: (f64, f64),
    y_range: (f64, f64),
) -> Vec<[f64; 2]> {
    let edges = [
        (0, x_range.0, true),
        (0, x_range.1, false),
        (1, y_range.0, true),
        (1, y_range.1, false),
    ];
    let mut out = outline;
    for (axis, bound, keep_above) in edges {
        let inside = |p: &[f64; 2]| if keep_above { p[axis] >= bound } else { p[axis] <= bound };
        let input = std::mem::take(&mut out);
        for (i, cur) in input.iter().enumerate() {
            let prev = &input[(i + input.len() - 1) % input.len()];
            match (inside(prev), inside(cur)) {
                (true, true) => out.push(*cur),
                (true, false) => out.push(crossing(prev, cur, axis, bound)),
                (false, true) => {
                    out.push(crossing(prev, cur, axis, bound));
                    out.push(*cur);
                }
                (false, false) => {}
            }
        }
    }
    out
}

fn crossing(a: &[f64; 2], b: &[f64; 2], axis: usize, bound: f64) -> [f64; 2] {
    let t = (bound - a[axis]) / (b[axis] - a[axis]);
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

fn rgb([r, g, b]: [u8; 3]) -> RGBColor {
    RGBColor(r, g, b)
}

// ---------------------------------------------------------------------------
// Series from responses
// ---------------------------------------------------------------------------

/// Monthly readings as fractional years, split at missing values.
pub fn monthly_segments(points: &[crate::data::model::MonthlyDataPoint]) -> Vec<Segment> {
    let mut segments = vec![Vec::new()];
    for p in points {
        match p.temperature {
            Some(t) => {
                let x = p.year as f64 + (p.month as f64 - 1.0) / 12.0;
                if let Some(seg) = segments.last_mut() {
                    seg.push([x, t]);
                }
            }
            None => {
                if segments.last().is_some_and(|s| !s.is_empty()) {
                    segments.push(Vec::new());
                }
            }
        }
    }
    segments.retain(|s| !s.is_empty());
    segments
}

/// Scene for the monthly chart; `colors` follows the response station order.
pub fn monthly_scene(resp: &MonthlyDataResponse, colors: &[[u8; 3]], theme: Theme) -> ChartScene {
    let fallback = theme.foreground();
    let series = resp
        .stations
        .iter()
        .zip(colors.iter().chain(std::iter::repeat(&fallback)))
        .map(|(station, color)| SceneSeries {
            label: station.station_name.clone(),
            color: *color,
            segments: monthly_segments(&station.data),
        })
        .collect();
    ChartScene::new(series, Vec::new(), theme)
}

/// Scene for the annual chart, with the ±1σ bands when `show_sigma` is set.
pub fn annual_scene(
    resp: &AnnualDataResponse,
    colors: &[[u8; 3]],
    show_sigma: bool,
    theme: Theme,
) -> ChartScene {
    let mut series = Vec::new();
    let mut bands = Vec::new();
    let fallback = theme.foreground();
    for (station, color) in resp
        .stations
        .iter()
        .zip(colors.iter().chain(std::iter::repeat(&fallback)))
    {
        let mean: Segment = station.data.iter().map(|p| [p.year as f64, p.mean]).collect();
        if show_sigma {
            bands.push(SceneBand {
                color: *color,
                upper: station.data.iter().map(|p| [p.year as f64, p.upper_bound]).collect(),
                lower: station.data.iter().map(|p| [p.year as f64, p.lower_bound]).collect(),
            });
        }
        series.push(SceneSeries {
            label: station.station_name.clone(),
            color: *color,
            segments: vec![mean],
        });
    }
    ChartScene::new(series, bands, theme)
}

// ---------------------------------------------------------------------------
// Live chart
// ---------------------------------------------------------------------------

/// The rendered chart: its layout size and, once data is plotted, its scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartElement {
    pub bounding_box: BoundingBox,
    pub graphic: Option<ChartScene>,
}

/// Holds whatever chart the central panel drew last frame.
#[derive(Debug, Clone, Default)]
pub struct ChartContainer {
    element: Option<ChartElement>,
}

impl ChartContainer {
    pub fn set(&mut self, element: Option<ChartElement>) {
        self.element = element;
    }

    pub fn element(&self) -> Option<&ChartElement> {
        self.element.as_ref()
    }
}

impl ChartSnapshotSource for ChartContainer {
    fn snapshot(&self) -> Result<VectorSnapshot, ExportError> {
        let element = self.element.as_ref().ok_or(ExportError::ChartElementNotFound)?;
        let graphic = element
            .graphic
            .as_ref()
            .ok_or(ExportError::VectorGraphicNotFound)?;

        let bbox = element.bounding_box;
        let mut scene = graphic.clone();
        scene.set_size(bbox.width, bbox.height);
        Ok(VectorSnapshot {
            bounding_box: bbox,
            scene,
        })
    }

    fn serialize(&self, snapshot: &VectorSnapshot) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec(&snapshot.scene)?)
    }

    fn rasterize(&self, markup: &[u8], canvas: &mut RasterCanvas) -> Result<(), ExportError> {
        let scene: ChartScene = serde_json::from_slice(markup)
            .map_err(|e| ExportError::ImageDecode(e.to_string()))?;
        scene.draw(canvas)
    }
}

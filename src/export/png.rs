use std::io::Cursor;

use chrono::NaiveDate;

use crate::data::model::DataMode;
use crate::theme::Theme;

use super::blob::{BlobRegistry, PNG_MIME, SCENE_MIME};
use super::scene::{BoundingBox, ChartScene};
use super::sink::DownloadSink;
use super::{Delivery, ExportError, export_file_name};

// ---------------------------------------------------------------------------
// Chart capability
// ---------------------------------------------------------------------------

/// The on-screen chart, cloned and sized for export.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSnapshot {
    pub bounding_box: BoundingBox,
    /// A copy of the live graphic with explicit width/height.
    pub scene: ChartScene,
}

/// Access to a rendered chart for rasterization.
///
/// Implementors own the "read layout → clone → serialize → draw" steps;
/// [`export_png`] owns sizing, background, encoding and naming.
pub trait ChartSnapshotSource {
    /// Locate the chart and its vector graphic and clone it at its on-screen
    /// size.
    ///
    /// Fails with [`ExportError::ChartElementNotFound`] or
    /// [`ExportError::VectorGraphicNotFound`].
    fn snapshot(&self) -> Result<VectorSnapshot, ExportError>;

    /// Serialize a snapshot into vector markup.
    fn serialize(&self, snapshot: &VectorSnapshot) -> Result<Vec<u8>, ExportError>;

    /// Decode vector markup and draw it onto `canvas` at `canvas.scale()`.
    ///
    /// Undecodable markup is [`ExportError::ImageDecode`].
    fn rasterize(&self, markup: &[u8], canvas: &mut RasterCanvas) -> Result<(), ExportError>;
}

// ---------------------------------------------------------------------------
// Raster target
// ---------------------------------------------------------------------------

/// Pixel size, density and fill of an exported chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartRasterSpec {
    pub width_px: u32,
    pub height_px: u32,
    pub scale_factor: f32,
    pub background: [u8; 3],
}

impl ChartRasterSpec {
    pub fn new(bbox: BoundingBox, scale_factor: f32, theme: Theme) -> Result<Self, ExportError> {
        let width_px = (bbox.width * scale_factor).round();
        let height_px = (bbox.height * scale_factor).round();
        if !(width_px >= 1.0 && height_px >= 1.0) {
            return Err(ExportError::EmptyBoundingBox {
                width: bbox.width,
                height: bbox.height,
            });
        }
        Ok(Self {
            width_px: width_px as u32,
            height_px: height_px as u32,
            scale_factor,
            background: theme.background(),
        })
    }
}

/// An RGB pixel buffer whose drawing coordinates are pre-scaled.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    scale: f32,
    background: [u8; 3],
    pixels: Vec<u8>,
}

impl RasterCanvas {
    /// A canvas of `spec` size already filled with the background colour.
    pub fn new(spec: &ChartRasterSpec) -> Self {
        let mut canvas = Self {
            width: spec.width_px,
            height: spec.height_px,
            scale: spec.scale_factor,
            background: spec.background,
            pixels: vec![0; spec.width_px as usize * spec.height_px as usize * 3],
        };
        canvas.clear();
        canvas
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Device pixels per logical pixel.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Repaint every pixel with the background colour.
    pub fn clear(&mut self) {
        let rgb = self.background;
        for px in self.pixels.chunks_exact_mut(3) {
            px.copy_from_slice(&rgb);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    /// Raw RGB bytes, row-major, for drawing backends.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn encode_png(self) -> Result<Vec<u8>, ExportError> {
        let (width, height) = (self.width, self.height);
        let img = image::RgbImage::from_raw(width, height, self.pixels).ok_or_else(|| {
            ExportError::Render(format!("pixel buffer does not match {width}×{height}"))
        })?;
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img).write_to(&mut out, image::ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct PngOptions {
    pub mode: DataMode,
    pub theme: Theme,
    pub scale: f32,
    pub date: NaiveDate,
}

/// Rasterize the chart behind `source` and hand the PNG to `sink`.
///
/// Both intermediate payloads are staged in `registry` and revoked before
/// this returns, whichever step fails.
pub fn export_png(
    source: &dyn ChartSnapshotSource,
    sink: &mut dyn DownloadSink,
    options: &PngOptions,
    registry: &BlobRegistry,
) -> Result<Delivery, ExportError> {
    let snapshot = source.snapshot()?;
    let spec = ChartRasterSpec::new(snapshot.bounding_box, options.scale, options.theme)?;

    let markup = source.serialize(&snapshot)?;
    let vector_blob = registry.stage(SCENE_MIME, markup);

    let mut canvas = RasterCanvas::new(&spec);
    source.rasterize(vector_blob.bytes(), &mut canvas)?;
    drop(vector_blob);

    let png = canvas.encode_png()?;
    log::debug!(
        "Rendered chart at {}×{} px ({} bytes)",
        spec.width_px,
        spec.height_px,
        png.len()
    );
    let png_blob = registry.stage(PNG_MIME, png);

    let file_name = export_file_name("climate_chart", options.mode, options.date, "png");
    sink.deliver(&file_name, &png_blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sink::MemorySink;

    /// A source with a fixed outcome for every step.
    struct FakeChart {
        snapshot: Option<VectorSnapshot>,
        missing_graphic: bool,
        decodes: bool,
    }

    impl FakeChart {
        fn sized(width: f32, height: f32) -> Self {
            let mut scene = ChartScene::default();
            scene.set_size(width, height);
            Self {
                snapshot: Some(VectorSnapshot {
                    bounding_box: BoundingBox { width, height },
                    scene,
                }),
                missing_graphic: false,
                decodes: true,
            }
        }
    }

    impl ChartSnapshotSource for FakeChart {
        fn snapshot(&self) -> Result<VectorSnapshot, ExportError> {
            if self.missing_graphic {
                return Err(ExportError::VectorGraphicNotFound);
            }
            self.snapshot.clone().ok_or(ExportError::ChartElementNotFound)
        }

        fn serialize(&self, _snapshot: &VectorSnapshot) -> Result<Vec<u8>, ExportError> {
            Ok(b"<scene/>".to_vec())
        }

        fn rasterize(&self, _markup: &[u8], canvas: &mut RasterCanvas) -> Result<(), ExportError> {
            if !self.decodes {
                return Err(ExportError::ImageDecode("bad markup".into()));
            }
            // One logical pixel in the top-left corner.
            let side = canvas.scale().round() as u32;
            for dy in 0..side {
                for dx in 0..side {
                    let i = (dy as usize * canvas.width() as usize + dx as usize) * 3;
                    canvas.pixels_mut()[i..i + 3].copy_from_slice(&[255, 0, 0]);
                }
            }
            Ok(())
        }
    }

    fn options(theme: Theme) -> PngOptions {
        PngOptions {
            mode: DataMode::Annual,
            theme,
            scale: 2.0,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    #[test]
    fn renders_at_double_density_on_theme_background() {
        let registry = BlobRegistry::new();
        let mut sink = MemorySink::default();
        let delivered =
            export_png(&FakeChart::sized(300.0, 200.0), &mut sink, &options(Theme::Dark), &registry)
                .unwrap();

        assert_eq!(delivered, Delivery::Saved("climate_chart_annual_2024-05-01.png".into()));
        assert_eq!(registry.live_count(), 0);

        let img = image::load_from_memory(&sink.files[0].1).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (600, 400));
        // Drawing was scaled: the 1×1 logical square covers 2×2 pixels.
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(2, 2).0, Theme::Dark.background());
        assert_eq!(img.get_pixel(599, 399).0, Theme::Dark.background());
    }

    #[test]
    fn missing_chart_is_reported_distinctly() {
        let registry = BlobRegistry::new();
        let mut sink = MemorySink::default();
        let chart = FakeChart {
            snapshot: None,
            missing_graphic: false,
            decodes: true,
        };
        let err = export_png(&chart, &mut sink, &options(Theme::Light), &registry).unwrap_err();
        assert!(matches!(err, ExportError::ChartElementNotFound));
        assert_eq!(err.to_string(), "chart element not found");
        assert_eq!(registry.live_count(), 0);
        assert!(sink.files.is_empty());
    }

    #[test]
    fn missing_graphic_is_reported_distinctly() {
        let registry = BlobRegistry::new();
        let mut chart = FakeChart::sized(10.0, 10.0);
        chart.missing_graphic = true;
        let err = export_png(&chart, &mut MemorySink::default(), &options(Theme::Light), &registry)
            .unwrap_err();
        assert!(matches!(err, ExportError::VectorGraphicNotFound));
    }

    #[test]
    fn decode_failure_revokes_staged_markup() {
        let registry = BlobRegistry::new();
        let mut sink = MemorySink::default();
        let mut chart = FakeChart::sized(10.0, 10.0);
        chart.decodes = false;
        let err = export_png(&chart, &mut sink, &options(Theme::Light), &registry).unwrap_err();
        assert!(matches!(err, ExportError::ImageDecode(_)));
        assert_eq!(registry.live_count(), 0);
        assert!(sink.files.is_empty());
    }

    #[test]
    fn empty_bounding_box_is_rejected() {
        let err = ChartRasterSpec::new(BoundingBox { width: 0.0, height: 50.0 }, 2.0, Theme::Light)
            .unwrap_err();
        assert!(matches!(err, ExportError::EmptyBoundingBox { .. }));
    }

    #[test]
    fn canvas_starts_filled() {
        let spec =
            ChartRasterSpec::new(BoundingBox { width: 3.0, height: 2.0 }, 2.0, Theme::Light).unwrap();
        let canvas = RasterCanvas::new(&spec);
        assert_eq!((canvas.width(), canvas.height()), (6, 4));
        assert_eq!(canvas.pixel(5, 3), Some(Theme::Light.background()));
        assert_eq!(canvas.pixel(6, 0), None);
    }

    #[test]
    fn clear_restores_background() {
        let spec =
            ChartRasterSpec::new(BoundingBox { width: 2.0, height: 2.0 }, 1.0, Theme::Dark).unwrap();
        let mut canvas = RasterCanvas::new(&spec);
        canvas.pixels_mut()[..3].copy_from_slice(&[255, 0, 0]);
        canvas.clear();
        assert_eq!(canvas.pixel(0, 0), Some(Theme::Dark.background()));
    }
}

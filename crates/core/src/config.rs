//! Configuration types for the conversion pipeline.

use crate::error::{ConversionError, Result};
use serde::{Deserialize, Serialize};

/// A4 portrait width in PDF points.
pub const A4_WIDTH: f32 = 595.28;

/// A4 portrait height in PDF points.
pub const A4_HEIGHT: f32 = 841.89;

/// Page rectangle and margin, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Page width.
    /// Default: A4 (595.28).
    pub width: f32,

    /// Page height.
    /// Default: A4 (841.89).
    pub height: f32,

    /// Margin applied on every side.
    /// Default: 40.
    pub margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin: 40.0,
        }
    }
}

impl PageGeometry {
    /// Create a geometry with the given page size and margin.
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    /// Width available to content.
    pub fn printable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Height available to content.
    pub fn printable_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    /// Lowest baseline a text line may start at before a page break.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin
    }

    /// Validate the geometry.
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConversionError::InvalidConfig(
                "page width and height must be positive".to_string(),
            ));
        }
        if self.margin < 0.0 || self.printable_width() <= 0.0 || self.printable_height() <= 0.0 {
            return Err(ConversionError::InvalidConfig(
                "margin must leave a printable area".to_string(),
            ));
        }
        Ok(())
    }
}

/// Font size and leading for one kind of text line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Font size in points.
    pub font_size: f32,
    /// Distance between consecutive baselines in points.
    pub line_height: f32,
}

impl TextMetrics {
    pub const fn new(font_size: f32, line_height: f32) -> Self {
        Self {
            font_size,
            line_height,
        }
    }
}

/// Configuration for the layout/pagination engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Page rectangle and margin.
    pub geometry: PageGeometry,

    /// Metrics for body lines.
    pub body: TextMetrics,

    /// Metrics for page headings.
    pub heading: TextMetrics,

    /// Whether body lines are wrapped to the printable width.
    pub wrap: bool,

    /// Flowing layouts never break pages on height; only source pages start
    /// a new page. Used for targets that re-flow text themselves.
    pub flowing: bool,

    /// Label used to number pages that carry no heading of their own,
    /// e.g. "Slide" gives "Slide 1", "Slide 2", ...
    pub page_label: Option<String>,

    /// Bitmap pages take the size of their bitmap instead of the geometry.
    pub fit_page_to_bitmap: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            body: TextMetrics::new(12.0, 16.0),
            heading: TextMetrics::new(14.0, 24.0),
            wrap: true,
            flowing: false,
            page_label: None,
            fit_page_to_bitmap: false,
        }
    }
}

impl LayoutConfig {
    /// Paged layout on the given geometry with the given body metrics.
    pub fn paged(geometry: PageGeometry, body: TextMetrics) -> Self {
        Self {
            geometry,
            body,
            ..Default::default()
        }
    }

    /// Layout for targets that re-flow text themselves: no wrapping and no
    /// height-driven page breaks.
    pub fn flowing(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            wrap: false,
            flowing: true,
            ..Default::default()
        }
    }

    /// Layout for bitmap outputs: one page per bitmap at its own size.
    pub fn raster() -> Self {
        Self {
            geometry: PageGeometry::new(A4_WIDTH, A4_HEIGHT, 0.0),
            fit_page_to_bitmap: true,
            ..Default::default()
        }
    }

    /// Set the heading metrics.
    pub fn heading(mut self, heading: TextMetrics) -> Self {
        self.heading = heading;
        self
    }

    /// Number pages without a heading using this label.
    pub fn page_label(mut self, label: impl Into<String>) -> Self {
        self.page_label = Some(label.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        for metrics in [&self.body, &self.heading] {
            if metrics.font_size <= 0.0 || metrics.line_height <= 0.0 {
                return Err(ConversionError::InvalidConfig(
                    "font_size and line_height must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Configuration for rasterizing PDF pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Upscaling factor applied to the page's point size.
    /// Default: 2.0.
    pub scale: f32,

    /// Background color composited under transparent pixels.
    /// Default: white (255, 255, 255).
    pub background_color: (u8, u8, u8),
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background_color: (255, 255, 255),
        }
    }
}

impl RenderConfig {
    /// Create a render config with the given scale factor.
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    /// Set the background color.
    pub fn background_color(mut self, color: (u8, u8, u8)) -> Self {
        self.background_color = color;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale > 0.0 && self.scale <= 8.0) {
            return Err(ConversionError::InvalidConfig(
                "scale must be in (0, 8]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the audio re-encoding pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Constant MP3 bitrate in kbit/s.
    /// Default: 128.
    pub bitrate_kbps: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { bitrate_kbps: 128 }
    }
}

impl AudioConfig {
    /// Bitrates accepted by MPEG-1 Layer III encoders.
    pub const SUPPORTED_BITRATES: &'static [u32] =
        &[32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];

    /// Create an audio config with the given bitrate.
    pub fn with_bitrate(bitrate_kbps: u32) -> Self {
        Self { bitrate_kbps }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !Self::SUPPORTED_BITRATES.contains(&self.bitrate_kbps) {
            return Err(ConversionError::InvalidConfig(format!(
                "unsupported MP3 bitrate {} kbps",
                self.bitrate_kbps
            )));
        }
        Ok(())
    }
}

/// Combined configuration for the converter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Page geometry used by every paged output.
    pub page: PageGeometry,

    /// PDF rasterization configuration.
    pub render: RenderConfig,

    /// Audio configuration.
    pub audio: AudioConfig,
}

impl ConverterConfig {
    /// Set the page geometry.
    pub fn page(mut self, page: PageGeometry) -> Self {
        self.page = page;
        self
    }

    /// Set the render configuration.
    pub fn render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Set the audio configuration.
    pub fn audio(mut self, audio: AudioConfig) -> Self {
        self.audio = audio;
        self
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;
        self.render.validate()?;
        self.audio.validate()?;
        Ok(())
    }
}

//! LTDC and layer configuration
//!
//! The panel is described with a [`DisplayConfiguration`] from
//! `embedded-display-controller`. Both configurations use the builder
//! pattern:
//!
//! ```
//! use embedded_display_controller::DisplayConfiguration;
//! use stm32n6xx_hal::ltdc::{Config, LayerConfig, MirrorMode, PixelFormat};
//!
//! let panel = DisplayConfiguration {
//!     active_width: 480,
//!     active_height: 272,
//!     h_back_porch: 43,
//!     h_front_porch: 8,
//!     v_back_porch: 12,
//!     v_front_porch: 8,
//!     h_sync: 4,
//!     v_sync: 4,
//!     h_sync_pol: false,
//!     v_sync_pol: false,
//!     not_data_enable_pol: false,
//!     pixel_clock_pol: false,
//! };
//! let config = Config::new(panel);
//! assert_eq!(config.total_width(), 535);
//!
//! let layer = LayerConfig::new(PixelFormat::Rgb565, 0x3400_0000, 480, 272)
//!     .window(0, 240, 0, 272)
//!     .alpha(0x80)
//!     .mirror(MirrorMode::Vertical);
//! ```

use embedded_display_controller::DisplayConfiguration;

use super::mirror::{MirrorMode, Plane};
use super::yuv::{YuvConverter, YuvLayout};
use crate::time::Hertz;

/// Display timing, in pixel clock cycles and lines
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Timing {
    pub hsync: u16,
    pub hbp: u16,
    pub width: u16,
    pub hfp: u16,
    pub vsync: u16,
    pub vbp: u16,
    pub height: u16,
    pub vfp: u16,
}

impl Timing {
    /// Accumulated horizontal back porch, as programmed in `BPCR`
    pub const fn accumulated_hbp(&self) -> u32 {
        (self.hsync as u32 + self.hbp as u32).saturating_sub(1)
    }

    /// Accumulated vertical back porch, as programmed in `BPCR`
    pub const fn accumulated_vbp(&self) -> u32 {
        (self.vsync as u32 + self.vbp as u32).saturating_sub(1)
    }

    /// Total width of a line, including blanking
    pub const fn total_width(&self) -> u32 {
        self.hsync as u32 + self.hbp as u32 + self.width as u32 + self.hfp as u32
    }

    /// Total number of lines of a frame, including blanking
    pub const fn total_height(&self) -> u32 {
        self.vsync as u32 + self.vbp as u32 + self.height as u32 + self.vfp as u32
    }
}

/// A colour with alpha
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color {
    /// Opacity, 0 is transparent
    pub alpha: u8,
    /// Red
    pub red: u8,
    /// Green
    pub green: u8,
    /// Blue
    pub blue: u8,
}

impl Color {
    /// An opaque colour
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Color {
            alpha: 0xFF,
            red,
            green,
            blue,
        }
    }

    /// A colour with alpha
    pub const fn argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Color {
            alpha,
            red,
            green,
            blue,
        }
    }

    /// Unpack `0xAARRGGBB`
    pub const fn from_argb8888(argb: u32) -> Self {
        Color {
            alpha: (argb >> 24) as u8,
            red: (argb >> 16) as u8,
            green: (argb >> 8) as u8,
            blue: argb as u8,
        }
    }

    /// Pack as `0xAARRGGBB`
    pub const fn to_argb8888(self) -> u32 {
        (self.alpha as u32) << 24 | self.to_rgb888()
    }

    /// Pack as `0x00RRGGBB`, dropping alpha
    pub const fn to_rgb888(self) -> u32 {
        (self.red as u32) << 16 | (self.green as u32) << 8 | self.blue as u32
    }
}

/// A structure for specifying the LTDC configuration
///
/// The timing and the polarities of the synchronisation signals come from
/// the panel's [`DisplayConfiguration`]. The background defaults to black.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub(crate) timing: Timing,
    pub(crate) hsync_active_high: bool,
    pub(crate) vsync_active_high: bool,
    pub(crate) data_enable_active_high: bool,
    pub(crate) pixel_clock_inverted: bool,
    pub(crate) background: Color,
    pub(crate) pixel_clock: Option<u32>,
}

impl Config {
    /// Create a default configuration for a panel
    pub fn new(display: DisplayConfiguration) -> Self {
        Config {
            timing: Timing {
                hsync: display.h_sync,
                hbp: display.h_back_porch,
                width: display.active_width,
                hfp: display.h_front_porch,
                vsync: display.v_sync,
                vbp: display.v_back_porch,
                height: display.active_height,
                vfp: display.v_front_porch,
            },
            hsync_active_high: display.h_sync_pol,
            vsync_active_high: display.v_sync_pol,
            data_enable_active_high: display.not_data_enable_pol,
            pixel_clock_inverted: display.pixel_clock_pol,
            background: Color::rgb(0, 0, 0),
            pixel_clock: None,
        }
    }

    /// Colour shown where no layer is active. Alpha is ignored.
    #[must_use]
    pub const fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Frequency of the pixel clock selected in the RCC, reported by
    /// [`DisplayController::clock`](embedded_display_controller::DisplayController::clock)
    #[must_use]
    pub const fn pixel_clock(mut self, freq: Hertz) -> Self {
        self.pixel_clock = Some(freq.raw());
        self
    }

    /// Width of the active display area
    pub const fn active_width(&self) -> u16 {
        self.timing.width
    }

    /// Height of the active display area
    pub const fn active_height(&self) -> u16 {
        self.timing.height
    }

    /// Pixel clock cycles per line, including blanking
    pub const fn total_width(&self) -> u32 {
        self.timing.total_width()
    }

    /// Lines per frame, including blanking
    pub const fn total_height(&self) -> u32 {
        self.timing.total_height()
    }

    /// Returns `Some(frequency)` of the pixel clock, if it was specified
    pub fn pixel_clock_freq(&self) -> Option<Hertz> {
        self.pixel_clock.map(Hertz::from_raw)
    }
}

/// One component of a [`FlexibleFormat`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Component {
    /// Lowest bit of the component within the pixel
    pub pos: u8,
    /// Width in bits, 0 to 8
    pub len: u8,
}

const fn component(pos: u8, len: u8) -> Component {
    Component { pos, len }
}

/// A pixel format described by the position and width of its components
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlexibleFormat {
    /// 1 to 4
    pub bytes_per_pixel: u8,
    /// Alpha
    pub alpha: Component,
    /// Red, or luminance
    pub red: Component,
    /// Green, or luminance
    pub green: Component,
    /// Blue, or luminance
    pub blue: Component,
}

impl FlexibleFormat {
    /// 4 bits per component, alpha in the top bits
    pub const ARGB4444: Self = FlexibleFormat {
        bytes_per_pixel: 2,
        alpha: component(12, 4),
        red: component(8, 4),
        green: component(4, 4),
        blue: component(0, 4),
    };
    /// 1-bit alpha and 5 bits per colour
    pub const ARGB1555: Self = FlexibleFormat {
        bytes_per_pixel: 2,
        alpha: component(15, 1),
        red: component(10, 5),
        green: component(5, 5),
        blue: component(0, 5),
    };
    /// 8-bit alpha and 8-bit luminance
    pub const AL88: Self = FlexibleFormat {
        bytes_per_pixel: 2,
        alpha: component(8, 8),
        red: component(0, 8),
        green: component(0, 8),
        blue: component(0, 8),
    };
    /// 4-bit alpha and 4-bit luminance
    pub const AL44: Self = FlexibleFormat {
        bytes_per_pixel: 1,
        alpha: component(4, 4),
        red: component(0, 4),
        green: component(0, 4),
        blue: component(0, 4),
    };
    /// 8-bit luminance, or an index into the CLUT
    pub const L8: Self = FlexibleFormat {
        bytes_per_pixel: 1,
        alpha: component(0, 0),
        red: component(0, 8),
        green: component(0, 8),
        blue: component(0, 8),
    };

    pub(crate) const fn is_valid(&self) -> bool {
        let bits = self.bytes_per_pixel as u32 * 8;
        self.bytes_per_pixel >= 1
            && self.bytes_per_pixel <= 4
            && component_fits(self.alpha, bits)
            && component_fits(self.red, bits)
            && component_fits(self.green, bits)
            && component_fits(self.blue, bits)
    }
}

const fn component_fits(c: Component, bits: u32) -> bool {
    c.len <= 8 && c.pos as u32 + c.len as u32 <= bits
}

/// Pixel format of a layer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelFormat {
    /// 32-bit, alpha in the top byte
    Argb8888,
    /// 32-bit, alpha in the top byte, blue and red swapped
    Abgr8888,
    /// 32-bit, alpha in the bottom byte
    Rgba8888,
    /// 32-bit, alpha in the bottom byte, blue and red swapped
    Bgra8888,
    /// 16-bit
    Rgb565,
    /// 16-bit, blue and red swapped
    Bgr565,
    /// 24-bit
    Rgb888,
    /// Any layout of up to four components
    Flexible(FlexibleFormat),
    /// YUV, converted to RGB by the layer. The luma plane is the main frame
    /// buffer.
    Yuv(YuvLayout),
}

impl PixelFormat {
    /// Bytes per pixel of the main frame buffer
    pub const fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Argb8888
            | PixelFormat::Abgr8888
            | PixelFormat::Rgba8888
            | PixelFormat::Bgra8888 => 4,
            PixelFormat::Rgb888 => 3,
            PixelFormat::Rgb565 | PixelFormat::Bgr565 => 2,
            PixelFormat::Flexible(f) => f.bytes_per_pixel as u32,
            PixelFormat::Yuv(layout) => layout.luma_bytes_per_pixel(),
        }
    }

    /// Value of `PFCR.PF`
    pub(crate) const fn bits(&self) -> u32 {
        match self {
            PixelFormat::Argb8888 => 0,
            PixelFormat::Abgr8888 => 1,
            PixelFormat::Rgba8888 => 2,
            PixelFormat::Bgra8888 => 3,
            PixelFormat::Rgb565 => 4,
            PixelFormat::Bgr565 => 5,
            PixelFormat::Rgb888 => 6,
            PixelFormat::Flexible(_) | PixelFormat::Yuv(_) => 7,
        }
    }

    /// Fixed format for a value of `PFCR.PF`, `None` for the flexible
    /// format
    pub(crate) const fn fixed_from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(PixelFormat::Argb8888),
            1 => Some(PixelFormat::Abgr8888),
            2 => Some(PixelFormat::Rgba8888),
            3 => Some(PixelFormat::Bgra8888),
            4 => Some(PixelFormat::Rgb565),
            5 => Some(PixelFormat::Bgr565),
            6 => Some(PixelFormat::Rgb888),
            _ => None,
        }
    }
}

/// Blending factor, applied to the layer (factor 1) and to the layers
/// below it (factor 2, as `1 - factor`)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlendingFactor {
    /// Constant alpha
    ConstantAlpha,
    /// Pixel alpha multiplied by constant alpha
    #[default]
    PixelAlphaTimesConstantAlpha,
}

impl BlendingFactor {
    pub(crate) const fn bf1(self) -> u32 {
        match self {
            BlendingFactor::ConstantAlpha => 4,
            BlendingFactor::PixelAlphaTimesConstantAlpha => 6,
        }
    }

    pub(crate) const fn bf2(self) -> u32 {
        match self {
            BlendingFactor::ConstantAlpha => 5,
            BlendingFactor::PixelAlphaTimesConstantAlpha => 7,
        }
    }

    pub(crate) const fn from_bits(bits: u32) -> Self {
        // 4 and 5 are constant alpha, 6 and 7 pixel alpha
        if bits & 0b010 == 0 {
            BlendingFactor::ConstantAlpha
        } else {
            BlendingFactor::PixelAlphaTimesConstantAlpha
        }
    }
}

/// Window of a layer on the active display area, in pixels. The stop
/// coordinates are exclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Window {
    /// First column
    pub x0: u16,
    /// Column after the last one
    pub x1: u16,
    /// First line
    pub y0: u16,
    /// Line after the last one
    pub y1: u16,
}

impl Window {
    /// Width in pixels, zero if the window is empty
    pub const fn width(&self) -> u16 {
        self.x1.saturating_sub(self.x0)
    }

    /// Height in pixels, zero if the window is empty
    pub const fn height(&self) -> u16 {
        self.y1.saturating_sub(self.y0)
    }
}

/// Configuration of one layer
///
/// The window shows the top-left corner of an image of `image_width` by
/// `image_height` pixels stored at `address`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerConfig {
    /// Position on the active display area
    pub window: Window,
    /// Format of the frame buffer
    pub pixel_format: PixelFormat,
    /// Constant alpha
    pub alpha: u8,
    /// Colour outside of the frame buffer and when the layer is disabled
    pub default_color: Color,
    /// Factor applied to this layer
    pub blending_factor1: BlendingFactor,
    /// Factor applied to the layers below
    pub blending_factor2: BlendingFactor,
    /// Address of the frame buffer, or of the luma plane
    pub address: u32,
    /// Width of the frame buffer in pixels. Sets the pitch.
    pub image_width: u16,
    /// Lines in the frame buffer
    pub image_height: u16,
    /// Order in which the frame buffer is read
    pub mirror: MirrorMode,
    /// Chroma planes of YUV semi-planar (first) and full planar (both)
    /// frame buffers
    pub chroma_address: [u32; 2],
    /// YUV to RGB conversion of YUV formats
    pub yuv_converter: YuvConverter,
}

impl LayerConfig {
    /// A layer covering the display from the top-left corner with an image
    /// of `width` by `height` pixels, fully opaque
    pub const fn new(
        pixel_format: PixelFormat,
        address: u32,
        width: u16,
        height: u16,
    ) -> Self {
        LayerConfig {
            window: Window {
                x0: 0,
                x1: width,
                y0: 0,
                y1: height,
            },
            pixel_format,
            alpha: 0xFF,
            default_color: Color::argb(0, 0, 0, 0),
            blending_factor1: BlendingFactor::PixelAlphaTimesConstantAlpha,
            blending_factor2: BlendingFactor::PixelAlphaTimesConstantAlpha,
            address,
            image_width: width,
            image_height: height,
            mirror: MirrorMode::None,
            chroma_address: [0; 2],
            yuv_converter: YuvConverter::Bt601Full,
        }
    }

    /// Place the window. The stop coordinates are exclusive.
    #[must_use]
    pub const fn window(mut self, x0: u16, x1: u16, y0: u16, y1: u16) -> Self {
        self.window = Window { x0, x1, y0, y1 };
        self
    }

    /// Set the constant alpha
    #[must_use]
    pub const fn alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the colour shown outside of the frame buffer
    #[must_use]
    pub const fn default_color(mut self, color: Color) -> Self {
        self.default_color = color;
        self
    }

    /// Set the blending factors of this layer and of the layers below
    #[must_use]
    pub const fn blending(
        mut self,
        factor1: BlendingFactor,
        factor2: BlendingFactor,
    ) -> Self {
        self.blending_factor1 = factor1;
        self.blending_factor2 = factor2;
        self
    }

    /// Set the mirror mode
    #[must_use]
    pub const fn mirror(mut self, mode: MirrorMode) -> Self {
        self.mirror = mode;
        self
    }

    /// Chroma plane of a semi-planar YUV frame buffer
    #[must_use]
    pub const fn chroma_address(mut self, uv: u32) -> Self {
        self.chroma_address = [uv, 0];
        self
    }

    /// Chroma planes of a full planar YUV frame buffer
    #[must_use]
    pub const fn chroma_addresses(mut self, u: u32, v: u32) -> Self {
        self.chroma_address = [u, v];
        self
    }

    /// Set the YUV to RGB conversion
    #[must_use]
    pub const fn yuv_converter(mut self, converter: YuvConverter) -> Self {
        self.yuv_converter = converter;
        self
    }

    /// Geometry of the main frame buffer
    pub const fn plane(&self) -> Plane {
        Plane {
            width: self.image_width as u32,
            height: self.image_height as u32,
            bytes_per_pixel: self.pixel_format.bytes_per_pixel(),
        }
    }

    /// Geometry of the chroma planes, if there are any
    pub const fn chroma_plane(&self) -> Option<Plane> {
        match self.pixel_format {
            PixelFormat::Yuv(layout) => layout
                .chroma_plane(self.image_width as u32, self.image_height as u32),
            _ => None,
        }
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rendering contracts for mapgrid adapters.
//!
//! Grids are described as declarative [`GridOverlay`]s of line segments,
//! centre dots and label placements in view pixels, leaving stroking to the
//! adapter. Zone highlights are composited in software onto a [`Raster`];
//! external images are resolved through the [`ImageSource`] carried by a
//! [`RenderContext`].

use mapgrid_core::Rgb;
use serde::{Deserialize, Serialize};

mod highlight;
mod overlay;
mod raster;

pub use highlight::{
    paint_highlights, paint_zone, ImageSource, NoImages, RenderContext, TextureCache, TEXTURE_SIZE,
};
pub use overlay::{zoned_overlays, GridOverlay, LabelPlacement, LineSegment, View};
pub use raster::Raster;

/// RGBA color used when compositing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Byte RGBA channels, rounded and clamped.
    #[must_use]
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha].map(to_byte)
    }

    /// Composites `self` over `below` with the given extra opacity.
    ///
    /// Channels are straight (not premultiplied) alpha.
    #[must_use]
    pub fn over(self, below: Self, opacity: f32) -> Self {
        let alpha = self.alpha * opacity.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return below;
        }
        let remaining = below.alpha * (1.0 - alpha);
        let out = alpha + remaining;
        if out <= 0.0 {
            return Self::TRANSPARENT;
        }
        let mix = |top: f32, bottom: f32| (top * alpha + bottom * remaining) / out;
        Self {
            red: mix(self.red, below.red),
            green: mix(self.green, below.green),
            blue: mix(self.blue, below.blue),
            alpha: out,
        }
    }
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl From<Rgb> for Color {
    fn from(value: Rgb) -> Self {
        Self::from_rgb_u8(value.red(), value.green(), value.blue())
    }
}

/// Errors that can occur when decoding raster images.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderingError {
    /// The data is not a binary PPM image.
    #[error("image is not a binary PPM: {0}")]
    InvalidImage(&'static str),
    /// Only 8-bit channels are supported.
    #[error("unsupported PPM channel maximum {0}; expected 255")]
    UnsupportedDepth(u32),
}

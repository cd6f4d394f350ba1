use crate::{Color, RenderingError};

/// In-memory RGBA image addressed by whole pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Raster {
    /// Creates a raster filled with `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` when the raster has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Pixel at `(x, y)`, if inside the raster.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|index| self.pixels[index])
    }

    /// Pixel at `(x, y)` with both coordinates wrapped, as when tiling.
    ///
    /// Returns transparent for an empty raster.
    #[must_use]
    pub fn tiled_pixel(&self, x: i64, y: i64) -> Color {
        if self.is_empty() {
            return Color::TRANSPARENT;
        }
        let x = x.rem_euclid(i64::from(self.width)) as u32;
        let y = y.rem_euclid(i64::from(self.height)) as u32;
        self.pixel(x, y).unwrap_or(Color::TRANSPARENT)
    }

    /// Replaces the pixel at `(x, y)`; pixels outside the raster are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = color;
        }
    }

    /// Source-over composites `color` onto the pixel at `(x, y)`.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Color, opacity: f32) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = color.over(self.pixels[index], opacity);
        }
    }

    /// Draws a one pixel wide line between two pixel centres.
    pub fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Color) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let (step_x, step_y) = ((to.0 - x).signum(), (to.1 - y).signum());
        let mut error = dx + dy;
        loop {
            if let (Ok(px), Ok(py)) = (u32::try_from(x), u32::try_from(y)) {
                self.set_pixel(px, py, color);
            }
            if (x, y) == to {
                break;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += step_x;
            }
            if doubled <= dx {
                error += dx;
                y += step_y;
            }
        }
    }

    /// Encodes the raster as a binary PPM, dropping alpha.
    #[must_use]
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut bytes = format!("P6\n{} {}\n255\n", self.width, self.height).into_bytes();
        bytes.reserve(self.pixels.len() * 3);
        for pixel in &self.pixels {
            let [red, green, blue, _] = pixel.to_rgba_u8();
            bytes.extend_from_slice(&[red, green, blue]);
        }
        bytes
    }

    /// Decodes a binary PPM into an opaque raster.
    pub fn from_ppm(bytes: &[u8]) -> Result<Self, RenderingError> {
        let mut cursor = 0;
        if next_token(bytes, &mut cursor) != Some(b"P6".as_slice()) {
            return Err(RenderingError::InvalidImage("missing P6 magic number"));
        }
        let mut header = [0_u32; 3];
        for value in &mut header {
            *value = next_token(bytes, &mut cursor)
                .and_then(|token| std::str::from_utf8(token).ok())
                .and_then(|token| token.parse().ok())
                .ok_or(RenderingError::InvalidImage("malformed header"))?;
        }
        let [width, height, depth] = header;
        if depth != 255 {
            return Err(RenderingError::UnsupportedDepth(depth));
        }
        // A single whitespace byte separates the header from the samples.
        let data = bytes
            .get(cursor + 1..)
            .ok_or(RenderingError::InvalidImage("missing pixel data"))?;
        let expected = width as usize * height as usize * 3;
        if data.len() < expected {
            return Err(RenderingError::InvalidImage("truncated pixel data"));
        }
        let pixels = data[..expected]
            .chunks_exact(3)
            .map(|rgb| Color::from_rgb_u8(rgb[0], rgb[1], rgb[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

fn next_token<'a>(bytes: &'a [u8], cursor: &mut usize) -> Option<&'a [u8]> {
    loop {
        match bytes.get(*cursor)? {
            b'#' => {
                while bytes.get(*cursor).is_some_and(|byte| *byte != b'\n') {
                    *cursor += 1;
                }
            }
            byte if byte.is_ascii_whitespace() => *cursor += 1,
            _ => break,
        }
    }
    let start = *cursor;
    while bytes
        .get(*cursor)
        .is_some_and(|byte| !byte.is_ascii_whitespace())
    {
        *cursor += 1;
    }
    Some(&bytes[start..*cursor])
}

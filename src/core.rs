use crate::error::{InknoteError, InknoteResult};

pub use kurbo::{BezPath, Point};

/// Opaque page identity, monotonically allocated per notebook.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PageId(pub u64);

/// Fixed canvas dimensions in device pixels, shared by every page of a notebook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Validate that the canvas is non-empty and inside the rasterizer's u16 limits.
    pub fn validate(&self) -> InknoteResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(InknoteError::validation("canvas width/height must be > 0"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(InknoteError::validation(
                "canvas width/height must fit in u16",
            ));
        }
        Ok(())
    }

    /// Number of bytes in one RGBA8 surface of these dimensions.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl Default for Canvas {
    /// A4-like portrait page, 800x1120 device pixels.
    fn default() -> Self {
        Self {
            width: 800,
            height: 1120,
        }
    }
}

/// Active drawing tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Brush,
    Eraser,
    Line,
    Select,
}

/// Axis-aligned pixel rectangle.
///
/// Width and height may be negative while a marquee drag is in progress;
/// [`PixelRect::normalized`] flips them into positive extents before the
/// rectangle is used for capture or hit-testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Flip negative extents so `w >= 0` and `h >= 0`, adjusting the origin.
    pub fn normalized(self) -> Self {
        let (x, w) = if self.w < 0 {
            (self.x + self.w, -self.w)
        } else {
            (self.x, self.w)
        };
        let (y, h) = if self.h < 0 {
            (self.y + self.h, -self.h)
        } else {
            (self.y, self.h)
        };
        Self { x, y, w, h }
    }

    /// Return `true` when the point lies inside `[x, x+w) x [y, y+h)`.
    ///
    /// Expects a normalized rectangle.
    pub fn contains(self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    /// Intersect a normalized rectangle with the canvas, returning `None`
    /// when nothing overlaps.
    pub fn intersect_canvas(self, canvas: Canvas) -> Option<Self> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.w).min(canvas.width as i32);
        let y1 = (self.y + self.h).min(canvas.height as i32);
        if x1 > x0 && y1 > y0 {
            Some(Self {
                x: x0,
                y: y0,
                w: x1 - x0,
                h: y1 - y0,
            })
        } else {
            None
        }
    }

    /// Shift the rectangle the minimal amount needed to sit fully inside the
    /// canvas. Expects a normalized rectangle no larger than the canvas.
    pub fn clamp_into(self, canvas: Canvas) -> Self {
        let max_x = (canvas.width as i32 - self.w).max(0);
        let max_y = (canvas.height as i32 - self.h).max(0);
        Self {
            x: self.x.clamp(0, max_x),
            y: self.y.clamp(0, max_y),
            ..self
        }
    }
}

/// Straight-alpha RGBA8 color.
///
/// Serializes as a `#rrggbb` hex string (`#rrggbbaa` when not fully opaque),
/// matching the notebook document format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> InknoteResult<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| InknoteError::validation(format!("color '{s}' must start with '#'")))?;
        // Byte-indexed slicing below requires single-byte characters.
        if !hex.is_ascii() {
            return Err(InknoteError::validation(format!(
                "color '{s}' is not valid hex"
            )));
        }
        let parse = |from: usize| -> InknoteResult<u8> {
            u8::from_str_radix(&hex[from..from + 2], 16)
                .map_err(|_| InknoteError::validation(format!("color '{s}' is not valid hex")))
        };
        match hex.len() {
            6 => Ok(Self {
                r: parse(0)?,
                g: parse(2)?,
                b: parse(4)?,
                a: 255,
            }),
            8 => Ok(Self {
                r: parse(0)?,
                g: parse(2)?,
                b: parse(4)?,
                a: parse(6)?,
            }),
            _ => Err(InknoteError::validation(format!(
                "color '{s}' must be #rrggbb or #rrggbbaa"
            ))),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Convert to premultiplied RGBA8 with round-half-up scaling.
    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

impl serde::Serialize for Rgba8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

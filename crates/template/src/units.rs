//! Coordinate unit conversion
//!
//! Documents are laid out in millimetres. The interactive surface and the
//! raster backend work in device pixels at a DPI, the paginated backend in
//! points (1/72 inch). Every backend converts through this module so that
//! they agree on what one millimetre is.

use serde::{Deserialize, Serialize};

pub const MM_PER_INCH: f64 = 25.4;
pub const POINTS_PER_INCH: f64 = pdf_core::POINTS_PER_INCH;
/// Device DPI of the interactive surface
pub const DEFAULT_DPI: f64 = 96.0;

/// Millimetres to pixels at `dpi`
pub fn mm_to_pixel(mm: f64, dpi: f64) -> f64 {
    if dpi <= 0.0 {
        return 0.0;
    }
    mm * dpi / MM_PER_INCH
}

/// Pixels at `dpi` to millimetres
pub fn pixel_to_mm(px: f64, dpi: f64) -> f64 {
    if dpi <= 0.0 {
        return 0.0;
    }
    px * MM_PER_INCH / dpi
}

/// Millimetres to pixels at 96 DPI
pub fn mm_to_pixel_96(mm: f64) -> f64 {
    mm * DEFAULT_DPI / MM_PER_INCH
}

/// Pixels at 96 DPI to millimetres
pub fn pixel_to_mm_96(px: f64) -> f64 {
    px * MM_PER_INCH / DEFAULT_DPI
}

pub fn mm_to_point(mm: f64) -> f64 {
    mm * POINTS_PER_INCH / MM_PER_INCH
}

pub fn point_to_mm(pt: f64) -> f64 {
    pt * MM_PER_INCH / POINTS_PER_INCH
}

pub fn point_to_pixel(pt: f64, dpi: f64) -> f64 {
    if dpi <= 0.0 {
        return 0.0;
    }
    pt * dpi / POINTS_PER_INCH
}

pub fn pixel_to_point(px: f64, dpi: f64) -> f64 {
    if dpi <= 0.0 {
        return 0.0;
    }
    px * POINTS_PER_INCH / dpi
}

/// Screen units to display units. A zero scale leaves the value untouched.
pub fn apply_scale(screen: f64, scale: f64) -> f64 {
    if scale == 0.0 {
        return screen;
    }
    screen * scale
}

/// Display units back to screen units. A zero scale leaves the value untouched.
pub fn remove_scale(display: f64, scale: f64) -> f64 {
    if scale == 0.0 {
        return display;
    }
    display / scale
}

/// Axis-aligned rectangle in whatever unit its producer works in
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Apply `f` to every component
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.x), f(self.y), f(self.width), f(self.height))
    }

    /// Move by an offset
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Millimetre to device-unit converter for one backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    pub dpi: f64,
    pub scale: f64,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            scale: 1.0,
        }
    }
}

impl UnitConverter {
    pub fn new(dpi: f64, scale: f64) -> Self {
        Self { dpi, scale }
    }

    /// Converter producing PDF points (72 DPI, no zoom)
    pub fn points() -> Self {
        Self::new(POINTS_PER_INCH, 1.0)
    }

    /// Millimetres to scaled device units
    pub fn to_device(&self, mm: f64) -> f64 {
        let px = if self.dpi == DEFAULT_DPI {
            mm_to_pixel_96(mm)
        } else {
            mm_to_pixel(mm, self.dpi)
        };
        apply_scale(px, self.scale)
    }

    /// Scaled device units to millimetres
    pub fn to_mm(&self, device: f64) -> f64 {
        let px = remove_scale(device, self.scale);
        if self.dpi == DEFAULT_DPI {
            pixel_to_mm_96(px)
        } else {
            pixel_to_mm(px, self.dpi)
        }
    }

    /// Points (font sizes, table layout) to scaled device units
    pub fn point_to_device(&self, pt: f64) -> f64 {
        apply_scale(point_to_pixel(pt, self.dpi), self.scale)
    }

    pub fn rect_to_device(&self, rect: &Rect) -> Rect {
        rect.map(|v| self.to_device(v))
    }
}

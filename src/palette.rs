use std::fmt;

/// An rgba() color as understood by the chart frontend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Opaque variant used for borders.
    pub fn border(self) -> Self {
        self.with_alpha(1.0)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

/// Series colors, assigned in order.
pub const SERIES_COLORS: [Rgba; 12] = [
    Rgba::new(102, 126, 234, 0.8),
    Rgba::new(255, 99, 132, 0.8),
    Rgba::new(54, 162, 235, 0.8),
    Rgba::new(255, 205, 86, 0.8),
    Rgba::new(75, 192, 192, 0.8),
    Rgba::new(153, 102, 255, 0.8),
    Rgba::new(255, 159, 64, 0.8),
    Rgba::new(199, 199, 199, 0.8),
    Rgba::new(83, 102, 255, 0.8),
    Rgba::new(255, 99, 255, 0.8),
    Rgba::new(99, 255, 132, 0.8),
    Rgba::new(255, 192, 203, 0.8),
];

pub const PRIMARY: Rgba = SERIES_COLORS[0];
pub const SLICE_BORDER: Rgba = Rgba::new(255, 255, 255, 0.8);

/// Color for the i-th series, wrapping around the palette.
pub fn series_color(i: usize) -> Rgba {
    SERIES_COLORS[i % SERIES_COLORS.len()]
}

/// One distinct color per slice, for up to a palette's worth of slices.
pub fn slice_colors(n: usize) -> Vec<String> {
    SERIES_COLORS.iter().take(n).map(|c| c.to_string()).collect()
}

/// Fixed-threshold diverging scale for correlation values.
pub fn correlation_color(value: f64) -> Rgba {
    if value > 0.7 {
        Rgba::new(255, 0, 0, 0.8)
    } else if value > 0.3 {
        Rgba::new(255, 165, 0, 0.8)
    } else if value > -0.3 {
        Rgba::new(255, 255, 255, 0.8)
    } else if value > -0.7 {
        Rgba::new(0, 0, 255, 0.6)
    } else {
        Rgba::new(0, 0, 139, 0.8)
    }
}

//! Colors, the named palette, and scalar colormaps.

/// RGBA color with components in the `0.0..=1.0` range.
///
/// Components are only reachable through [`Color::new`] and the constants, so
/// they always stay in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

const fn rgb(r: f64, g: f64, b: f64) -> Color {
    Color { r, g, b, a: 1.0 }
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = rgb(1.0, 1.0, 1.0);
    /// Red.
    pub const RED: Self = rgb(1.0, 0.0, 0.0);
    /// Green.
    pub const GREEN: Self = rgb(0.0, 1.0, 0.0);
    /// Blue.
    pub const BLUE: Self = rgb(0.0, 0.0, 1.0);
    /// Yellow.
    pub const YELLOW: Self = rgb(1.0, 1.0, 0.0);
    /// Purple.
    pub const PURPLE: Self = rgb(1.0, 0.0, 1.0);
    /// Grey.
    pub const GREY: Self = rgb(0.5, 0.5, 0.5);
    /// Brown.
    pub const BROWN: Self = rgb(0.647059, 0.164706, 0.164706);
    /// Dark blue.
    pub const DARKBLUE: Self = rgb(0.0, 0.0, 0.545098);
    /// Cyan.
    pub const CYAN: Self = rgb(0.0, 1.0, 1.0);
    /// Indigo.
    pub const INDIGO: Self = rgb(0.294118, 0.0, 0.509804);
    /// Orange.
    pub const ORANGE: Self = rgb(1.0, 0.647059, 0.0);
    /// Cadet blue.
    pub const CADETBLUE: Self = rgb(0.372549, 0.619608, 0.627451);
    /// Fully transparent white.
    pub const TRANSPARENT: Self = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 0.0,
    };

    const PALETTE: [Self; 13] = [
        Self::BLACK,
        Self::RED,
        Self::GREEN,
        Self::BLUE,
        Self::YELLOW,
        Self::PURPLE,
        Self::GREY,
        Self::BROWN,
        Self::DARKBLUE,
        Self::CYAN,
        Self::INDIGO,
        Self::ORANGE,
        Self::CADETBLUE,
    ];

    /// Create a color, clamping every component into `0.0..=1.0`.
    ///
    /// NaN components become 0.
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: unit(r),
            g: unit(g),
            b: unit(b),
            a: unit(a),
        }
    }

    /// Create an opaque color.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn black() -> Self {
        Self::BLACK
    }

    pub fn white() -> Self {
        Self::WHITE
    }

    pub fn red() -> Self {
        Self::RED
    }

    pub fn green() -> Self {
        Self::GREEN
    }

    pub fn blue() -> Self {
        Self::BLUE
    }

    pub fn yellow() -> Self {
        Self::YELLOW
    }

    pub fn purple() -> Self {
        Self::PURPLE
    }

    pub fn grey() -> Self {
        Self::GREY
    }

    pub fn brown() -> Self {
        Self::BROWN
    }

    pub fn darkblue() -> Self {
        Self::DARKBLUE
    }

    pub fn cyan() -> Self {
        Self::CYAN
    }

    pub fn indigo() -> Self {
        Self::INDIGO
    }

    pub fn orange() -> Self {
        Self::ORANGE
    }

    pub fn cadetblue() -> Self {
        Self::CADETBLUE
    }

    /// All named colors, in a stable order.
    pub fn palette() -> &'static [Self] {
        &Self::PALETTE
    }

    /// Pick a palette color by id, wrapping around the palette length.
    ///
    /// Handy when a caller needs N distinguishable colors but does not care
    /// which ones.
    pub fn by_id(id: usize) -> Self {
        Self::PALETTE[id % Self::PALETTE.len()]
    }

    /// Red channel.
    pub fn r(&self) -> f64 {
        self.r
    }

    /// Green channel.
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Blue channel.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Alpha channel, 0 is fully transparent.
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Linear interpolation between two colors.
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let t = unit(t);
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }

    /// Convert to 8-bit RGBA.
    pub fn to_rgba8(self) -> [u8; 4] {
        [
            channel_u8(self.r),
            channel_u8(self.g),
            channel_u8(self.b),
            channel_u8(self.a),
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn channel_u8(value: f64) -> u8 {
    (unit(value) * 255.0).round() as u8
}

/// Gradient colormap mapping a fraction in `0.0..=1.0` to a color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    stops: Vec<(f64, Color)>,
}

impl ColorMap {
    /// Build a colormap from evenly spaced colors.
    ///
    /// An empty list yields a map that always returns black.
    pub fn from_colors(colors: &[Color]) -> Self {
        let n = colors.len();
        let stops = colors
            .iter()
            .enumerate()
            .map(|(i, color)| (i as f64 / (n.saturating_sub(1)).max(1) as f64, *color))
            .collect();
        Self { stops }
    }

    /// White to black, used for density grids.
    pub fn greyscale() -> Self {
        Self::from_colors(&[Color::WHITE, Color::BLACK])
    }

    /// Dark blue through cyan and yellow to red, used for height maps.
    pub fn heat() -> Self {
        Self::from_colors(&[
            Color::DARKBLUE,
            Color::BLUE,
            Color::CYAN,
            Color::GREEN,
            Color::YELLOW,
            Color::RED,
        ])
    }

    /// Map a fraction to a color. Out-of-range fractions are clamped.
    pub fn map(&self, fraction: f64) -> Color {
        let fraction = unit(fraction);
        let Some(first) = self.stops.first() else {
            return Color::BLACK;
        };
        if fraction <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            if fraction <= end.0 {
                let span = end.0 - start.0;
                let t = if span > 0.0 {
                    (fraction - start.0) / span
                } else {
                    0.0
                };
                return Color::lerp(start.1, end.1, t);
            }
        }
        self.stops.last().map_or(Color::BLACK, |stop| stop.1)
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::heat()
    }
}

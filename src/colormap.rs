use clap::ValueEnum;

/// Color scales available for the heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorScale {
    /// Black, red, yellow, white.
    #[default]
    Hot,
    Inferno,
    Magma,
    Turbo,
    Viridis,
}

// Breakpoints of the piecewise linear "hot" ramp.
const HOT_RED_END: f64 = 0.365079;
const HOT_GREEN_END: f64 = 0.746032;
const HOT_RED_START: f64 = 0.0416;

fn ramp(t: f64, start: f64, end: f64) -> f64 {
    ((t - start) / (end - start)).clamp(0.0, 1.0)
}

fn hot(t: f64) -> [u8; 3] {
    let r = HOT_RED_START + (1.0 - HOT_RED_START) * ramp(t, 0.0, HOT_RED_END);
    let g = ramp(t, HOT_RED_END, HOT_GREEN_END);
    let b = ramp(t, HOT_GREEN_END, 1.0);
    [r, g, b].map(|c| (c * 255.0).round() as u8)
}

impl ColorScale {
    /// Color for a value already normalized to [0, 1]; out of range
    /// values are clamped and NaN maps to the low end.
    pub fn eval(&self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let gradient = match self {
            ColorScale::Hot => return hot(t),
            ColorScale::Inferno => colorous::INFERNO,
            ColorScale::Magma => colorous::MAGMA,
            ColorScale::Turbo => colorous::TURBO,
            ColorScale::Viridis => colorous::VIRIDIS,
        };
        gradient.eval_continuous(t).as_array()
    }
}

/// Maps grid values onto a color scale over a fixed value range.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    pub min: f64,
    pub max: f64,
}

impl Normalizer {
    pub fn new(min: f64, max: f64) -> Self {
        debug_assert!(min <= max);
        Normalizer { min, max }
    }

    /// Position of `v` in [0, 1]. A degenerate range maps to the middle.
    pub fn unit(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.5;
        }
        ((v - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn color(&self, scale: ColorScale, v: f64) -> [u8; 3] {
        scale.eval(self.unit(v))
    }
}

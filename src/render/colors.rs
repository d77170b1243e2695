/// Which market convention colors gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Taiwanese convention: gains red, losses green.
    RedUp,
    /// Western convention: gains green, losses red.
    GreenUp,
}

/// Settings for the signed-value fill mapping.
#[derive(Debug, Clone, Copy)]
pub struct ColorSettings {
    pub mode: ColorMode,
    /// |value| at which the fill reaches full emphasis (percent).
    pub emphasis_cap: f64,
    /// Fill alpha at value 0.
    pub min_alpha: f32,
    /// Fill alpha at or beyond the emphasis cap.
    pub max_alpha: f32,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            mode: ColorMode::RedUp,
            emphasis_cap: 80.0,
            min_alpha: 0.25,
            max_alpha: 0.95,
        }
    }
}

/// Straight-alpha color for easy manipulation and blending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl AppColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Create a darker version (for header strips and frames).
    pub fn darken(self, amount: f32) -> Self {
        Self {
            r: (self.r - amount).max(0.0),
            g: (self.g - amount).max(0.0),
            b: (self.b - amount).max(0.0),
            a: self.a,
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0) as u8,
            (self.g.clamp(0.0, 1.0) * 255.0) as u8,
            (self.b.clamp(0.0, 1.0) * 255.0) as u8,
            (self.a.clamp(0.0, 1.0) * 255.0) as u8,
        ]
    }
}

/// Canvas background, near-black.
pub const CANVAS: AppColor = AppColor::new(0.078, 0.086, 0.11);

/// Group frame tone; header strips derive from it via `darken`.
pub const GROUP_FRAME: AppColor = AppColor::new(0.16, 0.17, 0.21);

/// Label text, near-white on the dark fills.
pub const LABEL: AppColor = AppColor::new(0.898, 0.906, 0.922);

/// Fill for missing or non-finite values: present in the layout, visually
/// neutral, a shade above the canvas so the cell reads as occupied.
pub const NEUTRAL: AppColor = AppColor::new(0.12, 0.125, 0.15);

/// Map a signed growth value to its fill.
///
/// Hue comes from the polarity convention, alpha rises with |value| and
/// saturates at the emphasis cap. Missing or non-finite values get the
/// neutral near-black fill rather than being excluded.
pub fn value_color(value: Option<f64>, settings: &ColorSettings) -> AppColor {
    let v = match value {
        Some(v) if v.is_finite() => v,
        _ => return NEUTRAL,
    };

    let gain = v >= 0.0;
    let red = match settings.mode {
        ColorMode::RedUp => gain,
        ColorMode::GreenUp => !gain,
    };
    let base = if red {
        hsv_to_rgb(357.0 / 360.0, 0.78, 0.86)
    } else {
        hsv_to_rgb(140.0 / 360.0, 0.72, 0.78)
    };

    let cap = settings.emphasis_cap.max(f64::EPSILON);
    let t = (v.abs().min(cap) / cap) as f32;
    base.with_alpha(settings.min_alpha + (settings.max_alpha - settings.min_alpha) * t)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> AppColor {
    let h6 = (h * 6.0).rem_euclid(6.0);
    let i = h6.floor() as i32;
    let f = h6 - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match i {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    AppColor { r, g, b, a: 1.0 }
}

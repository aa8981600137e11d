use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{WaveError, WaveResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    pub fn validate(self) -> WaveResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(WaveError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` and a few keywords.
    pub fn parse(text: &str) -> WaveResult<Self> {
        let text = text.trim();
        let invalid = || WaveError::InvalidData(format!("unrecognized color `{text}`"));

        match text.to_ascii_lowercase().as_str() {
            "none" | "transparent" => return Ok(Self::TRANSPARENT),
            "black" => return Ok(Self::BLACK),
            "white" => return Ok(Self::WHITE),
            "red" => return Ok(Self::rgb(1.0, 0.0, 0.0)),
            "green" => return Ok(Self::rgb(0.0, 128.0 / 255.0, 0.0)),
            "blue" => return Ok(Self::rgb(0.0, 0.0, 1.0)),
            "gray" | "grey" => return Ok(Self::rgb(128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0)),
            _ => {}
        }

        if let Some(hex) = text.strip_prefix('#') {
            let expanded: String = match hex.len() {
                3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
                6 | 8 => hex.to_owned(),
                _ => return Err(invalid()),
            };
            let channel = |index: usize| {
                expanded
                    .get(index * 2..index * 2 + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .map(|value| f64::from(value) / 255.0)
                    .ok_or_else(invalid)
            };
            let alpha = if expanded.len() == 8 { channel(3)? } else { 1.0 };
            return Ok(Self::rgba(channel(0)?, channel(1)?, channel(2)?, alpha));
        }

        let inner = text
            .strip_prefix("rgba(")
            .or_else(|| text.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let parts = inner
            .split(',')
            .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
            .collect::<WaveResult<Vec<f64>>>()?;
        let color = match parts.as_slice() {
            [r, g, b] => Self::rgb(r / 255.0, g / 255.0, b / 255.0),
            [r, g, b, a] => Self::rgba(r / 255.0, g / 255.0, b / 255.0, *a),
            _ => return Err(invalid()),
        };
        color.validate()?;
        Ok(color)
    }

    /// `#rrggbb` when opaque, `rgba(..)` otherwise.
    #[must_use]
    pub fn to_css(self) -> String {
        let byte = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.alpha >= 1.0 {
            format!(
                "#{:02x}{:02x}{:02x}",
                byte(self.red),
                byte(self.green),
                byte(self.blue)
            )
        } else {
            format!(
                "rgba({},{},{},{})",
                byte(self.red),
                byte(self.green),
                byte(self.blue),
                (self.alpha.clamp(0.0, 1.0) * 1000.0).round() / 1000.0
            )
        }
    }

    #[must_use]
    pub fn to_lch(self) -> Lch {
        let linear = |c: f64| {
            if c <= 0.040_45 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        let (r, g, b) = (linear(self.red), linear(self.green), linear(self.blue));
        let x = (0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b) / WHITE_X;
        let y = (0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b) / WHITE_Y;
        let z = (0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b) / WHITE_Z;

        let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
        let lightness = 116.0 * fy - 16.0;
        let a = 500.0 * (fx - fy);
        let b = 200.0 * (fy - fz);
        let chroma = (a * a + b * b).sqrt();
        let hue = if chroma < 1e-4 {
            f64::NAN
        } else {
            b.atan2(a).to_degrees().rem_euclid(360.0)
        };

        Lch {
            lightness,
            chroma,
            hue,
            alpha: self.alpha,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl TryFrom<String> for Color {
    type Error = WaveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_css()
    }
}

const WHITE_X: f64 = 0.950_470;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.088_830;
const LAB_EPSILON: f64 = 216.0 / 24389.0;
const LAB_KAPPA: f64 = 24389.0 / 27.0;

fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        (LAB_KAPPA * t + 16.0) / 116.0
    }
}

fn lab_f_inverse(t: f64) -> f64 {
    let cube = t * t * t;
    if cube > LAB_EPSILON {
        cube
    } else {
        (116.0 * t - 16.0) / LAB_KAPPA
    }
}

/// CIE LCh(ab) color. `hue` is NaN for achromatic colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lch {
    pub lightness: f64,
    pub chroma: f64,
    pub hue: f64,
    pub alpha: f64,
}

impl Lch {
    #[must_use]
    pub fn to_color(self) -> Color {
        let hue = if self.hue.is_nan() { 0.0 } else { self.hue };
        let a = self.chroma * hue.to_radians().cos();
        let b = self.chroma * hue.to_radians().sin();
        let fy = (self.lightness + 16.0) / 116.0;
        let fx = fy + a / 500.0;
        let fz = fy - b / 200.0;
        let x = lab_f_inverse(fx) * WHITE_X;
        let y = lab_f_inverse(fy) * WHITE_Y;
        let z = lab_f_inverse(fz) * WHITE_Z;

        let r = 3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z;
        let g = -0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z;
        let bl = 0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z;
        let gamma = |c: f64| {
            let c = if c <= 0.003_130_8 {
                12.92 * c
            } else {
                1.055 * c.powf(1.0 / 2.4) - 0.055
            };
            c.clamp(0.0, 1.0)
        };

        Color::rgba(gamma(r), gamma(g), gamma(bl), self.alpha)
    }

    /// Interpolates along the shorter hue arc.
    #[must_use]
    pub fn mix(self, other: Self, t: f64) -> Self {
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        let hue = match (self.hue.is_nan(), other.hue.is_nan()) {
            (true, true) => f64::NAN,
            (true, false) => other.hue,
            (false, true) => self.hue,
            (false, false) => {
                let mut delta = other.hue - self.hue;
                if delta > 180.0 {
                    delta -= 360.0;
                } else if delta < -180.0 {
                    delta += 360.0;
                }
                (self.hue + delta * t).rem_euclid(360.0)
            }
        };
        Self {
            lightness: lerp(self.lightness, other.lightness),
            chroma: lerp(self.chroma, other.chroma),
            hue,
            alpha: lerp(self.alpha, other.alpha),
        }
    }
}

/// `count` colors spread evenly over the LCH path through `stops`.
#[must_use]
pub fn lch_palette(stops: &[Color], count: usize) -> Vec<Color> {
    match (stops, count) {
        (_, 0) | ([], _) => Vec::new(),
        ([only], _) => vec![*only; count],
        (_, 1) => vec![stops[0]],
        _ => {
            let segments = (stops.len() - 1) as f64;
            (0..count)
                .map(|index| {
                    let position = index as f64 / (count - 1) as f64 * segments;
                    let segment = (position.floor() as usize).min(stops.len() - 2);
                    let t = position - segment as f64;
                    stops[segment]
                        .to_lch()
                        .mix(stops[segment + 1].to_lch(), t)
                        .to_color()
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_css_forms() {
        assert_eq!(Color::parse("#fff").expect("short hex"), Color::WHITE);
        assert_eq!(
            Color::parse("#ff000080").expect("hex alpha").to_css(),
            "rgba(255,0,0,0.502)"
        );
        assert_eq!(
            Color::parse("rgb(0, 128, 255)").expect("rgb").to_css(),
            "#0080ff"
        );
        assert!(Color::parse("rgb(0, 0)").is_err());
        assert!(Color::parse("chartreuse-ish").is_err());
    }

    #[test]
    fn lch_round_trip_is_stable() {
        let color = Color::parse("#3a7bd5").expect("color");
        let back = color.to_lch().to_color();
        assert_relative_eq!(back.red, color.red, epsilon = 1e-3);
        assert_relative_eq!(back.green, color.green, epsilon = 1e-3);
        assert_relative_eq!(back.blue, color.blue, epsilon = 1e-3);
    }

    #[test]
    fn palette_keeps_endpoints() {
        let stops = [Color::parse("#2a5caa").expect("a"), Color::parse("#f5a623").expect("b")];
        let palette = lch_palette(&stops, 5);
        assert_eq!(palette.len(), 5);
        assert_eq!(palette[0].to_css(), "#2a5caa");
        assert_eq!(palette[4].to_css(), "#f5a623");
        assert!(lch_palette(&stops, 0).is_empty());
    }
}

//! Easing curves, written the way the site names them (`"power2.out"`,
//! `"back.out(1.7)"`, `"elastic.out(1, 0.3)"`, ...).

use std::{f32::consts::PI, str::FromStr};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// `powerN.in`, i.e. `t^(N+1)`.
    PowerIn(u8),
    PowerOut(u8),
    PowerInOut(u8),
    SineIn,
    SineOut,
    SineInOut,
    /// Overshoots by `s` before settling.
    BackOut(f32),
    ElasticOut { amplitude: f32, period: f32 },
}

impl Default for Easing {
    /// The tweening default, `power1.out`.
    fn default() -> Self {
        Easing::PowerOut(1)
    }
}

impl Easing {
    /// Applies the curve to a normalized time value t in [0, 1].
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::PowerIn(n) => t.powi(n as i32 + 1),
            Easing::PowerOut(n) => 1.0 - (1.0 - t).powi(n as i32 + 1),
            Easing::PowerInOut(n) => {
                let exp = n as i32 + 1;
                if t < 0.5 {
                    (2.0 * t).powi(exp) / 2.0
                } else {
                    1.0 - (2.0 * (1.0 - t)).powi(exp) / 2.0
                }
            }
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::BackOut(s) => {
                let t1 = t - 1.0;
                t1 * t1 * ((s + 1.0) * t1 + s) + 1.0
            }
            Easing::ElasticOut { amplitude, period } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                if period <= 0.0 {
                    return 1.0;
                }
                let amplitude = amplitude.max(1.0);
                let shift = period / (2.0 * PI) * (1.0 / amplitude).asin();
                amplitude * 2f32.powf(-10.0 * t) * ((t - shift) * 2.0 * PI / period).sin() + 1.0
            }
        }
    }
}

/// Splits `"back.out(1.7)"` into `("back.out", [1.7])`.
fn split_args(s: &str) -> Option<(&str, Vec<f32>)> {
    match s.find('(') {
        None => Some((s, Vec::new())),
        Some(open) => {
            let inner = s[open + 1..].strip_suffix(')')?;
            let args = inner
                .split(',')
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .map(|a| a.parse::<f32>().ok())
                .collect::<Option<Vec<_>>>()?;
            Some((&s[..open], args))
        }
    }
}

impl FromStr for Easing {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidEasing(s.to_string());
        let (name, args) = split_args(s.trim()).ok_or_else(invalid)?;
        let (family, direction) = name.split_once('.').unwrap_or((name, "out"));

        let easing = match (family, direction) {
            ("none" | "linear", _) => Easing::Linear,
            ("power0", _) => Easing::Linear,
            ("quad", d) => power(1, d).ok_or_else(invalid)?,
            ("cubic", d) => power(2, d).ok_or_else(invalid)?,
            ("quart", d) => power(3, d).ok_or_else(invalid)?,
            (p, d) if p.starts_with("power") => {
                let n = p["power".len()..].parse::<u8>().map_err(|_| invalid())?;
                power(n, d).ok_or_else(invalid)?
            }
            ("sine", "in") => Easing::SineIn,
            ("sine", "out") => Easing::SineOut,
            ("sine", "inOut") => Easing::SineInOut,
            ("back", "out") => Easing::BackOut(args.first().copied().unwrap_or(1.70158)),
            ("elastic", "out") => {
                let period = args.get(1).copied().unwrap_or(0.3);
                if period <= 0.0 || !period.is_finite() {
                    return Err(invalid());
                }
                Easing::ElasticOut {
                    amplitude: args.first().copied().unwrap_or(1.0),
                    period,
                }
            }
            _ => return Err(invalid()),
        };
        Ok(easing)
    }
}

fn power(n: u8, direction: &str) -> Option<Easing> {
    match direction {
        "in" => Some(Easing::PowerIn(n)),
        "out" => Some(Easing::PowerOut(n)),
        "inOut" => Some(Easing::PowerInOut(n)),
        _ => None,
    }
}

//! Scroll thresholds and trigger configuration.

use std::{fmt, str::FromStr};

use crate::error::EngineError;

/// A point either relative to an extent or in absolute pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// 0.0 is the top edge, 1.0 the bottom edge.
    Fraction(f32),
    Pixels(f32),
}

impl Anchor {
    fn resolve(self, extent: f32) -> f32 {
        match self {
            Anchor::Fraction(f) => f * extent,
            Anchor::Pixels(px) => px,
        }
    }
}

impl FromStr for Anchor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Anchor::Fraction(0.0)),
            "center" => Ok(Anchor::Fraction(0.5)),
            "bottom" => Ok(Anchor::Fraction(1.0)),
            _ => {
                if let Some(pct) = s.strip_suffix('%') {
                    pct.parse::<f32>()
                        .map(|p| Anchor::Fraction(p / 100.0))
                        .map_err(|_| ())
                } else {
                    s.strip_suffix("px")
                        .unwrap_or(s)
                        .parse::<f32>()
                        .map(Anchor::Pixels)
                        .map_err(|_| ())
                }
            }
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Anchor::Fraction(v) if v == 0.0 => f.write_str("top"),
            Anchor::Fraction(v) if v == 0.5 => f.write_str("center"),
            Anchor::Fraction(v) if v == 1.0 => f.write_str("bottom"),
            Anchor::Fraction(v) => write!(f, "{}%", v * 100.0),
            Anchor::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// "When `element` edge of the region meets `viewport` position", e.g.
/// `"top 80%"`: the region's top reaches 80% of the viewport height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl Threshold {
    pub const TOP_80: Threshold = Threshold {
        element: Anchor::Fraction(0.0),
        viewport: Anchor::Fraction(0.8),
    };

    /// The scroll offset at which the threshold is met.
    pub fn resolve(&self, bounds: RegionBounds, viewport_height: f32) -> f32 {
        bounds.top + self.element.resolve(bounds.height) - self.viewport.resolve(viewport_height)
    }
}

impl FromStr for Threshold {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidThreshold(s.to_string());
        let mut parts = s.split_whitespace();
        let element = parts.next().ok_or_else(invalid)?;
        let viewport = parts.next().unwrap_or(element);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Threshold {
            element: element.parse().map_err(|_| invalid())?,
            viewport: viewport.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

/// Vertical extent of a region in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBounds {
    pub top: f32,
    pub height: f32,
}

/// What happens to a region's timeline when the start threshold is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayPolicy {
    /// Play forward on enter, animate back to 0 when scrolled back above.
    #[default]
    PlayReverse,
    /// Snap back to 0 when scrolled back above; play from 0 on every enter.
    Restart,
    /// Play once on the first enter and stay there.
    PlayOnce,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTrigger {
    pub start: Threshold,
    pub end: Option<Threshold>,
    pub policy: ReplayPolicy,
    /// Progress follows the scroll position instead of a playhead.
    pub scrub: bool,
}

impl ScrollTrigger {
    pub fn new(start: Threshold) -> Self {
        Self {
            start,
            end: None,
            policy: ReplayPolicy::PlayReverse,
            scrub: false,
        }
    }

    /// Parses the start threshold, e.g. `ScrollTrigger::at("top 80%")`.
    pub fn at(start: &str) -> Result<Self, EngineError> {
        Ok(Self::new(start.parse()?))
    }

    pub fn until(mut self, end: &str) -> Result<Self, EngineError> {
        self.end = Some(end.parse()?);
        Ok(self)
    }

    pub fn with_policy(mut self, policy: ReplayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn scrubbed(mut self) -> Self {
        self.scrub = true;
        self
    }

    /// End threshold; scrubbed regions without one run until their bottom edge
    /// meets the same viewport position as the start.
    pub fn end_or_default(&self) -> Option<Threshold> {
        self.end.or_else(|| {
            self.scrub.then_some(Threshold {
                element: Anchor::Fraction(1.0),
                viewport: self.start.viewport,
            })
        })
    }
}

//! Time-driven object motion.
//!
//! Motion is a function of absolute elapsed time. The only state is the spin
//! anchor: when the spin rate changes (hover on/off) the phase is re-anchored at
//! the switching instant so the angle stays continuous instead of jumping.

use crate::data_structures::transform::Transform;

/// Rates in rad/s and amplitudes in scene units, each as (idle, hovered).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    pub globe_spin: f32,
    pub prize_spin: (f32, f32),
    pub tilt: (f32, f32),
    pub bob: (f32, f32),
    /// Point light intensity while idle. Hovered it pulses around `3`.
    pub intensity: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            globe_spin: 0.1,
            prize_spin: (0.3, 1.2),
            tilt: (0.1, 0.2),
            bob: (0.05, 0.1),
            intensity: 2.0,
        }
    }
}

impl MotionConfig {
    pub fn point_intensity(&self, t: f32, hovered: bool) -> f32 {
        if hovered {
            3.0 + (3.0 * t).sin()
        } else {
            self.intensity
        }
    }
}

/// Rotation about y at a rate that may change over time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    anchor_time: f32,
    anchor_angle: f32,
    rate: f32,
}

impl Spin {
    pub fn new(rate: f32) -> Self {
        Self {
            anchor_time: 0.0,
            anchor_angle: 0.0,
            rate,
        }
    }

    /// Angle at `t` when spinning at `rate` from now on.
    pub fn angle(&mut self, t: f32, rate: f32) -> f32 {
        if rate != self.rate {
            self.anchor_angle += self.rate * (t - self.anchor_time);
            self.anchor_time = t;
            self.rate = rate;
        }
        self.anchor_angle + self.rate * (t - self.anchor_time)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    spin: Option<(Spin, f32, f32)>,
    tilt: Option<(f32, f32)>,
    bob: Option<(f32, f32)>,
}

impl Motion {
    pub fn still() -> Self {
        Self {
            spin: None,
            tilt: None,
            bob: None,
        }
    }

    /// Constant-rate spin that ignores hover.
    pub fn spin(rate: f32) -> Self {
        Self::still().with_spin(rate, rate)
    }

    pub fn with_spin(mut self, idle: f32, hovered: f32) -> Self {
        self.spin = Some((Spin::new(idle), idle, hovered));
        self
    }

    /// `x = sin(t) * amplitude`
    pub fn with_tilt(mut self, idle: f32, hovered: f32) -> Self {
        self.tilt = Some((idle, hovered));
        self
    }

    /// `y = sin(2t) * amplitude`
    pub fn with_bob(mut self, idle: f32, hovered: f32) -> Self {
        self.bob = Some((idle, hovered));
        self
    }

    /// Offset applied on top of the object's local transform at time `t`.
    pub fn pose(&mut self, t: f32, hovered: bool) -> Transform {
        let pick = |(idle, hover): (f32, f32)| if hovered { hover } else { idle };
        let spin = self
            .spin
            .as_mut()
            .map(|(spin, idle, hover)| {
                let rate = pick((*idle, *hover));
                spin.angle(t, rate)
            })
            .unwrap_or(0.0);
        let tilt = self.tilt.map(|amp| t.sin() * pick(amp)).unwrap_or(0.0);
        let bob = self.bob.map(|amp| (2.0 * t).sin() * pick(amp)).unwrap_or(0.0);
        Transform::at(0.0, bob, 0.0).with_euler(tilt, spin, 0.0)
    }
}

impl Default for Motion {
    fn default() -> Self {
        Self::still()
    }
}

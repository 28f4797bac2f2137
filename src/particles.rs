//! Decorative particle batch floating behind the hero section.
//!
//! Particles are page elements, not GPU geometry: each one has a fixed origin
//! inside its container and a yoyo tween that drifts it around forever. The
//! host applies [`ParticleStyle`]s from [`ParticleField::sample`] every frame.

use rand::Rng;

use crate::scroll::Easing;

/// A tween that runs `from → to`, then back, forever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoyoTween {
    pub from: f32,
    pub to: f32,
    /// Seconds for one leg.
    pub duration: f32,
    pub easing: Easing,
}

impl YoyoTween {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration,
            easing: Easing::SineInOut,
        }
    }

    pub fn value_at(&self, t: f32) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let legs = t.max(0.0) / self.duration;
        let leg = legs.floor();
        let mut local = legs - leg;
        if leg as u64 % 2 == 1 {
            local = 1.0 - local;
        }
        self.from + (self.to - self.from) * self.easing.apply(local)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Position inside the container, in percent of its size.
    pub origin: [f32; 2],
    /// Diameter in pixels.
    pub size: f32,
    pub x: YoyoTween,
    pub y: YoyoTween,
    pub opacity: YoyoTween,
    pub scale: YoyoTween,
}

impl Particle {
    fn random<R: Rng>(rng: &mut R) -> Self {
        let duration = rng.gen_range(10.0..=20.0);
        let stepped = |rng: &mut R| rng.gen_range(-10..=10) as f32 * 10.0;
        Self {
            origin: [rng.gen_range(0.0..=100.0), rng.gen_range(0.0..=100.0)],
            size: rng.gen_range(4.0..=20.0),
            x: YoyoTween::new(0.0, stepped(rng), duration),
            y: YoyoTween::new(0.0, stepped(rng), duration),
            opacity: YoyoTween::new(1.0, rng.gen_range(0.1..=0.7), duration),
            scale: YoyoTween::new(1.0, rng.gen_range(5..=20) as f32 / 10.0, duration),
        }
    }

    pub fn style_at(&self, t: f32) -> ParticleStyle {
        ParticleStyle {
            left: self.origin[0],
            top: self.origin[1],
            size: self.size,
            translate: [self.x.value_at(t), self.y.value_at(t)],
            opacity: self.opacity.value_at(t),
            scale: self.scale.value_at(t),
        }
    }

    /// Whether the origin lies inside the container.
    pub fn in_bounds(&self) -> bool {
        self.origin.iter().all(|v| (0.0..=100.0).contains(v))
    }
}

/// Inline style of one particle at an instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStyle {
    /// Percent.
    pub left: f32,
    /// Percent.
    pub top: f32,
    pub size: f32,
    /// Pixels.
    pub translate: [f32; 2],
    pub opacity: f32,
    pub scale: f32,
}

#[derive(Debug, Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the batch with exactly `count` fresh particles.
    pub fn regenerate<R: Rng>(&mut self, count: usize, rng: &mut R) {
        self.clear();
        self.particles.extend((0..count).map(|_| Particle::random(rng)));
        log::debug!("regenerated {count} particles");
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Style of every particle at absolute time `t` seconds.
    pub fn sample(&self, t: f32) -> Vec<ParticleStyle> {
        self.particles.iter().map(|p| p.style_at(t)).collect()
    }
}

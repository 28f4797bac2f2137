//! Property tweens on a shared playhead.
//!
//! A [`Timeline`]'s state is just its progress in [0, 1] and a direction. Every
//! style value is recomputed from that progress, so scrubbing, reversing and
//! restarting never accumulate error.

use crate::scroll::easing::Easing;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Opacity,
    TranslateX,
    TranslateY,
    Scale,
    /// Percentage width, e.g. criteria bars.
    Width,
    /// Percentage height, e.g. the timeline progress line.
    Height,
    /// Displayed number of a counter.
    Counter,
    Custom(String),
}

/// One side effect to apply to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleMutation {
    pub target: String,
    pub property: StyleProperty,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: String,
    pub property: StyleProperty,
    pub from: f32,
    pub to: f32,
    /// Seconds.
    pub duration: f32,
    /// Seconds after the timeline start.
    pub delay: f32,
    pub easing: Easing,
}

impl Tween {
    pub fn new(target: &str, property: StyleProperty, from: f32, to: f32, duration: f32) -> Self {
        Self {
            target: target.to_string(),
            property,
            from,
            to,
            duration,
            delay: 0.0,
            easing: Easing::default(),
        }
    }

    pub fn delayed(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    fn end(&self) -> f32 {
        self.delay + self.duration
    }

    /// Value at `time` seconds into the timeline.
    pub fn value_at(&self, time: f32) -> f32 {
        let local = if self.duration <= 0.0 {
            if time >= self.delay { 1.0 } else { 0.0 }
        } else {
            ((time - self.delay) / self.duration).clamp(0.0, 1.0)
        };
        self.from + (self.to - self.from) * self.easing.apply(local)
    }

    fn mutation(&self, value: f32) -> StyleMutation {
        StyleMutation {
            target: self.target.clone(),
            property: self.property.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Paused,
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    tweens: Vec<Tween>,
    progress: f32,
    direction: Direction,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tween(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    /// One tween per target, each starting `stagger` seconds after the previous.
    pub fn staggered(mut self, targets: &[&str], template: Tween, stagger: f32) -> Self {
        for (i, target) in targets.iter().enumerate() {
            self.tweens.push(Tween {
                target: target.to_string(),
                delay: template.delay + i as f32 * stagger,
                ..template.clone()
            });
        }
        self
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    /// Seconds until the last tween finishes.
    pub fn duration(&self) -> f32 {
        self.tweens.iter().map(Tween::end).fold(0.0, f32::max)
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_playing(&self) -> bool {
        self.direction != Direction::Paused
    }

    pub fn play(&mut self) {
        self.direction = Direction::Forward;
    }

    pub fn reverse(&mut self) {
        self.direction = Direction::Backward;
    }

    pub fn pause(&mut self) {
        self.direction = Direction::Paused;
    }

    pub fn restart(&mut self) {
        self.progress = 0.0;
        self.direction = Direction::Forward;
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.direction = Direction::Paused;
    }

    /// Jumps to `progress` and stops the playhead, as scrubbing does.
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
        self.direction = Direction::Paused;
    }

    /// Moves the playhead by `dt` seconds; returns whether progress changed.
    /// The playhead pauses when it reaches either end.
    pub fn advance(&mut self, dt: f32) -> bool {
        let step = match self.direction {
            Direction::Paused => return false,
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        };
        let duration = self.duration();
        let before = self.progress;
        self.progress = if duration <= 0.0 {
            if step > 0.0 { 1.0 } else { 0.0 }
        } else {
            (self.progress + step * dt.max(0.0) / duration).clamp(0.0, 1.0)
        };
        if (step > 0.0 && self.progress >= 1.0) || (step < 0.0 && self.progress <= 0.0) {
            self.direction = Direction::Paused;
        }
        self.progress != before
    }

    /// Style values at the current progress.
    pub fn mutations(&self) -> Vec<StyleMutation> {
        let time = self.progress * self.duration();
        self.tweens
            .iter()
            .map(|tween| tween.mutation(tween.value_at(time)))
            .collect()
    }

    /// Style values that undo the timeline (every tween at its start value).
    pub fn revert(&self) -> Vec<StyleMutation> {
        self.tweens
            .iter()
            .map(|tween| tween.mutation(tween.from))
            .collect()
    }
}

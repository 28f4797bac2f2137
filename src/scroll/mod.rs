//! Scroll-synchronised animation.
//!
//! Each surface owns a [`ScrollAnimationScheduler`] with an explicit registry
//! of regions. A region pairs a [`ScrollTrigger`] with a [`Timeline`] and walks
//! the state machine
//!
//! ```text
//! Before --Enter--> Entering --(progress 1)--> Active
//!    ^                                           |
//!    +--(progress 0)-- Leaving <--EnterBack------+
//! ```
//!
//! Under [`ReplayPolicy::PlayOnce`] `EnterBack` leaves the state alone, so a
//! finished region stays `Active`.
//!
//! Regions never look at each other; registering, scrolling or reverting one
//! leaves every other region untouched.

pub mod easing;
pub mod timeline;
pub mod trigger;

use std::collections::BTreeMap;

pub use easing::Easing;
pub use timeline::{StyleMutation, StyleProperty, Timeline, Tween};
pub use trigger::{Anchor, RegionBounds, ReplayPolicy, ScrollTrigger, Threshold};

use crate::{error::EngineError, render_loop::HoverFlag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Before,
    Entering,
    Active,
    Leaving,
}

/// Discrete threshold crossings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Start threshold crossed scrolling down.
    Enter,
    /// Start threshold crossed scrolling back up.
    EnterBack,
    /// End threshold crossed scrolling down.
    Exit,
    /// End threshold crossed scrolling back up.
    ExitBack,
}

#[derive(Debug)]
struct Region {
    name: String,
    trigger: ScrollTrigger,
    timeline: Timeline,
    state: RegionState,
    bounds: Option<RegionBounds>,
    /// `None` until the first scroll event; counts as "before everything".
    last_scroll: Option<f32>,
    flag: Option<HoverFlag>,
    dirty: bool,
}

impl Region {
    fn settle(&mut self) {
        let progress = self.timeline.progress();
        self.state = match self.state {
            RegionState::Entering if progress >= 1.0 => RegionState::Active,
            RegionState::Leaving if progress <= 0.0 => RegionState::Before,
            state => state,
        };
        if let Some(flag) = &self.flag {
            flag.set(matches!(
                self.state,
                RegionState::Entering | RegionState::Active
            ));
        }
    }

    fn on_enter(&mut self) {
        self.state = RegionState::Entering;
        match self.trigger.policy {
            ReplayPolicy::PlayReverse => self.timeline.play(),
            ReplayPolicy::Restart => self.timeline.restart(),
            ReplayPolicy::PlayOnce => {
                if self.timeline.progress() < 1.0 {
                    self.timeline.play();
                }
            }
        }
    }

    fn on_enter_back(&mut self) {
        match self.trigger.policy {
            ReplayPolicy::PlayReverse => {
                self.state = RegionState::Leaving;
                self.timeline.reverse();
            }
            ReplayPolicy::Restart => {
                self.state = RegionState::Leaving;
                self.timeline.reset();
                self.dirty = true;
            }
            ReplayPolicy::PlayOnce => {}
        }
    }

    fn on_scroll(&mut self, scroll: f32, viewport_height: f32) -> Vec<TriggerEvent> {
        let Some(bounds) = self.bounds else {
            return Vec::new();
        };
        let start = self.trigger.start.resolve(bounds, viewport_height);
        let end = self
            .trigger
            .end_or_default()
            .map(|t| t.resolve(bounds, viewport_height));
        let previous = self.last_scroll.replace(scroll);
        let crossed_forward =
            |at: f32| previous.is_none_or(|prev| prev < at) && scroll >= at;
        let crossed_backward = |at: f32| previous.is_some_and(|prev| prev >= at) && scroll < at;

        let mut events = Vec::new();
        if crossed_forward(start) {
            events.push(TriggerEvent::Enter);
        } else if crossed_backward(start) {
            events.push(TriggerEvent::EnterBack);
        }
        if let Some(end) = end {
            // An unvisited region below the end threshold was never "inside".
            if previous.is_some() && crossed_forward(end) {
                events.push(TriggerEvent::Exit);
            } else if crossed_backward(end) {
                events.push(TriggerEvent::ExitBack);
            }
        }

        if self.trigger.scrub {
            let end = end.unwrap_or(start);
            let progress = if end > start {
                ((scroll - start) / (end - start)).clamp(0.0, 1.0)
            } else if scroll >= start {
                1.0
            } else {
                0.0
            };
            let before = self.timeline.progress();
            self.timeline.set_progress(progress);
            self.dirty |= progress != before;
            self.state = if progress <= 0.0 {
                RegionState::Before
            } else if progress >= 1.0 {
                RegionState::Active
            } else if progress >= before {
                RegionState::Entering
            } else {
                RegionState::Leaving
            };
        } else {
            for event in &events {
                match event {
                    TriggerEvent::Enter => self.on_enter(),
                    TriggerEvent::EnterBack => self.on_enter_back(),
                    // "play none none reverse": the end threshold only reports.
                    TriggerEvent::Exit | TriggerEvent::ExitBack => {}
                }
            }
        }
        self.settle();
        events
    }
}

/// Per-surface scroll scheduler.
#[derive(Debug, Default)]
pub struct ScrollAnimationScheduler {
    regions: BTreeMap<RegionId, Region>,
    next: u32,
    scroll: f32,
    viewport_height: f32,
}

impl ScrollAnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, trigger: ScrollTrigger, timeline: Timeline) -> RegionId {
        self.next += 1;
        let id = RegionId(self.next);
        self.regions.insert(
            id,
            Region {
                name: name.to_string(),
                trigger,
                timeline,
                state: RegionState::Before,
                bounds: None,
                last_scroll: None,
                flag: None,
                dirty: false,
            },
        );
        log::debug!("registered scroll region `{name}` as {id:?}");
        id
    }

    /// Places a region on the page. Until then it ignores scrolling.
    pub fn set_bounds(&mut self, id: RegionId, bounds: RegionBounds) -> Result<(), EngineError> {
        let region = self.region_mut(id)?;
        region.bounds = Some(bounds);
        Ok(())
    }

    /// Mirrors "entering or active" into `flag`, for scenes that light up
    /// while their section is on screen.
    pub fn attach_flag(&mut self, id: RegionId, flag: HoverFlag) -> Result<(), EngineError> {
        let region = self.region_mut(id)?;
        flag.set(matches!(
            region.state,
            RegionState::Entering | RegionState::Active
        ));
        region.flag = Some(flag);
        Ok(())
    }

    /// Removes a region and returns the mutations that undo its timeline.
    pub fn unregister(&mut self, id: RegionId) -> Result<Vec<StyleMutation>, EngineError> {
        let region = self
            .regions
            .remove(&id)
            .ok_or_else(|| EngineError::MissingSurface(format!("scroll region {id:?}")))?;
        if let Some(flag) = &region.flag {
            flag.set(false);
        }
        Ok(region.timeline.revert())
    }

    fn region_mut(&mut self, id: RegionId) -> Result<&mut Region, EngineError> {
        self.regions
            .get_mut(&id)
            .ok_or_else(|| EngineError::MissingSurface(format!("scroll region {id:?}")))
    }

    /// Feeds a scroll position (document offset of the viewport top).
    pub fn on_scroll(&mut self, scroll: f32, viewport_height: f32) -> Vec<(RegionId, TriggerEvent)> {
        self.scroll = scroll;
        self.viewport_height = viewport_height;
        let mut fired = Vec::new();
        for (id, region) in self.regions.iter_mut() {
            for event in region.on_scroll(scroll, viewport_height) {
                log::debug!("region `{}` {event:?} at {scroll}", region.name);
                fired.push((*id, event));
            }
        }
        fired
    }

    /// Re-evaluates every region against the last scroll position, e.g. after
    /// the page layout or the viewport changed.
    pub fn refresh(&mut self, viewport_height: f32) -> Vec<(RegionId, TriggerEvent)> {
        self.on_scroll(self.scroll, viewport_height)
    }

    /// Moves all playheads by `dt` seconds and returns the style values of
    /// every region whose progress changed since the last call.
    pub fn advance(&mut self, dt: f32) -> Vec<StyleMutation> {
        let mut mutations = Vec::new();
        for region in self.regions.values_mut() {
            if !region.trigger.scrub && region.timeline.advance(dt) {
                region.dirty = true;
            }
            region.settle();
            if std::mem::take(&mut region.dirty) {
                mutations.extend(region.timeline.mutations());
            }
        }
        mutations
    }

    /// Whether any playhead still moves on its own, i.e. `advance` has work.
    pub fn is_animating(&self) -> bool {
        self.regions
            .values()
            .any(|r| !r.trigger.scrub && r.timeline.is_playing())
    }

    pub fn state(&self, id: RegionId) -> Option<RegionState> {
        self.regions.get(&id).map(|r| r.state)
    }

    pub fn progress(&self, id: RegionId) -> Option<f32> {
        self.regions.get(&id).map(|r| r.timeline.progress())
    }

    pub fn timeline(&self, id: RegionId) -> Option<&Timeline> {
        self.regions.get(&id).map(|r| &r.timeline)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Drops every region and returns the mutations that undo all of them.
    pub fn revert(&mut self) -> Vec<StyleMutation> {
        let regions = std::mem::take(&mut self.regions);
        regions
            .into_values()
            .flat_map(|region| {
                if let Some(flag) = &region.flag {
                    flag.set(false);
                }
                region.timeline.revert()
            })
            .collect()
    }
}

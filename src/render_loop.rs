//! Per-surface frame driver.
//!
//! The loop itself owns no scene; it only knows whether it is running, which
//! frame request it is waiting for and when it started. [`RenderLoop::on_frame`]
//! hands the absolute elapsed time to the caller, who draws exactly once.

use std::{cell::Cell, rc::Rc};

use instant::Duration;

use crate::host::{Clock, FrameRequest, FrameScheduler};

/// Shared "pointer is over the surface" flag.
///
/// Event handlers set it, the frame callback reads it. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct HoverFlag(Rc<Cell<bool>>);

impl HoverFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, hovered: bool) {
        self.0.set(hovered);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Frames rendered since mount.
    pub renders: u64,
    /// Elapsed time passed to the last rendered frame.
    pub last_elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LoopState {
    #[default]
    Stopped,
    Running {
        started_at: Duration,
        pending: FrameRequest,
    },
}

#[derive(Debug, Default)]
pub struct RenderLoop {
    state: LoopState,
    stats: FrameStats,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        match self.state {
            LoopState::Running { pending, .. } => Some(pending),
            LoopState::Stopped => None,
        }
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Records the start instant and asks for the first frame.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler, clock: &dyn Clock) {
        if self.is_running() {
            return;
        }
        self.state = LoopState::Running {
            started_at: clock.now(),
            pending: scheduler.request_frame(),
        };
    }

    /// Cancels the outstanding frame. Stopping a stopped loop does nothing.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let LoopState::Running { pending, .. } = std::mem::take(&mut self.state) {
            scheduler.cancel_frame(pending);
        }
    }

    /// Delivers a frame. Returns the elapsed time since [`start`](Self::start)
    /// when `request` is the one the loop waits for, after requesting the
    /// next frame; `None` means "do not draw".
    pub fn on_frame(
        &mut self,
        request: FrameRequest,
        scheduler: &mut dyn FrameScheduler,
        clock: &dyn Clock,
    ) -> Option<Duration> {
        let LoopState::Running {
            started_at,
            pending,
        } = self.state
        else {
            return None;
        };
        if pending != request {
            log::trace!("ignoring stale frame {request:?}, waiting for {pending:?}");
            return None;
        }
        let elapsed = clock.now().saturating_sub(started_at);
        self.state = LoopState::Running {
            started_at,
            pending: scheduler.request_frame(),
        };
        Some(elapsed)
    }

    /// Counts a frame that was actually rendered.
    pub fn record_render(&mut self, elapsed: Duration) {
        self.stats.renders += 1;
        self.stats.last_elapsed = elapsed;
    }
}

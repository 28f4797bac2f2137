//! Host seams: time, frame scheduling and event listener bookkeeping.
//!
//! A page hands the engine a clock, a way to ask for "the next frame" and a
//! place to register listeners. On native and wasm these are backed by
//! [`InstantClock`], [`FrameQueue`] and [`EventRouter`], which the winit shell
//! in [`crate::flow`] drains. Tests drive the very same types by hand.

use std::collections::{BTreeSet, HashMap};

use instant::{Duration, Instant};

use crate::gpu::Gpu;

/// Opaque identifier of a render surface the page owns (a canvas, a window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    origin: Instant,
}

impl InstantClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for InstantClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Ticket for one requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRequest(pub u64);

pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequest;
    /// Cancelling an unknown or already delivered request is a no-op.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Frame requests waiting to be delivered, in request order.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next: u64,
    pending: BTreeSet<FrameRequest>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every pending request. The host delivers them to
    /// whoever asked; anything requested while delivering lands in the next
    /// batch.
    pub fn take_due(&mut self) -> Vec<FrameRequest> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, request: FrameRequest) -> bool {
        self.pending.contains(&request)
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.pending.insert(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.pending.remove(&request);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Resize,
    PointerMove,
    PointerEnter,
    PointerLeave,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

pub trait ListenerRegistry {
    fn add_listener(&mut self, surface: SurfaceId, kind: ListenerKind) -> ListenerId;
    /// Returns whether the listener was still registered.
    fn remove_listener(&mut self, id: ListenerId) -> bool;
    /// Number of live listeners of `kind`, across all surfaces.
    fn listener_count(&self, kind: ListenerKind) -> usize;
}

/// Listener table the winit shell consults before forwarding an event.
#[derive(Debug, Default)]
pub struct EventRouter {
    next: u64,
    listeners: HashMap<ListenerId, (SurfaceId, ListenerKind)>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything on `surface` listens for `kind`.
    pub fn is_listening(&self, surface: SurfaceId, kind: ListenerKind) -> bool {
        self.listeners
            .values()
            .any(|&(s, k)| s == surface && k == kind)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl ListenerRegistry for EventRouter {
    fn add_listener(&mut self, surface: SurfaceId, kind: ListenerKind) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.listeners.insert(id, (surface, kind));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    fn listener_count(&self, kind: ListenerKind) -> usize {
        self.listeners.values().filter(|&&(_, k)| k == kind).count()
    }
}

/// Borrowed view of every host service a surface talks to.
///
/// `gpu` is `None` while no rendering context exists (wasm initialises it
/// asynchronously, and some browsers refuse one outright).
pub struct Host<'a> {
    pub gpu: Option<&'a mut dyn Gpu>,
    pub scheduler: &'a mut dyn FrameScheduler,
    pub listeners: &'a mut dyn ListenerRegistry,
    pub clock: &'a dyn Clock,
}

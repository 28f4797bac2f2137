//! Pointer position and the eased parallax offset derived from it.

use crate::{
    host::{ListenerId, ListenerKind, ListenerRegistry, SurfaceId},
    scroll::Easing,
};

/// Pixels of parallax per unit of normalised pointer offset.
pub const PARALLAX_PX: f32 = 20.0;
/// Seconds the offset takes to catch up with a new target.
pub const PARALLAX_DURATION: f32 = 1.0;

/// Maps client coordinates to `[-0.5, 0.5]` on both axes, (0, 0) being the
/// viewport centre.
pub fn normalize(client_x: f32, client_y: f32, viewport: (f32, f32)) -> [f32; 2] {
    let axis = |v: f32, extent: f32| {
        if extent > 0.0 {
            (v / extent - 0.5).clamp(-0.5, 0.5)
        } else {
            0.0
        }
    };
    [axis(client_x, viewport.0), axis(client_y, viewport.1)]
}

#[derive(Debug)]
pub struct PointerTracker {
    surface: SurfaceId,
    listener: Option<ListenerId>,
    pointer: [f32; 2],
    from: [f32; 2],
    target: [f32; 2],
    elapsed: f32,
    easing: Easing,
}

impl PointerTracker {
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            listener: None,
            pointer: [0.0; 2],
            from: [0.0; 2],
            target: [0.0; 2],
            elapsed: PARALLAX_DURATION,
            easing: Easing::PowerOut(2),
        }
    }

    pub fn bind(&mut self, registry: &mut dyn ListenerRegistry) {
        if self.listener.is_none() {
            self.listener = Some(registry.add_listener(self.surface, ListenerKind::PointerMove));
        }
    }

    pub fn unbind(&mut self, registry: &mut dyn ListenerRegistry) {
        if let Some(id) = self.listener.take() {
            registry.remove_listener(id);
        }
    }

    pub fn is_bound(&self) -> bool {
        self.listener.is_some()
    }

    /// Latest normalised pointer position.
    pub fn pointer(&self) -> [f32; 2] {
        self.pointer
    }

    /// Records a pointer move and retargets the parallax from where it is now.
    pub fn on_move(&mut self, client_x: f32, client_y: f32, viewport: (f32, f32)) {
        self.pointer = normalize(client_x, client_y, viewport);
        self.from = self.offset();
        self.target = [self.pointer[0] * PARALLAX_PX, self.pointer[1] * PARALLAX_PX];
        self.elapsed = 0.0;
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(PARALLAX_DURATION);
    }

    /// Current parallax translation in pixels.
    pub fn offset(&self) -> [f32; 2] {
        let k = self.easing.apply(self.elapsed / PARALLAX_DURATION);
        [
            self.from[0] + (self.target[0] - self.from[0]) * k,
            self.from[1] + (self.target[1] - self.from[1]) * k,
        ]
    }
}

//! Keeps the drawing buffer and the camera lens in step with the surface size.

use crate::{
    camera::Projection,
    gpu::Gpu,
    host::{ListenerId, ListenerKind, ListenerRegistry, SurfaceId},
};

/// Observed size of a surface in CSS (logical) pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
    /// Device pixel ratio reported by the host.
    pub scale_factor: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scale_factor: 1.0,
        }
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Drawing buffer size in physical pixels, never below 1×1.
    pub fn physical(&self, max_pixel_ratio: f64) -> (u32, u32) {
        let ratio = self.scale_factor.clamp(f64::MIN_POSITIVE, max_pixel_ratio.max(1.0));
        let scale = |v: f64| ((v.max(0.0) * ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

#[derive(Debug)]
pub struct ViewportResizeBinder {
    surface: SurfaceId,
    max_pixel_ratio: f64,
    listener: Option<ListenerId>,
}

impl ViewportResizeBinder {
    pub fn new(surface: SurfaceId, max_pixel_ratio: f64) -> Self {
        Self {
            surface,
            max_pixel_ratio,
            listener: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.listener.is_some()
    }

    /// Registers the resize listener. Binding twice keeps the one listener.
    pub fn bind(&mut self, registry: &mut dyn ListenerRegistry) {
        if self.listener.is_none() {
            self.listener = Some(registry.add_listener(self.surface, ListenerKind::Resize));
        }
    }

    /// Resizes the drawing buffer and updates the lens aspect. The buffer is
    /// rounded to whole device pixels, the aspect is not. The vertical field
    /// of view is left alone.
    pub fn apply(&self, size: SurfaceSize, projection: &mut Projection, gpu: &mut dyn Gpu) {
        let (width, height) = size.physical(self.max_pixel_ratio);
        gpu.resize(width, height);
        projection.resize(size.width, size.height);
        log::debug!(
            "{:?} resized to {width}x{height} (aspect {:.3})",
            self.surface,
            projection.aspect
        );
    }

    pub fn unbind(&mut self, registry: &mut dyn ListenerRegistry) {
        if let Some(id) = self.listener.take() {
            registry.remove_listener(id);
        }
    }
}

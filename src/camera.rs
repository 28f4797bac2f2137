//! Camera and perspective projection.
//!
//! The camera is a plain look-at rig; none of the scenes let the user steer it.
//! [`Projection`] owns the lens (vertical field of view and clip planes) and is
//! the only thing the viewport binder touches on resize.

use cgmath::{Matrix4, Point3, Rad, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    /// Camera on the positive z axis looking at the origin.
    pub fn on_z(distance: f32) -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, distance),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.target, self.up)
    }
}

/// Perspective lens. `aspect` follows the observed surface, `fovy` never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Sets the aspect to the observed `width / height` in CSS pixels.
    /// Degenerate sizes are ignored so a collapsed element never produces a
    /// NaN projection.
    pub fn resize(&mut self, width: f64, height: f64) {
        let aspect = width / height;
        if width > 0.0 && height > 0.0 && aspect.is_finite() {
            self.aspect = aspect as f32;
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Combined view-projection matrix for a camera/lens pair.
pub fn view_projection(camera: &Camera, projection: &Projection) -> Matrix4<f32> {
    projection.calc_matrix() * camera.view_matrix()
}


//! Local transforms of scene objects.
//!
//! A [`Transform`] is position, rotation and scale applied in TRS order.
//! Multiplying two transforms composes them parent → child, which is how the
//! scene graph turns local transforms into world transforms.

use std::ops::Mul;

use cgmath::{Matrix, Matrix4, One, Quaternion, Rad, Rotation3, SquareMatrix, Vector3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Identity: no move, rotate, or scale.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::new()
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    /// Applies Euler angles in XYZ order, like the rest of the web stack does.
    pub fn with_euler(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Quaternion::from_angle_x(Rad(x))
            * Quaternion::from_angle_y(Rad(y))
            * Quaternion::from_angle_z(Rad(z));
        self
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse-transpose of the model matrix, for transforming normals.
    /// Falls back to the pure rotation when the scale is degenerate.
    pub fn normal_matrix(&self) -> Matrix4<f32> {
        self.to_matrix()
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(|| Matrix4::from(self.rotation))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    fn mul(self, rhs: &'b Transform) -> Self::Output {
        let scaled_rhs_pos = Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        Transform {
            position: self.position + (self.rotation * scaled_rhs_pos),
            rotation: self.rotation * rhs.rotation,
            scale: Vector3::new(
                self.scale.x * rhs.scale.x,
                self.scale.y * rhs.scale.y,
                self.scale.z * rhs.scale.z,
            ),
        }
    }
}

impl Mul<Transform> for Transform {
    type Output = Self;

    fn mul(self, rhs: Transform) -> Self::Output {
        &self * &rhs
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

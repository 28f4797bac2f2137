//! Procedural geometry.
//!
//! Scenes never load model files: every mesh is described by a [`Geometry`]
//! and tessellated on mount. Parameterisation and vertex order follow the
//! common web conventions (y up, counter-clockwise front faces, uv v pointing
//! up), so the same numbers produce the same shapes as on the site.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Vector2, Vector3};

use crate::data_structures::vertex::{ModelVertex, PointVertex};

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    },
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Cuboid {
        width: f32,
        height: f32,
        depth: f32,
    },
    Octahedron {
        radius: f32,
    },
    /// A polyline in the xy plane swept into a solid of the given stroke
    /// width, extruded along +z by `depth`.
    Stroke {
        path: Vec<[f32; 2]>,
        width: f32,
        depth: f32,
    },
    /// Two triangles covering clip space.
    ScreenQuad,
    PointCloud {
        points: Vec<PointVertex>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeshData {
    Indexed {
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
    },
    Points(Vec<PointVertex>),
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        match self {
            MeshData::Indexed { indices, .. } => indices.is_empty(),
            MeshData::Points(points) => points.is_empty(),
        }
    }
}

#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    fn push(&mut self, position: Vector3<f32>, normal: Vector3<f32>, uv: [f32; 2]) -> u32 {
        self.vertices.push(ModelVertex {
            position: position.into(),
            normal: normal.into(),
            uv,
        });
        (self.vertices.len() - 1) as u32
    }

    /// Flat quad `a b c d` (in ring order) facing `normal`; the winding is
    /// picked so the front face points along the normal.
    fn quad(&mut self, corners: [Vector3<f32>; 4], normal: Vector3<f32>) {
        let [a, b, c, _] = corners;
        let winding = (b - a).cross(c - a).dot(normal);
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let base = self.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs) {
            self.push(*corner, normal, uv);
        }
        if winding >= 0.0 {
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        } else {
            self.indices
                .extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        }
    }

    fn finish(self) -> MeshData {
        MeshData::Indexed {
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

impl Geometry {
    pub fn tessellate(&self) -> MeshData {
        match self {
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere(*radius, (*width_segments).max(3), (*height_segments).max(2)),
            Geometry::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => cylinder(*radius_top, *radius_bottom, *height, (*radial_segments).max(3)),
            Geometry::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => torus(
                *radius,
                *tube,
                (*radial_segments).max(3),
                (*tubular_segments).max(3),
            ),
            Geometry::Cuboid {
                width,
                height,
                depth,
            } => cuboid(*width, *height, *depth),
            Geometry::Octahedron { radius } => octahedron(*radius),
            Geometry::Stroke { path, width, depth } => stroke(path, *width, *depth),
            Geometry::ScreenQuad => screen_quad(),
            Geometry::PointCloud { points } => MeshData::Points(points.clone()),
        }
    }
}

fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut mesh = MeshBuilder::default();
    let mut grid = Vec::with_capacity(height_segments as usize + 1);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let position = Vector3::new(
                -radius * (u * TAU).cos() * (v * PI).sin(),
                radius * (v * PI).cos(),
                radius * (u * TAU).sin() * (v * PI).sin(),
            );
            let normal = if position.magnitude2() > 0.0 {
                position.normalize()
            } else {
                Vector3::unit_y()
            };
            row.push(mesh.push(position, normal, [u, 1.0 - v]));
        }
        grid.push(row);
    }

    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh.finish()
}

fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> MeshData {
    let mut mesh = MeshBuilder::default();
    let half = height / 2.0;
    let slope = if height > 0.0 {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };

    // Side: a top ring and a bottom ring.
    let mut rings = [Vec::new(), Vec::new()];
    for (row, ring) in rings.iter_mut().enumerate() {
        let v = row as f32;
        let r = v * (radius_bottom - radius_top) + radius_top;
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let position = Vector3::new(r * sin, -v * height + half, r * cos);
            let normal = Vector3::new(sin, slope, cos).normalize();
            ring.push(mesh.push(position, normal, [u, 1.0 - v]));
        }
    }
    for x in 0..radial_segments as usize {
        let a = rings[0][x];
        let b = rings[1][x];
        let c = rings[1][x + 1];
        let d = rings[0][x + 1];
        mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    // Caps, skipped for cones that close to a point.
    for (top, r, y) in [(true, radius_top, half), (false, radius_bottom, -half)] {
        if r <= 0.0 {
            continue;
        }
        let normal = Vector3::new(0.0, if top { 1.0 } else { -1.0 }, 0.0);
        let center = mesh.push(Vector3::new(0.0, y, 0.0), normal, [0.5, 0.5]);
        let first = mesh.vertices.len() as u32;
        for x in 0..=radial_segments {
            let (sin, cos) = (x as f32 / radial_segments as f32 * TAU).sin_cos();
            mesh.push(
                Vector3::new(r * sin, y, r * cos),
                normal,
                [cos * 0.5 + 0.5, sin * 0.5 + 0.5],
            );
        }
        for x in 0..radial_segments {
            let i = first + x;
            if top {
                mesh.indices.extend_from_slice(&[i, i + 1, center]);
            } else {
                mesh.indices.extend_from_slice(&[i + 1, i, center]);
            }
        }
    }
    mesh.finish()
}

fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> MeshData {
    let mut mesh = MeshBuilder::default();

    for j in 0..=radial_segments {
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * TAU;
            let v = j as f32 / radial_segments as f32 * TAU;
            let position = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
            mesh.push(
                position,
                (position - center).normalize(),
                [
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ],
            );
        }
    }

    let stride = tubular_segments + 1;
    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh.finish()
}

fn cuboid(width: f32, height: f32, depth: f32) -> MeshData {
    let mut mesh = MeshBuilder::default();
    let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
    let axes = [
        Vector3::unit_x(),
        -Vector3::unit_x(),
        Vector3::unit_y(),
        -Vector3::unit_y(),
        Vector3::unit_z(),
        -Vector3::unit_z(),
    ];
    for normal in axes {
        // Two axes spanning the face.
        let u = if normal.x != 0.0 {
            Vector3::unit_z()
        } else {
            Vector3::unit_x()
        };
        let v = normal.cross(u);
        let corner = |su: f32, sv: f32| {
            let p = normal + u * su + v * sv;
            Vector3::new(p.x * half.x, p.y * half.y, p.z * half.z)
        };
        mesh.quad(
            [
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            ],
            normal,
        );
    }
    mesh.finish()
}

fn octahedron(radius: f32) -> MeshData {
    let mut mesh = MeshBuilder::default();
    for sx in [1.0f32, -1.0] {
        for sy in [1.0f32, -1.0] {
            for sz in [1.0f32, -1.0] {
                let a = Vector3::new(sx * radius, 0.0, 0.0);
                let mut b = Vector3::new(0.0, sy * radius, 0.0);
                let mut c = Vector3::new(0.0, 0.0, sz * radius);
                if sx * sy * sz < 0.0 {
                    std::mem::swap(&mut b, &mut c);
                }
                let normal = Vector3::new(sx, sy, sz).normalize();
                let i = mesh.push(a, normal, [0.0, 0.0]);
                mesh.push(b, normal, [1.0, 0.0]);
                mesh.push(c, normal, [0.5, 1.0]);
                mesh.indices.extend_from_slice(&[i, i + 1, i + 2]);
            }
        }
    }
    mesh.finish()
}

/// Sweeps every segment of `path` into a box. Segments are lengthened by half
/// the stroke width at both ends so consecutive boxes overlap at the joints.
fn stroke(path: &[[f32; 2]], width: f32, depth: f32) -> MeshData {
    let mut mesh = MeshBuilder::default();
    let half_width = width / 2.0;

    for segment in path.windows(2) {
        let p0 = Vector2::from(segment[0]);
        let p1 = Vector2::from(segment[1]);
        let along = p1 - p0;
        if along.magnitude2() <= f32::EPSILON {
            continue;
        }
        let dir = along.normalize();
        let side = Vector2::new(-dir.y, dir.x) * half_width;
        let start = p0 - dir * half_width;
        let end = p1 + dir * half_width;

        let ring = [start - side, end - side, end + side, start + side];
        let at = |p: Vector2<f32>, z: f32| Vector3::new(p.x, p.y, z);

        // Front and back caps.
        mesh.quad(ring.map(|p| at(p, depth)), Vector3::unit_z());
        mesh.quad(ring.map(|p| at(p, 0.0)), -Vector3::unit_z());
        // Walls.
        for k in 0..4 {
            let a = ring[k];
            let b = ring[(k + 1) % 4];
            let edge = (b - a).normalize();
            let mut outward = Vector3::new(edge.y, -edge.x, 0.0);
            let mid = (a + b) / 2.0;
            let center = (start + end) / 2.0;
            if (mid - center).dot(Vector2::new(outward.x, outward.y)) < 0.0 {
                outward = -outward;
            }
            mesh.quad([at(a, 0.0), at(b, 0.0), at(b, depth), at(a, depth)], outward);
        }
    }
    mesh.finish()
}

fn screen_quad() -> MeshData {
    let corner = |x: f32, y: f32| ModelVertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, 1.0],
        uv: [(x + 1.0) / 2.0, (y + 1.0) / 2.0],
    };
    MeshData::Indexed {
        vertices: vec![
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Flattens a path of cubic bezier segments into a polyline.
///
/// `start` is the pen position; each segment is `(control1, control2, end)`.
pub fn flatten_cubic(
    start: [f32; 2],
    segments: &[([f32; 2], [f32; 2], [f32; 2])],
    steps: u32,
) -> Vec<[f32; 2]> {
    let steps = steps.max(1);
    let mut points = vec![start];
    let mut pen = Vector2::from(start);
    for &(c1, c2, end) in segments {
        let (c1, c2, end) = (Vector2::from(c1), Vector2::from(c2), Vector2::from(end));
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            let mt = 1.0 - t;
            let p = pen * (mt * mt * mt)
                + c1 * (3.0 * mt * mt * t)
                + c2 * (3.0 * mt * t * t)
                + end * (t * t * t);
            points.push(p.into());
        }
        pen = end;
    }
    points
}

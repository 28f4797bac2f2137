//! Procedural scenes for the closed set of model kinds the site shows.
//!
//! Hierarchies and proportions are fixed per kind; [`StyleParams`] only
//! recolours and rescales them. The globe's point cloud is the one random
//! part, drawn from the caller's RNG so a seeded RNG rebuilds the same scene.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use cgmath::Deg;
use rand::Rng;

use crate::{
    camera::{Camera, Projection},
    data_structures::{
        geometry::{Geometry, flatten_cubic},
        scene_graph::{Light, Lights, Material, Scene, SceneObject, UniformValue, rgb},
        transform::Transform,
        vertex::PointVertex,
    },
    motion::{Motion, MotionConfig},
    pipelines::ProgramKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Globe,
    Trophy,
    MedalSilver,
    MedalBronze,
    GiftBox,
    BackgroundPlane,
}

impl ModelKind {
    /// Prize models respond to hover; the globe and background do not.
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            ModelKind::Trophy | ModelKind::MedalSilver | ModelKind::MedalBronze | ModelKind::GiftBox
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// `0xRRGGBB`, the neon green accent.
    pub primary: u32,
    /// `0xRRGGBB`, the purple accent.
    pub secondary: u32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: 0x00ffaa,
            secondary: 0x9900ff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleParams {
    pub palette: Palette,
    /// Multiplies the scale of every root object.
    pub scale: f32,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            scale: 1.0,
        }
    }
}

const GOLD: u32 = 0xd4af37;
const SILVER: u32 = 0xc0c0c0;
const BRONZE: u32 = 0xcd7f32;

const GLOBE_RADIUS: f32 = 2.0;
const POINT_RADIUS: f32 = 2.1;
/// Fresnel weight of the globe's edge glow.
const GLOBE_RIM: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBuilder {
    pub globe_points: usize,
    pub motion: MotionConfig,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self {
            globe_points: 100,
            motion: MotionConfig::default(),
        }
    }
}

/// Builds `kind` with the default point count and motion.
pub fn build<R: Rng>(kind: ModelKind, style: &StyleParams, rng: &mut R) -> Scene {
    SceneBuilder::default().build(kind, style, rng)
}

impl SceneBuilder {
    pub fn build<R: Rng>(&self, kind: ModelKind, style: &StyleParams, rng: &mut R) -> Scene {
        let objects = match kind {
            ModelKind::Globe => self.globe(style, rng),
            ModelKind::Trophy => vec![self.trophy()],
            ModelKind::MedalSilver => vec![self.silver_medal()],
            ModelKind::MedalBronze => vec![self.bronze_medal()],
            ModelKind::GiftBox => vec![self.gift_box(style)],
            ModelKind::BackgroundPlane => vec![SceneObject::mesh(
                "background",
                Geometry::ScreenQuad,
                Material::new(ProgramKind::Background),
            )],
        };

        let objects = objects
            .into_iter()
            .map(|mut root| {
                root.transform.scale *= style.scale;
                root
            })
            .collect();

        let lights = kind.is_interactive().then(|| prize_lights(style));

        let mut scene = Scene {
            camera: Camera::on_z(5.0),
            projection: Projection::new(1, 1, Deg(75.0), 0.1, 1000.0),
            objects,
            lights,
        };
        scene.update(0.0, false);
        scene
    }

    fn globe<R: Rng>(&self, style: &StyleParams, rng: &mut R) -> Vec<SceneObject> {
        let points = (0..self.globe_points)
            .map(|_| {
                let phi = rng.gen_range(0.0..TAU);
                let theta = rng.gen_range(0.0..PI);
                PointVertex {
                    position: [
                        POINT_RADIUS * theta.sin() * phi.cos(),
                        POINT_RADIUS * theta.sin() * phi.sin(),
                        POINT_RADIUS * theta.cos(),
                    ],
                    size: rng.gen_range(0.02..0.12),
                    color: [0.0, rng.gen_range(0.7..1.0), rng.gen_range(0.5..0.8)],
                }
            })
            .collect();

        let spin = Motion::spin(self.motion.globe_spin);
        let globe_material = Material {
            color: rgb(style.palette.primary),
            opacity: 0.5,
            ..Material::new(ProgramKind::Globe)
        }
        .with_override("rim", UniformValue::Float(GLOBE_RIM));
        vec![
            SceneObject::mesh(
                "globe",
                Geometry::Sphere {
                    radius: GLOBE_RADIUS,
                    width_segments: 64,
                    height_segments: 64,
                },
                globe_material,
            )
            .with_motion(spin.clone()),
            SceneObject::mesh(
                "points",
                Geometry::PointCloud { points },
                Material::new(ProgramKind::Points),
            )
            .with_motion(spin),
        ]
    }

    fn prize_spin(&self) -> Motion {
        let (idle, hovered) = self.motion.prize_spin;
        Motion::still().with_spin(idle, hovered)
    }

    fn trophy(&self) -> SceneObject {
        let gold = || Material::standard(GOLD, 1.0, 0.3);
        let part = |name: &str, top: f32, bottom: f32, height: f32, y: f32| {
            SceneObject::mesh(
                name,
                Geometry::Cylinder {
                    radius_top: top,
                    radius_bottom: bottom,
                    height,
                    radial_segments: 32,
                },
                gold(),
            )
            .with_transform(Transform::at(0.0, y, 0.0))
        };
        SceneObject::group("trophy")
            .with_motion(self.prize_spin())
            .with_child(part("base", 0.8, 1.0, 0.3, -1.5))
            .with_child(part("stem", 0.2, 0.2, 1.5, -0.5))
            .with_child(part("cup", 0.7, 0.2, 1.2, 0.6))
    }

    fn medal_ring(hex: u32, roughness: f32) -> SceneObject {
        SceneObject::mesh(
            "ring",
            Geometry::Torus {
                radius: 1.0,
                tube: 0.3,
                radial_segments: 16,
                tubular_segments: 100,
            },
            Material::standard(hex, 0.8, roughness),
        )
    }

    fn medal_motion(&self) -> Motion {
        let (idle, hovered) = self.motion.tilt;
        self.prize_spin().with_tilt(idle, hovered)
    }

    fn silver_medal(&self) -> SceneObject {
        SceneObject::group("medal")
            .with_motion(self.medal_motion())
            .with_child(Self::medal_ring(SILVER, 0.2))
            .with_child(SceneObject::mesh(
                "star",
                Geometry::Octahedron { radius: 0.7 },
                Material::standard(SILVER, 0.9, 0.1),
            ))
    }

    fn bronze_medal(&self) -> SceneObject {
        let three = flatten_cubic(
            [0.0, 1.0],
            &[
                ([0.5, 1.0], [0.5, 0.5], [0.5, 0.5]),
                ([0.5, 0.0], [0.0, 0.0], [0.0, 0.0]),
                ([0.5, 0.0], [0.5, -0.5], [0.5, -0.5]),
                ([0.5, -1.0], [0.0, -1.0], [0.0, -1.0]),
            ],
            12,
        );
        SceneObject::group("bronze")
            .with_motion(self.medal_motion())
            .with_child(Self::medal_ring(BRONZE, 0.3))
            .with_child(
                SceneObject::mesh(
                    "three",
                    Geometry::Stroke {
                        path: three,
                        width: 0.2,
                        depth: 0.2,
                    },
                    Material::standard(BRONZE, 0.9, 0.1),
                )
                .with_transform(Transform::at(0.0, 0.0, 0.3).with_scale(0.5)),
            )
    }

    fn gift_box(&self, style: &StyleParams) -> SceneObject {
        let ribbon = || Material::standard(style.palette.secondary, 0.3, 0.7);
        let bow = |name: &str, yaw: f32| {
            SceneObject::mesh(
                name,
                Geometry::Torus {
                    radius: 0.3,
                    tube: 0.1,
                    radial_segments: 16,
                    tubular_segments: 100,
                },
                ribbon(),
            )
            .with_transform(Transform::at(0.0, 1.0, 0.0).with_euler(FRAC_PI_2, yaw, 0.0))
        };
        let (idle, hovered) = self.motion.bob;
        SceneObject::group("gift")
            .with_motion(self.prize_spin().with_bob(idle, hovered))
            .with_child(SceneObject::mesh(
                "box",
                Geometry::Cuboid {
                    width: 1.5,
                    height: 1.5,
                    depth: 1.5,
                },
                Material::standard(style.palette.primary, 0.2, 0.8),
            ))
            .with_child(
                SceneObject::mesh(
                    "ribbon_x",
                    Geometry::Cuboid {
                        width: 1.6,
                        height: 0.3,
                        depth: 0.3,
                    },
                    ribbon(),
                )
                .with_transform(Transform::at(0.0, 0.75, 0.0)),
            )
            .with_child(
                SceneObject::mesh(
                    "ribbon_z",
                    Geometry::Cuboid {
                        width: 0.3,
                        height: 0.3,
                        depth: 1.6,
                    },
                    ribbon(),
                )
                .with_transform(Transform::at(0.0, 0.75, 0.0)),
            )
            .with_child(bow("bow_a", 0.0))
            .with_child(bow("bow_b", FRAC_PI_2))
    }
}

fn prize_lights(style: &StyleParams) -> Lights {
    let white = [1.0, 1.0, 1.0];
    let primary = rgb(style.palette.primary);
    Lights {
        ambient: Light {
            color: white,
            intensity: 0.5,
            position: [0.0, 0.0, 0.0],
            range: 0.0,
        },
        directional: Light {
            color: white,
            intensity: 1.0,
            position: [5.0, 5.0, 5.0],
            range: 0.0,
        },
        point: Light {
            color: [primary[0], primary[1], primary[2]],
            intensity: 2.0,
            position: [2.0, 2.0, 2.0],
            range: 10.0,
        },
    }
}

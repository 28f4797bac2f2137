//! Scene graph and hierarchical scene organization.
//!
//! A [`Scene`] owns a camera, lights and a forest of [`SceneObject`]s. Each
//! object has a local [`Transform`] (plus an optional time-driven [`Motion`]
//! layered on top); world transforms are composed parent → child on every
//! [`Scene::update`].

use crate::{
    camera::{Camera, Projection},
    data_structures::{geometry::Geometry, transform::Transform},
    motion::Motion,
    pipelines::ProgramKind,
};

/// A value written into a named uniform after the material's base values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec4([f32; 4]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub program: ProgramKind,
    pub color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub overrides: Vec<(String, UniformValue)>,
}

impl Material {
    pub fn new(program: ProgramKind) -> Self {
        Self {
            program,
            color: [1.0, 1.0, 1.0, 1.0],
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            overrides: Vec::new(),
        }
    }

    /// Standard lit material from a `0xRRGGBB` colour.
    pub fn standard(hex: u32, metalness: f32, roughness: f32) -> Self {
        Self {
            color: rgb(hex),
            metalness,
            roughness,
            ..Self::new(ProgramKind::Standard)
        }
    }

    pub fn with_override(mut self, name: &str, value: UniformValue) -> Self {
        self.overrides.push((name.to_string(), value));
        self
    }
}

/// `0xRRGGBB` to linear-ish RGBA floats.
pub fn rgb(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
    /// Distance at which a point light fades out; unused otherwise.
    pub range: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lights {
    pub ambient: Light,
    pub directional: Light,
    pub point: Light,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub geometry: Option<Geometry>,
    pub material: Option<Material>,
    pub transform: Transform,
    pub motion: Option<Motion>,
    pub children: Vec<SceneObject>,
    world: Transform,
}

impl SceneObject {
    /// An object without geometry that only groups its children.
    pub fn group(name: &str) -> Self {
        Self {
            name: name.to_string(),
            geometry: None,
            material: None,
            transform: Transform::new(),
            motion: None,
            children: Vec::new(),
            world: Transform::new(),
        }
    }

    pub fn mesh(name: &str, geometry: Geometry, material: Material) -> Self {
        Self {
            geometry: Some(geometry),
            material: Some(material),
            ..Self::group(name)
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn with_child(mut self, child: SceneObject) -> Self {
        self.children.push(child);
        self
    }

    /// World transform as of the last [`Scene::update`].
    pub fn world(&self) -> &Transform {
        &self.world
    }

    fn update(&mut self, parent: &Transform, t: f32, hovered: bool) {
        let local = match self.motion.as_mut() {
            Some(motion) => &self.transform * &motion.pose(t, hovered),
            None => self.transform,
        };
        self.world = parent * &local;
        let world = self.world;
        for child in &mut self.children {
            child.update(&world, t, hovered);
        }
    }

    fn visit<'a>(&'a self, out: &mut Vec<&'a SceneObject>) {
        out.push(self);
        for child in &self.children {
            child.visit(out);
        }
    }

    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub camera: Camera,
    pub projection: Projection,
    pub objects: Vec<SceneObject>,
    pub lights: Option<Lights>,
}

impl Scene {
    /// Re-evaluates motion at absolute time `t` and recomposes world transforms.
    pub fn update(&mut self, t: f32, hovered: bool) {
        let root = Transform::new();
        for object in &mut self.objects {
            object.update(&root, t, hovered);
        }
    }

    /// Every object, depth-first in declaration order.
    pub fn iter(&self) -> Vec<&SceneObject> {
        let mut out = Vec::new();
        for object in &self.objects {
            object.visit(&mut out);
        }
        out
    }

    /// Objects that carry geometry and a material, depth-first.
    pub fn drawables(&self) -> Vec<&SceneObject> {
        self.iter()
            .into_iter()
            .filter(|o| o.geometry.is_some() && o.material.is_some())
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find_map(|o| o.find(name))
    }

    /// Program kinds the scene draws with, without duplicates.
    pub fn programs(&self) -> Vec<ProgramKind> {
        let mut kinds: Vec<ProgramKind> = self
            .drawables()
            .iter()
            .filter_map(|o| o.material.as_ref().map(|m| m.program))
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

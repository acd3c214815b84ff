//! Scene types: entities, their components, and shared assets

use reflect_mcp::Handle;
use reflect_mcp::Reflect;

/// Point or direction in world space
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(namespace = "scene", default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Unit scale
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);
    /// World up
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self { Self { x, y, z } }

    /// Component-wise difference
    #[must_use]
    pub const fn minus(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn length(self) -> f32 { self.x.hypot(self.y).hypot(self.z) }
}

/// Linear RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(namespace = "scene", default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self { Self::WHITE }
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
}

/// How a light spreads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(namespace = "scene", default)]
pub enum LightKind {
    #[default]
    Point,
    Spot,
    Directional,
}

/// Named object in the scene; components hang off it
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(namespace = "scene", container, rename_all = "camelCase")]
pub struct GameObject {
    #[reflect(handle)]
    pub id:        Handle,
    pub name:      String,
    pub is_active: bool,
}

/// Position, orientation (Euler angles in degrees) and scale
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(namespace = "scene", base = "scene::Component", host_owned)]
pub struct Transform {
    #[reflect(handle)]
    pub id:       Handle,
    #[reflect(prop)]
    pub position: Vec3,
    #[reflect(prop)]
    pub rotation: Vec3,
    #[reflect(prop)]
    pub scale:    Vec3,
}

/// Light source
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(namespace = "scene", base = "scene::Component", host_owned)]
pub struct Light {
    #[reflect(handle)]
    pub id:        Handle,
    pub kind:      LightKind,
    pub color:     Color,
    pub intensity: f32,
    #[reflect(prop)]
    pub enabled:   bool,
}

/// Surface description shared by renderers
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(namespace = "scene", host_owned)]
pub struct Material {
    #[reflect(handle)]
    pub id:       Handle,
    pub name:     String,
    pub color:    Color,
    pub keywords: Vec<String>,
}

/// Draws a mesh with a material
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(namespace = "scene", base = "scene::Component", host_owned, rename_all = "camelCase")]
pub struct MeshRenderer {
    #[reflect(handle)]
    pub id:           Handle,
    pub mesh:         String,
    pub material:     Material,
    pub cast_shadows: bool,
}

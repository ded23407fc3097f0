//! Voxelization of world geometry and serialization of the results: the
//! polygon rasterizer, the face voxelizer, the palette generator, the
//! MagicaVoxel container writer and the Teardown scene writer.

use glam::{IVec3, UVec3, Vec3};

pub mod error;
pub mod group;
pub mod palette;
pub mod raster;
pub mod scene;
pub mod vox;
pub mod voxelize;

pub use error::VoxelError;
pub use group::{GroupPlan, plan_groups, voxelize_group};
pub use palette::{Palette, generate_palette};
pub use scene::write_teardown_level;
pub use vox::write_magicavoxel;
pub use voxelize::{FaceVoxels, voxelize_face};

/// Teardown uses 10 units per meter.
pub const TEARDOWN_SCALE: f32 = 0.1;
/// One Hammer unit is one inch.
pub const HAMMER_SCALE: f32 = 0.0254;

pub const HAMMER_TO_TEARDOWN: f32 = HAMMER_SCALE / TEARDOWN_SCALE;
pub const DECIMETER_TO_METER: f32 = 0.1;

/// The MagicaVoxel container limit on every model axis.
pub const MAX_MODEL_DIM: u32 = 256;

/// Teardown material classes, in palette slot-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MaterialType {
    Air = 0,
    Unphysical,
    HardMasonry,
    HardMetal,
    Plastic,
    HeavyMetal,
    WeakMetal,
    Plaster,
    Brick,
    Concrete,
    Wood,
    Rock,
    Dirt,
    Grass,
    Glass,
}

pub const MATERIAL_TYPE_MAX: usize = 15;

#[derive(Debug, Clone, Copy)]
pub struct Voxel {
    pub color: [u8; 3],
    pub material: MaterialType,
}

impl Default for Voxel {
    fn default() -> Self {
        Self {
            color: [0, 0, 0],
            material: MaterialType::Air,
        }
    }
}

/// A dense voxel grid, at most 256 cells on every axis.
///
/// Cells are laid out x-fastest: `index = x + y * size.x + z * size.x * size.y`.
#[derive(Debug, Clone)]
pub struct VoxelModel {
    pub name: String,
    pub size: UVec3,
    /// Instance translation inside the `.vox` scene.
    pub pos: IVec3,
    pub voxels: Vec<Voxel>,
}

impl VoxelModel {
    pub fn cell_index(&self, x: u32, y: u32, z: u32) -> usize {
        (z * self.size.x * self.size.y + y * self.size.x + x) as usize
    }
}

/// Scene placement of one written voxel model.
#[derive(Debug, Clone)]
pub struct Model {
    /// File stem of the `.vox` the scene refers to.
    pub name: String,
    pub pos: Vec3,
    /// Euler angles, degrees.
    pub rot: Vec3,
    pub size: UVec3,
}

#[derive(Debug, Clone)]
pub struct Light {
    pub pos: Vec3,
    pub color: [u8; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct Location {
    pub name: String,
    pub pos: Vec3,
}

#[derive(Debug, Clone)]
pub struct Npc {
    /// Prefab name under `MOD/characters/`.
    pub path_name: String,
    pub pos: Vec3,
    pub rot: Vec3,
}

#[derive(Debug, Clone)]
pub struct Trigger {
    pub map: String,
    pub landmark: String,
    /// Minimum corner, the writer recenters on x/z.
    pub pos: Vec3,
    pub size: Vec3,
}

#[derive(Debug, Clone)]
pub struct Environment {
    /// Skybox name, referenced as `MOD/<name>.dds`.
    pub skybox: String,
    pub brightness: f32,
    pub sun_color: Vec3,
    pub sun_dir: Vec3,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            skybox: "cloudy".to_string(),
            brightness: 0.5,
            sun_color: Vec3::ZERO,
            sun_dir: Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

/// Everything the scene writer needs for one level.
#[derive(Debug, Clone)]
pub struct LevelInfo {
    pub name: String,
    pub level_pos: Vec3,
    pub models: Vec<Model>,
    pub lights: Vec<Light>,
    pub locations: Vec<Location>,
    pub npcs: Vec<Npc>,
    pub triggers: Vec<Trigger>,
    pub spawn_pos: Vec3,
    pub spawn_rot: Vec3,
    pub environment: Environment,
}

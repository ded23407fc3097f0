//! On-disk record layouts of the fifteen BSP v30 lumps.
//!
//! Every type here mirrors the file layout byte for byte so that a lump can
//! be viewed as a `&[T]` straight out of the memory map.

use bytemuck_derive::{Pod, Zeroable};
use glam::Vec3;

use crate::error::BspError;

pub const BSP_VERSION: i32 = 30;

pub const LUMP_ENTITIES: usize = 0;
pub const LUMP_PLANES: usize = 1;
pub const LUMP_TEXTURES: usize = 2;
pub const LUMP_VERTICES: usize = 3;
pub const LUMP_VISIBILITY: usize = 4;
pub const LUMP_NODES: usize = 5;
pub const LUMP_TEXINFO: usize = 6;
pub const LUMP_FACES: usize = 7;
pub const LUMP_LIGHTING: usize = 8;
pub const LUMP_CLIPNODES: usize = 9;
pub const LUMP_LEAVES: usize = 10;
pub const LUMP_MARKSURFACES: usize = 11;
pub const LUMP_EDGES: usize = 12;
pub const LUMP_SURFEDGES: usize = 13;
pub const LUMP_MODELS: usize = 14;
pub const LUMP_MAX: usize = 15;

pub const LUMP_NAMES: [&str; LUMP_MAX] = [
    "LUMP_ENTITIES",
    "LUMP_PLANES",
    "LUMP_TEXTURES",
    "LUMP_VERTICES",
    "LUMP_VISIBILITY",
    "LUMP_NODES",
    "LUMP_TEXINFO",
    "LUMP_FACES",
    "LUMP_LIGHTING",
    "LUMP_CLIPNODES",
    "LUMP_LEAVES",
    "LUMP_MARKSURFACES",
    "LUMP_EDGES",
    "LUMP_SURFEDGES",
    "LUMP_MODELS",
];

pub const MAX_MAP_HULLS: usize = 32;
pub const MAX_TEXTURE_NAME: usize = 16;
pub const MIP_LEVELS: usize = 4;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LumpEntry {
    pub offset: i32,
    pub length: i32,
}

/// Dominant-axis classification of a plane, straight from the plane lump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneAxis {
    X = 0,
    Y = 1,
    Z = 2,
    AnyX = 3,
    AnyY = 4,
    AnyZ = 5,
}

impl TryFrom<i32> for PlaneAxis {
    type Error = BspError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::X),
            1 => Ok(Self::Y),
            2 => Ok(Self::Z),
            3 => Ok(Self::AnyX),
            4 => Ok(Self::AnyY),
            5 => Ok(Self::AnyZ),
            _ => Err(BspError::UnknownPlaneType { value }),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Plane {
    pub normal: [f32; 3],
    pub distance: f32,
    pub type_: i32,
}

impl Plane {
    pub fn axis(&self) -> Result<PlaneAxis, BspError> {
        PlaneAxis::try_from(self.type_)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex(pub [f32; 3]);

impl Vertex {
    pub fn to_vec3(self) -> Vec3 {
        Vec3::from_array(self.0)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Node {
    pub plane: u32,
    pub children: [i16; 2],
    pub mins: [i16; 3],
    pub maxs: [i16; 3],
    pub first_face: u16,
    pub face_count: u16,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TexInfo {
    pub s: [f32; 3],
    pub s_shift: f32,
    pub t: [f32; 3],
    pub t_shift: f32,
    pub mip_texture: u32,
    pub flags: u32,
}

impl TexInfo {
    pub const FLAG_FULLBRIGHT: u32 = 0x1;
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Face {
    pub plane: u16,
    pub side: u16,
    pub first_edge: u32,
    pub edge_count: u16,
    pub texinfo: u16,
    pub styles: [u8; 4],
    pub lightmap_offset: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ClipNode {
    pub plane: i32,
    pub children: [i16; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Leaf {
    pub contents: i32,
    pub visibility_offset: i32,
    pub mins: [i16; 3],
    pub maxs: [i16; 3],
    pub first_mark_surface: u32,
    pub mark_surface_count: u32,
    pub ambient_sound_levels: [u16; 4],
}

pub type MarkSurface = u16;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Edge {
    pub vertices: [u16; 2],
}

pub type SurfEdge = i32;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Model {
    pub mins: [f32; 3],
    pub maxs: [f32; 3],
    pub origin: [f32; 3],
    pub head_nodes: [i32; MAX_MAP_HULLS],
    pub vis_leaves: i32,
    pub first_face: i32,
    pub face_count: i32,
}

/// The fixed-size head of a variable-size mip texture record.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MipTexHeader {
    pub name: [u8; MAX_TEXTURE_NAME],
    pub width: u32,
    pub height: u32,
    pub mip_offsets: [u32; MIP_LEVELS],
}

impl MipTexHeader {
    pub const SIZE: usize = size_of::<Self>();

    pub fn name(&self) -> String {
        let len = self
            .name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(MAX_TEXTURE_NAME);

        String::from_utf8_lossy(&self.name[..len]).into_owned()
    }

    /// All four mip offsets zero means the texture body lives in a WAD and
    /// has to be resolved by name.
    pub fn is_external(&self) -> bool {
        self.mip_offsets.iter().fold(u32::MAX, |acc, &o| acc & o) == 0
    }
}

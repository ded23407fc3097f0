//! Face reconstruction: walking the surfedge list of a model's faces into
//! world-space polygons.

use glam::Vec3;
use tracing::warn;

use crate::{
    Bsp,
    error::BspError,
    lumps::{
        Edge, Face, LUMP_EDGES, LUMP_FACES, LUMP_MODELS, LUMP_NAMES, LUMP_PLANES, LUMP_SURFEDGES,
        LUMP_TEXINFO, LUMP_VERTICES, Plane, PlaneAxis, SurfEdge, TexInfo, Vertex,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexAxis {
    pub axis: Vec3,
    pub shift: f32,
}

/// A reconstructed world face: an ordered convex polygon on its plane,
/// together with everything the voxelizer needs to know about it.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub vertices: Vec<Vec3>,
    pub axis: PlaneAxis,
    pub s: TexAxis,
    pub t: TexAxis,
    pub texture_id: u32,
    pub normal: Vec3,
}

struct Lumps<'a> {
    planes: &'a [Plane],
    texinfos: &'a [TexInfo],
    vertices: &'a [Vertex],
    edges: &'a [Edge],
    surf_edges: &'a [SurfEdge],
}

impl Bsp {
    /// Reconstructs the faces of one model, in face-lump order.
    ///
    /// An out-of-range index inside a single face only drops that face with a
    /// warning; a face range that leaves the face lump is fatal.
    pub fn model_faces(&self, model_id: u32) -> Result<Vec<Polygon>, BspError> {
        let models = self.models()?;
        let model = models
            .get(model_id as usize)
            .ok_or(BspError::IndexOutOfRange {
                lump: LUMP_NAMES[LUMP_MODELS],
                index: model_id as usize,
            })?;

        let faces = self.faces()?;
        let first = model.first_face as usize;
        let count = model.face_count as usize;
        let face_range =
            faces
                .get(first..first.saturating_add(count))
                .ok_or(BspError::IndexOutOfRange {
                    lump: LUMP_NAMES[LUMP_FACES],
                    index: first + count,
                })?;

        let lumps = Lumps {
            planes: self.planes()?,
            texinfos: self.texinfos()?,
            vertices: self.vertices()?,
            edges: self.edges()?,
            surf_edges: self.surf_edges()?,
        };

        let mut polygons = Vec::with_capacity(count);

        for (i, face) in face_range.iter().enumerate() {
            match reconstruct_face(face, &lumps) {
                Ok(polygon) => polygons.push(polygon),
                Err(e) => warn!("skipping face {}: {e}", first + i),
            }
        }

        Ok(polygons)
    }
}

fn reconstruct_face(face: &Face, lumps: &Lumps) -> Result<Polygon, BspError> {
    let plane = lumps
        .planes
        .get(face.plane as usize)
        .ok_or(BspError::IndexOutOfRange {
            lump: LUMP_NAMES[LUMP_PLANES],
            index: face.plane as usize,
        })?;

    let texinfo = lumps
        .texinfos
        .get(face.texinfo as usize)
        .ok_or(BspError::IndexOutOfRange {
            lump: LUMP_NAMES[LUMP_TEXINFO],
            index: face.texinfo as usize,
        })?;

    let first_edge = face.first_edge as usize;
    let surf_edges = lumps
        .surf_edges
        .get(first_edge..first_edge.saturating_add(face.edge_count as usize))
        .ok_or(BspError::IndexOutOfRange {
            lump: LUMP_NAMES[LUMP_SURFEDGES],
            index: first_edge + face.edge_count as usize,
        })?;

    let mut vertices = Vec::with_capacity(surf_edges.len());

    for &surf_edge in surf_edges {
        let edge = lumps
            .edges
            .get(surf_edge.unsigned_abs() as usize)
            .ok_or(BspError::IndexOutOfRange {
                lump: LUMP_NAMES[LUMP_EDGES],
                index: surf_edge.unsigned_abs() as usize,
            })?;

        // a negative surfedge walks the edge backwards
        let vertex_index = if surf_edge < 0 {
            edge.vertices[0]
        } else {
            edge.vertices[1]
        };

        let vertex =
            lumps
                .vertices
                .get(vertex_index as usize)
                .ok_or(BspError::IndexOutOfRange {
                    lump: LUMP_NAMES[LUMP_VERTICES],
                    index: vertex_index as usize,
                })?;

        vertices.push(vertex.to_vec3());
    }

    if vertices.len() < 3 {
        return Err(BspError::DegenerateFace {
            vertex_count: vertices.len(),
        });
    }

    Ok(Polygon {
        vertices,
        axis: plane.axis()?,
        s: TexAxis {
            axis: texinfo.s.into(),
            shift: texinfo.s_shift,
        },
        t: TexAxis {
            axis: texinfo.t.into(),
            shift: texinfo.t_shift,
        },
        texture_id: texinfo.mip_texture,
        normal: plane.normal.into(),
    })
}

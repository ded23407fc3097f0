//! Fusing many small faces into shared voxel volumes.
//!
//! Walking the faces in source order, a face joins the current group unless
//! the fused bounds would grow past 250 units on an axis, or the face uses a
//! different texture than the group and the group is no longer tiny. Groups
//! carry no rotation: member shells are replayed into a world-aligned grid.

use bsp::{PlaneAxis, Polygon, Texture};
use glam::{IVec3, UVec3, Vec2, Vec3};
use tracing::warn;

use crate::{
    DECIMETER_TO_METER, MAX_MODEL_DIM, MaterialType, Model, Voxel, VoxelModel,
    error::VoxelError,
    raster::{GridInfo, Rasterizer, Varying},
    voxelize::{FaceVoxels, bilinear_sample, convert_coordinates, face_uvs, project_face},
};

/// Fused bounds may not exceed this many cells on any axis.
const GROUP_SPLIT_SIZE: f32 = 250.0;
/// Groups smaller than this on any axis still accept texture changes.
const GROUP_SMALL_SIZE: f32 = 20.0;

#[derive(Debug, Clone)]
pub struct GroupPlan {
    /// Texture of the face that started the group; splits key on this, not
    /// on the previous face.
    pub texture_id: u32,
    pub min: Vec3,
    pub max: Vec3,
    /// Indices into the caller's polygon list, in source order.
    pub faces: Vec<usize>,
}

/// Cell-aligned bounds of one face in Teardown decimeters.
fn face_bounds(polygon: &Polygon) -> (Vec3, Vec3) {
    let points = convert_coordinates(&polygon.vertices);

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(-f32::MAX);
    for point in points {
        min = min.min(point.floor());
        max = max.max(point.ceil());
    }

    (min, max)
}

pub fn plan_groups<'a>(faces: impl IntoIterator<Item = (usize, &'a Polygon)>) -> Vec<GroupPlan> {
    let mut groups: Vec<GroupPlan> = vec![];

    for (index, polygon) in faces {
        let (face_min, face_max) = face_bounds(polygon);

        let Some(group) = groups.last_mut() else {
            groups.push(GroupPlan {
                texture_id: polygon.texture_id,
                min: face_min,
                max: face_max,
                faces: vec![index],
            });
            continue;
        };

        let fused_min = group.min.min(face_min);
        let fused_max = group.max.max(face_max);

        let fused_too_big = (fused_max - fused_min)
            .cmpgt(Vec3::splat(GROUP_SPLIT_SIZE))
            .any();
        let texture_changed = polygon.texture_id != group.texture_id;
        let group_very_small = (group.max - group.min)
            .cmplt(Vec3::splat(GROUP_SMALL_SIZE))
            .any();

        if fused_too_big || (texture_changed && !group_very_small) {
            groups.push(GroupPlan {
                texture_id: polygon.texture_id,
                min: face_min,
                max: face_max,
                faces: vec![index],
            });
        } else {
            group.min = fused_min;
            group.max = fused_max;
            group.faces.push(index);
        }
    }

    groups
}

/// Raster-plane axis indices in un-swizzled space: (u, v, depth).
fn projection_axes(axis: PlaneAxis) -> (usize, usize, usize) {
    match axis {
        PlaneAxis::X | PlaneAxis::AnyX => (1, 2, 0),
        PlaneAxis::Y | PlaneAxis::AnyY => (2, 0, 1),
        PlaneAxis::Z | PlaneAxis::AnyZ => (0, 1, 2),
    }
}

/// Replays every member face's voxel shell into one world-aligned grid.
pub fn voxelize_group<'a>(
    plan: &GroupPlan,
    polygons: &[Polygon],
    texture_of: impl Fn(u32) -> Option<&'a Texture>,
    group_index: usize,
) -> Result<FaceVoxels, VoxelError> {
    // a flat group still holds a one-cell-thick shell
    let extent = (plan.max - plan.min).max(Vec3::ONE);
    let size = UVec3::new(extent.x as u32, extent.y as u32, extent.z as u32);

    if size.cmpgt(UVec3::splat(MAX_MODEL_DIM)).any() {
        return Err(VoxelError::TooLarge {
            width: size.x,
            height: size.y,
            depth: size.z,
        });
    }

    let mut grid = VoxelModel {
        name: group_index.to_string(),
        size,
        pos: IVec3::ZERO,
        voxels: vec![Voxel::default(); (size.x * size.y * size.z) as usize],
    };
    let grid_min = plan.min.as_ivec3();
    let mut wrote_any = false;

    for &face_index in &plan.faces {
        let polygon = &polygons[face_index];
        let Some(texture) = texture_of(polygon.texture_id) else {
            warn!("group {group_index}: face {face_index} has no texture, skipping");
            continue;
        };

        if let Err(e) = replay_face(polygon, texture, &mut grid, grid_min, &mut wrote_any) {
            warn!("group {group_index}: skipping face {face_index}: {e}");
        }
    }

    if !wrote_any {
        return Err(VoxelError::NoVoxels);
    }

    let placement = Model {
        name: group_index.to_string(),
        pos: (plan.min + Vec3::splat(0.5)) * DECIMETER_TO_METER,
        rot: Vec3::ZERO,
        size,
    };

    Ok(FaceVoxels { grid, placement })
}

fn replay_face(
    polygon: &Polygon,
    texture: &Texture,
    grid: &mut VoxelModel,
    grid_min: IVec3,
    wrote_any: &mut bool,
) -> Result<(), VoxelError> {
    let points = convert_coordinates(&polygon.vertices);
    let (flat, depths) = project_face(&points, polygon.axis);
    let uvs = face_uvs(polygon);

    let mut flat_min = Vec2::splat(f32::MAX);
    let mut flat_max = Vec2::splat(-f32::MAX);
    for point in &flat {
        flat_min = flat_min.min(*point);
        flat_max = flat_max.max(*point);
    }

    let width = (flat_max.x.ceil() - flat_min.x.floor()) as u32;
    let height = (flat_max.y.ceil() - flat_min.y.floor()) as u32;
    if width == 0 || height == 0 {
        return Err(VoxelError::TooSmall {
            width,
            height,
            depth: 1,
        });
    }

    let grid_info = GridInfo {
        width,
        height,
        origin: Vec2::new(flat_min.x.floor(), flat_min.y.floor()),
    };

    let mut rasterizer = Rasterizer::new(grid_info);
    let depth_varying = rasterizer.add_varying(Varying::depth(depths, &grid_info));
    let uv_varying = rasterizer.add_varying(Varying::uv(uvs, &grid_info));

    rasterizer.rasterize(&flat)?;

    let depth_grid = rasterizer.varying(depth_varying).depth_grid();
    let uv_grid = rasterizer.varying(uv_varying).uv_grid();

    let (u_axis, v_axis, d_axis) = projection_axes(polygon.axis);
    let column_base = grid_info.origin.x as i32;
    // rows are anchored at the rounded minimum, not the grid origin
    let row_base = flat_min.y.round() as i32;

    for y in 0..height {
        for x in 0..width {
            let source = (y * width + x) as usize;

            let depth_value = depth_grid[source];
            if !depth_value.is_finite() {
                continue;
            }

            let color = bilinear_sample(uv_grid[source], texture);

            let bottom = depth_value.floor() as i32;
            let top = (depth_value + 0.5).floor() as i32;

            for depth_cell in [bottom, top] {
                // assemble the un-swizzled cell, then swizzle back into
                // Teardown axis order
                let mut cell = [0i32; 3];
                cell[u_axis] = column_base + x as i32;
                cell[v_axis] = row_base + y as i32;
                cell[d_axis] = depth_cell;

                let teardown = IVec3::new(cell[0], cell[2], cell[1]) - grid_min;
                if teardown.cmplt(IVec3::ZERO).any()
                    || teardown.as_uvec3().cmpge(grid.size).any()
                {
                    continue;
                }

                let index =
                    grid.cell_index(teardown.x as u32, teardown.y as u32, teardown.z as u32);
                grid.voxels[index] = Voxel {
                    color,
                    material: MaterialType::WeakMetal,
                };
                *wrote_any = true;
            }
        }
    }

    Ok(())
}

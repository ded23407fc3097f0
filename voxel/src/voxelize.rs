//! Turning one textured world face into a thin voxel shell.
//!
//! The face is converted from Hammer units into Teardown decimeters,
//! projected along its plane's dominant axis, scan-converted with depth and
//! UV varyings, and written out as two voxels per covered pixel so the shell
//! stays watertight even when the plane is almost axis-aligned.

use bsp::{PlaneAxis, Polygon, Texture};
use glam::{IVec3, UVec3, Vec2, Vec3};

use crate::{
    DECIMETER_TO_METER, HAMMER_TO_TEARDOWN, MAX_MODEL_DIM, MaterialType, Model, Voxel, VoxelModel,
    error::VoxelError,
    raster::{GridInfo, Rasterizer, Varying},
};

/// One voxelized face: the dense grid for the `.vox` writer and the
/// placement the scene file refers to it by.
#[derive(Debug, Clone)]
pub struct FaceVoxels {
    pub grid: VoxelModel,
    pub placement: Model,
}

/// Hammer units to Teardown decimeters.
///
/// GoldSrc is z-up right-handed, Teardown is y-up left-handed: swap y and z,
/// then negate the new z to flip handedness.
pub fn convert_coordinates(points: &[Vec3]) -> Vec<Vec3> {
    points
        .iter()
        .map(|&point| {
            let point = point * HAMMER_TO_TEARDOWN;

            Vec3::new(point.x, point.z, -point.y)
        })
        .collect()
}

/// Projects converted points onto the raster plane picked by the dominant
/// axis, returning the flat polygon and the per-vertex depth.
pub(crate) fn project_face(points: &[Vec3], axis: PlaneAxis) -> (Vec<Vec2>, Vec<f32>) {
    points
        .iter()
        .map(|&point| {
            // un-swizzle so that the axis tag still refers to BSP axes
            let v = Vec3::new(point.x, point.z, point.y);

            match axis {
                PlaneAxis::X | PlaneAxis::AnyX => (Vec2::new(v.y, v.z), v.x),
                PlaneAxis::Y | PlaneAxis::AnyY => (Vec2::new(v.z, v.x), v.y),
                PlaneAxis::Z | PlaneAxis::AnyZ => (Vec2::new(v.x, v.y), v.z),
            }
        })
        .unzip()
}

/// Texture coordinates in texel units, from the original Hammer-space
/// vertices.
pub(crate) fn face_uvs(polygon: &Polygon) -> Vec<Vec2> {
    polygon
        .vertices
        .iter()
        .map(|&vertex| {
            Vec2::new(
                polygon.s.axis.dot(vertex) + polygon.s.shift,
                polygon.t.axis.dot(vertex) + polygon.t.shift,
            )
        })
        .collect()
}

/// Bilinear sample with the UV tiled over the texture extent.
pub(crate) fn bilinear_sample(uv: Vec2, texture: &Texture) -> [u8; 3] {
    let size = Vec2::new(texture.width as f32, texture.height as f32);

    let scaled = Vec2::new(uv.x.rem_euclid(size.x), uv.y.rem_euclid(size.y));
    let sub = Vec2::new(scaled.x.fract(), scaled.y.fract());

    let mut x0 = scaled.x.floor() as u32;
    let mut y0 = scaled.y.floor() as u32;
    if x0 > texture.width - 1 {
        x0 = 0;
    }
    if y0 > texture.height - 1 {
        y0 = 0;
    }

    let mut x1 = x0 + 1;
    let mut y1 = y0 + 1;
    if x1 > texture.width - 1 {
        x1 = 0;
    }
    if y1 > texture.height - 1 {
        y1 = 0;
    }

    let texel = |x: u32, y: u32| {
        let [r, g, b] = texture.pixel(x, y);
        Vec3::new(r as f32, g as f32, b as f32)
    };

    let bottom = texel(x0, y0).lerp(texel(x1, y0), sub.x);
    let top = texel(x0, y1).lerp(texel(x1, y1), sub.x);
    let color = bottom.lerp(top, sub.y).clamp(Vec3::ZERO, Vec3::splat(255.0));

    [color.x as u8, color.y as u8, color.z as u8]
}

pub(crate) fn model_rotation(axis: PlaneAxis) -> Vec3 {
    match axis {
        PlaneAxis::X | PlaneAxis::AnyX => Vec3::new(-90.0, -90.0, 0.0),
        PlaneAxis::Y | PlaneAxis::AnyY => Vec3::new(0.0, 90.0, 90.0),
        PlaneAxis::Z | PlaneAxis::AnyZ => Vec3::ZERO,
    }
}

pub fn voxelize_face(
    polygon: &Polygon,
    texture: &Texture,
    face_index: u32,
) -> Result<FaceVoxels, VoxelError> {
    let points = convert_coordinates(&polygon.vertices);
    let (flat, depths) = project_face(&points, polygon.axis);
    let uvs = face_uvs(polygon);

    let mut projected_min = Vec3::splat(f32::MAX);
    let mut projected_max = Vec3::splat(-f32::MAX);
    for (point, &depth) in flat.iter().zip(&depths) {
        projected_min = projected_min.min(Vec3::new(point.x, point.y, depth));
        projected_max = projected_max.max(Vec3::new(point.x, point.y, depth));
    }

    let mut world_min = Vec3::splat(f32::MAX);
    for &point in &points {
        world_min = world_min.min(point);
    }

    let width = (projected_max.x.ceil() - projected_min.x.floor()) as u32;
    let height = (projected_max.y.ceil() - projected_min.y.floor()) as u32;
    let depth_cells = (projected_max.z.ceil() - projected_min.z.floor() + 1.0) as u32;

    if width > MAX_MODEL_DIM || height > MAX_MODEL_DIM || depth_cells > MAX_MODEL_DIM {
        return Err(VoxelError::TooLarge {
            width,
            height,
            depth: depth_cells,
        });
    }
    if width == 0 || height == 0 || depth_cells == 0 {
        return Err(VoxelError::TooSmall {
            width,
            height,
            depth: depth_cells,
        });
    }

    let grid_info = GridInfo {
        width,
        height,
        origin: Vec2::new(projected_min.x.floor(), projected_min.y.floor()),
    };

    let mut rasterizer = Rasterizer::new(grid_info);
    let depth_varying = rasterizer.add_varying(Varying::depth(depths, &grid_info));
    let uv_varying = rasterizer.add_varying(Varying::uv(uvs, &grid_info));

    rasterizer.rasterize(&flat)?;

    let depth_grid = rasterizer.varying(depth_varying).depth_grid();
    let uv_grid = rasterizer.varying(uv_varying).uv_grid();

    // tight crop around the cells the face actually covered
    let mut crop_min = UVec3::MAX;
    let mut crop_max = UVec3::ZERO;
    for y in 0..height {
        for x in 0..width {
            let depth_value = depth_grid[(y * width + x) as usize] - projected_min.z;
            if depth_value < 0.0 || depth_value > depth_cells as f32 {
                continue;
            }

            crop_min = crop_min.min(UVec3::new(x, y, depth_value.floor() as u32));
            crop_max = crop_max.max(UVec3::new(
                x + 1,
                y + 1,
                depth_value.ceil() as u32 + 1,
            ));
        }
    }

    if crop_min == UVec3::MAX {
        return Err(VoxelError::NoVoxels);
    }

    let size = crop_max - crop_min;
    let mut grid = VoxelModel {
        name: face_index.to_string(),
        size,
        pos: IVec3::ZERO,
        voxels: vec![Voxel::default(); (size.x * size.y * size.z) as usize],
    };

    for y in 0..size.y {
        for x in 0..size.x {
            let source = ((y + crop_min.y) * width + x + crop_min.x) as usize;

            let depth_value = depth_grid[source] - projected_min.z;
            if depth_value < 0.0 || depth_value > depth_cells as f32 {
                continue;
            }

            let color = bilinear_sample(uv_grid[source], texture);

            // two writes along the depth axis keep the shell watertight on
            // nearly axis-aligned planes; they may land on the same cell
            let bottom = depth_value.floor() as u32 - crop_min.z;
            let top = (depth_value + 0.5).floor() as u32 - crop_min.z;

            for z in [bottom, top] {
                let index = grid.cell_index(x, y, z);
                grid.voxels[index] = Voxel {
                    color,
                    material: MaterialType::WeakMetal,
                };
            }
        }
    }

    let placement = Model {
        name: face_index.to_string(),
        pos: (world_min.round() + Vec3::splat(0.5)) * DECIMETER_TO_METER,
        rot: model_rotation(polygon.axis),
        size: UVec3::new(size.x, size.z, size.y),
    };

    Ok(FaceVoxels { grid, placement })
}

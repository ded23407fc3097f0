//! The 256-entry palette, partitioned into fixed per-material slot ranges.
//!
//! Every material class clusters its unique voxel colors with k-means in the
//! Oklab space, one cluster per palette slot. Classes are data-disjoint and
//! cluster in parallel; determinism comes from deriving one RNG seed per
//! class from the caller's seed.

use std::collections::HashMap;

use glam::Vec3;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;

use crate::{MATERIAL_TYPE_MAX, MaterialType, VoxelModel};

#[derive(Debug, Clone, Copy)]
pub struct MaterialSlot {
    pub count: u32,
    pub offset: u32,
}

/// Slot ranges per material class, non-overlapping by construction.
pub const MATERIAL_SLOTS: [MaterialSlot; MATERIAL_TYPE_MAX] = [
    MaterialSlot { count: 0, offset: 0 },    // Air
    MaterialSlot { count: 16, offset: 224 }, // Unphysical
    MaterialSlot { count: 8, offset: 176 },  // HardMasonry
    MaterialSlot { count: 8, offset: 168 },  // HardMetal
    MaterialSlot { count: 16, offset: 152 }, // Plastic
    MaterialSlot { count: 16, offset: 136 }, // HeavyMetal
    MaterialSlot { count: 16, offset: 120 }, // WeakMetal
    MaterialSlot { count: 16, offset: 104 }, // Plaster
    MaterialSlot { count: 16, offset: 88 },  // Brick
    MaterialSlot { count: 16, offset: 72 },  // Concrete
    MaterialSlot { count: 16, offset: 56 },  // Wood
    MaterialSlot { count: 16, offset: 40 },  // Rock
    MaterialSlot { count: 16, offset: 24 },  // Dirt
    MaterialSlot { count: 16, offset: 8 },   // Grass
    MaterialSlot { count: 8, offset: 0 },    // Glass
];

impl MaterialType {
    pub fn slot(self) -> MaterialSlot {
        MATERIAL_SLOTS[self as usize]
    }
}

/// RGBA, exactly 256 entries.
pub type Palette = [[u8; 4]; 256];

pub(crate) fn rgb_to_oklab(color: [u8; 3]) -> Vec3 {
    let r = color[0] as f32 / 255.0;
    let g = color[1] as f32 / 255.0;
    let b = color[2] as f32 / 255.0;

    let x = 0.4124564 * r + 0.3575761 * g + 0.1804375 * b;
    let y = 0.2126729 * r + 0.7151522 * g + 0.0721750 * b;
    let z = 0.0193339 * r + 0.1191920 * g + 0.9503041 * b;

    // D65 white point
    let x = x / 0.95047;
    let z = z / 1.08883;

    Vec3::new(
        0.210454 * x + 0.793617 * y - 0.004072 * z,
        1.977665 * x - 0.510530 * y - 0.447580 * z,
        0.025334 * x + 0.338572 * y - 0.602190 * z,
    )
}

pub(crate) fn oklab_to_rgb(lab: Vec3) -> Vec3 {
    let x = 0.44562442079 * lab.x + 0.46266924383 * lab.y - 0.34689397498 * lab.z;
    let y = 1.14528157354 * lab.x - 0.12294697715 * lab.y + 0.08363642948 * lab.z;
    let z = 0.66266414585 * lab.x - 0.04966064087 * lab.y - 1.62817592248 * lab.z;

    let x = x * 0.95047;
    let z = z * 1.08883;

    let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

    Vec3::new(r, g, b) * 255.0
}

/// Plain Lloyd iteration, at most `max_iterations` rounds.
///
/// Centroids are seeded from a shuffle of the points; a cluster that runs
/// empty is reseeded from a random point. With `n <= k` every point becomes
/// its own centroid.
pub(crate) fn kmeans(
    points: &[Vec3],
    k: usize,
    rng: &mut StdRng,
    max_iterations: usize,
) -> (Vec<usize>, Vec<Vec3>) {
    let n = points.len();

    if n <= k {
        let mut centroids = vec![Vec3::ZERO; k];
        centroids[..n].copy_from_slice(points);

        return ((0..n).collect(), centroids);
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut centroids: Vec<Vec3> = order[..k].iter().map(|&i| points[i]).collect();
    let mut assignments = vec![0usize; n];

    let mut changed = true;
    let mut iterations = 0;

    while changed && iterations < max_iterations {
        changed = false;
        iterations += 1;

        for (i, point) in points.iter().enumerate() {
            let mut best = 0;
            let mut best_distance = f32::MAX;

            for (j, centroid) in centroids.iter().enumerate() {
                let distance = point.distance_squared(*centroid);
                if distance < best_distance {
                    best_distance = distance;
                    best = j;
                }
            }

            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }

        let mut sums = vec![Vec3::ZERO; k];
        let mut counts = vec![0usize; k];
        for (i, point) in points.iter().enumerate() {
            sums[assignments[i]] += *point;
            counts[assignments[i]] += 1;
        }

        for j in 0..k {
            centroids[j] = if counts[j] > 0 {
                sums[j] / counts[j] as f32
            } else {
                points[rng.gen_range(0..n)]
            };
        }
    }

    (assignments, centroids)
}

fn pack_rgb(color: [u8; 3]) -> u32 {
    (color[0] as u32) << 16 | (color[1] as u32) << 8 | color[2] as u32
}

#[derive(Default)]
struct MaterialBucket {
    color_to_index: HashMap<u32, usize>,
    unique_colors: Vec<[u8; 3]>,
    /// (model index, voxel index) of every voxel in this class.
    voxel_refs: Vec<(usize, usize)>,
    /// Unique-color index per entry of `voxel_refs`.
    voxel_color_indices: Vec<usize>,
}

/// Builds the shared palette and the per-model 8-bit index grids.
///
/// Voxels keep their model/cell order; every index lands inside its
/// material's slot range. Air stays index 0.
pub fn generate_palette(models: &[VoxelModel], seed: u64) -> (Palette, Vec<Vec<u8>>) {
    let mut buckets: [MaterialBucket; MATERIAL_TYPE_MAX] = Default::default();

    for (model_index, model) in models.iter().enumerate() {
        for (voxel_index, voxel) in model.voxels.iter().enumerate() {
            if voxel.material == MaterialType::Air {
                continue;
            }

            let bucket = &mut buckets[voxel.material as usize];

            bucket.voxel_refs.push((model_index, voxel_index));

            let packed = pack_rgb(voxel.color);
            let color_index = match bucket.color_to_index.get(&packed) {
                Some(&index) => index,
                None => {
                    let index = bucket.unique_colors.len();
                    bucket.unique_colors.push(voxel.color);
                    bucket.color_to_index.insert(packed, index);
                    index
                }
            };

            bucket.voxel_color_indices.push(color_index);
        }
    }

    let clustered: Vec<Option<(Vec<[u8; 3]>, Vec<usize>)>> = buckets
        .par_iter()
        .enumerate()
        .map(|(material_index, bucket)| {
            let slot = MATERIAL_SLOTS[material_index];
            if bucket.unique_colors.is_empty() || slot.count == 0 {
                return None;
            }

            let oklab: Vec<Vec3> = bucket
                .unique_colors
                .iter()
                .map(|&color| rgb_to_oklab(color))
                .collect();

            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(material_index as u64));
            let (assignments, centroids) = kmeans(&oklab, slot.count as usize, &mut rng, 100);

            let entries: Vec<[u8; 3]> = centroids
                .iter()
                .map(|&centroid| {
                    let rgb = oklab_to_rgb(centroid).clamp(Vec3::ZERO, Vec3::splat(255.0));

                    [rgb.x as u8, rgb.y as u8, rgb.z as u8]
                })
                .collect();

            Some((entries, assignments))
        })
        .collect();

    let mut palette: Palette = [[0, 0, 0, 255]; 256];
    let mut model_indices: Vec<Vec<u8>> = models
        .iter()
        .map(|model| vec![0u8; model.voxels.len()])
        .collect();

    for (material_index, result) in clustered.iter().enumerate() {
        let Some((entries, assignments)) = result else {
            continue;
        };

        let bucket = &buckets[material_index];
        let slot = MATERIAL_SLOTS[material_index];

        for (&(model_index, voxel_index), &color_index) in
            bucket.voxel_refs.iter().zip(&bucket.voxel_color_indices)
        {
            let cluster = assignments[color_index];
            model_indices[model_index][voxel_index] = (slot.offset as usize + cluster) as u8;
        }

        for (i, entry) in entries.iter().enumerate() {
            palette[slot.offset as usize + i] = [entry[0], entry[1], entry[2], 255];
        }
    }

    (palette, model_indices)
}

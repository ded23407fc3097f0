//! The per-level driver: BSP in, `.vox` models and a scene XML out.

use std::{
    fs,
    path::{Path, PathBuf},
};

use bsp::{Bsp, Polygon};
use eyre::bail;
use glam::{Quat, Vec3};
use tracing::{error, info, warn};
use voxel::{
    DECIMETER_TO_METER, Environment, FaceVoxels, HAMMER_TO_TEARDOWN, LevelInfo, Light, Location,
    Model, Npc, Trigger, plan_groups, voxelize_face, voxelize_group, write_magicavoxel,
    write_teardown_level,
};
use wad::Wad;

use super::{
    entities::Worldspawn,
    read_entities::{LevelEntities, read_entities},
};

/// The retail single-player campaign, in playing order.
pub const LEVELS: [&str; 96] = [
    "c0a0", "c0a0a", "c0a0b", "c0a0c", "c0a0d", "c0a0e",
    "c1a0", "c1a0a", "c1a0b", "c1a0c", "c1a0d", "c1a0e",
    "c1a1", "c1a1a", "c1a1b", "c1a1c", "c1a1d", "c1a1f",
    "c1a2", "c1a2a", "c1a2b", "c1a2c", "c1a2d",
    "c1a3", "c1a3a", "c1a3b", "c1a3c", "c1a3d",
    "c1a4", "c1a4b", "c1a4d", "c1a4e", "c1a4f", "c1a4g", "c1a4i", "c1a4j", "c1a4k",
    "c2a1", "c2a1a", "c2a1b",
    "c2a2", "c2a2a", "c2a2b1", "c2a2b2", "c2a2c", "c2a2d", "c2a2e", "c2a2f", "c2a2g", "c2a2h",
    "c2a3", "c2a3a", "c2a3b", "c2a3c", "c2a3d", "c2a3e",
    "c2a4", "c2a4a", "c2a4b", "c2a4c", "c2a4d", "c2a4e", "c2a4f", "c2a4g",
    "c2a5", "c2a5a", "c2a5b", "c2a5c", "c2a5d", "c2a5e", "c2a5f", "c2a5g", "c2a5w", "c2a5x",
    "c3a1", "c3a1a", "c3a1b",
    "c3a2", "c3a2a", "c3a2b", "c3a2c", "c3a2d", "c3a2e",
    "c4a1", "c4a1a", "c4a1b", "c4a1c", "c4a1d", "c4a1e", "c4a1f", "c4a1g",
    "c4a2", "c4a2a", "c4a2b",
    "c4a3",
    "c5a1",
];

/// Fixed clustering seed so reruns produce byte-identical output.
const PALETTE_SEED: u64 = 0;

/// The world minimum rests at 128 decimeters in scene units.
const LEVEL_FLOOR_HEIGHT: f32 = 12.8;

const SCENE_SCALE: f32 = HAMMER_TO_TEARDOWN * DECIMETER_TO_METER;

/// Hammer coordinates to scene meters: swap y/z, flip the new z.
fn to_scene(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y) * SCENE_SCALE
}

/// Processes every level in order; returns how many failed fatally.
pub fn load_game_levels(game_path: &Path, level_names: &[String], fuse: bool) -> usize {
    let mut failed = 0;

    for name in level_names {
        info!("processing level {name}");

        if let Err(e) = load_level(game_path, name, fuse) {
            error!("level {name} failed: {e:#}");
            failed += 1;
        }
    }

    failed
}

pub fn load_level(game_path: &Path, level_name: &str, fuse: bool) -> eyre::Result<()> {
    if !game_path.is_dir() {
        bail!("Game path does not point to a valid directory");
    }

    let level_path = game_path
        .join("valve")
        .join("maps")
        .join(format!("{level_name}.bsp"));
    if !level_path.is_file() {
        bail!("Could not find level at {}", level_path.display());
    }

    let mut bsp = Bsp::open(&level_path)?;
    let entities = read_entities(&bsp)?;

    let Some(worldspawn) = entities.worldspawns.first() else {
        bail!("Could not find worldspawn entity");
    };

    let wads = open_wads(game_path, worldspawn);
    bsp.load_textures(&wads)?;

    let polygons = bsp.model_faces(0)?;

    let brush_dir = PathBuf::from("brush").join(level_name);
    fs::create_dir_all(&brush_dir)?;

    let mut sky_seen = false;
    let mut visible: Vec<(usize, &Polygon)> = vec![];

    for (index, polygon) in polygons.iter().enumerate() {
        let texture_name = bsp.texture_name(polygon.texture_id).unwrap_or_default();
        if texture_name == "SKY" || texture_name == "sky" {
            sky_seen = true;
            continue;
        }

        if !bsp.has_texture(polygon.texture_id) {
            warn!("skipping face {index}: texture '{texture_name}' is not loaded");
            continue;
        }

        visible.push((index, polygon));
    }

    let mut models: Vec<Model> = vec![];

    if fuse {
        let plans = plan_groups(visible.iter().copied());

        for (group_index, plan) in plans.iter().enumerate() {
            let fused = voxelize_group(
                plan,
                &polygons,
                |texture_id| bsp.texture_data(texture_id),
                group_index,
            );

            match fused {
                Ok(FaceVoxels { grid, placement }) => {
                    let path = brush_dir.join(format!("{}.vox", placement.name));
                    write_magicavoxel(path, &[grid], PALETTE_SEED)?;
                    models.push(placement);
                }
                Err(e) => warn!("skipping group {group_index}: {e}"),
            }
        }
    } else {
        for &(index, polygon) in &visible {
            let Some(texture) = bsp.texture_data(polygon.texture_id) else {
                continue;
            };

            match voxelize_face(polygon, texture, index as u32) {
                Ok(FaceVoxels { grid, placement }) => {
                    let path = brush_dir.join(format!("{}.vox", placement.name));
                    write_magicavoxel(path, &[grid], PALETTE_SEED)?;
                    models.push(placement);
                }
                Err(e) => warn!("skipping face {index}: {e}"),
            }
        }
    }

    let info = build_level_info(&bsp, &entities, worldspawn, level_name, models, sky_seen)?;

    write_teardown_level(&info)?;

    Ok(())
}

/// Resolves the worldspawn WAD list against the game directory.
///
/// Entries use backslashes and are rooted in the mod installation; the first
/// two path components are replaced by the game path.
fn open_wads(game_path: &Path, worldspawn: &Worldspawn) -> Vec<Wad> {
    let mut wads = vec![];

    for segment in worldspawn.wad.split(';') {
        if segment.is_empty() {
            continue;
        }

        let relative: PathBuf = Path::new(&segment.replace('\\', "/"))
            .components()
            .skip(2)
            .collect();
        let path = game_path.join(relative);

        match Wad::open(&path) {
            Ok(wad) => wads.push(wad),
            Err(e) => warn!("Failed to open wad file {}: {e}", path.display()),
        }
    }

    wads
}

/// Pitch-then-yaw rotation applied to the forward axis.
fn sun_direction(pitch: f32, yaw: f32) -> Vec3 {
    let rotation =
        Quat::from_rotation_y(yaw.to_radians()) * Quat::from_rotation_x(-pitch.to_radians());

    rotation * Vec3::Z
}

fn build_environment(
    entities: &LevelEntities,
    worldspawn: &Worldspawn,
    sky_seen: bool,
) -> Environment {
    let mut environment = Environment::default();

    if !worldspawn.skyname.is_empty() {
        environment.skybox = worldspawn.skyname.clone();
    }

    // without a sky face there is nothing for the sun to shine through
    if sky_seen {
        if let Some(light) = entities.light_environments.first() {
            environment.sun_dir = sun_direction(light.pitch, light.angle);
            environment.sun_color = Vec3::new(
                light.color[0] as f32 / 255.0,
                light.color[1] as f32 / 255.0,
                light.color[2] as f32 / 255.0,
            );
            environment.brightness = light.intensity as f32 / 255.0;
        }
    }

    environment
}

fn build_level_info(
    bsp: &Bsp,
    entities: &LevelEntities,
    worldspawn: &Worldspawn,
    level_name: &str,
    models: Vec<Model>,
    sky_seen: bool,
) -> eyre::Result<LevelInfo> {
    let lights: Vec<Light> = entities
        .lights
        .iter()
        .map(|light| Light {
            pos: to_scene(light.origin.as_vec3()),
            color: light.color,
            intensity: light.intensity as f32 * (SCENE_SCALE * 20.0),
        })
        .collect();

    let locations: Vec<Location> = entities
        .landmarks
        .iter()
        .map(|landmark| Location {
            name: landmark.targetname.clone(),
            pos: to_scene(landmark.origin.as_vec3()),
        })
        .collect();

    let npcs: Vec<Npc> = entities
        .monsters
        .iter()
        .map(|monster| Npc {
            path_name: monster.kind.prefab_name().to_string(),
            pos: to_scene(monster.origin.as_vec3()),
            rot: Vec3::new(0.0, monster.angle + 90.0, 0.0),
        })
        .collect();

    let mut triggers = Vec::with_capacity(entities.triggers.len());
    for transition in &entities.triggers {
        let Some(model_reference) = transition.model.strip_prefix('*') else {
            warn!("Level transition trigger is an external model, skipping");
            continue;
        };

        let model_id = match model_reference.parse::<u32>() {
            Ok(0) | Err(_) => {
                warn!("Failed to parse model id from '{}'", transition.model);
                continue;
            }
            Ok(id) => id,
        };

        let (min, max) = match bsp.model_aabb(model_id) {
            Ok(aabb) => aabb,
            Err(e) => {
                warn!("Cannot look up trigger brush '{}': {e}", transition.model);
                continue;
            }
        };

        let mut min = to_scene(min);
        let mut max = to_scene(max);
        // the z flip swaps which corner is the minimum
        std::mem::swap(&mut min.z, &mut max.z);

        triggers.push(Trigger {
            map: transition.map.clone(),
            landmark: transition.landmark.clone(),
            pos: min,
            size: max - min,
        });
    }

    let Some(player_start) = entities.player_starts.first() else {
        bail!("Could not find player start");
    };

    let (world_min, world_max) = bsp.model_aabb(0)?;
    let mut world_min = to_scene(world_min);
    let mut world_max = to_scene(world_max);
    std::mem::swap(&mut world_min.z, &mut world_max.z);

    let level_pos = Vec3::new(
        -(world_min.x + world_max.x) * 0.5,
        LEVEL_FLOOR_HEIGHT - world_min.y,
        -(world_min.z + world_max.z) * 0.5,
    );

    Ok(LevelInfo {
        name: level_name.to_string(),
        level_pos,
        models,
        lights,
        locations,
        npcs,
        triggers,
        spawn_pos: to_scene(player_start.origin.as_vec3()),
        spawn_rot: Vec3::new(0.0, player_start.angle + 90.0, 0.0),
        environment: build_environment(entities, worldspawn, sky_seen),
    })
}

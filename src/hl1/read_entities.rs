//! Dispatch of raw entity records into typed variants.
//!
//! A failed numeric parse on any required component invalidates the whole
//! record: it is logged and discarded. Unknown keys and unknown classnames
//! only warn.

use std::str::FromStr;

use bsp::{Bsp, BspError, Entity};
use glam::IVec3;
use tracing::warn;

use super::entities::{
    ChangeLevel, KNOWN_CLASSNAMES, KNOWN_PARAMETERS, Landmark, Light, LightEnvironment, Monster,
    MonsterKind, PlayerStart, TypedEntity, Worldspawn,
};

/// The typed entities of one level, bucketed by class, in source order
/// within each bucket.
#[derive(Debug, Default)]
pub struct LevelEntities {
    pub lights: Vec<Light>,
    pub light_environments: Vec<LightEnvironment>,
    pub player_starts: Vec<PlayerStart>,
    pub landmarks: Vec<Landmark>,
    pub triggers: Vec<ChangeLevel>,
    pub worldspawns: Vec<Worldspawn>,
    pub monsters: Vec<Monster>,
}

pub fn read_entities(bsp: &Bsp) -> Result<LevelEntities, BspError> {
    let raw = bsp.entities()?;
    let mut result = LevelEntities::default();

    for entity in &raw {
        let Some(classname) = entity.get("classname") else {
            warn!("Entity has no classname");
            continue;
        };

        if !KNOWN_CLASSNAMES.contains(classname.as_str()) {
            warn!("Unknown entity type: {classname}");
            continue;
        }

        let Some(typed) = dispatch(classname, entity) else {
            continue;
        };

        match typed {
            TypedEntity::Light(x) => result.lights.push(x),
            TypedEntity::LightEnvironment(x) => result.light_environments.push(x),
            TypedEntity::PlayerStart(x) => result.player_starts.push(x),
            TypedEntity::Landmark(x) => result.landmarks.push(x),
            TypedEntity::ChangeLevel(x) => result.triggers.push(x),
            TypedEntity::Worldspawn(x) => result.worldspawns.push(x),
            TypedEntity::Monster(x) => result.monsters.push(x),
        }
    }

    Ok(result)
}

/// Known-but-unhandled classnames come back as `None` without a warning.
fn dispatch(classname: &str, entity: &Entity) -> Option<TypedEntity> {
    match classname {
        "light" => construct_light(entity).map(TypedEntity::Light),
        "light_environment" => construct_light_environment(entity).map(TypedEntity::LightEnvironment),
        "info_player_start" => construct_player_start(entity).map(TypedEntity::PlayerStart),
        "info_landmark" => construct_landmark(entity).map(TypedEntity::Landmark),
        "trigger_changelevel" => construct_changelevel(entity).map(TypedEntity::ChangeLevel),
        "worldspawn" => construct_worldspawn(entity).map(TypedEntity::Worldspawn),
        "monster_scientist" => construct_monster(MonsterKind::Scientist, entity).map(TypedEntity::Monster),
        "monster_barney" => construct_monster(MonsterKind::Barney, entity).map(TypedEntity::Monster),
        "monster_gman" => construct_monster(MonsterKind::Gman, entity).map(TypedEntity::Monster),
        _ => None,
    }
}

/// Splits on single spaces and parses the first `N` components; trailing
/// components are ignored, missing or malformed ones fail the parse.
fn parse_components<T: FromStr + Copy + Default, const N: usize>(value: &str) -> Option<[T; N]> {
    let mut parts = value.split(' ');
    let mut result = [T::default(); N];

    for slot in &mut result {
        *slot = parts.next()?.parse().ok()?;
    }

    Some(result)
}

macro_rules! fail {
    ($key:expr, $value:expr) => {{
        warn!("Failed to parse parameter '{}' with value '{}'", $key, $value);
        return None;
    }};
}

fn unparsed(key: &str) {
    if key == "classname" {
        return;
    }

    if KNOWN_PARAMETERS.contains(key) {
        warn!("Unparsed parameter type: {key}");
    } else {
        warn!("Unknown parameter type: {key}");
    }
}

fn construct_light(entity: &Entity) -> Option<Light> {
    let mut result = Light {
        origin: IVec3::ZERO,
        color: [0; 3],
        intensity: 255,
        fade: 1.0,
    };

    for (key, value) in entity {
        match key.as_str() {
            "origin" => {
                let Some([x, y, z]) = parse_components::<i32, 3>(value) else {
                    fail!(key, value);
                };
                result.origin = IVec3::new(x, y, z);
            }
            "_light" => {
                if let Some([r, g, b, intensity]) = parse_components::<u32, 4>(value) {
                    result.color = [r as u8, g as u8, b as u8];
                    result.intensity = intensity;
                } else if let Some([r, g, b]) = parse_components::<u32, 3>(value) {
                    result.color = [r as u8, g as u8, b as u8];
                } else {
                    fail!(key, value);
                }
            }
            "style" => {
                if !matches!(value.as_str(), "0" | "32" | "33") {
                    fail!(key, value);
                }
            }
            "_fade" => {
                let Some([fade]) = parse_components::<f32, 1>(value) else {
                    fail!(key, value);
                };
                result.fade = fade;
            }
            "classname" => {}
            _ => unparsed(key),
        }
    }

    Some(result)
}

fn construct_light_environment(entity: &Entity) -> Option<LightEnvironment> {
    let mut result = LightEnvironment {
        origin: IVec3::ZERO,
        color: [0; 3],
        intensity: 255,
        pitch: 0.0,
        angle: 0.0,
    };

    for (key, value) in entity {
        match key.as_str() {
            "origin" => {
                let Some([x, y, z]) = parse_components::<i32, 3>(value) else {
                    fail!(key, value);
                };
                result.origin = IVec3::new(x, y, z);
            }
            "_light" => {
                if let Some([r, g, b, intensity]) = parse_components::<u32, 4>(value) {
                    result.color = [r as u8, g as u8, b as u8];
                    result.intensity = intensity;
                } else if let Some([r, g, b]) = parse_components::<u32, 3>(value) {
                    result.color = [r as u8, g as u8, b as u8];
                } else {
                    fail!(key, value);
                }
            }
            "pitch" => {
                let Some([pitch]) = parse_components::<f32, 1>(value) else {
                    fail!(key, value);
                };
                result.pitch = pitch;
            }
            "angle" => {
                let Some([angle]) = parse_components::<f32, 1>(value) else {
                    fail!(key, value);
                };
                result.angle = angle;
            }
            "classname" => {}
            _ => unparsed(key),
        }
    }

    Some(result)
}

fn construct_player_start(entity: &Entity) -> Option<PlayerStart> {
    let mut result = PlayerStart {
        origin: IVec3::ZERO,
        angle: 0.0,
    };

    for (key, value) in entity {
        match key.as_str() {
            "origin" => {
                let Some([x, y, z]) = parse_components::<i32, 3>(value) else {
                    fail!(key, value);
                };
                result.origin = IVec3::new(x, y, z);
            }
            "angle" => {
                let Some([angle]) = parse_components::<f32, 1>(value) else {
                    fail!(key, value);
                };
                result.angle = angle;
            }
            "classname" => {}
            _ => unparsed(key),
        }
    }

    Some(result)
}

fn construct_landmark(entity: &Entity) -> Option<Landmark> {
    let mut result = Landmark {
        targetname: String::new(),
        origin: IVec3::ZERO,
    };

    for (key, value) in entity {
        match key.as_str() {
            "origin" => {
                let Some([x, y, z]) = parse_components::<i32, 3>(value) else {
                    fail!(key, value);
                };
                result.origin = IVec3::new(x, y, z);
            }
            "targetname" => result.targetname = value.clone(),
            "classname" => {}
            _ => unparsed(key),
        }
    }

    Some(result)
}

fn construct_changelevel(entity: &Entity) -> Option<ChangeLevel> {
    let mut result = ChangeLevel {
        map: String::new(),
        landmark: String::new(),
        model: String::new(),
    };

    for (key, value) in entity {
        match key.as_str() {
            "map" => result.map = value.clone(),
            "landmark" => result.landmark = value.clone(),
            "model" => result.model = value.clone(),
            "classname" => {}
            _ => unparsed(key),
        }
    }

    Some(result)
}

fn construct_worldspawn(entity: &Entity) -> Option<Worldspawn> {
    let mut result = Worldspawn::default();

    for (key, value) in entity {
        match key.as_str() {
            "message" => result.message = value.clone(),
            "skyname" => result.skyname = value.clone(),
            "chaptertitle" => result.chaptertitle = value.clone(),
            "wad" => result.wad = value.clone(),
            "gametitle" => result.gametitle = value == "1",
            "newunit" => result.newunit = value == "1",
            "classname" => {}
            _ => unparsed(key),
        }
    }

    Some(result)
}

fn construct_monster(kind: MonsterKind, entity: &Entity) -> Option<Monster> {
    let mut result = Monster {
        kind,
        origin: IVec3::ZERO,
        angle: 0.0,
    };

    for (key, value) in entity {
        match key.as_str() {
            "origin" => {
                let Some([x, y, z]) = parse_components::<i32, 3>(value) else {
                    fail!(key, value);
                };
                result.origin = IVec3::new(x, y, z);
            }
            "angle" => {
                let Some([angle]) = parse_components::<f32, 1>(value) else {
                    fail!(key, value);
                };
                result.angle = angle;
            }
            "classname" => {}
            _ => unparsed(key),
        }
    }

    Some(result)
}

//! Teardown scene description, one XML prefab per level.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use crate::{LevelInfo, error::VoxelError};

/// Renders the scene XML for one level.
pub fn encode_level(info: &LevelInfo) -> String {
    let mut xml = String::new();
    let name = &info.name;

    xml.push_str("<prefab version=\"1.6.0\">\n");
    let _ = writeln!(
        xml,
        "<group name=\"instance=MOD/levels/{name}.xml\">\n<group tags=\"{name}\" pos=\"{:.3} {:.3} {:.3}\" rot=\"0.000 0.000 0.000\">",
        info.level_pos.x, info.level_pos.y, info.level_pos.z,
    );

    let _ = writeln!(
        xml,
        "<spawnpoint tags=\"{name}\" pos=\"{:.3} {:.3} {:.3}\" rot=\"{:.3} {:.3} {:.3}\"/>",
        info.spawn_pos.x, info.spawn_pos.y, info.spawn_pos.z,
        info.spawn_rot.x, info.spawn_rot.y, info.spawn_rot.z,
    );

    let _ = writeln!(
        xml,
        "<location tags=\"playerspawn {name}\" pos=\"{:.3} {:.3} {:.3}\" rot=\"{:.3} {:.3} {:.3}\"/>",
        info.spawn_pos.x, info.spawn_pos.y, info.spawn_pos.z,
        info.spawn_rot.x, -info.spawn_rot.y, info.spawn_rot.z,
    );

    let env = &info.environment;
    let _ = writeln!(
        xml,
        "<location tags=\"env {name} tag_skybox=MOD/{}.dds tag_skyboxbrightness={} tag_sunColorTintR={:.3} tag_sunColorTintG={:.3} tag_sunColorTintB={:.3} tag_sunDirX={:.3} tag_sunDirY={:.3} tag_sunDirZ={:.3}\"/>",
        env.skybox, env.brightness,
        env.sun_color.x, env.sun_color.y, env.sun_color.z,
        env.sun_dir.x, env.sun_dir.y, env.sun_dir.z,
    );

    let _ = writeln!(
        xml,
        "<environment tags=\"{name}\" skybox=\"MOD/{}.dds\" skyboxbrightness=\"{}\" skyboxrot=\"-90\" constant=\"0.003 0.003 0.003\" ambient=\"1\" fogParams=\"0 0 0 0\" sunColorTint=\"{:.3} {:.3} {:.3}\" sunDir=\"{:.3} {:.3} {:.3}\" sunSpread=\"0\"/>",
        env.skybox, env.brightness,
        env.sun_color.x, env.sun_color.y, env.sun_color.z,
        env.sun_dir.x, env.sun_dir.y, env.sun_dir.z,
    );

    for location in &info.locations {
        let _ = writeln!(
            xml,
            "<location tags=\"{name} targetname_{}\" name=\"{}\" pos=\"{:.3} {:.3} {:.3}\"/>",
            location.name, location.name,
            location.pos.x, location.pos.y, location.pos.z,
        );
    }

    for npc in &info.npcs {
        let _ = writeln!(
            xml,
            "<script tags=\"{name}\" pos=\"0.0 0.0 0.0\" file=\"MOD/characters/idle-anim.lua\">\n<instance tags=\"{name}\" pos=\"{:.3} {:.3} {:.3}\" rot=\"{:.3} {:.3} {:.3}\" file=\"MOD/characters/{}.xml\"/>\n</script>",
            npc.pos.x, npc.pos.y + 0.15, npc.pos.z,
            npc.rot.x, npc.rot.y, npc.rot.z,
            npc.path_name,
        );
    }

    for trigger in &info.triggers {
        let _ = writeln!(
            xml,
            "<trigger tags=\"{name} changelevel map={} landmark={}\" name=\"{}\" pos=\"{:.3} {:.3} {:.3}\" type=\"box\" size=\"{:.3} {:.3} {:.3}\"/>",
            trigger.map, trigger.landmark, trigger.map,
            trigger.pos.x + trigger.size.x * 0.5,
            trigger.pos.y,
            trigger.pos.z + trigger.size.z * 0.5,
            trigger.size.x, trigger.size.y, trigger.size.z,
        );
    }

    for light in &info.lights {
        let _ = writeln!(
            xml,
            "<light tags=\"{name}\" pos=\"{:.3} {:.3} {:.3}\" color=\"{} {} {}\" scale=\"{}\"/>",
            light.pos.x, light.pos.y, light.pos.z,
            light.color[0] as f32 / 255.0,
            light.color[1] as f32 / 255.0,
            light.color[2] as f32 / 255.0,
            light.intensity * 0.1,
        );
    }

    for model in &info.models {
        let file_path = format!("MOD/brush/{name}/{}.vox", model.name);

        let _ = writeln!(
            xml,
            "<voxbox name=\"{file_path}\" tags=\"{name}\" pos=\"{:.3} {:.3} {:.3}\" rot=\"{:.3} {:.3} {:.3}\" size=\"{} {} {}\" brush=\"{file_path}\"/>",
            model.pos.x, model.pos.y, model.pos.z,
            model.rot.x, model.rot.y, model.rot.z,
            model.size.x, model.size.y, model.size.z,
        );
    }

    xml.push_str("</group>\n</group>\n</prefab>\n");

    xml
}

/// Writes `levels/<name>.xml` under the working directory.
pub fn write_teardown_level(info: &LevelInfo) -> Result<PathBuf, VoxelError> {
    let dir = Path::new("levels");
    fs::create_dir_all(dir).map_err(|source| VoxelError::Io {
        source,
        path: dir.to_path_buf(),
    })?;

    let path = dir.join(format!("{}.xml", info.name));
    fs::write(&path, encode_level(info)).map_err(|source| VoxelError::Io {
        source,
        path: path.clone(),
    })?;

    Ok(path)
}

//! End-to-end: a synthetic two-face map on disk, all the way to `.vox`
//! models and the scene XML.

use std::{fs, path::Path};

use byte_writer::ByteWriter;
use goldvox::load_level;

/// A 16x16 two-color checkerboard mip texture record.
fn write_mip_texture(w: &mut ByteWriter, name: &str) {
    w.append_string_fixed(name, 16);
    w.append_u32(16);
    w.append_u32(16);

    let texels = 16 * 16usize;
    let offsets = [
        40,
        40 + texels,
        40 + texels + texels / 4,
        40 + texels + texels / 4 + texels / 16,
    ];
    for offset in offsets {
        w.append_u32(offset as u32);
    }

    for y in 0..16u32 {
        for x in 0..16u32 {
            w.append_u8(((x + y) % 2) as u8);
        }
    }
    w.append_u8_slice(&vec![0u8; texels / 4 + texels / 16 + texels / 64]);
    w.append_u16(256);

    w.append_u8_slice(&[40, 40, 40]);
    w.append_u8_slice(&[220, 220, 220]);
    w.append_u8_slice(&vec![0u8; 254 * 3]);
}

const ENTITIES: &str = r#"
{
"classname" "worldspawn"
"wad" ""
"skyname" "desert"
}
{
"classname" "info_player_start"
"origin" "32 32 16"
"angle" "0"
}
{
"classname" "light"
"origin" "192 64 160"
"_light" "255 200 100 300"
}
{
"classname" "light_environment"
"origin" "0 0 128"
"_light" "255 240 220 200"
"pitch" "-60"
"angle" "45"
}
{
"classname" "info_landmark"
"targetname" "lm1"
"origin" "64 64 0"
}
{
"classname" "trigger_changelevel"
"map" "c1a1"
"landmark" "lm1"
"model" "*7"
}
{
"classname" "monster_scientist"
"origin" "100 100 0"
"angle" "90"
}
{
"classname" "fancy_mod_entity"
"origin" "0 0 0"
}
"#;

/// Two quads on the floor plane: faces 0 (CHECKER) and 1 (SKY), plus eight
/// models so `*7` resolves to a trigger brush.
fn build_bsp() -> Vec<u8> {
    let mut w = ByteWriter::new();

    w.append_i32(30);
    let dir_start = w.get_offset();
    for _ in 0..15 {
        w.append_i32(0);
        w.append_i32(0);
    }

    let mut starts = [0usize; 15];
    let mut ends = [0usize; 15];
    // lumps are 4-aligned, like the ones real compilers emit
    let begin = |w: &mut ByteWriter, starts: &mut [usize; 15], i: usize| {
        while w.get_offset() % 4 != 0 {
            w.append_u8(0);
        }
        starts[i] = w.get_offset();
    };
    let finish = |w: &ByteWriter, ends: &mut [usize; 15], i: usize| ends[i] = w.get_offset();

    // 0: entities
    begin(&mut w, &mut starts, 0);
    w.append_string(ENTITIES);
    w.append_u8(0);
    finish(&w, &mut ends, 0);

    // 1: planes (z = 0, type PLANE_Z)
    begin(&mut w, &mut starts, 1);
    w.append_f32_slice(&[0.0, 0.0, 1.0]);
    w.append_f32(0.0);
    w.append_i32(2);
    finish(&w, &mut ends, 1);

    // 2: textures
    begin(&mut w, &mut starts, 2);
    {
        let lump_start = w.get_offset();
        w.append_u32(2);
        let offsets_at = w.get_offset();
        w.append_i32(0);
        w.append_i32(0);

        let first = w.get_offset() - lump_start;
        write_mip_texture(&mut w, "CHECKER");
        let second = w.get_offset() - lump_start;
        write_mip_texture(&mut w, "SKY");

        w.replace_with_i32(offsets_at, first as i32);
        w.replace_with_i32(offsets_at + 4, second as i32);
    }
    finish(&w, &mut ends, 2);

    // 3: vertices, two quads
    begin(&mut w, &mut starts, 3);
    for quad in [
        [[0.0f32, 0.0, 0.0], [64.0, 0.0, 0.0], [64.0, 64.0, 0.0], [0.0, 64.0, 0.0]],
        [[128.0, 0.0, 0.0], [192.0, 0.0, 0.0], [192.0, 64.0, 0.0], [128.0, 64.0, 0.0]],
    ] {
        for vertex in quad {
            w.append_f32_slice(&vertex);
        }
    }
    finish(&w, &mut ends, 3);

    // 4: visibility
    begin(&mut w, &mut starts, 4);
    finish(&w, &mut ends, 4);

    // 5: nodes
    begin(&mut w, &mut starts, 5);
    finish(&w, &mut ends, 5);

    // 6: texinfo, u along x and v along y for both textures
    begin(&mut w, &mut starts, 6);
    for texture in 0..2u32 {
        w.append_f32_slice(&[1.0, 0.0, 0.0]);
        w.append_f32(0.0);
        w.append_f32_slice(&[0.0, 1.0, 0.0]);
        w.append_f32(0.0);
        w.append_u32(texture);
        w.append_u32(0);
    }
    finish(&w, &mut ends, 6);

    // 7: faces
    begin(&mut w, &mut starts, 7);
    for (first_edge, texinfo) in [(0u32, 0u16), (4, 1)] {
        w.append_u16(0);
        w.append_u16(0);
        w.append_u32(first_edge);
        w.append_u16(4);
        w.append_u16(texinfo);
        w.append_u8_slice(&[0; 4]);
        w.append_i32(-1);
    }
    finish(&w, &mut ends, 7);

    // 8: lighting
    begin(&mut w, &mut starts, 8);
    finish(&w, &mut ends, 8);

    // 9: clipnodes
    begin(&mut w, &mut starts, 9);
    finish(&w, &mut ends, 9);

    // 10: leaves
    begin(&mut w, &mut starts, 10);
    finish(&w, &mut ends, 10);

    // 11: marksurfaces
    begin(&mut w, &mut starts, 11);
    finish(&w, &mut ends, 11);

    // 12: edges, index 0 is a dummy
    begin(&mut w, &mut starts, 12);
    for pair in [
        [0u16, 0],
        [3, 0], [0, 1], [1, 2], [2, 3],
        [7, 4], [4, 5], [5, 6], [6, 7],
    ] {
        w.append_u16(pair[0]);
        w.append_u16(pair[1]);
    }
    finish(&w, &mut ends, 12);

    // 13: surfedges
    begin(&mut w, &mut starts, 13);
    for surf_edge in [1i32, 2, 3, 4, 5, 6, 7, 8] {
        w.append_i32(surf_edge);
    }
    finish(&w, &mut ends, 13);

    // 14: models, world plus seven brush models
    begin(&mut w, &mut starts, 14);
    let model = |w: &mut ByteWriter, mins: [f32; 3], maxs: [f32; 3], first: i32, count: i32| {
        w.append_f32_slice(&mins);
        w.append_f32_slice(&maxs);
        w.append_f32_slice(&[0.0; 3]);
        for _ in 0..32 {
            w.append_i32(0);
        }
        w.append_i32(0);
        w.append_i32(first);
        w.append_i32(count);
    };
    model(&mut w, [0.0, 0.0, 0.0], [192.0, 64.0, 0.0], 0, 2);
    for _ in 1..7 {
        model(&mut w, [0.0; 3], [0.0; 3], 0, 0);
    }
    model(&mut w, [10.0, 20.0, 30.0], [20.0, 30.0, 40.0], 0, 0);
    finish(&w, &mut ends, 14);

    for i in 0..15 {
        w.replace_with_i32(dir_start + i * 8, starts[i] as i32);
        w.replace_with_i32(dir_start + i * 8 + 4, (ends[i] - starts[i]) as i32);
    }

    w.into_bytes()
}

fn voxbox_brushes(xml: &str) -> Vec<String> {
    xml.lines()
        .filter(|line| line.starts_with("<voxbox"))
        .map(|line| {
            let at = line.find("brush=\"").unwrap() + "brush=\"".len();
            let end = line[at..].find('"').unwrap();
            line[at..at + end].to_string()
        })
        .collect()
}

#[test]
fn converts_a_level_end_to_end() {
    let game = tempfile::tempdir().unwrap();
    let maps = game.path().join("valve").join("maps");
    fs::create_dir_all(&maps).unwrap();
    fs::write(maps.join("test.bsp"), build_bsp()).unwrap();

    let out = tempfile::tempdir().unwrap();
    std::env::set_current_dir(out.path()).unwrap();

    load_level(game.path(), "test", false).unwrap();

    // face 0 voxelizes, the sky face is skipped
    assert!(Path::new("brush/test/0.vox").is_file());
    assert!(!Path::new("brush/test/1.vox").exists());

    let vox = fs::read("brush/test/0.vox").unwrap();
    assert_eq!(&vox[0..4], b"VOX ");

    let xml = fs::read_to_string("levels/test.xml").unwrap();

    // every voxbox refers to a file written in this run
    let brushes = voxbox_brushes(&xml);
    assert_eq!(brushes.len(), 1);
    for brush in &brushes {
        let relative = brush.strip_prefix("MOD/").unwrap();
        assert!(Path::new(relative).is_file(), "{brush} missing");
    }

    // spawn point and mirrored playerspawn location
    assert!(xml.contains("<spawnpoint tags=\"test\" pos=\"0.813 0.406 -0.813\" rot=\"0.000 90.000 0.000\"/>"));
    assert!(xml.contains("<location tags=\"playerspawn test\""));

    // level origin centers x/z and lifts the world minimum
    assert!(xml.contains("pos=\"-2.438 12.800 0.813\""));

    // trigger brush *7: aabb converted, recentered on the ground plane
    assert!(xml.contains("changelevel map=c1a1 landmark=lm1"));
    assert!(xml.contains("pos=\"0.381 0.762 -0.635\" type=\"box\" size=\"0.254 0.254 0.254\""));

    // landmark location
    assert!(xml.contains("targetname_lm1"));
    assert!(xml.contains("name=\"lm1\" pos=\"1.626 0.000 -1.626\""));

    // npc instance with its prefab
    assert!(xml.contains("file=\"MOD/characters/scientist.xml\""));

    // light entity
    assert!(xml.contains("<light tags=\"test\" pos=\"4.877 4.064 -1.626\""));

    // the sky face plus light_environment drive the sun
    assert!(xml.contains("skybox=\"MOD/desert.dds\""));
    assert!(xml.contains("tag_sunDirY=-0.866"));

    // reruns are byte-identical
    let xml_before = xml.clone();
    let vox_before = vox.clone();
    load_level(game.path(), "test", false).unwrap();
    assert_eq!(fs::read("brush/test/0.vox").unwrap(), vox_before);
    assert_eq!(fs::read_to_string("levels/test.xml").unwrap(), xml_before);

    // fused mode produces one group for the single visible face
    let fused_out = tempfile::tempdir().unwrap();
    std::env::set_current_dir(fused_out.path()).unwrap();

    load_level(game.path(), "test", true).unwrap();

    let xml = fs::read_to_string("levels/test.xml").unwrap();
    let brushes = voxbox_brushes(&xml);
    assert_eq!(brushes.len(), 1);
    assert!(Path::new("brush/test/0.vox").is_file());
    // fused groups sit axis-aligned in the world
    assert!(xml.contains("rot=\"0.000 0.000 0.000\" size=\"17 1 17\""));

    // missing level names fail without touching the output directory
    assert!(load_level(game.path(), "missing", false).is_err());
}

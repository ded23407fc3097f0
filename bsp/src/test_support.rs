//! Synthetic BSP images for tests.
//!
//! [`TestMap::single_quad`] is a one-face world: a 64x64 quad on the z = 0
//! plane, textured with an internal 16x16 two-color checkerboard.

use byte_writer::ByteWriter;
use tempfile::TempPath;

use crate::{
    BSP_VERSION, Bsp, LUMP_MAX, MAX_TEXTURE_NAME,
    error::BspError,
};

pub struct TestTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// `false` writes a directory entry with all four mip offsets zero, so
    /// the texture has to be resolved from a WAD by name.
    pub internal: bool,
}

pub struct TestFace {
    pub plane: u16,
    pub first_edge: u32,
    pub edge_count: u16,
    pub texinfo: u16,
}

pub struct TestModel {
    pub mins: [f32; 3],
    pub maxs: [f32; 3],
    pub first_face: i32,
    pub face_count: i32,
}

pub struct TestMap {
    pub entities: String,
    pub planes: Vec<([f32; 3], f32, i32)>,
    pub textures: Vec<TestTexture>,
    pub vertices: Vec<[f32; 3]>,
    pub texinfos: Vec<([f32; 3], f32, [f32; 3], f32, u32)>,
    pub faces: Vec<TestFace>,
    pub edges: Vec<[u16; 2]>,
    pub surf_edges: Vec<i32>,
    pub models: Vec<TestModel>,
}

impl TestMap {
    pub fn single_quad() -> Self {
        Self {
            entities: concat!(
                "{\n\"classname\" \"worldspawn\"\n\"wad\" \"\"\n}\n",
                "{\n\"classname\" \"info_player_start\"\n\"origin\" \"32 32 16\"\n\"angle\" \"0\"\n}\n",
            )
            .to_string(),
            planes: vec![([0.0, 0.0, 1.0], 0.0, 2)],
            textures: vec![TestTexture {
                name: "CHECKER".to_string(),
                width: 16,
                height: 16,
                internal: true,
            }],
            vertices: vec![
                [0.0, 0.0, 0.0],
                [64.0, 0.0, 0.0],
                [64.0, 64.0, 0.0],
                [0.0, 64.0, 0.0],
            ],
            texinfos: vec![([1.0, 0.0, 0.0], 0.0, [0.0, 1.0, 0.0], 0.0, 0)],
            faces: vec![TestFace {
                plane: 0,
                first_edge: 0,
                edge_count: 4,
                texinfo: 0,
            }],
            // edge 0 is a dummy, a non-negative surfedge walks vertex 1 of
            // its edge
            edges: vec![[0, 0], [3, 0], [0, 1], [1, 2], [2, 3]],
            surf_edges: vec![1, 2, 3, 4],
            models: vec![TestModel {
                mins: [0.0, 0.0, 0.0],
                maxs: [64.0, 64.0, 0.0],
                first_face: 0,
                face_count: 1,
            }],
        }
    }

    pub fn break_first_surfedge(&mut self) {
        self.surf_edges[0] = 999;
    }

    pub fn shrink_face_to_two_edges(&mut self) {
        self.faces[0].edge_count = 2;
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();

        w.append_i32(BSP_VERSION);
        let dir_start = w.get_offset();
        for _ in 0..LUMP_MAX {
            w.append_i32(0);
            w.append_i32(0);
        }

        let mut lump_starts = [0usize; LUMP_MAX];
        let mut lump_ends = [0usize; LUMP_MAX];

        macro_rules! lump {
            ($index:expr, $body:expr) => {
                // lumps are 4-aligned, like the ones real compilers emit
                while w.get_offset() % 4 != 0 {
                    w.append_u8(0);
                }
                lump_starts[$index] = w.get_offset();
                $body;
                lump_ends[$index] = w.get_offset();
            };
        }

        // 0: entities
        lump!(0, {
            w.append_string(&self.entities);
            w.append_u8(0);
        });

        // 1: planes
        lump!(1, {
            for (normal, distance, type_) in &self.planes {
                w.append_f32_slice(normal);
                w.append_f32(*distance);
                w.append_i32(*type_);
            }
        });

        // 2: textures
        lump!(2, {
            let lump_start = w.get_offset();
            w.append_u32(self.textures.len() as u32);
            let offsets_start = w.get_offset();
            for _ in &self.textures {
                w.append_i32(0);
            }

            for (i, texture) in self.textures.iter().enumerate() {
                let record_start = w.get_offset() - lump_start;
                w.replace_with_i32(offsets_start + i * 4, record_start as i32);
                write_mip_texture(&mut w, texture);
            }
        });

        // 3: vertices
        lump!(3, {
            for vertex in &self.vertices {
                w.append_f32_slice(vertex);
            }
        });

        // 4: visibility (opaque, unused)
        lump!(4, {});

        // 5: nodes
        lump!(5, {});

        // 6: texinfo
        lump!(6, {
            for (s, s_shift, t, t_shift, mip_texture) in &self.texinfos {
                w.append_f32_slice(s);
                w.append_f32(*s_shift);
                w.append_f32_slice(t);
                w.append_f32(*t_shift);
                w.append_u32(*mip_texture);
                w.append_u32(0);
            }
        });

        // 7: faces
        lump!(7, {
            for face in &self.faces {
                w.append_u16(face.plane);
                w.append_u16(0);
                w.append_u32(face.first_edge);
                w.append_u16(face.edge_count);
                w.append_u16(face.texinfo);
                w.append_u8_slice(&[0; 4]);
                w.append_i32(-1);
            }
        });

        // 8: lighting
        lump!(8, {});

        // 9: clipnodes
        lump!(9, {});

        // 10: leaves
        lump!(10, {});

        // 11: marksurfaces
        lump!(11, {});

        // 12: edges
        lump!(12, {
            for edge in &self.edges {
                w.append_u16(edge[0]);
                w.append_u16(edge[1]);
            }
        });

        // 13: surfedges
        lump!(13, {
            for &surf_edge in &self.surf_edges {
                w.append_i32(surf_edge);
            }
        });

        // 14: models
        lump!(14, {
            for model in &self.models {
                w.append_f32_slice(&model.mins);
                w.append_f32_slice(&model.maxs);
                w.append_f32_slice(&[0.0; 3]);
                for _ in 0..32 {
                    w.append_i32(0);
                }
                w.append_i32(0);
                w.append_i32(model.first_face);
                w.append_i32(model.face_count);
            }
        });

        for i in 0..LUMP_MAX {
            w.replace_with_i32(dir_start + i * 8, lump_starts[i] as i32);
            w.replace_with_i32(dir_start + i * 8 + 4, (lump_ends[i] - lump_starts[i]) as i32);
        }

        w.into_bytes()
    }
}

/// Writes a full mip texture record: header, four mip levels of indices, the
/// two-byte marker and the 256-entry palette.
pub fn write_mip_texture(w: &mut ByteWriter, texture: &TestTexture) {
    w.append_string_fixed(&texture.name, MAX_TEXTURE_NAME);
    w.append_u32(texture.width);
    w.append_u32(texture.height);

    if !texture.internal {
        w.append_u32_slice(&[0; 4]);
        return;
    }

    let texels = (texture.width * texture.height) as usize;
    let header_size = 40;
    let offsets = [
        header_size,
        header_size + texels,
        header_size + texels + texels / 4,
        header_size + texels + texels / 4 + texels / 16,
    ];
    w.append_u32_slice(&offsets.map(|o| o as u32));

    // mip 0: a one-texel checkerboard of palette indices 0 and 1
    for y in 0..texture.height {
        for x in 0..texture.width {
            w.append_u8(((x + y) % 2) as u8);
        }
    }
    // reduced mips, content never sampled
    w.append_u8_slice(&vec![0u8; texels / 4 + texels / 16 + texels / 64]);

    // two-byte marker between the indices and the palette
    w.append_u16(256);

    // palette: index 0 black, index 1 white, the rest zero
    w.append_u8_slice(&[0, 0, 0]);
    w.append_u8_slice(&[255, 255, 255]);
    w.append_u8_slice(&vec![0u8; 254 * 3]);
}

pub fn open_bsp_bytes(bytes: &[u8]) -> Result<(Bsp, TempPath), BspError> {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("cannot create temp file");
    file.write_all(bytes).expect("cannot write temp file");
    file.flush().expect("cannot flush temp file");

    let path = file.into_temp_path();
    let bsp = Bsp::open(&path)?;

    Ok((bsp, path))
}

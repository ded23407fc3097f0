//! MagicaVoxel container serialization.
//!
//! One scene per file: a root transform over one group, one transform/shape
//! pair per model with a translation-only transform, one layer, and the
//! shared RGBA palette. Cells with palette index 0 are empty and are not
//! emitted.

use std::{fs, path::Path};

use byte_writer::ByteWriter;

use crate::{Palette, VoxelModel, error::VoxelError, generate_palette};

const VOX_VERSION: i32 = 150;

fn append_chunk(w: &mut ByteWriter, id: &[u8; 4], content: &[u8], children: &[u8]) {
    w.append_u8_slice(id);
    w.append_u32(content.len() as u32);
    w.append_u32(children.len() as u32);
    w.append_u8_slice(content);
    w.append_u8_slice(children);
}

fn append_dict(w: &mut ByteWriter, pairs: &[(&str, &str)]) {
    w.append_u32(pairs.len() as u32);
    for (key, value) in pairs {
        w.append_u32(key.len() as u32);
        w.append_string(key);
        w.append_u32(value.len() as u32);
        w.append_string(value);
    }
}

fn size_chunk(model: &VoxelModel) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.append_u32(model.size.x);
    w.append_u32(model.size.y);
    w.append_u32(model.size.z);

    w.into_bytes()
}

fn xyzi_chunk(model: &VoxelModel, indices: &[u8]) -> Vec<u8> {
    let mut w = ByteWriter::new();

    let count_at = w.get_offset();
    w.append_u32(0);

    let mut written = 0u32;
    for (cell, &index) in indices.iter().enumerate() {
        if index == 0 {
            continue;
        }

        let cell = cell as u32;
        let x = cell % model.size.x;
        let y = cell / model.size.x % model.size.y;
        let z = cell / (model.size.x * model.size.y);

        w.append_u8(x as u8);
        w.append_u8(y as u8);
        w.append_u8(z as u8);
        w.append_u8(index);
        written += 1;
    }

    w.replace_with_u32(count_at, written);

    w.into_bytes()
}

fn transform_chunk(node_id: u32, child_id: u32, layer: i32, name: &str, translation: &str) -> Vec<u8> {
    let mut w = ByteWriter::new();

    w.append_u32(node_id);
    append_dict(&mut w, &[("_name", name)]);
    w.append_u32(child_id);
    w.append_i32(-1); // reserved
    w.append_i32(layer);
    w.append_u32(1); // one frame
    append_dict(&mut w, &[("_t", translation)]);

    w.into_bytes()
}

fn group_chunk(node_id: u32, children: &[u32]) -> Vec<u8> {
    let mut w = ByteWriter::new();

    w.append_u32(node_id);
    append_dict(&mut w, &[]);
    w.append_u32(children.len() as u32);
    w.append_u32_slice(children);

    w.into_bytes()
}

fn shape_chunk(node_id: u32, model_id: u32) -> Vec<u8> {
    let mut w = ByteWriter::new();

    w.append_u32(node_id);
    append_dict(&mut w, &[]);
    w.append_u32(1); // one model
    w.append_u32(model_id);
    append_dict(&mut w, &[]);

    w.into_bytes()
}

fn layer_chunk() -> Vec<u8> {
    let mut w = ByteWriter::new();

    w.append_u32(0);
    append_dict(&mut w, &[("_name", "brushes")]);
    w.append_i32(-1); // reserved

    w.into_bytes()
}

fn rgba_chunk(palette: &Palette) -> Vec<u8> {
    let mut w = ByteWriter::new();

    // palette entry i is color i - 1 of the chunk, entry 0 wraps to the end
    for i in 0..256 {
        w.append_u8_slice(&palette[(i + 1) % 256]);
    }

    w.into_bytes()
}

/// Serializes the models and their shared palette into `.vox` bytes.
pub fn encode_vox(models: &[VoxelModel], seed: u64) -> Vec<u8> {
    let (palette, indices) = generate_palette(models, seed);

    let mut children = ByteWriter::new();

    for (model, indices) in models.iter().zip(&indices) {
        append_chunk(&mut children, b"SIZE", &size_chunk(model), &[]);
        append_chunk(&mut children, b"XYZI", &xyzi_chunk(model, indices), &[]);
    }

    // scene graph: root transform 0 -> group 1 -> (transform, shape) pairs
    append_chunk(
        &mut children,
        b"nTRN",
        &transform_chunk(0, 1, -1, "", "0 0 0"),
        &[],
    );

    let instance_transforms: Vec<u32> = (0..models.len() as u32).map(|i| 2 + 2 * i).collect();
    append_chunk(&mut children, b"nGRP", &group_chunk(1, &instance_transforms), &[]);

    for (i, model) in models.iter().enumerate() {
        let transform_id = 2 + 2 * i as u32;
        let translation = format!("{} {} {}", model.pos.x, model.pos.y, model.pos.z);

        append_chunk(
            &mut children,
            b"nTRN",
            &transform_chunk(transform_id, transform_id + 1, 0, &model.name, &translation),
            &[],
        );
        append_chunk(
            &mut children,
            b"nSHP",
            &shape_chunk(transform_id + 1, i as u32),
            &[],
        );
    }

    append_chunk(&mut children, b"LAYR", &layer_chunk(), &[]);
    append_chunk(&mut children, b"RGBA", &rgba_chunk(&palette), &[]);

    let mut w = ByteWriter::new();
    w.append_u8_slice(b"VOX ");
    w.append_i32(VOX_VERSION);
    append_chunk(&mut w, b"MAIN", &[], &children.into_bytes());

    w.into_bytes()
}

pub fn write_magicavoxel(
    path: impl AsRef<Path>,
    models: &[VoxelModel],
    seed: u64,
) -> Result<(), VoxelError> {
    let path = path.as_ref();

    fs::write(path, encode_vox(models, seed)).map_err(|source| VoxelError::Io {
        source,
        path: path.to_path_buf(),
    })
}

//! Texture directory navigation and mip texture decoding.
//!
//! A directory entry either embeds its mip texture body in the BSP or, when
//! all four mip offsets are zero, refers to a WAD entry of the same name.
//! [`Bsp::load_textures`] resolves and decodes every entry once; decoded
//! pixel buffers are owned by the reader and live as long as it does.

use bytemuck::pod_read_unaligned;
use tracing::warn;
use wad::Wad;

use crate::{
    Bsp,
    error::BspError,
    lumps::{LUMP_NAMES, LUMP_TEXTURES, MipTexHeader},
};

/// A decoded mip level 0: 24-bit RGB, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl Texture {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[(y * self.width + x) as usize]
    }
}

impl Bsp {
    /// Walks the texture directory: byte offset and header of every record.
    ///
    /// Directory-level inconsistencies are fatal for the file.
    fn texture_dir(&self) -> Result<Vec<(usize, MipTexHeader)>, BspError> {
        let lump = self.lump_bytes(LUMP_TEXTURES);

        if lump.len() < 4 {
            return Err(BspError::BadTextureDirectory);
        }

        let count = u32::from_le_bytes(lump[0..4].try_into().unwrap()) as usize;
        let offsets_end = 4usize
            .checked_add(count.checked_mul(4).ok_or(BspError::BadTextureDirectory)?)
            .ok_or(BspError::BadTextureDirectory)?;

        if offsets_end > lump.len() {
            return Err(BspError::BadTextureDirectory);
        }

        let mut entries = Vec::with_capacity(count);

        for i in 0..count {
            let offset =
                i32::from_le_bytes(lump[4 + i * 4..8 + i * 4].try_into().unwrap()) as usize;

            if offset.checked_add(MipTexHeader::SIZE).is_none_or(|end| end > lump.len()) {
                return Err(BspError::TruncatedMipTexture);
            }

            let header: MipTexHeader =
                pod_read_unaligned(&lump[offset..offset + MipTexHeader::SIZE]);

            entries.push((offset, header));
        }

        Ok(entries)
    }

    pub fn texture_count(&self) -> Result<usize, BspError> {
        Ok(self.texture_dir()?.len())
    }

    pub fn texture_name(&self, texture_id: u32) -> Result<String, BspError> {
        let dir = self.texture_dir()?;
        let (_, header) = dir
            .get(texture_id as usize)
            .ok_or(BspError::IndexOutOfRange {
                lump: LUMP_NAMES[LUMP_TEXTURES],
                index: texture_id as usize,
            })?;

        Ok(header.name())
    }

    /// Linear scan of the directory. An unknown name maps to 0, which by
    /// convention refers to the first loaded texture.
    pub fn texture_id(&self, name: &str) -> Result<u32, BspError> {
        let dir = self.texture_dir()?;

        Ok(dir
            .iter()
            .position(|(_, header)| header.name() == name)
            .unwrap_or(0) as u32)
    }

    /// Decodes every texture in the directory, resolving external entries by
    /// name through `wads` in order. A texture that cannot be resolved or
    /// decoded leaves an empty slot and a log line.
    pub fn load_textures(&mut self, wads: &[Wad]) -> Result<(), BspError> {
        let dir = self.texture_dir()?;
        let lump = self.lump_bytes(LUMP_TEXTURES);

        let mut loaded = Vec::with_capacity(dir.len());

        for (offset, header) in &dir {
            let name = header.name();

            let record = if header.is_external() {
                let Some(record) = wads.iter().find_map(|wad| wad.get(&name)) else {
                    warn!("Could not find texture '{name}'");
                    loaded.push(None);
                    continue;
                };

                record
            } else {
                &lump[*offset..]
            };

            match decode_mip_texture(record) {
                Ok(texture) => loaded.push(Some(texture)),
                Err(e) => {
                    warn!("Cannot decode texture '{name}': {e}");
                    loaded.push(None);
                }
            }
        }

        self.loaded_textures = loaded;

        Ok(())
    }

    /// Whether the slot itself decoded, without the fallback.
    pub fn has_texture(&self, texture_id: u32) -> bool {
        matches!(self.loaded_textures.get(texture_id as usize), Some(Some(_)))
    }

    /// The decoded texture for a slot, falling back to the first loaded
    /// texture when the slot is empty or out of range.
    pub fn texture_data(&self, texture_id: u32) -> Option<&Texture> {
        self.loaded_textures
            .get(texture_id as usize)
            .and_then(|slot| slot.as_ref())
            .or_else(|| self.first_loaded_texture())
    }

    pub fn texture_data_by_name(&self, name: &str) -> Option<&Texture> {
        let id = self.texture_id(name).ok()?;

        if id == 0 && !self.texture_name(0).is_ok_and(|first| first == name) {
            warn!("Could not find texture '{name}'");
        }

        self.texture_data(id)
    }

    fn first_loaded_texture(&self) -> Option<&Texture> {
        self.loaded_textures.iter().flatten().next()
    }
}

/// Expands mip level 0 of a record through its embedded 256-entry palette.
///
/// The palette sits `texels/64 + 2` bytes after the mip 3 offset: past the
/// smallest mip level and the two-byte marker.
pub(crate) fn decode_mip_texture(record: &[u8]) -> Result<Texture, BspError> {
    if record.len() < MipTexHeader::SIZE {
        return Err(BspError::TruncatedMipTexture);
    }

    let header: MipTexHeader = pod_read_unaligned(&record[..MipTexHeader::SIZE]);

    let texels = (header.width as usize)
        .checked_mul(header.height as usize)
        .ok_or(BspError::TexelsOutOfBounds)?;

    let palette_base = (header.mip_offsets[3] as usize)
        .checked_add(texels / 64 + 2)
        .ok_or(BspError::PaletteOutOfBounds)?;

    if palette_base.checked_add(768).is_none_or(|end| end > record.len()) {
        return Err(BspError::PaletteOutOfBounds);
    }

    let data_start = header.mip_offsets[0] as usize;
    if data_start.checked_add(texels).is_none_or(|end| end > palette_base) {
        return Err(BspError::TexelsOutOfBounds);
    }

    let indices = &record[data_start..data_start + texels];
    let palette = &record[palette_base..palette_base + 768];

    let pixels = indices
        .iter()
        .map(|&index| {
            let at = index as usize * 3;
            [palette[at], palette[at + 1], palette[at + 2]]
        })
        .collect();

    Ok(Texture {
        width: header.width,
        height: header.height,
        pixels,
    })
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use byte_writer::ByteWriter;

    use super::*;
    use crate::test_support::{TestMap, TestTexture, open_bsp_bytes, write_mip_texture};

    fn build_wad(textures: &[TestTexture]) -> Vec<u8> {
        let mut w = ByteWriter::new();

        w.append_u8_slice(b"WAD3");
        w.append_u32(textures.len() as u32);
        let dir_offset_patch = w.get_offset();
        w.append_u32(0);

        let mut bodies = vec![];
        for texture in textures {
            let start = w.get_offset();
            write_mip_texture(&mut w, texture);
            bodies.push((start, w.get_offset() - start));
        }

        w.replace_with_u32(dir_offset_patch, w.get_offset() as u32);

        for (texture, (offset, size)) in textures.iter().zip(bodies) {
            w.append_u32(offset as u32);
            w.append_u32(size as u32);
            w.append_u32(size as u32);
            w.append_u8(0x43);
            w.append_u8(0);
            w.append_u16(0);
            w.append_string_fixed(&texture.name, 16);
        }

        w.into_bytes()
    }

    fn open_wad(bytes: &[u8]) -> (Wad, tempfile::TempPath) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();

        let path = file.into_temp_path();
        let wad = Wad::open(&path).unwrap();

        (wad, path)
    }

    #[test]
    fn decodes_the_internal_checkerboard() {
        let (mut bsp, _guard) = open_bsp_bytes(&TestMap::single_quad().build()).unwrap();

        bsp.load_textures(&[]).unwrap();

        assert_eq!(bsp.texture_count().unwrap(), 1);
        assert_eq!(bsp.texture_name(0).unwrap(), "CHECKER");
        assert_eq!(bsp.texture_id("CHECKER").unwrap(), 0);

        let texture = bsp.texture_data(0).unwrap();
        assert_eq!((texture.width, texture.height), (16, 16));
        assert_eq!(texture.pixel(0, 0), [0, 0, 0]);
        assert_eq!(texture.pixel(1, 0), [255, 255, 255]);
        assert_eq!(texture.pixel(1, 1), [0, 0, 0]);
    }

    #[test]
    fn unknown_texture_name_maps_to_zero() {
        let (bsp, _guard) = open_bsp_bytes(&TestMap::single_quad().build()).unwrap();

        assert_eq!(bsp.texture_id("NOPE").unwrap(), 0);
    }

    #[test]
    fn unresolved_external_texture_leaves_an_empty_slot() {
        let mut map = TestMap::single_quad();
        map.textures.push(TestTexture {
            name: "FOO".to_string(),
            width: 16,
            height: 16,
            internal: false,
        });
        let (mut bsp, _guard) = open_bsp_bytes(&map.build()).unwrap();

        bsp.load_textures(&[]).unwrap();

        assert!(bsp.has_texture(0));
        assert!(!bsp.has_texture(1));

        // the id-based query falls back to the first loaded texture
        let fallback = bsp.texture_data(1).unwrap();
        assert_eq!((fallback.width, fallback.height), (16, 16));
    }

    #[test]
    fn external_texture_resolves_case_insensitively() {
        let mut map = TestMap::single_quad();
        map.textures.push(TestTexture {
            name: "FOO".to_string(),
            width: 16,
            height: 16,
            internal: false,
        });
        let (mut bsp, _bsp_guard) = open_bsp_bytes(&map.build()).unwrap();

        // the WAD stores the entry in lowercase
        let (wad, _wad_guard) = open_wad(&build_wad(&[TestTexture {
            name: "foo".to_string(),
            width: 16,
            height: 16,
            internal: true,
        }]));

        bsp.load_textures(&[wad]).unwrap();

        assert!(bsp.has_texture(1));
        assert_eq!(bsp.texture_data(1).unwrap().pixel(1, 0), [255, 255, 255]);
    }

    #[test]
    fn lookup_by_name_falls_back_to_the_first_loaded_texture() {
        let (mut bsp, _guard) = open_bsp_bytes(&TestMap::single_quad().build()).unwrap();

        bsp.load_textures(&[]).unwrap();

        let by_name = bsp.texture_data_by_name("CHECKER").unwrap();
        assert_eq!(by_name.pixel(1, 0), [255, 255, 255]);

        // unknown names resolve to id 0, the first loaded texture
        assert!(bsp.texture_data_by_name("MISSING").is_some());
    }

    #[test]
    fn truncated_palette_is_a_decode_error() {
        let mut w = ByteWriter::new();
        write_mip_texture(
            &mut w,
            &TestTexture {
                name: "BAD".to_string(),
                width: 16,
                height: 16,
                internal: true,
            },
        );
        let mut record = w.into_bytes();
        record.truncate(record.len() - 10);

        assert!(matches!(
            decode_mip_texture(&record),
            Err(BspError::PaletteOutOfBounds)
        ));
    }
}

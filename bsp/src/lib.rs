//! Memory-mapped reader for GoldSrc BSP v30 map files.
//!
//! The file is mapped read-only and never copied: every lump is exposed as a
//! typed `&[T]` view into the map. The only owned data is the texture cache
//! filled by [`Bsp::load_textures`].

use std::{borrow::Cow, fs::File, ops::Range, path::Path};

use memmap2::Mmap;

pub mod entities;
pub mod error;
mod face;
mod lumps;
mod textures;
mod utils;

pub use entities::Entity;
pub use error::BspError;
pub use face::{Polygon, TexAxis};
pub use lumps::*;
pub use textures::Texture;

pub struct Bsp {
    mmap: Mmap,
    lump_ranges: [Range<usize>; LUMP_MAX],
    // one slot per texture directory entry, `None` when the texture could not
    // be resolved or decoded
    pub(crate) loaded_textures: Vec<Option<Texture>>,
}

impl Bsp {
    /// Maps the file read-only and validates the header and the lump table.
    ///
    /// An unsupported version or a lump table inconsistency is fatal for the
    /// whole file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BspError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BspError::Io {
            source,
            path: path.to_path_buf(),
        })?;

        // Safety: the map is read-only and the file is never truncated by us.
        let mmap = unsafe {
            Mmap::map(&file).map_err(|source| BspError::Io {
                source,
                path: path.to_path_buf(),
            })?
        };

        #[cfg(unix)]
        {
            use memmap2::Advice;

            let _ = mmap.advise(Advice::Random);
            let _ = mmap.advise(Advice::WillNeed);
        }
        #[cfg(target_os = "linux")]
        {
            let _ = mmap.advise(memmap2::Advice::HugePage);
        }

        let lump_ranges = parse_header(&mmap)?;

        Ok(Self {
            mmap,
            lump_ranges,
            loaded_textures: vec![],
        })
    }

    pub(crate) fn lump_bytes(&self, lump: usize) -> &[u8] {
        &self.mmap[self.lump_ranges[lump].clone()]
    }

    /// Views a lump as a slice of fixed-size records.
    ///
    /// Trailing bytes that do not make up a whole record are ignored, the
    /// way a pointer-range cast would.
    pub(crate) fn lump_slice<T: bytemuck::Pod>(&self, lump: usize) -> Result<&[T], BspError> {
        let bytes = self.lump_bytes(lump);
        let stride = size_of::<T>();
        let whole = bytes.len() - bytes.len() % stride;

        bytemuck::try_cast_slice(&bytes[..whole]).map_err(|_| BspError::MisalignedLump {
            name: LUMP_NAMES[lump],
        })
    }

    pub fn planes(&self) -> Result<&[Plane], BspError> {
        self.lump_slice(LUMP_PLANES)
    }

    pub fn vertices(&self) -> Result<&[Vertex], BspError> {
        self.lump_slice(LUMP_VERTICES)
    }

    pub fn nodes(&self) -> Result<&[Node], BspError> {
        self.lump_slice(LUMP_NODES)
    }

    pub fn texinfos(&self) -> Result<&[TexInfo], BspError> {
        self.lump_slice(LUMP_TEXINFO)
    }

    pub fn faces(&self) -> Result<&[Face], BspError> {
        self.lump_slice(LUMP_FACES)
    }

    pub fn clip_nodes(&self) -> Result<&[ClipNode], BspError> {
        self.lump_slice(LUMP_CLIPNODES)
    }

    pub fn leaves(&self) -> Result<&[Leaf], BspError> {
        self.lump_slice(LUMP_LEAVES)
    }

    pub fn mark_surfaces(&self) -> Result<&[MarkSurface], BspError> {
        self.lump_slice(LUMP_MARKSURFACES)
    }

    pub fn edges(&self) -> Result<&[Edge], BspError> {
        self.lump_slice(LUMP_EDGES)
    }

    pub fn surf_edges(&self) -> Result<&[SurfEdge], BspError> {
        self.lump_slice(LUMP_SURFEDGES)
    }

    pub fn models(&self) -> Result<&[Model], BspError> {
        self.lump_slice(LUMP_MODELS)
    }

    /// The entity lump as text, with trailing padding stripped.
    pub fn entities_text(&self) -> Cow<'_, str> {
        let bytes = self.lump_bytes(LUMP_ENTITIES);
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);

        String::from_utf8_lossy(&bytes[..end])
    }

    /// Tokenizes the entity lump into raw key/value records.
    pub fn entities(&self) -> Result<Vec<Entity>, BspError> {
        entities::parse_entities(&self.entities_text())
    }

    pub fn model_aabb(&self, model_id: u32) -> Result<(glam::Vec3, glam::Vec3), BspError> {
        let models = self.models()?;
        let model = models
            .get(model_id as usize)
            .ok_or(BspError::IndexOutOfRange {
                lump: LUMP_NAMES[LUMP_MODELS],
                index: model_id as usize,
            })?;

        Ok((model.mins.into(), model.maxs.into()))
    }
}

fn parse_header(bytes: &[u8]) -> Result<[Range<usize>; LUMP_MAX], BspError> {
    const HEADER_SIZE: usize = 4 + LUMP_MAX * size_of::<LumpEntry>();

    if bytes.len() < HEADER_SIZE {
        return Err(BspError::TooSmall);
    }

    let version = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
    if version != BSP_VERSION {
        return Err(BspError::UnsupportedVersion { version });
    }

    let mut ranges: [Range<usize>; LUMP_MAX] = std::array::from_fn(|_| 0..0);

    for (i, range) in ranges.iter_mut().enumerate() {
        let entry: LumpEntry =
            bytemuck::pod_read_unaligned(&bytes[4 + i * size_of::<LumpEntry>()..][..8]);

        if entry.offset < 0 || entry.length < 0 {
            return Err(BspError::InvalidLump { name: LUMP_NAMES[i] });
        }

        let offset = entry.offset as usize;
        let length = entry.length as usize;

        if offset.checked_add(length).is_none_or(|end| end > bytes.len()) {
            return Err(BspError::LumpOutOfBounds { name: LUMP_NAMES[i] });
        }

        *range = offset..offset + length;
    }

    Ok(ranges)
}

#[cfg(test)]
pub(crate) mod test_support;

//! Memory-mapped reader for GoldSrc WAD3 texture archives.
//!
//! A WAD is a 12-byte header followed by entry bodies and a trailing
//! directory. Entries are looked up by case-insensitive name.

use std::{collections::HashMap, fs::File, path::Path};

use bytemuck::pod_read_unaligned;
use bytemuck_derive::{Pod, Zeroable};
use memmap2::Mmap;

mod error;

pub use error::WadError;

pub const WAD_MAGIC: &[u8; 4] = b"WAD3";
pub const MAX_ENTRY_NAME: usize = 16;

const HEADER_SIZE: usize = 12;
const DIR_ENTRY_SIZE: usize = 32;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DirEntry {
    offset: u32,
    disk_size: u32,
    size: u32,
    type_: u8,
    compressed: u8,
    padding: [u8; 2],
    name: [u8; MAX_ENTRY_NAME],
}

impl DirEntry {
    fn name(&self) -> String {
        let len = self.name.iter().position(|&c| c == 0).unwrap_or(MAX_ENTRY_NAME);

        String::from_utf8_lossy(&self.name[..len]).into_owned()
    }
}

#[derive(Debug)]
struct IndexedEntry {
    name: String,
    offset: usize,
    size: usize,
}

/// An open WAD3 archive.
///
/// Owns the read-only memory map. [`Wad::get`] hands out borrows into the
/// map, so entry data stays valid for as long as the archive is open.
pub struct Wad {
    mmap: Mmap,
    // case-insensitive FNV-1a hash over the entry name, collisions resolved
    // by lowercased comparison
    entries: HashMap<u64, Vec<IndexedEntry>>,
}

pub(crate) fn fnv1a_lowercase(name: &str) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    name.bytes().fold(FNV_OFFSET_BASIS, |hash, c| {
        (hash ^ c.to_ascii_lowercase() as u64).wrapping_mul(FNV_PRIME)
    })
}

impl Wad {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| WadError::Io {
            source,
            path: path.to_path_buf(),
        })?;

        // Safety: the map is read-only and the file is never truncated by us.
        let mmap = unsafe {
            Mmap::map(&file).map_err(|source| WadError::Io {
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

        let entries = index_entries(&mmap)?;

        Ok(Self { mmap, entries })
    }

    /// Looks up an entry by case-insensitive name and returns its raw bytes.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        let bucket = self.entries.get(&fnv1a_lowercase(name))?;

        bucket
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| &self.mmap[entry.offset..entry.offset + entry.size])
    }

    pub fn entry_count(&self) -> usize {
        self.entries.values().map(|bucket| bucket.len()).sum()
    }
}

fn index_entries(bytes: &[u8]) -> Result<HashMap<u64, Vec<IndexedEntry>>, WadError> {
    if bytes.len() < HEADER_SIZE {
        return Err(WadError::TooSmall);
    }

    if &bytes[0..4] != WAD_MAGIC {
        return Err(WadError::BadMagic);
    }

    let entry_count = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
    let entry_offset = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;

    let dir_size = entry_count
        .checked_mul(DIR_ENTRY_SIZE)
        .ok_or(WadError::BadDirectory)?;
    let dir_end = entry_offset.checked_add(dir_size).ok_or(WadError::BadDirectory)?;

    if dir_end > bytes.len() {
        return Err(WadError::BadDirectory);
    }

    let mut entries: HashMap<u64, Vec<IndexedEntry>> = HashMap::new();

    for record in bytes[entry_offset..dir_end].chunks_exact(DIR_ENTRY_SIZE) {
        let entry: DirEntry = pod_read_unaligned(record);
        let name = entry.name();

        if entry.compressed != 0 {
            return Err(WadError::CompressedEntry { name });
        }

        let offset = entry.offset as usize;
        let size = entry.size as usize;

        if offset.checked_add(size).is_none_or(|end| end > bytes.len()) {
            return Err(WadError::EntryOutOfBounds { name });
        }

        entries
            .entry(fnv1a_lowercase(&name))
            .or_default()
            .push(IndexedEntry { name, offset, size });
    }

    Ok(entries)
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use byte_writer::ByteWriter;

    use super::*;

    fn build_wad(entries: &[(&str, &[u8], u8)]) -> Vec<u8> {
        let mut w = ByteWriter::new();

        w.append_u8_slice(WAD_MAGIC);
        w.append_u32(entries.len() as u32);
        let dir_offset_patch = w.get_offset();
        w.append_u32(0);

        let mut bodies = vec![];
        for (_, data, _) in entries {
            bodies.push(w.get_offset());
            w.append_u8_slice(data);
        }

        w.replace_with_u32(dir_offset_patch, w.get_offset() as u32);

        for ((name, data, compressed), body_offset) in entries.iter().zip(bodies) {
            w.append_u32(body_offset as u32);
            w.append_u32(data.len() as u32);
            w.append_u32(data.len() as u32);
            w.append_u8(0x43); // miptex
            w.append_u8(*compressed);
            w.append_u16(0);
            w.append_string_fixed(name, MAX_ENTRY_NAME);
        }

        w.into_bytes()
    }

    fn open_wad(bytes: &[u8]) -> Result<Wad, WadError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();

        Wad::open(file.path())
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let wad = open_wad(&build_wad(&[
            ("CRATE01", b"aaaa", 0),
            ("{blue", b"bbbb", 0),
        ]))
        .unwrap();

        assert_eq!(wad.entry_count(), 2);
        assert_eq!(wad.get("crate01"), Some(b"aaaa".as_slice()));
        assert_eq!(wad.get("CRATE01"), Some(b"aaaa".as_slice()));
        assert_eq!(wad.get("{BLUE"), Some(b"bbbb".as_slice()));
        assert_eq!(wad.get("missing"), None);
    }

    #[test]
    fn compressed_entries_are_rejected() {
        let res = open_wad(&build_wad(&[("CRATE01", b"aaaa", 1)]));

        assert!(matches!(
            res,
            Err(WadError::CompressedEntry { name }) if name == "CRATE01"
        ));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = build_wad(&[("CRATE01", b"aaaa", 0)]);
        bytes[..4].copy_from_slice(b"WAD2");

        assert!(matches!(open_wad(&bytes), Err(WadError::BadMagic)));
    }

    #[test]
    fn truncated_directory_is_rejected() {
        let mut bytes = build_wad(&[("CRATE01", b"aaaa", 0)]);
        bytes.truncate(bytes.len() - 8);

        assert!(matches!(open_wad(&bytes), Err(WadError::BadDirectory)));
    }

    #[test]
    fn hash_ignores_case() {
        assert_eq!(fnv1a_lowercase("CRATE01"), fnv1a_lowercase("crate01"));
        assert_ne!(fnv1a_lowercase("crate01"), fnv1a_lowercase("crate02"));
    }
}

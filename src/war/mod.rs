//! Reader for the game's WAR data archives: an indexed bag of byte entries,
//! some of them compressed, holding palettes, tilesets and sprite banks.

use std::{fs, path::Path};

use crate::bytes::Cursor;
use crate::Result;

mod error;
pub use error::WarError;

mod decompress;

mod palette;
pub use palette::{Palette, Transparency};

mod tileset;
pub use tileset::{TileFrame, Tileset};

mod sprites;
pub use sprites::{SpriteFrame, Sprites};

/// Archives start with this identifier word.
const MAGIC: u32 = 0x19;

/// Flag in the top three bits of an entry header marking compressed data.
const ENTRY_COMPRESSED: u32 = 1;

#[derive(Debug)]
struct Entry {
    offset: usize,
    size: usize,
}

/// A read-only WAR archive, held fully in memory.
#[derive(Debug)]
pub struct Archive {
    data: Vec<u8>,
    entries: Vec<Entry>,
    /// File identifier word from the header.
    pub fid: u16,
}

impl Archive {
    /// Opens an archive: verifies the magic word, then reads the entry
    /// offset table. Entry sizes are the gaps between consecutive offsets,
    /// the last one bounded by the file length.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Archive> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| WarError::OpenFailed {
            path: path.to_owned(),
            source,
        })?;

        let mut cur = Cursor::new(&data);
        let magic = cur.read_u32().map_err(WarError::from)?;
        if magic != MAGIC {
            return Err(WarError::InvalidArchive { magic }.into());
        }
        let count = cur.read_u16().map_err(WarError::from)? as usize;
        let fid = cur.read_u16().map_err(WarError::from)?;

        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            offsets.push(cur.read_u32().map_err(WarError::from)? as usize);
        }

        let mut entries = Vec::with_capacity(count);
        for (i, &offset) in offsets.iter().enumerate() {
            let end = offsets.get(i + 1).copied().unwrap_or(data.len());
            if offset > end || end > data.len() {
                return Err(WarError::InvalidArchive { magic }.into());
            }
            entries.push(Entry {
                offset,
                size: end - offset,
            });
        }

        log::debug!(
            "opened archive `{}`: {} entries, fid 0x{fid:04x}",
            path.display(),
            entries.len()
        );
        Ok(Archive { data, entries, fid })
    }

    pub fn entries_count(&self) -> usize {
        self.entries.len()
    }

    /// Extracts entry `i` as an owned buffer, inflating it if the entry is
    /// flagged compressed.
    pub fn entry_extract(&self, entry: usize) -> Result<Vec<u8>> {
        let info = self.entries.get(entry).ok_or(WarError::EntryOutOfRange {
            entry,
            count: self.entries.len(),
        })?;

        let mut cur = Cursor::new(&self.data[info.offset..info.offset + info.size]);
        let header = cur.read_u32().map_err(|_| WarError::CorruptEntry { entry })?;
        let uncompressed_len = (header & 0x1fff_ffff) as usize;
        let flags = header >> 29;

        let payload = &self.data[info.offset + 4..info.offset + info.size];
        match flags {
            0 => {
                if payload.len() < uncompressed_len {
                    return Err(WarError::CorruptEntry { entry }.into());
                }
                Ok(payload[..uncompressed_len].to_vec())
            }
            ENTRY_COMPRESSED => decompress::inflate(payload, uncompressed_len)
                .map_err(|_| WarError::CorruptEntry { entry }.into()),
            _ => {
                log::warn!("entry {entry} carries unknown flags 0x{flags:x}");
                Err(WarError::CorruptEntry { entry }.into())
            }
        }
    }

    /// Extracts entry `i` and decodes it as a 256-colour palette.
    pub fn palette_extract(&self, entry: usize, transparency: Transparency) -> Result<Palette> {
        let bytes = self.entry_extract(entry)?;
        Palette::from_rgb_bytes(&bytes, transparency)
            .ok_or_else(|| WarError::CorruptEntry { entry }.into())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds an in-memory archive from raw entry payloads, none compressed.
    pub(crate) fn build_archive(payloads: &[&[u8]]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC.to_le_bytes());
        data.extend_from_slice(&(payloads.len() as u16).to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());

        let table_end = 8 + payloads.len() * 4;
        let mut offset = table_end;
        for payload in payloads {
            data.extend_from_slice(&(offset as u32).to_le_bytes());
            offset += 4 + payload.len();
        }
        for payload in payloads {
            data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            data.extend_from_slice(payload);
        }
        data
    }

    pub(crate) fn open_bytes(data: Vec<u8>) -> Archive {
        let path = std::env::temp_dir().join(format!(
            "warpud-archive-{}-{}.war",
            std::process::id(),
            data.len()
        ));
        fs::write(&path, &data).unwrap();
        let archive = Archive::open(&path).unwrap();
        fs::remove_file(&path).unwrap();
        archive
    }

    #[test]
    fn entries_extract_by_index() {
        let archive = open_bytes(build_archive(&[b"first", b"second entry"]));
        assert_eq!(archive.entries_count(), 2);
        assert_eq!(archive.entry_extract(0).unwrap(), b"first");
        assert_eq!(archive.entry_extract(1).unwrap(), b"second entry");
    }

    #[test]
    fn out_of_range_entries_are_rejected() {
        let archive = open_bytes(build_archive(&[b"only"]));
        let err = archive.entry_extract(3).unwrap_err();
        assert!(matches!(
            err,
            crate::W2Error::War(WarError::EntryOutOfRange { entry: 3, count: 1 })
        ));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut data = build_archive(&[b"x"]);
        data[0] = 0x77;
        let path = std::env::temp_dir().join(format!("warpud-badmagic-{}.war", std::process::id()));
        fs::write(&path, &data).unwrap();
        let err = Archive::open(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(
            err,
            crate::W2Error::War(WarError::InvalidArchive { .. })
        ));
    }

    #[test]
    fn compressed_entries_are_inflated() {
        // Hand-built LZ stream: two literals then an overlapping reference.
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&12u32.to_le_bytes()); // offset of the entry

        let header: u32 = (1 << 29) | 6; // compressed, 6 bytes uncompressed
        data.extend_from_slice(&header.to_le_bytes());
        data.extend_from_slice(&[0b0000_0011, b'A', b'B', 0x00, 0x10]);

        let archive = open_bytes(data);
        assert_eq!(archive.entry_extract(0).unwrap(), b"ABABAB");
    }

    #[test]
    fn truncated_compressed_entry_is_corrupt() {
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&12u32.to_le_bytes());
        let header: u32 = (1 << 29) | 100;
        data.extend_from_slice(&header.to_le_bytes());
        data.extend_from_slice(&[0xff, b'q']);

        let archive = open_bytes(data);
        let err = archive.entry_extract(0).unwrap_err();
        assert!(matches!(
            err,
            crate::W2Error::War(WarError::CorruptEntry { entry: 0 })
        ));
    }
}

use std::path::PathBuf;

use crate::bytes::EndOfInput;

#[derive(thiserror::Error, Debug)]
pub enum WarError {
    #[error("Failed to open `{path:?}`: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Not a WAR archive (magic 0x{magic:08x}).")]
    InvalidArchive { magic: u32 },
    #[error("Entry {entry} is out of range; the archive holds {count} entries.")]
    EntryOutOfRange { entry: usize, count: usize },
    #[error("Entry {entry} could not be decoded.")]
    CorruptEntry { entry: usize },
    #[error("Frame {frame} of a sprite decoded to the wrong number of pixels.")]
    CorruptSprite { frame: u16 },
    #[error(transparent)]
    EndOfInput(#[from] EndOfInput),
}

use std::path::PathBuf;

use crate::bytes::EndOfInput;
use crate::pud::{OpenMode, Section};

#[derive(thiserror::Error, Debug)]
pub enum PudError {
    #[error("Failed to open `{path:?}`: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("The operation requires the {needed:?} capability.")]
    ModeMismatch { needed: OpenMode },
    #[error(transparent)]
    EndOfInput(#[from] EndOfInput),
    #[error("The required section `{}` was not found.", .0.name())]
    MissingSection(Section),
    #[error("The section `{}` declares a length inconsistent with its payload.", .0.name())]
    CorruptSection(Section),
    #[error("The map has not been parsed.")]
    NotParsed,
    #[error("The coordinates ({x},{y}) are outside of the map.")]
    InvalidCoordinates { x: u16, y: u16 },
    #[error("The description is not Windows-1252 text fitting the 32-byte field.")]
    BadDescription,
    #[error("An IO error occurred: `{0}`")]
    Io(#[from] std::io::Error),
}

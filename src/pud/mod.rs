//! The PUD map codec: a section-based reader and writer for Warcraft II maps.
//!
//! A [`Pud`] handle is opened for reading, writing or both. Read handles keep
//! the whole file in memory and parse it into a [`Document`]; write handles
//! start from built-in defaults and serialise back to canonical bytes.

use std::{fs, io, path::Path};

use bitflags::bitflags;
use rand::Rng;

use crate::{
    common::{Dimensions, Era, Player},
    Result,
};

mod error;
pub use error::PudError;

mod section;
pub use section::Section;

mod check;
pub use check::CheckError;

mod write;
pub use write::WriteOptions;

pub mod minimap;
pub mod units;
pub use units::Unit;

mod defaults;
mod parse;
mod random;
pub use random::tile_variation;

/// Number of unit kinds described by the `UDTA` section.
pub const UNIT_KINDS: usize = 110;
/// Number of upgrades described by the `UGRD` section.
pub const UPGRADE_KINDS: usize = 52;
/// Words of obsolete data preserved verbatim inside `UDTA`.
pub(crate) const OBSOLETE_WORDS: usize = 508;
/// Only the first 58 unit kinds carry a right-click action byte.
pub(crate) const MOUSE_BTN_UNITS: usize = 58;
/// Light ground, the fill tile of freshly created maps.
pub const DEFAULT_TILE: u16 = 0x0050;

/// `VER` word of the original game.
pub const VERSION_WAR2: u16 = 0x11;
/// `VER` word of the Beyond the Dark Portal expansion.
pub const VERSION_WAR2_EXPANSION: u16 = 0x13;

bitflags! {
    /// Capability flags for [`Pud::open`]. Combine with `|`.
    pub struct OpenMode: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        /// Open for reading without parsing; call [`Pud::parse`] later.
        const NO_PARSE = 1 << 2;
    }
}

/// Per-kind unit characteristics from the `UDTA` section.
///
/// The flag-like fields (`has_magic`, `rect_sel`, `weapons_upgradable`,
/// `armor_upgradable`) keep their raw wire byte so a parsed table re-emits
/// byte-identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitData {
    pub overlap_frames: u16,
    pub sight: u32,
    pub hp: u16,
    pub has_magic: u8,
    pub build_time: u8,
    pub gold_cost: u8,
    pub lumber_cost: u8,
    pub oil_cost: u8,
    pub size_w: u16,
    pub size_h: u16,
    pub box_w: u16,
    pub box_h: u16,
    pub range: u8,
    pub computer_react_range: u8,
    pub human_react_range: u8,
    pub armor: u8,
    pub rect_sel: u8,
    pub priority: u8,
    pub basic_damage: u8,
    pub piercing_damage: u8,
    pub weapons_upgradable: u8,
    pub armor_upgradable: u8,
    pub missile_weapon: u8,
    pub kind: u8,
    pub decay_rate: u8,
    pub annoy: u8,
    pub mouse_right_btn: u8,
    pub point_value: u16,
    pub can_target: u8,
    pub flags: u32,
}

/// Per-upgrade characteristics from the `UGRD` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpgradeData {
    pub time: u8,
    pub gold: u16,
    pub lumber: u16,
    pub oil: u16,
    pub icon: u16,
    pub group: u16,
    pub flags: u32,
}

/// One unit placed on the map by the `UNIT` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedUnit {
    pub x: u16,
    pub y: u16,
    /// Raw unit id; see [`PlacedUnit::unit`] for the typed view.
    pub kind: u8,
    /// Owning slot, 0-7 or 15 for neutral.
    pub owner: u8,
    /// Resource amount for gold mines and oil patches, active/passive flag
    /// otherwise.
    pub alter: u16,
}

impl PlacedUnit {
    pub fn unit(&self) -> Option<Unit> {
        Unit::try_from(self.kind).ok()
    }

    pub fn player(&self) -> Option<Player> {
        Player::try_from(self.owner).ok()
    }
}

/// The six allowance bitfield arrays of the `ALOW` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allowances {
    pub units: [u32; 16],
    pub spells_start: [u32; 16],
    pub spells_allowed: [u32; 16],
    pub spells_acquire: [u32; 16],
    pub upgrades_allowed: [u32; 16],
    pub upgrades_acquire: [u32; 16],
}

/// A fully parsed (or freshly constructed) map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub tag: u32,
    pub version: u16,
    /// NUL-padded Windows-1252 text; see [`Pud::description_get`].
    pub description: [u8; 32],
    pub era: Era,
    pub dims: Dimensions,
    pub map_w: u16,
    pub map_h: u16,
    pub owner: crate::common::Slots,
    pub side: crate::common::Slots,
    pub ai: [u8; 16],
    pub sgld: [u16; 16],
    pub slbr: [u16; 16],
    pub soil: [u16; 16],
    pub unit_data: Box<[UnitData; UNIT_KINDS]>,
    pub(crate) obsolete_udta: Box<[u16; OBSOLETE_WORDS]>,
    pub upgrades: Box<[UpgradeData; UPGRADE_KINDS]>,
    pub allow: Allowances,
    pub tiles_map: Vec<u16>,
    pub movement_map: Vec<u16>,
    pub action_map: Vec<u16>,
    pub oil_map: Vec<u16>,
    pub units: Vec<PlacedUnit>,
    /// Set by a successful [`Pud::check`].
    pub starting_points: u32,
    pub(crate) sections: u32,
    pub(crate) has_erax: bool,
    pub(crate) default_udta: u16,
    pub(crate) default_ugrd: u16,
    pub(crate) default_allow: bool,
}

impl Document {
    /// A 32x32 forest map filled with light ground and built-in unit,
    /// upgrade and allowance tables.
    pub fn with_defaults() -> Document {
        let mut doc = Document {
            tag: 0,
            version: VERSION_WAR2_EXPANSION,
            description: [0; 32],
            era: Era::Forest,
            dims: Dimensions::D32,
            map_w: 0,
            map_h: 0,
            owner: defaults::owners(),
            side: defaults::sides(),
            ai: [0; 16],
            sgld: [2000; 16],
            slbr: [1000; 16],
            soil: [1000; 16],
            unit_data: defaults::unit_data(),
            obsolete_udta: Box::new([0; OBSOLETE_WORDS]),
            upgrades: defaults::upgrades(),
            allow: defaults::allowances(),
            tiles_map: Vec::new(),
            movement_map: Vec::new(),
            action_map: Vec::new(),
            oil_map: Vec::new(),
            units: Vec::new(),
            starting_points: 0,
            sections: 0,
            has_erax: false,
            default_udta: 1,
            default_ugrd: 1,
            default_allow: true,
        };
        doc.resize_maps(Dimensions::D32);
        doc
    }

    pub fn tiles(&self) -> usize {
        self.map_w as usize * self.map_h as usize
    }

    /// Reallocates the four cell maps for `dims`: tiles become light ground,
    /// everything else is cleared.
    pub(crate) fn resize_maps(&mut self, dims: Dimensions) {
        let (w, h) = dims.size();
        self.dims = dims;
        self.map_w = w;
        self.map_h = h;
        let tiles = self.tiles();
        self.tiles_map.clear();
        self.tiles_map.resize(tiles, DEFAULT_TILE);
        self.movement_map.clear();
        self.movement_map.resize(tiles, 0);
        self.action_map.clear();
        self.action_map.resize(tiles, 0);
        self.oil_map.clear();
        self.oil_map.resize(tiles, 0);
    }
}

/// A handle over one map file.
#[derive(Debug)]
pub struct Pud {
    mode: OpenMode,
    source: Option<Vec<u8>>,
    init: bool,
    doc: Document,
}

impl Pud {
    /// Opens `path` with the given capabilities.
    ///
    /// An existing file must be opened with `READ`; it is loaded fully into
    /// memory and parsed unless `NO_PARSE` is set. A missing file opened
    /// with `WRITE` yields a fresh default document (random tag, expansion
    /// version, forest, 32x32); nothing touches the disk until
    /// [`Pud::write`]. Any other combination fails with `OpenFailed`.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Pud> {
        let path = path.as_ref();

        if path.exists() {
            if !mode.contains(OpenMode::READ) {
                // A WRITE-only handle over an existing map would clobber it
                // with defaults on the next write.
                return Err(PudError::OpenFailed {
                    path: path.to_owned(),
                    source: io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "existing file opened without READ",
                    ),
                }
                .into());
            }
            let source = fs::read(path).map_err(|source| PudError::OpenFailed {
                path: path.to_owned(),
                source,
            })?;
            log::debug!("opened `{}` ({} bytes, mode {:?})", path.display(), source.len(), mode);
            let mut pud = Pud {
                mode,
                source: Some(source),
                init: false,
                doc: Document::with_defaults(),
            };
            if !mode.contains(OpenMode::NO_PARSE) {
                pud.parse()?;
            }
            return Ok(pud);
        }

        if !mode.contains(OpenMode::WRITE) {
            return Err(PudError::OpenFailed {
                path: path.to_owned(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            }
            .into());
        }

        let mut doc = Document::with_defaults();
        doc.tag = Pud::tag_generate();
        Ok(Pud {
            mode,
            source: None,
            init: false,
            doc,
        })
    }

    /// A random 32-bit map tag.
    pub fn tag_generate() -> u32 {
        rand::thread_rng().gen()
    }

    fn require(&self, needed: OpenMode) -> core::result::Result<(), PudError> {
        if self.mode.contains(needed) {
            Ok(())
        } else {
            Err(PudError::ModeMismatch { needed })
        }
    }

    /// Parses the backing buffer into the document.
    ///
    /// Parsing is atomic: on failure the previous document is kept.
    pub fn parse(&mut self) -> Result<()> {
        self.require(OpenMode::READ)?;
        let Some(source) = self.source.take() else {
            return Err(PudError::ModeMismatch {
                needed: OpenMode::READ,
            }
            .into());
        };
        let parsed = parse::document(&source);
        self.source = Some(source);
        self.doc = parsed?;
        self.init = true;
        Ok(())
    }

    pub fn parsed(&self) -> bool {
        self.init
    }

    /// Serialises the document to `path` with default options.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_with_options(path, WriteOptions::default())
    }

    /// Serialises the document to `path`.
    ///
    /// Writing is atomic: the bytes go to a sibling temporary file which is
    /// renamed over `path` only on success.
    pub fn write_with_options<P: AsRef<Path>>(&self, path: P, options: WriteOptions) -> Result<()> {
        self.require(OpenMode::WRITE)?;
        write::document(&self.doc, path.as_ref(), &options)?;
        Ok(())
    }

    /// Validates units against owners; see [`CheckError`] for the outcomes.
    ///
    /// On success, player slots without units are demoted to nobody and
    /// `starting_points` is updated.
    pub fn check(&mut self) -> core::result::Result<(), CheckError> {
        check::run(self.init, &mut self.doc)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn era(&self) -> Era {
        self.doc.era
    }

    pub fn era_set(&mut self, era: Era) -> Result<()> {
        self.require(OpenMode::WRITE)?;
        self.doc.era = era;
        Ok(())
    }

    pub fn version(&self) -> u16 {
        self.doc.version
    }

    pub fn version_set(&mut self, version: u16) -> Result<()> {
        self.require(OpenMode::WRITE)?;
        self.doc.version = version;
        Ok(())
    }

    pub fn tag(&self) -> u32 {
        self.doc.tag
    }

    pub fn tag_set(&mut self, tag: u32) -> Result<()> {
        self.require(OpenMode::WRITE)?;
        self.doc.tag = tag;
        Ok(())
    }

    pub fn dimensions(&self) -> Dimensions {
        self.doc.dims
    }

    /// Resizes the map. All four cell maps are reset in the process.
    pub fn dimensions_set(&mut self, dims: Dimensions) -> Result<()> {
        self.require(OpenMode::WRITE)?;
        self.doc.resize_maps(dims);
        Ok(())
    }

    /// The map description, decoded from its Windows-1252 bytes.
    pub fn description_get(&self) -> Result<String> {
        self.require(OpenMode::READ)?;
        let len = self
            .doc
            .description
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.doc.description.len());
        let (text, _) =
            encoding_rs::WINDOWS_1252.decode_without_bom_handling(&self.doc.description[..len]);
        Ok(text.into_owned())
    }

    /// Sets the map description.
    ///
    /// Text must encode as Windows-1252 and fit the field with its trailing
    /// NUL, i.e. 31 bytes; anything else is rejected with `BadDescription`.
    pub fn description_set(&mut self, description: &str) -> Result<()> {
        self.require(OpenMode::WRITE)?;
        let (encoded, _, had_errors) = encoding_rs::WINDOWS_1252.encode(description);
        if had_errors || encoded.len() > 31 {
            return Err(PudError::BadDescription.into());
        }
        self.doc.description = [0; 32];
        self.doc.description[..encoded.len()].copy_from_slice(&encoded);
        Ok(())
    }

    pub fn tile_get(&self, x: u16, y: u16) -> Result<u16> {
        self.require(OpenMode::READ)?;
        if x >= self.doc.map_w || y >= self.doc.map_h {
            return Err(PudError::InvalidCoordinates { x, y }.into());
        }
        Ok(self.doc.tiles_map[y as usize * self.doc.map_w as usize + x as usize])
    }

    pub fn tile_set(&mut self, x: u16, y: u16, tile: u16) -> Result<()> {
        self.require(OpenMode::WRITE)?;
        if x >= self.doc.map_w || y >= self.doc.map_h {
            return Err(PudError::InvalidCoordinates { x, y }.into());
        }
        self.doc.tiles_map[y as usize * self.doc.map_w as usize + x as usize] = tile;
        Ok(())
    }

    pub fn unit_add(&mut self, x: u16, y: u16, player: Player, unit: Unit, alter: u16) -> Result<()> {
        self.require(OpenMode::WRITE)?;
        if x >= self.doc.map_w || y >= self.doc.map_h {
            return Err(PudError::InvalidCoordinates { x, y }.into());
        }
        self.doc.units.push(PlacedUnit {
            x,
            y,
            kind: unit.id(),
            owner: player as u8,
            alter,
        });
        Ok(())
    }

    pub fn units(&self) -> &[PlacedUnit] {
        &self.doc.units
    }

    pub fn starting_points(&self) -> u32 {
        self.doc.starting_points
    }

    /// Whether the parsed file contained `section`.
    pub fn section_has(&self, section: Section) -> bool {
        self.doc.sections & section.bit() != 0
    }
}

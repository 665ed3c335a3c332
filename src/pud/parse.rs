//! Section-by-section reader for the PUD body.
//!
//! Sections are located by scanning forward for the four tag bytes, so
//! unknown bytes between sections are tolerated. Seeking a tag that sits
//! before the cursor rewinds to the start of the buffer first.

use crate::bytes::{Cursor, EndOfInput};
use crate::common::{Dimensions, Era, Slots};
use crate::pud::{
    Document, PlacedUnit, PudError, Section, UnitData, UpgradeData, UNIT_KINDS, UPGRADE_KINDS,
};

struct Scanner<'a> {
    cur: Cursor<'a>,
    current: Section,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a [u8]) -> Self {
        Scanner {
            cur: Cursor::new(source),
            current: Section::Type,
        }
    }

    /// Scans for `sec` and returns its declared length, or `None` if the end
    /// of the buffer is reached first. On a match the cursor sits at the
    /// first payload byte.
    fn seek(&mut self, sec: Section) -> Option<u32> {
        if sec <= self.current {
            self.cur.rewind();
        }
        // Pessimistically point at the last section so a failed search makes
        // the next seek rewind.
        self.current = Section::Unit;

        let mut tag = [0u8; 4];
        if self.cur.read_exact(&mut tag).is_err() {
            return None;
        }
        loop {
            if &tag == sec.tag() {
                self.current = sec;
                return self.cur.read_u32().ok();
            }
            tag.copy_within(1.., 0);
            match self.cur.read_u8() {
                Ok(byte) => tag[3] = byte,
                Err(EndOfInput) => return None,
            }
        }
    }

    /// Seeks a required section and validates its length against the buffer.
    fn require(&mut self, sec: Section) -> Result<u32, PudError> {
        let len = self.seek(sec).ok_or(PudError::MissingSection(sec))?;
        if len as usize > self.cur.remaining() {
            return Err(PudError::CorruptSection(sec));
        }
        log::debug!("section {} ({len} bytes)", sec.name());
        Ok(len)
    }

    fn require_exact(&mut self, sec: Section, expected: usize) -> Result<(), PudError> {
        if self.require(sec)? as usize != expected {
            return Err(PudError::CorruptSection(sec));
        }
        Ok(())
    }
}

fn read_u8_column(
    cur: &mut Cursor,
    table: &mut [UnitData; UNIT_KINDS],
    set: impl Fn(&mut UnitData, u8),
) -> Result<(), EndOfInput> {
    for data in table.iter_mut() {
        set(data, cur.read_u8()?);
    }
    Ok(())
}

fn read_u16_words(cur: &mut Cursor, out: &mut [u16]) -> Result<(), EndOfInput> {
    for word in out.iter_mut() {
        *word = cur.read_u16()?;
    }
    Ok(())
}

fn read_u32_words(cur: &mut Cursor, out: &mut [u32]) -> Result<(), EndOfInput> {
    for word in out.iter_mut() {
        *word = cur.read_u32()?;
    }
    Ok(())
}

pub(crate) fn document(source: &[u8]) -> Result<Document, PudError> {
    let mut doc = Document::with_defaults();
    let mut scan = Scanner::new(source);

    parse_type(&mut doc, &mut scan)?;
    parse_ver(&mut doc, &mut scan)?;
    parse_desc(&mut doc, &mut scan)?;
    parse_ownr(&mut doc, &mut scan)?;
    parse_era(&mut doc, &mut scan)?; // also parses ERAX
    parse_dim(&mut doc, &mut scan)?;
    parse_udta(&mut doc, &mut scan)?;
    parse_alow(&mut doc, &mut scan)?;
    parse_ugrd(&mut doc, &mut scan)?;
    parse_side(&mut doc, &mut scan)?;
    parse_sgld(&mut doc, &mut scan)?;
    parse_slbr(&mut doc, &mut scan)?;
    parse_soil(&mut doc, &mut scan)?;
    parse_aipl(&mut doc, &mut scan)?;
    parse_mtxm(&mut doc, &mut scan)?;
    parse_sqm(&mut doc, &mut scan)?;
    parse_oilm(&mut doc, &mut scan)?;
    parse_regm(&mut doc, &mut scan)?;
    parse_unit(&mut doc, &mut scan)?;

    Ok(doc)
}

fn parse_type(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Type, 16)?;

    let mut header = [0u8; 9];
    scan.cur.read_exact(&mut header)?;
    if &header[..8] != b"WAR2 MAP" || header[8] != 0 {
        return Err(PudError::CorruptSection(Section::Type));
    }
    scan.cur.skip(3)?; // reserved byte, 0x0A, 0xFF
    doc.tag = scan.cur.read_u32()?;

    doc.sections |= Section::Type.bit();
    Ok(())
}

fn parse_ver(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Ver, 2)?;
    doc.version = scan.cur.read_u16()?;
    doc.sections |= Section::Ver.bit();
    Ok(())
}

fn parse_desc(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Desc, 32)?;
    scan.cur.read_exact(&mut doc.description)?;
    doc.sections |= Section::Desc.bit();
    Ok(())
}

fn parse_ownr(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Ownr, 16)?;
    let mut bytes = [0u8; 16];
    scan.cur.read_exact(&mut bytes)?;
    doc.owner = Slots::from_array(bytes);
    doc.sections |= Section::Ownr.bit();
    Ok(())
}

fn era_from_word(word: u16, fallback: Era) -> Era {
    Era::from_word(word).unwrap_or_else(|| {
        log::warn!("unknown era word 0x{word:04x}, keeping {}", fallback.name());
        fallback
    })
}

fn parse_era(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Era, 2)?;
    doc.era = era_from_word(scan.cur.read_u16()?, Era::Forest);
    doc.sections |= Section::Era.bit();

    // The expansion's ERAX overrides ERA when present.
    if let Some(len) = scan.seek(Section::Erax) {
        if len != 2 || scan.cur.remaining() < 2 {
            return Err(PudError::CorruptSection(Section::Erax));
        }
        doc.era = era_from_word(scan.cur.read_u16()?, doc.era);
        doc.has_erax = true;
        doc.sections |= Section::Erax.bit();
    }
    Ok(())
}

fn parse_dim(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Dim, 4)?;
    let w = scan.cur.read_u16()?;
    let h = scan.cur.read_u16()?;
    let dims = Dimensions::from_size(w, h).ok_or(PudError::CorruptSection(Section::Dim))?;
    doc.resize_maps(dims);
    doc.sections |= Section::Dim.bit();
    Ok(())
}

fn parse_udta(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Udta, 5696)?;
    let cur = &mut scan.cur;
    let table = &mut doc.unit_data;

    doc.default_udta = cur.read_u16()?;
    for data in table.iter_mut() {
        data.overlap_frames = cur.read_u16()?;
    }
    read_u16_words(cur, doc.obsolete_udta.as_mut_slice())?;
    for data in table.iter_mut() {
        data.sight = cur.read_u32()?;
    }
    for data in table.iter_mut() {
        data.hp = cur.read_u16()?;
    }
    read_u8_column(cur, table, |d, v| d.has_magic = v)?;
    read_u8_column(cur, table, |d, v| d.build_time = v)?;
    read_u8_column(cur, table, |d, v| d.gold_cost = v)?;
    read_u8_column(cur, table, |d, v| d.lumber_cost = v)?;
    read_u8_column(cur, table, |d, v| d.oil_cost = v)?;
    for data in table.iter_mut() {
        let packed = cur.read_u32()?;
        data.size_w = (packed >> 16) as u16;
        data.size_h = packed as u16;
    }
    for data in table.iter_mut() {
        let packed = cur.read_u32()?;
        data.box_w = (packed >> 16) as u16;
        data.box_h = packed as u16;
    }
    read_u8_column(cur, table, |d, v| d.range = v)?;
    read_u8_column(cur, table, |d, v| d.computer_react_range = v)?;
    read_u8_column(cur, table, |d, v| d.human_react_range = v)?;
    read_u8_column(cur, table, |d, v| d.armor = v)?;
    read_u8_column(cur, table, |d, v| d.rect_sel = v)?;
    read_u8_column(cur, table, |d, v| d.priority = v)?;
    read_u8_column(cur, table, |d, v| d.basic_damage = v)?;
    read_u8_column(cur, table, |d, v| d.piercing_damage = v)?;
    read_u8_column(cur, table, |d, v| d.weapons_upgradable = v)?;
    read_u8_column(cur, table, |d, v| d.armor_upgradable = v)?;
    read_u8_column(cur, table, |d, v| d.missile_weapon = v)?;
    read_u8_column(cur, table, |d, v| d.kind = v)?;
    read_u8_column(cur, table, |d, v| d.decay_rate = v)?;
    read_u8_column(cur, table, |d, v| d.annoy = v)?;
    for data in table.iter_mut().take(crate::pud::MOUSE_BTN_UNITS) {
        data.mouse_right_btn = cur.read_u8()?;
    }
    for data in table.iter_mut() {
        data.point_value = cur.read_u16()?;
    }
    read_u8_column(cur, table, |d, v| d.can_target = v)?;
    for data in table.iter_mut() {
        data.flags = cur.read_u32()?;
    }

    doc.sections |= Section::Udta.bit();
    Ok(())
}

fn parse_alow(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    let Some(len) = scan.seek(Section::Alow) else {
        // Absent is first-class: the built-in defaults stay in place.
        doc.default_allow = true;
        return Ok(());
    };
    if len != 384 || scan.cur.remaining() < 384 {
        return Err(PudError::CorruptSection(Section::Alow));
    }

    let cur = &mut scan.cur;
    read_u32_words(cur, &mut doc.allow.units)?;
    read_u32_words(cur, &mut doc.allow.spells_start)?;
    read_u32_words(cur, &mut doc.allow.spells_allowed)?;
    read_u32_words(cur, &mut doc.allow.spells_acquire)?;
    read_u32_words(cur, &mut doc.allow.upgrades_allowed)?;
    read_u32_words(cur, &mut doc.allow.upgrades_acquire)?;

    doc.default_allow = false;
    doc.sections |= Section::Alow.bit();
    Ok(())
}

fn parse_ugrd(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Ugrd, 782)?;
    let cur = &mut scan.cur;
    let table: &mut [UpgradeData; UPGRADE_KINDS] = &mut doc.upgrades;

    doc.default_ugrd = cur.read_u16()?;
    for upgrade in table.iter_mut() {
        upgrade.time = cur.read_u8()?;
    }
    for upgrade in table.iter_mut() {
        upgrade.gold = cur.read_u16()?;
    }
    for upgrade in table.iter_mut() {
        upgrade.lumber = cur.read_u16()?;
    }
    for upgrade in table.iter_mut() {
        upgrade.oil = cur.read_u16()?;
    }
    for upgrade in table.iter_mut() {
        upgrade.icon = cur.read_u16()?;
    }
    for upgrade in table.iter_mut() {
        upgrade.group = cur.read_u16()?;
    }
    for upgrade in table.iter_mut() {
        upgrade.flags = cur.read_u32()?;
    }

    doc.sections |= Section::Ugrd.bit();
    Ok(())
}

fn parse_side(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Side, 16)?;
    let mut bytes = [0u8; 16];
    scan.cur.read_exact(&mut bytes)?;
    doc.side = Slots::from_array(bytes);
    doc.sections |= Section::Side.bit();
    Ok(())
}

fn parse_sgld(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Sgld, 32)?;
    read_u16_words(&mut scan.cur, &mut doc.sgld)?;
    doc.sections |= Section::Sgld.bit();
    Ok(())
}

fn parse_slbr(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Slbr, 32)?;
    read_u16_words(&mut scan.cur, &mut doc.slbr)?;
    doc.sections |= Section::Slbr.bit();
    Ok(())
}

fn parse_soil(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Soil, 32)?;
    read_u16_words(&mut scan.cur, &mut doc.soil)?;
    doc.sections |= Section::Soil.bit();
    Ok(())
}

fn parse_aipl(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    scan.require_exact(Section::Aipl, 16)?;
    scan.cur.read_exact(&mut doc.ai)?;
    doc.sections |= Section::Aipl.bit();
    Ok(())
}

fn parse_cell_map(
    doc: &mut Document,
    scan: &mut Scanner,
    sec: Section,
) -> Result<Vec<u16>, PudError> {
    scan.require_exact(sec, doc.tiles() * 2)?;
    let mut map = vec![0u16; doc.tiles()];
    read_u16_words(&mut scan.cur, &mut map)?;
    doc.sections |= sec.bit();
    Ok(map)
}

fn parse_mtxm(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    doc.tiles_map = parse_cell_map(doc, scan, Section::Mtxm)?;
    Ok(())
}

fn parse_sqm(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    doc.movement_map = parse_cell_map(doc, scan, Section::Sqm)?;
    Ok(())
}

/// `OILM` cells are one byte wide in the reference writer, two in some
/// derivatives; both are accepted.
fn parse_oilm(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    let len = scan.require(Section::Oilm)? as usize;
    let tiles = doc.tiles();
    if len == tiles {
        for cell in doc.oil_map.iter_mut() {
            *cell = scan.cur.read_u8()? as u16;
        }
    } else if len == tiles * 2 {
        let mut map = vec![0u16; tiles];
        read_u16_words(&mut scan.cur, &mut map)?;
        doc.oil_map = map;
    } else {
        return Err(PudError::CorruptSection(Section::Oilm));
    }
    doc.sections |= Section::Oilm.bit();
    Ok(())
}

fn parse_regm(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    doc.action_map = parse_cell_map(doc, scan, Section::Regm)?;
    Ok(())
}

fn parse_unit(doc: &mut Document, scan: &mut Scanner) -> Result<(), PudError> {
    let len = scan.require(Section::Unit)? as usize;
    if len % 8 != 0 {
        return Err(PudError::CorruptSection(Section::Unit));
    }

    let count = len / 8;
    let cur = &mut scan.cur;
    doc.units = Vec::with_capacity(count);
    for _ in 0..count {
        doc.units.push(PlacedUnit {
            x: cur.read_u16()?,
            y: cur.read_u16()?,
            kind: cur.read_u8()?,
            owner: cur.read_u8()?,
            alter: cur.read_u16()?,
        });
    }

    doc.sections |= Section::Unit.bit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_tolerates_inter_section_bytes() {
        let mut data = Vec::new();
        data.extend_from_slice(b"\x00junk\x01");
        data.extend_from_slice(b"VER ");
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&0x13u16.to_le_bytes());

        let mut scan = Scanner::new(&data);
        assert_eq!(scan.seek(Section::Ver), Some(2));
        assert_eq!(scan.cur.read_u16(), Ok(0x13));
    }

    #[test]
    fn scanner_rewinds_for_earlier_sections() {
        let mut data = Vec::new();
        data.extend_from_slice(b"VER ");
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[0x11, 0x00]);
        data.extend_from_slice(b"DESC");
        data.extend_from_slice(&0u32.to_le_bytes());

        let mut scan = Scanner::new(&data);
        assert_eq!(scan.seek(Section::Desc), Some(0));
        // DESC was found, so VER lies behind the cursor and needs a rewind.
        assert_eq!(scan.seek(Section::Ver), Some(2));
        assert_eq!(scan.cur.read_u16(), Ok(0x11));
    }

    #[test]
    fn missing_required_section_is_reported() {
        let err = document(b"not a pud at all").unwrap_err();
        assert!(matches!(err, PudError::MissingSection(Section::Type)));
    }

    #[test]
    fn overflowing_length_is_corrupt() {
        let mut data = Vec::new();
        data.extend_from_slice(b"TYPE");
        data.extend_from_slice(&64u32.to_le_bytes());
        data.extend_from_slice(b"WAR2 MAP\x00");

        let err = document(&data).unwrap_err();
        assert!(matches!(err, PudError::CorruptSection(Section::Type)));
    }

    #[test]
    fn bad_type_header_is_corrupt() {
        let mut data = Vec::new();
        data.extend_from_slice(b"TYPE");
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(b"WAR3 MAP\x00\x00\x0a\xff");
        data.extend_from_slice(&0u32.to_le_bytes());

        let err = document(&data).unwrap_err();
        assert!(matches!(err, PudError::CorruptSection(Section::Type)));
    }
}

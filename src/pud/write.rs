//! Canonical serialisation of a [`Document`] back to PUD bytes.

use std::{
    fs::{self, OpenOptions},
    io::{self, prelude::*, BufWriter},
    path::{Path, PathBuf},
};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::pud::{
    Document, PudError, Section, UnitData, MOUSE_BTN_UNITS, UNIT_KINDS, UPGRADE_KINDS,
};

/// Configures the behavior of [`crate::Pud::write_with_options`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// If `true`, the `OILM` payload is emitted as `tiles` 16-bit cells as
    /// some derivative tools expect. Otherwise the historical layout is kept:
    /// a declared length of `tiles` covering `tiles` zero bytes.
    pub wide_oilm: bool,
}

/// Writes `doc` to `path` through a sibling temporary file, renamed into
/// place only when every section has been emitted.
pub(crate) fn document(doc: &Document, path: &Path, options: &WriteOptions) -> Result<(), PudError> {
    let tmp_path = temp_sibling(path);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp_path)?;
    let mut writer = BufWriter::new(file);

    match emit(&mut writer, doc, options).and_then(|_| writer.flush()) {
        Ok(()) => {
            drop(writer);
            fs::rename(&tmp_path, path)?;
            Ok(())
        }
        Err(err) => {
            drop(writer);
            let _ = fs::remove_file(&tmp_path);
            Err(err.into())
        }
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_owned();
    name.push(".tmp");
    path.with_file_name(name)
}

fn section_header<W: Write>(w: &mut W, sec: Section, len: u32) -> io::Result<()> {
    w.write_all(sec.tag())?;
    w.write_u32::<LittleEndian>(len)
}

fn emit<W: Write>(w: &mut BufWriter<W>, doc: &Document, options: &WriteOptions) -> io::Result<()> {
    let tiles = doc.tiles();

    // TYPE
    section_header(w, Section::Type, 16)?;
    w.write_all(b"WAR2 MAP")?;
    w.write_all(&[0x00, 0x00, 0x0a, 0xff])?;
    w.write_u32::<LittleEndian>(doc.tag)?;

    // VER
    section_header(w, Section::Ver, 2)?;
    w.write_u16::<LittleEndian>(doc.version)?;

    // DESC
    section_header(w, Section::Desc, 32)?;
    w.write_all(&doc.description)?;

    // OWNR
    section_header(w, Section::Ownr, 16)?;
    w.write_all(&doc.owner.to_array())?;

    // ERA
    section_header(w, Section::Era, 2)?;
    w.write_u16::<LittleEndian>(doc.era as u16)?;

    // ERAX, only when the source carried one
    if doc.has_erax {
        section_header(w, Section::Erax, 2)?;
        w.write_u16::<LittleEndian>(doc.era as u16)?;
    }

    // DIM
    section_header(w, Section::Dim, 4)?;
    w.write_u16::<LittleEndian>(doc.map_w)?;
    w.write_u16::<LittleEndian>(doc.map_h)?;

    emit_udta(w, doc)?;

    // ALOW, only when the source carried one
    if !doc.default_allow {
        section_header(w, Section::Alow, 384)?;
        for table in [
            &doc.allow.units,
            &doc.allow.spells_start,
            &doc.allow.spells_allowed,
            &doc.allow.spells_acquire,
            &doc.allow.upgrades_allowed,
            &doc.allow.upgrades_acquire,
        ] {
            for &word in table {
                w.write_u32::<LittleEndian>(word)?;
            }
        }
    }

    emit_ugrd(w, doc)?;

    // SIDE
    section_header(w, Section::Side, 16)?;
    w.write_all(&doc.side.to_array())?;

    // SGLD / SLBR / SOIL
    for (sec, values) in [
        (Section::Sgld, &doc.sgld),
        (Section::Slbr, &doc.slbr),
        (Section::Soil, &doc.soil),
    ] {
        section_header(w, sec, 32)?;
        for &word in values {
            w.write_u16::<LittleEndian>(word)?;
        }
    }

    // AIPL
    section_header(w, Section::Aipl, 16)?;
    w.write_all(&doc.ai)?;

    // MTXM
    section_header(w, Section::Mtxm, (tiles * 2) as u32)?;
    for &tile in &doc.tiles_map {
        w.write_u16::<LittleEndian>(tile)?;
    }

    // SQM
    section_header(w, Section::Sqm, (tiles * 2) as u32)?;
    for &cell in &doc.movement_map {
        w.write_u16::<LittleEndian>(cell)?;
    }

    // OILM is always written zero-filled; the narrow historical layout is a
    // single byte per tile.
    if options.wide_oilm {
        section_header(w, Section::Oilm, (tiles * 2) as u32)?;
        for _ in 0..tiles {
            w.write_u16::<LittleEndian>(0)?;
        }
    } else {
        section_header(w, Section::Oilm, tiles as u32)?;
        for _ in 0..tiles {
            w.write_u8(0)?;
        }
    }

    // REGM
    section_header(w, Section::Regm, (tiles * 2) as u32)?;
    for &cell in &doc.action_map {
        w.write_u16::<LittleEndian>(cell)?;
    }

    // UNIT
    section_header(w, Section::Unit, (doc.units.len() * 8) as u32)?;
    for unit in &doc.units {
        w.write_u16::<LittleEndian>(unit.x)?;
        w.write_u16::<LittleEndian>(unit.y)?;
        w.write_u8(unit.kind)?;
        w.write_u8(unit.owner)?;
        w.write_u16::<LittleEndian>(unit.alter)?;
    }

    Ok(())
}

fn emit_udta<W: Write>(w: &mut W, doc: &Document) -> io::Result<()> {
    let table = &doc.unit_data;

    section_header(w, Section::Udta, 5696)?;
    w.write_u16::<LittleEndian>(doc.default_udta)?;
    for data in table.iter() {
        w.write_u16::<LittleEndian>(data.overlap_frames)?;
    }
    for &word in doc.obsolete_udta.iter() {
        w.write_u16::<LittleEndian>(word)?;
    }
    for data in table.iter() {
        w.write_u32::<LittleEndian>(data.sight)?;
    }
    for data in table.iter() {
        w.write_u16::<LittleEndian>(data.hp)?;
    }
    let cost_columns: [fn(&UnitData) -> u8; 5] = [
        |d| d.has_magic,
        |d| d.build_time,
        |d| d.gold_cost,
        |d| d.lumber_cost,
        |d| d.oil_cost,
    ];
    for column in cost_columns {
        for data in table.iter() {
            w.write_u8(column(data))?;
        }
    }
    for data in table.iter() {
        let packed = ((data.size_w as u32) << 16) | data.size_h as u32;
        w.write_u32::<LittleEndian>(packed)?;
    }
    for data in table.iter() {
        let packed = ((data.box_w as u32) << 16) | data.box_h as u32;
        w.write_u32::<LittleEndian>(packed)?;
    }
    let combat_columns: [fn(&UnitData) -> u8; 14] = [
        |d| d.range,
        |d| d.computer_react_range,
        |d| d.human_react_range,
        |d| d.armor,
        |d| d.rect_sel,
        |d| d.priority,
        |d| d.basic_damage,
        |d| d.piercing_damage,
        |d| d.weapons_upgradable,
        |d| d.armor_upgradable,
        |d| d.missile_weapon,
        |d| d.kind,
        |d| d.decay_rate,
        |d| d.annoy,
    ];
    for column in combat_columns {
        for data in table.iter() {
            w.write_u8(column(data))?;
        }
    }
    for data in table.iter().take(MOUSE_BTN_UNITS) {
        w.write_u8(data.mouse_right_btn)?;
    }
    for data in table.iter() {
        w.write_u16::<LittleEndian>(data.point_value)?;
    }
    for data in table.iter() {
        w.write_u8(data.can_target)?;
    }
    for data in table.iter() {
        w.write_u32::<LittleEndian>(data.flags)?;
    }

    Ok(())
}

fn emit_ugrd<W: Write>(w: &mut W, doc: &Document) -> io::Result<()> {
    let table = &doc.upgrades;

    section_header(w, Section::Ugrd, 782)?;
    w.write_u16::<LittleEndian>(doc.default_ugrd)?;
    for upgrade in table.iter() {
        w.write_u8(upgrade.time)?;
    }
    for upgrade in table.iter() {
        w.write_u16::<LittleEndian>(upgrade.gold)?;
    }
    for upgrade in table.iter() {
        w.write_u16::<LittleEndian>(upgrade.lumber)?;
    }
    for upgrade in table.iter() {
        w.write_u16::<LittleEndian>(upgrade.oil)?;
    }
    for upgrade in table.iter() {
        w.write_u16::<LittleEndian>(upgrade.icon)?;
    }
    for upgrade in table.iter() {
        w.write_u16::<LittleEndian>(upgrade.group)?;
    }
    for upgrade in table.iter() {
        w.write_u32::<LittleEndian>(upgrade.flags)?;
    }

    Ok(())
}

// Compile-time checks that the fixed section layouts add up.
const _: () = {
    assert!(2 + UNIT_KINDS * 2 + 508 * 2 + UNIT_KINDS * 4 + UNIT_KINDS * 2
        + UNIT_KINDS * 5
        + UNIT_KINDS * 4 * 2
        + UNIT_KINDS * 14
        + MOUSE_BTN_UNITS
        + UNIT_KINDS * 2
        + UNIT_KINDS
        + UNIT_KINDS * 4
        == 5696);
    assert!(2 + UPGRADE_KINDS * 15 == 782);
};

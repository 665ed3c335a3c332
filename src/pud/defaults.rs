//! Built-in tables used for fresh documents and for sections a map omits.
//!
//! The original game ships these tables inside its own data files; the
//! baseline below covers the fields this library interprets itself (minimap
//! footprints, resource units, start locations) and sane combat numbers for
//! everything else.

use crate::common::{owner, Slots};
use crate::pud::{
    units::Unit, Allowances, UnitData, UpgradeData, UNIT_KINDS, UPGRADE_KINDS,
};

fn baseline() -> UnitData {
    UnitData {
        overlap_frames: 0,
        sight: 4,
        hp: 60,
        has_magic: 0,
        build_time: 60,
        gold_cost: 60,
        lumber_cost: 0,
        oil_cost: 0,
        size_w: 1,
        size_h: 1,
        box_w: 31,
        box_h: 31,
        range: 1,
        computer_react_range: 4,
        human_react_range: 2,
        armor: 2,
        rect_sel: 1,
        priority: 50,
        basic_damage: 6,
        piercing_damage: 3,
        weapons_upgradable: 0,
        armor_upgradable: 0,
        missile_weapon: 0,
        kind: 0,
        decay_rate: 0,
        annoy: 0,
        mouse_right_btn: 1,
        point_value: 50,
        can_target: 1,
        flags: 0,
    }
}

pub(crate) fn unit_data() -> Box<[UnitData; UNIT_KINDS]> {
    let mut table = Box::new([baseline(); UNIT_KINDS]);

    for (id, data) in table.iter_mut().enumerate() {
        let Ok(unit) = Unit::try_from(id as u8) else { continue };

        if unit.is_building() {
            data.size_w = 3;
            data.size_h = 3;
            data.hp = 800;
            data.sight = 3;
            data.priority = 20;
            data.basic_damage = 0;
            data.piercing_damage = 0;
            data.build_time = 200;
            data.gold_cost = 70;
            data.lumber_cost = 40;
            data.point_value = 100;
        }

        match unit {
            // Halls and their upgrades occupy a 4x4 footprint.
            Unit::TownHall
            | Unit::GreatHall
            | Unit::Keep
            | Unit::Stronghold
            | Unit::Castle
            | Unit::Fortress
            | Unit::DarkPortal => {
                data.size_w = 4;
                data.size_h = 4;
                data.hp = 1200;
            }
            Unit::Farm
            | Unit::PigFarm
            | Unit::HumanScoutTower
            | Unit::OrcScoutTower
            | Unit::HumanGuardTower
            | Unit::OrcGuardTower
            | Unit::HumanCannonTower
            | Unit::OrcCannonTower
            | Unit::CircleOfPower
            | Unit::Runestone => {
                data.size_w = 2;
                data.size_h = 2;
            }
            Unit::HumanWall | Unit::OrcWall => {
                data.size_w = 1;
                data.size_h = 1;
                data.hp = 40;
            }
            Unit::GoldMine | Unit::OilPatch => {
                data.size_w = 3;
                data.size_h = 3;
                data.hp = 25500;
                data.sight = 0;
                data.rect_sel = 0;
                data.can_target = 0;
                data.point_value = 0;
            }
            Unit::HumanStart | Unit::OrcStart => {
                data.size_w = 1;
                data.size_h = 1;
                data.hp = 0;
                data.sight = 0;
                data.rect_sel = 0;
                data.can_target = 0;
                data.point_value = 0;
            }
            _ => (),
        }

        if unit.is_flying() {
            data.kind = 2;
        } else if unit.is_boat() || unit.is_underwater() {
            data.kind = 1;
        }
        if unit.is_hero() {
            data.hp = 200;
            data.sight = 6;
            data.point_value = 150;
        }
    }

    table
}

pub(crate) fn upgrades() -> Box<[UpgradeData; UPGRADE_KINDS]> {
    let template = UpgradeData {
        time: 100,
        gold: 500,
        lumber: 0,
        oil: 0,
        icon: 0,
        group: 0,
        flags: 0,
    };
    let mut table = Box::new([template; UPGRADE_KINDS]);
    for (i, upgrade) in table.iter_mut().enumerate() {
        upgrade.icon = i as u16;
        upgrade.group = i as u16 / 2;
    }
    table
}

/// Absent `ALOW` means everything is allowed and nothing is pre-acquired.
pub(crate) fn allowances() -> Allowances {
    Allowances {
        units: [u32::MAX; 16],
        spells_start: [u32::MAX; 16],
        spells_allowed: [u32::MAX; 16],
        spells_acquire: [0; 16],
        upgrades_allowed: [u32::MAX; 16],
        upgrades_acquire: [0; 16],
    }
}

pub(crate) fn owners() -> Slots {
    Slots {
        players: [owner::HUMAN; 8],
        unusable: [owner::NOBODY; 7],
        neutral: owner::NOBODY,
    }
}

/// Slots alternate Human/Orc by default; the neutral slot is neutral.
pub(crate) fn sides() -> Slots {
    let mut players = [0u8; 8];
    for (i, side) in players.iter_mut().enumerate() {
        *side = (i % 2) as u8;
    }
    Slots {
        players,
        unusable: [0; 7],
        neutral: 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprints_cover_known_units() {
        let table = unit_data();
        assert_eq!(table[Unit::GoldMine.id() as usize].size_w, 3);
        assert_eq!(table[Unit::TownHall.id() as usize].size_w, 4);
        assert_eq!(table[Unit::Farm.id() as usize].size_w, 2);
        assert_eq!(table[Unit::Footman.id() as usize].size_w, 1);
        assert_eq!(table[Unit::HumanStart.id() as usize].hp, 0);
    }

    #[test]
    fn allowances_permit_everything() {
        let allow = allowances();
        assert!(allow.units.iter().all(|&w| w == u32::MAX));
        assert!(allow.upgrades_acquire.iter().all(|&w| w == 0));
    }
}

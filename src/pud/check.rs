use thiserror::Error;

use crate::common::{owner, Player};
use crate::pud::Document;

/// The first problem found while validating a map. Unit values are indexes
/// into [`Document::units`], player values are slot numbers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckError {
    #[error("The map has not been parsed.")]
    NotInitialized,
    #[error("Unit {unit} belongs to an invalid player slot.")]
    InvalidPlayer { unit: usize },
    #[error("Unit {unit} is a second start location for its player.")]
    TooManyStartLocations { unit: usize },
    #[error("A playable map needs at least 2 start locations, found {count}.")]
    NotEnoughStartLocations { count: u32 },
    #[error("Player {player} owns units but has no start location.")]
    NoStartLocation { player: u8 },
    #[error("Player {player} has a start location but owns no units.")]
    EmptyPlayer { player: u8 },
}

/// Validates `units` against the owner slots.
///
/// A start location counts as a unit of its owner, so a bare melee map of
/// start locations and neutral mines is valid. On success, player slots
/// without any unit are demoted to nobody and `starting_points` is set.
pub(crate) fn run(init: bool, doc: &mut Document) -> Result<(), CheckError> {
    if !init {
        return Err(CheckError::NotInitialized);
    }

    let mut units_per_slot = [0u32; 16];
    let mut start_loc = [false; 16];
    let mut starting_points = 0u32;

    for (i, unit) in doc.units.iter().enumerate() {
        let slot = unit.owner as usize;
        if unit.player().is_none() {
            return Err(CheckError::InvalidPlayer { unit: i });
        }

        if unit.unit().is_some_and(|u| u.is_start_location()) {
            starting_points += 1;
            if start_loc[slot] {
                return Err(CheckError::TooManyStartLocations { unit: i });
            }
            start_loc[slot] = true;
        }
        units_per_slot[slot] += 1;
    }

    if starting_points <= 1 {
        return Err(CheckError::NotEnoughStartLocations {
            count: starting_points,
        });
    }

    let neutral = Player::Neutral as usize;
    for slot in 0..16 {
        if units_per_slot[slot] != 0 && !start_loc[slot] && slot != neutral {
            return Err(CheckError::NoStartLocation { player: slot as u8 });
        }
        if units_per_slot[slot] == 0 && start_loc[slot] {
            return Err(CheckError::EmptyPlayer { player: slot as u8 });
        }
    }

    // Slots that own nothing are controlled by nobody.
    for slot in 0..8 {
        if units_per_slot[slot] == 0 {
            doc.owner.players[slot] = owner::NOBODY;
        }
    }

    doc.starting_points = starting_points;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Player;
    use crate::pud::{Document, PlacedUnit, Unit};

    fn place(doc: &mut Document, x: u16, y: u16, unit: Unit, player: Player) {
        doc.units.push(PlacedUnit {
            x,
            y,
            kind: unit.id(),
            owner: player as u8,
            alter: 1,
        });
    }

    fn melee_doc() -> Document {
        let mut doc = Document::with_defaults();
        place(&mut doc, 2, 2, Unit::HumanStart, Player::Red);
        place(&mut doc, 28, 28, Unit::OrcStart, Player::Blue);
        place(&mut doc, 15, 15, Unit::GoldMine, Player::Neutral);
        doc
    }

    #[test]
    fn unparsed_map_is_not_initialized() {
        let mut doc = melee_doc();
        assert_eq!(run(false, &mut doc), Err(CheckError::NotInitialized));
    }

    #[test]
    fn melee_map_is_valid() {
        let mut doc = melee_doc();
        assert_eq!(run(true, &mut doc), Ok(()));
        assert_eq!(doc.starting_points, 2);
        // Slots 0 and 1 keep their controller, the rest are demoted.
        assert_ne!(doc.owner.players[0], owner::NOBODY);
        assert_ne!(doc.owner.players[1], owner::NOBODY);
        for slot in 2..8 {
            assert_eq!(doc.owner.players[slot], owner::NOBODY);
        }
    }

    #[test]
    fn single_start_location_is_not_enough() {
        let mut doc = Document::with_defaults();
        place(&mut doc, 2, 2, Unit::HumanStart, Player::Red);
        assert_eq!(
            run(true, &mut doc),
            Err(CheckError::NotEnoughStartLocations { count: 1 })
        );
    }

    #[test]
    fn duplicate_start_location_points_at_the_second() {
        let mut doc = melee_doc();
        place(&mut doc, 5, 5, Unit::HumanStart, Player::Red);
        assert_eq!(
            run(true, &mut doc),
            Err(CheckError::TooManyStartLocations { unit: 3 })
        );
    }

    #[test]
    fn out_of_range_owner_is_invalid() {
        let mut doc = melee_doc();
        doc.units[2].owner = 9;
        assert_eq!(run(true, &mut doc), Err(CheckError::InvalidPlayer { unit: 2 }));
    }

    #[test]
    fn units_without_start_location_are_reported() {
        let mut doc = melee_doc();
        place(&mut doc, 8, 8, Unit::Footman, Player::Green);
        assert_eq!(
            run(true, &mut doc),
            Err(CheckError::NoStartLocation { player: 2 })
        );
    }
}

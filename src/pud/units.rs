use crate::common::{Color, Player, Side};

/// Every unit id a PUD file can place on the map.
///
/// Ids pair up: a Human unit and its Orc counterpart differ only in the low
/// bit. Five ids inside the range are unused sentinels, and a handful of ids
/// past `OrcWall` are reserved but never placed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Unit {
    Footman = 0x00,
    Grunt = 0x01,
    Peasant = 0x02,
    Peon = 0x03,
    Ballista = 0x04,
    Catapult = 0x05,
    Knight = 0x06,
    Ogre = 0x07,
    Archer = 0x08,
    Axethrower = 0x09,
    Mage = 0x0a,
    DeathKnight = 0x0b,
    Paladin = 0x0c,
    OgreMage = 0x0d,
    Dwarves = 0x0e,
    GoblinSappers = 0x0f,
    AttackPeasant = 0x10,
    AttackPeon = 0x11,
    Ranger = 0x12,
    Berserker = 0x13,
    Alleria = 0x14,
    TeronGorefiend = 0x15,
    KurdranAndSkyree = 0x16,
    Dentarg = 0x17,
    Khadgar = 0x18,
    GromHellscream = 0x19,
    HumanTanker = 0x1a,
    OrcTanker = 0x1b,
    HumanTransport = 0x1c,
    OrcTransport = 0x1d,
    ElvenDestroyer = 0x1e,
    TrollDestroyer = 0x1f,
    Battleship = 0x20,
    Juggernaught = 0x21,
    Deathwing = 0x23,
    GnomishSubmarine = 0x26,
    GiantTurtle = 0x27,
    GnomishFlyingMachine = 0x28,
    GoblinZeppelin = 0x29,
    GryphonRider = 0x2a,
    Dragon = 0x2b,
    Turalyon = 0x2c,
    EyeOfKilrogg = 0x2d,
    Danath = 0x2e,
    KorgathBladefist = 0x2f,
    Chogall = 0x31,
    Lothar = 0x32,
    Guldan = 0x33,
    UtherLightbringer = 0x34,
    Zuljin = 0x35,
    Skeleton = 0x37,
    Daemon = 0x38,
    Critter = 0x39,
    Farm = 0x3a,
    PigFarm = 0x3b,
    HumanBarracks = 0x3c,
    OrcBarracks = 0x3d,
    Church = 0x3e,
    AltarOfStorms = 0x3f,
    HumanScoutTower = 0x40,
    OrcScoutTower = 0x41,
    Stables = 0x42,
    OgreMound = 0x43,
    GnomishInventor = 0x44,
    GoblinAlchemist = 0x45,
    GryphonAviary = 0x46,
    DragonRoost = 0x47,
    HumanShipyard = 0x48,
    OrcShipyard = 0x49,
    TownHall = 0x4a,
    GreatHall = 0x4b,
    ElvenLumberMill = 0x4c,
    TrollLumberMill = 0x4d,
    HumanFoundry = 0x4e,
    OrcFoundry = 0x4f,
    MageTower = 0x50,
    TempleOfTheDamned = 0x51,
    HumanBlacksmith = 0x52,
    OrcBlacksmith = 0x53,
    HumanRefinery = 0x54,
    OrcRefinery = 0x55,
    HumanOilWell = 0x56,
    OrcOilWell = 0x57,
    Keep = 0x58,
    Stronghold = 0x59,
    Castle = 0x5a,
    Fortress = 0x5b,
    GoldMine = 0x5c,
    OilPatch = 0x5d,
    HumanStart = 0x5e,
    OrcStart = 0x5f,
    HumanGuardTower = 0x60,
    OrcGuardTower = 0x61,
    HumanCannonTower = 0x62,
    OrcCannonTower = 0x63,
    CircleOfPower = 0x64,
    DarkPortal = 0x65,
    Runestone = 0x66,
    HumanWall = 0x67,
    OrcWall = 0x68,
}

/// Unused ids inside the otherwise dense unit range.
const SENTINELS: [u8; 5] = [0x22, 0x24, 0x25, 0x30, 0x36];

impl Unit {
    /// Whether `id` denotes a unit the game engine accepts: everything up to
    /// 0x6C except the five unused sentinels.
    pub fn is_valid_id(id: u8) -> bool {
        id <= 0x6c && !SENTINELS.contains(&id)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn is_start_location(self) -> bool {
        matches!(self, Unit::HumanStart | Unit::OrcStart)
    }

    pub fn is_building(self) -> bool {
        (self.id() >= Unit::Farm.id() && self.id() <= Unit::Runestone.id())
            && !self.is_start_location()
    }

    pub fn is_flying(self) -> bool {
        matches!(
            self,
            Unit::GnomishFlyingMachine
                | Unit::GoblinZeppelin
                | Unit::GryphonRider
                | Unit::Dragon
                | Unit::Deathwing
                | Unit::Daemon
                | Unit::KurdranAndSkyree
        )
    }

    pub fn is_underwater(self) -> bool {
        matches!(self, Unit::GnomishSubmarine | Unit::GiantTurtle)
    }

    pub fn is_boat(self) -> bool {
        self.id() >= Unit::HumanTanker.id() && self.id() <= Unit::Juggernaught.id()
    }

    pub fn is_marine(self) -> bool {
        self.is_underwater() || self.is_boat() || self.is_oil_well()
    }

    pub fn is_land(self) -> bool {
        !self.is_underwater() && !self.is_boat() && !self.is_flying()
    }

    pub fn is_coast_building(self) -> bool {
        matches!(
            self,
            Unit::HumanShipyard
                | Unit::OrcShipyard
                | Unit::HumanFoundry
                | Unit::OrcFoundry
                | Unit::HumanRefinery
                | Unit::OrcRefinery
        )
    }

    pub fn is_always_passive(self) -> bool {
        matches!(self, Unit::Critter)
    }

    pub fn is_oil_well(self) -> bool {
        matches!(self, Unit::OilPatch | Unit::HumanOilWell | Unit::OrcOilWell)
    }

    pub fn is_hero(self) -> bool {
        matches!(
            self,
            Unit::Alleria
                | Unit::TeronGorefiend
                | Unit::KurdranAndSkyree
                | Unit::Dentarg
                | Unit::Khadgar
                | Unit::GromHellscream
                | Unit::Deathwing
                | Unit::Turalyon
                | Unit::Danath
                | Unit::KorgathBladefist
                | Unit::Chogall
                | Unit::Lothar
                | Unit::Guldan
                | Unit::UtherLightbringer
                | Unit::Zuljin
        )
    }

    /// The race a unit belongs to: even ids are Human and odd ids are Orc,
    /// except for critters, corpses, resources and everything from the circle
    /// of power up, which are neutral.
    pub fn side(self) -> Side {
        match self {
            Unit::Skeleton | Unit::Daemon | Unit::Critter | Unit::GoldMine | Unit::OilPatch => {
                return Side::Neutral
            }
            _ => (),
        }
        if self.id() >= Unit::CircleOfPower.id() {
            return Side::Neutral;
        }
        if self.id() % 2 == 0 {
            Side::Human
        } else {
            Side::Orc
        }
    }

    /// The unit of the opposite race, obtained by toggling the low bit of the
    /// id. Heroes and neutral units have no counterpart and map to themselves,
    /// as does any unit whose would-be counterpart is a hero.
    pub fn switch_side(self) -> Unit {
        if self.is_hero() || self.side() == Side::Neutral {
            return self;
        }
        match Unit::try_from(self.id() ^ 1) {
            Ok(other) if !other.is_hero() && other.side() != Side::Neutral => other,
            _ => self,
        }
    }

    /// The colour a unit contributes to a minimap: resources have fixed
    /// colours, everything else shows its owner's colour.
    pub fn color(self, player: Player) -> Color {
        match self {
            Unit::GoldMine => Color::GOLD_MINE,
            Unit::OilPatch => Color::OIL_PATCH,
            _ => player.color(),
        }
    }
}

impl TryFrom<u8> for Unit {
    type Error = u8;

    fn try_from(id: u8) -> Result<Unit, u8> {
        if id > Unit::OrcWall.id() || SENTINELS.contains(&id) {
            return Err(id);
        }
        // Every id at or below OrcWall other than the sentinels has a variant
        // with that exact discriminant.
        Ok(unsafe { core::mem::transmute::<u8, Unit>(id) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_survive_conversion() {
        for id in 0u8..=0x68 {
            match Unit::try_from(id) {
                Ok(unit) => assert_eq!(unit.id(), id),
                Err(_) => assert!(SENTINELS.contains(&id)),
            }
        }
        assert!(Unit::try_from(0x69).is_err());
    }

    #[test]
    fn validity_excludes_sentinels() {
        assert!(Unit::is_valid_id(0x00));
        assert!(Unit::is_valid_id(0x6c));
        assert!(!Unit::is_valid_id(0x6d));
        for id in SENTINELS {
            assert!(!Unit::is_valid_id(id));
        }
    }

    #[test]
    fn sides_follow_parity() {
        assert_eq!(Unit::Footman.side(), Side::Human);
        assert_eq!(Unit::Grunt.side(), Side::Orc);
        assert_eq!(Unit::GoldMine.side(), Side::Neutral);
        assert_eq!(Unit::CircleOfPower.side(), Side::Neutral);
        assert_eq!(Unit::Critter.side(), Side::Neutral);
    }

    #[test]
    fn switch_side_is_an_involution() {
        for id in 0u8..=0x68 {
            let Ok(unit) = Unit::try_from(id) else { continue };
            let switched = unit.switch_side();
            assert_eq!(switched.switch_side(), unit, "unit {unit:?}");
            if unit.is_hero() || unit.side() == Side::Neutral {
                assert_eq!(switched, unit);
            }
        }
    }

    #[test]
    fn switch_side_swaps_races() {
        assert_eq!(Unit::Footman.switch_side(), Unit::Grunt);
        assert_eq!(Unit::Grunt.switch_side(), Unit::Footman);
        assert_eq!(Unit::TownHall.switch_side(), Unit::GreatHall);
        assert_eq!(Unit::Lothar.switch_side(), Unit::Lothar);
        assert_eq!(Unit::GoldMine.switch_side(), Unit::GoldMine);
        // Turalyon is a hero, so the eye has no usable counterpart.
        assert_eq!(Unit::EyeOfKilrogg.switch_side(), Unit::EyeOfKilrogg);
    }

    #[test]
    fn taxonomy_spot_checks() {
        assert!(Unit::Farm.is_building());
        assert!(!Unit::HumanStart.is_building());
        assert!(Unit::HumanStart.is_start_location());
        assert!(Unit::Dragon.is_flying());
        assert!(Unit::GiantTurtle.is_underwater());
        assert!(Unit::Battleship.is_boat());
        assert!(Unit::OrcRefinery.is_coast_building());
        assert!(Unit::HumanOilWell.is_oil_well());
        assert!(Unit::GnomishSubmarine.is_marine());
        assert!(Unit::Peasant.is_land());
        assert!(!Unit::Battleship.is_land());
    }
}

//! Shared vocabulary of the PUD and WAR formats.

/// An RGBA colour as produced by the palette and sprite decoders.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0x00, 0x00, 0x00, 0x00);
    /// Gold mines always show up yellow on minimaps.
    pub const GOLD_MINE: Color = Color::new(0xff, 0xff, 0x00, 0xff);
    /// Oil patches always show up black on minimaps.
    pub const OIL_PATCH: Color = Color::new(0x00, 0x00, 0x00, 0xff);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Color {
        Color::new(r, g, b, 0xff)
    }
}

/// The tileset theme of a map.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Era {
    Forest = 0,
    Winter = 1,
    Wasteland = 2,
    Swamp = 3,
}

impl Era {
    pub fn from_word(word: u16) -> Option<Era> {
        match word {
            0 => Some(Era::Forest),
            1 => Some(Era::Winter),
            2 => Some(Era::Wasteland),
            3 => Some(Era::Swamp),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Era::Forest => "forest",
            Era::Winter => "winter",
            Era::Wasteland => "wasteland",
            Era::Swamp => "swamp",
        }
    }
}

/// The race a unit or player slot belongs to.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Human = 0,
    Orc = 1,
    Neutral = 2,
}

impl Side {
    pub fn from_byte(byte: u8) -> Option<Side> {
        match byte {
            0 => Some(Side::Human),
            1 => Some(Side::Orc),
            2 => Some(Side::Neutral),
            _ => None,
        }
    }
}

/// One of the eight playable slots, or the neutral slot (15).
///
/// Slots 8 through 14 exist in every per-slot array of the PUD format but are
/// not addressable as players.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Player {
    Red = 0,
    Blue = 1,
    Green = 2,
    Violet = 3,
    Orange = 4,
    Black = 5,
    White = 6,
    Yellow = 7,
    Neutral = 15,
}

impl Player {
    pub fn color(self) -> Color {
        match self {
            Player::Red => Color::opaque(0xc0, 0x00, 0x00),
            Player::Blue => Color::opaque(0x00, 0x00, 0xc0),
            Player::Green => Color::opaque(0x00, 0xff, 0x00),
            Player::Violet => Color::opaque(0x80, 0x00, 0xc0),
            Player::Orange => Color::opaque(0xff, 0x80, 0x00),
            Player::Black => Color::opaque(0x00, 0x00, 0x00),
            Player::White => Color::opaque(0xff, 0xff, 0xff),
            Player::Yellow => Color::opaque(0xff, 0xd0, 0x00),
            Player::Neutral => Color::opaque(0xa2, 0xa2, 0xa6),
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = u8;

    fn try_from(slot: u8) -> Result<Player, u8> {
        match slot {
            0 => Ok(Player::Red),
            1 => Ok(Player::Blue),
            2 => Ok(Player::Green),
            3 => Ok(Player::Violet),
            4 => Ok(Player::Orange),
            5 => Ok(Player::Black),
            6 => Ok(Player::White),
            7 => Ok(Player::Yellow),
            15 => Ok(Player::Neutral),
            other => Err(other),
        }
    }
}

/// Controller bytes stored in the `OWNR` section.
pub mod owner {
    pub const COMPUTER: u8 = 0x01;
    pub const PASSIVE_COMPUTER: u8 = 0x02;
    pub const NOBODY: u8 = 0x03;
    pub const HUMAN: u8 = 0x05;
    pub const RESCUE_PASSIVE: u8 = 0x06;
    pub const RESCUE_ACTIVE: u8 = 0x07;
}

/// The four legal square map sizes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimensions {
    D32,
    D64,
    D96,
    D128,
}

impl Dimensions {
    pub fn from_size(w: u16, h: u16) -> Option<Dimensions> {
        match (w, h) {
            (32, 32) => Some(Dimensions::D32),
            (64, 64) => Some(Dimensions::D64),
            (96, 96) => Some(Dimensions::D96),
            (128, 128) => Some(Dimensions::D128),
            _ => None,
        }
    }

    pub fn size(self) -> (u16, u16) {
        match self {
            Dimensions::D32 => (32, 32),
            Dimensions::D64 => (64, 64),
            Dimensions::D96 => (96, 96),
            Dimensions::D128 => (128, 128),
        }
    }

    pub fn tiles(self) -> usize {
        let (w, h) = self.size();
        w as usize * h as usize
    }
}

/// The sixteen per-slot bytes of the `OWNR` and `SIDE` sections:
/// 8 players, 7 unusable slots, 1 neutral slot.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slots {
    pub players: [u8; 8],
    pub unusable: [u8; 7],
    pub neutral: u8,
}

impl Slots {
    pub fn to_array(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.players);
        out[8..15].copy_from_slice(&self.unusable);
        out[15] = self.neutral;
        out
    }

    pub fn from_array(bytes: [u8; 16]) -> Slots {
        let mut slots = Slots::default();
        slots.players.copy_from_slice(&bytes[..8]);
        slots.unusable.copy_from_slice(&bytes[8..15]);
        slots.neutral = bytes[15];
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_round_trip() {
        for dims in [Dimensions::D32, Dimensions::D64, Dimensions::D96, Dimensions::D128] {
            let (w, h) = dims.size();
            assert_eq!(Dimensions::from_size(w, h), Some(dims));
            assert_eq!(dims.tiles(), w as usize * h as usize);
        }
        assert_eq!(Dimensions::from_size(32, 64), None);
    }

    #[test]
    fn slots_round_trip() {
        let bytes: [u8; 16] = core::array::from_fn(|i| i as u8);
        assert_eq!(Slots::from_array(bytes).to_array(), bytes);
    }
}

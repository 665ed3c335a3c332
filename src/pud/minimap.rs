//! Rasterises a parsed map into a small RGBA image, one pixel per tile.
//!
//! The renderer only fills a buffer; encoding it to PNG or JPEG is the
//! caller's business (see [`Minimap::to_image`] with the `image` feature).

use crate::common::{Color, Era};
use crate::pud::{Pud, PudError, Unit, UNIT_KINDS};

/// Maps a 16-bit tile id to the colour of its dominant palette entry.
pub trait TileColormap {
    fn color_of(&self, tile: u16) -> Color;
}

/// A `map_w` x `map_h` RGBA buffer, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minimap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Minimap {
    fn put(&mut self, x: u32, y: u32, color: Color) {
        let i = (y * self.width + x) as usize * 4;
        self.rgba[i..i + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    /// `None` if `rgba` does not hold `width * height * 4` bytes.
    #[cfg(feature = "image")]
    pub fn to_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
    }
}

/// Renders the tile layer, then overlays every unit's footprint.
pub fn render(pud: &Pud, colors: &dyn TileColormap) -> Result<Minimap, PudError> {
    if !pud.parsed() {
        return Err(PudError::NotParsed);
    }
    let doc = pud.document();

    let width = doc.map_w as u32;
    let height = doc.map_h as u32;
    let mut minimap = Minimap {
        width,
        height,
        rgba: vec![0; width as usize * height as usize * 4],
    };

    for y in 0..height {
        for x in 0..width {
            let tile = doc.tiles_map[(y * width + x) as usize];
            minimap.put(x, y, colors.color_of(tile));
        }
    }

    for placed in &doc.units {
        let (Some(unit), Some(player)) = (placed.unit(), placed.player()) else {
            continue;
        };
        let color = unit.color(player);
        let (w, h) = footprint(doc.unit_data.as_ref(), unit);
        for dy in 0..h {
            for dx in 0..w {
                let (px, py) = (placed.x as u32 + dx, placed.y as u32 + dy);
                if px < width && py < height {
                    minimap.put(px, py, color);
                }
            }
        }
    }

    Ok(minimap)
}

fn footprint(table: &[crate::pud::UnitData; UNIT_KINDS], unit: Unit) -> (u32, u32) {
    let data = &table[unit.id() as usize];
    (data.size_w.max(1) as u32, data.size_h.max(1) as u32)
}

/// The built-in tile->colour mapping: terrain classes toned per era.
pub struct EraColormap {
    era: Era,
}

impl EraColormap {
    pub fn new(era: Era) -> EraColormap {
        EraColormap { era }
    }

    fn terrain(&self, class: TerrainClass) -> Color {
        use TerrainClass::*;
        match self.era {
            Era::Forest => match class {
                LightWater => Color::opaque(0x10, 0x34, 0x7c),
                DarkWater => Color::opaque(0x0c, 0x28, 0x60),
                LightCoast => Color::opaque(0x94, 0x7c, 0x50),
                DarkCoast => Color::opaque(0x74, 0x60, 0x3c),
                LightGround => Color::opaque(0x44, 0x74, 0x28),
                DarkGround => Color::opaque(0x34, 0x5c, 0x20),
                Trees => Color::opaque(0x14, 0x44, 0x14),
                Rocks => Color::opaque(0x60, 0x60, 0x60),
                Wall => Color::opaque(0xa0, 0xa0, 0xa0),
            },
            Era::Winter => match class {
                LightWater => Color::opaque(0x24, 0x50, 0x94),
                DarkWater => Color::opaque(0x1c, 0x40, 0x7c),
                LightCoast => Color::opaque(0x9c, 0xa8, 0xb8),
                DarkCoast => Color::opaque(0x80, 0x8c, 0xa0),
                LightGround => Color::opaque(0xe0, 0xe8, 0xf0),
                DarkGround => Color::opaque(0xc4, 0xcc, 0xd8),
                Trees => Color::opaque(0x24, 0x50, 0x2c),
                Rocks => Color::opaque(0x70, 0x74, 0x80),
                Wall => Color::opaque(0xa0, 0xa0, 0xa0),
            },
            Era::Wasteland => match class {
                LightWater => Color::opaque(0x30, 0x38, 0x6c),
                DarkWater => Color::opaque(0x24, 0x2c, 0x58),
                LightCoast => Color::opaque(0x98, 0x70, 0x44),
                DarkCoast => Color::opaque(0x7c, 0x58, 0x34),
                LightGround => Color::opaque(0xa0, 0x80, 0x4c),
                DarkGround => Color::opaque(0x88, 0x68, 0x3c),
                Trees => Color::opaque(0x58, 0x44, 0x20),
                Rocks => Color::opaque(0x68, 0x58, 0x48),
                Wall => Color::opaque(0xa0, 0xa0, 0xa0),
            },
            Era::Swamp => match class {
                LightWater => Color::opaque(0x18, 0x38, 0x48),
                DarkWater => Color::opaque(0x10, 0x2c, 0x3c),
                LightCoast => Color::opaque(0x70, 0x78, 0x40),
                DarkCoast => Color::opaque(0x58, 0x60, 0x30),
                LightGround => Color::opaque(0x50, 0x68, 0x38),
                DarkGround => Color::opaque(0x40, 0x54, 0x2c),
                Trees => Color::opaque(0x20, 0x40, 0x20),
                Rocks => Color::opaque(0x54, 0x5c, 0x54),
                Wall => Color::opaque(0xa0, 0xa0, 0xa0),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerrainClass {
    LightWater,
    DarkWater,
    LightCoast,
    DarkCoast,
    LightGround,
    DarkGround,
    Trees,
    Rocks,
    Wall,
}

/// Solid tiles encode their class in the high nibble of the low byte;
/// boundary tiles blend two classes and are grouped by their high byte.
fn classify(tile: u16) -> TerrainClass {
    use TerrainClass::*;
    if tile & 0xff00 == 0 {
        match tile & 0x00f0 {
            0x0010 => LightWater,
            0x0020 => DarkWater,
            0x0030 => LightCoast,
            0x0040 => DarkCoast,
            0x0050 => LightGround,
            0x0060 => DarkGround,
            0x0070 => Trees,
            0x0080 => Rocks,
            _ => Wall,
        }
    } else {
        match (tile >> 8) & 0x0f {
            0x1 | 0x2 => DarkWater,
            0x3 | 0x4 => LightCoast,
            0x5 | 0x6 => LightGround,
            0x7 => Trees,
            0x8 | 0x9 => Rocks,
            _ => Wall,
        }
    }
}

impl TileColormap for EraColormap {
    fn color_of(&self, tile: u16) -> Color {
        self.terrain(classify(tile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Dimensions, Player};

    #[test]
    fn default_tile_is_light_ground_in_every_era() {
        for era in [Era::Forest, Era::Winter, Era::Wasteland, Era::Swamp] {
            let map = EraColormap::new(era);
            assert_eq!(map.color_of(0x0050), map.terrain(TerrainClass::LightGround));
            // Variations of the same class share the colour.
            assert_eq!(map.color_of(0x0051), map.color_of(0x005e));
        }
    }

    #[test]
    fn eras_disagree_on_ground_colour() {
        let forest = EraColormap::new(Era::Forest).color_of(0x0050);
        let winter = EraColormap::new(Era::Winter).color_of(0x0050);
        assert_ne!(forest, winter);
    }

    #[test]
    fn units_overlay_their_footprint() {
        use crate::pud::{OpenMode, Pud, Unit};

        let path = crate::pud::tests::temp_path("minimap");
        let _ = std::fs::remove_file(&path);
        let mut pud = Pud::open(&path, OpenMode::READ | OpenMode::WRITE).unwrap();
        pud.dimensions_set(Dimensions::D32).unwrap();
        pud.unit_add(1, 1, Player::Red, Unit::HumanStart, 1).unwrap();
        pud.unit_add(20, 20, Player::Blue, Unit::OrcStart, 1).unwrap();
        pud.unit_add(10, 10, Player::Neutral, Unit::GoldMine, 25000).unwrap();
        pud.write(&path).unwrap();

        let reopened = Pud::open(&path, OpenMode::READ).unwrap();
        let minimap = render(&reopened, &EraColormap::new(reopened.era())).unwrap();
        assert_eq!((minimap.width, minimap.height), (32, 32));

        let pixel = |x: u32, y: u32| {
            let i = ((y * 32 + x) * 4) as usize;
            Color::new(
                minimap.rgba[i],
                minimap.rgba[i + 1],
                minimap.rgba[i + 2],
                minimap.rgba[i + 3],
            )
        };
        assert_eq!(pixel(1, 1), Player::Red.color());
        assert_eq!(pixel(20, 20), Player::Blue.color());
        // Gold mines cover 3x3 tiles in yellow.
        assert_eq!(pixel(10, 10), Color::GOLD_MINE);
        assert_eq!(pixel(12, 12), Color::GOLD_MINE);
        // Everything else is forest light ground.
        assert_eq!(pixel(0, 0), EraColormap::new(Era::Forest).color_of(0x0050));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn unparsed_handle_is_rejected() {
        use crate::pud::{OpenMode, Pud};

        let pud = Pud::open(crate::pud::tests::temp_path("minimap-unparsed"), OpenMode::WRITE).unwrap();
        let err = render(&pud, &EraColormap::new(Era::Forest)).unwrap_err();
        assert!(matches!(err, PudError::NotParsed));
    }
}

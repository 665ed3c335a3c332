//! Tile atlas decoder.
//!
//! Each era owns four consecutive archive entries: the palette, the tile
//! composition table, the minitile bitmaps and the per-tile flag words. A
//! 32x32 tile is stitched from four 16x16 minitiles; the composition word of
//! a minitile selects its bitmap cell and carries flip bits in its low two
//! bits.

use byteorder::{ByteOrder, LittleEndian};

use crate::common::{Color, Era};
use crate::war::{Archive, Palette, Transparency, WarError};
use crate::Result;

/// Edge length of a decoded tile, in pixels.
pub const TILE_SIDE: usize = 32;

const MINI_SIDE: usize = 16;
const MINI_BYTES: usize = MINI_SIDE * MINI_SIDE;
/// Two composition words per row of minitiles, two rows.
const TILE_REFS: usize = 4;

/// One decoded tile, borrowed for the duration of the sink callback.
pub struct TileFrame<'a> {
    pub id: u16,
    /// `TILE_SIDE * TILE_SIDE` pixels, row-major.
    pub pixels: &'a [Color],
}

/// What remains of a decoded tileset once the frames have been emitted.
#[derive(Debug)]
pub struct Tileset {
    pub era: Era,
    pub palette: Palette,
    pub tile_count: usize,
    /// Per-tile terrain flag words.
    pub flags: Vec<u16>,
}

fn era_entries(era: Era) -> [usize; 4] {
    match era {
        Era::Forest => [2, 3, 4, 5],
        Era::Wasteland => [6, 7, 8, 9],
        Era::Winter => [10, 11, 12, 13],
        // The swamp tileset ships with the expansion, appended after the
        // original entries.
        Era::Swamp => [438, 439, 440, 441],
    }
}

impl Archive {
    /// Decodes the tile atlas of `era`, handing every tile to `sink`.
    ///
    /// Tiles 0 through 15 are the fog-of-war overlays; a sink that only
    /// cares about terrain can skip them by id.
    pub fn tileset_decode<F>(&self, era: Era, mut sink: F) -> Result<Tileset>
    where
        F: FnMut(&TileFrame),
    {
        let [pal_entry, info_entry, gfx_entry, flags_entry] = era_entries(era);

        let palette = self.palette_extract(pal_entry, Transparency::Opaque)?;
        let info = self.entry_extract(info_entry)?;
        let gfx = self.entry_extract(gfx_entry)?;
        let flags_raw = self.entry_extract(flags_entry)?;

        let tile_count = info.len() / (TILE_REFS * 2);
        log::debug!("decoding {tile_count} {} tiles", era.name());

        let mut pixels = vec![Color::TRANSPARENT; TILE_SIDE * TILE_SIDE];
        for tile in 0..tile_count {
            for sub in 0..TILE_REFS {
                let reference = LittleEndian::read_u16(&info[(tile * TILE_REFS + sub) * 2..]);
                let flip_x = reference & 0x1 != 0;
                let flip_y = reference & 0x2 != 0;
                let cell = (reference >> 2) as usize * MINI_BYTES;
                let bitmap = gfx
                    .get(cell..cell + MINI_BYTES)
                    .ok_or(WarError::CorruptEntry { entry: gfx_entry })?;

                let base_x = sub % 2 * MINI_SIDE;
                let base_y = sub / 2 * MINI_SIDE;
                for y in 0..MINI_SIDE {
                    for x in 0..MINI_SIDE {
                        let sx = if flip_x { MINI_SIDE - 1 - x } else { x };
                        let sy = if flip_y { MINI_SIDE - 1 - y } else { y };
                        pixels[(base_y + y) * TILE_SIDE + base_x + x] =
                            palette.color(bitmap[sy * MINI_SIDE + sx]);
                    }
                }
            }
            sink(&TileFrame {
                id: tile as u16,
                pixels: &pixels,
            });
        }

        let flags = flags_raw.chunks_exact(2).map(LittleEndian::read_u16).collect();
        Ok(Tileset {
            era,
            palette,
            tile_count,
            flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::war::tests::{build_archive, open_bytes};

    fn forest_archive() -> Archive {
        // Palette: entry i maps to the 6-bit gray (i & 0x3f).
        let mut palette = Vec::new();
        for i in 0..256u16 {
            let v = (i as u8) & 0x3f;
            palette.extend_from_slice(&[v, v, v]);
        }

        // Two minitile bitmaps: a flat one and one with a marked corner.
        let mut gfx = vec![1u8; MINI_BYTES];
        let mut marked = vec![0u8; MINI_BYTES];
        marked[0] = 5; // top-left pixel
        gfx.extend_from_slice(&marked);

        // One tile: flat, marked, marked flipped-x, marked flipped-y.
        let mut info = Vec::new();
        for reference in [0u16 << 2, 1 << 2, (1 << 2) | 1, (1 << 2) | 2] {
            info.extend_from_slice(&reference.to_le_bytes());
        }

        let flags = 0x0042u16.to_le_bytes().to_vec();

        let filler = b"".as_slice();
        let entries: Vec<&[u8]> = vec![
            filler, filler, // entries 0 and 1 are not the tileset's business
            &palette, &info, &gfx, &flags,
        ];
        open_bytes(build_archive(&entries))
    }

    #[test]
    fn tiles_are_composed_from_minitiles() {
        let archive = forest_archive();
        let mut frames = 0;
        let tileset = archive
            .tileset_decode(Era::Forest, |frame: &TileFrame| {
                assert_eq!(frame.id, 0);
                assert_eq!(frame.pixels.len(), TILE_SIDE * TILE_SIDE);

                let gray1 = Color::opaque(0x04, 0x04, 0x04);
                let gray5 = Color::opaque(0x14, 0x14, 0x14);
                let black = Color::opaque(0x00, 0x00, 0x00);

                // Top-left quadrant: flat bitmap of index 1.
                assert_eq!(frame.pixels[0], gray1);
                assert_eq!(frame.pixels[15 * TILE_SIDE + 15], gray1);
                // Top-right quadrant: marked corner at its top-left.
                assert_eq!(frame.pixels[16], gray5);
                assert_eq!(frame.pixels[17], black);
                // Bottom-left quadrant: flipped on x, mark lands top-right.
                assert_eq!(frame.pixels[16 * TILE_SIDE + 15], gray5);
                assert_eq!(frame.pixels[16 * TILE_SIDE], black);
                // Bottom-right quadrant: flipped on y, mark lands bottom-left.
                assert_eq!(frame.pixels[31 * TILE_SIDE + 16], gray5);
                assert_eq!(frame.pixels[16 * TILE_SIDE + 16], black);

                frames += 1;
            })
            .unwrap();

        assert_eq!(frames, 1);
        assert_eq!(tileset.tile_count, 1);
        assert_eq!(tileset.era, Era::Forest);
        assert_eq!(tileset.flags, [0x0042]);
        // Tile palettes are opaque throughout.
        assert_eq!(tileset.palette.color(0).a, 0xff);
    }

    #[test]
    fn out_of_range_minitile_is_corrupt() {
        let mut palette = vec![0u8; 768];
        palette[3] = 0x3f;
        let info = (100u16 << 2).to_le_bytes().to_vec();
        let gfx = vec![0u8; MINI_BYTES];
        let filler = b"".as_slice();
        let entries: Vec<&[u8]> = vec![filler, filler, &palette, &info, &gfx, filler];
        let archive = open_bytes(build_archive(&entries));

        let err = archive.tileset_decode(Era::Forest, |_| {}).unwrap_err();
        assert!(matches!(
            err,
            crate::W2Error::War(WarError::CorruptEntry { entry: 4 })
        ));
    }
}

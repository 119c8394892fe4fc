use serde::Serialize;

use crate::codec::chunk::{read_strided, ChunkType, HeaderFields};
use crate::codec::types::wire_enum;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;

/// Encoded width of one tile
pub const TILE_SIZE: usize = 4;

wire_enum! {
    /// Liquid under a bridge tile
    pub enum BridgeTerrain: u8 {
        None = 0,
        Water = 1,
        Lava = 2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Tile {
    pub terrain_id: u8,
    pub player_id: u8,
    pub bridge: BridgeTerrain,
    pub unknown: u8,
}

impl Tile {
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            terrain_id: reader.read_u8()?,
            player_id: reader.read_u8()?,
            bridge: reader.read_enum_u8()?,
            unknown: reader.read_u8()?,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.terrain_id);
        writer.write_u8(self.player_id);
        writer.write_enum_u8(self.bridge);
        writer.write_u8(self.unknown);
    }
}

/// Dense tile grid, stored row-major
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Map {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Map {
    /// Grid of `width` x `height` default tiles
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::default(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, x: u32, y: u32) -> Option<&Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_mut(&mut self, x: u32, y: u32) -> Option<&mut Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get_mut(y as usize * self.width as usize + x as usize)
    }

    /// Decode a map payload of `width` x `height` tiles, one stride per tile.
    pub fn read(payload: &mut BinaryReader, width: u32, height: u32) -> Result<Self> {
        let count = width.saturating_mul(height);
        let mut tiles = Vec::with_capacity((count as usize).min(payload.remaining() / TILE_SIZE));
        read_strided(ChunkType::Map, payload, count, |reader| {
            tiles.push(Tile::read(reader)?);
            Ok(())
        })?;
        Ok(Self { width, height, tiles })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        for tile in &self.tiles {
            tile.write(writer);
        }
    }

    /// Header fields for the map chunk of this grid
    pub fn header_fields(&self) -> HeaderFields {
        HeaderFields::Map { width: self.width, height: self.height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_map_row_major() {
        let mut map = Map::new(3, 2);
        *map.tile_mut(2, 1).unwrap() = Tile { terrain_id: 7, player_id: 3, bridge: BridgeTerrain::Lava, unknown: 0 };
        *map.tile_mut(0, 1).unwrap() = Tile { terrain_id: 5, ..Default::default() };

        let mut writer = BinaryWriter::new();
        map.write(&mut writer);
        let data = writer.into_vec();
        assert_eq!(data.len(), 6 * TILE_SIZE);
        assert_eq!(&data[5 * TILE_SIZE..], &[7, 3, 2, 0]);

        let decoded = Map::read(&mut BinaryReader::new(&data), 3, 2).unwrap();
        assert_eq!(decoded, map);
        assert_eq!(decoded.tile(0, 1).unwrap().terrain_id, 5);
        assert!(decoded.tile(3, 0).is_none());
        assert!(decoded.tile(0, 2).is_none());
    }

    #[test]
    fn test_wider_tiles_resync() {
        // 6-byte tiles: the trailing two bytes of each are skipped
        let data: Vec<u8> = (0..4u8).flat_map(|i| [i, 1, 0, 0, 0xEE, 0xEE]).collect();
        let mut reader = BinaryReader::new(&data);
        let map = Map::read(&mut reader, 2, 2).unwrap();
        assert!(reader.is_empty());
        assert_eq!(map.tile(1, 1).unwrap().terrain_id, 3);
        assert!(map.tiles().iter().all(|t| t.player_id == 1));
    }

    #[test]
    fn test_unknown_bridge_is_none() {
        let data = [1, 0, 9, 0, 2, 0, 2, 0];
        let map = Map::read(&mut BinaryReader::new(&data), 2, 1).unwrap();
        assert_eq!(map.tile(0, 0).unwrap().bridge, BridgeTerrain::None);
        assert_eq!(map.tile(1, 0).unwrap().terrain_id, 2);
        assert_eq!(map.tile(1, 0).unwrap().bridge, BridgeTerrain::Lava);
    }

    #[test]
    fn test_oversized_dimensions_fail_without_allocating() {
        let data = [0u8; 8];
        let err = Map::read(&mut BinaryReader::new(&data), 65535, 65535).unwrap_err();
        assert!(matches!(err, Error::ItemCount { chunk: ChunkType::Map, len: 8, .. }));
    }
}

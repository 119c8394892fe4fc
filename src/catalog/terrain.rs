use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::resource::{read_resources, write_resources};
use crate::codec::{ArtResource, BinaryReader, BinaryWriter, Color, Light};
use crate::error::Result;
use super::{CatalogRecord, StringIds, NAME_LEN, SOUND_CATEGORY_LEN};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct TerrainFlags: u32 {
        const SOLID = 0x0000_0001;
        const IMPENETRABLE = 0x0000_0002;
        const OWNABLE = 0x0000_0004;
        const TAGGABLE = 0x0000_0008;
        const ATTACKABLE = 0x0000_0020;
        const TORCH = 0x0000_0040;
        const WATER = 0x0000_0080;
        const LAVA = 0x0000_0100;
        const ALWAYS_EXPLORED = 0x0000_0200;
        const PLAYER_COLOURED_PATH = 0x0000_0400;
        const PLAYER_COLOURED_WALL = 0x0000_0800;
        const CONSTRUCTION_TYPE_WATER = 0x0000_1000;
        const CONSTRUCTION_TYPE_QUAD = 0x0000_2000;
        const UNEXPLORE_IF_DUG_BY_ANOTHER_PLAYER = 0x0000_4000;
        const FILL_INABLE = 0x0000_8000;
        const ALLOW_ROOM_WALLS = 0x0001_0000;
        const DECAY = 0x0002_0000;
        const RANDOM_TEXTURE = 0x0004_0000;
        const TERRAIN_COLOR_RED = 0x0008_0000;
        const TERRAIN_COLOR_GREEN = 0x0010_0000;
        const TERRAIN_COLOR_BLUE = 0x0020_0000;
        const DWARF_CAN_DIG_THROUGH = 0x0040_0000;
        const REVEAL_THROUGH_FOG_OF_WAR = 0x0080_0000;
        const AMBIENT_COLOR_RED = 0x0100_0000;
        const AMBIENT_COLOR_GREEN = 0x0200_0000;
        const AMBIENT_COLOR_BLUE = 0x0400_0000;
        const TERRAIN_LIGHT = 0x0800_0000;
        const ABSORB_VISION = 0x1000_0000;
    }
}

/// One terrain type (floor, wall, water, lava, claimed path, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Terrain {
    pub name: String,
    pub complete_resource: Option<ArtResource>,
    pub side_resource: Option<ArtResource>,
    pub top_resource: Option<ArtResource>,
    pub tagged_top_resource: Option<ArtResource>,
    pub flags: TerrainFlags,
    pub fill_target_area: u16,
    pub max_health_type_id: u8,
    pub destroyed_type_id: u8,
    pub terrain_light: Color,
    pub texture_frames: u8,
    pub strings: StringIds,
    pub max_health: u16,
    pub ambient_light: Color,
    pub light: Light,
    pub wibble_h: u8,
    pub lean_h: [u8; 3],
    pub wibble_v: u8,
    pub lean_v: [u8; 3],
    pub terrain_id: u8,
    pub starting_health: u16,
    /// Room built on this terrain, 0 if none
    pub room_id: u8,
    pub unknown: u8,
    pub sound_category: String,
}

impl Terrain {
    pub fn is_water(&self) -> bool {
        self.flags.contains(TerrainFlags::WATER)
    }

    pub fn is_lava(&self) -> bool {
        self.flags.contains(TerrainFlags::LAVA)
    }

    pub fn is_solid(&self) -> bool {
        self.flags.contains(TerrainFlags::SOLID)
    }
}

impl CatalogRecord for Terrain {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::Terrain;

    fn id(&self) -> u8 {
        self.terrain_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(NAME_LEN)?;
        let [complete_resource, side_resource, top_resource, tagged_top_resource] =
            read_resources::<4>(reader)?;
        Ok(Self {
            name,
            complete_resource,
            side_resource,
            top_resource,
            tagged_top_resource,
            flags: reader.read_flags_u32()?,
            fill_target_area: reader.read_u16_le()?,
            max_health_type_id: reader.read_u8()?,
            destroyed_type_id: reader.read_u8()?,
            terrain_light: reader.read_color()?,
            texture_frames: reader.read_u8()?,
            strings: StringIds::read(reader)?,
            max_health: reader.read_u16_le()?,
            ambient_light: reader.read_color()?,
            light: Light::read(reader)?,
            wibble_h: reader.read_u8()?,
            lean_h: reader.read_array()?,
            wibble_v: reader.read_u8()?,
            lean_v: reader.read_array()?,
            terrain_id: reader.read_u8()?,
            starting_health: reader.read_u16_le()?,
            room_id: reader.read_u8()?,
            unknown: reader.read_u8()?,
            sound_category: reader.read_string(SOUND_CATEGORY_LEN)?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        write_resources(
            [
                &self.complete_resource,
                &self.side_resource,
                &self.top_resource,
                &self.tagged_top_resource,
            ],
            writer,
        );
        writer.write_flags_u32(self.flags);
        writer.write_u16_le(self.fill_target_area);
        writer.write_u8(self.max_health_type_id);
        writer.write_u8(self.destroyed_type_id);
        writer.write_color(self.terrain_light);
        writer.write_u8(self.texture_frames);
        self.strings.write(writer);
        writer.write_u16_le(self.max_health);
        writer.write_color(self.ambient_light);
        self.light.write(writer);
        writer.write_u8(self.wibble_h);
        writer.write_bytes(&self.lean_h);
        writer.write_u8(self.wibble_v);
        writer.write_bytes(&self.lean_v);
        writer.write_u8(self.terrain_id);
        writer.write_u16_le(self.starting_health);
        writer.write_u8(self.room_id);
        writer.write_u8(self.unknown);
        writer.write_string(&self.sound_category, SOUND_CATEGORY_LEN);
    }
}

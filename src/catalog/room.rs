use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::resource::{read_resources, write_resources};
use crate::codec::{ArtResource, BinaryReader, BinaryWriter, Color};
use crate::error::Result;
use super::{CatalogRecord, StringIds, NAME_LEN, SOUND_CATEGORY_LEN};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct RoomFlags: u32 {
        const PLACEABLE_ON_WATER = 0x0000_0001;
        const PLACEABLE_ON_LAVA = 0x0000_0002;
        const PLACEABLE_ON_LAND = 0x0000_0004;
        const HAS_WALLS = 0x0000_0008;
        const CENTRE = 0x0000_0010;
        const SPECIAL_TILES = 0x0000_0020;
        const NORMAL_TILES = 0x0000_0040;
        const BUILDABLE = 0x0000_0080;
        const SPECIAL_WALLS = 0x0000_0100;
        const ATTACKABLE = 0x0000_0200;
        const HAS_FLAME = 0x0000_1000;
        const IS_GOOD = 0x0000_2000;
    }
}

/// Art resources of a room, in wire order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RoomResources {
    pub gui_icon: Option<ArtResource>,
    pub edit_icon: Option<ArtResource>,
    pub complete: Option<ArtResource>,
    pub straight: Option<ArtResource>,
    pub inside_corner: Option<ArtResource>,
    pub unknown: Option<ArtResource>,
    pub outside_corner: Option<ArtResource>,
    pub wall: Option<ArtResource>,
    pub cap: Option<ArtResource>,
    pub ceiling: Option<ArtResource>,
}

/// Buildable room type
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Room {
    pub name: String,
    pub resources: RoomResources,
    pub ceiling_height: f64,
    pub research_time: u16,
    pub torch_intensity: u8,
    pub flags: RoomFlags,
    pub strings: StringIds,
    pub cost: u16,
    pub fight_effect_id: u16,
    pub torch_height: f64,
    pub effects: [u16; 8],
    pub room_id: u8,
    pub return_percentage: u8,
    /// Terrain the room turns its tiles into
    pub terrain_id: u8,
    pub creature_created_id: u8,
    pub torch_color: Color,
    pub recommended_size_x: u8,
    pub recommended_size_y: u8,
    pub sound_category: String,
}

impl Room {
    pub fn is_placeable_on_land(&self) -> bool {
        self.flags.contains(RoomFlags::PLACEABLE_ON_LAND)
    }
}

impl CatalogRecord for Room {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::Rooms;

    fn id(&self) -> u8 {
        self.room_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(NAME_LEN)?;
        let [gui_icon, edit_icon, complete, straight, inside_corner, unknown, outside_corner, wall, cap, ceiling] =
            read_resources::<10>(reader)?;
        let resources = RoomResources {
            gui_icon,
            edit_icon,
            complete,
            straight,
            inside_corner,
            unknown,
            outside_corner,
            wall,
            cap,
            ceiling,
        };
        let ceiling_height = reader.read_fixed32()?;
        let research_time = reader.read_u16_le()?;
        let torch_intensity = reader.read_u8()?;
        let flags = reader.read_flags_u32()?;
        let strings = StringIds::read(reader)?;
        let cost = reader.read_u16_le()?;
        let fight_effect_id = reader.read_u16_le()?;
        let torch_height = reader.read_fixed32()?;
        let mut effects = [0u16; 8];
        for effect in effects.iter_mut() {
            *effect = reader.read_u16_le()?;
        }
        Ok(Self {
            name,
            resources,
            ceiling_height,
            research_time,
            torch_intensity,
            flags,
            strings,
            cost,
            fight_effect_id,
            torch_height,
            effects,
            room_id: reader.read_u8()?,
            return_percentage: reader.read_u8()?,
            terrain_id: reader.read_u8()?,
            creature_created_id: reader.read_u8()?,
            torch_color: reader.read_color()?,
            recommended_size_x: reader.read_u8()?,
            recommended_size_y: reader.read_u8()?,
            sound_category: reader.read_string(SOUND_CATEGORY_LEN)?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        let r = &self.resources;
        writer.write_string(&self.name, NAME_LEN);
        write_resources(
            [
                &r.gui_icon,
                &r.edit_icon,
                &r.complete,
                &r.straight,
                &r.inside_corner,
                &r.unknown,
                &r.outside_corner,
                &r.wall,
                &r.cap,
                &r.ceiling,
            ],
            writer,
        );
        writer.write_fixed32(self.ceiling_height);
        writer.write_u16_le(self.research_time);
        writer.write_u8(self.torch_intensity);
        writer.write_flags_u32(self.flags);
        self.strings.write(writer);
        writer.write_u16_le(self.cost);
        writer.write_u16_le(self.fight_effect_id);
        writer.write_fixed32(self.torch_height);
        for &effect in &self.effects {
            writer.write_u16_le(effect);
        }
        writer.write_u8(self.room_id);
        writer.write_u8(self.return_percentage);
        writer.write_u8(self.terrain_id);
        writer.write_u8(self.creature_created_id);
        writer.write_color(self.torch_color);
        writer.write_u8(self.recommended_size_x);
        writer.write_u8(self.recommended_size_y);
        writer.write_string(&self.sound_category, SOUND_CATEGORY_LEN);
    }
}

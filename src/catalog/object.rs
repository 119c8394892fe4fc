use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::resource::{read_resources, write_resources};
use crate::codec::types::wire_enum;
use crate::codec::{ArtResource, BinaryReader, BinaryWriter, Light, Material};
use crate::error::Result;
use super::{CatalogRecord, NAME_LEN, SOUND_CATEGORY_LEN};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct ObjectFlags: u32 {
        const DIE_OVER_TIME = 0x0000_0001;
        const DIE_OVER_TIME_IF_NOT_IN_ROOM = 0x0000_0002;
        const TYPE_SPECIAL = 0x0000_0004;
        const TYPE_SPELL_BOOK = 0x0000_0008;
        const TYPE_CRATE = 0x0000_0010;
        const TYPE_LAIR = 0x0000_0020;
        const TYPE_GOLD = 0x0000_0040;
        const TYPE_FOOD = 0x0000_0080;
        const CAN_BE_PICKED_UP = 0x0000_0100;
        const CAN_BE_SLAPPED = 0x0000_0200;
        const DIE_WHEN_SLAPPED = 0x0000_0400;
        const TYPE_LEVEL_GEM = 0x0000_1000;
        const CAN_BE_DROPPED_ON_ANY_LAND = 0x0000_2000;
        const OBSTACLE = 0x0000_4000;
        const BOUNCE = 0x0000_8000;
        const BOUNDING_BOX_IGNORED = 0x0001_0000;
        const IS_LEVEL_GEM = 0x0002_0000;
        const IGNORE_SHADOW = 0x0004_0000;
        const HIGHLIGHTABLE = 0x0008_0000;
    }
}

wire_enum! {
    pub enum ObjectState: u8 {
        None = 0,
        Pulse = 1,
        Hatch = 2,
        Idle = 3,
        Create = 4,
        Drop = 5,
    }
}

/// Pickable or placeable object type (gold, spell books, crates, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GameObject {
    pub name: String,
    pub mesh: Option<ArtResource>,
    pub gui_icon: Option<ArtResource>,
    pub in_hand_icon: Option<ArtResource>,
    pub in_hand_mesh: Option<ArtResource>,
    pub unknown_resource: Option<ArtResource>,
    pub additional_resources: [Option<ArtResource>; 4],
    pub light: Light,
    pub width: f64,
    pub height: f64,
    pub mass: f64,
    pub speed: f64,
    pub air_friction: f64,
    pub material: Material,
    pub flags: ObjectFlags,
    pub hp: u16,
    pub max_angle: u16,
    pub mana_value: u16,
    pub tooltip_string_id: u16,
    pub name_string_id: u16,
    pub slap_effect_id: u16,
    pub death_effect_id: u16,
    pub misc_effect_id: u16,
    pub object_id: u8,
    pub start_state: ObjectState,
    pub room_capacity: u8,
    pub pickup_priority: u8,
    pub sound_category: String,
}

impl GameObject {
    pub fn is_level_gem(&self) -> bool {
        self.flags.contains(ObjectFlags::IS_LEVEL_GEM)
    }
}

impl CatalogRecord for GameObject {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::Objects;

    fn id(&self) -> u8 {
        self.object_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(NAME_LEN)?;
        let [mesh, gui_icon, in_hand_icon, in_hand_mesh, unknown_resource] =
            read_resources::<5>(reader)?;
        Ok(Self {
            name,
            mesh,
            gui_icon,
            in_hand_icon,
            in_hand_mesh,
            unknown_resource,
            additional_resources: read_resources::<4>(reader)?,
            light: Light::read(reader)?,
            width: reader.read_fixed32()?,
            height: reader.read_fixed32()?,
            mass: reader.read_fixed32()?,
            speed: reader.read_fixed32()?,
            air_friction: reader.read_fixed32()?,
            material: reader.read_enum_u8()?,
            flags: reader.read_flags_u32()?,
            hp: reader.read_u16_le()?,
            max_angle: reader.read_u16_le()?,
            mana_value: reader.read_u16_le()?,
            tooltip_string_id: reader.read_u16_le()?,
            name_string_id: reader.read_u16_le()?,
            slap_effect_id: reader.read_u16_le()?,
            death_effect_id: reader.read_u16_le()?,
            misc_effect_id: reader.read_u16_le()?,
            object_id: reader.read_u8()?,
            start_state: reader.read_enum_u8()?,
            room_capacity: reader.read_u8()?,
            pickup_priority: reader.read_u8()?,
            sound_category: reader.read_string(SOUND_CATEGORY_LEN)?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        write_resources(
            [
                &self.mesh,
                &self.gui_icon,
                &self.in_hand_icon,
                &self.in_hand_mesh,
                &self.unknown_resource,
            ]
            .into_iter()
            .chain(&self.additional_resources),
            writer,
        );
        self.light.write(writer);
        writer.write_fixed32(self.width);
        writer.write_fixed32(self.height);
        writer.write_fixed32(self.mass);
        writer.write_fixed32(self.speed);
        writer.write_fixed32(self.air_friction);
        writer.write_enum_u8(self.material);
        writer.write_flags_u32(self.flags);
        writer.write_u16_le(self.hp);
        writer.write_u16_le(self.max_angle);
        writer.write_u16_le(self.mana_value);
        writer.write_u16_le(self.tooltip_string_id);
        writer.write_u16_le(self.name_string_id);
        writer.write_u16_le(self.slap_effect_id);
        writer.write_u16_le(self.death_effect_id);
        writer.write_u16_le(self.misc_effect_id);
        writer.write_u8(self.object_id);
        writer.write_enum_u8(self.start_state);
        writer.write_u8(self.room_capacity);
        writer.write_u8(self.pickup_priority);
        writer.write_string(&self.sound_category, SOUND_CATEGORY_LEN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_util::{decode_all, padded_payload, record_len};
    use crate::codec::ArtResourceKind;

    #[test]
    fn test_object_roundtrip_and_override() {
        let gold = GameObject {
            name: "Gold".into(),
            mesh: Some(ArtResource::new("Gold_Pile", ArtResourceKind::Mesh { scale: 1.0, frames: 1, unknown: 0 })),
            additional_resources: [
                None,
                Some(ArtResource::new("Gold_Large", ArtResourceKind::Mesh { scale: 2.0, frames: 1, unknown: 0 })),
                None,
                None,
            ],
            mass: 0.5,
            material: Material::Metal1,
            flags: ObjectFlags::TYPE_GOLD | ObjectFlags::CAN_BE_PICKED_UP,
            object_id: 1,
            start_state: ObjectState::Idle,
            ..Default::default()
        };
        let gem = GameObject {
            name: "Level Gem".into(),
            flags: ObjectFlags::IS_LEVEL_GEM,
            object_id: 2,
            ..Default::default()
        };
        let replacement = GameObject { name: "Gold (rich)".into(), ..gold.clone() };

        let stride = record_len(&gold);
        let payload = padded_payload(&[gold.clone(), gem.clone(), replacement.clone()], stride);
        let catalog = decode_all::<GameObject>(&payload, 3);

        // Same id overwrites in place, other entries survive.
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[&1], replacement);
        assert!(catalog[&2].is_level_gem());
        assert_eq!(catalog.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }
}

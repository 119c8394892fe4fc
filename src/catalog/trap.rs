use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::resource::{read_resources, write_resources};
use crate::codec::types::wire_enum;
use crate::codec::{ArtResource, BinaryReader, BinaryWriter, Material, Vector3};
use crate::error::Result;
use super::{CatalogRecord, StringIds, NAME_LEN, SOUND_CATEGORY_LEN};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct TrapFlags: u32 {
        const REVEAL_WHEN_FIRED = 0x0000_0001;
        const DISARMABLE = 0x0000_0002;
        const INVISIBLE = 0x0000_0004;
        const REQUIRES_LINE_OF_SIGHT = 0x0000_0010;
        const FIRST_PERSON_OBSTACLE = 0x0000_0020;
        const IS_GOOD = 0x0000_0040;
        const DISABLE_TURNCOAT = 0x0000_0080;
        const REQUIRES_DOOR_FRAME = 0x0000_0100;
        const GUARD_POST = 0x0000_0200;
        const OBSTACLE = 0x0000_0400;
        const DOOR_TRAP = 0x0000_0800;
        const DOESNT_SHOOT_AT_DEAD = 0x0000_1000;
    }
}

wire_enum! {
    /// What sets a trap off
    pub enum TrapTriggerType: u8 {
        None = 0,
        LineOfSight = 1,
        Pressure = 2,
        Plate = 3,
        Proximity = 4,
    }
}

/// Manufacturable trap type
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Trap {
    pub name: String,
    pub mesh: Option<ArtResource>,
    pub gui_icon: Option<ArtResource>,
    pub edit_icon: Option<ArtResource>,
    pub flower_icon: Option<ArtResource>,
    pub fire_resource: Option<ArtResource>,
    pub height: f64,
    pub recharge_time: f64,
    pub charge_time: f64,
    pub threat_duration: f64,
    pub manufacture_required: u32,
    pub idle_effect_delay: f64,
    pub trigger_data: u32,
    pub shot_data1: u32,
    pub shot_data2: u32,
    pub threat: u16,
    pub flags: TrapFlags,
    pub health: u16,
    pub mana_cost: u16,
    pub powerless_effect_id: u16,
    pub idle_effect_id: u16,
    pub death_effect_id: u16,
    pub strings: StringIds,
    pub mana_usage: u16,
    pub shots_when_armed: u8,
    pub trigger_type: TrapTriggerType,
    pub trap_id: u8,
    pub shot_type_id: u8,
    pub manufacture_crate_object_id: u8,
    pub sound_category: String,
    pub material: Material,
    pub order_in_editor: u8,
    pub shot_offset: Vector3,
    pub shot_delay: f64,
    pub health_gain: u16,
}

impl CatalogRecord for Trap {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::Traps;

    fn id(&self) -> u8 {
        self.trap_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(NAME_LEN)?;
        let [mesh, gui_icon, edit_icon, flower_icon, fire_resource] = read_resources::<5>(reader)?;
        Ok(Self {
            name,
            mesh,
            gui_icon,
            edit_icon,
            flower_icon,
            fire_resource,
            height: reader.read_fixed32()?,
            recharge_time: reader.read_fixed32()?,
            charge_time: reader.read_fixed32()?,
            threat_duration: reader.read_fixed32()?,
            manufacture_required: reader.read_u32_le()?,
            idle_effect_delay: reader.read_fixed32()?,
            trigger_data: reader.read_u32_le()?,
            shot_data1: reader.read_u32_le()?,
            shot_data2: reader.read_u32_le()?,
            threat: reader.read_u16_le()?,
            flags: reader.read_flags_u32()?,
            health: reader.read_u16_le()?,
            mana_cost: reader.read_u16_le()?,
            powerless_effect_id: reader.read_u16_le()?,
            idle_effect_id: reader.read_u16_le()?,
            death_effect_id: reader.read_u16_le()?,
            strings: StringIds::read(reader)?,
            mana_usage: reader.read_u16_le()?,
            shots_when_armed: reader.read_u8()?,
            trigger_type: reader.read_enum_u8()?,
            trap_id: reader.read_u8()?,
            shot_type_id: reader.read_u8()?,
            manufacture_crate_object_id: reader.read_u8()?,
            sound_category: reader.read_string(SOUND_CATEGORY_LEN)?,
            material: reader.read_enum_u8()?,
            order_in_editor: reader.read_u8()?,
            shot_offset: reader.read_vector3()?,
            shot_delay: reader.read_fixed32()?,
            health_gain: reader.read_u16_le()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        write_resources(
            [&self.mesh, &self.gui_icon, &self.edit_icon, &self.flower_icon, &self.fire_resource],
            writer,
        );
        writer.write_fixed32(self.height);
        writer.write_fixed32(self.recharge_time);
        writer.write_fixed32(self.charge_time);
        writer.write_fixed32(self.threat_duration);
        writer.write_u32_le(self.manufacture_required);
        writer.write_fixed32(self.idle_effect_delay);
        writer.write_u32_le(self.trigger_data);
        writer.write_u32_le(self.shot_data1);
        writer.write_u32_le(self.shot_data2);
        writer.write_u16_le(self.threat);
        writer.write_flags_u32(self.flags);
        writer.write_u16_le(self.health);
        writer.write_u16_le(self.mana_cost);
        writer.write_u16_le(self.powerless_effect_id);
        writer.write_u16_le(self.idle_effect_id);
        writer.write_u16_le(self.death_effect_id);
        self.strings.write(writer);
        writer.write_u16_le(self.mana_usage);
        writer.write_u8(self.shots_when_armed);
        writer.write_enum_u8(self.trigger_type);
        writer.write_u8(self.trap_id);
        writer.write_u8(self.shot_type_id);
        writer.write_u8(self.manufacture_crate_object_id);
        writer.write_string(&self.sound_category, SOUND_CATEGORY_LEN);
        writer.write_enum_u8(self.material);
        writer.write_u8(self.order_in_editor);
        writer.write_vector3(self.shot_offset);
        writer.write_fixed32(self.shot_delay);
        writer.write_u16_le(self.health_gain);
    }
}

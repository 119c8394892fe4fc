use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::types::wire_enum;
use crate::codec::{ArtResource, BinaryReader, BinaryWriter, Light};
use crate::error::Result;
use super::{CatalogRecord, NAME_LEN, SOUND_CATEGORY_LEN};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct ShotFlags: u32 {
        const PLAYER_COLOURED = 0x0000_0001;
        const AFFECTED_BY_GRAVITY = 0x0000_0002;
        const DIE_WHEN_HIT_SOLID = 0x0000_0004;
        const DIE_WHEN_HIT_WATER = 0x0000_0008;
        const DIE_WHEN_HIT_LAVA = 0x0000_0010;
        const HITS_FRIENDLY = 0x0000_0020;
        const HITS_ENEMY = 0x0000_0040;
        const HOMING = 0x0000_0080;
        const BURNS = 0x0000_0100;
        const DELAYED = 0x0000_0200;
    }
}

wire_enum! {
    pub enum AttackCategory: u8 {
        None = 0,
        Damage = 1,
        Heal = 2,
        Spell = 3,
        Special = 4,
    }
}

wire_enum! {
    /// Behavior that moves the shot each turn
    pub enum ProcessType: u8 {
        None = 0,
        Projectile = 1,
        Beam = 2,
        Area = 3,
        Instant = 4,
        Trap = 5,
        Lightning = 6,
        Cone = 7,
    }
}

/// Projectile, beam or area effect fired by creatures, traps and spells
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Shot {
    pub name: String,
    pub mesh: Option<ArtResource>,
    pub light: Light,
    pub air_friction: f64,
    pub mass: f64,
    pub speed: f64,
    pub data1: u32,
    pub data2: u32,
    pub flags: ShotFlags,
    pub general_effect_id: u16,
    pub creation_effect_id: u16,
    pub death_effect_id: u16,
    pub timed_effect_id: u16,
    pub hit_solid_effect_id: u16,
    pub hit_lava_effect_id: u16,
    pub hit_water_effect_id: u16,
    pub hit_thing_effect_id: u16,
    pub health: u16,
    pub shot_id: u8,
    pub death_shot_id: u8,
    pub timed_delay: u8,
    pub hit_sound_event_id: u16,
    pub birth_sound_event_id: u16,
    pub attack_category: AttackCategory,
    pub process_type: ProcessType,
    pub threat: u16,
    pub burn_duration: f64,
    pub sound_category: String,
}

impl CatalogRecord for Shot {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::Shots;

    fn id(&self) -> u8 {
        self.shot_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            name: reader.read_string(NAME_LEN)?,
            mesh: ArtResource::read(reader)?,
            light: Light::read(reader)?,
            air_friction: reader.read_fixed32()?,
            mass: reader.read_fixed32()?,
            speed: reader.read_fixed32()?,
            data1: reader.read_u32_le()?,
            data2: reader.read_u32_le()?,
            flags: reader.read_flags_u32()?,
            general_effect_id: reader.read_u16_le()?,
            creation_effect_id: reader.read_u16_le()?,
            death_effect_id: reader.read_u16_le()?,
            timed_effect_id: reader.read_u16_le()?,
            hit_solid_effect_id: reader.read_u16_le()?,
            hit_lava_effect_id: reader.read_u16_le()?,
            hit_water_effect_id: reader.read_u16_le()?,
            hit_thing_effect_id: reader.read_u16_le()?,
            health: reader.read_u16_le()?,
            shot_id: reader.read_u8()?,
            death_shot_id: reader.read_u8()?,
            timed_delay: reader.read_u8()?,
            hit_sound_event_id: reader.read_u16_le()?,
            birth_sound_event_id: reader.read_u16_le()?,
            attack_category: reader.read_enum_u8()?,
            process_type: reader.read_enum_u8()?,
            threat: reader.read_u16_le()?,
            burn_duration: reader.read_fixed32()?,
            sound_category: reader.read_string(SOUND_CATEGORY_LEN)?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        ArtResource::write(self.mesh.as_ref(), writer);
        self.light.write(writer);
        writer.write_fixed32(self.air_friction);
        writer.write_fixed32(self.mass);
        writer.write_fixed32(self.speed);
        writer.write_u32_le(self.data1);
        writer.write_u32_le(self.data2);
        writer.write_flags_u32(self.flags);
        for v in [
            self.general_effect_id,
            self.creation_effect_id,
            self.death_effect_id,
            self.timed_effect_id,
            self.hit_solid_effect_id,
            self.hit_lava_effect_id,
            self.hit_water_effect_id,
            self.hit_thing_effect_id,
            self.health,
        ] {
            writer.write_u16_le(v);
        }
        writer.write_u8(self.shot_id);
        writer.write_u8(self.death_shot_id);
        writer.write_u8(self.timed_delay);
        writer.write_u16_le(self.hit_sound_event_id);
        writer.write_u16_le(self.birth_sound_event_id);
        writer.write_enum_u8(self.attack_category);
        writer.write_enum_u8(self.process_type);
        writer.write_u16_le(self.threat);
        writer.write_fixed32(self.burn_duration);
        writer.write_string(&self.sound_category, SOUND_CATEGORY_LEN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_util::{decode_all, padded_payload, record_len};

    #[test]
    fn test_shot_roundtrip() {
        let shot = Shot {
            name: "Lightning".into(),
            speed: 12.0,
            flags: ShotFlags::HITS_ENEMY,
            shot_id: 11,
            attack_category: AttackCategory::Damage,
            process_type: ProcessType::Lightning,
            burn_duration: 0.5,
            ..Default::default()
        };
        let len = record_len(&shot);
        let catalog = decode_all::<Shot>(&padded_payload(&[shot.clone()], len), 1);
        assert_eq!(catalog[&11], shot);
    }
}

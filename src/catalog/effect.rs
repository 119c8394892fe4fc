use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::types::wire_enum;
use crate::codec::{ArtResource, BinaryReader, BinaryWriter, Color};
use crate::error::Result;
use super::{CatalogRecord, NAME_LEN};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct EffectFlags: u32 {
        const DIE_WHEN_HIT_SOLID = 0x0000_0001;
        const DIE_WHEN_HIT_WATER = 0x0000_0002;
        const DIE_WHEN_HIT_LAVA = 0x0000_0004;
        const AFFECTED_BY_GRAVITY = 0x0000_0008;
        const BOUNCE = 0x0000_0010;
        const FADE = 0x0000_0020;
        const SHRINK = 0x0000_0040;
        const EXPAND = 0x0000_0080;
        const UNIFORM_SPEED = 0x0000_0100;
        const PLAYER_COLOURED = 0x0000_0200;
        const GENERATE_RANDOMLY = 0x0000_0400;
        const ROTATE_TO_MOVEMENT = 0x0000_0800;
    }
}

wire_enum! {
    /// How an effect spawns its elements
    pub enum GenerationType: u8 {
        None = 0,
        Standard = 1,
        Explosion = 2,
        Cylinder = 3,
        Spiral = 4,
        Cone = 5,
        Ring = 6,
        Fountain = 7,
    }
}

/// Particle effect: a generator of effect elements
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Effect {
    pub name: String,
    pub art_resource: Option<ArtResource>,
    pub mass: f64,
    pub air_friction: f64,
    pub elasticity: f64,
    pub radius: f64,
    pub min_speed_xy: f64,
    pub max_speed_xy: f64,
    pub min_speed_yz: f64,
    pub max_speed_yz: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub flags: EffectFlags,
    pub effect_id: u16,
    pub min_hp: u16,
    pub max_hp: u16,
    pub fade_duration: u16,
    pub next_effect_id: u16,
    pub death_effect_id: u16,
    pub hit_solid_effect_id: u16,
    pub hit_water_effect_id: u16,
    pub hit_lava_effect_id: u16,
    pub generate_ids: [u16; 8],
    pub outer_origin_range: u16,
    pub lower_height_limit: u16,
    pub upper_height_limit: u16,
    pub orientation_range: u16,
    pub sprite_spin_rate_range: u16,
    pub whirlpool_rate: u16,
    pub directional_spread: u16,
    pub circular_path_rate: u16,
    pub inner_origin_range: u16,
    pub generate_randomness: u16,
    pub misc2: u16,
    pub misc3: u16,
    pub generation_type: GenerationType,
    pub elements_per_turn: u8,
    pub unknown: u16,
}

impl CatalogRecord for Effect {
    type Id = u16;

    const CHUNK: ChunkType = ChunkType::Effects;

    fn id(&self) -> u16 {
        self.effect_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(NAME_LEN)?;
        let art_resource = ArtResource::read(reader)?;
        let mass = reader.read_fixed32()?;
        let air_friction = reader.read_fixed32()?;
        let elasticity = reader.read_fixed32()?;
        let radius = reader.read_fixed32()?;
        let min_speed_xy = reader.read_fixed32()?;
        let max_speed_xy = reader.read_fixed32()?;
        let min_speed_yz = reader.read_fixed32()?;
        let max_speed_yz = reader.read_fixed32()?;
        let min_scale = reader.read_fixed32()?;
        let max_scale = reader.read_fixed32()?;
        let flags = reader.read_flags_u32()?;
        let effect_id = reader.read_u16_le()?;
        let min_hp = reader.read_u16_le()?;
        let max_hp = reader.read_u16_le()?;
        let fade_duration = reader.read_u16_le()?;
        let next_effect_id = reader.read_u16_le()?;
        let death_effect_id = reader.read_u16_le()?;
        let hit_solid_effect_id = reader.read_u16_le()?;
        let hit_water_effect_id = reader.read_u16_le()?;
        let hit_lava_effect_id = reader.read_u16_le()?;
        let mut generate_ids = [0u16; 8];
        for id in generate_ids.iter_mut() {
            *id = reader.read_u16_le()?;
        }
        Ok(Self {
            name,
            art_resource,
            mass,
            air_friction,
            elasticity,
            radius,
            min_speed_xy,
            max_speed_xy,
            min_speed_yz,
            max_speed_yz,
            min_scale,
            max_scale,
            flags,
            effect_id,
            min_hp,
            max_hp,
            fade_duration,
            next_effect_id,
            death_effect_id,
            hit_solid_effect_id,
            hit_water_effect_id,
            hit_lava_effect_id,
            generate_ids,
            outer_origin_range: reader.read_u16_le()?,
            lower_height_limit: reader.read_u16_le()?,
            upper_height_limit: reader.read_u16_le()?,
            orientation_range: reader.read_u16_le()?,
            sprite_spin_rate_range: reader.read_u16_le()?,
            whirlpool_rate: reader.read_u16_le()?,
            directional_spread: reader.read_u16_le()?,
            circular_path_rate: reader.read_u16_le()?,
            inner_origin_range: reader.read_u16_le()?,
            generate_randomness: reader.read_u16_le()?,
            misc2: reader.read_u16_le()?,
            misc3: reader.read_u16_le()?,
            generation_type: reader.read_enum_u8()?,
            elements_per_turn: reader.read_u8()?,
            unknown: reader.read_u16_le()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        ArtResource::write(self.art_resource.as_ref(), writer);
        for v in [
            self.mass,
            self.air_friction,
            self.elasticity,
            self.radius,
            self.min_speed_xy,
            self.max_speed_xy,
            self.min_speed_yz,
            self.max_speed_yz,
            self.min_scale,
            self.max_scale,
        ] {
            writer.write_fixed32(v);
        }
        writer.write_flags_u32(self.flags);
        for v in [
            self.effect_id,
            self.min_hp,
            self.max_hp,
            self.fade_duration,
            self.next_effect_id,
            self.death_effect_id,
            self.hit_solid_effect_id,
            self.hit_water_effect_id,
            self.hit_lava_effect_id,
        ] {
            writer.write_u16_le(v);
        }
        for &id in &self.generate_ids {
            writer.write_u16_le(id);
        }
        for v in [
            self.outer_origin_range,
            self.lower_height_limit,
            self.upper_height_limit,
            self.orientation_range,
            self.sprite_spin_rate_range,
            self.whirlpool_rate,
            self.directional_spread,
            self.circular_path_rate,
            self.inner_origin_range,
            self.generate_randomness,
            self.misc2,
            self.misc3,
        ] {
            writer.write_u16_le(v);
        }
        writer.write_enum_u8(self.generation_type);
        writer.write_u8(self.elements_per_turn);
        writer.write_u16_le(self.unknown);
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct EffectElementFlags: u32 {
        const ROTATE_TO_MOVEMENT_DIRECTION = 0x0000_0001;
        const HAS_MOVEMENT = 0x0000_0002;
        const DIE_WHEN_HIT_SOLID = 0x0000_0004;
        const DIE_WHEN_HIT_WATER = 0x0000_0008;
        const DIE_WHEN_HIT_LAVA = 0x0000_0010;
        const AFFECTED_BY_GRAVITY = 0x0000_0020;
        const BOUNCE = 0x0000_0040;
        const FADE = 0x0000_0080;
        const SHRINK = 0x0000_0100;
        const EXPAND = 0x0000_0200;
        const PLAYER_COLOURED = 0x0000_0400;
        const RANDOM_COLOR = 0x0000_0800;
    }
}

/// Single particle spawned by an effect
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EffectElement {
    pub name: String,
    pub art_resource: Option<ArtResource>,
    pub mass: f64,
    pub air_friction: f64,
    pub elasticity: f64,
    pub min_speed_xy: f64,
    pub max_speed_xy: f64,
    pub min_speed_yz: f64,
    pub max_speed_yz: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_ratio: f64,
    pub flags: EffectElementFlags,
    pub effect_element_id: u16,
    pub min_hp: u16,
    pub max_hp: u16,
    pub death_element_id: u16,
    pub hit_solid_element_id: u16,
    pub hit_water_element_id: u16,
    pub hit_lava_element_id: u16,
    pub color: Color,
    pub random_color_index: u8,
    pub table_color_index: u8,
    pub fade_percentage: u8,
    pub next_effect_id: u16,
}

impl CatalogRecord for EffectElement {
    type Id = u16;

    const CHUNK: ChunkType = ChunkType::EffectElements;

    fn id(&self) -> u16 {
        self.effect_element_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            name: reader.read_string(NAME_LEN)?,
            art_resource: ArtResource::read(reader)?,
            mass: reader.read_fixed32()?,
            air_friction: reader.read_fixed32()?,
            elasticity: reader.read_fixed32()?,
            min_speed_xy: reader.read_fixed32()?,
            max_speed_xy: reader.read_fixed32()?,
            min_speed_yz: reader.read_fixed32()?,
            max_speed_yz: reader.read_fixed32()?,
            min_scale: reader.read_fixed32()?,
            max_scale: reader.read_fixed32()?,
            scale_ratio: reader.read_fixed32()?,
            flags: reader.read_flags_u32()?,
            effect_element_id: reader.read_u16_le()?,
            min_hp: reader.read_u16_le()?,
            max_hp: reader.read_u16_le()?,
            death_element_id: reader.read_u16_le()?,
            hit_solid_element_id: reader.read_u16_le()?,
            hit_water_element_id: reader.read_u16_le()?,
            hit_lava_element_id: reader.read_u16_le()?,
            color: reader.read_color()?,
            random_color_index: reader.read_u8()?,
            table_color_index: reader.read_u8()?,
            fade_percentage: reader.read_u8()?,
            next_effect_id: reader.read_u16_le()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        ArtResource::write(self.art_resource.as_ref(), writer);
        for v in [
            self.mass,
            self.air_friction,
            self.elasticity,
            self.min_speed_xy,
            self.max_speed_xy,
            self.min_speed_yz,
            self.max_speed_yz,
            self.min_scale,
            self.max_scale,
            self.scale_ratio,
        ] {
            writer.write_fixed32(v);
        }
        writer.write_flags_u32(self.flags);
        for v in [
            self.effect_element_id,
            self.min_hp,
            self.max_hp,
            self.death_element_id,
            self.hit_solid_element_id,
            self.hit_water_element_id,
            self.hit_lava_element_id,
        ] {
            writer.write_u16_le(v);
        }
        writer.write_color(self.color);
        writer.write_u8(self.random_color_index);
        writer.write_u8(self.table_color_index);
        writer.write_u8(self.fade_percentage);
        writer.write_u16_le(self.next_effect_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_util::{decode_all, padded_payload, record_len};
    use crate::codec::{ArtResourceKind, ImageInfo};

    #[test]
    fn test_effect_ids_above_u8() {
        let effects: Vec<Effect> = [300u16, 301, 1024]
            .into_iter()
            .map(|effect_id| Effect {
                name: format!("Effect{effect_id}"),
                effect_id,
                generate_ids: [effect_id, 0, 0, 0, 0, 0, 0, 1],
                generation_type: GenerationType::Explosion,
                min_scale: 0.25,
                ..Default::default()
            })
            .collect();
        let stride = record_len(&effects[0]);
        let catalog = decode_all::<Effect>(&padded_payload(&effects, stride), 3);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[&1024], effects[2]);
        assert_eq!(catalog[&300].generate_ids[0], 300);
    }

    #[test]
    fn test_effect_element_roundtrip() {
        let spark = EffectElement {
            name: "Spark".into(),
            art_resource: Some(ArtResource::new(
                "Spark01",
                ArtResourceKind::AdditiveAlpha(ImageInfo { width: 0.125, height: 0.125, frames: 4 }),
            )),
            mass: 0.1,
            scale_ratio: 1.0,
            flags: EffectElementFlags::FADE | EffectElementFlags::AFFECTED_BY_GRAVITY,
            effect_element_id: 512,
            color: Color::rgb(255, 128, 0),
            fade_percentage: 50,
            ..Default::default()
        };
        let len = record_len(&spark);
        let catalog = decode_all::<EffectElement>(&padded_payload(&[spark.clone()], len), 1);
        let decoded = &catalog[&512];
        assert_eq!(decoded.name, "Spark");
        assert_eq!(decoded.flags, spark.flags);
        assert!((decoded.mass - 0.1).abs() < 1.0 / 4096.0);
    }
}

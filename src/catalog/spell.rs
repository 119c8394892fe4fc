use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::resource::read_resources;
use crate::codec::types::wire_enum;
use crate::codec::{ArtResource, BinaryReader, BinaryWriter};
use crate::error::Result;
use super::{CatalogRecord, StringIds, NAME_LEN, SOUND_CATEGORY_LEN};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct CreatureSpellFlags: u32 {
        const IS_ATTACKING = 0x0000_0001;
        const IS_DEFENSIVE = 0x0000_0002;
        const IS_TELEPORT = 0x0000_0004;
        const IS_HEALING = 0x0000_0008;
        const IS_MELEE = 0x0000_0010;
        const IS_SELF_CAST = 0x0000_0020;
        const IS_AREA = 0x0000_0040;
        const DONT_CAST_IN_HAND = 0x0000_0080;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct KeeperSpellFlags: u32 {
        const HAS_BONUS = 0x0000_0001;
        const IS_ATTACKING = 0x0000_0002;
        const IS_INSTANT = 0x0000_0004;
        const DONT_CAST_IN_FOG = 0x0000_0008;
    }
}

wire_enum! {
    /// What a keeper spell may be cast on
    pub enum TargetRule: u8 {
        None = 0,
        AllCreatures = 1,
        KeeperCreatures = 2,
        OwnCreatures = 3,
        EnemyCreatures = 4,
        PossessionCreatures = 5,
        LandTile = 6,
        OwnLandTile = 7,
        AnyTile = 8,
        Location = 9,
    }
}

wire_enum! {
    /// Where a keeper spell may be cast
    pub enum CastRule: u8 {
        None = 0,
        OwnLand = 1,
        AnyLand = 2,
        AnyLandExceptEnemy = 3,
        Anywhere = 4,
    }
}

/// Spell a creature casts on its own
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CreatureSpell {
    pub name: String,
    pub gui_icon: Option<ArtResource>,
    pub edit_icon: Option<ArtResource>,
    pub shot_data1: u32,
    pub shot_data2: u32,
    pub range: f64,
    pub flags: CreatureSpellFlags,
    pub combat_points: u16,
    pub sound_event: u16,
    pub strings: StringIds,
    pub creature_spell_id: u8,
    pub shot_type_id: u8,
    pub alternative_shot: u8,
    pub unknown: u8,
    pub recharge_time: f64,
}

impl CatalogRecord for CreatureSpell {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::CreatureSpells;

    fn id(&self) -> u8 {
        self.creature_spell_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(NAME_LEN)?;
        let [gui_icon, edit_icon] = read_resources::<2>(reader)?;
        Ok(Self {
            name,
            gui_icon,
            edit_icon,
            shot_data1: reader.read_u32_le()?,
            shot_data2: reader.read_u32_le()?,
            range: reader.read_fixed32()?,
            flags: reader.read_flags_u32()?,
            combat_points: reader.read_u16_le()?,
            sound_event: reader.read_u16_le()?,
            strings: StringIds::read(reader)?,
            creature_spell_id: reader.read_u8()?,
            shot_type_id: reader.read_u8()?,
            alternative_shot: reader.read_u8()?,
            unknown: reader.read_u8()?,
            recharge_time: reader.read_fixed32()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        ArtResource::write(self.gui_icon.as_ref(), writer);
        ArtResource::write(self.edit_icon.as_ref(), writer);
        writer.write_u32_le(self.shot_data1);
        writer.write_u32_le(self.shot_data2);
        writer.write_fixed32(self.range);
        writer.write_flags_u32(self.flags);
        writer.write_u16_le(self.combat_points);
        writer.write_u16_le(self.sound_event);
        self.strings.write(writer);
        writer.write_u8(self.creature_spell_id);
        writer.write_u8(self.shot_type_id);
        writer.write_u8(self.alternative_shot);
        writer.write_u8(self.unknown);
        writer.write_fixed32(self.recharge_time);
    }
}

/// Spell the keeper researches and casts
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KeeperSpell {
    pub name: String,
    pub gui_icon: Option<ArtResource>,
    pub edit_icon: Option<ArtResource>,
    pub recharge_time: f64,
    pub shot_data1: u32,
    pub shot_data2: u32,
    pub research_time: u16,
    pub target_rule: TargetRule,
    pub order_in_editor: u8,
    pub flags: KeeperSpellFlags,
    pub mana_drain: u16,
    pub strings: StringIds,
    pub keeper_spell_id: u8,
    pub cast_rule: CastRule,
    pub shot_type_id: u8,
    pub sound_category: String,
    pub bonus_recharge_time: u16,
    pub bonus_shot_type_id: u8,
    pub bonus_shot_data1: u32,
    pub bonus_shot_data2: u32,
    pub mana_cost: i32,
    pub bonus_icon: Option<ArtResource>,
    pub sound_category_gui: String,
    pub hand_animation_id: u8,
    pub no_goal_hand_animation_id: u8,
}

impl CatalogRecord for KeeperSpell {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::KeeperSpells;

    fn id(&self) -> u8 {
        self.keeper_spell_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(NAME_LEN)?;
        let [gui_icon, edit_icon] = read_resources::<2>(reader)?;
        Ok(Self {
            name,
            gui_icon,
            edit_icon,
            recharge_time: reader.read_fixed32()?,
            shot_data1: reader.read_u32_le()?,
            shot_data2: reader.read_u32_le()?,
            research_time: reader.read_u16_le()?,
            target_rule: reader.read_enum_u8()?,
            order_in_editor: reader.read_u8()?,
            flags: reader.read_flags_u32()?,
            mana_drain: reader.read_u16_le()?,
            strings: StringIds::read(reader)?,
            keeper_spell_id: reader.read_u8()?,
            cast_rule: reader.read_enum_u8()?,
            shot_type_id: reader.read_u8()?,
            sound_category: reader.read_string(SOUND_CATEGORY_LEN)?,
            bonus_recharge_time: reader.read_u16_le()?,
            bonus_shot_type_id: reader.read_u8()?,
            bonus_shot_data1: reader.read_u32_le()?,
            bonus_shot_data2: reader.read_u32_le()?,
            mana_cost: reader.read_i32_le()?,
            bonus_icon: ArtResource::read(reader)?,
            sound_category_gui: reader.read_string(SOUND_CATEGORY_LEN)?,
            hand_animation_id: reader.read_u8()?,
            no_goal_hand_animation_id: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        ArtResource::write(self.gui_icon.as_ref(), writer);
        ArtResource::write(self.edit_icon.as_ref(), writer);
        writer.write_fixed32(self.recharge_time);
        writer.write_u32_le(self.shot_data1);
        writer.write_u32_le(self.shot_data2);
        writer.write_u16_le(self.research_time);
        writer.write_enum_u8(self.target_rule);
        writer.write_u8(self.order_in_editor);
        writer.write_flags_u32(self.flags);
        writer.write_u16_le(self.mana_drain);
        self.strings.write(writer);
        writer.write_u8(self.keeper_spell_id);
        writer.write_enum_u8(self.cast_rule);
        writer.write_u8(self.shot_type_id);
        writer.write_string(&self.sound_category, SOUND_CATEGORY_LEN);
        writer.write_u16_le(self.bonus_recharge_time);
        writer.write_u8(self.bonus_shot_type_id);
        writer.write_u32_le(self.bonus_shot_data1);
        writer.write_u32_le(self.bonus_shot_data2);
        writer.write_i32_le(self.mana_cost);
        ArtResource::write(self.bonus_icon.as_ref(), writer);
        writer.write_string(&self.sound_category_gui, SOUND_CATEGORY_LEN);
        writer.write_u8(self.hand_animation_id);
        writer.write_u8(self.no_goal_hand_animation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_util::{decode_all, padded_payload, record_len};

    #[test]
    fn test_creature_spell_roundtrip() {
        let spell = CreatureSpell {
            name: "Fireball".into(),
            range: 6.5,
            flags: CreatureSpellFlags::IS_ATTACKING,
            combat_points: 20,
            creature_spell_id: 2,
            shot_type_id: 9,
            recharge_time: 3.0,
            ..Default::default()
        };
        let len = record_len(&spell);
        let catalog = decode_all::<CreatureSpell>(&padded_payload(&[spell.clone()], len), 1);
        assert_eq!(catalog[&2], spell);
    }

    #[test]
    fn test_keeper_spell_roundtrip() {
        let spell = KeeperSpell {
            name: "Possess".into(),
            recharge_time: 1.0,
            research_time: 100,
            target_rule: TargetRule::PossessionCreatures,
            order_in_editor: 3,
            keeper_spell_id: 7,
            cast_rule: CastRule::OwnLand,
            mana_cost: -25,
            sound_category_gui: "GUI_POSSESS".into(),
            hand_animation_id: 2,
            ..Default::default()
        };
        let len = record_len(&spell);
        let catalog = decode_all::<KeeperSpell>(&padded_payload(&[spell.clone()], len), 1);
        assert_eq!(catalog[&7], spell);
    }

    #[test]
    fn test_keeper_spell_unknown_cast_rule_fails() {
        let spell = KeeperSpell { keeper_spell_id: 1, ..Default::default() };
        let mut writer = BinaryWriter::new();
        spell.write(&mut writer);
        let mut data = writer.into_vec();
        let cast_rule_at = NAME_LEN + 2 * crate::codec::resource::ART_RESOURCE_SIZE + 4 + 4 + 4 + 2 + 1 + 1 + 4 + 2 + 10 + 1;
        data[cast_rule_at] = 200;
        assert!(KeeperSpell::read(&mut BinaryReader::new(&data)).is_err());
    }
}

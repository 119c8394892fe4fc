use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::resource::read_resources;
use crate::codec::types::wire_enum;
use crate::codec::{ArtResource, BinaryReader, BinaryWriter, Light, Vector3};
use crate::error::Result;
use super::{CatalogRecord, StringIds, NAME_LEN, SOUND_CATEGORY_LEN};

/// Number of animation slots on every creature record
pub const ANIMATION_COUNT: usize = 36;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct CreatureFlags: u32 {
        const IS_WORKER = 0x0000_0001;
        const CAN_BE_PICKED_UP = 0x0000_0002;
        const CAN_BE_SLAPPED = 0x0000_0004;
        const ALWAYS_FLEE = 0x0000_0008;
        const CAN_WALK_ON_LAVA = 0x0000_0010;
        const CAN_WALK_ON_WATER = 0x0000_0020;
        const IS_EVIL = 0x0000_0040;
        const IS_IMMUNE_TO_TURNCOAT = 0x0000_0080;
        const AVAILABLE_VIA_PORTAL = 0x0000_0100;
        const CAN_FLY = 0x0000_0200;
        const IS_HORNY = 0x0000_0400;
        const GENERATE_DEAD_BODY = 0x0000_0800;
        const CAN_BE_HYPNOTIZED = 0x0000_1000;
        const IS_IMMUNE_TO_CHICKEN = 0x0000_2000;
        const IS_FEARLESS = 0x0000_4000;
        const CAN_BE_ELECTROCUTED = 0x0000_8000;
        const NEED_BODY_FOR_FIGHT_IDLE = 0x0001_0000;
        const NOT_TRAINABLE = 0x0002_0000;
        const DONT_SHOW_HEALTH_BAR = 0x0004_0000;
    }
}

wire_enum! {
    /// Slot of a creature animation
    pub enum AnimationType: u8 {
        Walk = 0,
        Run = 1,
        Dragged = 2,
        RecoilForwards = 3,
        MeleeAttack = 4,
        CastSpell = 5,
        Die = 6,
        Happy = 7,
        Angry = 8,
        Stunned = 9,
        InHand = 10,
        Sleeping = 11,
        Eating = 12,
        Researching = 13,
        Null1 = 14,
        Null2 = 15,
        TorturedWheel = 16,
        Null3 = 17,
        Drinking = 18,
        Idle1 = 19,
        RecoilBackwards = 20,
        Manufacturing = 21,
        Praying = 22,
        Fallback = 23,
        TorturedChair = 24,
        TorturedChairSkeleton = 25,
        GetUp = 26,
        Dance = 27,
        Drunk = 28,
        Entrance = 29,
        Idle2 = 30,
        Special1 = 31,
        Special2 = 32,
        DrunkIdle = 33,
        WalkBack = 34,
        Pose = 35,
    }
}

wire_enum! {
    pub enum AttractionType: u32 {
        None = 0,
        Room = 1,
        Creature = 2,
    }
}

wire_enum! {
    /// Damage category a creature may resist
    pub enum AttackType: u8 {
        Blunt = 0,
        Slash = 1,
        Pierce = 2,
        Heat = 3,
        Cold = 4,
        Electric = 5,
        Poison = 6,
        Magic = 7,
        Decay = 8,
        Drain = 9,
        Acid = 10,
    }
}

wire_enum! {
    pub enum JobType: u32 {
        None = 0,
        Sleep = 1,
        Eat = 2,
        Research = 3,
        Train = 4,
        Manufacture = 5,
        Guard = 6,
        Torture = 7,
        Pray = 8,
        Drink = 9,
        Lead = 10,
        Defend = 11,
        Scavenge = 12,
        Gamble = 13,
        Explore = 14,
        Dig = 15,
        Claim = 16,
        Fight = 17,
    }
}

wire_enum! {
    pub enum FightStyle: u8 {
        NonFighter = 0,
        Melee = 1,
        Ranged = 2,
        Support = 3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Attraction {
    pub kind: AttractionType,
    pub id: u16,
    pub size: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Spell {
    pub shot_offset: Vector3,
    pub creature_spell_id: u8,
    pub level_available: u8,
    pub unknown: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Resistance {
    pub attack_type: AttackType,
    pub value: u8,
}

/// Job preference with its effect on mood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Job {
    pub job_type: JobType,
    pub mood_change: i16,
    pub unknown: u16,
}

impl Job {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            job_type: reader.read_enum_u32()?,
            mood_change: reader.read_i16_le()?,
            unknown: reader.read_u16_le()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_enum_u32(self.job_type);
        writer.write_i16_le(self.mood_change);
        writer.write_u16_le(self.unknown);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CreatureAttributes {
    pub height: f64,
    pub eye_height: f64,
    pub speed: f64,
    pub run_speed: f64,
    pub hunger_rate: f64,
    pub hunger_fill: f64,
    pub free_time: f64,
    pub health: u16,
    pub initial_gold_held: u16,
    pub mana: u16,
    pub experience_for_next_level: u16,
    pub experience_per_second: u16,
    pub research_per_second: u16,
    pub manufacture_per_second: u16,
    pub strength: u16,
    pub dexterity: u16,
    pub defence: u16,
    pub pay: u16,
}

impl CreatureAttributes {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            height: reader.read_fixed32()?,
            eye_height: reader.read_fixed32()?,
            speed: reader.read_fixed32()?,
            run_speed: reader.read_fixed32()?,
            hunger_rate: reader.read_fixed32()?,
            hunger_fill: reader.read_fixed32()?,
            free_time: reader.read_fixed32()?,
            health: reader.read_u16_le()?,
            initial_gold_held: reader.read_u16_le()?,
            mana: reader.read_u16_le()?,
            experience_for_next_level: reader.read_u16_le()?,
            experience_per_second: reader.read_u16_le()?,
            research_per_second: reader.read_u16_le()?,
            manufacture_per_second: reader.read_u16_le()?,
            strength: reader.read_u16_le()?,
            dexterity: reader.read_u16_le()?,
            defence: reader.read_u16_le()?,
            pay: reader.read_u16_le()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        for v in [
            self.height,
            self.eye_height,
            self.speed,
            self.run_speed,
            self.hunger_rate,
            self.hunger_fill,
            self.free_time,
        ] {
            writer.write_fixed32(v);
        }
        for v in [
            self.health,
            self.initial_gold_held,
            self.mana,
            self.experience_for_next_level,
            self.experience_per_second,
            self.research_per_second,
            self.manufacture_per_second,
            self.strength,
            self.dexterity,
            self.defence,
            self.pay,
        ] {
            writer.write_u16_le(v);
        }
    }
}

/// Creature type: keeper minions, heroes and neutrals alike
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Creature {
    pub name: String,
    /// One slot per [`AnimationType`], in wire order
    pub animations: Vec<Option<ArtResource>>,
    pub portrait: Option<ArtResource>,
    pub icon1: Option<ArtResource>,
    pub icon2: Option<ArtResource>,
    pub light: Light,
    pub attractions: [Attraction; 2],
    pub first_person_waddle_scale: f64,
    pub first_person_oscillate_scale: f64,
    pub spells: [Spell; 3],
    pub resistances: [Resistance; 4],
    pub happy_jobs: [Job; 3],
    pub unhappy_jobs: [Job; 2],
    pub angry_jobs: [Job; 3],
    pub hated_jobs: [JobType; 2],
    pub attributes: CreatureAttributes,
    pub flags: CreatureFlags,
    pub strings: StringIds,
    pub feared_creature_id: u8,
    pub hated_creature_id: u8,
    pub lair_object_id: u8,
    pub fight_style: FightStyle,
    pub creature_id: u8,
    pub sound_category: String,
}

impl Creature {
    pub fn animation(&self, animation: AnimationType) -> Option<&ArtResource> {
        self.animations.get(animation as usize)?.as_ref()
    }

    pub fn is_worker(&self) -> bool {
        self.flags.contains(CreatureFlags::IS_WORKER)
    }

    pub fn is_evil(&self) -> bool {
        self.flags.contains(CreatureFlags::IS_EVIL)
    }
}

impl CatalogRecord for Creature {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::Creatures;

    fn id(&self) -> u8 {
        self.creature_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(NAME_LEN)?;
        let animations = read_resources::<ANIMATION_COUNT>(reader)?.into_iter().collect();
        let [portrait, icon1, icon2] = read_resources::<3>(reader)?;
        let light = Light::read(reader)?;

        let mut attractions = [Attraction::default(); 2];
        for attraction in attractions.iter_mut() {
            *attraction = Attraction {
                kind: reader.read_enum_u32()?,
                id: reader.read_u16_le()?,
                size: reader.read_u16_le()?,
            };
        }
        let first_person_waddle_scale = reader.read_fixed32()?;
        let first_person_oscillate_scale = reader.read_fixed32()?;

        let mut spells = [Spell::default(); 3];
        for spell in spells.iter_mut() {
            *spell = Spell {
                shot_offset: reader.read_vector3()?,
                creature_spell_id: reader.read_u8()?,
                level_available: reader.read_u8()?,
                unknown: reader.read_u16_le()?,
            };
        }
        let mut resistances = [Resistance::default(); 4];
        for resistance in resistances.iter_mut() {
            *resistance = Resistance {
                attack_type: reader.read_enum_u8()?,
                value: reader.read_u8()?,
            };
        }

        let mut happy_jobs = [Job::default(); 3];
        for job in happy_jobs.iter_mut() {
            *job = Job::read(reader)?;
        }
        let mut unhappy_jobs = [Job::default(); 2];
        for job in unhappy_jobs.iter_mut() {
            *job = Job::read(reader)?;
        }
        let mut angry_jobs = [Job::default(); 3];
        for job in angry_jobs.iter_mut() {
            *job = Job::read(reader)?;
        }
        let hated_jobs = [reader.read_enum_u32()?, reader.read_enum_u32()?];

        Ok(Self {
            name,
            animations,
            portrait,
            icon1,
            icon2,
            light,
            attractions,
            first_person_waddle_scale,
            first_person_oscillate_scale,
            spells,
            resistances,
            happy_jobs,
            unhappy_jobs,
            angry_jobs,
            hated_jobs,
            attributes: CreatureAttributes::read(reader)?,
            flags: reader.read_flags_u32()?,
            strings: StringIds::read(reader)?,
            feared_creature_id: reader.read_u8()?,
            hated_creature_id: reader.read_u8()?,
            lair_object_id: reader.read_u8()?,
            fight_style: reader.read_enum_u8()?,
            creature_id: reader.read_u8()?,
            sound_category: reader.read_string(SOUND_CATEGORY_LEN)?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        for slot in 0..ANIMATION_COUNT {
            ArtResource::write(self.animations.get(slot).and_then(Option::as_ref), writer);
        }
        ArtResource::write(self.portrait.as_ref(), writer);
        ArtResource::write(self.icon1.as_ref(), writer);
        ArtResource::write(self.icon2.as_ref(), writer);
        self.light.write(writer);
        for attraction in &self.attractions {
            writer.write_enum_u32(attraction.kind);
            writer.write_u16_le(attraction.id);
            writer.write_u16_le(attraction.size);
        }
        writer.write_fixed32(self.first_person_waddle_scale);
        writer.write_fixed32(self.first_person_oscillate_scale);
        for spell in &self.spells {
            writer.write_vector3(spell.shot_offset);
            writer.write_u8(spell.creature_spell_id);
            writer.write_u8(spell.level_available);
            writer.write_u16_le(spell.unknown);
        }
        for resistance in &self.resistances {
            writer.write_enum_u8(resistance.attack_type);
            writer.write_u8(resistance.value);
        }
        for job in self.happy_jobs.iter().chain(&self.unhappy_jobs).chain(&self.angry_jobs) {
            job.write(writer);
        }
        for job in self.hated_jobs {
            writer.write_enum_u32(job);
        }
        self.attributes.write(writer);
        writer.write_flags_u32(self.flags);
        self.strings.write(writer);
        writer.write_u8(self.feared_creature_id);
        writer.write_u8(self.hated_creature_id);
        writer.write_u8(self.lair_object_id);
        writer.write_enum_u8(self.fight_style);
        writer.write_u8(self.creature_id);
        writer.write_string(&self.sound_category, SOUND_CATEGORY_LEN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_util::{decode_all, padded_payload, record_len};
    use crate::codec::{ArtResourceKind, Color};

    fn imp() -> Creature {
        let mut animations = vec![None; ANIMATION_COUNT];
        animations[AnimationType::Walk as usize] = Some(ArtResource::new(
            "Imp_Walk",
            ArtResourceKind::AnimatingMesh { frames: 24, fps: 30, start_dist: 10, end_dist: 40 },
        ));
        Creature {
            name: "Imp".into(),
            animations,
            light: Light { radius: 2.0, color: Color::rgb(255, 200, 0), ..Default::default() },
            spells: [
                Spell { creature_spell_id: 3, level_available: 4, ..Default::default() },
                Spell::default(),
                Spell::default(),
            ],
            resistances: [
                Resistance { attack_type: AttackType::Heat, value: 20 },
                Resistance::default(),
                Resistance::default(),
                Resistance::default(),
            ],
            happy_jobs: [
                Job { job_type: JobType::Dig, mood_change: 5, unknown: 0 },
                Job::default(),
                Job::default(),
            ],
            hated_jobs: [JobType::Fight, JobType::None],
            attributes: CreatureAttributes {
                height: 0.75,
                speed: 1.5,
                health: 150,
                pay: 0,
                ..Default::default()
            },
            flags: CreatureFlags::IS_WORKER | CreatureFlags::IS_EVIL | CreatureFlags::CAN_BE_PICKED_UP,
            fight_style: FightStyle::Melee,
            creature_id: 1,
            sound_category: "IMP".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_creature_roundtrip() {
        let imp = imp();
        let len = record_len(&imp);
        let catalog = decode_all::<Creature>(&padded_payload(&[imp.clone()], len), 1);
        let decoded = &catalog[&1];
        assert_eq!(decoded, &imp);
        assert!(decoded.is_worker() && decoded.is_evil());
        assert_eq!(decoded.animation(AnimationType::Walk).map(|a| a.name.as_str()), Some("Imp_Walk"));
        assert!(decoded.animation(AnimationType::Die).is_none());
    }

    #[test]
    fn test_short_animation_list_is_padded() {
        let mut creature = imp();
        creature.animations.truncate(1);
        let full = imp();
        assert_eq!(record_len(&creature), record_len(&full));
    }
}

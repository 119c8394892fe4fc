//! Variable tables: creature pools, availability, sacrifices, creature stat
//! overrides, alliances and miscellaneous tunables.
//!
//! Every record is 16 bytes: an `i32` id selecting the layout of the
//! remaining 12 bytes.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::debug;

use crate::codec::chunk::{read_strided, ChunkType};
use crate::codec::types::wire_enum;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;

pub type FastMap<K, V> = IndexMap<K, V, ahash::RandomState>;
pub type FastSet<T> = IndexSet<T, ahash::RandomState>;

/// Encoded width of one variable record
pub const VARIABLE_SIZE: usize = 16;

pub mod id {
    pub const CREATURE_POOL: i32 = 1;
    pub const AVAILABILITY: i32 = 2;
    pub const SACRIFICES: i32 = 74;
    pub const CREATURE_STATS: i32 = 75;
    pub const CREATURE_FIRST_PERSON_STATS: i32 = 76;
    pub const PLAYER_ALLIANCE: i32 = 77;

    /// Ids present in shipped data whose payload means nothing to the loader
    pub const IGNORED: [i32; 3] = [0, 17, 66];
}

wire_enum! {
    pub enum AvailabilityType: u16 {
        None = 0,
        Creature = 1,
        Door = 2,
        Room = 3,
        Spell = 4,
        Trap = 5,
    }
}

wire_enum! {
    pub enum AvailabilityValue: u32 {
        Unavailable = 0,
        Available = 1,
        Researchable = 2,
        Disabled = 3,
    }
}

wire_enum! {
    pub enum SacrificeRewardType: u8 {
        None = 0,
        Creature = 1,
        Spell = 2,
        Curse = 3,
        Gold = 4,
        Mana = 5,
    }
}

wire_enum! {
    /// Creature attribute a stat override applies to
    pub enum CreatureStat: u32 {
        Height = 0,
        Health = 1,
        HealthGain = 2,
        Speed = 3,
        RunSpeed = 4,
        Strength = 5,
        Dexterity = 6,
        Defence = 7,
        Pay = 8,
        InitialGoldHeld = 9,
        MaxGoldHeld = 10,
        Mana = 11,
        ManaGain = 12,
        ExperienceForNextLevel = 13,
        ExperiencePerSecond = 14,
        ResearchPerSecond = 15,
        ManufacturePerSecond = 16,
        HungerRate = 17,
        Fear = 18,
        Threat = 19,
        MeleeRecharge = 20,
        MeleeDamage = 21,
        MeleeRange = 22,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Availability {
    pub kind: AvailabilityType,
    pub player_id: u16,
    pub type_id: i32,
    pub value: AvailabilityValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Sacrifice {
    pub creature_ids: [u8; 3],
    pub reward_type: SacrificeRewardType,
    pub speech_id: u8,
    pub reward_value: u8,
    pub unknown: [u8; 6],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PlayerAlliance {
    pub player_one: i32,
    pub player_two: i32,
    pub unknown: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MiscVariable {
    pub value: i32,
    pub unknown1: i32,
    pub unknown2: i32,
}

/// One decoded variable record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Variable {
    CreaturePool { creature_id: i32, value: i32, player_id: i32 },
    Availability(Availability),
    Sacrifice(Sacrifice),
    CreatureStat { stat: CreatureStat, value: i32, level: i32 },
    FirstPersonStat { stat: CreatureStat, value: i32, level: i32 },
    PlayerAlliance(PlayerAlliance),
    Ignored { id: i32, data: [u8; 12] },
    Misc { id: i32, variable: MiscVariable },
}

impl Variable {
    pub fn id(&self) -> i32 {
        match self {
            Self::CreaturePool { .. } => id::CREATURE_POOL,
            Self::Availability(_) => id::AVAILABILITY,
            Self::Sacrifice(_) => id::SACRIFICES,
            Self::CreatureStat { .. } => id::CREATURE_STATS,
            Self::FirstPersonStat { .. } => id::CREATURE_FIRST_PERSON_STATS,
            Self::PlayerAlliance(_) => id::PLAYER_ALLIANCE,
            Self::Ignored { id, .. } | Self::Misc { id, .. } => *id,
        }
    }

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let var_id = reader.read_i32_le()?;
        let variable = match var_id {
            id::CREATURE_POOL => Self::CreaturePool {
                creature_id: reader.read_i32_le()?,
                value: reader.read_i32_le()?,
                player_id: reader.read_i32_le()?,
            },
            id::AVAILABILITY => Self::Availability(Availability {
                kind: reader.read_enum_u16()?,
                player_id: reader.read_u16_le()?,
                type_id: reader.read_i32_le()?,
                value: reader.read_enum_u32()?,
            }),
            id::SACRIFICES => Self::Sacrifice(Sacrifice {
                creature_ids: reader.read_array()?,
                reward_type: reader.read_enum_u8()?,
                speech_id: reader.read_u8()?,
                reward_value: reader.read_u8()?,
                unknown: reader.read_array()?,
            }),
            id::CREATURE_STATS => Self::CreatureStat {
                stat: reader.read_enum_u32()?,
                value: reader.read_i32_le()?,
                level: reader.read_i32_le()?,
            },
            id::CREATURE_FIRST_PERSON_STATS => Self::FirstPersonStat {
                stat: reader.read_enum_u32()?,
                value: reader.read_i32_le()?,
                level: reader.read_i32_le()?,
            },
            id::PLAYER_ALLIANCE => Self::PlayerAlliance(PlayerAlliance {
                player_one: reader.read_i32_le()?,
                player_two: reader.read_i32_le()?,
                unknown: reader.read_i32_le()?,
            }),
            other if id::IGNORED.contains(&other) => Self::Ignored {
                id: other,
                data: reader.read_array()?,
            },
            other => Self::Misc {
                id: other,
                variable: MiscVariable {
                    value: reader.read_i32_le()?,
                    unknown1: reader.read_i32_le()?,
                    unknown2: reader.read_i32_le()?,
                },
            },
        };
        Ok(variable)
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.id());
        match self {
            Self::CreaturePool { creature_id, value, player_id } => {
                writer.write_i32_le(*creature_id);
                writer.write_i32_le(*value);
                writer.write_i32_le(*player_id);
            }
            Self::Availability(a) => {
                writer.write_enum_u16(a.kind);
                writer.write_u16_le(a.player_id);
                writer.write_i32_le(a.type_id);
                writer.write_enum_u32(a.value);
            }
            Self::Sacrifice(s) => {
                writer.write_bytes(&s.creature_ids);
                writer.write_enum_u8(s.reward_type);
                writer.write_u8(s.speech_id);
                writer.write_u8(s.reward_value);
                writer.write_bytes(&s.unknown);
            }
            Self::CreatureStat { stat, value, level } | Self::FirstPersonStat { stat, value, level } => {
                writer.write_enum_u32(*stat);
                writer.write_i32_le(*value);
                writer.write_i32_le(*level);
            }
            Self::PlayerAlliance(a) => {
                writer.write_i32_le(a.player_one);
                writer.write_i32_le(a.player_two);
                writer.write_i32_le(a.unknown);
            }
            Self::Ignored { data, .. } => writer.write_bytes(data),
            Self::Misc { variable, .. } => {
                writer.write_i32_le(variable.value);
                writer.write_i32_le(variable.unknown1);
                writer.write_i32_le(variable.unknown2);
            }
        }
    }
}

/// All variable tables of a level
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Variables {
    /// player id -> creature id -> pool size
    pub creature_pools: FastMap<i32, FastMap<i32, i32>>,
    pub availabilities: Vec<Availability>,
    pub sacrifices: FastSet<Sacrifice>,
    /// level -> stat -> value
    pub creature_stats: FastMap<i32, FastMap<CreatureStat, i32>>,
    pub creature_first_person_stats: FastMap<i32, FastMap<CreatureStat, i32>>,
    pub player_alliances: FastSet<PlayerAlliance>,
    pub misc: FastMap<i32, MiscVariable>,
}

impl Variables {
    /// Decode `count` records and merge them into the tables.
    pub fn read_into(&mut self, payload: &mut BinaryReader, count: u32) -> Result<()> {
        read_strided(ChunkType::Variables, payload, count, |reader| {
            let variable = Variable::read(reader)?;
            self.insert(variable);
            Ok(())
        })
    }

    /// Merge one record; a record with the same key replaces the old value.
    pub fn insert(&mut self, variable: Variable) {
        match variable {
            Variable::CreaturePool { creature_id, value, player_id } => {
                self.creature_pools.entry(player_id).or_default().insert(creature_id, value);
            }
            Variable::Availability(availability) => {
                let existing = self.availabilities.iter_mut().find(|a| {
                    a.kind == availability.kind
                        && a.player_id == availability.player_id
                        && a.type_id == availability.type_id
                });
                match existing {
                    Some(slot) => *slot = availability,
                    None => self.availabilities.push(availability),
                }
            }
            Variable::Sacrifice(sacrifice) => {
                self.sacrifices.insert(sacrifice);
            }
            Variable::CreatureStat { stat, value, level } => {
                self.creature_stats.entry(level).or_default().insert(stat, value);
            }
            Variable::FirstPersonStat { stat, value, level } => {
                self.creature_first_person_stats.entry(level).or_default().insert(stat, value);
            }
            Variable::PlayerAlliance(alliance) => {
                self.player_alliances.insert(alliance);
            }
            Variable::Ignored { id, .. } => {
                debug!(id, "skipping variable with unknown meaning");
            }
            Variable::Misc { id, variable } => {
                self.misc.insert(id, variable);
            }
        }
    }

    pub fn creature_pool(&self, player_id: i32) -> Option<&FastMap<i32, i32>> {
        self.creature_pools.get(&player_id)
    }

    pub fn creature_stat(&self, level: i32, stat: CreatureStat) -> Option<i32> {
        self.creature_stats.get(&level)?.get(&stat).copied()
    }

    pub fn first_person_stat(&self, level: i32, stat: CreatureStat) -> Option<i32> {
        self.creature_first_person_stats.get(&level)?.get(&stat).copied()
    }

    pub fn availability(&self, player_id: u16, kind: AvailabilityType, type_id: i32) -> Option<AvailabilityValue> {
        self.availabilities
            .iter()
            .find(|a| a.player_id == player_id && a.kind == kind && a.type_id == type_id)
            .map(|a| a.value)
    }

    pub fn are_allied(&self, a: i32, b: i32) -> bool {
        self.player_alliances
            .iter()
            .any(|p| (p.player_one == a && p.player_two == b) || (p.player_one == b && p.player_two == a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(vars: &[Variable], pad: usize) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        for var in vars {
            var.write(&mut writer);
            writer.write_zeros(pad);
        }
        writer.into_vec()
    }

    fn decode(data: &[u8], count: u32) -> Variables {
        let mut vars = Variables::default();
        let mut reader = BinaryReader::new(data);
        vars.read_into(&mut reader, count).unwrap();
        assert!(reader.is_empty());
        vars
    }

    #[test]
    fn test_every_record_is_sixteen_bytes() {
        let vars = [
            Variable::CreaturePool { creature_id: 4, value: 10, player_id: 3 },
            Variable::Sacrifice(Sacrifice {
                creature_ids: [1, 2, 3],
                reward_type: SacrificeRewardType::Spell,
                speech_id: 5,
                reward_value: 9,
                unknown: [0; 6],
            }),
            Variable::Ignored { id: 17, data: [0xAB; 12] },
            Variable::Misc { id: 40, variable: MiscVariable { value: 3, unknown1: 0, unknown2: 0 } },
        ];
        for var in &vars {
            assert_eq!(encode(std::slice::from_ref(var), 0).len(), VARIABLE_SIZE);
        }
    }

    #[test]
    fn test_tables_merge_by_key() {
        let data = encode(
            &[
                Variable::CreaturePool { creature_id: 4, value: 10, player_id: 3 },
                Variable::CreaturePool { creature_id: 5, value: 2, player_id: 3 },
                Variable::CreaturePool { creature_id: 4, value: 12, player_id: 3 },
                Variable::CreatureStat { stat: CreatureStat::Health, value: 100, level: 1 },
                Variable::CreatureStat { stat: CreatureStat::Health, value: 150, level: 2 },
                Variable::FirstPersonStat { stat: CreatureStat::Speed, value: 7, level: 1 },
                Variable::Availability(Availability {
                    kind: AvailabilityType::Room,
                    player_id: 3,
                    type_id: 9,
                    value: AvailabilityValue::Researchable,
                }),
                Variable::Availability(Availability {
                    kind: AvailabilityType::Room,
                    player_id: 3,
                    type_id: 9,
                    value: AvailabilityValue::Available,
                }),
                Variable::PlayerAlliance(PlayerAlliance { player_one: 3, player_two: 4, unknown: 0 }),
                Variable::PlayerAlliance(PlayerAlliance { player_one: 3, player_two: 4, unknown: 0 }),
                Variable::Ignored { id: 66, data: [0; 12] },
                Variable::Misc { id: 30, variable: MiscVariable { value: 1, unknown1: 0, unknown2: 0 } },
                Variable::Misc { id: 30, variable: MiscVariable { value: 2, unknown1: 0, unknown2: 0 } },
            ],
            0,
        );
        let vars = decode(&data, 13);

        let pool = vars.creature_pool(3).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[&4], 12);
        assert_eq!(vars.creature_stat(1, CreatureStat::Health), Some(100));
        assert_eq!(vars.creature_stat(2, CreatureStat::Health), Some(150));
        assert_eq!(vars.creature_stat(3, CreatureStat::Health), None);
        assert_eq!(vars.first_person_stat(1, CreatureStat::Speed), Some(7));
        assert_eq!(vars.availabilities.len(), 1);
        assert_eq!(vars.availability(3, AvailabilityType::Room, 9), Some(AvailabilityValue::Available));
        assert_eq!(vars.player_alliances.len(), 1);
        assert!(vars.are_allied(4, 3));
        assert!(!vars.misc.contains_key(&66));
        assert_eq!(vars.misc[&30].value, 2);
    }

    #[test]
    fn test_padded_records_resync() {
        let data = encode(
            &[
                Variable::CreaturePool { creature_id: 1, value: 1, player_id: 1 },
                Variable::CreaturePool { creature_id: 2, value: 2, player_id: 1 },
            ],
            4,
        );
        let vars = decode(&data, 2);
        assert_eq!(vars.creature_pool(1).map(|p| p.len()), Some(2));
    }
}

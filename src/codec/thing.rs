//! Placed things: objects, traps, doors, creatures, parties, cameras and the
//! other items a level puts on its map.
//!
//! Every record is `tag u32, length u32, body`. The body layout is selected by
//! the tag; after decoding, the cursor is forced onto `body_start + length` so
//! a body that is longer or shorter than the known layout cannot corrupt the
//! records after it. Unknown tags are skipped whole.

use bitflags::bitflags;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use super::reader::BinaryReader;
use super::types::{wire_enum, Vector3};
use super::writer::BinaryWriter;

/// Record tags of the things chunk
pub mod tag {
    pub const OBJECT: u32 = 194;
    pub const TRAP: u32 = 195;
    pub const DOOR: u32 = 196;
    pub const ACTION_POINT: u32 = 197;
    pub const NEUTRAL_CREATURE: u32 = 198;
    pub const GOOD_CREATURE: u32 = 199;
    pub const KEEPER_CREATURE: u32 = 200;
    pub const HERO_PARTY: u32 = 201;
    pub const DEAD_BODY: u32 = 202;
    pub const EFFECT_GENERATOR: u32 = 203;
    pub const ROOM: u32 = 204;
    pub const CAMERA: u32 = 205;
}

/// Member slots of a hero party record
pub const HERO_PARTY_SLOTS: usize = 16;

pub const ACTION_POINT_NAME_LEN: usize = 32;
pub const HERO_PARTY_NAME_LEN: usize = 32;

/// Fixed-layout body of a thing record
pub trait ThingBody: Sized {
    fn read(reader: &mut BinaryReader) -> Result<Self>;

    fn write(&self, writer: &mut BinaryWriter);
}

/// A thing archetype that [`Things`] keeps its own list of
pub trait ThingKind: ThingBody {
    const TAG: u32;

    fn of(things: &Things) -> &[Self];
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct CreatureThingFlags: u8 {
        const WILL_FIGHT = 0x01;
        const LEADER = 0x02;
        const FOLLOWER = 0x04;
        const WILL_BE_ATTACKED = 0x08;
        const RETURN_TO_HERO_LAIR = 0x10;
        const FREE_FRIENDS_ON_JAIL_BREAK = 0x20;
        const ACT_AS_DROPPED = 0x40;
        const START_AS_DYING = 0x80;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct ActionPointFlags: u16 {
        const REVEAL_THROUGH_FOG_OF_WAR = 0x0001;
        const TOOL_BOX = 0x0002;
        const IGNORE_SOLID = 0x0004;
        const HERO_LAIR = 0x0008;
        const INVASION = 0x0010;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct CameraFlags: u32 {
        const DISABLE_YAW = 0x0000_0001;
        const DISABLE_PITCH = 0x0000_0002;
        const DISABLE_ROLL = 0x0000_0004;
        const DISABLE_MOVE = 0x0000_0008;
        const DISABLE_ZOOM = 0x0000_0010;
        const DISABLE_CHANGE = 0x0000_0020;
    }
}

wire_enum! {
    pub enum DoorState: u8 {
        None = 0,
        Locked = 1,
        Blueprint = 2,
    }
}

wire_enum! {
    /// What a hero heads for
    pub enum HeroObjective: u8 {
        None = 0,
        DestroyRooms = 1,
        DestroyWalls = 2,
        StealGold = 3,
        StealSpells = 4,
        StealMinions = 5,
        KillCreatures = 6,
        KillPlayer = 7,
        Wait = 8,
        SendToActionPoint = 9,
        JailBreak = 10,
    }
}

wire_enum! {
    pub enum Direction: u8 {
        North = 0,
        East = 1,
        South = 2,
        West = 3,
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Object {
    pub x: i32,
    pub y: i32,
    pub keeper_spell_id: i32,
    pub money_amount: i32,
    pub trigger_id: u16,
    pub object_id: u8,
    pub player_id: u8,
}

impl ThingBody for Object {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32_le()?,
            y: reader.read_i32_le()?,
            keeper_spell_id: reader.read_i32_le()?,
            money_amount: reader.read_i32_le()?,
            trigger_id: reader.read_u16_le()?,
            object_id: reader.read_u8()?,
            player_id: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.x);
        writer.write_i32_le(self.y);
        writer.write_i32_le(self.keeper_spell_id);
        writer.write_i32_le(self.money_amount);
        writer.write_u16_le(self.trigger_id);
        writer.write_u8(self.object_id);
        writer.write_u8(self.player_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Trap {
    pub x: i32,
    pub y: i32,
    pub unknown1: i32,
    /// Shots left
    pub number: u8,
    pub trap_id: u8,
    pub player_id: u8,
    pub unknown2: u8,
}

impl ThingBody for Trap {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32_le()?,
            y: reader.read_i32_le()?,
            unknown1: reader.read_i32_le()?,
            number: reader.read_u8()?,
            trap_id: reader.read_u8()?,
            player_id: reader.read_u8()?,
            unknown2: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.x);
        writer.write_i32_le(self.y);
        writer.write_i32_le(self.unknown1);
        writer.write_u8(self.number);
        writer.write_u8(self.trap_id);
        writer.write_u8(self.player_id);
        writer.write_u8(self.unknown2);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Door {
    pub x: i32,
    pub y: i32,
    pub unknown1: i32,
    pub trigger_id: u16,
    pub door_id: u8,
    pub player_id: u8,
    pub state: DoorState,
    pub unknown2: [u8; 3],
}

impl ThingBody for Door {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32_le()?,
            y: reader.read_i32_le()?,
            unknown1: reader.read_i32_le()?,
            trigger_id: reader.read_u16_le()?,
            door_id: reader.read_u8()?,
            player_id: reader.read_u8()?,
            state: reader.read_enum_u8()?,
            unknown2: reader.read_array()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.x);
        writer.write_i32_le(self.y);
        writer.write_i32_le(self.unknown1);
        writer.write_u16_le(self.trigger_id);
        writer.write_u8(self.door_id);
        writer.write_u8(self.player_id);
        writer.write_enum_u8(self.state);
        writer.write_bytes(&self.unknown2);
    }
}

/// Named rectangle of tiles that triggers and heroes refer to
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ActionPoint {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
    pub wait_delay: u16,
    pub flags: ActionPointFlags,
    pub trigger_id: u16,
    pub id: u8,
    pub next_waypoint_id: u8,
    pub name: String,
}

impl ActionPoint {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.start_x..=self.end_x).contains(&x) && (self.start_y..=self.end_y).contains(&y)
    }
}

impl ThingBody for ActionPoint {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            start_x: reader.read_i32_le()?,
            start_y: reader.read_i32_le()?,
            end_x: reader.read_i32_le()?,
            end_y: reader.read_i32_le()?,
            wait_delay: reader.read_u16_le()?,
            flags: reader.read_flags_u16()?,
            trigger_id: reader.read_u16_le()?,
            id: reader.read_u8()?,
            next_waypoint_id: reader.read_u8()?,
            name: reader.read_string(ACTION_POINT_NAME_LEN)?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.start_x);
        writer.write_i32_le(self.start_y);
        writer.write_i32_le(self.end_x);
        writer.write_i32_le(self.end_y);
        writer.write_u16_le(self.wait_delay);
        writer.write_flags_u16(self.flags);
        writer.write_u16_le(self.trigger_id);
        writer.write_u8(self.id);
        writer.write_u8(self.next_waypoint_id);
        writer.write_string(&self.name, ACTION_POINT_NAME_LEN);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NeutralCreature {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub gold_held: u16,
    pub level: u8,
    pub flags: CreatureThingFlags,
    pub initial_health: i32,
    pub trigger_id: u16,
    pub creature_id: u8,
    pub unknown: u8,
}

impl ThingBody for NeutralCreature {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32_le()?,
            y: reader.read_i32_le()?,
            z: reader.read_i32_le()?,
            gold_held: reader.read_u16_le()?,
            level: reader.read_u8()?,
            flags: reader.read_flags_u8()?,
            initial_health: reader.read_i32_le()?,
            trigger_id: reader.read_u16_le()?,
            creature_id: reader.read_u8()?,
            unknown: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.x);
        writer.write_i32_le(self.y);
        writer.write_i32_le(self.z);
        writer.write_u16_le(self.gold_held);
        writer.write_u8(self.level);
        writer.write_flags_u8(self.flags);
        writer.write_i32_le(self.initial_health);
        writer.write_u16_le(self.trigger_id);
        writer.write_u8(self.creature_id);
        writer.write_u8(self.unknown);
    }
}

/// Hero, either placed alone or as a hero party member
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GoodCreature {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub gold_held: u16,
    pub level: u8,
    pub flags: CreatureThingFlags,
    pub objective_target_action_point_id: i32,
    pub initial_health: i32,
    pub trigger_id: u16,
    pub objective_target_player_id: u8,
    pub objective: HeroObjective,
    pub creature_id: u8,
    pub unknown: [u8; 2],
    pub flags2: u8,
}

impl ThingBody for GoodCreature {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32_le()?,
            y: reader.read_i32_le()?,
            z: reader.read_i32_le()?,
            gold_held: reader.read_u16_le()?,
            level: reader.read_u8()?,
            flags: reader.read_flags_u8()?,
            objective_target_action_point_id: reader.read_i32_le()?,
            initial_health: reader.read_i32_le()?,
            trigger_id: reader.read_u16_le()?,
            objective_target_player_id: reader.read_u8()?,
            objective: reader.read_enum_u8()?,
            creature_id: reader.read_u8()?,
            unknown: reader.read_array()?,
            flags2: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.x);
        writer.write_i32_le(self.y);
        writer.write_i32_le(self.z);
        writer.write_u16_le(self.gold_held);
        writer.write_u8(self.level);
        writer.write_flags_u8(self.flags);
        writer.write_i32_le(self.objective_target_action_point_id);
        writer.write_i32_le(self.initial_health);
        writer.write_u16_le(self.trigger_id);
        writer.write_u8(self.objective_target_player_id);
        writer.write_enum_u8(self.objective);
        writer.write_u8(self.creature_id);
        writer.write_bytes(&self.unknown);
        writer.write_u8(self.flags2);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KeeperCreature {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub gold_held: u16,
    pub level: u8,
    pub flags: CreatureThingFlags,
    pub initial_health: i32,
    pub objective_target_action_point_id: i32,
    pub trigger_id: u16,
    pub creature_id: u8,
    pub player_id: u8,
}

impl ThingBody for KeeperCreature {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32_le()?,
            y: reader.read_i32_le()?,
            z: reader.read_i32_le()?,
            gold_held: reader.read_u16_le()?,
            level: reader.read_u8()?,
            flags: reader.read_flags_u8()?,
            initial_health: reader.read_i32_le()?,
            objective_target_action_point_id: reader.read_i32_le()?,
            trigger_id: reader.read_u16_le()?,
            creature_id: reader.read_u8()?,
            player_id: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.x);
        writer.write_i32_le(self.y);
        writer.write_i32_le(self.z);
        writer.write_u16_le(self.gold_held);
        writer.write_u8(self.level);
        writer.write_flags_u8(self.flags);
        writer.write_i32_le(self.initial_health);
        writer.write_i32_le(self.objective_target_action_point_id);
        writer.write_u16_le(self.trigger_id);
        writer.write_u8(self.creature_id);
        writer.write_u8(self.player_id);
    }
}

/// Group of heroes entering together.
///
/// The record always holds [`HERO_PARTY_SLOTS`] member slots; empty slots
/// (creature id 0) are dropped on decode and re-padded on encode.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HeroParty {
    pub name: String,
    pub trigger_id: u16,
    pub id: u8,
    pub x23: i32,
    pub x27: i32,
    pub members: Vec<GoodCreature>,
}

impl ThingBody for HeroParty {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(HERO_PARTY_NAME_LEN)?;
        let trigger_id = reader.read_u16_le()?;
        let id = reader.read_u8()?;
        let x23 = reader.read_i32_le()?;
        let x27 = reader.read_i32_le()?;
        let mut members = Vec::with_capacity(HERO_PARTY_SLOTS);
        for _ in 0..HERO_PARTY_SLOTS {
            let member = GoodCreature::read(reader)?;
            if member.creature_id != 0 {
                members.push(member);
            }
        }
        Ok(Self { name, trigger_id, id, x23, x27, members })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, HERO_PARTY_NAME_LEN);
        writer.write_u16_le(self.trigger_id);
        writer.write_u8(self.id);
        writer.write_i32_le(self.x23);
        writer.write_i32_le(self.x27);
        let empty = GoodCreature::default();
        let slots = self.members.iter().chain(std::iter::repeat(&empty));
        for member in slots.take(HERO_PARTY_SLOTS) {
            member.write(writer);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DeadBody {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub gold_held: u16,
    pub creature_id: u8,
    pub player_id: u8,
}

impl ThingBody for DeadBody {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32_le()?,
            y: reader.read_i32_le()?,
            z: reader.read_i32_le()?,
            gold_held: reader.read_u16_le()?,
            creature_id: reader.read_u8()?,
            player_id: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.x);
        writer.write_i32_le(self.y);
        writer.write_i32_le(self.z);
        writer.write_u16_le(self.gold_held);
        writer.write_u8(self.creature_id);
        writer.write_u8(self.player_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EffectGenerator {
    pub x: i32,
    pub y: i32,
    pub x08: i32,
    pub x0c: i32,
    pub x10: u16,
    pub x12: u16,
    pub effect_ids: [u16; 4],
    pub frequency: u8,
    pub id: u8,
    pub pad: [u8; 6],
}

impl ThingBody for EffectGenerator {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32_le()?,
            y: reader.read_i32_le()?,
            x08: reader.read_i32_le()?,
            x0c: reader.read_i32_le()?,
            x10: reader.read_u16_le()?,
            x12: reader.read_u16_le()?,
            effect_ids: [
                reader.read_u16_le()?,
                reader.read_u16_le()?,
                reader.read_u16_le()?,
                reader.read_u16_le()?,
            ],
            frequency: reader.read_u8()?,
            id: reader.read_u8()?,
            pad: reader.read_array()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.x);
        writer.write_i32_le(self.y);
        writer.write_i32_le(self.x08);
        writer.write_i32_le(self.x0c);
        writer.write_u16_le(self.x10);
        writer.write_u16_le(self.x12);
        for id in self.effect_ids {
            writer.write_u16_le(id);
        }
        writer.write_u8(self.frequency);
        writer.write_u8(self.id);
        writer.write_bytes(&self.pad);
    }
}

/// Pre-built room (hero gates, portals, dungeon hearts)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub x08: i32,
    pub x0c: u16,
    pub direction: Direction,
    pub x0f: u8,
    pub initial_health: u16,
    pub room_type: u8,
    pub player_id: u8,
}

impl ThingBody for Room {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32_le()?,
            y: reader.read_i32_le()?,
            x08: reader.read_i32_le()?,
            x0c: reader.read_u16_le()?,
            direction: reader.read_enum_u8()?,
            x0f: reader.read_u8()?,
            initial_health: reader.read_u16_le()?,
            room_type: reader.read_u8()?,
            player_id: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.x);
        writer.write_i32_le(self.y);
        writer.write_i32_le(self.x08);
        writer.write_u16_le(self.x0c);
        writer.write_enum_u8(self.direction);
        writer.write_u8(self.x0f);
        writer.write_u16_le(self.initial_health);
        writer.write_u8(self.room_type);
        writer.write_u8(self.player_id);
    }
}

/// A value with its allowed range, in fixed-point units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Limits {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// An angle with its allowed range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AngleLimits {
    pub value: u16,
    pub min: u16,
    pub max: u16,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Camera {
    pub position: Vector3,
    pub position_min: Vector3,
    pub position_max: Vector3,
    pub view_distance: Limits,
    pub zoom: Limits,
    pub lens: Limits,
    pub flags: CameraFlags,
    pub yaw: AngleLimits,
    pub pitch: AngleLimits,
    pub roll: AngleLimits,
    pub id: u16,
}

impl ThingBody for Camera {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let position = reader.read_vector3()?;
        let position_min = reader.read_vector3()?;
        let position_max = reader.read_vector3()?;
        let mut limits = [Limits::default(); 3];
        for l in limits.iter_mut() {
            *l = Limits {
                value: reader.read_fixed32()?,
                min: reader.read_fixed32()?,
                max: reader.read_fixed32()?,
            };
        }
        let flags = reader.read_flags_u32()?;
        let mut angles = [AngleLimits::default(); 3];
        for a in angles.iter_mut() {
            *a = AngleLimits {
                value: reader.read_u16_le()?,
                min: reader.read_u16_le()?,
                max: reader.read_u16_le()?,
            };
        }
        let [view_distance, zoom, lens] = limits;
        let [yaw, pitch, roll] = angles;
        Ok(Self {
            position,
            position_min,
            position_max,
            view_distance,
            zoom,
            lens,
            flags,
            yaw,
            pitch,
            roll,
            id: reader.read_u16_le()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_vector3(self.position);
        writer.write_vector3(self.position_min);
        writer.write_vector3(self.position_max);
        for l in [self.view_distance, self.zoom, self.lens] {
            writer.write_fixed32(l.value);
            writer.write_fixed32(l.min);
            writer.write_fixed32(l.max);
        }
        writer.write_flags_u32(self.flags);
        for a in [self.yaw, self.pitch, self.roll] {
            writer.write_u16_le(a.value);
            writer.write_u16_le(a.min);
            writer.write_u16_le(a.max);
        }
        writer.write_u16_le(self.id);
    }
}

/// Record whose tag is not known; only its framing is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnrecognizedThing {
    pub tag: u32,
    pub length: u32,
}

macro_rules! things {
    ($($variant:ident = $tag:path => $field:ident,)*) => {
        /// One record of the things chunk
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub enum Thing {
            $($variant($variant),)*
            Unrecognized(UnrecognizedThing),
        }

        impl Thing {
            pub fn tag(&self) -> u32 {
                match self {
                    $(Self::$variant(_) => $tag,)*
                    Self::Unrecognized(u) => u.tag,
                }
            }

            fn decode_body(tag: u32, reader: &mut BinaryReader) -> Result<Option<Self>> {
                Ok(Some(match tag {
                    $($tag => Self::$variant($variant::read(reader)?),)*
                    _ => return Ok(None),
                }))
            }

            fn encode_body(&self, writer: &mut BinaryWriter) {
                match self {
                    $(Self::$variant(body) => body.write(writer),)*
                    Self::Unrecognized(u) => writer.write_zeros(u.length as usize),
                }
            }
        }

        /// Decoded things, partitioned by archetype in file order
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        pub struct Things {
            $(pub $field: Vec<$variant>,)*
            pub unrecognized: Vec<UnrecognizedThing>,
        }

        impl Things {
            pub fn push(&mut self, thing: Thing) {
                match thing {
                    $(Thing::$variant(body) => self.$field.push(body),)*
                    Thing::Unrecognized(u) => self.unrecognized.push(u),
                }
            }

            /// Number of things per archetype, unrecognized ones excluded
            pub fn counts(&self) -> Vec<(&'static str, usize)> {
                vec![$((stringify!($field), self.$field.len()),)*]
            }

            pub fn len(&self) -> usize {
                0 $(+ self.$field.len())*
            }
        }

        $(
            impl ThingKind for $variant {
                const TAG: u32 = $tag;

                fn of(things: &Things) -> &[Self] {
                    &things.$field
                }
            }
        )*
    };
}

things! {
    Object = tag::OBJECT => objects,
    Trap = tag::TRAP => traps,
    Door = tag::DOOR => doors,
    ActionPoint = tag::ACTION_POINT => action_points,
    NeutralCreature = tag::NEUTRAL_CREATURE => neutral_creatures,
    GoodCreature = tag::GOOD_CREATURE => good_creatures,
    KeeperCreature = tag::KEEPER_CREATURE => keeper_creatures,
    HeroParty = tag::HERO_PARTY => hero_parties,
    DeadBody = tag::DEAD_BODY => dead_bodies,
    EffectGenerator = tag::EFFECT_GENERATOR => effect_generators,
    Room = tag::ROOM => rooms,
    Camera = tag::CAMERA => cameras,
}

impl Thing {
    /// Decode one tagged record and leave the reader at the next one.
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let tag = reader.read_u32_le()?;
        let length = reader.read_u32_le()?;
        let body_start = reader.position();

        // Decode against the rest of the stream; the body length only decides
        // where the next record starts.
        let mut cursor = reader.clone();
        let decoded = Self::decode_body(tag, &mut cursor)?;
        reader.skip(length as usize)?;

        match decoded {
            Some(thing) => {
                let expected = body_start + length as usize;
                if cursor.position() != expected {
                    warn!(
                        tag,
                        length,
                        consumed = cursor.position() - body_start,
                        "thing body size mismatch, resynchronizing"
                    );
                }
                Ok(thing)
            }
            None => {
                warn!(tag, length, offset = body_start, "skipping thing with unknown tag");
                Ok(Self::Unrecognized(UnrecognizedThing { tag, length }))
            }
        }
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        let mut body = BinaryWriter::new();
        self.encode_body(&mut body);
        writer.write_u32_le(self.tag());
        writer.write_u32_le(body.len() as u32);
        writer.write_bytes(body.as_slice());
    }
}

impl Things {
    /// Decode `count` records and append them
    pub fn read_into(&mut self, payload: &mut BinaryReader, count: u32) -> Result<()> {
        for _ in 0..count {
            let thing = Thing::read(payload)?;
            self.push(thing);
        }
        Ok(())
    }

    pub fn of<T: ThingKind>(&self) -> &[T] {
        T::of(self)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(things: &[Thing]) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        for thing in things {
            thing.write(&mut writer);
        }
        writer.into_vec()
    }

    fn hero(creature_id: u8, level: u8) -> GoodCreature {
        GoodCreature {
            x: 10,
            y: 12,
            creature_id,
            level,
            objective: HeroObjective::KillPlayer,
            objective_target_player_id: 3,
            flags: CreatureThingFlags::WILL_FIGHT | CreatureThingFlags::FOLLOWER,
            ..Default::default()
        }
    }

    #[test]
    fn test_body_sizes() {
        let sizes = [
            (Thing::Object(Object::default()), 20),
            (Thing::Trap(Trap::default()), 16),
            (Thing::Door(Door::default()), 20),
            (Thing::ActionPoint(ActionPoint::default()), 56),
            (Thing::NeutralCreature(NeutralCreature::default()), 24),
            (Thing::GoodCreature(GoodCreature::default()), 32),
            (Thing::KeeperCreature(KeeperCreature::default()), 28),
            (Thing::HeroParty(HeroParty::default()), 43 + 16 * 32),
            (Thing::DeadBody(DeadBody::default()), 16),
            (Thing::EffectGenerator(EffectGenerator::default()), 36),
            (Thing::Room(Room::default()), 20),
            (Thing::Camera(Camera::default()), 96),
        ];
        for (thing, size) in sizes {
            assert_eq!(encode(&[thing.clone()]).len(), 8 + size, "{thing:?}");
        }
    }

    #[test]
    fn test_unknown_tag_is_skipped() {
        let mut writer = BinaryWriter::new();
        Thing::Object(Object { object_id: 1, x: 3, y: 4, ..Default::default() }).write(&mut writer);
        writer.write_u32_le(999);
        writer.write_u32_le(12);
        writer.write_bytes(&[0xFF; 12]);
        Thing::Trap(Trap { trap_id: 2, player_id: 3, ..Default::default() }).write(&mut writer);
        let data = writer.into_vec();

        let mut things = Things::default();
        let mut reader = BinaryReader::new(&data);
        things.read_into(&mut reader, 3).unwrap();
        assert!(reader.is_empty());

        assert_eq!(things.objects.len(), 1);
        assert_eq!(things.of::<Trap>()[0].trap_id, 2);
        assert_eq!(things.unrecognized, vec![UnrecognizedThing { tag: 999, length: 12 }]);
        assert_eq!(things.len(), 2);
    }

    #[test]
    fn test_long_body_resyncs() {
        let mut writer = BinaryWriter::new();
        let mut body = BinaryWriter::new();
        DeadBody { creature_id: 5, player_id: 1, ..Default::default() }.write(&mut body);
        body.write_zeros(8);
        writer.write_u32_le(tag::DEAD_BODY);
        writer.write_u32_le(body.len() as u32);
        writer.write_bytes(body.as_slice());
        Thing::Object(Object { object_id: 9, ..Default::default() }).write(&mut writer);
        let data = writer.into_vec();

        let mut things = Things::default();
        things.read_into(&mut BinaryReader::new(&data), 2).unwrap();
        assert_eq!(things.dead_bodies[0].creature_id, 5);
        assert_eq!(things.objects[0].object_id, 9);
    }

    #[test]
    fn test_short_body_resyncs() {
        // Declared length 16 for a 20-byte object body; the next record
        // starts at the declared end regardless.
        let mut writer = BinaryWriter::new();
        let mut body = BinaryWriter::new();
        Object { object_id: 4, ..Default::default() }.write(&mut body);
        writer.write_u32_le(tag::OBJECT);
        writer.write_u32_le(16);
        writer.write_bytes(&body.as_slice()[..16]);
        Thing::DeadBody(DeadBody { creature_id: 6, ..Default::default() }).write(&mut writer);
        let data = writer.into_vec();

        let mut things = Things::default();
        let mut reader = BinaryReader::new(&data);
        things.read_into(&mut reader, 2).unwrap();
        assert!(reader.is_empty());
        assert_eq!(things.objects.len(), 1);
        assert_eq!(things.dead_bodies[0].creature_id, 6);
    }

    #[test]
    fn test_hero_party_drops_empty_slots() {
        let party = HeroParty {
            name: "Lord of the Land".into(),
            trigger_id: 40,
            id: 2,
            members: vec![hero(7, 4), hero(8, 3), hero(7, 2)],
            ..Default::default()
        };
        let data = encode(&[Thing::HeroParty(party.clone())]);

        let mut things = Things::default();
        things.read_into(&mut BinaryReader::new(&data), 1).unwrap();
        let decoded = &things.of::<HeroParty>()[0];
        assert_eq!(decoded.members.len(), 3);
        assert_eq!(decoded, &party);
    }

    #[test]
    fn test_camera_and_action_point_roundtrip() {
        let camera = Camera {
            position: Vector3::new(10.5, 3.0, 20.25),
            zoom: Limits { value: 1.0, min: 0.5, max: 2.0 },
            flags: CameraFlags::DISABLE_ROLL,
            yaw: AngleLimits { value: 90, min: 0, max: 360 },
            id: 3,
            ..Default::default()
        };
        let point = ActionPoint {
            start_x: 2,
            start_y: 2,
            end_x: 5,
            end_y: 4,
            flags: ActionPointFlags::HERO_LAIR,
            id: 1,
            name: "Hero Gate".into(),
            ..Default::default()
        };
        let data = encode(&[Thing::Camera(camera.clone()), Thing::ActionPoint(point.clone())]);
        let mut things = Things::default();
        things.read_into(&mut BinaryReader::new(&data), 2).unwrap();
        assert_eq!(things.cameras, vec![camera]);
        assert_eq!(things.action_points, vec![point]);
        assert!(things.action_points[0].contains(5, 3));
        assert!(!things.action_points[0].contains(6, 3));
    }

    #[test]
    fn test_truncated_unknown_body_fails() {
        let mut writer = BinaryWriter::new();
        writer.write_u32_le(999);
        writer.write_u32_le(100);
        writer.write_bytes(&[0; 10]);
        let data = writer.into_vec();
        assert!(Thing::read(&mut BinaryReader::new(&data)).is_err());
    }
}

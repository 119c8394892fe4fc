//! Trigger forest: condition and action nodes linked by child and sibling ids.
//!
//! Record: `tag u32, length u32, body`. The body ends with an 8-byte trailer
//! (`id u16, sibling u16, child u16, discriminant u8, repeat u8`); the bytes
//! before it are variant data whose layout depends on the discriminant, so the
//! trailer is peeked before the data is decoded.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use super::reader::BinaryReader;
use super::types::{wire_enum, WireEnum};
use super::writer::BinaryWriter;

pub mod tag {
    pub const CONDITION: u32 = 213;
    pub const ACTION: u32 = 214;
}

/// Width of the id/sibling/child/discriminant/repeat trailer
pub const TRAILER_LEN: usize = 8;

/// Slot skipped for a discriminant without a known layout
const UNKNOWN_SLOT_LEN: usize = 8;

/// Variant data keyed by field name
pub type Payload = IndexMap<&'static str, i32>;

#[derive(Debug, Clone, Copy)]
enum Width {
    U8,
    U16,
    I32,
}

type Layout = &'static [(&'static str, Width)];

mod layout {
    use super::{Layout, Width::*};

    pub const FLAG: Layout = &[("targetId", U8), ("comparison", U8), ("flags", U16), ("value", I32)];
    pub const CREATURE: Layout =
        &[("creatureId", U8), ("playerId", U8), ("comparison", U8), ("flags", U8), ("value", I32)];
    pub const PLAYER: Layout = &[("playerId", U8), ("comparison", U8), ("flags", U16), ("value", I32)];
    pub const LEVEL: Layout = &[("comparison", U8), ("flags", U8), ("unused", U16), ("value", I32)];
    pub const ACTION_POINT: Layout =
        &[("actionPointId", U8), ("playerId", U8), ("flags", U16), ("value", I32)];
    pub const PARTY: Layout = &[("partyId", U8), ("actionPointId", U8), ("flags", U16), ("value", I32)];
    pub const GUI: Layout = &[("buttonType", U8), ("buttonId", U8), ("flags", U16), ("value", I32)];

    pub const CREATE: Layout = &[
        ("creatureId", U8),
        ("playerId", U8),
        ("level", U8),
        ("flags", U8),
        ("x", U16),
        ("y", U16),
    ];
    pub const SET_FLAG: Layout = &[("targetId", U8), ("flags", U8), ("unused", U16), ("value", I32)];
    pub const AVAILABLE: Layout =
        &[("typeId", U8), ("playerId", U8), ("available", U8), ("flags", U8), ("value", I32)];
    pub const PLAYER_VALUE: Layout = &[("playerId", U8), ("flags", U8), ("unused", U16), ("value", I32)];
    pub const TERRAIN: Layout = &[("terrainId", U8), ("playerId", U8), ("x", U16), ("y", U16), ("unused", U16)];
    pub const ALLIANCE: Layout = &[("playerId", U8), ("otherPlayerId", U8), ("flags", U16), ("value", I32)];
    pub const TEXT: Layout = &[("textId", U16), ("playerId", U8), ("flags", U8), ("value", I32)];
    pub const NONE: Layout = &[("value", I32), ("unused", I32)];
}

wire_enum! {
    /// What a condition node tests
    pub enum ConditionTarget: u8 {
        FlagValue = 1,
        TimerValue = 2,
        CreatureCreated = 3,
        CreatureKilled = 4,
        CreatureSlapped = 5,
        CreatureAttacked = 6,
        CreatureImprisoned = 7,
        CreatureTortured = 8,
        CreatureConverted = 9,
        CreatureClaimed = 10,
        CreatureAngry = 11,
        CreatureAfraid = 12,
        CreatureSteals = 13,
        CreatureLeaves = 14,
        CreatureStunned = 15,
        CreatureDying = 16,
        CreatureHealth = 17,
        CreatureGoldHeld = 18,
        CreatureExperienceLevel = 19,
        CreatureHungerSatisfaction = 20,
        CreaturePickedUp = 21,
        CreatureSacrificed = 22,
        PlayerCreatures = 23,
        PlayerHappyCreatures = 24,
        PlayerAngryCreatures = 25,
        PlayerCreaturesAtLevel = 26,
        PlayerRoomSize = 27,
        PlayerRooms = 28,
        PlayerRoomSlabs = 29,
        PlayerDoors = 30,
        PlayerTraps = 31,
        PlayerKeeperSpell = 32,
        PlayerGold = 33,
        PlayerGoldMined = 34,
        PlayerMana = 35,
        PlayerDestroys = 36,
        PlayerDungeonBreached = 37,
        PlayerEnemyBreached = 38,
        PlayerKilled = 39,
        PlayerCreaturesKilled = 40,
        PlayerSlaps = 41,
        LevelTime = 42,
        LevelCreatures = 43,
        LevelPayDay = 44,
        LevelPlaying = 45,
        ActionPointContains = 46,
        ActionPointClaimed = 47,
        ActionPointSlabTypes = 48,
        ActionPointPossessedCreatureEnters = 49,
        PartyCreatures = 50,
        PartyMembersKilled = 51,
        PartyMembersCaptured = 52,
        PartyCreated = 53,
        GuiButtonPressed = 54,
        GuiTransitionEnds = 55,
    }
}

impl ConditionTarget {
    fn layout(self) -> Layout {
        use ConditionTarget::*;
        match self {
            FlagValue | TimerValue => layout::FLAG,
            CreatureCreated | CreatureKilled | CreatureSlapped | CreatureAttacked
            | CreatureImprisoned | CreatureTortured | CreatureConverted | CreatureClaimed
            | CreatureAngry | CreatureAfraid | CreatureSteals | CreatureLeaves
            | CreatureStunned | CreatureDying | CreatureHealth | CreatureGoldHeld
            | CreatureExperienceLevel | CreatureHungerSatisfaction | CreaturePickedUp
            | CreatureSacrificed => layout::CREATURE,
            PlayerCreatures | PlayerHappyCreatures | PlayerAngryCreatures
            | PlayerCreaturesAtLevel | PlayerRoomSize | PlayerRooms | PlayerRoomSlabs
            | PlayerDoors | PlayerTraps | PlayerKeeperSpell | PlayerGold | PlayerGoldMined
            | PlayerMana | PlayerDestroys | PlayerDungeonBreached | PlayerEnemyBreached
            | PlayerKilled | PlayerCreaturesKilled | PlayerSlaps => layout::PLAYER,
            LevelTime | LevelCreatures | LevelPayDay | LevelPlaying => layout::LEVEL,
            ActionPointContains | ActionPointClaimed | ActionPointSlabTypes
            | ActionPointPossessedCreatureEnters => layout::ACTION_POINT,
            PartyCreatures | PartyMembersKilled | PartyMembersCaptured | PartyCreated => layout::PARTY,
            GuiButtonPressed | GuiTransitionEnds => layout::GUI,
        }
    }
}

wire_enum! {
    /// What an action node does
    pub enum ActionType: u8 {
        CreateCreature = 1,
        CreateHeroParty = 2,
        SetFlag = 3,
        IncrementFlag = 4,
        SetTimer = 5,
        StopTimer = 6,
        MakeRoomAvailable = 7,
        MakeCreatureAvailable = 8,
        MakeDoorAvailable = 9,
        MakeTrapAvailable = 10,
        MakeSpellAvailable = 11,
        SetObjective = 12,
        ShowObjective = 13,
        SetFightFlag = 14,
        AddGold = 15,
        SetMana = 16,
        CameraFlyTo = 17,
        CameraPositionAt = 18,
        RevealActionPoint = 19,
        ConcealActionPoint = 20,
        ChangeTerrain = 21,
        SetAlliance = 22,
        BreakAlliance = 23,
        PlaySpeech = 24,
        DisplayText = 25,
        ShowTimer = 26,
        Win = 27,
        Lose = 28,
        ZoomToActionPoint = 29,
        FlashButton = 30,
        FlashActionPoint = 31,
        SetCreatureMoods = 32,
        SetSlapLimit = 33,
        DisableUserInput = 34,
        EnableUserInput = 35,
        SetTimeLimit = 36,
        ChangeRoomOwner = 37,
        SetMusicLevel = 38,
        AttachPortalGem = 39,
        KillCreature = 40,
        SendToActionPoint = 41,
    }
}

impl ActionType {
    fn layout(self) -> Layout {
        use ActionType::*;
        match self {
            CreateCreature | KillCreature => layout::CREATE,
            CreateHeroParty | SendToActionPoint => layout::PARTY,
            SetFlag | IncrementFlag | SetTimer | StopTimer | ShowTimer | SetTimeLimit => {
                layout::SET_FLAG
            }
            MakeRoomAvailable | MakeCreatureAvailable | MakeDoorAvailable | MakeTrapAvailable
            | MakeSpellAvailable => layout::AVAILABLE,
            SetObjective | SetFightFlag | AddGold | SetMana | SetCreatureMoods | SetSlapLimit => {
                layout::PLAYER_VALUE
            }
            CameraFlyTo | CameraPositionAt | RevealActionPoint | ConcealActionPoint
            | ZoomToActionPoint | FlashActionPoint | ChangeRoomOwner => layout::ACTION_POINT,
            ChangeTerrain => layout::TERRAIN,
            SetAlliance | BreakAlliance => layout::ALLIANCE,
            ShowObjective | PlaySpeech | DisplayText => layout::TEXT,
            FlashButton => layout::GUI,
            Win | Lose | DisableUserInput | EnableUserInput | SetMusicLevel | AttachPortalGem => {
                layout::NONE
            }
        }
    }
}

fn read_payload(layout: Layout, reader: &mut BinaryReader) -> Result<Payload> {
    let mut payload = Payload::with_capacity(layout.len());
    for &(key, width) in layout {
        let value = match width {
            Width::U8 => reader.read_u8()? as i32,
            Width::U16 => reader.read_u16_le()? as i32,
            Width::I32 => reader.read_i32_le()?,
        };
        payload.insert(key, value);
    }
    Ok(payload)
}

fn write_payload(layout: Layout, payload: &Payload, writer: &mut BinaryWriter) {
    for &(key, width) in layout {
        let value = payload.get(key).copied().unwrap_or(0);
        match width {
            Width::U8 => writer.write_u8(value as u8),
            Width::U16 => writer.write_u16_le(value as u16),
            Width::I32 => writer.write_i32_le(value),
        }
    }
}

/// How often a node may fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Repeat {
    Unlimited,
    Times(u8),
}

impl Repeat {
    const UNLIMITED: u8 = 255;

    pub fn from_raw(raw: u8) -> Self {
        if raw == Self::UNLIMITED {
            Self::Unlimited
        } else {
            Self::Times(raw)
        }
    }

    pub fn to_raw(self) -> u8 {
        match self {
            Self::Unlimited => Self::UNLIMITED,
            Self::Times(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TriggerKind {
    Condition { target: ConditionTarget, payload: Payload },
    Action { action: ActionType, payload: Payload },
    /// Condition whose discriminant has no known layout
    UnknownCondition { discriminant: u8 },
    /// Action whose discriminant has no known layout
    UnknownAction { discriminant: u8 },
}

impl TriggerKind {
    pub fn is_condition(&self) -> bool {
        matches!(self, Self::Condition { .. } | Self::UnknownCondition { .. })
    }

    fn tag(&self) -> u32 {
        if self.is_condition() {
            tag::CONDITION
        } else {
            tag::ACTION
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            Self::Condition { target, .. } => target.to_raw() as u8,
            Self::Action { action, .. } => action.to_raw() as u8,
            Self::UnknownCondition { discriminant } | Self::UnknownAction { discriminant } => {
                *discriminant
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerNode {
    pub id: u16,
    /// Next node on the same level, 0 if none
    pub sibling_id: u16,
    /// First child node, 0 if none
    pub child_id: u16,
    pub repeat: Repeat,
    pub kind: TriggerKind,
}

impl TriggerNode {
    pub fn payload(&self) -> Option<&Payload> {
        match &self.kind {
            TriggerKind::Condition { payload, .. } | TriggerKind::Action { payload, .. } => {
                Some(payload)
            }
            _ => None,
        }
    }

    /// Named payload value
    pub fn value(&self, key: &str) -> Option<i32> {
        self.payload()?.get(key).copied()
    }

    fn read_body(is_condition: bool, body: &mut BinaryReader) -> Result<Self> {
        let length = body.len();
        let discriminant = body.peek_u8_at(length - 2)?;
        let repeat = Repeat::from_raw(body.peek_u8_at(length - 1)?);

        let kind = if is_condition {
            match ConditionTarget::from_raw(discriminant as u32) {
                Some(target) => TriggerKind::Condition {
                    target,
                    payload: read_payload(target.layout(), body)?,
                },
                None => TriggerKind::UnknownCondition { discriminant },
            }
        } else {
            match ActionType::from_raw(discriminant as u32) {
                Some(action) => TriggerKind::Action {
                    action,
                    payload: read_payload(action.layout(), body)?,
                },
                None => TriggerKind::UnknownAction { discriminant },
            }
        };
        if matches!(kind, TriggerKind::UnknownCondition { .. } | TriggerKind::UnknownAction { .. }) {
            warn!(discriminant, is_condition, offset = body.start(), "unknown trigger discriminant");
            body.skip(UNKNOWN_SLOT_LEN.min(length - TRAILER_LEN))?;
        }

        let trailer = body.end() - TRAILER_LEN;
        if body.position() != trailer {
            warn!(
                discriminant,
                expected = trailer,
                actual = body.position(),
                "trigger data size mismatch, resynchronizing"
            );
            body.set_position(trailer);
        }
        let id = body.read_u16_le()?;
        let sibling_id = body.read_u16_le()?;
        let child_id = body.read_u16_le()?;
        Ok(Self { id, sibling_id, child_id, repeat, kind })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        let mut data = BinaryWriter::new();
        match &self.kind {
            TriggerKind::Condition { target, payload } => write_payload(target.layout(), payload, &mut data),
            TriggerKind::Action { action, payload } => write_payload(action.layout(), payload, &mut data),
            _ => data.write_zeros(UNKNOWN_SLOT_LEN),
        }
        writer.write_u32_le(self.kind.tag());
        writer.write_u32_le((data.len() + TRAILER_LEN) as u32);
        writer.write_bytes(data.as_slice());
        writer.write_u16_le(self.id);
        writer.write_u16_le(self.sibling_id);
        writer.write_u16_le(self.child_id);
        writer.write_u8(self.kind.discriminant());
        writer.write_u8(self.repeat.to_raw());
    }
}

/// Record of the triggers chunk whose tag is neither condition nor action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnrecognizedTrigger {
    pub tag: u32,
    pub length: u32,
}

/// Decoded record of the triggers chunk
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerRecord {
    Node(TriggerNode),
    Unrecognized(UnrecognizedTrigger),
}

impl TriggerRecord {
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let tag = reader.read_u32_le()?;
        let length = reader.read_u32_le()?;
        let offset = reader.position();
        let mut body = reader.sub_reader(length as usize)?;

        let is_condition = match tag {
            tag::CONDITION => true,
            tag::ACTION => false,
            _ => {
                warn!(tag, length, offset, "skipping trigger record with unknown tag");
                return Ok(Self::Unrecognized(UnrecognizedTrigger { tag, length }));
            }
        };
        if (length as usize) < TRAILER_LEN {
            return Err(Error::OutOfBounds { need: TRAILER_LEN, have: length as usize });
        }
        TriggerNode::read_body(is_condition, &mut body).map(Self::Node)
    }
}

/// Trigger nodes keyed by id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriggerTable {
    nodes: IndexMap<u16, TriggerNode>,
    unrecognized: Vec<UnrecognizedTrigger>,
}

impl TriggerTable {
    /// Decode `count` records; a node replaces any node with the same id.
    pub fn read_into(&mut self, payload: &mut BinaryReader, count: u32) -> Result<()> {
        for _ in 0..count {
            match TriggerRecord::read(payload)? {
                TriggerRecord::Node(node) => self.insert(node),
                TriggerRecord::Unrecognized(u) => self.unrecognized.push(u),
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, node: TriggerNode) {
        self.nodes.insert(node.id, node);
    }

    pub fn get(&self, id: u16) -> Option<&TriggerNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TriggerNode> {
        self.nodes.values()
    }

    pub fn unrecognized(&self) -> &[UnrecognizedTrigger] {
        &self.unrecognized
    }

    /// Children of `id`: its child followed by that child's sibling chain
    pub fn children(&self, id: u16) -> Chain<'_> {
        let first = self.get(id).map_or(0, |n| n.child_id);
        Chain { table: self, next: first, remaining: self.len() }
    }

    /// Nodes after `id` on its sibling chain
    pub fn siblings(&self, id: u16) -> Chain<'_> {
        let first = self.get(id).map_or(0, |n| n.sibling_id);
        Chain { table: self, next: first, remaining: self.len() }
    }
}

/// Walk along sibling links. Stops at id 0, a missing id, or after visiting
/// as many nodes as the table holds (cyclic links).
pub struct Chain<'a> {
    table: &'a TriggerTable,
    next: u16,
    remaining: usize,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a TriggerNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == 0 || self.remaining == 0 {
            return None;
        }
        let node = self.table.get(self.next)?;
        self.remaining -= 1;
        self.next = node.sibling_id;
        Some(node)
    }
}

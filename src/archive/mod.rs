//! Decoded level archive: every catalog, the tile grid, things, triggers and
//! variables, merged from all files of a level.

pub mod loader;
pub mod paths;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::map::{BridgeTerrain, Tile};
use crate::catalog::variables::FastMap;
use crate::catalog::{
    read_catalog, Catalog, Creature, CreatureSpell, Door, Effect, EffectElement, GameLevel,
    GameObject, KeeperSpell, Map, Player, Room, Shot, Terrain, Trap, Variables,
};
use crate::codec::{Chunk, ChunkIter, ChunkType, ThingKind, Things, TriggerNode, TriggerTable};
use crate::error::Result;

pub use loader::ArchiveLoader;

/// Room id of the portal in the shipped data
pub const PORTAL_ROOM_ID: u8 = 3;

/// Room id of the dungeon heart in the shipped data
pub const DUNGEON_HEART_ROOM_ID: u8 = 5;

/// Ids of the first records carrying a special flag, in decode order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Singletons {
    water: Option<u8>,
    lava: Option<u8>,
    imp: Option<u8>,
    dwarf: Option<u8>,
    level_gem: Option<u8>,
}

macro_rules! catalog_accessors {
    ($($field:ident, $one:ident: $id:ty => $ty:ty;)*) => {
        $(
            pub fn $one(&self, id: $id) -> Option<&$ty> {
                self.$field.get(&id)
            }

            pub fn $field(&self) -> &Catalog<$id, $ty> {
                &self.$field
            }
        )*
    };
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Archive {
    level: GameLevel,
    map: Map,
    terrain: Catalog<u8, Terrain>,
    rooms: Catalog<u8, Room>,
    traps: Catalog<u8, Trap>,
    doors: Catalog<u8, Door>,
    keeper_spells: Catalog<u8, KeeperSpell>,
    creature_spells: Catalog<u8, CreatureSpell>,
    creatures: Catalog<u8, Creature>,
    players: Catalog<u8, Player>,
    objects: Catalog<u8, GameObject>,
    effect_elements: Catalog<u16, EffectElement>,
    shots: Catalog<u8, Shot>,
    effects: Catalog<u16, Effect>,
    things: Things,
    triggers: TriggerTable,
    variables: Variables,
    #[serde(skip)]
    singletons: Singletons,
}

impl Archive {
    /// Decode every chunk of one file and merge it into this archive.
    pub fn read_file(&mut self, data: &[u8]) -> Result<()> {
        for chunk in ChunkIter::new(data) {
            self.merge_chunk(chunk?)?;
        }
        Ok(())
    }

    /// Merge one chunk. Catalog records replace entries with the same id;
    /// the map, level info and things are replaced or extended wholesale.
    pub fn merge_chunk(&mut self, chunk: Chunk) -> Result<()> {
        let Chunk { header, mut payload } = chunk;
        header.verify_markers()?;
        let count = header.item_count();
        let Some(chunk_type) = header.chunk_type else {
            warn!(raw_type = header.raw_type, size = header.payload_size, "skipping unknown chunk type");
            return Ok(());
        };

        let singletons = &mut self.singletons;
        match chunk_type {
            ChunkType::Level => self.level = GameLevel::read(&header, &mut payload)?,
            ChunkType::Map => {
                let (width, height) = header.dimensions().unwrap_or_default();
                self.map = Map::read(&mut payload, width, height)?;
            }
            ChunkType::Terrain => read_catalog(&mut payload, count, &mut self.terrain, |t: &Terrain| {
                if t.is_water() {
                    singletons.water.get_or_insert(t.terrain_id);
                }
                if t.is_lava() {
                    singletons.lava.get_or_insert(t.terrain_id);
                }
            })?,
            ChunkType::Rooms => read_catalog(&mut payload, count, &mut self.rooms, |_| {})?,
            ChunkType::Traps => read_catalog(&mut payload, count, &mut self.traps, |_| {})?,
            ChunkType::Doors => read_catalog(&mut payload, count, &mut self.doors, |_| {})?,
            ChunkType::KeeperSpells => read_catalog(&mut payload, count, &mut self.keeper_spells, |_| {})?,
            ChunkType::CreatureSpells => {
                read_catalog(&mut payload, count, &mut self.creature_spells, |_| {})?
            }
            ChunkType::Creatures => read_catalog(&mut payload, count, &mut self.creatures, |c: &Creature| {
                if c.is_worker() {
                    let slot = if c.is_evil() { &mut singletons.imp } else { &mut singletons.dwarf };
                    slot.get_or_insert(c.creature_id);
                }
            })?,
            ChunkType::Players => read_catalog(&mut payload, count, &mut self.players, |_| {})?,
            ChunkType::Things => self.things.read_into(&mut payload, count)?,
            ChunkType::Triggers => self.triggers.read_into(&mut payload, count)?,
            ChunkType::Variables => self.variables.read_into(&mut payload, count)?,
            ChunkType::Objects => read_catalog(&mut payload, count, &mut self.objects, |o: &GameObject| {
                if o.is_level_gem() {
                    singletons.level_gem.get_or_insert(o.object_id);
                }
            })?,
            ChunkType::EffectElements => {
                read_catalog(&mut payload, count, &mut self.effect_elements, |_| {})?
            }
            ChunkType::Shots => read_catalog(&mut payload, count, &mut self.shots, |_| {})?,
            ChunkType::Effects => read_catalog(&mut payload, count, &mut self.effects, |_| {})?,
            ChunkType::Globals => {
                warn!(size = header.payload_size, "skipping bare globals chunk");
                return Ok(());
            }
        }

        if !payload.is_empty() {
            debug!(chunk = ?chunk_type, remaining = payload.remaining(), "unread payload bytes");
        }
        Ok(())
    }

    pub fn level(&self) -> &GameLevel {
        &self.level
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn tile(&self, x: u32, y: u32) -> Option<&Tile> {
        self.map.tile(x, y)
    }

    catalog_accessors! {
        terrain, terrain_type: u8 => Terrain;
        rooms, room: u8 => Room;
        traps, trap: u8 => Trap;
        doors, door: u8 => Door;
        keeper_spells, keeper_spell: u8 => KeeperSpell;
        creature_spells, creature_spell: u8 => CreatureSpell;
        creatures, creature: u8 => Creature;
        players, player: u8 => Player;
        objects, object: u8 => GameObject;
        effect_elements, effect_element: u16 => EffectElement;
        shots, shot: u8 => Shot;
        effects, effect: u16 => Effect;
    }

    /// Doors in editor order
    pub fn doors_sorted(&self) -> Vec<&Door> {
        let mut doors: Vec<&Door> = self.doors.values().collect();
        doors.sort_by_key(|d| d.order_in_editor);
        doors
    }

    /// Traps in editor order
    pub fn traps_sorted(&self) -> Vec<&Trap> {
        let mut traps: Vec<&Trap> = self.traps.values().collect();
        traps.sort_by_key(|t| t.order_in_editor);
        traps
    }

    /// Keeper spells in editor order
    pub fn keeper_spells_sorted(&self) -> Vec<&KeeperSpell> {
        let mut spells: Vec<&KeeperSpell> = self.keeper_spells.values().collect();
        spells.sort_by_key(|s| s.order_in_editor);
        spells
    }

    pub fn things(&self) -> &Things {
        &self.things
    }

    pub fn things_of<T: ThingKind>(&self) -> &[T] {
        self.things.of::<T>()
    }

    pub fn triggers(&self) -> &TriggerTable {
        &self.triggers
    }

    pub fn trigger(&self, id: u16) -> Option<&TriggerNode> {
        self.triggers.get(id)
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Creature id to pool size for one player
    pub fn creature_pool(&self, player_id: i32) -> Option<&FastMap<i32, i32>> {
        self.variables.creature_pool(player_id)
    }

    /// First terrain flagged as water
    pub fn water(&self) -> Option<&Terrain> {
        self.singletons.water.and_then(|id| self.terrain.get(&id))
    }

    /// First terrain flagged as lava
    pub fn lava(&self) -> Option<&Terrain> {
        self.singletons.lava.and_then(|id| self.terrain.get(&id))
    }

    /// Keeper worker: the first creature flagged both worker and evil
    pub fn imp(&self) -> Option<&Creature> {
        self.singletons.imp.and_then(|id| self.creatures.get(&id))
    }

    /// Hero worker: the first creature flagged worker but not evil
    pub fn dwarf(&self) -> Option<&Creature> {
        self.singletons.dwarf.and_then(|id| self.creatures.get(&id))
    }

    pub fn level_gem(&self) -> Option<&GameObject> {
        self.singletons.level_gem.and_then(|id| self.objects.get(&id))
    }

    pub fn portal(&self) -> Option<&Room> {
        self.room(PORTAL_ROOM_ID)
    }

    pub fn dungeon_heart(&self) -> Option<&Room> {
        self.room(DUNGEON_HEART_ROOM_ID)
    }

    /// Room whose tiles use `terrain_id`
    pub fn room_by_terrain(&self, terrain_id: u8) -> Option<&Room> {
        self.rooms.values().find(|r| r.terrain_id == terrain_id)
    }

    /// Terrain to show under `tile`. A room that cannot sit on land is
    /// standing on a bridge, so a water or lava bridge resolves to the cached
    /// liquid terrain instead of the tile's own.
    pub fn terrain_bridge(&self, tile: &Tile, room: Option<&Room>) -> Option<&Terrain> {
        if let Some(room) = room.filter(|r| !r.is_placeable_on_land()) {
            match tile.bridge {
                BridgeTerrain::Water => return self.water(),
                BridgeTerrain::Lava => return self.lava(),
                BridgeTerrain::None => {}
            }
            debug!(room_id = room.room_id, "room off land without bridge");
        }
        self.terrain_type(tile.terrain_id)
    }
}

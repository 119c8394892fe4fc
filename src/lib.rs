//! KWD level archive loader
//!
//! Decodes the chunked, little-endian level files of a dungeon-building game
//! into ID-keyed catalogs, a tile grid, placed things, a trigger forest and
//! variable tables.

pub mod archive;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;

pub use error::{Error, Result};
pub use config::LoaderConfig;
pub use archive::{Archive, ArchiveLoader};
pub use codec::{
    ArtResource, ArtResourceKind, BinaryReader, BinaryWriter, Chunk, ChunkHeader, ChunkIter,
    ChunkType, Thing, ThingKind, Things, TriggerKind, TriggerNode, TriggerTable,
};
pub use catalog::{
    Creature, CreatureSpell, Door, Effect, EffectElement, GameLevel, GameObject, KeeperSpell,
    Map, Player, Room, Shot, Terrain, Tile, Trap, Variables,
};

//! ID-keyed catalog records and the dense map grid.

pub mod creature;
pub mod door;
pub mod effect;
pub mod level;
pub mod map;
pub mod object;
pub mod player;
pub mod room;
pub mod shot;
pub mod spell;
pub mod terrain;
pub mod trap;
pub mod variables;

use std::hash::Hash;

use indexmap::IndexMap;
use serde::Serialize;

use crate::codec::chunk::{read_strided, ChunkType};
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;

pub use creature::Creature;
pub use door::Door;
pub use effect::{Effect, EffectElement};
pub use level::{FilePath, GameLevel};
pub use map::{BridgeTerrain, Map, Tile};
pub use object::GameObject;
pub use player::Player;
pub use room::Room;
pub use shot::Shot;
pub use spell::{CreatureSpell, KeeperSpell};
pub use terrain::Terrain;
pub use trap::Trap;
pub use variables::Variables;

/// Width of record name fields
pub const NAME_LEN: usize = 32;

/// Width of sound category fields
pub const SOUND_CATEGORY_LEN: usize = 32;

/// Ordered mapping from record id to record
pub type Catalog<K, V> = IndexMap<K, V>;

/// A fixed-layout record stored in a catalog chunk
pub trait CatalogRecord: Sized {
    type Id: Copy + Eq + Hash;

    const CHUNK: ChunkType;

    /// The record's own id field
    fn id(&self) -> Self::Id;

    fn read(reader: &mut BinaryReader) -> Result<Self>;

    fn write(&self, writer: &mut BinaryWriter);
}

/// Decode `count` records into `catalog`, replacing entries with the same id.
///
/// `on_record` sees each record right after it is inserted.
pub fn read_catalog<T, F>(
    payload: &mut BinaryReader,
    count: u32,
    catalog: &mut Catalog<T::Id, T>,
    mut on_record: F,
) -> Result<()>
where
    T: CatalogRecord,
    F: FnMut(&T),
{
    read_strided(T::CHUNK, payload, count, |reader| {
        let record = T::read(reader)?;
        let id = record.id();
        catalog.insert(id, record);
        if let Some(record) = catalog.get(&id) {
            on_record(record);
        }
        Ok(())
    })
}

/// Encode records back to back (the payload of a catalog chunk)
pub fn write_catalog<'r, T: CatalogRecord + 'r>(
    records: impl IntoIterator<Item = &'r T>,
    writer: &mut BinaryWriter,
) {
    for record in records {
        record.write(writer);
    }
}

/// Text table references shared by most catalog records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StringIds {
    pub name: u16,
    pub tooltip: u16,
    pub description: u16,
    pub strength: u16,
    pub weakness: u16,
}

impl StringIds {
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            name: reader.read_u16_le()?,
            tooltip: reader.read_u16_le()?,
            description: reader.read_u16_le()?,
            strength: reader.read_u16_le()?,
            weakness: reader.read_u16_le()?,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u16_le(self.name);
        writer.write_u16_le(self.tooltip);
        writer.write_u16_le(self.description);
        writer.write_u16_le(self.strength);
        writer.write_u16_le(self.weakness);
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    /// Encode `records`, padding each to `stride` bytes.
    pub fn padded_payload<T: CatalogRecord>(records: &[T], stride: usize) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        for record in records {
            let start = writer.len();
            record.write(&mut writer);
            let written = writer.len() - start;
            assert!(written <= stride, "record is {written} bytes, stride {stride}");
            writer.write_zeros(stride - written);
        }
        writer.into_vec()
    }

    /// Encoded width of one record
    pub fn record_len<T: CatalogRecord>(record: &T) -> usize {
        let mut writer = BinaryWriter::new();
        record.write(&mut writer);
        writer.len()
    }

    /// Decode a payload of `count` records into a fresh catalog
    pub fn decode_all<T: CatalogRecord>(payload: &[u8], count: u32) -> Catalog<T::Id, T> {
        let mut catalog = Catalog::new();
        let mut reader = BinaryReader::new(payload);
        read_catalog(&mut reader, count, &mut catalog, |_| {}).unwrap();
        assert!(reader.is_empty());
        catalog
    }
}

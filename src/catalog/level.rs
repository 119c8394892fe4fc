//! Level information: the payload of the top-level level file.
//!
//! Besides descriptive text the level chunk carries the path table naming
//! every dependent chunk file of the level.

use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::{write_chunk, ChunkHeader, ChunkType, HeaderFields};
use crate::codec::types::wire_enum;
use crate::codec::{BinaryReader, BinaryWriter, Timestamp, WireEnum};
use crate::error::{Error, Result};
use super::SOUND_CATEGORY_LEN;

/// Marker preceding the path table
pub const PATHS_MARKER: u32 = 222;

pub const LEVEL_NAME_LEN: usize = 64;
pub const LEVEL_TEXT_LEN: usize = 1024;
pub const PATH_LEN: usize = 64;
pub const SPEECH_STRING_LEN: usize = 32;
pub const REWARD_SLOTS: usize = 5;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct LevelFlags: u16 {
        const ALWAYS_IMPRISON_ENEMIES = 0x0001;
        const ONE_SHOT_HORNY = 0x0002;
        const IS_SECRET_LEVEL = 0x0004;
        const IS_SPECIAL_LEVEL = 0x0008;
        const SHOW_HERO_KILLS = 0x0010;
        const AUTO_OBJECTIVE_BUBBLES = 0x0020;
        const HEADHUNTERS_AVAILABLE = 0x0040;
        const IS_SKIRMISH_LEVEL = 0x0080;
        const FREE_PLAY = 0x0100;
        const IS_MY_PET_DUNGEON_LEVEL = 0x0200;
        const IS_MULTIPLAYER_LEVEL = 0x0400;
    }
}

wire_enum! {
    /// Campaign node unlocked before or after this level
    pub enum LevelReward: u8 {
        None = 0,
        Level1 = 1,
        Level2 = 2,
        Level3 = 3,
        Level4 = 4,
        Level5 = 5,
        Level6 = 6,
        Level7 = 7,
        Level8 = 8,
        Level9 = 9,
        Level10 = 10,
        Level11 = 11,
        Level12 = 12,
        Level13 = 13,
        Level14 = 14,
        Level15 = 15,
        Level16 = 16,
        Level17 = 17,
        Level18 = 18,
        Level19 = 19,
        Level20 = 20,
        Secret1 = 21,
        Secret2 = 22,
        Secret3 = 23,
        Secret4 = 24,
        Secret5 = 25,
        Special1 = 26,
        Special2 = 27,
        Special3 = 28,
    }
}

wire_enum! {
    pub enum LevelType: u8 {
        Level = 0,
        Secret = 1,
        Special = 2,
        Skirmish = 3,
        MyPetDungeon = 4,
        Multiplayer = 5,
    }
}

/// Entry of the path table: a dependent chunk file and what it provides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePath {
    pub raw_type: u32,
    pub chunk_type: Option<ChunkType>,
    pub unknown: u32,
    /// Path as stored, before normalization
    pub path: String,
}

impl FilePath {
    pub fn new(chunk_type: ChunkType, path: impl Into<String>) -> Self {
        Self {
            raw_type: chunk_type.to_raw(),
            chunk_type: Some(chunk_type),
            unknown: 0,
            path: path.into(),
        }
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let raw_type = reader.read_u32_le()?;
        Ok(Self {
            raw_type,
            chunk_type: ChunkType::from_raw(raw_type),
            unknown: reader.read_u32_le()?,
            path: reader.read_string(PATH_LEN)?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u32_le(self.raw_type);
        writer.write_u32_le(self.unknown);
        writer.write_string(&self.path, PATH_LEN);
    }
}

/// Text table references of the level briefing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LevelText {
    pub title: u16,
    pub plot: u16,
    pub debrief: u16,
    pub objective: u16,
    pub sub_objectives: [u16; 4],
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GameLevel {
    pub name: String,
    pub description: String,
    pub author: String,
    pub email: String,
    pub information: String,
    pub trigger_id: u16,
    pub ticks_per_sec: u16,
    pub flags: LevelFlags,
    pub sound_category: String,
    pub talisman_piece: u8,
    pub reward_prev: [LevelReward; REWARD_SLOTS],
    pub reward_next: [LevelReward; REWARD_SLOTS],
    pub sound_track: u8,
    pub text_table_id: u8,
    pub text: LevelText,
    pub speech_string: String,
    pub level_type: LevelType,
    pub paths: Vec<FilePath>,
    pub unknown: Vec<u16>,
    pub header_unknown: u32,
    pub created: Timestamp,
    pub modified: Timestamp,
}

impl GameLevel {
    pub fn paths(&self) -> &[FilePath] {
        &self.paths
    }

    /// First path-table entry providing `chunk_type`
    pub fn path_for(&self, chunk_type: ChunkType) -> Option<&FilePath> {
        self.paths.iter().find(|p| p.chunk_type == Some(chunk_type))
    }

    /// Decode the level chunk; counts and timestamps come from its header.
    pub fn read(header: &ChunkHeader, reader: &mut BinaryReader) -> Result<Self> {
        let (path_count, unknown_count, header_unknown, created, modified) = match header.fields {
            HeaderFields::Level { path_count, unknown_count, unknown, created, modified } => {
                (path_count, unknown_count, unknown, created, modified)
            }
            _ => (0, 0, 0, Timestamp::default(), Timestamp::default()),
        };

        let name = reader.read_wide_string(LEVEL_NAME_LEN)?;
        let description = reader.read_wide_string(LEVEL_TEXT_LEN)?;
        let author = reader.read_wide_string(LEVEL_NAME_LEN)?;
        let email = reader.read_wide_string(LEVEL_NAME_LEN)?;
        let information = reader.read_wide_string(LEVEL_TEXT_LEN)?;
        let trigger_id = reader.read_u16_le()?;
        let ticks_per_sec = reader.read_u16_le()?;
        let flags = reader.read_flags_u16()?;
        let sound_category = reader.read_string(SOUND_CATEGORY_LEN)?;
        let talisman_piece = reader.read_u8()?;
        let mut reward_prev = [LevelReward::None; REWARD_SLOTS];
        for reward in reward_prev.iter_mut() {
            *reward = reader.read_enum_u8()?;
        }
        let mut reward_next = [LevelReward::None; REWARD_SLOTS];
        for reward in reward_next.iter_mut() {
            *reward = reader.read_enum_u8()?;
        }
        let sound_track = reader.read_u8()?;
        let text_table_id = reader.read_u8()?;
        let text = LevelText {
            title: reader.read_u16_le()?,
            plot: reader.read_u16_le()?,
            debrief: reader.read_u16_le()?,
            objective: reader.read_u16_le()?,
            sub_objectives: [
                reader.read_u16_le()?,
                reader.read_u16_le()?,
                reader.read_u16_le()?,
                reader.read_u16_le()?,
            ],
        };
        let speech_string = reader.read_string(SPEECH_STRING_LEN)?;
        let level_type = reader.read_enum_u8()?;

        let marker = reader.read_u32_le()?;
        if marker != PATHS_MARKER {
            return Err(Error::IntegrityCheck {
                chunk: ChunkType::Level,
                field: "paths marker",
                expected: PATHS_MARKER,
                actual: marker,
            });
        }
        let paths = (0..path_count)
            .map(|_| FilePath::read(reader))
            .collect::<Result<Vec<_>>>()?;
        let unknown = (0..unknown_count)
            .map(|_| reader.read_u16_le())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            description,
            author,
            email,
            information,
            trigger_id,
            ticks_per_sec,
            flags,
            sound_category,
            talisman_piece,
            reward_prev,
            reward_next,
            sound_track,
            text_table_id,
            text,
            speech_string,
            level_type,
            paths,
            unknown,
            header_unknown,
            created,
            modified,
        })
    }

    pub fn header_fields(&self) -> HeaderFields {
        HeaderFields::Level {
            path_count: self.paths.len() as u16,
            unknown_count: self.unknown.len() as u16,
            unknown: self.header_unknown,
            created: self.created,
            modified: self.modified,
        }
    }

    /// Encode the payload of the level chunk
    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_wide_string(&self.name, LEVEL_NAME_LEN);
        writer.write_wide_string(&self.description, LEVEL_TEXT_LEN);
        writer.write_wide_string(&self.author, LEVEL_NAME_LEN);
        writer.write_wide_string(&self.email, LEVEL_NAME_LEN);
        writer.write_wide_string(&self.information, LEVEL_TEXT_LEN);
        writer.write_u16_le(self.trigger_id);
        writer.write_u16_le(self.ticks_per_sec);
        writer.write_flags_u16(self.flags);
        writer.write_string(&self.sound_category, SOUND_CATEGORY_LEN);
        writer.write_u8(self.talisman_piece);
        for reward in self.reward_prev.iter().chain(&self.reward_next) {
            writer.write_enum_u8(*reward);
        }
        writer.write_u8(self.sound_track);
        writer.write_u8(self.text_table_id);
        writer.write_u16_le(self.text.title);
        writer.write_u16_le(self.text.plot);
        writer.write_u16_le(self.text.debrief);
        writer.write_u16_le(self.text.objective);
        for id in self.text.sub_objectives {
            writer.write_u16_le(id);
        }
        writer.write_string(&self.speech_string, SPEECH_STRING_LEN);
        writer.write_enum_u8(self.level_type);
        writer.write_u32_le(PATHS_MARKER);
        for path in &self.paths {
            path.write(writer);
        }
        for &v in &self.unknown {
            writer.write_u16_le(v);
        }
    }

    /// Encode the complete level chunk, header included
    pub fn write_chunk(&self, writer: &mut BinaryWriter) {
        let mut payload = BinaryWriter::new();
        self.write(&mut payload);
        write_chunk(writer, ChunkType::Level, self.header_fields(), payload.as_slice());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ChunkIter;

    fn level() -> GameLevel {
        GameLevel {
            name: "Level 1 - Meadowvale".into(),
            author: "Level Designer".into(),
            ticks_per_sec: 4,
            flags: LevelFlags::AUTO_OBJECTIVE_BUBBLES,
            reward_next: [LevelReward::Level2, LevelReward::None, LevelReward::None, LevelReward::None, LevelReward::None],
            text: LevelText { title: 10, sub_objectives: [1, 2, 0, 0], ..Default::default() },
            level_type: LevelType::Level,
            paths: vec![
                FilePath::new(ChunkType::Map, "Levels\\Level1Map"),
                FilePath::new(ChunkType::Terrain, "Data\\editor\\Terrain.kwd"),
            ],
            unknown: vec![7, 8, 9],
            created: Timestamp { year: 1999, month: 4, day: 1, hour: 10, minute: 0, unknown: 0 },
            ..Default::default()
        }
    }

    #[test]
    fn test_level_chunk_roundtrip() {
        let level = level();
        let mut writer = BinaryWriter::new();
        level.write_chunk(&mut writer);
        let data = writer.into_vec();

        let mut chunks = ChunkIter::new(&data);
        let mut chunk = chunks.next().unwrap().unwrap();
        assert!(chunks.next().is_none());
        assert_eq!(chunk.header.chunk_type, Some(ChunkType::Level));

        let decoded = GameLevel::read(&chunk.header, &mut chunk.payload).unwrap();
        assert!(chunk.payload.is_empty());
        assert_eq!(decoded, level);
        assert_eq!(decoded.path_for(ChunkType::Map).map(|p| p.path.as_str()), Some("Levels\\Level1Map"));
        assert!(decoded.path_for(ChunkType::Creatures).is_none());
    }

    #[test]
    fn test_bad_paths_marker_fails() {
        let level = level();
        let mut payload = BinaryWriter::new();
        level.write(&mut payload);
        let mut data = payload.into_vec();
        // marker sits right before the two path entries and three u16s
        let marker_at = data.len() - 2 * (8 + PATH_LEN) - 3 * 2 - 4;
        data[marker_at..marker_at + 4].copy_from_slice(&221u32.to_le_bytes());

        let header = ChunkHeader::new(ChunkType::Level, level.header_fields(), data.len() as u32);
        let err = GameLevel::read(&header, &mut BinaryReader::new(&data)).unwrap_err();
        assert!(matches!(
            err,
            Error::IntegrityCheck { field: "paths marker", expected: 222, actual: 221, .. }
        ));
    }
}

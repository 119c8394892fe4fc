use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::types::wire_enum;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;
use super::{CatalogRecord, NAME_LEN};

wire_enum! {
    pub enum AiType: u8 {
        MasterKeeper = 0,
        ConquerorKeeper = 1,
        PsychoticKeeper = 2,
        StalwartKeeper = 3,
        GreyhairKeeper = 4,
        IdiotKeeper = 5,
        GuardianKeeper = 6,
        ThickSkinnedKeeper = 7,
        ParanoidKeeper = 8,
    }
}

/// Per-player starting setup
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Player {
    pub starting_gold: i32,
    /// Nonzero when the computer controls the player
    pub ai: u32,
    pub ai_type: AiType,
    pub speed: u8,
    pub openness: u8,
    pub unknown: [u8; 5],
    pub trigger_id: u16,
    pub player_id: u8,
    pub starting_camera_x: u16,
    pub starting_camera_y: u16,
    pub name: String,
}

impl Player {
    pub fn is_ai(&self) -> bool {
        self.ai != 0
    }
}

impl CatalogRecord for Player {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::Players;

    fn id(&self) -> u8 {
        self.player_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            starting_gold: reader.read_i32_le()?,
            ai: reader.read_u32_le()?,
            ai_type: reader.read_enum_u8()?,
            speed: reader.read_u8()?,
            openness: reader.read_u8()?,
            unknown: reader.read_array()?,
            trigger_id: reader.read_u16_le()?,
            player_id: reader.read_u8()?,
            starting_camera_x: reader.read_u16_le()?,
            starting_camera_y: reader.read_u16_le()?,
            name: reader.read_string(NAME_LEN)?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32_le(self.starting_gold);
        writer.write_u32_le(self.ai);
        writer.write_enum_u8(self.ai_type);
        writer.write_u8(self.speed);
        writer.write_u8(self.openness);
        writer.write_bytes(&self.unknown);
        writer.write_u16_le(self.trigger_id);
        writer.write_u8(self.player_id);
        writer.write_u16_le(self.starting_camera_x);
        writer.write_u16_le(self.starting_camera_y);
        writer.write_string(&self.name, NAME_LEN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_util::{decode_all, padded_payload, record_len};

    #[test]
    fn test_players_keep_listed_order() {
        let players: Vec<Player> = [(3u8, "Keeper 1"), (1, "Good"), (2, "Neutral")]
            .into_iter()
            .map(|(player_id, name)| Player {
                player_id,
                name: name.into(),
                starting_gold: 5000,
                ..Default::default()
            })
            .collect();
        let stride = record_len(&players[0]) + 4;
        let catalog = decode_all::<Player>(&padded_payload(&players, stride), 3);
        assert_eq!(catalog.keys().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(catalog[&1].name, "Good");
        assert!(!catalog[&3].is_ai());
    }
}

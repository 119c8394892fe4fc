//! Chunk framing: the type/size preamble, the three header shapes and the
//! per-record stride resynchronization shared by all catalog decoders.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use super::reader::BinaryReader;
use super::types::{wire_enum, Timestamp, WireEnum};
use super::writer::BinaryWriter;

wire_enum! {
    /// Chunk type tag found at the start of every chunk
    pub enum ChunkType: u32 {
        /// Override file whose chunks merge into already loaded catalogs
        Globals = 0,
        Map = 100,
        Terrain = 110,
        Rooms = 120,
        Traps = 130,
        Doors = 140,
        KeeperSpells = 150,
        CreatureSpells = 160,
        Creatures = 170,
        Players = 180,
        Things = 190,
        Triggers = 210,
        Level = 220,
        Variables = 230,
        Objects = 240,
        EffectElements = 250,
        Shots = 260,
        Effects = 270,
    }
}

impl ChunkType {
    /// Value `check_one` carries for this chunk type
    pub fn header_marker(self) -> u32 {
        self.to_raw() + 1
    }

    /// Value `check_two` carries for this chunk type
    pub fn data_marker(self) -> u32 {
        self.to_raw() + 2
    }

    /// Chunks whose data marker must match exactly
    pub fn requires_data_marker(self) -> bool {
        matches!(self, ChunkType::CreatureSpells)
    }
}

/// Smallest possible chunk frame: preamble with a 2-byte size, empty header,
/// both trailing fields and an empty payload.
pub const MIN_FRAME_LEN: usize = 4 + 4 + 2 + 4 + 4 + 4 + 4;

/// Shape-specific part of a chunk header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HeaderFields {
    Map {
        width: u32,
        height: u32,
    },
    Level {
        path_count: u16,
        unknown_count: u16,
        unknown: u32,
        created: Timestamp,
        modified: Timestamp,
    },
    Triggers {
        condition_count: u32,
        action_count: u32,
        unknown: u32,
        created: Timestamp,
        modified: Timestamp,
    },
    Generic {
        item_count: u32,
        unknown: u32,
        created: Option<Timestamp>,
        modified: Option<Timestamp>,
    },
}

impl HeaderFields {
    /// Decode the shape for `chunk_type`. `header_len` only decides whether
    /// the generic shape carries timestamps.
    fn read(chunk_type: Option<ChunkType>, reader: &mut BinaryReader, header_len: usize) -> Result<Self> {
        match chunk_type {
            Some(ChunkType::Map) => Ok(Self::Map {
                width: reader.read_u32_le()?,
                height: reader.read_u32_le()?,
            }),
            Some(ChunkType::Level) => Ok(Self::Level {
                path_count: reader.read_u16_le()?,
                unknown_count: reader.read_u16_le()?,
                unknown: reader.read_u32_le()?,
                created: reader.read_timestamp()?,
                modified: reader.read_timestamp()?,
            }),
            Some(ChunkType::Triggers) => Ok(Self::Triggers {
                condition_count: reader.read_u32_le()?,
                action_count: reader.read_u32_le()?,
                unknown: reader.read_u32_le()?,
                created: reader.read_timestamp()?,
                modified: reader.read_timestamp()?,
            }),
            _ => {
                let item_count = reader.read_u32_le()?;
                let unknown = reader.read_u32_le()?;
                let (created, modified) = if header_len >= 8 + 16 {
                    (Some(reader.read_timestamp()?), Some(reader.read_timestamp()?))
                } else {
                    (None, None)
                };
                Ok(Self::Generic { item_count, unknown, created, modified })
            }
        }
    }

    fn write(&self, writer: &mut BinaryWriter) {
        match *self {
            Self::Map { width, height } => {
                writer.write_u32_le(width);
                writer.write_u32_le(height);
            }
            Self::Level { path_count, unknown_count, unknown, created, modified } => {
                writer.write_u16_le(path_count);
                writer.write_u16_le(unknown_count);
                writer.write_u32_le(unknown);
                writer.write_timestamp(created);
                writer.write_timestamp(modified);
            }
            Self::Triggers { condition_count, action_count, unknown, created, modified } => {
                writer.write_u32_le(condition_count);
                writer.write_u32_le(action_count);
                writer.write_u32_le(unknown);
                writer.write_timestamp(created);
                writer.write_timestamp(modified);
            }
            Self::Generic { item_count, unknown, created, modified } => {
                writer.write_u32_le(item_count);
                writer.write_u32_le(unknown);
                if let (Some(created), Some(modified)) = (created, modified) {
                    writer.write_timestamp(created);
                    writer.write_timestamp(modified);
                }
            }
        }
    }

    /// Generic header with a plain item count and no timestamps
    pub fn items(item_count: u32) -> Self {
        Self::Generic { item_count, unknown: 0, created: None, modified: None }
    }
}

/// Decoded chunk header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkHeader {
    pub raw_type: u32,
    pub chunk_type: Option<ChunkType>,
    /// Declared data size from the preamble
    pub size: u32,
    pub check_one: u32,
    pub header_end: u32,
    pub fields: HeaderFields,
    pub check_two: u32,
    pub payload_size: u32,
}

impl ChunkHeader {
    /// Header for `chunk_type` with the markers the format expects
    pub fn new(chunk_type: ChunkType, fields: HeaderFields, payload_size: u32) -> Self {
        let mut header_bytes = BinaryWriter::new();
        fields.write(&mut header_bytes);
        Self {
            raw_type: chunk_type.to_raw(),
            chunk_type: Some(chunk_type),
            size: payload_size,
            check_one: chunk_type.header_marker(),
            header_end: header_bytes.len() as u32,
            fields,
            check_two: chunk_type.data_marker(),
            payload_size,
        }
    }

    /// Read the preamble and header; leaves the reader at the payload.
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let raw_type = reader.read_u32_le()?;
        let chunk_type = ChunkType::from_raw(raw_type);
        let size_width = reader.read_u32_le()?;
        let size = match size_width {
            2 => reader.read_u16_le()? as u32,
            4 => reader.read_u32_le()?,
            w => return Err(Error::InvalidSizeWidth(w)),
        };
        let check_one = reader.read_u32_le()?;
        let header_end = reader.read_u32_le()?;

        // The shape is decoded from a copy; header_end decides where the
        // outer reader continues.
        let header_start = reader.position();
        let mut header = reader.clone();
        let fields = HeaderFields::read(chunk_type, &mut header, header_end as usize)?;
        let declared_end = header_start + header_end as usize;
        if header.position() != declared_end {
            warn!(
                raw_type,
                expected = declared_end,
                actual = header.position(),
                "chunk header size mismatch"
            );
        }
        reader.skip(header_end as usize)?;

        let check_two = reader.read_u32_le()?;
        let payload_size = reader.read_u32_le()?;

        Ok(Self {
            raw_type,
            chunk_type,
            size,
            check_one,
            header_end,
            fields,
            check_two,
            payload_size,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u32_le(self.raw_type);
        writer.write_u32_le(4);
        writer.write_u32_le(self.size);
        writer.write_u32_le(self.check_one);
        writer.write_u32_le(self.header_end);
        self.fields.write(writer);
        writer.write_u32_le(self.check_two);
        writer.write_u32_le(self.payload_size);
    }

    /// Number of records in the payload (tiles for the map chunk)
    pub fn item_count(&self) -> u32 {
        match self.fields {
            HeaderFields::Map { width, height } => width.saturating_mul(height),
            HeaderFields::Level { path_count, .. } => path_count as u32,
            HeaderFields::Triggers { condition_count, action_count, .. } => {
                condition_count.saturating_add(action_count)
            }
            HeaderFields::Generic { item_count, .. } => item_count,
        }
    }

    /// Grid dimensions, only present on the map chunk
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self.fields {
            HeaderFields::Map { width, height } => Some((width, height)),
            _ => None,
        }
    }

    pub fn created(&self) -> Option<Timestamp> {
        match self.fields {
            HeaderFields::Level { created, .. } | HeaderFields::Triggers { created, .. } => {
                Some(created)
            }
            HeaderFields::Generic { created, .. } => created,
            HeaderFields::Map { .. } => None,
        }
    }

    pub fn modified(&self) -> Option<Timestamp> {
        match self.fields {
            HeaderFields::Level { modified, .. } | HeaderFields::Triggers { modified, .. } => {
                Some(modified)
            }
            HeaderFields::Generic { modified, .. } => modified,
            HeaderFields::Map { .. } => None,
        }
    }

    /// Compare the integrity markers against the values for this chunk type.
    ///
    /// Only chunks that require an exact data marker fail; other mismatches
    /// are logged.
    pub fn verify_markers(&self) -> Result<()> {
        let Some(chunk_type) = self.chunk_type else {
            return Ok(());
        };
        if self.check_one != chunk_type.header_marker() {
            warn!(
                chunk = ?chunk_type,
                expected = chunk_type.header_marker(),
                actual = self.check_one,
                "unexpected header marker"
            );
        }
        if self.check_two != chunk_type.data_marker() {
            if chunk_type.requires_data_marker() {
                return Err(Error::IntegrityCheck {
                    chunk: chunk_type,
                    field: "data marker",
                    expected: chunk_type.data_marker(),
                    actual: self.check_two,
                });
            }
            warn!(
                chunk = ?chunk_type,
                expected = chunk_type.data_marker(),
                actual = self.check_two,
                "unexpected data marker"
            );
        }
        Ok(())
    }
}

/// One framed region of a file: its header and a reader bounded to its payload
pub struct Chunk<'a> {
    pub header: ChunkHeader,
    pub payload: BinaryReader<'a>,
}

/// Iterator over the chunks of a whole file.
///
/// Stops after the first error; a file that does not end exactly on a chunk
/// boundary yields an error.
pub struct ChunkIter<'a> {
    reader: BinaryReader<'a>,
    failed: bool,
}

impl<'a> ChunkIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { reader: BinaryReader::new(data), failed: false }
    }

    fn next_chunk(&mut self) -> Result<Chunk<'a>> {
        if self.reader.remaining() < MIN_FRAME_LEN {
            return Err(Error::TrailingBytes {
                offset: self.reader.position(),
                remaining: self.reader.remaining(),
            });
        }
        let start = self.reader.position();
        let header = ChunkHeader::read(&mut self.reader)?;
        let payload = self.reader.sub_reader(header.payload_size as usize)?;
        debug!(
            raw_type = header.raw_type,
            offset = start,
            payload_size = header.payload_size,
            items = header.item_count(),
            "chunk"
        );
        Ok(Chunk { header, payload })
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_empty() {
            return None;
        }
        let chunk = self.next_chunk();
        self.failed = chunk.is_err();
        Some(chunk)
    }
}

/// Encode a complete chunk with the expected markers
pub fn write_chunk(writer: &mut BinaryWriter, chunk_type: ChunkType, fields: HeaderFields, payload: &[u8]) {
    ChunkHeader::new(chunk_type, fields, payload.len() as u32).write(writer);
    writer.write_bytes(payload);
}

/// Uniform per-record width of a catalog payload (payload size / item count)
#[derive(Debug, Clone, Copy)]
pub struct Stride {
    chunk: ChunkType,
    start: usize,
    width: usize,
}

impl Stride {
    pub fn new(chunk: ChunkType, payload: &BinaryReader, item_count: u32) -> Self {
        let width = if item_count == 0 { 0 } else { payload.len() / item_count as usize };
        Self { chunk, start: payload.start(), width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Offset where record `index` must end
    pub fn record_end(&self, index: usize) -> usize {
        self.start + (index + 1) * self.width
    }

    /// Force the reader onto the end of record `index`, logging any drift.
    pub fn resync(&self, reader: &mut BinaryReader, index: usize) {
        let expected = self.record_end(index);
        let actual = reader.position();
        if actual != expected {
            warn!(
                chunk = ?self.chunk,
                index,
                expected,
                actual,
                "record size drift, resynchronizing"
            );
            reader.set_position(expected);
        }
    }
}

/// Decode `count` uniform-stride records, resynchronizing after each one.
pub fn read_strided<'a, F>(
    chunk: ChunkType,
    payload: &mut BinaryReader<'a>,
    count: u32,
    mut read_record: F,
) -> Result<()>
where
    F: FnMut(&mut BinaryReader<'a>) -> Result<()>,
{
    if count as usize > payload.remaining() {
        return Err(Error::ItemCount { chunk, count, len: payload.remaining() });
    }
    let stride = Stride::new(chunk, payload, count);
    for index in 0..count as usize {
        read_record(payload)?;
        stride.resync(payload, index);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(day: u8) -> Timestamp {
        Timestamp { year: 1999, month: 5, day, hour: 12, minute: 30, unknown: 0 }
    }

    #[test]
    fn test_header_shapes_roundtrip() {
        let shapes = [
            (ChunkType::Map, HeaderFields::Map { width: 85, height: 85 }),
            (
                ChunkType::Level,
                HeaderFields::Level {
                    path_count: 14,
                    unknown_count: 2,
                    unknown: 7,
                    created: ts(1),
                    modified: ts(2),
                },
            ),
            (
                ChunkType::Triggers,
                HeaderFields::Triggers {
                    condition_count: 10,
                    action_count: 5,
                    unknown: 0,
                    created: ts(3),
                    modified: ts(4),
                },
            ),
            (
                ChunkType::Rooms,
                HeaderFields::Generic {
                    item_count: 3,
                    unknown: 1,
                    created: Some(ts(5)),
                    modified: Some(ts(6)),
                },
            ),
            (ChunkType::Terrain, HeaderFields::items(4)),
        ];

        for (chunk_type, fields) in shapes {
            let mut writer = BinaryWriter::new();
            write_chunk(&mut writer, chunk_type, fields.clone(), &[]);
            let data = writer.into_vec();

            let mut reader = BinaryReader::new(&data);
            let header = ChunkHeader::read(&mut reader).unwrap();
            assert_eq!(header.chunk_type, Some(chunk_type));
            assert_eq!(header.fields, fields);
            assert!(reader.is_empty());
            header.verify_markers().unwrap();
        }
    }

    #[test]
    fn test_header_accessors() {
        let header = ChunkHeader::new(
            ChunkType::Triggers,
            HeaderFields::Triggers {
                condition_count: 10,
                action_count: 5,
                unknown: 0,
                created: ts(3),
                modified: ts(4),
            },
            0,
        );
        assert_eq!(header.item_count(), 15);
        assert_eq!(header.dimensions(), None);
        assert_eq!(header.created(), Some(ts(3)));

        let map = ChunkHeader::new(ChunkType::Map, HeaderFields::Map { width: 3, height: 2 }, 24);
        assert_eq!(map.item_count(), 6);
        assert_eq!(map.dimensions(), Some((3, 2)));
        assert_eq!(map.created(), None);
    }

    #[test]
    fn test_two_byte_size_field() {
        let mut writer = BinaryWriter::new();
        writer.write_u32_le(ChunkType::Players.to_raw());
        writer.write_u32_le(2);
        writer.write_u16_le(0x1234);
        writer.write_u32_le(181);
        writer.write_u32_le(8);
        writer.write_u32_le(0);
        writer.write_u32_le(0);
        writer.write_u32_le(182);
        writer.write_u32_le(0);
        let data = writer.into_vec();

        let header = ChunkHeader::read(&mut BinaryReader::new(&data)).unwrap();
        assert_eq!(header.size, 0x1234);
        assert_eq!(header.item_count(), 0);
    }

    #[test]
    fn test_invalid_size_width() {
        let mut writer = BinaryWriter::new();
        writer.write_u32_le(ChunkType::Players.to_raw());
        writer.write_u32_le(3);
        writer.write_zeros(32);
        let data = writer.into_vec();

        let err = ChunkHeader::read(&mut BinaryReader::new(&data)).unwrap_err();
        assert!(matches!(err, Error::InvalidSizeWidth(3)));
    }

    #[test]
    fn test_oversized_header_end_is_tolerated() {
        // Generic header padded with 4 unknown bytes past the known fields
        let mut writer = BinaryWriter::new();
        writer.write_u32_le(ChunkType::Shots.to_raw());
        writer.write_u32_le(4);
        writer.write_u32_le(0);
        writer.write_u32_le(ChunkType::Shots.header_marker());
        writer.write_u32_le(12);
        writer.write_u32_le(2);
        writer.write_u32_le(0);
        writer.write_u32_le(0xFFFF_FFFF);
        writer.write_u32_le(ChunkType::Shots.data_marker());
        writer.write_u32_le(0);
        let data = writer.into_vec();

        let mut reader = BinaryReader::new(&data);
        let header = ChunkHeader::read(&mut reader).unwrap();
        assert_eq!(header.item_count(), 2);
        assert_eq!(header.check_two, ChunkType::Shots.data_marker());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_short_header_end_is_tolerated() {
        // header_end stops after the item count; the generic shape wants 8 bytes
        let mut writer = BinaryWriter::new();
        writer.write_u32_le(ChunkType::Shots.to_raw());
        writer.write_u32_le(4);
        writer.write_u32_le(0);
        writer.write_u32_le(ChunkType::Shots.header_marker());
        writer.write_u32_le(4);
        writer.write_u32_le(2);
        writer.write_u32_le(ChunkType::Shots.data_marker());
        writer.write_u32_le(0);
        let data = writer.into_vec();

        let mut reader = BinaryReader::new(&data);
        let header = ChunkHeader::read(&mut reader).unwrap();
        assert_eq!(header.item_count(), 2);
        assert_eq!(header.header_end, 4);
        assert_eq!(header.check_two, ChunkType::Shots.data_marker());
        assert_eq!(header.payload_size, 0);
        assert!(reader.is_empty());
        header.verify_markers().unwrap();
    }

    #[test]
    fn test_header_end_past_data_is_an_error() {
        let mut writer = BinaryWriter::new();
        writer.write_u32_le(ChunkType::Shots.to_raw());
        writer.write_u32_le(4);
        writer.write_u32_le(0);
        writer.write_u32_le(ChunkType::Shots.header_marker());
        writer.write_u32_le(1000);
        writer.write_zeros(16);
        let data = writer.into_vec();

        let err = ChunkHeader::read(&mut BinaryReader::new(&data)).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof));
    }

    #[test]
    fn test_trigger_counts_saturate() {
        let header = ChunkHeader::new(
            ChunkType::Triggers,
            HeaderFields::Triggers {
                condition_count: u32::MAX,
                action_count: 1,
                unknown: 0,
                created: ts(1),
                modified: ts(1),
            },
            0,
        );
        assert_eq!(header.item_count(), u32::MAX);
    }

    #[test]
    fn test_strided_count_larger_than_payload() {
        let data = [0u8; 8];
        let mut payload = BinaryReader::new(&data);
        let err = read_strided(ChunkType::Rooms, &mut payload, u32::MAX, |r| {
            r.read_u8()?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, Error::ItemCount { chunk: ChunkType::Rooms, len: 8, .. }));
        assert_eq!(payload.position(), 0);
    }

    #[test]
    fn test_creature_spell_marker_is_required() {
        let mut header = ChunkHeader::new(ChunkType::CreatureSpells, HeaderFields::items(0), 0);
        header.check_two = 0;
        assert!(matches!(
            header.verify_markers(),
            Err(Error::IntegrityCheck { chunk: ChunkType::CreatureSpells, expected: 162, actual: 0, .. })
        ));

        // Other chunk types only warn
        let mut header = ChunkHeader::new(ChunkType::Rooms, HeaderFields::items(0), 0);
        header.check_two = 0;
        header.verify_markers().unwrap();
    }

    #[test]
    fn test_chunk_iter_reads_all_chunks() {
        let mut writer = BinaryWriter::new();
        write_chunk(&mut writer, ChunkType::Players, HeaderFields::items(1), &[1, 2, 3]);
        write_chunk(&mut writer, ChunkType::Shots, HeaderFields::items(0), &[]);
        let data = writer.into_vec();

        let chunks: Vec<_> = ChunkIter::new(&data).collect::<Result<_>>().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].header.chunk_type, Some(ChunkType::Players));
        assert_eq!(chunks[0].payload.len(), 3);
        assert_eq!(chunks[1].header.chunk_type, Some(ChunkType::Shots));
    }

    #[test]
    fn test_chunk_iter_rejects_trailing_bytes() {
        let mut writer = BinaryWriter::new();
        write_chunk(&mut writer, ChunkType::Players, HeaderFields::items(0), &[]);
        writer.write_bytes(&[0, 0, 0]);
        let data = writer.into_vec();

        let results: Vec<_> = ChunkIter::new(&data).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::TrailingBytes { remaining: 3, .. })));
    }

    #[test]
    fn test_chunk_iter_rejects_truncated_payload() {
        let mut writer = BinaryWriter::new();
        write_chunk(&mut writer, ChunkType::Players, HeaderFields::items(1), &[0; 16]);
        let mut data = writer.into_vec();
        data.truncate(data.len() - 4);

        let results: Vec<_> = ChunkIter::new(&data).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::UnexpectedEof)));
    }

    #[test]
    fn test_stride_resync_after_each_record() {
        // Three 6-byte records; the decoder only understands the first 4 bytes.
        let mut writer = BinaryWriter::new();
        for i in 0..3u32 {
            writer.write_u32_le(i * 10);
            writer.write_u16_le(0xBEEF);
        }
        let data = writer.into_vec();
        let mut payload = BinaryReader::new(&data);

        let mut values = Vec::new();
        let mut positions = Vec::new();
        read_strided(ChunkType::Shots, &mut payload, 3, |r| {
            values.push(r.read_u32_le()?);
            Ok(())
        })
        .unwrap();
        assert_eq!(values, vec![0, 10, 20]);
        assert!(payload.is_empty());

        // Position after each record lands on start + (i + 1) * stride
        let mut payload = BinaryReader::new(&data);
        let stride = Stride::new(ChunkType::Shots, &payload, 3);
        for i in 0..3 {
            payload.read_u8().unwrap();
            stride.resync(&mut payload, i);
            positions.push(payload.position());
        }
        assert_eq!(stride.width(), 6);
        assert_eq!(positions, vec![6, 12, 18]);
    }

    #[test]
    fn test_stride_resync_rewinds_overread() {
        let data = [0u8; 8];
        let mut payload = BinaryReader::new(&data);
        let stride = Stride::new(ChunkType::Rooms, &payload, 2);
        payload.skip(6).unwrap();
        stride.resync(&mut payload, 0);
        assert_eq!(payload.position(), 4);
    }
}

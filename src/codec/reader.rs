use bitflags::Flags;
use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use crate::error::{Error, Result};
use super::types::{fixed16_to_f32, fixed32_to_f64, Color, Timestamp, Vector3, WireEnum};

/// Little-endian reader over a byte slice.
///
/// A reader created with [`BinaryReader::sub_reader`] is bounded to exactly the
/// bytes it was given; positions are still reported relative to the start of
/// the enclosing file so diagnostics can name absolute offsets.
#[derive(Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
    bounded: bool,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, base: 0, bounded: false }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Absolute position (file offset).
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    /// Absolute offset of the first byte of this reader.
    pub fn start(&self) -> usize {
        self.base
    }

    /// Absolute offset one past the last byte of this reader.
    pub fn end(&self) -> usize {
        self.base + self.data.len()
    }

    /// Seek to an absolute position. Positions outside the reader clamp to its end.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.saturating_sub(self.base).min(self.data.len());
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            if self.bounded {
                return Err(Error::OutOfBounds { need: n, have: self.remaining() });
            }
            return Err(Error::UnexpectedEof);
        }
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Split off a reader bounded to the next `len` bytes and advance past them.
    pub fn sub_reader(&mut self, len: usize) -> Result<BinaryReader<'a>> {
        let start = self.position();
        let data = self.read_bytes(len)?;
        Ok(BinaryReader { data, pos: 0, base: start, bounded: true })
    }

    /// Byte at `offset` past the current position, without consuming anything.
    pub fn peek_u8_at(&self, offset: usize) -> Result<u8> {
        self.ensure(offset + 1)?;
        Ok(self.data[self.pos + offset])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Read a 32-bit fixed-point value (1/4096 units)
    pub fn read_fixed32(&mut self) -> Result<f64> {
        Ok(fixed32_to_f64(self.read_i32_le()?))
    }

    /// Read a 16-bit fixed-point value (1/256 units)
    pub fn read_fixed16(&mut self) -> Result<f32> {
        Ok(fixed16_to_f32(self.read_i16_le()?))
    }

    pub fn read_color(&mut self) -> Result<Color> {
        Ok(Color {
            r: self.read_u8()?,
            g: self.read_u8()?,
            b: self.read_u8()?,
        })
    }

    pub fn read_vector3(&mut self) -> Result<Vector3> {
        Ok(Vector3 {
            x: self.read_fixed32()?,
            y: self.read_fixed32()?,
            z: self.read_fixed32()?,
        })
    }

    pub fn read_timestamp(&mut self) -> Result<Timestamp> {
        let year = self.read_u16_le()?;
        let day = self.read_u8()?;
        let month = self.read_u8()?;
        let unknown = self.read_u16_le()?;
        let hour = self.read_u8()?;
        let minute = self.read_u8()?;
        Ok(Timestamp { year, month, day, hour, minute, unknown })
    }

    pub fn read_flags_u32<F: Flags<Bits = u32>>(&mut self) -> Result<F> {
        Ok(F::from_bits_retain(self.read_u32_le()?))
    }

    pub fn read_flags_u16<F: Flags<Bits = u16>>(&mut self) -> Result<F> {
        Ok(F::from_bits_retain(self.read_u16_le()?))
    }

    pub fn read_flags_u8<F: Flags<Bits = u8>>(&mut self) -> Result<F> {
        Ok(F::from_bits_retain(self.read_u8()?))
    }

    /// Values outside the enumeration decode as its default.
    fn to_enum<E: WireEnum>(v: u32, offset: usize) -> E {
        E::from_raw(v).unwrap_or_else(|| {
            warn!(kind = E::KIND, value = v, offset, "unknown enum value, using default");
            E::default()
        })
    }

    pub fn read_enum_u8<E: WireEnum>(&mut self) -> Result<E> {
        let offset = self.position();
        Ok(Self::to_enum(self.read_u8()? as u32, offset))
    }

    pub fn read_enum_u16<E: WireEnum>(&mut self) -> Result<E> {
        let offset = self.position();
        Ok(Self::to_enum(self.read_u16_le()? as u32, offset))
    }

    pub fn read_enum_u32<E: WireEnum>(&mut self) -> Result<E> {
        let offset = self.position();
        Ok(Self::to_enum(self.read_u32_le()?, offset))
    }

    /// Read a fixed-width, NUL-terminated single-byte string
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Read a fixed-width, NUL-terminated UTF-16LE string of `chars` code units
    pub fn read_wide_string(&mut self, chars: usize) -> Result<String> {
        let bytes = self.read_bytes(chars * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .take_while(|&u| u != 0)
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }

    /// Read remaining bytes
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}

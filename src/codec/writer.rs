use bitflags::Flags;

use super::types::{f32_to_fixed16, f64_to_fixed32, Color, Timestamp, Vector3, WireEnum};

/// Little-endian writer, the encoding counterpart of `BinaryReader`
pub struct BinaryWriter {
    data: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_zeros(&mut self, n: usize) {
        self.data.resize(self.data.len() + n, 0);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.write_u8(v as u8);
    }

    pub fn write_u16_le(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i16_le(&mut self, v: i16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32_le(&mut self, v: i32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, v: u64) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_fixed32(&mut self, v: f64) {
        self.write_i32_le(f64_to_fixed32(v));
    }

    pub fn write_fixed16(&mut self, v: f32) {
        self.write_i16_le(f32_to_fixed16(v));
    }

    pub fn write_color(&mut self, color: Color) {
        self.write_u8(color.r);
        self.write_u8(color.g);
        self.write_u8(color.b);
    }

    pub fn write_vector3(&mut self, v: Vector3) {
        self.write_fixed32(v.x);
        self.write_fixed32(v.y);
        self.write_fixed32(v.z);
    }

    pub fn write_timestamp(&mut self, ts: Timestamp) {
        self.write_u16_le(ts.year);
        self.write_u8(ts.day);
        self.write_u8(ts.month);
        self.write_u16_le(ts.unknown);
        self.write_u8(ts.hour);
        self.write_u8(ts.minute);
    }

    pub fn write_flags_u32<F: Flags<Bits = u32>>(&mut self, flags: F) {
        self.write_u32_le(flags.bits());
    }

    pub fn write_flags_u16<F: Flags<Bits = u16>>(&mut self, flags: F) {
        self.write_u16_le(flags.bits());
    }

    pub fn write_flags_u8<F: Flags<Bits = u8>>(&mut self, flags: F) {
        self.write_u8(flags.bits());
    }

    pub fn write_enum_u8<E: WireEnum>(&mut self, v: E) {
        self.write_u8(v.to_raw() as u8);
    }

    pub fn write_enum_u16<E: WireEnum>(&mut self, v: E) {
        self.write_u16_le(v.to_raw() as u16);
    }

    pub fn write_enum_u32<E: WireEnum>(&mut self, v: E) {
        self.write_u32_le(v.to_raw());
    }

    /// Write a fixed-width single-byte string, truncated and NUL padded to `len`
    pub fn write_string(&mut self, s: &str, len: usize) {
        let bytes = s.as_bytes();
        let n = bytes.len().min(len);
        self.write_bytes(&bytes[..n]);
        self.write_zeros(len - n);
    }

    /// Write a fixed-width UTF-16LE string of `chars` code units
    pub fn write_wide_string(&mut self, s: &str, chars: usize) {
        let units: Vec<u16> = s.encode_utf16().take(chars).collect();
        for &u in &units {
            self.write_u16_le(u);
        }
        self.write_zeros((chars - units.len()) * 2);
    }

    /// Overwrite a little-endian u32 previously written at `offset`
    pub fn patch_u32_le(&mut self, offset: usize, v: u32) {
        self.data[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BinaryWriter> for Vec<u8> {
    fn from(writer: BinaryWriter) -> Self {
        writer.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::reader::BinaryReader;

    #[test]
    fn test_roundtrip_primitives() {
        let mut writer = BinaryWriter::new();
        writer.write_u8(0x42);
        writer.write_u16_le(0x1234);
        writer.write_u32_le(0xDEADBEEF);
        writer.write_fixed32(-3.25);

        let data = writer.into_vec();
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.read_u32_le().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_fixed32().unwrap(), -3.25);
    }

    #[test]
    fn test_roundtrip_timestamp() {
        let ts = Timestamp { year: 1999, month: 7, day: 2, hour: 23, minute: 59, unknown: 3 };
        let mut writer = BinaryWriter::new();
        writer.write_timestamp(ts);
        assert_eq!(writer.len(), 8);

        let data = writer.into_vec();
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_timestamp().unwrap(), ts);
    }

    #[test]
    fn test_fixed_strings_are_padded() {
        let mut writer = BinaryWriter::new();
        writer.write_string("Lair", 8);
        writer.write_wide_string("Mist", 6);
        assert_eq!(writer.len(), 8 + 12);

        let data = writer.into_vec();
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_string(8).unwrap(), "Lair");
        assert_eq!(reader.read_wide_string(6).unwrap(), "Mist");
    }
}

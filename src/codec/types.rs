use serde::Serialize;

/// Scale of the 32-bit fixed-point values used throughout the format
pub const FIXED32_SCALE: f64 = 4096.0;

/// Scale of the 16-bit fixed-point values
pub const FIXED16_SCALE: f32 = 256.0;

/// Exact for every raw value
pub fn fixed32_to_f64(raw: i32) -> f64 {
    raw as f64 / FIXED32_SCALE
}

pub fn f64_to_fixed32(v: f64) -> i32 {
    (v * FIXED32_SCALE).round() as i32
}

pub fn fixed16_to_f32(raw: i16) -> f32 {
    raw as f32 / FIXED16_SCALE
}

pub fn f32_to_fixed16(v: f32) -> i16 {
    (v * FIXED16_SCALE).round() as i16
}

/// Enumeration decoded from its numeric wire value.
/// Unknown values decode as `Default`.
pub trait WireEnum: Sized + Copy + Default {
    /// Name used when logging unknown values
    const KIND: &'static str;

    fn from_raw(v: u32) -> Option<Self>;

    fn to_raw(self) -> u32;
}

/// Declare a fieldless enum with explicit discriminants and a [`WireEnum`] impl.
///
/// The first variant is the `Default`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $(#[$fmeta:meta])* $first:ident = $fvalue:expr
            $(, $(#[$vmeta:meta])* $variant:ident = $value:expr)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize)]
        #[repr($repr)]
        $vis enum $name {
            $(#[$fmeta])* $first = $fvalue,
            $($(#[$vmeta])* $variant = $value,)*
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$first
            }
        }

        impl $crate::codec::types::WireEnum for $name {
            const KIND: &'static str = stringify!($name);

            fn from_raw(v: u32) -> Option<Self> {
                match v {
                    x if x == ($fvalue) as u32 => Some(Self::$first),
                    $(x if x == ($value) as u32 => Some(Self::$variant),)*
                    _ => None,
                }
            }

            fn to_raw(self) -> u32 {
                self as $repr as u32
            }
        }
    };
}
pub(crate) use wire_enum;

/// RGB color (3 bytes on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Vector of three 32-bit fixed-point components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Editor timestamp carried in chunk headers (8 bytes on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub unknown: u16,
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

wire_enum! {
    /// Material of doors, traps and objects
    pub enum Material: u8 {
        None = 0,
        Flesh = 1,
        Rock = 2,
        Wood = 3,
        Metal1 = 4,
        Metal2 = 5,
        Magic = 6,
        Glass = 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed32_scaling() {
        assert_eq!(fixed32_to_f64(4096), 1.0);
        assert_eq!(fixed32_to_f64(-2048), -0.5);
        assert_eq!(f64_to_fixed32(1.5), 6144);
        for raw in [0, 1, -1, 12345, -98765, 1 << 20] {
            assert_eq!(f64_to_fixed32(fixed32_to_f64(raw)), raw);
        }
    }

    #[test]
    fn test_fixed32_extremes_are_exact() {
        for raw in [(1 << 24) + 1, 0x7FFF_FFF1, -0x7FFF_FFF1, i32::MAX, i32::MIN] {
            assert_eq!(f64_to_fixed32(fixed32_to_f64(raw)), raw);
        }
    }

    #[test]
    fn test_wire_enum_from_raw() {
        assert_eq!(Material::from_raw(3), Some(Material::Wood));
        assert_eq!(Material::from_raw(8), None);
        assert_eq!(Material::Glass.to_raw(), 7);
        assert_eq!(Material::default(), Material::None);
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp { year: 1999, month: 6, day: 14, hour: 9, minute: 5, unknown: 0 };
        assert_eq!(ts.to_string(), "1999-06-14 09:05");
    }
}

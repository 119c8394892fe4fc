//! Art resource references and lights embedded in catalog records.

use bitflags::bitflags;
use serde::Serialize;

use crate::error::Result;
use super::reader::BinaryReader;
use super::types::{Color, Vector3};
use super::writer::BinaryWriter;

/// Width of the resource name field
pub const ART_RESOURCE_NAME_LEN: usize = 64;

/// Encoded size of one art resource
pub const ART_RESOURCE_SIZE: usize = ART_RESOURCE_NAME_LEN + 4 + 12 + 4;

/// Encoded size of one light
pub const LIGHT_SIZE: usize = 24;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct ArtResourceFlags: u32 {
        const PLAYER_COLOURED = 0x0000_0002;
        const ANIMATING_TEXTURE = 0x0000_0004;
        const HAS_START_ANIMATION = 0x0000_0008;
        const HAS_END_ANIMATION = 0x0000_0010;
        const RANDOM_START_FRAME = 0x0000_0020;
        const ORIGIN_AT_BOTTOM = 0x0000_0040;
        const DOESNT_LOOP = 0x0000_0080;
        const FLAT = 0x0000_0100;
        const DOESNT_USE_PROGRESSIVE_MESH = 0x0000_0200;
        const USE_ANIMATING_TEXTURE_FOR_SELECTION = 0x0001_0000;
        const PRELOAD = 0x0002_0000;
        const BLOOD = 0x0004_0000;
    }
}

/// Raw discriminant values of the art resource kinds
mod kind {
    pub const NONE: u8 = 0;
    pub const SPRITE: u8 = 1;
    pub const ALPHA: u8 = 2;
    pub const ADDITIVE_ALPHA: u8 = 3;
    pub const TERRAIN_MESH: u8 = 4;
    pub const MESH: u8 = 5;
    pub const ANIMATING_MESH: u8 = 6;
    pub const PROCEDURAL_MESH: u8 = 7;
    pub const MESH_COLLECTION: u8 = 8;
}

/// Image dimensions shared by the three sprite kinds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ImageInfo {
    pub width: f64,
    pub height: f64,
    pub frames: u32,
}

/// Shape-specific part of an art resource
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ArtResourceKind {
    Sprite(ImageInfo),
    Alpha(ImageInfo),
    AdditiveAlpha(ImageInfo),
    TerrainMesh { data: [u32; 3] },
    Mesh { scale: f64, frames: u32, unknown: u32 },
    AnimatingMesh { frames: u32, fps: u32, start_dist: u16, end_dist: u16 },
    ProceduralMesh { id: u32, unknown: [u32; 2] },
    MeshCollection { data: [u32; 3] },
}

impl ArtResourceKind {
    fn raw(&self) -> u8 {
        match self {
            Self::Sprite(_) => kind::SPRITE,
            Self::Alpha(_) => kind::ALPHA,
            Self::AdditiveAlpha(_) => kind::ADDITIVE_ALPHA,
            Self::TerrainMesh { .. } => kind::TERRAIN_MESH,
            Self::Mesh { .. } => kind::MESH,
            Self::AnimatingMesh { .. } => kind::ANIMATING_MESH,
            Self::ProceduralMesh { .. } => kind::PROCEDURAL_MESH,
            Self::MeshCollection { .. } => kind::MESH_COLLECTION,
        }
    }

    fn is_mesh(&self) -> bool {
        !matches!(self, Self::Sprite(_) | Self::Alpha(_) | Self::AdditiveAlpha(_))
    }
}

/// Reference to an external mesh or image by name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtResource {
    pub name: String,
    pub flags: ArtResourceFlags,
    pub kind: ArtResourceKind,
    /// First frame of the start animation (animating meshes)
    pub start_af: u8,
    /// Last frame of the end animation (animating meshes)
    pub end_af: u8,
    pub unknown: u8,
}

impl ArtResource {
    pub fn new(name: impl Into<String>, kind: ArtResourceKind) -> Self {
        Self {
            name: name.into(),
            flags: ArtResourceFlags::empty(),
            kind,
            start_af: 0,
            end_af: 0,
            unknown: 0,
        }
    }

    pub fn is_mesh(&self) -> bool {
        self.kind.is_mesh()
    }

    /// Decode one resource.
    ///
    /// Always consumes [`ART_RESOURCE_SIZE`] bytes. A resource with an empty
    /// name, kind `NONE` or an unrecognized kind decodes to `None`.
    pub fn read(reader: &mut BinaryReader) -> Result<Option<Self>> {
        let name = reader.read_string(ART_RESOURCE_NAME_LEN)?;
        let flags: ArtResourceFlags = reader.read_flags_u32()?;

        // The kind sits after the shape data; peek it before decoding the shape.
        let raw_kind = reader.peek_u8_at(12)?;
        let start_af = reader.peek_u8_at(13)?;
        let end_af = reader.peek_u8_at(14)?;

        let kind = match raw_kind {
            kind::SPRITE => Some(ArtResourceKind::Sprite(read_image(reader)?)),
            kind::ALPHA => Some(ArtResourceKind::Alpha(read_image(reader)?)),
            kind::ADDITIVE_ALPHA => Some(ArtResourceKind::AdditiveAlpha(read_image(reader)?)),
            kind::TERRAIN_MESH => Some(ArtResourceKind::TerrainMesh { data: read_words(reader)? }),
            kind::MESH => Some(ArtResourceKind::Mesh {
                scale: reader.read_fixed32()?,
                frames: reader.read_u32_le()?,
                unknown: reader.read_u32_le()?,
            }),
            kind::ANIMATING_MESH => Some(ArtResourceKind::AnimatingMesh {
                frames: reader.read_u32_le()?,
                fps: reader.read_u32_le()?,
                start_dist: reader.read_u16_le()?,
                end_dist: reader.read_u16_le()?,
            }),
            kind::PROCEDURAL_MESH => Some(ArtResourceKind::ProceduralMesh {
                id: reader.read_u32_le()?,
                unknown: [reader.read_u32_le()?, reader.read_u32_le()?],
            }),
            kind::MESH_COLLECTION => {
                Some(ArtResourceKind::MeshCollection { data: read_words(reader)? })
            }
            _ => {
                read_words(reader)?;
                None
            }
        };

        // kind, start_af, end_af, unknown
        reader.skip(3)?;
        let unknown = reader.read_u8()?;

        if name.is_empty() || raw_kind == kind::NONE {
            return Ok(None);
        }
        Ok(kind.map(|kind| Self { name, flags, kind, start_af, end_af, unknown }))
    }

    /// Encode `resource`, writing the empty encoding for `None`.
    pub fn write(resource: Option<&Self>, writer: &mut BinaryWriter) {
        let Some(res) = resource else {
            writer.write_zeros(ART_RESOURCE_SIZE);
            return;
        };
        writer.write_string(&res.name, ART_RESOURCE_NAME_LEN);
        writer.write_flags_u32(res.flags);
        match res.kind {
            ArtResourceKind::Sprite(img)
            | ArtResourceKind::Alpha(img)
            | ArtResourceKind::AdditiveAlpha(img) => {
                writer.write_fixed32(img.width);
                writer.write_fixed32(img.height);
                writer.write_u32_le(img.frames);
            }
            ArtResourceKind::TerrainMesh { data } | ArtResourceKind::MeshCollection { data } => {
                for word in data {
                    writer.write_u32_le(word);
                }
            }
            ArtResourceKind::Mesh { scale, frames, unknown } => {
                writer.write_fixed32(scale);
                writer.write_u32_le(frames);
                writer.write_u32_le(unknown);
            }
            ArtResourceKind::AnimatingMesh { frames, fps, start_dist, end_dist } => {
                writer.write_u32_le(frames);
                writer.write_u32_le(fps);
                writer.write_u16_le(start_dist);
                writer.write_u16_le(end_dist);
            }
            ArtResourceKind::ProceduralMesh { id, unknown } => {
                writer.write_u32_le(id);
                writer.write_u32_le(unknown[0]);
                writer.write_u32_le(unknown[1]);
            }
        }
        writer.write_u8(res.kind.raw());
        writer.write_u8(res.start_af);
        writer.write_u8(res.end_af);
        writer.write_u8(res.unknown);
    }
}

fn read_image(reader: &mut BinaryReader) -> Result<ImageInfo> {
    Ok(ImageInfo {
        width: reader.read_fixed32()?,
        height: reader.read_fixed32()?,
        frames: reader.read_u32_le()?,
    })
}

fn read_words(reader: &mut BinaryReader) -> Result<[u32; 3]> {
    Ok([reader.read_u32_le()?, reader.read_u32_le()?, reader.read_u32_le()?])
}

/// Read `N` consecutive resources
pub fn read_resources<const N: usize>(reader: &mut BinaryReader) -> Result<[Option<ArtResource>; N]> {
    let mut out: [Option<ArtResource>; N] = std::array::from_fn(|_| None);
    for slot in out.iter_mut() {
        *slot = ArtResource::read(reader)?;
    }
    Ok(out)
}

pub fn write_resources<'r>(
    resources: impl IntoIterator<Item = &'r Option<ArtResource>>,
    writer: &mut BinaryWriter,
) {
    for res in resources {
        ArtResource::write(res.as_ref(), writer);
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct LightFlags: u32 {
        const ENABLED = 0x0000_0001;
        const FLICKER = 0x0000_0002;
        const PULSE = 0x0000_0004;
        const PLAYER_COLOURED = 0x0000_0008;
        const COLOR_RED = 0x0000_0010;
        const COLOR_GREEN = 0x0000_0020;
        const COLOR_BLUE = 0x0000_0040;
    }
}

/// Point light attached to a record
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Light {
    pub position: Vector3,
    pub radius: f64,
    pub flags: LightFlags,
    pub color: Color,
}

impl Light {
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let position = reader.read_vector3()?;
        let radius = reader.read_fixed32()?;
        let flags = reader.read_flags_u32()?;
        let color = reader.read_color()?;
        reader.skip(1)?;
        Ok(Self { position, radius, flags, color })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_vector3(self.position);
        writer.write_fixed32(self.radius);
        writer.write_flags_u32(self.flags);
        writer.write_color(self.color);
        writer.write_u8(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(res: Option<&ArtResource>) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        ArtResource::write(res, &mut writer);
        writer.into_vec()
    }

    #[test]
    fn test_every_kind_consumes_fixed_width() {
        let kinds = [
            ArtResourceKind::Sprite(ImageInfo { width: 1.5, height: 0.75, frames: 8 }),
            ArtResourceKind::Alpha(ImageInfo { width: 2.0, height: 2.0, frames: 1 }),
            ArtResourceKind::AdditiveAlpha(ImageInfo { width: 0.25, height: 0.5, frames: 4 }),
            ArtResourceKind::TerrainMesh { data: [1, 2, 3] },
            ArtResourceKind::Mesh { scale: 0.5, frames: 12, unknown: 0 },
            ArtResourceKind::AnimatingMesh { frames: 30, fps: 15, start_dist: 10, end_dist: 40 },
            ArtResourceKind::ProceduralMesh { id: 77, unknown: [0, 9] },
            ArtResourceKind::MeshCollection { data: [4, 5, 6] },
        ];
        for kind in kinds {
            let mut res = ArtResource::new("Imp_Walk", kind);
            res.flags = ArtResourceFlags::PLAYER_COLOURED | ArtResourceFlags::PRELOAD;
            res.start_af = 2;
            res.end_af = 5;

            let data = encode(Some(&res));
            assert_eq!(data.len(), ART_RESOURCE_SIZE);

            let mut reader = BinaryReader::new(&data);
            let decoded = ArtResource::read(&mut reader).unwrap();
            assert!(reader.is_empty());
            assert_eq!(decoded, Some(res));
        }
    }

    #[test]
    fn test_empty_name_is_absent() {
        let mut data = encode(Some(&ArtResource::new(
            "",
            ArtResourceKind::Mesh { scale: 1.0, frames: 1, unknown: 0 },
        )));
        data.extend(encode(None));

        let mut reader = BinaryReader::new(&data);
        assert_eq!(ArtResource::read(&mut reader).unwrap(), None);
        assert_eq!(ArtResource::read(&mut reader).unwrap(), None);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_absent() {
        let mut data = encode(Some(&ArtResource::new(
            "Mystery",
            ArtResourceKind::TerrainMesh { data: [0; 3] },
        )));
        data[ART_RESOURCE_NAME_LEN + 4 + 12] = 42;
        data.extend([0xAA; 4]);

        let mut reader = BinaryReader::new(&data);
        assert_eq!(ArtResource::read(&mut reader).unwrap(), None);
        assert_eq!(reader.position(), ART_RESOURCE_SIZE);
        assert_eq!(reader.read_u32_le().unwrap(), 0xAAAA_AAAA);
    }

    #[test]
    fn test_light_roundtrip() {
        let light = Light {
            position: Vector3::new(0.5, -1.0, 2.25),
            radius: 3.0,
            flags: LightFlags::ENABLED | LightFlags::FLICKER,
            color: Color::rgb(255, 128, 0),
        };
        let mut writer = BinaryWriter::new();
        light.write(&mut writer);
        assert_eq!(writer.len(), LIGHT_SIZE);

        let data = writer.into_vec();
        assert_eq!(Light::read(&mut BinaryReader::new(&data)).unwrap(), light);
    }
}

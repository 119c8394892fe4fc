pub mod reader;
pub mod writer;
pub mod types;
pub mod chunk;
pub mod resource;
pub mod thing;
pub mod trigger;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use types::{Color, Material, Timestamp, Vector3, WireEnum};
pub use chunk::{Chunk, ChunkHeader, ChunkIter, ChunkType, HeaderFields, Stride};
pub use resource::{ArtResource, ArtResourceFlags, ArtResourceKind, ImageInfo, Light, LightFlags};
pub use thing::{Thing, ThingKind, Things};
pub use trigger::{Repeat, TriggerKind, TriggerNode, TriggerTable};

use bitflags::bitflags;
use serde::Serialize;

use crate::codec::chunk::ChunkType;
use crate::codec::resource::{read_resources, write_resources};
use crate::codec::{ArtResource, BinaryReader, BinaryWriter, Material};
use crate::error::Result;
use super::{CatalogRecord, StringIds, NAME_LEN, SOUND_CATEGORY_LEN};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct DoorFlags: u32 {
        const IS_SECRET = 0x0000_0001;
        const IS_BARRICADE = 0x0000_0004;
        const IS_GOOD = 0x0000_0008;
        const RESIZE_MAP_ICON = 0x0000_0010;
    }
}

/// Manufacturable door type
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Door {
    pub name: String,
    pub mesh: Option<ArtResource>,
    pub gui_icon: Option<ArtResource>,
    pub edit_icon: Option<ArtResource>,
    pub flower_icon: Option<ArtResource>,
    pub open_resource: Option<ArtResource>,
    pub close_resource: Option<ArtResource>,
    pub height: f64,
    pub health_gain: u16,
    pub material: Material,
    /// Trap built into the door frame, 0 if none
    pub trap_type_id: u8,
    pub flags: DoorFlags,
    pub health: u16,
    pub gold_cost: u16,
    pub death_effect_id: u16,
    pub manufacture_required: u32,
    pub mana_cost: u16,
    pub strings: StringIds,
    pub door_id: u8,
    pub order_in_editor: u8,
    pub manufacture_crate_object_id: u8,
    pub key_object_id: u8,
    pub sound_category: String,
}

impl CatalogRecord for Door {
    type Id = u8;

    const CHUNK: ChunkType = ChunkType::Doors;

    fn id(&self) -> u8 {
        self.door_id
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let name = reader.read_string(NAME_LEN)?;
        let [mesh, gui_icon, edit_icon, flower_icon, open_resource, close_resource] =
            read_resources::<6>(reader)?;
        Ok(Self {
            name,
            mesh,
            gui_icon,
            edit_icon,
            flower_icon,
            open_resource,
            close_resource,
            height: reader.read_fixed32()?,
            health_gain: reader.read_u16_le()?,
            material: reader.read_enum_u8()?,
            trap_type_id: reader.read_u8()?,
            flags: reader.read_flags_u32()?,
            health: reader.read_u16_le()?,
            gold_cost: reader.read_u16_le()?,
            death_effect_id: reader.read_u16_le()?,
            manufacture_required: reader.read_u32_le()?,
            mana_cost: reader.read_u16_le()?,
            strings: StringIds::read(reader)?,
            door_id: reader.read_u8()?,
            order_in_editor: reader.read_u8()?,
            manufacture_crate_object_id: reader.read_u8()?,
            key_object_id: reader.read_u8()?,
            sound_category: reader.read_string(SOUND_CATEGORY_LEN)?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_string(&self.name, NAME_LEN);
        write_resources(
            [
                &self.mesh,
                &self.gui_icon,
                &self.edit_icon,
                &self.flower_icon,
                &self.open_resource,
                &self.close_resource,
            ],
            writer,
        );
        writer.write_fixed32(self.height);
        writer.write_u16_le(self.health_gain);
        writer.write_enum_u8(self.material);
        writer.write_u8(self.trap_type_id);
        writer.write_flags_u32(self.flags);
        writer.write_u16_le(self.health);
        writer.write_u16_le(self.gold_cost);
        writer.write_u16_le(self.death_effect_id);
        writer.write_u32_le(self.manufacture_required);
        writer.write_u16_le(self.mana_cost);
        self.strings.write(writer);
        writer.write_u8(self.door_id);
        writer.write_u8(self.order_in_editor);
        writer.write_u8(self.manufacture_crate_object_id);
        writer.write_u8(self.key_object_id);
        writer.write_string(&self.sound_category, SOUND_CATEGORY_LEN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_util::{decode_all, padded_payload, record_len};

    #[test]
    fn test_door_roundtrip() {
        let door = Door {
            name: "Braced".into(),
            height: 1.5,
            material: Material::Metal1,
            flags: DoorFlags::RESIZE_MAP_ICON,
            health: 800,
            gold_cost: 300,
            manufacture_required: 12000,
            door_id: 4,
            order_in_editor: 2,
            ..Default::default()
        };
        let len = record_len(&door);
        let catalog = decode_all::<Door>(&padded_payload(&[door.clone()], len), 1);
        assert_eq!(catalog[&4], door);
    }

    #[test]
    fn test_door_unknown_material_defaults() {
        let door = Door { door_id: 1, material: Material::Metal1, ..Default::default() };
        let mut writer = BinaryWriter::new();
        door.write(&mut writer);
        let mut data = writer.into_vec();
        // material byte: name + 6 resources + height + health_gain
        let offset = NAME_LEN + 6 * crate::codec::resource::ART_RESOURCE_SIZE + 4 + 2;
        data[offset] = 99;

        let mut reader = BinaryReader::new(&data);
        let decoded = Door::read(&mut reader).unwrap();
        assert_eq!(decoded.material, Material::None);
        assert_eq!(decoded.door_id, 1);
        assert!(reader.is_empty());
    }
}

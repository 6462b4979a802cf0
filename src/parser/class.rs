use noak::AccessFlags;
use serde::Serializer;
use serde_derive::Serialize;
use ustr::Ustr;

use crate::error::Result;
use crate::parser::attributes::{read_attributes, Attribute};
use crate::parser::pool::ConstantPool;
use crate::parser::reader::Reader;

fn flag_bits<S: Serializer>(flags: &AccessFlags, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u16(flags.bits())
}

#[derive(Debug, Serialize)]
pub struct Member {
    #[serde(serialize_with = "flag_bits")]
    pub flags: AccessFlags,
    pub name: Ustr,
    pub descriptor: Ustr,
    pub attributes: Vec<Attribute>,
}

pub type Field = Member;
pub type Method = Member;

#[derive(Debug, Serialize)]
pub struct ClassModel {
    pub name: Ustr,
    #[serde(serialize_with = "flag_bits")]
    pub flags: AccessFlags,
    pub super_class: Option<Ustr>,
    pub interfaces: Vec<Ustr>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
    #[serde(skip)]
    pub pool: ConstantPool,
}

fn read_flags(reader: &mut Reader) -> Result<AccessFlags> {
    Ok(AccessFlags::from_bits_truncate(reader.u16()?))
}

fn read_members(reader: &mut Reader, pool: &ConstantPool) -> Result<Vec<Member>> {
    let count = reader.u16()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        members.push(Member {
            flags: read_flags(reader)?,
            name: pool.utf8(reader.u16()?)?,
            descriptor: pool.utf8(reader.u16()?)?,
            attributes: read_attributes(reader, pool)?,
        });
    }
    Ok(members)
}

impl ClassModel {
    pub(super) fn read(reader: &mut Reader, pool: ConstantPool) -> Result<ClassModel> {
        let flags = read_flags(reader)?;
        let name = pool.class_name(reader.u16()?)?;
        let super_class = pool.optional_class_name(reader.u16()?)?;
        let count = reader.u16()?;
        let mut interfaces = Vec::with_capacity(count as usize);
        for _ in 0..count {
            interfaces.push(pool.class_name(reader.u16()?)?);
        }
        Ok(ClassModel {
            name,
            flags,
            super_class,
            interfaces,
            fields: read_members(reader, &pool)?,
            methods: read_members(reader, &pool)?,
            attributes: read_attributes(reader, &pool)?,
            pool,
        })
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(AccessFlags::STATIC)
    }
}

impl Member {
    pub fn is_static(&self) -> bool {
        self.flags.contains(AccessFlags::STATIC)
    }
}

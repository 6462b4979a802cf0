use log::debug;
use serde_derive::Serialize;
use ustr::Ustr;

use crate::error::Result;
use crate::parser::code::{self, CodeAttribute};
use crate::parser::pool::{Constant, ConstantPool};
use crate::parser::reader::Reader;

#[derive(Debug, Serialize)]
pub struct Attribute {
    pub name: Ustr,
    pub data: AttributeData,
}

#[derive(Debug, Serialize)]
pub enum AttributeData {
    Raw(Box<[u8]>),
    Code(CodeAttribute),
    LocalVariableTable(Vec<LocalVariable>),
    NestHost(Ustr),
    ConstantValue(Constant),
    SourceFile(Ustr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalVariable {
    pub start: u16,
    pub length: u16,
    pub name: Ustr,
    pub descriptor: Ustr,
    pub index: u16,
}

impl LocalVariable {
    pub fn in_range(&self, offset: u32) -> bool {
        let start = self.start as u32;
        offset >= start && offset < start + self.length as u32
    }
}

type Decoder = fn(&mut Reader, &ConstantPool) -> Result<AttributeData>;

static DECODERS: &[(&str, Decoder)] = &[
    ("Code", code::decode_attribute),
    ("LocalVariableTable", local_variable_table),
    ("NestHost", nest_host),
    ("ConstantValue", constant_value),
    ("SourceFile", source_file),
];

fn local_variable_table(reader: &mut Reader, pool: &ConstantPool) -> Result<AttributeData> {
    let count = reader.u16()?;
    let mut vars = Vec::with_capacity(count as usize);
    for _ in 0..count {
        vars.push(LocalVariable {
            start: reader.u16()?,
            length: reader.u16()?,
            name: pool.utf8(reader.u16()?)?,
            descriptor: pool.utf8(reader.u16()?)?,
            index: reader.u16()?,
        });
    }
    Ok(AttributeData::LocalVariableTable(vars))
}

fn nest_host(reader: &mut Reader, pool: &ConstantPool) -> Result<AttributeData> {
    Ok(AttributeData::NestHost(pool.class_name(reader.u16()?)?))
}

fn constant_value(reader: &mut Reader, pool: &ConstantPool) -> Result<AttributeData> {
    Ok(AttributeData::ConstantValue(pool.required(reader.u16()?)?.clone()))
}

fn source_file(reader: &mut Reader, pool: &ConstantPool) -> Result<AttributeData> {
    Ok(AttributeData::SourceFile(pool.utf8(reader.u16()?)?))
}

fn read_attribute(reader: &mut Reader, pool: &ConstantPool) -> Result<Attribute> {
    let name = pool.utf8(reader.u16()?)?;
    let len = reader.u32()? as usize;
    let mut body = reader.sub(len)?;
    let data = match DECODERS.iter().find(|(key, _)| *key == name.as_str()) {
        Some((_, decoder)) => decoder(&mut body, pool)?,
        None => {
            debug!("skipping {} bytes of undecoded attribute {}", len, name);
            AttributeData::Raw(body.bytes(len)?.into())
        }
    };
    Ok(Attribute { name, data })
}

pub fn read_attributes(reader: &mut Reader, pool: &ConstantPool) -> Result<Vec<Attribute>> {
    let count = reader.u16()?;
    (0..count).map(|_| read_attribute(reader, pool)).collect()
}

pub trait AttributeList {
    fn code(&self) -> Option<&CodeAttribute>;
    fn local_variables(&self) -> &[LocalVariable];
    fn nest_host(&self) -> Option<Ustr>;
    fn constant_value(&self) -> Option<&Constant>;
    fn source_file(&self) -> Option<Ustr>;
}

impl AttributeList for [Attribute] {
    fn code(&self) -> Option<&CodeAttribute> {
        self.iter().find_map(|attr| match &attr.data {
            AttributeData::Code(code) => Some(code),
            _ => None,
        })
    }

    fn local_variables(&self) -> &[LocalVariable] {
        self.iter()
            .find_map(|attr| match &attr.data {
                AttributeData::LocalVariableTable(vars) => Some(vars.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    fn nest_host(&self) -> Option<Ustr> {
        self.iter().find_map(|attr| match attr.data {
            AttributeData::NestHost(host) => Some(host),
            _ => None,
        })
    }

    fn constant_value(&self) -> Option<&Constant> {
        self.iter().find_map(|attr| match &attr.data {
            AttributeData::ConstantValue(value) => Some(value),
            _ => None,
        })
    }

    fn source_file(&self) -> Option<Ustr> {
        self.iter().find_map(|attr| match attr.data {
            AttributeData::SourceFile(name) => Some(name),
            _ => None,
        })
    }
}

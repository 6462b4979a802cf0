use log::trace;
use noak::mutf8::MStr;
use serde_derive::Serialize;
use ustr::Ustr;

use crate::error::{FormatError, Result};
use crate::parser::reader::Reader;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RefIndices {
    pub class: u16,
    pub name_and_type: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    Utf8(Ustr),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    StringRef(u16),
    String(Ustr),
    Class(u16),
    NameAndType { name: u16, descriptor: u16 },
    FieldRef(RefIndices),
    MethodRef(RefIndices),
    InterfaceMethodRef(RefIndices),
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    Dynamic { bootstrap: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap: u16, name_and_type: u16 },
    Module(u16),
    Package(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemberTriple {
    pub class: Ustr,
    pub name: Ustr,
    pub descriptor: Ustr,
}

#[derive(Debug, Serialize)]
pub struct ConstantPool {
    entries: Vec<Option<Constant>>,
}

fn utf8(data: &[u8], index: u16) -> Result<Ustr> {
    let text = MStr::from_bytes(data).map_err(|_| FormatError::BadUtf8 { index })?;
    let decoded: String = text.chars().map(|ch| ch.unwrap_or(char::REPLACEMENT_CHARACTER)).collect();
    Ok(Ustr::from(decoded.as_str()))
}

fn decode(reader: &mut Reader, tag: u8, index: u16) -> Result<Constant> {
    Ok(match tag {
        1 => {
            let len = reader.u16()? as usize;
            Constant::Utf8(utf8(reader.bytes(len)?, index)?)
        }
        3 => Constant::Integer(reader.i32()?),
        4 => Constant::Float(reader.f32()?),
        5 => Constant::Long(reader.i64()?),
        6 => Constant::Double(reader.f64()?),
        7 => Constant::Class(reader.u16()?),
        8 => Constant::StringRef(reader.u16()?),
        9 | 10 | 11 => {
            let indices = RefIndices {
                class: reader.u16()?,
                name_and_type: reader.u16()?,
            };
            match tag {
                9 => Constant::FieldRef(indices),
                10 => Constant::MethodRef(indices),
                _ => Constant::InterfaceMethodRef(indices),
            }
        }
        12 => Constant::NameAndType {
            name: reader.u16()?,
            descriptor: reader.u16()?,
        },
        15 => Constant::MethodHandle {
            kind: reader.u8()?,
            reference: reader.u16()?,
        },
        16 => Constant::MethodType(reader.u16()?),
        17 => Constant::Dynamic {
            bootstrap: reader.u16()?,
            name_and_type: reader.u16()?,
        },
        18 => Constant::InvokeDynamic {
            bootstrap: reader.u16()?,
            name_and_type: reader.u16()?,
        },
        19 => Constant::Module(reader.u16()?),
        20 => Constant::Package(reader.u16()?),
        _ => return Err(FormatError::UnknownTag { tag, index }.into()),
    })
}

impl ConstantPool {
    pub fn read(reader: &mut Reader) -> Result<ConstantPool> {
        let count = reader.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(None);
        while entries.len() < count as usize {
            let index = entries.len() as u16;
            let tag = reader.u8()?;
            let constant = decode(reader, tag, index)?;
            if let Constant::Long(_) | Constant::Double(_) = constant {
                if index + 1 >= count {
                    return Err(FormatError::WideOverrun { index }.into());
                }
                entries.push(Some(constant.clone()));
            }
            entries.push(Some(constant));
        }
        let mut pool = ConstantPool { entries };
        pool.resolve_strings()?;
        pool.validate()?;
        trace!("decoded constant pool with {} entries", count);
        Ok(pool)
    }

    fn resolve_strings(&mut self) -> Result<()> {
        for index in 1..self.entries.len() {
            if let Some(Constant::StringRef(target)) = self.entries[index] {
                let value = self.utf8(target)?;
                self.entries[index] = Some(Constant::String(value));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for entry in self.entries.iter().flatten() {
            match entry {
                Constant::Class(name) | Constant::MethodType(name) | Constant::Module(name) | Constant::Package(name) => {
                    self.utf8(*name)?;
                }
                Constant::NameAndType { name, descriptor } => {
                    self.utf8(*name)?;
                    self.utf8(*descriptor)?;
                }
                Constant::FieldRef(refs) | Constant::MethodRef(refs) | Constant::InterfaceMethodRef(refs) => {
                    self.class_name(refs.class)?;
                    self.name_and_type(refs.name_and_type)?;
                }
                Constant::MethodHandle { reference, .. } => {
                    self.required(*reference)?;
                }
                Constant::Dynamic { name_and_type, .. } | Constant::InvokeDynamic { name_and_type, .. } => {
                    self.name_and_type(*name_and_type)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn len(&self) -> u16 {
        self.entries.len() as u16
    }

    /// Index 0 is the absent entry.
    pub fn get(&self, index: u16) -> Result<Option<&Constant>> {
        match self.entries.get(index as usize) {
            Some(entry) => Ok(entry.as_ref()),
            None => Err(FormatError::BadIndex { index, count: self.len() }.into()),
        }
    }

    pub fn required(&self, index: u16) -> Result<&Constant> {
        if index == 0 {
            return Err(FormatError::AbsentConstant.into());
        }
        self.get(index)?.ok_or_else(|| FormatError::WrongConstant { index, expected: "constant" }.into())
    }

    pub fn utf8(&self, index: u16) -> Result<Ustr> {
        match self.required(index)? {
            Constant::Utf8(value) => Ok(*value),
            _ => Err(FormatError::WrongConstant { index, expected: "UTF8 entry" }.into()),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<Ustr> {
        match self.required(index)? {
            Constant::Class(name) => self.utf8(*name),
            _ => Err(FormatError::WrongConstant { index, expected: "class reference" }.into()),
        }
    }

    pub fn optional_class_name(&self, index: u16) -> Result<Option<Ustr>> {
        match index {
            0 => Ok(None),
            _ => self.class_name(index).map(Some),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<(Ustr, Ustr)> {
        match self.required(index)? {
            Constant::NameAndType { name, descriptor } => Ok((self.utf8(*name)?, self.utf8(*descriptor)?)),
            _ => Err(FormatError::WrongConstant { index, expected: "name-and-type pair" }.into()),
        }
    }

    pub fn member(&self, index: u16) -> Result<MemberTriple> {
        match self.required(index)? {
            Constant::FieldRef(refs) | Constant::MethodRef(refs) | Constant::InterfaceMethodRef(refs) => {
                let (name, descriptor) = self.name_and_type(refs.name_and_type)?;
                Ok(MemberTriple {
                    class: self.class_name(refs.class)?,
                    name,
                    descriptor,
                })
            }
            _ => Err(FormatError::WrongConstant { index, expected: "member reference" }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::PoolBuilder;
    use matches::assert_matches;

    fn read(bytes: &[u8]) -> Result<ConstantPool> {
        ConstantPool::read(&mut Reader::new(bytes))
    }

    #[test]
    fn index_zero_is_absent() {
        let mut builder = PoolBuilder::default();
        builder.utf8("x");
        let pool = read(&builder.build()).unwrap();
        assert_eq!(pool.get(0).unwrap(), None);
        assert_matches!(pool.optional_class_name(0), Ok(None));
        assert_matches!(pool.utf8(0), Err(Error::Format(FormatError::AbsentConstant)));
    }

    #[test]
    fn wide_constants_take_two_identical_slots() {
        let mut builder = PoolBuilder::default();
        let long = builder.long(-0x1234_5678_9ABC);
        let double = builder.double(f64::from_bits(0x7FF8_0000_0000_0001));
        let after = builder.utf8("after");
        let pool = read(&builder.build()).unwrap();
        assert_eq!((long, double, after), (1, 3, 5));
        assert_eq!(pool.get(1).unwrap(), Some(&Constant::Long(-0x1234_5678_9ABC)));
        assert_eq!(pool.get(1).unwrap(), pool.get(2).unwrap());
        match (pool.get(3).unwrap(), pool.get(4).unwrap()) {
            (Some(Constant::Double(a)), Some(Constant::Double(b))) => assert_eq!(a.to_bits(), b.to_bits()),
            other => panic!("unexpected entries {:?}", other),
        }
        assert_eq!(pool.utf8(5).unwrap(), "after");
    }

    #[test]
    fn string_forward_reference_resolves() {
        let mut builder = PoolBuilder::default();
        builder.raw(&[8, 0, 2]);
        builder.utf8("hello");
        let pool = read(&builder.build()).unwrap();
        assert_eq!(pool.get(1).unwrap(), Some(&Constant::String("hello".into())));
    }

    #[test]
    fn modified_utf8_keeps_nul_and_supplementary_chars() {
        let mut builder = PoolBuilder::default();
        let nul = builder.raw(&[1, 0, 4, b'a', 0xC0, 0x80, b'b']);
        let emoji = builder.raw(&[1, 0, 6, 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);
        let pool = read(&builder.build()).unwrap();
        assert_eq!(pool.utf8(nul).unwrap(), "a\0b");
        assert_eq!(pool.utf8(emoji).unwrap(), "\u{1F600}");
    }

    #[test]
    fn unknown_tag_is_fatal() {
        let mut builder = PoolBuilder::default();
        builder.utf8("ok");
        builder.raw(&[2, 0, 0]);
        assert_matches!(read(&builder.build()), Err(Error::Format(FormatError::UnknownTag { tag: 2, index: 2 })));
    }

    #[test]
    fn dangling_reference_is_fatal() {
        let mut builder = PoolBuilder::default();
        builder.raw(&[7, 0, 9]);
        assert_matches!(read(&builder.build()), Err(Error::Format(FormatError::BadIndex { index: 9, .. })));
    }

    #[test]
    fn wide_constant_must_fit() {
        let mut bytes = vec![0, 2, 5];
        bytes.extend_from_slice(&7i64.to_be_bytes());
        assert_matches!(read(&bytes), Err(Error::Format(FormatError::WideOverrun { index: 1 })));
    }

    #[test]
    fn resolves_member_triple() {
        let mut builder = PoolBuilder::default();
        let index = builder.method_ref("java/io/PrintStream", "println", "(I)V");
        let pool = read(&builder.build()).unwrap();
        let member = pool.member(index).unwrap();
        assert_eq!(member.class, "java/io/PrintStream");
        assert_eq!(member.name, "println");
        assert_eq!(member.descriptor, "(I)V");
        assert_matches!(pool.class_name(index), Err(Error::Format(FormatError::WrongConstant { .. })));
    }
}

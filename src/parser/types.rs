use cached::proc_macro::cached;
use serde_derive::Serialize;
use std::fmt;
use std::sync::Arc;
use ustr::Ustr;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Ref,
}

#[derive(Debug, Clone, Eq, Hash, PartialEq, Serialize)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Object(Ustr),
    Array(Box<FieldType>),
}

#[derive(Debug, Clone, Eq, Hash, PartialEq, Serialize)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub return_type: Option<FieldType>,
}

impl FieldType {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldType::Byte | FieldType::Char | FieldType::Int | FieldType::Short | FieldType::Boolean => ValueKind::Int,
            FieldType::Long => ValueKind::Long,
            FieldType::Float => ValueKind::Float,
            FieldType::Double => ValueKind::Double,
            FieldType::Object(_) | FieldType::Array(_) => ValueKind::Ref,
        }
    }

    pub fn slots(&self) -> u16 {
        match self {
            FieldType::Long | FieldType::Double => 2,
            _ => 1,
        }
    }
}

fn component(desc: &[u8], pos: &mut usize, is_return: bool) -> Option<Option<FieldType>> {
    let code = *desc.get(*pos)?;
    *pos += 1;
    let typ = match code {
        b'B' => FieldType::Byte,
        b'C' => FieldType::Char,
        b'D' => FieldType::Double,
        b'F' => FieldType::Float,
        b'I' => FieldType::Int,
        b'J' => FieldType::Long,
        b'S' => FieldType::Short,
        b'Z' => FieldType::Boolean,
        b'V' if is_return => return Some(None),
        b'L' => {
            let len = desc[*pos..].iter().position(|ch| *ch == b';')?;
            let name = std::str::from_utf8(&desc[*pos..*pos + len]).ok()?;
            *pos += len + 1;
            if name.is_empty() {
                return None;
            }
            FieldType::Object(name.into())
        }
        b'[' => FieldType::Array(Box::new(component(desc, pos, false)??)),
        _ => return None,
    };
    Some(Some(typ))
}

#[cached]
pub fn field(desc: Ustr) -> Option<Arc<FieldType>> {
    let bytes = desc.as_str().as_bytes();
    let mut pos = 0;
    let typ = component(bytes, &mut pos, false)??;
    match pos == bytes.len() {
        true => Some(Arc::new(typ)),
        false => None,
    }
}

#[cached]
pub fn method(desc: Ustr) -> Option<Arc<MethodDescriptor>> {
    let bytes = desc.as_str().as_bytes();
    if bytes.first() != Some(&b'(') {
        return None;
    }
    let mut pos = 1;
    let mut parameters = Vec::new();
    while *bytes.get(pos)? != b')' {
        parameters.push(component(bytes, &mut pos, false)??);
    }
    pos += 1;
    let return_type = component(bytes, &mut pos, true)?;
    match pos == bytes.len() {
        true => Some(Arc::new(MethodDescriptor { parameters, return_type })),
        false => None,
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldType::Byte => f.write_str("int8"),
            FieldType::Char => f.write_str("char"),
            FieldType::Double => f.write_str("float64"),
            FieldType::Float => f.write_str("float32"),
            FieldType::Int => f.write_str("int32"),
            FieldType::Long => f.write_str("int64"),
            FieldType::Short => f.write_str("int16"),
            FieldType::Boolean => f.write_str("bool"),
            FieldType::Object(name) => write!(f, "class {}", name),
            FieldType::Array(elem) => write!(f, "{}[]", elem),
        }
    }
}

/// Normalized signature text used to match call sites against declared members.
impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.return_type {
            Some(typ) => write!(f, "{}(", typ)?,
            None => f.write_str("void(")?,
        }
        for (index, param) in self.parameters.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(")")
    }
}

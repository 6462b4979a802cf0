use std::io;
use thiserror::Error;
use ustr::Ustr;

use crate::parser::code::Operation;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("unsupported feature: {0}")]
    Unsupported(#[from] Unsupported),
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid class magic {0:02X?}")]
    BadMagic([u8; 4]),
    #[error("unexpected end of input at offset {offset} (needed {needed} bytes)")]
    UnexpectedEof { offset: usize, needed: usize },
    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: u16 },
    #[error("constant pool index {index} is out of range (pool has {count} entries)")]
    BadIndex { index: u16, count: u16 },
    #[error("constant pool index {index} is not a {expected}")]
    WrongConstant { index: u16, expected: &'static str },
    #[error("required constant pool reference is absent")]
    AbsentConstant,
    #[error("wide constant at index {index} overruns the constant pool")]
    WideOverrun { index: u16 },
    #[error("invalid modified UTF-8 at constant pool index {index}")]
    BadUtf8 { index: u16 },
    #[error("bad type descriptor {0:?}")]
    BadDescriptor(Ustr),
    #[error("method {class}.{name}{descriptor} has no Code attribute")]
    MissingCode { class: Ustr, name: Ustr, descriptor: Ustr },
}

#[derive(Debug, Error)]
pub enum Unsupported {
    #[error("jump table opcode {operation:?} at offset {offset} is not supported")]
    JumpTable { operation: Operation, offset: u32 },
    #[error("wide opcode recursion at offset {offset}")]
    WideRecursion { offset: u32 },
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("could not find class {0}")]
    UnknownClass(Ustr),
    #[error("could not find method {name}{descriptor} on {class}")]
    UnknownMethod { class: Ustr, name: Ustr, descriptor: Ustr },
    #[error("method {name}{descriptor} on {class} matches {count} candidates")]
    AmbiguousMethod { class: Ustr, name: Ustr, descriptor: Ustr, count: usize },
    #[error("could not find field {name}:{descriptor} on {class}")]
    UnknownField { class: Ustr, name: Ustr, descriptor: Ustr },
    #[error("field {name}:{descriptor} on {class} matches {count} candidates")]
    AmbiguousField { class: Ustr, name: Ustr, descriptor: Ustr, count: usize },
}

#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("{count} local variable ranges cover slot {slot} at offset {offset}")]
    OverlappingLocals { slot: u16, offset: u32, count: usize },
    #[error("slot {slot} addresses the upper half of a two-slot argument")]
    SplitArgument { slot: u16 },
}

use log::trace;

use crate::error::{FormatError, Result};

pub mod attributes;
pub mod class;
pub mod code;
pub mod pool;
pub mod reader;
pub mod types;

pub use self::class::ClassModel;
use self::pool::ConstantPool;
use self::reader::Reader;

const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

pub fn parse(buf: &[u8]) -> Result<ClassModel> {
    let mut reader = Reader::new(buf);
    let mut magic = [0; 4];
    magic.copy_from_slice(reader.bytes(4)?);
    if magic != MAGIC {
        return Err(FormatError::BadMagic(magic).into());
    }
    let minor = reader.u16()?;
    let major = reader.u16()?;
    let pool = ConstantPool::read(&mut reader)?;
    let class = ClassModel::read(&mut reader, pool)?;
    trace!("parsed {} (version {}.{})", class.name, major, minor);
    Ok(class)
}

use crate::error::{FormatError, Result};

#[derive(Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

macro_rules! read_be {
    ($($name:ident: $typ:ty,)*) => {
        $(
            pub fn $name(&mut self) -> Result<$typ> {
                let mut raw = [0; std::mem::size_of::<$typ>()];
                let len = raw.len();
                raw.copy_from_slice(self.bytes(len)?);
                Ok(<$typ>::from_be_bytes(raw))
            }
        )*
    };
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, pos: 0, base: 0 }
    }

    read_be! {
        u8: u8,
        i8: i8,
        u16: u16,
        i16: i16,
        u32: u32,
        i32: i32,
        i64: i64,
        f32: f32,
        f64: f64,
    }

    /// Offset relative to the start of this cursor's buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.buf.len());
        match end {
            Some(end) => {
                let data = &self.buf[self.pos..end];
                self.pos = end;
                Ok(data)
            }
            None => Err(FormatError::UnexpectedEof {
                offset: self.base + self.pos,
                needed: len,
            }
            .into()),
        }
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.bytes(len).map(|_| ())
    }

    /// Splits off the next `len` bytes as an independent cursor and advances past them.
    pub fn sub(&mut self, len: usize) -> Result<Reader<'a>> {
        let base = self.base + self.pos;
        let buf = self.bytes(len)?;
        Ok(Reader { buf, pos: 0, base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use matches::assert_matches;

    #[test]
    fn reads_big_endian() {
        let mut reader = Reader::new(&[0xCA, 0xFE, 0xBA, 0xBE, 0xFF, 0x7F, 0xFF]);
        assert_eq!(reader.u32().unwrap(), 0xCAFE_BABE);
        assert_eq!(reader.i8().unwrap(), -1);
        assert_eq!(reader.i16().unwrap(), 0x7FFF);
        assert!(reader.is_empty());
    }

    #[test]
    fn overrun_reports_absolute_offset() {
        let mut reader = Reader::new(&[0, 1, 2, 3, 4]);
        reader.skip(1).unwrap();
        let mut sub = reader.sub(3).unwrap();
        assert_eq!(sub.u16().unwrap(), 0x0102);
        let err = sub.u16().unwrap_err();
        assert_matches!(err, Error::Format(FormatError::UnexpectedEof { offset: 3, needed: 2 }));
        assert_eq!(reader.position(), 4);
    }
}

use serde_derive::Serialize;
use ustr::Ustr;

use crate::error::{Result, Unsupported};
use crate::parser::attributes::{read_attributes, Attribute, AttributeData};
use crate::parser::pool::ConstantPool;
use crate::parser::reader::Reader;

macro_rules! operations {
    ($($name:ident = $code:literal,)*) => {
        #[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize)]
        pub enum Operation {
            $($name,)*
            Reserved(u8),
        }

        impl Operation {
            pub fn from_byte(byte: u8) -> Operation {
                match byte {
                    $($code => Operation::$name,)*
                    other => Operation::Reserved(other),
                }
            }

            pub fn code(self) -> u8 {
                match self {
                    $(Operation::$name => $code,)*
                    Operation::Reserved(code) => code,
                }
            }
        }
    };
}

operations! {
    Nop = 0x00,
    RefConstNull = 0x01,
    IntConstM1 = 0x02,
    IntConst0 = 0x03,
    IntConst1 = 0x04,
    IntConst2 = 0x05,
    IntConst3 = 0x06,
    IntConst4 = 0x07,
    IntConst5 = 0x08,
    LongConst0 = 0x09,
    LongConst1 = 0x0a,
    FloatConst0 = 0x0b,
    FloatConst1 = 0x0c,
    FloatConst2 = 0x0d,
    DoubleConst0 = 0x0e,
    DoubleConst1 = 0x0f,
    BytePush = 0x10,
    ShortPush = 0x11,
    LoadConst = 0x12,
    LoadConstWide = 0x13,
    LoadConst2Wide = 0x14,
    IntLoad = 0x15,
    LongLoad = 0x16,
    FloatLoad = 0x17,
    DoubleLoad = 0x18,
    RefLoad = 0x19,
    IntLoad0 = 0x1a,
    IntLoad1 = 0x1b,
    IntLoad2 = 0x1c,
    IntLoad3 = 0x1d,
    LongLoad0 = 0x1e,
    LongLoad1 = 0x1f,
    LongLoad2 = 0x20,
    LongLoad3 = 0x21,
    FloatLoad0 = 0x22,
    FloatLoad1 = 0x23,
    FloatLoad2 = 0x24,
    FloatLoad3 = 0x25,
    DoubleLoad0 = 0x26,
    DoubleLoad1 = 0x27,
    DoubleLoad2 = 0x28,
    DoubleLoad3 = 0x29,
    RefLoad0 = 0x2a,
    RefLoad1 = 0x2b,
    RefLoad2 = 0x2c,
    RefLoad3 = 0x2d,
    IntArrayLoad = 0x2e,
    LongArrayLoad = 0x2f,
    FloatArrayLoad = 0x30,
    DoubleArrayLoad = 0x31,
    RefArrayLoad = 0x32,
    ByteArrayLoad = 0x33,
    CharArrayLoad = 0x34,
    ShortArrayLoad = 0x35,
    IntStore = 0x36,
    LongStore = 0x37,
    FloatStore = 0x38,
    DoubleStore = 0x39,
    RefStore = 0x3a,
    IntStore0 = 0x3b,
    IntStore1 = 0x3c,
    IntStore2 = 0x3d,
    IntStore3 = 0x3e,
    LongStore0 = 0x3f,
    LongStore1 = 0x40,
    LongStore2 = 0x41,
    LongStore3 = 0x42,
    FloatStore0 = 0x43,
    FloatStore1 = 0x44,
    FloatStore2 = 0x45,
    FloatStore3 = 0x46,
    DoubleStore0 = 0x47,
    DoubleStore1 = 0x48,
    DoubleStore2 = 0x49,
    DoubleStore3 = 0x4a,
    RefStore0 = 0x4b,
    RefStore1 = 0x4c,
    RefStore2 = 0x4d,
    RefStore3 = 0x4e,
    IntArrayStore = 0x4f,
    LongArrayStore = 0x50,
    FloatArrayStore = 0x51,
    DoubleArrayStore = 0x52,
    RefArrayStore = 0x53,
    ByteArrayStore = 0x54,
    CharArrayStore = 0x55,
    ShortArrayStore = 0x56,
    Pop = 0x57,
    Pop2 = 0x58,
    Dup = 0x59,
    DupX1 = 0x5a,
    DupX2 = 0x5b,
    Dup2 = 0x5c,
    Dup2X1 = 0x5d,
    Dup2X2 = 0x5e,
    Swap = 0x5f,
    IntAdd = 0x60,
    LongAdd = 0x61,
    FloatAdd = 0x62,
    DoubleAdd = 0x63,
    IntSub = 0x64,
    LongSub = 0x65,
    FloatSub = 0x66,
    DoubleSub = 0x67,
    IntMul = 0x68,
    LongMul = 0x69,
    FloatMul = 0x6a,
    DoubleMul = 0x6b,
    IntDiv = 0x6c,
    LongDiv = 0x6d,
    FloatDiv = 0x6e,
    DoubleDiv = 0x6f,
    IntRem = 0x70,
    LongRem = 0x71,
    FloatRem = 0x72,
    DoubleRem = 0x73,
    IntNeg = 0x74,
    LongNeg = 0x75,
    FloatNeg = 0x76,
    DoubleNeg = 0x77,
    IntShl = 0x78,
    LongShl = 0x79,
    IntShr = 0x7a,
    LongShr = 0x7b,
    IntUshr = 0x7c,
    LongUshr = 0x7d,
    IntAnd = 0x7e,
    LongAnd = 0x7f,
    IntOr = 0x80,
    LongOr = 0x81,
    IntXor = 0x82,
    LongXor = 0x83,
    IntInc = 0x84,
    IntToLong = 0x85,
    IntToFloat = 0x86,
    IntToDouble = 0x87,
    LongToInt = 0x88,
    LongToFloat = 0x89,
    LongToDouble = 0x8a,
    FloatToInt = 0x8b,
    FloatToLong = 0x8c,
    FloatToDouble = 0x8d,
    DoubleToInt = 0x8e,
    DoubleToLong = 0x8f,
    DoubleToFloat = 0x90,
    IntToByte = 0x91,
    IntToChar = 0x92,
    IntToShort = 0x93,
    LongCompare = 0x94,
    FloatCompareL = 0x95,
    FloatCompareG = 0x96,
    DoubleCompareL = 0x97,
    DoubleCompareG = 0x98,
    IfEq = 0x99,
    IfNe = 0x9a,
    IfLt = 0x9b,
    IfGe = 0x9c,
    IfGt = 0x9d,
    IfLe = 0x9e,
    IfIntCmpEq = 0x9f,
    IfIntCmpNe = 0xa0,
    IfIntCmpLt = 0xa1,
    IfIntCmpGe = 0xa2,
    IfIntCmpGt = 0xa3,
    IfIntCmpLe = 0xa4,
    IfRefCmpEq = 0xa5,
    IfRefCmpNe = 0xa6,
    Goto = 0xa7,
    Jsr = 0xa8,
    Ret = 0xa9,
    TableSwitch = 0xaa,
    LookupSwitch = 0xab,
    IntReturn = 0xac,
    LongReturn = 0xad,
    FloatReturn = 0xae,
    DoubleReturn = 0xaf,
    RefReturn = 0xb0,
    Return = 0xb1,
    GetStatic = 0xb2,
    PutStatic = 0xb3,
    GetField = 0xb4,
    PutField = 0xb5,
    InvokeVirtual = 0xb6,
    InvokeSpecial = 0xb7,
    InvokeStatic = 0xb8,
    InvokeInterface = 0xb9,
    InvokeDynamic = 0xba,
    New = 0xbb,
    NewArray = 0xbc,
    RefNewArray = 0xbd,
    ArrayLength = 0xbe,
    Throw = 0xbf,
    CheckCast = 0xc0,
    InstanceOf = 0xc1,
    MonitorEnter = 0xc2,
    MonitorExit = 0xc3,
    Wide = 0xc4,
    MultiNewArray = 0xc5,
    IfNull = 0xc6,
    IfNonNull = 0xc7,
    GotoWide = 0xc8,
    JsrWide = 0xc9,
    Breakpoint = 0xca,
    ImpDep1 = 0xfe,
    ImpDep2 = 0xff,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Shape {
    Simple,
    OneValue,
    WideOneValue,
    TwoValue,
    Branch,
    ValueExtra,
    Table,
}

const fn classify(code: u8) -> Shape {
    match code {
        0x10 | 0x12 | 0x15..=0x19 | 0x36..=0x3a | 0xa9 | 0xbc => Shape::OneValue,
        0x11 | 0x13 | 0x14 | 0xb2..=0xb8 | 0xbb | 0xbd | 0xc0 | 0xc1 => Shape::WideOneValue,
        0x84 => Shape::TwoValue,
        0x99..=0xa8 | 0xc6..=0xc9 => Shape::Branch,
        0xb9 | 0xba | 0xc5 => Shape::ValueExtra,
        0xaa | 0xab => Shape::Table,
        _ => Shape::Simple,
    }
}

const fn build_shapes() -> [Shape; 256] {
    let mut table = [Shape::Simple; 256];
    let mut code = 0;
    while code < 256 {
        table[code] = classify(code as u8);
        code += 1;
    }
    table
}

static SHAPES: [Shape; 256] = build_shapes();

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Operand {
    Simple,
    OneValue(i32),
    TwoValue(i32, i32),
    Branch(i32),
    ValueExtra(u16, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Opcode {
    pub operation: Operation,
    pub offset: u32,
    pub operand: Operand,
    pub wide: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExceptionHandler {
    pub start: u16,
    pub end: u16,
    pub handler: u16,
    pub catch_class: Option<Ustr>,
}

#[derive(Debug, Serialize)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_length: u32,
    pub opcodes: Vec<Opcode>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Opcode {
    pub fn value(&self) -> Option<i32> {
        match self.operand {
            Operand::OneValue(value) => Some(value),
            Operand::ValueExtra(value, _) => Some(value as i32),
            _ => None,
        }
    }

    pub fn branch_target(&self) -> Option<u32> {
        match self.operand {
            Operand::Branch(rel) => Some((self.offset as i64 + rel as i64) as u32),
            _ => None,
        }
    }
}

fn padding(operation: Operation) -> usize {
    match operation {
        Operation::InvokeInterface | Operation::InvokeDynamic => 1,
        _ => 0,
    }
}

fn read_opcode(code: &mut Reader, operation: Operation, offset: u32, wide: bool) -> Result<Opcode> {
    if operation == Operation::Wide {
        if wide {
            return Err(Unsupported::WideRecursion { offset }.into());
        }
        let next = Operation::from_byte(code.u8()?);
        return read_opcode(code, next, offset, true);
    }
    let operand = match SHAPES[operation.code() as usize] {
        Shape::Simple => Operand::Simple,
        Shape::OneValue => Operand::OneValue(match (operation, wide) {
            (Operation::BytePush, _) => code.i8()? as i32,
            (_, true) => code.u16()? as i32,
            (_, false) => code.u8()? as i32,
        }),
        Shape::WideOneValue => Operand::OneValue(match operation {
            Operation::ShortPush => code.i16()? as i32,
            _ => code.u16()? as i32,
        }),
        Shape::TwoValue => match wide {
            true => Operand::TwoValue(code.u16()? as i32, code.i16()? as i32),
            false => Operand::TwoValue(code.u8()? as i32, code.i8()? as i32),
        },
        Shape::Branch => Operand::Branch(match operation {
            Operation::GotoWide | Operation::JsrWide => code.i32()?,
            _ => code.i16()? as i32,
        }),
        Shape::ValueExtra => {
            let value = code.u16()?;
            let extra = code.u8()?;
            code.skip(padding(operation))?;
            Operand::ValueExtra(value, extra)
        }
        Shape::Table => return Err(Unsupported::JumpTable { operation, offset }.into()),
    };
    Ok(Opcode {
        operation,
        offset,
        operand,
        wide,
    })
}

pub fn decode(code: &mut Reader) -> Result<Vec<Opcode>> {
    let mut out = Vec::new();
    while !code.is_empty() {
        let offset = code.position() as u32;
        let operation = Operation::from_byte(code.u8()?);
        out.push(read_opcode(code, operation, offset, false)?);
    }
    Ok(out)
}

pub fn decode_attribute(reader: &mut Reader, pool: &ConstantPool) -> Result<AttributeData> {
    let max_stack = reader.u16()?;
    let max_locals = reader.u16()?;
    let code_length = reader.u32()?;
    let opcodes = decode(&mut reader.sub(code_length as usize)?)?;
    let count = reader.u16()?;
    let mut exception_table = Vec::with_capacity(count as usize);
    for _ in 0..count {
        exception_table.push(ExceptionHandler {
            start: reader.u16()?,
            end: reader.u16()?,
            handler: reader.u16()?,
            catch_class: pool.optional_class_name(reader.u16()?)?,
        });
    }
    let attributes = read_attributes(reader, pool)?;
    Ok(AttributeData::Code(CodeAttribute {
        max_stack,
        max_locals,
        code_length,
        opcodes,
        exception_table,
        attributes,
    }))
}

use log::trace;

use crate::error::Result;
use crate::ir::function::{ArithOp, BitOp, Body, ConvOp, Deferred, ElemKind, Instruction, Region, Runtime};
use crate::ir::module::TypeSig;
use crate::parser::attributes::AttributeList;
use crate::parser::class::Method;
use crate::parser::code::{CodeAttribute, Opcode, Operand, Operation as Op};
use crate::parser::pool::{Constant, ConstantPool};
use crate::parser::types::ValueKind;
use crate::translate::locals::{argument_slots, Locals, Slot};
use crate::translate::resolve::{method_descriptor, Resolver};

struct Emitter<'r, 'a> {
    resolver: &'r Resolver<'a>,
    pool: &'r ConstantPool,
    locals: Locals,
    body: Body,
}

fn local_access(operation: Op) -> Option<(ValueKind, Option<u16>, bool)> {
    let code = operation.code();
    let kinds = [ValueKind::Int, ValueKind::Long, ValueKind::Float, ValueKind::Double, ValueKind::Ref];
    Some(match code {
        0x15..=0x19 => (kinds[(code - 0x15) as usize], None, false),
        0x1a..=0x2d => (kinds[((code - 0x1a) / 4) as usize], Some(((code - 0x1a) % 4) as u16), false),
        0x36..=0x3a => (kinds[(code - 0x36) as usize], None, true),
        0x3b..=0x4e => (kinds[((code - 0x3b) / 4) as usize], Some(((code - 0x3b) % 4) as u16), true),
        _ => return None,
    })
}

fn elem_kind(operation: Op) -> Option<(ElemKind, bool)> {
    Some(match operation {
        Op::IntArrayLoad => (ElemKind::I4, false),
        Op::LongArrayLoad => (ElemKind::I8, false),
        Op::FloatArrayLoad => (ElemKind::R4, false),
        Op::DoubleArrayLoad => (ElemKind::R8, false),
        Op::RefArrayLoad => (ElemKind::Ref, false),
        Op::ByteArrayLoad => (ElemKind::I1, false),
        Op::CharArrayLoad => (ElemKind::U2, false),
        Op::ShortArrayLoad => (ElemKind::I2, false),
        Op::IntArrayStore => (ElemKind::I4, true),
        Op::LongArrayStore => (ElemKind::I8, true),
        Op::FloatArrayStore => (ElemKind::R4, true),
        Op::DoubleArrayStore => (ElemKind::R8, true),
        Op::RefArrayStore => (ElemKind::Ref, true),
        Op::ByteArrayStore => (ElemKind::I1, true),
        Op::CharArrayStore => (ElemKind::U2, true),
        Op::ShortArrayStore => (ElemKind::I2, true),
        _ => return None,
    })
}

/// Operations with a fixed single-instruction translation.
fn simple(operation: Op) -> Option<Instruction> {
    Some(match operation {
        Op::Nop => Instruction::Nop,
        Op::RefConstNull => Instruction::Ldnull,
        Op::IntConstM1 => Instruction::LdcI4(-1),
        Op::IntConst0 => Instruction::LdcI4(0),
        Op::IntConst1 => Instruction::LdcI4(1),
        Op::IntConst2 => Instruction::LdcI4(2),
        Op::IntConst3 => Instruction::LdcI4(3),
        Op::IntConst4 => Instruction::LdcI4(4),
        Op::IntConst5 => Instruction::LdcI4(5),
        Op::LongConst0 => Instruction::LdcI8(0),
        Op::LongConst1 => Instruction::LdcI8(1),
        Op::FloatConst0 => Instruction::LdcR4(0.0),
        Op::FloatConst1 => Instruction::LdcR4(1.0),
        Op::FloatConst2 => Instruction::LdcR4(2.0),
        Op::DoubleConst0 => Instruction::LdcR8(0.0),
        Op::DoubleConst1 => Instruction::LdcR8(1.0),
        Op::Pop => Instruction::Pop,
        Op::Dup => Instruction::Dup,
        Op::IntAdd | Op::LongAdd | Op::FloatAdd | Op::DoubleAdd => Instruction::Arith(ArithOp::Add),
        Op::IntSub | Op::LongSub | Op::FloatSub | Op::DoubleSub => Instruction::Arith(ArithOp::Sub),
        Op::IntMul | Op::LongMul | Op::FloatMul | Op::DoubleMul => Instruction::Arith(ArithOp::Mul),
        Op::IntDiv | Op::LongDiv | Op::FloatDiv | Op::DoubleDiv => Instruction::Arith(ArithOp::Div),
        Op::IntRem | Op::LongRem | Op::FloatRem | Op::DoubleRem => Instruction::Arith(ArithOp::Rem),
        Op::IntNeg | Op::LongNeg | Op::FloatNeg | Op::DoubleNeg => Instruction::Neg,
        Op::IntShl | Op::LongShl => Instruction::Bit(BitOp::Shl),
        Op::IntShr | Op::LongShr => Instruction::Bit(BitOp::Shr),
        Op::IntUshr | Op::LongUshr => Instruction::Bit(BitOp::ShrUn),
        Op::IntAnd | Op::LongAnd => Instruction::Bit(BitOp::And),
        Op::IntOr | Op::LongOr => Instruction::Bit(BitOp::Or),
        Op::IntXor | Op::LongXor => Instruction::Bit(BitOp::Xor),
        Op::IntToLong | Op::FloatToLong | Op::DoubleToLong => Instruction::Conv(ConvOp::I8),
        Op::IntToFloat | Op::LongToFloat | Op::DoubleToFloat => Instruction::Conv(ConvOp::R4),
        Op::IntToDouble | Op::LongToDouble | Op::FloatToDouble => Instruction::Conv(ConvOp::R8),
        Op::LongToInt | Op::FloatToInt | Op::DoubleToInt => Instruction::Conv(ConvOp::I4),
        Op::IntToByte => Instruction::Conv(ConvOp::I1),
        Op::IntToChar => Instruction::Conv(ConvOp::U2),
        Op::IntToShort => Instruction::Conv(ConvOp::I2),
        Op::IntReturn | Op::LongReturn | Op::FloatReturn | Op::DoubleReturn | Op::RefReturn | Op::Return => Instruction::Ret,
        Op::ArrayLength => Instruction::Ldlen,
        Op::Throw => Instruction::Throw,
        _ => return None,
    })
}

fn primitive_array(atype: i32) -> Option<TypeSig> {
    Some(match atype {
        4 => TypeSig::Bool,
        5 => TypeSig::Char,
        6 => TypeSig::F32,
        7 => TypeSig::F64,
        8 => TypeSig::I8,
        9 => TypeSig::I16,
        10 => TypeSig::I32,
        11 => TypeSig::I64,
        _ => return None,
    })
}

impl<'r, 'a> Emitter<'r, 'a> {
    fn emit(&mut self, op: &Opcode, inst: Instruction) {
        self.body.emit(op.offset, inst);
    }

    fn index(op: &Opcode) -> u16 {
        op.value().unwrap_or(0) as u16
    }

    fn unmapped(&mut self, op: &Opcode) {
        trace!("no mapping for {:?} at {}", op.operation, op.offset);
        self.body.deferred.push(Deferred::Unmapped {
            offset: op.offset,
            operation: op.operation,
        });
    }

    fn local(&mut self, slot: u16, offset: u32, kind: ValueKind, store: bool) -> Result<Instruction> {
        Ok(match (self.locals.lookup(slot, offset, kind)?, store) {
            (Slot::Arg(index), false) => Instruction::Ldarg(index),
            (Slot::Arg(index), true) => Instruction::Starg(index),
            (Slot::Local(index), false) => Instruction::Ldloc(index),
            (Slot::Local(index), true) => Instruction::Stloc(index),
        })
    }

    fn load_constant(&mut self, op: &Opcode) -> Result<()> {
        let pool = self.pool;
        match pool.required(Self::index(op))? {
            Constant::Integer(value) => self.emit(op, Instruction::LdcI4(*value)),
            Constant::Float(value) => self.emit(op, Instruction::LdcR4(*value)),
            Constant::Long(value) => self.emit(op, Instruction::LdcI8(*value)),
            Constant::Double(value) => self.emit(op, Instruction::LdcR8(*value)),
            Constant::String(value) => {
                self.emit(op, Instruction::Ldstr(*value));
                let factory = self.resolver.string_factory();
                self.emit(op, Instruction::Call(factory));
            }
            _ => self.unmapped(op),
        }
        Ok(())
    }

    fn translate(&mut self, op: &Opcode, next: u32) -> Result<()> {
        if let Some(inst) = simple(op.operation) {
            self.emit(op, inst);
            return Ok(());
        }
        if let Some((kind, fixed, store)) = local_access(op.operation) {
            let slot = fixed.unwrap_or_else(|| Self::index(op));
            let offset = if store { next } else { op.offset };
            let inst = self.local(slot, offset, kind, store)?;
            self.emit(op, inst);
            return Ok(());
        }
        if let Some((kind, store)) = elem_kind(op.operation) {
            self.emit(op, if store { Instruction::Stelem(kind) } else { Instruction::Ldelem(kind) });
            return Ok(());
        }
        if let Some(target) = op.branch_target() {
            self.body.deferred.push(Deferred::Branch {
                offset: op.offset,
                operation: op.operation,
                target,
            });
            return Ok(());
        }
        match op.operation {
            Op::BytePush | Op::ShortPush => self.emit(op, Instruction::LdcI4(op.value().unwrap_or(0))),
            Op::LoadConst | Op::LoadConstWide | Op::LoadConst2Wide => self.load_constant(op)?,
            Op::IntInc => {
                if let Operand::TwoValue(slot, delta) = op.operand {
                    let load = self.local(slot as u16, op.offset, ValueKind::Int, false)?;
                    let store = self.local(slot as u16, next, ValueKind::Int, true)?;
                    self.emit(op, load);
                    self.emit(op, Instruction::LdcI4(delta));
                    self.emit(op, Instruction::Arith(ArithOp::Add));
                    self.emit(op, store);
                }
            }
            Op::GetStatic | Op::PutStatic | Op::GetField | Op::PutField => {
                let field = self.resolver.field(&self.pool.member(Self::index(op))?)?;
                let inst = match op.operation {
                    Op::GetStatic => Instruction::Ldsfld(field),
                    Op::PutStatic => Instruction::Stsfld(field),
                    Op::GetField => Instruction::Ldfld(field),
                    _ => Instruction::Stfld(field),
                };
                self.emit(op, inst);
            }
            Op::InvokeVirtual | Op::InvokeSpecial | Op::InvokeStatic | Op::InvokeInterface => {
                let method = self.resolver.method(&self.pool.member(Self::index(op))?)?;
                let inst = match op.operation {
                    Op::InvokeSpecial | Op::InvokeStatic => Instruction::Call(method),
                    _ => Instruction::Callvirt(method),
                };
                self.emit(op, inst);
            }
            Op::New => {
                let class = self.resolver.class(self.pool.class_name(Self::index(op))?)?;
                self.emit(op, Instruction::Ldtoken(class));
                self.emit(op, Instruction::CallRuntime(Runtime::TypeFromHandle));
                self.emit(op, Instruction::CallRuntime(Runtime::UninitializedObject));
            }
            Op::NewArray => match op.value().and_then(primitive_array) {
                Some(elem) => self.emit(op, Instruction::Newarr(elem)),
                None => self.unmapped(op),
            },
            Op::RefNewArray => {
                let elem = self.resolver.class_sig(self.pool.class_name(Self::index(op))?)?;
                self.emit(op, Instruction::Newarr(elem));
            }
            Op::CheckCast => {
                let target = self.resolver.class_sig(self.pool.class_name(Self::index(op))?)?;
                self.emit(op, Instruction::Castclass(target));
            }
            _ => self.unmapped(op),
        }
        Ok(())
    }
}

pub fn translate(resolver: &Resolver, pool: &ConstantPool, method: &Method, code: &CodeAttribute) -> Result<Body> {
    let desc = method_descriptor(method.descriptor)?;
    let args = argument_slots(&desc.parameters, !method.is_static());
    let mut emitter = Emitter {
        resolver,
        pool,
        locals: Locals::new(code.attributes.local_variables(), args, resolver)?,
        body: Body {
            max_stack: code.max_stack,
            ..Body::default()
        },
    };
    for (index, op) in code.opcodes.iter().enumerate() {
        let next = code.opcodes.get(index + 1).map_or(code.code_length, |next| next.offset);
        emitter.translate(op, next)?;
    }
    let mut body = emitter.body;
    body.locals = emitter.locals.into_locals();
    body.regions = code
        .exception_table
        .iter()
        .map(|handler| Region {
            start: handler.start as u32,
            end: handler.end as u32,
            handler: handler.handler as u32,
            catch_class: handler.catch_class,
        })
        .collect();
    Ok(body)
}

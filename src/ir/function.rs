use serde_derive::Serialize;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use ustr::Ustr;

use crate::ir::module::{FieldRef, MethodRef, TypeRef, TypeSig};
use crate::parser::code::Operation;

pub trait Push<K: Eq + Hash, V> {
    fn push(&mut self, key: K, value: V);
}

impl<K: Eq + Hash, V, S: BuildHasher> Push<K, V> for HashMap<K, Vec<V>, S> {
    fn push(&mut self, key: K, value: V) {
        self.entry(key).or_default().push(value);
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum BitOp {
    And,
    Or,
    Xor,
    Shl,
    Shr,
    ShrUn,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum ConvOp {
    I1,
    U2,
    I2,
    I4,
    I8,
    R4,
    R8,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum ElemKind {
    I1,
    U2,
    I2,
    I4,
    I8,
    R4,
    R8,
    Ref,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum Runtime {
    TypeFromHandle,
    UninitializedObject,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Instruction {
    Nop,
    Ldnull,
    LdcI4(i32),
    LdcI8(i64),
    LdcR4(f32),
    LdcR8(f64),
    Ldstr(Ustr),
    Ldarg(u16),
    Starg(u16),
    Ldloc(u16),
    Stloc(u16),
    Arith(ArithOp),
    Neg,
    Bit(BitOp),
    Conv(ConvOp),
    Dup,
    Pop,
    Ret,
    Throw,
    Ldtoken(TypeRef),
    CallRuntime(Runtime),
    Call(MethodRef),
    Callvirt(MethodRef),
    Ldfld(FieldRef),
    Ldsfld(FieldRef),
    Stfld(FieldRef),
    Stsfld(FieldRef),
    Ldelem(ElemKind),
    Stelem(ElemKind),
    Newarr(TypeSig),
    Ldlen,
    Castclass(TypeSig),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Local {
    pub slot: u16,
    pub name: Option<Ustr>,
    pub sig: TypeSig,
}

/// Source opcodes carried through without an emitted target sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Deferred {
    Branch { offset: u32, operation: Operation, target: u32 },
    Unmapped { offset: u32, operation: Operation },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub start: u32,
    pub end: u32,
    pub handler: u32,
    pub catch_class: Option<Ustr>,
}

#[derive(Debug, Default, Serialize)]
pub struct Body {
    pub max_stack: u16,
    pub locals: Vec<Local>,
    pub instructions: Vec<(u32, Instruction)>,
    pub deferred: Vec<Deferred>,
    pub regions: Vec<Region>,
}

impl Body {
    pub fn emit(&mut self, offset: u32, inst: Instruction) {
        self.instructions.push((offset, inst));
    }
}

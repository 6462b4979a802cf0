use log::trace;
use std::collections::HashMap;
use ustr::Ustr;

use crate::error::{ConsistencyError, Result};
use crate::ir::function::{Local, Push};
use crate::ir::module::TypeSig;
use crate::parser::attributes::LocalVariable;
use crate::parser::types::{FieldType, ValueKind};
use crate::translate::resolve::{field_descriptor, Resolver};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Slot {
    Arg(u16),
    Local(u16),
}

struct Range {
    var: LocalVariable,
    kind: ValueKind,
    local: u16,
}

pub struct Locals {
    args: Vec<Option<u16>>,
    ranges: HashMap<u16, Vec<Range>>,
    synthetic: HashMap<(u16, ValueKind), u16>,
    locals: Vec<Local>,
    object: TypeSig,
}

/// Maps each source argument slot to its parameter index. The upper half of a
/// two-slot argument maps to `None`.
pub fn argument_slots(params: &[FieldType], has_this: bool) -> Vec<Option<u16>> {
    let mut slots = Vec::new();
    let mut index = 0;
    if has_this {
        slots.push(Some(0));
        index = 1;
    }
    for param in params {
        slots.push(Some(index));
        if param.slots() == 2 {
            slots.push(None);
        }
        index += 1;
    }
    slots
}

fn kind_sig(kind: ValueKind, object: &TypeSig) -> TypeSig {
    match kind {
        ValueKind::Int => TypeSig::I32,
        ValueKind::Long => TypeSig::I64,
        ValueKind::Float => TypeSig::F32,
        ValueKind::Double => TypeSig::F64,
        ValueKind::Ref => object.clone(),
    }
}

impl Locals {
    pub fn new(vars: &[LocalVariable], args: Vec<Option<u16>>, resolver: &Resolver) -> Result<Locals> {
        let mut locals = Locals {
            args,
            ranges: HashMap::new(),
            synthetic: HashMap::new(),
            locals: Vec::new(),
            object: resolver.object()?,
        };
        let mut next = vars.iter().map(|var| var.index + 1).max().unwrap_or(0);
        let mut first: HashMap<u16, (Ustr, u16)> = HashMap::new();
        for var in vars {
            if (var.index as usize) < locals.args.len() {
                continue;
            }
            let typ = field_descriptor(var.descriptor)?;
            let local = match first.get(&var.index) {
                Some((descriptor, local)) if *descriptor == var.descriptor => *local,
                Some(_) => {
                    trace!("slot {} changes type to {} at {}, remapped to {}", var.index, var.descriptor, var.start, next);
                    let local = locals.declare(next, Some(var.name), resolver.field_sig(&typ)?);
                    next += 1;
                    local
                }
                None => {
                    let local = locals.declare(var.index, Some(var.name), resolver.field_sig(&typ)?);
                    first.insert(var.index, (var.descriptor, local));
                    local
                }
            };
            let range = Range {
                var: var.clone(),
                kind: typ.kind(),
                local,
            };
            locals.ranges.push(var.index, range);
        }
        Ok(locals)
    }

    fn declare(&mut self, slot: u16, name: Option<Ustr>, sig: TypeSig) -> u16 {
        self.locals.push(Local { slot, name, sig });
        (self.locals.len() - 1) as u16
    }

    pub fn lookup(&mut self, slot: u16, offset: u32, kind: ValueKind) -> Result<Slot> {
        if let Some(arg) = self.args.get(slot as usize) {
            return match arg {
                Some(index) => Ok(Slot::Arg(*index)),
                None => Err(ConsistencyError::SplitArgument { slot }.into()),
            };
        }
        let hits: Vec<u16> = match self.ranges.get(&slot) {
            Some(ranges) => ranges
                .iter()
                .filter(|range| range.kind == kind && range.var.in_range(offset))
                .map(|range| range.local)
                .collect(),
            None => Vec::new(),
        };
        match hits.len() {
            0 => Ok(Slot::Local(self.synthetic(slot, offset, kind))),
            1 => Ok(Slot::Local(hits[0])),
            count => Err(ConsistencyError::OverlappingLocals { slot, offset, count }.into()),
        }
    }

    fn synthetic(&mut self, slot: u16, offset: u32, kind: ValueKind) -> u16 {
        if let Some(local) = self.synthetic.get(&(slot, kind)) {
            return *local;
        }
        trace!("synthetic {:?} local for slot {} first seen at {}", kind, slot, offset);
        let sig = kind_sig(kind, &self.object);
        let local = self.declare(slot, None, sig);
        self.synthetic.insert((slot, kind), local);
        local
    }

    pub fn into_locals(self) -> Vec<Local> {
        self.locals
    }
}

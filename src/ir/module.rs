use serde_derive::Serialize;
use std::collections::HashMap;
use ustr::Ustr;

use crate::ir::class::TypeDef;

#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize)]
pub enum Origin {
    Shim,
    Defined(TypeId),
}

/// A resolved type, named by its slash-qualified source name.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize)]
pub struct TypeRef {
    pub name: Ustr,
    pub origin: Origin,
}

#[derive(Debug, Clone, Eq, Hash, PartialEq, Serialize)]
pub enum TypeSig {
    Void,
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    NativeString,
    Class(TypeRef),
    Array(Box<TypeSig>),
}

#[derive(Debug, Clone, Eq, Hash, PartialEq, Serialize)]
pub struct MethodSig {
    pub has_this: bool,
    pub params: Vec<TypeSig>,
    pub ret: TypeSig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodRef {
    pub owner: TypeRef,
    pub name: Ustr,
    pub sig: MethodSig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRef {
    pub owner: TypeRef,
    pub name: Ustr,
    pub sig: TypeSig,
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberKey {
    pub name: Ustr,
    pub descriptor: Ustr,
    pub is_static: bool,
}

/// Member surface shared by translated types and shim types.
pub trait Declares {
    fn super_name(&self) -> Option<Ustr>;
    fn interface_names(&self) -> Vec<Ustr> {
        Vec::new()
    }
    fn method_keys(&self) -> Vec<MemberKey>;
    fn field_keys(&self) -> Vec<MemberKey>;
}

#[derive(Debug, Serialize)]
pub struct Module {
    pub name: String,
    pub types: Vec<TypeDef>,
    pub top_level: Vec<TypeId>,
    #[serde(skip)]
    index: HashMap<Ustr, TypeId>,
}

impl Module {
    pub fn new(name: String) -> Module {
        Module {
            name,
            types: Vec::new(),
            top_level: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns `None` when a type with the same source name is already registered.
    pub fn register(&mut self, def: TypeDef) -> Option<TypeId> {
        if self.index.contains_key(&def.source) {
            return None;
        }
        let id = TypeId(self.types.len() as u32);
        self.index.insert(def.source, id);
        self.types.push(def);
        Some(id)
    }

    pub fn lookup(&self, source: Ustr) -> Option<TypeId> {
        self.index.get(&source).copied()
    }

    pub fn get(&self, id: TypeId) -> &TypeDef {
        &self.types[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut TypeDef {
        &mut self.types[id.0 as usize]
    }

    pub fn attach(&mut self, id: TypeId, host: Option<TypeId>) {
        match host {
            Some(host) => {
                self.get_mut(id).enclosing = Some(host);
                self.get_mut(host).nested.push(id);
            }
            None => self.top_level.push(id),
        }
    }
}

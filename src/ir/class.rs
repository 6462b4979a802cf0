use serde_derive::Serialize;
use ustr::Ustr;

use crate::ir::function::Body;
use crate::ir::module::{Declares, MemberKey, MethodSig, TypeId, TypeRef, TypeSig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TypeFlags {
    pub is_public: bool,
    pub is_nested_private: bool,
    pub is_abstract: bool,
    pub is_sealed: bool,
    pub is_interface: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MethodFlags {
    pub is_public: bool,
    pub is_private: bool,
    pub is_final: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_external: bool,
    pub is_special_name: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FieldFlags {
    pub is_public: bool,
    pub is_private: bool,
    pub is_static: bool,
    pub is_init_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Ustr),
}

#[derive(Debug, Serialize)]
pub struct FieldDef {
    pub name: Ustr,
    pub descriptor: Ustr,
    pub flags: FieldFlags,
    pub sig: TypeSig,
    pub constant: Option<Literal>,
}

#[derive(Debug, Serialize)]
pub struct MethodDef {
    pub name: Ustr,
    pub source_name: Ustr,
    pub descriptor: Ustr,
    pub flags: MethodFlags,
    pub sig: MethodSig,
    pub body: Option<Body>,
}

#[derive(Debug, Serialize)]
pub struct TypeDef {
    pub source: Ustr,
    pub namespace: String,
    pub name: String,
    pub flags: TypeFlags,
    pub super_name: Option<Ustr>,
    pub base: Option<TypeRef>,
    pub interfaces: Vec<Ustr>,
    pub enclosing: Option<TypeId>,
    pub nested: Vec<TypeId>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
}

impl TypeDef {
    pub fn new(source: Ustr, namespace: String, name: String) -> TypeDef {
        TypeDef {
            source,
            namespace,
            name,
            flags: TypeFlags::default(),
            super_name: None,
            base: None,
            interfaces: Vec::new(),
            enclosing: None,
            nested: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }
}

impl Declares for TypeDef {
    fn super_name(&self) -> Option<Ustr> {
        self.super_name
    }

    fn interface_names(&self) -> Vec<Ustr> {
        self.interfaces.clone()
    }

    fn method_keys(&self) -> Vec<MemberKey> {
        self.methods
            .iter()
            .map(|method| MemberKey {
                name: method.name,
                descriptor: method.descriptor,
                is_static: method.flags.is_static,
            })
            .collect()
    }

    fn field_keys(&self) -> Vec<MemberKey> {
        self.fields
            .iter()
            .map(|field| MemberKey {
                name: field.name,
                descriptor: field.descriptor,
                is_static: field.flags.is_static,
            })
            .collect()
    }
}

use log::trace;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use ustr::Ustr;

use crate::error::{FormatError, ResolutionError, Result};
use crate::ir::module::{Declares, FieldRef, MemberKey, MethodRef, MethodSig, Module, Origin, TypeRef, TypeSig};
use crate::ir::naming;
use crate::ir::shim::Catalog;
use crate::parser::pool::MemberTriple;
use crate::parser::types::{self, FieldType, MethodDescriptor};

const OBJECT_CLASS: &str = "java/lang/Object";

pub fn method_descriptor(desc: Ustr) -> Result<Arc<MethodDescriptor>> {
    types::method(desc).ok_or_else(|| FormatError::BadDescriptor(desc).into())
}

pub fn field_descriptor(desc: Ustr) -> Result<Arc<FieldType>> {
    types::field(desc).ok_or_else(|| FormatError::BadDescriptor(desc).into())
}

enum Found {
    Missing,
    One(TypeRef, MemberKey),
    Many(usize),
}

pub struct Resolver<'a> {
    catalog: &'a Catalog,
    module: &'a Module,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, module: &'a Module) -> Resolver<'a> {
        Resolver { catalog, module }
    }

    pub fn class(&self, name: Ustr) -> Result<TypeRef> {
        if let Some(shim) = self.catalog.type_ref(name) {
            return Ok(shim);
        }
        match self.module.lookup(name) {
            Some(id) => Ok(TypeRef {
                name,
                origin: Origin::Defined(id),
            }),
            None => Err(ResolutionError::UnknownClass(name).into()),
        }
    }

    /// Class operands of `anewarray` and `checkcast` may name an array descriptor.
    pub fn class_sig(&self, name: Ustr) -> Result<TypeSig> {
        match name.starts_with('[') {
            true => self.field_sig(&*field_descriptor(name)?),
            false => Ok(TypeSig::Class(self.class(name)?)),
        }
    }

    pub fn object(&self) -> Result<TypeSig> {
        Ok(TypeSig::Class(self.class(OBJECT_CLASS.into())?))
    }

    pub fn string_factory(&self) -> MethodRef {
        self.catalog.string_factory()
    }

    pub fn field_sig(&self, typ: &FieldType) -> Result<TypeSig> {
        Ok(match typ {
            FieldType::Byte => TypeSig::I8,
            FieldType::Char => TypeSig::Char,
            FieldType::Double => TypeSig::F64,
            FieldType::Float => TypeSig::F32,
            FieldType::Int => TypeSig::I32,
            FieldType::Long => TypeSig::I64,
            FieldType::Short => TypeSig::I16,
            FieldType::Boolean => TypeSig::Bool,
            FieldType::Object(name) => TypeSig::Class(self.class(*name)?),
            FieldType::Array(elem) => TypeSig::Array(Box::new(self.field_sig(elem)?)),
        })
    }

    pub fn method_sig(&self, desc: &MethodDescriptor, has_this: bool) -> Result<MethodSig> {
        let params = desc
            .parameters
            .iter()
            .map(|param| self.field_sig(param))
            .collect::<Result<_>>()?;
        let ret = match &desc.return_type {
            Some(typ) => self.field_sig(typ)?,
            None => TypeSig::Void,
        };
        Ok(MethodSig { has_this, params, ret })
    }

    fn declared(&self, owner: &TypeRef) -> Result<&'a dyn Declares> {
        match owner.origin {
            Origin::Shim => match self.catalog.get(owner.name) {
                Some(shim) => Ok(shim),
                None => Err(ResolutionError::UnknownClass(owner.name).into()),
            },
            Origin::Defined(id) => Ok(self.module.get(id)),
        }
    }

    /// Searches `owner`, then its superclasses, for exactly one matching member.
    /// When the class chain has no match, the superinterfaces of every type on
    /// the chain are searched breadth first.
    fn find<K, M>(&self, mut owner: TypeRef, keys: K, matches: M) -> Result<Found>
    where
        K: Fn(&dyn Declares) -> Vec<MemberKey>,
        M: Fn(&MemberKey) -> bool,
    {
        let mut seen = HashSet::new();
        let mut pending = VecDeque::new();
        while seen.insert(owner.name) {
            let declared = self.declared(&owner)?;
            let hits: Vec<MemberKey> = keys(declared).into_iter().filter(|key| matches(key)).collect();
            match hits.len() {
                0 => {}
                1 => return Ok(Found::One(owner, hits[0])),
                count => return Ok(Found::Many(count)),
            }
            pending.extend(declared.interface_names());
            match declared.super_name() {
                Some(name) => owner = self.class(name)?,
                None => break,
            }
        }
        let mut found = Vec::new();
        while let Some(name) = pending.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            let owner = match self.class(name) {
                Ok(owner) => owner,
                Err(_) => {
                    trace!("skipping unknown interface {}", name);
                    continue;
                }
            };
            let declared = self.declared(&owner)?;
            for key in keys(declared).into_iter().filter(|key| matches(key)) {
                found.push((owner, key));
            }
            pending.extend(declared.interface_names());
        }
        Ok(match found.len() {
            0 => Found::Missing,
            1 => Found::One(found[0].0, found[0].1),
            count => Found::Many(count),
        })
    }

    pub fn method(&self, member: &MemberTriple) -> Result<MethodRef> {
        let owner = self.class(member.class)?;
        let name = naming::member(member.name);
        let desc = method_descriptor(member.descriptor)?;
        let signature = desc.to_string();
        let found = self.find(
            owner,
            |declared| declared.method_keys(),
            |key| key.name == name && types::method(key.descriptor).map_or(false, |other| other.to_string() == signature),
        )?;
        match found {
            Found::One(owner, key) => {
                trace!("resolved {}.{}{} on {}", member.class, member.name, member.descriptor, owner.name);
                Ok(MethodRef {
                    owner,
                    name,
                    sig: self.method_sig(&desc, !key.is_static)?,
                })
            }
            Found::Missing => Err(ResolutionError::UnknownMethod {
                class: member.class,
                name: member.name,
                descriptor: member.descriptor,
            }
            .into()),
            Found::Many(count) => Err(ResolutionError::AmbiguousMethod {
                class: member.class,
                name: member.name,
                descriptor: member.descriptor,
                count,
            }
            .into()),
        }
    }

    pub fn field(&self, member: &MemberTriple) -> Result<FieldRef> {
        let owner = self.class(member.class)?;
        let typ = field_descriptor(member.descriptor)?;
        let signature = typ.to_string();
        let found = self.find(
            owner,
            |declared| declared.field_keys(),
            |key| key.name == member.name && types::field(key.descriptor).map_or(false, |other| other.to_string() == signature),
        )?;
        match found {
            Found::One(owner, key) => Ok(FieldRef {
                owner,
                name: member.name,
                sig: self.field_sig(&typ)?,
                is_static: key.is_static,
            }),
            Found::Missing => Err(ResolutionError::UnknownField {
                class: member.class,
                name: member.name,
                descriptor: member.descriptor,
            }
            .into()),
            Found::Many(count) => Err(ResolutionError::AmbiguousField {
                class: member.class,
                name: member.name,
                descriptor: member.descriptor,
                count,
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ir::class::{MethodDef, MethodFlags, TypeDef};
    use matches::assert_matches;

    fn triple(class: &str, name: &str, descriptor: &str) -> MemberTriple {
        MemberTriple {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    fn method_def(name: &str, descriptor: &str) -> MethodDef {
        MethodDef {
            name: name.into(),
            source_name: name.into(),
            descriptor: descriptor.into(),
            flags: MethodFlags::default(),
            sig: MethodSig {
                has_this: true,
                params: Vec::new(),
                ret: TypeSig::Void,
            },
            body: None,
        }
    }

    fn module() -> Module {
        let mut module = Module::new("Test".into());
        let mut def = TypeDef::new("demo/Widget".into(), "demo".into(), "Widget".into());
        def.super_name = Some("java/io/PrintStream".into());
        def.methods.push(method_def("spin", "(I)V"));
        def.methods.push(method_def("twice", "()V"));
        def.methods.push(method_def("twice", "()V"));
        module.register(def);
        module
    }

    #[test]
    fn catalog_wins_over_module() {
        let catalog = Catalog::new();
        let mut module = Module::new("Test".into());
        module.register(TypeDef::new("java/lang/Object".into(), "java.lang".into(), "Object".into()));
        let resolver = Resolver::new(&catalog, &module);
        assert_eq!(resolver.class("java/lang/Object".into()).unwrap().origin, Origin::Shim);
    }

    #[test]
    fn unknown_class_is_named() {
        let catalog = Catalog::new();
        let module = module();
        let resolver = Resolver::new(&catalog, &module);
        let err = resolver.method(&triple("com/acme/Missing", "run", "()V")).unwrap_err();
        assert_matches!(err, Error::Resolution(ResolutionError::UnknownClass(name)) if name == "com/acme/Missing");
    }

    #[test]
    fn resolves_declared_and_inherited_methods() {
        let catalog = Catalog::new();
        let module = module();
        let resolver = Resolver::new(&catalog, &module);
        let spin = resolver.method(&triple("demo/Widget", "spin", "(I)V")).unwrap();
        assert_eq!(spin.owner.origin, Origin::Defined(module.lookup("demo/Widget".into()).unwrap()));
        assert_eq!(spin.sig.params, vec![TypeSig::I32]);
        assert!(spin.sig.has_this);
        let println = resolver.method(&triple("demo/Widget", "println", "(Ljava/lang/String;)V")).unwrap();
        assert_eq!(println.owner.name, "java/io/PrintStream");
        let write = resolver.method(&triple("java/io/PrintStream", "write", "([BII)V")).unwrap();
        assert_eq!(write.owner.name, "java/io/OutputStream");
        let ctor = resolver.method(&triple("java/lang/Object", "<init>", "()V")).unwrap();
        assert_eq!(ctor.name, ".ctor");
    }

    #[test]
    fn signature_must_match_exactly_once() {
        let catalog = Catalog::new();
        let module = module();
        let resolver = Resolver::new(&catalog, &module);
        assert_matches!(
            resolver.method(&triple("demo/Widget", "spin", "(J)V")),
            Err(Error::Resolution(ResolutionError::UnknownMethod { .. }))
        );
        assert_matches!(
            resolver.method(&triple("demo/Widget", "twice", "()V")),
            Err(Error::Resolution(ResolutionError::AmbiguousMethod { count: 2, .. }))
        );
    }

    #[test]
    fn falls_back_to_superinterfaces() {
        let catalog = Catalog::new();
        let mut module = Module::new("Test".into());
        let mut base = TypeDef::new("demo/Named".into(), "demo".into(), "Named".into());
        base.super_name = Some("java/lang/Object".into());
        base.methods.push(method_def("name", "()Ljava/lang/String;"));
        module.register(base);
        let mut derived = TypeDef::new("demo/Labelled".into(), "demo".into(), "Labelled".into());
        derived.super_name = Some("java/lang/Object".into());
        derived.interfaces = vec!["java/lang/Runnable".into(), "demo/Named".into()];
        module.register(derived);
        let mut other = TypeDef::new("demo/Titled".into(), "demo".into(), "Titled".into());
        other.super_name = Some("java/lang/Object".into());
        other.methods.push(method_def("name", "()Ljava/lang/String;"));
        module.register(other);
        let mut both = TypeDef::new("demo/Both".into(), "demo".into(), "Both".into());
        both.super_name = Some("java/lang/Object".into());
        both.interfaces = vec!["demo/Labelled".into(), "demo/Titled".into()];
        module.register(both);

        let resolver = Resolver::new(&catalog, &module);
        let name = resolver.method(&triple("demo/Labelled", "name", "()Ljava/lang/String;")).unwrap();
        assert_eq!(name.owner.name, "demo/Named");
        assert_matches!(
            resolver.method(&triple("demo/Both", "name", "()Ljava/lang/String;")),
            Err(Error::Resolution(ResolutionError::AmbiguousMethod { count: 2, .. }))
        );
        assert_matches!(
            resolver.method(&triple("demo/Labelled", "run", "()V")),
            Err(Error::Resolution(ResolutionError::UnknownMethod { .. }))
        );
    }

    #[test]
    fn resolves_static_shim_field() {
        let catalog = Catalog::new();
        let module = module();
        let resolver = Resolver::new(&catalog, &module);
        let out = resolver.field(&triple("java/lang/System", "out", "Ljava/io/PrintStream;")).unwrap();
        assert!(out.is_static);
        assert_eq!(out.sig, TypeSig::Class(resolver.class("java/io/PrintStream".into()).unwrap()));
        assert_matches!(
            resolver.field(&triple("java/lang/System", "in", "Ljava/io/InputStream;")),
            Err(Error::Resolution(ResolutionError::UnknownField { .. }))
        );
    }

    #[test]
    fn array_class_operands() {
        let catalog = Catalog::new();
        let module = module();
        let resolver = Resolver::new(&catalog, &module);
        assert_eq!(resolver.class_sig("[I".into()).unwrap(), TypeSig::Array(Box::new(TypeSig::I32)));
        assert_matches!(resolver.class_sig("[Q".into()), Err(Error::Format(FormatError::BadDescriptor(_))));
    }
}

use log::{debug, error, warn};
use noak::AccessFlags;
use std::mem;

use crate::error::{FormatError, ResolutionError, Result};
use crate::ir::class::{FieldDef, FieldFlags, Literal, MethodDef, MethodFlags, TypeDef, TypeFlags};
use crate::ir::function::Body;
use crate::ir::module::{Module, TypeId};
use crate::ir::naming;
use crate::ir::shim::Catalog;
use crate::parser::attributes::AttributeList;
use crate::parser::pool::Constant;
use crate::parser::ClassModel;

mod body;
mod locals;
mod resolve;

use self::resolve::{field_descriptor, method_descriptor, Resolver};

pub struct Translator {
    catalog: Catalog,
    module: Module,
    classes: Vec<(TypeId, ClassModel)>,
    isolate: bool,
}

fn type_flags(class: &ClassModel) -> TypeFlags {
    let flags = class.flags;
    let is_static = class.is_static();
    TypeFlags {
        is_public: flags.contains(AccessFlags::PUBLIC),
        is_nested_private: flags.contains(AccessFlags::PRIVATE),
        is_abstract: is_static || flags.contains(AccessFlags::ABSTRACT),
        is_sealed: is_static,
        is_interface: flags.contains(AccessFlags::INTERFACE),
    }
}

fn method_flags(flags: AccessFlags, is_special_name: bool) -> MethodFlags {
    let is_abstract = flags.contains(AccessFlags::ABSTRACT);
    MethodFlags {
        is_public: flags.contains(AccessFlags::PUBLIC),
        is_private: flags.contains(AccessFlags::PRIVATE),
        is_final: flags.contains(AccessFlags::FINAL),
        is_static: flags.contains(AccessFlags::STATIC),
        is_abstract,
        is_virtual: is_abstract,
        is_external: flags.contains(AccessFlags::NATIVE),
        is_special_name,
    }
}

fn field_flags(flags: AccessFlags) -> FieldFlags {
    FieldFlags {
        is_public: flags.contains(AccessFlags::PUBLIC),
        is_private: flags.contains(AccessFlags::PRIVATE),
        is_static: flags.contains(AccessFlags::STATIC),
        is_init_only: flags.contains(AccessFlags::FINAL),
    }
}

fn literal(constant: &Constant) -> Option<Literal> {
    Some(match constant {
        Constant::Integer(value) => Literal::Int(*value),
        Constant::Long(value) => Literal::Long(*value),
        Constant::Float(value) => Literal::Float(*value),
        Constant::Double(value) => Literal::Double(*value),
        Constant::String(value) => Literal::String(*value),
        _ => return None,
    })
}

fn declare_fields(resolver: &Resolver, class: &ClassModel) -> Result<Vec<FieldDef>> {
    let mut fields = Vec::with_capacity(class.fields.len());
    for field in &class.fields {
        fields.push(FieldDef {
            name: field.name,
            descriptor: field.descriptor,
            flags: field_flags(field.flags),
            sig: resolver.field_sig(&*field_descriptor(field.descriptor)?)?,
            constant: field.attributes.constant_value().and_then(literal),
        });
    }
    Ok(fields)
}

fn declare_methods(resolver: &Resolver, class: &ClassModel) -> Result<Vec<MethodDef>> {
    let mut methods = Vec::with_capacity(class.methods.len());
    for method in &class.methods {
        let name = naming::member(method.name);
        let desc = method_descriptor(method.descriptor)?;
        methods.push(MethodDef {
            name,
            source_name: method.name,
            descriptor: method.descriptor,
            flags: method_flags(method.flags, name != method.name),
            sig: resolver.method_sig(&desc, !method.is_static())?,
            body: None,
        });
    }
    Ok(methods)
}

fn translate_bodies(resolver: &Resolver, class: &ClassModel) -> Result<Vec<Option<Body>>> {
    let mut bodies = Vec::with_capacity(class.methods.len());
    for method in &class.methods {
        if method.flags.intersects(AccessFlags::NATIVE | AccessFlags::ABSTRACT) {
            bodies.push(None);
            continue;
        }
        let code = method.attributes.code().ok_or(FormatError::MissingCode {
            class: class.name,
            name: method.name,
            descriptor: method.descriptor,
        })?;
        debug!("translating {}.{}{}", class.name, method.name, method.descriptor);
        bodies.push(Some(body::translate(resolver, &class.pool, method, code)?));
    }
    Ok(bodies)
}

impl Translator {
    pub fn new(name: String, isolate: bool) -> Translator {
        Translator {
            catalog: Catalog::new(),
            module: Module::new(name),
            classes: Vec::new(),
            isolate,
        }
    }

    pub fn translate(mut self, classes: Vec<ClassModel>) -> Result<Module> {
        self.register(classes);
        self.declare()?;
        self.complete()?;
        Ok(self.module)
    }

    fn register(&mut self, classes: Vec<ClassModel>) {
        for class in classes {
            let (namespace, name) = naming::type_name(class.name);
            let mut def = TypeDef::new(class.name, namespace, name);
            def.flags = type_flags(&class);
            def.super_name = class.super_class;
            def.interfaces = class.interfaces.clone();
            match self.module.register(def) {
                Some(id) => self.classes.push((id, class)),
                None => warn!("duplicate class {}, keeping the first definition", class.name),
            }
        }
    }

    fn declare(&mut self) -> Result<()> {
        for (id, class) in &self.classes {
            let (fields, methods) = {
                let resolver = Resolver::new(&self.catalog, &self.module);
                (declare_fields(&resolver, class)?, declare_methods(&resolver, class)?)
            };
            let def = self.module.get_mut(*id);
            def.fields = fields;
            def.methods = methods;
            debug!(
                "declared {} ({} fields, {} methods) from {}",
                class.name,
                def.fields.len(),
                def.methods.len(),
                class.attributes.source_file().unwrap_or_else(|| "unknown source".into())
            );
        }
        Ok(())
    }

    fn attach(&mut self, id: TypeId, class: &ClassModel) -> Result<()> {
        let host = match class.attributes.nest_host() {
            Some(host) => Some(self.module.lookup(host).ok_or(ResolutionError::UnknownClass(host))?),
            None => None,
        };
        self.module.attach(id, host);
        Ok(())
    }

    fn complete_class(&mut self, id: TypeId, class: &ClassModel) -> Result<()> {
        self.attach(id, class)?;
        let (base, bodies) = {
            let resolver = Resolver::new(&self.catalog, &self.module);
            let base = match class.super_class {
                Some(name) => Some(resolver.class(name)?),
                None => None,
            };
            (base, translate_bodies(&resolver, class)?)
        };
        let def = self.module.get_mut(id);
        def.base = base;
        for (method, body) in def.methods.iter_mut().zip(bodies) {
            method.body = body;
        }
        Ok(())
    }

    fn complete(&mut self) -> Result<()> {
        let classes = mem::take(&mut self.classes);
        for (id, class) in &classes {
            if let Err(err) = self.complete_class(*id, class) {
                if !self.isolate {
                    return Err(err);
                }
                error!("leaving {} without bodies: {}", class.name, err);
                let attached = self.module.get(*id).enclosing.is_some() || self.module.top_level.contains(id);
                if !attached {
                    self.module.attach(*id, None);
                }
            }
        }
        Ok(())
    }
}

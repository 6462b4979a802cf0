use std::collections::HashMap;
use ustr::Ustr;

use crate::ir::module::{Declares, MemberKey, MethodRef, MethodSig, Origin, TypeRef, TypeSig};
use crate::ir::naming;

#[derive(Debug)]
pub struct ShimType {
    pub name: Ustr,
    pub super_name: Option<Ustr>,
    pub methods: Vec<MemberKey>,
    pub fields: Vec<MemberKey>,
}

#[derive(Debug)]
pub struct Catalog {
    types: HashMap<Ustr, ShimType>,
}

impl Declares for ShimType {
    fn super_name(&self) -> Option<Ustr> {
        self.super_name
    }

    fn method_keys(&self) -> Vec<MemberKey> {
        self.methods.clone()
    }

    fn field_keys(&self) -> Vec<MemberKey> {
        self.fields.clone()
    }
}

/// Parses `pkg.Class.name:descriptor`.
fn parse_entry(entry: &str) -> Option<(Ustr, Ustr, Ustr)> {
    let (member, desc) = entry.rsplit_once(':')?;
    let (class, name) = member.rsplit_once('.')?;
    Some((class.replace('.', "/").into(), name.into(), desc.into()))
}

impl Catalog {
    pub fn new() -> Catalog {
        let mut types = HashMap::new();
        for (name, super_name) in SHIM_TYPES {
            let name = Ustr::from(*name);
            let shim = ShimType {
                name,
                super_name: (*super_name).map(Ustr::from),
                methods: Vec::new(),
                fields: Vec::new(),
            };
            types.insert(name, shim);
        }
        let tables: [(&[&str], bool, bool); 3] = [
            (INSTANCE_METHODS, true, false),
            (INSTANCE_FIELDS, false, false),
            (STATIC_FIELDS, false, true),
        ];
        for (entries, is_method, is_static) in tables.iter() {
            for (class, name, descriptor) in entries.iter().filter_map(|entry| parse_entry(entry)) {
                if let Some(shim) = types.get_mut(&class) {
                    let key = MemberKey {
                        name: naming::member(name),
                        descriptor,
                        is_static: *is_static,
                    };
                    match *is_method {
                        true => shim.methods.push(key),
                        false => shim.fields.push(key),
                    }
                }
            }
        }
        Catalog { types }
    }

    pub fn get(&self, name: Ustr) -> Option<&ShimType> {
        self.types.get(&name)
    }

    pub fn type_ref(&self, name: Ustr) -> Option<TypeRef> {
        self.types.get(&name).map(|shim| TypeRef {
            name: shim.name,
            origin: Origin::Shim,
        })
    }

    /// Static entry point that wraps a native string literal into a shim string.
    pub fn string_factory(&self) -> MethodRef {
        let owner = TypeRef {
            name: STRING_CLASS.into(),
            origin: Origin::Shim,
        };
        MethodRef {
            owner,
            name: STRING_FACTORY.into(),
            sig: MethodSig {
                has_this: false,
                params: vec![TypeSig::NativeString],
                ret: TypeSig::Class(owner),
            },
        }
    }
}

impl Default for Catalog {
    fn default() -> Catalog {
        Catalog::new()
    }
}

const STRING_CLASS: &str = "java/lang/String";
const STRING_FACTORY: &str = "FromNetString";

const SHIM_TYPES: &[(&str, Option<&str>)] = &[
    ("java/lang/Object", None),
    ("java/lang/String", Some("java/lang/Object")),
    ("java/lang/System", Some("java/lang/Object")),
    ("java/util/stream/IntStream", Some("java/lang/Object")),
    ("java/io/OutputStream", Some("java/lang/Object")),
    ("java/io/FilterOutputStream", Some("java/io/OutputStream")),
    ("java/io/PrintStream", Some("java/io/FilterOutputStream")),
];

const INSTANCE_METHODS: &[&str] = &[
    "java.lang.Object.<init>:()V",
    "java.lang.Object.clone:()Ljava/lang/Object;",
    "java.lang.Object.equals:(Ljava/lang/Object;)Z",
    "java.lang.Object.finalize:()V",
    "java.lang.String.toUpperCase:()Ljava/lang/String;",
    "java.lang.String.toLowerCase:()Ljava/lang/String;",
    "java.lang.String.toCharArray:()[C",
    "java.lang.String.codePoints:()Ljava/util/stream/IntStream;",
    "java.util.stream.IntStream.toArray:()[I",
    "java.util.stream.IntStream.count:()J",
    "java.io.OutputStream.<init>:()V",
    "java.io.OutputStream.write:(I)V",
    "java.io.OutputStream.write:([B)V",
    "java.io.OutputStream.write:([BII)V",
    "java.io.OutputStream.flush:()V",
    "java.io.OutputStream.close:()V",
    "java.io.FilterOutputStream.<init>:(Ljava/io/OutputStream;)V",
    "java.io.FilterOutputStream.write:(I)V",
    "java.io.FilterOutputStream.flush:()V",
    "java.io.FilterOutputStream.close:()V",
    "java.io.PrintStream.<init>:(Ljava/io/OutputStream;)V",
    "java.io.PrintStream.print:(Ljava/lang/String;)V",
    "java.io.PrintStream.print:(I)V",
    "java.io.PrintStream.println:(Ljava/lang/String;)V",
    "java.io.PrintStream.println:(I)V",
    "java.io.PrintStream.println:()V",
];

const INSTANCE_FIELDS: &[&str] = &["java.io.FilterOutputStream.out:Ljava/io/OutputStream;"];

const STATIC_FIELDS: &[&str] = &[
    "java.lang.System.out:Ljava/io/PrintStream;",
    "java.lang.System.err:Ljava/io/PrintStream;",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_lands_on_a_type() {
        let catalog = Catalog::new();
        let methods: usize = catalog.types.values().map(|shim| shim.methods.len()).sum();
        let fields: usize = catalog.types.values().map(|shim| shim.fields.len()).sum();
        assert_eq!(methods, INSTANCE_METHODS.len());
        assert_eq!(fields, INSTANCE_FIELDS.len() + STATIC_FIELDS.len());
    }

    #[test]
    fn constructors_use_target_names() {
        let catalog = Catalog::new();
        let object = catalog.get("java/lang/Object".into()).unwrap();
        assert!(object.methods.iter().any(|key| key.name == ".ctor" && key.descriptor == "()V"));
        assert_eq!(object.super_name, None);
        let system = catalog.get("java/lang/System".into()).unwrap();
        assert!(system.fields.iter().all(|key| key.is_static));
    }

    #[test]
    fn string_factory_takes_native_string() {
        let factory = Catalog::new().string_factory();
        assert_eq!(factory.owner.name, "java/lang/String");
        assert_eq!(factory.sig.params, vec![TypeSig::NativeString]);
        assert!(!factory.sig.has_this);
    }
}

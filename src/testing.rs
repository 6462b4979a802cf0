use noak::AccessFlags;
use std::collections::HashMap;

#[derive(Default)]
pub struct PoolBuilder {
    bytes: Vec<u8>,
    count: u16,
    utf8: HashMap<String, u16>,
}

fn be16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

impl PoolBuilder {
    fn push(&mut self, entry: &[u8], slots: u16) -> u16 {
        let index = self.count + 1;
        self.bytes.extend_from_slice(entry);
        self.count += slots;
        index
    }

    fn pair(&mut self, tag: u8, first: u16, second: u16) -> u16 {
        let mut entry = vec![tag];
        be16(&mut entry, first);
        be16(&mut entry, second);
        self.push(&entry, 1)
    }

    pub fn raw(&mut self, entry: &[u8]) -> u16 {
        self.push(entry, 1)
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        if let Some(index) = self.utf8.get(text) {
            return *index;
        }
        let mut entry = vec![1];
        be16(&mut entry, text.len() as u16);
        entry.extend_from_slice(text.as_bytes());
        let index = self.push(&entry, 1);
        self.utf8.insert(text.to_owned(), index);
        index
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![3];
        entry.extend_from_slice(&value.to_be_bytes());
        self.push(&entry, 1)
    }

    pub fn float(&mut self, value: f32) -> u16 {
        let mut entry = vec![4];
        entry.extend_from_slice(&value.to_be_bytes());
        self.push(&entry, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut entry = vec![5];
        entry.extend_from_slice(&value.to_be_bytes());
        self.push(&entry, 2)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        let mut entry = vec![6];
        entry.extend_from_slice(&value.to_be_bytes());
        self.push(&entry, 2)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        let mut entry = vec![7];
        be16(&mut entry, name);
        self.push(&entry, 1)
    }

    pub fn string(&mut self, text: &str) -> u16 {
        let text = self.utf8(text);
        let mut entry = vec![8];
        be16(&mut entry, text);
        self.push(&entry, 1)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.pair(12, name, descriptor)
    }

    fn member(&mut self, tag: u8, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let name_and_type = self.name_and_type(name, descriptor);
        self.pair(tag, class, name_and_type)
    }

    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member(9, class, name, descriptor)
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member(10, class, name, descriptor)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        be16(&mut out, self.count + 1);
        out.extend_from_slice(&self.bytes);
        out
    }
}

pub struct Handler<'a> {
    pub start: u16,
    pub end: u16,
    pub handler: u16,
    pub catch_class: Option<&'a str>,
}

/// Assembles a complete class file around a `PoolBuilder`.
pub struct ClassBuilder {
    pub pool: PoolBuilder,
    flags: AccessFlags,
    this: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

fn list(out: &mut Vec<u8>, items: &[Vec<u8>]) {
    be16(out, items.len() as u16);
    for item in items {
        out.extend_from_slice(item);
    }
}

impl ClassBuilder {
    pub fn new(name: &str, super_name: Option<&str>, flags: AccessFlags) -> ClassBuilder {
        let mut pool = PoolBuilder::default();
        let this = pool.class(name);
        let super_class = super_name.map_or(0, |name| pool.class(name));
        ClassBuilder {
            pool,
            flags,
            this,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    fn member(&mut self, flags: AccessFlags, name: &str, descriptor: &str, attributes: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        be16(&mut out, flags.bits());
        be16(&mut out, self.pool.utf8(name));
        be16(&mut out, self.pool.utf8(descriptor));
        list(&mut out, attributes);
        out
    }

    pub fn interface(&mut self, name: &str) {
        let index = self.pool.class(name);
        self.interfaces.push(index);
    }

    pub fn field(&mut self, flags: AccessFlags, name: &str, descriptor: &str, attributes: &[Vec<u8>]) {
        let field = self.member(flags, name, descriptor, attributes);
        self.fields.push(field);
    }

    pub fn method(&mut self, flags: AccessFlags, name: &str, descriptor: &str, attributes: &[Vec<u8>]) {
        let method = self.member(flags, name, descriptor, attributes);
        self.methods.push(method);
    }

    pub fn class_attribute(&mut self, attribute: Vec<u8>) {
        self.attributes.push(attribute);
    }

    pub fn attribute(&mut self, name: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        be16(&mut out, self.pool.utf8(name));
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    pub fn code(&mut self, max_locals: u16, code: &[u8], handlers: &[Handler], attributes: &[Vec<u8>]) -> Vec<u8> {
        let mut payload = Vec::new();
        be16(&mut payload, 8);
        be16(&mut payload, max_locals);
        payload.extend_from_slice(&(code.len() as u32).to_be_bytes());
        payload.extend_from_slice(code);
        be16(&mut payload, handlers.len() as u16);
        for handler in handlers {
            be16(&mut payload, handler.start);
            be16(&mut payload, handler.end);
            be16(&mut payload, handler.handler);
            let catch = handler.catch_class.map_or(0, |name| self.pool.class(name));
            be16(&mut payload, catch);
        }
        list(&mut payload, attributes);
        self.attribute("Code", &payload)
    }

    /// Entries are `(start, length, name, descriptor, slot)`.
    pub fn local_variables(&mut self, vars: &[(u16, u16, &str, &str, u16)]) -> Vec<u8> {
        let mut payload = Vec::new();
        be16(&mut payload, vars.len() as u16);
        for &(start, length, name, descriptor, slot) in vars {
            be16(&mut payload, start);
            be16(&mut payload, length);
            be16(&mut payload, self.pool.utf8(name));
            be16(&mut payload, self.pool.utf8(descriptor));
            be16(&mut payload, slot);
        }
        self.attribute("LocalVariableTable", &payload)
    }

    pub fn nest_host(&mut self, host: &str) -> Vec<u8> {
        let index = self.pool.class(host);
        self.attribute("NestHost", &index.to_be_bytes())
    }

    pub fn constant_value(&mut self, index: u16) -> Vec<u8> {
        self.attribute("ConstantValue", &index.to_be_bytes())
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
        out.extend_from_slice(&self.pool.build());
        be16(&mut out, self.flags.bits());
        be16(&mut out, self.this);
        be16(&mut out, self.super_class);
        be16(&mut out, self.interfaces.len() as u16);
        for index in &self.interfaces {
            be16(&mut out, *index);
        }
        list(&mut out, &self.fields);
        list(&mut out, &self.methods);
        list(&mut out, &self.attributes);
        out
    }
}

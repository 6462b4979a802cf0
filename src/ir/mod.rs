pub mod class;
pub mod function;
pub mod module;
pub mod naming;
pub mod shim;

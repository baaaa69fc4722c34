pub mod codegen;
pub mod design;

pub use codegen::{Codegen, CodegenError, VerilogCodegen};
pub use design::{
	AttrValue, AttributeError, Attributes, BitRange, Design, DesignError, IdString, Module, ModuleId, ModuleNameConflictError,
	NetNameConflictError, Port, PortDirection, Wire,
};

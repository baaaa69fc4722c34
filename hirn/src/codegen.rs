pub mod verilog_codegen;

pub use verilog_codegen::VerilogCodegen;

use crate::ModuleId;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Error, Debug)]
pub enum CodegenError {
	#[error(transparent)]
	FormatError(#[from] fmt::Error),

	#[error("Invalid module ID")]
	InvalidModuleId(ModuleId),
}

pub trait Codegen {
	/// Emits a single module
	fn emit_module(&mut self, module: ModuleId) -> Result<(), CodegenError>;

	/// Emits every module of the design, in design order
	fn emit_design(&mut self) -> Result<(), CodegenError>;
}

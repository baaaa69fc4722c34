use hirn::{Codegen, CodegenError, Design, VerilogCodegen};
use log::debug;
use miette::Diagnostic;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use verilog::{parse_design, ParseError};

#[derive(Debug, Error, Diagnostic)]
pub enum FrontendError {
	#[error("cannot access {}", .path.display())]
	#[diagnostic(code(techmap::frontend::io))]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("cannot generate Verilog")]
	#[diagnostic(code(techmap::frontend::codegen))]
	Codegen(#[from] CodegenError),

	#[error("cannot parse {}", .path.display())]
	#[diagnostic(code(techmap::frontend::parse))]
	Parse {
		path: PathBuf,
		#[source]
		source: ParseError,
	},
}

/// Moves designs between memory and files
pub trait DesignIo {
	fn write_design(&self, design: &Design, path: &Path) -> Result<(), FrontendError>;
	fn read_design(&self, path: &Path) -> Result<Design, FrontendError>;
}

/// Reads and writes designs as Verilog source
#[derive(Clone, Copy, Debug, Default)]
pub struct VerilogIo;

impl DesignIo for VerilogIo {
	fn write_design(&self, design: &Design, path: &Path) -> Result<(), FrontendError> {
		let mut source = String::new();
		VerilogCodegen::new(design, &mut source).emit_design()?;
		debug!("Writing {} modules to {}", design.len(), path.display());
		fs::write(path, source).map_err(|source| FrontendError::Io {
			path: path.into(),
			source,
		})
	}

	fn read_design(&self, path: &Path) -> Result<Design, FrontendError> {
		let source = fs::read_to_string(path).map_err(|source| FrontendError::Io {
			path: path.into(),
			source,
		})?;
		parse_design(&source).map_err(|source| FrontendError::Parse {
			path: path.into(),
			source,
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use hirn::{IdString, Port};
	use tempfile::NamedTempFile;

	#[test]
	fn test_write_then_read() -> Result<(), Box<dyn std::error::Error>> {
		let mut design = Design::new();
		design.new_module("inv")?.add_port(Port::input("a", 1)?)?;
		let m = design.new_module("buf")?;
		m.add_port(Port::input("a", 4)?.flag("data"))?;
		m.add_port(Port::output("y", 4)?)?;
		m.add_statement("assign y = a;");

		let file = NamedTempFile::new()?;
		VerilogIo.write_design(&design, file.path())?;
		let read = VerilogIo.read_design(file.path())?;

		assert_eq!(read.module_names(), design.module_names());
		let buf = read.module(&IdString::new("buf")?).expect("module expected");
		assert!(buf.ports()[0].attributes.get_bool("data"));
		assert_eq!(buf.statements(), ["assign y = a;"]);
		Ok(())
	}

	#[test]
	fn test_read_errors() -> Result<(), io::Error> {
		let missing = VerilogIo.read_design(Path::new("/nonexistent/out.v"));
		assert!(matches!(missing, Err(FrontendError::Io { .. })));

		let file = NamedTempFile::new()?;
		fs::write(file.path(), "module broken(")?;
		let broken = VerilogIo.read_design(file.path());
		assert!(matches!(broken, Err(FrontendError::Parse { .. })));
		Ok(())
	}
}

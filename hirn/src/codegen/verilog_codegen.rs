use crate::codegen::{Codegen, CodegenError};
use crate::design::{is_simple_identifier, Attributes, BitRange, Design, IdString, ModuleId, PortDirection};
use itertools::Itertools;
use log::debug;
use std::fmt;

/// Emits modules as plain (non-ANSI) Verilog-2001
pub struct VerilogCodegen<'a> {
	design: &'a Design,
	indent_level: u32,
	output_stream: &'a mut dyn fmt::Write,
}

macro_rules! emitln {
	($self:ident, $($arg:tt)*) => {
		writeln!($self.output_stream, "{}{}", "\t".repeat($self.indent_level as usize), format!($($arg)*))
	}
}

/// Formats an identifier, escaping it if it is not a simple Verilog name
fn format_id(id: &IdString) -> String {
	let name = id.unescaped();
	if is_simple_identifier(name) {
		name.into()
	}
	else {
		format!("\\{} ", name)
	}
}

fn format_range(range: Option<BitRange>) -> String {
	match range {
		None => String::new(),
		Some(r) => format!(" [{}:{}]", r.msb(), r.lsb()),
	}
}

fn format_net_type(is_reg: bool, signed: bool) -> String {
	let mut s = String::new();
	if is_reg {
		s.push_str(" reg");
	}
	if signed {
		s.push_str(" signed");
	}
	s
}

impl<'a> VerilogCodegen<'a> {
	pub fn new(design: &'a Design, w: &'a mut dyn fmt::Write) -> Self {
		Self {
			design,
			indent_level: 0,
			output_stream: w,
		}
	}

	fn begin_indent(&mut self) {
		self.indent_level += 1;
	}

	fn end_indent(&mut self) {
		assert!(self.indent_level > 0);
		self.indent_level -= 1;
	}

	fn emit_attributes(&mut self, attributes: &Attributes) -> Result<(), CodegenError> {
		if attributes.is_empty() {
			return Ok(());
		}

		let list = attributes
			.iter()
			.map(|(key, value)| format!("{} = {}", key, value))
			.join(", ");
		emitln!(self, "(* {} *)", list)?;
		Ok(())
	}
}

impl<'a> Codegen for VerilogCodegen<'a> {
	fn emit_module(&mut self, module: ModuleId) -> Result<(), CodegenError> {
		let design = self.design;
		let m = design.get_module(module).ok_or(CodegenError::InvalidModuleId(module))?;
		debug!("Emitting module {}", m.name());

		self.emit_attributes(&m.attributes)?;
		let port_list = m.ports().iter().map(|p| format_id(&p.name)).join(", ");
		emitln!(self, "module {}({});", format_id(m.name()), port_list)?;
		self.begin_indent();

		for port in m.ports() {
			use PortDirection::*;
			let direction_str = match port.direction {
				Input => "input",
				Output => "output",
				Inout => "inout",
			};

			self.emit_attributes(&port.attributes)?;
			emitln!(
				self,
				"{}{}{} {};",
				direction_str,
				format_net_type(port.is_reg, port.signed),
				format_range(port.range),
				format_id(&port.name)
			)?;
		}

		for wire in m.wires() {
			let net_str = match wire.is_reg {
				true => format!("reg{}", format_net_type(false, wire.signed)),
				false => format!("wire{}", format_net_type(false, wire.signed)),
			};

			self.emit_attributes(&wire.attributes)?;
			emitln!(self, "{}{} {};", net_str, format_range(wire.range), format_id(&wire.name))?;
		}

		for statement in m.statements() {
			emitln!(self, "{}", statement)?;
		}

		self.end_indent();
		emitln!(self, "endmodule")?;
		Ok(())
	}

	fn emit_design(&mut self) -> Result<(), CodegenError> {
		let ids: Vec<ModuleId> = self.design.modules().map(|m| m.id()).collect();
		for (n, id) in ids.into_iter().enumerate() {
			if n > 0 {
				emitln!(self, "")?;
			}
			self.emit_module(id)?;
		}
		Ok(())
	}
}

//! Port role classification.
//!
//! A module opts into technology mapping through attributes. The module
//! itself names the target (`template`, `architecture`,
//! `initiation_interval`), and its ports are marked with their role:
//!
//! ```verilog
//! (* template = "add", architecture = "xilinx", initiation_interval = 0 *)
//! module adder(clk, a, b, sum);
//! 	(* clk *) input clk;
//! 	(* data *) input [7:0] a;
//! 	(* data *) input [7:0] b;
//! 	(* out *) output [7:0] sum;
//! endmodule
//! ```
use hirn::{AttributeError, Module, Port};
use itertools::Itertools;
use log::debug;
use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

pub const TEMPLATE_ATTR: &str = "template";
pub const ARCHITECTURE_ATTR: &str = "architecture";
pub const INITIATION_INTERVAL_ATTR: &str = "initiation_interval";

/// Role a port plays in the mapped module
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortRole {
	Clock,
	Data,
	Output,
}

impl PortRole {
	/// Attribute marking a port with this role
	pub fn marker(self) -> &'static str {
		match self {
			PortRole::Clock => "clk",
			PortRole::Data => "data",
			PortRole::Output => "out",
		}
	}

	/// Checks whether the port carries this role's marker
	pub fn is_marked(self, port: &Port) -> bool {
		port.attributes.get_bool(self.marker())
	}
}

impl fmt::Display for PortRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			PortRole::Clock => "clock",
			PortRole::Data => "data",
			PortRole::Output => "output",
		};
		write!(f, "{}", name)
	}
}

/// Unqualified port name and its width, as the oracle expects them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortSpec {
	pub name: String,
	pub width: u32,
}

impl PortSpec {
	pub fn new(name: &str, width: u32) -> Self {
		Self {
			name: name.into(),
			width,
		}
	}
}

impl From<&Port> for PortSpec {
	fn from(port: &Port) -> Self {
		Self::new(port.name.unescaped(), port.width())
	}
}

impl fmt::Display for PortSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.name, self.width)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
	pub clock: PortSpec,

	/// Data inputs in declaration order
	pub data: Vec<PortSpec>,
	pub output: PortSpec,
	pub architecture: String,
	pub template: String,

	/// `None` for modules which are not pipelined (marker value 0)
	pub initiation_interval: Option<u64>,
}

#[derive(Clone, Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ClassifyError {
	#[error(transparent)]
	#[diagnostic(
		code(techmap::classify::attribute),
		help("Modules need string `template` and `architecture` attributes and an integer `initiation_interval`")
	)]
	Attribute(#[from] AttributeError),

	#[error("initiation interval must not be negative, got {0}")]
	#[diagnostic(code(techmap::classify::initiation_interval))]
	NegativeInitiationInterval(i64),

	#[error("expected exactly one {role} port, found {found}")]
	#[diagnostic(
		code(techmap::classify::port_count),
		help("Mark exactly one port with (* clk *) and exactly one with (* out *)")
	)]
	PortCount { role: PortRole, found: usize },
}

fn exactly_one(role: PortRole, ports: Vec<PortSpec>) -> Result<PortSpec, ClassifyError> {
	let found = ports.len();
	ports
		.into_iter()
		.exactly_one()
		.map_err(|_| ClassifyError::PortCount { role, found })
}

/// Derives the mapping parameters of a module from its attributes.
///
/// Ports are visited in declaration order and each marker is checked
/// independently, so a port may play more than one role.
pub fn classify(module: &Module) -> Result<Classification, ClassifyError> {
	let attributes = &module.attributes;
	let template = attributes.require_string(TEMPLATE_ATTR)?.to_owned();
	let architecture = attributes.require_string(ARCHITECTURE_ATTR)?.to_owned();
	let initiation_interval = match attributes.require_int(INITIATION_INTERVAL_ATTR)? {
		n if n < 0 => return Err(ClassifyError::NegativeInitiationInterval(n)),
		0 => None,
		n => Some(n.unsigned_abs()),
	};

	let ports_with = |role: PortRole| -> Vec<PortSpec> {
		module
			.ports()
			.iter()
			.filter(|p| role.is_marked(p))
			.map(PortSpec::from)
			.collect()
	};

	let clock = exactly_one(PortRole::Clock, ports_with(PortRole::Clock))?;
	let output = exactly_one(PortRole::Output, ports_with(PortRole::Output))?;
	let data = ports_with(PortRole::Data);

	debug!(
		"Module {}: clock {}, output {}, data [{}]",
		module.name(),
		clock,
		output,
		data.iter().join(", ")
	);

	Ok(Classification {
		clock,
		data,
		output,
		architecture,
		template,
		initiation_interval,
	})
}

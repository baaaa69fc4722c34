use super::{Attributes, AttrValue, DesignError, IdString, ModuleId, NetNameConflictError};

/// Specifies direction for ports in module interface
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PortDirection {
	/// Input port (from the perspective of the module)
	Input,

	/// Output port (from the perspective of the module)
	Output,

	/// Bidirectional port
	Inout,
}

/// Bit range of a vector net, kept as declared (`[msb:lsb]`)
///
/// Both ascending (`[0:7]`) and offset (`[8:1]`) ranges are preserved so
/// that re-emitted modules index their nets the same way.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BitRange {
	msb: u64,
	lsb: u64,
}

impl BitRange {
	/// Creates a range, rejecting ones whose width does not fit in `u32`
	pub fn new(msb: u64, lsb: u64) -> Result<Self, DesignError> {
		msb.abs_diff(lsb)
			.checked_add(1)
			.and_then(|w| u32::try_from(w).ok())
			.ok_or(DesignError::InvalidRange { msb, lsb })?;
		Ok(Self { msb, lsb })
	}

	/// Conventional `[width-1:0]` range
	pub fn from_width(width: u32) -> Result<Self, DesignError> {
		match width {
			0 => Err(DesignError::InvalidWidth(width)),
			w => Ok(Self {
				msb: u64::from(w) - 1,
				lsb: 0,
			}),
		}
	}

	pub fn msb(&self) -> u64 {
		self.msb
	}

	pub fn lsb(&self) -> u64 {
		self.lsb
	}

	pub fn width(&self) -> u32 {
		// Checked in the constructor
		(self.msb.abs_diff(self.lsb) + 1) as u32
	}
}

/// Range for a declared width. Single bits are scalars.
fn range_for_width(width: u32) -> Result<Option<BitRange>, DesignError> {
	match width {
		1 => Ok(None),
		w => BitRange::from_width(w).map(Some),
	}
}

/// A port exposed in a module interface
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Port {
	pub name: IdString,
	pub direction: PortDirection,

	/// Declared range, `None` for scalar ports
	pub range: Option<BitRange>,

	pub signed: bool,

	/// Declared as `reg` (driven from procedural code)
	pub is_reg: bool,

	/// Role markers and other metadata
	pub attributes: Attributes,
}

impl Port {
	/// Creates a new port with a `[width-1:0]` range
	pub fn new(name: &str, direction: PortDirection, width: u32) -> Result<Self, DesignError> {
		Ok(Self {
			name: IdString::new(name)?,
			direction,
			range: range_for_width(width)?,
			signed: false,
			is_reg: false,
			attributes: Attributes::new(),
		})
	}

	pub fn input(name: &str, width: u32) -> Result<Self, DesignError> {
		Self::new(name, PortDirection::Input, width)
	}

	pub fn output(name: &str, width: u32) -> Result<Self, DesignError> {
		Self::new(name, PortDirection::Output, width)
	}

	/// Replaces the declared range
	pub fn with_range(mut self, range: Option<BitRange>) -> Self {
		self.range = range;
		self
	}

	/// Bit width (always positive)
	pub fn width(&self) -> u32 {
		self.range.map_or(1, |r| r.width())
	}

	/// Attaches a presence-only marker
	pub fn flag(mut self, key: &str) -> Self {
		self.attributes.set_flag(key);
		self
	}

	/// Attaches a marker with a value
	pub fn attribute(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
		self.attributes.set(key, value);
		self
	}

	pub fn signed(mut self) -> Self {
		self.signed = true;
		self
	}

	pub fn reg(mut self) -> Self {
		self.is_reg = true;
		self
	}
}

/// Internal net of a module. Opaque to everything but the code generator.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Wire {
	pub name: IdString,
	pub range: Option<BitRange>,
	pub signed: bool,
	pub is_reg: bool,
	pub attributes: Attributes,
}

impl Wire {
	pub fn new(name: &str, width: u32) -> Result<Self, DesignError> {
		Ok(Self {
			name: IdString::new(name)?,
			range: range_for_width(width)?,
			signed: false,
			is_reg: false,
			attributes: Attributes::new(),
		})
	}

	pub fn width(&self) -> u32 {
		self.range.map_or(1, |r| r.width())
	}
}

/// Represents a hardware module
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Module {
	/// Self-reference, assigned when the module is added to a design
	pub(super) id: ModuleId,

	/// Name of the module
	name: IdString,

	/// Ports in declaration order
	ports: Vec<Port>,

	/// Internal nets
	wires: Vec<Wire>,

	/// Module items kept verbatim (assignments, processes, instances...)
	statements: Vec<String>,

	/// Module-level markers
	pub attributes: Attributes,
}

impl Module {
	/// Creates a new module which is not yet part of any design
	pub fn new(name: &str) -> Result<Self, DesignError> {
		Ok(Self {
			id: ModuleId::null(),
			name: IdString::new(name)?,
			ports: vec![],
			wires: vec![],
			statements: vec![],
			attributes: Attributes::new(),
		})
	}

	/// ID of the module in its design (null if not in a design)
	pub fn id(&self) -> ModuleId {
		self.id
	}

	pub fn name(&self) -> &IdString {
		&self.name
	}

	pub(super) fn set_name(&mut self, name: IdString) {
		self.name = name;
	}

	pub fn ports(&self) -> &[Port] {
		&self.ports
	}

	pub fn port(&self, name: &IdString) -> Option<&Port> {
		self.ports.iter().find(|p| &p.name == name)
	}

	pub fn port_mut(&mut self, name: &IdString) -> Option<&mut Port> {
		self.ports.iter_mut().find(|p| &p.name == name)
	}

	pub fn wires(&self) -> &[Wire] {
		&self.wires
	}

	pub fn statements(&self) -> &[String] {
		&self.statements
	}

	fn check_net_name(&self, name: &IdString) -> Result<(), DesignError> {
		let taken = self.ports.iter().any(|p| &p.name == name) || self.wires.iter().any(|w| &w.name == name);
		if taken {
			return Err(NetNameConflictError {
				module: self.name.clone(),
				net: name.clone(),
			}
			.into());
		}
		Ok(())
	}

	/// Appends a port to the module interface. Returns the port index.
	pub fn add_port(&mut self, port: Port) -> Result<usize, DesignError> {
		self.check_net_name(&port.name)?;
		self.ports.push(port);
		Ok(self.ports.len() - 1)
	}

	/// Adds an internal net
	pub fn add_wire(&mut self, wire: Wire) -> Result<(), DesignError> {
		self.check_net_name(&wire.name)?;
		self.wires.push(wire);
		Ok(())
	}

	/// Adds a module item that is carried through unchanged
	pub fn add_statement(&mut self, statement: &str) {
		self.statements.push(statement.into());
	}

	/// Builder-style helper for attaching module markers
	pub fn with_attribute(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
		self.attributes.set(key, value);
		self
	}

	/// Builder-style helper for adding ports
	pub fn with_port(mut self, port: Port) -> Result<Self, DesignError> {
		self.add_port(port)?;
		Ok(self)
	}
}

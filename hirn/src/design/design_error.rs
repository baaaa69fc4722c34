use thiserror::Error;

use super::{IdString, ModuleId};

#[derive(Clone, Debug)]
pub struct ModuleNameConflictError {
	pub name: IdString,
	pub existing: ModuleId,
}

#[derive(Clone, Debug)]
pub struct NetNameConflictError {
	pub module: IdString,
	pub net: IdString,
}

impl From<ModuleNameConflictError> for DesignError {
	fn from(err: ModuleNameConflictError) -> Self {
		Self::ModuleNameConflict(Box::new(err))
	}
}

impl From<NetNameConflictError> for DesignError {
	fn from(err: NetNameConflictError) -> Self {
		Self::NetNameConflict(Box::new(err))
	}
}

/// Represents an error that can occur while building or mutating a design.
#[derive(Clone, Debug, Error)]
pub enum DesignError {
	#[error("Invalid name `{0}`")]
	InvalidName(String),

	#[error("Invalid bit width {0} (must be positive)")]
	InvalidWidth(u32),

	#[error("Invalid bit range [{msb}:{lsb}] (too wide)")]
	InvalidRange { msb: u64, lsb: u64 },

	#[error("No module named `{0}` in design")]
	UnknownModule(IdString),

	#[error("Module name conflict: `{}` already exists", .0.name)]
	ModuleNameConflict(Box<ModuleNameConflictError>),

	#[error("Name conflict: `{}` declared twice in module `{}`", .0.net, .0.module)]
	NetNameConflict(Box<NetNameConflictError>),
}

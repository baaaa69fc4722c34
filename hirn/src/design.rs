pub mod attributes;
pub mod design_error;
pub mod id_string;
pub mod module;
mod utils;

pub use attributes::{AttrValue, AttributeError, Attributes};
pub use design_error::{DesignError, ModuleNameConflictError, NetNameConflictError};
pub use id_string::IdString;
pub use module::{BitRange, Module, Port, PortDirection, Wire};
pub(crate) use utils::is_simple_identifier;

use bimap::BiHashMap;
use log::debug;
use std::collections::BTreeMap;

/// References a module in a design
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ModuleId {
	id: usize,
}

impl ModuleId {
	pub(super) fn null() -> Self {
		Self { id: 0 }
	}

	/// Checks if the reference is valid
	pub fn is_null(&self) -> bool {
		self.id == 0
	}
}

/// Represents a hardware design - a collection of uniquely named modules.
///
/// Module IDs are never reused, so iterating over the design always yields
/// modules in the order they were added.
#[derive(Clone, Debug, Default)]
pub struct Design {
	modules: BTreeMap<ModuleId, Module>,
	names: BiHashMap<IdString, ModuleId>,
	next_module_id: usize,
}

impl Design {
	/// Creates a new empty design
	pub fn new() -> Self {
		Self {
			modules: BTreeMap::new(),
			names: BiHashMap::new(),
			next_module_id: 1,
		}
	}

	fn check_name_free(&self, name: &IdString) -> Result<(), DesignError> {
		match self.names.get_by_left(name) {
			Some(existing) => Err(ModuleNameConflictError {
				name: name.clone(),
				existing: *existing,
			}
			.into()),
			None => Ok(()),
		}
	}

	fn insert_module(&mut self, mut module: Module) -> Result<&mut Module, DesignError> {
		self.check_name_free(module.name())?;

		// Default-constructed designs start counting at 0
		let id = ModuleId {
			id: self.next_module_id.max(1),
		};
		self.next_module_id = id.id + 1;

		module.id = id;
		self.names.insert(module.name().clone(), id);
		Ok(self.modules.entry(id).or_insert(module))
	}

	/// Adds an existing module to the design
	///
	/// Performs check for conflicting module names.
	pub fn add_module(&mut self, module: Module) -> Result<ModuleId, DesignError> {
		Ok(self.insert_module(module)?.id())
	}

	/// Creates a new empty module in the design
	pub fn new_module(&mut self, name: &str) -> Result<&mut Module, DesignError> {
		self.insert_module(Module::new(name)?)
	}

	pub fn module_id(&self, name: &IdString) -> Option<ModuleId> {
		self.names.get_by_left(name).copied()
	}

	pub fn module(&self, name: &IdString) -> Option<&Module> {
		self.module_id(name).and_then(|id| self.modules.get(&id))
	}

	pub fn module_mut(&mut self, name: &IdString) -> Option<&mut Module> {
		let id = self.module_id(name)?;
		self.modules.get_mut(&id)
	}

	pub fn get_module(&self, id: ModuleId) -> Option<&Module> {
		self.modules.get(&id)
	}

	pub fn contains(&self, name: &IdString) -> bool {
		self.names.contains_left(name)
	}

	pub fn modules(&self) -> impl Iterator<Item = &Module> {
		self.modules.values()
	}

	/// Returns names of all modules currently in the design.
	/// The returned list is detached from the design.
	pub fn module_names(&self) -> Vec<IdString> {
		self.modules.values().map(|m| m.name().clone()).collect()
	}

	pub fn len(&self) -> usize {
		self.modules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.modules.is_empty()
	}

	/// Removes a module from the design and returns it
	pub fn remove_module(&mut self, name: &IdString) -> Result<Module, DesignError> {
		let (_, id) = self
			.names
			.remove_by_left(name)
			.ok_or_else(|| DesignError::UnknownModule(name.clone()))?;
		debug!("Removing module {}", name);

		let mut module = self.modules.remove(&id).ok_or_else(|| DesignError::UnknownModule(name.clone()))?;
		module.id = ModuleId::null();
		Ok(module)
	}

	/// Gives a module a new name. Fails if the new name is already taken.
	pub fn rename_module(&mut self, name: &IdString, new_name: IdString) -> Result<(), DesignError> {
		let id = self.module_id(name).ok_or_else(|| DesignError::UnknownModule(name.clone()))?;
		if name == &new_name {
			return Ok(());
		}
		self.check_name_free(&new_name)?;
		debug!("Renaming module {} to {}", name, new_name);

		self.names.remove_by_right(&id);
		self.names.insert(new_name.clone(), id);
		if let Some(m) = self.modules.get_mut(&id) {
			m.set_name(new_name);
		}
		Ok(())
	}

	/// Moves all modules of `other` into this design.
	///
	/// Either all modules are added or, on a name conflict, none is.
	/// Returns names of the added modules.
	pub fn merge(&mut self, other: Design) -> Result<Vec<IdString>, DesignError> {
		for m in other.modules() {
			self.check_name_free(m.name())?;
		}

		let mut added = vec![];
		for (_, m) in other.modules {
			added.push(m.name().clone());
			self.add_module(m)?;
		}
		Ok(added)
	}

	/// Returns `base` or, if it is taken, the first `base_N` (N = 1, 2, ...) not present in the design
	pub fn unused_name(&self, base: &IdString) -> IdString {
		if !self.contains(base) {
			return base.clone();
		}

		let mut n = 1;
		loop {
			let name = base.with_suffix(&format!("_{}", n));
			if !self.contains(&name) {
				return name;
			}
			n += 1;
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn id(name: &str) -> IdString {
		IdString::new(name).unwrap()
	}

	/// Verifies if the design enforces unique module names
	#[test]
	fn test_unique_module_names() -> Result<(), DesignError> {
		let mut d = Design::new();
		d.new_module("name")?;
		let m2 = d.new_module("name");

		assert!(matches!(m2, Err(DesignError::ModuleNameConflict { .. })));
		Ok(())
	}

	#[test]
	fn test_module_lookup() -> Result<(), DesignError> {
		let mut d = Design::new();
		d.new_module("foo")?.attributes.set("template", "add");

		let m = d.module(&id("foo")).expect("module must exist");
		assert!(!m.id().is_null());
		assert_eq!(m.attributes.require_string("template"), Ok("add"));
		assert_eq!(d.get_module(m.id()).map(|m| m.name().clone()), Some(id("foo")));
		assert!(d.module(&id("bar")).is_none());
		Ok(())
	}

	#[test]
	fn test_remove_module() -> Result<(), DesignError> {
		let mut d = Design::new();
		d.new_module("foo")?;
		d.new_module("bar")?;

		let removed = d.remove_module(&id("foo"))?;
		assert!(removed.id().is_null());
		assert!(!d.contains(&id("foo")));
		assert_eq!(d.module_names(), vec![id("bar")]);
		assert!(matches!(d.remove_module(&id("foo")), Err(DesignError::UnknownModule(_))));
		Ok(())
	}

	#[test]
	fn test_rename_module() -> Result<(), DesignError> {
		let mut d = Design::new();
		d.new_module("foo")?;
		d.new_module("bar")?;

		let conflict = d.rename_module(&id("foo"), id("bar"));
		assert!(matches!(conflict, Err(DesignError::ModuleNameConflict(_))));
		assert!(d.contains(&id("foo")));

		d.rename_module(&id("foo"), id("baz"))?;
		assert!(!d.contains(&id("foo")));
		assert_eq!(d.module(&id("baz")).map(|m| m.name().clone()), Some(id("baz")));

		assert!(matches!(
			d.rename_module(&id("foo"), id("qux")),
			Err(DesignError::UnknownModule(_))
		));
		Ok(())
	}

	#[test]
	fn test_snapshot_survives_mutation() -> Result<(), DesignError> {
		let mut d = Design::new();
		for name in ["a", "b", "c"] {
			d.new_module(name)?;
		}

		let snapshot = d.module_names();
		for name in &snapshot {
			let tmp = name.with_suffix("_new");
			d.add_module(Module::new(tmp.as_str())?)?;
			d.remove_module(name)?;
			d.rename_module(&tmp, name.clone())?;
		}

		assert_eq!(d.len(), 3);
		assert_eq!(d.module_names(), snapshot);
		Ok(())
	}

	#[test]
	fn test_merge_is_all_or_nothing() -> Result<(), DesignError> {
		let mut d = Design::new();
		d.new_module("foo")?;

		let mut other = Design::new();
		other.new_module("bar")?;
		other.new_module("foo")?;

		assert!(matches!(d.merge(other), Err(DesignError::ModuleNameConflict(_))));
		assert_eq!(d.module_names(), vec![id("foo")]);

		let mut other = Design::new();
		other.new_module("bar")?;
		assert_eq!(d.merge(other)?, vec![id("bar")]);
		assert_eq!(d.len(), 2);
		Ok(())
	}

	#[test]
	fn test_unused_name() -> Result<(), DesignError> {
		let mut d = Design::new();
		d.new_module("x_synth")?;
		d.new_module("x_synth_1")?;

		assert_eq!(d.unused_name(&id("y_synth")), id("y_synth"));
		assert_eq!(d.unused_name(&id("x_synth")), id("x_synth_2"));
		Ok(())
	}
}

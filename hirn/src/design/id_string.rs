use std::fmt;

use super::DesignError;

/// Identifier of a module, port or wire in a design.
///
/// Internally every identifier carries a one-character prefix: `\` for
/// user-visible names and `$` for names generated by tools. The prefix is
/// an implementation detail of the design graph and is stripped whenever a
/// name leaves it (see [`IdString::unescaped`]).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct IdString {
	id: String,
}

impl IdString {
	/// Creates an identifier from a user-visible or already escaped name
	pub fn new(name: &str) -> Result<Self, DesignError> {
		match name {
			"" | "\\" | "$" => Err(DesignError::InvalidName(name.into())),
			_ if name.chars().any(char::is_whitespace) => Err(DesignError::InvalidName(name.into())),
			_ if name.starts_with('\\') || name.starts_with('$') => Ok(Self { id: name.into() }),
			_ => Ok(Self {
				id: format!("\\{}", name),
			}),
		}
	}

	/// Returns the internal (escaped) representation
	pub fn as_str(&self) -> &str {
		&self.id
	}

	/// Returns the name without the leading `\` escape.
	/// Generated (`$`) names are returned as they are.
	pub fn unescaped(&self) -> &str {
		self.id.strip_prefix('\\').unwrap_or(&self.id)
	}

	/// Checks whether the identifier is user-visible
	pub fn is_public(&self) -> bool {
		self.id.starts_with('\\')
	}

	/// Returns a new identifier with `suffix` appended to the name
	pub fn with_suffix(&self, suffix: &str) -> Self {
		Self {
			id: format!("{}{}", self.id, suffix),
		}
	}
}

impl fmt::Display for IdString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.unescaped())
	}
}

impl TryFrom<&str> for IdString {
	type Error = DesignError;

	fn try_from(name: &str) -> Result<Self, Self::Error> {
		Self::new(name)
	}
}

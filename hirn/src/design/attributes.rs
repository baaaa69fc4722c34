use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Value of a marker attached to a module, port or wire
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AttrValue {
	/// Integer value. Presence-only markers are stored as `Int(1)`.
	Int(i64),

	/// String value
	Str(String),
}

impl AttrValue {
	/// Name of the value type, used in error messages
	pub fn type_name(&self) -> &'static str {
		match self {
			AttrValue::Int(_) => "integer",
			AttrValue::Str(_) => "string",
		}
	}

	/// Truthiness of the value as seen by boolean markers
	pub fn is_truthy(&self) -> bool {
		match self {
			AttrValue::Int(v) => *v != 0,
			AttrValue::Str(s) => !s.is_empty(),
		}
	}
}

impl fmt::Display for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AttrValue::Int(v) => write!(f, "{}", v),
			AttrValue::Str(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
		}
	}
}

impl From<i64> for AttrValue {
	fn from(v: i64) -> Self {
		AttrValue::Int(v)
	}
}

impl From<&str> for AttrValue {
	fn from(s: &str) -> Self {
		AttrValue::Str(s.into())
	}
}

impl From<String> for AttrValue {
	fn from(s: String) -> Self {
		AttrValue::Str(s)
	}
}

/// Error returned by the typed attribute accessors
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
	#[error("required attribute `{0}` is missing")]
	Missing(String),

	#[error("attribute `{key}` must be of {expected} type, found {found}")]
	WrongType {
		key: String,
		expected: &'static str,
		found: AttrValue,
	},
}

/// Sparse key/value metadata attached to a design object.
///
/// Keys are kept sorted, so iteration order never depends on insertion
/// order.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Attributes {
	entries: BTreeMap<String, AttrValue>,
}

impl Attributes {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets an attribute, replacing the previous value
	pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) {
		self.entries.insert(key.into(), value.into());
	}

	/// Sets a presence-only marker
	pub fn set_flag(&mut self, key: &str) {
		self.set(key, AttrValue::Int(1));
	}

	pub fn get(&self, key: &str) -> Option<&AttrValue> {
		self.entries.get(key)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
		self.entries.remove(key)
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Boolean marker: present and non-zero
	pub fn get_bool(&self, key: &str) -> bool {
		self.get(key).map_or(false, AttrValue::is_truthy)
	}

	/// Returns the value of a required string attribute
	pub fn require_string(&self, key: &str) -> Result<&str, AttributeError> {
		match self.get(key) {
			Some(AttrValue::Str(s)) => Ok(s),
			Some(other) => Err(AttributeError::WrongType {
				key: key.into(),
				expected: "string",
				found: other.clone(),
			}),
			None => Err(AttributeError::Missing(key.into())),
		}
	}

	/// Returns the value of a required integer attribute
	pub fn require_int(&self, key: &str) -> Result<i64, AttributeError> {
		match self.get(key) {
			Some(AttrValue::Int(v)) => Ok(*v),
			Some(other) => Err(AttributeError::WrongType {
				key: key.into(),
				expected: "integer",
				found: other.clone(),
			}),
			None => Err(AttributeError::Missing(key.into())),
		}
	}
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self {
			entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_bool_markers() {
		let mut attrs = Attributes::new();
		attrs.set_flag("clk");
		attrs.set("data", 0i64);
		assert!(attrs.get_bool("clk"));
		assert!(!attrs.get_bool("data"));
		assert!(!attrs.get_bool("out"));
	}

	#[test]
	fn test_typed_accessors() {
		let attrs: Attributes = [
			("template", AttrValue::from("dsp")),
			("initiation_interval", AttrValue::from(2i64)),
		]
		.into_iter()
		.collect();

		assert_eq!(attrs.require_string("template"), Ok("dsp"));
		assert_eq!(attrs.require_int("initiation_interval"), Ok(2));
		assert_eq!(
			attrs.require_string("architecture"),
			Err(AttributeError::Missing("architecture".into()))
		);
		assert!(matches!(
			attrs.require_int("template"),
			Err(AttributeError::WrongType { expected: "integer", .. })
		));
	}

	#[test]
	fn test_string_display_is_quoted() {
		assert_eq!(AttrValue::from("a\"b").to_string(), "\"a\\\"b\"");
		assert_eq!(AttrValue::from(-4i64).to_string(), "-4");
	}
}

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
	static ref SIMPLE_ID_REGEX: Regex = Regex::new(r"^[a-zA-Z_][0-9a-zA-Z_$]*$").unwrap();
}

/// Checks if given name can be written as a simple (non-escaped) Verilog identifier
pub(crate) fn is_simple_identifier(name: &str) -> bool {
	SIMPLE_ID_REGEX.is_match(name)
}

#[cfg(test)]
mod test {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("test")]
	#[case("test222")]
	#[case("adder_synthesized_by_lakeroad")]
	#[case("_lorem__ipsum_22_33$whatever")]
	fn test_simple_identifiers(#[case] name: &str) {
		assert!(is_simple_identifier(name));
	}

	#[rstest]
	#[case("$auto$1")]
	#[case("1horse")]
	#[case("hor!se")]
	#[case("bus[3]")]
	#[case("")]
	fn test_names_requiring_escape(#[case] name: &str) {
		assert!(!is_simple_identifier(name));
	}
}

use hirn::{Design, DesignError, IdString};
use log::info;
use miette::Diagnostic;
use thiserror::Error;

/// The design graph is not in the state the substitution relies on
#[derive(Debug, Error, Diagnostic)]
pub enum SubstituteError {
	#[error("module {0} to be replaced is not in the design")]
	#[diagnostic(code(techmap::substitute::missing_original))]
	MissingOriginal(IdString),

	#[error("replacement module {0} is not in the design")]
	#[diagnostic(code(techmap::substitute::missing_replacement))]
	MissingReplacement(IdString),

	#[error("module {0} cannot replace itself")]
	#[diagnostic(code(techmap::substitute::same_module))]
	SameModule(IdString),

	#[error("cannot rename replacement module")]
	#[diagnostic(code(techmap::substitute::rename))]
	Rename(#[from] DesignError),
}

/// Replaces `original` with `replacement`, which takes over the original name.
///
/// Both modules must be present. The original is removed first so the
/// rename never collides with it.
pub fn substitute(design: &mut Design, original: &IdString, replacement: &IdString) -> Result<(), SubstituteError> {
	if original == replacement {
		return Err(SubstituteError::SameModule(original.clone()));
	}
	if !design.contains(original) {
		return Err(SubstituteError::MissingOriginal(original.clone()));
	}
	if !design.contains(replacement) {
		return Err(SubstituteError::MissingReplacement(replacement.clone()));
	}

	info!("Replacing module {} with the output of Lakeroad", original);
	design.remove_module(original)?;
	design.rename_module(replacement, original.clone())?;
	Ok(())
}

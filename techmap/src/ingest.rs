use crate::frontend::{DesignIo, FrontendError};
use hirn::{Design, DesignError, IdString};
use log::debug;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
	#[error(transparent)]
	#[diagnostic(transparent)]
	Read(#[from] FrontendError),

	#[error("Lakeroad returned OK, but no module named {module} found in {}", .path.display())]
	#[diagnostic(code(techmap::ingest::missing_module))]
	MissingModule { module: IdString, path: PathBuf },

	#[error("cannot merge Lakeroad output into the design")]
	#[diagnostic(
		code(techmap::ingest::conflict),
		help("A module produced by Lakeroad has the same name as a module already in the design")
	)]
	Conflict(#[from] DesignError),
}

/// Loads the oracle output at `path` into `design`.
///
/// The output is parsed into a separate design first. Only when it contains
/// `expected` and none of its modules clash with existing ones are all of
/// them moved into `design`; otherwise `design` stays untouched.
pub fn ingest(
	design: &mut Design,
	io: &dyn DesignIo,
	path: &Path,
	expected: &IdString,
) -> Result<Vec<IdString>, IngestError> {
	let staging = io.read_design(path)?;
	if !staging.contains(expected) {
		return Err(IngestError::MissingModule {
			module: expected.clone(),
			path: path.into(),
		});
	}

	let added = design.merge(staging)?;
	debug!("Ingested {} module(s) from {}", added.len(), path.display());
	Ok(added)
}

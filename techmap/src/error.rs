use crate::classify::ClassifyError;
use crate::config::ConfigError;
use crate::frontend::FrontendError;
use crate::ingest::IngestError;
use crate::runner::RunError;
use crate::substitute::SubstituteError;
use hirn::{DesignError, IdString};
use miette::Diagnostic;
use std::io;
use thiserror::Error;

/// Error ending the mapping of a module (or the whole pass)
#[derive(Debug, Error, Diagnostic)]
pub enum TechmapError {
	#[error(transparent)]
	#[diagnostic(transparent)]
	Config(#[from] ConfigError),

	#[error("cannot classify module {module}")]
	#[diagnostic(code(techmap::classify))]
	Classify {
		module: IdString,
		#[source]
		#[diagnostic_source]
		source: ClassifyError,
	},

	#[error("cannot write design for module {module}")]
	#[diagnostic(code(techmap::serialize))]
	Serialize {
		module: IdString,
		#[source]
		source: FrontendError,
	},

	#[error("Lakeroad failed on module {module}")]
	#[diagnostic(code(techmap::oracle))]
	Oracle {
		module: IdString,
		#[source]
		#[diagnostic_source]
		source: RunError,
	},

	#[error("unusable Lakeroad output for module {module}")]
	#[diagnostic(code(techmap::ingest))]
	Ingest {
		module: IdString,
		#[source]
		#[diagnostic_source]
		source: IngestError,
	},

	#[error("graph invariant violated while replacing module {module}")]
	#[diagnostic(code(techmap::substitute))]
	Substitute {
		module: IdString,
		#[source]
		source: SubstituteError,
	},

	#[error("module {0} disappeared from the design before its turn")]
	#[diagnostic(code(techmap::vanished))]
	ModuleVanished(IdString),

	#[error("no module named {0} in design")]
	#[diagnostic(code(techmap::unknown_module))]
	UnknownModule(String),

	#[error("module {module} has no port named {port}")]
	#[diagnostic(code(techmap::unknown_port))]
	UnknownPort { module: IdString, port: String },

	#[error(transparent)]
	#[diagnostic(code(techmap::design))]
	Design(#[from] DesignError),

	#[error("cannot create temporary files")]
	#[diagnostic(code(techmap::temp_files))]
	TempFiles(#[source] io::Error),
}

impl TechmapError {
	/// Checks whether the failure is confined to the module being mapped.
	///
	/// Only such errors may be skipped under [`crate::ErrorPolicy::Continue`].
	/// The rest mean the configuration, the environment or the design graph
	/// itself is broken.
	pub fn is_module_local(&self) -> bool {
		use TechmapError::*;
		matches!(
			self,
			Classify { .. } | Serialize { .. } | Oracle { .. } | Ingest { .. }
		)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::classify::PortRole;

	#[test]
	fn test_module_local_errors() {
		let classify = TechmapError::Classify {
			module: IdString::new("a").unwrap(),
			source: ClassifyError::PortCount {
				role: PortRole::Clock,
				found: 0,
			},
		};
		assert!(classify.is_module_local());
		assert!(!TechmapError::ModuleVanished(IdString::new("a").unwrap()).is_module_local());
		assert!(!TechmapError::Config(ConfigError::LakeroadDirNotSet).is_module_local());
	}
}

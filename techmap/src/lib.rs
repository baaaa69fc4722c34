//! Technology mapping of HIRN design modules with Lakeroad.
//!
//! [`LakeroadPass`] hands attribute-marked modules to the Lakeroad
//! synthesizer one at a time and splices the mapped modules back into the
//! design under their original names.

pub mod classify;
pub mod config;
pub mod error;
pub mod frontend;
pub mod ingest;
pub mod invocation;
pub mod pass;
pub mod report;
pub mod runner;
pub mod substitute;

pub use classify::{classify, Classification, ClassifyError, PortRole, PortSpec};
pub use config::{ConfigError, ErrorPolicy, OracleConfig, LAKEROAD_DIR_VAR};
pub use error::TechmapError;
pub use frontend::{DesignIo, FrontendError, VerilogIo};
pub use ingest::{ingest, IngestError};
pub use invocation::{Invocation, MappingTarget};
pub use pass::{LakeroadPass, WorkFiles, DESTINATION_SUFFIX};
pub use report::{ModuleOutcome, PassReport};
pub use runner::{OracleRunner, ProcessRunner, RunError};
pub use substitute::{substitute, SubstituteError};

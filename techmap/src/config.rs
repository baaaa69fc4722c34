use miette::Diagnostic;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable pointing at the Lakeroad checkout
pub const LAKEROAD_DIR_VAR: &str = "LAKEROAD_DIR";

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ConfigError {
	#[error("LAKEROAD_DIR environment variable not set")]
	#[diagnostic(
		code(techmap::config),
		help("Set LAKEROAD_DIR to the location of the Lakeroad directory or pass --lakeroad-dir")
	)]
	LakeroadDirNotSet,
}

/// What the pass does when mapping a single module fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
	/// First failure ends the pass
	#[default]
	Abort,

	/// Failures are recorded in the report and the remaining modules are still mapped
	Continue,
}

/// Settings of the Lakeroad pass, resolved once before any module is touched
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleConfig {
	pub lakeroad_dir: PathBuf,

	/// Upper bound on a single oracle run. `None` waits indefinitely.
	pub timeout: Option<Duration>,
	pub keep_temp_files: bool,

	/// Directory for the intermediate Verilog files. `None` means the system default.
	pub temp_dir: Option<PathBuf>,
	pub error_policy: ErrorPolicy,
}

impl OracleConfig {
	pub fn new(lakeroad_dir: impl Into<PathBuf>) -> Self {
		Self {
			lakeroad_dir: lakeroad_dir.into(),
			timeout: None,
			keep_temp_files: false,
			temp_dir: None,
			error_policy: ErrorPolicy::default(),
		}
	}

	/// Reads the Lakeroad location from `LAKEROAD_DIR`
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lakeroad_dir(std::env::var_os(LAKEROAD_DIR_VAR))
	}

	/// Builds the config from an optional directory, treating an empty value as missing
	pub fn from_lakeroad_dir(dir: Option<OsString>) -> Result<Self, ConfigError> {
		match dir {
			Some(dir) if !dir.is_empty() => Ok(Self::new(dir)),
			_ => Err(ConfigError::LakeroadDirNotSet),
		}
	}

	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.temp_dir = Some(dir.into());
		self
	}

	pub fn with_keep_temp_files(mut self, keep: bool) -> Self {
		self.keep_temp_files = keep;
		self
	}

	pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
		self.error_policy = policy;
		self
	}

	/// Path of the Lakeroad entry point
	pub fn oracle_executable(&self) -> PathBuf {
		self.lakeroad_dir.join("bin").join("main.rkt")
	}

	pub fn temp_dir(&self) -> Option<&Path> {
		self.temp_dir.as_deref()
	}
}

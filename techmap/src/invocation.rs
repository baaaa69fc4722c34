use crate::classify::{Classification, PortSpec};
use hirn::IdString;
use itertools::Itertools;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Everything the oracle needs to know about the module it maps
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingTarget {
	pub architecture: String,
	pub template: String,
	pub output: PortSpec,
	pub clock: Option<PortSpec>,
	pub inputs: Vec<PortSpec>,
	pub initiation_interval: Option<u64>,
}

impl From<Classification> for MappingTarget {
	fn from(c: Classification) -> Self {
		Self {
			architecture: c.architecture,
			template: c.template,
			output: c.output,
			clock: Some(c.clock),
			inputs: c.data,
			initiation_interval: c.initiation_interval,
		}
	}
}

/// Fully resolved command line of a single oracle run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
	executable: PathBuf,
	args: Vec<String>,
}

impl Invocation {
	pub fn new(executable: impl Into<PathBuf>, args: Vec<String>) -> Self {
		Self {
			executable: executable.into(),
			args,
		}
	}

	/// Builds the Lakeroad command line.
	///
	/// `top` is the module to map inside the design at `source`; the
	/// result should be written to `out` as a module named `module_name`.
	pub fn build(
		executable: &Path,
		top: &IdString,
		module_name: &IdString,
		source: &Path,
		out: &Path,
		target: &MappingTarget,
	) -> Self {
		let mut builder = ArgsBuilder::default();
		builder
			.flag("--verilog-module-filepath", source.display())
			.flag("--top-module-name", top.unescaped())
			.flag("--out-filepath", out.display())
			.flag("--out-format", "verilog")
			.flag("--verilog-module-out-signal", &target.output)
			.flag("--architecture", &target.architecture)
			.flag("--template", &target.template)
			.flag("--module-name", module_name.unescaped());

		if let Some(clock) = &target.clock {
			builder.flag("--clock-name", &clock.name);
		}
		for input in &target.inputs {
			builder.flag("--input-signal", input);
		}
		if let Some(ii) = target.initiation_interval {
			builder.flag("--initiation-interval", ii);
		}

		Self::new(executable, builder.args)
	}

	pub fn executable(&self) -> &Path {
		&self.executable
	}

	pub fn args(&self) -> &[String] {
		&self.args
	}

	/// Returns the value following the first occurrence of `flag`
	pub fn flag_value(&self, flag: &str) -> Option<&str> {
		self.args
			.iter()
			.tuple_windows()
			.find(|(name, _)| *name == flag)
			.map(|(_, value)| value.as_str())
	}

	/// Executable followed by the arguments, ready to be spawned
	pub fn argv(&self) -> Vec<OsString> {
		std::iter::once(self.executable.clone().into_os_string())
			.chain(self.args.iter().map(OsString::from))
			.collect()
	}
}

impl fmt::Display for Invocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.executable.display())?;
		if !self.args.is_empty() {
			write!(f, " {}", self.args.iter().join(" "))?;
		}
		Ok(())
	}
}

#[derive(Default)]
struct ArgsBuilder {
	args: Vec<String>,
}

impl ArgsBuilder {
	fn flag(&mut self, name: &str, value: impl fmt::Display) -> &mut Self {
		self.args.push(name.into());
		self.args.push(value.to_string());
		self
	}
}

use crate::classify::{classify, PortSpec};
use crate::config::{ErrorPolicy, OracleConfig};
use crate::error::TechmapError;
use crate::frontend::{DesignIo, VerilogIo};
use crate::ingest::ingest;
use crate::invocation::{Invocation, MappingTarget};
use crate::report::PassReport;
use crate::runner::{OracleRunner, ProcessRunner};
use crate::substitute::substitute;
use hirn::{Design, IdString};
use log::{info, warn};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Appended to the mapped module's name to get the name Lakeroad should give its output
pub const DESTINATION_SUFFIX: &str = "_synthesized_by_lakeroad";

/// Intermediate files of a single oracle run, deleted on drop
pub struct WorkFiles {
	source: NamedTempFile,
	output: NamedTempFile,
}

impl WorkFiles {
	pub fn create(dir: Option<&Path>) -> io::Result<Self> {
		Ok(Self {
			source: Self::temp_file(dir, "lakeroad-in-")?,
			output: Self::temp_file(dir, "lakeroad-out-")?,
		})
	}

	fn temp_file(dir: Option<&Path>, prefix: &str) -> io::Result<NamedTempFile> {
		let mut builder = tempfile::Builder::new();
		builder.prefix(prefix).suffix(".v");
		match dir {
			Some(dir) => builder.tempfile_in(dir),
			None => builder.tempfile(),
		}
	}

	/// Design handed to the oracle
	pub fn source_path(&self) -> &Path {
		self.source.path()
	}

	/// File the oracle writes its result to
	pub fn output_path(&self) -> &Path {
		self.output.path()
	}

	/// Prevents deletion of the files and returns their paths
	pub fn keep(self) -> io::Result<(PathBuf, PathBuf)> {
		let (_, source) = self.source.keep()?;
		let (_, output) = self.output.keep()?;
		Ok((source, output))
	}
}

/// Technology mapping of design modules with Lakeroad.
///
/// For each module the whole design is written to a temporary file and
/// Lakeroad is asked to map the module into a new one. The new module is
/// read back and takes over the name of the original, which is removed.
pub struct LakeroadPass<R = ProcessRunner, F = VerilogIo> {
	config: OracleConfig,
	executable: PathBuf,
	runner: R,
	io: F,
}

impl LakeroadPass<ProcessRunner, VerilogIo> {
	/// Runs Lakeroad as a child process and exchanges designs as Verilog
	pub fn from_config(config: OracleConfig) -> Self {
		let runner = ProcessRunner::new(config.timeout);
		Self::new(config, runner, VerilogIo)
	}
}

impl<R: OracleRunner, F: DesignIo> LakeroadPass<R, F> {
	pub fn new(config: OracleConfig, runner: R, io: F) -> Self {
		let executable = config.oracle_executable();
		Self {
			config,
			executable,
			runner,
			io,
		}
	}

	pub fn config(&self) -> &OracleConfig {
		&self.config
	}

	pub fn runner(&self) -> &R {
		&self.runner
	}

	/// Maps every module of the design according to its attributes.
	///
	/// Modules are processed in the order they had when the pass started.
	/// Modules added during the pass (e.g. helpers emitted by Lakeroad) are
	/// not mapped.
	pub fn run(&mut self, design: &mut Design) -> Result<PassReport, TechmapError> {
		let mut report = PassReport::new();
		let names = design.module_names();
		info!(
			"Executing Lakeroad pass on {} module(s) using {}",
			names.len(),
			self.executable.display()
		);

		for name in names {
			match self.map_attributed(design, &name) {
				Ok(replacement) => report.record_replaced(&name, &replacement),
				Err(err) if self.config.error_policy == ErrorPolicy::Continue && err.is_module_local() => {
					warn!("Module {} left unchanged: {}", name, err);
					report.record_failed(&name, &err);
				},
				Err(err) => return Err(err),
			}
		}

		report.finish();
		info!(
			"Lakeroad pass done: {} replaced, {} failed",
			report.replaced_count(),
			report.failed().count()
		);
		Ok(report)
	}

	/// Maps a single module with explicitly given parameters.
	///
	/// Lakeroad gets no clock, no input signals and no initiation interval;
	/// the output signal width is taken from the module's port.
	pub fn run_explicit(
		&mut self,
		design: &mut Design,
		top: &str,
		output_signal: &str,
		architecture: &str,
		template: &str,
	) -> Result<PassReport, TechmapError> {
		let mut report = PassReport::new();
		let name = IdString::new(top)?;
		let module = design
			.module(&name)
			.ok_or_else(|| TechmapError::UnknownModule(top.into()))?;
		let output = module
			.port(&IdString::new(output_signal)?)
			.map(PortSpec::from)
			.ok_or_else(|| TechmapError::UnknownPort {
				module: name.clone(),
				port: output_signal.into(),
			})?;

		let target = MappingTarget {
			architecture: architecture.into(),
			template: template.into(),
			output,
			clock: None,
			inputs: vec![],
			initiation_interval: None,
		};
		let replacement = self.map_module(design, &name, &target)?;
		report.record_replaced(&name, &replacement);
		report.finish();
		Ok(report)
	}

	fn map_attributed(&mut self, design: &mut Design, name: &IdString) -> Result<IdString, TechmapError> {
		let module = design
			.module(name)
			.ok_or_else(|| TechmapError::ModuleVanished(name.clone()))?;
		let classification = classify(module).map_err(|source| TechmapError::Classify {
			module: name.clone(),
			source,
		})?;
		self.map_module(design, name, &classification.into())
	}

	/// Runs Lakeroad on one module and puts its output in place of the module
	fn map_module(
		&mut self,
		design: &mut Design,
		name: &IdString,
		target: &MappingTarget,
	) -> Result<IdString, TechmapError> {
		let replacement = design.unused_name(&name.with_suffix(DESTINATION_SUFFIX));
		let files = WorkFiles::create(self.config.temp_dir()).map_err(TechmapError::TempFiles)?;
		let result = self.invoke_oracle(design, name, &replacement, target, &files);

		if self.config.keep_temp_files {
			match files.keep() {
				Ok((source, output)) => warn!(
					"Keeping temporary files {} and {}",
					source.display(),
					output.display()
				),
				Err(err) => warn!("Cannot keep temporary files: {}", err),
			}
		}

		result.map(|_| replacement)
	}

	fn invoke_oracle(
		&mut self,
		design: &mut Design,
		name: &IdString,
		replacement: &IdString,
		target: &MappingTarget,
		files: &WorkFiles,
	) -> Result<(), TechmapError> {
		let invocation = Invocation::build(
			&self.executable,
			name,
			replacement,
			files.source_path(),
			files.output_path(),
			target,
		);

		self.io
			.write_design(design, files.source_path())
			.map_err(|source| TechmapError::Serialize {
				module: name.clone(),
				source,
			})?;

		info!("Executing Lakeroad:\n{}", invocation);
		self.runner.run(&invocation).map_err(|source| TechmapError::Oracle {
			module: name.clone(),
			source,
		})?;

		ingest(design, &self.io, files.output_path(), replacement).map_err(|source| TechmapError::Ingest {
			module: name.clone(),
			source,
		})?;

		substitute(design, name, replacement).map_err(|source| TechmapError::Substitute {
			module: name.clone(),
			source,
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::classify::{ARCHITECTURE_ATTR, INITIATION_INTERVAL_ATTR, TEMPLATE_ATTR};
	use crate::ingest::IngestError;
	use crate::runner::RunError;
	use hirn::{Module, Port};
	use std::fs;
	use subprocess::ExitStatus;
	use tempfile::TempDir;

	/// Stands in for Lakeroad: writes a module named as requested to the output file
	#[derive(Default)]
	struct FakeOracle {
		calls: Vec<Invocation>,
		fail_on: Option<String>,
		omit_module: bool,
		extra_module: Option<String>,
	}

	impl OracleRunner for FakeOracle {
		fn run(&mut self, invocation: &Invocation) -> Result<(), RunError> {
			self.calls.push(invocation.clone());
			let top = invocation.flag_value("--top-module-name").unwrap();
			if self.fail_on.as_deref() == Some(top) {
				return Err(RunError::Failed {
					invocation: invocation.to_string(),
					status: ExitStatus::Exited(1),
				});
			}

			let mut source = String::new();
			if !self.omit_module {
				let name = invocation.flag_value("--module-name").unwrap();
				let (out, width) = invocation
					.flag_value("--verilog-module-out-signal")
					.and_then(|s| s.split_once(':'))
					.unwrap();
				let width: u32 = width.parse().unwrap();
				source += &format!(
					"(* synthesized_by = \"fake\" *)\nmodule {name}({out});\n\toutput [{msb}:0] {out};\n\tassign {out} = 0;\nendmodule\n",
					msb = width - 1
				);
			}
			if let Some(extra) = &self.extra_module {
				source += &format!("module {}; endmodule\n", extra);
			}
			fs::write(invocation.flag_value("--out-filepath").unwrap(), source).unwrap();
			Ok(())
		}
	}

	fn id(name: &str) -> IdString {
		IdString::new(name).unwrap()
	}

	fn marked(name: &str) -> Module {
		Module::new(name)
			.unwrap()
			.with_attribute(TEMPLATE_ATTR, "add")
			.with_attribute(ARCHITECTURE_ATTR, "xilinx")
			.with_attribute(INITIATION_INTERVAL_ATTR, 0i64)
			.with_port(Port::input("clk", 1).unwrap().flag("clk"))
			.unwrap()
			.with_port(Port::input("a", 8).unwrap().flag("data"))
			.unwrap()
			.with_port(Port::input("b", 8).unwrap().flag("data"))
			.unwrap()
			.with_port(Port::output("sum", 8).unwrap().flag("out"))
			.unwrap()
	}

	fn design_of(modules: Vec<Module>) -> Design {
		let mut design = Design::new();
		for m in modules {
			design.add_module(m).unwrap();
		}
		design
	}

	fn snapshot(design: &Design) -> Vec<Module> {
		design.modules().cloned().collect()
	}

	fn is_replaced(design: &Design, name: &str) -> bool {
		design
			.module(&id(name))
			.map(|m| m.attributes.require_string("synthesized_by") == Ok("fake"))
			.unwrap_or(false)
	}

	fn new_pass(oracle: FakeOracle, temp: &TempDir) -> LakeroadPass<FakeOracle> {
		let config = OracleConfig::new("/opt/lakeroad").with_temp_dir(temp.path());
		LakeroadPass::new(config, oracle, VerilogIo)
	}

	#[test]
	fn test_adder() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("adder")]);
		let mut pass = new_pass(FakeOracle::default(), &temp);

		let report = pass.run(&mut design).unwrap();
		assert_eq!(report.replaced_count(), 1);
		assert!(is_replaced(&design, "adder"));
		assert!(!design.contains(&id("adder_synthesized_by_lakeroad")));
		assert_eq!(design.len(), 1);

		let invocation = &pass.runner().calls[0];
		assert_eq!(invocation.executable(), Path::new("/opt/lakeroad/bin/main.rkt"));
		let command = invocation.to_string();
		for expected in [
			"--clock-name clk",
			"--input-signal a:8 --input-signal b:8",
			"--verilog-module-out-signal sum:8",
			"--template add",
			"--architecture xilinx",
			"--module-name adder_synthesized_by_lakeroad",
		] {
			assert!(command.contains(expected), "{} not in {}", expected, command);
		}
		assert!(!command.contains("--initiation-interval"));

		assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
	}

	#[test]
	fn test_all_modules_replaced_under_original_names() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("a"), marked("b"), marked("c")]);
		let mut pass = new_pass(FakeOracle::default(), &temp);

		let report = pass.run(&mut design).unwrap();
		assert_eq!(report.replaced_count(), 3);
		assert_eq!(design.len(), 3);
		for name in ["a", "b", "c"] {
			assert!(is_replaced(&design, name), "{} not replaced", name);
		}

		let tops: Vec<_> = pass
			.runner()
			.calls
			.iter()
			.map(|c| c.flag_value("--top-module-name").unwrap().to_owned())
			.collect();
		assert_eq!(tops, ["a", "b", "c"]);
	}

	#[test]
	fn test_oracle_failure_aborts_and_keeps_module() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("a"), marked("b"), marked("c")]);
		let untouched = ["b", "c"].map(|n| design.module(&id(n)).cloned());
		let oracle = FakeOracle {
			fail_on: Some("b".into()),
			..Default::default()
		};
		let mut pass = new_pass(oracle, &temp);

		let err = pass.run(&mut design).unwrap_err();
		assert!(matches!(err, TechmapError::Oracle { ref module, .. } if module == &id("b")));
		assert!(is_replaced(&design, "a"));
		assert_eq!(["b", "c"].map(|n| design.module(&id(n)).cloned()), untouched);
		assert_eq!(pass.runner().calls.len(), 2);
		assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
	}

	#[test]
	fn test_missing_output_module_is_contract_violation() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("a")]);
		let before = snapshot(&design);
		let oracle = FakeOracle {
			omit_module: true,
			..Default::default()
		};

		let err = new_pass(oracle, &temp).run(&mut design).unwrap_err();
		assert!(matches!(
			err,
			TechmapError::Ingest {
				source: IngestError::MissingModule { .. },
				..
			}
		));
		assert_eq!(snapshot(&design), before);
	}

	#[test]
	fn test_output_name_clash_leaves_design() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("a"), marked("b")]);
		let before = snapshot(&design);
		let oracle = FakeOracle {
			extra_module: Some("b".into()),
			..Default::default()
		};

		let err = new_pass(oracle, &temp).run(&mut design).unwrap_err();
		assert!(matches!(
			err,
			TechmapError::Ingest {
				source: IngestError::Conflict(_),
				..
			}
		));
		assert_eq!(snapshot(&design), before);
	}

	#[test]
	fn test_unclassifiable_module_aborts_before_oracle() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![Module::new("plain").unwrap(), marked("a")]);
		let before = snapshot(&design);
		let mut pass = new_pass(FakeOracle::default(), &temp);

		let err = pass.run(&mut design).unwrap_err();
		assert!(matches!(err, TechmapError::Classify { .. }));
		assert!(pass.runner().calls.is_empty());
		assert_eq!(snapshot(&design), before);
	}

	#[test]
	fn test_continue_policy() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("a"), Module::new("plain").unwrap(), marked("c")]);
		let oracle = FakeOracle {
			fail_on: Some("c".into()),
			..Default::default()
		};
		let config = OracleConfig::new("/opt/lakeroad")
			.with_temp_dir(temp.path())
			.with_error_policy(ErrorPolicy::Continue);
		let mut pass = LakeroadPass::new(config, oracle, VerilogIo);

		let report = pass.run(&mut design).unwrap();
		assert_eq!(report.replaced_count(), 1);
		let failed: Vec<_> = report.failed().map(|m| m.module().to_owned()).collect();
		assert_eq!(failed, ["plain", "c"]);
		assert!(is_replaced(&design, "a"));
		assert!(!is_replaced(&design, "c"));
		assert!(design.module(&id("plain")).unwrap().attributes.is_empty());
	}

	#[test]
	fn test_destination_name_collision() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("a"), marked("a_synthesized_by_lakeroad")]);
		let mut pass = new_pass(FakeOracle::default(), &temp);

		pass.run(&mut design).unwrap();
		let first = &pass.runner().calls[0];
		assert_eq!(
			first.flag_value("--module-name"),
			Some("a_synthesized_by_lakeroad_1")
		);
		assert_eq!(design.len(), 2);
		assert!(is_replaced(&design, "a"));
		assert!(is_replaced(&design, "a_synthesized_by_lakeroad"));
	}

	#[test]
	fn test_helper_modules_merged_but_not_mapped() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("a")]);
		let oracle = FakeOracle {
			extra_module: Some("lut6_helper".into()),
			..Default::default()
		};
		let mut pass = new_pass(oracle, &temp);

		pass.run(&mut design).unwrap();
		assert_eq!(design.len(), 2);
		assert!(design.contains(&id("lut6_helper")));
		assert!(is_replaced(&design, "a"));
		assert_eq!(pass.runner().calls.len(), 1);
	}

	#[test]
	fn test_keep_temp_files() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("a"), marked("b")]);
		let config = OracleConfig::new("/opt/lakeroad")
			.with_temp_dir(temp.path())
			.with_keep_temp_files(true);
		let mut pass = LakeroadPass::new(config, FakeOracle::default(), VerilogIo);

		pass.run(&mut design).unwrap();
		assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 4);

		let source = pass.runner().calls[0].flag_value("--verilog-module-filepath").unwrap();
		let written = fs::read_to_string(source).unwrap();
		assert!(written.contains("module a(clk, a, b, sum);"));
		assert!(written.contains("module b(clk, a, b, sum);"));
	}

	#[test]
	fn test_explicit_mode() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![
			Module::new("adder")
				.unwrap()
				.with_port(Port::input("a", 4).unwrap())
				.unwrap()
				.with_port(Port::output("sum", 5).unwrap())
				.unwrap(),
		]);
		let mut pass = new_pass(FakeOracle::default(), &temp);

		let report = pass.run_explicit(&mut design, "adder", "sum", "lattice-ecp5", "add").unwrap();
		assert_eq!(report.replaced_count(), 1);
		assert!(is_replaced(&design, "adder"));

		let invocation = &pass.runner().calls[0];
		assert_eq!(invocation.flag_value("--verilog-module-out-signal"), Some("sum:5"));
		assert_eq!(invocation.flag_value("--architecture"), Some("lattice-ecp5"));
		assert_eq!(invocation.flag_value("--clock-name"), None);
		assert_eq!(invocation.flag_value("--input-signal"), None);
		assert_eq!(invocation.flag_value("--initiation-interval"), None);
	}

	#[test]
	fn test_explicit_mode_unknown_names() {
		let temp = TempDir::new().unwrap();
		let mut design = design_of(vec![marked("adder")]);
		let mut pass = new_pass(FakeOracle::default(), &temp);

		let err = pass.run_explicit(&mut design, "mul", "sum", "xilinx", "add").unwrap_err();
		assert!(matches!(err, TechmapError::UnknownModule(_)));

		let err = pass.run_explicit(&mut design, "adder", "carry", "xilinx", "add").unwrap_err();
		assert!(matches!(err, TechmapError::UnknownPort { .. }));
		assert!(pass.runner().calls.is_empty());
	}
}

use clap::{arg, command, value_parser, Arg, ArgAction, ArgMatches};
use hirn::{Codegen, CodegenError, Design, DesignError, VerilogCodegen};
use log::{info, warn};
use miette::{Diagnostic, NamedSource};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use techmap::{ErrorPolicy, LakeroadPass, OracleConfig, PassReport};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
	#[error("cannot read {}", .path.display())]
	#[diagnostic(code(hdl_techmap::read))]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("cannot write {}", .path.display())]
	#[diagnostic(code(hdl_techmap::write))]
	Write {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("cannot combine {}", .path.display())]
	#[diagnostic(code(hdl_techmap::combine), help("Module names must be unique across all input files"))]
	Combine {
		path: PathBuf,
		#[source]
		source: DesignError,
	},

	#[error(transparent)]
	#[diagnostic(code(hdl_techmap::codegen))]
	Codegen(#[from] CodegenError),

	#[error("cannot serialize pass report")]
	#[diagnostic(code(hdl_techmap::report))]
	Report(#[from] serde_json::Error),
}

fn read_design(paths: &[PathBuf]) -> miette::Result<Design> {
	let mut design = Design::new();
	for path in paths {
		let source = fs::read_to_string(path).map_err(|source| CliError::Read {
			path: path.clone(),
			source,
		})?;
		let parsed = verilog::parse_design(&source).map_err(|err| {
			miette::Report::new(err).with_source_code(NamedSource::new(path.display().to_string(), source.clone()))
		})?;
		info!("Read {} module(s) from {}", parsed.len(), path.display());
		design.merge(parsed).map_err(|source| CliError::Combine {
			path: path.clone(),
			source,
		})?;
	}
	Ok(design)
}

fn write_design(design: &Design, output: Option<&PathBuf>) -> miette::Result<()> {
	let mut source = String::new();
	VerilogCodegen::new(design, &mut source)
		.emit_design()
		.map_err(CliError::from)?;

	match output {
		Some(path) => fs::write(path, source).map_err(|source| CliError::Write {
			path: path.clone(),
			source,
		})?,
		None => io::stdout()
			.write_all(source.as_bytes())
			.map_err(|source| CliError::Write {
				path: "<stdout>".into(),
				source,
			})?,
	}
	Ok(())
}

fn write_report(report: &PassReport, path: &Path) -> miette::Result<()> {
	let json = report.to_json().map_err(CliError::from)?;
	fs::write(path, json).map_err(|source| CliError::Write {
		path: path.into(),
		source,
	})?;
	Ok(())
}

fn oracle_config(matches: &ArgMatches) -> miette::Result<OracleConfig> {
	let config = match matches.get_one::<OsString>("lakeroad-dir") {
		Some(dir) => OracleConfig::from_lakeroad_dir(Some(dir.clone()))?,
		None => OracleConfig::from_env()?,
	};

	let mut config = config
		.with_timeout(matches.get_one::<u64>("timeout").map(|s| Duration::from_secs(*s)))
		.with_keep_temp_files(matches.get_flag("keep-temp-files"))
		.with_error_policy(match matches.get_flag("continue-on-error") {
			true => ErrorPolicy::Continue,
			false => ErrorPolicy::Abort,
		});
	if let Some(dir) = matches.get_one::<PathBuf>("temp-dir") {
		config = config.with_temp_dir(dir);
	}
	Ok(config)
}

fn main() -> miette::Result<()> {
	let matches = command!()
		.about("Technology mapping of Verilog modules with Lakeroad")
		.arg(
			Arg::new("sources")
				.help("Verilog source files")
				.required(true)
				.num_args(1..)
				.value_parser(value_parser!(PathBuf)),
		)
		.arg(
			arg!(-o --output <FILE> "Output Verilog file (stdout by default)")
				.required(false)
				.value_parser(value_parser!(PathBuf)),
		)
		.arg(
			arg!(--"lakeroad-dir" <DIR> "Lakeroad directory (LAKEROAD_DIR by default)")
				.required(false)
				.value_parser(value_parser!(OsString)),
		)
		.arg(
			arg!(--timeout <SECS> "Time limit for a single Lakeroad run")
				.required(false)
				.value_parser(value_parser!(u64)),
		)
		.arg(
			arg!(--"temp-dir" <DIR> "Directory for intermediate files")
				.required(false)
				.value_parser(value_parser!(PathBuf)),
		)
		.arg(arg!(--"keep-temp-files" "Do not delete intermediate files").action(ArgAction::SetTrue))
		.arg(arg!(--"continue-on-error" "Leave failing modules unchanged instead of stopping").action(ArgAction::SetTrue))
		.arg(
			arg!(--report <FILE> "Write a JSON pass report")
				.required(false)
				.value_parser(value_parser!(PathBuf)),
		)
		.arg(arg!(-v --verbose "Enable debug logging").action(ArgAction::SetTrue))
		.arg(
			arg!(--top <MODULE> "Map only this module with the parameters given on the command line")
				.required(false)
				.requires_all(["output-signal", "architecture", "template"]),
		)
		.arg(
			arg!(--"output-signal" <SIGNAL> "Output signal of the --top module")
				.required(false)
				.requires("top"),
		)
		.arg(
			arg!(--architecture <ARCH> "Target architecture for --top")
				.required(false)
				.requires("top"),
		)
		.arg(
			arg!(--template <TEMPLATE> "Lakeroad template for --top")
				.required(false)
				.requires("top"),
		)
		.get_matches();

	let default_level = match matches.get_flag("verbose") {
		true => "debug",
		false => "info",
	};
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

	let sources: Vec<PathBuf> = matches
		.get_many::<PathBuf>("sources")
		.map(|paths| paths.cloned().collect())
		.unwrap_or_default();
	let config = oracle_config(&matches)?;
	let mut design = read_design(&sources)?;
	let mut pass = LakeroadPass::from_config(config);

	let explicit = (
		matches.get_one::<String>("top"),
		matches.get_one::<String>("output-signal"),
		matches.get_one::<String>("architecture"),
		matches.get_one::<String>("template"),
	);
	let report = match explicit {
		(Some(top), Some(signal), Some(arch), Some(template)) => {
			pass.run_explicit(&mut design, top, signal, arch, template)?
		},
		_ => pass.run(&mut design)?,
	};

	for outcome in report.failed() {
		warn!("Module {} was not mapped", outcome.module());
	}
	if let Some(path) = matches.get_one::<PathBuf>("report") {
		write_report(&report, path)?;
	}
	write_design(&design, matches.get_one::<PathBuf>("output"))
}

use crate::invocation::Invocation;
use log::{debug, warn};
use miette::Diagnostic;
use std::time::Duration;
use subprocess::{ExitStatus, Popen, PopenConfig, PopenError};
use thiserror::Error;

fn describe_status(status: &ExitStatus) -> String {
	use ExitStatus::*;
	match status {
		Exited(code) => format!("exit code {}", code),
		Signaled(signum) => format!("killed by signal {}", signum),
		Other(code) => format!("status {}", code),
		Undetermined => "undetermined status".into(),
	}
}

#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
	#[error("cannot start Lakeroad: {invocation}")]
	#[diagnostic(
		code(techmap::runner::spawn),
		help("Check that LAKEROAD_DIR points at a Lakeroad checkout with an executable bin/main.rkt")
	)]
	Spawn {
		invocation: String,
		#[source]
		source: PopenError,
	},

	#[error("lost track of Lakeroad process: {invocation}")]
	#[diagnostic(code(techmap::runner::wait))]
	Wait {
		invocation: String,
		#[source]
		source: PopenError,
	},

	#[error("Lakeroad execution failed ({}): {invocation}", describe_status(.status))]
	#[diagnostic(code(techmap::runner::failed))]
	Failed { invocation: String, status: ExitStatus },

	#[error("Lakeroad did not finish within {timeout:?} and was killed: {invocation}")]
	#[diagnostic(code(techmap::runner::timeout), help("Increase the timeout or simplify the module"))]
	TimedOut { invocation: String, timeout: Duration },
}

/// Something able to execute an oracle invocation
pub trait OracleRunner {
	/// Runs the invocation to completion. Success means exit code 0.
	fn run(&mut self, invocation: &Invocation) -> Result<(), RunError>;
}

/// Runs the oracle as a child process, without a shell in between
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner {
	timeout: Option<Duration>,
}

impl ProcessRunner {
	pub fn new(timeout: Option<Duration>) -> Self {
		Self { timeout }
	}

	fn wait(&self, process: &mut Popen, invocation: &Invocation) -> Result<ExitStatus, RunError> {
		let wait_error = |source| RunError::Wait {
			invocation: invocation.to_string(),
			source,
		};

		let timeout = match self.timeout {
			None => return process.wait().map_err(wait_error),
			Some(timeout) => timeout,
		};

		if let Some(status) = process.wait_timeout(timeout).map_err(wait_error)? {
			return Ok(status);
		}

		warn!("Lakeroad did not finish within {:?}, killing it", timeout);
		process.kill().map_err(|err| wait_error(err.into()))?;
		process.wait().map_err(wait_error)?;
		Err(RunError::TimedOut {
			invocation: invocation.to_string(),
			timeout,
		})
	}
}

impl OracleRunner for ProcessRunner {
	fn run(&mut self, invocation: &Invocation) -> Result<(), RunError> {
		let argv = invocation.argv();
		let mut process = Popen::create(&argv[..], PopenConfig::default()).map_err(|source| RunError::Spawn {
			invocation: invocation.to_string(),
			source,
		})?;
		debug!("Lakeroad started (pid {:?})", process.pid());

		match self.wait(&mut process, invocation)? {
			ExitStatus::Exited(0) => Ok(()),
			status => Err(RunError::Failed {
				invocation: invocation.to_string(),
				status,
			}),
		}
	}
}

#[cfg(all(test, unix))]
mod test {
	use super::*;

	fn shell(script: &str) -> Invocation {
		Invocation::new("/bin/sh", vec!["-c".into(), script.into()])
	}

	#[test]
	fn test_success() {
		assert!(ProcessRunner::default().run(&shell("exit 0")).is_ok());
	}

	#[test]
	fn test_nonzero_exit_carries_invocation() {
		let err = ProcessRunner::default()
			.run(&shell("exit 3"))
			.expect_err("failure expected");
		assert!(matches!(err, RunError::Failed { status: ExitStatus::Exited(3), .. }));
		let message = err.to_string();
		assert!(message.contains("exit code 3"), "{}", message);
		assert!(message.contains("/bin/sh -c exit 3"), "{}", message);
	}

	#[test]
	fn test_missing_executable() {
		let invocation = Invocation::new("/nonexistent/lakeroad/bin/main.rkt", vec![]);
		let err = ProcessRunner::default().run(&invocation).expect_err("failure expected");
		assert!(matches!(err, RunError::Spawn { .. }));
	}

	#[test]
	fn test_timeout() {
		let mut runner = ProcessRunner::new(Some(Duration::from_millis(100)));
		let err = runner.run(&shell("sleep 10")).expect_err("timeout expected");
		assert!(matches!(err, RunError::TimedOut { .. }));
	}

	#[test]
	fn test_finishes_within_timeout() {
		let mut runner = ProcessRunner::new(Some(Duration::from_secs(10)));
		assert!(runner.run(&shell("exit 0")).is_ok());
	}
}

use chrono::{DateTime, Utc};
use hirn::IdString;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModuleOutcome {
	/// Module now holds the Lakeroad output, which was ingested as `replacement`
	Replaced { module: String, replacement: String },

	/// Module was left untouched
	Failed { module: String, error: String },
}

impl ModuleOutcome {
	pub fn module(&self) -> &str {
		match self {
			ModuleOutcome::Replaced { module, .. } | ModuleOutcome::Failed { module, .. } => module,
		}
	}

	pub fn is_replaced(&self) -> bool {
		matches!(self, ModuleOutcome::Replaced { .. })
	}
}

/// Summary of a single pass run
#[derive(Clone, Debug, Serialize)]
pub struct PassReport {
	pub started: DateTime<Utc>,
	pub finished: Option<DateTime<Utc>>,
	pub modules: Vec<ModuleOutcome>,
}

impl PassReport {
	pub fn new() -> Self {
		Self {
			started: Utc::now(),
			finished: None,
			modules: vec![],
		}
	}

	pub fn record_replaced(&mut self, module: &IdString, replacement: &IdString) {
		self.modules.push(ModuleOutcome::Replaced {
			module: module.to_string(),
			replacement: replacement.to_string(),
		});
	}

	/// Records a failure together with the whole chain of its causes
	pub fn record_failed(&mut self, module: &IdString, error: &dyn std::error::Error) {
		let mut message = error.to_string();
		let mut source = error.source();
		while let Some(cause) = source {
			message.push_str(": ");
			message.push_str(&cause.to_string());
			source = cause.source();
		}

		self.modules.push(ModuleOutcome::Failed {
			module: module.to_string(),
			error: message,
		});
	}

	pub fn finish(&mut self) {
		self.finished = Some(Utc::now());
	}

	pub fn replaced_count(&self) -> usize {
		self.modules.iter().filter(|m| m.is_replaced()).count()
	}

	pub fn failed(&self) -> impl Iterator<Item = &ModuleOutcome> {
		self.modules.iter().filter(|m| !m.is_replaced())
	}

	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}
}

impl Default for PassReport {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::fmt;

	#[derive(Debug)]
	struct Outer(Inner);

	#[derive(Debug)]
	struct Inner;

	impl fmt::Display for Outer {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "Lakeroad failed on module b")
		}
	}

	impl fmt::Display for Inner {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "exit code 1")
		}
	}

	impl std::error::Error for Outer {
		fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
			Some(&self.0)
		}
	}

	impl std::error::Error for Inner {}

	#[test]
	fn test_report_json() -> Result<(), Box<dyn std::error::Error>> {
		let mut report = PassReport::new();
		report.record_replaced(&IdString::new("a")?, &IdString::new("a_synthesized_by_lakeroad")?);
		report.record_failed(&IdString::new("b")?, &Outer(Inner));
		report.finish();

		assert_eq!(report.replaced_count(), 1);
		assert_eq!(report.failed().map(|m| m.module()).collect::<Vec<_>>(), ["b"]);

		let json: serde_json::Value = serde_json::from_str(&report.to_json()?)?;
		assert_eq!(json["modules"][0]["status"], "replaced");
		assert_eq!(json["modules"][0]["replacement"], "a_synthesized_by_lakeroad");
		assert_eq!(json["modules"][1]["status"], "failed");
		assert_eq!(json["modules"][1]["error"], "Lakeroad failed on module b: exit code 1");
		assert!(json["finished"].is_string());
		Ok(())
	}
}

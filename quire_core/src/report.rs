/// How loud a collected diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
	/// Progress detail, only interesting in verbose runs.
	Note,
	/// Something was skipped, dropped, or patched over; the run continues.
	Warning,
}

/// A single collected diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
	pub severity: Severity,
	pub message: String,
}

impl Diagnostic {
	pub fn is_warning(&self) -> bool {
		self.severity == Severity::Warning
	}
}

/// An ordered collector for pipeline diagnostics.
///
/// Every pipeline entry point takes `&mut Report` instead of printing, so
/// callers decide what reaches the console and tests can assert on what a
/// stage reported. Warnings never abort anything by themselves; fatal
/// conditions travel as [`QuireError`](crate::QuireError) instead.
#[derive(Debug, Default)]
pub struct Report {
	entries: Vec<Diagnostic>,
}

impl Report {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a verbose-only progress note.
	pub fn note(&mut self, message: impl Into<String>) {
		self.entries.push(Diagnostic {
			severity: Severity::Note,
			message: message.into(),
		});
	}

	/// Record a warning.
	pub fn warn(&mut self, message: impl Into<String>) {
		self.entries.push(Diagnostic {
			severity: Severity::Warning,
			message: message.into(),
		});
	}

	pub fn entries(&self) -> &[Diagnostic] {
		&self.entries
	}

	pub fn warning_count(&self) -> usize {
		self.entries.iter().filter(|d| d.is_warning()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Take all collected diagnostics, leaving the report empty for the next
	/// stage.
	pub fn drain(&mut self) -> Vec<Diagnostic> {
		std::mem::take(&mut self.entries)
	}

	/// The warning messages only, in collection order.
	pub fn warnings(&self) -> Vec<&str> {
		self.entries
			.iter()
			.filter(|d| d.is_warning())
			.map(|d| d.message.as_str())
			.collect()
	}
}

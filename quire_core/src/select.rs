use std::fs;
use std::path::Path;

use crate::QuireResult;
use crate::rules::RuleMode;
use crate::rules::RuleScope;
use crate::rules::SelectionRule;

/// A source file under consideration for the book, with the three path
/// views that selection rules can target.
#[derive(Debug, Clone)]
pub struct Candidate {
	pub filename: String,
	/// The containing folder, as passed to `filepath`-scoped rules and path
	/// filters.
	pub folder: String,
	pub full_path: String,
	pub contents: String,
}

impl Candidate {
	pub fn read(path: &Path) -> QuireResult<Self> {
		let contents = fs::read_to_string(path)?;
		Ok(Self {
			filename: path
				.file_name()
				.map(|name| name.to_string_lossy().into_owned())
				.unwrap_or_default(),
			folder: path
				.parent()
				.map(|parent| parent.display().to_string())
				.unwrap_or_default(),
			full_path: path.display().to_string(),
			contents,
		})
	}
}

/// The outcome of running a candidate through the selection rules.
#[derive(Debug, Clone)]
pub enum Verdict {
	Keep,
	Drop(DropReason),
}

/// Everything needed to explain why a file was dropped: the decisive
/// rule's shape plus the match result that made it decisive.
#[derive(Debug, Clone)]
pub struct DropReason {
	pub mode: RuleMode,
	pub scope: RuleScope,
	/// The search result after negation, as seen by the rule.
	pub matched: bool,
	pub search_text: String,
	pub search_negated: bool,
	/// Pattern text and negation of the path filter, when one was set.
	pub path_filter: Option<(String, bool)>,
	pub comment: Option<String>,
}

impl DropReason {
	/// A human-readable account of the decision, using the rule's comment
	/// when it has one and a description of the patterns otherwise.
	pub fn describe(&self) -> String {
		let rule = match &self.comment {
			Some(comment) => comment.clone(),
			None => {
				let mut text = format!("\"{}\"", self.search_text);
				if self.search_negated {
					text.push_str(" (negated)");
				}
				if let Some((filter, negated)) = &self.path_filter {
					text.push_str(&format!(", path filter \"{filter}\""));
					if *negated {
						text.push_str(" (negated)");
					}
				}
				text
			}
		};

		format!(
			"{} {} {}: {}",
			self.scope.description(),
			if self.matched { "matched" } else { "did not match" },
			self.mode.description(),
			rule
		)
	}
}

/// Run the candidate through the rules in file order. The first rule that
/// calls for a drop wins; an inclusion that matches just lets the file move
/// on to the next rule. No rules, or no decisive rule, keeps the file.
pub fn decide(candidate: &Candidate, rules: &[SelectionRule]) -> Verdict {
	for rule in rules {
		if let Some(filter) = &rule.path_filter {
			if !filter.matches(&candidate.folder) {
				continue;
			}
		}

		let target = match rule.scope {
			RuleScope::FileName => candidate.filename.as_str(),
			RuleScope::FilePath => candidate.folder.as_str(),
			RuleScope::FullPath => candidate.full_path.as_str(),
			RuleScope::Contents => candidate.contents.as_str(),
		};
		let matched = rule.search.matches(target);
		let decisive = match rule.mode {
			RuleMode::Exclude => matched,
			RuleMode::Include => !matched,
		};

		if decisive {
			return Verdict::Drop(DropReason {
				mode: rule.mode,
				scope: rule.scope,
				matched,
				search_text: rule.search.pattern().to_string(),
				search_negated: rule.search.is_negated(),
				path_filter: rule
					.path_filter
					.as_ref()
					.map(|filter| (filter.pattern().to_string(), filter.is_negated())),
				comment: rule.comment.clone(),
			});
		}
	}

	Verdict::Keep
}

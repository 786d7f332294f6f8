use std::fs;
use std::path::Path;

use regex::Regex;

use crate::Metadata;
use crate::Report;
use crate::macros::regex;
use crate::pattern;
use crate::pattern::CompiledPattern;
use crate::pattern::PatternFlag;

/// Path-filter field value meaning "apply to every folder".
const PATH_ANY: &str = "*";

/// Whether a matching selection rule keeps or drops a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
	Include,
	Exclude,
}

impl RuleMode {
	fn parse(word: &str) -> Option<Self> {
		match word {
			"include" | "i" => Some(Self::Include),
			"exclude" | "e" => Some(Self::Exclude),
			_ => None,
		}
	}

	/// The noun used when reporting a decisive match against this rule.
	pub fn description(self) -> &'static str {
		match self {
			Self::Include => "inclusion",
			Self::Exclude => "exclusion",
		}
	}
}

/// Which part of a candidate file the search pattern runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
	FileName,
	FilePath,
	FullPath,
	Contents,
}

impl RuleScope {
	fn parse(word: &str) -> Option<Self> {
		match word {
			"filename" | "f" => Some(Self::FileName),
			"filepath" | "p" => Some(Self::FilePath),
			"fullpath" | "u" => Some(Self::FullPath),
			"contents" | "c" => Some(Self::Contents),
			_ => None,
		}
	}

	pub fn description(self) -> &'static str {
		match self {
			Self::FileName => "filename",
			Self::FilePath => "file path",
			Self::FullPath => "entire path",
			Self::Contents => "contents",
		}
	}
}

/// One row of a selection rule file, ready to evaluate.
#[derive(Debug, Clone)]
pub struct SelectionRule {
	pub mode: RuleMode,
	pub scope: RuleScope,
	/// Restricts the rule to files whose containing folder matches. `None`
	/// when the rule file carried the `*` wildcard.
	pub path_filter: Option<CompiledPattern>,
	pub search: CompiledPattern,
	pub comment: Option<String>,
}

/// One row of a transformation rule file: a search pattern and the text
/// that replaces every match, applied to the whole assembled document.
#[derive(Debug, Clone)]
pub struct TransformRule {
	pub comment: Option<String>,
	pub search: Regex,
	/// Replacement text; `$1` and `${name}` refer to capture groups.
	pub replacement: String,
}

/// Parse selection rules from rule-file text. Blank lines and lines opening
/// with `#` are skipped; malformed or unusable rows are reported and
/// dropped rather than aborting the whole run.
pub fn parse_selection_rules(
	text: &str,
	metadata: &Metadata,
	report: &mut Report,
) -> Vec<SelectionRule> {
	let mut rules = Vec::new();

	for (index, raw_line) in text.lines().enumerate() {
		let line = raw_line.trim_end_matches('\r');
		if is_skippable(line) {
			continue;
		}

		// Editors love padding column alignment with extra tabs; collapse
		// runs before splitting.
		let collapsed = regex!(r"\t+").replace_all(line, "\t");
		let fields: Vec<&str> = collapsed.split('\t').collect();
		if fields.len() < 4 {
			report.warn(format!(
				"selection rule on line {} is malformed; expected mode, scope, path filter, and search pattern",
				index + 1
			));
			continue;
		}

		let Some(mode) = RuleMode::parse(fields[0]) else {
			report.warn(format!(
				"selection rule on line {} has unknown mode `{}`; ignoring it",
				index + 1,
				fields[0]
			));
			continue;
		};
		let Some(scope) = RuleScope::parse(fields[1]) else {
			report.warn(format!(
				"selection rule on line {} has unknown scope `{}`; ignoring it",
				index + 1,
				fields[1]
			));
			continue;
		};

		let comment_field = if fields.len() > 4 {
			let joined = fields[4..].join("\t");
			let trimmed = joined.trim_end().to_string();
			(!trimmed.is_empty()).then_some(trimmed)
		} else {
			None
		};

		let search_prepared = match pattern::preprocess(fields[3], metadata) {
			Ok(prepared) => prepared,
			Err(issue) => {
				report.warn(format!("{}; ignoring this rule", issue.message()));
				continue;
			}
		};
		let path_prepared = match pattern::preprocess(fields[2], metadata) {
			Ok(prepared) => prepared,
			Err(issue) => {
				report.warn(format!("{}; ignoring this rule", issue.message()));
				continue;
			}
		};
		let used_metadata = search_prepared.used_metadata || path_prepared.used_metadata;
		if used_metadata {
			report.note(format!(
				"substituted metadata tokens into rule on line {}",
				index + 1
			));
		}

		// The wildcard is recognized after token substitution, so a
		// metadata value can itself stand for "any folder".
		let path_filter = if path_prepared.text == PATH_ANY {
			None
		} else {
			match path_prepared.compile() {
				Ok(compiled) => Some(compiled),
				Err(issue) => {
					report.warn(format!("{}; ignoring this rule", issue.message()));
					continue;
				}
			}
		};
		let search = match search_prepared.compile() {
			Ok(compiled) => compiled,
			Err(issue) => {
				report.warn(format!("{}; ignoring this rule", issue.message()));
				continue;
			}
		};

		let comment = match comment_field {
			None => None,
			Some(raw_comment) => {
				let own_flag = pattern::has_flag(&raw_comment, PatternFlag::Metadata);
				if used_metadata || own_flag {
					let stripped = if own_flag {
						pattern::strip_flag(&raw_comment, PatternFlag::Metadata)
					} else {
						raw_comment
					};
					match pattern::substitute_metadata_tokens(&stripped, metadata) {
						Ok(resolved) => Some(resolved),
						Err(issue) => {
							report.warn(format!("{}; ignoring this rule", issue.message()));
							continue;
						}
					}
				} else {
					Some(raw_comment)
				}
			}
		};

		rules.push(SelectionRule {
			mode,
			scope,
			path_filter,
			search,
			comment,
		});
	}

	rules
}

/// Build the selection rule behind a bare exclude pattern given on the
/// command line: an exclusion on filenames with no path filter. The pattern
/// goes through the same flag handling as rule-file rows, so `(?N)` and
/// `(?M)` work here too.
pub fn filename_exclude_rule(
	raw: &str,
	metadata: &Metadata,
	report: &mut Report,
) -> Option<SelectionRule> {
	let prepared = match pattern::preprocess(raw, metadata) {
		Ok(prepared) => prepared,
		Err(issue) => {
			report.warn(format!("{}; ignoring exclude `{raw}`", issue.message()));
			return None;
		}
	};
	let search = match prepared.compile() {
		Ok(compiled) => compiled,
		Err(issue) => {
			report.warn(format!("{}; ignoring exclude `{raw}`", issue.message()));
			return None;
		}
	};

	Some(SelectionRule {
		mode: RuleMode::Exclude,
		scope: RuleScope::FileName,
		path_filter: None,
		search,
		comment: None,
	})
}

/// Parse transformation rules from rule-file text. Rows are
/// comment / search / replacement; a missing replacement field deletes the
/// matched text.
pub fn parse_transform_rules(text: &str, report: &mut Report) -> Vec<TransformRule> {
	let mut rules = Vec::new();

	for (index, raw_line) in text.lines().enumerate() {
		let line = raw_line.trim_end_matches('\r');
		if is_skippable(line) {
			continue;
		}

		let collapsed = regex!(r"\t+").replace_all(line, "\t");
		let fields: Vec<&str> = collapsed.split('\t').collect();
		if fields.len() < 2 {
			report.warn(format!(
				"transformation rule on line {} is malformed; expected comment, search, and replacement fields",
				index + 1
			));
			continue;
		}

		let search = match Regex::new(fields[1]) {
			Ok(compiled) => compiled,
			Err(error) => {
				report.warn(format!(
					"`{}` is not a valid pattern: {error}; ignoring this rule",
					fields[1]
				));
				continue;
			}
		};

		rules.push(TransformRule {
			comment: (!fields[0].is_empty()).then(|| fields[0].to_string()),
			search,
			replacement: fields.get(2).map(|field| (*field).to_string()).unwrap_or_default(),
		});
	}

	rules
}

/// Load selection rules from a file, or an empty set when the file is
/// absent. A missing rule file is normal and only worth a note.
pub fn load_selection_rules(
	path: &Path,
	metadata: &Metadata,
	report: &mut Report,
) -> Vec<SelectionRule> {
	match read_rule_file(path, "selection rules", report) {
		Some(text) => parse_selection_rules(&text, metadata, report),
		None => Vec::new(),
	}
}

/// Load transformation rules from a file, or an empty set when the file is
/// absent.
pub fn load_transform_rules(path: &Path, report: &mut Report) -> Vec<TransformRule> {
	match read_rule_file(path, "transformation rules", report) {
		Some(text) => parse_transform_rules(&text, report),
		None => Vec::new(),
	}
}

fn is_skippable(line: &str) -> bool {
	let trimmed = line.trim_start();
	trimmed.is_empty() || trimmed.starts_with('#')
}

fn read_rule_file(path: &Path, what: &str, report: &mut Report) -> Option<String> {
	if !path.is_file() {
		report.note(format!("no {what} file at `{}`; continuing", path.display()));
		return None;
	}

	match fs::read_to_string(path) {
		Ok(text) => {
			report.note(format!("reading {what} from `{}`", path.display()));
			Some(text)
		}
		Err(error) => {
			report.warn(format!(
				"couldn't read {what} file `{}`: {error}",
				path.display()
			));
			None
		}
	}
}

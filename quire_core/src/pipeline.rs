use crate::QuireError;
use crate::QuireResult;
use crate::Report;
use crate::directive;
use crate::macros::regex;
use crate::rules::SelectionRule;
use crate::rules::TransformRule;
use crate::select;
use crate::select::Candidate;
use crate::select::Verdict;
use crate::transform;

/// Normalize line endings to `\n`, handling both CRLF and bare CR.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Toggles for the assembly stages that can be switched off per run.
/// Selection and transformation are controlled by the rule sets handed to
/// [`assemble`]; an empty set is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions {
	/// Expand `{outline ...}` directives in the collated text.
	pub expand_outlines: bool,
	/// Count `TK` placeholder markers in every selected file.
	pub check_tks: bool,
}

impl Default for AssembleOptions {
	fn default() -> Self {
		Self {
			expand_outlines: true,
			check_tks: true,
		}
	}
}

/// The collated book, plus the facts about how it was put together that
/// callers report or act on.
#[derive(Debug, Clone)]
pub struct Assembled {
	/// The full document after collation, outlines, and transformations.
	pub text: String,
	/// Full paths of the selected files, in collation order.
	pub included: Vec<String>,
	pub dropped: usize,
	/// Total `TK` markers across all selected files.
	pub tk_total: usize,
	/// Filename and marker count for each selected file carrying TKs.
	pub tk_files: Vec<(String, usize)>,
}

/// Run candidates through selection and collate the survivors into one
/// document: contents are normalized, joined with a single newline, then
/// outline directives expand and transformations apply in order.
///
/// Dropping every candidate is fatal; there is no book to build.
pub fn assemble(
	candidates: Vec<Candidate>,
	selection: &[SelectionRule],
	transforms: &[TransformRule],
	options: &AssembleOptions,
	report: &mut Report,
) -> QuireResult<Assembled> {
	let mut documents: Vec<String> = Vec::new();
	let mut included = Vec::new();
	let mut dropped = 0;
	let mut tk_files: Vec<(String, usize)> = Vec::new();
	let mut tk_total = 0;

	for candidate in candidates {
		match select::decide(&candidate, selection) {
			Verdict::Drop(reason) => {
				dropped += 1;
				report.note(format!(
					"file excluded, as requested: {} ({})",
					candidate.full_path,
					reason.describe()
				));
			}
			Verdict::Keep => {
				if options.check_tks {
					let count = regex!(r"(?i)\b(?:TK)+\b")
						.find_iter(&candidate.contents)
						.count();
					if count > 0 {
						tk_total += count;
						tk_files.push((candidate.filename.clone(), count));
					}
				}
				documents.push(normalize_line_endings(&candidate.contents));
				included.push(candidate.full_path);
			}
		}
	}

	let dropped_note = if dropped > 0 {
		format!(
			" ({dropped} file{} excluded)",
			if dropped == 1 { "" } else { "s" }
		)
	} else {
		String::new()
	};
	report.note(format!(
		"{} Markdown files read{dropped_note}",
		documents.len()
	));

	if documents.is_empty() {
		return Err(QuireError::NothingSelected);
	}

	if options.check_tks {
		if tk_files.is_empty() {
			report.note("no TKs found");
		} else {
			let listing = tk_files
				.iter()
				.map(|(filename, count)| {
					format!("- {filename} ({count} TK{})", if *count == 1 { "" } else { "s" })
				})
				.collect::<Vec<_>>()
				.join("\n");
			report.warn(format!("TKs are present in the following files:\n{listing}"));
		}
	}

	let mut text = documents.join("\n");
	if options.expand_outlines {
		text = directive::expand(&text, report);
	}
	if !transforms.is_empty() {
		report.note(format!(
			"applying {} transformation{}",
			transforms.len(),
			if transforms.len() == 1 { "" } else { "s" }
		));
		text = transform::apply_transforms(text, transforms, report);
	}

	Ok(Assembled {
		text,
		included,
		dropped,
		tk_total,
		tk_files,
	})
}

//! Expands `{outline ...}` directive lines into rendered outlines of the
//! text that follows them.

use regex::Captures;

use crate::Report;
use crate::macros::regex;
use crate::outline;
use crate::outline::OutlineFormat;
use crate::outline::OutlineOptions;

/// Parse one directive's option text. The second value is true when the
/// `all` keyword asked for the outline to cover the whole document rather
/// than just the text after the directive.
fn parse_options(args: &str) -> (OutlineOptions, bool) {
	let mut options = OutlineOptions::default();
	let mut whole_document = false;

	if let Some(depth) = regex!(r#"(?i)depth=['"]?(\d+)['"]?"#)
		.captures(args)
		.and_then(|caps| caps.get(1))
		.and_then(|m| m.as_str().parse::<usize>().ok())
	{
		options.depth = depth;
	}
	if let Some(start) = regex!(r#"(?i)start=['"]?(\d+)['"]?"#)
		.captures(args)
		.and_then(|caps| caps.get(1))
		.and_then(|m| m.as_str().parse::<usize>().ok())
	{
		options.start = start.max(1);
	}

	// Bare keywords. The guard in front keeps class tokens like `.all`
	// from being read as keywords.
	if regex!(r"(?i)(?:^|[^.\w])all\b").is_match(args) {
		whole_document = true;
	}
	if regex!(r"(?i)(?:^|[^.\w])unordered\b").is_match(args) {
		options.ordered = false;
	}
	if regex!(r"(?i)(?:^|[^.\w])plain\b").is_match(args) {
		options.plain = true;
	}

	for caps in regex!(r"\.(\S+)").captures_iter(args) {
		if let Some(class) = caps.get(1) {
			options.classes.push(class.as_str().to_string());
		}
	}

	if let Some(output) = regex!(r#"(?i)output=['"]?(\w+)"#)
		.captures(args)
		.and_then(|caps| caps.get(1))
	{
		if !output.as_str().eq_ignore_ascii_case("markdown") {
			options.format = OutlineFormat::Html;
		}
	}

	(options, whole_document)
}

/// Replace every directive line in `text` with an outline rendered from the
/// directive's options. Each outline normally covers the text after its own
/// directive, so a front-matter outline doesn't list front-matter headings.
pub fn expand(text: &str, report: &mut Report) -> String {
	regex!(r"(?im)^\{outline(?:\s+([^}]+?)\s*)?\}")
		.replace_all(text, |caps: &Captures| {
			let (options, whole_document) = match caps.get(1) {
				Some(args) => parse_options(args.as_str()),
				None => (OutlineOptions::default(), false),
			};
			let scope_start = if whole_document {
				0
			} else {
				caps.get(0).map_or(0, |m| m.end())
			};
			outline::render(&text[scope_start..], &options, report)
		})
		.into_owned()
}

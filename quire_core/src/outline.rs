//! Builds a nested outline of a document's atx headings and renders it as a
//! Markdown list or as HTML list markup, each entry linking to its heading's
//! anchor.

use crate::Report;
use crate::macros::regex;

/// Class always carried by a non-plain outline list, after any classes the
/// directive adds.
const OUTLINE_CLASS: &str = "outline";

/// How a rendered outline is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineFormat {
	/// A nested Markdown list, using an attribute line for classes.
	Markdown,
	/// Nested `<ol>`/`<ul>` markup with class attributes.
	Html,
}

/// Everything that shapes a rendered outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineOptions {
	/// Shallowest heading level to include, 1-based.
	pub start: usize,
	/// Deepest heading level to include. Raised to `start` when the two
	/// would cross.
	pub depth: usize,
	/// Numbered entries (`1.` / `<ol>`) instead of bullets (`-` / `<ul>`).
	pub ordered: bool,
	/// Omit classes and the page-number link on every entry.
	pub plain: bool,
	pub format: OutlineFormat,
	/// Extra classes applied to the list as a whole.
	pub classes: Vec<String>,
}

impl Default for OutlineOptions {
	fn default() -> Self {
		Self {
			start: 1,
			depth: 3,
			ordered: true,
			plain: false,
			format: OutlineFormat::Markdown,
			classes: Vec::new(),
		}
	}
}

/// A heading admitted to the outline. `level` is relative to the configured
/// start level, so entries at the shallowest included level sit at 0.
#[derive(Debug, Clone)]
struct Entry {
	level: usize,
	title: String,
	slug: String,
}

/// Turn arbitrary title text into an anchor slug: quotes removed, every
/// other non-word run collapsed to a single hyphen, lowercased.
pub fn slugify(text: &str) -> String {
	let unquoted = regex!(r#"['"“”‘’]+"#).replace_all(text, "");
	let spaced = regex!(r"\W+").replace_all(&unquoted, " ");
	let hyphenated = regex!(r"\s+").replace_all(spaced.trim(), "-");
	hyphenated.trim_matches('-').to_lowercase()
}

/// Strip inline markup from a heading title: formatting characters and
/// quotes go, links keep their text, a trailing attribute string is cut.
fn clean_title(raw: &str) -> String {
	let stripped = regex!(r#"[_*`#'"“”‘’]"#).replace_all(raw, "");
	let unlinked = regex!(r"\[([^\]]+)\]\([^)]+\)").replace_all(&stripped, "$1");
	regex!(r"\{[^}]+\}\s*$")
		.replace_all(unlinked.trim(), "")
		.trim()
		.to_string()
}

/// An explicit `#id` inside a heading's attribute string, which overrides
/// the generated slug.
fn extract_id(raw: &str) -> Option<String> {
	regex!(r"\{[^}]*#([^\s}]+)")
		.captures(raw)
		.and_then(|caps| caps.get(1))
		.map(|id| id.as_str().to_string())
}

fn collect_entries(text: &str, start: usize, depth: usize) -> Vec<Entry> {
	let mut entries = Vec::new();

	for caps in regex!(r"(?m)^(#+)\s+(.+)").captures_iter(text) {
		let hashes = caps.get(1).map_or(0, |m| m.as_str().len());
		if hashes < start || hashes > depth {
			continue;
		}
		let raw_title = caps.get(2).map_or("", |m| m.as_str());
		// Headings can opt out of the outline through their attribute
		// string.
		if regex!(r"(?i)\.(no-?outline|unlisted)\b").is_match(raw_title) {
			continue;
		}

		let title = clean_title(raw_title);
		let slug = match extract_id(raw_title) {
			Some(id) => id,
			None => slugify(&title),
		};
		entries.push(Entry {
			level: hashes - start,
			title,
			slug,
		});
	}

	entries
}

/// Render the outline of every heading in `text` within the configured
/// level range. Yields an empty string when no heading qualifies.
pub fn render(text: &str, options: &OutlineOptions, report: &mut Report) -> String {
	let depth = options.depth.max(options.start);
	let entries = collect_entries(text, options.start, depth);
	if entries.is_empty() {
		return String::new();
	}

	match options.format {
		OutlineFormat::Markdown => render_markdown(&entries, options, report),
		OutlineFormat::Html => render_html(&entries, options, report),
	}
}

fn warn_jump(report: &mut Report, prev: Option<usize>, level: usize, title: &str) {
	report.warn(format!(
		"outline entry jumps from level {} to level {}: {title}",
		prev.unwrap_or(0) + 1,
		level + 1
	));
}

fn render_markdown(entries: &[Entry], options: &OutlineOptions, report: &mut Report) -> String {
	let mut lines: Vec<String> = Vec::new();
	// Ordered-list counters, one per open nesting level. The top starts at
	// 0 so the first entry's increment lands on 1.
	let mut numbers: Vec<u32> = vec![0];
	let mut prev: Option<usize> = None;

	for entry in entries {
		let level = entry.level;

		// A document that opens below the start level, or skips levels on
		// the way down, gets empty filler items so the nesting depth still
		// reflects the heading level.
		let fill_from = match prev {
			None if level > 0 => Some(0),
			Some(previous) if level > previous + 1 => Some(previous + 1),
			_ => None,
		};
		if let Some(from) = fill_from {
			warn_jump(report, prev, level, &entry.title);
			for x in from..level {
				lines.push(format!("{}- &nbsp;", "\t".repeat(x)));
			}
		}

		let previous = prev.unwrap_or(0);
		if level > previous {
			for _ in previous..level {
				numbers.push(1);
			}
		} else {
			if level < previous {
				for _ in level..previous {
					numbers.pop();
				}
			}
			if let Some(top) = numbers.last_mut() {
				*top += 1;
			}
		}
		let marker = if options.ordered {
			match numbers.last() {
				Some(top) => format!("{top}."),
				None => "-".to_string(),
			}
		} else {
			"-".to_string()
		};

		let indent = "\t".repeat(level);
		if options.plain {
			lines.push(format!("{indent}{marker} [{}](#{})", entry.title, entry.slug));
		} else {
			lines.push(format!(
				"{indent}{marker} [{}](#{}){{.section-title}}[](#{}){{.page-number}}",
				entry.title, entry.slug, entry.slug
			));
		}

		prev = Some(level);
	}

	let body = lines.join("\n");
	if options.plain {
		body
	} else {
		let mut classes = options.classes.clone();
		classes.push(OUTLINE_CLASS.to_string());
		format!("{{.{}}}\n{body}", classes.join(" ."))
	}
}

/// Push the `<ol>`/`<li>` pair that opens one nesting level. The whole
/// rendering leans on the outer wrapper supplying the level-0 list, so a
/// pair for relative level `x` sits `x` tabs in.
fn open_pair(lines: &mut Vec<String>, tag: &str, level: usize) {
	lines.push(format!("{}<{tag}>", "\t".repeat(level)));
	lines.push(format!("{}<li>", "\t".repeat(level + 1)));
}

fn append_last(lines: &mut Vec<String>, text: &str) {
	match lines.last_mut() {
		Some(last) => last.push_str(text),
		None => lines.push(text.to_string()),
	}
}

fn render_html(entries: &[Entry], options: &OutlineOptions, report: &mut Report) -> String {
	let tag = if options.ordered { "ol" } else { "ul" };
	let mut lines: Vec<String> = Vec::new();
	let mut prev: Option<usize> = None;

	for entry in entries {
		let level = entry.level;

		match prev {
			None => {
				// The outer wrapper already opens the first item; a level-0
				// entry lands directly on its line.
				lines.push(String::new());
				if level > 0 {
					warn_jump(report, None, level, &entry.title);
					for x in 1..=level {
						open_pair(&mut lines, tag, x);
					}
				}
			}
			Some(previous) if level > previous => {
				if level > previous + 1 {
					warn_jump(report, Some(previous), level, &entry.title);
				}
				for x in (previous + 1)..=level {
					open_pair(&mut lines, tag, x);
				}
			}
			Some(previous) if level == previous => {
				append_last(&mut lines, "</li>");
				lines.push(format!("{}<li>", "\t".repeat(level + 1)));
			}
			Some(previous) => {
				append_last(&mut lines, "</li>");
				for x in ((level + 1)..=previous).rev() {
					lines.push(format!("{}</{tag}></li>", "\t".repeat(x)));
				}
				lines.push(format!("{}<li>", "\t".repeat(level + 1)));
			}
		}

		let link = if options.plain {
			format!("<a href=\"#{}\">{}</a>", entry.slug, entry.title)
		} else {
			format!(
				"<a href=\"#{slug}\" class=\"section-title\">{title}</a><a href=\"#{slug}\" class=\"page-number\"></a>",
				slug = entry.slug,
				title = entry.title
			)
		};
		append_last(&mut lines, &link);

		prev = Some(level);
	}

	// Close whatever nesting the last entry left open; the outer wrapper
	// closes level 0 itself.
	let final_level = prev.unwrap_or(0);
	if final_level > 0 {
		append_last(&mut lines, "</li>");
		for x in (2..=final_level).rev() {
			lines.push(format!("{}</{tag}></li>", "\t".repeat(x)));
		}
		lines.push(format!("\t</{tag}>"));
	}

	let body = lines.join("\n");
	if options.plain {
		format!("<{tag}>\n\t<li>{body}</li>\n</{tag}>")
	} else {
		let mut classes = options.classes.clone();
		classes.push(OUTLINE_CLASS.to_string());
		format!(
			"<{tag} class=\"{}\">\n\t<li>{body}</li>\n</{tag}>",
			classes.join(" ")
		)
	}
}

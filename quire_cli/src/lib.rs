use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use once_cell::sync::Lazy;
use quire_core::QuireResult;
use quire_core::ReplacementMode;
use regex::Regex;

/// Optional file of extra command-line arguments, read from the working
/// directory before parsing.
pub const ARGS_FILENAME: &str = "args.txt";

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Assemble a folder of Markdown files into ebooks with pandoc.",
	long_about = "quire collates a folder of Markdown files into a single master document, \
	              applying selection rules, outline directives, transformations, and metadata \
	              placeholders along the way, then drives pandoc once per requested format to \
	              produce EPUB, PDF, and HTML editions.\n\nQuick start:\n  quire -i manuscript       \
	              Build epub and pdf using metadata.json\n  quire -i manuscript -f all  Build \
	              every format\n  quire -i manuscript -- --toc  Pass extra arguments through to \
	              pandoc\n\nAn `args.txt` file in the working directory supplies default \
	              arguments, one per line."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct QuireCli {
	/// Folder of Markdown files to assemble, searched recursively.
	#[arg(long, short = 'i', value_name = "DIR")]
	pub input_folder: PathBuf,

	/// Patterns matching filenames to exclude, evaluated ahead of any rules
	/// from the selection file.
	#[arg(long, short = 'e', value_name = "REGEX")]
	pub exclude: Vec<String>,

	/// JSON file with the book's metadata.
	#[arg(long, short = 'j', default_value = "metadata.json", value_name = "FILE")]
	pub metadata_file: PathBuf,

	/// File of selection rules.
	#[arg(long, default_value = "selection.tsv", value_name = "FILE")]
	pub selection_file: PathBuf,

	/// File of transformations to perform on the assembled document.
	#[arg(long, default_value = "transformations.tsv", value_name = "FILE")]
	pub transformations_file: PathBuf,

	/// Placeholder replacement system to run on the assembled document.
	#[arg(long, short = 'm', value_enum, default_value_t = PlaceholderMode::Basic)]
	pub replacement_mode: PlaceholderMode,

	/// Output filename without extension; derived from metadata when
	/// omitted.
	#[arg(long, short = 'o', value_name = "NAME")]
	pub output_basename: Option<String>,

	/// Output formats to build, as many as required.
	#[arg(long, short = 'f', value_enum, num_args = 1.., default_values_t = [BuildFormat::Epub, BuildFormat::Pdf])]
	pub formats: Vec<BuildFormat>,

	/// Language for the book being generated; metadata keys like `title_de`
	/// then override their base entries.
	#[arg(long, short = 'l', value_name = "CODE")]
	pub lang: Option<String>,

	/// Skip selection rules entirely, including `--exclude` patterns.
	#[arg(long, default_value_t = false)]
	pub no_selection: bool,

	/// Skip transformation rules entirely.
	#[arg(long, default_value_t = false)]
	pub no_transformations: bool,

	/// Leave `{outline ...}` directives unexpanded.
	#[arg(long, default_value_t = false)]
	pub no_outlines: bool,

	/// Skip counting TK markers in the source files.
	#[arg(long, default_value_t = false)]
	pub no_check_tks: bool,

	/// Treat TKs as errors and stop before building.
	#[arg(long, short = 'k', default_value_t = false)]
	pub stop_on_tks: bool,

	/// Keep the collated master Markdown file after generating books,
	/// instead of deleting it.
	#[arg(long, short = 'c', default_value_t = false)]
	pub retain_master: bool,

	/// Tell pandoc to enable its own verbose logging.
	#[arg(long, default_value_t = false)]
	pub pandoc_verbose: bool,

	/// Display the actual pandoc command for each format before running it.
	#[arg(long, short = 'p', default_value_t = false)]
	pub show_pandoc_commands: bool,

	/// Directory holding the pandoc defaults files (`options-shared.yaml`,
	/// `options-epub.yaml`, `options-pdf.yaml`).
	#[arg(long, default_value = ".", value_name = "DIR")]
	pub options_dir: PathBuf,

	/// Enable verbose output.
	#[arg(long, short = 'v', default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,

	/// Extra arguments appended verbatim to every pandoc invocation, given
	/// after `--`. Any `-M key=value` pairs here also reach placeholder
	/// substitution.
	#[arg(last = true, value_name = "PANDOC_ARGS")]
	pub pandoc_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildFormat {
	/// EPUB ebook.
	Epub,
	/// PDF via the print stylesheet.
	Pdf,
	/// PDF at 6"×9" trim size.
	#[value(name = "pdf-6x9")]
	Pdf6x9,
	/// Standalone HTML, built with the pdf defaults.
	Html,
	/// Every concrete format above.
	All,
}

impl BuildFormat {
	pub fn label(self) -> &'static str {
		match self {
			Self::Epub => "epub",
			Self::Pdf => "pdf",
			Self::Pdf6x9 => "pdf-6x9",
			Self::Html => "html",
			Self::All => "all",
		}
	}

	/// The pandoc defaults file this format builds with. The HTML build
	/// reuses the pdf defaults; `All` never reaches the build loop (see
	/// [`expand_formats`]).
	pub fn defaults_filename(self) -> &'static str {
		match self {
			Self::Epub => "options-epub.yaml",
			Self::Pdf | Self::Pdf6x9 | Self::Html | Self::All => "options-pdf.yaml",
		}
	}

	pub fn output_filename(self, basename: &str) -> String {
		match self {
			Self::Epub => format!("{basename}.epub"),
			Self::Pdf | Self::All => format!("{basename}.pdf"),
			Self::Pdf6x9 => format!("{basename}-6x9.pdf"),
			Self::Html => format!("{basename}.html"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlaceholderMode {
	/// Replace `%key%` tokens with their metadata values.
	Basic,
	/// Render the whole document as a minijinja template with the metadata
	/// as context.
	Jinja,
	/// Leave the document untouched.
	None,
}

impl From<PlaceholderMode> for ReplacementMode {
	fn from(mode: PlaceholderMode) -> Self {
		match mode {
			PlaceholderMode::Basic => Self::Basic,
			PlaceholderMode::Jinja => Self::Jinja,
			PlaceholderMode::None => Self::None,
		}
	}
}

/// Turn the contents of an args file into command-line tokens. Blank lines
/// and `#` comments are skipped; each remaining line contributes its first
/// whitespace-separated word plus the rest of the line, so `--exclude ^notes`
/// arrives as two tokens with the value intact.
pub fn args_file_tokens(text: &str) -> Vec<String> {
	let mut tokens = Vec::new();

	for line in text.lines() {
		let trimmed = line.trim();
		if trimmed.is_empty() || trimmed.starts_with('#') {
			continue;
		}
		match trimmed.split_once(char::is_whitespace) {
			Some((flag, rest)) => {
				tokens.push(flag.to_string());
				tokens.push(rest.trim_start().to_string());
			}
			None => tokens.push(trimmed.to_string()),
		}
	}

	tokens
}

/// Resolve `all` and drop duplicate formats, preserving first-seen order.
pub fn expand_formats(requested: &[BuildFormat]) -> Vec<BuildFormat> {
	let mut formats = Vec::new();
	let push = |format: BuildFormat, formats: &mut Vec<BuildFormat>| {
		if !formats.contains(&format) {
			formats.push(format);
		}
	};

	for format in requested {
		match format {
			BuildFormat::All => {
				for concrete in [
					BuildFormat::Epub,
					BuildFormat::Pdf,
					BuildFormat::Pdf6x9,
					BuildFormat::Html,
				] {
					push(concrete, &mut formats);
				}
			}
			concrete => push(*concrete, &mut formats),
		}
	}

	formats
}

static METADATA_ARG: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"(?:--metadata[ =]|-M )([^ =:]+)[=:](['"].+?['"]|\S+)"#).unwrap()
});

/// Pull `key=value` pairs out of pandoc passthrough arguments, so values
/// given as `-M key=value` or `--metadata key:value` also participate in
/// placeholder substitution. Values wrapped in matching quotes are unwrapped.
pub fn mirror_metadata_args(extra_args: &[String]) -> Vec<(String, String)> {
	let joined = extra_args.join(" ");
	let mut pairs = Vec::new();

	for caps in METADATA_ARG.captures_iter(&joined) {
		let key = caps[1].to_string();
		let value = trim_value_quotes(&caps[2]).to_string();
		pairs.push((key, value));
	}

	pairs
}

fn trim_value_quotes(value: &str) -> &str {
	let bytes = value.as_bytes();
	if bytes.len() > 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0]
	{
		&value[1..value.len() - 1]
	} else {
		value
	}
}

/// Every Markdown file under `folder`, recursively. Dot-prefixed files and
/// folders are skipped; results are sorted natural-alphanumerically by full
/// path, so `2-b.md` sorts before `10-a.md`.
pub fn collect_markdown_files(folder: &Path) -> QuireResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut pending = vec![folder.to_path_buf()];

	while let Some(dir) = pending.pop() {
		for entry in fs::read_dir(&dir)? {
			let entry = entry?;
			if entry.file_name().to_string_lossy().starts_with('.') {
				continue;
			}
			let path = entry.path();
			if entry.file_type()?.is_dir() {
				pending.push(path);
			} else if has_markdown_extension(&path) {
				files.push(path);
			}
		}
	}

	files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
	Ok(files)
}

fn has_markdown_extension(path: &Path) -> bool {
	matches!(
		path.extension().and_then(|extension| extension.to_str()),
		Some("md" | "markdown" | "mdown")
	)
}

/// Case-insensitive ordering that compares runs of digits by numeric value,
/// so chapter `2` sorts before chapter `10`.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
	let left_chunks = natural_chunks(left);
	let right_chunks = natural_chunks(right);
	let mut right_iter = right_chunks.iter();

	for left_chunk in &left_chunks {
		let Some(right_chunk) = right_iter.next() else {
			return Ordering::Greater;
		};
		let ordering = match (left_chunk, right_chunk) {
			(Chunk::Number(a), Chunk::Number(b)) => compare_digits(a, b),
			(Chunk::Text(a), Chunk::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
			// Chunks alternate text/digit starting with text on both sides,
			// so mixed pairs can't occur; order them anyway rather than
			// panic.
			(Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
			(Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
		};
		if ordering != Ordering::Equal {
			return ordering;
		}
	}

	if right_iter.next().is_some() {
		Ordering::Less
	} else {
		Ordering::Equal
	}
}

enum Chunk<'a> {
	Text(&'a str),
	Number(&'a str),
}

/// Split into alternating text and digit runs. The first chunk is always
/// text, possibly empty, so digit-leading names align against text-leading
/// ones.
fn natural_chunks(text: &str) -> Vec<Chunk<'_>> {
	let mut chunks = Vec::new();
	let mut start = 0;
	let mut in_digits = false;

	for (index, ch) in text.char_indices() {
		let digit = ch.is_ascii_digit();
		if digit != in_digits {
			chunks.push(make_chunk(in_digits, &text[start..index]));
			start = index;
			in_digits = digit;
		}
	}
	chunks.push(make_chunk(in_digits, &text[start..]));

	chunks
}

fn make_chunk(digits: bool, text: &str) -> Chunk<'_> {
	if digits {
		Chunk::Number(text)
	} else {
		Chunk::Text(text)
	}
}

/// Compare digit runs numerically without parsing: strip leading zeros, then
/// longer means larger and equal lengths compare lexically. `007` and `7`
/// are equal, matching integer comparison.
fn compare_digits(left: &str, right: &str) -> Ordering {
	let left = left.trim_start_matches('0');
	let right = right.trim_start_matches('0');
	left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

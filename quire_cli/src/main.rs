use std::fs;
use std::process;

use chrono::Local;
use clap::Parser;
use owo_colors::OwoColorize;
use quire_cli::ARGS_FILENAME;
use quire_cli::BuildFormat;
use quire_cli::QuireCli;
use quire_cli::args_file_tokens;
use quire_cli::collect_markdown_files;
use quire_cli::expand_formats;
use quire_cli::mirror_metadata_args;
use quire_core::AssembleOptions;
use quire_core::Candidate;
use quire_core::Metadata;
use quire_core::QuireError;
use quire_core::QuireResult;
use quire_core::Report;
use quire_core::assemble;
use quire_core::filename_exclude_rule;
use quire_core::load_selection_rules;
use quire_core::load_transform_rules;
use quire_core::replace_placeholders;
use quire_core::slugify;
use serde_json::Value;

const MASTER_BASENAME: &str = "collated-book-master";

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply a terminal style only when color output is enabled.
macro_rules! colored {
	($text:expr, yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr, bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let mut argv: Vec<String> = std::env::args().collect();
	let mut found_args_file = false;
	if let Ok(text) = fs::read_to_string(ARGS_FILENAME) {
		argv.splice(1..1, args_file_tokens(&text));
		found_args_file = true;
	}
	let args = QuireCli::parse_from(argv);

	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	if found_args_file && args.verbose {
		println!("Found args file {ARGS_FILENAME}. Processing.");
	}

	if let Err(error) = run(&args) {
		let report: miette::Report = error.into();
		eprintln!("{report:?}");
		process::exit(2);
	}
}

fn run(args: &QuireCli) -> QuireResult<()> {
	let verbose = args.verbose;
	let mut report = Report::new();

	if verbose {
		println!("Path to Markdown folder: {}", args.input_folder.display());
	}
	if !args.input_folder.is_dir() {
		return Err(QuireError::InputFolder {
			path: args.input_folder.display().to_string(),
		});
	}

	if verbose {
		println!("Path to JSON metadata file: {}", args.metadata_file.display());
	}
	let mut metadata = Metadata::load(&args.metadata_file)?;

	// Stamp the build date unless the metadata file pins its own.
	let now = Local::now();
	if !metadata.contains_key("date") {
		metadata.insert("date", now.format("%Y-%m-%d").to_string());
	}
	if !metadata.contains_key("date-year") {
		metadata.insert("date-year", now.format("%Y").to_string());
	}

	// Metadata set via pandoc passthrough arguments participates in
	// placeholder replacement too.
	for (key, value) in mirror_metadata_args(&args.pandoc_args) {
		metadata.insert(key, value);
	}

	if let Some(lang) = &args.lang {
		metadata.apply_lang(lang);
	}

	let selection_rules = if args.no_selection {
		Vec::new()
	} else {
		let mut rules = Vec::new();
		for pattern in &args.exclude {
			if let Some(rule) = filename_exclude_rule(pattern, &metadata, &mut report) {
				rules.push(rule);
			}
		}
		rules.extend(load_selection_rules(
			&args.selection_file,
			&metadata,
			&mut report,
		));
		rules
	};

	let transform_rules = if args.no_transformations {
		Vec::new()
	} else {
		load_transform_rules(&args.transformations_file, &mut report)
	};

	let files = collect_markdown_files(&args.input_folder)?;
	let mut candidates = Vec::with_capacity(files.len());
	for file in &files {
		candidates.push(Candidate::read(file)?);
	}

	let options = AssembleOptions {
		expand_outlines: !args.no_outlines,
		check_tks: !args.no_check_tks,
	};
	let assembled = assemble(
		candidates,
		&selection_rules,
		&transform_rules,
		&options,
		&mut report,
	);
	print_report(&mut report, verbose);
	let assembled = assembled?;

	if assembled.tk_total > 0 {
		if args.stop_on_tks {
			return Err(QuireError::TksPresent {
				count: assembled.tk_total,
			});
		}
		eprintln!("{} (Continuing despite TKs.)", colored!("warning:", yellow));
	}

	if verbose {
		for path in &assembled.included {
			println!("- {path}");
		}
	}

	let text = replace_placeholders(
		assembled.text,
		args.replacement_mode.into(),
		&metadata,
		&mut report,
	);
	print_report(&mut report, verbose);

	// The master keeps a microsecond timestamp so stray copies from aborted
	// runs never collide; a retained master gets the plain name.
	let master_filename = if args.retain_master {
		format!("{MASTER_BASENAME}.md")
	} else {
		format!("{MASTER_BASENAME}-{}.md", now.format("%Y%m%d-%H%M%S-%6f"))
	};
	if verbose {
		println!("Saving collated master file: {master_filename}");
	}
	fs::write(&master_filename, &text).map_err(|error| QuireError::WriteFailed {
		path: master_filename.clone(),
		reason: error.to_string(),
	})?;

	let basename = resolve_basename(args, &metadata, verbose)?;

	if verbose && !args.pandoc_args.is_empty() {
		println!(
			"Found extra arguments. Passing them to pandoc: {}",
			args.pandoc_args.join(" ")
		);
	}

	if verbose {
		let requested = args
			.formats
			.iter()
			.map(|format| format.label())
			.collect::<Vec<_>>()
			.join(", ");
		println!("Output formats requested: {requested}");
	}

	let post_args = pandoc_post_args(args, &metadata, &master_filename);
	for format in expand_formats(&args.formats) {
		let label = format.label();
		let output = format.output_filename(&basename);
		if verbose {
			println!("Building {label} format with pandoc...");
		}
		let mut command = vec![
			defaults_arg(args, "options-shared.yaml"),
			defaults_arg(args, format.defaults_filename()),
			format!("--output={output}"),
		];
		if format == BuildFormat::Pdf6x9 {
			command.push(format!(
				"--css={}",
				args.options_dir.join("pdf-6x9.css").display()
			));
		}
		command.extend(post_args.iter().cloned());
		run_pandoc(&command, label, args.show_pandoc_commands)?;
		if verbose {
			println!("Built {label} format: {output}");
		}
	}

	if args.retain_master {
		if verbose {
			println!("Keeping collated master file, as requested: {master_filename}");
		}
	} else {
		if verbose {
			println!("Deleting collated master file: {master_filename}");
		}
		fs::remove_file(&master_filename)?;
	}

	if verbose {
		println!("Done.");
	}
	Ok(())
}

fn print_report(report: &mut Report, verbose: bool) {
	for entry in report.drain() {
		if entry.is_warning() {
			eprintln!("{} {}", colored!("warning:", yellow), entry.message);
		} else if verbose {
			println!("{}", entry.message);
		}
	}
}

fn resolve_basename(args: &QuireCli, metadata: &Metadata, verbose: bool) -> QuireResult<String> {
	if let Some(basename) = &args.output_basename {
		if verbose {
			println!("Requested output basename: {basename}");
		}
		return Ok(basename.clone());
	}

	if verbose {
		println!("No output basename supplied in arguments; checking metadata.");
	}
	if let Some(basename) = metadata.get_str("basename").filter(|name| !name.is_empty()) {
		if verbose {
			println!("Using basename specified in metadata: {basename}");
		}
		return Ok(basename);
	}

	let Some(title) = metadata.get_str("title").filter(|title| !title.is_empty()) else {
		return Err(QuireError::MissingBasename);
	};
	let full_title = match metadata.get_str("subtitle").filter(|sub| !sub.is_empty()) {
		Some(subtitle) => format!("{title} - {subtitle}"),
		None => title,
	};
	let basename = slugify(&full_title);
	if verbose {
		println!("Converted metadata '{full_title}' to basename: {basename}");
	}
	Ok(basename)
}

fn defaults_arg(args: &QuireCli, filename: &str) -> String {
	format!("--defaults={}", args.options_dir.join(filename).display())
}

/// The arguments every format build shares, appended after the per-format
/// ones so defaults-file settings can be overridden. Dates are passed with
/// `-M key=value` for broad pandoc version compatibility, and css entries
/// move from metadata to the command line because pandoc ignores them in
/// metadata files.
fn pandoc_post_args(args: &QuireCli, metadata: &Metadata, master_filename: &str) -> Vec<String> {
	let now = Local::now();
	let date = metadata
		.get_str("date")
		.unwrap_or_else(|| now.format("%Y-%m-%d").to_string());
	let date_year = metadata
		.get_str("date-year")
		.unwrap_or_else(|| now.format("%Y").to_string());

	let mut post = vec![
		format!("--metadata-file={}", args.metadata_file.display()),
		"-M".to_string(),
		format!("date={date}"),
		"-M".to_string(),
		format!("date-year={date_year}"),
		master_filename.to_string(),
	];
	for entry in css_entries(metadata) {
		post.push(format!("--css={entry}"));
	}
	if args.pandoc_verbose {
		post.push("--verbose".to_string());
	}
	post.extend(args.pandoc_args.iter().cloned());
	post
}

fn css_entries(metadata: &Metadata) -> Vec<String> {
	match metadata.get("css") {
		Some(Value::Array(entries)) => entries.iter().filter_map(scalar_text).collect(),
		Some(value) => scalar_text(value).into_iter().collect(),
		None => Vec::new(),
	}
}

fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

fn run_pandoc(arguments: &[String], label: &str, show_command: bool) -> QuireResult<()> {
	if show_command {
		println!(
			"{}\npandoc {}",
			colored!("Using pandoc command:", bold),
			arguments.join(" ")
		);
	}
	let status = process::Command::new("pandoc")
		.args(arguments)
		.status()
		.map_err(|error| QuireError::PandocLaunch {
			reason: error.to_string(),
		})?;
	if !status.success() {
		return Err(QuireError::PandocFailed {
			format: label.to_string(),
			status: status.to_string(),
		});
	}
	Ok(())
}

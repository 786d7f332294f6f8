use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum QuireError {
	#[error(transparent)]
	#[diagnostic(code(quire::io_error))]
	Io(#[from] std::io::Error),

	#[error("input folder `{path}` is not a directory")]
	#[diagnostic(code(quire::input_folder))]
	InputFolder { path: String },

	#[error("failed to load metadata file `{path}`: {reason}")]
	#[diagnostic(
		code(quire::metadata_file),
		help("the metadata file must contain a single JSON object of key/value pairs")
	)]
	MetadataFile { path: String, reason: String },

	#[error("no files selected for building")]
	#[diagnostic(
		code(quire::nothing_selected),
		help("check the input folder and relax any selection rules that drop everything")
	)]
	NothingSelected,

	#[error("{count} TK marker(s) present and --stop-on-tks was requested")]
	#[diagnostic(
		code(quire::tks_present),
		help("resolve the TK markers, or drop --stop-on-tks to build anyway")
	)]
	TksPresent { count: usize },

	#[error("couldn't determine an output basename")]
	#[diagnostic(
		code(quire::missing_basename),
		help("pass --output-basename, or add a `basename` or `title` entry to the metadata file")
	)]
	MissingBasename,

	#[error("failed to write `{path}`: {reason}")]
	#[diagnostic(code(quire::write_failed))]
	WriteFailed { path: String, reason: String },

	#[error("couldn't launch pandoc: {reason}")]
	#[diagnostic(
		code(quire::pandoc_launch),
		help("install pandoc and make sure it is on your PATH")
	)]
	PandocLaunch { reason: String },

	#[error("pandoc failed while building the {format} format ({status})")]
	#[diagnostic(code(quire::pandoc_failed))]
	PandocFailed { format: String, status: String },
}

pub type QuireResult<T> = Result<T, QuireError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;

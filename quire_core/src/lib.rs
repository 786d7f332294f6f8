//! `quire_core` is the engine behind [quire](https://github.com/quire-build/quire), a
//! build pipeline that assembles a book from a folder of Markdown files. It selects
//! the files that belong in the book, collates them into a single master document,
//! synthesizes linked outlines of the headings, rewrites text through rule-driven
//! transformations, and resolves metadata placeholders.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown folder
//!   → Selection (rule-driven include/exclude of candidate files)
//!   → Collation (contents normalized and joined in one document)
//!   → Outline directives ({outline ...} lines become linked outlines)
//!   → Transformations (pattern rewrites applied over the whole text)
//!   → Placeholders (%key% substitution or template rendering from metadata)
//! ```
//!
//! ## Modules
//!
//! - [`outline`]: Heading scanning and outline rendering, as nested Markdown
//!   lists or HTML list markup.
//! - [`directive`]: Expansion of `{outline ...}` directive lines inside the
//!   collated document.
//!
//! ## Key Types
//!
//! - [`SelectionRule`] / [`TransformRule`]: Rows of the tab-separated rule
//!   files, compiled and ready to run.
//! - [`Candidate`]: A source file with the path views selection rules target.
//! - [`Metadata`]: The book's key/value record, shared by rule patterns,
//!   placeholders, and the final conversion.
//! - [`Report`]: Collected notes and warnings from a run.
//! - [`Assembled`]: The collated document plus the selection and TK facts
//!   about how it was put together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use quire_core::AssembleOptions;
//! use quire_core::Candidate;
//! use quire_core::Metadata;
//! use quire_core::Report;
//! use quire_core::assemble;
//! use quire_core::load_selection_rules;
//!
//! let metadata = Metadata::load(Path::new("metadata.json")).unwrap();
//! let mut report = Report::new();
//! let rules = load_selection_rules(Path::new("selection.tsv"), &metadata, &mut report);
//!
//! let chapters = vec![
//! 	Candidate::read(Path::new("book/01-intro.md")).unwrap(),
//! 	Candidate::read(Path::new("book/02-setup.md")).unwrap(),
//! ];
//! let assembled =
//! 	assemble(chapters, &rules, &[], &AssembleOptions::default(), &mut report).unwrap();
//! println!("{}", assembled.text);
//! ```

pub use error::*;
pub use metadata::*;
pub use outline::slugify;
pub use pattern::*;
pub use pipeline::*;
pub use report::*;
pub use rules::*;
pub use select::*;
pub use template::*;
pub use transform::*;

pub mod directive;
mod error;
pub(crate) mod macros;
mod metadata;
pub mod outline;
mod pattern;
mod pipeline;
mod report;
mod rules;
mod select;
mod template;
mod transform;

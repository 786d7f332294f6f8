use regex::Regex;

use crate::Metadata;
use crate::macros::regex;

/// Upper bound on `%key%` rewrites for one pattern. Substituted values are
/// rescanned, so a value that reintroduces its own token would otherwise
/// loop forever.
const TOKEN_SUBSTITUTION_LIMIT: usize = 64;

/// The two sentinel letters recognized inside a leading inline-flag group.
///
/// `(?M...)` marks a pattern whose `%key%` tokens are substituted from the
/// metadata record before use; `(?N...)` inverts the pattern's match result.
/// Both ride alongside ordinary engine flags (`(?Mi)` works) and are
/// stripped before the pattern reaches the regex engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFlag {
	Metadata,
	Negate,
}

fn flag_regex(flag: PatternFlag) -> &'static Regex {
	match flag {
		PatternFlag::Metadata => regex!(r"^\(\?[a-zA-Z]*(M)[^)]*\)"),
		PatternFlag::Negate => regex!(r"^\(\?[a-zA-Z]*(N)[^)]*\)"),
	}
}

/// Check whether `pattern` starts with an inline-flag group carrying the
/// given sentinel letter.
pub fn has_flag(pattern: &str, flag: PatternFlag) -> bool {
	flag_regex(flag).is_match(pattern)
}

/// Remove exactly one sentinel letter from the leading inline-flag group,
/// keeping any other letters in the group. A group left empty by the removal
/// is dropped entirely, since `(?)` is not a valid expression.
pub fn strip_flag(pattern: &str, flag: PatternFlag) -> String {
	let Some(letter) = flag_regex(flag)
		.captures(pattern)
		.and_then(|caps| caps.get(1))
		.map(|m| (m.start(), m.end()))
	else {
		return pattern.to_string();
	};

	let mut stripped = String::with_capacity(pattern.len());
	stripped.push_str(&pattern[..letter.0]);
	stripped.push_str(&pattern[letter.1..]);

	match stripped.strip_prefix("(?)") {
		Some(rest) => rest.to_string(),
		None => stripped,
	}
}

/// A problem that invalidates a single rule field at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternIssue {
	/// A `%key%` token referenced a key with no scalar value.
	MissingKey { key: String },
	/// Token substitution kept producing new tokens.
	TokenCycle { pattern: String },
	/// The final pattern text failed to compile.
	InvalidRegex { pattern: String, reason: String },
}

impl PatternIssue {
	pub fn message(&self) -> String {
		match self {
			Self::MissingKey { key } => {
				format!("metadata key `{key}` has no value")
			}
			Self::TokenCycle { pattern } => {
				format!("metadata tokens in `{pattern}` keep producing more tokens")
			}
			Self::InvalidRegex { pattern, reason } => {
				format!("`{pattern}` is not a valid pattern: {reason}")
			}
		}
	}
}

/// Resolve every `%key%` token in `text` against the metadata record,
/// leftmost first, rescanning after each rewrite. A key without a scalar
/// value invalidates the whole text; the caller is expected to drop the rule
/// that carried it.
pub fn substitute_metadata_tokens(text: &str, metadata: &Metadata) -> Result<String, PatternIssue> {
	let token = regex!(r"%([^%]+?)%");
	let mut resolved = text.to_string();

	for _ in 0..TOKEN_SUBSTITUTION_LIMIT {
		let found = token.captures(&resolved).and_then(|caps| {
			let whole = caps.get(0)?;
			let key = caps.get(1)?.as_str().to_string();
			Some((whole.start(), whole.end(), key))
		});
		let Some((start, end, key)) = found else {
			return Ok(resolved);
		};
		let Some(value) = metadata.get_str(&key) else {
			return Err(PatternIssue::MissingKey { key });
		};
		resolved.replace_range(start..end, &value);
	}

	Err(PatternIssue::TokenCycle {
		pattern: text.to_string(),
	})
}

/// A pattern string with its flags parsed out but not yet compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPattern {
	/// The pattern text after flag stripping and token substitution.
	pub text: String,
	/// Whether the match result should be inverted.
	pub negated: bool,
	/// Whether the metadata flag was present on the original text.
	pub used_metadata: bool,
}

impl PreparedPattern {
	pub fn compile(self) -> Result<CompiledPattern, PatternIssue> {
		match Regex::new(&self.text) {
			Ok(regex) => {
				Ok(CompiledPattern {
					regex,
					negated: self.negated,
				})
			}
			Err(error) => {
				Err(PatternIssue::InvalidRegex {
					pattern: self.text,
					reason: error.to_string(),
				})
			}
		}
	}
}

/// Strip both sentinel flags from a raw pattern field and substitute
/// metadata tokens when the metadata flag asked for it. The metadata flag is
/// handled first so that negation also applies to flags a substituted value
/// introduces.
pub fn preprocess(raw: &str, metadata: &Metadata) -> Result<PreparedPattern, PatternIssue> {
	let mut text = raw.to_string();
	let mut used_metadata = false;

	if has_flag(&text, PatternFlag::Metadata) {
		text = strip_flag(&text, PatternFlag::Metadata);
		text = substitute_metadata_tokens(&text, metadata)?;
		used_metadata = true;
	}

	let mut negated = false;
	if has_flag(&text, PatternFlag::Negate) {
		text = strip_flag(&text, PatternFlag::Negate);
		negated = true;
	}

	Ok(PreparedPattern {
		text,
		negated,
		used_metadata,
	})
}

/// A ready-to-evaluate rule field: the flag-free compiled pattern plus the
/// negation bit, so the matching core stays flag-agnostic.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
	regex: Regex,
	negated: bool,
}

impl CompiledPattern {
	/// The post-negation match result for this field.
	pub fn matches(&self, text: &str) -> bool {
		self.regex.is_match(text) != self.negated
	}

	/// The pattern text as handed to the regex engine.
	pub fn pattern(&self) -> &str {
		self.regex.as_str()
	}

	pub fn is_negated(&self) -> bool {
		self.negated
	}
}
